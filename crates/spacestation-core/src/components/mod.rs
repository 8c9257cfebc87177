//! Component definitions.
//!
//! People are `hecs` entities built from the components in `people`.
//! Station structure (grid and modules) is plain data owned by the game state.

mod common;
mod people;
mod station;

pub use common::*;
pub use people::*;
pub use station::*;
