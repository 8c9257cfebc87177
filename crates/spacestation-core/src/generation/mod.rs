//! Generation - procedural creation of residents

mod names;
mod people;

pub use names::*;
pub use people::*;
