//! Systems - logic that operates on the game state

mod resources;
mod placement;
mod workforce;
mod events;
mod tick;

pub use resources::*;
pub use placement::*;
pub use workforce::*;
pub use events::*;
pub use tick::*;
