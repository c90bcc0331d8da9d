mod direction;
mod index;

pub use direction::Direction;
pub use index::*;
