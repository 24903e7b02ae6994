pub mod astar;
pub mod path;

pub use astar::Pathfinder;
pub use path::{Path, PathStep};
