pub mod error;
pub mod positions;
pub mod predict;
pub mod tles;
