//! Numeric helpers shared by the codec, planner, and search layers.
//!
//! - Distance units and spherical-cap bounds
//! - Argument validation for coordinates, levels, radii, and rectangles

pub mod distance;
pub mod validation;
