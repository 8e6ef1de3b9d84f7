//! Shared kernel value objects.

mod location;

pub use location::{Location, LocationError};
