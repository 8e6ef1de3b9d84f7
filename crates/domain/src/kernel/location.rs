//! Grid location value object.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when constructing a location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// A coordinate fell outside the grid.
    #[error(
        "Location ({x}, {y}) is out of range: coordinates must be within [{min}, {max}]",
        min = Location::MIN_COORDINATE,
        max = Location::MAX_COORDINATE
    )]
    OutOfRange { x: i32, y: i32 },
}

/// A point on the delivery grid.
///
/// Both coordinates are in `[MIN_COORDINATE, MAX_COORDINATE]`. A `Location`
/// value is always set; callers that may not have a location yet hold an
/// `Option<Location>` instead of a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Coordinates")]
pub struct Location {
    x: i32,
    y: i32,
}

/// Unvalidated wire form of a [`Location`].
#[derive(Deserialize)]
struct Coordinates {
    x: i32,
    y: i32,
}

impl TryFrom<Coordinates> for Location {
    type Error = LocationError;

    fn try_from(c: Coordinates) -> Result<Self, Self::Error> {
        Location::new(c.x, c.y)
    }
}

impl Location {
    /// Smallest valid coordinate on either axis.
    pub const MIN_COORDINATE: i32 = 1;

    /// Largest valid coordinate on either axis.
    pub const MAX_COORDINATE: i32 = 10;

    /// Creates a location, validating both coordinates against the grid bounds.
    pub fn new(x: i32, y: i32) -> Result<Self, LocationError> {
        let range = Self::MIN_COORDINATE..=Self::MAX_COORDINATE;
        if !range.contains(&x) || !range.contains(&y) {
            return Err(LocationError::OutOfRange { x, y });
        }

        Ok(Self { x, y })
    }

    /// Rebuilds a location from persisted data without validation.
    ///
    /// Only storage adapters should call this.
    pub fn restore(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns a uniformly random location on the grid.
    pub fn random() -> Self {
        Self::random_with(&mut rand::rng())
    }

    /// Returns a uniformly random location drawn from the given generator.
    pub fn random_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            x: rng.random_range(Self::MIN_COORDINATE..=Self::MAX_COORDINATE),
            y: rng.random_range(Self::MIN_COORDINATE..=Self::MAX_COORDINATE),
        }
    }

    /// Returns the x coordinate.
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Returns the y coordinate.
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Returns the Manhattan distance to another location.
    pub fn distance_to(&self, other: Location) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: i32 = Location::MIN_COORDINATE;
    const MAX: i32 = Location::MAX_COORDINATE;

    #[test]
    fn test_every_grid_point_is_valid() {
        for x in MIN..=MAX {
            for y in MIN..=MAX {
                let location = Location::new(x, y).unwrap();
                assert_eq!(location.x(), x);
                assert_eq!(location.y(), y);
            }
        }
    }

    #[test]
    fn test_coordinates_outside_grid_are_rejected() {
        let invalid = [
            (0, 1),
            (1, 0),
            (0, 0),
            (11, 5),
            (5, 11),
            (-1, 3),
            (3, -1),
            (i32::MAX, 1),
        ];

        for (x, y) in invalid {
            assert_eq!(
                Location::new(x, y),
                Err(LocationError::OutOfRange { x, y }),
                "({x}, {y}) should be rejected"
            );
        }
    }

    #[test]
    fn test_equality_is_structural() {
        assert_eq!(Location::new(3, 4).unwrap(), Location::new(3, 4).unwrap());
        assert_ne!(Location::new(3, 4).unwrap(), Location::new(4, 3).unwrap());
    }

    #[test]
    fn test_distance_is_manhattan() {
        let a = Location::new(2, 3).unwrap();
        let b = Location::new(9, 4).unwrap();
        assert_eq!(a.distance_to(b), 8);

        let c = Location::new(1, 1).unwrap();
        assert_eq!(c.distance_to(c), 0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        for ax in MIN..=MAX {
            for ay in MIN..=MAX {
                let a = Location::new(ax, ay).unwrap();
                for (bx, by) in [(1, 1), (10, 10), (5, 7), (ay, ax)] {
                    let b = Location::new(bx, by).unwrap();
                    assert_eq!(a.distance_to(b), b.distance_to(a));
                }
            }
        }
    }

    #[test]
    fn test_random_stays_on_grid() {
        for _ in 0..1000 {
            let location = Location::random();
            assert!(Location::new(location.x(), location.y()).is_ok());
        }
    }

    #[test]
    fn test_restore_skips_validation() {
        let location = Location::restore(0, 42);
        assert_eq!(location.x(), 0);
        assert_eq!(location.y(), 42);
    }

    #[test]
    fn test_deserialize_validates_range() {
        let location: Location = serde_json::from_str(r#"{"x":3,"y":10}"#).unwrap();
        assert_eq!(location, Location::new(3, 10).unwrap());

        let err = serde_json::from_str::<Location>(r#"{"x":0,"y":5}"#).unwrap_err();
        assert!(err.to_string().contains("out of range"));

        let json = serde_json::to_string(&location).unwrap();
        assert_eq!(json, r#"{"x":3,"y":10}"#);
    }

    #[test]
    fn test_display() {
        assert_eq!(Location::new(7, 5).unwrap().to_string(), "(7, 5)");
    }
}
