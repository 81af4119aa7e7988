//! Coordinates, dataset identifiers and the fixed-point precision factor.

use std::fmt;
use std::num::NonZeroU32;

use geo::Coord;

/// An integer-coordinate point in the plane.
///
/// Locations are only used as lookup keys and as inputs to the distance
/// computation; they are not kept on the [`Instance`](crate::Instance).
pub type Location = Coord<i32>;

/// Numeric identifier of a dataset block in the raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct DatasetId(pub u32);

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for DatasetId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Scale factor used to encode Euclidean distances as integers.
///
/// A distance `d` is stored as `floor(precision * d)`, which lets an
/// integer-only solver reason about fractional distances.
///
/// # Examples
/// ```
/// use cvrp_core::Precision;
///
/// assert_eq!(Precision::default().get(), 10);
/// assert!(Precision::new(0).is_none());
/// assert_eq!(Precision::new(100).map(Precision::get), Some(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Precision(NonZeroU32);

impl Precision {
    /// The identity scale: distances are truncated to whole units.
    pub const UNIT: Self = Self(NonZeroU32::MIN);

    /// Build a precision factor, rejecting zero.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        match NonZeroU32::new(value) {
            Some(inner) => Some(Self(inner)),
            None => None,
        }
    }

    /// Return the raw scale factor.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self(NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN))
    }
}

impl From<NonZeroU32> for Precision {
    fn from(value: NonZeroU32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
