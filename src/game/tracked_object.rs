//! Tracked object state
//!
//! One marker's current and previous position with the occlusion rule:
//! an occluded (or missing) record freezes the object instead of moving it.

use serde::{Deserialize, Serialize};

use crate::feed::frame::PositionRecord;
use crate::util::vec3::Vector3;

/// A named marker followed across ticks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedObject {
    /// Marker name as it appears in position frames
    pub name: String,
    /// Last known position
    current_position: Vector3,
    /// Position before the last visible update
    previous_position: Vector3,
    /// Whether the most recent update carried a visible position
    #[serde(default)]
    visible: bool,
}

impl TrackedObject {
    /// Create an object at the origin
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            current_position: Vector3::ZERO,
            previous_position: Vector3::ZERO,
            visible: false,
        }
    }

    /// Apply this tick's record for the object, or `None` if the frame had no
    /// record under this name
    ///
    /// Returns true if the position advanced.
    pub fn update(&mut self, record: Option<&PositionRecord>) -> bool {
        match record {
            Some(record) if !record.occluded => {
                self.previous_position = self.current_position;
                self.current_position = record.position;
                self.visible = true;
            }
            _ => self.visible = false,
        }
        self.visible
    }

    /// Per-tick displacement between the previous and current position
    #[inline]
    pub fn velocity(&self) -> f64 {
        self.current_position.distance_to(self.previous_position)
    }

    /// Coordinate of the current position on `axis`; the sign picks the side
    #[inline]
    pub fn side(&self, axis: usize) -> f64 {
        self.current_position.component(axis)
    }

    /// Coordinate of the previous position on `axis`
    #[inline]
    pub fn previous_side(&self, axis: usize) -> f64 {
        self.previous_position.component(axis)
    }

    pub fn current_position(&self) -> Vector3 {
        self.current_position
    }

    pub fn previous_position(&self) -> Vector3 {
        self.previous_position
    }

    /// Whether the last update saw the marker
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}
