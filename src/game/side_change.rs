//! Debounced side-change detection
//!
//! A crossing is reported only when the object strictly leaves one side of
//! the axis boundary for the other and its per-tick displacement stays under
//! the glitch threshold. Large jumps are treated as tracking artifacts.

use serde::{Deserialize, Serialize};

use crate::game::constants::tracking::VELOCITY_GLITCH_THRESHOLD;
use crate::game::tracked_object::TrackedObject;

/// Result of evaluating one object for one tick
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SideChange {
    /// No crossing this tick
    None,
    /// Crossed from the negative side (or boundary) to the positive side
    ToPositive,
    /// Crossed from the positive side (or boundary) to the negative side
    ToNegative,
}

/// Stateless detector configured with the glitch threshold
#[derive(Debug, Clone, Copy)]
pub struct SideChangeDetector {
    velocity_glitch_threshold: f64,
}

impl SideChangeDetector {
    pub fn new(velocity_glitch_threshold: f64) -> Self {
        Self {
            velocity_glitch_threshold,
        }
    }

    /// True if the object's last displacement exceeds the glitch threshold
    #[inline]
    pub fn is_glitch(&self, object: &TrackedObject) -> bool {
        object.velocity() > self.velocity_glitch_threshold
    }

    /// Classify the object's latest move across the boundary on `axis`
    pub fn detect_change(&self, object: &TrackedObject, axis: usize) -> SideChange {
        if self.is_glitch(object) {
            return SideChange::None;
        }

        let previous = object.previous_side(axis);
        let current = object.side(axis);

        if previous <= 0.0 && current > 0.0 {
            SideChange::ToPositive
        } else if previous >= 0.0 && current < 0.0 {
            SideChange::ToNegative
        } else {
            SideChange::None
        }
    }
}

impl Default for SideChangeDetector {
    fn default() -> Self {
        Self::new(VELOCITY_GLITCH_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::frame::PositionRecord;
    use crate::util::vec3::Vector3;

    /// Object whose previous/current x coordinates are the given values
    fn moved(previous_x: f64, current_x: f64) -> TrackedObject {
        let mut obj = TrackedObject::new("ball");
        obj.update(Some(&PositionRecord::new("ball", Vector3::new(previous_x, 0.0, 0.0))));
        obj.update(Some(&PositionRecord::new("ball", Vector3::new(current_x, 0.0, 0.0))));
        obj
    }

    #[test]
    fn test_negative_to_positive() {
        let detector = SideChangeDetector::default();
        assert_eq!(detector.detect_change(&moved(-1.0, 2.0), 0), SideChange::ToPositive);
    }

    #[test]
    fn test_positive_to_negative() {
        let detector = SideChangeDetector::default();
        assert_eq!(detector.detect_change(&moved(1.0, -1.0), 0), SideChange::ToNegative);
    }

    #[test]
    fn test_standing_on_boundary() {
        let detector = SideChangeDetector::default();
        assert_eq!(detector.detect_change(&moved(0.0, 0.0), 0), SideChange::None);
    }

    #[test]
    fn test_leaving_boundary_counts_as_crossing() {
        let detector = SideChangeDetector::default();
        assert_eq!(detector.detect_change(&moved(0.0, 3.0), 0), SideChange::ToPositive);
        assert_eq!(detector.detect_change(&moved(0.0, -3.0), 0), SideChange::ToNegative);
    }

    #[test]
    fn test_arriving_at_boundary_is_not_a_crossing() {
        let detector = SideChangeDetector::default();
        assert_eq!(detector.detect_change(&moved(4.0, 0.0), 0), SideChange::None);
        assert_eq!(detector.detect_change(&moved(-4.0, 0.0), 0), SideChange::None);
    }

    #[test]
    fn test_staying_on_one_side() {
        let detector = SideChangeDetector::default();
        assert_eq!(detector.detect_change(&moved(5.0, 9.0), 0), SideChange::None);
        assert_eq!(detector.detect_change(&moved(-5.0, -9.0), 0), SideChange::None);
    }

    #[test]
    fn test_glitch_suppresses_crossing() {
        let detector = SideChangeDetector::new(1000.0);
        let obj = moved(-600.0, 600.0);
        assert!(detector.is_glitch(&obj));
        assert_eq!(detector.detect_change(&obj, 0), SideChange::None);

        let obj = moved(600.0, -600.0);
        assert_eq!(detector.detect_change(&obj, 0), SideChange::None);
    }

    #[test]
    fn test_displacement_at_threshold_is_not_a_glitch() {
        let detector = SideChangeDetector::new(1000.0);
        let obj = moved(-500.0, 500.0);
        assert!(!detector.is_glitch(&obj));
        assert_eq!(detector.detect_change(&obj, 0), SideChange::ToPositive);
    }

    #[test]
    fn test_off_axis_motion_counts_toward_glitch() {
        let detector = SideChangeDetector::new(10.0);
        let mut obj = TrackedObject::new("ball");
        obj.update(Some(&PositionRecord::new("ball", Vector3::new(-1.0, 0.0, 0.0))));
        obj.update(Some(&PositionRecord::new("ball", Vector3::new(1.0, 0.0, 50.0))));
        assert_eq!(detector.detect_change(&obj, 0), SideChange::None);
    }

    #[test]
    fn test_uses_requested_axis() {
        let detector = SideChangeDetector::default();
        let mut obj = TrackedObject::new("ball");
        obj.update(Some(&PositionRecord::new("ball", Vector3::new(5.0, -2.0, 0.0))));
        obj.update(Some(&PositionRecord::new("ball", Vector3::new(6.0, 2.0, 0.0))));
        assert_eq!(detector.detect_change(&obj, 0), SideChange::None);
        assert_eq!(detector.detect_change(&obj, 1), SideChange::ToPositive);
    }
}
