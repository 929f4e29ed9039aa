//! Position frame definitions and the line-oriented JSON wire format
//!
//! One frame per line: `{"objs": [{"name": "ball1", "oc": false, "t": [x, y, z]}]}`.
//! Fields other than `objs` are ignored.

use serde::{Deserialize, Serialize};

use crate::util::vec3::Vector3;

/// One object's entry in a frame
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionRecord {
    /// Marker name
    pub name: String,
    /// Marker not visible to the capture system this tick
    #[serde(rename = "oc", default)]
    pub occluded: bool,
    /// Marker translation
    #[serde(rename = "t", default)]
    pub position: Vector3,
}

impl PositionRecord {
    pub fn new(name: impl Into<String>, position: Vector3) -> Self {
        Self {
            name: name.into(),
            occluded: false,
            position,
        }
    }

    pub fn occluded(name: impl Into<String>, position: Vector3) -> Self {
        Self {
            name: name.into(),
            occluded: true,
            position,
        }
    }
}

/// One tick's snapshot of every tracked marker
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PositionFrame {
    #[serde(rename = "objs", default)]
    pub records: Vec<PositionRecord>,
}

impl PositionFrame {
    pub fn new(records: Vec<PositionRecord>) -> Self {
        Self { records }
    }

    /// First record under `name`
    pub fn get(&self, name: &str) -> Option<&PositionRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Number of records flagged occluded
    pub fn occluded_count(&self) -> usize {
        self.records.iter().filter(|r| r.occluded).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Parse one line of the wire format
    pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Parse one raw line as read off the feed
    pub fn from_slice(line: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(line)
    }

    /// Serialize to one line of the wire format
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_capture_line() {
        let line = r#"{"objs": [
            {"name": "ball1", "oc": false, "t": [120.5, -40.0, 900.0], "r": [0, 0, 0]},
            {"name": "ball2", "oc": true, "t": [0.0, 0.0, 0.0]}
        ], "frame": 5512}"#;

        let frame = PositionFrame::from_json(line).unwrap();

        assert_eq!(frame.len(), 2);
        let ball1 = frame.get("ball1").unwrap();
        assert!(!ball1.occluded);
        assert_eq!(ball1.position, Vector3::new(120.5, -40.0, 900.0));
        assert!(frame.get("ball2").unwrap().occluded);
        assert_eq!(frame.occluded_count(), 1);
    }

    #[test]
    fn test_missing_objs_is_empty_frame() {
        let frame = PositionFrame::from_json(r#"{"frame": 1}"#).unwrap();
        assert!(frame.is_empty());
        assert!(frame.get("ball1").is_none());
    }

    #[test]
    fn test_first_record_wins() {
        let frame = PositionFrame::new(vec![
            PositionRecord::new("ball1", Vector3::new(1.0, 0.0, 0.0)),
            PositionRecord::new("ball1", Vector3::new(2.0, 0.0, 0.0)),
        ]);
        assert_eq!(frame.get("ball1").unwrap().position.x, 1.0);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(PositionFrame::from_json("not json").is_err());
        assert!(PositionFrame::from_json("").is_err());
        assert!(PositionFrame::from_json(r#"{"objs": [{"name": "b", "t": [1, 2]}]}"#).is_err());
    }

    #[test]
    fn test_writes_wire_field_names() {
        let frame = PositionFrame::new(vec![PositionRecord::occluded("ball1", Vector3::ZERO)]);
        let json = frame.to_json().unwrap();
        assert!(json.contains(r#""objs""#));
        assert!(json.contains(r#""oc":true"#));
        assert!(json.contains(r#""t":[0.0,0.0,0.0]"#));
    }
}
