use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAIN_PREVIEW_CHARS: usize = 200;
pub const SECONDARY_PREVIEW_CHARS: usize = 150;
pub const PIN_SIZE: f64 = 14.0;

pub type ConnectionId = u64;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn minus(self, other: Point) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_origin(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// Touching edges count as an intersection.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.right() >= other.x
            && self.x <= other.right()
            && self.bottom() >= other.y
            && self.y <= other.bottom()
    }

    pub fn mid_left(&self) -> Point {
        Point::new(self.x, self.y + self.height / 2.0)
    }

    pub fn mid_right(&self) -> Point {
        Point::new(self.right(), self.y + self.height / 2.0)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Main,
    Secondary,
}

/// One analyzed script placed on the board.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScriptNode {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub role: NodeRole,
    pub preview: String,
    #[serde(default)]
    pub edited: bool,
    #[serde(default)]
    pub imports_main: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Value>,
}

impl ScriptNode {
    pub fn new(name: String, role: NodeRole, content: &str) -> Self {
        Self {
            name,
            x: 0.0,
            y: 0.0,
            role,
            preview: preview_text(content, role),
            edited: false,
            imports_main: false,
            analysis: None,
        }
    }

    pub fn is_main(&self) -> bool {
        self.role == NodeRole::Main
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, pos: Point) {
        self.x = pos.x;
        self.y = pos.y;
    }

    pub fn set_content(&mut self, content: &str) {
        self.preview = preview_text(content, self.role);
    }

    pub fn script_type(&self) -> Option<&str> {
        self.analysis
            .as_ref()
            .and_then(|a| a.get("script_type"))
            .and_then(Value::as_str)
    }

    pub fn rect(&self, size: f64) -> Rect {
        Rect::new(self.x, self.y, size, size)
    }

    /// Pin hotspot, centered on the top edge of the card.
    pub fn pin_rect(&self, size: f64) -> Rect {
        Rect::new(
            self.x + (size - PIN_SIZE) / 2.0,
            self.y - PIN_SIZE / 2.0,
            PIN_SIZE,
            PIN_SIZE,
        )
    }

    pub fn contains_point(&self, px: f64, py: f64, size: f64) -> bool {
        self.rect(size).contains_point(px, py)
    }
}

pub fn preview_text(content: &str, role: NodeRole) -> String {
    let limit = match role {
        NodeRole::Main => MAIN_PREVIEW_CHARS,
        NodeRole::Secondary => SECONDARY_PREVIEW_CHARS,
    };
    let mut preview: String = content.chars().take(limit).collect();
    preview.push_str("...");
    preview
}

/// Names pulled from the source module by an importing script.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Entities {
    #[serde(default)]
    pub functions: Vec<String>,
    #[serde(default)]
    pub classes: Vec<String>,
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.classes.is_empty()
    }
}

/// Directed edge: `target` imports `source`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub entities: Entities,
}

impl Connection {
    pub fn touches(&self, name: &str) -> bool {
        self.source == name || self.target == name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod rect_tests {
        use super::*;

        #[test]
        fn contains_point_on_boundary() {
            let rect = Rect::new(100.0, 100.0, 130.0, 130.0);
            assert!(rect.contains_point(100.0, 100.0));
            assert!(rect.contains_point(230.0, 230.0));
            assert!(!rect.contains_point(231.0, 150.0));
            assert!(!rect.contains_point(150.0, 99.0));
        }

        #[test]
        fn intersects_overlapping_and_touching() {
            let a = Rect::new(0.0, 0.0, 100.0, 100.0);
            assert!(a.intersects(&Rect::new(50.0, 50.0, 100.0, 100.0)));
            assert!(a.intersects(&Rect::new(100.0, 0.0, 10.0, 10.0)));
            assert!(!a.intersects(&Rect::new(101.0, 0.0, 10.0, 10.0)));
            assert!(!a.intersects(&Rect::new(0.0, -20.0, 10.0, 10.0)));
        }

        #[test]
        fn edge_midpoints() {
            let rect = Rect::new(10.0, 20.0, 100.0, 60.0);
            assert_eq!(rect.mid_left(), Point::new(10.0, 50.0));
            assert_eq!(rect.mid_right(), Point::new(110.0, 50.0));
        }
    }

    mod node_tests {
        use super::*;

        #[test]
        fn new_truncates_preview_by_role() {
            let content = "x".repeat(500);
            let main = ScriptNode::new("app.py".to_string(), NodeRole::Main, &content);
            let secondary = ScriptNode::new("utils.py".to_string(), NodeRole::Secondary, &content);
            assert_eq!(main.preview.len(), MAIN_PREVIEW_CHARS + 3);
            assert_eq!(secondary.preview.len(), SECONDARY_PREVIEW_CHARS + 3);
            assert!(secondary.preview.ends_with("..."));
            assert!(!main.edited);
            assert!(!main.imports_main);
        }

        #[test]
        fn preview_counts_chars_not_bytes() {
            let content = "ă".repeat(200);
            let node = ScriptNode::new("ro.py".to_string(), NodeRole::Secondary, &content);
            assert_eq!(node.preview.chars().count(), SECONDARY_PREVIEW_CHARS + 3);
        }

        #[test]
        fn script_type_reads_analysis_payload() {
            let mut node = ScriptNode::new("srv.py".to_string(), NodeRole::Secondary, "");
            assert_eq!(node.script_type(), None);
            node.analysis = Some(serde_json::json!({"script_type": "Server Flask", "functions": []}));
            assert_eq!(node.script_type(), Some("Server Flask"));
        }

        #[test]
        fn pin_sits_on_top_edge() {
            let mut node = ScriptNode::new("a.py".to_string(), NodeRole::Secondary, "");
            node.set_position(Point::new(100.0, 100.0));
            let pin = node.pin_rect(130.0);
            assert_eq!(pin.x + pin.width / 2.0, 165.0);
            assert_eq!(pin.y + pin.height / 2.0, 100.0);
        }

        #[test]
        fn serde_skips_missing_analysis() {
            let node = ScriptNode::new("a.py".to_string(), NodeRole::Main, "print(1)");
            let json = serde_json::to_string(&node).unwrap();
            assert!(!json.contains("analysis"));
            assert!(json.contains("\"role\":\"main\""));
            let back: ScriptNode = serde_json::from_str(&json).unwrap();
            assert_eq!(back, node);
        }
    }

    mod connection_tests {
        use super::*;

        #[test]
        fn entities_default_when_missing() {
            let json = r#"{"id": 3, "source": "app.py", "target": "utils.py"}"#;
            let conn: Connection = serde_json::from_str(json).unwrap();
            assert!(conn.entities.is_empty());
            assert!(conn.touches("app.py"));
            assert!(conn.touches("utils.py"));
            assert!(!conn.touches("other.py"));
        }
    }
}
