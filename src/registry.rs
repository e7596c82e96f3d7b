use std::collections::HashMap;

use log::debug;
use rand::Rng;

use crate::state::{NodeRole, Point, Rect, ScriptNode, Size};

pub const BASE_NODE_SIZE: f64 = 130.0;
pub const PLACEMENT_MARGIN: f64 = 50.0;
pub const CLAMP_MARGIN: f64 = 10.0;

/// Uniform card size for a board holding `count` nodes.
pub fn node_size_for_count(count: usize) -> f64 {
    if count > 40 {
        75.0
    } else if count > 20 {
        90.0
    } else if count > 10 {
        110.0
    } else {
        BASE_NODE_SIZE
    }
}

fn clamp_axis(value: f64, dimension: f64, size: f64, margin: f64) -> f64 {
    let upper = (dimension - size - margin).max(margin);
    value.clamp(margin, upper)
}

/// Owns every node on the board, indexed by file name. Iteration follows
/// insertion order, which is also the paint order.
#[derive(Clone, Debug)]
pub struct NodeRegistry {
    nodes: HashMap<String, ScriptNode>,
    order: Vec<String>,
    main: Option<String>,
    node_size: f64,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            main: None,
            node_size: BASE_NODE_SIZE,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn node_size(&self) -> f64 {
        self.node_size
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ScriptNode> {
        self.nodes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ScriptNode> {
        self.nodes.get_mut(name)
    }

    pub fn main(&self) -> Option<&ScriptNode> {
        self.main.as_deref().and_then(|name| self.nodes.get(name))
    }

    pub fn main_name(&self) -> Option<&str> {
        self.main.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScriptNode> {
        self.order.iter().filter_map(|name| self.nodes.get(name))
    }

    pub fn secondary_names(&self) -> Vec<String> {
        self.iter()
            .filter(|n| !n.is_main())
            .map(|n| n.name.clone())
            .collect()
    }

    pub fn rect_of(&self, name: &str) -> Option<Rect> {
        self.nodes.get(name).map(|n| n.rect(self.node_size))
    }

    /// Topmost node under a board-space point.
    pub fn node_at(&self, point: Point) -> Option<&ScriptNode> {
        self.order
            .iter()
            .rev()
            .filter_map(|name| self.nodes.get(name))
            .find(|n| n.contains_point(point.x, point.y, self.node_size))
    }

    /// Clamps a position so the whole card stays inside the board.
    pub fn validate_position(&self, pos: Point, board: Size) -> Point {
        Point::new(
            clamp_axis(pos.x, board.width, self.node_size, CLAMP_MARGIN),
            clamp_axis(pos.y, board.height, self.node_size, CLAMP_MARGIN),
        )
    }

    pub fn random_position<R: Rng>(&self, board: Size, rng: &mut R) -> Point {
        let span_x = (board.width - self.node_size - 2.0 * PLACEMENT_MARGIN).max(0.0);
        let span_y = (board.height - self.node_size - 2.0 * PLACEMENT_MARGIN).max(0.0);
        Point::new(
            PLACEMENT_MARGIN + rng.gen::<f64>() * span_x,
            PLACEMENT_MARGIN + rng.gen::<f64>() * span_y,
        )
    }

    /// Inserts (or replaces, keeping its paint slot) a node and returns the
    /// committed position. Sizes are recomputed before the position is
    /// chosen so the new footprint is respected.
    pub fn place<R: Rng>(
        &mut self,
        mut node: ScriptNode,
        hint: Option<Point>,
        board: Size,
        rng: &mut R,
    ) -> Point {
        let name = node.name.clone();
        if !self.nodes.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.resize_all_by_count();

        let pos = match hint {
            Some(hint) => self.validate_position(hint, board),
            None => self.random_position(board, rng),
        };
        node.set_position(pos);
        let is_main = node.is_main();
        self.nodes.insert(name.clone(), node);
        if is_main {
            self.set_main(&name);
        } else if self.main.as_deref() == Some(name.as_str()) {
            self.main = None;
        }
        debug!("placed {} at ({:.1}, {:.1})", name, pos.x, pos.y);
        pos
    }

    pub fn move_to(&mut self, name: &str, pos: Point, board: Size) -> Option<Point> {
        let pos = self.validate_position(pos, board);
        let node = self.nodes.get_mut(name)?;
        node.set_position(pos);
        Some(pos)
    }

    pub fn resize_all_by_count(&mut self) {
        self.node_size = node_size_for_count(self.order.len());
    }

    /// Promotes `name` to main, demoting any previous main node.
    pub fn set_main(&mut self, name: &str) -> bool {
        if !self.nodes.contains_key(name) {
            return false;
        }
        if let Some(previous) = self.main.take() {
            if previous != name {
                if let Some(old) = self.nodes.get_mut(&previous) {
                    old.role = NodeRole::Secondary;
                }
            }
        }
        if let Some(node) = self.nodes.get_mut(name) {
            node.role = NodeRole::Main;
            node.imports_main = false;
        }
        self.main = Some(name.to_string());
        true
    }

    /// Removes a single node. Connections are pruned by the caller.
    pub fn remove(&mut self, name: &str) -> Option<ScriptNode> {
        let node = self.nodes.remove(name)?;
        self.order.retain(|n| n != name);
        if self.main.as_deref() == Some(name) {
            self.main = None;
        }
        self.resize_all_by_count();
        Some(node)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
        self.main = None;
        self.resize_all_by_count();
    }
}
