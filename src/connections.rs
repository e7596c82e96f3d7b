use log::debug;

use crate::state::{Connection, ConnectionId, Entities, Rect};

/// Directed, metadata-bearing edges between nodes. Duplicate and
/// self-referential pairs are stored as-is; endpoint validity is enforced
/// by the board before `create` is called.
#[derive(Clone, Debug)]
pub struct ConnectionStore {
    connections: Vec<Connection>,
    next_id: ConnectionId,
}

impl Default for ConnectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionStore {
    pub fn new() -> Self {
        Self {
            connections: Vec::new(),
            next_id: 1,
        }
    }

    pub fn create(&mut self, source: &str, target: &str, entities: Entities) -> ConnectionId {
        let id = self.next_id;
        self.next_id += 1;
        self.connections.push(Connection {
            id,
            source: source.to_string(),
            target: target.to_string(),
            entities,
        });
        debug!("connection {} created: {} -> {}", id, source, target);
        id
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    pub fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        let idx = self.connections.iter().position(|c| c.id == id)?;
        Some(self.connections.remove(idx))
    }

    /// Drops every connection with `name` as source or target.
    pub fn remove_by_node(&mut self, name: &str) -> usize {
        let before = self.connections.len();
        self.connections.retain(|c| !c.touches(name));
        before - self.connections.len()
    }

    pub fn clear(&mut self) {
        self.connections.clear();
        self.next_id = 1;
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    pub fn touching<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.touches(name))
    }

    /// Visits connections with at least one endpoint rect intersecting
    /// `bounds`. Connections whose endpoints cannot be resolved are skipped.
    pub fn for_each_visible<R, F>(&self, bounds: &Rect, rect_of: R, mut callback: F)
    where
        R: Fn(&str) -> Option<Rect>,
        F: FnMut(&Connection, Rect, Rect),
    {
        for conn in &self.connections {
            let (Some(source), Some(target)) = (rect_of(&conn.source), rect_of(&conn.target)) else {
                continue;
            };
            if source.intersects(bounds) || target.intersects(bounds) {
                callback(conn, source, target);
            }
        }
    }
}
