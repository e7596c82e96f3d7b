use std::collections::HashMap;

use log::{debug, info};
use rand::Rng;

use crate::analyzer::ImportAnalysis;
use crate::connections::ConnectionStore;
use crate::error::{BoardError, Result};
use crate::registry::NodeRegistry;
use crate::state::{Connection, ConnectionId, Entities, NodeRole, Point, ScriptNode, Size};
use crate::viewport::Viewport;

pub const DEFAULT_BOARD_SIZE: Size = Size::new(1200.0, 800.0);

/// Project structure saved on the analyzer by a directory upload.
#[derive(Clone, Debug, PartialEq)]
pub struct StructureInfo {
    pub id: String,
    pub total_files: usize,
    pub python_files: usize,
}

/// Single owner of everything the board shows. UI code borrows it through
/// one `Rc<RefCell<_>>`; nothing else keeps node or connection state.
#[derive(Debug)]
pub struct BoardState {
    pub registry: NodeRegistry,
    pub connections: ConnectionStore,
    pub viewport: Viewport,
    sources: HashMap<String, String>,
    structure: Option<StructureInfo>,
    board_size: Size,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new(DEFAULT_BOARD_SIZE)
    }
}

impl BoardState {
    pub fn new(board_size: Size) -> Self {
        Self {
            registry: NodeRegistry::new(),
            connections: ConnectionStore::new(),
            viewport: Viewport::new(),
            sources: HashMap::new(),
            structure: None,
            board_size,
        }
    }

    pub fn board_size(&self) -> Size {
        self.board_size
    }

    pub fn set_board_size(&mut self, size: Size) {
        self.board_size = size;
    }

    pub fn structure(&self) -> Option<&StructureInfo> {
        self.structure.as_ref()
    }

    pub fn set_structure(&mut self, structure: StructureInfo) {
        self.structure = Some(structure);
    }

    pub fn source(&self, name: &str) -> Option<&str> {
        self.sources.get(name).map(String::as_str)
    }

    pub fn has_main(&self) -> bool {
        self.registry.main().is_some()
    }

    /// Adds or replaces a script node. A re-upload keeps the card where it
    /// was; new cards get a random spot.
    pub fn accept_script<R: Rng>(
        &mut self,
        name: &str,
        content: &str,
        role: NodeRole,
        rng: &mut R,
    ) -> Result<Point> {
        if !name.ends_with(".py") {
            return Err(BoardError::UnsupportedFile(name.to_string()));
        }
        let hint = self.registry.get(name).map(ScriptNode::position);
        let node = ScriptNode::new(name.to_string(), role, content);
        let pos = self.registry.place(node, hint, self.board_size, rng);
        self.sources.insert(name.to_string(), content.to_string());
        info!("accepted {} as {:?} ({} nodes)", name, role, self.registry.len());
        Ok(pos)
    }

    /// Stores an analyzer reply on its node. A secondary that imports the
    /// main script gets a main -> secondary connection carrying the
    /// imported entities. Every positive reply adds one, so re-analysis after
    /// an edit can leave duplicates.
    /// Replies for nodes that are gone are dropped.
    pub fn apply_analysis(&mut self, name: &str, reply: &ImportAnalysis) -> Option<ConnectionId> {
        let main = self.registry.main_name().map(str::to_string);
        let node = match self.registry.get_mut(name) {
            Some(node) => node,
            None => {
                debug!("analysis for {} arrived after removal, dropped", name);
                return None;
            }
        };
        node.analysis = Some(reply.analysis.clone());

        let main = main.filter(|main| main != name)?;
        if !reply.imports {
            return None;
        }
        node.imports_main = true;
        self.connect(&main, name, reply.entities.clone())
    }

    /// Creates a connection if both endpoints are on the board.
    pub fn connect(&mut self, source: &str, target: &str, entities: Entities) -> Option<ConnectionId> {
        if !self.registry.contains(source) || !self.registry.contains(target) {
            debug!("connect {} -> {} skipped, endpoint missing", source, target);
            return None;
        }
        Some(self.connections.create(source, target, entities))
    }

    /// Pin-to-pin connection: no entities are known for it. A manual link
    /// out of the main script marks the target as importing it.
    pub fn connect_manual(&mut self, source: &str, target: &str) -> Option<ConnectionId> {
        let id = self.connect(source, target, Entities::default())?;
        if self.registry.main_name() == Some(source) {
            if let Some(node) = self.registry.get_mut(target) {
                node.imports_main = true;
            }
        }
        Some(id)
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(id)
    }

    /// Removes a node together with every connection touching it.
    pub fn remove_node(&mut self, name: &str) -> Option<ScriptNode> {
        let node = self.registry.remove(name)?;
        let pruned = self.connections.remove_by_node(name);
        self.sources.remove(name);
        info!("removed {} and {} connection(s)", name, pruned);
        Some(node)
    }

    /// Applies an in-browser edit and returns the scripts to re-analyze, the
    /// edited one first. Editing the main script invalidates every secondary.
    pub fn save_edit(&mut self, name: &str, content: &str) -> Result<Vec<(String, String)>> {
        let is_main = {
            let node = self
                .registry
                .get_mut(name)
                .ok_or_else(|| BoardError::Validation(format!("{} is not on the board", name)))?;
            node.set_content(content);
            node.edited = true;
            node.is_main()
        };
        self.sources.insert(name.to_string(), content.to_string());

        let mut names = vec![name.to_string()];
        if is_main {
            names.extend(self.registry.secondary_names());
        }
        Ok(names
            .into_iter()
            .filter_map(|n| self.sources.get(&n).map(|c| (n.clone(), c.clone())))
            .collect())
    }

    pub fn clear(&mut self) {
        self.registry.clear();
        self.connections.clear();
        self.sources.clear();
        self.structure = None;
        info!("board cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn reply(imports: bool, functions: &[&str]) -> ImportAnalysis {
        ImportAnalysis {
            imports,
            entities: Entities {
                functions: functions.iter().map(|f| f.to_string()).collect(),
                classes: Vec::new(),
            },
            analysis: json!({"script_type": "Modul Python", "functions": []}),
        }
    }

    fn board_with_main() -> BoardState {
        let mut board = BoardState::default();
        board
            .accept_script("app.py", "def run():\n    pass\n", NodeRole::Main, &mut rng())
            .unwrap();
        board
    }

    mod accept_tests {
        use super::*;

        #[test]
        fn rejects_non_python() {
            let mut board = BoardState::default();
            let err = board
                .accept_script("notes.txt", "hello", NodeRole::Secondary, &mut rng())
                .unwrap_err();
            assert!(matches!(err, BoardError::UnsupportedFile(_)));
            assert!(board.registry.is_empty());
        }

        #[test]
        fn reupload_keeps_position_and_updates_source() {
            let mut board = BoardState::default();
            let mut rng = rng();
            let first = board.accept_script("a.py", "x = 1", NodeRole::Secondary, &mut rng).unwrap();
            let second = board.accept_script("a.py", "x = 2", NodeRole::Secondary, &mut rng).unwrap();
            assert_eq!(first, second);
            assert_eq!(board.source("a.py"), Some("x = 2"));
            assert_eq!(board.registry.len(), 1);
        }

        #[test]
        fn new_main_demotes_previous() {
            let mut board = board_with_main();
            board.accept_script("run.py", "", NodeRole::Main, &mut rng()).unwrap();
            assert_eq!(board.registry.main_name(), Some("run.py"));
            assert!(!board.registry.get("app.py").unwrap().is_main());
        }
    }

    mod analysis_tests {
        use super::*;

        #[test]
        fn secondary_importing_main_gets_one_connection() {
            let mut board = board_with_main();
            board
                .accept_script("utils.py", "from app import run", NodeRole::Secondary, &mut rng())
                .unwrap();
            let id = board.apply_analysis("utils.py", &reply(true, &["run"])).unwrap();

            assert_eq!(board.connections.len(), 1);
            let conn = board.connections.get(id).unwrap();
            assert_eq!(conn.source, "app.py");
            assert_eq!(conn.target, "utils.py");
            assert_eq!(conn.entities.functions, vec!["run"]);
            let node = board.registry.get("utils.py").unwrap();
            assert!(node.imports_main);
            assert_eq!(node.script_type(), Some("Modul Python"));
        }

        #[test]
        fn reanalysis_adds_another_connection() {
            let mut board = board_with_main();
            board.accept_script("utils.py", "", NodeRole::Secondary, &mut rng()).unwrap();
            let a = board.apply_analysis("utils.py", &reply(true, &["run"])).unwrap();
            let b = board.apply_analysis("utils.py", &reply(true, &["run", "stop"])).unwrap();
            assert_eq!((a, b), (1, 2));
            assert_eq!(board.connections.len(), 2);
            assert_eq!(board.connections.get(a).unwrap().entities.functions, vec!["run"]);
            assert_eq!(board.connections.get(b).unwrap().entities.functions, vec!["run", "stop"]);
        }

        #[test]
        fn no_import_no_connection() {
            let mut board = board_with_main();
            board.accept_script("other.py", "", NodeRole::Secondary, &mut rng()).unwrap();
            assert!(board.apply_analysis("other.py", &reply(false, &[])).is_none());
            assert!(board.connections.is_empty());
            assert!(!board.registry.get("other.py").unwrap().imports_main);
            assert!(board.registry.get("other.py").unwrap().analysis.is_some());
        }

        #[test]
        fn main_analysis_only_stores_payload() {
            let mut board = board_with_main();
            assert!(board.apply_analysis("app.py", &reply(true, &[])).is_none());
            assert!(board.connections.is_empty());
            assert!(board.registry.main().unwrap().analysis.is_some());
        }

        #[test]
        fn late_reply_for_removed_node_is_dropped() {
            let mut board = board_with_main();
            board.accept_script("gone.py", "", NodeRole::Secondary, &mut rng()).unwrap();
            board.remove_node("gone.py");
            assert!(board.apply_analysis("gone.py", &reply(true, &["run"])).is_none());
            assert!(board.connections.is_empty());
            assert!(!board.registry.contains("gone.py"));
        }

        #[test]
        fn import_without_main_is_ignored() {
            let mut board = BoardState::default();
            board.accept_script("utils.py", "", NodeRole::Secondary, &mut rng()).unwrap();
            assert!(board.apply_analysis("utils.py", &reply(true, &["run"])).is_none());
            assert!(board.connections.is_empty());
        }
    }

    mod removal_tests {
        use super::*;

        #[test]
        fn removing_node_prunes_connections_and_source() {
            let mut board = board_with_main();
            let mut rng = rng();
            board.accept_script("a.py", "", NodeRole::Secondary, &mut rng).unwrap();
            board.accept_script("b.py", "", NodeRole::Secondary, &mut rng).unwrap();
            board.connect_manual("app.py", "a.py");
            board.connect_manual("a.py", "b.py");
            let keep = board.connect_manual("app.py", "b.py").unwrap();

            board.remove_node("a.py");
            assert_eq!(board.connections.len(), 1);
            assert!(board.connections.get(keep).is_some());
            assert!(board.source("a.py").is_none());
        }

        #[test]
        fn connect_requires_both_endpoints() {
            let mut board = board_with_main();
            assert!(board.connect_manual("app.py", "ghost.py").is_none());
            assert!(board.connections.is_empty());
        }

        #[test]
        fn manual_link_from_main_marks_target() {
            let mut board = board_with_main();
            let mut rng = rng();
            board.accept_script("a.py", "", NodeRole::Secondary, &mut rng).unwrap();
            board.accept_script("b.py", "", NodeRole::Secondary, &mut rng).unwrap();
            board.connect_manual("a.py", "b.py").unwrap();
            assert!(!board.registry.get("b.py").unwrap().imports_main);
            board.connect_manual("app.py", "a.py").unwrap();
            assert!(board.registry.get("a.py").unwrap().imports_main);
        }

        #[test]
        fn remove_single_connection() {
            let mut board = board_with_main();
            board.accept_script("a.py", "", NodeRole::Secondary, &mut rng()).unwrap();
            let id = board.connect_manual("app.py", "a.py").unwrap();
            assert_eq!(board.remove_connection(id).unwrap().target, "a.py");
            assert!(board.remove_connection(id).is_none());
            assert!(board.registry.contains("a.py"));
        }

        #[test]
        fn clear_empties_everything() {
            let mut board = board_with_main();
            let mut rng = rng();
            for i in 0..12 {
                let name = format!("s{}.py", i);
                board.accept_script(&name, "", NodeRole::Secondary, &mut rng).unwrap();
                board.apply_analysis(&name, &reply(true, &[]));
            }
            board.set_structure(StructureInfo {
                id: "abc".into(),
                total_files: 13,
                python_files: 13,
            });
            board.clear();
            assert!(board.registry.is_empty());
            assert!(board.connections.is_empty());
            assert!(board.source("app.py").is_none());
            assert!(board.structure().is_none());
            assert!(!board.has_main());
        }
    }

    mod edit_tests {
        use super::*;

        #[test]
        fn editing_secondary_reanalyzes_only_itself() {
            let mut board = board_with_main();
            board.accept_script("a.py", "old", NodeRole::Secondary, &mut rng()).unwrap();
            let todo = board.save_edit("a.py", "import app").unwrap();
            assert_eq!(todo, vec![("a.py".to_string(), "import app".to_string())]);
            let node = board.registry.get("a.py").unwrap();
            assert!(node.edited);
            assert_eq!(node.preview, "import app...");
        }

        #[test]
        fn editing_main_reanalyzes_every_secondary() {
            let mut board = board_with_main();
            let mut rng = rng();
            board.accept_script("a.py", "a", NodeRole::Secondary, &mut rng).unwrap();
            board.accept_script("b.py", "b", NodeRole::Secondary, &mut rng).unwrap();
            let names: Vec<_> = board
                .save_edit("app.py", "def run(): ...")
                .unwrap()
                .into_iter()
                .map(|(n, _)| n)
                .collect();
            assert_eq!(names, vec!["app.py", "a.py", "b.py"]);
        }

        #[test]
        fn editing_missing_node_fails() {
            let mut board = BoardState::default();
            assert!(matches!(board.save_edit("x.py", ""), Err(BoardError::Validation(_))));
        }
    }
}
