mod node_card;
mod report_panel;
mod script_modal;
mod status;
mod toolbar;

pub use node_card::{NodeCard, NodeCardView};
pub use report_panel::ReportPanel;
pub use script_modal::ScriptModal;
pub use status::{ProgressBar, Toast};
pub use toolbar::Toolbar;
