use log::{info, warn};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::HtmlScriptElement;

use crate::scheduler::FRAME_BUDGET_MS;

pub const CONFIG_ELEMENT_ID: &str = "board-config";

/// Runtime settings. Every field has a default so a partial JSON object is
/// enough to override a single value.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BoardConfig {
    pub analyzer_url: String,
    pub frame_budget_ms: f64,
    pub notice_duration_ms: u32,
    pub batch_size: usize,
    pub batch_yield_ms: u32,
    pub max_files_per_upload: usize,
    pub max_file_bytes: u64,
    pub inline_content_bytes: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            analyzer_url: "http://localhost:5000".to_string(),
            frame_budget_ms: FRAME_BUDGET_MS,
            notice_duration_ms: 3500,
            batch_size: 10,
            batch_yield_ms: 10,
            max_files_per_upload: 100,
            max_file_bytes: 10 * 1024 * 1024,
            inline_content_bytes: 1024 * 1024,
        }
    }
}

impl BoardConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Reads `<script id="board-config" type="application/json">` if the page
/// provides one. Missing or malformed config falls back to defaults.
pub fn load_config() -> BoardConfig {
    let text = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
        .and_then(|el| el.dyn_into::<HtmlScriptElement>().ok())
        .and_then(|script| script.text().ok());

    let Some(text) = text else {
        return BoardConfig::default();
    };

    match BoardConfig::from_json(&text) {
        Ok(config) => {
            info!("script-board: config loaded, analyzer at {}", config.analyzer_url);
            config
        }
        Err(e) => {
            warn!("script-board: ignoring malformed config: {}", e);
            BoardConfig::default()
        }
    }
}
