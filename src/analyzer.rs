//! HTTP boundary with the external script analyzer.
//!
//! The analyzer owns parsing, import detection and persistence; the board
//! only sends file contents and reads back the few fields it renders.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BoardError, Result};
use crate::ingest::{DirectoryTree, IngestedFile};
use crate::state::Entities;

/// Preferred entry points, in priority order.
pub const ENTRY_POINT_NAMES: [&str; 4] = ["main.py", "app.py", "run.py", "__main__.py"];

#[derive(Serialize)]
struct ScriptPayload<'a> {
    filename: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct StructurePayload<'a> {
    structure: &'a DirectoryTree,
    files: &'a [IngestedFile],
}

#[derive(Serialize)]
struct FileContentPayload<'a> {
    structure_id: &'a str,
    file_path: &'a str,
}

/// Common `{status, message}` envelope. A missing status counts as success.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct StatusReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusReply {
    pub fn ensure_ok(self) -> Result<Self> {
        match self.status.as_deref() {
            Some("error") => Err(BoardError::Rejected(
                self.message.unwrap_or_else(|| "unknown error".to_string()),
            )),
            _ => Ok(self),
        }
    }
}

/// Reply to an import analysis request.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ImportAnalysis {
    /// Whether the analyzed script imports the current main module.
    #[serde(default)]
    pub imports: bool,
    #[serde(default)]
    pub entities: Entities,
    /// Opaque payload, kept verbatim on the node.
    #[serde(default)]
    pub analysis: Value,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FunctionInfo {
    pub name: String,
    #[serde(default = "default_complexity")]
    pub complexity: u32,
}

fn default_complexity() -> u32 {
    1
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ClassInfo {
    pub name: String,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
enum ImportEntry {
    Name(String),
    Detail { module: String },
}

/// The handful of analysis fields the board reads. Anything the analyzer
/// sends that does not fit is ignored.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AnalysisSummary {
    #[serde(default)]
    pub script_type: Option<String>,
    #[serde(default)]
    pub functions: Vec<FunctionInfo>,
    #[serde(default)]
    pub classes: Vec<ClassInfo>,
    #[serde(default, deserialize_with = "import_names")]
    pub imports: Vec<String>,
}

fn import_names<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let entries = Vec::<ImportEntry>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            ImportEntry::Name(name) => name,
            ImportEntry::Detail { module } => module,
        })
        .collect())
}

impl AnalysisSummary {
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct SessionEdits {
    #[serde(default)]
    pub count: usize,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct EntryPoint {
    pub name: String,
    pub path: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct StructureReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub structure_id: String,
    #[serde(default)]
    pub entry_points: Vec<EntryPoint>,
    #[serde(default)]
    pub total_files: usize,
    #[serde(default)]
    pub python_files: usize,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RemoteFile {
    pub name: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize, Clone, Debug)]
struct FileContentReply {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    file: Option<RemoteFile>,
}

/// Picks the entry point that becomes the main node: the first one, in the
/// analyzer's order, with a well-known name.
pub fn choose_entry_point(entry_points: &[EntryPoint]) -> Option<&EntryPoint> {
    entry_points
        .iter()
        .find(|ep| ENTRY_POINT_NAMES.contains(&ep.name.as_str()))
        .or_else(|| entry_points.first())
}

/// Module name the analyzer expects for the main script.
pub fn module_name(file_name: &str) -> &str {
    file_name.strip_suffix(".py").unwrap_or(file_name)
}

#[derive(Clone, Debug)]
pub struct AnalyzerClient {
    http: reqwest::Client,
    base_url: String,
}

impl AnalyzerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let url = self.endpoint(path);
        debug!("POST {}", url);
        let response = self.http.post(&url).json(body).send().await?;
        let response = response.error_for_status()?;
        Ok(response.json::<R>().await?)
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let url = self.endpoint(path);
        debug!("GET {}", url);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        Ok(response.json::<R>().await?)
    }

    pub async fn set_main(&self, file_name: &str, content: &str) -> Result<()> {
        let payload = ScriptPayload {
            filename: module_name(file_name),
            content,
        };
        self.post::<_, StatusReply>("set_principal", &payload).await?.ensure_ok()?;
        Ok(())
    }

    pub async fn add_secondary(&self, file_name: &str, content: &str) -> Result<()> {
        let payload = ScriptPayload {
            filename: file_name,
            content,
        };
        self.post::<_, StatusReply>("add_secundar", &payload).await?.ensure_ok()?;
        Ok(())
    }

    pub async fn analyze(&self, file_name: &str, content: &str) -> Result<ImportAnalysis> {
        let payload = ScriptPayload {
            filename: file_name,
            content,
        };
        self.post("analyze_imports", &payload).await
    }

    pub async fn save_edit(&self, file_name: &str, content: &str) -> Result<()> {
        let payload = ScriptPayload {
            filename: file_name,
            content,
        };
        self.post::<_, StatusReply>("save_session_edit", &payload).await?.ensure_ok()?;
        Ok(())
    }

    pub async fn session_edits(&self) -> Result<SessionEdits> {
        self.get("get_session_edits").await
    }

    pub async fn save_structure(&self, structure: &DirectoryTree, files: &[IngestedFile]) -> Result<StructureReply> {
        let reply: StructureReply = self
            .post("save_directory_structure", &StructurePayload { structure, files })
            .await?;
        StatusReply {
            status: reply.status.clone(),
            message: reply.message.clone(),
        }
        .ensure_ok()?;
        Ok(reply)
    }

    pub async fn file_content(&self, structure_id: &str, file_path: &str) -> Result<RemoteFile> {
        let reply: FileContentReply = self
            .post("get_file_content", &FileContentPayload { structure_id, file_path })
            .await?;
        StatusReply {
            status: reply.status,
            message: reply.message,
        }
        .ensure_ok()?;
        reply.file.ok_or_else(|| {
            warn!("analyzer returned no file for {}", file_path);
            BoardError::Rejected(format!("no content for {}", file_path))
        })
    }
}
