//! Reading user-selected files: single scripts, multi-selects and whole
//! directories. Directory reads run in fixed-size batches with a yield in
//! between so the page stays responsive.

use std::collections::BTreeMap;
use std::future::Future;

use futures::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FileList};

use crate::config::BoardConfig;
use crate::error::{BoardError, Result};

pub const VALID_EXTENSIONS: [&str; 20] = [
    "py", "pyw", "pyx", "pyi", "pyc", "pyd", "pyo", "txt", "md", "json", "yml", "yaml", "cfg", "ini",
    "js", "html", "css", "xml", "toml", "rst",
];

pub const LARGE_FILE_PLACEHOLDER: &str = "[file too large, content not loaded]";

const MIB: u64 = 1024 * 1024;

/// What is known about a file before reading it.
#[derive(Clone, Debug, PartialEq)]
pub struct FileMeta {
    pub name: String,
    /// Path relative to the selected directory, or the bare name.
    pub path: String,
    pub size: u64,
}

impl FileMeta {
    pub fn new(name: impl Into<String>, path: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        let path = path.into();
        let path = if path.is_empty() { name.clone() } else { path };
        Self { name, path, size }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IngestLimits {
    pub batch_size: usize,
    pub max_file_bytes: u64,
    pub inline_content_bytes: u64,
}

impl From<&BoardConfig> for IngestLimits {
    fn from(config: &BoardConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            max_file_bytes: config.max_file_bytes,
            inline_content_bytes: config.inline_content_bytes,
        }
    }
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self::from(&BoardConfig::default())
    }
}

fn extension(name: &str) -> String {
    name.rsplit('.').next().unwrap_or_default().to_lowercase()
}

pub fn is_valid_file(meta: &FileMeta, limits: &IngestLimits) -> bool {
    VALID_EXTENSIONS.contains(&extension(&meta.name).as_str()) && meta.size <= limits.max_file_bytes
}

/// Coarse category the analyzer uses to group files.
pub fn file_kind(name: &str) -> &'static str {
    match extension(name).as_str() {
        "py" | "pyw" | "pyx" | "pyi" | "pyc" | "pyd" | "pyo" => "python",
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "html" | "htm" | "css" | "scss" | "sass" => "web",
        "json" | "yml" | "yaml" | "xml" | "ini" | "cfg" | "toml" => "config",
        "txt" | "log" => "text",
        "md" | "rst" => "doc",
        "sh" => "shell",
        "bat" => "batch",
        _ => "other",
    }
}

/// A single-script upload must be Python.
pub fn check_script_name(name: &str) -> Result<()> {
    if name.ends_with(".py") {
        Ok(())
    } else {
        Err(BoardError::UnsupportedFile(name.to_string()))
    }
}

pub fn check_upload_count(count: usize, limit: usize) -> Result<()> {
    if count > limit {
        return Err(BoardError::TooManyFiles { count, limit });
    }
    Ok(())
}

pub fn check_file_size(meta: &FileMeta, limit: u64) -> Result<()> {
    if meta.size > limit {
        return Err(BoardError::FileTooLarge {
            name: meta.name.clone(),
            limit_mib: limit / MIB,
        });
    }
    Ok(())
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct IngestedFile {
    pub name: String,
    pub path: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

/// Folder tree sent alongside the flat file list.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct DirectoryTree {
    pub name: String,
    #[serde(rename = "type")]
    kind: &'static str,
    pub children: BTreeMap<String, DirectoryTree>,
    pub files: Vec<IngestedFile>,
}

impl Default for DirectoryTree {
    fn default() -> Self {
        Self::folder("root")
    }
}

impl DirectoryTree {
    pub fn folder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: "folder",
            children: BTreeMap::new(),
            files: Vec::new(),
        }
    }

    /// Files the path's directories, creating folders as needed.
    pub fn insert(&mut self, file: IngestedFile) {
        let parts: Vec<&str> = file.path.split('/').filter(|p| !p.is_empty()).collect();
        let mut current = self;
        for dir in parts.iter().take(parts.len().saturating_sub(1)) {
            current = current
                .children
                .entry(dir.to_string())
                .or_insert_with(|| DirectoryTree::folder(dir));
        }
        current.files.push(file);
    }

    pub fn file_count(&self) -> usize {
        self.files.len() + self.children.values().map(DirectoryTree::file_count).sum::<usize>()
    }
}

#[derive(Clone, Debug, Default)]
pub struct IngestReport {
    pub tree: DirectoryTree,
    pub files: Vec<IngestedFile>,
    /// Rejected by extension or size before reading.
    pub skipped: Vec<String>,
    /// Accepted but unreadable.
    pub failed: Vec<String>,
}

/// Reads every valid file in batches of `limits.batch_size`. Reads inside
/// a batch run together; `yield_now` is awaited between batches. `progress`
/// gets `(done, total)` once per accepted file, read or not.
pub async fn ingest<H, R, RF, Y, YF, P>(
    items: Vec<(FileMeta, H)>,
    limits: IngestLimits,
    read: R,
    yield_now: Y,
    mut progress: P,
) -> Result<IngestReport>
where
    R: Fn(H) -> RF,
    RF: Future<Output = Result<String>>,
    Y: Fn() -> YF,
    YF: Future<Output = ()>,
    P: FnMut(usize, usize),
{
    let mut report = IngestReport::default();
    let mut valid = Vec::new();
    for (meta, handle) in items {
        if is_valid_file(&meta, &limits) {
            valid.push((meta, handle));
        } else {
            warn!("skipping {} ({} bytes)", meta.path, meta.size);
            report.skipped.push(meta.path);
        }
    }
    if valid.is_empty() {
        return Err(BoardError::Validation("no valid files found".to_string()));
    }

    let total = valid.len();
    let batch_size = limits.batch_size.max(1);
    let read = &read;
    let mut done = 0;
    let mut remaining = valid.into_iter().peekable();

    while remaining.peek().is_some() {
        let batch: Vec<_> = remaining.by_ref().take(batch_size).collect();
        let reads = batch.into_iter().map(|(meta, handle)| async move {
            let content = if meta.size >= limits.inline_content_bytes {
                Ok(LARGE_FILE_PLACEHOLDER.to_string())
            } else {
                read(handle).await
            };
            (meta, content)
        });

        for (meta, content) in join_all(reads).await {
            done += 1;
            match content {
                Ok(content) => {
                    let file = IngestedFile {
                        kind: file_kind(&meta.name).to_string(),
                        name: meta.name,
                        path: meta.path,
                        size: meta.size,
                        content,
                    };
                    report.tree.insert(file.clone());
                    report.files.push(file);
                }
                Err(e) => {
                    warn!("could not read {}: {}", meta.path, e);
                    report.failed.push(meta.path);
                }
            }
            progress(done, total);
        }

        if remaining.peek().is_some() {
            debug!("ingested {}/{} files, yielding", done, total);
            yield_now().await;
        }
    }

    info!(
        "ingested {} file(s), {} skipped, {} failed",
        report.files.len(),
        report.skipped.len(),
        report.failed.len()
    );
    Ok(report)
}

// --- browser glue ---

pub fn files_from_list(list: &FileList) -> Vec<File> {
    (0..list.length()).filter_map(|i| list.get(i)).collect()
}

/// Metadata for a browser file. Directory picks carry `webkitRelativePath`,
/// which web-sys does not expose.
pub fn browser_file_meta(file: &File) -> FileMeta {
    let relative = js_sys::Reflect::get(file.as_ref(), &JsValue::from_str("webkitRelativePath"))
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_default();
    FileMeta::new(file.name(), relative, file.size() as u64)
}

pub async fn read_browser_file(file: File) -> Result<String> {
    let text = JsFuture::from(file.text()).await?;
    text.as_string()
        .ok_or_else(|| BoardError::Browser(format!("{} is not text", file.name())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::{Cell, RefCell};

    fn meta(path: &str, size: u64) -> FileMeta {
        let name = path.rsplit('/').next().unwrap();
        FileMeta::new(name, path, size)
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn extension_allow_list() {
            let limits = IngestLimits::default();
            assert!(is_valid_file(&meta("a/app.py", 10), &limits));
            assert!(is_valid_file(&meta("a/README.MD", 10), &limits));
            assert!(is_valid_file(&meta("setup.cfg", 10), &limits));
            assert!(!is_valid_file(&meta("a/logo.png", 10), &limits));
            assert!(!is_valid_file(&meta("Makefile", 10), &limits));
        }

        #[test]
        fn size_limit_is_inclusive() {
            let limits = IngestLimits::default();
            assert!(is_valid_file(&meta("big.py", 10 * MIB), &limits));
            assert!(!is_valid_file(&meta("big.py", 10 * MIB + 1), &limits));
            let err = check_file_size(&meta("big.py", 11 * MIB), 10 * MIB).unwrap_err();
            assert_eq!(err.to_string(), "big.py is larger than the 10 MiB limit");
        }

        #[test]
        fn upload_rules() {
            assert!(check_script_name("app.py").is_ok());
            assert!(matches!(check_script_name("app.txt"), Err(BoardError::UnsupportedFile(_))));
            assert!(check_upload_count(100, 100).is_ok());
            assert!(matches!(
                check_upload_count(101, 100),
                Err(BoardError::TooManyFiles { count: 101, limit: 100 })
            ));
        }

        #[test]
        fn kinds() {
            assert_eq!(file_kind("x.pyi"), "python");
            assert_eq!(file_kind("x.tsx"), "typescript");
            assert_eq!(file_kind("x.yaml"), "config");
            assert_eq!(file_kind("x.rst"), "doc");
            assert_eq!(file_kind("run.sh"), "shell");
            assert_eq!(file_kind("LICENSE"), "other");
        }

        #[test]
        fn empty_relative_path_falls_back_to_name() {
            assert_eq!(FileMeta::new("a.py", "", 1).path, "a.py");
        }
    }

    mod tree_tests {
        use super::*;

        fn file(path: &str) -> IngestedFile {
            IngestedFile {
                name: path.rsplit('/').next().unwrap().to_string(),
                path: path.to_string(),
                size: 1,
                kind: "python".to_string(),
                content: String::new(),
            }
        }

        #[test]
        fn nested_paths_create_folders() {
            let mut tree = DirectoryTree::default();
            tree.insert(file("proj/main.py"));
            tree.insert(file("proj/pkg/util.py"));
            tree.insert(file("proj/pkg/sub/deep.py"));
            tree.insert(file("loose.py"));

            assert_eq!(tree.files.len(), 1);
            let proj = &tree.children["proj"];
            assert_eq!(proj.files[0].name, "main.py");
            assert_eq!(proj.children["pkg"].children["sub"].files[0].name, "deep.py");
            assert_eq!(tree.file_count(), 4);
        }

        #[test]
        fn serializes_in_analyzer_shape() {
            let mut tree = DirectoryTree::default();
            tree.insert(file("proj/main.py"));
            let json = serde_json::to_value(&tree).unwrap();
            assert_eq!(json["name"], "root");
            assert_eq!(json["type"], "folder");
            assert_eq!(json["children"]["proj"]["files"][0]["type"], "python");
            assert_eq!(json["children"]["proj"]["files"][0]["path"], "proj/main.py");
        }
    }

    mod batch_tests {
        use super::*;

        fn items(n: usize) -> Vec<(FileMeta, usize)> {
            (0..n).map(|i| (meta(&format!("proj/f{}.py", i), 100), i)).collect()
        }

        #[test]
        fn twenty_five_files_in_three_batches() {
            let yields = Cell::new(0);
            let progress = RefCell::new(Vec::new());
            let report = block_on(ingest(
                items(25),
                IngestLimits::default(),
                |i: usize| async move { Ok(format!("# file {}", i)) },
                || {
                    yields.set(yields.get() + 1);
                    async {}
                },
                |done, total| progress.borrow_mut().push((done, total)),
            ))
            .unwrap();

            assert_eq!(report.files.len(), 25);
            assert_eq!(yields.get(), 2);
            let progress = progress.into_inner();
            assert_eq!(progress.len(), 25);
            assert_eq!(progress.last(), Some(&(25, 25)));
            assert!(progress.windows(2).all(|w| w[1].0 == w[0].0 + 1));
            assert_eq!(report.tree.file_count(), 25);
        }

        #[test]
        fn failures_still_count_towards_progress() {
            let last = Cell::new((0, 0));
            let report = block_on(ingest(
                items(4),
                IngestLimits::default(),
                |i: usize| async move {
                    if i == 2 {
                        Err(BoardError::Browser("read failed".into()))
                    } else {
                        Ok(String::new())
                    }
                },
                || async {},
                |done, total| last.set((done, total)),
            ))
            .unwrap();
            assert_eq!(last.get(), (4, 4));
            assert_eq!(report.files.len(), 3);
            assert_eq!(report.failed, vec!["proj/f2.py"]);
        }

        #[test]
        fn large_files_get_placeholder_without_read() {
            let reads = Cell::new(0);
            let items = vec![(meta("big.py", 2 * MIB), 0usize), (meta("small.py", 10), 1usize)];
            let report = block_on(ingest(
                items,
                IngestLimits::default(),
                |_| {
                    reads.set(reads.get() + 1);
                    async { Ok("x = 1".to_string()) }
                },
                || async {},
                |_, _| {},
            ))
            .unwrap();
            assert_eq!(reads.get(), 1);
            assert_eq!(report.files[0].content, LARGE_FILE_PLACEHOLDER);
            assert_eq!(report.files[1].content, "x = 1");
        }

        #[test]
        fn invalid_files_are_skipped_and_total_excludes_them() {
            let last = Cell::new((0, 0));
            let mut all = items(3);
            all.push((meta("proj/logo.png", 10), 99));
            all.push((meta("proj/huge.py", 20 * MIB), 98));
            let report = block_on(ingest(
                all,
                IngestLimits::default(),
                |_| async { Ok(String::new()) },
                || async {},
                |done, total| last.set((done, total)),
            ))
            .unwrap();
            assert_eq!(last.get(), (3, 3));
            assert_eq!(report.skipped, vec!["proj/logo.png", "proj/huge.py"]);
        }

        #[test]
        fn nothing_valid_is_an_error() {
            let result = block_on(ingest(
                vec![(meta("a.png", 1), 0usize)],
                IngestLimits::default(),
                |_| async { Ok(String::new()) },
                || async {},
                |_, _| {},
            ));
            assert!(matches!(result, Err(BoardError::Validation(_))));
        }
    }
}
