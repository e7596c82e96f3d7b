//! User-facing operations. Each one mutates the board through short
//! `RefCell` borrows, talks to the analyzer in between, and reports the
//! outcome as a transient notice.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use gloo_timers::future::TimeoutFuture;
use leptos::html::Canvas;
use leptos::prelude::*;
use log::{error, info, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use web_sys::{File, HtmlCanvasElement};

use crate::analyzer::{choose_entry_point, AnalyzerClient};
use crate::board::{BoardState, StructureInfo};
use crate::canvas::{build_frame, get_canvas_context, render_frame};
use crate::config::BoardConfig;
use crate::error::{BoardError, Result};
use crate::ingest::{self, IngestLimits};
use crate::interaction::Interaction;
use crate::report::build_report;
use crate::scheduler::RedrawLoop;
use crate::state::{NodeRole, Rect, Size};

/// Progress bar stays up this long after a directory upload finishes.
const PROGRESS_LINGER_MS: u32 = 2000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

impl NoticeLevel {
    pub fn color(self) -> &'static str {
        match self {
            Self::Info => "#00c3ff",
            Self::Success => "#229966",
            Self::Error => "#ff2929",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub id: u64,
    pub text: String,
    pub level: NoticeLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

/// Script viewer/editor state. `editing` switches between read-only view
/// and the textarea bound to `UiSignals::draft`.
#[derive(Clone, Debug, PartialEq)]
pub struct ModalState {
    pub name: String,
    pub editing: bool,
}

/// Reactive surface of the UI. Board data itself is not reactive; a bump
/// of `revision` is the single signal that it changed.
#[derive(Clone, Copy)]
pub struct UiSignals {
    pub revision: RwSignal<u64>,
    pub notice: RwSignal<Option<Notice>>,
    pub progress: RwSignal<Option<Progress>>,
    pub report: RwSignal<Option<String>>,
    pub modal: RwSignal<Option<ModalState>>,
    pub draft: RwSignal<String>,
}

impl UiSignals {
    pub fn new() -> Self {
        Self {
            revision: RwSignal::new(0),
            notice: RwSignal::new(None),
            progress: RwSignal::new(None),
            report: RwSignal::new(None),
            modal: RwSignal::new(None),
            draft: RwSignal::new(String::new()),
        }
    }
}

impl Default for UiSignals {
    fn default() -> Self {
        Self::new()
    }
}

/// Repaints the connection overlay, resizing the backing store to the
/// displayed size first.
pub fn paint(canvas: &HtmlCanvasElement, board: &BoardState, interaction: &Interaction) {
    let width = canvas.client_width().max(0) as u32;
    let height = canvas.client_height().max(0) as u32;
    if canvas.width() != width {
        canvas.set_width(width);
    }
    if canvas.height() != height {
        canvas.set_height(height);
    }

    match get_canvas_context(canvas) {
        Ok(ctx) => {
            let bounds = Rect::new(0.0, 0.0, width as f64, height as f64);
            render_frame(&ctx, &build_frame(board, interaction, bounds));
        }
        Err(e) => error!("render skipped, no canvas context: {:?}", e),
    }
}

/// Awaits `save`, then analyzes every script whatever the save returned.
/// Yields the save outcome and the first analysis failure.
pub async fn save_and_reanalyze<S, A, AF>(
    save: S,
    scripts: Vec<(String, String)>,
    analyze: A,
) -> (Result<()>, Result<()>)
where
    S: Future<Output = Result<()>>,
    A: Fn(String, String) -> AF,
    AF: Future<Output = Result<()>>,
{
    let saved = save.await;
    let mut analyzed = Ok(());
    for (script, source) in scripts {
        if let Err(e) = analyze(script, source).await {
            warn!("re-analysis failed: {}", e);
            if analyzed.is_ok() {
                analyzed = Err(e);
            }
        }
    }
    (saved, analyzed)
}

/// Cheap-to-clone handle on everything the operations touch.
#[derive(Clone)]
pub struct Editor {
    pub board: Rc<RefCell<BoardState>>,
    pub interaction: Rc<RefCell<Interaction>>,
    pub client: AnalyzerClient,
    pub config: Rc<BoardConfig>,
    pub ui: UiSignals,
    rng: Rc<RefCell<SmallRng>>,
    redraw: Rc<RefCell<RedrawLoop>>,
    next_notice: Rc<RefCell<u64>>,
}

impl Editor {
    pub fn new(config: BoardConfig, ui: UiSignals, canvas: NodeRef<Canvas>) -> Self {
        let board = Rc::new(RefCell::new(BoardState::default()));
        let interaction = Rc::new(RefCell::new(Interaction::new()));

        let render: Rc<dyn Fn()> = {
            let board = board.clone();
            let interaction = interaction.clone();
            Rc::new(move || {
                if let Some(canvas) = canvas.get_untracked() {
                    paint(&canvas, &board.borrow(), &interaction.borrow());
                }
                ui.revision.update(|r| *r = r.wrapping_add(1));
            })
        };

        Self {
            board,
            interaction,
            client: AnalyzerClient::new(config.analyzer_url.clone()),
            redraw: RedrawLoop::new(config.frame_budget_ms, render),
            config: Rc::new(config),
            ui,
            rng: Rc::new(RefCell::new(SmallRng::from_entropy())),
            next_notice: Rc::new(RefCell::new(0)),
        }
    }

    pub fn request_redraw(&self) {
        RedrawLoop::request(&self.redraw);
    }

    pub fn notify(&self, text: impl Into<String>, level: NoticeLevel) {
        let id = {
            let mut next = self.next_notice.borrow_mut();
            *next += 1;
            *next
        };
        self.ui.notice.set(Some(Notice {
            id,
            text: text.into(),
            level,
        }));
        let notice = self.ui.notice;
        Timeout::new(self.config.notice_duration_ms, move || {
            if notice.get_untracked().is_some_and(|n| n.id == id) {
                notice.set(None);
            }
        })
        .forget();
    }

    pub fn report_error(&self, err: &BoardError) {
        if err.is_input_error() {
            info!("rejected: {}", err);
        } else {
            warn!("{}", err);
        }
        self.notify(err.to_string(), NoticeLevel::Error);
    }

    pub fn set_board_size(&self, size: Size) {
        self.board.borrow_mut().set_board_size(size);
    }

    // --- script loading ---

    pub async fn load_file(&self, file: File, role: NodeRole) -> Result<()> {
        let meta = ingest::browser_file_meta(&file);
        ingest::check_script_name(&meta.name)?;
        ingest::check_file_size(&meta, self.config.max_file_bytes)?;
        let content = ingest::read_browser_file(file).await?;
        self.add_script(&meta.name, &content, role).await
    }

    pub async fn load_files(&self, files: Vec<File>) -> Result<()> {
        ingest::check_upload_count(files.len(), self.config.max_files_per_upload)?;
        for file in files {
            if let Err(e) = self.load_file(file, NodeRole::Secondary).await {
                self.report_error(&e);
            }
        }
        Ok(())
    }

    /// Places the node, registers it with the analyzer and applies the
    /// import analysis once it arrives.
    pub async fn add_script(&self, name: &str, content: &str, role: NodeRole) -> Result<()> {
        {
            let mut board = self.board.borrow_mut();
            let mut rng = self.rng.borrow_mut();
            board.accept_script(name, content, role, &mut *rng)?;
        }
        self.request_redraw();

        match role {
            NodeRole::Main => self.client.set_main(name, content).await?,
            NodeRole::Secondary => self.client.add_secondary(name, content).await?,
        }
        self.analyze(name, content).await?;

        let label = match role {
            NodeRole::Main => "Main script",
            NodeRole::Secondary => "Script",
        };
        self.notify(format!("{} {} loaded", label, name), NoticeLevel::Success);
        Ok(())
    }

    async fn analyze(&self, name: &str, content: &str) -> Result<()> {
        let reply = self.client.analyze(name, content).await?;
        let created = self.board.borrow_mut().apply_analysis(name, &reply);
        if let Some(id) = created {
            info!("{} imports the main script (connection {})", name, id);
        }
        self.request_redraw();
        Ok(())
    }

    // --- directories ---

    pub async fn load_directory(&self, files: Vec<File>) -> Result<()> {
        let items: Vec<_> = files
            .into_iter()
            .map(|file| (ingest::browser_file_meta(&file), file))
            .collect();
        let limits = IngestLimits::from(self.config.as_ref());
        let yield_ms = self.config.batch_yield_ms;
        let progress = self.ui.progress;

        let report = ingest::ingest(
            items,
            limits,
            ingest::read_browser_file,
            move || TimeoutFuture::new(yield_ms),
            move |done, total| progress.set(Some(Progress { done, total })),
        )
        .await;
        Timeout::new(PROGRESS_LINGER_MS, move || progress.set(None)).forget();
        let report = report?;

        let reply = self.client.save_structure(&report.tree, &report.files).await?;
        self.board.borrow_mut().set_structure(StructureInfo {
            id: reply.structure_id.clone(),
            total_files: reply.total_files,
            python_files: reply.python_files,
        });

        if let Some(entry) = choose_entry_point(&reply.entry_points) {
            let file = self.client.file_content(&reply.structure_id, &entry.path).await?;
            self.add_script(&file.name, &file.content, NodeRole::Main).await?;
        }
        self.notify(
            format!(
                "Structure loaded: {} files, {} Python",
                reply.total_files, reply.python_files
            ),
            NoticeLevel::Success,
        );
        Ok(())
    }

    // --- editing ---

    /// Saves an in-browser edit, then re-analyzes whatever it affects. The
    /// local edit stands even when the analyzer refuses to store it.
    pub async fn save_edit(&self, name: &str, content: &str) -> Result<()> {
        let scripts = self.board.borrow_mut().save_edit(name, content)?;
        self.request_redraw();
        let save = self.client.save_edit(name, content);
        let (saved, analyzed) = save_and_reanalyze(save, scripts, |script, source| async move {
            self.analyze(&script, &source).await
        })
        .await;
        match saved {
            Ok(()) => self.notify(format!("Changes saved for {}", name), NoticeLevel::Success),
            Err(e) => self.report_error(&e),
        }
        analyzed
    }

    pub async fn check_session(&self) {
        match self.client.session_edits().await {
            Ok(edits) if edits.count > 0 => {
                self.notify(format!("{} file(s) edited in this session", edits.count), NoticeLevel::Info)
            }
            Ok(_) => {}
            Err(e) => info!("session check skipped: {}", e),
        }
    }

    // --- board commands ---

    pub fn arm_connection(&self) {
        let armed = {
            let board = self.board.borrow();
            self.interaction.borrow_mut().arm_connection(&board)
        };
        match armed {
            Ok(()) => {
                self.notify("Select two pins to create a connection", NoticeLevel::Info);
                self.request_redraw();
            }
            Err(e) => self.report_error(&e),
        }
    }

    pub fn remove_node(&self, name: &str) {
        let removed = self.board.borrow_mut().remove_node(name);
        if removed.is_some() {
            let mut interaction = self.interaction.borrow_mut();
            if interaction.pin_selected(name) {
                interaction.cancel_connection();
            }
            interaction.select_connection(None);
        }
        if self.ui.modal.get_untracked().is_some_and(|m| m.name == name) {
            self.ui.modal.set(None);
        }
        self.request_redraw();
    }

    pub fn delete_selected_connection(&self) {
        let removed = {
            let mut board = self.board.borrow_mut();
            self.interaction.borrow_mut().delete_selected(&mut board)
        };
        if let Some(conn) = removed {
            self.notify(
                format!("Connection {} -> {} removed", conn.source, conn.target),
                NoticeLevel::Info,
            );
            self.request_redraw();
        }
    }

    pub fn reset_view(&self) {
        self.board.borrow_mut().viewport.reset();
        self.request_redraw();
    }

    pub fn clear(&self) {
        self.board.borrow_mut().clear();
        self.interaction.borrow_mut().reset();
        self.ui.report.set(None);
        self.ui.modal.set(None);
        self.request_redraw();
        self.notify("Board cleared", NoticeLevel::Success);
    }

    pub fn generate_report(&self) {
        let stamp: String = js_sys::Date::new_0().to_locale_string("en-GB", &wasm_bindgen::JsValue::UNDEFINED).into();
        match build_report(&self.board.borrow(), &stamp) {
            Ok(text) => self.ui.report.set(Some(text)),
            Err(e) => self.report_error(&e),
        }
    }

    /// Runs an async operation in the background, surfacing its error.
    pub fn spawn<F, Fut>(&self, op: F)
    where
        F: FnOnce(Editor) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        let editor = self.clone();
        leptos::task::spawn_local(async move {
            if let Err(e) = op(editor.clone()).await {
                editor.report_error(&e);
            }
        });
    }
}
