use leptos::html::{Canvas, Div};
use leptos::prelude::*;
use log::info;

use crate::actions::{Editor, UiSignals};
use crate::canvas::{build_frame, connection_at};
use crate::components::{NodeCard, NodeCardView, ProgressBar, ReportPanel, ScriptModal, Toast, Toolbar};
use crate::config::load_config;
use crate::interaction::PointerButton;
use crate::state::{Point, Rect, Size};

/// Pixels around a curve that still count as a click on it.
const CONNECTION_HIT_TOLERANCE: f64 = 6.0;

/// Shared by every component. The editor lives in local storage because it
/// owns `Rc` state.
#[derive(Clone, Copy)]
pub struct BoardCtx {
    pub editor: StoredValue<Editor, LocalStorage>,
    pub ui: UiSignals,
}

impl BoardCtx {
    pub fn editor(&self) -> Editor {
        self.editor.get_value()
    }
}

fn local_point(container: &web_sys::HtmlDivElement, ev: &web_sys::MouseEvent) -> Point {
    let rect = container.get_bounding_client_rect();
    Point::new(ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top())
}

fn container_size(container: &web_sys::HtmlDivElement) -> Size {
    Size::new(container.client_width() as f64, container.client_height() as f64)
}

#[component]
pub fn App() -> impl IntoView {
    let config = load_config();
    let ui = UiSignals::new();
    let canvas_ref = NodeRef::<Canvas>::new();
    let container_ref = NodeRef::<Div>::new();
    let editor = Editor::new(config, ui, canvas_ref);
    let ctx = BoardCtx {
        editor: StoredValue::new_local(editor),
        ui,
    };
    provide_context(ctx);

    // Size the board to the viewport once it is mounted, then check for
    // edits left over from an earlier session.
    Effect::new(move || {
        if let Some(container) = container_ref.get() {
            let editor = ctx.editor();
            editor.set_board_size(container_size(&container));
            editor.request_redraw();
            info!("script-board: mounted");
            leptos::task::spawn_local(async move { editor.check_session().await });
        }
    });

    let _resize = window_event_listener(leptos::ev::resize, move |_| {
        if let Some(container) = container_ref.get_untracked() {
            let editor = ctx.editor();
            editor.set_board_size(container_size(&container));
            editor.request_redraw();
        }
    });

    let on_mouse_down = move |ev: web_sys::MouseEvent| {
        let Some(container) = container_ref.get_untracked() else {
            return;
        };
        let _ = container.focus();
        let editor = ctx.editor();
        let pointer = local_point(&container, &ev);
        let button = PointerButton::from_code(ev.button());
        let modifier = ev.ctrl_key() || ev.meta_key();

        if editor.interaction.borrow_mut().begin_pan(button, modifier, pointer) {
            ev.prevent_default();
            return;
        }
        if button != PointerButton::Primary {
            return;
        }

        {
            let board = editor.board.borrow();
            let mut interaction = editor.interaction.borrow_mut();
            let on_board = board.viewport.screen_to_board(pointer);
            let hit = board.registry.node_at(on_board).map(|n| n.name.clone());
            match hit {
                Some(name) => {
                    interaction.begin_drag(&board, &name, on_board);
                }
                None => {
                    let size = container_size(&container);
                    let frame = build_frame(&board, &interaction, Rect::new(0.0, 0.0, size.width, size.height));
                    interaction.select_connection(connection_at(&frame, pointer, CONNECTION_HIT_TOLERANCE));
                }
            }
        }
        editor.request_redraw();
    };

    let on_mouse_move = move |ev: web_sys::MouseEvent| {
        let Some(container) = container_ref.get_untracked() else {
            return;
        };
        let editor = ctx.editor();
        let pointer = local_point(&container, &ev);
        let changed = {
            let mut board = editor.board.borrow_mut();
            let mut interaction = editor.interaction.borrow_mut();
            let on_board = board.viewport.screen_to_board(pointer);
            let panned = interaction.pan_to(pointer, &mut board.viewport);
            let dragged = interaction.drag_to(on_board);
            let tracked = interaction.track_pointer(pointer);
            panned || dragged || tracked
        };
        if changed {
            editor.request_redraw();
        }
    };

    let on_mouse_up = move |_: web_sys::MouseEvent| {
        let editor = ctx.editor();
        let was_busy = !editor.interaction.borrow().is_idle();
        {
            let mut board = editor.board.borrow_mut();
            editor.interaction.borrow_mut().release(&mut board);
        }
        if was_busy {
            editor.request_redraw();
        }
    };

    let on_wheel = move |ev: web_sys::WheelEvent| {
        let editor = ctx.editor();
        let zoomed = {
            let mut board = editor.board.borrow_mut();
            editor
                .interaction
                .borrow()
                .wheel(&mut board.viewport, ev.delta_y(), ev.ctrl_key() || ev.meta_key())
        };
        if zoomed {
            ev.prevent_default();
            editor.request_redraw();
        }
    };

    let on_keydown = move |ev: web_sys::KeyboardEvent| {
        if ctx.ui.modal.get_untracked().is_some_and(|m| m.editing) {
            return;
        }
        let editor = ctx.editor();
        match ev.key().as_str() {
            "Delete" | "Backspace" => {
                ev.prevent_default();
                editor.delete_selected_connection();
            }
            "Escape" => {
                {
                    let mut interaction = editor.interaction.borrow_mut();
                    interaction.cancel_connection();
                    interaction.select_connection(None);
                }
                ctx.ui.modal.set(None);
                ctx.ui.report.set(None);
                editor.request_redraw();
            }
            _ => {}
        }
    };

    let layer_style = move || {
        ctx.ui.revision.get();
        let transform = ctx.editor.with_value(|e| e.board.borrow().viewport.css_transform());
        format!(
            "position: absolute; left: 0; top: 0; width: 100%; height: 100%; \
             transform-origin: 0 0; transform: {};",
            transform
        )
    };

    let cards = move || {
        ctx.ui.revision.get();
        ctx.editor.with_value(|e| {
            let board = e.board.borrow();
            let interaction = e.interaction.borrow();
            let size = board.registry.node_size();
            let views: Vec<_> = board
                .registry
                .iter()
                .map(|node| {
                    let pos = interaction.display_position(&board, &node.name).unwrap_or(node.position());
                    NodeCardView::new(node, pos, size, interaction.pin_selected(&node.name))
                })
                .collect();
            views
        })
        .into_iter()
        .map(|card| view! { <NodeCard card=card /> })
        .collect_view()
    };

    let cursor = move || {
        ctx.ui.revision.get();
        let connecting = ctx.editor.with_value(|e| e.interaction.borrow().is_connecting());
        if connecting { "crosshair" } else { "default" }
    };

    view! {
        <div style="display: flex; flex-direction: column; width: 100vw; height: 100vh; \
                    background: #0b0f0b; color: #ccffdd; overflow: hidden; \
                    font-family: 'JetBrains Mono', 'Fira Code', Consolas, monospace;">
            <Toolbar />
            <ProgressBar />
            <div
                node_ref=container_ref
                tabindex="0"
                style=move || format!(
                    "position: relative; flex: 1; overflow: hidden; outline: none; cursor: {};",
                    cursor()
                )
                on:mousedown=on_mouse_down
                on:mousemove=on_mouse_move
                on:mouseup=on_mouse_up
                on:mouseleave=on_mouse_up
                on:wheel=on_wheel
                on:keydown=on_keydown
                on:contextmenu=move |ev: web_sys::MouseEvent| ev.prevent_default()
            >
                <div style=layer_style>{cards}</div>
                <canvas
                    node_ref=canvas_ref
                    style="position: absolute; left: 0; top: 0; width: 100%; height: 100%; \
                           pointer-events: none;"
                />
            </div>
            <ScriptModal />
            <ReportPanel />
            <Toast />
        </div>
    }
}
