use leptos::prelude::*;

use crate::actions::{ModalState, NoticeLevel};
use crate::app::BoardCtx;
use crate::interaction::PinOutcome;
use crate::state::{Point, ScriptNode, PIN_SIZE};

/// Snapshot of one node for rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeCardView {
    pub name: String,
    pub position: Point,
    pub size: f64,
    pub is_main: bool,
    pub edited: bool,
    pub imports_main: bool,
    pub pin_selected: bool,
    pub preview: String,
    pub script_type: Option<String>,
}

impl NodeCardView {
    pub fn new(node: &ScriptNode, position: Point, size: f64, pin_selected: bool) -> Self {
        Self {
            name: node.name.clone(),
            position,
            size,
            is_main: node.is_main(),
            edited: node.edited,
            imports_main: node.imports_main,
            pin_selected,
            preview: node.preview.clone(),
            script_type: node.script_type().map(str::to_string),
        }
    }

    fn border(&self) -> &'static str {
        if self.is_main {
            "2px solid #ffcc33"
        } else if self.imports_main {
            "2px solid #92ff68"
        } else {
            "1px solid #44dd66"
        }
    }

    fn class(&self) -> String {
        let mut class = String::from("node");
        for (on, name) in [
            (self.is_main, "main"),
            (self.edited, "edited-file"),
            (self.imports_main, "imports-main"),
            (self.pin_selected, "pin-selected"),
        ] {
            if on {
                class.push(' ');
                class.push_str(name);
            }
        }
        class
    }
}

#[component]
pub fn NodeCard(card: NodeCardView) -> impl IntoView {
    let ctx = expect_context::<BoardCtx>();

    let style = format!(
        "position: absolute; left: {}px; top: {}px; width: {}px; height: {}px; \
         box-sizing: border-box; padding: 6px; overflow: hidden; \
         background: {}; border: {}; user-select: none; cursor: move; \
         font-size: 10px; line-height: 1.3;",
        card.position.x,
        card.position.y,
        card.size,
        card.size,
        if card.edited { "#10140a" } else { "#040804" },
        card.border(),
    );
    let pin_style = format!(
        "position: absolute; left: {}px; top: {}px; width: {}px; height: {}px; \
         border-radius: 50%; cursor: pointer; z-index: 2; \
         background: {}; border: 1px solid #020202;",
        card.position.x + (card.size - PIN_SIZE) / 2.0,
        card.position.y - PIN_SIZE / 2.0,
        PIN_SIZE,
        PIN_SIZE,
        if card.pin_selected { "#22aaff" } else { "#ff5555" },
    );

    let name = card.name.clone();
    let on_pin = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        let editor = ctx.editor();
        let outcome = {
            let mut board = editor.board.borrow_mut();
            editor.interaction.borrow_mut().pin_click(&mut board, &name)
        };
        match outcome {
            PinOutcome::Connected(_) => editor.notify("Connection created", NoticeLevel::Success),
            PinOutcome::FirstSelected | PinOutcome::Ignored => {}
        }
        editor.request_redraw();
    };

    let name = card.name.clone();
    let on_open = move |_: web_sys::MouseEvent| {
        let editor = ctx.editor();
        let source = editor.board.borrow().source(&name).unwrap_or_default().to_string();
        ctx.ui.draft.set(source);
        ctx.ui.modal.set(Some(ModalState {
            name: name.clone(),
            editing: false,
        }));
    };

    let name = card.name.clone();
    let on_remove = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        ctx.editor().remove_node(&name);
    };

    view! {
        <div class=card.class() style=style on:dblclick=on_open>
            <div style="display: flex; justify-content: space-between; gap: 4px; \
                        font-weight: bold; color: #aaffbb;">
                <span style="overflow: hidden; text-overflow: ellipsis; white-space: nowrap;">
                    {card.name.clone()}
                </span>
                <span
                    style="cursor: pointer; color: #66cc88;"
                    title="Remove"
                    on:mousedown=move |ev: web_sys::MouseEvent| ev.stop_propagation()
                    on:click=on_remove
                >
                    "×"
                </span>
            </div>
            {card.script_type.clone().map(|kind| view! {
                <div style="color: #00c3ff; margin: 2px 0;">{kind}</div>
            })}
            <pre style="margin: 0; white-space: pre-wrap; color: #66cc88; font-family: inherit;">
                {card.preview.clone()}
            </pre>
        </div>
        <div
            style=pin_style
            title="Pin"
            on:mousedown=move |ev: web_sys::MouseEvent| ev.stop_propagation()
            on:click=on_pin
        />
    }
}
