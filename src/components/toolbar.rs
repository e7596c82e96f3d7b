use leptos::html::Input;
use leptos::prelude::*;
use log::warn;

use crate::app::BoardCtx;
use crate::ingest::files_from_list;
use crate::state::NodeRole;

const BUTTON: &str = "background: transparent; color: #aaffbb; border: 1px solid #44dd66; \
                      padding: 6px 12px; cursor: pointer; font-family: inherit; font-size: 12px;";

/// Takes the selected files out of a file input and resets it so picking
/// the same file again still fires `change`.
fn take_files(ev: &web_sys::Event) -> Vec<web_sys::File> {
    let input: web_sys::HtmlInputElement = event_target(ev);
    let files = input.files().map(|list| files_from_list(&list)).unwrap_or_default();
    input.set_value("");
    files
}

#[component]
pub fn Toolbar() -> impl IntoView {
    let ctx = expect_context::<BoardCtx>();
    let main_input = NodeRef::<Input>::new();
    let scripts_input = NodeRef::<Input>::new();
    let directory_input = NodeRef::<Input>::new();

    // `webkitdirectory` has no typed attribute in the view macro.
    Effect::new(move || {
        if let Some(input) = directory_input.get() {
            for attr in ["webkitdirectory", "directory"] {
                if let Err(e) = input.set_attribute(attr, "") {
                    warn!("could not enable directory picking: {:?}", e);
                }
            }
        }
    });

    let open = move |input: NodeRef<Input>| {
        move |_: web_sys::MouseEvent| {
            if let Some(input) = input.get_untracked() {
                input.click();
            }
        }
    };

    let on_main = move |ev: web_sys::Event| {
        if let Some(file) = take_files(&ev).into_iter().next() {
            ctx.editor()
                .spawn(move |editor| async move { editor.load_file(file, NodeRole::Main).await });
        }
    };

    let on_scripts = move |ev: web_sys::Event| {
        let files = take_files(&ev);
        if !files.is_empty() {
            ctx.editor().spawn(move |editor| async move { editor.load_files(files).await });
        }
    };

    let on_directory = move |ev: web_sys::Event| {
        let files = take_files(&ev);
        if !files.is_empty() {
            ctx.editor().spawn(move |editor| async move { editor.load_directory(files).await });
        }
    };

    let on_clear = move |_: web_sys::MouseEvent| {
        let confirmed = web_sys::window()
            .and_then(|w| w.confirm_with_message("Remove every script and connection?").ok())
            .unwrap_or(false);
        if confirmed {
            ctx.editor().clear();
        }
    };

    view! {
        <div style="display: flex; gap: 8px; padding: 8px 12px; align-items: center; \
                    border-bottom: 1px solid #44dd66; background: #020202;">
            <strong style="margin-right: 12px; color: #44dd66;">"script-board"</strong>
            <button style=BUTTON on:click=open(main_input)>"Load main script"</button>
            <button style=BUTTON on:click=open(scripts_input)>"Load scripts"</button>
            <button style=BUTTON on:click=open(directory_input)>"Load directory"</button>
            <button style=BUTTON on:click=move |_| ctx.editor().arm_connection()>"Add connection"</button>
            <button style=BUTTON on:click=move |_| ctx.editor().reset_view()>"Reset view"</button>
            <button style=BUTTON on:click=move |_| ctx.editor().generate_report()>"Report"</button>
            <button style=BUTTON on:click=on_clear>"Clear"</button>

            <input node_ref=main_input type="file" accept=".py" style="display: none;" on:change=on_main />
            <input
                node_ref=scripts_input
                type="file"
                accept=".py"
                multiple=true
                style="display: none;"
                on:change=on_scripts
            />
            <input node_ref=directory_input type="file" multiple=true style="display: none;" on:change=on_directory />
        </div>
    }
}
