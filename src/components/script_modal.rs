use leptos::prelude::*;

use crate::actions::ModalState;
use crate::app::BoardCtx;

const BUTTON: &str = "background: transparent; color: #66cc88; border: 1px solid #66cc88; \
                      padding: 8px 16px; cursor: pointer; font-family: inherit; font-size: 12px;";
const BUTTON_PRIMARY: &str = "background: #44dd66; color: #020202; border: none; \
                              padding: 8px 16px; cursor: pointer; font-family: inherit; \
                              font-size: 12px; font-weight: bold;";

/// Full-size view of a script, with an editor that saves back through the
/// analyzer.
#[component]
pub fn ScriptModal() -> impl IntoView {
    let ctx = expect_context::<BoardCtx>();

    move || {
        let ModalState { name, editing } = ctx.ui.modal.get()?;
        let title = name.clone();

        let controls = if editing {
            let name = name.clone();
            view! {
                <button
                    style=BUTTON
                    on:click=move |_| ctx.ui.modal.update(|m| {
                        if let Some(m) = m {
                            m.editing = false;
                        }
                    })
                >
                    "Cancel"
                </button>
                <button
                    style=BUTTON_PRIMARY
                    on:click=move |_| {
                        let content = ctx.ui.draft.get_untracked();
                        let name = name.clone();
                        ctx.ui.modal.set(None);
                        ctx.editor().spawn(move |editor| async move {
                            editor.save_edit(&name, &content).await
                        });
                    }
                >
                    "Save"
                </button>
            }
            .into_any()
        } else {
            view! {
                <button
                    style=BUTTON_PRIMARY
                    on:click=move |_| ctx.ui.modal.update(|m| {
                        if let Some(m) = m {
                            m.editing = true;
                        }
                    })
                >
                    "Edit"
                </button>
            }
            .into_any()
        };

        let body = if editing {
            view! {
                <textarea
                    style="width: 100%; height: 100%; background: #020202; \
                           color: #ccffdd; border: 1px solid #33aa55; \
                           font-family: inherit; font-size: 13px; \
                           padding: 12px; box-sizing: border-box; resize: none; outline: none;"
                    prop:value=move || ctx.ui.draft.get()
                    on:input=move |ev| ctx.ui.draft.set(event_target_value(&ev))
                />
            }
            .into_any()
        } else {
            view! {
                <pre style="margin: 0; white-space: pre-wrap; font-family: inherit; font-size: 13px;">
                    {move || ctx.ui.draft.get()}
                </pre>
            }
            .into_any()
        };

        Some(view! {
            <div
                style="position: fixed; inset: 0; background: rgba(0,0,0,0.9); \
                       display: flex; align-items: center; justify-content: center; \
                       z-index: 1000;"
                on:click=move |_| ctx.ui.modal.set(None)
            >
                <div
                    style="width: 90vw; max-width: 900px; height: 80vh; \
                           background: #020202; border: 1px solid #44dd66; \
                           box-shadow: 0 0 30px rgba(68, 221, 102, 0.3); \
                           padding: 24px; display: flex; flex-direction: column; \
                           color: #ccffdd; line-height: 1.5;"
                    on:click=move |ev: web_sys::MouseEvent| ev.stop_propagation()
                >
                    <div style="margin-bottom: 16px; padding-bottom: 16px; \
                                border-bottom: 1px solid #44dd66; \
                                display: flex; align-items: center; gap: 8px;">
                        <span style="flex: 1; font-weight: bold;">{title}</span>
                        {controls}
                    </div>
                    <div style="flex: 1; overflow-y: auto; min-height: 0;">{body}</div>
                </div>
            </div>
        })
    }
}
