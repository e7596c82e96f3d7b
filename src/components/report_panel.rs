use leptos::prelude::*;

use crate::app::BoardCtx;

#[component]
pub fn ReportPanel() -> impl IntoView {
    let ctx = expect_context::<BoardCtx>();

    move || {
        ctx.ui.report.get().map(|text| {
            view! {
                <div style="position: fixed; top: 56px; right: 16px; bottom: 16px; width: 420px; \
                            z-index: 900; background: #020202; border: 1px solid #44dd66; \
                            display: flex; flex-direction: column;">
                    <div style="display: flex; justify-content: space-between; padding: 8px 12px; \
                                border-bottom: 1px solid #44dd66; font-weight: bold;">
                        <span>"Report"</span>
                        <span style="cursor: pointer;" on:click=move |_| ctx.ui.report.set(None)>"×"</span>
                    </div>
                    <pre style="flex: 1; margin: 0; padding: 12px; overflow: auto; \
                                font-family: inherit; font-size: 12px; white-space: pre-wrap;">
                        {text}
                    </pre>
                </div>
            }
        })
    }
}
