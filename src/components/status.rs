use leptos::prelude::*;

use crate::app::BoardCtx;

#[component]
pub fn Toast() -> impl IntoView {
    let ctx = expect_context::<BoardCtx>();

    move || {
        ctx.ui.notice.get().map(|notice| {
            view! {
                <div
                    style=format!(
                        "position: fixed; right: 24px; bottom: 24px; z-index: 1100; \
                         padding: 10px 16px; background: #020202; color: #ffffff; \
                         border-left: 4px solid {}; box-shadow: 0 0 12px rgba(0,0,0,0.6); \
                         font-size: 13px;",
                        notice.level.color()
                    )
                    on:click=move |_| ctx.ui.notice.set(None)
                >
                    {notice.text}
                </div>
            }
        })
    }
}

/// Directory upload progress.
#[component]
pub fn ProgressBar() -> impl IntoView {
    let ctx = expect_context::<BoardCtx>();

    move || {
        ctx.ui.progress.get().map(|p| {
            let percent = if p.total == 0 { 100.0 } else { p.done as f64 * 100.0 / p.total as f64 };
            view! {
                <div style="padding: 4px 12px; font-size: 11px; color: #66cc88;">
                    <div style="height: 4px; background: #0a1a0a;">
                        <div style=format!("height: 100%; width: {:.1}%; background: #44dd66;", percent) />
                    </div>
                    {format!("Processed {} of {} files", p.done, p.total)}
                </div>
            }
        })
    }
}
