use leptos::prelude::*;
use script_board::{init_logging, App};

fn main() {
    init_logging();

    mount_to_body(|| {
        view! { <App /> }
    })
}
