use knowledge_graph_canvas::{App, embedded_config, init_logging};
use leptos::prelude::*;

fn main() {
	init_logging();
	let config = embedded_config();
	leptos::mount::mount_to_body(move || view! { <App config=config.clone() /> })
}
