//! Leptos client-side app wiring and routes.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

// Modules
/// Backend HTTP client.
pub mod api;
/// Runtime configuration.
pub mod config;
/// Renderer-independent graph engine.
pub mod engine;
/// Crate error type.
pub mod error;
mod components;
mod pages;

use crate::config::EngineConfig;

// Top-Level pages
use crate::pages::compare::Compare;
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;
use crate::pages::project::Project;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Id of the `<script type="application/json">` element a deployment uses
/// to hand the app its [`EngineConfig`].
pub const CONFIG_ELEMENT_ID: &str = "engine-config";

/// Read the config the host page embedded, or the defaults.
pub fn embedded_config() -> EngineConfig {
	let json = web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
		.and_then(|el| el.text_content());
	EngineConfig::from_embedded(json.as_deref())
}

/// An app router for the project picker, the graph view of one project and
/// the comparison of two projects.
#[component]
pub fn App(
	/// Engine and backend settings; defaults when omitted.
	#[prop(optional)]
	config: Option<EngineConfig>,
) -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();
	let config = config.unwrap_or_default();
	info!("backend at {}", config.api_base_url);
	provide_context(config);

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />

		// sets the document title
		<Title text="Knowledge Graph" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
				<Route path=path!("/projects/:id") view=Project />
				<Route path=path!("/compare/:a/:b") view=Compare />
			</Routes>
		</Router>
	}
}
