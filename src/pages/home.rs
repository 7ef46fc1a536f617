use leptos::prelude::*;
use leptos_router::hooks::use_navigate;
use web_sys::{Event, SubmitEvent};

/// Project picker: open one project's graph or compare two projects.
#[component]
pub fn Home() -> impl IntoView {
	let project = RwSignal::new(String::new());
	let compare_a = RwSignal::new(String::new());
	let compare_b = RwSignal::new(String::new());
	let navigate = use_navigate();
	let navigate_compare = navigate.clone();

	let open = move |ev: SubmitEvent| {
		ev.prevent_default();
		let id = project.get_untracked().trim().to_string();
		if !id.is_empty() {
			navigate(&format!("/projects/{id}"), Default::default());
		}
	};

	let compare = move |ev: SubmitEvent| {
		ev.prevent_default();
		let (a, b) = (compare_a.get_untracked(), compare_b.get_untracked());
		let (a, b) = (a.trim(), b.trim());
		if !a.is_empty() && !b.is_empty() {
			navigate_compare(&format!("/compare/{a}/{b}"), Default::default());
		}
	};

	let bind = |signal: RwSignal<String>| move |ev: Event| signal.set(event_target_value(&ev));

	view! {
		<div class="home">
			<h1>"Knowledge Graph"</h1>
			<p class="subtitle">"Explore papers, concepts, clusters and the gaps between them."</p>

			<form class="open-project" on:submit=open>
				<input
					type="text"
					placeholder="Project id"
					prop:value=move || project.get()
					on:input=bind(project)
				/>
				<button type="submit">"Open"</button>
			</form>

			<form class="compare-projects" on:submit=compare>
				<input type="text" placeholder="First project" prop:value=move || compare_a.get() on:input=bind(compare_a) />
				<input type="text" placeholder="Second project" prop:value=move || compare_b.get() on:input=bind(compare_b) />
				<button type="submit">"Compare"</button>
			</form>
		</div>
	}
}
