//! Browser host tests
//!
//! Run with `wasm-pack test --headless --chrome`.

#![cfg(target_arch = "wasm32")]

use lazy_hydrate_core::browser::{BrowserHost, BrowserRoot, FederationRegistry, mount_element};
use lazy_hydrate_core::{
	Host, HydrationConfig, LazyHydrateProps, ListenerOptions, ModuleRegistry, RegistryError,
	RenderState, RootNode,
};
use js_sys::{Function, Object, Reflect};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;
use web_sys::{Element, Event};

wasm_bindgen_test_configure!(run_in_browser);

fn element_with_child() -> Element {
	let document = web_sys::window()
		.and_then(|window| window.document())
		.expect("document should exist");
	let root = document.create_element("div").expect("div should be created");
	let child = document
		.create_element("button")
		.expect("button should be created");
	root.append_child(&child).expect("child should be appended");
	root
}

fn dispatch(element: &Element, event_type: &str) {
	let event = Event::new(event_type).expect("event should be created");
	element
		.dispatch_event(&event)
		.expect("event should be dispatched");
}

#[wasm_bindgen_test]
fn test_browser_host_has_dom() {
	let host = BrowserHost::new().expect("window should exist");
	assert!(host.has_dom());
}

#[wasm_bindgen_test]
fn test_browser_host_timer_can_be_cleared() {
	let host = BrowserHost::new().expect("window should exist");
	let handle = host
		.set_timeout(Box::new(|| {}), Duration::from_millis(2000))
		.expect("timer should be scheduled");
	host.clear_timeout(handle);
}

#[wasm_bindgen_test]
fn test_browser_root_once_listener() {
	let root = BrowserRoot::new(element_with_child());
	let calls = Rc::new(Cell::new(0));
	let counter = calls.clone();
	let options = ListenerOptions {
		once: true,
		capture: true,
		passive: true,
	};

	root.add_event_listener(
		"click",
		options,
		Rc::new(move || counter.set(counter.get() + 1)),
	)
	.expect("listener should be added");

	dispatch(root.element(), "click");
	dispatch(root.element(), "click");
	assert_eq!(calls.get(), 1);
}

#[wasm_bindgen_test]
fn test_browser_root_removed_listener_is_silent() {
	let root = BrowserRoot::new(element_with_child());
	let calls = Rc::new(Cell::new(0));
	let counter = calls.clone();
	let options = ListenerOptions {
		once: false,
		capture: true,
		passive: true,
	};

	let id = root
		.add_event_listener(
			"focus",
			options,
			Rc::new(move || counter.set(counter.get() + 1)),
		)
		.expect("listener should be added");
	root.remove_event_listener("focus", id, true)
		.expect("listener should be removed");

	dispatch(root.element(), "focus");
	assert_eq!(calls.get(), 0);
	assert!(root.has_child_nodes());
}

#[wasm_bindgen_test]
fn test_mount_element_activates_on_click() {
	let element = element_with_child();
	let props = LazyHydrateProps::new(HydrationConfig::new().on("click"));
	let mount = mount_element(props, element.clone()).expect("mount should succeed");
	assert_eq!(mount.state(), RenderState::Placeholder);

	dispatch(&element, "click");
	assert_eq!(mount.state(), RenderState::Activated);
}

#[wasm_bindgen_test]
async fn test_federation_registry_unknown_scope() {
	let registry = FederationRegistry::new();
	let result = registry.resolve("lhMissingScope", "Widget").await;
	assert!(matches!(result, Err(RegistryError::ScopeNotRegistered(scope)) if scope == "lhMissingScope"));
}

#[wasm_bindgen_test]
async fn test_federation_registry_invokes_exposed_module() {
	let window = web_sys::window().expect("window should exist");
	let container = Object::new();
	let get = Function::new_with_args(
		"request",
		"return () => { globalThis.__lhLoaded = request; };",
	);
	Reflect::set(&container, &JsValue::from_str("get"), &get).expect("get should be set");
	Reflect::set(&window, &JsValue::from_str("lhAppA"), &container)
		.expect("container should be set");

	let factory = FederationRegistry::new()
		.resolve("lhAppA", "Widget")
		.await
		.expect("module should resolve");
	factory();

	let loaded = Reflect::get(&window, &JsValue::from_str("__lhLoaded"))
		.expect("marker should be readable");
	assert_eq!(loaded.as_string().as_deref(), Some("./Widget"));
}
