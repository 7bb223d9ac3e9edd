//! Browser implementations of the host capabilities
//!
//! - [`BrowserHost`]: `requestIdleCallback`, `setTimeout` and
//!   `wasm_bindgen_futures::spawn_local` on the current window.
//! - [`BrowserRoot`]: a `web_sys::Element` as subtree root.
//! - [`FederationRegistry`]: module federation containers exposed as
//!   `window[scope]`, answering `get("./<request>")` with a factory.
//!
//! `requestIdleCallback` is looked up at runtime because some engines do
//! not ship it; the scheduler then falls back to a timer.

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use js_sys::{Function, Object, Promise, Reflect};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AddEventListenerOptions, Element, Window};

use crate::config::LazyHydrateProps;
use crate::host::{
	Host, HostError, IdleHandle, ListenerHandler, ListenerId, ListenerOptions, RootNode, Task,
	TimerHandle,
};
use crate::hydration::controller::{LazyHydration, MountContext};
use crate::hydration::remote::{ModuleFactory, ModuleReference, ModuleRegistry, RegistryError};

fn js_reason(value: &JsValue) -> String {
	value
		.as_string()
		.or_else(|| {
			value
				.dyn_ref::<js_sys::Error>()
				.map(|err| String::from(err.message()))
		})
		.unwrap_or_else(|| format!("{:?}", value))
}

fn window_function(window: &Window, name: &'static str) -> Option<Function> {
	Reflect::get(window, &JsValue::from_str(name))
		.ok()
		.and_then(|value| value.dyn_into::<Function>().ok())
}

/// Host backed by the current browser window.
pub struct BrowserHost {
	window: Window,
	idle: RefCell<HashMap<u32, Closure<dyn FnMut()>>>,
	timers: RefCell<HashMap<i32, Closure<dyn FnMut()>>>,
}

impl BrowserHost {
	/// Creates a host for the current window.
	pub fn new() -> Result<Self, HostError> {
		let window = web_sys::window().ok_or(HostError::Unavailable("window"))?;
		Ok(Self {
			window,
			idle: RefCell::new(HashMap::new()),
			timers: RefCell::new(HashMap::new()),
		})
	}
}

impl Host for BrowserHost {
	fn has_dom(&self) -> bool {
		self.window.document().is_some()
	}

	fn supports_idle_callback(&self) -> bool {
		window_function(&self.window, "requestIdleCallback").is_some()
	}

	fn request_idle_callback(
		&self,
		callback: Task,
		timeout: Duration,
	) -> Result<IdleHandle, HostError> {
		let request = window_function(&self.window, "requestIdleCallback")
			.ok_or(HostError::Unavailable("requestIdleCallback"))?;

		let options = Object::new();
		Reflect::set(
			&options,
			&JsValue::from_str("timeout"),
			&JsValue::from_f64(timeout.as_millis() as f64),
		)
		.map_err(|e| HostError::operation("requestIdleCallback", js_reason(&e)))?;

		let closure = Closure::<dyn FnMut()>::once(move || callback());
		let id = request
			.call2(&self.window, closure.as_ref(), &options)
			.map_err(|e| HostError::operation("requestIdleCallback", js_reason(&e)))?
			.as_f64()
			.ok_or_else(|| HostError::operation("requestIdleCallback", "non-numeric handle"))?
			as u32;

		self.idle.borrow_mut().insert(id, closure);
		Ok(IdleHandle(id))
	}

	fn cancel_idle_callback(&self, handle: IdleHandle) {
		if let Some(cancel) = window_function(&self.window, "cancelIdleCallback") {
			if let Err(err) = cancel.call1(&self.window, &JsValue::from(handle.0)) {
				crate::error_log!("[LazyHydration] cancelIdleCallback failed: {}", js_reason(&err));
			}
		}
		self.idle.borrow_mut().remove(&handle.0);
	}

	fn set_timeout(&self, callback: Task, delay: Duration) -> Result<TimerHandle, HostError> {
		let closure = Closure::<dyn FnMut()>::once(move || callback());
		let id = self
			.window
			.set_timeout_with_callback_and_timeout_and_arguments_0(
				closure.as_ref().unchecked_ref(),
				delay.as_millis() as i32,
			)
			.map_err(|e| HostError::operation("setTimeout", js_reason(&e)))?;

		self.timers.borrow_mut().insert(id, closure);
		Ok(TimerHandle(id))
	}

	fn clear_timeout(&self, handle: TimerHandle) {
		self.window.clear_timeout_with_handle(handle.0);
		self.timers.borrow_mut().remove(&handle.0);
	}

	fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
		wasm_bindgen_futures::spawn_local(task);
	}
}

/// A DOM element used as subtree root.
pub struct BrowserRoot {
	element: Element,
	next_id: Cell<u64>,
	listeners: RefCell<HashMap<u64, Closure<dyn FnMut(web_sys::Event)>>>,
}

impl BrowserRoot {
	/// Wraps `element`.
	pub fn new(element: Element) -> Self {
		Self {
			element,
			next_id: Cell::new(0),
			listeners: RefCell::new(HashMap::new()),
		}
	}

	/// The wrapped element.
	pub fn element(&self) -> &Element {
		&self.element
	}
}

impl RootNode for BrowserRoot {
	fn has_child_nodes(&self) -> bool {
		self.element.has_child_nodes()
	}

	fn add_event_listener(
		&self,
		event_type: &str,
		options: ListenerOptions,
		handler: ListenerHandler,
	) -> Result<ListenerId, HostError> {
		let closure =
			Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| handler());

		let js_options = AddEventListenerOptions::new();
		js_options.set_once(options.once);
		js_options.set_capture(options.capture);
		js_options.set_passive(options.passive);

		self.element
			.add_event_listener_with_callback_and_add_event_listener_options(
				event_type,
				closure.as_ref().unchecked_ref(),
				&js_options,
			)
			.map_err(|e| HostError::operation("addEventListener", js_reason(&e)))?;

		let id = self.next_id.get();
		self.next_id.set(id + 1);
		self.listeners.borrow_mut().insert(id, closure);
		Ok(ListenerId(id))
	}

	fn remove_event_listener(
		&self,
		event_type: &str,
		id: ListenerId,
		capture: bool,
	) -> Result<(), HostError> {
		let Some(closure) = self.listeners.borrow_mut().remove(&id.0) else {
			return Ok(());
		};
		self.element
			.remove_event_listener_with_callback_and_bool(
				event_type,
				closure.as_ref().unchecked_ref(),
				capture,
			)
			.map_err(|e| HostError::operation("removeEventListener", js_reason(&e)))
	}
}

/// Registry over module federation containers attached to `window`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FederationRegistry;

impl FederationRegistry {
	/// Creates the registry.
	pub fn new() -> Self {
		Self
	}
}

#[async_trait(?Send)]
impl ModuleRegistry for FederationRegistry {
	async fn resolve(&self, scope: &str, request: &str) -> Result<ModuleFactory, RegistryError> {
		let reference = ModuleReference {
			scope: scope.to_string(),
			request: request.to_string(),
		};
		let rejected = |reason: String| RegistryError::Rejected {
			scope: scope.to_string(),
			request: request.to_string(),
			reason,
		};

		let window =
			web_sys::window().ok_or_else(|| RegistryError::ScopeNotRegistered(scope.to_string()))?;
		let container = Reflect::get(&window, &JsValue::from_str(scope))
			.map_err(|e| rejected(js_reason(&e)))?;
		if container.is_undefined() || container.is_null() {
			return Err(RegistryError::ScopeNotRegistered(scope.to_string()));
		}

		let get = Reflect::get(&container, &JsValue::from_str("get"))
			.ok()
			.and_then(|value| value.dyn_into::<Function>().ok())
			.ok_or_else(|| rejected("container has no get()".to_string()))?;
		let answer = get
			.call1(&container, &JsValue::from_str(&reference.exposed_path()))
			.map_err(|e| rejected(js_reason(&e)))?;

		let factory = JsFuture::from(Promise::resolve(&answer))
			.await
			.map_err(|e| rejected(js_reason(&e)))?
			.dyn_into::<Function>()
			.map_err(|_| RegistryError::InvalidModule(reference.to_string()))?;

		Ok(Box::new(move || {
			if let Err(err) = factory.call0(&JsValue::NULL) {
				crate::error_log!("[LazyHydration] module factory threw: {}", js_reason(&err));
			}
		}))
	}
}

/// Mounts lazy hydration on `element` using the browser host and module
/// federation registry.
pub fn mount_element(props: LazyHydrateProps, element: Element) -> Result<LazyHydration, HostError> {
	let host = Rc::new(BrowserHost::new()?);
	let root = Rc::new(BrowserRoot::new(element));
	let registry = Rc::new(FederationRegistry::new());
	Ok(LazyHydration::mount(
		props,
		MountContext::new(host, root, registry),
	))
}
