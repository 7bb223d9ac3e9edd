//! Deferred activation controller
//!
//! [`LazyHydration`] owns one mounted subtree. It decides the initial
//! [`RenderState`], starts the remote module resolution, arms the triggers
//! and flips the subtree to [`RenderState::Activated`] once a trigger has
//! fired and the module is ready, in whichever order those two happen.
//!
//! ## Lifecycle
//!
//! ```text
//! mount ──▶ has_dom? ──no──▶ Activated (server render, nothing armed)
//!             │yes
//!             ▼
//!        root empty? ──yes──▶ Activated
//!             │no
//!             ▼
//!        Placeholder ──trigger fired──▶ requested ──module ready──▶ Activated
//!                    ──module ready───▶ ready     ──trigger fired──▶ Activated
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use lazy_hydrate_core::{HydrationConfig, LazyHydrateProps, LazyHydration, MountContext};
//!
//! let config = HydrationConfig::new()
//!     .when_idle(true)
//!     .on("click")
//!     .remote_import("appA/Widget");
//!
//! let mount = LazyHydration::mount(
//!     LazyHydrateProps::new(config),
//!     MountContext::new(host, root, registry),
//! );
//! mount.on_activated(|| render_children());
//! ```

use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::markup::{RootAttributes, RootMarkup};
use super::remote::{ModuleReference, ModuleRegistry, RemoteModuleLoader};
use super::scheduler::{ArmedTrigger, TriggerScheduler, TriggerSet};
use super::state::{ModuleStatus, RenderState};
use crate::config::{HydrationConfig, LazyHydrateProps};
use crate::host::{Host, ListenerHandler, RootNode};

type ActivationObserver = Box<dyn FnOnce() + 'static>;

/// Capabilities a mount runs against.
#[derive(Clone)]
pub struct MountContext {
	/// Scheduling primitives of the host loop.
	pub host: Rc<dyn Host>,
	/// Root node of the subtree, exclusively owned by the mount.
	pub root: Rc<dyn RootNode>,
	/// Registry resolving `remoteImport`.
	pub registry: Rc<dyn ModuleRegistry>,
}

impl MountContext {
	/// Bundles the capabilities of a mount.
	pub fn new(
		host: Rc<dyn Host>,
		root: Rc<dyn RootNode>,
		registry: Rc<dyn ModuleRegistry>,
	) -> Self {
		Self {
			host,
			root,
			registry,
		}
	}
}

impl std::fmt::Debug for MountContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MountContext").finish_non_exhaustive()
	}
}

struct MountState {
	config: RefCell<HydrationConfig>,
	attributes: RootAttributes,
	has_dom: bool,
	state: Cell<RenderState>,
	module: Cell<ModuleStatus>,
	requested: Cell<bool>,
	triggers: RefCell<Option<TriggerSet>>,
	observers: RefCell<Vec<ActivationObserver>>,
	scheduler: TriggerScheduler,
	host: Rc<dyn Host>,
}

impl MountState {
	/// Replaces the armed triggers with a fresh set for the current config.
	fn rearm(self: &Rc<Self>) {
		let previous = self.triggers.borrow_mut().take();
		drop(previous);

		// ssrOnly forbids activation, so a latched request is discarded and
		// the next non-ssrOnly config starts from freshly armed triggers.
		if self.config.borrow().ssr_only && self.requested.replace(false) {
			crate::debug_log!("[LazyHydration] ssrOnly set, dropping pending activation request");
		}

		if !self.has_dom || self.requested.get() {
			return;
		}

		let on_fire: ListenerHandler = {
			let mount = Rc::downgrade(self);
			Rc::new(move || {
				if let Some(mount) = mount.upgrade() {
					mount.request_activation();
				}
			})
		};

		let config = self.config.borrow().clone();
		match self.scheduler.arm(&config, self.state.get(), on_fire) {
			Ok(set) => *self.triggers.borrow_mut() = Some(set),
			Err(err) => {
				crate::error_log!("[LazyHydration] failed to arm triggers: {}", err);
			}
		}
	}

	fn request_activation(&self) {
		self.requested.set(true);
		let fired = self.triggers.borrow_mut().take();
		drop(fired);

		if self.module.get().is_ready() {
			self.complete_activation();
		} else {
			crate::debug_log!("[LazyHydration] trigger fired, waiting for remote module");
		}
	}

	fn module_resolved(&self) {
		self.module.set(ModuleStatus::Ready);
		if self.requested.get() {
			self.complete_activation();
		}
	}

	fn complete_activation(&self) {
		if self.config.borrow().ssr_only {
			return;
		}
		self.transition();
	}

	/// Moves to `Activated`, releasing triggers and notifying observers.
	fn transition(&self) {
		if self.state.get().is_activated() {
			return;
		}
		self.state.set(RenderState::Activated);

		let triggers = self.triggers.borrow_mut().take();
		drop(triggers);

		crate::info_log!("[LazyHydration] subtree activated");
		let observers = std::mem::take(&mut *self.observers.borrow_mut());
		for observer in observers {
			observer();
		}
	}

	fn start_module_load(
		self: &Rc<Self>,
		registry: Rc<dyn ModuleRegistry>,
		reference: ModuleReference,
	) {
		let loader = RemoteModuleLoader::new(registry);
		let mount = Rc::downgrade(self);

		self.host.spawn_local(
			async move {
				let result = loader.load(&reference).await;
				let Some(mount) = mount.upgrade() else {
					return;
				};
				match result {
					Ok(()) => mount.module_resolved(),
					Err(err) => {
						crate::error_log!(
							"[LazyHydration] remote module '{}' unavailable: {}",
							reference,
							err
						);
						mount.module.set(ModuleStatus::Failed);
					}
				}
			}
			.boxed_local(),
		);
	}
}

/// A mounted lazily hydrated subtree.
///
/// Dropping the handle unmounts: every pending idle callback, timer and
/// listener is released synchronously. An in-flight module request keeps
/// running and still invokes its factory, but no longer affects the mount.
pub struct LazyHydration {
	inner: Rc<MountState>,
}

impl LazyHydration {
	/// Mounts a subtree.
	///
	/// Without a DOM the subtree starts (and stays) activated and nothing is
	/// loaded or armed. With a DOM and an empty root it activates
	/// immediately. Otherwise it stays a placeholder until a trigger fires
	/// and the remote module is ready.
	pub fn mount(props: LazyHydrateProps, context: MountContext) -> Self {
		let LazyHydrateProps { config, attributes } = props;
		let MountContext {
			host,
			root,
			registry,
		} = context;

		if let Some(advisory) = config.advisory() {
			crate::warn_log!("{}", advisory);
		}

		let has_dom = host.has_dom();
		let module = if config.remote_import.is_some() {
			ModuleStatus::Pending
		} else {
			ModuleStatus::Ready
		};
		let remote_import = config.remote_import.clone();

		let inner = Rc::new(MountState {
			config: RefCell::new(config),
			attributes,
			has_dom,
			state: Cell::new(RenderState::initial(has_dom)),
			module: Cell::new(module),
			requested: Cell::new(false),
			triggers: RefCell::new(None),
			observers: RefCell::new(Vec::new()),
			scheduler: TriggerScheduler::new(host.clone(), root.clone()),
			host,
		});

		if !has_dom {
			return Self { inner };
		}

		if !root.has_child_nodes() {
			crate::debug_log!("[LazyHydration] root has no server content, activating");
			inner.transition();
		}

		if let Some(remote_import) = remote_import {
			inner.start_module_load(registry, ModuleReference::parse(&remote_import));
		}

		inner.rearm();
		Self { inner }
	}

	/// Current render state.
	pub fn state(&self) -> RenderState {
		self.inner.state.get()
	}

	/// Returns true once activated.
	pub fn is_activated(&self) -> bool {
		self.state().is_activated()
	}

	/// Progress of the remote module.
	pub fn module_status(&self) -> ModuleStatus {
		self.inner.module.get()
	}

	/// Returns true once a trigger has fired, even if the module is not ready yet.
	pub fn activation_requested(&self) -> bool {
		self.inner.requested.get()
	}

	/// Current configuration.
	pub fn config(&self) -> HydrationConfig {
		self.inner.config.borrow().clone()
	}

	/// Triggers currently armed.
	pub fn armed_triggers(&self) -> Vec<ArmedTrigger> {
		self.inner
			.triggers
			.borrow()
			.as_ref()
			.map(|set| set.armed().to_vec())
			.unwrap_or_default()
	}

	/// Replaces the configuration.
	///
	/// When a trigger-relevant option changed, the armed triggers are
	/// released synchronously and re-armed for the new configuration.
	/// Switching `ssr_only` on also discards an activation request still
	/// waiting for the module. The remote module is not requested again.
	pub fn reconfigure(&self, config: HydrationConfig) {
		let changed = {
			let current = self.inner.config.borrow();
			current.on.normalized() != config.on.normalized()
				|| current.ssr_only != config.ssr_only
				|| current.when_idle != config.when_idle
				|| current.when_visible != config.when_visible
		};
		*self.inner.config.borrow_mut() = config;

		if changed && !self.is_activated() {
			self.inner.rearm();
		}
	}

	/// Registers `observer`, called once when the subtree activates.
	///
	/// Runs immediately if the subtree is already activated.
	pub fn on_activated<F>(&self, observer: F)
	where
		F: FnOnce() + 'static,
	{
		if self.is_activated() {
			observer();
		} else {
			self.inner.observers.borrow_mut().push(Box::new(observer));
		}
	}

	/// Renders the root for the current state.
	///
	/// `children` is pre-rendered markup and is only emitted once activated.
	pub fn render<'a>(&'a self, children: &'a str) -> RootMarkup<'a> {
		let props = match self.state() {
			RenderState::Placeholder => self.inner.config.borrow().to_json().ok(),
			RenderState::Activated => None,
		};
		RootMarkup::for_state(self.state(), &self.inner.attributes, props, children)
	}

	/// Unmounts the subtree, releasing every armed trigger.
	pub fn unmount(self) {
		drop(self);
	}
}

impl Drop for LazyHydration {
	fn drop(&mut self) {
		let triggers = self.inner.triggers.borrow_mut().take();
		drop(triggers);
		self.inner.observers.borrow_mut().clear();
	}
}

impl std::fmt::Debug for LazyHydration {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LazyHydration")
			.field("state", &self.state())
			.field("module", &self.module_status())
			.field("requested", &self.activation_requested())
			.finish_non_exhaustive()
	}
}
