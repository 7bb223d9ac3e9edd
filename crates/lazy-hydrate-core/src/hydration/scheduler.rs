//! Activation trigger scheduling
//!
//! The scheduler arms every configured trigger of a mount and fires a shared
//! activation callback the first time any of them is satisfied. Each armed
//! trigger pushes exactly one release action onto a [`TeardownList`]; firing
//! drains that list before the callback runs, so no timer, idle callback or
//! listener outlives the first activation.
//!
//! ```text
//! whenIdle ──▶ requestIdleCallback(500ms) │ setTimeout(2000ms) ─┐
//! on[0]    ──▶ addEventListener(once, capture, passive) ──────┼──▶ fire ──▶ teardown ──▶ on_fire()
//! on[n]    ──▶ addEventListener(once, capture, passive) ──────┘
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::events::{DomEventBridge, ListenerRegistration};
use super::state::RenderState;
use crate::config::{HydrationConfig, IDLE_FALLBACK_DELAY, IDLE_TIMEOUT};
use crate::host::{Host, HostError, IdleHandle, ListenerHandler, RootNode, Task, TimerHandle};

/// Release actions collected while arming, run last-in first-out.
///
/// Running is idempotent: actions are consumed by the first run. Dropping
/// the list runs whatever is left.
#[derive(Default)]
pub struct TeardownList {
	actions: Vec<Task>,
}

impl TeardownList {
	/// Creates an empty list.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a release action.
	pub fn push(&mut self, action: impl FnOnce() + 'static) {
		self.actions.push(Box::new(action));
	}

	/// Returns the number of pending release actions.
	pub fn len(&self) -> usize {
		self.actions.len()
	}

	/// Returns true if nothing is left to release.
	pub fn is_empty(&self) -> bool {
		self.actions.is_empty()
	}

	/// Runs and consumes every pending action.
	pub fn run(&mut self) {
		while let Some(action) = self.actions.pop() {
			action();
		}
	}

	/// Drains a shared list without holding its borrow while actions run.
	fn run_shared(list: &RefCell<TeardownList>) {
		let mut taken = TeardownList {
			actions: std::mem::take(&mut list.borrow_mut().actions),
		};
		taken.run();
	}
}

impl Drop for TeardownList {
	fn drop(&mut self) {
		self.run();
	}
}

impl std::fmt::Debug for TeardownList {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TeardownList")
			.field("pending", &self.actions.len())
			.finish()
	}
}

/// A trigger armed on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArmedTrigger {
	/// Idle callback with the 500 ms maximum wait.
	Idle(IdleHandle),
	/// Fallback timer used when idle scheduling is unavailable.
	Timeout(TimerHandle),
	/// One-shot capture-phase listener on the root.
	Event(ListenerRegistration),
}

/// The triggers armed by one [`TriggerScheduler::arm`] call.
///
/// Dropping the set releases every trigger that has not fired.
#[derive(Debug)]
pub struct TriggerSet {
	armed: Vec<ArmedTrigger>,
	teardown: Rc<RefCell<TeardownList>>,
	fired: Rc<Cell<bool>>,
}

impl TriggerSet {
	/// A set with nothing armed.
	pub fn empty() -> Self {
		Self {
			armed: Vec::new(),
			teardown: Rc::new(RefCell::new(TeardownList::new())),
			fired: Rc::new(Cell::new(false)),
		}
	}

	/// The triggers armed by this set, in arming order.
	pub fn armed(&self) -> &[ArmedTrigger] {
		&self.armed
	}

	/// Returns true if nothing was armed.
	pub fn is_empty(&self) -> bool {
		self.armed.is_empty()
	}

	/// Returns true once any trigger of this set fired.
	pub fn has_fired(&self) -> bool {
		self.fired.get()
	}

	/// Number of release actions still pending.
	pub fn pending_releases(&self) -> usize {
		self.teardown.borrow().len()
	}

	/// Releases every armed trigger. Safe to call repeatedly.
	pub fn teardown(&self) {
		TeardownList::run_shared(&self.teardown);
	}
}

impl Drop for TriggerSet {
	fn drop(&mut self) {
		self.teardown();
	}
}

/// Arms activation triggers for one mount.
pub struct TriggerScheduler {
	host: Rc<dyn Host>,
	bridge: DomEventBridge,
}

impl TriggerScheduler {
	/// Creates a scheduler for `root`, scheduling through `host`.
	pub fn new(host: Rc<dyn Host>, root: Rc<dyn RootNode>) -> Self {
		Self {
			host,
			bridge: DomEventBridge::new(root),
		}
	}

	/// Arms the triggers of `config`.
	///
	/// Nothing is armed when `ssr_only` is set or `state` is already
	/// activated. `on_fire` runs at most once, after every trigger of the
	/// returned set has been released. If arming fails midway, triggers armed
	/// so far are released before the error is returned.
	pub fn arm(
		&self,
		config: &HydrationConfig,
		state: RenderState,
		on_fire: ListenerHandler,
	) -> Result<TriggerSet, HostError> {
		if config.ssr_only || state.is_activated() {
			return Ok(TriggerSet::empty());
		}

		let mut set = TriggerSet::empty();
		let fire: ListenerHandler = {
			let teardown = Rc::downgrade(&set.teardown);
			let fired = set.fired.clone();
			Rc::new(move || {
				if fired.replace(true) {
					return;
				}
				if let Some(teardown) = teardown.upgrade() {
					TeardownList::run_shared(&teardown);
				}
				on_fire();
			})
		};

		if config.when_idle {
			let trigger = self.arm_idle(fire.clone(), &set.teardown)?;
			set.armed.push(trigger);
		}

		if config.when_visible {
			crate::debug_log!("[LazyHydration] whenVisible is accepted but arms no trigger");
		}

		for event_type in config.on.normalized() {
			let registration = self.bridge.bind(&event_type, fire.clone())?;
			let bridge = self.bridge.clone();
			let release = registration.clone();
			set.teardown.borrow_mut().push(move || {
				if let Err(err) = bridge.unbind(&release) {
					crate::error_log!(
						"[LazyHydration] failed to unbind '{}': {}",
						release.event_type,
						err
					);
				}
			});
			set.armed.push(ArmedTrigger::Event(registration));
		}

		crate::debug_log!("[LazyHydration] armed {} triggers", set.armed.len());
		Ok(set)
	}

	/// Arms exactly one of the idle callback or the fallback timer.
	fn arm_idle(
		&self,
		fire: ListenerHandler,
		teardown: &RefCell<TeardownList>,
	) -> Result<ArmedTrigger, HostError> {
		let host = self.host.clone();
		if self.host.supports_idle_callback() {
			let handle = self
				.host
				.request_idle_callback(Box::new(move || fire()), IDLE_TIMEOUT)?;
			teardown
				.borrow_mut()
				.push(move || host.cancel_idle_callback(handle));
			Ok(ArmedTrigger::Idle(handle))
		} else {
			let handle = self
				.host
				.set_timeout(Box::new(move || fire()), IDLE_FALLBACK_DELAY)?;
			teardown.borrow_mut().push(move || host.clear_timeout(handle));
			Ok(ArmedTrigger::Timeout(handle))
		}
	}
}

impl std::fmt::Debug for TriggerScheduler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TriggerScheduler")
			.field("bridge", &self.bridge)
			.finish_non_exhaustive()
	}
}
