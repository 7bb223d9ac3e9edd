//! In-memory host for driving lazy hydration without a browser
//!
//! - [`MockHost`]: virtual clock for timers, manually flushed idle queue and a
//!   [`LocalPool`] standing in for the host event loop.
//! - [`MockRoot`]: a root node that records listeners and dispatches events
//!   with `once` semantics.
//! - [`MockRegistry`]: a module registry with ready, rejected and deferred
//!   modules, recording every request.
//!
//! ```ignore
//! let host = Rc::new(MockHost::without_idle_callback());
//! let root = Rc::new(MockRoot::with_children());
//! let registry = Rc::new(MockRegistry::new());
//! registry.register("appA", "Widget");
//!
//! let mount = LazyHydration::mount(props, MountContext::new(host.clone(), root.clone(), registry));
//! host.run_until_stalled();
//! host.advance(Duration::from_millis(2000));
//! assert!(mount.is_activated());
//! ```

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;

use crate::host::{
	Host, HostError, IdleHandle, ListenerHandler, ListenerId, ListenerOptions, RootNode, Task,
	TimerHandle,
};
use crate::hydration::remote::{ModuleFactory, ModuleRegistry, RegistryError};

/// A scheduling request observed by [`MockHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleRecord {
	/// `request_idle_callback` with its maximum wait.
	Idle {
		/// Requested maximum wait.
		timeout: Duration,
	},
	/// `set_timeout` with its delay.
	Timeout {
		/// Requested delay.
		delay: Duration,
	},
}

struct Scheduled {
	due: Duration,
	callback: Task,
}

#[derive(Default)]
struct Clock {
	now: Duration,
	next_id: u32,
	timers: BTreeMap<u32, Scheduled>,
	idle: BTreeMap<u32, Scheduled>,
	log: Vec<ScheduleRecord>,
}

impl Clock {
	fn next_id(&mut self) -> u32 {
		self.next_id += 1;
		self.next_id
	}

	/// Removes the earliest callback due at or before `until`.
	fn pop_due(&mut self, until: Duration) -> Option<Scheduled> {
		let timer = self.timers.iter().map(|(id, s)| (s.due, *id)).min();
		let idle = self.idle.iter().map(|(id, s)| (s.due, *id)).min();

		match (timer, idle) {
			(Some(t), Some(i)) if i < t => self.take_if_due(false, i, until),
			(Some(t), _) => self.take_if_due(true, t, until),
			(None, Some(i)) => self.take_if_due(false, i, until),
			(None, None) => None,
		}
	}

	fn take_if_due(
		&mut self,
		timer: bool,
		(due, id): (Duration, u32),
		until: Duration,
	) -> Option<Scheduled> {
		if due > until {
			return None;
		}
		if timer {
			self.timers.remove(&id)
		} else {
			self.idle.remove(&id)
		}
	}
}

/// Deterministic single-threaded host.
pub struct MockHost {
	has_dom: bool,
	idle_supported: bool,
	clock: RefCell<Clock>,
	pool: RefCell<LocalPool>,
	spawner: LocalSpawner,
}

impl MockHost {
	fn new(has_dom: bool, idle_supported: bool) -> Self {
		let pool = LocalPool::new();
		let spawner = pool.spawner();
		Self {
			has_dom,
			idle_supported,
			clock: RefCell::new(Clock::default()),
			pool: RefCell::new(pool),
			spawner,
		}
	}

	/// A browser with idle scheduling.
	pub fn browser() -> Self {
		Self::new(true, true)
	}

	/// A browser without `requestIdleCallback`.
	pub fn without_idle_callback() -> Self {
		Self::new(true, false)
	}

	/// A non-interactive rendering context (no DOM).
	pub fn server() -> Self {
		Self::new(false, false)
	}

	/// Current virtual time.
	pub fn now(&self) -> Duration {
		self.clock.borrow().now
	}

	/// Moves the clock forward, firing timers and idle deadlines that become due.
	pub fn advance(&self, by: Duration) {
		let until = self.clock.borrow().now + by;
		loop {
			let next = self.clock.borrow_mut().pop_due(until);
			let Some(scheduled) = next else {
				break;
			};
			self.clock.borrow_mut().now = scheduled.due;
			(scheduled.callback)();
		}
		self.clock.borrow_mut().now = until;
	}

	/// Simulates the host going idle: runs every pending idle callback.
	pub fn run_idle(&self) {
		let pending = std::mem::take(&mut self.clock.borrow_mut().idle);
		for (_, scheduled) in pending {
			(scheduled.callback)();
		}
	}

	/// Polls spawned tasks until none can make progress.
	pub fn run_until_stalled(&self) {
		self.pool.borrow_mut().run_until_stalled();
	}

	/// Number of armed timers.
	pub fn pending_timers(&self) -> usize {
		self.clock.borrow().timers.len()
	}

	/// Number of armed idle callbacks.
	pub fn pending_idle_callbacks(&self) -> usize {
		self.clock.borrow().idle.len()
	}

	/// Every scheduling request made so far.
	pub fn schedule_log(&self) -> Vec<ScheduleRecord> {
		self.clock.borrow().log.clone()
	}
}

impl Host for MockHost {
	fn has_dom(&self) -> bool {
		self.has_dom
	}

	fn supports_idle_callback(&self) -> bool {
		self.idle_supported
	}

	fn request_idle_callback(
		&self,
		callback: Task,
		timeout: Duration,
	) -> Result<IdleHandle, HostError> {
		if !self.idle_supported {
			return Err(HostError::Unavailable("requestIdleCallback"));
		}
		let mut clock = self.clock.borrow_mut();
		let id = clock.next_id();
		let due = clock.now + timeout;
		clock.idle.insert(id, Scheduled { due, callback });
		clock.log.push(ScheduleRecord::Idle { timeout });
		Ok(IdleHandle(id))
	}

	fn cancel_idle_callback(&self, handle: IdleHandle) {
		self.clock.borrow_mut().idle.remove(&handle.0);
	}

	fn set_timeout(&self, callback: Task, delay: Duration) -> Result<TimerHandle, HostError> {
		let mut clock = self.clock.borrow_mut();
		let id = clock.next_id();
		let due = clock.now + delay;
		clock.timers.insert(id, Scheduled { due, callback });
		clock.log.push(ScheduleRecord::Timeout { delay });
		Ok(TimerHandle(id as i32))
	}

	fn clear_timeout(&self, handle: TimerHandle) {
		self.clock.borrow_mut().timers.remove(&(handle.0 as u32));
	}

	fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
		if let Err(err) = self.spawner.spawn_local(task) {
			crate::error_log!("[MockHost] failed to spawn task: {}", err);
		}
	}
}

impl std::fmt::Debug for MockHost {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MockHost")
			.field("has_dom", &self.has_dom)
			.field("idle_supported", &self.idle_supported)
			.field("now", &self.now())
			.finish_non_exhaustive()
	}
}

struct MockListener {
	id: ListenerId,
	event_type: String,
	options: ListenerOptions,
	handler: ListenerHandler,
}

/// Root node recording its listeners.
#[derive(Default)]
pub struct MockRoot {
	has_children: Cell<bool>,
	next_id: Cell<u64>,
	listeners: RefCell<Vec<MockListener>>,
	removals: RefCell<Vec<(String, bool)>>,
	failing: RefCell<Vec<String>>,
}

impl MockRoot {
	/// A root holding server-rendered content.
	pub fn with_children() -> Self {
		let root = Self::default();
		root.has_children.set(true);
		root
	}

	/// A root without any child node.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Makes binding `event_type` fail.
	pub fn fail_binding(&self, event_type: &str) {
		self.failing.borrow_mut().push(event_type.to_string());
	}

	/// Dispatches `event_type`, returning how many listeners ran.
	///
	/// `once` listeners are removed before their handler runs.
	pub fn dispatch(&self, event_type: &str) -> usize {
		let handlers: Vec<ListenerHandler> = {
			let mut listeners = self.listeners.borrow_mut();
			let mut hits = Vec::new();
			listeners.retain(|listener| {
				if listener.event_type != event_type {
					return true;
				}
				hits.push(listener.handler.clone());
				!listener.options.once
			});
			hits
		};

		for handler in &handlers {
			handler();
		}
		handlers.len()
	}

	/// Number of bound listeners.
	pub fn listener_count(&self) -> usize {
		self.listeners.borrow().len()
	}

	/// Options of the listeners bound for `event_type`.
	pub fn listener_options(&self, event_type: &str) -> Vec<ListenerOptions> {
		self.listeners
			.borrow()
			.iter()
			.filter(|listener| listener.event_type == event_type)
			.map(|listener| listener.options)
			.collect()
	}

	/// `(event_type, capture)` of every removal request, in order.
	pub fn removals(&self) -> Vec<(String, bool)> {
		self.removals.borrow().clone()
	}
}

impl RootNode for MockRoot {
	fn has_child_nodes(&self) -> bool {
		self.has_children.get()
	}

	fn add_event_listener(
		&self,
		event_type: &str,
		options: ListenerOptions,
		handler: ListenerHandler,
	) -> Result<ListenerId, HostError> {
		if self.failing.borrow().iter().any(|e| e == event_type) {
			return Err(HostError::operation(
				"addEventListener",
				format!("'{}' rejected", event_type),
			));
		}

		let id = ListenerId(self.next_id.get());
		self.next_id.set(id.0 + 1);
		self.listeners.borrow_mut().push(MockListener {
			id,
			event_type: event_type.to_string(),
			options,
			handler,
		});
		Ok(id)
	}

	fn remove_event_listener(
		&self,
		event_type: &str,
		id: ListenerId,
		capture: bool,
	) -> Result<(), HostError> {
		self.removals
			.borrow_mut()
			.push((event_type.to_string(), capture));
		self.listeners.borrow_mut().retain(|listener| {
			!(listener.id == id
				&& listener.event_type == event_type
				&& listener.options.capture == capture)
		});
		Ok(())
	}
}

impl std::fmt::Debug for MockRoot {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MockRoot")
			.field("has_children", &self.has_children.get())
			.field("listeners", &self.listener_count())
			.finish_non_exhaustive()
	}
}

enum Behaviour {
	Ready,
	Reject(String),
	Deferred(Option<oneshot::Receiver<Result<(), String>>>),
}

struct MockModuleEntry {
	behaviour: Behaviour,
	invocations: Rc<Cell<usize>>,
}

/// Counts factory invocations of a registered module.
#[derive(Debug, Clone)]
pub struct MockModule {
	invocations: Rc<Cell<usize>>,
}

impl MockModule {
	/// How many times the module's factory ran.
	pub fn invocations(&self) -> usize {
		self.invocations.get()
	}
}

/// Completes a deferred module request.
///
/// Keeping the handle alive without resolving models a registry that never
/// answers. Dropping it rejects the request.
#[derive(Debug)]
pub struct PendingModule {
	sender: oneshot::Sender<Result<(), String>>,
	module: MockModule,
}

impl PendingModule {
	/// Counter of the module behind this request.
	pub fn module(&self) -> MockModule {
		self.module.clone()
	}

	/// Lets the registry answer with the factory.
	pub fn resolve(self) {
		let _ = self.sender.send(Ok(()));
	}

	/// Lets the registry reject the request.
	pub fn reject(self, reason: impl Into<String>) {
		let _ = self.sender.send(Err(reason.into()));
	}
}

/// Module registry keyed by scope, recording every request.
#[derive(Default)]
pub struct MockRegistry {
	scopes: RefCell<HashMap<String, HashMap<String, MockModuleEntry>>>,
	requests: RefCell<Vec<(String, String)>>,
}

impl MockRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	fn insert(&self, scope: &str, request: &str, behaviour: Behaviour) -> MockModule {
		let invocations = Rc::new(Cell::new(0));
		self.scopes
			.borrow_mut()
			.entry(scope.to_string())
			.or_default()
			.insert(
				request.to_string(),
				MockModuleEntry {
					behaviour,
					invocations: invocations.clone(),
				},
			);
		MockModule { invocations }
	}

	/// Registers a module that resolves immediately.
	pub fn register(&self, scope: &str, request: &str) -> MockModule {
		self.insert(scope, request, Behaviour::Ready)
	}

	/// Registers a module whose request is rejected.
	pub fn reject(&self, scope: &str, request: &str, reason: &str) -> MockModule {
		self.insert(scope, request, Behaviour::Reject(reason.to_string()))
	}

	/// Registers a module answered only through the returned handle.
	pub fn defer(&self, scope: &str, request: &str) -> PendingModule {
		let (sender, receiver) = oneshot::channel();
		let module = self.insert(scope, request, Behaviour::Deferred(Some(receiver)));
		PendingModule { sender, module }
	}

	/// Every `(scope, request)` asked for, in order.
	pub fn requests(&self) -> Vec<(String, String)> {
		self.requests.borrow().clone()
	}
}

#[async_trait(?Send)]
impl ModuleRegistry for MockRegistry {
	async fn resolve(&self, scope: &str, request: &str) -> Result<ModuleFactory, RegistryError> {
		self.requests
			.borrow_mut()
			.push((scope.to_string(), request.to_string()));

		let rejected = |reason: &str| RegistryError::Rejected {
			scope: scope.to_string(),
			request: request.to_string(),
			reason: reason.to_string(),
		};

		let (pending, invocations) = {
			let mut scopes = self.scopes.borrow_mut();
			let modules = scopes
				.get_mut(scope)
				.ok_or_else(|| RegistryError::ScopeNotRegistered(scope.to_string()))?;
			let entry = modules
				.get_mut(request)
				.ok_or_else(|| rejected("not exposed"))?;
			let pending = match &mut entry.behaviour {
				Behaviour::Ready => None,
				Behaviour::Reject(reason) => return Err(rejected(reason.as_str())),
				Behaviour::Deferred(receiver) => {
					Some(receiver.take().ok_or_else(|| rejected("already requested"))?)
				}
			};
			(pending, entry.invocations.clone())
		};

		if let Some(receiver) = pending {
			match receiver.await {
				Ok(Ok(())) => {}
				Ok(Err(reason)) => return Err(rejected(&reason)),
				Err(oneshot::Canceled) => return Err(rejected("request abandoned")),
			}
		}

		Ok(Box::new(move || invocations.set(invocations.get() + 1)))
	}
}

impl std::fmt::Debug for MockRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MockRegistry")
			.field("requests", &self.requests.borrow().len())
			.finish_non_exhaustive()
	}
}
