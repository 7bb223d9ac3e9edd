//! Host capabilities
//!
//! The controller never reaches for ambient globals. Scheduling primitives
//! and the subtree root are handed to it as trait objects, implemented by
//! [`crate::browser`] on `wasm32` and by [`crate::testing`] everywhere.

use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::time::Duration;

/// A one-shot callback scheduled on the host loop.
pub type Task = Box<dyn FnOnce() + 'static>;

/// Shared event handler invoked by a root listener.
pub type ListenerHandler = Rc<dyn Fn() + 'static>;

/// Handle returned by [`Host::request_idle_callback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdleHandle(pub u32);

/// Handle returned by [`Host::set_timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub i32);

/// Identifies a listener registered through [`RootNode::add_event_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Qualifiers applied when binding a DOM listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenerOptions {
	/// Remove the listener after its first invocation.
	pub once: bool,
	/// Observe the event during the capture phase.
	pub capture: bool,
	/// Never call `preventDefault`.
	pub passive: bool,
}

/// Errors raised by host primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
	/// The primitive does not exist in this host.
	#[error("host primitive unavailable: {0}")]
	Unavailable(&'static str),
	/// The primitive exists but the call failed.
	#[error("host primitive `{operation}` failed: {reason}")]
	Operation {
		/// Name of the failing primitive.
		operation: &'static str,
		/// Host-provided reason.
		reason: String,
	},
}

impl HostError {
	/// Creates an [`HostError::Operation`].
	pub fn operation(operation: &'static str, reason: impl Into<String>) -> Self {
		Self::Operation {
			operation,
			reason: reason.into(),
		}
	}
}

/// Scheduling primitives of the host event loop.
///
/// All callbacks run on the host's single thread; nothing here is `Send`.
pub trait Host {
	/// Returns true when a DOM is available (client), false when rendering
	/// non-interactively (server).
	fn has_dom(&self) -> bool;

	/// Returns true if the host can schedule idle callbacks.
	fn supports_idle_callback(&self) -> bool;

	/// Runs `callback` when the host is idle, or after `timeout` at the latest.
	fn request_idle_callback(&self, callback: Task, timeout: Duration)
	-> Result<IdleHandle, HostError>;

	/// Cancels a pending idle callback. Unknown handles are ignored.
	fn cancel_idle_callback(&self, handle: IdleHandle);

	/// Runs `callback` once after `delay`.
	fn set_timeout(&self, callback: Task, delay: Duration) -> Result<TimerHandle, HostError>;

	/// Cancels a pending timer. Unknown handles are ignored.
	fn clear_timeout(&self, handle: TimerHandle);

	/// Drives `task` to completion on the host loop without blocking the caller.
	fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
}

/// The root node of a lazily hydrated subtree.
///
/// Owned exclusively by one mount.
pub trait RootNode {
	/// Returns true if the root currently has any child node.
	fn has_child_nodes(&self) -> bool;

	/// Binds `handler` for `event` with the given options.
	fn add_event_listener(
		&self,
		event: &str,
		options: ListenerOptions,
		handler: ListenerHandler,
	) -> Result<ListenerId, HostError>;

	/// Unbinds a listener. `capture` must match the flag used when binding.
	fn remove_event_listener(
		&self,
		event: &str,
		id: ListenerId,
		capture: bool,
	) -> Result<(), HostError>;
}
