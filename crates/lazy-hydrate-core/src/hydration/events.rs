//! DOM event bridge
//!
//! Binds the activation listeners on the subtree root. Every binding uses the
//! same fixed options, and removal always repeats the capture flag because a
//! listener is only found again with matching capture.

use std::rc::Rc;

use crate::host::{HostError, ListenerHandler, ListenerId, ListenerOptions, RootNode};

/// Options of every activation listener: single-fire, capture-phase, passive.
pub const ACTIVATION_LISTENER_OPTIONS: ListenerOptions = ListenerOptions {
	once: true,
	capture: true,
	passive: true,
};

/// A bound listener, needed to unbind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerRegistration {
	/// The event type.
	pub event_type: String,
	/// Host identifier of the listener.
	pub id: ListenerId,
	/// Capture flag used at bind time.
	pub capture: bool,
}

/// Binds and unbinds activation listeners on one root node.
#[derive(Clone)]
pub struct DomEventBridge {
	root: Rc<dyn RootNode>,
}

impl DomEventBridge {
	/// Creates a bridge for `root`.
	pub fn new(root: Rc<dyn RootNode>) -> Self {
		Self { root }
	}

	/// Binds `handler` for `event_type`.
	pub fn bind(
		&self,
		event_type: &str,
		handler: ListenerHandler,
	) -> Result<ListenerRegistration, HostError> {
		let id = self
			.root
			.add_event_listener(event_type, ACTIVATION_LISTENER_OPTIONS, handler)?;

		Ok(ListenerRegistration {
			event_type: event_type.to_string(),
			id,
			capture: ACTIVATION_LISTENER_OPTIONS.capture,
		})
	}

	/// Unbinds a registration made by [`DomEventBridge::bind`].
	pub fn unbind(&self, registration: &ListenerRegistration) -> Result<(), HostError> {
		self.root.remove_event_listener(
			&registration.event_type,
			registration.id,
			registration.capture,
		)
	}
}

impl std::fmt::Debug for DomEventBridge {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DomEventBridge").finish_non_exhaustive()
	}
}
