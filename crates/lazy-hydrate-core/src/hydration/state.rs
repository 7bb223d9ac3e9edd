//! Render state of a lazily hydrated subtree

/// Whether the subtree shows its server-delivered placeholder or its
/// interactive children.
///
/// The only transition is `Placeholder -> Activated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderState {
	/// Server markup is kept untouched; no children are rendered.
	Placeholder,
	/// Children are rendered and interactive.
	Activated,
}

impl RenderState {
	/// Initial state for a mount.
	///
	/// Without a DOM there is nothing to defer, so the full content renders.
	pub fn initial(has_dom: bool) -> Self {
		if has_dom {
			Self::Placeholder
		} else {
			Self::Activated
		}
	}

	/// Returns true once activated.
	pub fn is_activated(self) -> bool {
		matches!(self, Self::Activated)
	}

	/// Value of the `data-lh-state` marker attribute.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Placeholder => "placeholder",
			Self::Activated => "activated",
		}
	}
}

/// Progress of the remote module backing the subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleStatus {
	/// The registry has not answered yet.
	Pending,
	/// The factory ran; the interactive implementation is available.
	Ready,
	/// The registry rejected the request. The subtree stays a placeholder.
	Failed,
}

impl ModuleStatus {
	/// Returns true if the module gate is open.
	pub fn is_ready(self) -> bool {
		matches!(self, Self::Ready)
	}
}
