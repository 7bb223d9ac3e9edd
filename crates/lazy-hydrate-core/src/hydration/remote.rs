//! Remote module resolution
//!
//! A `remoteImport` such as `"appA/widgets/Cart"` names a scope (`appA`) in
//! a module registry and a request inside it (`widgets/Cart`). The registry
//! answers with a zero-argument factory; running it makes the interactive
//! implementation available to the surrounding code.
//!
//! ```text
//! "appA/widgets/Cart" ──split──▶ ModuleReference { scope: "appA", request: "widgets/Cart" }
//!                                    │
//!                                    ▼
//!                      ModuleRegistry::resolve(scope, request)
//!                                    │ (async)
//!                                    ▼
//!                              factory() ──▶ module ready
//! ```

use async_trait::async_trait;
use std::rc::Rc;

/// Separator between scope and request.
pub const SCOPE_SEPARATOR: char = '/';

/// A factory returned by the registry. Invoked exactly once.
pub type ModuleFactory = Box<dyn FnOnce() + 'static>;

/// Errors produced while resolving a remote module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	/// No container is registered under the scope.
	#[error("module scope '{0}' is not registered")]
	ScopeNotRegistered(String),
	/// The scope refused the request.
	#[error("module '{request}' of scope '{scope}' was rejected: {reason}")]
	Rejected {
		/// Scope that was asked.
		scope: String,
		/// Request that failed.
		request: String,
		/// Registry-provided reason.
		reason: String,
	},
	/// The scope answered with something that is not a factory.
	#[error("module '{0}' did not resolve to a factory")]
	InvalidModule(String),
}

/// Scope and request derived from a `remoteImport` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleReference {
	/// Registry scope.
	pub scope: String,
	/// Request passed to the scope's accessor.
	pub request: String,
}

impl ModuleReference {
	/// Splits `remote_import` once on the first separator.
	///
	/// Without a separator the whole string is the scope and the request is
	/// empty.
	pub fn parse(remote_import: &str) -> Self {
		match remote_import.split_once(SCOPE_SEPARATOR) {
			Some((scope, request)) => Self {
				scope: scope.to_string(),
				request: request.to_string(),
			},
			None => Self {
				scope: remote_import.to_string(),
				request: String::new(),
			},
		}
	}

	/// Path under which federation containers expose the request (`./<request>`).
	pub fn exposed_path(&self) -> String {
		format!("./{}", self.request)
	}
}

impl std::fmt::Display for ModuleReference {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}{}{}", self.scope, SCOPE_SEPARATOR, self.request)
	}
}

/// Process-wide registry of loadable module scopes.
///
/// Read-only from the controller's point of view.
#[async_trait(?Send)]
pub trait ModuleRegistry {
	/// Resolves `request` inside `scope` to a factory.
	async fn resolve(&self, scope: &str, request: &str) -> Result<ModuleFactory, RegistryError>;
}

/// Resolves a [`ModuleReference`] and runs its factory.
#[derive(Clone)]
pub struct RemoteModuleLoader {
	registry: Rc<dyn ModuleRegistry>,
}

impl RemoteModuleLoader {
	/// Creates a loader over `registry`.
	pub fn new(registry: Rc<dyn ModuleRegistry>) -> Self {
		Self { registry }
	}

	/// Requests the module once and invokes the resulting factory.
	///
	/// Returns after the factory has run. Failures are returned, never retried.
	pub async fn load(&self, reference: &ModuleReference) -> Result<(), RegistryError> {
		crate::debug_log!(
			"[LazyHydration] resolving scope '{}' request '{}'",
			reference.scope,
			reference.request
		);
		let factory = self
			.registry
			.resolve(&reference.scope, &reference.request)
			.await?;
		factory();
		Ok(())
	}
}

impl std::fmt::Debug for RemoteModuleLoader {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RemoteModuleLoader").finish_non_exhaustive()
	}
}
