//! # Lazy Hydrate
//!
//! Deferred, trigger-driven hydration for server-rendered subtrees.
//!
//! A subtree marked as lazy keeps its server-delivered markup untouched
//! until the browser is idle or the user interacts with it. Only then is
//! the implementation behind it pulled from a remote module registry and
//! the subtree switched to its interactive form.
//!
//! ## Feature Flags
//!
//! - `debug-hooks` - Trace trigger arming and firing in debug builds
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use lazy_hydrate::prelude::*;
//!
//! let props = LazyHydrateProps::from_json(
//!     r#"{"whenIdle": true, "on": ["click"], "remoteImport": "appA/Widget", "id": "cart"}"#,
//! )?;
//!
//! let mount = lazy_hydrate::browser::mount_element(props, element)?;
//! mount.on_activated(|| render_cart());
//! ```

pub mod hydration;

pub use lazy_hydrate_core::{config, host, logging, testing};

#[cfg(target_arch = "wasm32")]
pub use lazy_hydrate_core::browser;

pub use lazy_hydrate_core::{debug_log, error_log, info_log, warn_log};

/// Commonly used types for mounting a lazy subtree.
pub mod prelude {
	pub use lazy_hydrate_core::{
		EventNames, Host, HydrationConfig, LazyHydrateProps, LazyHydration, ModuleRegistry,
		ModuleStatus, MountContext, RegistryError, RenderState, RootMarkup, RootNode,
	};
}
