//! Lazy Hydrate Core - deferred activation of server-rendered subtrees
//!
//! Server-rendered markup is shipped as-is and stays static until a
//! configured trigger fires. Only then does the subtree switch to its
//! interactive form, after the implementation behind it has been resolved
//! from a remote module registry.
//!
//! ## Features
//!
//! - **Trigger racing**: idle callback (with timer fallback) and one-shot
//!   capture-phase DOM events; the first one wins and releases the rest
//! - **Remote modules**: `"scope/request"` identifiers resolved through an
//!   injected [`ModuleRegistry`]
//! - **Host agnostic**: scheduling and DOM access go through the [`Host`] and
//!   [`RootNode`] capabilities, implemented for the browser and in memory
//!
//! ## Modules
//!
//! - [`config`]: Trigger configuration and props parsing
//! - [`host`]: Host capability traits
//! - [`hydration`]: Controller, scheduler, loader and markup
//! - [`testing`]: In-memory host, root and registry
//! - `browser` (`wasm32` only): `web-sys` backed capabilities
//!
//! ## Example
//!
//! ```ignore
//! use lazy_hydrate_core::{HydrationConfig, LazyHydrateProps};
//! use lazy_hydrate_core::browser::mount_element;
//!
//! let props = LazyHydrateProps::new(
//!     HydrationConfig::new()
//!         .when_idle(true)
//!         .on(["click", "touchstart"])
//!         .remote_import("appA/Widget"),
//! )
//! .attr("id", "cart");
//!
//! let mount = mount_element(props, element)?;
//! mount.on_activated(move || render_cart(&element));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod host;
pub mod hydration;
pub mod logging;
pub mod testing;

#[cfg(target_arch = "wasm32")]
pub mod browser;

pub use config::{
	ConfigAdvisory, ConfigError, EventNames, HydrationConfig, IDLE_FALLBACK_DELAY, IDLE_TIMEOUT,
	LazyHydrateProps,
};
pub use host::{
	Host, HostError, IdleHandle, ListenerHandler, ListenerId, ListenerOptions, RootNode, Task,
	TimerHandle,
};
pub use hydration::{
	ArmedTrigger, LazyHydration, ModuleFactory, ModuleReference, ModuleRegistry, ModuleStatus,
	MountContext, RegistryError, RemoteModuleLoader, RenderState, RootMarkup, TriggerScheduler,
	TriggerSet,
};

// Logging macros are exported via #[macro_export]:
// lazy_hydrate_core::debug_log!, info_log!, warn_log!, error_log!
