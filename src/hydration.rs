//! Deferred activation controller
//!
//! This module provides access to the lazy-hydrate-core controller, trigger
//! scheduler, remote module loader and root markup.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lazy_hydrate::hydration::{LazyHydration, MountContext};
//! use lazy_hydrate::config::{HydrationConfig, LazyHydrateProps};
//!
//! let mount = LazyHydration::mount(
//!     LazyHydrateProps::new(HydrationConfig::new().on("click")),
//!     MountContext::new(host, root, registry),
//! );
//! let html = mount.render("<button>Buy</button>");
//! ```

// Re-export all lazy-hydrate-core hydration functionality
pub use lazy_hydrate_core::hydration::*;
