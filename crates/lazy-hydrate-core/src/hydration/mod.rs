//! Deferred hydration of server-rendered subtrees
//!
//! A subtree delivered as static markup stays untouched until one of its
//! configured triggers fires and the interactive implementation it depends
//! on has been resolved from the module registry.
//!
//! ## Architecture
//!
//! ```text
//! LazyHydration (controller)
//!  ├─ RenderState        Placeholder ──▶ Activated
//!  ├─ RemoteModuleLoader  "scope/request" ──▶ ModuleRegistry ──▶ factory()
//!  └─ TriggerScheduler    idle | timeout | events ──▶ TeardownList
//!      └─ DomEventBridge  once + capture + passive listeners on the root
//! ```

pub mod controller;
pub mod events;
pub mod markup;
pub mod remote;
pub mod scheduler;
pub mod state;

pub use controller::{LazyHydration, MountContext};
pub use events::{ACTIVATION_LISTENER_OPTIONS, DomEventBridge, ListenerRegistration};
pub use markup::{
	LAZY_ATTR_PROPS, LAZY_ATTR_STATE, LAZY_ATTR_STATIC, RootAttributes, RootMarkup,
	is_valid_attribute_name,
};
pub use remote::{
	ModuleFactory, ModuleReference, ModuleRegistry, RegistryError, RemoteModuleLoader,
	SCOPE_SEPARATOR,
};
pub use scheduler::{ArmedTrigger, TeardownList, TriggerScheduler, TriggerSet};
pub use state::{ModuleStatus, RenderState};
