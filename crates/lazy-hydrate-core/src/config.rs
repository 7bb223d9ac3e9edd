//! Hydration configuration
//!
//! [`HydrationConfig`] is supplied by the caller once per mount and never
//! mutated by the controller. It deserialises from the same camelCase props
//! object the server embeds into the placeholder, so a client can restore
//! the configuration from `data-lh-props`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Maximum wait passed to the host's idle scheduler.
pub const IDLE_TIMEOUT: Duration = Duration::from_millis(500);

/// Delay of the timer armed when idle scheduling is unavailable.
pub const IDLE_FALLBACK_DELAY: Duration = Duration::from_millis(2000);

/// Props keys consumed by [`HydrationConfig`]; everything else is passed through.
const CONFIG_KEYS: [&str; 5] = ["ssrOnly", "whenIdle", "whenVisible", "on", "remoteImport"];

/// Props key carrying the subtree content. Content is rendered through
/// `LazyHydration::render`, never as an attribute.
const CONTENT_KEY: &str = "children";

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// The props payload was not valid JSON or had the wrong shape.
	#[error("invalid hydration props: {0}")]
	Parse(#[from] serde_json::Error),
	/// The props payload was valid JSON but not an object.
	#[error("hydration props must be a JSON object, found {0}")]
	NotAnObject(&'static str),
}

/// Event names that activate the subtree.
///
/// Accepts either a single name or an ordered list, matching the two shapes
/// the `on` prop may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventNames {
	/// A single event name.
	Single(String),
	/// An ordered list of event names.
	Many(Vec<String>),
}

impl Default for EventNames {
	fn default() -> Self {
		Self::Many(Vec::new())
	}
}

impl EventNames {
	/// Returns true if no event name is configured.
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Single(name) => name.is_empty(),
			Self::Many(names) => names.is_empty(),
		}
	}

	/// Normalises to an ordered sequence of distinct, non-empty names.
	///
	/// A single name becomes a one-element sequence. Order of first
	/// appearance is preserved.
	pub fn normalized(&self) -> Vec<String> {
		let names: &[String] = match self {
			Self::Single(name) => std::slice::from_ref(name),
			Self::Many(names) => names,
		};

		let mut out: Vec<String> = Vec::with_capacity(names.len());
		for name in names {
			if !name.is_empty() && !out.contains(name) {
				out.push(name.clone());
			}
		}
		out
	}
}

impl From<&str> for EventNames {
	fn from(name: &str) -> Self {
		Self::Single(name.to_string())
	}
}

impl From<String> for EventNames {
	fn from(name: String) -> Self {
		Self::Single(name)
	}
}

impl From<Vec<String>> for EventNames {
	fn from(names: Vec<String>) -> Self {
		Self::Many(names)
	}
}

impl From<Vec<&str>> for EventNames {
	fn from(names: Vec<&str>) -> Self {
		Self::Many(names.into_iter().map(String::from).collect())
	}
}

impl<const N: usize> From<[&str; N]> for EventNames {
	fn from(names: [&str; N]) -> Self {
		Self::Many(names.iter().map(|s| s.to_string()).collect())
	}
}

/// Trigger configuration for one lazily hydrated subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HydrationConfig {
	/// Never activate; the remote module is still loaded for its side effects.
	pub ssr_only: bool,
	/// Activate when the host is idle (or after the fallback delay).
	pub when_idle: bool,
	/// Accepted for compatibility; arms no trigger.
	pub when_visible: bool,
	/// Events on the root that activate the subtree.
	pub on: EventNames,
	/// `"<scope>/<request>"` identifier of the interactive implementation.
	///
	/// `None` means the implementation is already available locally.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub remote_import: Option<String>,
}

impl HydrationConfig {
	/// Creates a configuration with no trigger set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses a configuration from a JSON props object.
	///
	/// Unknown keys are ignored; use [`LazyHydrateProps`] to keep them.
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		Ok(serde_json::from_str(json)?)
	}

	/// Serialises the trigger configuration to JSON.
	pub fn to_json(&self) -> Result<String, ConfigError> {
		Ok(serde_json::to_string(self)?)
	}

	/// Sets the ssr_only option.
	pub fn ssr_only(mut self, ssr_only: bool) -> Self {
		self.ssr_only = ssr_only;
		self
	}

	/// Sets the when_idle option.
	pub fn when_idle(mut self, when_idle: bool) -> Self {
		self.when_idle = when_idle;
		self
	}

	/// Sets the when_visible option.
	pub fn when_visible(mut self, when_visible: bool) -> Self {
		self.when_visible = when_visible;
		self
	}

	/// Sets the activation events.
	pub fn on(mut self, events: impl Into<EventNames>) -> Self {
		self.on = events.into();
		self
	}

	/// Sets the remote module identifier.
	pub fn remote_import(mut self, remote_import: impl Into<String>) -> Self {
		self.remote_import = Some(remote_import.into());
		self
	}

	/// Returns true if at least one trigger (or `ssr_only`) is configured.
	pub fn has_trigger(&self) -> bool {
		self.ssr_only || self.when_idle || self.when_visible || !self.on.is_empty()
	}

	/// Returns the advisory for this configuration, if any.
	pub fn advisory(&self) -> Option<ConfigAdvisory> {
		if self.has_trigger() {
			None
		} else {
			Some(ConfigAdvisory::NoTrigger)
		}
	}
}

/// Non-fatal configuration diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAdvisory {
	/// No trigger and no `ssr_only`: the subtree can never activate.
	NoTrigger,
}

impl std::fmt::Display for ConfigAdvisory {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::NoTrigger => write!(
				f,
				"LazyHydration: enable at least one trigger for hydration.\n\
				 If you don't want to hydrate, use ssrOnly"
			),
		}
	}
}

/// Full props of a lazily hydrated root: trigger configuration plus the
/// attributes forwarded verbatim onto the root element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LazyHydrateProps {
	/// Trigger configuration.
	pub config: HydrationConfig,
	/// Passthrough attributes, keyed by attribute name.
	pub attributes: BTreeMap<String, serde_json::Value>,
}

impl LazyHydrateProps {
	/// Creates props from a configuration with no passthrough attributes.
	pub fn new(config: HydrationConfig) -> Self {
		Self {
			config,
			attributes: BTreeMap::new(),
		}
	}

	/// Adds a passthrough attribute.
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.attributes.insert(name.into(), value.into());
		self
	}

	/// Parses props from a JSON object string.
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		let value: serde_json::Value = serde_json::from_str(json)?;
		Self::from_value(value)
	}

	/// Splits a JSON props object into configuration and passthrough attributes.
	///
	/// `children` is dropped: it is content, not an attribute.
	pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
		let serde_json::Value::Object(map) = value else {
			return Err(ConfigError::NotAnObject(json_kind(&value)));
		};

		let mut config_map = serde_json::Map::new();
		let mut attributes = BTreeMap::new();
		for (key, value) in map {
			if CONFIG_KEYS.contains(&key.as_str()) {
				config_map.insert(key, value);
			} else if key == CONTENT_KEY {
				crate::debug_log!("[LazyHydration] ignoring `children` in props");
			} else {
				attributes.insert(key, value);
			}
		}

		let config = serde_json::from_value(serde_json::Value::Object(config_map))?;
		Ok(Self { config, attributes })
	}
}

fn json_kind(value: &serde_json::Value) -> &'static str {
	match value {
		serde_json::Value::Null => "null",
		serde_json::Value::Bool(_) => "a boolean",
		serde_json::Value::Number(_) => "a number",
		serde_json::Value::String(_) => "a string",
		serde_json::Value::Array(_) => "an array",
		serde_json::Value::Object(_) => "an object",
	}
}
