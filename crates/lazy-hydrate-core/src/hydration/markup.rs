//! Root element markup
//!
//! The root renders in one of two shapes, selected by [`RenderState`]:
//!
//! ```text
//! Placeholder:
//! <div style="display: contents" data-lh-state="placeholder" data-lh-static="true"
//!      data-lh-props="{...}" id="cart"></div>
//!
//! Activated:
//! <div style="display: contents" data-lh-state="activated" id="cart">children</div>
//! ```
//!
//! `data-lh-static` tells the surrounding hydration pass to leave the
//! server-delivered content alone instead of reporting a mismatch.

use std::collections::BTreeMap;

use super::state::RenderState;

/// Marker attribute carrying the render state.
pub const LAZY_ATTR_STATE: &str = "data-lh-state";

/// Marker attribute suppressing mismatch diagnostics on the placeholder.
pub const LAZY_ATTR_STATIC: &str = "data-lh-static";

/// Attribute carrying the serialised trigger configuration.
pub const LAZY_ATTR_PROPS: &str = "data-lh-props";

const ROOT_TAG: &str = "div";
const ROOT_STYLE: &str = "display: contents";

/// Passthrough attributes forwarded onto the root.
pub type RootAttributes = BTreeMap<String, serde_json::Value>;

/// The two render shapes of the root.
#[derive(Debug, Clone, PartialEq)]
pub enum RootMarkup<'a> {
	/// Empty root keeping its attributes.
	Placeholder {
		/// Passthrough attributes.
		attributes: &'a RootAttributes,
		/// Serialised trigger configuration, if any.
		props: Option<String>,
	},
	/// Root with its children.
	Activated {
		/// Passthrough attributes.
		attributes: &'a RootAttributes,
		/// Pre-rendered children markup, emitted verbatim.
		children: &'a str,
	},
}

impl<'a> RootMarkup<'a> {
	/// Selects the shape for `state`.
	pub fn for_state(
		state: RenderState,
		attributes: &'a RootAttributes,
		props: Option<String>,
		children: &'a str,
	) -> Self {
		match state {
			RenderState::Placeholder => Self::Placeholder { attributes, props },
			RenderState::Activated => Self::Activated {
				attributes,
				children,
			},
		}
	}

	/// The state this markup represents.
	pub fn state(&self) -> RenderState {
		match self {
			Self::Placeholder { .. } => RenderState::Placeholder,
			Self::Activated { .. } => RenderState::Activated,
		}
	}

	/// Inner content of the root.
	pub fn inner_html(&self) -> &str {
		match self {
			Self::Placeholder { .. } => "",
			Self::Activated { children, .. } => children,
		}
	}

	/// Attributes of the root element, in render order.
	///
	/// `None` values are boolean attributes rendered without a value.
	pub fn attrs(&self) -> Vec<(String, Option<String>)> {
		let attributes = match self {
			Self::Placeholder { attributes, .. } | Self::Activated { attributes, .. } => *attributes,
		};

		let mut attrs = Vec::with_capacity(attributes.len() + 4);
		if !attributes.contains_key("style") {
			attrs.push(("style".to_string(), Some(ROOT_STYLE.to_string())));
		}
		attrs.push((
			LAZY_ATTR_STATE.to_string(),
			Some(self.state().as_str().to_string()),
		));

		if let Self::Placeholder { props, .. } = self {
			attrs.push((LAZY_ATTR_STATIC.to_string(), Some("true".to_string())));
			if let Some(props) = props {
				attrs.push((LAZY_ATTR_PROPS.to_string(), Some(props.clone())));
			}
		}

		for (name, value) in attributes {
			if !is_valid_attribute_name(name) {
				crate::warn_log!("[LazyHydration] skipping invalid attribute name {:?}", name);
				continue;
			}
			match value {
				serde_json::Value::Null | serde_json::Value::Bool(false) => {}
				serde_json::Value::Bool(true) => attrs.push((name.clone(), None)),
				serde_json::Value::String(s) => attrs.push((name.clone(), Some(s.clone()))),
				other => attrs.push((name.clone(), Some(other.to_string()))),
			}
		}

		attrs
	}

	/// Serialises the root element to HTML.
	pub fn to_html(&self) -> String {
		let mut html = format!("<{}", ROOT_TAG);
		for (name, value) in self.attrs() {
			match value {
				Some(value) => {
					html.push_str(&format!(" {}=\"{}\"", name, html_escape_attr(&value)));
				}
				None => {
					html.push(' ');
					html.push_str(&name);
				}
			}
		}
		html.push('>');
		html.push_str(self.inner_html());
		html.push_str(&format!("</{}>", ROOT_TAG));
		html
	}
}

/// Returns true if `name` can be emitted as an HTML attribute name.
///
/// Rejects empty names, whitespace, control characters and the characters
/// that would end the name or the tag (`"`, `'`, `<`, `>`, `/`, `=`).
pub fn is_valid_attribute_name(name: &str) -> bool {
	!name.is_empty()
		&& name.chars().all(|c| {
			!c.is_whitespace()
				&& !c.is_control()
				&& !matches!(c, '"' | '\'' | '<' | '>' | '/' | '=')
		})
}

/// Escapes a string for use in an HTML attribute value.
fn html_escape_attr(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('"', "&quot;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn attributes() -> RootAttributes {
		let mut attributes = RootAttributes::new();
		attributes.insert("id".to_string(), json!("cart"));
		attributes.insert("hidden".to_string(), json!(false));
		attributes.insert("inert".to_string(), json!(true));
		attributes.insert("tabindex".to_string(), json!(0));
		attributes
	}

	#[rstest]
	fn test_placeholder_has_no_content() {
		let attributes = attributes();
		let markup = RootMarkup::for_state(
			RenderState::Placeholder,
			&attributes,
			Some(r#"{"on":"click"}"#.to_string()),
			"<button>Buy</button>",
		);

		assert_eq!(
			markup.to_html(),
			"<div style=\"display: contents\" data-lh-state=\"placeholder\" \
			 data-lh-static=\"true\" data-lh-props=\"{&quot;on&quot;:&quot;click&quot;}\" \
			 id=\"cart\" inert tabindex=\"0\"></div>"
		);
		assert_eq!(markup.inner_html(), "");
	}

	#[rstest]
	fn test_activated_renders_children() {
		let attributes = attributes();
		let markup = RootMarkup::for_state(
			RenderState::Activated,
			&attributes,
			None,
			"<button>Buy</button>",
		);

		assert_eq!(
			markup.to_html(),
			"<div style=\"display: contents\" data-lh-state=\"activated\" \
			 id=\"cart\" inert tabindex=\"0\"><button>Buy</button></div>"
		);
	}

	#[rstest]
	fn test_caller_style_overrides_default() {
		let mut attributes = RootAttributes::new();
		attributes.insert("style".to_string(), json!("display: block"));
		let markup = RootMarkup::for_state(RenderState::Activated, &attributes, None, "");

		let attrs = markup.attrs();
		let styles: Vec<_> = attrs.iter().filter(|(name, _)| name == "style").collect();
		assert_eq!(styles.len(), 1);
		assert_eq!(styles[0].1.as_deref(), Some("display: block"));
	}

	#[rstest]
	#[case::tag_breakout("x><script>alert(1)</script><div y")]
	#[case::space("on click")]
	#[case::equals("a=b")]
	#[case::quote("a\"b")]
	#[case::slash("a/b")]
	#[case::control("a\u{0}b")]
	#[case::empty("")]
	fn test_invalid_attribute_names_are_skipped(#[case] name: &str) {
		let mut attributes = RootAttributes::new();
		attributes.insert(name.to_string(), json!("z"));
		attributes.insert("id".to_string(), json!("cart"));
		let markup = RootMarkup::for_state(RenderState::Placeholder, &attributes, None, "");

		assert!(!is_valid_attribute_name(name));
		assert_eq!(
			markup.to_html(),
			"<div style=\"display: contents\" data-lh-state=\"placeholder\" \
			 data-lh-static=\"true\" id=\"cart\"></div>"
		);
	}

	#[rstest]
	#[case("id")]
	#[case("data-user-id")]
	#[case("aria-label")]
	#[case("@click")]
	#[case("xml:lang")]
	fn test_valid_attribute_names(#[case] name: &str) {
		assert!(is_valid_attribute_name(name));
	}

	#[rstest]
	#[case("a&b", "a&amp;b")]
	#[case("\"quoted\"", "&quot;quoted&quot;")]
	#[case("<tag>", "&lt;tag&gt;")]
	fn test_html_escape_attr(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(html_escape_attr(input), expected);
	}
}
