//! Integration tests for deferred activation
//!
//! These tests drive full mounts against the in-memory host:
//! 1. `ssrOnly` never activates, yet still runs the module factory
//! 2. Empty roots and non-DOM contexts skip deferral
//! 3. Idle, timer and event triggers race and release each other
//! 4. Activation waits for the remote module, in either order
//! 5. Unmount and re-arming leave no timer or listener behind

use lazy_hydrate_core::testing::{MockHost, MockRegistry, MockRoot, ScheduleRecord};
use lazy_hydrate_core::{
	ArmedTrigger, HydrationConfig, LazyHydrateProps, LazyHydration, ModuleStatus, MountContext,
	RenderState,
};
use rstest::{fixture, rstest};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

struct Page {
	host: Rc<MockHost>,
	root: Rc<MockRoot>,
	registry: Rc<MockRegistry>,
}

impl Page {
	fn new(host: MockHost, root: MockRoot) -> Self {
		Self {
			host: Rc::new(host),
			root: Rc::new(root),
			registry: Rc::new(MockRegistry::new()),
		}
	}

	fn mount(&self, config: HydrationConfig) -> LazyHydration {
		LazyHydration::mount(
			LazyHydrateProps::new(config),
			MountContext::new(
				self.host.clone(),
				self.root.clone(),
				self.registry.clone(),
			),
		)
	}

	fn is_quiet(&self) -> bool {
		self.host.pending_idle_callbacks() == 0
			&& self.host.pending_timers() == 0
			&& self.root.listener_count() == 0
	}
}

#[fixture]
fn page() -> Page {
	let page = Page::new(MockHost::browser(), MockRoot::with_children());
	page.registry.register("appA", "Widget");
	page
}

#[fixture]
fn page_without_idle() -> Page {
	let page = Page::new(MockHost::without_idle_callback(), MockRoot::with_children());
	page.registry.register("appA", "Widget");
	page
}

#[rstest]
#[case::events(HydrationConfig::new().on(["click", "focus"]))]
#[case::idle(HydrationConfig::new().when_idle(true))]
#[case::everything(HydrationConfig::new().when_idle(true).when_visible(true).on("click"))]
fn test_ssr_only_never_activates(#[case] config: HydrationConfig) {
	let page = Page::new(MockHost::browser(), MockRoot::with_children());
	let module = page.registry.register("appA", "Widget");

	let mount = page.mount(config.ssr_only(true).remote_import("appA/Widget"));
	page.host.run_until_stalled();
	page.root.dispatch("click");
	page.root.dispatch("focus");
	page.host.run_idle();
	page.host.advance(Duration::from_secs(10));

	assert_eq!(mount.state(), RenderState::Placeholder);
	assert_eq!(module.invocations(), 1);
	assert_eq!(mount.module_status(), ModuleStatus::Ready);
	assert!(mount.armed_triggers().is_empty());
	assert!(page.is_quiet());
}

#[rstest]
#[case::no_trigger(HydrationConfig::new())]
#[case::ssr_only(HydrationConfig::new().ssr_only(true))]
#[case::events(HydrationConfig::new().on("click"))]
#[case::idle(HydrationConfig::new().when_idle(true).remote_import("appA/Widget"))]
fn test_empty_root_activates_immediately(#[case] config: HydrationConfig) {
	let page = Page::new(MockHost::browser(), MockRoot::empty());
	page.registry.register("appA", "Widget");

	let mount = page.mount(config);

	assert!(mount.is_activated());
	assert!(page.is_quiet());
}

#[rstest]
fn test_server_context_renders_children_without_effects() {
	let server = Page::new(MockHost::server(), MockRoot::with_children());

	let mount = server.mount(
		HydrationConfig::new()
			.when_idle(true)
			.on("click")
			.remote_import("appA/Widget"),
	);
	server.host.run_until_stalled();

	assert!(mount.is_activated());
	assert!(server.registry.requests().is_empty());
	assert!(server.host.schedule_log().is_empty());
	assert!(server.is_quiet());
}

#[rstest]
fn test_idle_fallback_activates_after_two_seconds(page_without_idle: Page) {
	let page = page_without_idle;
	let mount = page.mount(HydrationConfig::new().when_idle(true).remote_import("appA/Widget"));
	page.host.run_until_stalled();

	assert_eq!(
		page.host.schedule_log(),
		vec![ScheduleRecord::Timeout {
			delay: Duration::from_millis(2000)
		}]
	);

	page.host.advance(Duration::from_millis(1999));
	assert_eq!(mount.state(), RenderState::Placeholder);

	page.host.advance(Duration::from_millis(1));
	assert!(mount.is_activated());
	assert!(page.is_quiet());
}

#[rstest]
fn test_idle_callback_activates_when_host_is_idle(page: Page) {
	let mount = page.mount(HydrationConfig::new().when_idle(true).remote_import("appA/Widget"));
	page.host.run_until_stalled();

	assert_eq!(page.host.pending_timers(), 0);
	assert_eq!(page.host.pending_idle_callbacks(), 1);

	page.host.run_idle();
	assert!(mount.is_activated());
}

#[rstest]
fn test_click_activates_exactly_once(page: Page) {
	let mount = page.mount(HydrationConfig::new().on(["click"]).remote_import("appA/Widget"));
	page.host.run_until_stalled();
	let activations = Rc::new(Cell::new(0));
	let counter = activations.clone();
	mount.on_activated(move || counter.set(counter.get() + 1));

	assert_eq!(page.root.dispatch("click"), 1);
	assert!(mount.is_activated());

	assert_eq!(page.root.dispatch("click"), 0);
	assert_eq!(activations.get(), 1);
	assert!(page.is_quiet());
}

#[rstest]
fn test_event_beats_idle_and_cancels_it(page_without_idle: Page) {
	let page = page_without_idle;
	let mount = page.mount(
		HydrationConfig::new()
			.when_idle(true)
			.on("click")
			.remote_import("appA/Widget"),
	);
	page.host.run_until_stalled();
	assert_eq!(page.host.pending_timers(), 1);

	page.root.dispatch("click");

	assert!(mount.is_activated());
	assert!(page.is_quiet());
	assert!(mount.armed_triggers().is_empty());
}

#[rstest]
fn test_idle_beats_event_and_removes_listeners(page: Page) {
	let mount = page.mount(
		HydrationConfig::new()
			.when_idle(true)
			.on(["click", "keydown"])
			.remote_import("appA/Widget"),
	);
	page.host.run_until_stalled();

	page.host.advance(Duration::from_millis(500));

	assert!(mount.is_activated());
	assert!(page.is_quiet());
	assert_eq!(
		page.root.removals(),
		vec![("keydown".to_string(), true), ("click".to_string(), true)]
	);
}

#[rstest]
fn test_remote_import_requested_once_per_mount(page: Page) {
	let mount = page.mount(HydrationConfig::new().on("click").remote_import("appA/Widget"));
	page.host.run_until_stalled();
	mount.reconfigure(HydrationConfig::new().on("focus").remote_import("appA/Widget"));
	page.host.run_until_stalled();

	assert_eq!(
		page.registry.requests(),
		vec![("appA".to_string(), "Widget".to_string())]
	);
}

#[rstest]
fn test_trigger_before_module_waits_for_module() {
	let page = Page::new(MockHost::browser(), MockRoot::with_children());
	let pending = page.registry.defer("appA", "Widget");
	let module = pending.module();

	let mount = page.mount(HydrationConfig::new().on("click").remote_import("appA/Widget"));
	page.host.run_until_stalled();

	page.root.dispatch("click");
	assert!(mount.activation_requested());
	assert_eq!(mount.state(), RenderState::Placeholder);
	assert!(page.is_quiet());

	pending.resolve();
	page.host.run_until_stalled();

	assert_eq!(module.invocations(), 1);
	assert!(mount.is_activated());
}

#[rstest]
fn test_module_before_trigger_waits_for_trigger(page: Page) {
	let mount = page.mount(HydrationConfig::new().on("click").remote_import("appA/Widget"));
	page.host.run_until_stalled();

	assert_eq!(mount.module_status(), ModuleStatus::Ready);
	assert_eq!(mount.state(), RenderState::Placeholder);

	page.root.dispatch("click");
	assert!(mount.is_activated());
}

#[rstest]
fn test_unresolved_module_keeps_placeholder() {
	let page = Page::new(MockHost::browser(), MockRoot::with_children());
	let _never = page.registry.defer("appA", "Widget");

	let mount = page.mount(HydrationConfig::new().on("click").remote_import("appA/Widget"));
	page.host.run_until_stalled();
	page.root.dispatch("click");
	page.host.run_until_stalled();

	assert_eq!(mount.module_status(), ModuleStatus::Pending);
	assert_eq!(mount.state(), RenderState::Placeholder);
}

#[rstest]
#[case::unknown_scope("missing/Widget")]
#[case::rejected("appA/Broken")]
fn test_failed_module_keeps_placeholder(page: Page, #[case] remote_import: &str) {
	page.registry.reject("appA", "Broken", "500 Internal Server Error");

	let mount = page.mount(HydrationConfig::new().on("click").remote_import(remote_import));
	page.host.run_until_stalled();
	page.root.dispatch("click");

	assert_eq!(mount.module_status(), ModuleStatus::Failed);
	assert_eq!(mount.state(), RenderState::Placeholder);
}

#[rstest]
fn test_no_trigger_stays_placeholder(page: Page) {
	let mount = page.mount(HydrationConfig::new().remote_import("appA/Widget"));
	page.host.run_until_stalled();
	page.host.run_idle();
	page.host.advance(Duration::from_secs(60));

	assert_eq!(mount.module_status(), ModuleStatus::Ready);
	assert_eq!(mount.state(), RenderState::Placeholder);
}

#[rstest]
fn test_when_visible_alone_arms_nothing(page: Page) {
	let mount = page.mount(HydrationConfig::new().when_visible(true));

	assert!(mount.armed_triggers().is_empty());
	assert!(page.is_quiet());
	assert_eq!(mount.state(), RenderState::Placeholder);
}

#[rstest]
fn test_unmount_releases_everything(page: Page) {
	let mount = page.mount(
		HydrationConfig::new()
			.when_idle(true)
			.on(["click", "focus"])
			.remote_import("appA/Widget"),
	);
	assert!(!page.is_quiet());

	mount.unmount();

	assert!(page.is_quiet());
	page.host.run_until_stalled();
	assert_eq!(page.registry.requests().len(), 1);
}

#[rstest]
fn test_module_resolving_after_unmount_still_runs_factory() {
	let page = Page::new(MockHost::browser(), MockRoot::with_children());
	let pending = page.registry.defer("appA", "Widget");
	let module = pending.module();

	let mount = page.mount(HydrationConfig::new().on("click").remote_import("appA/Widget"));
	page.host.run_until_stalled();
	drop(mount);

	pending.resolve();
	page.host.run_until_stalled();

	assert_eq!(module.invocations(), 1);
}

#[rstest]
fn test_reconfigure_rearms_without_duplicates(page: Page) {
	let mount = page.mount(HydrationConfig::new().on("click").remote_import("appA/Widget"));
	assert_eq!(page.root.listener_options("click").len(), 1);

	mount.reconfigure(HydrationConfig::new().on(["click", "focus"]).remote_import("appA/Widget"));

	assert_eq!(page.root.listener_options("click").len(), 1);
	assert_eq!(page.root.listener_options("focus").len(), 1);
	assert_eq!(page.root.listener_count(), 2);
	let events: Vec<String> = mount
		.armed_triggers()
		.into_iter()
		.filter_map(|trigger| match trigger {
			ArmedTrigger::Event(registration) => Some(registration.event_type),
			_ => None,
		})
		.collect();
	assert_eq!(events, vec!["click", "focus"]);
}

#[rstest]
fn test_reconfigure_to_ssr_only_disarms(page: Page) {
	let mount = page.mount(HydrationConfig::new().when_idle(true).on("click"));
	assert!(!page.is_quiet());

	mount.reconfigure(HydrationConfig::new().ssr_only(true));

	assert!(page.is_quiet());
	page.root.dispatch("click");
	assert_eq!(mount.state(), RenderState::Placeholder);
}

#[rstest]
fn test_ssr_only_toggle_rearms_after_pending_request() {
	let page = Page::new(MockHost::browser(), MockRoot::with_children());
	let pending = page.registry.defer("appA", "Widget");
	let config = HydrationConfig::new().on("click").remote_import("appA/Widget");

	let mount = page.mount(config.clone());
	page.host.run_until_stalled();
	page.root.dispatch("click");
	assert!(mount.activation_requested());

	mount.reconfigure(config.clone().ssr_only(true));
	assert!(!mount.activation_requested());

	pending.resolve();
	page.host.run_until_stalled();
	assert_eq!(mount.module_status(), ModuleStatus::Ready);
	assert_eq!(mount.state(), RenderState::Placeholder);

	mount.reconfigure(config);
	assert_eq!(page.root.listener_options("click").len(), 1);

	page.root.dispatch("click");
	assert!(mount.is_activated());
	assert!(page.is_quiet());
}

#[rstest]
fn test_placeholder_never_emits_unsafe_passthrough(page: Page) {
	let props = LazyHydrateProps::from_json(
		r#"{"on": "click", "x><script>alert(1)</script><div y": "z", "children": "<b>c</b>", "id": "cart"}"#,
	)
	.unwrap();
	let mount = LazyHydration::mount(
		props,
		MountContext::new(page.host.clone(), page.root.clone(), page.registry.clone()),
	);

	let html = mount.render("").to_html();

	assert!(!html.contains("<script>"));
	assert!(!html.contains("children"));
	assert!(html.contains("id=\"cart\""));
	assert!(html.ends_with("></div>"));
}

#[rstest]
fn test_props_roundtrip_through_placeholder(page: Page) {
	let props = LazyHydrateProps::from_json(
		r#"{"on": "click", "remoteImport": "appA/Widget", "id": "cart", "class": "panel"}"#,
	)
	.unwrap();
	let mount = LazyHydration::mount(
		props,
		MountContext::new(page.host.clone(), page.root.clone(), page.registry.clone()),
	);

	let html = mount.render("<button>Buy</button>").to_html();
	assert!(html.contains("data-lh-state=\"placeholder\""));
	assert!(html.contains("class=\"panel\""));
	assert!(html.contains("id=\"cart\""));
	assert!(!html.contains("<button>"));

	page.host.run_until_stalled();
	page.root.dispatch("click");

	let html = mount.render("<button>Buy</button>").to_html();
	assert!(html.contains("data-lh-state=\"activated\""));
	assert!(html.contains("<button>Buy</button>"));
	assert!(!html.contains("data-lh-static"));
}
