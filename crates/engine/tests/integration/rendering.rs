use std::rc::Rc;

use appforge::{ConfigurationError, ForgeConfig, ForgeError, RenderRequest, RuleSet, Selection};
use pretty_assertions::assert_eq;

use crate::common::{app, forge, forge_with, label, labels};

#[test]
fn materializing_twice_returns_the_same_record() {
	let forge = forge([app("hud")]);

	let first = forge.materialize("hud", &0).unwrap();
	let second = forge.materialize("hud", &1).unwrap();
	assert!(Rc::ptr_eq(&first, &second));
	assert_eq!(label(&forge, second.content), "hud:root#0", "cache hits never rebuild");

	let stats = forge.stats();
	assert_eq!(stats.materializations, 1);
	assert_eq!(stats.cache_hits, 1);
	assert!(Rc::ptr_eq(&forge.record("hud").unwrap().unwrap(), &first));
}

#[test]
fn anchoring_nests_content_in_a_stripped_parent_shell() {
	let forge = forge([app("inventory"), app("tooltip").rules(RuleSet::new().parent("inventory"))]);

	let record = forge.materialize("tooltip", &0).unwrap();
	let anchor = record.anchor().expect("tooltip should be anchored");
	assert_eq!(&*anchor.parent, "inventory");

	let backend = forge.backend();
	let tree = &backend.tree;
	assert_eq!(tree.children(record.container), &[anchor.shell]);
	assert_eq!(tree.children(anchor.shell), &[record.content]);
	assert_eq!(
		tree.outline(record.container),
		"tooltip\n  inventory:root#0\n    tooltip:root#0\n      tooltip:body\n"
	);
}

#[test]
fn re_anchoring_replaces_the_shell() {
	let forge = forge([app("inventory"), app("tooltip").rules(RuleSet::new().parent("inventory"))]);

	let record = forge.materialize("tooltip", &1).unwrap();
	let old_shell = record.anchor().unwrap().shell;
	let nodes = forge.backend().tree.len();

	let again = forge.anchor("tooltip", &2).unwrap();
	assert!(Rc::ptr_eq(&record, &again));
	let new_shell = record.anchor().unwrap().shell;
	assert_ne!(old_shell, new_shell);

	let backend = forge.backend();
	let tree = &backend.tree;
	assert_eq!(tree.children(record.container), &[new_shell], "exactly one shell");
	assert!(!tree.contains(old_shell), "the replaced shell is destroyed");
	assert_eq!(tree.len(), nodes);
	assert_eq!(
		tree.outline(record.container),
		"tooltip\n  inventory:root#2\n    tooltip:root#1\n      tooltip:body\n"
	);
}

#[test]
fn repeated_re_anchoring_keeps_the_node_count() {
	let forge = forge([app("inventory"), app("tooltip").rules(RuleSet::new().parent("inventory"))]);

	forge.materialize("tooltip", &0).unwrap();
	let nodes = forge.backend().tree.len();
	for rev in 1..=10 {
		forge.anchor("tooltip", &rev).unwrap();
		assert_eq!(forge.backend().tree.len(), nodes);
	}
}

#[test]
fn detached_children_are_not_anchored() {
	let forge = forge([app("hud"), app("pinned").rules(RuleSet::new().detached_parent("hud"))]);

	let record = forge.materialize("pinned", &0).unwrap();
	assert!(!record.is_anchored());
	assert_eq!(forge.backend().tree.children(record.container), &[record.content]);
}

#[test]
fn invalid_parents_fail_at_materialization() {
	let forge = forge([
		app("loop").rules(RuleSet::new().parent("loop")),
		app("orphan").rules(RuleSet::new().detached_parent("nowhere")),
		app("hud"),
	]);

	let err = forge.materialize("loop", &0).unwrap_err();
	assert!(matches!(err, ForgeError::Configuration(ConfigurationError::SelfParent(ref app)) if &**app == "loop"));

	let err = forge.materialize("orphan", &0).unwrap_err();
	assert!(matches!(
		err,
		ForgeError::Configuration(ConfigurationError::MissingParent { ref parent, .. }) if &**parent == "nowhere"
	));
	assert!(forge.backend().tree.is_empty(), "nothing is constructed for an invalid app");

	forge.materialize("hud", &0).unwrap();
	assert!(forge.record("loop").unwrap().is_none());
	assert!(forge.record("hud").unwrap().is_some());
}

#[test]
fn set_layer_before_materialization_is_ignored() {
	let forge = forge([app("hud")]);

	forge.set_layer("hud", 4).unwrap();
	assert!(forge.backend().tree.is_empty());

	let record = forge.materialize("hud", &0).unwrap();
	forge.set_layer("hud", 4).unwrap();
	assert_eq!(forge.backend().tree.layer(record.container), Some(4));
	assert!(matches!(forge.set_layer("ghost", 1), Err(ForgeError::UnknownApp(_))));
}

fn game_ui() -> crate::common::Forge {
	forge([
		app("hud").group("overlay"),
		app("inventory").group("menus"),
		app("tooltip").rules(RuleSet::new().parent("inventory")),
		app("pinned").rules(RuleSet::new().detached_parent("hud")),
		app("console").group("overlay").rules(RuleSet::new().z_index(5)),
	])
}

#[test]
fn render_all_returns_each_top_level_app_once() {
	let forge = game_ui();

	let roots = forge.render(&Selection::All, &0).unwrap();
	assert_eq!(labels(&forge, &roots), vec!["hud", "inventory", "pinned", "console"]);

	let tooltip = forge.record("tooltip").unwrap().unwrap();
	let inventory = forge.record("inventory").unwrap().unwrap();
	let console = forge.record("console").unwrap().unwrap();
	{
		let backend = forge.backend();
		assert_eq!(backend.tree.parent(tooltip.container), Some(inventory.container));
		assert_eq!(backend.tree.layer(console.container), Some(5));
	}

	let again = forge.render(&Selection::All, &0).unwrap();
	assert_eq!(again, roots);
	assert_eq!(forge.stats().materializations, 5);
}

#[test]
fn rendering_a_parent_brings_its_children() {
	let forge = game_ui();

	let roots = forge.render(&Selection::app("inventory"), &0).unwrap();
	assert_eq!(labels(&forge, &roots), vec!["inventory"]);
	assert!(forge.record("tooltip").unwrap().is_some());
}

#[test]
fn a_child_rendered_without_its_parent_is_a_root() {
	let forge = game_ui();

	let roots = forge.render(&Selection::app("tooltip"), &0).unwrap();
	assert_eq!(labels(&forge, &roots), vec!["tooltip"]);
	assert!(forge.record("tooltip").unwrap().unwrap().is_anchored());
}

#[test]
fn a_child_rendered_alone_after_its_parent_is_unmounted_from_it() {
	let forge = game_ui();
	forge.render(&Selection::All, &0).unwrap();
	let inventory = forge.record("inventory").unwrap().unwrap();
	let tooltip = forge.record("tooltip").unwrap().unwrap();
	assert_eq!(forge.backend().tree.parent(tooltip.container), Some(inventory.container));

	let roots = forge.render(&Selection::app("tooltip"), &0).unwrap();
	assert_eq!(roots, vec![tooltip.container]);
	let backend = forge.backend();
	assert_eq!(backend.tree.parent(tooltip.container), None);
	assert!(!backend.tree.children(inventory.container).contains(&tooltip.container));
}

#[test]
fn render_errors() {
	let forge = game_ui();

	let missing = RenderRequest {
		name: Some("missing".into()),
		..RenderRequest::default()
	};
	assert!(matches!(forge.render_request(&missing, &0), Err(ForgeError::UnknownApp(_))));
	assert!(matches!(
		forge.render(&Selection::group("emptyGroup"), &0),
		Err(ForgeError::EmptySelection(_))
	));
	assert_eq!(forge.stats().materializations, 0);
}

#[test]
fn mount_uses_the_configured_selection() {
	let config = ForgeConfig::from_toml_str("[render]\ngroup = \"menus\"\n").unwrap();
	let forge = forge_with(
		[
			app("hud").group("overlay"),
			app("inventory").group("menus"),
			app("tooltip").rules(RuleSet::new().parent("inventory")),
		],
		config,
	);

	let root = forge.backend_mut().tree.create("root");
	let roots = forge.mount(&root, None, &0).unwrap();
	assert_eq!(labels(&forge, &roots), vec!["inventory"]);
	assert_eq!(
		forge.backend().tree.outline(root),
		"root\n  inventory\n    inventory:root#0\n      inventory:body\n    tooltip\n      inventory:root#0\n        tooltip:root#0\n          tooltip:body\n"
	);
	assert!(forge.record("hud").unwrap().is_none());
}

#[test]
fn resize_recomputes_the_scale() {
	let forge = forge([app("hud")]);

	let scale = forge.resize(3840.0, 2160.0);
	assert!((scale.factor() - 2.0).abs() < 1e-5);
	assert_eq!(scale.px(10.0), 20);

	let unchanged = forge.resize(0.0, 2160.0);
	assert_eq!(unchanged, scale);
	assert_eq!(forge.scale(), scale);
}
