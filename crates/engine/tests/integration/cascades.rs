use appforge::{ForgeError, RuleSet};
use pretty_assertions::assert_eq;

use crate::common::{app, forge, visible};

#[test]
fn writing_the_current_value_runs_no_rules() {
	let forge = forge([app("hud").visible(true), app("menu")]);

	forge.open("hud").unwrap();
	forge.close("menu").unwrap();
	assert_eq!(forge.stats().evaluations, 0);

	forge.close("hud").unwrap();
	assert_eq!(forge.stats().evaluations, 1);
	forge.close("hud").unwrap();
	assert_eq!(forge.stats().evaluations, 1);
}

#[test]
fn closing_a_parent_closes_its_children() {
	let forge = forge([
		app("inventory").visible(true),
		app("tooltip").visible(true).rules(RuleSet::new().parent("inventory")),
		app("tooltip_icon").visible(true).rules(RuleSet::new().parent("tooltip")),
	]);

	forge.close("inventory").unwrap();
	assert!(!visible(&forge, "tooltip"));
	assert!(!visible(&forge, "tooltip_icon"), "cascade continues through the child's own rules");
	assert_eq!(forge.stats().evaluations, 3);

	forge.open("inventory").unwrap();
	assert!(!visible(&forge, "tooltip"), "parents never force children open");
	assert_eq!(forge.visible_apps(), vec!["inventory"]);
}

#[test]
fn detached_children_still_follow_their_parent() {
	let forge = forge([
		app("hud").visible(true),
		app("pinned").visible(true).rules(RuleSet::new().detached_parent("hud")),
	]);

	forge.close("hud").unwrap();
	assert!(!visible(&forge, "pinned"));
}

#[test]
fn opening_an_exclusive_member_closes_the_others() {
	let modal = || RuleSet::new().exclusive("modal");
	let forge = forge([app("shop").rules(modal()), app("map").rules(modal()), app("hud").visible(true)]);

	forge.open("map").unwrap();
	forge.open("shop").unwrap();
	assert!(visible(&forge, "shop"));
	assert!(!visible(&forge, "map"));
	assert!(visible(&forge, "hud"), "apps outside the group are untouched");

	let before = forge.stats();
	forge.open("shop").unwrap();
	assert_eq!(forge.stats(), before, "second open is a no-op");

	forge.close("shop").unwrap();
	forge.open("shop").unwrap();
	assert!(!visible(&forge, "map"), "closed members stay closed");
}

#[test]
fn cyclic_parents_terminate() {
	let forge = forge([
		app("a").visible(true).rules(RuleSet::new().parent("b")),
		app("b").visible(true).rules(RuleSet::new().parent("a")),
	]);

	forge.close("a").unwrap();
	assert!(!visible(&forge, "a"));
	assert!(!visible(&forge, "b"));
	assert!(!forge.is_evaluating("a"));
	assert!(!forge.is_evaluating("b"));
}

#[test]
fn reentrant_evaluation_is_skipped() {
	// Opening `a` closes `b` through the group, and closing `b` then closes
	// its child `a` while `a` is still being evaluated.
	let forge = forge([
		app("a").rules(RuleSet::new().parent("b").exclusive("g")),
		app("b").visible(true).rules(RuleSet::new().exclusive("g")),
	]);

	forge.open("a").unwrap();

	assert!(!visible(&forge, "a"));
	assert!(!visible(&forge, "b"));
	let stats = forge.stats();
	assert_eq!(stats.evaluations, 2);
	assert_eq!(stats.skipped_reentrant, 1);
	assert!(!forge.is_evaluating("a"));
}

#[test]
fn run_rules_false_skips_the_cascade() {
	let forge = forge([
		app("inventory").visible(true),
		app("tooltip").visible(true).rules(RuleSet::new().parent("inventory")),
	]);

	forge.close_with("inventory", false).unwrap();
	assert!(visible(&forge, "tooltip"));
	assert_eq!(forge.stats().evaluations, 0);

	forge.set_with("inventory", true, false).unwrap();
	forge.set_with("inventory", false, false).unwrap();
	assert!(visible(&forge, "tooltip"));
	assert_eq!(forge.stats().evaluations, 0);

	forge.toggle("inventory").unwrap();
	forge.toggle("inventory").unwrap();
	assert!(!visible(&forge, "tooltip"));
}

#[test]
fn unknown_apps_are_rejected() {
	let forge = forge([app("hud")]);

	assert!(matches!(forge.open("ghost"), Err(ForgeError::UnknownApp(name)) if &*name == "ghost"));
	assert!(matches!(forge.get("ghost"), Err(ForgeError::UnknownApp(_))));
	assert!(matches!(forge.toggle("ghost"), Err(ForgeError::UnknownApp(_))));
	assert_eq!(forge.visible_apps(), Vec::<&str>::new());
	assert_eq!(forge.stats().evaluations, 0);
}
