use appforge::RuleSet;
use proptest::prelude::*;
use proptest::sample::Index;

use crate::common::{Descriptor, Forge, app, forge, visible};

const APPS: usize = 6;
const TAGS: [Option<&str>; 3] = [None, Some("modal"), Some("hint")];

/// Per app: exclusive tag choice and an optional parent among earlier apps.
type Shape = Vec<(usize, bool, Index)>;

fn shape() -> impl Strategy<Value = Shape> {
	prop::collection::vec((0..TAGS.len(), any::<bool>(), any::<Index>()), APPS)
}

fn name(i: usize) -> String {
	format!("app{i}")
}

fn apps(shape: &Shape) -> Vec<Descriptor> {
	shape
		.iter()
		.enumerate()
		.map(|(i, (tag, has_parent, parent))| {
			let mut rules = RuleSet::new();
			if let Some(tag) = TAGS[*tag] {
				rules = rules.exclusive(tag);
			}
			if *has_parent && i > 0 {
				rules = rules.parent(name(parent.index(i)));
			}
			app(&name(i)).visible(i == 0).rules(rules)
		})
		.collect()
}

#[derive(Debug, Clone, Copy)]
enum Op {
	Open(usize),
	Close(usize),
	Toggle(usize),
}

fn op() -> impl Strategy<Value = Op> {
	prop_oneof![
		(0..APPS).prop_map(Op::Open),
		(0..APPS).prop_map(Op::Close),
		(0..APPS).prop_map(Op::Toggle),
	]
}

fn assert_exclusive(forge: &Forge) -> Result<(), TestCaseError> {
	for tag in TAGS.into_iter().flatten() {
		let open = forge
			.registry()
			.iter()
			.filter(|desc| desc.exclusive_tag() == Some(tag) && visible(forge, desc.name()))
			.count();
		prop_assert!(open <= 1, "{open} apps visible in exclusive group {tag}");
	}
	Ok(())
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(128))]

	#[test]
	fn cascades_keep_rule_invariants(shape in shape(), ops in prop::collection::vec(op(), 1..40)) {
		let forge = forge(apps(&shape));

		for op in ops {
			let before = forge.stats().evaluations;
			match op {
				Op::Open(i) => {
					let was_visible = visible(&forge, &name(i));
					forge.open(&name(i)).unwrap();
					if was_visible {
						prop_assert_eq!(forge.stats().evaluations, before);
					}
				}
				Op::Close(i) => {
					let was_visible = visible(&forge, &name(i));
					forge.close(&name(i)).unwrap();
					prop_assert!(!visible(&forge, &name(i)));
					// Children may be open under a hidden parent; only a real close cascades.
					for child in forge.registry().children_of(&name(i)).filter(|_| was_visible) {
						prop_assert!(!visible(&forge, child.name()), "{} left open under app{}", child.name(), i);
					}
				}
				Op::Toggle(i) => {
					forge.toggle(&name(i)).unwrap();
				}
			}

			assert_exclusive(&forge)?;
			for i in 0..APPS {
				prop_assert!(!forge.is_evaluating(&name(i)));
			}
		}
	}

	#[test]
	fn open_sticks_without_reentrancy(ops in prop::collection::vec(op(), 1..40)) {
		// Parents never share a group with their children here, so no cascade
		// reaches back into the app that started it.
		let forge = forge([
			app("hud").visible(true),
			app("inventory").rules(RuleSet::new().exclusive("modal")),
			app("shop").rules(RuleSet::new().exclusive("modal")),
			app("map").rules(RuleSet::new().parent("hud").exclusive("modal")),
			app("tooltip").rules(RuleSet::new().parent("inventory")),
			app("hint").rules(RuleSet::new().parent("tooltip").exclusive("hint")),
		]);
		let names = ["hud", "inventory", "shop", "map", "tooltip", "hint"];

		for op in ops {
			match op {
				Op::Open(i) => {
					forge.open(names[i]).unwrap();
					prop_assert!(visible(&forge, names[i]));
				}
				Op::Close(i) => {
					forge.close(names[i]).unwrap();
					prop_assert!(!visible(&forge, names[i]));
				}
				Op::Toggle(i) => {
					let was_visible = visible(&forge, names[i]);
					forge.toggle(names[i]).unwrap();
					prop_assert_eq!(visible(&forge, names[i]), !was_visible);
				}
			}
			assert_exclusive(&forge)?;
			prop_assert_eq!(forge.stats().skipped_reentrant, 0);
		}
	}
}
