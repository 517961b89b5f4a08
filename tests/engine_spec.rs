use feature_configurator::engine::{enforce_group_constraints, Violation};
use feature_configurator::models::*;
use feature_configurator::{ConfigurationSession, Error, StructuralError, ToggleRejection};
use speculate2::speculate;

/// R (and, mandatory): A (mandatory), B (alt): X, Y
fn small_model() -> FeatureTree {
    FeatureTree::build(
        &FeatureNode::and(
            "R",
            vec![
                FeatureNode::leaf("A").mandatory(),
                FeatureNode::alt("B", vec![FeatureNode::leaf("X"), FeatureNode::leaf("Y")]),
            ],
        )
        .mandatory(),
    )
    .expect("Failed to build tree")
}

fn chat_model() -> FeatureTree {
    FeatureTree::build(
        &FeatureNode::and(
            "Chat",
            vec![
                FeatureNode::leaf("Core").mandatory(),
                FeatureNode::alt(
                    "Ui",
                    vec![
                        FeatureNode::leaf("Cli"),
                        FeatureNode::and(
                            "Gui",
                            vec![FeatureNode::leaf("Theme"), FeatureNode::leaf("Fonts").mandatory()],
                        ),
                    ],
                ),
                FeatureNode::or("Extras", vec![FeatureNode::leaf("Logging"), FeatureNode::leaf("Sound")]),
                FeatureNode::alt("Crypto", vec![FeatureNode::leaf("Caesar"), FeatureNode::leaf("Rot")]),
            ],
        )
        .mandatory(),
    )
    .expect("Failed to build tree")
}

fn count(session: &ConfigurationSession) -> u128 {
    session.current_state().expect("Count failed").count
}

speculate! {
    describe "end_to_end" {
        before {
            let mut session = ConfigurationSession::fresh(small_model());
        }

        it "pre-selects mandatory features in a fresh configuration" {
            let store = session.selection();
            assert!(store.get("R").automatic);
            assert!(store.get("A").automatic);
            assert!(!store.is_selected("B"));

            let state = session.current_state().expect("Count failed");
            assert!(state.validation.valid);
            // B absent, B with X, B with Y.
            assert_eq!(state.count, 3);
        }

        it "excludes the other alternative when one is chosen" {
            session.toggle("X", true).expect("Toggle failed");

            let store = session.selection();
            assert!(store.get("X").manual);
            assert!(store.get("B").automatic);
            assert!(store.is_excluded("Y"));
            assert_eq!(count(&session), 1);
        }

        it "restores the alternatives when the choice is withdrawn" {
            session.toggle("X", true).expect("Toggle failed");
            session.toggle("X", false).expect("Toggle failed");

            let store = session.selection();
            assert!(!store.is_excluded("Y"));
            assert!(!store.is_selected("B"));
            assert!(store.is_selected("R"));
            assert_eq!(count(&session), 3);
        }
    }

    describe "toggle" {
        before {
            let mut session = ConfigurationSession::fresh(chat_model());
        }

        it "fails on unknown features without touching the selection" {
            let before = session.selection().clone();
            let err = session.toggle("Nope", true).unwrap_err();

            assert!(matches!(err, Error::Structural(StructuralError::UnknownFeature(ref f)) if f == "Nope"));
            assert_eq!(session.selection(), &before);
        }

        it "refuses toggling an excluded feature" {
            session.toggle("Cli", true).expect("Toggle failed");
            let before = session.selection().clone();

            let err = session.toggle("Theme", true).unwrap_err();
            assert!(matches!(err, Error::Rejected(ToggleRejection::Excluded(_))));
            assert_eq!(session.selection(), &before);
        }

        it "refuses deselecting a mandatory child of a selected AND group" {
            let before = session.selection().clone();

            let err = session.toggle("Core", false).unwrap_err();
            assert!(matches!(
                err,
                Error::Rejected(ToggleRejection::MandatoryAndChild { ref feature, ref parent })
                    if feature == "Core" && parent == "Chat"
            ));
            assert_eq!(session.selection(), &before);
        }

        it "forces mandatory children of a selected AND group" {
            session.toggle("Theme", true).expect("Toggle failed");

            let store = session.selection();
            assert!(store.is_selected("Gui"));
            assert!(store.is_selected("Fonts"));
            assert!(store.is_excluded("Cli"));
        }

        it "keeps a mandatory ancestor selected after its last child is withdrawn" {
            session.toggle("Logging", true).expect("Toggle failed");
            session.toggle("Logging", false).expect("Toggle failed");

            let store = session.selection();
            assert!(!store.is_selected("Extras"));
            assert!(store.is_selected("Chat"));
        }

        it "releases an optional OR group with its last child" {
            session.toggle("Logging", true).expect("Toggle failed");
            assert!(session.selection().is_selected("Extras"));

            session.toggle("Logging", false).expect("Toggle failed");
            assert!(!session.selection().is_selected("Extras"));
            assert!(session.validate().valid);
        }

        it "reports a manually selected OR group left without children" {
            session.toggle("Extras", true).expect("Toggle failed");
            session.toggle("Logging", true).expect("Toggle failed");
            session.toggle("Logging", false).expect("Toggle failed");

            let validation = session.validate();
            assert!(session.selection().is_selected("Extras"));
            assert_eq!(validation.violations, vec![Violation::Or { group: "Extras".to_string() }]);
            assert_eq!(count(&session), 0);
        }
    }

    describe "mandatory_or_group" {
        before {
            let tree = FeatureTree::build(
                &FeatureNode::and(
                    "Root",
                    vec![FeatureNode::or("Output", vec![FeatureNode::leaf("File"), FeatureNode::leaf("Stdout")]).mandatory()],
                )
                .mandatory(),
            )
            .expect("Failed to build tree");
            let mut session = ConfigurationSession::fresh(tree);
        }

        it "is invalid until a child is chosen" {
            let validation = session.validate();
            assert_eq!(validation.violations, vec![Violation::Or { group: "Output".to_string() }]);
            assert_eq!(count(&session), 0);
        }

        it "refuses deselecting the last selected child" {
            session.toggle("File", true).expect("Toggle failed");
            let before = session.selection().clone();

            let err = session.toggle("File", false).unwrap_err();
            assert!(matches!(err, Error::Rejected(ToggleRejection::LastOrChild { .. })));
            assert_eq!(session.selection(), &before);
        }

        it "allows deselecting a child while a sibling stays selected" {
            session.toggle("File", true).expect("Toggle failed");
            session.toggle("Stdout", true).expect("Toggle failed");
            session.toggle("File", false).expect("Toggle failed");

            assert!(!session.selection().is_selected("File"));
            assert!(session.validate().valid);
        }
    }

    describe "excluded_branches" {
        before {
            let tree = FeatureTree::build(&FeatureNode::and(
                "Editor",
                vec![FeatureNode::alt(
                    "Ui",
                    vec![
                        FeatureNode::leaf("Cli"),
                        FeatureNode::and(
                            "Gui",
                            vec![FeatureNode::alt("Skin", vec![FeatureNode::leaf("Dark"), FeatureNode::leaf("Light")])
                                .mandatory()],
                        ),
                    ],
                )],
            ))
            .expect("Failed to build tree");
            let mut session = ConfigurationSession::fresh(tree);
        }

        it "does not hold an unchosen alternative to its mandatory groups" {
            assert!(!session.validate().valid);

            session.toggle("Cli", true).expect("Toggle failed");

            assert!(session.selection().is_excluded("Skin"));
            assert!(session.validate().valid);
            assert_eq!(count(&session), 1);
        }
    }

    describe "invariants" {
        before {
            let mut session = ConfigurationSession::fresh(chat_model());
        }

        it "counts the fresh configuration" {
            // Core * Ui(1 + 1 + 2) * Extras(1 + 3) * Crypto(1 + 2)
            assert_eq!(count(&session), 48);
            session.toggle("Gui", true).expect("Toggle failed");
            assert_eq!(count(&session), 24);
        }

        it "enforcement is idempotent" {
            session.toggle("Theme", true).expect("Toggle failed");
            session.toggle("Rot", true).expect("Toggle failed");

            let mut store = session.selection().clone();
            enforce_group_constraints(session.tree(), &mut store);
            let once = store.clone();
            enforce_group_constraints(session.tree(), &mut store);
            assert_eq!(store, once);
            assert_eq!(&once, session.selection());
        }

        it "excludes every unchosen alternative subtree" {
            session.toggle("Cli", true).expect("Toggle failed");
            let tree = session.tree();
            let store = session.selection();

            let gui = tree.lookup("Gui").expect("Gui missing");
            for id in tree.subtree(gui) {
                assert!(store.is_excluded(tree.name(id)), "{} not excluded", tree.name(id));
            }
        }

        it "selected AND groups have all mandatory children selected" {
            for feature in ["Theme", "Logging", "Caesar"] {
                session.toggle(feature, true).expect("Toggle failed");
            }
            let tree = session.tree();
            let store = session.selection();

            for (_, meta) in tree.iter() {
                if meta.kind == FeatureKind::And && store.is_selected(&meta.name) {
                    for &child in &meta.children {
                        if tree.get(child).mandatory {
                            assert!(store.is_selected(tree.name(child)));
                        }
                    }
                }
            }
        }

        it "selecting a feature never increases the count" {
            let names: Vec<String> = session.tree().iter().map(|(_, m)| m.name.clone()).collect();
            let mut frontier = vec![session.clone()];

            // Two rounds of selections starting from every reachable valid state.
            for _ in 0..2 {
                let mut next = Vec::new();
                for state in &frontier {
                    let before = count(state);
                    if !state.validate().valid {
                        continue;
                    }
                    for name in &names {
                        if state.selection().is_selected(name) {
                            continue;
                        }
                        let mut candidate = state.clone();
                        if candidate.toggle(name, true).is_ok() {
                            let after = count(&candidate);
                            assert!(after <= before, "selecting {} raised {} to {}", name, before, after);
                            next.push(candidate);
                        }
                    }
                }
                frontier = next;
            }
        }
    }
}
