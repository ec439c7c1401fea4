#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::tree::{PluginEntry, PluginTree};

fn accessors(ids: &[&str]) -> Vec<PluginAccessor> {
    let catalogue: Vec<PluginEntry> = ids
        .iter()
        .map(|id| PluginEntry::new(*id, format!("Impl{}", id.len())))
        .collect();
    let trees = PluginTree::of(&catalogue).unwrap();
    plugin_accessors_for(&trees, TypeSpec::plugin_dependencies_spec()).collect()
}

fn shape(accessors: &[PluginAccessor]) -> Vec<String> {
    accessors
        .iter()
        .map(|accessor| {
            let extension = accessor.extension();
            let kind = match accessor {
                PluginAccessor::ForPlugin { .. } => "plugin",
                PluginAccessor::ForGroup { .. } => "group",
            };
            format!(
                "{kind} {} {}.{}: {}",
                accessor.id(),
                extension.receiver_type.source_name,
                extension.name,
                extension.return_type.source_name
            )
        })
        .collect()
}

#[test]
fn depth_first_pre_order() {
    assert_eq!(
        shape(&accessors(&["a.b.c", "a.b.d", "a.e"])),
        vec![
            "group a PluginDependenciesSpec.a: APluginGroup",
            "group a.b APluginGroup.b: ABPluginGroup",
            "plugin a.b.c ABPluginGroup.c: PluginDependencySpec",
            "plugin a.b.d ABPluginGroup.d: PluginDependencySpec",
            "plugin a.e APluginGroup.e: PluginDependencySpec",
        ]
    );
}

#[test]
fn flat_catalogue_has_no_groups() {
    let derived = accessors(&["x", "y"]);
    assert_eq!(derived.len(), 2);
    assert!(derived
        .iter()
        .all(|accessor| matches!(accessor, PluginAccessor::ForPlugin { .. })));
}

#[test]
fn group_type_name_concatenates_segments() {
    assert_eq!(plugin_group_type_name(&["org", "example"]), "OrgExamplePluginGroup");
    assert_eq!(plugin_group_type_name(&["my-org"]), "My-orgPluginGroup");

    let derived = accessors(&["org.example.plugin"]);
    assert_eq!(
        derived[1].extension().return_type,
        TypeSpec::for_plugin_group("OrgExamplePluginGroup")
    );
}

#[test]
fn leaf_carries_implementation_class() {
    let catalogue = vec![PluginEntry::new("org.foo", "org.foo.FooPlugin")];
    let trees = PluginTree::of(&catalogue).unwrap();
    let leaf = plugin_accessors_for(&trees, TypeSpec::plugin_dependencies_spec())
        .find(|accessor| matches!(accessor, PluginAccessor::ForPlugin { .. }))
        .unwrap();
    assert_eq!(
        leaf,
        PluginAccessor::ForPlugin {
            id: "org.foo".to_owned(),
            implementation_class: "org.foo.FooPlugin".to_owned(),
            extension: ExtensionSpec::new(
                "foo",
                TypeSpec::for_plugin_group("OrgPluginGroup"),
                TypeSpec::plugin_dependency_spec(),
            ),
        }
    );
}

#[test]
fn iterator_is_restartable() {
    let catalogue = vec![PluginEntry::new("a.b", "B"), PluginEntry::new("c", "C")];
    let trees = PluginTree::of(&catalogue).unwrap();
    let mut iter = plugin_accessors_for(&trees, TypeSpec::plugin_dependencies_spec());
    let first = iter.next();
    let resumed = iter.clone();
    assert_eq!(iter.collect::<Vec<_>>(), resumed.collect::<Vec<_>>());
    assert_eq!(first.map(|a| a.id().to_owned()), Some("a".to_owned()));
}

#[test]
fn deep_namespace_does_not_recurse() {
    let id = (0..500).map(|i| format!("s{i}")).collect::<Vec<_>>().join(".");
    let derived = accessors(&[id.as_str()]);
    assert_eq!(derived.len(), 500);
}

#[test]
fn name_collision_between_groups() {
    let derived = accessors(&["a.b.x", "aB.y"]);
    assert_eq!(
        check_group_type_names(&derived),
        Err(AccessorError::NameCollision {
            first_id: "a.b".to_owned(),
            second_id: "aB".to_owned(),
            type_name: "ABPluginGroup".to_owned(),
        })
    );
}

#[test]
fn distinct_groups_pass_name_check() {
    assert_eq!(check_group_type_names(&accessors(&["a.b.c", "a.b.d", "a.e"])), Ok(()));
    assert_eq!(check_group_type_names(&[]), Ok(()));
}

#[test]
fn getter_collision_between_siblings() {
    let spec = "Lorg/gradle/plugin/use/PluginDependenciesSpec;";
    assert_eq!(
        check_getter_signatures(&accessors(&["foo", "Foo"])),
        Err(AccessorError::GetterCollision {
            first_id: "foo".to_owned(),
            second_id: "Foo".to_owned(),
            getter: format!("getFoo({spec})Lorg/gradle/plugin/use/PluginDependencySpec;"),
        })
    );
    assert!(matches!(
        check_getter_signatures(&accessors(&["g.bar", "g.Bar"])),
        Err(AccessorError::GetterCollision { .. })
    ));
}

#[test]
fn getters_differing_in_receiver_or_return_type_pass() {
    // Different holders receive them.
    assert_eq!(check_getter_signatures(&accessors(&["a.foo", "b.Foo"])), Ok(()));
    // `getFoo` returning a plugin versus a group holder.
    assert_eq!(check_getter_signatures(&accessors(&["foo", "Foo.x"])), Ok(()));
    assert_eq!(check_getter_signatures(&[]), Ok(()));
}

fn plugin_id() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,3}", 1..4).prop_map(|segments| segments.join("."))
}

proptest! {
    #[test]
    fn one_accessor_per_tree_node(ids in prop::collection::vec(plugin_id(), 0..20)) {
        let catalogue: Vec<PluginEntry> =
            ids.iter().map(|id| PluginEntry::new(id.clone(), "Impl")).collect();
        if let Ok(trees) = PluginTree::of(&catalogue) {
            fn count(trees: &PluginTrees) -> usize {
                trees
                    .iter()
                    .map(|(_, tree)| match tree {
                        PluginTree::PluginGroup { plugins, .. } => 1 + count(plugins),
                        PluginTree::PluginSpec { .. } => 1,
                    })
                    .sum()
            }
            let derived: Vec<_> =
                plugin_accessors_for(&trees, TypeSpec::plugin_dependencies_spec()).collect();
            prop_assert_eq!(derived.len(), count(&trees));

            let leaves = derived
                .iter()
                .filter(|accessor| matches!(accessor, PluginAccessor::ForPlugin { .. }))
                .count();
            let mut distinct = ids.clone();
            distinct.sort();
            distinct.dedup();
            prop_assert_eq!(leaves, distinct.len());
        }
    }

    #[test]
    fn unrelated_top_level_ids_keep_relative_order(
        ids in prop::collection::hash_set("[a-z]{1,4}", 1..10)
    ) {
        let ids: Vec<String> = ids.into_iter().collect();
        let mut reversed = ids.clone();
        reversed.reverse();

        let names = |ids: &[String]| {
            let catalogue: Vec<PluginEntry> =
                ids.iter().map(|id| PluginEntry::new(id.clone(), "Impl")).collect();
            let trees = PluginTree::of(&catalogue).unwrap();
            plugin_accessors_for(&trees, TypeSpec::plugin_dependencies_spec())
                .map(|accessor| accessor.id().to_owned())
                .collect::<Vec<_>>()
        };

        prop_assert_eq!(names(&ids), ids.clone());
        prop_assert_eq!(names(&reversed), reversed);
    }
}
