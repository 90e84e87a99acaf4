//! Group tree to flat bone list
//!
//! Each group becomes a bone. Its element children become cubes and its
//! nested groups become child bones, linked only by name. The result is a
//! flat list in pre-order: every bone is followed by its descendants.

use crate::document::Bone;
use crate::remap::{bone_pivot, cube_from_element};
use anvil_core::{AnvilError, Result};
use anvil_import::{Element, Group, GroupChild, JavaModel};
use std::collections::{HashMap, HashSet};

/// Name of the synthetic bone collecting elements no group references
pub const ORPHAN_BONE_NAME: &str = "orphans";

/// Assigns unique bone names in first-seen order.
///
/// The first occurrence of a base name keeps it, the n-th occurrence gets
/// `base + n`. Counts are global across the whole tree, not per parent. If a
/// suffixed name is already taken, the suffix keeps climbing.
#[derive(Debug, Default)]
pub struct NameAllocator {
    seen: HashMap<String, usize>,
    taken: HashSet<String>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strip whitespace and lowercase. An empty result becomes `unnamed`.
    pub fn normalize(raw: &str) -> String {
        let name: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if name.is_empty() {
            "unnamed".to_string()
        } else {
            name
        }
    }

    /// Reserve and return a unique name derived from `raw`
    pub fn allocate(&mut self, raw: &str) -> String {
        let base = Self::normalize(raw);
        let count = self.seen.entry(base.clone()).or_insert(0);
        *count += 1;

        let mut candidate = if *count == 1 {
            base.clone()
        } else {
            format!("{}{}", base, count)
        };
        while self.taken.contains(&candidate) {
            *count += 1;
            candidate = format!("{}{}", base, count);
        }

        self.taken.insert(candidate.clone());
        candidate
    }
}

/// A converted group: its own bone plus all bones below it, in pre-order
#[derive(Debug)]
struct BoneSubtree {
    root: Bone,
    descendants: Vec<Bone>,
}

impl BoneSubtree {
    fn into_bones(self) -> impl Iterator<Item = Bone> {
        std::iter::once(self.root).chain(self.descendants)
    }
}

/// Build the complete bone list for a model.
///
/// Every element lands in exactly one bone's cubes: grouped elements in
/// their group's bone, unreferenced ones in a single orphan bone, and when
/// the model has no groups at all, each element in its own bone.
pub fn build_bones(model: &JavaModel) -> Result<Vec<Bone>> {
    let mut names = NameAllocator::new();

    if model.groups.is_empty() {
        return model
            .elements
            .iter()
            .enumerate()
            .map(|(index, element)| -> Result<Bone> {
                let cube = cube_from_element(index, element)?;
                let mut bone = Bone::new(names.allocate(&format!("element_{}", index)), cube.pivot);
                bone.cubes.push(cube);
                Ok(bone)
            })
            .collect();
    }

    let mut claimed = vec![false; model.elements.len()];
    let mut bones = Vec::new();

    for group in &model.groups {
        if let Some(subtree) = build_subtree(group, None, &model.elements, &mut names, &mut claimed)? {
            bones.extend(subtree.into_bones());
        }
    }

    let orphans = claimed
        .iter()
        .enumerate()
        .filter(|(_, claimed)| !**claimed)
        .map(|(index, _)| cube_from_element(index, &model.elements[index]))
        .collect::<Result<Vec<_>>>()?;

    if !orphans.is_empty() {
        tracing::debug!(count = orphans.len(), "Collecting ungrouped elements into orphan bone");
        let mut bone = Bone::new(names.allocate(ORPHAN_BONE_NAME), [0.0; 3]);
        bone.cubes = orphans;
        bones.push(bone);
    }

    Ok(bones)
}

fn build_subtree(
    group: &Group,
    parent: Option<&str>,
    elements: &[Element],
    names: &mut NameAllocator,
    claimed: &mut [bool],
) -> Result<Option<BoneSubtree>> {
    if !group.origin.iter().all(|c| c.is_finite()) {
        return Err(AnvilError::Transform(format!(
            "Group '{}' has a non-finite origin",
            group.name
        )));
    }

    let mut bone = Bone::new(names.allocate(&group.name), bone_pivot(group.origin));
    bone.parent = parent.map(str::to_string);
    let mut descendants = Vec::new();

    for child in &group.children {
        match child {
            GroupChild::Element(index) => {
                let index = *index;
                let element = elements.get(index).ok_or_else(|| {
                    AnvilError::Transform(format!(
                        "Group '{}' references element {} but the model has {}",
                        group.name,
                        index,
                        elements.len()
                    ))
                })?;
                if claimed[index] {
                    return Err(AnvilError::Transform(format!(
                        "Element {} is referenced by more than one group",
                        index
                    )));
                }
                claimed[index] = true;
                bone.cubes.push(cube_from_element(index, element)?);
            }
            GroupChild::Group(nested) => {
                if let Some(subtree) =
                    build_subtree(nested, Some(&bone.name), elements, names, claimed)?
                {
                    bone.children.push(subtree.root.name.clone());
                    descendants.extend(subtree.into_bones());
                }
            }
        }
    }

    if bone.cubes.is_empty() && bone.children.is_empty() {
        tracing::debug!(bone = %bone.name, "Dropping empty bone");
        return Ok(None);
    }

    Ok(Some(BoneSubtree {
        root: bone,
        descendants,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    /// Element `i` spans y in `i..i+1`, so its cube origin y identifies it
    fn elements(n: usize) -> Vec<Element> {
        (0..n)
            .map(|i| Element {
                from: [0.0, i as f64, 0.0],
                to: [1.0, i as f64 + 1.0, 1.0],
                rotation: None,
                faces: BTreeMap::new(),
            })
            .collect()
    }

    fn group(name: &str, children: Vec<GroupChild>) -> Group {
        Group {
            name: name.to_string(),
            origin: [8.0, 8.0, 8.0],
            children,
        }
    }

    fn el(i: usize) -> GroupChild {
        GroupChild::Element(i)
    }

    fn nested(g: Group) -> GroupChild {
        GroupChild::Group(g)
    }

    fn model(n: usize, groups: Vec<Group>) -> JavaModel {
        JavaModel {
            elements: elements(n),
            groups,
            ..Default::default()
        }
    }

    /// Element indices per bone, recovered from cube origins
    fn placements(bones: &[Bone]) -> Vec<usize> {
        let mut out: Vec<usize> = bones
            .iter()
            .flat_map(|b| b.cubes.iter().map(|c| c.origin[1] as usize))
            .collect();
        out.sort();
        out
    }

    fn names(bones: &[Bone]) -> Vec<&str> {
        bones.iter().map(|b| b.name.as_str()).collect()
    }

    #[test]
    fn test_allocator_suffixes() {
        let mut alloc = NameAllocator::new();
        assert_eq!(alloc.allocate("Body"), "body");
        assert_eq!(alloc.allocate("body"), "body2");
        assert_eq!(alloc.allocate("b o d y"), "body3");
        assert_eq!(alloc.allocate("arm"), "arm");
    }

    #[test]
    fn test_allocator_skips_taken_suffix() {
        let mut alloc = NameAllocator::new();
        assert_eq!(alloc.allocate("a2"), "a2");
        assert_eq!(alloc.allocate("a"), "a");
        assert_eq!(alloc.allocate("a"), "a3");
        assert_eq!(alloc.allocate("   "), "unnamed");
    }

    #[test]
    fn test_all_elements_grouped() {
        let m = model(
            3,
            vec![group("root", vec![el(0), nested(group("child", vec![el(1), el(2)]))])],
        );
        let bones = build_bones(&m).unwrap();
        assert_eq!(names(&bones), vec!["root", "child"]);
        assert_eq!(bones[0].children, vec!["child"]);
        assert_eq!(bones[1].parent.as_deref(), Some("root"));
        assert_eq!(placements(&bones), vec![0, 1, 2]);
    }

    #[test]
    fn test_subset_grouped_creates_orphan_bone() {
        let m = model(4, vec![group("root", vec![el(2)])]);
        let bones = build_bones(&m).unwrap();
        assert_eq!(names(&bones), vec!["root", ORPHAN_BONE_NAME]);
        let orphan = &bones[1];
        assert_eq!(orphan.pivot, [0.0, 0.0, 0.0]);
        assert_eq!(orphan.cubes.len(), 3);
        assert_eq!(placements(&bones), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_group_named_orphans_keeps_its_name() {
        let m = model(3, vec![group("Orphans", vec![el(0)])]);
        let bones = build_bones(&m).unwrap();
        assert_eq!(names(&bones), vec!["orphans", "orphans2"]);
        assert_eq!(bones[0].cubes.len(), 1);
        assert_eq!(bones[1].cubes.len(), 2);
        assert_eq!(bones[1].pivot, [0.0, 0.0, 0.0]);
        assert_eq!(placements(&bones), vec![0, 1, 2]);
    }

    #[test]
    fn test_no_groups_one_bone_per_element() {
        let m = model(3, vec![]);
        let bones = build_bones(&m).unwrap();
        assert_eq!(names(&bones), vec!["element_0", "element_1", "element_2"]);
        for bone in &bones {
            assert_eq!(bone.cubes.len(), 1);
            assert_eq!(bone.pivot, bone.cubes[0].pivot);
        }
        assert_eq!(placements(&bones), vec![0, 1, 2]);
    }

    #[test]
    fn test_duplicate_names_same_level() {
        let m = model(2, vec![group("leg", vec![el(0)]), group("leg", vec![el(1)])]);
        let bones = build_bones(&m).unwrap();
        assert_eq!(names(&bones), vec!["leg", "leg2"]);
    }

    #[test]
    fn test_duplicate_names_counted_globally() {
        let m = model(
            3,
            vec![
                group("arm", vec![nested(group("hand", vec![el(0)]))]),
                group("other", vec![nested(group("hand", vec![el(1)])), el(2)]),
            ],
        );
        let bones = build_bones(&m).unwrap();
        assert_eq!(names(&bones), vec!["arm", "hand", "other", "hand2"]);
        assert_eq!(bones[2].children, vec!["hand2"]);
        assert_eq!(bones[3].parent.as_deref(), Some("other"));
    }

    #[test]
    fn test_empty_bone_dropped_and_unlinked() {
        let m = model(
            1,
            vec![group(
                "root",
                vec![
                    nested(group("empty", vec![])),
                    nested(group("full", vec![el(0)])),
                ],
            )],
        );
        let bones = build_bones(&m).unwrap();
        assert_eq!(names(&bones), vec!["root", "full"]);
        assert_eq!(bones[0].children, vec!["full"]);
    }

    #[test]
    fn test_chain_of_empty_groups_dropped_entirely() {
        let m = model(
            1,
            vec![
                group("outer", vec![nested(group("inner", vec![]))]),
                group("real", vec![el(0)]),
            ],
        );
        let bones = build_bones(&m).unwrap();
        assert_eq!(names(&bones), vec!["real"]);
    }

    #[test]
    fn test_all_groups_empty_still_emits_elements() {
        let m = model(2, vec![group("nothing", vec![])]);
        let bones = build_bones(&m).unwrap();
        assert_eq!(names(&bones), vec![ORPHAN_BONE_NAME]);
        assert_eq!(placements(&bones), vec![0, 1]);
    }

    #[test]
    fn test_children_reference_existing_bones() {
        let m = model(
            3,
            vec![group(
                "a",
                vec![
                    nested(group("b", vec![nested(group("c", vec![el(0)]))])),
                    nested(group("d", vec![el(1)])),
                    el(2),
                ],
            )],
        );
        let bones = build_bones(&m).unwrap();
        let known: HashSet<&str> = bones.iter().map(|b| b.name.as_str()).collect();
        for bone in &bones {
            for child in &bone.children {
                assert!(known.contains(child.as_str()));
            }
            if let Some(parent) = &bone.parent {
                assert!(known.contains(parent.as_str()));
            }
        }
        assert_eq!(names(&bones), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_group_pivot() {
        let mut g = group("root", vec![el(0)]);
        g.origin = [0.0, 4.0, 16.0];
        let bones = build_bones(&model(1, vec![g])).unwrap();
        assert_eq!(bones[0].pivot, [8.0, 4.0, 8.0]);
    }

    #[test]
    fn test_out_of_range_child_is_transform_error() {
        let m = model(1, vec![group("root", vec![el(5)])]);
        assert!(matches!(build_bones(&m), Err(AnvilError::Transform(_))));
    }

    #[test]
    fn test_double_reference_is_transform_error() {
        let m = model(1, vec![group("a", vec![el(0)]), group("b", vec![el(0)])]);
        assert!(matches!(build_bones(&m), Err(AnvilError::Transform(_))));
    }

    #[test]
    fn test_deterministic() {
        let m = model(
            3,
            vec![
                group("x", vec![el(0)]),
                group("x", vec![nested(group("x", vec![el(1)]))]),
            ],
        );
        let first = build_bones(&m).unwrap();
        let second = build_bones(&m).unwrap();
        assert_eq!(first, second);
        assert_eq!(names(&first), vec!["x", "x2", "x3", ORPHAN_BONE_NAME]);
    }

    proptest! {
        /// Each slot names the group (0..3) an element goes to, or 3 for none
        #[test]
        fn prop_every_element_placed_once(slots in prop::collection::vec(0usize..4, 0..16)) {
            let mut groups: Vec<Group> = (0..3).map(|g| group(&format!("g{}", g % 2), vec![])).collect();
            for (index, slot) in slots.iter().enumerate() {
                if *slot < 3 {
                    groups[*slot].children.push(el(index));
                }
            }
            let bones = build_bones(&model(slots.len(), groups)).unwrap();
            prop_assert_eq!(placements(&bones), (0..slots.len()).collect::<Vec<_>>());

            let unique: HashSet<&str> = bones.iter().map(|b| b.name.as_str()).collect();
            prop_assert_eq!(unique.len(), bones.len());
        }
    }
}
