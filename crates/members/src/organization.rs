//! Organization chart assembly.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use spk_database::OrgPosition;

#[derive(Debug, Clone, Serialize)]
pub struct OrgNode {
    #[serde(flatten)]
    pub position: OrgPosition,
    pub children: Vec<OrgNode>,
}

/// Builds the chart for one period. Siblings are ordered by `sort_order`
/// then id; positions whose parent is missing become roots.
pub fn build_tree(positions: Vec<OrgPosition>) -> Vec<OrgNode> {
    let ids: HashSet<i64> = positions.iter().map(|p| p.id).collect();
    let mut children: HashMap<Option<i64>, Vec<OrgPosition>> = HashMap::new();
    for position in positions {
        let parent = position.parent_id.filter(|id| ids.contains(id));
        children.entry(parent).or_default().push(position);
    }
    for siblings in children.values_mut() {
        siblings.sort_by_key(|p| (p.sort_order, p.id));
    }
    attach(None, &mut children)
}

fn attach(parent: Option<i64>, children: &mut HashMap<Option<i64>, Vec<OrgPosition>>) -> Vec<OrgNode> {
    let Some(level) = children.remove(&parent) else {
        return Vec::new();
    };
    level
        .into_iter()
        .map(|position| {
            let nested = attach(Some(position.id), children);
            OrgNode { position, children: nested }
        })
        .collect()
}

/// Whether making `parent_id` the parent of `position_id` would close a loop.
pub fn creates_cycle(positions: &[OrgPosition], position_id: i64, parent_id: i64) -> bool {
    let parents: HashMap<i64, Option<i64>> = positions.iter().map(|p| (p.id, p.parent_id)).collect();
    let mut seen = HashSet::new();
    let mut current = Some(parent_id);
    while let Some(id) = current {
        if id == position_id || !seen.insert(id) {
            return true;
        }
        current = parents.get(&id).copied().flatten();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(id: i64, parent_id: Option<i64>, sort_order: i64) -> OrgPosition {
        OrgPosition {
            id,
            title: format!("Jabatan {id}"),
            parent_id,
            member_id: None,
            member_name: None,
            member_photo: None,
            period: "2024-2027".into(),
            sort_order,
        }
    }

    #[test]
    fn nests_and_orders_children() {
        let tree = build_tree(vec![
            position(3, Some(1), 2),
            position(1, None, 0),
            position(2, Some(1), 1),
            position(4, Some(2), 0),
            position(5, Some(99), 0),
        ]);

        let roots: Vec<i64> = tree.iter().map(|n| n.position.id).collect();
        assert_eq!(roots, vec![1, 5]);
        let under_chair: Vec<i64> = tree[0].children.iter().map(|n| n.position.id).collect();
        assert_eq!(under_chair, vec![2, 3]);
        assert_eq!(tree[0].children[0].children[0].position.id, 4);
    }

    #[test]
    fn detects_cycles() {
        let positions = vec![position(1, None, 0), position(2, Some(1), 0), position(3, Some(2), 0)];
        assert!(creates_cycle(&positions, 1, 3));
        assert!(creates_cycle(&positions, 2, 2));
        assert!(!creates_cycle(&positions, 3, 1));
        assert!(!creates_cycle(&positions, 1, 42));
    }
}
