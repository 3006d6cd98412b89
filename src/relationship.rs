//! Relationship helpers (C4): Parents/Children/Spouses/Siblings/Husband/Wife
//! over indexed edges, per §4.2.
//!
//! Each helper returns a freshly-allocated, de-duplicated list in
//! deterministic (document) order of the underlying edges. Self is always
//! excluded from `siblings` and `spouses`.

use crate::graph::Graph;
use crate::model::{FamilyNode, IndividualNode, Node, NodeId};

fn dedup_keep_order(ids: Vec<NodeId>) -> Vec<NodeId> {
    let mut seen = fxhash::FxHashSet::default();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

fn individual<'g>(graph: &'g Graph, id: NodeId) -> Option<&'g IndividualNode> {
    graph.node(id).and_then(Node::as_individual)
}

fn family<'g>(graph: &'g Graph, id: NodeId) -> Option<&'g FamilyNode> {
    graph.node(id).and_then(Node::as_family)
}

/// Direct parents of `indi` — `O(1)` via the cached `parents` slot.
pub fn parents<'g>(graph: &'g Graph, indi: &IndividualNode) -> Vec<&'g IndividualNode> {
    indi.parents.iter().filter_map(|&id| individual(graph, id)).collect()
}

/// All children of `indi` across every family in which it is a spouse —
/// `O(|fams| * |chil|)`.
pub fn children<'g>(graph: &'g Graph, indi: &IndividualNode) -> Vec<&'g IndividualNode> {
    let mut ids = Vec::new();
    for &fams_edge in &indi.fams_edges {
        let Some(family_id) = graph.edge(fams_edge).map(|e| e.target) else { continue };
        let Some(family) = family(graph, family_id) else { continue };
        for &chil_edge in &family.chil_edges {
            if let Some(child_id) = graph.edge(chil_edge).map(|e| e.target) {
                ids.push(child_id);
            }
        }
    }
    dedup_keep_order(ids).into_iter().filter_map(|id| individual(graph, id)).collect()
}

/// All spouses of `indi` (the other side of every family in which it is a
/// spouse) — `O(|fams|)`. Excludes `indi` itself.
pub fn spouses<'g>(graph: &'g Graph, indi: &IndividualNode) -> Vec<&'g IndividualNode> {
    let mut ids = Vec::new();
    for &fams_edge in &indi.fams_edges {
        let Some(family_id) = graph.edge(fams_edge).map(|e| e.target) else { continue };
        let Some(family) = family(graph, family_id) else { continue };
        for edge_id in [family.husband_edge, family.wife_edge].into_iter().flatten() {
            if let Some(spouse_id) = graph.edge(edge_id).map(|e| e.target) {
                if spouse_id != indi.id {
                    ids.push(spouse_id);
                }
            }
        }
    }
    dedup_keep_order(ids).into_iter().filter_map(|id| individual(graph, id)).collect()
}

/// All siblings of `indi` (other children in any family it is a child of)
/// — `O(|famc| * |chil|)`. Excludes `indi` itself.
pub fn siblings<'g>(graph: &'g Graph, indi: &IndividualNode) -> Vec<&'g IndividualNode> {
    let mut ids = Vec::new();
    for &famc_edge in &indi.famc_edges {
        let Some(family_id) = graph.edge(famc_edge).map(|e| e.target) else { continue };
        let Some(family) = family(graph, family_id) else { continue };
        for &chil_edge in &family.chil_edges {
            if let Some(sib_id) = graph.edge(chil_edge).map(|e| e.target) {
                if sib_id != indi.id {
                    ids.push(sib_id);
                }
            }
        }
    }
    dedup_keep_order(ids).into_iter().filter_map(|id| individual(graph, id)).collect()
}

/// The husband of `family`, if any — `O(1)` via the indexed slot.
pub fn husband<'g>(graph: &'g Graph, family: &FamilyNode) -> Option<&'g IndividualNode> {
    let edge_id = family.husband_edge?;
    individual(graph, graph.edge(edge_id)?.target)
}

/// The wife of `family`, if any — `O(1)` via the indexed slot.
pub fn wife<'g>(graph: &'g Graph, family: &FamilyNode) -> Option<&'g IndividualNode> {
    let edge_id = family.wife_edge?;
    individual(graph, graph.edge(edge_id)?.target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuildOptions, Builder};
    use crate::test_fixtures::family_of_three;

    #[test]
    fn ancestors_scenario_relationships() {
        let tree = family_of_three();
        let graph = Builder::new(BuildOptions::default()).build(&tree);

        let i2 = graph.get_individual("@I2@").unwrap();
        let parent_xrefs: Vec<_> = parents(&graph, i2).iter().map(|p| p.xref.clone()).collect();
        assert_eq!(parent_xrefs.len(), 2);
        assert!(parent_xrefs.contains(&"@I3@".to_string()));
        assert!(parent_xrefs.contains(&"@I4@".to_string()));

        let fam = graph.get_family("@F1@").unwrap();
        assert_eq!(husband(&graph, fam).unwrap().xref, "@I3@");
        assert_eq!(wife(&graph, fam).unwrap().xref, "@I4@");

        let i3 = graph.get_individual("@I3@").unwrap();
        let kids: Vec<_> = children(&graph, i3).iter().map(|c| c.xref.clone()).collect();
        assert_eq!(kids, vec!["@I2@".to_string()]);
    }
}
