//! Scenario-level integration tests exercising the builder and query
//! surface end to end (§8 concrete scenarios and boundary behaviors).

use std::sync::Arc;

use gedcom_graph::record::{EventRecord, FamilyRecord, IndividualRecord, RecordTree, Sex};
use gedcom_graph::{BuildOptions, Builder, QueryBuilder};

fn family_of_three() -> RecordTree {
    RecordTree {
        individuals: vec![
            Arc::new(IndividualRecord { xref: "@I1@".into(), name: "Root Person".into(), ..Default::default() }),
            Arc::new(IndividualRecord {
                xref: "@I2@".into(),
                name: "Child Person".into(),
                famc: vec!["@F1@".into()],
                ..Default::default()
            }),
            Arc::new(IndividualRecord {
                xref: "@I3@".into(),
                name: "Husband Person".into(),
                sex: Sex::Male,
                fams: vec!["@F1@".into()],
                ..Default::default()
            }),
            Arc::new(IndividualRecord {
                xref: "@I4@".into(),
                name: "Wife Person".into(),
                sex: Sex::Female,
                fams: vec!["@F1@".into()],
                ..Default::default()
            }),
        ],
        families: vec![Arc::new(FamilyRecord {
            xref: "@F1@".into(),
            husb: Some("@I3@".into()),
            wife: Some("@I4@".into()),
            chil: vec!["@I2@".into()],
            ..Default::default()
        })],
        ..Default::default()
    }
}

fn single_birth(xref: &str, name: &str, birth_date: &str) -> RecordTree {
    RecordTree {
        individuals: vec![Arc::new(IndividualRecord {
            xref: xref.into(),
            name: name.into(),
            events: vec![EventRecord { tag: "BIRT".into(), date: Some(birth_date.into()), place: None }],
            ..Default::default()
        })],
        ..Default::default()
    }
}

#[test]
fn scenario_1_ancestor_descendant_counts() {
    let tree = family_of_three();
    let graph = Builder::new(BuildOptions::default()).build(&tree);
    let q = QueryBuilder::new(&graph);

    assert_eq!(q.individual("@I2@").unwrap().ancestors().count(), 2);
    assert_eq!(q.individual("@I1@").unwrap().ancestors().count(), 0);
    assert_eq!(q.individual("@I1@").unwrap().descendants().count(), 0);
    assert_eq!(q.individual("@I3@").unwrap().descendants().count(), 1);
}

#[test]
fn scenario_2_event_on_exact_date() {
    let tree = single_birth("@I1@", "Dated Person", "15 JAN 1800");
    let graph = Builder::new(BuildOptions::default()).build(&tree);

    assert_eq!(gedcom_graph::query::get_events_on_date(&graph, 1800, 1, 15).len(), 1);
    assert_eq!(gedcom_graph::query::get_events_on_date(&graph, 1800, 0, 0).len(), 1);
    assert_eq!(gedcom_graph::query::get_events_on_date(&graph, 1801, 1, 15).len(), 0);
}

#[test]
fn scenario_3_birth_range_month_and_day() {
    let tree = single_birth("@I1@", "Ranged Person", "BET 25 JAN 1800 AND 5 FEB 1800");
    let graph = Builder::new(BuildOptions::default()).build(&tree);

    assert_eq!(QueryBuilder::new(&graph).filter().by_birth_month_and_day(2, 3).execute().len(), 1);
    assert_eq!(QueryBuilder::new(&graph).filter().by_birth_month_and_day(2, 10).execute().len(), 0);
    assert_eq!(QueryBuilder::new(&graph).filter().by_birth_month_and_day(1, 30).execute().len(), 1);
}

#[test]
fn scenario_4_birth_range_spans_year_boundary() {
    let tree = single_birth("@I1@", "Wraparound Person", "BET 1 DEC 1800 AND 31 JAN 1801");
    let graph = Builder::new(BuildOptions::default()).build(&tree);

    assert_eq!(QueryBuilder::new(&graph).filter().by_birth_month(12).execute().len(), 1);
    assert_eq!(QueryBuilder::new(&graph).filter().by_birth_month(1).execute().len(), 1);
}

#[test]
fn boundary_empty_tree_has_no_nodes_and_succeeds() {
    let tree = RecordTree::default();
    let graph = Builder::new(BuildOptions::default()).build(&tree);

    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.edge_count(), 0);
    assert!(QueryBuilder::new(&graph).all_individuals().execute().is_empty());
}

#[test]
fn boundary_dangling_xref_reference_is_silently_dropped() {
    let tree = RecordTree {
        individuals: vec![Arc::new(IndividualRecord {
            xref: "@I1@".into(),
            name: "Orphan Reference".into(),
            famc: vec!["@F99@".into()],
            ..Default::default()
        })],
        ..Default::default()
    };
    let graph = Builder::new(BuildOptions::default()).build(&tree);

    assert_eq!(graph.edge_count(), 0);
    assert!(graph.get_individual("@I1@").is_some());
}

#[test]
fn boundary_invalid_month_day_is_a_no_op() {
    let tree = single_birth("@I1@", "Dated Person", "15 JAN 1800");
    let graph = Builder::new(BuildOptions::default()).build(&tree);
    let q = QueryBuilder::new(&graph);

    for invalid_month in [0, 13, 32, u32::MAX] {
        assert_eq!(q.filter().by_birth_month(invalid_month).execute().len(), 1);
    }
    for invalid_day in [0, 32, u32::MAX] {
        assert_eq!(q.filter().by_birth_day(invalid_day).execute().len(), 1);
    }
}

#[test]
fn boundary_unknown_starting_xref_yields_no_root() {
    let tree = family_of_three();
    let graph = Builder::new(BuildOptions::default()).build(&tree);
    assert!(QueryBuilder::new(&graph).individual("@I404@").is_none());
}

#[test]
fn repeated_query_returns_equal_results_in_equal_order() {
    let tree = family_of_three();
    let graph = Builder::new(BuildOptions::default()).build(&tree);
    let q = QueryBuilder::new(&graph);

    let first: Vec<_> = q.individual("@I2@").unwrap().ancestors().execute().iter().map(|n| n.xref.clone()).collect();
    let second: Vec<_> = q.individual("@I2@").unwrap().ancestors().execute().iter().map(|n| n.xref.clone()).collect();
    assert_eq!(first, second);
}

#[test]
fn invariant_parent_cache_matches_husband_wife_union() {
    let tree = family_of_three();
    let graph = Builder::new(BuildOptions::default()).build(&tree);
    let child = graph.get_individual("@I2@").unwrap();
    let mut parents: Vec<_> = child.parents.iter().filter_map(|&id| graph.xref_of(id)).collect();
    parents.sort();
    assert_eq!(parents, vec!["@I3@", "@I4@"]);
}

#[test]
fn invariant_xref_id_lookup_is_bijective() {
    let tree = family_of_three();
    let graph = Builder::new(BuildOptions::default()).build(&tree);
    for xref in ["@I1@", "@I2@", "@I3@", "@I4@", "@F1@"] {
        let id = graph.id_of(xref).unwrap();
        assert_eq!(graph.xref_of(id), Some(xref));
    }
}
