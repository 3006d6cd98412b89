//! Shared record trees for unit/integration tests, built straight from the
//! concrete scenarios in §8.

#![cfg(test)]

use std::sync::Arc;

use crate::record::{EventRecord, FamilyRecord, IndividualRecord, RecordTree, Sex};

/// §8 scenario 1: `I1` root; `I2` child of `F1`; `F1{HUSB I3, WIFE I4, CHIL I2}`.
pub fn family_of_three() -> RecordTree {
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

/// A tree with one individual carrying an exact birth date, for §8 scenario 2.
pub fn single_birth(xref: &str, name: &str, birth_date: &str) -> RecordTree {
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

/// A tree with a dangling `FAMC` reference: `I1` claims to be a child of a
/// family that does not exist in the tree.
pub fn dangling_famc() -> RecordTree {
    RecordTree {
        individuals: vec![Arc::new(IndividualRecord {
            xref: "@I1@".into(),
            name: "Orphan Reference".into(),
            famc: vec!["@F99@".into()],
            ..Default::default()
        })],
        ..Default::default()
    }
}
