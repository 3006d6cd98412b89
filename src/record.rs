//! The input contract: a parsed GEDCOM record tree.
//!
//! This crate does not parse GEDCOM text — that's the upstream record
//! parser's job (out of scope, §1). What it needs from that parser is the
//! shape below: individuals, families and their supporting records, linked
//! by the `xref` cross-reference strings a GEDCOM file already carries
//! (`@I17@`-style). [`crate::builder::Builder`] consumes a [`RecordTree`]
//! and produces a [`crate::graph::Graph`].

use std::sync::Arc;

/// An external cross-reference identifier assigned by the source document,
/// e.g. `@I17@`. Unique within one [`RecordTree`].
pub type Xref = String;

/// A full parsed record tree: one GEDCOM file's worth of records.
#[derive(Debug, Clone, Default)]
pub struct RecordTree {
    /// All `INDI` records.
    pub individuals: Vec<Arc<IndividualRecord>>,
    /// All `FAM` records.
    pub families: Vec<Arc<FamilyRecord>>,
    /// All `NOTE` records.
    pub notes: Vec<Arc<NoteRecord>>,
    /// All `SOUR` records.
    pub sources: Vec<Arc<SourceRecord>>,
    /// All `REPO` records.
    pub repositories: Vec<Arc<RepositoryRecord>>,
}

/// Biological/recorded sex, as carried by the `SEX` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sex {
    /// `SEX M`
    Male,
    /// `SEX F`
    Female,
    /// Absent or any other value.
    #[default]
    Unknown,
}

/// A dated sub-record embedded in an individual or family (`BIRT`, `DEAT`,
/// `MARR`, ...). The graph synthesizes one [`crate::model::Node`] per
/// event; this struct is only the raw, as-parsed payload.
#[derive(Debug, Clone, Default)]
pub struct EventRecord {
    /// The GEDCOM event tag, e.g. `"BIRT"`, `"DEAT"`, `"MARR"`.
    pub tag: String,
    /// The raw date expression as written in the source, if present
    /// (`"15 JAN 1800"`, `"BET 1800 AND 1805"`, ...). Parsed lazily by
    /// [`crate::date::parse_lenient`] wherever a date query touches it.
    pub date: Option<String>,
    /// The free-text place name, if present.
    pub place: Option<String>,
}

/// An `INDI` record.
#[derive(Debug, Clone, Default)]
pub struct IndividualRecord {
    /// This individual's `xref`.
    pub xref: Xref,
    /// Full display name, as GEDCOM's `NAME` tag (already joined/
    /// formatted by the upstream parser — this crate does no further
    /// name normalization beyond case-folding for filter matches).
    pub name: String,
    /// `SEX` tag.
    pub sex: Sex,
    /// `xref`s of families in which this individual is a child (`FAMC`).
    pub famc: Vec<Xref>,
    /// `xref`s of families in which this individual is a spouse (`FAMS`).
    pub fams: Vec<Xref>,
    /// Embedded events (`BIRT`, `DEAT`, ...), in document order.
    pub events: Vec<EventRecord>,
    /// `xref`s of `NOTE` records cited by this individual.
    pub note_refs: Vec<Xref>,
    /// `xref`s of `SOUR` records cited by this individual.
    pub source_refs: Vec<Xref>,
}

impl IndividualRecord {
    /// Birth date, if a `BIRT` event is present — the first one in
    /// document order, per how GEDCOM files are conventionally written.
    pub fn birth_date(&self) -> Option<&str> {
        self.events.iter().find(|e| e.tag == "BIRT").and_then(|e| e.date.as_deref())
    }

    /// Whether this individual has a `DEAT` event recorded — the
    /// heuristic [`crate::filter::FilterQuery::is_living`] uses.
    pub fn has_death_event(&self) -> bool {
        self.events.iter().any(|e| e.tag == "DEAT")
    }
}

/// A `FAM` record.
#[derive(Debug, Clone, Default)]
pub struct FamilyRecord {
    /// This family's `xref`.
    pub xref: Xref,
    /// `xref` of the `HUSB`, if present.
    pub husb: Option<Xref>,
    /// `xref` of the `WIFE`, if present.
    pub wife: Option<Xref>,
    /// `xref`s of `CHIL` entries, in document order.
    pub chil: Vec<Xref>,
    /// Embedded events (`MARR`, `DIV`, ...), in document order.
    pub events: Vec<EventRecord>,
    /// `xref`s of `NOTE` records cited by this family.
    pub note_refs: Vec<Xref>,
    /// `xref`s of `SOUR` records cited by this family.
    pub source_refs: Vec<Xref>,
}

/// A `NOTE` record.
#[derive(Debug, Clone, Default)]
pub struct NoteRecord {
    /// This note's `xref`.
    pub xref: Xref,
    /// The note text.
    pub text: String,
}

/// A `SOUR` record.
#[derive(Debug, Clone, Default)]
pub struct SourceRecord {
    /// This source's `xref`.
    pub xref: Xref,
    /// The source title.
    pub title: String,
    /// `xref`s of `REPO` records this source cites.
    pub repo_refs: Vec<Xref>,
}

/// A `REPO` record.
#[derive(Debug, Clone, Default)]
pub struct RepositoryRecord {
    /// This repository's `xref`.
    pub xref: Xref,
    /// The repository name.
    pub name: String,
}
