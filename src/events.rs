//! Event-on-date query (C7): record-embedded event scan with a date
//! expression matcher, per §4.5.

use crate::date;
use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::model::{EventNode, Node, NodeType};

/// Every event (across individuals and families) whose date expression
/// matches the partially-specified `(year, month, day)` target. A `0`
/// component is a wildcard (§4.5). Events with no parseable date never
/// match.
pub fn get_events_on_date(graph: &Graph, year: u32, month: u32, day: u32) -> Vec<&EventNode> {
    graph
        .nodes_of_type(NodeType::Event)
        .filter_map(Node::as_event)
        .filter(|event| event.date.as_ref().map(|d| date::matches_event_target(d, year, month, day)).unwrap_or(false))
        .collect()
}

/// As [`get_events_on_date`], restricted to events with the given tag
/// (`"BIRT"`, `"DEAT"`, `"MARR"`, ...). An empty tag matches any event.
pub fn get_events_on_date_by_type<'g>(graph: &'g Graph, tag: &str, year: u32, month: u32, day: u32) -> Vec<&'g EventNode> {
    get_events_on_date(graph, year, month, day).into_iter().filter(|event| tag.is_empty() || event.tag == tag).collect()
}

/// The owning Individual/Family node of a synthetic event, addressed by its
/// `⟨ownerXref⟩_⟨tag⟩_⟨index⟩` identity (§3). Fails with
/// [`GraphError::NotFound`] when `event_id` is not present, per §4.5's
/// `EventNotFound` contract.
pub fn get_records_for_event<'g>(graph: &'g Graph, event_id: &str) -> Result<&'g Node> {
    let id = graph.event_synthetic_to_id.get(event_id).copied().ok_or_else(|| GraphError::NotFound(event_id.to_string()))?;
    let event = graph.node(id).and_then(Node::as_event).ok_or_else(|| GraphError::NotFound(event_id.to_string()))?;
    graph.node(event.owner).ok_or_else(|| GraphError::NotFound(event.owner_xref.clone()))
}
