//! The builder (C3): two-pass materialization of a [`crate::record::RecordTree`]
//! into a [`crate::graph::Graph`], per §4.1.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, trace};

use crate::cache::DEFAULT_CAPACITY;
use crate::graph::Graph;
use crate::model::{
    Adjacency, EdgeData, EdgeId, EdgeType, EventNode, FamilyNode, IndividualNode, Node, NodeId, NoteNode,
    RepositoryNode, SourceNode,
};
use crate::record::{EventRecord, RecordTree, Xref};

/// Options controlling graph construction.
///
/// No config *file* format is in scope (§1) — this is a plain options
/// struct passed in code, the way `ankurah-storage-sled`'s storage engine
/// takes constructor arguments rather than reading a file.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    /// Capacity of the per-graph query cache (§4.7). `<= 0` uses the
    /// default.
    pub cache_capacity: isize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { cache_capacity: DEFAULT_CAPACITY as isize }
    }
}

/// Builds a [`Graph`] from a [`RecordTree`].
///
/// Per §4.1's failure semantics: a malformed record tree never fails the
/// build, it only degrades into missing edges. The only errors this
/// builder itself can report come from the hybrid storage mirror (see
/// [`crate::hybrid`]).
pub struct Builder {
    options: BuildOptions,
    /// Guards `xref -> id` registration during node creation. Event
    /// synthesis assigns ids lazily while enumerating owner events, so
    /// concurrent registration (e.g. if a caller mirrors to hybrid storage
    /// from a parallel task while building continues) must not race (§5).
    id_guard: Mutex<()>,
}

impl Builder {
    /// Create a builder with the given options.
    pub fn new(options: BuildOptions) -> Self {
        Self { options, id_guard: Mutex::new(()) }
    }

    /// Build a graph from `tree`. Empty trees succeed with an empty graph.
    pub fn build(&self, tree: &RecordTree) -> Graph {
        let mut graph = Graph::empty(self.options.cache_capacity);
        debug!(
            individuals = tree.individuals.len(),
            families = tree.families.len(),
            "starting graph build"
        );

        self.pass1_nodes(&mut graph, tree);
        self.pass2_edges(&mut graph, tree);
        self.pass3_parent_cache(&mut graph);

        debug!(nodes = graph.node_count(), edges = graph.edge_count(), "graph build complete");
        graph
    }

    fn register(&self, graph: &mut Graph, xref: Xref, id: NodeId) {
        let _guard = self.id_guard.lock().unwrap();
        graph.xref_to_id.insert(xref.clone(), id);
        graph.id_to_xref.insert(id, xref);
    }

    fn pass1_nodes(&self, graph: &mut Graph, tree: &RecordTree) {
        for record in &tree.individuals {
            let id = graph.nodes.insert_with_key(|id| {
                Node::Individual(IndividualNode {
                    id,
                    xref: record.xref.clone(),
                    record: record.clone(),
                    famc_edges: Vec::new(),
                    fams_edges: Vec::new(),
                    parents: Vec::new(),
                    adjacency: Adjacency::default(),
                })
            });
            self.register(graph, record.xref.clone(), id);
            graph.individuals_order.push(id);
        }

        for record in &tree.families {
            let id = graph.nodes.insert_with_key(|id| {
                Node::Family(FamilyNode {
                    id,
                    xref: record.xref.clone(),
                    record: record.clone(),
                    husband_edge: None,
                    wife_edge: None,
                    chil_edges: Vec::new(),
                    adjacency: Adjacency::default(),
                })
            });
            self.register(graph, record.xref.clone(), id);
            graph.families_order.push(id);
        }

        for record in &tree.notes {
            let id = graph
                .nodes
                .insert_with_key(|id| Node::Note(NoteNode { id, xref: record.xref.clone(), record: record.clone(), adjacency: Adjacency::default() }));
            self.register(graph, record.xref.clone(), id);
            graph.notes_order.push(id);
        }

        for record in &tree.sources {
            let id = graph.nodes.insert_with_key(|id| {
                Node::Source(SourceNode { id, xref: record.xref.clone(), record: record.clone(), adjacency: Adjacency::default() })
            });
            self.register(graph, record.xref.clone(), id);
            graph.sources_order.push(id);
        }

        for record in &tree.repositories {
            let id = graph.nodes.insert_with_key(|id| {
                Node::Repository(RepositoryNode { id, xref: record.xref.clone(), record: record.clone(), adjacency: Adjacency::default() })
            });
            self.register(graph, record.xref.clone(), id);
            graph.repositories_order.push(id);
        }

        // Events are synthesized by enumerating each individual's and
        // family's embedded events in document order (§4.1 pass 1).
        let owners: Vec<(NodeId, Xref, &[EventRecord])> = tree
            .individuals
            .iter()
            .map(|r| (graph.xref_to_id[&r.xref], r.xref.clone(), r.events.as_slice()))
            .chain(tree.families.iter().map(|r| (graph.xref_to_id[&r.xref], r.xref.clone(), r.events.as_slice())))
            .collect();

        for (owner_id, owner_xref, events) in owners {
            let mut seen_tag_counts: HashMap<&str, usize> = HashMap::new();
            for event in events {
                let index = {
                    let count = seen_tag_counts.entry(event.tag.as_str()).or_insert(0);
                    let i = *count;
                    *count += 1;
                    i
                };
                let synthetic_id = format!("{owner_xref}_{}_{index}", event.tag);
                let date = event.date.as_deref().and_then(crate::date::parse_lenient);
                let id = graph.nodes.insert_with_key(|id| {
                    Node::Event(EventNode {
                        id,
                        synthetic_id: synthetic_id.clone(),
                        owner: owner_id,
                        owner_xref: owner_xref.clone(),
                        tag: event.tag.clone(),
                        index,
                        date_raw: event.date.clone(),
                        date,
                        place: event.place.clone(),
                        adjacency: Adjacency::default(),
                    })
                });
                graph.event_synthetic_to_id.insert(synthetic_id, id);
                graph.events_order.push(id);
            }
        }
    }

    fn pass2_edges(&self, graph: &mut Graph, tree: &RecordTree) {
        for record in &tree.individuals {
            let Some(&indi_id) = graph.xref_to_id.get(&record.xref) else { continue };

            for famc_xref in &record.famc {
                self.link(graph, EdgeType::Famc, indi_id, famc_xref, |g, eid| {
                    g.nodes[indi_id].as_individual_mut().unwrap().famc_edges.push(eid);
                });
            }
            for fams_xref in &record.fams {
                self.link(graph, EdgeType::Fams, indi_id, fams_xref, |g, eid| {
                    g.nodes[indi_id].as_individual_mut().unwrap().fams_edges.push(eid);
                });
            }
            for note_xref in &record.note_refs {
                self.link(graph, EdgeType::NoteRef, indi_id, note_xref, |_, _| {});
            }
            for source_xref in &record.source_refs {
                self.link(graph, EdgeType::SourceRef, indi_id, source_xref, |_, _| {});
            }
        }

        for record in &tree.families {
            let Some(&fam_id) = graph.xref_to_id.get(&record.xref) else { continue };

            if let Some(husb_xref) = &record.husb {
                self.link(graph, EdgeType::Husb, fam_id, husb_xref, |g, eid| {
                    // Last writer wins (§4.1): a second HUSB reference would
                    // replace this, but a well-formed tree has at most one.
                    g.nodes[fam_id].as_family_mut().unwrap().husband_edge = Some(eid);
                });
            }
            if let Some(wife_xref) = &record.wife {
                self.link(graph, EdgeType::Wife, fam_id, wife_xref, |g, eid| {
                    g.nodes[fam_id].as_family_mut().unwrap().wife_edge = Some(eid);
                });
            }
            for chil_xref in &record.chil {
                self.link(graph, EdgeType::Chil, fam_id, chil_xref, |g, eid| {
                    g.nodes[fam_id].as_family_mut().unwrap().chil_edges.push(eid);
                });
            }
            for note_xref in &record.note_refs {
                self.link(graph, EdgeType::NoteRef, fam_id, note_xref, |_, _| {});
            }
            for source_xref in &record.source_refs {
                self.link(graph, EdgeType::SourceRef, fam_id, source_xref, |_, _| {});
            }
        }

        for record in &tree.sources {
            let Some(&source_id) = graph.xref_to_id.get(&record.xref) else { continue };
            for repo_xref in &record.repo_refs {
                self.link(graph, EdgeType::RepoRef, source_id, repo_xref, |_, _| {});
            }
        }

        // EVENT_OF: events always resolve (their owner id is known at
        // synthesis time), but route through the same dangling-safe path
        // for uniformity.
        let event_links: Vec<(NodeId, NodeId)> =
            graph.events_order.iter().map(|&eid| (eid, graph.nodes[eid].as_event().unwrap().owner)).collect();
        for (event_id, owner_id) in event_links {
            if !graph.nodes.contains_key(owner_id) {
                trace!("dropping EVENT_OF edge: owner no longer present");
                continue;
            }
            let edge_id = graph.edges.insert_with_key(|id| EdgeData { id, edge_type: EdgeType::EventOf, source: event_id, target: owner_id });
            graph.nodes[event_id].adjacency_mut().outgoing.push(edge_id);
            graph.nodes[owner_id].adjacency_mut().incoming.push(edge_id);
        }
    }

    /// Create an edge `source -(edge_type)-> target_xref`, unless
    /// `target_xref` does not resolve to a node, in which case it is
    /// silently skipped (§3 invariant 1). `on_created` additionally
    /// populates the owner's indexed slot.
    fn link(&self, graph: &mut Graph, edge_type: EdgeType, source: NodeId, target_xref: &str, on_created: impl FnOnce(&mut Graph, EdgeId)) {
        let Some(&target) = graph.xref_to_id.get(target_xref) else {
            trace!(%target_xref, ?edge_type, "dropping dangling edge reference");
            return;
        };
        let edge_id = graph.edges.insert_with_key(|id| EdgeData { id, edge_type, source, target });
        graph.nodes[source].adjacency_mut().outgoing.push(edge_id);
        graph.nodes[target].adjacency_mut().incoming.push(edge_id);
        on_created(graph, edge_id);
    }

    fn pass3_parent_cache(&self, graph: &mut Graph) {
        let individual_ids = graph.individuals_order.clone();
        for indi_id in individual_ids {
            let famc_edges = graph.nodes[indi_id].as_individual().unwrap().famc_edges.clone();
            let mut parents = Vec::new();
            let mut seen = std::collections::HashSet::new();
            for edge_id in famc_edges {
                let family_id = graph.edges[edge_id].target;
                let Some(family) = graph.nodes.get(family_id).and_then(Node::as_family) else { continue };
                for candidate in [family.husband_edge, family.wife_edge].into_iter().flatten() {
                    let parent_id = graph.edges[candidate].target;
                    if parent_id == indi_id {
                        continue; // exclude self, per §8 invariant 2
                    }
                    if seen.insert(parent_id) {
                        parents.push(parent_id);
                    }
                }
            }
            graph.nodes[indi_id].as_individual_mut().unwrap().parents = parents;
        }
    }
}

#[cfg(feature = "hybrid")]
mod hybrid_build {
    use std::collections::HashMap;
    use std::sync::Arc;

    use tracing::{debug, error};

    use super::Builder;
    use crate::error::Result;
    use crate::graph::Graph;
    use crate::hybrid::{require_file_id, HybridBinding, HybridOptions, KvStore, NodeBlob, NodeRow, RelationalIndex};
    use crate::record::RecordTree;

    impl Builder {
        /// Build a graph and mirror every `Individual` node into the given
        /// relational index and KV store, per §6/§5: one transaction per
        /// storage target, rolled back on the first failure (§5
        /// "Build batches all mirror inserts inside a single transaction
        /// per storage target; failure rolls the transaction back and
        /// reports the underlying error").
        pub async fn build_hybrid(
            &self,
            tree: &RecordTree,
            options: HybridOptions,
            relational: Arc<dyn RelationalIndex>,
            kv: Arc<dyn KvStore>,
        ) -> Result<Graph> {
            let file_id = require_file_id(&options)?.clone();
            let mut graph = self.build(tree);

            if let Err(err) = self.mirror_all(&graph, &file_id, &relational, &kv).await {
                error!(%file_id, error = %err, "hybrid mirror build failed, rolling back");
                let _ = relational.rollback().await;
                return Err(err);
            }

            let binding = Arc::new(HybridBinding::new(file_id, relational, kv));
            let mut hybrid_id_to_node = HashMap::new();
            for (idx, (_, indi)) in graph.get_all_individuals().enumerate() {
                hybrid_id_to_node.insert(idx as u64 + 1, indi.id);
            }
            graph.set_hybrid(binding, hybrid_id_to_node);
            Ok(graph)
        }

        async fn mirror_all(&self, graph: &Graph, file_id: &str, relational: &Arc<dyn RelationalIndex>, kv: &Arc<dyn KvStore>) -> Result<()> {
            debug!(%file_id, "beginning hybrid mirror transaction");
            relational.begin().await?;

            for (idx, (xref, indi)) in graph.get_all_individuals().enumerate() {
                let row_id = idx as u64 + 1;
                let row = NodeRow {
                    id: row_id,
                    xref: xref.to_string(),
                    node_type: "Individual".to_string(),
                    name: Some(indi.record.name.clone()),
                    name_lower: Some(indi.record.name.to_lowercase()),
                    birth_date: indi.record.birth_date().and_then(crate::date::parse_lenient).and_then(|d| crate::date::to_epoch_seconds(&d)),
                    birth_place: None,
                    sex: Some(
                        match indi.record.sex {
                            crate::record::Sex::Male => "M",
                            crate::record::Sex::Female => "F",
                            crate::record::Sex::Unknown => "U",
                        }
                        .to_string(),
                    ),
                    has_children: !crate::relationship::children(graph, indi).is_empty(),
                    has_spouse: !crate::relationship::spouses(graph, indi).is_empty(),
                    living: !indi.record.has_death_event(),
                    created_at: 0,
                    updated_at: 0,
                };
                relational.insert_node_row(&file_id.to_string(), row).await?;
                relational.insert_xref_mapping(&file_id.to_string(), xref, row_id).await?;
                let blob = NodeBlob { xref: xref.to_string(), name: indi.record.name.clone() };
                let bytes = serde_json::to_vec(&blob).map_err(|e| crate::error::GraphError::Storage(e.to_string()))?;
                kv.put_node(&file_id.to_string(), row_id, bytes).await?;
            }

            relational.commit().await?;
            debug!(%file_id, "hybrid mirror transaction committed");
            Ok(())
        }
    }
}
