//! Filter query (C6): a chainable predicate pipeline over Individual
//! records, per §4.4.

use crate::cache::{cache_key, CacheValue};
use crate::date;
use crate::graph::Graph;
use crate::model::IndividualNode;
use crate::record::Sex;
use crate::relationship;

type Predicate<'g> = Box<dyn Fn(&IndividualNode) -> bool + 'g>;

/// A chainable predicate pipeline over a graph's Individual nodes.
///
/// Each builder method appends a predicate and a short descriptor string;
/// the descriptors double as the cache key's argument tuple (§4.7) so that
/// two structurally-equal chains share a cached result. `Filter(fn)`-style
/// custom predicates aren't representable as a descriptor, so chains built
/// with [`FilterQuery::custom`] bypass the cache entirely.
pub struct FilterQuery<'g> {
    graph: &'g Graph,
    predicates: Vec<Predicate<'g>>,
    descriptors: Vec<String>,
    cacheable: bool,
    #[cfg(feature = "hybrid")]
    indexable: Vec<Option<crate::hybrid::IndexablePredicate>>,
}

impl<'g> FilterQuery<'g> {
    pub(crate) fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            predicates: Vec::new(),
            descriptors: Vec::new(),
            cacheable: true,
            #[cfg(feature = "hybrid")]
            indexable: Vec::new(),
        }
    }

    fn push(mut self, descriptor: String, predicate: Predicate<'g>) -> Self {
        self.descriptors.push(descriptor);
        self.predicates.push(predicate);
        #[cfg(feature = "hybrid")]
        self.indexable.push(None);
        self
    }

    /// Record the relational-index predicate the most recently pushed step
    /// can be answered by in hybrid mode (§4.4 "the first indexable
    /// predicate consults the store for a candidate id set"). A no-op when
    /// the `hybrid` feature is disabled.
    #[cfg(feature = "hybrid")]
    fn mark_indexable(mut self, indexable: crate::hybrid::IndexablePredicate) -> Self {
        if let Some(slot) = self.indexable.last_mut() {
            *slot = Some(indexable);
        }
        self
    }

    /// Case-insensitive substring match on full name.
    pub fn by_name(self, needle: &str) -> Self {
        let needle = needle.to_lowercase();
        let descriptor = format!("name:{needle}");
        let key = needle.clone();
        let result = self.push(descriptor, Box::new(move |indi| indi.record.name.to_lowercase().contains(&key)));
        #[cfg(feature = "hybrid")]
        let result = result.mark_indexable(crate::hybrid::IndexablePredicate::NameLower(needle));
        result
    }

    /// Case-insensitive equality on full name.
    pub fn by_name_exact(self, value: &str) -> Self {
        let value = value.to_lowercase();
        let descriptor = format!("name_exact:{value}");
        let key = value.clone();
        self.push(descriptor, Box::new(move |indi| indi.record.name.to_lowercase() == key))
    }

    /// Case-insensitive prefix match on full name.
    pub fn by_name_starts(self, prefix: &str) -> Self {
        let prefix = prefix.to_lowercase();
        let descriptor = format!("name_starts:{prefix}");
        let key = prefix.clone();
        self.push(descriptor, Box::new(move |indi| indi.record.name.to_lowercase().starts_with(&key)))
    }

    /// Inclusive range on parsed birth date (§4.4.1). Unparseable `start`/
    /// `end` expressions make the predicate a no-op, per §4.4's "out-of-range
    /// values... silently ignored" posture extended to unparseable dates.
    pub fn by_birth_date(self, start: &str, end: &str) -> Self {
        let (Some(range_start), Some(range_end)) = (date::parse_lenient(start), date::parse_lenient(end)) else {
            return self;
        };
        let descriptor = format!("birth_date:{start}..{end}");
        let result = self.push(
            descriptor,
            Box::new(move |indi| {
                indi.record
                    .birth_date()
                    .and_then(date::parse_lenient)
                    .map(|birth| date::date_in_range(&birth, &range_start, &range_end))
                    .unwrap_or(false)
            }),
        );
        #[cfg(feature = "hybrid")]
        let result = match (date::to_epoch_seconds(&range_start), date::to_epoch_seconds_ceil(&range_end)) {
            (Some(lo), Some(hi)) => result.mark_indexable(crate::hybrid::IndexablePredicate::BirthDateRange(lo, hi)),
            _ => result,
        };
        result
    }

    /// Birth month in `[1, 12]`; out-of-range values are silently ignored
    /// (§4.4).
    pub fn by_birth_month(self, month: u32) -> Self {
        if !(1..=12).contains(&month) {
            return self;
        }
        let descriptor = format!("birth_month:{month}");
        self.push(
            descriptor,
            Box::new(move |indi| indi.record.birth_date().and_then(date::parse_lenient).map(|d| date::matches_month(&d, month)).unwrap_or(false)),
        )
    }

    /// Birth day-of-month in `[1, 31]`; out-of-range values are silently
    /// ignored (§4.4).
    pub fn by_birth_day(self, day: u32) -> Self {
        if !(1..=31).contains(&day) {
            return self;
        }
        let descriptor = format!("birth_day:{day}");
        self.push(
            descriptor,
            Box::new(move |indi| indi.record.birth_date().and_then(date::parse_lenient).map(|d| date::matches_day(&d, day)).unwrap_or(false)),
        )
    }

    /// Birth (month, day); out-of-range values are silently ignored (§4.4).
    pub fn by_birth_month_and_day(self, month: u32, day: u32) -> Self {
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return self;
        }
        let descriptor = format!("birth_month_day:{month}-{day}");
        self.push(
            descriptor,
            Box::new(move |indi| {
                indi.record.birth_date().and_then(date::parse_lenient).map(|d| date::matches_month_day(&d, month, day)).unwrap_or(false)
            }),
        )
    }

    /// Literal match on recorded sex (`"M"` or `"F"`). Any other value is
    /// silently ignored, the same no-op treatment invalid month/day get.
    pub fn by_sex(self, value: &str) -> Self {
        let sex = match value {
            "M" => Sex::Male,
            "F" => Sex::Female,
            _ => return self,
        };
        let descriptor = format!("sex:{value}");
        let result = self.push(descriptor, Box::new(move |indi| indi.record.sex == sex));
        #[cfg(feature = "hybrid")]
        let result = result.mark_indexable(crate::hybrid::IndexablePredicate::Sex(sex));
        result
    }

    /// At least one recorded child.
    pub fn has_children(self) -> Self {
        let graph = self.graph;
        let result = self.push("has_children".into(), Box::new(move |indi| !relationship::children(graph, indi).is_empty()));
        #[cfg(feature = "hybrid")]
        let result = result.mark_indexable(crate::hybrid::IndexablePredicate::HasChildren(true));
        result
    }

    /// At least one recorded spouse.
    pub fn has_spouse(self) -> Self {
        let graph = self.graph;
        let result = self.push("has_spouse".into(), Box::new(move |indi| !relationship::spouses(graph, indi).is_empty()));
        #[cfg(feature = "hybrid")]
        let result = result.mark_indexable(crate::hybrid::IndexablePredicate::HasSpouse(true));
        result
    }

    /// No recorded `DEAT` event — the heuristic this crate uses for
    /// "living" (§3 `IndividualRecord::has_death_event`).
    pub fn is_living(self) -> Self {
        let result = self.push("is_living".into(), Box::new(|indi| !indi.record.has_death_event()));
        #[cfg(feature = "hybrid")]
        let result = result.mark_indexable(crate::hybrid::IndexablePredicate::Living(true));
        result
    }

    /// Add an arbitrary predicate. Chains that use this are never cached,
    /// since an opaque closure has no stable cache-key representation.
    pub fn custom(mut self, predicate: impl Fn(&IndividualNode) -> bool + 'g) -> Self {
        self.cacheable = false;
        self.predicates.push(Box::new(predicate));
        #[cfg(feature = "hybrid")]
        self.indexable.push(None);
        self
    }

    /// Run the pipeline, folding over every Individual node in document
    /// order.
    pub fn execute(self) -> Vec<&'g IndividualNode> {
        if self.cacheable && !self.descriptors.is_empty() {
            let key = cache_key("filter", &self.descriptors.iter().map(String::as_str).collect::<Vec<_>>());
            if let Some(CacheValue::NodeIds(ids)) = self.graph.cache.lock().unwrap().get(&key) {
                return ids.into_iter().filter_map(|id| self.graph.node(id)).filter_map(crate::model::Node::as_individual).collect();
            }
            let results: Vec<&IndividualNode> =
                self.graph.get_all_individuals().map(|(_, n)| n).filter(|n| self.predicates.iter().all(|p| p(n))).collect();
            let ids = results.iter().map(|n| n.id).collect();
            self.graph.cache.lock().unwrap().put(key, CacheValue::NodeIds(ids));
            results
        } else {
            self.graph.get_all_individuals().map(|(_, n)| n).filter(|n| self.predicates.iter().all(|p| p(n))).collect()
        }
    }

    /// Run the pipeline in hybrid mode (§4.4 "Execution"): the first
    /// indexable predicate consults the relational mirror for a candidate id
    /// set, subsequent indexable predicates intersect further candidate
    /// sets, then every remaining predicate (indexable or not) filters the
    /// survivors in memory. Falls back to [`FilterQuery::execute`] when no
    /// hybrid mirror is bound.
    #[cfg(feature = "hybrid")]
    pub async fn execute_hybrid(self) -> crate::error::Result<Vec<&'g IndividualNode>> {
        let Some(hybrid) = self.graph.hybrid() else {
            return Ok(self.execute());
        };

        let mut candidates: Option<std::collections::HashSet<u64>> = None;
        for predicate in self.indexable.iter().flatten() {
            let ids = hybrid.candidate_ids(predicate).await?;
            let ids: std::collections::HashSet<u64> = ids.into_iter().collect();
            candidates = Some(match candidates {
                Some(existing) => existing.intersection(&ids).copied().collect(),
                None => ids,
            });
        }

        let base: Vec<&IndividualNode> = match candidates {
            Some(ids) => ids.into_iter().filter_map(|id| self.graph.individual_by_hybrid_id(id)).collect(),
            None => self.graph.get_all_individuals().map(|(_, n)| n).collect(),
        };

        Ok(base.into_iter().filter(|n| self.predicates.iter().all(|p| p(n))).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuildOptions, Builder};
    use crate::test_fixtures::{family_of_three, single_birth};

    #[test]
    fn name_substring_match() {
        let tree = family_of_three();
        let graph = Builder::new(BuildOptions::default()).build(&tree);
        let results = FilterQuery::new(&graph).by_name("child").execute();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].xref, "@I2@");
    }

    #[test]
    fn invalid_month_is_a_no_op() {
        let tree = single_birth("@I1@", "Dated Person", "15 JAN 1800");
        let graph = Builder::new(BuildOptions::default()).build(&tree);
        let results = FilterQuery::new(&graph).by_birth_month(13).execute();
        assert_eq!(results.len(), 1); // predicate was dropped, so nobody is filtered out
    }

    #[test]
    fn birth_month_and_day_filters() {
        let tree = single_birth("@I1@", "Dated Person", "15 JAN 1800");
        let graph = Builder::new(BuildOptions::default()).build(&tree);
        assert_eq!(FilterQuery::new(&graph).by_birth_month_and_day(1, 15).execute().len(), 1);
        assert_eq!(FilterQuery::new(&graph).by_birth_month_and_day(2, 15).execute().len(), 0);
    }

    #[test]
    fn has_children_and_has_spouse() {
        let tree = family_of_three();
        let graph = Builder::new(BuildOptions::default()).build(&tree);
        let parents: Vec<_> = FilterQuery::new(&graph).has_children().execute().iter().map(|n| n.xref.clone()).collect();
        assert!(parents.contains(&"@I3@".to_string()));
        assert!(parents.contains(&"@I4@".to_string()));
        assert_eq!(FilterQuery::new(&graph).has_spouse().execute().len(), 2);
    }

    #[test]
    fn repeated_chain_hits_cache() {
        let tree = family_of_three();
        let graph = Builder::new(BuildOptions::default()).build(&tree);
        assert!(graph.cache.lock().unwrap().is_empty());
        let first = FilterQuery::new(&graph).by_name("person").execute().len();
        assert!(!graph.cache.lock().unwrap().is_empty());
        let second = FilterQuery::new(&graph).by_name("person").execute().len();
        assert_eq!(first, second);
    }
}
