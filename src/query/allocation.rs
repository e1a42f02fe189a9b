//! Allocations: complete interpretations of a query.
//!
//! An allocation picks one [`Combination`] per token group. Allocations are
//! enumerated best-first over per-group combinations sorted by weight, so the
//! work is bounded by `max_allocations` rather than by the size of the full
//! Cartesian product.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use ahash::AHashSet;
use indexmap::IndexMap;

use crate::data::DocId;
use crate::engine::config::{Boost, SearchOptions};
use crate::query::combination::Combination;

/// One combination per token group, with a combined score.
#[derive(Debug, Clone)]
pub struct Allocation {
    index: Arc<str>,
    combinations: Vec<Arc<Combination>>,
    score: f64,
}

impl Allocation {
    pub fn new(index: Arc<str>, combinations: Vec<Arc<Combination>>, boosts: &[Boost]) -> Self {
        let mut allocation = Self {
            index,
            combinations,
            score: 0.0,
        };
        allocation.score = allocation.base_score() + allocation.boost(boosts);
        allocation
    }

    fn base_score(&self) -> f64 {
        self.combinations.iter().map(|c| c.weight()).sum()
    }

    fn boost(&self, boosts: &[Boost]) -> f64 {
        boosts
            .iter()
            .filter(|boost| {
                boost.categories.len() == self.combinations.len()
                    && boost
                        .categories
                        .iter()
                        .zip(self.categories())
                        .all(|(boosted, category)| boosted == category)
            })
            .map(|boost| boost.weight)
            .sum()
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn combinations(&self) -> &[Arc<Combination>] {
        &self.combinations
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Category names in token group order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.combinations.iter().map(|c| c.category_name())
    }

    /// Identifiers present in every combination, in the order of the first
    /// combination's list.
    pub fn intersect(&self) -> Vec<DocId> {
        let Some((first, rest)) = self.combinations.split_first() else {
            return Vec::new();
        };
        if rest.is_empty() {
            return first.ids().to_vec();
        }
        if rest.iter().any(|c| c.is_empty()) {
            return Vec::new();
        }

        let sets: Vec<AHashSet<&DocId>> = rest.iter().map(|c| c.ids().iter().collect()).collect();
        first
            .ids()
            .iter()
            .filter(|id| sets.iter().all(|set| set.contains(id)))
            .cloned()
            .collect()
    }
}

/// Heap entry of the best-first enumeration. Higher scores pop first; equal
/// scores pop in ascending pick order.
#[derive(Debug)]
struct Candidate {
    score: f64,
    picks: Vec<usize>,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.picks.cmp(&self.picks))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Best-first walk over the allocations built from `choices`, which lists
/// per group the usable positions in that group's combinations, best first.
/// Yields picks as positions into the groups, highest base score first.
struct BestFirst<'a> {
    groups: &'a [Vec<Arc<Combination>>],
    choices: Vec<Vec<usize>>,
    heap: BinaryHeap<Candidate>,
    visited: AHashSet<Vec<usize>>,
}

impl<'a> BestFirst<'a> {
    fn new(groups: &'a [Vec<Arc<Combination>>], choices: Vec<Vec<usize>>) -> Self {
        let mut walk = Self {
            groups,
            choices,
            heap: BinaryHeap::new(),
            visited: AHashSet::new(),
        };
        if walk.choices.iter().all(|c| !c.is_empty()) {
            walk.push(vec![0; walk.choices.len()]);
        }
        walk
    }

    fn push(&mut self, positions: Vec<usize>) {
        if self.visited.insert(positions.clone()) {
            let score: f64 = positions
                .iter()
                .enumerate()
                .map(|(group, &p)| self.groups[group][self.choices[group][p]].weight())
                .sum();
            self.heap.push(Candidate {
                score,
                picks: positions,
            });
        }
    }
}

impl Iterator for BestFirst<'_> {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let candidate = self.heap.pop()?;
        for group in 0..self.choices.len() {
            if candidate.picks[group] + 1 < self.choices[group].len() {
                let mut next = candidate.picks.clone();
                next[group] += 1;
                self.push(next);
            }
        }
        Some(
            candidate
                .picks
                .iter()
                .enumerate()
                .map(|(group, &p)| self.choices[group][p])
                .collect(),
        )
    }
}

/// Build the ranked allocations of one index.
///
/// `groups` holds, per token group, the non-empty combinations found for it.
/// A group without combinations makes the whole query unsatisfiable for this
/// index unless `ignore_unassigned_tokens` is set, in which case the group is
/// left out.
///
/// Boosts take part in ranking: the category sequences named by a boost are
/// enumerated on their own, the remaining sequences once, each keeping its
/// best `max_allocations`. The union is sorted by boosted score, descending,
/// equal scores in ascending pick order, and cut to `max_allocations`.
pub fn allocate(
    index: &str,
    groups: Vec<Vec<Combination>>,
    options: &SearchOptions,
) -> Vec<Allocation> {
    let mut kept: Vec<Vec<Arc<Combination>>> = Vec::with_capacity(groups.len());
    for group in groups {
        if group.is_empty() {
            if options.ignore_unassigned_tokens {
                continue;
            }
            return Vec::new();
        }
        let mut group: Vec<Arc<Combination>> = group.into_iter().map(Arc::new).collect();
        group.sort_by(|a, b| b.weight().total_cmp(&a.weight()));
        kept.push(group);
    }
    if kept.is_empty() {
        return Vec::new();
    }

    // boost weight per boosted category sequence of this query's length
    let mut boosted: IndexMap<&[String], f64> = IndexMap::new();
    for boost in options.boosts.iter().filter(|b| b.categories.len() == kept.len()) {
        *boosted.entry(boost.categories.as_slice()).or_insert(0.0) += boost.weight;
    }
    let is_boosted = |picks: &[usize]| -> bool {
        boosted.keys().any(|categories| {
            categories
                .iter()
                .zip(picks.iter().zip(&kept))
                .all(|(category, (&pick, group))| {
                    group[pick].category_name() == category.as_str()
                })
        })
    };

    let limit = options.max_allocations;
    let everything: Vec<Vec<usize>> = kept
        .iter()
        .map(|group| (0..group.len()).collect())
        .collect();
    let mut picked: Vec<Vec<usize>> = BestFirst::new(&kept, everything)
        .filter(|picks| !is_boosted(picks.as_slice()))
        .take(limit)
        .collect();
    for categories in boosted.keys() {
        let choices: Vec<Vec<usize>> = kept
            .iter()
            .zip(categories.iter())
            .map(|(group, category)| {
                (0..group.len())
                    .filter(|&i| group[i].category_name() == category.as_str())
                    .collect()
            })
            .collect();
        picked.extend(BestFirst::new(&kept, choices).take(limit));
    }

    let index: Arc<str> = Arc::from(index);
    let mut ranked: Vec<(Allocation, Vec<usize>)> = picked
        .into_iter()
        .map(|picks| {
            let combinations = picks
                .iter()
                .zip(&kept)
                .map(|(&pick, group)| Arc::clone(&group[pick]))
                .collect();
            let allocation = Allocation::new(Arc::clone(&index), combinations, &options.boosts);
            (allocation, picks)
        })
        .collect();
    ranked.sort_by(|(a, a_picks), (b, b_picks)| {
        b.score().total_cmp(&a.score()).then_with(|| a_picks.cmp(b_picks))
    });
    ranked.truncate(limit);
    ranked.into_iter().map(|(allocation, _)| allocation).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Tokenizer;
    use crate::backend::MemoryBackend;
    use crate::category::{Category, IndexedCategory};
    use crate::data::{KeyFormat, Record};
    use crate::engine::config::CategoryConfig;
    use crate::generator::WeightStrategy;
    use crate::query::token::Token;
    use crate::source::MemorySource;

    fn category(name: &str, weight: f64, records: Vec<Record>) -> Arc<IndexedCategory> {
        let category = Category::new(
            "books",
            CategoryConfig::new(name).weights(WeightStrategy::Constant { weight }),
            Arc::new(MemoryBackend::new()),
        )
        .unwrap();
        category
            .index(
                &MemorySource::new(records),
                &Tokenizer::default(),
                KeyFormat::Integer,
            )
            .unwrap();
        category.snapshot().unwrap()
    }

    fn combination(text: &str, category: &Arc<IndexedCategory>) -> Combination {
        Combination::resolve(Token::exact(text), Arc::clone(category))
    }

    fn fixtures() -> (Arc<IndexedCategory>, Arc<IndexedCategory>) {
        let title = category(
            "title",
            2.0,
            vec![
                Record::new(1).field("title", "hobbit"),
                Record::new(2).field("title", "hobbit"),
                Record::new(3).field("title", "hobbit tolkien"),
            ],
        );
        let author = category(
            "author",
            1.0,
            vec![
                Record::new(2).field("author", "tolkien"),
                Record::new(3).field("author", "tolkien"),
                Record::new(4).field("author", "tolkien"),
            ],
        );
        (title, author)
    }

    #[test]
    fn test_intersection_keeps_first_order() {
        let (title, author) = fixtures();
        let allocations = allocate(
            "books",
            vec![
                vec![combination("hobbit", &title)],
                vec![combination("tolkien", &author)],
            ],
            &SearchOptions::default(),
        );
        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].intersect(), vec![DocId::Int(2), DocId::Int(3)]);
        assert_eq!(allocations[0].score(), 3.0);
    }

    #[test]
    fn test_ranked_by_score() {
        let (title, author) = fixtures();
        let allocations = allocate(
            "books",
            vec![
                vec![combination("hobbit", &title)],
                vec![combination("tolkien", &author), combination("tolkien", &title)],
            ],
            &SearchOptions::default(),
        );
        let categories: Vec<Vec<&str>> = allocations
            .iter()
            .map(|a| a.categories().collect())
            .collect();
        assert_eq!(
            categories,
            vec![vec!["title", "title"], vec!["title", "author"]]
        );
        assert_eq!(allocations[0].intersect(), vec![DocId::Int(3)]);
    }

    #[test]
    fn test_boost_reorders() {
        let (title, author) = fixtures();
        let options = SearchOptions::default().boost(["title", "author"], 5.0);
        let allocations = allocate(
            "books",
            vec![
                vec![combination("hobbit", &title)],
                vec![combination("tolkien", &title), combination("tolkien", &author)],
            ],
            &options,
        );
        assert_eq!(allocations[0].categories().collect::<Vec<_>>(), vec!["title", "author"]);
        assert_eq!(allocations[0].score(), 8.0);
    }

    #[test]
    fn test_boost_survives_max_allocations() {
        let (title, author) = fixtures();
        let group = || vec![vec![combination("tolkien", &title), combination("tolkien", &author)]];

        let unboosted = allocate("books", group(), &SearchOptions::default().max_allocations(1));
        assert_eq!(unboosted[0].categories().collect::<Vec<_>>(), vec!["title"]);

        let options = SearchOptions::default()
            .max_allocations(1)
            .boost(["author"], 10.0);
        let allocations = allocate("books", group(), &options);
        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].categories().collect::<Vec<_>>(), vec!["author"]);
        assert_eq!(allocations[0].score(), 11.0);
        assert_eq!(
            allocations[0].intersect(),
            vec![DocId::Int(2), DocId::Int(3), DocId::Int(4)]
        );
    }

    #[test]
    fn test_negative_boost_lets_others_through() {
        let (title, author) = fixtures();
        let options = SearchOptions::default()
            .max_allocations(1)
            .boost(["title"], -5.0);
        let allocations = allocate(
            "books",
            vec![vec![combination("tolkien", &title), combination("tolkien", &author)]],
            &options,
        );
        assert_eq!(allocations[0].categories().collect::<Vec<_>>(), vec!["author"]);
        assert_eq!(allocations[0].score(), 1.0);
    }

    #[test]
    fn test_equal_scores_keep_pick_order() {
        let (title, _) = fixtures();
        let other = category(
            "subtitle",
            2.0,
            vec![Record::new(8).field("subtitle", "tolkien")],
        );
        let options = SearchOptions::default().boost(["subtitle"], 0.0);
        for _ in 0..3 {
            let allocations = allocate(
                "books",
                vec![vec![combination("tolkien", &title), combination("tolkien", &other)]],
                &options,
            );
            let categories: Vec<&str> = allocations.iter().flat_map(|a| a.categories()).collect();
            assert_eq!(categories, vec!["title", "subtitle"]);
        }
    }

    #[test]
    fn test_unassigned_group() {
        let (title, _) = fixtures();
        let groups = || vec![vec![combination("hobbit", &title)], Vec::new()];

        assert!(allocate("books", groups(), &SearchOptions::default()).is_empty());

        let options = SearchOptions::default().ignore_unassigned_tokens(true);
        let allocations = allocate("books", groups(), &options);
        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].combinations().len(), 1);
    }

    #[test]
    fn test_max_allocations_caps_enumeration() {
        let (title, author) = fixtures();
        let group = || {
            vec![
                combination("hobbit", &title),
                combination("tolkien", &title),
                combination("tolkien", &author),
            ]
        };
        let options = SearchOptions::default().max_allocations(4);
        let allocations = allocate("books", vec![group(), group(), group()], &options);
        assert_eq!(allocations.len(), 4);
        let scores: Vec<f64> = allocations.iter().map(Allocation::score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }
}
