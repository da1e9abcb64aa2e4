use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

use ordered_float::OrderedFloat;
use rand::Rng;
use rand::seq::IteratorRandom;
use serde::{Deserialize, Serialize};

use super::{ElementFilter, SamplePool, SelectionConfig, SelectionMode};
use crate::element::{ElementId, Frame};

/// Dataset split an element belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    #[default]
    Train,
    Test,
}

/// Dataset row as seen by the resolver. Slice order is the deterministic order.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub id: ElementId,
    pub text: String,
    pub context: BTreeMap<String, String>,
    pub split: Split,
    /// Whether the store already holds an annotation for the active scheme.
    pub annotated: bool,
    /// Coordinates in the 2D projection, when one was computed.
    pub position: Option<(f64, f64)>,
    /// Classifier probability per label, empty without a model.
    pub proba: BTreeMap<String, f64>,
}

impl Candidate {
    pub fn new(id: impl Into<ElementId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            context: BTreeMap::new(),
            split: Split::Train,
            annotated: false,
            position: None,
            proba: BTreeMap::new(),
        }
    }

    fn in_pool(&self, pool: SamplePool) -> bool {
        match pool {
            SamplePool::Untagged => self.split == Split::Train && !self.annotated,
            SamplePool::Tagged => self.split == Split::Train && self.annotated,
            SamplePool::Train => self.split == Split::Train,
            SamplePool::Test => self.split == Split::Test,
            SamplePool::All => true,
        }
    }
}

/// State outside the selection config that shapes the pool.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ResolveContext {
    /// Frame currently drawn on the projection, if any.
    pub frame: Option<Frame>,
    pub has_model: bool,
}

/// Pick the next element to present, or `None` when the pool is exhausted.
///
/// Only `rng` is consumed; the random strategy draws afresh on every call.
pub fn resolve_next<R: Rng + ?Sized>(
    config: &SelectionConfig,
    history: &[ElementId],
    candidates: &[Candidate],
    context: ResolveContext,
    rng: &mut R,
) -> Option<ElementId> {
    let seen: HashSet<&ElementId> = history.iter().collect();
    let filter = ElementFilter::parse(config.filter());
    let frame = context.frame.filter(|_| config.frame_selection());
    let pool = candidates.iter().enumerate().filter(|(_, candidate)| {
        candidate.in_pool(config.sample())
            && !seen.contains(&candidate.id)
            && filter.matches(&candidate.text, &candidate.context)
            && frame.is_none_or(|frame| candidate.position.is_some_and(|pos| frame.contains(pos)))
    });

    let picked = match config.effective_mode(context.has_model) {
        SelectionMode::Deterministic => pool.map(|(_, candidate)| candidate).next(),
        SelectionMode::Random => pool.map(|(_, candidate)| candidate).choose(rng),
        SelectionMode::Maxprob => match config.label() {
            Some(label) => pool
                .max_by_key(|(index, candidate)| {
                    (
                        candidate.proba.get(label).copied().map(OrderedFloat),
                        Reverse(*index),
                    )
                })
                .map(|(_, candidate)| candidate),
            None => {
                tracing::debug!("maxprob selection without a label; using dataset order");
                pool.map(|(_, candidate)| candidate).next()
            }
        },
    };
    picked.map(|candidate| candidate.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::SessionHistory;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn scored(id: &str, label: &str, proba: f64) -> Candidate {
        let mut candidate = Candidate::new(id, format!("text {id}"));
        candidate.proba.insert(label.to_string(), proba);
        candidate
    }

    fn history(ids: &[&str]) -> SessionHistory {
        let mut history = SessionHistory::default();
        for id in ids {
            history.append(ElementId::from(*id)).unwrap();
        }
        history
    }

    fn all_pool(mode: SelectionMode) -> SelectionConfig {
        SelectionConfig::new(mode, SamplePool::All)
    }

    fn resolve(
        config: &SelectionConfig,
        history: &SessionHistory,
        candidates: &[Candidate],
        has_model: bool,
    ) -> Option<ElementId> {
        let mut rng = StdRng::seed_from_u64(7);
        let context = ResolveContext {
            frame: None,
            has_model,
        };
        resolve_next(config, history.as_slice(), candidates, context, &mut rng)
    }

    #[test]
    fn deterministic_returns_first_untouched_candidate() {
        let candidates = vec![Candidate::new("a", "x"), Candidate::new("b", "y")];
        let config = all_pool(SelectionMode::Deterministic);
        assert_eq!(
            resolve(&config, &history(&["a"]), &candidates, false),
            Some(ElementId::from("b"))
        );
    }

    #[test]
    fn exhausted_pool_yields_none() {
        let candidates = vec![Candidate::new("a", "x"), Candidate::new("b", "y")];
        for mode in SelectionMode::METHODS {
            let config = all_pool(mode);
            assert_eq!(resolve(&config, &history(&["a", "b"]), &candidates, true), None);
        }
    }

    #[test]
    fn maxprob_picks_highest_probability_and_breaks_ties_by_order() {
        let candidates = vec![
            scored("a", "pos", 0.9),
            scored("b", "pos", 0.95),
            scored("c", "pos", 0.95),
            scored("d", "neg", 0.99),
        ];
        let mut config = all_pool(SelectionMode::Maxprob);
        config.set_label(Some("pos".into()));
        assert_eq!(
            resolve(&config, &SessionHistory::default(), &candidates, true),
            Some(ElementId::from("b"))
        );
        assert_eq!(
            resolve(&config, &history(&["b"]), &candidates, true),
            Some(ElementId::from("c"))
        );
    }

    #[test]
    fn maxprob_ranks_unscored_candidates_last() {
        let candidates = vec![Candidate::new("a", "x"), scored("b", "pos", 0.01)];
        let mut config = all_pool(SelectionMode::Maxprob);
        config.set_label(Some("pos".into()));
        assert_eq!(
            resolve(&config, &SessionHistory::default(), &candidates, true),
            Some(ElementId::from("b"))
        );
    }

    #[test]
    fn maxprob_without_model_falls_back_to_dataset_order() {
        let candidates = vec![scored("a", "pos", 0.1), scored("b", "pos", 0.9)];
        let mut config = all_pool(SelectionMode::Maxprob);
        config.set_label(Some("pos".into()));
        assert_eq!(
            resolve(&config, &SessionHistory::default(), &candidates, false),
            Some(ElementId::from("a"))
        );
    }

    #[test]
    fn random_draws_from_pool_and_varies_between_calls() {
        let candidates: Vec<Candidate> = (0..50)
            .map(|i| Candidate::new(format!("e{i}").as_str(), "t"))
            .collect();
        let config = all_pool(SelectionMode::Random);
        let past = history(&["e0", "e1"]);
        let mut rng = StdRng::seed_from_u64(42);
        let mut picks = HashSet::new();
        for _ in 0..20 {
            let id = resolve_next(
                &config,
                past.as_slice(),
                &candidates,
                ResolveContext::default(),
                &mut rng,
            )
            .unwrap();
            assert!(!past.contains(&id));
            picks.insert(id);
        }
        assert!(picks.len() > 1);
    }

    #[test]
    fn sample_pool_restricts_by_split_and_annotation_state() {
        let mut tagged = Candidate::new("tagged", "t");
        tagged.annotated = true;
        let mut test = Candidate::new("test", "t");
        test.split = Split::Test;
        let candidates = vec![tagged, test, Candidate::new("fresh", "t")];
        let empty = SessionHistory::default();

        let pick = |pool| {
            let config = SelectionConfig::new(SelectionMode::Deterministic, pool);
            resolve(&config, &empty, &candidates, false)
        };
        assert_eq!(pick(SamplePool::Untagged), Some(ElementId::from("fresh")));
        assert_eq!(pick(SamplePool::Tagged), Some(ElementId::from("tagged")));
        assert_eq!(pick(SamplePool::Test), Some(ElementId::from("test")));
        assert_eq!(pick(SamplePool::All), Some(ElementId::from("tagged")));
    }

    #[test]
    fn filter_and_frame_narrow_the_pool() {
        let mut inside = Candidate::new("inside", "about climate");
        inside.position = Some((0.5, 0.5));
        let mut outside = Candidate::new("outside", "about climate");
        outside.position = Some((5.0, 5.0));
        let mut other = Candidate::new("other", "about sport");
        other.position = Some((0.1, 0.1));
        let candidates = vec![outside, other, inside];

        let mut config = all_pool(SelectionMode::Deterministic);
        config.set_filter("climate");
        let mut rng = StdRng::seed_from_u64(1);
        let context = ResolveContext {
            frame: Some(Frame::from_corners((0.0, 0.0), (1.0, 1.0))),
            has_model: false,
        };
        let empty: Vec<ElementId> = Vec::new();
        assert_eq!(
            resolve_next(&config, &empty, &candidates, context, &mut rng),
            Some(ElementId::from("outside"))
        );
        config.set_frame_selection(true);
        assert_eq!(
            resolve_next(&config, &empty, &candidates, context, &mut rng),
            Some(ElementId::from("inside"))
        );
    }
}
