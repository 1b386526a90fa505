//! Category-balanced question selection that favours never-answered questions.
//!
//! The pool is split into *unseen* and *seen* questions using the user's answer
//! history. Each partition receives its share of the target and spreads it as
//! evenly as possible over its categories; any shortfall is then filled from
//! whatever is left in the pool.

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::model::{
    AnswerRecord, PresetError, QuestionId, QuestionRecord, TestPreset, TestResult,
    validate_unseen_fraction,
};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error(transparent)]
    Preset(#[from] PresetError),

    #[error("question pool contains duplicate id {0}")]
    DuplicateQuestionId(QuestionId),
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// How many questions to pick and which share should be unseen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionConfig {
    pub target_count: usize,
    pub unseen_fraction: f64,
}

impl SelectionConfig {
    #[must_use]
    pub fn new(target_count: usize, unseen_fraction: f64) -> Self {
        Self {
            target_count,
            unseen_fraction,
        }
    }

    /// Number of unseen questions to aim for, given the unseen supply.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn unseen_target(&self, unseen_available: usize) -> usize {
        let wanted = (self.target_count as f64 * self.unseen_fraction).floor() as usize;
        wanted.min(unseen_available)
    }
}

impl From<TestPreset> for SelectionConfig {
    fn from(preset: TestPreset) -> Self {
        Self::new(preset.question_count(), preset.unseen_fraction())
    }
}

//
// ─── HISTORY ───────────────────────────────────────────────────────────────────
//

/// Ids of every question the user has answered at least once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySet(HashSet<QuestionId>);

impl HistorySet {
    #[must_use]
    pub fn from_answers<'a>(answers: impl IntoIterator<Item = &'a AnswerRecord>) -> Self {
        Self(answers.into_iter().map(|a| a.question_id.clone()).collect())
    }

    #[must_use]
    pub fn from_results(results: &[TestResult]) -> Self {
        Self::from_answers(results.iter().flat_map(TestResult::answers))
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.0.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

//
// ─── SELECTION ─────────────────────────────────────────────────────────────────
//

/// Select up to `config.target_count` questions from `pool`.
///
/// `history` is every answer from every past test of the user; it only decides
/// which questions count as seen.
///
/// # Errors
///
/// - `SelectionError::Preset` if `unseen_fraction` is outside `[0, 1]`.
/// - `SelectionError::DuplicateQuestionId` if two pool entries share an id.
pub fn select_questions<R: Rng + ?Sized>(
    rng: &mut R,
    config: &SelectionConfig,
    pool: &[QuestionRecord],
    history: &[AnswerRecord],
) -> Result<Vec<QuestionRecord>, SelectionError> {
    select_with_history(rng, config, pool, &HistorySet::from_answers(history))
}

/// Same as [`select_questions`], deriving history from complete test results.
///
/// # Errors
///
/// See [`select_questions`].
pub fn select_questions_from_results<R: Rng + ?Sized>(
    rng: &mut R,
    config: &SelectionConfig,
    pool: &[QuestionRecord],
    results: &[TestResult],
) -> Result<Vec<QuestionRecord>, SelectionError> {
    select_with_history(rng, config, pool, &HistorySet::from_results(results))
}

/// Selection against a precomputed [`HistorySet`].
///
/// # Errors
///
/// See [`select_questions`].
pub fn select_with_history<R: Rng + ?Sized>(
    rng: &mut R,
    config: &SelectionConfig,
    pool: &[QuestionRecord],
    history: &HistorySet,
) -> Result<Vec<QuestionRecord>, SelectionError> {
    validate_unseen_fraction(config.unseen_fraction)?;
    ensure_unique_ids(pool)?;

    if pool.is_empty() || config.target_count == 0 {
        return Ok(Vec::new());
    }

    let (unseen, seen): (Vec<&QuestionRecord>, Vec<&QuestionRecord>) =
        pool.iter().partition(|q| !history.contains(&q.id));

    let target_unseen = config.unseen_target(unseen.len());
    let target_seen = config.target_count - target_unseen;
    let unseen_total = unseen.len();
    let seen_total = seen.len();

    let mut selected = pick_balanced(rng, group_by_category(unseen), target_unseen);
    let unseen_picked = selected.len();
    selected.extend(pick_balanced(rng, group_by_category(seen), target_seen));
    let balanced_picked = selected.len();

    if selected.len() < config.target_count {
        let used: HashSet<&QuestionId> = selected.iter().copied().map(|q| &q.id).collect();
        let mut remaining: Vec<&QuestionRecord> =
            pool.iter().filter(|q| !used.contains(&q.id)).collect();
        remaining.shuffle(rng);
        let needed = config.target_count - selected.len();
        selected.extend(remaining.into_iter().take(needed));
    }

    selected.shuffle(rng);
    selected.truncate(config.target_count);

    tracing::debug!(
        pool = pool.len(),
        unseen = unseen_total,
        seen = seen_total,
        target = config.target_count,
        target_unseen,
        unseen_picked,
        filled = selected.len().saturating_sub(balanced_picked),
        selected = selected.len(),
        "selected questions"
    );

    Ok(selected.into_iter().cloned().collect())
}

fn ensure_unique_ids(pool: &[QuestionRecord]) -> Result<(), SelectionError> {
    let mut ids = HashSet::with_capacity(pool.len());
    for question in pool {
        if !ids.insert(&question.id) {
            return Err(SelectionError::DuplicateQuestionId(question.id.clone()));
        }
    }
    Ok(())
}

// Ordered by label so a seeded rng reproduces the same selection.
fn group_by_category(questions: Vec<&QuestionRecord>) -> BTreeMap<&str, Vec<&QuestionRecord>> {
    let mut groups: BTreeMap<&str, Vec<&QuestionRecord>> = BTreeMap::new();
    for question in questions {
        groups
            .entry(question.category.as_str())
            .or_default()
            .push(question);
    }
    groups
}

/// Spread `count` picks over the categories; the remainder goes one each to a
/// random subset of categories.
fn pick_balanced<'a, R: Rng + ?Sized>(
    rng: &mut R,
    groups: BTreeMap<&'a str, Vec<&'a QuestionRecord>>,
    count: usize,
) -> Vec<&'a QuestionRecord> {
    if groups.is_empty() || count == 0 {
        return Vec::new();
    }

    let base = count / groups.len();
    let remainder = count % groups.len();

    let mut categories: Vec<Vec<&QuestionRecord>> = groups.into_values().collect();
    categories.shuffle(rng);

    let mut picked = Vec::new();
    for (slot, mut questions) in categories.into_iter().enumerate() {
        let take = base + usize::from(slot < remainder);
        questions.shuffle(rng);
        questions.truncate(take);
        picked.extend(questions);
    }
    picked
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    fn question(id: &str, category: &str) -> QuestionRecord {
        QuestionRecord::new(
            id,
            format!("Prompt {id}"),
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            0,
            category,
        )
        .unwrap()
    }

    fn answered(id: &str) -> AnswerRecord {
        AnswerRecord {
            question_id: QuestionId::new(id),
            selected_index: 0,
            is_correct: true,
            time_spent_ms: 1_000,
        }
    }

    /// `per_category` questions in each of `categories`, ids `c{cat}-{n}`.
    fn pool(categories: usize, per_category: usize) -> Vec<QuestionRecord> {
        (0..categories)
            .flat_map(|c| {
                (0..per_category).map(move |n| question(&format!("c{c}-{n}"), &format!("cat{c}")))
            })
            .collect()
    }

    fn per_category(selected: &[QuestionRecord]) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for q in selected {
            *counts.entry(q.category.clone()).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn empty_pool_returns_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let selected =
            select_questions(&mut rng, &SelectionConfig::new(10, 0.8), &[], &[]).unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn zero_target_returns_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let selected =
            select_questions(&mut rng, &SelectionConfig::new(0, 0.8), &pool(3, 3), &[]).unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn size_is_capped_and_items_are_unique_pool_members() {
        let pool = pool(4, 5);
        let pool_ids: HashSet<&QuestionId> = pool.iter().map(|q| &q.id).collect();
        let history: Vec<AnswerRecord> = ["c0-0", "c1-1", "c2-2", "c3-3", "c3-4"]
            .iter()
            .map(|id| answered(id))
            .collect();

        for (seed, target) in [(1, 1), (2, 7), (3, 20), (4, 45), (5, 13)] {
            let mut rng = StdRng::seed_from_u64(seed);
            let selected =
                select_questions(&mut rng, &SelectionConfig::new(target, 0.8), &pool, &history)
                    .unwrap();

            assert_eq!(selected.len(), target.min(pool.len()));
            let ids: HashSet<&QuestionId> = selected.iter().map(|q| &q.id).collect();
            assert_eq!(ids.len(), selected.len(), "duplicates for target {target}");
            assert!(ids.iter().all(|id| pool_ids.contains(id)));
        }
    }

    #[test]
    fn small_all_unseen_pool_example() {
        let pool = vec![question("q1", "A"), question("q2", "A"), question("q3", "B")];
        let mut rng = StdRng::seed_from_u64(7);
        let selected =
            select_questions(&mut rng, &SelectionConfig::new(2, 0.8), &pool, &[]).unwrap();

        assert_eq!(selected.len(), 2);
        assert_ne!(selected[0].id, selected[1].id);
        assert!(selected.iter().all(|q| pool.contains(q)));
    }

    #[test]
    fn unseen_share_matches_fraction_when_supply_allows() {
        let pool = pool(5, 20);
        // Half of every category has been answered before.
        let history: Vec<AnswerRecord> = pool
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 2 == 0)
            .map(|(_, q)| answered(q.id.as_str()))
            .collect();
        let seen = HistorySet::from_answers(&history);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selected =
                select_questions(&mut rng, &SelectionConfig::new(10, 0.8), &pool, &history)
                    .unwrap();
            let unseen = selected.iter().filter(|q| !seen.contains(&q.id)).count();
            assert_eq!(unseen, 8, "seed {seed}");
            assert_eq!(selected.len(), 10);
        }
    }

    #[test]
    fn unseen_target_is_capped_by_supply() {
        let pool = pool(2, 5);
        let history: Vec<AnswerRecord> = pool
            .iter()
            .filter(|q| q.id.as_str() != "c0-0")
            .map(|q| answered(q.id.as_str()))
            .collect();

        let mut rng = StdRng::seed_from_u64(3);
        let selected =
            select_questions(&mut rng, &SelectionConfig::new(6, 0.8), &pool, &history).unwrap();

        assert_eq!(selected.len(), 6);
        assert!(selected.iter().any(|q| q.id.as_str() == "c0-0"));
    }

    #[test]
    fn categories_stay_balanced_without_history() {
        let pool = pool(4, 10);
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selected =
                select_questions(&mut rng, &SelectionConfig::new(10, 0.8), &pool, &[]).unwrap();
            let counts = per_category(&selected);
            // ceil(10 / 4) + 1
            assert!(counts.values().all(|&n| n <= 4), "seed {seed}: {counts:?}");
            assert_eq!(counts.values().sum::<usize>(), 10);
        }
    }

    #[test]
    fn remainder_is_not_pinned_to_one_category() {
        let pool = pool(3, 10);
        let mut favoured = HashSet::new();
        for seed in 0..60 {
            let mut rng = StdRng::seed_from_u64(seed);
            let config = SelectionConfig::new(4, 1.0);
            let selected = select_questions(&mut rng, &config, &pool, &[]).unwrap();
            for (category, n) in per_category(&selected) {
                if n == 2 {
                    favoured.insert(category);
                }
            }
        }
        assert_eq!(favoured.len(), 3);
    }

    #[test]
    fn shortfall_is_filled_from_remaining_pool() {
        let mut pool = vec![question("lonely", "Sparse")];
        pool.extend((0..20).map(|n| question(&format!("d{n}"), "Dense")));

        let mut rng = StdRng::seed_from_u64(11);
        let selected =
            select_questions(&mut rng, &SelectionConfig::new(10, 1.0), &pool, &[]).unwrap();

        assert_eq!(selected.len(), 10);
        assert!(selected.iter().any(|q| q.id.as_str() == "lonely"));
    }

    #[test]
    fn seen_and_unseen_are_interleaved() {
        let pool = pool(2, 10);
        let history: Vec<AnswerRecord> = pool
            .iter()
            .filter(|q| q.id.as_str().ends_with(['0', '1', '2', '3', '4']))
            .map(|q| answered(q.id.as_str()))
            .collect();
        let seen = HistorySet::from_answers(&history);

        let mut seen_first = false;
        let mut unseen_first = false;
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selected =
                select_questions(&mut rng, &SelectionConfig::new(10, 0.5), &pool, &history)
                    .unwrap();
            if seen.contains(&selected[0].id) {
                seen_first = true;
            } else {
                unseen_first = true;
            }
        }
        assert!(seen_first && unseen_first);
    }

    #[test]
    fn same_seed_same_selection() {
        let pool = pool(3, 8);
        let config = SelectionConfig::new(9, 0.8);
        let a = select_questions(&mut StdRng::seed_from_u64(42), &config, &pool, &[]).unwrap();
        let b = select_questions(&mut StdRng::seed_from_u64(42), &config, &pool, &[]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_invalid_fraction_and_duplicate_ids() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = select_questions(&mut rng, &SelectionConfig::new(5, 1.2), &pool(1, 2), &[])
            .unwrap_err();
        assert!(matches!(err, SelectionError::Preset(_)));

        let dupes = vec![question("q1", "A"), question("q1", "B")];
        let err =
            select_questions(&mut rng, &SelectionConfig::new(1, 0.5), &dupes, &[]).unwrap_err();
        assert_eq!(err, SelectionError::DuplicateQuestionId(QuestionId::new("q1")));
    }

    #[test]
    fn fully_seen_pool_selects_only_from_seen_partition() {
        let pool = pool(3, 4);
        let history: Vec<AnswerRecord> = pool.iter().map(|q| answered(q.id.as_str())).collect();

        for (seed, target) in [(1, 5), (2, 12), (3, 30)] {
            let mut rng = StdRng::seed_from_u64(seed);
            let selected =
                select_questions(&mut rng, &SelectionConfig::new(target, 0.8), &pool, &history)
                    .unwrap();

            assert_eq!(selected.len(), target.min(pool.len()));
            let ids: HashSet<&QuestionId> = selected.iter().map(|q| &q.id).collect();
            assert_eq!(ids.len(), selected.len());
        }
    }

    #[test]
    fn all_unseen_request_with_no_unseen_supply_uses_seen_questions() {
        let pool = pool(2, 5);
        let history: Vec<AnswerRecord> = pool.iter().map(|q| answered(q.id.as_str())).collect();
        let mut rng = StdRng::seed_from_u64(21);

        let selected =
            select_questions(&mut rng, &SelectionConfig::new(6, 1.0), &pool, &history).unwrap();

        assert_eq!(selected.len(), 6);
        let ids: HashSet<&QuestionId> = selected.iter().map(|q| &q.id).collect();
        assert_eq!(ids.len(), 6);
        let counts = per_category(&selected);
        assert_eq!(counts["cat0"], 3);
        assert_eq!(counts["cat1"], 3);
    }

    #[test]
    fn unseen_target_floors_the_fraction() {
        let config = SelectionConfig::new(45, 0.8);
        assert_eq!(config.unseen_target(100), 36);
        assert_eq!(config.unseen_target(10), 10);
        assert_eq!(SelectionConfig::new(3, 0.5).unseen_target(10), 1);
    }
}
