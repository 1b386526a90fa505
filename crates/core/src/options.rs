//! Trims answer options down to the correct answer plus up to three distractors.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{QuestionError, QuestionRecord};

/// Maximum number of options shown for a single question.
pub const MAX_OPTIONS: usize = 4;

/// Return a copy of `question` with at most [`MAX_OPTIONS`] shuffled options.
///
/// The correct option is carried through both shuffles by its original
/// position, so duplicate option texts never move the correct index onto a
/// distractor.
///
/// # Errors
///
/// Returns `QuestionError` if the question has no options or its correct index
/// is out of range.
pub fn reduce_options<R: Rng + ?Sized>(
    rng: &mut R,
    question: &QuestionRecord,
) -> Result<QuestionRecord, QuestionError> {
    question.validate()?;

    let correct = question.correct_index;
    let mut distractors: Vec<usize> = (0..question.options.len())
        .filter(|&i| i != correct)
        .collect();
    distractors.shuffle(rng);
    distractors.truncate(MAX_OPTIONS - 1);

    let mut positions = Vec::with_capacity(distractors.len() + 1);
    positions.push(correct);
    positions.extend(distractors);
    positions.shuffle(rng);

    let correct_index = positions
        .iter()
        .position(|&i| i == correct)
        .ok_or_else(|| QuestionError::CorrectIndexOutOfRange {
            id: question.id.clone(),
            index: correct,
            len: question.options.len(),
        })?;

    let options = positions
        .into_iter()
        .map(|i| question.options[i].clone())
        .collect::<Vec<_>>();

    tracing::trace!(
        id = %question.id,
        from = question.options.len(),
        to = options.len(),
        correct_index,
        "reduced options"
    );

    Ok(QuestionRecord {
        options,
        correct_index,
        ..question.clone()
    })
}

/// Apply [`reduce_options`] to every question, keeping order and count.
///
/// # Errors
///
/// Returns the first `QuestionError` encountered.
pub fn reduce_options_for_all<R: Rng + ?Sized>(
    rng: &mut R,
    questions: &[QuestionRecord],
) -> Result<Vec<QuestionRecord>, QuestionError> {
    questions
        .iter()
        .map(|question| reduce_options(rng, question))
        .collect()
}
