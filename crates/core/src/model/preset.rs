use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum PresetError {
    #[error("question count must be > 0")]
    InvalidQuestionCount,

    #[error("unseen fraction must be in [0, 1], got {0}")]
    InvalidUnseenFraction(f64),
}

//
// ─── PRESET ────────────────────────────────────────────────────────────────────
//

/// Size and freshness settings for building a practice test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestPreset {
    question_count: usize,
    unseen_fraction: f64,
}

impl TestPreset {
    /// Default share of never-answered questions in a test.
    pub const DEFAULT_UNSEEN_FRACTION: f64 = 0.8;

    /// Short warm-up test: 10 questions, 80% unseen.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            question_count: 10,
            unseen_fraction: Self::DEFAULT_UNSEEN_FRACTION,
        }
    }

    /// Exam-length test: 45 questions, 80% unseen.
    #[must_use]
    pub fn full() -> Self {
        Self {
            question_count: 45,
            unseen_fraction: Self::DEFAULT_UNSEEN_FRACTION,
        }
    }

    /// Creates a custom preset.
    ///
    /// # Errors
    ///
    /// Returns `PresetError` if the count is zero or the fraction is outside `[0, 1]`.
    pub fn new(question_count: usize, unseen_fraction: f64) -> Result<Self, PresetError> {
        if question_count == 0 {
            return Err(PresetError::InvalidQuestionCount);
        }
        validate_unseen_fraction(unseen_fraction)?;
        Ok(Self {
            question_count,
            unseen_fraction,
        })
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    #[must_use]
    pub fn unseen_fraction(&self) -> f64 {
        self.unseen_fraction
    }
}

impl Default for TestPreset {
    fn default() -> Self {
        Self::quick()
    }
}

/// Checks that `fraction` is a finite value within `[0, 1]`.
///
/// # Errors
///
/// Returns `PresetError::InvalidUnseenFraction` otherwise.
pub fn validate_unseen_fraction(fraction: f64) -> Result<(), PresetError> {
    if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
        return Err(PresetError::InvalidUnseenFraction(fraction));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_presets() {
        assert_eq!(TestPreset::quick().question_count(), 10);
        assert_eq!(TestPreset::full().question_count(), 45);
        assert!((TestPreset::full().unseen_fraction() - 0.8).abs() < f64::EPSILON);
        assert_eq!(TestPreset::default(), TestPreset::quick());
    }

    #[test]
    fn custom_preset_is_validated() {
        assert_eq!(
            TestPreset::new(0, 0.5).unwrap_err(),
            PresetError::InvalidQuestionCount
        );
        assert!(matches!(
            TestPreset::new(5, 1.5).unwrap_err(),
            PresetError::InvalidUnseenFraction(_)
        ));
        assert!(TestPreset::new(5, f64::NAN).is_err());
        assert!(TestPreset::new(5, 0.0).is_ok());
        assert!(TestPreset::new(5, 1.0).is_ok());
    }
}
