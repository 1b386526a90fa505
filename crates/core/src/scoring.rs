//! Percentages, pass/fail and the human-facing score texts.

/// Minimum percentage needed to pass the theory exam.
pub const PASS_THRESHOLD: u32 = 85;

/// Rounded percentage of `score` out of `total`; 0 when `total` is 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn calculate_percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(score) / f64::from(total) * 100.0).round() as u32
}

#[must_use]
pub fn is_passed(percentage: u32) -> bool {
    percentage >= PASS_THRESHOLD
}

/// Coarse grouping of a percentage, used for colouring results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Excellent,
    Good,
    NeedsWork,
}

impl ScoreBand {
    #[must_use]
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => ScoreBand::Excellent,
            75..=89 => ScoreBand::Good,
            _ => ScoreBand::NeedsWork,
        }
    }

    /// Hex colour used by the result screens.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            ScoreBand::Excellent => "#10b981",
            ScoreBand::Good => "#f59e0b",
            ScoreBand::NeedsWork => "#ef4444",
        }
    }
}

/// Encouragement shown after a test.
#[must_use]
pub fn motivational_message(percentage: u32) -> &'static str {
    match percentage {
        100.. => "Perfekt! Du mestrer stoffet! 🌟",
        90..=99 => "Utmerket! Du er nesten klar for eksamen! 🎯",
        85..=89 => "Bra jobbet! Du har god kontroll! 👏",
        75..=84 => "Godt forsøk! Fortsett å øve! 💪",
        50..=74 => "På rett vei! Ikke gi opp! 📚",
        _ => "Rom for forbedring. Øv mer og prøv igjen! 🚀",
    }
}

/// Formats a test duration as `"{m} min {s} sek"`.
#[must_use]
pub fn format_duration(duration_ms: u64) -> String {
    let minutes = duration_ms / 60_000;
    let seconds = (duration_ms % 60_000) / 1_000;
    format!("{minutes} min {seconds} sek")
}

/// Compact form for accumulated practice time: `2d 3t`, `1t 5m`, `12 min`, `40s`.
#[must_use]
pub fn format_total_time(total_ms: u64) -> String {
    let total_seconds = total_ms / 1_000;
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;

    if days > 0 {
        format!("{days}d {hours}t")
    } else if hours > 0 {
        format!("{hours}t {minutes}m")
    } else if minutes > 0 {
        format!("{minutes} min")
    } else {
        format!("{total_seconds}s")
    }
}

/// Rounded average seconds spent per question; 0 when there were no questions.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn average_seconds_per_question(duration_ms: u64, total_questions: u32) -> u64 {
    if total_questions == 0 {
        return 0;
    }
    (duration_ms as f64 / f64::from(total_questions) / 1_000.0).round() as u64
}
