use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

use crate::model::TestResult;
use crate::scoring::calculate_percentage;

//
// ─── USER STATS ────────────────────────────────────────────────────────────────
//

/// Aggregates over all finished tests of a user, as used by achievements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub total_tests: u32,
    pub perfect_tests: u32,
    pub total_questions: u32,
    pub correct_answers: u32,
    /// Rounded percentage over all questions answered.
    pub average_score: u32,
    /// Consecutive practice days ending today or yesterday.
    pub streak: u32,
}

impl UserStats {
    /// Derive stats from stored results, counting the streak relative to `today`.
    #[must_use]
    pub fn from_results(results: &[TestResult], today: NaiveDate) -> Self {
        let mut stats = UserStats::default();
        for result in results {
            stats.total_tests = stats.total_tests.saturating_add(1);
            if result.is_perfect() {
                stats.perfect_tests = stats.perfect_tests.saturating_add(1);
            }
            stats.total_questions = stats
                .total_questions
                .saturating_add(result.total_questions());
            stats.correct_answers = stats.correct_answers.saturating_add(result.score());
        }
        stats.average_score = calculate_percentage(stats.correct_answers, stats.total_questions);
        stats.streak = practice_streak(
            results.iter().map(|r| r.completed_at().date_naive()),
            today,
        );
        stats
    }
}

/// Number of consecutive days with practice, ending at `today` or the day before.
///
/// A streak that was last extended yesterday is still alive; anything older is 0.
#[must_use]
pub fn practice_streak(days: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = days.into_iter().collect();

    let yesterday = today - Duration::days(1);
    let mut cursor = if days.contains(&today) {
        today
    } else if days.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0_u32;
    while days.contains(&cursor) {
        streak = streak.saturating_add(1);
        cursor -= Duration::days(1);
    }
    streak
}

//
// ─── CATALOGUE ─────────────────────────────────────────────────────────────────
//

#[derive(Debug)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    condition: fn(&UserStats) -> bool,
}

impl Achievement {
    #[must_use]
    pub fn is_unlocked(&self, stats: &UserStats) -> bool {
        (self.condition)(stats)
    }
}

pub static ACHIEVEMENTS: [Achievement; 8] = [
    Achievement {
        id: "first_test",
        title: "Første test!",
        description: "Fullført din første test",
        icon: "🎯",
        condition: |s| s.total_tests >= 1,
    },
    Achievement {
        id: "perfect_score",
        title: "Perfekt!",
        description: "Få 100% på en test",
        icon: "⭐",
        condition: |s| s.perfect_tests >= 1,
    },
    Achievement {
        id: "five_tests",
        title: "Øvelse gjør mester",
        description: "Fullført 5 tester",
        icon: "📚",
        condition: |s| s.total_tests >= 5,
    },
    Achievement {
        id: "ten_tests",
        title: "Dedikert student",
        description: "Fullført 10 tester",
        icon: "🏆",
        condition: |s| s.total_tests >= 10,
    },
    Achievement {
        id: "high_average",
        title: "Konsistent høy",
        description: "Oppretthold 90% gjennomsnitt over 5 tester",
        icon: "💎",
        condition: |s| s.total_tests >= 5 && s.average_score >= 90,
    },
    Achievement {
        id: "hundred_questions",
        title: "Kunnskapssøker",
        description: "Besvart 100 spørsmål",
        icon: "🧠",
        condition: |s| s.total_questions >= 100,
    },
    Achievement {
        id: "three_day_streak",
        title: "På rad!",
        description: "3 dager med øving på rad",
        icon: "🔥",
        condition: |s| s.streak >= 3,
    },
    Achievement {
        id: "week_streak",
        title: "Ukens helt",
        description: "7 dager med øving på rad",
        icon: "🌟",
        condition: |s| s.streak >= 7,
    },
];

/// An achievement paired with whether `stats` unlock it.
#[derive(Debug, Clone, Copy)]
pub struct AchievementStatus {
    pub achievement: &'static Achievement,
    pub unlocked: bool,
}

/// Evaluate the whole catalogue against `stats`, in catalogue order.
#[must_use]
pub fn check_achievements(stats: &UserStats) -> Vec<AchievementStatus> {
    ACHIEVEMENTS
        .iter()
        .map(|achievement| AchievementStatus {
            achievement,
            unlocked: achievement.is_unlocked(stats),
        })
        .collect()
}

/// Achievements unlocked by `new` that were still locked under `old`.
#[must_use]
pub fn newly_unlocked(old: &UserStats, new: &UserStats) -> Vec<&'static Achievement> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| a.is_unlocked(new) && !a.is_unlocked(old))
        .collect()
}
