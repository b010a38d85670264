//! Win/loss streak tracking over chronologically ordered net P&L.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakType {
    Win,
    Loss,
    #[default]
    Neutral,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    pub current_streak: usize,
    pub current_streak_type: StreakType,
    pub best_win_streak: usize,
    pub worst_loss_streak: usize,
}

/// Single left-to-right scan.
///
/// A breakeven (exactly 0) ends the running streak and leaves the type
/// neutral; it does not start a streak of its own.
pub fn compute_streaks<I>(pnls: I) -> StreakSummary
where
    I: IntoIterator<Item = f64>,
{
    let mut s = StreakSummary::default();

    for pnl in pnls {
        let outcome = if pnl > 0.0 {
            StreakType::Win
        } else if pnl < 0.0 {
            StreakType::Loss
        } else {
            StreakType::Neutral
        };

        match outcome {
            StreakType::Neutral => {
                s.current_streak = 0;
                s.current_streak_type = StreakType::Neutral;
            }
            kind if kind == s.current_streak_type => s.current_streak += 1,
            kind => {
                s.current_streak = 1;
                s.current_streak_type = kind;
            }
        }

        match s.current_streak_type {
            StreakType::Win => s.best_win_streak = s.best_win_streak.max(s.current_streak),
            StreakType::Loss => s.worst_loss_streak = s.worst_loss_streak.max(s.current_streak),
            StreakType::Neutral => {}
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_sequence() {
        let s = compute_streaks([10.0, 5.0, 0.0, -3.0, -3.0, 1.0]);
        assert_eq!(s.best_win_streak, 2);
        assert_eq!(s.worst_loss_streak, 2);
        assert_eq!(s.current_streak, 1);
        assert_eq!(s.current_streak_type, StreakType::Win);
    }

    #[test]
    fn maxima_are_not_just_final_streak() {
        let s = compute_streaks([1.0, 1.0, 1.0, -1.0, 1.0]);
        assert_eq!(s.best_win_streak, 3);
        assert_eq!(s.worst_loss_streak, 1);
        assert_eq!(s.current_streak, 1);
    }

    #[test]
    fn trailing_breakeven_is_neutral() {
        let s = compute_streaks([-1.0, -2.0, 0.0]);
        assert_eq!(s.current_streak, 0);
        assert_eq!(s.current_streak_type, StreakType::Neutral);
        assert_eq!(s.worst_loss_streak, 2);
    }

    #[test]
    fn breakeven_splits_a_run() {
        // without the 0 this would be a 4-win streak
        let s = compute_streaks([1.0, 1.0, 0.0, 1.0, 1.0]);
        assert_eq!(s.best_win_streak, 2);
    }

    #[test]
    fn empty_is_neutral() {
        assert_eq!(compute_streaks(std::iter::empty()), StreakSummary::default());
    }
}
