// Leaderboard ranking and windowing.
//
// The whole guild is re-ranked on every query; there is no maintained index.

use super::level_curve::LevelCurve;
use super::leveling_models::{LeaderboardPage, MemberBalance, RankedEntry};

/// Rows shown per leaderboard page.
pub const WINDOW_SIZE: usize = 15;
/// How many rows above the target member the window starts.
pub const ROWS_ABOVE_TARGET: usize = 5;

/// Sort by balance (highest first). Equal balances fall back to user id so the
/// order is stable between queries.
pub fn rank(mut balances: Vec<MemberBalance>) -> Vec<MemberBalance> {
    balances.sort_by(|a, b| {
        b.balance
            .cmp(&a.balance)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    balances
}

/// First row of the window around the member at zero-indexed `position`.
pub fn window_start(position: usize, total: usize) -> usize {
    let latest_start = total.saturating_sub(WINDOW_SIZE);
    position.saturating_sub(ROWS_ABOVE_TARGET).min(latest_start)
}

/// Slice `ranked` into a page starting at `start`.
pub fn page(ranked: &[MemberBalance], start: usize, curve: &LevelCurve) -> LeaderboardPage {
    let entries = ranked
        .iter()
        .enumerate()
        .skip(start)
        .take(WINDOW_SIZE)
        .map(|(index, member)| RankedEntry {
            rank: index + 1,
            user_id: member.user_id,
            xp: member.balance,
            level: curve.level_for(member.balance),
        })
        .collect();

    LeaderboardPage {
        entries,
        total: ranked.len(),
    }
}
