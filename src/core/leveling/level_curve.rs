// The level curve: cumulative XP <-> level conversions.
//
// Levels are never persisted. They are recomputed from the ledger balance
// with the guild's (base, modifier) pair every time they are needed.

use super::leveling_models::GuildLevelSettings;

/// Guild-parameterized level curve.
///
/// **Formula:** `xp_needed(n) = n + floor(modifier * n² / base)`.
/// The linear term keeps the curve strictly increasing even when
/// `modifier / base` is tiny, so every level is reachable and
/// `level_for(xp_needed(n)) == n` holds for every `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCurve {
    base: i64,
    modifier: i64,
}

impl LevelCurve {
    pub fn new(base: i64, modifier: i64) -> Self {
        Self {
            base: base.max(1),
            modifier: modifier.max(0),
        }
    }

    pub fn from_settings(settings: &GuildLevelSettings) -> Self {
        Self::new(settings.base, settings.modifier)
    }

    /// Cumulative XP required to reach `level`. Saturates at `i64::MAX`.
    pub fn xp_needed(&self, level: u32) -> i64 {
        let n = level as i128;
        let quadratic = (self.modifier as i128) * n * n / (self.base as i128);
        (n + quadratic).min(i64::MAX as i128) as i64
    }

    /// Largest level whose requirement is covered by `xp`. Negative balances are level 0.
    pub fn level_for(&self, xp: i64) -> u32 {
        if xp <= 0 {
            return 0;
        }

        // xp_needed(n) >= n, so the answer never exceeds xp.
        let mut low: u32 = 0;
        let mut high: u32 = xp.min(u32::MAX as i64) as u32;
        while low < high {
            let mid = low + (high - low + 1) / 2;
            if self.xp_needed(mid) <= xp {
                low = mid;
            } else {
                high = mid - 1;
            }
        }
        low
    }

    /// (XP earned inside the current level, XP span of the current level).
    pub fn progress(&self, xp: i64) -> (i64, i64) {
        let level = self.level_for(xp);
        let floor = self.xp_needed(level);
        let ceiling = self.xp_needed(level.saturating_add(1));
        (xp.max(0) - floor, ceiling - floor)
    }
}
