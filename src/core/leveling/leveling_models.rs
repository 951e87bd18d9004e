// Leveling domain models - the ledger, per-guild settings, rewards, and the
// request/result shapes exchanged with the dispatch layer.
//
// Pure domain types with no Discord dependencies. IDs are plain u64 snowflakes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// LEDGER
// ============================================================================

/// Why a ledger entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpKind {
    /// Zero-amount marker written when the member is first observed.
    Created,
    /// Passive gain from chat activity.
    Earned,
    /// Moderator-directed adjustment (any sign).
    Awarded,
    /// Moderator-directed removal, always non-positive.
    Reclaimed,
}

impl XpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            XpKind::Created => "created",
            XpKind::Earned => "earned",
            XpKind::Awarded => "awarded",
            XpKind::Reclaimed => "reclaimed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created" => Some(XpKind::Created),
            "earned" => Some(XpKind::Earned),
            "awarded" => Some(XpKind::Awarded),
            "reclaimed" => Some(XpKind::Reclaimed),
            _ => None,
        }
    }
}

impl fmt::Display for XpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable row of a member's XP ledger.
///
/// Balances are never stored; they are always the sum of `amount` over a
/// member's entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpHistoryEntry {
    pub id: i64,
    pub user_id: u64,
    pub guild_id: u64,
    pub amount: i64,
    pub kind: XpKind,
    pub earned_at: DateTime<Utc>,
    /// Not-before timestamp for the next passive gain. Only `Earned` entries
    /// push this past `earned_at`.
    pub cooldown_until: DateTime<Utc>,
    pub awarder_id: Option<u64>,
}

/// An entry that has not been assigned an id by the store yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewXpEntry {
    pub user_id: u64,
    pub guild_id: u64,
    pub amount: i64,
    pub kind: XpKind,
    pub earned_at: DateTime<Utc>,
    pub cooldown_until: DateTime<Utc>,
    pub awarder_id: Option<u64>,
}

impl NewXpEntry {
    /// The zero-amount entry every member starts with.
    pub fn created(user_id: u64, guild_id: u64, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            guild_id,
            amount: 0,
            kind: XpKind::Created,
            earned_at: now,
            cooldown_until: now,
            awarder_id: None,
        }
    }

    pub fn earned(
        user_id: u64,
        guild_id: u64,
        amount: i64,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> Self {
        Self {
            user_id,
            guild_id,
            amount,
            kind: XpKind::Earned,
            earned_at: now,
            cooldown_until: now
                .checked_add_signed(cooldown)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            awarder_id: None,
        }
    }

    pub fn awarded(
        user_id: u64,
        guild_id: u64,
        amount: i64,
        awarder_id: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            guild_id,
            amount,
            kind: XpKind::Awarded,
            earned_at: now,
            cooldown_until: now,
            awarder_id: Some(awarder_id),
        }
    }

    /// `taken` is the positive amount removed; the entry stores its negation.
    pub fn reclaimed(
        user_id: u64,
        guild_id: u64,
        taken: i64,
        awarder_id: Option<u64>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            guild_id,
            amount: -taken,
            kind: XpKind::Reclaimed,
            earned_at: now,
            cooldown_until: now,
            awarder_id,
        }
    }

    pub fn with_id(self, id: i64) -> XpHistoryEntry {
        XpHistoryEntry {
            id,
            user_id: self.user_id,
            guild_id: self.guild_id,
            amount: self.amount,
            kind: self.kind,
            earned_at: self.earned_at,
            cooldown_until: self.cooldown_until,
            awarder_id: self.awarder_id,
        }
    }
}

/// A member's aggregate balance, as used for ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberBalance {
    pub user_id: u64,
    pub balance: i64,
}

// ============================================================================
// GUILD CONFIGURATION
// ============================================================================

/// Per-guild leveling configuration, fetched once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct GuildLevelSettings {
    pub guild_id: u64,
    /// Divisor of the quadratic term of the level curve.
    pub base: i64,
    /// Multiplier of the quadratic term of the level curve.
    pub modifier: i64,
    pub amount_per_gain: i64,
    pub cooldown: Duration,
    pub level_log_channel_id: Option<u64>,
    pub mod_log_channel_id: Option<u64>,
    pub module_enabled: bool,
}

impl GuildLevelSettings {
    pub fn default_for(guild_id: u64) -> Self {
        Self {
            guild_id,
            base: 15,
            modifier: 50,
            amount_per_gain: 15,
            cooldown: Duration::minutes(1),
            level_log_channel_id: None,
            mod_log_channel_id: None,
            module_enabled: true,
        }
    }
}

/// A level threshold that unlocks a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub role_id: u64,
    pub guild_id: u64,
    pub reward_level: u32,
    pub message: Option<String>,
}

/// What an ignore row excludes from passive XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreTarget {
    Member { user_id: u64, guild_id: u64 },
    Role(u64),
    Channel(u64),
}

// ============================================================================
// REQUESTS & RESULTS
// ============================================================================

/// A passive gain request built from a chat message.
#[derive(Debug, Clone)]
pub struct GainRequest {
    pub guild_id: u64,
    pub user_id: u64,
    pub channel_id: u64,
    /// Roles held by the author when the message was sent.
    pub role_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GainResult {
    /// `false` means the gain was skipped (ineligible or on cooldown); nothing was written.
    pub success: bool,
    pub previous_level: u32,
    pub current_level: u32,
    pub earned_rewards: Vec<Reward>,
    pub level_log_channel_id: Option<u64>,
    pub mod_log_channel_id: Option<u64>,
}

impl GainResult {
    pub fn skipped() -> Self {
        Self {
            success: false,
            previous_level: 0,
            current_level: 0,
            earned_rewards: Vec::new(),
            level_log_channel_id: None,
            mod_log_channel_id: None,
        }
    }

    pub fn leveled_up(&self) -> bool {
        self.success && self.current_level > self.previous_level
    }
}

#[derive(Debug, Clone)]
pub struct AwardRequest {
    pub guild_id: u64,
    pub user_id: u64,
    pub amount: i64,
    pub awarder_id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AwardResult {
    pub new_balance: i64,
    pub previous_level: u32,
    pub current_level: u32,
    pub earned_rewards: Vec<Reward>,
    pub level_log_channel_id: Option<u64>,
    pub mod_log_channel_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimMode {
    /// Take up to the given amount.
    Amount(u64),
    /// Take the whole balance.
    All,
}

#[derive(Debug, Clone)]
pub struct ReclaimRequest {
    pub guild_id: u64,
    pub user_id: u64,
    pub mode: ReclaimMode,
    pub reclaimer_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReclaimResult {
    pub xp_taken: i64,
    pub new_balance: i64,
    pub mod_log_channel_id: Option<u64>,
}

/// Whether an upsert created a new row or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelInfo {
    pub xp: i64,
    pub level: u32,
    /// XP earned since reaching `level`.
    pub progress_into_level: i64,
    /// Total XP span between `level` and `level + 1`.
    pub xp_for_next_level: i64,
    pub next_reward_role_id: Option<u64>,
    pub next_reward_level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    /// 1-based position on the leaderboard.
    pub rank: usize,
    pub user_id: u64,
    pub xp: i64,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardPage {
    pub entries: Vec<RankedEntry>,
    pub total: usize,
}
