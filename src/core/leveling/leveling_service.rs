// This is the leveling module - it contains ALL the business logic for the leveling system.
// Like the rest of core, there is NO Discord-specific code here (no serenity, no poise imports).
// Requests come in as plain structs built by the Discord layer, and results carry
// everything that layer needs (log channels, earned rewards) to perform role grants
// and announcements itself.

use super::eligibility::check_eligibility;
use super::leaderboard;
use super::level_curve::LevelCurve;
use super::leveling_models::{
    AwardRequest, AwardResult, GainRequest, GainResult, GuildLevelSettings, IgnoreTarget,
    LeaderboardPage, LevelInfo, MemberBalance, NewXpEntry, ReclaimMode, ReclaimRequest,
    ReclaimResult, Reward, Upsert, XpHistoryEntry,
};
use super::rewards;
use super::settings::LevelSetting;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================
// Domain errors carry the message shown to whoever ran the command.
// StorageError is infrastructure: it is never retried here and never shown verbatim.

#[derive(Debug, Error)]
pub enum LevelingError {
    #[error("<@!{0}> was not found. Have they been on the server before?")]
    MemberNotFound(u64),

    #[error("<@&{0}> is not a level reward.")]
    RewardNotFound(u64),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("<@!{0}> is not on the leaderboard yet.")]
    MemberNotOnLeaderboard(u64),

    #[error("Invalid user or guild ID")]
    InvalidId,

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl LevelingError {
    /// Anticipated errors whose message is meant for the invoking user.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, LevelingError::StorageError(_))
    }
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Persistence for the XP ledger and everything around it.
///
/// Implementations must make each write atomic: `create_member` writes the
/// member row and its `Created` entry together, and `append_entry` either
/// lands completely or not at all. Entries are never updated or deleted.
#[async_trait]
pub trait LevelStore: Send + Sync {
    /// Guild settings, or the defaults when the guild has never changed them.
    async fn get_settings(&self, guild_id: u64) -> Result<GuildLevelSettings, LevelingError>;

    async fn save_settings(&self, settings: &GuildLevelSettings) -> Result<(), LevelingError>;

    async fn member_exists(&self, user_id: u64, guild_id: u64) -> Result<bool, LevelingError>;

    /// Create the member with its zero-amount `Created` entry.
    /// Returns `false` when the member already existed.
    async fn create_member(
        &self,
        user_id: u64,
        guild_id: u64,
        now: DateTime<Utc>,
    ) -> Result<bool, LevelingError>;

    /// Sum of all ledger entries. 0 for unknown members.
    async fn balance(&self, user_id: u64, guild_id: u64) -> Result<i64, LevelingError>;

    /// `cooldown_until` of the member's most recent `Earned` entry.
    async fn latest_cooldown(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Option<DateTime<Utc>>, LevelingError>;

    async fn append_entry(&self, entry: NewXpEntry) -> Result<XpHistoryEntry, LevelingError>;

    /// Most recent entries first.
    async fn history(
        &self,
        user_id: u64,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<XpHistoryEntry>, LevelingError>;

    /// Every member of the guild with their balance, in no particular order.
    async fn guild_balances(&self, guild_id: u64) -> Result<Vec<MemberBalance>, LevelingError>;

    async fn is_member_ignored(&self, user_id: u64, guild_id: u64)
        -> Result<bool, LevelingError>;

    async fn any_role_ignored(&self, role_ids: &[u64]) -> Result<bool, LevelingError>;

    async fn is_channel_ignored(&self, channel_id: u64) -> Result<bool, LevelingError>;

    /// Add (`ignored = true`) or remove an ignore row. Idempotent.
    async fn set_ignored(&self, target: IgnoreTarget, ignored: bool)
        -> Result<(), LevelingError>;

    async fn rewards(&self, guild_id: u64) -> Result<Vec<Reward>, LevelingError>;

    /// Insert or overwrite by role id.
    async fn upsert_reward(&self, reward: Reward) -> Result<Upsert, LevelingError>;

    /// Returns `false` when no reward existed for the role.
    async fn delete_reward(&self, role_id: u64) -> Result<bool, LevelingError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// The main service for leveling operations.
///
/// Stateless apart from the injected store: every call reads what it needs,
/// appends at most one ledger entry, and returns.
pub struct LevelingService<S: LevelStore> {
    store: S,
}

impl<S: LevelStore> LevelingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn validate_ids(user_id: u64, guild_id: u64) -> Result<(), LevelingError> {
        if user_id == 0 || guild_id == 0 {
            Err(LevelingError::InvalidId)
        } else {
            Ok(())
        }
    }

    fn validate_guild_id(guild_id: u64) -> Result<(), LevelingError> {
        if guild_id == 0 {
            Err(LevelingError::InvalidId)
        } else {
            Ok(())
        }
    }

    async fn require_member(&self, user_id: u64, guild_id: u64) -> Result<(), LevelingError> {
        if self.store.member_exists(user_id, guild_id).await? {
            Ok(())
        } else {
            Err(LevelingError::MemberNotFound(user_id))
        }
    }

    pub async fn settings(&self, guild_id: u64) -> Result<GuildLevelSettings, LevelingError> {
        Self::validate_guild_id(guild_id)?;
        self.store.get_settings(guild_id).await
    }

    /// Record that a user was seen in a guild. Returns `true` if this created the member.
    pub async fn observe_member(&self, guild_id: u64, user_id: u64) -> Result<bool, LevelingError> {
        Self::validate_ids(user_id, guild_id)?;

        let created = self
            .store
            .create_member(user_id, guild_id, Utc::now())
            .await?;
        if created {
            tracing::debug!(user_id, guild_id, "Member observed for the first time");
        }
        Ok(created)
    }

    /// Passive XP from chat activity.
    ///
    /// **Returns:**
    /// - `success = false` when the module is off, the member/role/channel is
    ///   ignored, or the member is on cooldown. Nothing is written.
    /// - otherwise the levels before and after the gain and every reward the
    ///   new level has earned.
    pub async fn gain(&self, request: GainRequest) -> Result<GainResult, LevelingError> {
        Self::validate_ids(request.user_id, request.guild_id)?;
        let (user_id, guild_id) = (request.user_id, request.guild_id);

        let now = Utc::now();
        let settings = self.store.get_settings(guild_id).await?;

        let eligibility = check_eligibility(&self.store, &settings, &request, now).await?;
        if !eligibility.is_eligible() {
            tracing::debug!(user_id, guild_id, ?eligibility, "Skipping XP gain");
            return Ok(GainResult::skipped());
        }

        self.store.create_member(user_id, guild_id, now).await?;

        let curve = LevelCurve::from_settings(&settings);
        let balance_before = self.store.balance(user_id, guild_id).await?;

        self.store
            .append_entry(NewXpEntry::earned(
                user_id,
                guild_id,
                settings.amount_per_gain,
                now,
                settings.cooldown,
            ))
            .await?;

        let balance_after = balance_before.saturating_add(settings.amount_per_gain);
        let previous_level = curve.level_for(balance_before);
        let current_level = curve.level_for(balance_after);

        let guild_rewards = self.store.rewards(guild_id).await?;

        if current_level > previous_level {
            tracing::info!(
                user_id,
                guild_id,
                previous_level,
                current_level,
                total_xp = balance_after,
                "User leveled up"
            );
        }

        Ok(GainResult {
            success: true,
            previous_level,
            current_level,
            earned_rewards: rewards::earned_rewards(current_level, &guild_rewards),
            level_log_channel_id: settings.level_log_channel_id,
            mod_log_channel_id: settings.mod_log_channel_id,
        })
    }

    /// Moderator-directed XP change. Skips the eligibility filter and the cooldown.
    pub async fn award(&self, request: AwardRequest) -> Result<AwardResult, LevelingError> {
        Self::validate_ids(request.user_id, request.guild_id)?;
        let (user_id, guild_id) = (request.user_id, request.guild_id);
        self.require_member(user_id, guild_id).await?;

        let settings = self.store.get_settings(guild_id).await?;
        let curve = LevelCurve::from_settings(&settings);

        let balance_before = self.store.balance(user_id, guild_id).await?;
        self.store
            .append_entry(NewXpEntry::awarded(
                user_id,
                guild_id,
                request.amount,
                request.awarder_id,
                Utc::now(),
            ))
            .await?;
        let new_balance = balance_before.saturating_add(request.amount);

        tracing::info!(
            user_id,
            guild_id,
            amount = request.amount,
            awarder_id = request.awarder_id,
            new_balance,
            "XP awarded"
        );

        let current_level = curve.level_for(new_balance);
        let guild_rewards = self.store.rewards(guild_id).await?;

        Ok(AwardResult {
            new_balance,
            previous_level: curve.level_for(balance_before),
            current_level,
            earned_rewards: rewards::earned_rewards(current_level, &guild_rewards),
            level_log_channel_id: settings.level_log_channel_id,
            mod_log_channel_id: settings.mod_log_channel_id,
        })
    }

    /// Take XP back. Never takes more than the member has, so the balance
    /// cannot be pushed below zero.
    pub async fn reclaim(&self, request: ReclaimRequest) -> Result<ReclaimResult, LevelingError> {
        Self::validate_ids(request.user_id, request.guild_id)?;
        let (user_id, guild_id) = (request.user_id, request.guild_id);
        self.require_member(user_id, guild_id).await?;

        let settings = self.store.get_settings(guild_id).await?;
        let balance = self.store.balance(user_id, guild_id).await?;
        let available = balance.max(0);

        let xp_taken = match request.mode {
            ReclaimMode::Amount(requested) => available.min(requested.min(i64::MAX as u64) as i64),
            ReclaimMode::All => available,
        };

        if xp_taken > 0 {
            self.store
                .append_entry(NewXpEntry::reclaimed(
                    user_id,
                    guild_id,
                    xp_taken,
                    request.reclaimer_id,
                    Utc::now(),
                ))
                .await?;

            tracing::info!(user_id, guild_id, xp_taken, "XP reclaimed");
        }

        Ok(ReclaimResult {
            xp_taken,
            new_balance: balance - xp_taken,
            mod_log_channel_id: settings.mod_log_channel_id,
        })
    }

    /// Apply one settings change and return the updated settings.
    pub async fn set_setting(
        &self,
        guild_id: u64,
        setting: LevelSetting,
    ) -> Result<GuildLevelSettings, LevelingError> {
        Self::validate_guild_id(guild_id)?;
        setting.validate()?;

        let mut settings = self.store.get_settings(guild_id).await?;
        setting.apply(&mut settings);
        self.store.save_settings(&settings).await?;

        tracing::info!(guild_id, ?setting, "Leveling setting updated");
        Ok(settings)
    }

    pub async fn set_ignored(
        &self,
        target: IgnoreTarget,
        ignored: bool,
    ) -> Result<(), LevelingError> {
        self.store.set_ignored(target, ignored).await
    }

    pub async fn add_reward(
        &self,
        guild_id: u64,
        role_id: u64,
        level: u32,
        message: Option<String>,
    ) -> Result<Upsert, LevelingError> {
        Self::validate_guild_id(guild_id)?;
        if level == 0 {
            return Err(LevelingError::InvalidSetting(
                "reward level must be at least 1".to_string(),
            ));
        }

        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        self.store
            .upsert_reward(Reward {
                role_id,
                guild_id,
                reward_level: level,
                message,
            })
            .await
    }

    pub async fn remove_reward(&self, role_id: u64) -> Result<(), LevelingError> {
        if self.store.delete_reward(role_id).await? {
            Ok(())
        } else {
            Err(LevelingError::RewardNotFound(role_id))
        }
    }

    pub async fn list_rewards(&self, guild_id: u64) -> Result<Vec<Reward>, LevelingError> {
        Self::validate_guild_id(guild_id)?;
        let mut guild_rewards = self.store.rewards(guild_id).await?;
        rewards::sort_rewards(&mut guild_rewards);
        Ok(guild_rewards)
    }

    /// XP, level, progress and the next reward for one member.
    pub async fn level_info(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<LevelInfo, LevelingError> {
        Self::validate_ids(user_id, guild_id)?;
        self.require_member(user_id, guild_id).await?;

        let settings = self.store.get_settings(guild_id).await?;
        let curve = LevelCurve::from_settings(&settings);
        let xp = self.store.balance(user_id, guild_id).await?;
        let level = curve.level_for(xp);
        let (progress_into_level, xp_for_next_level) = curve.progress(xp);

        let guild_rewards = self.store.rewards(guild_id).await?;
        let next = rewards::next_reward(level, &guild_rewards);

        Ok(LevelInfo {
            xp,
            level,
            progress_into_level,
            xp_for_next_level,
            next_reward_role_id: next.map(|r| r.role_id),
            next_reward_level: next.map(|r| r.reward_level),
        })
    }

    /// The top of the leaderboard, or the window around `target` if given.
    pub async fn leaderboard(
        &self,
        guild_id: u64,
        target: Option<u64>,
    ) -> Result<LeaderboardPage, LevelingError> {
        Self::validate_guild_id(guild_id)?;

        let settings = self.store.get_settings(guild_id).await?;
        let curve = LevelCurve::from_settings(&settings);
        let ranked = leaderboard::rank(self.store.guild_balances(guild_id).await?);

        let start = match target {
            None => 0,
            Some(user_id) => {
                let position = ranked
                    .iter()
                    .position(|member| member.user_id == user_id)
                    .ok_or(LevelingError::MemberNotOnLeaderboard(user_id))?;
                leaderboard::window_start(position, ranked.len())
            }
        };

        Ok(leaderboard::page(&ranked, start, &curve))
    }

    /// Most recent ledger entries for a member, newest first.
    pub async fn history(
        &self,
        guild_id: u64,
        user_id: u64,
        limit: usize,
    ) -> Result<Vec<XpHistoryEntry>, LevelingError> {
        Self::validate_ids(user_id, guild_id)?;
        self.require_member(user_id, guild_id).await?;
        self.store.history(user_id, guild_id, limit).await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::leveling::{SettingField, XpKind};
    use crate::infra::leveling::InMemoryLevelStore;
    use chrono::Duration;

    const GUILD: u64 = 456;
    const USER: u64 = 123;

    fn make_service() -> LevelingService<InMemoryLevelStore> {
        LevelingService::new(InMemoryLevelStore::new())
    }

    fn gain_request(user_id: u64) -> GainRequest {
        GainRequest {
            guild_id: GUILD,
            user_id,
            channel_id: 789,
            role_ids: vec![],
        }
    }

    /// Member with `amount` XP whose cooldown has already elapsed.
    async fn seed_member(service: &LevelingService<InMemoryLevelStore>, user_id: u64, amount: i64) {
        let earlier = Utc::now() - Duration::minutes(10);
        service
            .store
            .create_member(user_id, GUILD, earlier)
            .await
            .unwrap();
        service
            .store
            .append_entry(NewXpEntry::earned(
                user_id,
                GUILD,
                amount,
                earlier,
                Duration::minutes(1),
            ))
            .await
            .unwrap();
    }

    async fn ledger_sum(service: &LevelingService<InMemoryLevelStore>, user_id: u64) -> i64 {
        service
            .store
            .history(user_id, GUILD, usize::MAX)
            .await
            .unwrap()
            .iter()
            .map(|e| e.amount)
            .sum()
    }

    #[tokio::test]
    async fn gain_crosses_level_and_earns_rewards() {
        let service = make_service();
        seed_member(&service, USER, 20).await;
        service.add_reward(GUILD, 1, 1, None).await.unwrap();
        service.add_reward(GUILD, 2, 3, None).await.unwrap();
        service.add_reward(GUILD, 3, 5, None).await.unwrap();

        let result = service.gain(gain_request(USER)).await.unwrap();

        assert!(result.success);
        assert_eq!(result.previous_level, 2);
        assert_eq!(result.current_level, 3);
        assert!(result.leveled_up());
        let earned: Vec<u64> = result.earned_rewards.iter().map(|r| r.role_id).collect();
        assert_eq!(earned, vec![1, 2]);
        assert_eq!(service.store.balance(USER, GUILD).await.unwrap(), 35);
    }

    #[tokio::test]
    async fn gain_on_cooldown_writes_nothing() {
        let service = make_service();
        let now = Utc::now();
        service.store.create_member(USER, GUILD, now).await.unwrap();
        service
            .store
            .append_entry(NewXpEntry::earned(USER, GUILD, 15, now, Duration::minutes(5)))
            .await
            .unwrap();
        let before = service.store.history(USER, GUILD, 100).await.unwrap().len();

        let result = service.gain(gain_request(USER)).await.unwrap();

        assert!(!result.success);
        assert!(!result.leveled_up());
        let after = service.store.history(USER, GUILD, 100).await.unwrap().len();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn first_gain_creates_member_then_earns() {
        let service = make_service();

        let result = service.gain(gain_request(USER)).await.unwrap();

        assert!(result.success);
        assert_eq!(result.previous_level, 0);
        let history = service.store.history(USER, GUILD, 10).await.unwrap();
        let kinds: Vec<XpKind> = history.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![XpKind::Earned, XpKind::Created]);
        assert_eq!(history[1].amount, 0);

        // Second message inside the cooldown window is skipped
        let result = service.gain(gain_request(USER)).await.unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn ignored_member_is_not_created() {
        let service = make_service();
        service
            .set_ignored(
                IgnoreTarget::Member {
                    user_id: USER,
                    guild_id: GUILD,
                },
                true,
            )
            .await
            .unwrap();

        let result = service.gain(gain_request(USER)).await.unwrap();

        assert_eq!(result, GainResult::skipped());
        assert!(!service.store.member_exists(USER, GUILD).await.unwrap());
    }

    #[tokio::test]
    async fn gain_reports_configured_log_channels() {
        let service = make_service();
        service
            .set_setting(GUILD, LevelSetting::LevelLogChannel(Some(55)))
            .await
            .unwrap();
        service
            .set_setting(GUILD, LevelSetting::ModLogChannel(Some(66)))
            .await
            .unwrap();

        let result = service.gain(gain_request(USER)).await.unwrap();

        assert_eq!(result.level_log_channel_id, Some(55));
        assert_eq!(result.mod_log_channel_id, Some(66));
    }

    #[tokio::test]
    async fn award_unknown_member_fails() {
        let service = make_service();

        let err = service
            .award(AwardRequest {
                guild_id: GUILD,
                user_id: 20001,
                amount: 50,
                awarder_id: 1,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LevelingError::MemberNotFound(20001)));
        assert!(err.is_user_facing());
        assert_eq!(
            err.to_string(),
            "<@!20001> was not found. Have they been on the server before?"
        );
    }

    #[tokio::test]
    async fn award_ignores_cooldown_and_records_awarder() {
        let service = make_service();
        service.gain(gain_request(USER)).await.unwrap();

        let result = service
            .award(AwardRequest {
                guild_id: GUILD,
                user_id: USER,
                amount: -5,
                awarder_id: 99,
            })
            .await
            .unwrap();

        assert_eq!(result.new_balance, 10);
        let latest = &service.store.history(USER, GUILD, 1).await.unwrap()[0];
        assert_eq!(latest.kind, XpKind::Awarded);
        assert_eq!(latest.awarder_id, Some(99));
        assert_eq!(ledger_sum(&service, USER).await, 10);
    }

    #[tokio::test]
    async fn reclaim_amount_takes_requested() {
        let service = make_service();
        seed_member(&service, USER, 300).await;

        let result = service
            .reclaim(ReclaimRequest {
                guild_id: GUILD,
                user_id: USER,
                mode: ReclaimMode::Amount(200),
                reclaimer_id: Some(1),
            })
            .await
            .unwrap();

        assert_eq!(result.xp_taken, 200);
        assert_eq!(result.new_balance, 100);
        let history = service.store.history(USER, GUILD, 10).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].amount, -200);
        assert_eq!(history[0].kind, XpKind::Reclaimed);
        assert_eq!(service.store.balance(USER, GUILD).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn reclaim_all_empties_balance() {
        let service = make_service();
        seed_member(&service, USER, 300).await;

        let result = service
            .reclaim(ReclaimRequest {
                guild_id: GUILD,
                user_id: USER,
                mode: ReclaimMode::All,
                reclaimer_id: None,
            })
            .await
            .unwrap();

        assert_eq!(result.xp_taken, 300);
        let history = service.store.history(USER, GUILD, 10).await.unwrap();
        assert_eq!(history[0].amount, -300);
        assert_eq!(service.store.balance(USER, GUILD).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reclaim_never_goes_below_zero() {
        let service = make_service();
        seed_member(&service, USER, 40).await;

        let result = service
            .reclaim(ReclaimRequest {
                guild_id: GUILD,
                user_id: USER,
                mode: ReclaimMode::Amount(1_000),
                reclaimer_id: None,
            })
            .await
            .unwrap();
        assert_eq!(result.xp_taken, 40);
        assert_eq!(result.new_balance, 0);

        // Nothing left to take: no entry is written
        let before = service.store.history(USER, GUILD, 100).await.unwrap().len();
        let result = service
            .reclaim(ReclaimRequest {
                guild_id: GUILD,
                user_id: USER,
                mode: ReclaimMode::All,
                reclaimer_id: None,
            })
            .await
            .unwrap();
        assert_eq!(result.xp_taken, 0);
        let after = service.store.history(USER, GUILD, 100).await.unwrap().len();
        assert_eq!(before, after);
        assert_eq!(ledger_sum(&service, USER).await, 0);
    }

    #[tokio::test]
    async fn reclaim_unknown_member_fails() {
        let service = make_service();

        let err = service
            .reclaim(ReclaimRequest {
                guild_id: GUILD,
                user_id: USER,
                mode: ReclaimMode::All,
                reclaimer_id: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LevelingError::MemberNotFound(USER)));
    }

    #[tokio::test]
    async fn balance_always_matches_ledger_sum() {
        let service = make_service();
        seed_member(&service, USER, 120).await;

        service
            .award(AwardRequest {
                guild_id: GUILD,
                user_id: USER,
                amount: 33,
                awarder_id: 2,
            })
            .await
            .unwrap();
        service
            .reclaim(ReclaimRequest {
                guild_id: GUILD,
                user_id: USER,
                mode: ReclaimMode::Amount(50),
                reclaimer_id: None,
            })
            .await
            .unwrap();
        service.gain(gain_request(USER)).await.unwrap();

        let balance = service.store.balance(USER, GUILD).await.unwrap();
        assert_eq!(balance, 120 + 33 - 50 + 15);
        assert_eq!(balance, ledger_sum(&service, USER).await);
    }

    #[tokio::test]
    async fn settings_changes_drive_gains() {
        let service = make_service();
        let setting = LevelSetting::parse(SettingField::AmountPerGain, "40", &[]).unwrap();
        service.set_setting(GUILD, setting).await.unwrap();
        service
            .set_setting(GUILD, LevelSetting::Cooldown(Duration::zero()))
            .await
            .unwrap();

        service.gain(gain_request(USER)).await.unwrap();
        let second = service.gain(gain_request(USER)).await.unwrap();

        assert!(second.success);
        assert_eq!(service.store.balance(USER, GUILD).await.unwrap(), 80);
    }

    #[tokio::test]
    async fn disabled_module_skips_gain() {
        let service = make_service();
        service
            .set_setting(GUILD, LevelSetting::ModuleEnabled(false))
            .await
            .unwrap();

        let result = service.gain(gain_request(USER)).await.unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn invalid_setting_is_rejected_and_not_saved() {
        let service = make_service();

        let err = service
            .set_setting(GUILD, LevelSetting::Base(-1))
            .await
            .unwrap_err();

        assert!(matches!(err, LevelingError::InvalidSetting(_)));
        assert_eq!(service.settings(GUILD).await.unwrap().base, 15);
    }

    #[tokio::test]
    async fn rewards_upsert_by_role() {
        let service = make_service();

        assert_eq!(
            service.add_reward(GUILD, 7, 5, Some("Welcome!".into())).await.unwrap(),
            Upsert::Created
        );
        assert_eq!(
            service.add_reward(GUILD, 7, 10, Some("  ".into())).await.unwrap(),
            Upsert::Updated
        );

        let rewards = service.list_rewards(GUILD).await.unwrap();
        assert_eq!(rewards.len(), 1);
        assert_eq!(rewards[0].reward_level, 10);
        assert_eq!(rewards[0].message, None);

        assert!(matches!(
            service.add_reward(GUILD, 8, 0, None).await.unwrap_err(),
            LevelingError::InvalidSetting(_)
        ));
    }

    #[tokio::test]
    async fn remove_missing_reward_fails() {
        let service = make_service();
        service.add_reward(GUILD, 7, 5, None).await.unwrap();

        service.remove_reward(7).await.unwrap();
        let err = service.remove_reward(7).await.unwrap_err();

        assert!(matches!(err, LevelingError::RewardNotFound(7)));
        assert_eq!(err.to_string(), "<@&7> is not a level reward.");
    }

    #[tokio::test]
    async fn level_info_reports_progress_and_next_reward() {
        let service = make_service();
        seed_member(&service, USER, 20).await;
        service.add_reward(GUILD, 1, 1, None).await.unwrap();
        service.add_reward(GUILD, 3, 5, None).await.unwrap();

        let info = service.level_info(GUILD, USER).await.unwrap();

        assert_eq!(info.xp, 20);
        assert_eq!(info.level, 2);
        assert_eq!(info.progress_into_level, 5);
        assert_eq!(info.xp_for_next_level, 18);
        assert_eq!(info.next_reward_role_id, Some(3));
        assert_eq!(info.next_reward_level, Some(5));
    }

    #[tokio::test]
    async fn leaderboard_window_around_target() {
        let service = make_service();
        for user_id in 1..=20u64 {
            seed_member(&service, user_id, (user_id as i64) * 100).await;
        }

        // User 9 has the 12th highest balance (0-indexed rank 11)
        let page = service.leaderboard(GUILD, Some(9)).await.unwrap();

        assert_eq!(page.total, 20);
        assert!(page.entries.len() <= 15);
        assert_eq!(page.entries[0].rank, 6);
        assert!(page.entries.iter().any(|e| e.user_id == 9 && e.rank == 12));

        let top = service.leaderboard(GUILD, None).await.unwrap();
        assert_eq!(top.entries[0].user_id, 20);
        assert_eq!(top.entries.len(), 15);
    }

    #[tokio::test]
    async fn leaderboard_unknown_target_fails() {
        let service = make_service();
        seed_member(&service, 1, 10).await;

        let err = service.leaderboard(GUILD, Some(2)).await.unwrap_err();
        assert!(matches!(err, LevelingError::MemberNotOnLeaderboard(2)));
    }

    #[tokio::test]
    async fn history_is_newest_first_and_limited() {
        let service = make_service();
        seed_member(&service, USER, 10).await;
        service
            .award(AwardRequest {
                guild_id: GUILD,
                user_id: USER,
                amount: 5,
                awarder_id: 3,
            })
            .await
            .unwrap();

        let history = service.history(GUILD, USER, 2).await.unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, XpKind::Awarded);
        assert_eq!(history[1].kind, XpKind::Earned);
        assert!(service.history(GUILD, 999, 5).await.is_err());
    }

    #[tokio::test]
    async fn zero_ids_are_rejected() {
        let service = make_service();

        assert!(matches!(
            service.gain(gain_request(0)).await.unwrap_err(),
            LevelingError::InvalidId
        ));
        assert!(matches!(
            service.observe_member(0, USER).await.unwrap_err(),
            LevelingError::InvalidId
        ));
    }

    #[test]
    fn leveling_error_messages_are_descriptive() {
        let storage_error = LevelingError::StorageError("db down".into());
        assert!(storage_error.to_string().contains("db down"));
        assert!(!storage_error.is_user_facing());

        let invalid = LevelingError::InvalidSetting("base must be positive".into());
        assert_eq!(invalid.to_string(), "Invalid setting: base must be positive");
    }
}
