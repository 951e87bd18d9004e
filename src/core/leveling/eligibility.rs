// Eligibility filter and cooldown gate for passive (message-driven) XP.
//
// Failing either check is NOT an error: the gain is simply skipped.

use super::leveling_models::{GainRequest, GuildLevelSettings};
use super::leveling_service::{LevelStore, LevelingError};
use chrono::{DateTime, Utc};

/// Why a passive gain was (or wasn't) allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    ModuleDisabled,
    MemberIgnored,
    RoleIgnored,
    ChannelIgnored,
    OnCooldown { until: DateTime<Utc> },
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// Run the filter checks in order, stopping at the first failure.
///
/// The cooldown gate runs last so ignored members never cost a ledger lookup.
pub async fn check_eligibility<S: LevelStore>(
    store: &S,
    settings: &GuildLevelSettings,
    request: &GainRequest,
    now: DateTime<Utc>,
) -> Result<Eligibility, LevelingError> {
    if !settings.module_enabled {
        return Ok(Eligibility::ModuleDisabled);
    }

    if store
        .is_member_ignored(request.user_id, request.guild_id)
        .await?
    {
        return Ok(Eligibility::MemberIgnored);
    }

    if store.any_role_ignored(&request.role_ids).await? {
        return Ok(Eligibility::RoleIgnored);
    }

    if store.is_channel_ignored(request.channel_id).await? {
        return Ok(Eligibility::ChannelIgnored);
    }

    let last_cooldown = store
        .latest_cooldown(request.user_id, request.guild_id)
        .await?;
    Ok(cooldown_gate(last_cooldown, now))
}

/// Members without any `Earned` entry always pass.
pub fn cooldown_gate(cooldown_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Eligibility {
    match cooldown_until {
        Some(until) if until > now => Eligibility::OnCooldown { until },
        _ => Eligibility::Eligible,
    }
}
