// Discord-side effects of leveling results: reward role grants, level-up
// embeds in the level log channel, and audit lines in the mod log channel.
//
// The core only reports what was earned. Everything here is best-effort:
// failures are logged (and surfaced in the mod log) but never bubble up.

use crate::core::leveling::rewards::newly_earned;
use crate::core::leveling::Reward;
use poise::serenity_prelude::{self as serenity, builder::CreateMessage};
use rand::seq::SliceRandom;

/// Give the member every earned reward role they don't already hold.
///
/// Grants are retried on every call, but a failure is only reported to the
/// mod log for rewards crossed between `previous_level` and `current_level`.
/// Returns the role ids that were actually granted.
#[allow(clippy::too_many_arguments)]
pub async fn grant_missing_rewards(
    ctx: &serenity::Context,
    guild_id: u64,
    user_id: u64,
    earned: &[Reward],
    held_roles: &[u64],
    previous_level: u32,
    current_level: u32,
    mod_log_channel_id: Option<u64>,
) -> Vec<u64> {
    let mut granted = Vec::new();

    for reward in earned.iter().filter(|r| !held_roles.contains(&r.role_id)) {
        let result = ctx
            .http
            .add_member_role(
                serenity::GuildId::new(guild_id),
                serenity::UserId::new(user_id),
                serenity::RoleId::new(reward.role_id),
                Some("Level reward"),
            )
            .await;

        match result {
            Ok(()) => {
                tracing::info!(user_id, guild_id, role_id = reward.role_id, "Granted level reward");
                granted.push(reward.role_id);
            }
            Err(err) => {
                tracing::warn!(
                    user_id,
                    guild_id,
                    role_id = reward.role_id,
                    "Failed to grant level reward: {err}"
                );
                let reportable = failure_is_news(reward, previous_level, current_level);
                if let (true, Some(channel_id)) = (reportable, mod_log_channel_id) {
                    post_mod_log(
                        ctx,
                        channel_id,
                        format!(
                            "⚠️ Couldn't give <@&{}> to <@{}> ({}). Is my role above it?",
                            reward.role_id, user_id, err
                        ),
                    )
                    .await;
                }
            }
        }
    }

    granted
}

/// Only rewards unlocked by this change are worth a mod log line; older
/// ones already failed (and were reported) when they were crossed.
fn failure_is_news(reward: &Reward, previous_level: u32, current_level: u32) -> bool {
    !newly_earned(previous_level, current_level, std::slice::from_ref(reward)).is_empty()
}

/// Post a plain text line to the guild's mod log channel.
pub async fn post_mod_log(ctx: &serenity::Context, channel_id: u64, text: String) {
    if let Err(err) = serenity::ChannelId::new(channel_id)
        .send_message(ctx, CreateMessage::new().content(text))
        .await
    {
        tracing::warn!(channel_id, "Failed to post to mod log: {err}");
    }
}

/// Announce a level-up in the level log channel.
pub async fn send_level_up_embed(
    ctx: &serenity::Context,
    channel_id: u64,
    user_id: u64,
    previous_level: u32,
    current_level: u32,
    earned: &[Reward],
) -> Result<(), serenity::Error> {
    let mut embed = serenity::CreateEmbed::new()
        .title("Level Up!")
        .description(format!("<@{}> reached level {}!", user_id, current_level))
        .color(level_color(current_level))
        .footer(serenity::CreateEmbedFooter::new(random_flavor_line()));

    let unlocked = newly_earned(previous_level, current_level, earned);
    if !unlocked.is_empty() {
        let lines: Vec<String> = unlocked
            .iter()
            .map(|reward| match &reward.message {
                Some(message) => format!("<@&{}>: {}", reward.role_id, message),
                None => format!("<@&{}>", reward.role_id),
            })
            .collect();
        embed = embed.field("Rewards unlocked", lines.join("\n"), false);
    }

    serenity::ChannelId::new(channel_id)
        .send_message(ctx, CreateMessage::new().embed(embed))
        .await
        .map(|_| ())
}

fn level_color(level: u32) -> serenity::Colour {
    if level >= 50 {
        serenity::Colour::DARK_PURPLE
    } else if level >= 25 {
        serenity::Colour::ORANGE
    } else if level >= 10 {
        serenity::Colour::GOLD
    } else if level >= 5 {
        serenity::Colour::BLURPLE
    } else {
        serenity::Colour::LIGHT_GREY
    }
}

fn random_flavor_line() -> &'static str {
    const FLAVOR_LINES: [&str; 4] = [
        "Keep the streak going!",
        "Your grind is paying off.",
        "Another level, another flex.",
        "That XP bar never stood a chance.",
    ];

    FLAVOR_LINES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FLAVOR_LINES[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reward_at(level: u32) -> Reward {
        Reward {
            role_id: 7,
            guild_id: 1,
            reward_level: level,
            message: None,
        }
    }

    #[test]
    fn only_newly_crossed_failures_are_reported() {
        // Crossed on this gain
        assert!(failure_is_news(&reward_at(3), 2, 3));
        assert!(failure_is_news(&reward_at(3), 1, 5));

        // Earned long ago, still missing: retried silently
        assert!(!failure_is_news(&reward_at(2), 4, 5));
        // No level change at all
        assert!(!failure_is_news(&reward_at(3), 3, 3));
    }

    #[test]
    fn level_colors_escalate() {
        assert_eq!(level_color(1), serenity::Colour::LIGHT_GREY);
        assert_eq!(level_color(5), serenity::Colour::BLURPLE);
        assert_eq!(level_color(60), serenity::Colour::DARK_PURPLE);
    }
}
