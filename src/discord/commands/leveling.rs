// Discord commands for the leveling system.
//
// **Notice the pattern:**
// 1. Extract primitive data from Discord types
// 2. Call core service
// 3. Format the response based on the result
//
// This layer is THIN - no business logic, just translation.

use crate::core::leveling::{LevelingError, LevelingService};
use crate::infra::leveling::SqliteLevelStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Type alias for our bot's context.
/// This is what every command receives as its first parameter.
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands.
pub struct Data {
    pub leveling: Arc<LevelingService<SqliteLevelStore>>,
}

/// Unwrap a service result, showing anticipated errors to the invoker.
///
/// Returns `Ok(None)` after replying with a user-facing error; storage
/// failures are passed on to poise's error handler.
pub async fn reply_or_raise<T>(
    ctx: Context<'_>,
    result: Result<T, LevelingError>,
) -> Result<Option<T>, Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_user_facing() => {
            ctx.send(
                poise::CreateReply::default()
                    .content(err.to_string())
                    .ephemeral(true),
            )
            .await?;
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Show your current level and XP.
#[poise::command(slash_command, guild_only)]
pub async fn level(
    ctx: Context<'_>,
    #[description = "User to check (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target_user = user.as_ref().unwrap_or_else(|| ctx.author());
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    if target_user.bot {
        ctx.say("Bots don't earn XP! 🤖").await?;
        return Ok(());
    }

    let result = ctx
        .data()
        .leveling
        .level_info(guild_id, target_user.id.get())
        .await;
    let Some(info) = reply_or_raise(ctx, result).await? else {
        return Ok(());
    };

    let progress_pct = if info.xp_for_next_level > 0 {
        info.progress_into_level as f64 / info.xp_for_next_level as f64
    } else {
        0.0
    };
    let xp_needed = (info.xp_for_next_level - info.progress_into_level).max(0);

    let next_reward = match (info.next_reward_role_id, info.next_reward_level) {
        (Some(role_id), Some(level)) => format!("<@&{}> at level {}", role_id, level),
        _ => "No more rewards to unlock".to_string(),
    };

    let embed = serenity::CreateEmbed::new()
        .title(format!("Level of {}", target_user.name))
        .color(0x00ff00)
        .thumbnail(target_user.face())
        .field("Level", format!("**{}**", info.level), true)
        .field("Total XP", format!("**{}**", info.xp), true)
        .field(
            "Progress",
            format!(
                "{}/{} XP\n{}",
                info.progress_into_level,
                info.xp_for_next_level,
                build_progress_bar(progress_pct, 15)
            ),
            false,
        )
        .field("XP to next level", xp_needed.to_string(), true)
        .field("Next reward", next_reward, true);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// Show the server's XP leaderboard.
#[poise::command(slash_command, guild_only)]
pub async fn leaderboard(
    ctx: Context<'_>,
    #[description = "Center the leaderboard on this member"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    // Re-ranking the whole guild can take a moment on big servers
    ctx.defer().await?;

    let target = user.as_ref().map(|u| u.id.get());
    let result = ctx.data().leveling.leaderboard(guild_id, target).await;
    let Some(page) = reply_or_raise(ctx, result).await? else {
        return Ok(());
    };

    if page.entries.is_empty() {
        ctx.say("No one has earned XP yet! Start chatting to get on the leaderboard! 💬")
            .await?;
        return Ok(());
    }

    let author_id = ctx.author().id.get();
    let mut description = String::new();
    for entry in &page.entries {
        // Add medal emojis for top 3
        let medal = match entry.rank {
            1 => "🥇",
            2 => "🥈",
            3 => "🥉",
            _ => "▫️",
        };

        let highlight = if entry.user_id == author_id || Some(entry.user_id) == target {
            " ◀"
        } else {
            ""
        };

        description.push_str(&format!(
            "{} **#{}** <@{}>{}\nLevel {} | {} XP\n",
            medal, entry.rank, entry.user_id, highlight, entry.level, entry.xp
        ));
    }

    let first_rank = page.entries.first().map(|e| e.rank).unwrap_or(1);
    let last_rank = page.entries.last().map(|e| e.rank).unwrap_or(first_rank);

    let embed = serenity::CreateEmbed::new()
        .title("📊 Leaderboard")
        .description(description)
        .color(0xffd700) // Gold color
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Ranks {}-{} of {}",
            first_rank, last_rank, page.total
        )));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

pub fn build_progress_bar(progress: f64, length: usize) -> String {
    let clamped = progress.clamp(0.0, 1.0);
    let mut filled = (clamped * length as f64).round() as usize;
    if clamped > 0.0 && filled == 0 {
        filled = 1;
    }
    filled = filled.min(length);
    let filled_char = "▰";
    let empty_char = "▱";
    let bar = filled_char.repeat(filled) + &empty_char.repeat(length - filled);
    format!("{} ({}%)", bar, (clamped * 100.0).round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_is_clamped() {
        assert_eq!(build_progress_bar(0.0, 4), "▱▱▱▱ (0%)");
        assert_eq!(build_progress_bar(0.5, 4), "▰▰▱▱ (50%)");
        assert_eq!(build_progress_bar(3.0, 4), "▰▰▰▰ (100%)");
    }

    #[test]
    fn tiny_progress_still_shows_one_segment() {
        assert!(build_progress_bar(0.01, 10).starts_with('▰'));
    }
}
