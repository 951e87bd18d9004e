// Moderator XP commands: manual awards, reclaims, and ledger exports.

use crate::core::leveling::{AwardRequest, ReclaimMode, ReclaimRequest};
use crate::discord::commands::leveling::reply_or_raise;
use crate::discord::leveling_announcements::{
    grant_missing_rewards, post_mod_log, send_level_up_embed,
};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

const DEFAULT_HISTORY_LIMIT: u32 = 50;
const MAX_HISTORY_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ReclaimChoice {
    #[name = "A specific amount"]
    Amount,
    #[name = "Everything"]
    All,
}

/// Manage member XP by hand.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands("award", "reclaim", "history")
)]
pub async fn xp(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Give XP to a member.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn award(
    ctx: Context<'_>,
    #[description = "Member to award"] user: serenity::User,
    #[description = "Amount of XP (negative to correct a mistake)"] amount: i64,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?;

    if user.bot {
        ctx.say("Bots don't earn XP! 🤖").await?;
        return Ok(());
    }

    let result = ctx
        .data()
        .leveling
        .award(AwardRequest {
            guild_id: guild_id.get(),
            user_id: user.id.get(),
            amount,
            awarder_id: ctx.author().id.get(),
        })
        .await;
    let Some(outcome) = reply_or_raise(ctx, result).await? else {
        return Ok(());
    };

    ctx.say(award_summary(
        amount,
        user.id.get(),
        outcome.new_balance,
        outcome.current_level,
    ))
    .await?;

    let serenity_ctx = ctx.serenity_context();

    // Role grants need the member's current roles; skip them if the member left
    match guild_id.member(serenity_ctx, user.id).await {
        Ok(member) => {
            let held: Vec<u64> = member.roles.iter().map(|r| r.get()).collect();
            grant_missing_rewards(
                serenity_ctx,
                guild_id.get(),
                user.id.get(),
                &outcome.earned_rewards,
                &held,
                outcome.previous_level,
                outcome.current_level,
                outcome.mod_log_channel_id,
            )
            .await;
        }
        Err(err) => {
            tracing::warn!(
                user_id = user.id.get(),
                "Could not fetch member for reward grants: {err}"
            );
        }
    }

    if outcome.current_level > outcome.previous_level {
        if let Some(channel_id) = outcome.level_log_channel_id {
            if let Err(err) = send_level_up_embed(
                serenity_ctx,
                channel_id,
                user.id.get(),
                outcome.previous_level,
                outcome.current_level,
                &outcome.earned_rewards,
            )
            .await
            {
                tracing::warn!("Failed to send level-up embed: {err}");
            }
        }
    }

    if let Some(channel_id) = outcome.mod_log_channel_id {
        post_mod_log(
            serenity_ctx,
            channel_id,
            format!(
                "📈 <@{}> awarded {} XP to <@{}> (now {} XP).",
                ctx.author().id,
                amount,
                user.id,
                outcome.new_balance
            ),
        )
        .await;
    }

    Ok(())
}

fn award_summary(amount: i64, user_id: u64, new_balance: i64, level: u32) -> String {
    let action = if amount < 0 {
        format!("Removed **{}** XP from", amount.unsigned_abs())
    } else {
        format!("Gave **{}** XP to", amount)
    };
    format!(
        "✅ {} <@{}>. They now have **{}** XP (level {}).",
        action, user_id, new_balance, level
    )
}

/// Take XP away from a member.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn reclaim(
    ctx: Context<'_>,
    #[description = "Member to reclaim from"] user: serenity::User,
    #[description = "How much to take"] mode: ReclaimChoice,
    #[description = "Amount of XP (required for a specific amount)"]
    #[min = 1]
    amount: Option<u64>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();

    let mode = match (mode, amount) {
        (ReclaimChoice::All, _) => ReclaimMode::All,
        (ReclaimChoice::Amount, Some(amount)) => ReclaimMode::Amount(amount),
        (ReclaimChoice::Amount, None) => {
            ctx.send(
                poise::CreateReply::default()
                    .content("Please provide an amount to reclaim.")
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
    };

    let result = ctx
        .data()
        .leveling
        .reclaim(ReclaimRequest {
            guild_id,
            user_id: user.id.get(),
            mode,
            reclaimer_id: Some(ctx.author().id.get()),
        })
        .await;
    let Some(outcome) = reply_or_raise(ctx, result).await? else {
        return Ok(());
    };

    if outcome.xp_taken == 0 {
        ctx.say(format!("<@{}> has no XP to reclaim.", user.id))
            .await?;
        return Ok(());
    }

    ctx.say(format!(
        "✅ Reclaimed **{}** XP from <@{}>. They now have **{}** XP.",
        outcome.xp_taken, user.id, outcome.new_balance
    ))
    .await?;

    if let Some(channel_id) = outcome.mod_log_channel_id {
        post_mod_log(
            ctx.serenity_context(),
            channel_id,
            format!(
                "📉 <@{}> reclaimed {} XP from <@{}> (now {} XP).",
                ctx.author().id,
                outcome.xp_taken,
                user.id,
                outcome.new_balance
            ),
        )
        .await;
    }

    Ok(())
}

/// Export a member's XP history as JSON.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn history(
    ctx: Context<'_>,
    #[description = "Member to inspect"] user: serenity::User,
    #[description = "Number of entries (newest first)"]
    #[min = 1]
    #[max = 1000]
    limit: Option<u32>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();
    let limit = limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT) as usize;

    let result = ctx
        .data()
        .leveling
        .history(guild_id, user.id.get(), limit)
        .await;
    let Some(entries) = reply_or_raise(ctx, result).await? else {
        return Ok(());
    };

    let json = serde_json::to_vec_pretty(&entries)?;
    let attachment =
        serenity::CreateAttachment::bytes(json, format!("xp_history_{}.json", user.id));

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "Last {} XP entries for <@{}>.",
                entries.len(),
                user.id
            ))
            .attachment(attachment)
            .ephemeral(true),
    )
    .await?;

    Ok(())
}
