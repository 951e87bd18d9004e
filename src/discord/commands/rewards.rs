use crate::core::leveling::Upsert;
use crate::discord::commands::leveling::reply_or_raise;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Configure roles handed out at level milestones.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands("add", "remove", "list")
)]
pub async fn rewards(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Add a reward role, or update the level of an existing one.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Role to give"] role: serenity::Role,
    #[description = "Level that unlocks it"]
    #[min = 1]
    level: u32,
    #[description = "Shown in the level-up announcement"] message: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();

    let result = ctx
        .data()
        .leveling
        .add_reward(guild_id, role.id.get(), level, message)
        .await;
    let Some(upsert) = reply_or_raise(ctx, result).await? else {
        return Ok(());
    };

    let verb = match upsert {
        Upsert::Created => "added",
        Upsert::Updated => "updated",
    };
    ctx.say(format!(
        "✅ Reward <@&{}> {} at level **{}**.",
        role.id, verb, level
    ))
    .await?;
    Ok(())
}

/// Stop handing out a reward role.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Reward role to remove"] role: serenity::Role,
) -> Result<(), Error> {
    let result = ctx.data().leveling.remove_reward(role.id.get()).await;
    if reply_or_raise(ctx, result).await?.is_some() {
        ctx.say(format!("🗑️ <@&{}> is no longer a level reward.", role.id))
            .await?;
    }
    Ok(())
}

/// List every reward role in this server.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();

    let result = ctx.data().leveling.list_rewards(guild_id).await;
    let Some(rewards) = reply_or_raise(ctx, result).await? else {
        return Ok(());
    };

    if rewards.is_empty() {
        ctx.say("No level rewards configured yet. Add one with `/rewards add`.")
            .await?;
        return Ok(());
    }

    let description = rewards
        .iter()
        .map(|reward| {
            let mut line = format!("**Level {}** → <@&{}>", reward.reward_level, reward.role_id);
            if let Some(message) = &reward.message {
                line.push_str(&format!("\n  _{}_", message));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title("🎁 Level Rewards")
        .description(description)
        .color(serenity::Colour::BLURPLE)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "{} reward(s)",
            rewards.len()
        )));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
