// Per-guild leveling configuration. Raw values are turned into typed settings
// by the core before anything is stored.

use crate::core::leveling::{IgnoreTarget, LevelSetting, SettingField, DISABLE_SENTINEL};
use crate::discord::commands::leveling::reply_or_raise;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum SettingChoice {
    #[name = "Base (curve divisor)"]
    Base,
    #[name = "Modifier (curve steepness)"]
    Modifier,
    #[name = "XP per message"]
    AmountPerGain,
    #[name = "Cooldown (minutes)"]
    Cooldown,
    #[name = "Level log channel"]
    LevelLogChannel,
    #[name = "Mod log channel"]
    ModLogChannel,
    #[name = "Module (enable/disable)"]
    ModuleEnabled,
}

impl From<SettingChoice> for SettingField {
    fn from(choice: SettingChoice) -> Self {
        match choice {
            SettingChoice::Base => SettingField::Base,
            SettingChoice::Modifier => SettingField::Modifier,
            SettingChoice::AmountPerGain => SettingField::AmountPerGain,
            SettingChoice::Cooldown => SettingField::Cooldown,
            SettingChoice::LevelLogChannel => SettingField::LevelLogChannel,
            SettingChoice::ModLogChannel => SettingField::ModLogChannel,
            SettingChoice::ModuleEnabled => SettingField::ModuleEnabled,
        }
    }
}

/// Configure the leveling module.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands("show", "set", "ignore_member", "ignore_role", "ignore_channel")
)]
pub async fn levelsettings(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

fn channel_or_unset(channel_id: Option<u64>) -> String {
    channel_id
        .map(|id| format!("<#{}>", id))
        .unwrap_or_else(|| "Not set".to_string())
}

/// Show the current leveling settings.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn show(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();

    let result = ctx.data().leveling.settings(guild_id).await;
    let Some(settings) = reply_or_raise(ctx, result).await? else {
        return Ok(());
    };

    let status = if settings.module_enabled {
        "✅ Enabled"
    } else {
        "❌ Disabled"
    };

    let embed = serenity::CreateEmbed::new()
        .title("Leveling Settings")
        .color(serenity::Colour::BLURPLE)
        .field("Module", status, false)
        .field("Base", settings.base.to_string(), true)
        .field("Modifier", settings.modifier.to_string(), true)
        .field("XP per message", settings.amount_per_gain.to_string(), true)
        .field(
            "Cooldown",
            format!("{} minute(s)", settings.cooldown.num_minutes()),
            true,
        )
        .field(
            "Level log channel",
            channel_or_unset(settings.level_log_channel_id),
            true,
        )
        .field(
            "Mod log channel",
            channel_or_unset(settings.mod_log_channel_id),
            true,
        )
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Guild ID: {}",
            guild_id
        )));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Change one leveling setting.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn set(
    ctx: Context<'_>,
    #[description = "Setting to change"] setting: SettingChoice,
    #[description = "New value (channels take a mention, an ID, or \"disable\")"] value: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?;
    let field = SettingField::from(setting);

    let known_channels: Vec<u64> = match field {
        SettingField::LevelLogChannel | SettingField::ModLogChannel => guild_id
            .channels(ctx.serenity_context())
            .await?
            .keys()
            .map(|id| id.get())
            .collect(),
        _ => Vec::new(),
    };

    let parsed = LevelSetting::parse(field, &value, &known_channels);
    let Some(parsed) = reply_or_raise(ctx, parsed).await? else {
        return Ok(());
    };

    let result = ctx.data().leveling.set_setting(guild_id.get(), parsed).await;
    if reply_or_raise(ctx, result).await?.is_none() {
        return Ok(());
    }

    let shown = match parsed {
        LevelSetting::LevelLogChannel(None) | LevelSetting::ModLogChannel(None) => {
            DISABLE_SENTINEL.to_string()
        }
        LevelSetting::LevelLogChannel(Some(id)) | LevelSetting::ModLogChannel(Some(id)) => {
            format!("<#{}>", id)
        }
        LevelSetting::Cooldown(cooldown) => format!("{} minute(s)", cooldown.num_minutes()),
        _ => value.trim().to_string(),
    };

    ctx.say(format!("✅ Set **{}** to {}.", field, shown)).await?;
    Ok(())
}

/// Stop (or resume) XP gains for a member.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn ignore_member(
    ctx: Context<'_>,
    #[description = "Member"] user: serenity::User,
    #[description = "Ignore them? (false to resume)"] ignored: bool,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?.get();
    let target = IgnoreTarget::Member {
        user_id: user.id.get(),
        guild_id,
    };

    let result = ctx.data().leveling.set_ignored(target, ignored).await;
    if reply_or_raise(ctx, result).await?.is_some() {
        ctx.say(ignore_reply(format!("<@{}>", user.id), ignored))
            .await?;
    }
    Ok(())
}

/// Stop (or resume) XP gains for everyone holding a role.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn ignore_role(
    ctx: Context<'_>,
    #[description = "Role"] role: serenity::Role,
    #[description = "Ignore it? (false to resume)"] ignored: bool,
) -> Result<(), Error> {
    let result = ctx
        .data()
        .leveling
        .set_ignored(IgnoreTarget::Role(role.id.get()), ignored)
        .await;
    if reply_or_raise(ctx, result).await?.is_some() {
        ctx.say(ignore_reply(format!("<@&{}>", role.id), ignored))
            .await?;
    }
    Ok(())
}

/// Stop (or resume) XP gains for messages in a channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn ignore_channel(
    ctx: Context<'_>,
    #[description = "Channel"] channel: serenity::Channel,
    #[description = "Ignore it? (false to resume)"] ignored: bool,
) -> Result<(), Error> {
    let channel_id = channel.id().get();
    let result = ctx
        .data()
        .leveling
        .set_ignored(IgnoreTarget::Channel(channel_id), ignored)
        .await;
    if reply_or_raise(ctx, result).await?.is_some() {
        ctx.say(ignore_reply(format!("<#{}>", channel_id), ignored))
            .await?;
    }
    Ok(())
}

fn ignore_reply(target: String, ignored: bool) -> String {
    if ignored {
        format!("🔇 {} will no longer earn XP.", target)
    } else {
        format!("🔊 {} can earn XP again.", target)
    }
}
