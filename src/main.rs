// This is the entry point of the leveling bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (databases)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::leveling::{GainRequest, LevelingService};
use crate::discord::leveling_announcements::{grant_missing_rewards, send_level_up_embed};
use crate::discord::{Data, Error};
use crate::infra::leveling::SqliteLevelStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

const DEFAULT_DATABASE_URL: &str = "data/leveling.db";

/// Event handler for non-command Discord events.
/// Messages feed passive XP; joins make sure the member has a ledger.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            // Ignore bot messages (including our own)
            if new_message.author.bot {
                return Ok(());
            }

            // Only process guild messages (not DMs)
            let Some(guild_id) = new_message.guild_id else {
                return Ok(());
            };
            let guild_id = guild_id.get();
            let user_id = new_message.author.id.get();

            let role_ids: Vec<u64> = new_message
                .member
                .as_ref()
                .map(|m| m.roles.iter().map(|r| r.get()).collect())
                .unwrap_or_default();

            let request = GainRequest {
                guild_id,
                user_id,
                channel_id: new_message.channel_id.get(),
                role_ids: role_ids.clone(),
            };

            match data.leveling.gain(request).await {
                Ok(result) if result.success => {
                    grant_missing_rewards(
                        ctx,
                        guild_id,
                        user_id,
                        &result.earned_rewards,
                        &role_ids,
                        result.previous_level,
                        result.current_level,
                        result.mod_log_channel_id,
                    )
                    .await;

                    if result.leveled_up() {
                        tracing::info!(
                            user_id,
                            guild_id,
                            old_level = result.previous_level,
                            new_level = result.current_level,
                            "User leveled up"
                        );

                        if let Some(channel_id) = result.level_log_channel_id {
                            if let Err(err) = send_level_up_embed(
                                ctx,
                                channel_id,
                                user_id,
                                result.previous_level,
                                result.current_level,
                                &result.earned_rewards,
                            )
                            .await
                            {
                                tracing::warn!("Failed to send level-up embed: {err}");
                            }
                        }
                    }
                }
                Ok(_) => {
                    // Ineligible or on cooldown - silently ignore
                }
                Err(e) => {
                    // Log it but don't crash
                    tracing::error!(user_id, guild_id, "Error processing XP for message: {}", e);
                }
            }
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            if let Err(e) = data
                .leveling
                .observe_member(new_member.guild_id.get(), new_member.user.id.get())
                .await
            {
                tracing::error!("Error creating ledger on join: {}", e);
            }
        }
        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let token = std::env::var("DISCORD_TOKEN").context(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    )?;
    let database_url = std::env::var("LEVELING_DATABASE_URL")
        .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    // Registering in a single guild is instant; global registration can take an hour
    let dev_guild_id = match std::env::var("DEV_GUILD_ID") {
        Ok(raw) => Some(
            raw.trim()
                .parse::<u64>()
                .ok()
                .filter(|id| *id != 0)
                .with_context(|| format!("DEV_GUILD_ID is not a valid guild id: {raw}"))?,
        ),
        Err(_) => None,
    };

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let level_store = SqliteLevelStore::new(&database_url)
        .await
        .with_context(|| format!("Failed to initialize SQLite store at {database_url}"))?;
    let leveling_service = Arc::new(LevelingService::new(level_store));

    tracing::info!(%database_url, "Leveling store ready");

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    // Passive XP needs messages and member roles; joins need GUILD_MEMBERS.
    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::leveling::level(),
                discord::commands::leveling::leaderboard(),
                discord::commands::xp::xp(),
                discord::commands::rewards::rewards(),
                discord::commands::settings::levelsettings(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");

                match dev_guild_id {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            serenity::GuildId::new(guild_id),
                        )
                        .await?;
                        tracing::info!(guild_id, "Commands registered in dev guild");
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                        tracing::info!("Commands registered globally");
                    }
                }

                Ok(Data {
                    leveling: Arc::clone(&leveling_service),
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
