// Per-guild leveling settings updates.
//
// Each update is a typed variant carrying exactly one field's new value.
// Raw text from the dispatch layer is parsed into a variant once, at the
// boundary, and everything after that works with checked payloads.

use super::leveling_models::GuildLevelSettings;
use super::leveling_service::LevelingError;
use chrono::Duration;
use std::fmt;

/// Literal accepted by channel settings to clear the channel.
pub const DISABLE_SENTINEL: &str = "disable";

/// Longest accepted passive-gain cooldown (one year).
pub const MAX_COOLDOWN_MINUTES: i64 = 60 * 24 * 365;

/// The settings a moderator can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    Base,
    Modifier,
    AmountPerGain,
    Cooldown,
    LevelLogChannel,
    ModLogChannel,
    ModuleEnabled,
}

impl fmt::Display for SettingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettingField::Base => "base",
            SettingField::Modifier => "modifier",
            SettingField::AmountPerGain => "amount",
            SettingField::Cooldown => "cooldown",
            SettingField::LevelLogChannel => "level log channel",
            SettingField::ModLogChannel => "mod log channel",
            SettingField::ModuleEnabled => "module",
        };
        f.write_str(name)
    }
}

/// A single-field settings change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSetting {
    Base(i64),
    Modifier(i64),
    AmountPerGain(i64),
    Cooldown(Duration),
    LevelLogChannel(Option<u64>),
    ModLogChannel(Option<u64>),
    ModuleEnabled(bool),
}

impl LevelSetting {
    /// Parse a raw value for `field`. Channel values must be one of `known_channels`.
    pub fn parse(
        field: SettingField,
        raw: &str,
        known_channels: &[u64],
    ) -> Result<Self, LevelingError> {
        let raw = raw.trim();
        let setting = match field {
            SettingField::Base => LevelSetting::Base(parse_positive(field, raw)?),
            SettingField::Modifier => LevelSetting::Modifier(parse_positive(field, raw)?),
            SettingField::AmountPerGain => {
                LevelSetting::AmountPerGain(parse_positive(field, raw)?)
            }
            SettingField::Cooldown => {
                let invalid = || {
                    LevelingError::InvalidSetting(format!(
                        "{} must be a whole number of minutes, got `{}`",
                        field, raw
                    ))
                };
                let minutes: i64 = raw.parse().map_err(|_| invalid())?;
                LevelSetting::Cooldown(Duration::try_minutes(minutes).ok_or_else(invalid)?)
            }
            SettingField::LevelLogChannel => {
                LevelSetting::LevelLogChannel(parse_channel(field, raw, known_channels)?)
            }
            SettingField::ModLogChannel => {
                LevelSetting::ModLogChannel(parse_channel(field, raw, known_channels)?)
            }
            SettingField::ModuleEnabled => {
                let enabled = match raw.to_ascii_lowercase().as_str() {
                    "enable" | "enabled" | "true" | "on" => true,
                    "disable" | "disabled" | "false" | "off" => false,
                    _ => {
                        return Err(LevelingError::InvalidSetting(format!(
                            "{} must be `enable` or `disable`, got `{}`",
                            field, raw
                        )))
                    }
                };
                LevelSetting::ModuleEnabled(enabled)
            }
        };

        setting.validate()?;
        Ok(setting)
    }

    pub fn field(&self) -> SettingField {
        match self {
            LevelSetting::Base(_) => SettingField::Base,
            LevelSetting::Modifier(_) => SettingField::Modifier,
            LevelSetting::AmountPerGain(_) => SettingField::AmountPerGain,
            LevelSetting::Cooldown(_) => SettingField::Cooldown,
            LevelSetting::LevelLogChannel(_) => SettingField::LevelLogChannel,
            LevelSetting::ModLogChannel(_) => SettingField::ModLogChannel,
            LevelSetting::ModuleEnabled(_) => SettingField::ModuleEnabled,
        }
    }

    /// Reject values that are well-typed but out of range.
    pub fn validate(&self) -> Result<(), LevelingError> {
        match self {
            LevelSetting::Base(value)
            | LevelSetting::Modifier(value)
            | LevelSetting::AmountPerGain(value)
                if *value <= 0 =>
            {
                Err(LevelingError::InvalidSetting(format!(
                    "{} must be a positive whole number, got {}",
                    self.field(),
                    value
                )))
            }
            LevelSetting::Cooldown(duration) if *duration < Duration::zero() => {
                Err(LevelingError::InvalidSetting(format!(
                    "{} cannot be negative",
                    self.field()
                )))
            }
            LevelSetting::Cooldown(duration)
                if duration.num_minutes() > MAX_COOLDOWN_MINUTES =>
            {
                Err(LevelingError::InvalidSetting(format!(
                    "{} cannot exceed {} minutes (one year)",
                    self.field(),
                    MAX_COOLDOWN_MINUTES
                )))
            }
            _ => Ok(()),
        }
    }

    /// Overwrite the matching field and nothing else.
    pub fn apply(&self, settings: &mut GuildLevelSettings) {
        match *self {
            LevelSetting::Base(value) => settings.base = value,
            LevelSetting::Modifier(value) => settings.modifier = value,
            LevelSetting::AmountPerGain(value) => settings.amount_per_gain = value,
            LevelSetting::Cooldown(value) => settings.cooldown = value,
            LevelSetting::LevelLogChannel(value) => settings.level_log_channel_id = value,
            LevelSetting::ModLogChannel(value) => settings.mod_log_channel_id = value,
            LevelSetting::ModuleEnabled(value) => settings.module_enabled = value,
        }
    }
}

fn parse_positive(field: SettingField, raw: &str) -> Result<i64, LevelingError> {
    match raw.parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(LevelingError::InvalidSetting(format!(
            "{} must be a positive whole number, got `{}`",
            field, raw
        ))),
    }
}

/// Accepts `disable`, a raw id, or a `<#id>` mention.
fn parse_channel(
    field: SettingField,
    raw: &str,
    known_channels: &[u64],
) -> Result<Option<u64>, LevelingError> {
    if raw.eq_ignore_ascii_case(DISABLE_SENTINEL) {
        return Ok(None);
    }

    let digits = raw
        .strip_prefix("<#")
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(raw);

    match digits.parse::<u64>() {
        Ok(channel_id) if known_channels.contains(&channel_id) => Ok(Some(channel_id)),
        _ => Err(LevelingError::InvalidSetting(format!(
            "{} must be a channel in this server or `{}`, got `{}`",
            field, DISABLE_SENTINEL, raw
        ))),
    }
}
