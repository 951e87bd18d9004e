// SQLite-backed level store.
//
// Tables:
// - members: one row per (user, guild) ever observed
// - xp_history: the append-only ledger; balances are SUM(amount)
// - level_rewards: level -> role thresholds, keyed by role id
// - guild_level_settings: per-guild curve, gain amount, cooldown and log channels
// - ignored_members / ignored_roles / ignored_channels: presence means "no passive XP"

use crate::core::leveling::{
    GuildLevelSettings, IgnoreTarget, LevelStore, LevelingError, MemberBalance, NewXpEntry,
    Reward, Upsert, XpHistoryEntry, XpKind,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub struct SqliteLevelStore {
    pool: Pool<Sqlite>,
}

fn storage_err(e: sqlx::Error) -> LevelingError {
    LevelingError::StorageError(e.to_string())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, LevelingError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LevelingError::StorageError(format!("bad timestamp `{}`: {}", value, e)))
}

impl SqliteLevelStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&conn_str)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS members (
                user_id INTEGER NOT NULL,
                guild_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (user_id, guild_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS xp_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                guild_id INTEGER NOT NULL,
                amount INTEGER NOT NULL,
                kind TEXT NOT NULL,
                earned_at TEXT NOT NULL,
                cooldown_until TEXT NOT NULL,
                awarder_id INTEGER
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_xp_history_member
            ON xp_history(user_id, guild_id, id DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS level_rewards (
                role_id INTEGER PRIMARY KEY,
                guild_id INTEGER NOT NULL,
                reward_level INTEGER NOT NULL,
                message TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS guild_level_settings (
                guild_id INTEGER PRIMARY KEY,
                base INTEGER NOT NULL,
                modifier INTEGER NOT NULL,
                amount_per_gain INTEGER NOT NULL,
                cooldown_minutes INTEGER NOT NULL,
                level_log_channel_id INTEGER,
                mod_log_channel_id INTEGER,
                module_enabled BOOLEAN NOT NULL DEFAULT 1
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ignored_members (
                user_id INTEGER NOT NULL,
                guild_id INTEGER NOT NULL,
                PRIMARY KEY (user_id, guild_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE TABLE IF NOT EXISTS ignored_roles (role_id INTEGER PRIMARY KEY)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS ignored_channels (channel_id INTEGER PRIMARY KEY)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<XpHistoryEntry, LevelingError> {
    let kind: String = row.get("kind");
    let earned_at: String = row.get("earned_at");
    let cooldown_until: String = row.get("cooldown_until");

    Ok(XpHistoryEntry {
        id: row.get("id"),
        user_id: row.get::<i64, _>("user_id") as u64,
        guild_id: row.get::<i64, _>("guild_id") as u64,
        amount: row.get("amount"),
        kind: XpKind::parse(&kind).ok_or_else(|| {
            LevelingError::StorageError(format!("unknown ledger entry kind `{}`", kind))
        })?,
        earned_at: parse_timestamp(&earned_at)?,
        cooldown_until: parse_timestamp(&cooldown_until)?,
        awarder_id: row
            .get::<Option<i64>, _>("awarder_id")
            .map(|id| id as u64),
    })
}

#[async_trait]
impl LevelStore for SqliteLevelStore {
    async fn get_settings(&self, guild_id: u64) -> Result<GuildLevelSettings, LevelingError> {
        let row = sqlx::query("SELECT * FROM guild_level_settings WHERE guild_id = ?")
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        if let Some(row) = row {
            Ok(GuildLevelSettings {
                guild_id,
                base: row.get("base"),
                modifier: row.get("modifier"),
                amount_per_gain: row.get("amount_per_gain"),
                cooldown: Duration::try_minutes(row.get::<i64, _>("cooldown_minutes"))
                    .unwrap_or_else(Duration::zero),
                level_log_channel_id: row
                    .get::<Option<i64>, _>("level_log_channel_id")
                    .map(|id| id as u64),
                mod_log_channel_id: row
                    .get::<Option<i64>, _>("mod_log_channel_id")
                    .map(|id| id as u64),
                module_enabled: row.get("module_enabled"),
            })
        } else {
            // Return default settings if the guild never changed anything
            Ok(GuildLevelSettings::default_for(guild_id))
        }
    }

    async fn save_settings(&self, settings: &GuildLevelSettings) -> Result<(), LevelingError> {
        sqlx::query(
            r#"
            INSERT INTO guild_level_settings (
                guild_id, base, modifier, amount_per_gain, cooldown_minutes,
                level_log_channel_id, mod_log_channel_id, module_enabled
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET
                base = excluded.base,
                modifier = excluded.modifier,
                amount_per_gain = excluded.amount_per_gain,
                cooldown_minutes = excluded.cooldown_minutes,
                level_log_channel_id = excluded.level_log_channel_id,
                mod_log_channel_id = excluded.mod_log_channel_id,
                module_enabled = excluded.module_enabled
            "#,
        )
        .bind(settings.guild_id as i64)
        .bind(settings.base)
        .bind(settings.modifier)
        .bind(settings.amount_per_gain)
        .bind(settings.cooldown.num_minutes())
        .bind(settings.level_log_channel_id.map(|id| id as i64))
        .bind(settings.mod_log_channel_id.map(|id| id as i64))
        .bind(settings.module_enabled)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn member_exists(&self, user_id: u64, guild_id: u64) -> Result<bool, LevelingError> {
        let row = sqlx::query("SELECT 1 FROM members WHERE user_id = ? AND guild_id = ?")
            .bind(user_id as i64)
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(row.is_some())
    }

    async fn create_member(
        &self,
        user_id: u64,
        guild_id: u64,
        now: DateTime<Utc>,
    ) -> Result<bool, LevelingError> {
        // Member row and its Created entry land together or not at all
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO members (user_id, guild_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?
        .rows_affected()
            == 1;

        if inserted {
            let entry = NewXpEntry::created(user_id, guild_id, now);
            sqlx::query(
                r#"
                INSERT INTO xp_history (user_id, guild_id, amount, kind, earned_at, cooldown_until, awarder_id)
                VALUES (?, ?, ?, ?, ?, ?, NULL)
                "#,
            )
            .bind(user_id as i64)
            .bind(guild_id as i64)
            .bind(entry.amount)
            .bind(entry.kind.as_str())
            .bind(entry.earned_at.to_rfc3339())
            .bind(entry.cooldown_until.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;
        }

        tx.commit().await.map_err(storage_err)?;
        Ok(inserted)
    }

    async fn balance(&self, user_id: u64, guild_id: u64) -> Result<i64, LevelingError> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount), 0) AS balance FROM xp_history WHERE user_id = ? AND guild_id = ?",
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.get::<i64, _>("balance"))
    }

    async fn latest_cooldown(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Option<DateTime<Utc>>, LevelingError> {
        let row = sqlx::query(
            r#"
            SELECT cooldown_until FROM xp_history
            WHERE user_id = ? AND guild_id = ? AND kind = ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .bind(XpKind::Earned.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        row.map(|r| parse_timestamp(&r.get::<String, _>("cooldown_until")))
            .transpose()
    }

    async fn append_entry(&self, entry: NewXpEntry) -> Result<XpHistoryEntry, LevelingError> {
        // Single statement: the row is only written when the member exists
        let result = sqlx::query(
            r#"
            INSERT INTO xp_history (user_id, guild_id, amount, kind, earned_at, cooldown_until, awarder_id)
            SELECT ?, ?, ?, ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM members WHERE user_id = ? AND guild_id = ?)
            "#,
        )
        .bind(entry.user_id as i64)
        .bind(entry.guild_id as i64)
        .bind(entry.amount)
        .bind(entry.kind.as_str())
        .bind(entry.earned_at.to_rfc3339())
        .bind(entry.cooldown_until.to_rfc3339())
        .bind(entry.awarder_id.map(|id| id as i64))
        .bind(entry.user_id as i64)
        .bind(entry.guild_id as i64)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Err(LevelingError::MemberNotFound(entry.user_id));
        }

        Ok(entry.with_id(result.last_insert_rowid()))
    }

    async fn history(
        &self,
        user_id: u64,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<XpHistoryEntry>, LevelingError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM xp_history
            WHERE user_id = ? AND guild_id = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .bind(limit.min(i64::MAX as usize) as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn guild_balances(&self, guild_id: u64) -> Result<Vec<MemberBalance>, LevelingError> {
        let rows = sqlx::query(
            r#"
            SELECT m.user_id AS user_id, COALESCE(SUM(h.amount), 0) AS balance
            FROM members m
            LEFT JOIN xp_history h ON h.user_id = m.user_id AND h.guild_id = m.guild_id
            WHERE m.guild_id = ?
            GROUP BY m.user_id
            "#,
        )
        .bind(guild_id as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(rows
            .iter()
            .map(|row| MemberBalance {
                user_id: row.get::<i64, _>("user_id") as u64,
                balance: row.get::<i64, _>("balance"),
            })
            .collect())
    }

    async fn is_member_ignored(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<bool, LevelingError> {
        let row = sqlx::query("SELECT 1 FROM ignored_members WHERE user_id = ? AND guild_id = ?")
            .bind(user_id as i64)
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(row.is_some())
    }

    async fn any_role_ignored(&self, role_ids: &[u64]) -> Result<bool, LevelingError> {
        if role_ids.is_empty() {
            return Ok(false);
        }

        let placeholders = vec!["?"; role_ids.len()].join(", ");
        let sql = format!(
            "SELECT 1 FROM ignored_roles WHERE role_id IN ({}) LIMIT 1",
            placeholders
        );
        let mut query = sqlx::query(&sql);
        for role_id in role_ids {
            query = query.bind(*role_id as i64);
        }

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(row.is_some())
    }

    async fn is_channel_ignored(&self, channel_id: u64) -> Result<bool, LevelingError> {
        let row = sqlx::query("SELECT 1 FROM ignored_channels WHERE channel_id = ?")
            .bind(channel_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(row.is_some())
    }

    async fn set_ignored(
        &self,
        target: IgnoreTarget,
        ignored: bool,
    ) -> Result<(), LevelingError> {
        let query = match (target, ignored) {
            (IgnoreTarget::Member { user_id, guild_id }, true) => {
                sqlx::query("INSERT OR IGNORE INTO ignored_members (user_id, guild_id) VALUES (?, ?)")
                    .bind(user_id as i64)
                    .bind(guild_id as i64)
            }
            (IgnoreTarget::Member { user_id, guild_id }, false) => {
                sqlx::query("DELETE FROM ignored_members WHERE user_id = ? AND guild_id = ?")
                    .bind(user_id as i64)
                    .bind(guild_id as i64)
            }
            (IgnoreTarget::Role(role_id), true) => {
                sqlx::query("INSERT OR IGNORE INTO ignored_roles (role_id) VALUES (?)")
                    .bind(role_id as i64)
            }
            (IgnoreTarget::Role(role_id), false) => {
                sqlx::query("DELETE FROM ignored_roles WHERE role_id = ?").bind(role_id as i64)
            }
            (IgnoreTarget::Channel(channel_id), true) => {
                sqlx::query("INSERT OR IGNORE INTO ignored_channels (channel_id) VALUES (?)")
                    .bind(channel_id as i64)
            }
            (IgnoreTarget::Channel(channel_id), false) => {
                sqlx::query("DELETE FROM ignored_channels WHERE channel_id = ?")
                    .bind(channel_id as i64)
            }
        };

        query.execute(&self.pool).await.map_err(storage_err)?;
        Ok(())
    }

    async fn rewards(&self, guild_id: u64) -> Result<Vec<Reward>, LevelingError> {
        let rows = sqlx::query(
            "SELECT role_id, guild_id, reward_level, message FROM level_rewards WHERE guild_id = ?",
        )
        .bind(guild_id as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(rows
            .iter()
            .map(|row| Reward {
                role_id: row.get::<i64, _>("role_id") as u64,
                guild_id: row.get::<i64, _>("guild_id") as u64,
                reward_level: row.get::<i64, _>("reward_level") as u32,
                message: row.get("message"),
            })
            .collect())
    }

    async fn upsert_reward(&self, reward: Reward) -> Result<Upsert, LevelingError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let existing = sqlx::query("SELECT 1 FROM level_rewards WHERE role_id = ?")
            .bind(reward.role_id as i64)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_err)?;

        sqlx::query(
            r#"
            INSERT INTO level_rewards (role_id, guild_id, reward_level, message)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(role_id) DO UPDATE SET
                guild_id = excluded.guild_id,
                reward_level = excluded.reward_level,
                message = excluded.message
            "#,
        )
        .bind(reward.role_id as i64)
        .bind(reward.guild_id as i64)
        .bind(reward.reward_level as i64)
        .bind(reward.message)
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;

        Ok(if existing.is_some() {
            Upsert::Updated
        } else {
            Upsert::Created
        })
    }

    async fn delete_reward(&self, role_id: u64) -> Result<bool, LevelingError> {
        let result = sqlx::query("DELETE FROM level_rewards WHERE role_id = ?")
            .bind(role_id as i64)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn make_store() -> (SqliteLevelStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leveling.db");
        let store = SqliteLevelStore::new(path.to_str().unwrap()).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn ledger_round_trip() {
        let (store, _dir) = make_store().await;
        let now = Utc::now();

        assert!(store.create_member(1, 2, now).await.unwrap());
        assert!(!store.create_member(1, 2, now).await.unwrap());

        store
            .append_entry(NewXpEntry::earned(1, 2, 15, now, Duration::minutes(1)))
            .await
            .unwrap();
        let awarded = store
            .append_entry(NewXpEntry::awarded(1, 2, 100, 77, now))
            .await
            .unwrap();
        store
            .append_entry(NewXpEntry::reclaimed(1, 2, 40, Some(77), now))
            .await
            .unwrap();

        assert_eq!(store.balance(1, 2).await.unwrap(), 75);

        let history = store.history(1, 2, 10).await.unwrap();
        let kinds: Vec<XpKind> = history.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![XpKind::Reclaimed, XpKind::Awarded, XpKind::Earned, XpKind::Created]
        );
        assert_eq!(history[1].id, awarded.id);
        assert_eq!(history[1].awarder_id, Some(77));
        assert_eq!(history[0].amount, -40);
        assert_eq!(history.iter().map(|e| e.amount).sum::<i64>(), 75);
    }

    #[tokio::test]
    async fn append_for_unknown_member_writes_nothing() {
        let (store, _dir) = make_store().await;

        let err = store
            .append_entry(NewXpEntry::awarded(5, 6, 10, 1, Utc::now()))
            .await
            .unwrap_err();

        assert!(matches!(err, LevelingError::MemberNotFound(5)));
        assert!(store.history(5, 6, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn latest_cooldown_reads_last_earned_entry() {
        let (store, _dir) = make_store().await;
        let now = Utc::now();
        store.create_member(1, 2, now).await.unwrap();

        assert_eq!(store.latest_cooldown(1, 2).await.unwrap(), None);

        store
            .append_entry(NewXpEntry::earned(1, 2, 15, now, Duration::minutes(3)))
            .await
            .unwrap();
        store
            .append_entry(NewXpEntry::awarded(1, 2, 15, 9, now))
            .await
            .unwrap();

        let cooldown = store.latest_cooldown(1, 2).await.unwrap().unwrap();
        // RFC3339 keeps sub-second precision
        assert_eq!(cooldown, now + Duration::minutes(3));
    }

    #[tokio::test]
    async fn settings_default_then_persist() {
        let (store, _dir) = make_store().await;

        let mut settings = store.get_settings(9).await.unwrap();
        assert_eq!(settings, GuildLevelSettings::default_for(9));

        settings.cooldown = Duration::minutes(7);
        settings.level_log_channel_id = Some(1234);
        settings.module_enabled = false;
        store.save_settings(&settings).await.unwrap();

        assert_eq!(store.get_settings(9).await.unwrap(), settings);
    }

    #[tokio::test]
    async fn longest_cooldown_survives_a_round_trip() {
        use crate::core::leveling::settings::MAX_COOLDOWN_MINUTES;
        use crate::core::leveling::{GainRequest, LevelSetting, LevelingService, SettingField};

        let (store, _dir) = make_store().await;
        let service = LevelingService::new(store);
        let request = || GainRequest {
            guild_id: 2,
            user_id: 1,
            channel_id: 3,
            role_ids: vec![],
        };

        // Far-future cooldowns would land past year 9999 and stop parsing
        let err = LevelSetting::parse(SettingField::Cooldown, "10000000000", &[]).unwrap_err();
        assert!(matches!(err, LevelingError::InvalidSetting(_)));
        let huge = Duration::try_minutes(10_000_000_000).unwrap();
        let err = service
            .set_setting(2, LevelSetting::Cooldown(huge))
            .await
            .unwrap_err();
        assert!(matches!(err, LevelingError::InvalidSetting(_)));

        service
            .set_setting(2, LevelSetting::Cooldown(Duration::minutes(MAX_COOLDOWN_MINUTES)))
            .await
            .unwrap();

        assert!(service.gain(request()).await.unwrap().success);
        assert!(!service.gain(request()).await.unwrap().success);

        let history = service.history(2, 1, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, XpKind::Earned);
    }

    #[tokio::test]
    async fn guild_balances_include_every_member() {
        let (store, _dir) = make_store().await;
        let now = Utc::now();

        store.create_member(1, 100, now).await.unwrap();
        store.create_member(2, 100, now).await.unwrap();
        store.create_member(3, 200, now).await.unwrap();
        store
            .append_entry(NewXpEntry::awarded(1, 100, 500, 9, now))
            .await
            .unwrap();

        let mut balances = store.guild_balances(100).await.unwrap();
        balances.sort_by_key(|b| b.user_id);

        assert_eq!(
            balances,
            vec![
                MemberBalance {
                    user_id: 1,
                    balance: 500,
                },
                MemberBalance {
                    user_id: 2,
                    balance: 0,
                },
            ]
        );
    }

    #[tokio::test]
    async fn ignore_flags_toggle() {
        let (store, _dir) = make_store().await;

        store.set_ignored(IgnoreTarget::Role(5), true).await.unwrap();
        store.set_ignored(IgnoreTarget::Role(5), true).await.unwrap();
        store.set_ignored(IgnoreTarget::Channel(8), true).await.unwrap();
        store
            .set_ignored(
                IgnoreTarget::Member {
                    user_id: 1,
                    guild_id: 2,
                },
                true,
            )
            .await
            .unwrap();

        assert!(store.any_role_ignored(&[4, 5, 6]).await.unwrap());
        assert!(!store.any_role_ignored(&[4, 6]).await.unwrap());
        assert!(!store.any_role_ignored(&[]).await.unwrap());
        assert!(store.is_channel_ignored(8).await.unwrap());
        assert!(store.is_member_ignored(1, 2).await.unwrap());

        store.set_ignored(IgnoreTarget::Role(5), false).await.unwrap();
        assert!(!store.any_role_ignored(&[5]).await.unwrap());
    }

    #[tokio::test]
    async fn rewards_upsert_and_delete() {
        let (store, _dir) = make_store().await;
        let reward = Reward {
            role_id: 42,
            guild_id: 1,
            reward_level: 5,
            message: Some("Nice!".to_string()),
        };

        assert_eq!(store.upsert_reward(reward.clone()).await.unwrap(), Upsert::Created);
        let updated = Reward {
            reward_level: 8,
            message: None,
            ..reward
        };
        assert_eq!(store.upsert_reward(updated.clone()).await.unwrap(), Upsert::Updated);

        assert_eq!(store.rewards(1).await.unwrap(), vec![updated]);
        assert!(store.delete_reward(42).await.unwrap());
        assert!(!store.delete_reward(42).await.unwrap());
    }
}
