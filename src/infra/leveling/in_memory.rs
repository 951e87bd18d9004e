// In-memory implementation of LevelStore.
//
// Backs the core service tests: same contract as the SQLite store, but
// nothing touches disk.

use crate::core::leveling::{
    GuildLevelSettings, IgnoreTarget, LevelStore, LevelingError, MemberBalance, NewXpEntry,
    Reward, Upsert, XpHistoryEntry, XpKind,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicI64, Ordering};

/// A composite key for looking up a member.
/// We need both user_id AND guild_id since users can be in multiple guilds.
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
struct MemberKey {
    user_id: u64,
    guild_id: u64,
}

/// In-memory implementation of LevelStore.
///
/// **DashMap:**
/// Each member's ledger sits behind its own shard lock, so an append and the
/// read that precedes it in the same call never interleave with another
/// writer for that member.
pub struct InMemoryLevelStore {
    /// Maps (user_id, guild_id) -> ledger entries in insertion order
    ledgers: DashMap<MemberKey, Vec<XpHistoryEntry>>,
    settings: DashMap<u64, GuildLevelSettings>,
    /// Keyed by role id, which is unique across guilds
    rewards: DashMap<u64, Reward>,
    ignored_members: DashSet<MemberKey>,
    ignored_roles: DashSet<u64>,
    ignored_channels: DashSet<u64>,
    next_entry_id: AtomicI64,
}

impl InMemoryLevelStore {
    pub fn new() -> Self {
        Self {
            ledgers: DashMap::new(),
            settings: DashMap::new(),
            rewards: DashMap::new(),
            ignored_members: DashSet::new(),
            ignored_roles: DashSet::new(),
            ignored_channels: DashSet::new(),
            next_entry_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_entry_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for InMemoryLevelStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LevelStore for InMemoryLevelStore {
    async fn get_settings(&self, guild_id: u64) -> Result<GuildLevelSettings, LevelingError> {
        Ok(self
            .settings
            .get(&guild_id)
            .map(|s| s.clone())
            .unwrap_or_else(|| GuildLevelSettings::default_for(guild_id)))
    }

    async fn save_settings(&self, settings: &GuildLevelSettings) -> Result<(), LevelingError> {
        self.settings.insert(settings.guild_id, settings.clone());
        Ok(())
    }

    async fn member_exists(&self, user_id: u64, guild_id: u64) -> Result<bool, LevelingError> {
        Ok(self.ledgers.contains_key(&MemberKey { user_id, guild_id }))
    }

    async fn create_member(
        &self,
        user_id: u64,
        guild_id: u64,
        now: DateTime<Utc>,
    ) -> Result<bool, LevelingError> {
        let key = MemberKey { user_id, guild_id };
        let mut created = false;

        // entry() holds the shard lock, so two concurrent creates can't both insert
        self.ledgers.entry(key).or_insert_with(|| {
            created = true;
            vec![NewXpEntry::created(user_id, guild_id, now).with_id(self.next_id())]
        });

        Ok(created)
    }

    async fn balance(&self, user_id: u64, guild_id: u64) -> Result<i64, LevelingError> {
        Ok(self
            .ledgers
            .get(&MemberKey { user_id, guild_id })
            .map(|ledger| ledger.iter().map(|e| e.amount).sum())
            .unwrap_or(0))
    }

    async fn latest_cooldown(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Option<DateTime<Utc>>, LevelingError> {
        Ok(self
            .ledgers
            .get(&MemberKey { user_id, guild_id })
            .and_then(|ledger| {
                ledger
                    .iter()
                    .rev()
                    .find(|e| e.kind == XpKind::Earned)
                    .map(|e| e.cooldown_until)
            }))
    }

    async fn append_entry(&self, entry: NewXpEntry) -> Result<XpHistoryEntry, LevelingError> {
        let key = MemberKey {
            user_id: entry.user_id,
            guild_id: entry.guild_id,
        };
        let mut ledger = self
            .ledgers
            .get_mut(&key)
            .ok_or(LevelingError::MemberNotFound(entry.user_id))?;

        let stored = entry.with_id(self.next_id());
        ledger.push(stored.clone());
        Ok(stored)
    }

    async fn history(
        &self,
        user_id: u64,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<XpHistoryEntry>, LevelingError> {
        Ok(self
            .ledgers
            .get(&MemberKey { user_id, guild_id })
            .map(|ledger| ledger.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn guild_balances(&self, guild_id: u64) -> Result<Vec<MemberBalance>, LevelingError> {
        Ok(self
            .ledgers
            .iter()
            .filter(|entry| entry.key().guild_id == guild_id)
            .map(|entry| MemberBalance {
                user_id: entry.key().user_id,
                balance: entry.value().iter().map(|e| e.amount).sum(),
            })
            .collect())
    }

    async fn is_member_ignored(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<bool, LevelingError> {
        Ok(self
            .ignored_members
            .contains(&MemberKey { user_id, guild_id }))
    }

    async fn any_role_ignored(&self, role_ids: &[u64]) -> Result<bool, LevelingError> {
        Ok(role_ids.iter().any(|id| self.ignored_roles.contains(id)))
    }

    async fn is_channel_ignored(&self, channel_id: u64) -> Result<bool, LevelingError> {
        Ok(self.ignored_channels.contains(&channel_id))
    }

    async fn set_ignored(
        &self,
        target: IgnoreTarget,
        ignored: bool,
    ) -> Result<(), LevelingError> {
        match (target, ignored) {
            (IgnoreTarget::Member { user_id, guild_id }, true) => {
                self.ignored_members.insert(MemberKey { user_id, guild_id });
            }
            (IgnoreTarget::Member { user_id, guild_id }, false) => {
                self.ignored_members.remove(&MemberKey { user_id, guild_id });
            }
            (IgnoreTarget::Role(role_id), true) => {
                self.ignored_roles.insert(role_id);
            }
            (IgnoreTarget::Role(role_id), false) => {
                self.ignored_roles.remove(&role_id);
            }
            (IgnoreTarget::Channel(channel_id), true) => {
                self.ignored_channels.insert(channel_id);
            }
            (IgnoreTarget::Channel(channel_id), false) => {
                self.ignored_channels.remove(&channel_id);
            }
        }
        Ok(())
    }

    async fn rewards(&self, guild_id: u64) -> Result<Vec<Reward>, LevelingError> {
        Ok(self
            .rewards
            .iter()
            .filter(|entry| entry.value().guild_id == guild_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn upsert_reward(&self, reward: Reward) -> Result<Upsert, LevelingError> {
        match self.rewards.insert(reward.role_id, reward) {
            Some(_) => Ok(Upsert::Updated),
            None => Ok(Upsert::Created),
        }
    }

    async fn delete_reward(&self, role_id: u64) -> Result<bool, LevelingError> {
        Ok(self.rewards.remove(&role_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_in_memory_ledger() {
        let store = InMemoryLevelStore::new();
        let now = Utc::now();

        // Unknown members have nothing
        assert_eq!(store.balance(123, 456).await.unwrap(), 0);
        assert!(!store.member_exists(123, 456).await.unwrap());

        assert!(store.create_member(123, 456, now).await.unwrap());
        assert!(!store.create_member(123, 456, now).await.unwrap());
        assert_eq!(store.balance(123, 456).await.unwrap(), 0);

        store
            .append_entry(NewXpEntry::awarded(123, 456, 100, 1, now))
            .await
            .unwrap();
        store
            .append_entry(NewXpEntry::reclaimed(123, 456, 30, None, now))
            .await
            .unwrap();
        assert_eq!(store.balance(123, 456).await.unwrap(), 70);
    }

    #[tokio::test]
    async fn append_requires_member() {
        let store = InMemoryLevelStore::new();

        let err = store
            .append_entry(NewXpEntry::awarded(1, 2, 10, 3, Utc::now()))
            .await
            .unwrap_err();

        assert!(matches!(err, LevelingError::MemberNotFound(1)));
    }

    #[tokio::test]
    async fn latest_cooldown_uses_earned_entries() {
        let store = InMemoryLevelStore::new();
        let now = Utc::now();
        store.create_member(1, 2, now).await.unwrap();

        assert_eq!(store.latest_cooldown(1, 2).await.unwrap(), None);

        store
            .append_entry(NewXpEntry::earned(1, 2, 15, now, Duration::minutes(2)))
            .await
            .unwrap();
        store
            .append_entry(NewXpEntry::awarded(1, 2, 15, 9, now))
            .await
            .unwrap();

        assert_eq!(
            store.latest_cooldown(1, 2).await.unwrap(),
            Some(now + Duration::minutes(2))
        );
    }

    #[tokio::test]
    async fn test_guild_balances() {
        let store = InMemoryLevelStore::new();
        let now = Utc::now();

        for (user_id, guild_id, amount) in [(1, 100, 500), (2, 100, 300), (3, 200, 700)] {
            store.create_member(user_id, guild_id, now).await.unwrap();
            store
                .append_entry(NewXpEntry::awarded(user_id, guild_id, amount, 9, now))
                .await
                .unwrap();
        }

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
                    balance: 300,
                },
            ]
        );
    }

    #[tokio::test]
    async fn rewards_are_scoped_to_guild() {
        let store = InMemoryLevelStore::new();
        let reward = |role_id, guild_id| Reward {
            role_id,
            guild_id,
            reward_level: 1,
            message: None,
        };

        assert_eq!(store.upsert_reward(reward(1, 10)).await.unwrap(), Upsert::Created);
        assert_eq!(store.upsert_reward(reward(2, 20)).await.unwrap(), Upsert::Created);
        assert_eq!(store.upsert_reward(reward(1, 10)).await.unwrap(), Upsert::Updated);

        assert_eq!(store.rewards(10).await.unwrap().len(), 1);
        assert!(store.delete_reward(2).await.unwrap());
        assert!(!store.delete_reward(2).await.unwrap());
    }
}
