//! The presence registry: live channels per merchant and per user.
//!
//! A merchant is *online* while its entry exists. The entry is created by
//! [`PresenceRegistry::mark_online`], dropped whole by
//! [`PresenceRegistry::mark_offline`], and dropped implicitly when
//! [`PresenceRegistry::channel_closed`] removes its last channel. Every
//! removal is idempotent.
//!
//! Users never appear in the online-merchant snapshot; their channels are
//! tracked only so lifecycle events can reach them.

use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Mutex, MutexGuard, PoisonError},
};

use escrowmatch_types::{ChannelId, MerchantId, UserId};

use crate::ChannelHandle;

/// Party id → its open channels. An entry never has an empty channel map.
struct ChannelTable<K> {
    entries: HashMap<K, HashMap<ChannelId, ChannelHandle>>,
}

impl<K: Copy + Eq + Hash> ChannelTable<K> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns `true` if this created the entry.
    fn add(&mut self, key: K, channel: ChannelHandle) -> bool {
        let created = !self.entries.contains_key(&key);
        self.entries
            .entry(key)
            .or_default()
            .insert(channel.id(), channel);
        created
    }

    /// Returns `true` if an entry was removed.
    fn remove(&mut self, key: K) -> bool {
        self.entries.remove(&key).is_some()
    }

    /// Returns `true` if this emptied and removed the entry.
    fn remove_channel(&mut self, key: K, channel_id: ChannelId) -> bool {
        let Some(channels) = self.entries.get_mut(&key) else {
            return false;
        };
        channels.remove(&channel_id);
        if channels.is_empty() {
            self.entries.remove(&key);
            true
        } else {
            false
        }
    }

    fn channels_of(&self, key: K, out: &mut Vec<(K, ChannelHandle)>) {
        if let Some(channels) = self.entries.get(&key) {
            out.extend(channels.values().map(|c| (key, c.clone())));
        }
    }

    fn channel_count(&self, key: K) -> usize {
        self.entries.get(&key).map_or(0, HashMap::len)
    }
}

struct Inner {
    merchants: ChannelTable<MerchantId>,
    users: ChannelTable<UserId>,
}

/// Shared registry of reachable parties.
///
/// All operations take one mutex and hold it only for map updates and
/// cloning channel handles; none performs I/O.
pub struct PresenceRegistry {
    inner: Mutex<Inner>,
}

impl PresenceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                merchants: ChannelTable::new(),
                users: ChannelTable::new(),
            }),
        }
    }

    // Each operation leaves the maps consistent before it can panic, so a
    // poisoned guard is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------
    // Merchants
    // -----------------------------------------------------------------

    /// Add `channel` to the merchant's entry, creating it if absent.
    pub fn mark_online(&self, merchant_id: MerchantId, channel: ChannelHandle) {
        let channel_id = channel.id();
        let created = self.lock().merchants.add(merchant_id, channel);
        tracing::debug!(%merchant_id, %channel_id, created, "merchant online");
    }

    /// Remove the merchant's entry regardless of how many channels it has.
    ///
    /// Returns `true` if an entry existed.
    pub fn mark_offline(&self, merchant_id: MerchantId) -> bool {
        let removed = self.lock().merchants.remove(merchant_id);
        tracing::debug!(%merchant_id, removed, "merchant offline");
        removed
    }

    /// Remove one channel; drop the entry if it was the last one.
    ///
    /// Returns `true` if the merchant went offline as a result.
    pub fn channel_closed(&self, merchant_id: MerchantId, channel_id: ChannelId) -> bool {
        let went_offline = self.lock().merchants.remove_channel(merchant_id, channel_id);
        tracing::debug!(%merchant_id, %channel_id, went_offline, "merchant channel closed");
        went_offline
    }

    /// Merchants with at least one open channel, at this instant.
    ///
    /// Sorted for stable output. Callers must not cache the result.
    #[must_use]
    pub fn snapshot_online_merchants(&self) -> Vec<MerchantId> {
        let mut ids: Vec<MerchantId> = self.lock().merchants.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn is_online(&self, merchant_id: MerchantId) -> bool {
        self.lock().merchants.entries.contains_key(&merchant_id)
    }

    #[must_use]
    pub fn online_merchant_count(&self) -> usize {
        self.lock().merchants.entries.len()
    }

    #[must_use]
    pub fn merchant_channel_count(&self, merchant_id: MerchantId) -> usize {
        self.lock().merchants.channel_count(merchant_id)
    }

    /// Clones of the live channels for `merchant_ids`, taken under the lock.
    #[must_use]
    pub fn merchant_channels(&self, merchant_ids: &[MerchantId]) -> Vec<(MerchantId, ChannelHandle)> {
        let inner = self.lock();
        let mut out = Vec::new();
        for id in merchant_ids {
            inner.merchants.channels_of(*id, &mut out);
        }
        out
    }

    // -----------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------

    /// Register a channel on which the user wants lifecycle events.
    pub fn attach_user(&self, user_id: UserId, channel: ChannelHandle) {
        let channel_id = channel.id();
        self.lock().users.add(user_id, channel);
        tracing::debug!(%user_id, %channel_id, "user channel attached");
    }

    /// Remove one of the user's channels. Idempotent.
    pub fn user_channel_closed(&self, user_id: UserId, channel_id: ChannelId) {
        self.lock().users.remove_channel(user_id, channel_id);
        tracing::debug!(%user_id, %channel_id, "user channel closed");
    }

    /// Forget every channel of the user. Idempotent.
    pub fn detach_user(&self, user_id: UserId) -> bool {
        self.lock().users.remove(user_id)
    }

    #[must_use]
    pub fn user_channels(&self, user_id: UserId) -> Vec<(UserId, ChannelHandle)> {
        let mut out = Vec::new();
        self.lock().users.channels_of(user_id, &mut out);
        out
    }

    #[must_use]
    pub fn user_channel_count(&self, user_id: UserId) -> usize {
        self.lock().users.channel_count(user_id)
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
