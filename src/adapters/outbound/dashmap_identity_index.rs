//! DashMap Identity Index
//!
//! IP-keyed view of one identity kind, using DashMap for concurrent access.

use crate::domain::entities::{IdentityKind, IdentityRecord};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// Concurrent IP → identity index for a single resource kind.
///
/// A second map remembers the record of every object that claims an IP, so
/// that an IP change or a delete evicts exactly the stale entry. When the
/// owner of a shared IP goes away, the IP passes to a remaining claimant.
/// Records are inserted whole; readers never see a partially written entry.
pub struct IdentityIndex {
    kind: IdentityKind,
    /// ip -> record
    by_ip: DashMap<String, IdentityRecord>,
    /// namespace/name -> record, for objects with an IP
    claims: DashMap<String, IdentityRecord>,
    /// Set once the first full listing has been applied
    synced: AtomicBool,
}

impl IdentityIndex {
    pub fn new(kind: IdentityKind) -> Self {
        Self {
            kind,
            by_ip: DashMap::new(),
            claims: DashMap::new(),
            synced: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> IdentityKind {
        self.kind
    }

    /// Look up the identity owning `ip`.
    pub fn lookup(&self, ip: &str) -> Option<String> {
        self.by_ip.get(ip).map(|e| e.value().display_name())
    }

    /// Insert or update an object.
    pub fn upsert(&self, record: IdentityRecord) {
        let key = record.object_key();

        let previous = if record.has_ip() {
            self.claims
                .insert(key.clone(), record.clone())
                .map(|previous| previous.ip)
        } else {
            self.claims.remove(&key).map(|(_, previous)| previous.ip)
        };

        if let Some(old_ip) = previous {
            if old_ip != record.ip {
                self.remove_owned(&old_ip, &key);
            }
        }

        if record.has_ip() {
            self.by_ip.insert(record.ip.clone(), record);
        }
    }

    /// Remove an object.
    ///
    /// Falls back to the IP carried by the record when the object was never
    /// tracked, but only evicts an entry that belongs to this object.
    pub fn evict(&self, record: &IdentityRecord) {
        let key = record.object_key();
        let ip = self
            .claims
            .remove(&key)
            .map(|(_, claimed)| claimed.ip)
            .unwrap_or_else(|| record.ip.clone());
        self.remove_owned(&ip, &key);
    }

    /// Drop every object whose key is not in `live`. Returns how many were dropped.
    pub fn retain_objects(&self, live: &HashSet<String>) -> usize {
        let stale: Vec<(String, String)> = self
            .claims
            .iter()
            .filter(|e| !live.contains(e.key()))
            .map(|e| (e.key().clone(), e.value().ip.clone()))
            .collect();

        let count = stale.len();
        for (key, ip) in stale {
            self.claims.remove(&key);
            self.remove_owned(&ip, &key);
        }

        count
    }

    pub fn mark_synced(&self) {
        self.synced.store(true, Ordering::SeqCst);
    }

    /// Whether a full listing has been applied at least once.
    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::SeqCst)
    }

    /// Number of indexed IPs.
    pub fn len(&self) -> usize {
        self.by_ip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ip.is_empty()
    }

    /// Drop `ip` if `key` owns it, handing it to another claimant if any.
    fn remove_owned(&self, ip: &str, key: &str) {
        if self
            .by_ip
            .remove_if(ip, |_, owner| owner.object_key() == key)
            .is_none()
        {
            return;
        }

        let heir = self
            .claims
            .iter()
            .find(|e| e.value().ip == ip)
            .map(|e| e.value().clone());
        if let Some(heir) = heir {
            self.by_ip.insert(ip.to_string(), heir);
        }
    }
}
