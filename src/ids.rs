//! User/group cache, backing owner-name resolution and the `-nouser`/
//! `-nogroup` predicates.
//!
//! `spec.md` §9's open question: this cache treats an absent entry as
//! "not found" rather than an error, documented here rather than guessing
//! a stricter interpretation: `nix::unistd::User::from_uid` returning
//! `Ok(None)` and an actual lookup error both currently fall through to
//! "not found" for `-nouser`/`-nogroup`'s purposes, since POSIX does not
//! distinguish "no such user" from "directory service unavailable" at this
//! API surface in a way the evaluator can act on differently.

use std::cell::RefCell;
use std::collections::HashMap;

use nix::unistd::{Gid, Group, Uid, User};

pub struct IdCache {
    users: RefCell<HashMap<u32, Option<String>>>,
    groups: RefCell<HashMap<u32, Option<String>>>,
}

impl IdCache {
    pub fn new() -> Self {
        IdCache {
            users: RefCell::new(HashMap::new()),
            groups: RefCell::new(HashMap::new()),
        }
    }

    /// `true` when `uid` does not resolve to a known user (`-nouser`).
    pub fn is_nouser(&self, uid: u32) -> bool {
        self.username(uid).is_none()
    }

    /// `true` when `gid` does not resolve to a known group (`-nogroup`).
    pub fn is_nogroup(&self, gid: u32) -> bool {
        self.groupname(gid).is_none()
    }

    pub fn username(&self, uid: u32) -> Option<String> {
        if let Some(cached) = self.users.borrow().get(&uid) {
            return cached.clone();
        }
        let resolved = User::from_uid(Uid::from_raw(uid))
            .ok()
            .flatten()
            .map(|u| u.name);
        self.users.borrow_mut().insert(uid, resolved.clone());
        resolved
    }

    pub fn groupname(&self, gid: u32) -> Option<String> {
        if let Some(cached) = self.groups.borrow().get(&gid) {
            return cached.clone();
        }
        let resolved = Group::from_gid(Gid::from_raw(gid))
            .ok()
            .flatten()
            .map(|g| g.name);
        self.groups.borrow_mut().insert(gid, resolved.clone());
        resolved
    }
}

impl Default for IdCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_lookup_results() {
        let cache = IdCache::new();
        let first = cache.username(0);
        let second = cache.username(0);
        assert_eq!(first, second);
    }

    #[test]
    fn absurd_uid_is_nouser() {
        let cache = IdCache::new();
        assert!(cache.is_nouser(u32::MAX));
    }
}
