//! Minimal mount-table lookup, backing the `-fstype` predicate.
//!
//! `spec.md` §1 names the mount-table lookup as an external collaborator
//! outside the evaluator's subject matter. This is the smallest workable
//! implementation: a lazily-parsed `/proc/mounts` snapshot mapping device
//! number to filesystem type name. Non-Linux targets get an empty table —
//! `-fstype` then simply never matches, which is an honest degradation
//! rather than a wrong answer.

use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::MetadataExt;

pub struct MountTable {
    /// `st_dev` -> filesystem type name (e.g. "ext4", "tmpfs").
    by_dev: HashMap<u64, String>,
}

impl MountTable {
    /// Parse the system mount table once. Parse failures yield an empty
    /// table instead of propagating: `-fstype` is a convenience predicate,
    /// not something the rest of the evaluator depends on to function.
    pub fn load() -> Self {
        let mut by_dev = HashMap::new();
        if let Ok(contents) = fs::read_to_string("/proc/mounts") {
            for line in contents.lines() {
                let mut fields = line.split_whitespace();
                let _source = fields.next();
                let Some(mount_point) = fields.next() else {
                    continue;
                };
                let Some(fstype) = fields.next() else {
                    continue;
                };
                if let Ok(meta) = fs::metadata(mount_point) {
                    by_dev.insert(meta.dev(), fstype.to_string());
                }
            }
        }
        MountTable { by_dev }
    }

    pub fn lookup(&self, dev: u64) -> Option<&str> {
        self.by_dev.get(&dev).map(String::as_str)
    }
}

impl Default for MountTable {
    fn default() -> Self {
        Self::load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_device_is_none() {
        let table = MountTable {
            by_dev: HashMap::new(),
        };
        assert_eq!(table.lookup(12345), None);
    }

    #[test]
    fn known_device_resolves() {
        let mut by_dev = HashMap::new();
        by_dev.insert(7, "ext4".to_string());
        let table = MountTable { by_dev };
        assert_eq!(table.lookup(7), Some("ext4"));
    }
}
