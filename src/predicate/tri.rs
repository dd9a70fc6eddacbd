//! Platform tri-state probes for `-acl`, `-capable`, and `-xattr`.
//!
//! `spec.md` §9: these should return an explicit `{Yes, No, Error}` so
//! callers can distinguish "feature absent" from "feature present but
//! returned no". `SPEC_FULL.md` §9 records the scope decision behind this
//! file: no ACL/capability crate is available anywhere in the dependency
//! stack this implementation draws from, so both probes are built on the
//! `xattr` crate (already a teacher dependency, and the basis of the
//! teacher's own unfinished `XAttrFilter`) by checking for the extended
//! attribute names the Linux ACL/capability implementations store their
//! state under.

use std::ffi::OsString;
use std::path::Path;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TriState {
    Yes,
    No,
    Error,
}

impl TriState {
    /// Fold to a plain bool for the expression walker: `Error` behaves
    /// like `No` for the purposes of the returned truth value, but the
    /// caller must still report it (see `predicate::eval`).
    pub fn as_bool(self) -> bool {
        matches!(self, TriState::Yes)
    }

    pub fn is_error(self) -> bool {
        matches!(self, TriState::Error)
    }
}

fn has_xattr(path: &Path, name: &str) -> TriState {
    match xattr::get(path, name) {
        Ok(Some(_)) => TriState::Yes,
        Ok(None) => TriState::No,
        Err(_) => TriState::Error,
    }
}

/// `-acl`: does the file carry a non-trivial POSIX.1e ACL?
pub fn probe_acl(path: &Path) -> TriState {
    match has_xattr(path, "system.posix_acl_access") {
        TriState::Yes => TriState::Yes,
        TriState::No => has_xattr(path, "system.posix_acl_default"),
        TriState::Error => TriState::Error,
    }
}

/// `-capable`: does the file carry a Linux file capability set?
pub fn probe_capable(path: &Path) -> TriState {
    has_xattr(path, "security.capability")
}

/// `-xattr`/`-xattrname name`: names an extended attribute to look up,
/// optionally with an expected value.
#[derive(Debug, Clone)]
pub enum XAttrTest {
    Has(OsString),
    Matches(OsString, Vec<u8>),
}

impl XAttrTest {
    pub fn from_string(input: &str) -> Self {
        match input.split_once('=') {
            Some((name, value)) => XAttrTest::Matches(name.into(), value.as_bytes().to_vec()),
            None => XAttrTest::Has(input.into()),
        }
    }

    pub fn probe(&self, path: &Path) -> TriState {
        match self {
            XAttrTest::Has(name) => match xattr::get(path, name) {
                Ok(Some(_)) => TriState::Yes,
                Ok(None) => TriState::No,
                Err(_) => TriState::Error,
            },
            XAttrTest::Matches(name, expected) => match xattr::get(path, name) {
                Ok(Some(value)) => {
                    if &value == expected {
                        TriState::Yes
                    } else {
                        TriState::No
                    }
                }
                Ok(None) => TriState::No,
                Err(_) => TriState::Error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_name_as_has() {
        match XAttrTest::from_string("user.comment") {
            XAttrTest::Has(name) => assert_eq!(name, "user.comment"),
            _ => panic!("expected Has"),
        }
    }

    #[test]
    fn parses_name_value_as_matches() {
        match XAttrTest::from_string("user.comment=hello") {
            XAttrTest::Matches(name, value) => {
                assert_eq!(name, "user.comment");
                assert_eq!(value, b"hello");
            }
            _ => panic!("expected Matches"),
        }
    }

    #[test]
    fn missing_file_is_error_not_panic() {
        let probe = probe_acl(Path::new("/nonexistent/path/for/bfind/tests"));
        assert_eq!(probe, TriState::Error);
    }
}
