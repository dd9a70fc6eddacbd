use std::cell::{Cell, OnceCell};
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;

use crate::flags::StatFlags;
use crate::predicate::typeflag::{typeflag_of, TypeMask};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VisitKind {
    Pre,
    Post,
}

/// The action the traversal driver should take after a visit, returned by
/// the callback (`spec.md` §3/§6).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VisitAction {
    Continue,
    Prune,
    Stop,
}

/// Per-visit state (`spec.md` §3). Borrows the current entry from the
/// traversal driver; carries the mutable action slot and `quit` flag the
/// evaluator writes to.
///
/// `at_fd` always reads `None` here: the traversal driver walks
/// `std::fs::read_dir` by full path (see `driver.rs`) rather than opening
/// directory-relative file descriptors the way the out-of-scope `bftw`
/// driver does, so every stat/open goes through `path` instead of an
/// `(at_fd, at_path)` pair. The field stays in the struct so the shape
/// here matches `spec.md` exactly.
pub struct VisitState<'a> {
    pub at_fd: Option<std::os::unix::io::RawFd>,
    pub path: &'a Path,
    pub root: &'a Path,
    pub depth: usize,
    pub visit: VisitKind,
    pub typeflag: TypeMask,
    pub stat_flags: StatFlags,
    pub traversal_error: Option<&'a io::Error>,
    stat_cache: OnceCell<io::Result<Metadata>>,
    lstat_cache: OnceCell<io::Result<Metadata>>,
    pub action: Cell<VisitAction>,
    pub quit: Cell<bool>,
}

impl<'a> VisitState<'a> {
    pub fn new(
        path: &'a Path,
        root: &'a Path,
        depth: usize,
        visit: VisitKind,
        typeflag: TypeMask,
        stat_flags: StatFlags,
        traversal_error: Option<&'a io::Error>,
    ) -> Self {
        VisitState {
            at_fd: None,
            path,
            root,
            depth,
            visit,
            typeflag,
            stat_flags,
            traversal_error,
            stat_cache: OnceCell::new(),
            lstat_cache: OnceCell::new(),
            action: Cell::new(VisitAction::Continue),
            quit: Cell::new(false),
        }
    }

    pub fn nameoff(&self) -> usize {
        let name_len = crate::filesystem::basename(self.path).len();
        self.path.as_os_str().len().saturating_sub(name_len)
    }

    pub fn basename(&self) -> &std::ffi::OsStr {
        crate::filesystem::basename(self.path)
    }

    /// Symlink-following stat, cached for the lifetime of this visit.
    pub fn stat(&self) -> Result<&Metadata, &io::Error> {
        self.stat_cache
            .get_or_init(|| fs::metadata(self.path))
            .as_ref()
    }

    /// Non-following stat (`lstat`), cached for the lifetime of this
    /// visit.
    pub fn lstat(&self) -> Result<&Metadata, &io::Error> {
        self.lstat_cache
            .get_or_init(|| fs::symlink_metadata(self.path))
            .as_ref()
    }

    /// Resolve the type flag under a given follow policy, used by
    /// `-xtype` to re-resolve under the opposite policy from the
    /// traversal's default.
    pub fn typeflag_under(&self, flags: StatFlags) -> Result<TypeMask, &io::Error> {
        if flags.contains(StatFlags::NOFOLLOW) {
            self.lstat().map(|m| typeflag_of(m.file_type()))
        } else {
            self.stat().map(|m| typeflag_of(m.file_type()))
        }
    }

    pub fn set_action(&self, action: VisitAction) {
        self.action.set(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn nameoff_points_past_last_separator() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("leaf.txt");
        std::fs::write(&file, b"x").unwrap();
        let state = VisitState::new(
            &file,
            dir.path(),
            1,
            VisitKind::Pre,
            TypeMask::REGULAR,
            StatFlags::empty(),
            None,
        );
        assert_eq!(&file.as_os_str().to_string_lossy()[state.nameoff()..], "leaf.txt");
    }

    #[test]
    fn stat_is_cached() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"hello").unwrap();
        let state = VisitState::new(
            &file,
            dir.path(),
            1,
            VisitKind::Pre,
            TypeMask::REGULAR,
            StatFlags::empty(),
            None,
        );
        let first = state.stat().unwrap().len();
        std::fs::write(&file, b"hello world").unwrap();
        let second = state.stat().unwrap().len();
        assert_eq!(first, second, "cached stat should not re-read metadata");
    }
}
