//! `-delete`: remove the current file/directory.
//!
//! `spec.md` §4.3: `-delete` requires an empty directory to remove a
//! directory (mirroring `rmdir`'s own requirement); unlike GNU find it
//! does not implicitly force `-depth` here — the parser is responsible for
//! rejecting an expression that would visit a directory's own `-delete`
//! leaf before its children (out of this crate's scope). `.` is never
//! removed, and the type used to pick `unlink` vs `rmdir` is re-resolved
//! with `AT_SYMLINK_NOFOLLOW` rather than trusting the traversal's
//! follow-policy-dependent `typeflag`, so `-delete` under `-L` unlinks a
//! symlink-to-directory instead of trying (and failing) to `rmdir` it.

use std::io;

use nix::fcntl::AtFlags;
use nix::sys::stat::{fstatat, SFlag};
use nix::unistd::{unlinkat, UnlinkatFlags};

use crate::cmdline::CommandLine;
use crate::error;
use crate::visit::VisitState;

pub fn eval_delete(state: &VisitState, cmdline: &CommandLine) -> bool {
    if state.path == std::path::Path::new(".") {
        return true;
    }

    let is_dir = match fstatat(None, state.path, AtFlags::AT_SYMLINK_NOFOLLOW) {
        Ok(st) => (SFlag::from_bits_truncate(st.st_mode) & SFlag::S_IFMT) == SFlag::S_IFDIR,
        Err(errno) => {
            error::report_io(
                &cmdline.status,
                state.path.display(),
                &io::Error::from(errno),
                state.depth,
                cmdline.ignore_races,
            );
            return false;
        }
    };

    let flags = if is_dir {
        UnlinkatFlags::RemoveDir
    } else {
        UnlinkatFlags::NoRemoveDir
    };

    match unlinkat(None, state.path, flags) {
        Ok(()) => true,
        Err(errno) => {
            error::report_io(
                &cmdline.status,
                state.path.display(),
                &io::Error::from(errno),
                state.depth,
                cmdline.ignore_races,
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::StatFlags;
    use crate::ids::IdCache;
    use crate::mount::MountTable;
    use crate::output::ColorTable;
    use crate::predicate::TypeMask;
    use crate::visit::VisitKind;
    use std::path::PathBuf;

    fn test_cmdline() -> CommandLine {
        CommandLine {
            paths: vec![PathBuf::from(".")],
            maxdepth: i64::MAX,
            mindepth: 0,
            flags: crate::flags::Flags::empty(),
            strategy: crate::flags::Strategy::Bfs,
            unique: false,
            xargs_safe: false,
            ignore_races: false,
            debug: crate::flags::DebugFlags::empty(),
            mtab: MountTable::default(),
            ids: IdCache::new(),
            status: crate::exit_code::ExitStatus::new(),
            expr: crate::expr::node::Node::leaf(crate::expr::node::Leaf::Predicate(
                crate::predicate::Predicate::True,
            )),
            nopen_files: 0,
            colors: ColorTable::new(false),
            now: std::time::SystemTime::now(),
        }
    }

    #[test]
    fn deletes_a_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("victim");
        std::fs::write(&file, b"x").unwrap();
        let cmdline = test_cmdline();
        let state = VisitState::new(
            &file,
            dir.path(),
            1,
            VisitKind::Post,
            TypeMask::REGULAR,
            StatFlags::empty(),
            None,
        );
        assert!(eval_delete(&state, &cmdline));
        assert!(!file.exists());
    }

    #[test]
    fn fails_on_nonempty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("f"), b"x").unwrap();
        let cmdline = test_cmdline();
        let state = VisitState::new(
            &sub,
            dir.path(),
            1,
            VisitKind::Post,
            TypeMask::DIRECTORY,
            StatFlags::empty(),
            None,
        );
        assert!(!eval_delete(&state, &cmdline));
        assert!(sub.exists());
    }
}
