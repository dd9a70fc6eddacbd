use std::fmt::Display;
use std::io;

use crate::exit_code::ExitStatus;

/// Write a single-line error to stderr and bump the shared exit status.
///
/// Takes the shared `ExitStatus` cell instead of a process-wide global so
/// callers can't forget to bump it.
pub fn report(status: &ExitStatus, message: impl Display) {
    eprintln!("bfind: {message}");
    status.mark_failure();
}

/// `spec.md` §7 point 4: race-ignoring policy. Errors that indicate the
/// file simply vanished between being listed and being examined are
/// dropped silently when `ignore_races` is enabled and the error did not
/// occur on a user-supplied root path (`depth == 0` always surfaces).
pub fn is_ignorable_race(err: &io::Error, depth: usize, ignore_races: bool) -> bool {
    if !ignore_races || depth == 0 {
        return false;
    }
    if err.kind() == io::ErrorKind::NotFound {
        return true;
    }
    // ENOTDIR: a path component that used to be a directory was replaced
    // by something else mid-traversal. `io::ErrorKind` has no stable
    // variant for this, so match the raw errno directly.
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::ENOTDIR)
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// Report `err` for `path` unless the race-ignoring policy swallows it.
pub fn report_io(status: &ExitStatus, path: impl Display, err: &io::Error, depth: usize, ignore_races: bool) {
    if is_ignorable_race(err, depth, ignore_races) {
        return;
    }
    report(status, format_args!("{path}: {err}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_errors_always_surface() {
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(!is_ignorable_race(&err, 0, true));
    }

    #[test]
    fn deep_not_found_is_ignorable_when_enabled() {
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(is_ignorable_race(&err, 3, true));
        assert!(!is_ignorable_race(&err, 3, false));
    }

    #[test]
    fn other_errors_are_never_ignorable() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(!is_ignorable_race(&err, 3, true));
    }
}
