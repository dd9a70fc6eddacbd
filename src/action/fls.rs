//! `-ls`/`-fls`: `ls -dils`-style one-line listing.

use std::os::unix::fs::{MetadataExt, PermissionsExt};

use crate::cmdline::CommandLine;
use crate::error;
use crate::output::Sink;
use crate::predicate::{StatField, TypeMask};
use crate::visit::VisitState;

pub struct LsAction {
    pub sink: Sink,
}

impl LsAction {
    pub fn new(sink: Sink) -> Self {
        LsAction { sink }
    }
}

fn type_char(mask: TypeMask) -> char {
    if mask.matches(TypeMask::DIRECTORY) {
        'd'
    } else if mask.matches(TypeMask::SYMLINK) {
        'l'
    } else if mask.matches(TypeMask::CHAR_DEVICE) {
        'c'
    } else if mask.matches(TypeMask::BLOCK_DEVICE) {
        'b'
    } else if mask.matches(TypeMask::FIFO) {
        'p'
    } else if mask.matches(TypeMask::SOCKET) {
        's'
    } else {
        '-'
    }
}

fn rwx(bits: u32, setid: bool, setid_char: char, sticky: bool) -> String {
    let r = if bits & 0o4 != 0 { 'r' } else { '-' };
    let w = if bits & 0o2 != 0 { 'w' } else { '-' };
    let x = if bits & 0o1 != 0 {
        if setid {
            setid_char
        } else {
            'x'
        }
    } else if setid {
        setid_char.to_ascii_uppercase()
    } else if sticky {
        'T'
    } else {
        '-'
    };
    format!("{r}{w}{x}")
}

/// Render a `drwxr-xr-x`-style 10-character mode string.
fn mode_string(typeflag: TypeMask, mode: u32) -> String {
    let mut s = String::with_capacity(10);
    s.push(type_char(typeflag));
    s.push_str(&rwx((mode >> 6) & 0o7, mode & 0o4000 != 0, 's', false));
    s.push_str(&rwx((mode >> 3) & 0o7, mode & 0o2000 != 0, 's', false));
    s.push_str(&rwx(mode & 0o7, false, 't', mode & 0o1000 != 0));
    s
}

/// Writes one `ls -dils`-style line for `state.path`.
///
/// Grounded on GNU find's `-ls` output, generalized to target an arbitrary
/// sink (`-fls`) the same way `print.rs` does. Stat failures are reported
/// and the action still returns `true` (`spec.md` §4.3 point 3).
pub fn eval_ls(action: &LsAction, state: &VisitState, cmdline: &CommandLine) -> bool {
    let meta = match state.lstat() {
        Ok(meta) => meta,
        Err(err) => {
            error::report_io(
                &cmdline.status,
                state.path.display(),
                err,
                state.depth,
                cmdline.ignore_races,
            );
            return true;
        }
    };

    let blocks = meta.blocks().div_ceil(2); // 512-byte blocks -> 1K blocks
    let mode = mode_string(state.typeflag, meta.permissions().mode());
    let owner = cmdline
        .ids
        .username(meta.uid())
        .unwrap_or_else(|| meta.uid().to_string());
    let group = cmdline
        .ids
        .groupname(meta.gid())
        .unwrap_or_else(|| meta.gid().to_string());
    let mtime = crate::predicate::stattime::stat_field_time(meta, StatField::Mtime)
        .map(|t| humantime::format_rfc3339_seconds(t).to_string())
        .unwrap_or_else(|_| "?".to_string());

    let mut line = format!(
        "{ino:>10} {blocks:>6} {mode} {nlink:>3} {owner} {group} {size:>8} {mtime} {path}",
        ino = meta.ino(),
        blocks = blocks,
        mode = mode,
        nlink = meta.nlink(),
        owner = owner,
        group = group,
        size = meta.len(),
        mtime = mtime,
        path = state.path.display(),
    );

    if state.typeflag.matches(TypeMask::SYMLINK) {
        if let Ok(target) = std::fs::read_link(state.path) {
            line.push_str(" -> ");
            line.push_str(&target.display().to_string());
        }
    }

    let write_result = {
        let mut sink = action.sink.borrow_mut();
        use std::io::Write;
        writeln!(sink, "{line}")
    };
    if let Err(err) = write_result {
        error::report(&cmdline.status, format_args!("{}: {err}", state.path.display()));
    }
    true
}
