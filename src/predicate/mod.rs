pub mod compare;
pub mod glob;
pub mod stattime;
pub mod tri;
pub mod typeflag;

use std::io;
use std::os::unix::fs::MetadataExt;
use std::time::SystemTime;

use faccess::{AccessMode, PathExt};

use crate::cmdline::CommandLine;
use crate::error;
use crate::visit::VisitState;

pub use compare::{CompareMode, NumericTest};
pub use glob::{FnmatchFlags, GlobTest};
pub use stattime::StatField;
pub use tri::{TriState, XAttrTest};
pub use typeflag::TypeMask;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Minutes,
    Days,
}

/// `spec.md` §6's size-unit table, in bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SizeUnit {
    Blocks,
    Bytes,
    Words,
    Kb,
    Mb,
    Gb,
    Tb,
    Pb,
}

impl SizeUnit {
    pub const fn bytes(self) -> u64 {
        match self {
            SizeUnit::Blocks => 512,
            SizeUnit::Bytes => 1,
            SizeUnit::Words => 2,
            SizeUnit::Kb => 1024,
            SizeUnit::Mb => 1024 * 1024,
            SizeUnit::Gb => 1 << 30,
            SizeUnit::Tb => 1 << 40,
            SizeUnit::Pb => 1 << 50,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PermKind {
    Exact,
    All,
    Any,
}

#[derive(Copy, Clone, Debug)]
pub struct PermTest {
    pub file_mode: u32,
    pub dir_mode: u32,
    pub kind: PermKind,
}

impl PermTest {
    pub fn target_for(&self, is_dir: bool) -> u32 {
        if is_dir {
            self.dir_mode
        } else {
            self.file_mode
        }
    }

    pub fn matches(&self, mode: u32, is_dir: bool) -> bool {
        let target = self.target_for(is_dir);
        let mode = mode & 0o7777;
        match self.kind {
            PermKind::Exact => mode == target,
            PermKind::All => (mode & target) == target,
            PermKind::Any => (mode & target) != 0 || target == 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SameFileRef {
    pub dev: u64,
    pub ino: u64,
}

/// A leaf predicate (`spec.md` §4.2). Each variant carries exactly the
/// operand fields that evaluator needs — see `expr::node`'s module doc for
/// why this uses a tagged enum instead of a C-style payload union.
pub enum Predicate {
    True,
    False,
    Access(AccessMode),
    Acl,
    Capable,
    XAttr(XAttrTest),
    Newer(StatField, SystemTime),
    Time(StatField, TimeUnit, NumericTest),
    Used(NumericTest),
    Uid(NumericTest),
    Gid(NumericTest),
    Inum(NumericTest),
    Links(NumericTest),
    Depth(NumericTest),
    NoUser,
    NoGroup,
    Empty,
    FsType(String),
    Hidden,
    Name(GlobTest),
    Path(GlobTest),
    LName(GlobTest),
    Perm(PermTest),
    Regex(regex::Regex),
    SameFile(SameFileRef),
    Size(SizeUnit, NumericTest),
    Sparse,
    Type(TypeMask),
    XType(TypeMask),
}

fn report_stat_err(cmdline: &CommandLine, state: &VisitState, err: &io::Error) {
    error::report_io(
        &cmdline.status,
        state.path.display(),
        err,
        state.depth,
        cmdline.ignore_races,
    );
}

/// Evaluate a single predicate against the current visit.
///
/// `spec.md` §4.2: "stat failure causes the predicate to return false and
/// sets exit status to failure, unless the error qualifies as ignorable".
pub fn eval(pred: &Predicate, state: &VisitState, cmdline: &CommandLine) -> bool {
    match pred {
        Predicate::True => true,
        Predicate::False => false,

        Predicate::Access(mode) => match state.path.access(*mode) {
            Ok(()) => true,
            Err(err) => {
                report_stat_err(cmdline, state, &err);
                false
            }
        },

        Predicate::Acl => eval_tristate(tri::probe_acl(state.path), cmdline, state),
        Predicate::Capable => eval_tristate(tri::probe_capable(state.path), cmdline, state),
        Predicate::XAttr(test) => eval_tristate(test.probe(state.path), cmdline, state),

        Predicate::Newer(field, reference) => match state.stat() {
            Ok(meta) => match stattime::stat_field_time(meta, *field) {
                Ok(t) => t > *reference,
                Err(err) => {
                    report_stat_err(cmdline, state, &err);
                    false
                }
            },
            Err(err) => {
                report_stat_err(cmdline, state, err);
                false
            }
        },

        Predicate::Time(field, unit, test) => match state.stat() {
            Ok(meta) => match stattime::stat_field_time(meta, *field) {
                Ok(t) => {
                    let diff_secs = cmdline
                        .now
                        .duration_since(t)
                        .map(|d| d.as_secs() as i64)
                        .unwrap_or_else(|e| -(e.duration().as_secs() as i64));
                    let per_unit = match unit {
                        TimeUnit::Minutes => 60,
                        TimeUnit::Days => 86_400,
                    };
                    test.matches(diff_secs / per_unit)
                }
                Err(err) => {
                    report_stat_err(cmdline, state, &err);
                    false
                }
            },
            Err(err) => {
                report_stat_err(cmdline, state, err);
                false
            }
        },

        Predicate::Used(test) => match state.stat() {
            Ok(meta) => {
                let atime = stattime::stat_field_time(meta, StatField::Atime);
                let ctime = stattime::stat_field_time(meta, StatField::Ctime);
                match (atime, ctime) {
                    (Ok(a), Ok(c)) => {
                        let secs = a
                            .duration_since(c)
                            .map(|d| d.as_secs() as i64)
                            .unwrap_or_else(|e| -(e.duration().as_secs() as i64));
                        test.matches(secs / 86_400)
                    }
                    _ => false,
                }
            }
            Err(err) => {
                report_stat_err(cmdline, state, err);
                false
            }
        },

        Predicate::Uid(test) => with_stat(state, cmdline, |m| test.matches(m.uid() as i64)),
        Predicate::Gid(test) => with_stat(state, cmdline, |m| test.matches(m.gid() as i64)),
        Predicate::Inum(test) => with_stat(state, cmdline, |m| test.matches(m.ino() as i64)),
        Predicate::Links(test) => with_stat(state, cmdline, |m| test.matches(m.nlink() as i64)),
        Predicate::Depth(test) => test.matches(state.depth as i64),

        Predicate::NoUser => with_stat(state, cmdline, |m| cmdline.ids.is_nouser(m.uid())),
        Predicate::NoGroup => with_stat(state, cmdline, |m| cmdline.ids.is_nogroup(m.gid())),

        Predicate::Empty => eval_empty(state, cmdline),

        Predicate::FsType(name) => with_stat(state, cmdline, |m| {
            cmdline.mtab.lookup(m.dev()) == Some(name.as_str())
        }),

        Predicate::Hidden => {
            state.depth > 0
                && state
                    .basename()
                    .to_string_lossy()
                    .starts_with('.')
        }

        Predicate::Name(test) => {
            let basename = state.basename().to_string_lossy();
            let basename = if state.depth == 0 {
                basename.trim_end_matches('/').to_string()
            } else {
                basename.to_string()
            };
            test.is_match(&basename)
        }

        Predicate::Path(test) => test.is_match(&state.path.to_string_lossy()),

        Predicate::LName(test) => {
            if !state.typeflag.matches(TypeMask::SYMLINK) {
                return false;
            }
            match std::fs::read_link(state.path) {
                Ok(target) => test.is_match(&target.to_string_lossy()),
                Err(err) => {
                    report_stat_err(cmdline, state, &err);
                    false
                }
            }
        }

        Predicate::Perm(test) => with_stat(state, cmdline, |m| {
            test.matches(m.mode(), state.typeflag.matches(TypeMask::DIRECTORY))
        }),

        Predicate::Regex(re) => re.is_match(&state.path.to_string_lossy()),

        Predicate::SameFile(reference) => {
            with_stat(state, cmdline, |m| m.dev() == reference.dev && m.ino() == reference.ino)
        }

        Predicate::Size(unit, test) => with_stat(state, cmdline, |m| {
            let unit_bytes = unit.bytes();
            let units = m.len().div_ceil(unit_bytes);
            test.matches(units as i64)
        }),

        Predicate::Sparse => with_stat(state, cmdline, |m| {
            let expected_blocks = m.len().div_ceil(512);
            (m.blocks() as u64) < expected_blocks
        }),

        Predicate::Type(mask) => mask.matches(state.typeflag),

        Predicate::XType(mask) => {
            let opposite = state.stat_flags.opposite();
            match state.typeflag_under(opposite) {
                Ok(flag) => mask.matches(flag),
                Err(err) => {
                    report_stat_err(cmdline, state, err);
                    false
                }
            }
        }
    }
}

fn eval_tristate(result: TriState, cmdline: &CommandLine, state: &VisitState) -> bool {
    if result.is_error() {
        error::report(
            &cmdline.status,
            format_args!("{}: extended attribute probe failed", state.path.display()),
        );
    }
    result.as_bool()
}

fn with_stat(
    state: &VisitState,
    cmdline: &CommandLine,
    f: impl FnOnce(&std::fs::Metadata) -> bool,
) -> bool {
    match state.stat() {
        Ok(meta) => f(meta),
        Err(err) => {
            report_stat_err(cmdline, state, err);
            false
        }
    }
}

fn eval_empty(state: &VisitState, cmdline: &CommandLine) -> bool {
    if state.typeflag.matches(TypeMask::DIRECTORY) {
        match std::fs::read_dir(state.path) {
            Ok(mut entries) => entries.next().is_none(),
            Err(err) => {
                report_stat_err(cmdline, state, &err);
                false
            }
        }
    } else if state.typeflag.matches(TypeMask::REGULAR) {
        with_stat(state, cmdline, |m| m.len() == 0)
    } else {
        false
    }
}
