//! `-exec`/`-exec … +` action support.
//!
//! `spec.md` §1 explicitly excludes the internals of `-exec … +` argument
//! batching from this evaluator's subject matter ("the evaluator calls an
//! external batcher; the batcher's internals are not specified here"). This
//! module is that call site: `argmax::Command` owns the actual ARG_MAX-
//! aware chunking; `ExecBatch` just owns the per-node accumulation buffer
//! and argv template describing the "external-exec batch state"/"raw argv"
//! payload fields.

use std::cell::RefCell;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;

use argmax::Command as BatchedCommand;

/// One token of a `-exec`/`-exec-batch` argv template.
#[derive(Clone, Debug)]
pub enum ArgToken {
    Literal(OsString),
    /// `{}`: the current path (single-exec) or the whole batch
    /// (batch-exec).
    Placeholder,
}

pub struct ExecBatch {
    program: OsString,
    args: Vec<ArgToken>,
    batched: bool,
    pending: RefCell<Vec<PathBuf>>,
}

impl ExecBatch {
    pub fn new(argv: Vec<OsString>, batched: bool) -> Option<Self> {
        let mut iter = argv.into_iter();
        let program = iter.next()?;
        let mut args: Vec<ArgToken> = iter
            .map(|a| {
                if a == "{}" {
                    ArgToken::Placeholder
                } else {
                    ArgToken::Literal(a)
                }
            })
            .collect();
        if !args.iter().any(|t| matches!(t, ArgToken::Placeholder)) {
            args.push(ArgToken::Placeholder);
        }
        Some(ExecBatch {
            program,
            args,
            batched,
            pending: RefCell::new(Vec::new()),
        })
    }

    pub fn is_batched(&self) -> bool {
        self.batched
    }

    /// `-exec cmd … ;`: run immediately for this single path.
    fn run_single(&self, path: &Path) -> io::Result<bool> {
        let mut cmd = StdCommand::new(&self.program);
        for token in &self.args {
            match token {
                ArgToken::Literal(lit) => {
                    cmd.arg(lit);
                }
                ArgToken::Placeholder => {
                    cmd.arg(path);
                }
            }
        }
        Ok(cmd.status()?.success())
    }

    /// `-exec cmd … +`: accumulate; flushed by `flush` when full or at
    /// end of traversal.
    fn push(&self, path: &Path) {
        self.pending.borrow_mut().push(path.to_path_buf());
    }

    /// Runs whatever is accumulated so far through the ARG_MAX-aware
    /// batcher. Called from `flush::flush_all` (`spec.md` §4.6) and
    /// also mid-traversal once a single node accumulates enough paths
    /// to be worth flushing early (kept simple here: argmax handles the
    /// actual chunk sizing, so this crate never needs its own ARG_MAX
    /// bookkeeping).
    pub fn finish(&self) -> io::Result<bool> {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        if pending.is_empty() {
            return Ok(true);
        }
        let prefix: Vec<&OsString> = self
            .args
            .iter()
            .take_while(|t| !matches!(t, ArgToken::Placeholder))
            .map(|t| match t {
                ArgToken::Literal(lit) => lit,
                ArgToken::Placeholder => unreachable!(),
            })
            .collect();
        let mut cmd = BatchedCommand::new(&self.program);
        for lit in prefix {
            cmd.arg(lit);
        }
        let mut all_succeeded = true;
        for outcome in cmd.output_batched(pending.iter().map(PathBuf::as_os_str)) {
            let output = outcome?;
            all_succeeded &= output.status.success();
        }
        Ok(all_succeeded)
    }

    pub fn program_argv0(&self) -> (&OsString, Option<&OsString>) {
        let arg1 = self.args.iter().find_map(|t| match t {
            ArgToken::Literal(lit) => Some(lit),
            ArgToken::Placeholder => None,
        });
        (&self.program, arg1)
    }
}

/// Invoke `batch` for `path` according to its batching mode: either run
/// immediately (`-exec … ;`) or accumulate (`-exec … +`).
pub fn eval_exec(batch: &ExecBatch, path: &Path) -> io::Result<bool> {
    if batch.is_batched() {
        batch.push(path);
        Ok(true)
    } else {
        batch.run_single(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_trailing_placeholder_is_added() {
        let batch = ExecBatch::new(vec!["echo".into()], false).unwrap();
        assert!(matches!(batch.args.last(), Some(ArgToken::Placeholder)));
    }

    #[test]
    fn explicit_placeholder_is_not_duplicated() {
        let batch = ExecBatch::new(vec!["echo".into(), "{}".into()], false).unwrap();
        let placeholder_count = batch
            .args
            .iter()
            .filter(|t| matches!(t, ArgToken::Placeholder))
            .count();
        assert_eq!(placeholder_count, 1);
    }

    #[test]
    fn batched_mode_accumulates_without_running() {
        let batch = ExecBatch::new(vec!["true".into()], true).unwrap();
        eval_exec(&batch, Path::new("/tmp/a")).unwrap();
        eval_exec(&batch, Path::new("/tmp/b")).unwrap();
        assert_eq!(batch.pending.borrow().len(), 2);
    }
}
