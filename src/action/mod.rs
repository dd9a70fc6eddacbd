//! The action library (`spec.md` §4.3): leaves that perform a side effect
//! instead of (or in addition to) testing the current file.

pub mod delete;
pub mod exec;
pub mod fls;
pub mod print;
pub mod printf;

use crate::cmdline::CommandLine;
use crate::error;
use crate::visit::{VisitAction, VisitState};

pub use exec::ExecBatch;
pub use fls::LsAction;
pub use print::{PrintAction, PrintForm};
pub use printf::{FormatProgram, PrintfAction};

/// A leaf action (`spec.md` §4.3). Each variant already carries its own
/// operand fields, matching `expr::node`'s doc on why this is modeled as
/// an enum instead of a payload union.
pub enum Action {
    /// `-prune`: don't descend into this directory. Resolved by the
    /// traversal driver, not the action itself.
    Prune,
    Print(PrintAction),
    Ls(LsAction),
    Printf(PrintfAction),
    /// `-nohidden`-equivalent control leaf: suppresses descent into
    /// dotfile directories for the remainder of this subtree.
    NoHidden,
    /// `-quit`: stop the traversal after this visit, keeping the current
    /// exit status.
    Quit,
    /// `-exit n`: stop the traversal and set the exit status to `n`.
    Exit(i32),
    Exec(ExecBatch),
    Delete,
}

/// Evaluate a leaf action against the current visit, returning whether
/// the action "succeeded" for the purposes of its enclosing `-a`/`-o`
/// expression (`spec.md` §4.3).
pub fn eval(action: &Action, state: &VisitState, cmdline: &CommandLine) -> bool {
    match action {
        Action::Prune => {
            state.set_action(VisitAction::Prune);
            true
        }
        Action::Print(print) => print::eval_print(print, state, cmdline),
        Action::Ls(ls) => fls::eval_ls(ls, state, cmdline),
        Action::Printf(printf) => printf::eval_printf(printf, state, cmdline),
        Action::NoHidden => {
            if state.basename().to_string_lossy().starts_with('.') {
                state.set_action(VisitAction::Prune);
            }
            true
        }
        Action::Quit => {
            state.quit.set(true);
            true
        }
        Action::Exit(code) => {
            cmdline.status.set_explicit(*code);
            state.quit.set(true);
            true
        }
        Action::Exec(batch) => match exec::eval_exec(batch, state.path) {
            Ok(success) => success,
            Err(err) => {
                error::report(&cmdline.status, format_args!("{}: {err}", state.path.display()));
                false
            }
        },
        Action::Delete => delete::eval_delete(state, cmdline),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::StatFlags;
    use crate::predicate::TypeMask;
    use crate::visit::VisitKind;
    use std::path::Path;

    #[test]
    fn prune_sets_visit_action() {
        let path = Path::new("/tmp");
        let state = VisitState::new(
            path,
            path,
            0,
            VisitKind::Pre,
            TypeMask::DIRECTORY,
            StatFlags::empty(),
            None,
        );
        assert!(eval(&Action::Prune, &state, &dummy_cmdline()));
        assert_eq!(state.action.get(), VisitAction::Prune);
    }

    #[test]
    fn quit_sets_the_quit_flag() {
        let path = Path::new("/tmp");
        let state = VisitState::new(
            path,
            path,
            0,
            VisitKind::Pre,
            TypeMask::DIRECTORY,
            StatFlags::empty(),
            None,
        );
        assert!(eval(&Action::Quit, &state, &dummy_cmdline()));
        assert!(state.quit.get());
    }

    #[test]
    fn exit_sets_explicit_status_and_quits() {
        let path = Path::new("/tmp");
        let state = VisitState::new(
            path,
            path,
            0,
            VisitKind::Pre,
            TypeMask::DIRECTORY,
            StatFlags::empty(),
            None,
        );
        let cmdline = dummy_cmdline();
        assert!(eval(&Action::Exit(3), &state, &cmdline));
        assert!(state.quit.get());
        assert_eq!(cmdline.status.get(), 3);
    }

    fn dummy_cmdline() -> CommandLine {
        CommandLine {
            paths: vec![std::path::PathBuf::from(".")],
            maxdepth: i64::MAX,
            mindepth: 0,
            flags: crate::flags::Flags::empty(),
            strategy: crate::flags::Strategy::Bfs,
            unique: false,
            xargs_safe: false,
            ignore_races: false,
            debug: crate::flags::DebugFlags::empty(),
            mtab: crate::mount::MountTable::default(),
            ids: crate::ids::IdCache::new(),
            status: crate::exit_code::ExitStatus::new(),
            expr: crate::expr::node::Node::leaf(crate::expr::node::Leaf::Predicate(
                crate::predicate::Predicate::True,
            )),
            nopen_files: 0,
            colors: crate::output::ColorTable::new(false),
            now: std::time::SystemTime::now(),
        }
    }
}
