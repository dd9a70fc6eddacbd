//! `-print`/`-print0`/`-fprint`/`-fprint0`/`-fprintx` actions.

use crate::cmdline::CommandLine;
use crate::error;
use crate::output::{self, Sink};
use crate::predicate::TypeMask;
use crate::visit::VisitState;

/// Which terminator/escaping convention a print action uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrintForm {
    /// `-print`/`-fprint`: newline-terminated, unescaped.
    Newline,
    /// `-print0`/`-fprint0`: NUL-terminated, unescaped.
    Null,
    /// `-fprintx`/`--xargs-safe`: newline-terminated, shell-unsafe
    /// characters backslash-escaped (`spec.md` §4.3 point 3).
    XargsSafe,
}

pub struct PrintAction {
    pub sink: Sink,
    pub form: PrintForm,
}

impl PrintAction {
    pub fn new(sink: Sink, form: PrintForm) -> Self {
        PrintAction { sink, form }
    }
}

/// Writes `state.path` to `action.sink`. Always reports `true` to the
/// walker (`spec.md` §4.3 point 3: actions that only perform output never
/// fail the expression on I/O error), but I/O errors are still reported to
/// stderr and mark the exit status as a failure.
pub fn eval_print(action: &PrintAction, state: &VisitState, cmdline: &CommandLine) -> bool {
    let is_dir = state.typeflag.matches(TypeMask::DIRECTORY);
    let result = match action.form {
        PrintForm::Newline => output::write_path(&action.sink, &cmdline.colors, state.path, is_dir, b'\n'),
        PrintForm::Null => output::write_path(&action.sink, &cmdline.colors, state.path, is_dir, 0),
        PrintForm::XargsSafe => output::write_path_escaped(&action.sink, state.path),
    };
    if let Err(err) = result {
        error::report(&cmdline.status, format_args!("{}: {err}", state.path.display()));
    }
    true
}
