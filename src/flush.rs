//! Post-traversal flush (`spec.md` §4.6): after the walk completes, every
//! batched `-exec … +` leaf still holding unrun arguments must be given a
//! chance to run them.

use crate::action::{Action, ExecBatch};
use crate::cmdline::CommandLine;
use crate::error;
use crate::expr::node::{Leaf, Node, NodeKind};

/// Walk the whole expression tree post-order, flushing every batched
/// `-exec` leaf found along the way. Failures are reported with the
/// command's argv[0] (and argv[1], when present) so the user can tell
/// which `-exec … +` failed when more than one appears in the
/// expression.
pub fn flush_all(cmdline: &CommandLine) {
    cmdline.expr.walk_post_order(&mut |node| {
        if let NodeKind::Leaf(Leaf::Action(Action::Exec(batch))) = &node.kind {
            flush_one(cmdline, batch);
        }
    });
}

fn flush_one(cmdline: &CommandLine, batch: &ExecBatch) {
    if !batch.is_batched() {
        return;
    }
    let identity = || {
        let (program, arg1) = batch.program_argv0();
        match arg1 {
            Some(arg1) => format!("{} {}", program.to_string_lossy(), arg1.to_string_lossy()),
            None => program.to_string_lossy().into_owned(),
        }
    };
    match batch.finish() {
        Ok(true) => {}
        Ok(false) => error::report(&cmdline.status, format_args!("{}: exited with a failure status", identity())),
        Err(e) => error::report(&cmdline.status, format_args!("{}: {e}", identity())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ExecBatch, PrintAction, PrintForm};
    use crate::predicate::Predicate;

    fn dummy_cmdline(expr: Node) -> CommandLine {
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
            expr,
            nopen_files: 0,
            colors: crate::output::ColorTable::new(false),
            now: std::time::SystemTime::now(),
        }
    }

    #[test]
    fn non_batched_exec_is_left_alone() {
        let batch = ExecBatch::new(vec!["true".into()], false).unwrap();
        let node = Node::leaf(Leaf::Action(Action::Exec(batch)));
        let cmdline = dummy_cmdline(node);
        flush_all(&cmdline); // must not panic / attempt to run anything
        assert_eq!(cmdline.status.get(), 0);
    }

    #[test]
    fn flush_walks_past_unrelated_leaves() {
        let sink: crate::output::Sink = std::rc::Rc::new(std::cell::RefCell::new(Vec::<u8>::new()));
        let print = Node::leaf(Leaf::Action(Action::Print(PrintAction::new(sink, PrintForm::Null))));
        let pred = Node::leaf(Leaf::Predicate(Predicate::True));
        let tree = Node::and(print, pred);
        let cmdline = dummy_cmdline(tree);
        flush_all(&cmdline);
        assert_eq!(cmdline.status.get(), 0);
    }
}
