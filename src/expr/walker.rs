//! The short-circuiting expression walker (`spec.md` §4.1/§5).
//!
//! Grounded on the boolean combinator shape of an AND/OR evaluator over a
//! small expression tree (`Evaluator::evaluate_node`/`combine_and`/
//! `combine_or` in the rdump-style evaluator this crate's tree structure
//! was drawn from), adapted to this crate's single-threaded, per-node
//! counter/timing bookkeeping instead of returning a `MatchResult`.

use std::time::Instant;

use crate::action;
use crate::cmdline::CommandLine;
use crate::expr::node::{Leaf, Node, NodeKind};
use crate::predicate;
use crate::visit::VisitState;

/// Evaluate `node` against the current visit, recording per-node
/// evaluation counters/timing as it goes (`spec.md` §4.1 point 4).
///
/// `-a`/`-o`/`,` short-circuit exactly as GNU find's expression grammar
/// does: an unevaluated right-hand side contributes no count, no timing,
/// and runs no actions. A `-quit`/`-exit` leaf sets `state.quit`, which
/// this walker checks between the two sides of every binary node so the
/// remainder of the expression (and of a `,`-joined action list) does not
/// run once the traversal has been asked to stop.
pub fn evaluate(node: &Node, state: &VisitState, cmdline: &CommandLine) -> bool {
    let start = Instant::now();
    let result = match &node.kind {
        NodeKind::Leaf(Leaf::Predicate(pred)) => predicate::eval(pred, state, cmdline),
        NodeKind::Leaf(Leaf::Action(act)) => action::eval(act, state, cmdline),
        NodeKind::Not(rhs) => !evaluate(rhs, state, cmdline),
        NodeKind::And(lhs, rhs) => {
            evaluate(lhs, state, cmdline) && !state.quit.get() && evaluate(rhs, state, cmdline)
        }
        NodeKind::Or(lhs, rhs) => {
            evaluate(lhs, state, cmdline) || (!state.quit.get() && evaluate(rhs, state, cmdline))
        }
        NodeKind::Comma(lhs, rhs) => {
            evaluate(lhs, state, cmdline);
            if state.quit.get() {
                false
            } else {
                evaluate(rhs, state, cmdline)
            }
        }
    };
    node.stats.record(result, start.elapsed());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, PrintAction, PrintForm};
    use crate::flags::StatFlags;
    use crate::predicate::{Predicate, TypeMask};
    use crate::visit::VisitKind;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

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
            expr: Node::leaf(Leaf::Predicate(Predicate::True)),
            nopen_files: 0,
            colors: crate::output::ColorTable::new(false),
            now: std::time::SystemTime::now(),
        }
    }

    fn state(path: &Path) -> VisitState<'_> {
        VisitState::new(
            path,
            path,
            0,
            VisitKind::Pre,
            TypeMask::REGULAR,
            StatFlags::empty(),
            None,
        )
    }

    #[test]
    fn and_short_circuits_on_false_lhs() {
        let tree = Node::and(
            Node::leaf(Leaf::Predicate(Predicate::False)),
            Node::leaf(Leaf::Action(Action::Quit)),
        );
        let cmdline = dummy_cmdline();
        let path = Path::new("/tmp");
        let st = state(path);
        assert!(!evaluate(&tree, &st, &cmdline));
        assert!(!st.quit.get(), "rhs must not run once lhs is false");
    }

    #[test]
    fn or_short_circuits_on_true_lhs() {
        let tree = Node::or(
            Node::leaf(Leaf::Predicate(Predicate::True)),
            Node::leaf(Leaf::Action(Action::Quit)),
        );
        let cmdline = dummy_cmdline();
        let path = Path::new("/tmp");
        let st = state(path);
        assert!(evaluate(&tree, &st, &cmdline));
        assert!(!st.quit.get(), "rhs must not run once lhs is true");
    }

    #[test]
    fn comma_runs_both_sides_and_returns_rhs_value() {
        let sink: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let print = Node::leaf(Leaf::Action(Action::Print(PrintAction::new(
            sink.clone(),
            PrintForm::Null,
        ))));
        let tree = Node::comma(print, Node::leaf(Leaf::Predicate(Predicate::False)));
        let cmdline = dummy_cmdline();
        let path = Path::new("/tmp");
        let st = state(path);
        assert!(!evaluate(&tree, &st, &cmdline));
        assert!(!sink.borrow().is_empty(), "lhs side-effect must still run");
    }

    #[test]
    fn not_inverts_result() {
        let tree = Node::not(Node::leaf(Leaf::Predicate(Predicate::True)));
        let cmdline = dummy_cmdline();
        let path = Path::new("/tmp");
        let st = state(path);
        assert!(!evaluate(&tree, &st, &cmdline));
    }

    #[test]
    fn quit_halts_remaining_and_clauses() {
        let tree = Node::and(
            Node::leaf(Leaf::Action(Action::Quit)),
            Node::leaf(Leaf::Action(Action::Quit)),
        );
        let cmdline = dummy_cmdline();
        let path = Path::new("/tmp");
        let st = state(path);
        evaluate(&tree, &st, &cmdline);
        // second Quit leaf never evaluated; only lhs's node recorded a hit
        if let NodeKind::And(lhs, rhs) = &tree.kind {
            assert_eq!(lhs.stats.evaluations.get(), 1);
            assert_eq!(rhs.stats.evaluations.get(), 0);
        } else {
            unreachable!()
        }
    }
}
