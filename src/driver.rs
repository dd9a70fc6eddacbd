//! The traversal driver: walks the filesystem and calls into
//! `expr::walker` for every entry, replacing the out-of-scope `bftw`
//! (`spec.md` §1).
//!
//! `spec.md`'s default strategy is breadth-first — a structural property
//! of this crate, not a flag to bolt onto an existing depth-first walker.
//! `std::fs::read_dir` plus an explicit level queue gives a real
//! breadth-first order directly; `Strategy::Dfs` reuses the same
//! per-entry evaluation with an explicit stack instead of a queue, and
//! `Strategy::Ids` repeats bounded breadth-first passes at increasing
//! depth limits (classic iterative deepening).
//!
//! `-depth`'s post-order guarantee (evaluate a directory only after its
//! children) is strategy-independent (`spec.md` §4.4): whichever
//! traversal order is in effect, a directory's own visit must still
//! happen after everything beneath it. `Strategy::Dfs` gets this for
//! free from its explicit enter/leave stack. `Strategy::Bfs` and
//! `Strategy::Ids` don't finish a subtree before moving to the next
//! sibling, so when `-depth` is set they both route through
//! `walk_bfs_deferred` instead: a single real queue that registers each
//! directory with a pending-child count when it's dequeued, and
//! evaluates the directory itself only once every entry dequeued from it
//! — recursively, down to its deepest descendant — has finished.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::cmdline::CommandLine;
use crate::error;
use crate::expr::walker;
use crate::flags::{Flags, StatFlags, Strategy};
use crate::predicate::typeflag::{typeflag_of, TypeMask};
use crate::visit::{VisitAction, VisitKind, VisitState};

/// Soft open-file budget for this traversal (`spec.md` §4.5): the
/// process's `RLIMIT_NOFILE` soft limit, minus file descriptors already
/// open, minus what the expression tree itself declared it needs
/// persistently or transiently, clamped to a minimum of 2 (one for the
/// directory being read, one spare).
pub fn compute_fd_budget(cmdline: &CommandLine) -> usize {
    let soft_limit = nix::sys::resource::getrlimit(nix::sys::resource::Resource::RLIMIT_NOFILE)
        .map(|(soft, _hard)| soft)
        .unwrap_or(64) as usize;
    let already_open = count_open_fds();
    let declared = (cmdline.expr.persistent_fds + cmdline.expr.ephemeral_fds) as usize;
    soft_limit
        .saturating_sub(already_open)
        .saturating_sub(declared)
        .max(2)
}

fn count_open_fds() -> usize {
    std::fs::read_dir("/proc/self/fd")
        .map(|entries| entries.count())
        .unwrap_or(8)
}

/// Run the traversal rooted at every path in `cmdline.paths`, evaluating
/// the expression tree for each visited entry. `cancelled` is polled
/// between entries for cooperative cancellation (`ctrlc`, `spec.md` §5).
pub fn run(cmdline: &CommandLine, cancelled: &AtomicBool) {
    let mut seen: BTreeSet<(u64, u64)> = BTreeSet::new();
    let defer = cmdline.flags.contains(Flags::DEPTH);
    for root in &cmdline.paths {
        let root_dev = root_device(root);
        let stop = match cmdline.strategy {
            Strategy::Bfs if defer => walk_bfs_deferred(cmdline, root, root_dev, &mut seen, cancelled),
            Strategy::Bfs => walk_bfs(cmdline, root, root_dev, &mut seen, cancelled),
            Strategy::Dfs => walk_dfs(cmdline, root, root_dev, &mut seen, cancelled),
            Strategy::Ids if defer => walk_bfs_deferred(cmdline, root, root_dev, &mut seen, cancelled),
            Strategy::Ids => walk_ids(cmdline, root, root_dev, &mut seen, cancelled),
        };
        if stop || cancelled.load(Ordering::Relaxed) {
            break;
        }
    }
}

fn root_device(path: &Path) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    std::fs::metadata(path).ok().map(|m| m.dev())
}

struct Frontier {
    path: PathBuf,
    depth: usize,
}

/// Breadth-first: a plain FIFO queue over directory entries, each
/// evaluated as soon as it's dequeued. Only used when `-depth` is not
/// set; see `walk_bfs_deferred` for the post-order case.
fn walk_bfs(
    cmdline: &CommandLine,
    root: &Path,
    root_dev: Option<u64>,
    seen: &mut BTreeSet<(u64, u64)>,
    cancelled: &AtomicBool,
) -> bool {
    let mut queue = VecDeque::new();
    queue.push_back(Frontier {
        path: root.to_path_buf(),
        depth: 0,
    });
    while let Some(Frontier { path, depth }) = queue.pop_front() {
        if cancelled.load(Ordering::Relaxed) {
            return true;
        }
        let outcome = visit_entry(cmdline, &path, root, depth, seen);
        if outcome.stop {
            return true;
        }
        if outcome.descend && within_bounds(cmdline, &path, depth, root_dev) {
            enqueue_children(cmdline, &path, depth, &mut queue);
        }
    }
    false
}

fn enqueue_children(cmdline: &CommandLine, path: &Path, depth: usize, queue: &mut VecDeque<Frontier>) {
    match std::fs::read_dir(path) {
        Ok(entries) => {
            for entry in entries.flatten() {
                queue.push_back(Frontier {
                    path: entry.path(),
                    depth: depth + 1,
                });
            }
        }
        Err(err) => {
            error::report_io(&cmdline.status, path.display(), &err, depth, cmdline.ignore_races);
        }
    }
}

struct PendingDir {
    parent: Option<PathBuf>,
    depth: usize,
    remaining: usize,
}

struct DeferredItem {
    path: PathBuf,
    depth: usize,
    parent: Option<PathBuf>,
}

/// Shared by `Bfs` and `Ids` when `Flags::DEPTH` is set (see module doc):
/// a single real FIFO queue, where a directory is registered in `pending`
/// with a count of its immediate children instead of being evaluated
/// when dequeued. Each leaf decrements its parent's count when it
/// finishes; a directory whose count reaches zero is evaluated in turn
/// and decrements *its* parent, so completion bubbles up the tree
/// without ever requiring a second traversal pass.
///
/// The dedup/cycle check runs before a directory's children are read
/// (not only inside its eventual evaluation), so a repeated `(dev, ino)`
/// under `-L` is refused before it can be queued rather than only after
/// its subtree has already been walked.
fn walk_bfs_deferred(
    cmdline: &CommandLine,
    root: &Path,
    root_dev: Option<u64>,
    seen: &mut BTreeSet<(u64, u64)>,
    cancelled: &AtomicBool,
) -> bool {
    let mut queue = VecDeque::new();
    queue.push_back(DeferredItem {
        path: root.to_path_buf(),
        depth: 0,
        parent: None,
    });
    let mut pending: HashMap<PathBuf, PendingDir> = HashMap::new();

    while let Some(DeferredItem { path, depth, parent }) = queue.pop_front() {
        if cancelled.load(Ordering::Relaxed) {
            return true;
        }
        let typeflag = resolve_typeflag(cmdline, &path, depth, cmdline.default_stat_flags());
        if typeflag.matches(TypeMask::DIRECTORY) {
            let can_descend =
                within_bounds(cmdline, &path, depth, root_dev) && dedup_allows(cmdline, &path, seen);
            let children = if can_descend {
                match std::fs::read_dir(&path) {
                    Ok(entries) => entries.flatten().map(|e| e.path()).collect::<Vec<_>>(),
                    Err(err) => {
                        error::report_io(&cmdline.status, path.display(), &err, depth, cmdline.ignore_races);
                        Vec::new()
                    }
                }
            } else {
                Vec::new()
            };
            if children.is_empty() {
                let outcome = evaluate_at(cmdline, &path, root, depth, VisitKind::Post, seen);
                if outcome.stop {
                    return true;
                }
                if bubble_complete(parent, &mut pending, cmdline, root, seen) {
                    return true;
                }
            } else {
                pending.insert(
                    path.clone(),
                    PendingDir { parent, depth, remaining: children.len() },
                );
                for child in children {
                    queue.push_back(DeferredItem { path: child, depth: depth + 1, parent: Some(path.clone()) });
                }
            }
        } else {
            let outcome = evaluate_at(cmdline, &path, root, depth, VisitKind::Pre, seen);
            if outcome.stop {
                return true;
            }
            if bubble_complete(parent, &mut pending, cmdline, root, seen) {
                return true;
            }
        }
    }
    false
}

/// Walks up from a just-finished entry's parent, evaluating (post-order)
/// and further bubbling every ancestor whose pending-child count has
/// just reached zero. Stops at the first ancestor still waiting on other
/// children, or at the root (whose `parent` is `None`).
fn bubble_complete(
    mut parent: Option<PathBuf>,
    pending: &mut HashMap<PathBuf, PendingDir>,
    cmdline: &CommandLine,
    root: &Path,
    seen: &mut BTreeSet<(u64, u64)>,
) -> bool {
    while let Some(parent_path) = parent {
        let done = {
            let entry = pending.get_mut(&parent_path).expect("dequeued entry's parent must be pending");
            entry.remaining -= 1;
            entry.remaining == 0
        };
        if !done {
            return false;
        }
        let info = pending.remove(&parent_path).expect("just checked present");
        let outcome = evaluate_at(cmdline, &parent_path, root, info.depth, VisitKind::Post, seen);
        if outcome.stop {
            return true;
        }
        parent = info.parent;
    }
    false
}

/// Depth-first: an explicit stack, deferring a directory's evaluation
/// until after all its children have been visited when `-depth` is set.
fn walk_dfs(
    cmdline: &CommandLine,
    root: &Path,
    root_dev: Option<u64>,
    seen: &mut BTreeSet<(u64, u64)>,
    cancelled: &AtomicBool,
) -> bool {
    enum Frame {
        Enter(PathBuf, usize),
        Leave(PathBuf, usize),
    }

    let defer = cmdline.flags.contains(Flags::DEPTH);
    let mut stack = vec![Frame::Enter(root.to_path_buf(), 0)];
    while let Some(frame) = stack.pop() {
        if cancelled.load(Ordering::Relaxed) {
            return true;
        }
        match frame {
            Frame::Enter(path, depth) => {
                let typeflag = resolve_typeflag(cmdline, &path, depth, cmdline.default_stat_flags());
                let is_dir = typeflag.matches(TypeMask::DIRECTORY);

                if !(defer && is_dir) {
                    let outcome = evaluate_at(cmdline, &path, root, depth, VisitKind::Pre, seen);
                    if outcome.stop {
                        return true;
                    }
                    if outcome.pruned {
                        continue;
                    }
                }

                if is_dir && within_bounds(cmdline, &path, depth, root_dev) {
                    if defer {
                        stack.push(Frame::Leave(path.clone(), depth));
                    }
                    let mut children: Vec<_> = match std::fs::read_dir(&path) {
                        Ok(entries) => entries.flatten().collect(),
                        Err(err) => {
                            error::report_io(&cmdline.status, path.display(), &err, depth, cmdline.ignore_races);
                            Vec::new()
                        }
                    };
                    children.sort_by_key(|e| e.file_name());
                    for entry in children.into_iter().rev() {
                        stack.push(Frame::Enter(entry.path(), depth + 1));
                    }
                }
            }
            Frame::Leave(path, depth) => {
                let outcome = evaluate_at(cmdline, &path, root, depth, VisitKind::Post, seen);
                if outcome.stop {
                    return true;
                }
            }
        }
    }
    false
}

/// Iterative deepening: repeat a depth-bounded breadth-first pass with an
/// increasing depth limit, evaluating only the newly reached frontier
/// each round, stopping once a round reaches no new depth.
fn walk_ids(
    cmdline: &CommandLine,
    root: &Path,
    root_dev: Option<u64>,
    seen: &mut BTreeSet<(u64, u64)>,
    cancelled: &AtomicBool,
) -> bool {
    let mut limit = 0usize;
    loop {
        let mut reached_frontier = false;
        let stop = walk_bounded(cmdline, root, root_dev, seen, cancelled, limit, &mut reached_frontier);
        if stop || cancelled.load(Ordering::Relaxed) {
            return true;
        }
        if !reached_frontier || (limit as i64) >= cmdline.maxdepth {
            return false;
        }
        limit += 1;
    }
}

fn walk_bounded(
    cmdline: &CommandLine,
    root: &Path,
    root_dev: Option<u64>,
    seen: &mut BTreeSet<(u64, u64)>,
    cancelled: &AtomicBool,
    limit: usize,
    reached_frontier: &mut bool,
) -> bool {
    let mut queue = VecDeque::new();
    queue.push_back(Frontier {
        path: root.to_path_buf(),
        depth: 0,
    });
    while let Some(Frontier { path, depth }) = queue.pop_front() {
        if cancelled.load(Ordering::Relaxed) {
            return true;
        }
        if depth == limit {
            *reached_frontier = true;
            let outcome = visit_entry(cmdline, &path, root, depth, seen);
            if outcome.stop {
                return true;
            }
            continue;
        }
        let typeflag = resolve_typeflag(cmdline, &path, depth, cmdline.default_stat_flags());
        if typeflag.matches(TypeMask::DIRECTORY) && within_bounds(cmdline, &path, depth, root_dev) {
            enqueue_children(cmdline, &path, depth, &mut queue);
        }
    }
    false
}

struct VisitOutcome {
    descend: bool,
    stop: bool,
}

struct EvalOutcome {
    pruned: bool,
    stop: bool,
}

fn within_bounds(cmdline: &CommandLine, path: &Path, depth: usize, root_dev: Option<u64>) -> bool {
    if (depth as i64) >= cmdline.maxdepth {
        return false;
    }
    if cmdline.flags.contains(Flags::MOUNT) || cmdline.flags.contains(Flags::XDEV) {
        use std::os::unix::fs::MetadataExt;
        if let (Some(root_dev), Ok(meta)) = (root_dev, std::fs::metadata(path)) {
            if meta.dev() != root_dev {
                return false;
            }
        }
    }
    true
}

/// Resolves a path's typeflag, reporting (subject to the race-ignoring
/// policy) any stat failure — a file that vanished between `readdir` and
/// `stat` is exactly the race `--ignore-readdir-race` exists to tolerate.
/// Falls back to an empty `TypeMask` either way, so a vanished or
/// unreadable entry is simply treated as matching no type.
fn resolve_typeflag(cmdline: &CommandLine, path: &Path, depth: usize, stat_flags: StatFlags) -> TypeMask {
    let meta = if stat_flags.contains(StatFlags::NOFOLLOW) {
        std::fs::symlink_metadata(path)
    } else {
        std::fs::metadata(path)
    };
    match meta {
        Ok(meta) => typeflag_of(meta.file_type()),
        Err(err) => {
            error::report_io(&cmdline.status, path.display(), &err, depth, cmdline.ignore_races);
            TypeMask(0)
        }
    }
}

/// `-unique`/cycle-detection dedup: `true` the first time `(dev, ino)` is
/// seen, `false` on every repeat. A no-op (always `true`) unless
/// `-unique` or symlink cycle detection is enabled.
fn dedup_allows(cmdline: &CommandLine, path: &Path, seen: &mut BTreeSet<(u64, u64)>) -> bool {
    if !cmdline.unique && !cmdline.flags.contains(Flags::DETECT_CYCLES) {
        return true;
    }
    use std::os::unix::fs::MetadataExt;
    match std::fs::metadata(path) {
        Ok(meta) => seen.insert((meta.dev(), meta.ino())),
        Err(_) => true,
    }
}

fn evaluate_at(
    cmdline: &CommandLine,
    path: &Path,
    root: &Path,
    depth: usize,
    kind: VisitKind,
    seen: &mut BTreeSet<(u64, u64)>,
) -> EvalOutcome {
    // A duplicate `(dev, ino)` must block descent (`pruned: true`) the
    // same way an explicit `-prune` would, regardless of mindepth — a
    // cycle below mindepth is still a cycle. An out-of-range depth must
    // not block descent, since descendants further down may still be in
    // range.
    if !dedup_allows(cmdline, path, seen) {
        return EvalOutcome { pruned: true, stop: false };
    }
    let in_range = (depth as i64) >= cmdline.mindepth && (depth as i64) <= cmdline.maxdepth;
    if !in_range {
        return EvalOutcome { pruned: false, stop: false };
    }
    if cmdline.xargs_safe && crate::output::contains_xargs_unsafe_char(path) {
        error::report(&cmdline.status, format_args!("{}: contains a character unsafe to pass to xargs", path.display()));
        return EvalOutcome { pruned: true, stop: false };
    }
    let stat_flags = cmdline.default_stat_flags();
    let typeflag = resolve_typeflag(cmdline, path, depth, stat_flags);
    let state = VisitState::new(path, root, depth, kind, typeflag, stat_flags, None);
    walker::evaluate(&cmdline.expr, &state, cmdline);
    EvalOutcome {
        pruned: state.action.get() == VisitAction::Prune,
        stop: state.quit.get() || state.action.get() == VisitAction::Stop,
    }
}

/// Single-pass evaluation used by `Bfs`/`Ids`, which have no stable
/// post-order point to defer to.
fn visit_entry(cmdline: &CommandLine, path: &Path, root: &Path, depth: usize, seen: &mut BTreeSet<(u64, u64)>) -> VisitOutcome {
    let outcome = evaluate_at(cmdline, path, root, depth, VisitKind::Pre, seen);
    let typeflag = resolve_typeflag(cmdline, path, depth, cmdline.default_stat_flags());
    VisitOutcome {
        descend: !outcome.pruned && typeflag.matches(TypeMask::DIRECTORY),
        stop: outcome.stop,
    }
}
