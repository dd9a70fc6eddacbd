use std::path::PathBuf;
use std::time::SystemTime;

use crate::exit_code::ExitStatus;
use crate::expr::node::Node;
use crate::flags::{DebugFlags, Flags, StatFlags, Strategy};
use crate::ids::IdCache;
use crate::mount::MountTable;
use crate::output::ColorTable;

/// The command-line model: the contract `spec.md` §6 describes between the
/// parser (out of scope) and the evaluator (in scope). Built once before
/// traversal starts and held by shared reference throughout (the only
/// exclusive-ownership edge is `expr`, the tree root — see `spec.md` §3).
pub struct CommandLine {
    pub paths: Vec<PathBuf>,
    pub maxdepth: i64,
    pub mindepth: i64,
    pub flags: Flags,
    pub strategy: Strategy,
    pub unique: bool,
    pub xargs_safe: bool,
    pub ignore_races: bool,
    pub debug: DebugFlags,
    pub mtab: MountTable,
    pub ids: IdCache,
    pub status: ExitStatus,
    pub expr: Node,
    pub nopen_files: usize,
    pub colors: ColorTable,
    /// Reference instant captured once, used by `-mtime`/`-used`/`-newer`'s
    /// default "now" when no explicit reference file/timestamp is given.
    pub now: SystemTime,
}

impl CommandLine {
    /// The default stat follow-policy bits derived from `flags`, handed to
    /// predicates (`-type`, `-xtype`, `-empty`, ...) that need to know
    /// whether the *default* (non-`-xtype`) resolution follows symlinks.
    pub fn default_stat_flags(&self) -> StatFlags {
        if self.flags.contains(Flags::LOGICAL) {
            StatFlags::empty()
        } else if self.flags.contains(Flags::COMFOLLOW) {
            StatFlags::TRYFOLLOW
        } else {
            StatFlags::NOFOLLOW
        }
    }
}
