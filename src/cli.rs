//! Command-line parsing: global traversal options, parsed with `clap`'s
//! derive API. Everything after
//! the search paths is handed verbatim to `expr::parser` (`spec.md` §1
//! places the expression grammar itself out of this crate's core scope;
//! `SPEC_FULL.md` §4.0 is what asks for this file to exist at all).

use std::path::PathBuf;
use std::time::SystemTime;

use clap::{Parser, ValueEnum};

use crate::cmdline::CommandLine;
use crate::exit_code::ExitStatus;
use crate::expr::parser::Parser as ExprParser;
use crate::flags::{DebugFlags, Flags, Strategy};
use crate::ids::IdCache;
use crate::mount::MountTable;
use crate::output::ColorTable;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Bfs,
    Dfs,
    Ids,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Strategy {
        match arg {
            StrategyArg::Bfs => Strategy::Bfs,
            StrategyArg::Dfs => Strategy::Dfs,
            StrategyArg::Ids => Strategy::Ids,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorWhen {
    Always,
    Auto,
    Never,
}

/// Global options, parsed before the search paths and expression. Modeled
/// on `bfs`'s option set rather than GNU find's full vocabulary — the
/// subset `spec.md`'s evaluator actually consults (follow policy,
/// min/maxdepth, `-depth`, mount-boundary flags, race tolerance,
/// traversal strategy, debug channels, `-unique`).
#[derive(Parser, Debug)]
#[command(name = "bfind", about = "A breadth-first, find-compatible search tool")]
pub struct Opts {
    /// Follow all symbolic links (`-L`).
    #[arg(short = 'L', long = "follow")]
    pub follow: bool,

    /// Never follow symbolic links (`-P`, the default).
    #[arg(short = 'P', long = "no-follow", overrides_with = "follow")]
    pub no_follow: bool,

    /// Follow symbolic links named directly on the command line only
    /// (`-H`).
    #[arg(short = 'H', long = "comfollow")]
    pub comfollow: bool,

    /// Descend at most this many levels.
    #[arg(long)]
    pub maxdepth: Option<i64>,

    /// Don't apply tests/actions at levels shallower than this.
    #[arg(long)]
    pub mindepth: Option<i64>,

    /// Apply tests/actions to a directory only after its contents
    /// (`-d`/`-depth`, post-order).
    #[arg(short = 'd', long = "depth")]
    pub depth_flag: bool,

    /// Don't descend into directories on other filesystems.
    #[arg(long)]
    pub mount: bool,

    /// Alias for `--mount` (GNU find spelling).
    #[arg(long)]
    pub xdev: bool,

    /// Suppress errors caused by a file vanishing between being listed
    /// and being examined.
    #[arg(long)]
    pub ignore_readdir_race: bool,

    /// Escape shell-unsafe characters in `-fprintx` output.
    #[arg(long)]
    pub xargs_safe: bool,

    /// Traversal order.
    #[arg(long, value_enum, default_value_t = StrategyArg::Bfs)]
    pub strategy: StrategyArg,

    /// Comma-separated debug channels: `rates`, `stat`, `search`.
    #[arg(short = 'D', long = "debug", value_delimiter = ',')]
    pub debug: Vec<String>,

    /// Skip files already visited by another path (hard links,
    /// `-L`-followed symlink cycles).
    #[arg(long)]
    pub unique: bool,

    /// Colorize `-print`/`-fprint`/`-ls` output.
    #[arg(long, value_enum, default_value_t = ColorWhen::Auto)]
    pub color: ColorWhen,

    /// Search paths followed by the expression. The split between the
    /// two is positional: the run of leading arguments that don't look
    /// like the start of an expression (`-primary`, `!`, `(`) are the
    /// search paths; everything from the first one that does is the
    /// expression, handed to `expr::parser`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<String>,
}

fn looks_like_expression_start(token: &str) -> bool {
    token == "!" || token == "(" || token.starts_with('-')
}

fn split_paths_and_expression(rest: Vec<String>) -> (Vec<PathBuf>, Vec<String>) {
    let split_at = rest
        .iter()
        .position(|tok| looks_like_expression_start(tok))
        .unwrap_or(rest.len());
    let mut paths: Vec<PathBuf> = rest[..split_at].iter().map(PathBuf::from).collect();
    let expression = rest[split_at..].to_vec();
    if paths.is_empty() {
        paths.push(PathBuf::from("."));
    }
    (paths, expression)
}

fn resolve_debug_flags(names: &[String]) -> DebugFlags {
    let mut flags = DebugFlags::empty();
    for name in names {
        flags = flags
            | match name.as_str() {
                "rates" => DebugFlags::RATES,
                "stat" => DebugFlags::STAT,
                "search" => DebugFlags::SEARCH,
                _ => DebugFlags::empty(),
            };
    }
    flags
}

impl Opts {
    /// Resolve this parsed command line into a `CommandLine` ready for
    /// the traversal driver, parsing the trailing expression tokens along
    /// the way.
    pub fn into_command_line(self) -> anyhow::Result<CommandLine> {
        let (paths, expr_tokens) = split_paths_and_expression(self.rest);

        let mut flags = Flags::empty();
        if self.follow {
            flags = flags | Flags::LOGICAL | Flags::DETECT_CYCLES;
        } else if self.comfollow {
            flags = flags | Flags::COMFOLLOW;
        }
        if self.depth_flag {
            flags = flags | Flags::DEPTH;
        }
        if self.mount || self.xdev {
            flags = flags | Flags::MOUNT | Flags::XDEV;
        }

        let expr = ExprParser::new(expr_tokens)
            .parse()
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;

        Ok(CommandLine {
            paths,
            maxdepth: self.maxdepth.unwrap_or(i64::MAX),
            mindepth: self.mindepth.unwrap_or(0),
            flags,
            strategy: self.strategy.into(),
            unique: self.unique,
            xargs_safe: self.xargs_safe,
            ignore_races: self.ignore_readdir_race,
            debug: resolve_debug_flags(&self.debug),
            mtab: MountTable::load(),
            ids: IdCache::new(),
            status: ExitStatus::new(),
            expr,
            nopen_files: 0,
            colors: ColorTable::new(matches!(self.color, ColorWhen::Always)),
            now: SystemTime::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_non_dash_tokens_are_paths() {
        let (paths, expr) = split_paths_and_expression(vec![
            "src".to_string(),
            "tests".to_string(),
            "-name".to_string(),
            "*.rs".to_string(),
        ]);
        assert_eq!(paths, vec![PathBuf::from("src"), PathBuf::from("tests")]);
        assert_eq!(expr, vec!["-name".to_string(), "*.rs".to_string()]);
    }

    #[test]
    fn no_paths_defaults_to_dot() {
        let (paths, _expr) = split_paths_and_expression(vec!["-type".to_string(), "f".to_string()]);
        assert_eq!(paths, vec![PathBuf::from(".")]);
    }

    #[test]
    fn debug_flags_parse_known_names() {
        let flags = resolve_debug_flags(&["rates".to_string(), "stat".to_string()]);
        assert!(flags.contains(DebugFlags::RATES));
        assert!(flags.contains(DebugFlags::STAT));
        assert!(!flags.contains(DebugFlags::SEARCH));
    }
}
