//! Entry point: parse the command line, build the expression tree, walk
//! the filesystem, flush any batched `-exec`, and exit with the
//! accumulated status (`spec.md` §5/§6/§7).

mod action;
mod cli;
mod cmdline;
mod debug;
mod driver;
mod error;
mod exit_code;
mod expr;
mod filesystem;
mod flags;
mod flush;
mod ids;
mod mount;
mod output;
mod predicate;
mod visit;

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

fn main() -> ExitCode {
    let opts = cli::Opts::parse();
    let cmdline = match opts.into_command_line() {
        Ok(cmdline) => cmdline,
        Err(e) => {
            eprintln!("bfind: {e}");
            return ExitCode::from(1);
        }
    };

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = Arc::clone(&cancelled);
        // Cooperative cancellation: the first Ctrl-C asks the traversal
        // to stop at its next opportunity; a second forces an immediate
        // exit, a double-press-to-kill pattern.
        let mut presses = 0u32;
        let _ = ctrlc::set_handler(move || {
            presses += 1;
            cancelled.store(true, Ordering::Relaxed);
            if presses >= 2 {
                std::process::exit(130);
            }
        });
    }

    debug::dump_initial_config(&cmdline);
    let budget = driver::compute_fd_budget(&cmdline);
    if cmdline.debug.contains(flags::DebugFlags::SEARCH) {
        eprintln!("bfind: debug: fd budget = {budget}");
    }

    driver::run(&cmdline, &cancelled);
    flush::flush_all(&cmdline);
    debug::dump_rates(&cmdline);

    ExitCode::from(cmdline.status.get() as u8)
}
