//! CLI front-end (§6): `cubeward [OPTIONS] [SLICE...]`.
//!
//! Grounded on the teacher's `bin/pms/main.rs` `Opt`/`fn main()`/`fn handle()`
//! split: `main` only prints whatever `handle` returns, `handle` does the
//! actual work and stays unit-testable in spirit (though CLI wiring itself
//! isn't unit tested here, matching the teacher).

use std::{path::PathBuf, process};

use structopt::StructOpt;

use cubeward::config::{self, raw::RawConfig, Config, Overrides};
use cubeward::{Error, Kind, Result, SliceHandle};

#[derive(StructOpt)]
#[structopt(name = "cubeward", about = "Crash-safe, single-writer append engine for chunked cubes")]
struct Opt {
    /// Configuration file; repeatable, later files merge over earlier ones.
    #[structopt(short = "c", long = "config")]
    config: Vec<PathBuf>,

    /// Override `target_dir` from the merged configuration.
    #[structopt(short = "t", long = "target")]
    target: Option<String>,

    /// Delete an existing cube (and its lock) before running.
    #[structopt(long = "force-new")]
    force_new: bool,

    /// Log intended actions without writing anything.
    #[structopt(long = "dry-run")]
    dry_run: bool,

    /// Include a backtrace in the error output.
    #[structopt(long = "traceback")]
    traceback: bool,

    /// Print the configuration schema and exit, without running anything.
    #[structopt(long = "help-config")]
    help_config: Option<String>,

    /// Print the crate version and exit.
    #[structopt(long = "version")]
    version: bool,

    /// Slice URIs to append, in order.
    slices: Vec<String>,
}

fn main() {
    let opt = Opt::from_args();
    let traceback = opt.traceback;

    if opt.version {
        println!("cubeward {}", cubeward::VERSION);
        return;
    }

    if let Some(format) = opt.help_config.as_deref() {
        match print_help_config(format) {
            Ok(()) => return,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(2);
            }
        }
    }

    match handle(opt) {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e);
            if traceback {
                eprintln!("{:?}", e);
            }
            process::exit(exit_code(&e));
        }
    }
}

fn print_help_config(format: &str) -> Result<()> {
    match format {
        "json" => {
            println!("{}", config::help_json());
            Ok(())
        }
        "md" => {
            println!("{}", config::help_markdown());
            Ok(())
        }
        other => Err(Error::new(
            Kind::Config,
            format!("--help-config: expected \"json\" or \"md\", got {:?}", other),
            "cubeward/main.rs",
        )),
    }
}

fn handle(opt: Opt) -> Result<()> {
    let overrides = Overrides {
        target_dir: opt.target.clone(),
        force_new: if opt.force_new { Some(true) } else { None },
        dry_run: if opt.dry_run { Some(true) } else { None },
    };
    // `-t/--target` alone (no `-c`) is enough to run: build straight off the
    // override rather than demanding a file just to hold one field.
    let cfg: Config = if opt.config.is_empty() {
        Config::from_raw(overrides.apply(RawConfig::default()))?
    } else {
        Config::load(&opt.config, overrides)?
    };

    init_logging(&cfg);

    let slices = opt.slices.iter().cloned().map(SliceHandle::path);
    let outcomes = cubeward::process(slices, cfg)?;
    log::info!("committed {} slice(s)", outcomes.len());
    Ok(())
}

fn init_logging(cfg: &Config) {
    env_logger::Builder::new()
        .filter_level(cfg.logging.level)
        .try_init()
        .ok();
}

/// Maps an error's [`Kind`] onto a process exit code; every non-zero code
/// is reserved so a caller's own scripting can branch on it (§6: "non-zero
/// on any error surface described in §7").
fn exit_code(err: &Error) -> i32 {
    match err.kind() {
        Kind::Config => 2,
        Kind::TargetLocked => 3,
        Kind::SliceUnavailable => 4,
        Kind::SliceSchema | Kind::SliceShape | Kind::AppendOrder => 5,
        Kind::Io => 6,
        Kind::Transaction => 7,
        Kind::Cancelled => 8,
        Kind::Internal => 70,
    }
}
