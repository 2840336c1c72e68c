//! hand_morph — interactive entry point.

use std::path::PathBuf;

use anyhow::Context;
use pico_args::Arguments;

use hand_morph::app::{self, SourceKind};
use hand_morph::config::Profile;
use hand_morph::logging;

const HELP: &str = "\
hand_morph — hand-steered morphing particle cloud

USAGE:
  hand_morph [OPTIONS]

OPTIONS:
  --config PATH     load a TOML profile (built-in defaults when omitted)
  --tracker CMD     read landmarks from an external tracker command,
                    quoted and split on whitespace:
                      hand_morph --tracker 'python3 tracker.py'
  --particles N     override the particle count
  -h, --help        print this help

KEYS:
  1-5 pick a shape    c cycle color    esc quit
  mouse move, scroll pinch, q/e roll, f1-f5 fingers, g fist,
  space hand in/out   (simulated hand only)
";

fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let config_path: Option<PathBuf> = args.opt_value_from_str("--config")?;
    let tracker: Option<String> = args.opt_value_from_str("--tracker")?;
    let particles: Option<usize> = args.opt_value_from_str("--particles")?;
    let rest = args.finish();
    if !rest.is_empty() {
        anyhow::bail!("unexpected arguments: {rest:?} (see --help)");
    }

    let mut profile = match &config_path {
        Some(path) => Profile::load(path)
            .with_context(|| format!("loading profile {}", path.display()))?,
        None => Profile::default(),
    };
    if let Some(n) = particles {
        profile.engine.particle_count = n;
    }
    profile.validate()?;

    println!();
    println!("╔════════════════════════════════════════════╗");
    println!("║   Hand Morph — hand-steered particle art   ║");
    println!("╚════════════════════════════════════════════╝");
    println!();
    match &tracker {
        Some(cmd) => println!("  Mode: external tracker ({cmd})"),
        None => println!("  Mode: simulated hand  (use --tracker CMD for a real one)"),
    }
    println!();

    let kind = match tracker {
        Some(cmd) => SourceKind::Tracker(cmd.split_whitespace().map(str::to_string).collect()),
        None => SourceKind::Sim,
    };

    if let Err(e) = app::run(profile, kind) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
