mod config;
mod core;
mod frame_loop;
mod graph;
mod headless;
mod render;
mod spatial;
mod types;
mod ui;

use std::{fs::File, io, path::PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use env_logger::{Env, Target};
use log::LevelFilter;

use crate::{config::FieldConfig, graph::GraphStrategy, types::Viewport};

/// Interactive particle field with proximity links, drawn in the terminal
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// YAML file overriding the built-in tunables
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Seed for the particle sampler; random when omitted
    #[arg(short, long)]
    seed: Option<u64>,
    /// Number of particles
    #[arg(short, long)]
    particles: Option<usize>,
    /// Proximity graph strategy
    #[arg(short, long, value_enum)]
    graph: Option<GraphStrategy>,
    /// Run without a terminal UI
    #[arg(long, default_value_t = false)]
    headless: bool,
    /// Ticks to simulate in headless mode; 0 runs until Ctrl-C
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Headless surface width
    #[arg(long, default_value_t = config::HEADLESS_WIDTH)]
    width: f32,
    /// Headless surface height
    #[arg(long, default_value_t = config::HEADLESS_HEIGHT)]
    height: f32,
    /// Write logs to this file (the interactive UI logs nowhere otherwise)
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completion scripts
    Completions {
        /// The shell to generate the script for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(Commands::Completions { shell }) = args.command {
        let mut cmd = Args::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    init_logging(&args)?;
    let config = load_config(&args)?;

    if args.headless {
        headless::run(config, Viewport::new(args.width, args.height), args.ticks)?;
        Ok(())
    } else {
        ui::run(config)
    }
}

fn load_config(args: &Args) -> Result<FieldConfig> {
    let mut config = match &args.config {
        Some(path) => FieldConfig::load(path)?,
        None => FieldConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(count) = args.particles {
        config.particle_count = count;
    }
    if let Some(graph) = args.graph {
        config.graph = graph;
    }
    config.validate()?;
    log::debug!("effective config: {config:?}");
    Ok(config)
}

fn init_logging(args: &Args) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    match &args.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            builder.target(Target::Pipe(Box::new(file)));
        }
        // stderr would scribble over the alternate screen
        None if !args.headless => {
            builder.filter_level(LevelFilter::Off);
        }
        None => {}
    }
    builder.init();
    Ok(())
}
