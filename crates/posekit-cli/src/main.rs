//! `posekit-cli` – the `posekit` command.
//!
//! Derives virtual IMU readings (gyroscope + accelerometer) from pose
//! streams:
//!
//! - `estimate` replays a pose CSV through a virtual IMU.
//! - `simulate` drives one from a synthetic spin + acceleration trajectory,
//!   optionally in real time until Ctrl-C.
//! - `tone` writes a sine tone through the WAV exporter.
//! - `config` shows (or initialises) `~/.posekit/config.toml`.

mod commands;
mod config;
mod errors;
mod input;
mod session;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Parser, Subcommand};
use colored::Colorize;
use posekit_recorder::LogWriter;
use posekit_types::Vec3;
use tracing::warn;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{RunOutcome, SimulateOptions, ToneOptions, Trajectory};
use crate::config::Config;
use crate::errors::{CliError, Result};

#[derive(Parser)]
#[command(name = "posekit", version)]
#[command(about = "Virtual IMU readings from observed poses")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a pose CSV (timestamp,qw,qx,qy,qz,px,py,pz) through a virtual IMU
    Estimate {
        /// Pose CSV file
        input: PathBuf,

        /// Sensor name (defaults to the input file stem)
        #[arg(long)]
        name: Option<String>,

        /// Output file stem (defaults to the configured name or HH-MM-SS)
        #[arg(long)]
        output_name: Option<String>,
    },

    /// Feed a synthetic trajectory to a virtual IMU
    Simulate {
        /// Number of ticks; 0 runs in real time until Ctrl-C
        #[arg(long, default_value_t = 500)]
        ticks: u64,

        /// Spin rate in degrees per second
        #[arg(long, default_value_t = 90.0)]
        rate: f32,

        /// Spin axis
        #[arg(long, value_parser = input::parse_vec3, default_value = "0,1,0")]
        axis: Vec3,

        /// Initial linear velocity (m/s)
        #[arg(long, value_parser = input::parse_vec3, default_value = "0,0,0")]
        velocity: Vec3,

        /// Constant linear acceleration (m/s²)
        #[arg(long, value_parser = input::parse_vec3, default_value = "0,0,0")]
        accel: Vec3,

        /// Pace ticks at the configured step in wall-clock time
        #[arg(long)]
        realtime: bool,

        #[arg(long, default_value = "sim")]
        name: String,

        #[arg(long)]
        output_name: Option<String>,
    },

    /// Write a sine tone as a 16-bit PCM WAV file
    Tone {
        #[arg(long, default_value_t = 440.0)]
        frequency: f32,

        #[arg(long, default_value_t = 0.5)]
        amplitude: f32,

        #[arg(long, default_value_t = 1.0)]
        seconds: f32,

        #[arg(long, default_value_t = 44_100)]
        sample_rate: u32,

        #[arg(long, default_value_t = 1)]
        channels: u16,

        /// Keep only the first S seconds
        #[arg(long)]
        trim_seconds: Option<f32>,

        /// Output path (extension is forced to .wav)
        output: PathBuf,
    },

    /// Show the effective configuration
    Config {
        /// Write the default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let cfg = match config::load_or_default() {
        Ok(cfg) => cfg,
        Err(e) if matches!(cli.command, Command::Config { .. }) => {
            eprintln!("{}: {}", "Config error".red(), e);
            eprintln!("  Using default configuration.");
            Config::default()
        }
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            process::exit(1);
        }
    };

    let session_log = cfg.log_dir().and_then(|dir| match LogWriter::create(&dir, cfg.log_tail_chars) {
        Ok(log) => Some(log),
        Err(e) => {
            eprintln!("{}: cannot open log in {}: {}", "Warning".yellow(), dir.display(), e);
            None
        }
    });
    init_tracing(session_log.clone());

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("{}", "⚠  Ctrl-C received – finishing the current run …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; simulate --ticks 0 cannot be stopped cleanly");
    }

    if let Err(e) = run(cli.command, &cfg, &shutdown) {
        eprintln!("{} {}", "error:".red().bold(), e);
        process::exit(1);
    }

    if let Some(log) = session_log {
        println!("  {} {}", "Log:".dimmed(), log.path().display());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// `RUST_LOG` filter (default `info`); `POSEKIT_LOG_FORMAT=json` selects JSON
/// console output.  When `file` is set every event is mirrored into it.
fn init_tracing(file: Option<LogWriter>) {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));
    let use_json = std::env::var("POSEKIT_LOG_FORMAT").as_deref() == Ok("json");

    let file_layer = file.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(w)
    });

    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

fn run(command: Command, cfg: &Config, shutdown: &Arc<AtomicBool>) -> Result<()> {
    match command {
        Command::Estimate {
            input,
            name,
            output_name,
        } => {
            let outcome = commands::estimate(cfg, &input, name.as_deref(), output_name.as_deref())?;
            print_outcome(&outcome);
        }
        Command::Simulate {
            ticks,
            rate,
            axis,
            velocity,
            accel,
            realtime,
            name,
            output_name,
        } => {
            if axis.length() < 1e-6 && rate != 0.0 {
                return Err(CliError::Config("--axis must be non-zero".to_string()));
            }
            let opts = SimulateOptions {
                ticks,
                trajectory: Trajectory::new(axis, rate, velocity, accel),
                realtime,
                name,
                output_name,
            };
            if ticks == 0 {
                println!("  Running until {} …", "Ctrl-C".bold());
            }
            let outcome = commands::simulate(cfg, &opts, shutdown)?;
            print_outcome(&outcome);
        }
        Command::Tone {
            frequency,
            amplitude,
            seconds,
            sample_rate,
            channels,
            trim_seconds,
            output,
        } => {
            let opts = ToneOptions {
                frequency,
                amplitude,
                seconds,
                sample_rate,
                channels,
                trim_seconds,
            };
            let (path, clip) = commands::tone(&opts, &output)?;
            println!(
                "  {} {} ({:.2} s, {} ch, {} Hz)",
                "✓".green(),
                path.display().to_string().bold(),
                clip.duration_secs(),
                clip.channels(),
                clip.frequency()
            );
        }
        Command::Config { init } => {
            let (cfg, path, created) = commands::show_config(init)?;
            if created {
                println!("  {} wrote {}", "✓".green(), path.display().to_string().bold());
            } else {
                println!("  Config file: {}", path.display().to_string().bold());
            }
            let raw = toml::to_string_pretty(&cfg)
                .map_err(|e| CliError::Config(format!("Failed to serialize config: {e}")))?;
            println!();
            for line in raw.lines() {
                println!("    {line}");
            }
        }
    }
    Ok(())
}

fn print_outcome(outcome: &RunOutcome) {
    let s = &outcome.summary;
    let r = &s.final_reading;
    println!();
    println!("  {} {} [{}]", "IMU".bold().cyan(), s.name.bold(), s.instance_id.to_string().dimmed());
    println!("    source        {}", s.source);
    println!("    mode          {}", s.update_mode);
    println!("    frames        {}", s.frames);
    if s.rejected > 0 {
        println!("    rejected      {}", s.rejected.to_string().yellow());
    }
    println!("    elapsed       {:.3} s", s.elapsed_secs);
    if let Some(fps) = s.smoothed_fps {
        println!("    loop rate     {fps:.1} fps");
    }
    println!("    peak gyro     {:.4} rad/s", s.peak_angular_speed);
    println!("    peak accel    {:.4} m/s²", s.peak_acceleration);
    println!("    last gyro     {}", r.angular_velocity_body);
    println!("    last accel    {}", r.linear_acceleration_body);
    match (&s.csv_path, &outcome.summary_path) {
        (Some(csv), Some(json)) => {
            println!("  {} {}", "✓".green(), csv.display().to_string().bold());
            println!("  {} {}", "✓".green(), json.display().to_string().bold());
        }
        (Some(csv), None) => println!("  {} {}", "✓".green(), csv.display().to_string().bold()),
        _ => println!("  {}", "Recording disabled.".dimmed()),
    }
}
