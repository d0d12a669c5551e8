//! Subcommand implementations.  Each returns plain data; `main` prints it.

use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use posekit_motion::{FrameCounter, UpdateMode};
use posekit_recorder::{AudioClip, save_wav};
use posekit_types::{PoseSample, Quaternion, Vec3};
use tracing::{debug, info, warn};

use crate::config::{self, Config};
use crate::errors::{CliError, Result};
use crate::input;
use crate::session::{RunSummary, Session};

/// Output of a recording command.
pub struct RunOutcome {
    pub summary: RunSummary,
    pub summary_path: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────────────────────
// estimate
// ─────────────────────────────────────────────────────────────────────────────

/// Replay a pose CSV through a virtual IMU.
///
/// In `fixed` mode every row advances `cfg.fixed_dt`; in `frame` mode the
/// timestamp difference to the last accepted row is used, so rows with a
/// repeated or decreasing timestamp are skipped.
pub fn estimate(cfg: &Config, input: &Path, name: Option<&str>, output_name: Option<&str>) -> Result<RunOutcome> {
    let rows = input::parse_file(input)?;
    let name = name
        .map(str::to_string)
        .or_else(|| input.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "imu".to_string());

    let mut session = Session::start(&name, input.display().to_string(), cfg, output_name)?;
    let first = rows[0];
    session.seed(first.orientation, first.position, first.timestamp)?;

    let mut last_accepted = first.timestamp;
    for (index, row) in rows.iter().enumerate().skip(1) {
        let dt = match cfg.update_mode {
            UpdateMode::Fixed => cfg.fixed_dt,
            UpdateMode::Frame => (row.timestamp - last_accepted) as f32,
        };
        let sample = PoseSample::new(row.orientation, row.position, dt);
        if session.step(&sample, row.timestamp)?.is_some() {
            last_accepted = row.timestamp;
        } else {
            warn!(line = index + 2, "pose row skipped");
        }
    }

    let (summary, summary_path) = session.finish(None)?;
    Ok(RunOutcome { summary, summary_path })
}

// ─────────────────────────────────────────────────────────────────────────────
// simulate
// ─────────────────────────────────────────────────────────────────────────────

/// Analytic rigid-body motion: constant spin about a fixed axis plus
/// constant linear acceleration from an initial velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trajectory {
    pub axis: Vec3,
    /// Spin rate (rad/s).
    pub rate: f32,
    pub velocity: Vec3,
    pub acceleration: Vec3,
}

impl Trajectory {
    pub fn new(axis: Vec3, rate_deg_per_s: f32, velocity: Vec3, acceleration: Vec3) -> Self {
        Self {
            axis: axis.normalized(),
            rate: rate_deg_per_s * PI / 180.0,
            velocity,
            acceleration,
        }
    }

    /// Orientation and position at time `t` (s).
    pub fn pose_at(&self, t: f64) -> (Quaternion, Vec3) {
        let t = t as f32;
        let orientation = Quaternion::from_axis_angle(self.axis, self.rate * t);
        let position = self.velocity * t + self.acceleration * (0.5 * t * t);
        (orientation, position)
    }
}

pub struct SimulateOptions {
    /// `0` runs until `shutdown` is raised, paced in real time.
    pub ticks: u64,
    pub trajectory: Trajectory,
    pub realtime: bool,
    pub name: String,
    pub output_name: Option<String>,
}

/// Feed a synthetic trajectory to a virtual IMU.
///
/// Ticks advance `cfg.fixed_dt`, except in `frame` mode with real-time
/// pacing, where the measured loop time is used.
pub fn simulate(cfg: &Config, opts: &SimulateOptions, shutdown: &Arc<AtomicBool>) -> Result<RunOutcome> {
    let realtime = opts.realtime || opts.ticks == 0;
    let mut session = Session::start(&opts.name, "simulate", cfg, opts.output_name.as_deref())?;
    let mut counter = FrameCounter::new(cfg.fps_smoothing_ratio);

    let (q0, p0) = opts.trajectory.pose_at(0.0);
    session.seed(q0, p0, 0.0)?;

    let step = Duration::try_from_secs_f32(cfg.fixed_dt)
        .map_err(|e| CliError::Config(format!("fixed_dt {} is not a usable tick length: {e}", cfg.fixed_dt)))?;
    let mut t = 0.0f64;
    let mut tick = 0u64;
    let mut last = Instant::now();

    while opts.ticks == 0 || tick < opts.ticks {
        if shutdown.load(Ordering::SeqCst) {
            info!(tick, "shutdown requested");
            break;
        }
        if realtime {
            let spent = last.elapsed();
            if spent < step {
                thread::sleep(step - spent);
            }
        }
        let now = Instant::now();
        let frame_dt = if realtime {
            now.duration_since(last).as_secs_f32()
        } else {
            cfg.fixed_dt
        };
        last = now;

        let dt = match cfg.update_mode {
            UpdateMode::Frame if realtime => frame_dt,
            _ => cfg.fixed_dt,
        };
        t += f64::from(dt);
        let (q, p) = opts.trajectory.pose_at(t);
        session.step(&PoseSample::new(q, p, dt), t)?;
        if let Err(e) = counter.tick(frame_dt) {
            debug!(error = %e, "frame time not counted");
        }
        tick += 1;

        if tick % 500 == 0 {
            session.flush()?;
            debug!(tick, fps = counter.smoothed_fps(), "simulation progress");
        }
    }

    debug!(
        frames = session.sensor().frame(),
        rejected = session.rejected(),
        "simulation loop done"
    );
    let fps = (counter.frame_count() > 0).then(|| counter.smoothed_fps());
    let (summary, summary_path) = session.finish(fps)?;
    Ok(RunOutcome { summary, summary_path })
}

// ─────────────────────────────────────────────────────────────────────────────
// tone
// ─────────────────────────────────────────────────────────────────────────────

pub struct ToneOptions {
    pub frequency: f32,
    pub amplitude: f32,
    pub seconds: f32,
    pub sample_rate: u32,
    pub channels: u16,
    pub trim_seconds: Option<f32>,
}

/// Sine tone, identical on every channel.
pub fn tone_clip(opts: &ToneOptions) -> Result<AudioClip> {
    if !(opts.seconds.is_finite() && opts.seconds > 0.0) {
        return Err(CliError::Config(format!("tone length must be positive, got {}", opts.seconds)));
    }
    // Reject channel and rate combinations before allocating the samples.
    AudioClip::new(Vec::new(), opts.channels, opts.sample_rate)?;
    let frames = (opts.seconds * opts.sample_rate as f32).round() as usize;
    let channels = usize::from(opts.channels);
    let mut samples = Vec::with_capacity(frames * channels);
    for i in 0..frames {
        let t = i as f32 / opts.sample_rate as f32;
        let v = opts.amplitude * (2.0 * PI * opts.frequency * t).sin();
        samples.extend(std::iter::repeat_n(v, channels));
    }
    let clip = AudioClip::new(samples, opts.channels, opts.sample_rate)?;
    Ok(match opts.trim_seconds {
        Some(secs) if secs >= 0.0 => clip.trim((secs * opts.sample_rate as f32).round() as usize),
        _ => clip,
    })
}

pub fn tone(opts: &ToneOptions, output: &Path) -> Result<(PathBuf, AudioClip)> {
    let clip = tone_clip(opts)?;
    let path = save_wav(output, &clip)?;
    Ok((path, clip))
}

// ─────────────────────────────────────────────────────────────────────────────
// config
// ─────────────────────────────────────────────────────────────────────────────

/// Effective configuration and where it came from.  With `init`, the
/// default file is written first when none exists.
pub fn show_config(init: bool) -> Result<(Config, PathBuf, bool)> {
    let path = config::config_path();
    let existed = config::load().map_err(CliError::Config)?.is_some();
    if init && !existed {
        config::save(&Config::default()).map_err(CliError::Config)?;
        info!(path = %path.display(), "wrote default config");
    }
    let cfg = config::load_or_default().map_err(CliError::Config)?;
    Ok((cfg, path, init && !existed))
}
