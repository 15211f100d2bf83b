//! A small harness that wires a [`servo_client::ServoService`] to a
//! demo planar-arm kinematics model and either a scripted command file
//! or a single one-shot command, printing status and outgoing commands
//! to the terminal. There is no real transport here — this exists to
//! exercise the tick engine end-to-end.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use servo_client::{PlanarChainArm, ServoService};
use servo_types::{Configuration, JointJogCmd, JointState, Stamp};

mod script;

use script::{Command, Script};

/// Servo controller demo harness.
#[derive(Parser, Debug)]
#[command(name = "servo-cli")]
#[command(about = "Drives the realtime servo tick engine against a demo arm model", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs a scripted sequence of twist/jog commands against the demo arm.
    Run {
        /// Path to a servo configuration TOML file. Falls back to defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to a script file of timestamped commands.
        #[arg(long)]
        script: PathBuf,

        /// Number of joints in the demo arm.
        #[arg(long, default_value_t = 6)]
        joints: usize,
    },

    /// Jogs a single joint at a fixed velocity for a fixed number of ticks.
    Jog {
        #[arg(long, default_value = "joint_0")]
        joint: String,

        #[arg(long, default_value_t = 0.2)]
        velocity: f64,

        #[arg(long, default_value_t = 50)]
        ticks: u32,

        #[arg(long, default_value_t = 6)]
        joints: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("servo_cli=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, script, joints } => run_scripted(config, script, joints),
        Commands::Jog { joint, velocity, ticks, joints } => run_jog(joint, velocity, ticks, joints),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Configuration> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            Configuration::from_toml(&text).with_context(|| "parsing servo configuration")
        },
        None => Ok(Configuration::default()),
    }
}

fn install_ctrlc_handler(stop_requested: Arc<AtomicBool>) {
    let _ = ctrlc::set_handler(move || {
        tracing::info!("ctrl-c received, requesting shutdown");
        stop_requested.store(true, Ordering::Relaxed);
    });
}

fn seed_joint_state(service: &ServoService, num_joints: usize) {
    service.send_joint_state(JointState {
        names: (0..num_joints).map(|i| format!("joint_{i}")).collect(),
        positions: vec![0.0; num_joints],
        velocities: vec![0.0; num_joints],
        stamp: Stamp(0.0),
    });
}

fn print_tick(elapsed: f64, service: &ServoService) {
    let status = service.latest_status();
    let command = service.latest_command();
    let stop_time = service.latest_stop_time();
    println!("t={elapsed:.3}s status={status:?} stop_time={stop_time:?} command={command:?}");
}

fn run_jog(joint: String, velocity: f64, ticks: u32, num_joints: usize) -> Result<()> {
    let config = Configuration::default();
    let period = Duration::from_secs_f64(config.publish_period);
    let arm = PlanarChainArm::new(num_joints, 0.3);
    let service = ServoService::new(config, arm)?;

    let stop_requested = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(Arc::clone(&stop_requested));

    seed_joint_state(&service, num_joints);
    service.start().context("starting servo service")?;

    let start = std::time::Instant::now();
    for _ in 0..ticks {
        if stop_requested.load(Ordering::Relaxed) {
            break;
        }
        service.send_joint_jog(JointJogCmd {
            names: vec![joint.clone()],
            velocities: vec![velocity],
            stamp: Stamp(start.elapsed().as_secs_f64()),
        });
        std::thread::sleep(period);
        print_tick(start.elapsed().as_secs_f64(), &service);
    }

    service.stop();
    Ok(())
}

fn run_scripted(config_path: Option<PathBuf>, script_path: PathBuf, num_joints: usize) -> Result<()> {
    let config = load_config(config_path)?;
    let period = Duration::from_secs_f64(config.publish_period);
    let script_text = std::fs::read_to_string(&script_path)
        .with_context(|| format!("reading script file {}", script_path.display()))?;
    let script = Script::parse(&script_text).with_context(|| "parsing script file")?;

    let arm = PlanarChainArm::new(num_joints, 0.3);
    let service = ServoService::new(config, arm)?;

    let stop_requested = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(Arc::clone(&stop_requested));

    seed_joint_state(&service, num_joints);
    service.start().context("starting servo service")?;

    let start = std::time::Instant::now();
    let mut next_command = 0usize;
    let duration = script.duration().max(period.as_secs_f64());
    while start.elapsed().as_secs_f64() < duration {
        if stop_requested.load(Ordering::Relaxed) {
            break;
        }
        let now = start.elapsed().as_secs_f64();
        while next_command < script.commands.len() && script.commands[next_command].at <= now {
            match &script.commands[next_command].command {
                Command::Twist(twist) => {
                    let mut twist = twist.clone();
                    twist.stamp = Stamp(now);
                    service.send_twist(twist);
                },
                Command::Jog(jog) => {
                    let mut jog = jog.clone();
                    jog.stamp = Stamp(now);
                    service.send_joint_jog(jog);
                },
            }
            next_command += 1;
        }
        std::thread::sleep(period);
        print_tick(now, &service);
    }

    service.stop();
    Ok(())
}
