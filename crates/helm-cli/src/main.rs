mod compass;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use helm_nav::actuator::{ActuatorSink, RudderPosition, SpeedLevel};
use helm_nav::{doctor as nav_doctor, gnss, NavConfig, Navigator};
use helm_servo::ServoConfig;

use crate::compass::CompassCfg;

#[derive(Debug, Parser)]
#[command(name = "helm", version, about = "helm - waypoint autopilot for small surface vehicles")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the config file and the sources it names.
    Doctor,
    /// Navigate the configured waypoints until interrupted.
    Run,
    Servo { #[command(subcommand)] cmd: ServoCmd },
}

#[derive(Debug, Subcommand)]
enum ServoCmd {
    /// Sweep the rudder full left, center, full right, center.
    Test,
}

#[derive(Debug, serde::Deserialize)]
struct Config {
    nav: NavConfig,
    gnss: GnssCfg,
    compass: CompassCfg,
    #[serde(default)]
    servo: ServoConfig,
}

#[derive(Debug, serde::Deserialize)]
struct GnssCfg {
    source: String,
    nmea_device: Option<String>,
    #[serde(default = "default_gnss_baud")]
    baud: u32,
    nmea_file: Option<String>,
    #[serde(default)]
    echo_raw: bool,
}

fn default_gnss_baud() -> u32 { 9600 }

fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).context("read config")?;
    Ok(toml::from_str(&s).context("parse config toml")?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg).await?,
        Command::Run => run(cfg).await?,
        Command::Servo { cmd } => servo_cmd(&cfg, cmd).await?,
    }
    Ok(())
}

async fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");

    nav_doctor::check_nav(&cfg.nav)?;
    nav_doctor::check_gnss_source(
        &cfg.gnss.source,
        cfg.gnss.nmea_device.as_deref(),
        Some(cfg.gnss.baud),
        cfg.gnss.nmea_file.as_deref(),
    )?;
    compass::check(&cfg.compass)?;

    match cfg.servo.backend.as_str() {
        "log" => info!("doctor: servo backend=log, no commands will reach hardware"),
        "mavlink" => {
            anyhow::ensure!(cfg.servo.serial_dev.as_ref().map(|s| !s.is_empty()).unwrap_or(false), "servo.serial_dev missing");
            anyhow::ensure!(cfg.servo.baud.unwrap_or(0) > 0, "servo.baud invalid");
            anyhow::ensure!(cfg.servo.rudder_channel != cfg.servo.esc_channel, "servo.rudder_channel and esc_channel collide");
            if let (Some(dev), Some(baud)) = (cfg.servo.serial_dev.as_deref(), cfg.servo.baud) {
                helm_servo::mav::check_device(dev, baud)?;
            }
        }
        other => bail!("unknown servo.backend: {}", other),
    }

    match &cfg.nav.home {
        Some(home) => info!("doctor: home fixed at {}", home),
        None => info!("doctor: home latched from first stable fix"),
    }
    for (i, wp) in cfg.nav.waypoints.iter().enumerate() {
        info!("doctor: waypoint {} at {}", i + 1, wp);
    }

    info!("doctor: OK");
    Ok(())
}

async fn servo_cmd(cfg: &Config, cmd: ServoCmd) -> Result<()> {
    match cmd {
        ServoCmd::Test => {
            let mut sink = helm_servo::open_sink(&cfg.servo)?;
            sink.set_speed(SpeedLevel::Stop);
            for pos in [RudderPosition::FullLeft, RudderPosition::Center, RudderPosition::FullRight, RudderPosition::Center] {
                info!("servo test: rudder {}", pos);
                sink.set_rudder(pos);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            Ok(())
        }
    }
}

async fn run(cfg: Config) -> Result<()> {
    info!("run: starting");

    let src = match cfg.gnss.source.as_str() {
        "nmea-serial" => gnss::NmeaSource::serial(cfg.gnss.nmea_device.as_deref().context("gnss.nmea_device missing")?, cfg.gnss.baud)?,
        "nmea-file" => gnss::NmeaSource::file(cfg.gnss.nmea_file.as_deref().context("gnss.nmea_file missing")?)?,
        other => bail!("unknown gnss.source: {}", other),
    };
    let echo_raw = cfg.gnss.echo_raw || cfg.nav.gps_test;
    let (fixes, mut reader) = gnss::spawn_reader(src, echo_raw, 64);

    let mag = compass::open(&cfg.compass)?;
    let sink = helm_servo::open_sink(&cfg.servo)?;
    let mut navigator = Navigator::new(cfg.nav, fixes, mag, sink).context("navigator")?;

    let mut ticker = tokio::time::interval(Duration::from_millis(navigator.config().tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut resume = ResumeSignal::new()?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = navigator.tick();
                for ev in &report.events {
                    info!("{}", ev);
                }
            }
            _ = resume.recv() => {
                info!("run: resume requested (state {})", navigator.state());
                navigator.resume();
            }
            res = &mut ctrl_c => {
                navigator.halt();
                if let Err(e) = res {
                    warn!("run: ctrl-c handler failed: {}", e);
                }
                info!("run: interrupted, motor stopped");
                break;
            }
            res = &mut reader => {
                navigator.halt();
                match res {
                    Ok(Ok(())) => bail!("gnss reader stopped"),
                    Ok(Err(e)) => return Err(e.context("gnss reader")),
                    Err(e) => bail!("gnss reader task failed: {}", e),
                }
            }
        }
    }
    Ok(())
}

/// SIGUSR1 asks an idling navigator to carry on.
#[cfg(unix)]
struct ResumeSignal(tokio::signal::unix::Signal);

#[cfg(unix)]
impl ResumeSignal {
    fn new() -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self(signal(SignalKind::user_defined1()).context("install SIGUSR1 handler")?))
    }

    async fn recv(&mut self) {
        if self.0.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
struct ResumeSignal;

#[cfg(not(unix))]
impl ResumeSignal {
    fn new() -> Result<Self> { Ok(Self) }

    async fn recv(&mut self) {
        std::future::pending::<()>().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_config_is_valid() {
        let cfg: Config = toml::from_str(include_str!("../../../helm.example.toml")).unwrap();
        nav_doctor::check_nav(&cfg.nav).unwrap();
        assert_eq!(cfg.gnss.source, "nmea-serial");
        assert_eq!(cfg.servo.backend, "log");
        assert!(cfg.nav.home.is_none());
        assert_eq!(cfg.nav.waypoints.len(), 3);
        compass::check(&cfg.compass).unwrap();
    }

    #[test]
    fn servo_section_is_optional() {
        let cfg: Config = toml::from_str(
            r#"
[nav]
waypoints = [{ lat = 1.0, lon = 2.0 }]
bearing_tolerance_deg = 10.0
switch_waypoint_m = 5.0
gps_stabilize_ticks = 50

[gnss]
source = "nmea-file"
nmea_file = "track.nmea"

[compass]
source = "fixed"
mag_x = 1.0
"#,
        )
        .unwrap();
        assert_eq!(cfg.servo.backend, "log");
        assert_eq!(cfg.gnss.baud, 9600);
        assert_eq!(cfg.nav.refresh_every_ticks, 10);
    }
}
