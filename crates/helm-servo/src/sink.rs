use anyhow::{anyhow, bail, Result};
use helm_nav::actuator::{ActuatorSink, RudderPosition, SpeedLevel};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::mav::ServoLink;
use crate::safety::RepeatFilter;
use crate::{angle_to_pulse_us, ServoConfig};

const HEARTBEAT_EVERY: Duration = Duration::from_secs(1);

/// Dry-run sink: logs what would be sent.
pub struct LogSink {
    cfg: ServoConfig,
    filter: RepeatFilter,
}

impl LogSink {
    pub fn new(cfg: ServoConfig) -> Self {
        let filter = RepeatFilter::new(Duration::from_millis(cfg.repeat_ms));
        Self { cfg, filter }
    }
}

impl ActuatorSink for LogSink {
    fn set_speed(&mut self, level: SpeedLevel) {
        if self.filter.allow_speed(level) {
            info!("servo: speed {} ({} us)", level, self.cfg.speed.pulse(level));
        }
    }

    fn set_rudder(&mut self, position: RudderPosition) {
        if self.filter.allow_rudder(position) {
            let angle = self.cfg.rudder.angle(position, self.cfg.reverse_rudder);
            info!("servo: rudder {} ({:.0} deg)", position, angle);
        }
    }
}

/// Drives the rudder and ESC outputs over MAVLink. A background task keeps the
/// companion heartbeat going whether or not commands are flowing.
pub struct MavServoSink {
    link: Arc<Mutex<ServoLink>>,
    cfg: ServoConfig,
    filter: RepeatFilter,
    heartbeat: JoinHandle<()>,
}

impl MavServoSink {
    /// Must be called from inside a tokio runtime.
    pub fn open(cfg: ServoConfig) -> Result<Self> {
        let link = Arc::new(Mutex::new(ServoLink::open(&cfg)?));
        info!(
            "servo: mavlink link up (rudder ch {}, esc ch {})",
            cfg.rudder_channel, cfg.esc_channel
        );
        let heartbeat = tokio::spawn(heartbeat_loop(Arc::clone(&link), HEARTBEAT_EVERY));
        let filter = RepeatFilter::new(Duration::from_millis(cfg.repeat_ms));
        Ok(Self { link, cfg, filter, heartbeat })
    }

    fn write(&mut self, channel: u16, pulse_us: u16) {
        let res = match self.link.lock() {
            Ok(mut link) => link.set_servo(channel, pulse_us),
            Err(_) => Err(anyhow!("servo link lock poisoned")),
        };
        if let Err(e) = res {
            warn!("servo: ch {} -> {} us failed: {:#}", channel, pulse_us, e);
        }
    }
}

impl Drop for MavServoSink {
    fn drop(&mut self) {
        self.heartbeat.abort();
    }
}

trait Heartbeat {
    fn beat(&mut self) -> Result<()>;
}

impl Heartbeat for ServoLink {
    fn beat(&mut self) -> Result<()> {
        self.send_heartbeat()
    }
}

async fn heartbeat_loop<L: Heartbeat>(link: Arc<Mutex<L>>, period: Duration) {
    let mut every = tokio::time::interval(period);
    loop {
        every.tick().await;
        let res = match link.lock() {
            Ok(mut link) => link.beat(),
            Err(_) => return,
        };
        if let Err(e) = res {
            warn!("servo: {:#}", e);
        }
    }
}

impl ActuatorSink for MavServoSink {
    fn set_speed(&mut self, level: SpeedLevel) {
        if self.filter.allow_speed(level) {
            let pulse = self.cfg.speed.pulse(level);
            self.write(self.cfg.esc_channel, pulse);
        }
    }

    fn set_rudder(&mut self, position: RudderPosition) {
        if self.filter.allow_rudder(position) {
            let pulse = angle_to_pulse_us(self.cfg.rudder.angle(position, self.cfg.reverse_rudder));
            self.write(self.cfg.rudder_channel, pulse);
        }
    }
}

pub fn open_sink(cfg: &ServoConfig) -> Result<Box<dyn ActuatorSink + Send>> {
    match cfg.backend.as_str() {
        "log" => Ok(Box::new(LogSink::new(cfg.clone()))),
        "mavlink" => Ok(Box::new(MavServoSink::open(cfg.clone())?)),
        other => bail!("unknown servo backend: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_backend_opens_without_hardware() {
        let mut sink = open_sink(&ServoConfig::default()).unwrap();
        sink.set_rudder(RudderPosition::FullLeft);
        sink.set_speed(SpeedLevel::Forward25);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let cfg = ServoConfig { backend: "pwm".into(), ..ServoConfig::default() };
        let err = open_sink(&cfg).err().unwrap();
        assert!(err.to_string().contains("pwm"));
    }

    #[test]
    fn mavlink_backend_needs_a_device() {
        let cfg = ServoConfig { backend: "mavlink".into(), ..ServoConfig::default() };
        let err = open_sink(&cfg).err().unwrap();
        assert!(err.to_string().contains("serial_dev"));
    }

    #[derive(Default)]
    struct Beats(u32);

    impl Heartbeat for Beats {
        fn beat(&mut self) -> Result<()> {
            self.0 += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn heartbeat_runs_without_commands() {
        let beats = Arc::new(Mutex::new(Beats::default()));
        let task = tokio::spawn(heartbeat_loop(Arc::clone(&beats), Duration::from_millis(20)));
        tokio::time::sleep(Duration::from_millis(150)).await;
        task.abort();
        assert!(beats.lock().unwrap().0 >= 3);
    }
}
