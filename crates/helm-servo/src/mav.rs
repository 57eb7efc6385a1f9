use anyhow::{Context, Result};
use mavlink::{
    common::{MavAutopilot, MavCmd, MavMessage, MavModeFlag, MavState, MavType, COMMAND_LONG_DATA, HEARTBEAT_DATA},
    MavConnection, MavHeader,
};
use std::time::Duration;
use tracing::debug;

use crate::ServoConfig;

/// Check that the servo port can be opened at `baud`, then release it.
pub fn check_device(dev: &str, baud: u32) -> Result<()> {
    tokio_serial::new(dev, baud)
        .timeout(Duration::from_millis(200))
        .open()
        .map(drop)
        .with_context(|| format!("servo port {} @ {}", dev, baud))
}

/// Companion heartbeat: we are an onboard controller, not an autopilot.
fn heartbeat() -> MavMessage {
    MavMessage::HEARTBEAT(HEARTBEAT_DATA {
        custom_mode: 0,
        mavtype: MavType::MAV_TYPE_ONBOARD_CONTROLLER,
        autopilot: MavAutopilot::MAV_AUTOPILOT_INVALID,
        base_mode: MavModeFlag::empty(),
        system_status: MavState::MAV_STATE_ACTIVE,
        mavlink_version: 3,
    })
}

/// Servo outputs on a MAVLink flight controller, driven with DO_SET_SERVO.
pub struct ServoLink {
    conn: Box<dyn MavConnection<MavMessage> + Send + Sync>,
    hdr: MavHeader,
    target: (u8, u8),
}

impl ServoLink {
    pub fn open(cfg: &ServoConfig) -> Result<Self> {
        let dev = cfg.serial_dev.as_deref().context("servo.serial_dev is required for the mavlink backend")?;
        let baud = cfg.baud.context("servo.baud is required for the mavlink backend")?;
        check_device(dev, baud)?;

        let url = format!("serial:{}:{}", dev, baud);
        let conn = mavlink::connect::<MavMessage>(&url).with_context(|| format!("mavlink connect {}", url))?;
        Ok(Self {
            conn,
            hdr: MavHeader { system_id: cfg.sys_id, component_id: cfg.comp_id, sequence: 0 },
            target: (cfg.target_sys, cfg.target_comp),
        })
    }

    pub fn send_heartbeat(&mut self) -> Result<()> {
        self.send(&heartbeat()).context("servo heartbeat")
    }

    /// Set servo output `channel` to `pulse_us`.
    pub fn set_servo(&mut self, channel: u16, pulse_us: u16) -> Result<()> {
        debug!(channel, pulse_us, "servo: DO_SET_SERVO");
        let msg = command_long(self.target, MavCmd::MAV_CMD_DO_SET_SERVO, [channel as f32, pulse_us as f32]);
        self.send(&msg).with_context(|| format!("DO_SET_SERVO ch {}", channel))
    }

    fn send(&mut self, msg: &MavMessage) -> Result<()> {
        self.hdr.sequence = self.hdr.sequence.wrapping_add(1);
        self.conn.send(&self.hdr, msg)?;
        Ok(())
    }
}

/// COMMAND_LONG with the leading params set and the rest zeroed.
fn command_long<const N: usize>((system, component): (u8, u8), command: MavCmd, params: [f32; N]) -> MavMessage {
    let mut p = [0.0f32; 7];
    p[..N].copy_from_slice(&params);
    MavMessage::COMMAND_LONG(COMMAND_LONG_DATA {
        target_system: system,
        target_component: component,
        command,
        confirmation: 0,
        param1: p[0],
        param2: p[1],
        param3: p[2],
        param4: p[3],
        param5: p[4],
        param6: p[5],
        param7: p[6],
    })
}
