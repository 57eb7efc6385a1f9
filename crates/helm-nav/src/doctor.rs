use anyhow::{Context, Result};
use tracing::warn;

use crate::config::NavConfig;

pub fn check_nav(cfg: &NavConfig) -> Result<()> {
    cfg.validate().context("nav config")?;
    if cfg.switch_waypoint_m < 3.0 {
        warn!("nav.switch_waypoint_m={} is below typical GPS accuracy", cfg.switch_waypoint_m);
    }
    if cfg.bearing_tolerance_deg < 1.0 {
        warn!("nav.bearing_tolerance_deg={} will make the rudder hunt", cfg.bearing_tolerance_deg);
    }
    if cfg.gps_test {
        warn!("nav.gps_test=true: the vehicle will idle after GPS lock");
    }
    Ok(())
}

pub fn check_gnss_source(source: &str, device: Option<&str>, baud: Option<u32>, file: Option<&str>) -> Result<()> {
    match source {
        "nmea-serial" => {
            anyhow::ensure!(device.map(|d| !d.is_empty()).unwrap_or(false), "gnss.nmea_device missing");
            anyhow::ensure!(baud.unwrap_or(0) > 0, "gnss.baud invalid");
        }
        "nmea-file" => {
            let path = file.filter(|f| !f.is_empty()).context("gnss.nmea_file missing")?;
            anyhow::ensure!(std::path::Path::new(path).is_file(), "gnss.nmea_file not found: {}", path);
        }
        other => anyhow::bail!("unknown gnss.source: {}", other),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gnss_source_checks() {
        assert!(check_gnss_source("nmea-serial", Some("/dev/ttyAMA0"), Some(9600), None).is_ok());
        assert!(check_gnss_source("nmea-serial", Some(""), Some(9600), None).is_err());
        assert!(check_gnss_source("nmea-serial", Some("/dev/ttyAMA0"), None, None).is_err());
        assert!(check_gnss_source("nmea-file", None, None, None).is_err());
        assert!(check_gnss_source("nmea-file", None, None, Some("/definitely/not/here.nmea")).is_err());
        assert!(check_gnss_source("ublox", None, None, None).is_err());
    }
}
