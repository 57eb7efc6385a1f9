use anyhow::{bail, ensure, Context, Result};
use helm_nav::heading::{FixedMag, MagSource, MagVector};

#[derive(Debug, serde::Deserialize)]
pub struct CompassCfg {
    pub source: String,
    #[serde(default)]
    pub mag_x: f64,
    #[serde(default)]
    pub mag_y: f64,
    pub replay_file: Option<String>,
}

/// Plays back recorded `x,y` magnetometer readings, one per tick, looping at the end.
pub struct ReplayMag {
    samples: Vec<MagVector>,
    pos: usize,
}

impl ReplayMag {
    pub fn load(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("read compass replay {}", path))?;
        Self::parse(&text).with_context(|| format!("parse compass replay {}", path))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut samples = Vec::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') { continue; }
            let (x, y) = line.split_once(',').with_context(|| format!("line {}: expected x,y", n + 1))?;
            let x: f64 = x.trim().parse().with_context(|| format!("line {}: bad x", n + 1))?;
            let y: f64 = y.trim().parse().with_context(|| format!("line {}: bad y", n + 1))?;
            samples.push(MagVector::new(x, y));
        }
        ensure!(!samples.is_empty(), "no samples");
        Ok(Self { samples, pos: 0 })
    }
}

impl MagSource for ReplayMag {
    fn read(&mut self) -> Option<MagVector> {
        let v = self.samples.get(self.pos).copied();
        self.pos = (self.pos + 1) % self.samples.len();
        v
    }
}

pub fn open(cfg: &CompassCfg) -> Result<Box<dyn MagSource + Send>> {
    match cfg.source.as_str() {
        "fixed" => Ok(Box::new(FixedMag(MagVector::new(cfg.mag_x, cfg.mag_y)))),
        "replay" => {
            let path = cfg.replay_file.as_deref().context("compass.replay_file missing")?;
            Ok(Box::new(ReplayMag::load(path)?))
        }
        other => bail!("unknown compass.source: {}", other),
    }
}

pub fn check(cfg: &CompassCfg) -> Result<()> {
    match cfg.source.as_str() {
        "fixed" => ensure!(
            cfg.mag_x.is_finite() && cfg.mag_y.is_finite() && (cfg.mag_x != 0.0 || cfg.mag_y != 0.0),
            "compass.mag_x/mag_y must be a non-zero vector"
        ),
        "replay" => {
            let path = cfg.replay_file.as_deref().context("compass.replay_file missing")?;
            ReplayMag::load(path)?;
        }
        other => bail!("unknown compass.source: {}", other),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_loops() {
        let mut m = ReplayMag::parse("# x,y\n1,0\n\n0, 1\n").unwrap();
        assert_eq!(m.read(), Some(MagVector::new(1.0, 0.0)));
        assert_eq!(m.read(), Some(MagVector::new(0.0, 1.0)));
        assert_eq!(m.read(), Some(MagVector::new(1.0, 0.0)));
    }

    #[test]
    fn replay_rejects_junk() {
        assert!(ReplayMag::parse("").is_err());
        assert!(ReplayMag::parse("1;0").is_err());
        assert!(ReplayMag::parse("1,north").is_err());
    }

    #[test]
    fn fixed_needs_a_vector() {
        let cfg = CompassCfg { source: "fixed".into(), mag_x: 0.0, mag_y: 0.0, replay_file: None };
        assert!(check(&cfg).is_err());
        let cfg = CompassCfg { mag_y: -3.0, ..cfg };
        assert!(check(&cfg).is_ok());
    }
}
