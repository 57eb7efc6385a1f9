use anyhow::{Context, Result};
use chrono::{NaiveTime, Timelike};
use nmea::sentences::rmc::RmcStatusOfFix;
use nmea::ParseResult;
use time::Time;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info};

use crate::fix::{FixSample, FixSource};

const KNOTS_TO_MPH: f64 = 1.150_779;

pub enum NmeaSource {
    Serial(BufReader<SerialStream>),
    File(BufReader<File>),
}

impl NmeaSource {
    pub fn serial(dev: &str, baud: u32) -> Result<Self> {
        let port = tokio_serial::new(dev, baud).open_native_async()
            .with_context(|| format!("open serial {}", dev))?;
        Ok(Self::Serial(BufReader::new(port)))
    }

    pub fn file(path: &str) -> Result<Self> {
        let f = std::fs::File::open(path).with_context(|| format!("open nmea file {}", path))?;
        let f = File::from_std(f);
        Ok(Self::File(BufReader::new(f)))
    }

    pub async fn next_line(&mut self) -> Result<String> {
        let mut line = String::new();
        loop {
            line.clear();
            match self {
                NmeaSource::Serial(r) => {
                    let n = r.read_line(&mut line).await.context("read gps serial")?;
                    anyhow::ensure!(n > 0, "gps serial closed");
                }
                NmeaSource::File(r) => {
                    let n = r.read_line(&mut line).await.context("read nmea file")?;
                    if n == 0 {
                        // EOF: wait for more
                        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                        continue;
                    }
                }
            }
            return Ok(line);
        }
    }
}

/// Turns RMC/GGA sentences into fix samples.
///
/// Speed, course and time only arrive in RMC, so the decoder carries the last
/// values forward into samples built from GGA. A void RMC or a GGA without a
/// position keeps the previous coordinates.
#[derive(Debug, Default)]
pub struct NmeaDecoder {
    lat: f64,
    lon: f64,
    speed_mph: f64,
    course_deg: f64,
    time: Option<Time>,
}

impl NmeaDecoder {
    /// `None` for unsupported, malformed or checksum-failing sentences.
    pub fn decode(&mut self, line: &str) -> Option<FixSample> {
        let valid = match nmea::parse_str(line.trim()).ok()? {
            ParseResult::RMC(rmc) => {
                self.update_time(rmc.fix_time);
                self.update_position(rmc.lat, rmc.lon);
                if let Some(knots) = rmc.speed_over_ground {
                    self.speed_mph = knots as f64 * KNOTS_TO_MPH;
                }
                if let Some(course) = rmc.true_course {
                    self.course_deg = course as f64;
                }
                !matches!(rmc.status_of_fix, RmcStatusOfFix::Invalid)
            }
            ParseResult::GGA(gga) => {
                self.update_time(gga.fix_time);
                self.update_position(gga.latitude, gga.longitude);
                gga.fix_type.map(|t| t.is_valid()).unwrap_or(false)
            }
            _ => return None,
        };

        Some(FixSample {
            lat: self.lat,
            lon: self.lon,
            speed_mph: self.speed_mph,
            course_deg: self.course_deg,
            fix_valid: valid,
            time: self.time,
        })
    }

    fn update_position(&mut self, lat: Option<f64>, lon: Option<f64>) {
        if let (Some(lat), Some(lon)) = (lat, lon) {
            self.lat = lat;
            self.lon = lon;
        }
    }

    fn update_time(&mut self, t: Option<NaiveTime>) {
        let Some(t) = t else { return };
        // leap seconds (nanosecond >= 1e9) have no `time::Time` equivalent
        if let Ok(t) = Time::from_hms_nano(t.hour() as u8, t.minute() as u8, t.second() as u8, t.nanosecond()) {
            self.time = Some(t);
        }
    }
}

/// Fix source fed by a background reader. Draining never waits.
pub struct ChannelFixSource {
    rx: mpsc::Receiver<FixSample>,
}

impl ChannelFixSource {
    pub fn new(rx: mpsc::Receiver<FixSample>) -> Self {
        Self { rx }
    }
}

impl FixSource for ChannelFixSource {
    fn next_sample(&mut self) -> Option<FixSample> {
        self.rx.try_recv().ok()
    }
}

/// Read and decode sentences on a task of their own; samples queue up until the
/// navigator drains them on its next tick.
pub fn spawn_reader(src: NmeaSource, echo_raw: bool, capacity: usize) -> (ChannelFixSource, JoinHandle<Result<()>>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = tokio::spawn(pump(src, echo_raw, tx));
    (ChannelFixSource::new(rx), handle)
}

async fn pump(mut src: NmeaSource, echo_raw: bool, tx: mpsc::Sender<FixSample>) -> Result<()> {
    info!("gnss: reader started");
    let mut decoder = NmeaDecoder::default();
    loop {
        let line = src.next_line().await?;
        if echo_raw {
            debug!("nmea: {}", line.trim_end());
        }
        let Some(sample) = decoder.decode(&line) else { continue };
        if tx.send(sample).await.is_err() {
            info!("gnss: navigator gone, reader exiting");
            return Ok(());
        }
    }
}
