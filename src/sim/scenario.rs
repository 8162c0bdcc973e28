use std::path::Path;

use log::info;
use thiserror::Error;

/// Custom error types for scenario loading
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Scenario file could not be read")]
    Io(#[from] std::io::Error),
    #[error("Scenario row is malformed")]
    Csv(#[from] csv::Error),
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),
    #[error("Invalid power value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioPoint {
    /// Seconds from midnight
    pub time_sec: u32,
    pub load_w: f64,
    pub solar_w: f64,
}

/// Time-of-day indexed (load, solar) samples, kept sorted by time.
#[derive(Debug, Clone)]
pub struct Scenario {
    points: Vec<ScenarioPoint>,
}

impl Scenario {
    pub fn new(mut points: Vec<ScenarioPoint>) -> Self {
        points.sort_by_key(|p| p.time_sec);
        return Scenario { points };
    }

    pub fn len(&self) -> usize {
        return self.points.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.points.is_empty();
    }

    /// Load a `time,load_w,solar_w` CSV where time is `HH:MM`.
    pub fn from_csv_path(path: &Path) -> Result<Self, ScenarioError> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut points = Vec::new();
        for record in reader.records() {
            let record = record?;
            let time = record.get(0).unwrap_or("").trim();
            let load = record.get(1).unwrap_or("").trim();
            let solar = record.get(2).unwrap_or("").trim();

            let time_sec = parse_time_of_day(time)?;
            let load_w: f64 = load
                .parse()
                .map_err(|_| ScenarioError::InvalidValue(load.to_string()))?;
            let solar_w: f64 = solar
                .parse()
                .map_err(|_| ScenarioError::InvalidValue(solar.to_string()))?;
            points.push(ScenarioPoint {
                time_sec,
                load_w,
                solar_w,
            });
        }
        info!("Loaded {} scenario points from {}", points.len(), path.display());
        return Ok(Scenario::new(points));
    }

    /// Linear interpolation of (load, solar) at the given time of day.
    ///
    /// The bracketing pair is the last point at or before `now` and the
    /// first point after it; when the pair straddles midnight (next point
    /// numerically earlier than the previous one) both the next point and,
    /// if needed, `now` are shifted by a day before interpolating. A single
    /// point holds constant. Empty scenarios sample to nothing.
    pub fn sample(&self, now_sec: f64) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }

        let mut prev = self.points.last().unwrap();
        let mut next = &self.points[0];
        for point in &self.points {
            if (point.time_sec as f64) > now_sec {
                next = point;
                break;
            }
            prev = point;
        }

        let t1 = prev.time_sec as f64;
        let mut t2 = next.time_sec as f64;
        if t1 == t2 {
            return Some((prev.load_w, prev.solar_w));
        }

        let mut now = now_sec;
        if t2 < t1 {
            /* Interval crosses midnight */
            t2 += 86400.0;
            if now < t1 {
                now += 86400.0;
            }
        }

        let ratio = ((now - t1) / (t2 - t1)).clamp(0.0, 1.0);
        let load = prev.load_w + (next.load_w - prev.load_w) * ratio;
        let solar = prev.solar_w + (next.solar_w - prev.solar_w) * ratio;
        return Some((load, solar));
    }
}

fn parse_time_of_day(text: &str) -> Result<u32, ScenarioError> {
    let mut parts = text.split(':');
    let hh = parts.next().and_then(|p| p.parse::<u32>().ok());
    let mm = parts.next().and_then(|p| p.parse::<u32>().ok());
    match (hh, mm) {
        (Some(h), Some(m)) if h < 24 && m < 60 => Ok(h * 3600 + m * 60),
        _ => Err(ScenarioError::InvalidTime(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scenario() -> Scenario {
        return Scenario::new(vec![
            ScenarioPoint { time_sec: 6 * 3600, load_w: 400.0, solar_w: 0.0 },
            ScenarioPoint { time_sec: 12 * 3600, load_w: 800.0, solar_w: 2000.0 },
            ScenarioPoint { time_sec: 18 * 3600, load_w: 1200.0, solar_w: 0.0 },
        ]);
    }

    #[test]
    fn interpolates_between_points() {
        let s = scenario();
        /* 09:00 is halfway between 06:00 and 12:00 */
        let (load, solar) = s.sample(9.0 * 3600.0).unwrap();
        assert!((load - 600.0).abs() < 1e-9);
        assert!((solar - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn exact_point_returns_point_value() {
        let s = scenario();
        let (load, solar) = s.sample(12.0 * 3600.0).unwrap();
        assert!((load - 800.0).abs() < 1e-9);
        assert!((solar - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn wraps_across_midnight() {
        let s = scenario();
        /* 18:00 (1200 W) -> 06:00 (400 W) spans twelve hours; midnight
        sits at the halfway mark both before and after the wrap. */
        let (load, _) = s.sample(0.0).unwrap();
        assert!((load - 800.0).abs() < 1e-9);
        let (load, _) = s.sample(21.0 * 3600.0).unwrap();
        assert!((load - 1000.0).abs() < 1e-9);
        let (load, _) = s.sample(3.0 * 3600.0).unwrap();
        assert!((load - 600.0).abs() < 1e-9);
    }

    #[test]
    fn single_point_holds_constant() {
        let s = Scenario::new(vec![ScenarioPoint {
            time_sec: 12 * 3600,
            load_w: 650.0,
            solar_w: 70.0,
        }]);
        assert_eq!(s.sample(3.0 * 3600.0), Some((650.0, 70.0)));
        assert_eq!(s.sample(20.0 * 3600.0), Some((650.0, 70.0)));
    }

    #[test]
    fn empty_scenario_samples_nothing() {
        let s = Scenario::new(Vec::new());
        assert_eq!(s.sample(0.0), None);
    }

    #[test]
    fn loads_and_sorts_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "time,load_w,solar_w").unwrap();
        writeln!(file, "12:00,800,2000").unwrap();
        writeln!(file, "06:30,400,0").unwrap();
        file.flush().unwrap();

        let s = Scenario::from_csv_path(file.path()).unwrap();
        assert_eq!(s.len(), 2);
        let (load, _) = s.sample(6.5 * 3600.0).unwrap();
        assert!((load - 400.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_time() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "time,load_w,solar_w").unwrap();
        writeln!(file, "25:00,800,2000").unwrap();
        file.flush().unwrap();
        assert!(Scenario::from_csv_path(file.path()).is_err());
    }
}
