//! CPU utilisation from two `/proc/stat` samples.
//!
//! The aggregate `cpu` line is read, the sampler waits a fixed interval and
//! reads it again. Utilisation is the share of non-idle ticks in the delta.
//! Every request pays the interval as part of its latency.

use crate::collectors::system::read_file;
use crate::collectors::SourceError;
use crate::config::SourcesConfig;
use crate::snapshot::round1;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

pub struct CpuSampler {
    stat_path: PathBuf,
    interval: Duration,
}

impl CpuSampler {
    pub fn new(cfg: &SourcesConfig) -> Self {
        Self {
            stat_path: cfg.proc_file("stat"),
            interval: cfg.cpu_sample_interval(),
        }
    }

    pub async fn sample(&self) -> Result<f64, SourceError> {
        let first = self.read_times()?;
        tokio::time::sleep(self.interval).await;
        let second = self.read_times()?;
        cpu_percent(first, second)
    }

    fn read_times(&self) -> Result<CpuTimes, SourceError> {
        let content = read_file(&self.stat_path)?;
        let line = content.lines().next().unwrap_or_default();
        parse_cpu_line(line).ok_or_else(|| SourceError::Parse {
            path: self.stat_path.display().to_string(),
            detail: format!("некорректная строка cpu: '{line}'"),
        })
    }
}

/// Parses `cpu  user nice system idle ...`; idle is the fourth counter.
pub fn parse_cpu_line(line: &str) -> Option<CpuTimes> {
    let values = line
        .split_whitespace()
        .skip(1)
        .map(|v| v.parse::<u64>().ok())
        .collect::<Option<Vec<u64>>>()?;
    let idle = *values.get(3)?;
    Some(CpuTimes {
        idle,
        total: values.iter().sum(),
    })
}

pub fn cpu_percent(first: CpuTimes, second: CpuTimes) -> Result<f64, SourceError> {
    let delta_total = second.total as f64 - first.total as f64;
    let delta_idle = second.idle as f64 - first.idle as f64;
    if delta_total == 0.0 {
        return Err(SourceError::NoCpuTicks);
    }

    let percent = round1((1.0 - delta_idle / delta_total) * 100.0);
    if !(0.0..=100.0).contains(&percent) {
        return Err(SourceError::CpuCounterAnomaly {
            delta_idle,
            delta_total,
        });
    }
    Ok(percent)
}
