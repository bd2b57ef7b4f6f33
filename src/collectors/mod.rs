pub mod boots;
pub mod command;
pub mod cpu;
pub mod system;
pub mod thermal;

use crate::config::SourcesConfig;
use crate::snapshot::{round1, MetricsSnapshot};
use boots::BootHistory;
use command::ToolError;
use cpu::CpuSampler;
use std::time::SystemTime;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("не удалось прочитать {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("не удалось разобрать {path}: {detail}")]
    Parse { path: String, detail: String },
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("нет данных для {0}")]
    Unavailable(&'static str),
    #[error("счётчики CPU не изменились между замерами")]
    NoCpuTicks,
    #[error("некорректный прирост счётчиков CPU: idle {delta_idle}, total {delta_total}")]
    CpuCounterAnomaly { delta_idle: f64, delta_total: f64 },
}

/// A source with no fallback failed; the request cannot produce a snapshot.
#[derive(Debug, Error)]
#[error("источник {source_name}: {error}")]
pub struct CollectError {
    pub source_name: &'static str,
    #[source]
    pub error: SourceError,
}

fn fatal<T>(source_name: &'static str, result: Result<T, SourceError>) -> Result<T, CollectError> {
    result.map_err(|error| CollectError { source_name, error })
}

fn degraded<T>(source_name: &'static str, result: Result<T, SourceError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(err) => {
            debug!(source = source_name, error = %err, "источник деградировал");
            None
        }
    }
}

/// Samples every source once and builds a snapshot.
///
/// Hostname, uptime, memory, load average and disk are fatal on failure.
/// Temperatures, CPU, GPU and boot history degrade to their absent/empty values.
pub async fn collect_snapshot(cfg: &SourcesConfig) -> Result<MetricsSnapshot, CollectError> {
    let sampler = CpuSampler::new(cfg);
    let (temperatures, cpu_percent, gpu_percent, boot_history) = tokio::join!(
        thermal::collect_temperatures(cfg),
        sampler.sample(),
        thermal::collect_gpu_percent(cfg),
        boots::collect_boot_history(cfg),
    );

    let hostname = fatal("hostname", system::read_hostname(cfg))?;
    let uptime = fatal("uptime", system::read_uptime(cfg))?;
    let boot_time = system::boot_time(SystemTime::now(), uptime);
    let memory = fatal("memory", system::read_memory(cfg))?;
    let load_avg = fatal("load_avg", system::read_load_avg(cfg))?;
    let disk = fatal("disk", system::read_disk(cfg))?;

    let cpu_percent = degraded("cpu_percent", cpu_percent);
    let gpu_percent = degraded("gpu_percent", gpu_percent);
    let boot_history = degraded("boot_history", boot_history).unwrap_or_default();
    let BootHistory {
        recent_boots,
        reboot_causes,
    } = boot_history;

    Ok(MetricsSnapshot {
        hostname,
        uptime_seconds: round1(uptime),
        boot_time,
        temperatures,
        memory,
        load_avg,
        cpu_percent,
        gpu_percent,
        recent_boots,
        reboot_causes,
        disk,
    })
}


#[cfg(all(test, unix))]
mod tests {
    use super::fixtures::host_tree;
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn snapshot_from_fixture_tree() {
        let (_dir, cfg) = host_tree();
        let snapshot = collect_snapshot(&cfg).await.expect("снимок");

        assert_eq!(snapshot.hostname, "fixture-host");
        assert_eq!(snapshot.uptime_seconds, 3600.0);
        assert!(snapshot.boot_time.ends_with('Z'));
        assert_eq!(snapshot.memory.total_mb, 16000.0);
        assert_eq!(snapshot.memory.used_mb, 8000.0);
        assert_eq!(snapshot.memory.swap_used_mb, 0.0);
        assert_eq!(snapshot.load_avg, [1.5, 0.75, 0.25]);
        assert_eq!(snapshot.temperatures.len(), 1);
        assert_eq!(snapshot.temperatures["thermal_zone0"], 42.0);
    }

    #[tokio::test]
    async fn degradable_sources_fall_back() {
        let (_dir, cfg) = host_tree();
        let snapshot = collect_snapshot(&cfg).await.expect("снимок");

        assert_eq!(snapshot.cpu_percent, None);
        assert_eq!(snapshot.gpu_percent, None);
        assert!(!snapshot.temperatures.keys().any(|k| k.starts_with("gpu")));
        assert!(snapshot.recent_boots.is_empty());
        assert!(snapshot.reboot_causes.is_empty());
    }

    #[tokio::test]
    async fn missing_cpu_stat_does_not_abort() {
        let (_dir, cfg) = host_tree();
        fs::remove_file(cfg.proc_file("stat")).unwrap();
        let snapshot = collect_snapshot(&cfg).await.expect("снимок");
        assert_eq!(snapshot.cpu_percent, None);
    }

    #[tokio::test]
    async fn embedded_gpu_fills_gpu_percent() {
        let (dir, cfg) = host_tree();
        fs::create_dir_all(dir.path().join("gpu.0")).unwrap();
        fs::write(&cfg.embedded_gpu_load_path, "250\n").unwrap();
        let snapshot = collect_snapshot(&cfg).await.expect("снимок");
        assert_eq!(snapshot.gpu_percent, Some(25.0));
    }

    #[tokio::test]
    async fn fatal_sources_abort_the_snapshot() {
        for (name, file) in [
            ("uptime", "uptime"),
            ("memory", "meminfo"),
            ("load_avg", "loadavg"),
        ] {
            let (_dir, cfg) = host_tree();
            fs::remove_file(cfg.proc_file(file)).unwrap();
            let err = collect_snapshot(&cfg).await.unwrap_err();
            assert_eq!(err.source_name, name);
        }

        let (_dir, cfg) = host_tree();
        fs::remove_file(&cfg.hostname_path).unwrap();
        let err = collect_snapshot(&cfg).await.unwrap_err();
        assert_eq!(err.source_name, "hostname");
    }
}
