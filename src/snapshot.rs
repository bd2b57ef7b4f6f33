use serde::Serialize;
use std::collections::BTreeMap;

const KIB_PER_MIB: f64 = 1024.0;
const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub hostname: String,
    pub uptime_seconds: f64,
    pub boot_time: String,
    pub temperatures: BTreeMap<String, f64>,
    pub memory: MemoryStat,
    pub load_avg: [f64; 3],
    pub cpu_percent: Option<f64>,
    pub gpu_percent: Option<f64>,
    pub recent_boots: Vec<String>,
    pub reboot_causes: BTreeMap<String, RebootCause>,
    pub disk: DiskStat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStat {
    pub total_mb: f64,
    pub used_mb: f64,
    pub available_mb: f64,
    pub swap_total_mb: f64,
    pub swap_used_mb: f64,
}

impl MemoryStat {
    /// Builds the record from raw `/proc/meminfo` counters in kB.
    /// Differences are taken before rounding and never clamped.
    pub fn from_kib(total: u64, available: u64, swap_total: u64, swap_free: u64) -> Self {
        let total = total as f64 / KIB_PER_MIB;
        let available = available as f64 / KIB_PER_MIB;
        let swap_total = swap_total as f64 / KIB_PER_MIB;
        let swap_free = swap_free as f64 / KIB_PER_MIB;
        Self {
            total_mb: round1(total),
            used_mb: round1(total - available),
            available_mb: round1(available),
            swap_total_mb: round1(swap_total),
            swap_used_mb: round1(swap_total - swap_free),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskStat {
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
}

impl DiskStat {
    pub fn from_blocks(blocks: u64, free_blocks: u64, fragment_size: u64) -> Self {
        let total = blocks as f64 * fragment_size as f64;
        let free = free_blocks as f64 * fragment_size as f64;
        Self {
            total_gb: round1(total / BYTES_PER_GIB),
            used_gb: round1((total - free) / BYTES_PER_GIB),
            free_gb: round1(free / BYTES_PER_GIB),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebootCause {
    pub cause: String,
    pub detail: String,
}

impl RebootCause {
    /// Cause detection is not implemented; only the raw log line is kept.
    pub fn unknown(detail: impl Into<String>) -> Self {
        Self {
            cause: "unknown".to_string(),
            detail: detail.into(),
        }
    }
}

pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_from_meminfo_scenario() {
        let mem = MemoryStat::from_kib(16_384_000, 8_192_000, 2_048_000, 2_048_000);
        assert_eq!(
            mem,
            MemoryStat {
                total_mb: 16000.0,
                used_mb: 8000.0,
                available_mb: 8000.0,
                swap_total_mb: 2000.0,
                swap_used_mb: 0.0,
            }
        );
    }

    #[test]
    fn memory_used_is_total_minus_available() {
        for (total, avail, swap_total, swap_free) in [
            (8_000_000_u64, 1_234_567_u64, 0_u64, 0_u64),
            (65_536_000, 65_000_000, 4_096_000, 1_000),
            (1_000, 999, 10, 3),
        ] {
            let mem = MemoryStat::from_kib(total, avail, swap_total, swap_free);
            assert!((mem.used_mb - (mem.total_mb - mem.available_mb)).abs() <= 0.1 + 1e-9);
            let swap_free_mb = swap_free as f64 / 1024.0;
            assert!((mem.swap_used_mb - (mem.swap_total_mb - swap_free_mb)).abs() <= 0.1 + 1e-9);
        }
    }

    #[test]
    fn inconsistent_memory_counters_pass_through_negative() {
        let mem = MemoryStat::from_kib(1024, 2048, 0, 1024);
        assert_eq!(mem.used_mb, -1.0);
        assert_eq!(mem.swap_used_mb, -1.0);
    }

    #[test]
    fn disk_from_tiny_block_counts() {
        let disk = DiskStat::from_blocks(100, 40, 4096);
        assert_eq!(disk.total_gb, 0.0);
        assert!((disk.used_gb + disk.free_gb - disk.total_gb).abs() <= 0.1);
    }

    #[test]
    fn disk_used_is_total_minus_free() {
        let gib = 1024 * 1024 * 1024_u64;
        let disk = DiskStat::from_blocks(500 * gib / 4096, 123 * gib / 4096, 4096);
        assert_eq!(disk.total_gb, 500.0);
        assert_eq!(disk.free_gb, 123.0);
        assert_eq!(disk.used_gb, 377.0);
    }

    #[test]
    fn round1_keeps_one_decimal() {
        assert_eq!(round1(75.04), 75.0);
        assert_eq!(round1(75.06), 75.1);
        assert_eq!(round1(0.0), 0.0);
    }

    #[test]
    fn snapshot_serializes_absent_values_as_null() {
        let snapshot = MetricsSnapshot {
            hostname: "node-1".to_string(),
            uptime_seconds: 12.5,
            boot_time: "2024-01-01T00:00:00Z".to_string(),
            temperatures: BTreeMap::new(),
            memory: MemoryStat::from_kib(0, 0, 0, 0),
            load_avg: [0.5, 0.25, 0.125],
            cpu_percent: None,
            gpu_percent: None,
            recent_boots: Vec::new(),
            reboot_causes: BTreeMap::new(),
            disk: DiskStat::from_blocks(0, 0, 4096),
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value["cpu_percent"].is_null());
        assert!(value["gpu_percent"].is_null());
        assert_eq!(value["load_avg"], serde_json::json!([0.5, 0.25, 0.125]));
        assert_eq!(value["reboot_causes"], serde_json::json!({}));
        assert_eq!(value["memory"]["swap_used_mb"], serde_json::json!(0.0));
    }
}
