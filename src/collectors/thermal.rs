use crate::collectors::command::run_tool;
use crate::collectors::system::read_file;
use crate::collectors::SourceError;
use crate::config::SourcesConfig;
use std::collections::BTreeMap;
use std::fs;
use tracing::debug;

const GPU_TEMPERATURE_QUERY: [&str; 2] = [
    "--query-gpu=temperature.gpu",
    "--format=csv,noheader,nounits",
];
const GPU_UTILIZATION_QUERY: [&str; 2] = [
    "--query-gpu=utilization.gpu",
    "--format=csv,noheader,nounits",
];

/// Thermal zones in degrees Celsius, plus `gpu{i}` entries from the GPU
/// vendor tool when no zone already looks like a GPU.
pub async fn collect_temperatures(cfg: &SourcesConfig) -> BTreeMap<String, f64> {
    let mut temps = read_thermal_zones(cfg);
    if temps.keys().any(|k| k.to_lowercase().contains("gpu")) {
        return temps;
    }

    match run_tool(&cfg.gpu_tool, &GPU_TEMPERATURE_QUERY, cfg.gpu_tool_timeout()).await {
        Ok(out) => temps.extend(parse_gpu_temperatures(&out)),
        Err(err) => debug!(error = %err, "температуры GPU недоступны"),
    }
    temps
}

fn read_thermal_zones(cfg: &SourcesConfig) -> BTreeMap<String, f64> {
    let Ok(entries) = fs::read_dir(&cfg.thermal_root) else {
        return BTreeMap::new();
    };

    let mut zones: Vec<String> = entries
        .flatten()
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with("thermal_zone"))
        .collect();
    zones.sort();

    let mut out = BTreeMap::new();
    for zone in zones {
        let path = cfg.thermal_root.join(&zone).join("temp");
        let Ok(raw) = fs::read_to_string(&path) else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        match raw.parse::<i64>() {
            Ok(millidegrees) => {
                out.insert(zone, millidegrees as f64 / 1000.0);
            }
            Err(_) => debug!(zone = %zone, value = %raw, "нечисловое значение температуры"),
        }
    }
    out
}

fn parse_gpu_temperatures(output: &str) -> Vec<(String, f64)> {
    output
        .trim()
        .split('\n')
        .enumerate()
        .filter_map(|(i, line)| {
            let v = line.trim().parse::<f64>().ok()?;
            Some((format!("gpu{i}"), v))
        })
        .collect()
}

/// GPU utilisation in percent: vendor tool first, then the embedded GPU load file.
pub async fn collect_gpu_percent(cfg: &SourcesConfig) -> Result<f64, SourceError> {
    match run_tool(&cfg.gpu_tool, &GPU_UTILIZATION_QUERY, cfg.gpu_tool_timeout()).await {
        Ok(out) => match parse_gpu_utilization(&out) {
            Some(v) => return Ok(v),
            None => debug!(output = %out.trim(), "не удалось разобрать загрузку GPU"),
        },
        Err(err) => debug!(error = %err, "загрузка GPU через утилиту недоступна"),
    }

    read_embedded_gpu_load(cfg)
}

fn parse_gpu_utilization(output: &str) -> Option<f64> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.split('\n').next()?.trim().parse::<f64>().ok()
}

/// Embedded GPUs (Jetson) report load in tenths of a percent.
fn read_embedded_gpu_load(cfg: &SourcesConfig) -> Result<f64, SourceError> {
    let path = &cfg.embedded_gpu_load_path;
    let raw = read_file(path)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SourceError::Unavailable("gpu_percent"));
    }
    raw.parse::<f64>()
        .map(|v| v / 10.0)
        .map_err(|_| SourceError::Parse {
            path: path.display().to_string(),
            detail: format!("ожидалось число, получено '{raw}'"),
        })
}
