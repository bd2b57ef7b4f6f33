use crate::collectors::SourceError;
use crate::config::SourcesConfig;
use crate::snapshot::{DiskStat, MemoryStat};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

pub(crate) fn read_file(path: &Path) -> Result<String, SourceError> {
    fs::read_to_string(path).map_err(|source| SourceError::Read {
        path: path.display().to_string(),
        source,
    })
}

pub fn read_hostname(cfg: &SourcesConfig) -> Result<String, SourceError> {
    Ok(read_file(&cfg.hostname_path)?.trim().to_string())
}

/// Seconds since boot, unrounded, from the first field of `/proc/uptime`.
pub fn read_uptime(cfg: &SourcesConfig) -> Result<f64, SourceError> {
    let path = cfg.proc_file("uptime");
    let content = read_file(&path)?;
    content
        .split_whitespace()
        .next()
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(|| SourceError::Parse {
            path: path.display().to_string(),
            detail: format!("ожидалось число секунд, получено '{}'", content.trim()),
        })
}

/// `now - uptime` as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn boot_time(now: SystemTime, uptime_seconds: f64) -> String {
    let uptime = Duration::try_from_secs_f64(uptime_seconds).unwrap_or_default();
    let booted = now.checked_sub(uptime).unwrap_or(SystemTime::UNIX_EPOCH);
    humantime::format_rfc3339_seconds(booted).to_string()
}

pub fn read_memory(cfg: &SourcesConfig) -> Result<MemoryStat, SourceError> {
    let content = read_file(&cfg.proc_file("meminfo"))?;
    let info = parse_meminfo(&content);
    let get = |key: &str| info.get(key).copied().unwrap_or(0);
    Ok(MemoryStat::from_kib(
        get("MemTotal"),
        get("MemAvailable"),
        get("SwapTotal"),
        get("SwapFree"),
    ))
}

fn parse_meminfo(content: &str) -> HashMap<String, u64> {
    content
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let key = parts.next()?;
            let value = parts.next()?.parse::<u64>().ok()?;
            Some((key.trim_end_matches(':').to_string(), value))
        })
        .collect()
}

pub fn read_load_avg(cfg: &SourcesConfig) -> Result<[f64; 3], SourceError> {
    let path = cfg.proc_file("loadavg");
    let content = read_file(&path)?;
    parse_load_avg(&content).ok_or_else(|| SourceError::Parse {
        path: path.display().to_string(),
        detail: format!("ожидалось три числа, получено '{}'", content.trim()),
    })
}

fn parse_load_avg(content: &str) -> Option<[f64; 3]> {
    let mut parts = content.split_whitespace().map(|v| v.parse::<f64>().ok());
    Some([parts.next()??, parts.next()??, parts.next()??])
}

#[cfg(unix)]
pub fn read_disk(cfg: &SourcesConfig) -> Result<DiskStat, SourceError> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let path_display = cfg.disk_path.display().to_string();
    let c_path =
        CString::new(cfg.disk_path.as_os_str().as_bytes()).map_err(|_| SourceError::Parse {
            path: path_display.clone(),
            detail: "путь содержит NUL-байт".to_string(),
        })?;

    let mut st = std::mem::MaybeUninit::<libc::statvfs>::uninit();
    // SAFETY: c_path is a valid NUL-terminated string and st points to writable memory.
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), st.as_mut_ptr()) };
    if rc != 0 {
        return Err(SourceError::Read {
            path: path_display,
            source: std::io::Error::last_os_error(),
        });
    }
    // SAFETY: statvfs returned 0, so the struct is initialised.
    let st = unsafe { st.assume_init() };

    Ok(DiskStat::from_blocks(
        st.f_blocks as u64,
        st.f_bfree as u64,
        st.f_frsize as u64,
    ))
}

#[cfg(not(unix))]
pub fn read_disk(_cfg: &SourcesConfig) -> Result<DiskStat, SourceError> {
    Err(SourceError::Unavailable("statvfs"))
}
