use crate::collectors::command::run_tool;
use crate::collectors::SourceError;
use crate::config::SourcesConfig;
use crate::snapshot::RebootCause;
use std::collections::BTreeMap;

const BOOT_HISTORY_ARGS: [&str; 2] = ["reboot", "-F"];
const MAX_RECENT_BOOTS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BootHistory {
    pub recent_boots: Vec<String>,
    pub reboot_causes: BTreeMap<String, RebootCause>,
}

/// One `last reboot -F` call feeds both the boot list and the last-reboot record.
pub async fn collect_boot_history(cfg: &SourcesConfig) -> Result<BootHistory, SourceError> {
    let out = run_tool(
        &cfg.boot_history_tool,
        &BOOT_HISTORY_ARGS,
        cfg.boot_history_timeout(),
    )
    .await?;
    Ok(parse_boot_history(&out))
}

pub fn parse_boot_history(output: &str) -> BootHistory {
    let reboot_lines: Vec<&str> = output
        .trim()
        .lines()
        .filter(|line| line.starts_with("reboot"))
        .collect();

    let recent_boots = reboot_lines
        .iter()
        .take(MAX_RECENT_BOOTS)
        .map(|line| {
            line.split_whitespace()
                .skip(4)
                .take(5)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    let mut reboot_causes = BTreeMap::new();
    if let Some(line) = reboot_lines.first() {
        reboot_causes.insert("last".to_string(), RebootCause::unknown(line.trim()));
    }

    BootHistory {
        recent_boots,
        reboot_causes,
    }
}
