use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("не удалось запустить {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} не завершился за {timeout_ms} мс")]
    Timeout { program: String, timeout_ms: u128 },
    #[error("{program} завершился с ошибкой: {status}")]
    Failed { program: String, status: ExitStatus },
}

/// Runs an external diagnostic tool and returns its stdout.
///
/// The child is killed when the deadline expires; a timeout, a missing
/// binary and a non-zero exit are all reported as `ToolError`.
pub async fn run_tool(program: &str, args: &[&str], timeout: Duration) -> Result<String, ToolError> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = match time::timeout(timeout, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(ToolError::Spawn {
                program: program.to_string(),
                source,
            })
        }
        Err(_elapsed) => {
            return Err(ToolError::Timeout {
                program: program.to_string(),
                timeout_ms: timeout.as_millis(),
            })
        }
    };

    if !output.status.success() {
        return Err(ToolError::Failed {
            program: program.to_string(),
            status: output.status,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
