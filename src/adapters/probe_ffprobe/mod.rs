//! FFprobe adapter for media file probing

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::adapters::process::ToolCommand;
use crate::domain::errors::*;
use crate::ports::*;

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    ffprobe: PathBuf,
    timeout: Duration,
}

impl FFprobeAdapter {
    pub fn new(ffprobe: PathBuf, timeout: Duration) -> Self {
        Self { ffprobe, timeout }
    }
}

/// Parse the single value printed by `-show_entries format=duration`
pub fn parse_duration_output(stdout: &str) -> Result<f64, DomainError> {
    let value = stdout.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    match value.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds),
        _ => Err(DomainError::ToolFailed {
            tool: "ffprobe".to_string(),
            message: format!("unreadable duration: {:?}", value),
        }),
    }
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe_duration(
        &self,
        file_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<f64, DomainError> {
        let output = ToolCommand::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(file_path.to_string_lossy())
            .timeout(self.timeout)
            .execute(cancel)
            .await?;

        parse_duration_output(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_duration() {
        assert_eq!(parse_duration_output("212.091000\n").unwrap(), 212.091);
    }

    #[test]
    fn rejects_missing_duration() {
        assert!(parse_duration_output("N/A\n").is_err());
        assert!(parse_duration_output("").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn probes_through_the_tool() {
        let dir = tempfile::tempdir().unwrap();
        let ffprobe = crate::adapters::test_support::write_script(
            dir.path(),
            "ffprobe",
            "#!/bin/sh\necho 42.5\n",
        );
        let adapter = FFprobeAdapter::new(ffprobe, Duration::from_secs(10));
        let duration = adapter
            .probe_duration(&dir.path().join("x.mp4"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(duration, 42.5);
    }
}
