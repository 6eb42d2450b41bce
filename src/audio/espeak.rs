//! espeak-ng speech platform.
//!
//! Drives the `espeak-ng` CLI as a subprocess: `--voices` lists voices,
//! `--stdout` captures a WAV clip, and a plain invocation speaks to the
//! default output device.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::local::{SpeechJob, SpeechPlatform, VoiceInfo};
use super::process::ProcessJob;
use crate::domain::{AudioClip, Gender, Utterance};
use crate::error::{Error, Result};

pub const DEFAULT_BINARY: &str = "espeak-ng";

/// espeak-ng default speed in words per minute
const BASE_WPM: f32 = 175.0;

const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(60);

/// espeak-ng platform using subprocess mode
pub struct EspeakPlatform {
    binary_path: String,
    capture_timeout: Duration,
}

impl Default for EspeakPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl EspeakPlatform {
    pub fn new() -> Self {
        Self::with_binary_path(DEFAULT_BINARY)
    }

    pub fn with_binary_path(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            capture_timeout: DEFAULT_CAPTURE_TIMEOUT,
        }
    }

    pub fn with_capture_timeout(mut self, capture_timeout: Duration) -> Self {
        self.capture_timeout = capture_timeout;
        self
    }

    fn spawn_error(&self, e: std::io::Error) -> Error {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::Unsupported(format!(
                "{} not found; install espeak-ng for local speech",
                self.binary_path
            ))
        } else {
            Error::Unsupported(format!("failed to run {}: {}", self.binary_path, e))
        }
    }
}

/// Prosody flags for an utterance
pub fn prosody_args(utterance: &Utterance) -> Vec<String> {
    let wpm = (BASE_WPM * utterance.rate).round().clamp(80.0, 450.0) as u32;
    let pitch = (50.0 * utterance.pitch).round().clamp(0.0, 99.0) as u32;
    let amplitude = (100.0 * utterance.volume).round().clamp(0.0, 200.0) as u32;

    let mut args = vec![
        "-s".to_string(),
        wpm.to_string(),
        "-p".to_string(),
        pitch.to_string(),
        "-a".to_string(),
        amplitude.to_string(),
    ];
    if let Some(voice) = &utterance.voice {
        args.push("-v".to_string());
        args.push(voice.clone());
    }
    args
}

/// Parse the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File          Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US     (en 3)
/// ```
pub fn parse_voices(output: &str) -> Vec<VoiceInfo> {
    output
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("Pty"))
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return None;
            }
            let gender = match fields[2].rsplit('/').next() {
                Some("M") => Some(Gender::Male),
                Some("F") => Some(Gender::Female),
                _ => None,
            };
            Some(VoiceInfo {
                name: fields[3].to_string(),
                lang: fields[1].to_string(),
                gender,
            })
        })
        .collect()
}

#[async_trait]
impl SpeechPlatform for EspeakPlatform {
    fn name(&self) -> &str {
        "espeak-ng"
    }

    async fn voices(&self) -> Result<Vec<VoiceInfo>> {
        let output = Command::new(&self.binary_path)
            .arg("--voices")
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Unsupported(format!(
                "{} --voices failed: {}",
                self.binary_path,
                stderr.trim()
            )));
        }

        Ok(parse_voices(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn capture(&self, utterance: &Utterance) -> Result<Option<AudioClip>> {
        let mut child = Command::new(&self.binary_path)
            .args(prosody_args(utterance))
            .args(["--stdout", "--stdin"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(utterance.text.as_bytes()).await?;
            // Drop stdin to signal EOF
        }

        let output = timeout(self.capture_timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                Error::Unsupported(format!(
                    "speech capture timed out after {:?}",
                    self.capture_timeout
                ))
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Unsupported(format!(
                "{} exited with {}: {}",
                self.binary_path,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        if output.stdout.is_empty() {
            return Ok(None);
        }

        debug!(bytes = output.stdout.len(), "Captured WAV");
        Ok(Some(AudioClip::new(output.stdout, "audio/wav")))
    }

    fn speak(&self, utterance: &Utterance) -> Result<Box<dyn SpeechJob>> {
        let mut args = prosody_args(utterance);
        args.push("--".to_string());
        args.push(utterance.text.clone());

        let job = ProcessJob::spawn(&self.binary_path, &args).map_err(|e| self.spawn_error(e))?;
        Ok(Box::new(job))
    }
}
