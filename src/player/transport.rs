//! Playback transports.
//!
//! A clip has a timeline that the player can seek and report progress
//! on. A direct utterance is handed to the speech platform and has
//! neither.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::audio::{ProcessJob, SpeechJob, SpeechPlatform};
use crate::domain::{AudioClip, Utterance};
use crate::error::{Error, Result};

/// Playback position report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Seconds from the start
    pub position: f64,
    /// Total seconds
    pub duration: f64,
}

/// Trait for playback transports
pub trait Transport: Send {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;

    /// Jump to `position` seconds. Returns false when not seekable.
    fn seek(&mut self, position: f64) -> bool;

    fn set_volume(&mut self, volume: f32);
    fn set_rate(&mut self, rate: f32);

    /// Current position, or None when the transport has no timeline
    fn progress(&self) -> Option<Progress>;

    fn is_finished(&mut self) -> bool;
}

/// Monotonic time source for clip timelines
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Starts audible output for a clip at a start offset in seconds
pub type ClipOutput = Arc<dyn Fn(&AudioClip, f64) -> Result<Box<dyn SpeechJob>> + Send + Sync>;

/// Clip output through an external player command.
///
/// The clip is written under `dir`; `{file}` and `{start}` in `args` are
/// replaced with its path and the start offset.
pub fn command_output(program: String, args: Vec<String>, dir: PathBuf) -> ClipOutput {
    Arc::new(move |clip: &AudioClip, start: f64| -> Result<Box<dyn SpeechJob>> {
        std::fs::create_dir_all(&dir)?;
        let file = dir.join(format!("current.{}", clip.extension()));
        std::fs::write(&file, clip.data.as_slice())?;

        let file = file.display().to_string();
        let start = format!("{:.2}", start);
        let args: Vec<String> = args
            .iter()
            .map(|a| a.replace("{file}", &file).replace("{start}", &start))
            .collect();

        let job = ProcessJob::spawn(&program, &args)
            .map_err(|e| Error::Player(format!("failed to start {}: {}", program, e)))?;
        Ok(Box::new(job))
    })
}

/// Clock-driven timeline over an audio clip
pub struct ClipTransport {
    clip: AudioClip,
    duration: f64,
    clock: Arc<dyn Clock>,
    /// Position at the last anchor
    offset: f64,
    /// Clock reading when playback (re)started; None unless playing
    anchor: Option<Duration>,
    rate: f32,
    volume: f32,
    output: Option<ClipOutput>,
    job: Option<Box<dyn SpeechJob>>,
}

impl ClipTransport {
    pub fn new(clip: AudioClip, duration: f64, clock: Arc<dyn Clock>) -> Self {
        Self {
            clip,
            duration: duration.max(0.0),
            clock,
            offset: 0.0,
            anchor: None,
            rate: 1.0,
            volume: 1.0,
            output: None,
            job: None,
        }
    }

    pub fn with_output(mut self, output: ClipOutput) -> Self {
        self.output = Some(output);
        self
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    fn position(&self) -> f64 {
        let elapsed = match self.anchor {
            Some(anchor) => self.clock.now().saturating_sub(anchor).as_secs_f64() * self.rate as f64,
            None => 0.0,
        };
        (self.offset + elapsed).min(self.duration)
    }

    /// Fold elapsed time into the offset and restart the anchor
    fn reanchor(&mut self) {
        self.offset = self.position();
        if self.anchor.is_some() {
            self.anchor = Some(self.clock.now());
        }
    }

    fn start_output(&mut self) -> Result<()> {
        if let Some(output) = &self.output {
            self.job = Some(output(&self.clip, self.offset)?);
        }
        Ok(())
    }

    fn stop_output(&mut self) {
        if let Some(mut job) = self.job.take() {
            let _ = job.cancel();
        }
    }
}

impl Transport for ClipTransport {
    fn play(&mut self) -> Result<()> {
        if self.anchor.is_some() {
            return Ok(());
        }
        match self.job.as_mut() {
            Some(job) => job.resume()?,
            None => self.start_output()?,
        }
        self.anchor = Some(self.clock.now());
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if self.anchor.is_none() {
            return Ok(());
        }
        self.offset = self.position();
        self.anchor = None;
        if let Some(job) = self.job.as_mut() {
            job.pause()?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stop_output();
        self.offset = 0.0;
        self.anchor = None;
        Ok(())
    }

    fn seek(&mut self, position: f64) -> bool {
        self.offset = position.clamp(0.0, self.duration);
        let playing = self.anchor.is_some();
        if playing {
            self.anchor = Some(self.clock.now());
        }
        if self.job.is_some() {
            self.stop_output();
            if playing && self.start_output().is_err() {
                return false;
            }
        }
        true
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn set_rate(&mut self, rate: f32) {
        self.reanchor();
        self.rate = rate;
    }

    fn progress(&self) -> Option<Progress> {
        Some(Progress {
            position: self.position(),
            duration: self.duration,
        })
    }

    fn is_finished(&mut self) -> bool {
        if self.anchor.is_none() {
            return false;
        }
        self.position() >= self.duration || self.job.as_mut().is_some_and(|job| job.is_finished())
    }
}

impl Drop for ClipTransport {
    fn drop(&mut self) {
        self.stop_output();
    }
}

/// Utterance spoken by the platform, with no timeline
pub struct DirectTransport {
    platform: Arc<dyn SpeechPlatform>,
    utterance: Utterance,
    job: Option<Box<dyn SpeechJob>>,
    paused: bool,
}

impl DirectTransport {
    pub fn new(platform: Arc<dyn SpeechPlatform>, utterance: Utterance) -> Self {
        Self {
            platform,
            utterance,
            job: None,
            paused: false,
        }
    }

    pub fn utterance(&self) -> &Utterance {
        &self.utterance
    }
}

impl Transport for DirectTransport {
    fn play(&mut self) -> Result<()> {
        match self.job.as_mut() {
            Some(job) if self.paused => job.resume()?,
            Some(_) => {}
            None => self.job = Some(self.platform.speak(&self.utterance)?),
        }
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if let Some(job) = self.job.as_mut() {
            job.pause()?;
            self.paused = true;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(mut job) = self.job.take() {
            job.cancel()?;
        }
        self.paused = false;
        Ok(())
    }

    fn seek(&mut self, _position: f64) -> bool {
        false
    }

    // Prosody changes apply to the next utterance start
    fn set_volume(&mut self, volume: f32) {
        self.utterance.volume = volume;
    }

    fn set_rate(&mut self, rate: f32) {
        self.utterance.rate = rate;
    }

    fn progress(&self) -> Option<Progress> {
        None
    }

    fn is_finished(&mut self) -> bool {
        match self.job.as_mut() {
            Some(job) if !self.paused => job.is_finished(),
            _ => false,
        }
    }
}

impl Drop for DirectTransport {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
