//! Audio player state machine.
//!
//! ```text
//! Idle -> Loaded -> Playing <-> Paused -> Ended | Stopped
//! ```
//!
//! Loading a track always stops the previous one and passes through
//! `Idle`. Progress is polled with [`AudioPlayer::tick`].

pub mod transport;

use std::sync::Arc;

use tracing::{debug, info};

use crate::audio::SpeechPlatform;
use crate::domain::{AudioResult, Playable};
use crate::error::{Error, Result};

pub use transport::{
    command_output, ClipOutput, ClipTransport, Clock, DirectTransport, Progress, SystemClock,
    Transport,
};

pub const MIN_RATE: f32 = 0.5;
pub const MAX_RATE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Loaded,
    Playing,
    Paused,
    Ended,
    Stopped,
}

type ProgressCallback = Box<dyn FnMut(Progress) + Send>;

pub struct AudioPlayer {
    state: PlayerState,
    transport: Option<Box<dyn Transport>>,
    volume: f32,
    rate: f32,
    clock: Arc<dyn Clock>,
    platform: Option<Arc<dyn SpeechPlatform>>,
    clip_output: Option<ClipOutput>,
    on_progress: Option<ProgressCallback>,
}

impl Default for AudioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioPlayer {
    pub fn new() -> Self {
        Self {
            state: PlayerState::Idle,
            transport: None,
            volume: 1.0,
            rate: 1.0,
            clock: Arc::new(SystemClock::default()),
            platform: None,
            clip_output: None,
            on_progress: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Speech platform used for direct utterances
    pub fn with_platform(mut self, platform: Arc<dyn SpeechPlatform>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Audible output for clips; without one a clip only advances its timeline
    pub fn with_clip_output(mut self, output: ClipOutput) -> Self {
        self.clip_output = Some(output);
        self
    }

    pub fn on_progress(&mut self, callback: impl FnMut(Progress) + Send + 'static) {
        self.on_progress = Some(Box::new(callback));
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn progress(&self) -> Option<Progress> {
        self.transport.as_ref().and_then(|t| t.progress())
    }

    /// Load an audio result, replacing whatever was loaded
    pub fn load_track(&mut self, result: &AudioResult) -> Result<()> {
        let transport: Box<dyn Transport> = match &result.playable {
            Playable::Clip(clip) => {
                let mut clip = ClipTransport::new(clip.clone(), result.duration, Arc::clone(&self.clock));
                if let Some(output) = &self.clip_output {
                    clip = clip.with_output(Arc::clone(output));
                }
                Box::new(clip)
            }
            Playable::Direct(utterance) => {
                let platform = self.platform.clone().ok_or_else(|| {
                    Error::Player("no speech platform for direct playback".to_string())
                })?;
                Box::new(DirectTransport::new(platform, utterance.clone()))
            }
        };

        debug!(service = %result.service, direct = result.play_directly(), "Loading track");
        self.load_transport(transport)
    }

    /// Load a prepared transport
    pub fn load_transport(&mut self, mut transport: Box<dyn Transport>) -> Result<()> {
        self.unload()?;
        transport.set_volume(self.volume);
        transport.set_rate(self.rate);
        self.transport = Some(transport);
        self.state = PlayerState::Loaded;
        Ok(())
    }

    /// Stop and drop the current track
    pub fn unload(&mut self) -> Result<()> {
        if let Some(mut transport) = self.transport.take() {
            transport.stop()?;
        }
        self.state = PlayerState::Idle;
        Ok(())
    }

    pub fn play(&mut self) -> Result<()> {
        let state = self.state;
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| Error::Player("no track loaded".to_string()))?;

        match state {
            PlayerState::Playing => return Ok(()),
            PlayerState::Ended => {
                transport.stop()?;
            }
            _ => {}
        }

        transport.play()?;
        self.state = PlayerState::Playing;
        info!("Playback started");
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.state != PlayerState::Playing {
            return Ok(());
        }
        if let Some(transport) = self.transport.as_mut() {
            transport.pause()?;
        }
        self.state = PlayerState::Paused;
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<()> {
        match self.state {
            PlayerState::Playing => self.pause(),
            _ => self.play(),
        }
    }

    pub fn stop(&mut self) -> Result<()> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };
        transport.stop()?;
        self.state = PlayerState::Stopped;
        Ok(())
    }

    /// Seek to `position` seconds. Returns false when the track has no timeline.
    pub fn seek(&mut self, position: f64) -> bool {
        self.transport
            .as_mut()
            .map_or(false, |transport| transport.seek(position))
    }

    /// Set volume, clamped to 0..=1
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(transport) = self.transport.as_mut() {
            transport.set_volume(self.volume);
        }
    }

    /// Set playback rate, clamped to 0.5..=2
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate.clamp(MIN_RATE, MAX_RATE);
        if let Some(transport) = self.transport.as_mut() {
            transport.set_rate(self.rate);
        }
    }

    /// Poll the transport: report progress and detect the end of the track.
    pub fn tick(&mut self) -> PlayerState {
        if self.state != PlayerState::Playing {
            return self.state;
        }
        let Some(transport) = self.transport.as_mut() else {
            return self.state;
        };

        let finished = transport.is_finished();
        if let (Some(progress), Some(callback)) = (transport.progress(), self.on_progress.as_mut()) {
            callback(progress);
        }

        if finished {
            self.state = PlayerState::Ended;
            info!("Playback ended");
        }
        self.state
    }
}
