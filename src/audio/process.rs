//! Playback through a child process.

use std::process::{Child, Command, Stdio};

use tracing::debug;

use super::local::SpeechJob;
use crate::error::{Error, Result};

/// A child process that plays audio.
///
/// Pause and resume send SIGSTOP and SIGCONT.
pub struct ProcessJob {
    child: Child,
}

impl ProcessJob {
    /// Spawn `program` with `args`, discarding its output
    pub fn spawn(program: &str, args: &[String]) -> std::io::Result<Self> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        debug!(program, pid = child.id(), "Playback process started");
        Ok(Self { child })
    }

    fn signal(&self, signal: &str) -> Result<()> {
        let status = Command::new("kill")
            .args([signal, &self.child.id().to_string()])
            .status()
            .map_err(|e| Error::Player(format!("failed to signal playback process: {}", e)))?;

        if !status.success() {
            return Err(Error::Player(format!("kill {} failed", signal)));
        }
        Ok(())
    }
}

impl SpeechJob for ProcessJob {
    fn pause(&mut self) -> Result<()> {
        self.signal("-STOP")
    }

    fn resume(&mut self) -> Result<()> {
        self.signal("-CONT")
    }

    fn cancel(&mut self) -> Result<()> {
        if self.is_finished() {
            return Ok(());
        }
        // A stopped process ignores SIGKILL until continued on some platforms
        let _ = self.signal("-CONT");
        self.child
            .kill()
            .map_err(|e| Error::Player(format!("failed to stop playback: {}", e)))?;
        let _ = self.child.wait();
        Ok(())
    }

    fn is_finished(&mut self) -> bool {
        !matches!(self.child.try_wait(), Ok(None))
    }
}

impl Drop for ProcessJob {
    fn drop(&mut self) {
        let _ = self.cancel();
    }
}
