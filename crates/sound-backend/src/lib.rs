//! The audio pipeline's device half (spec.md §1: audio is out of scope for
//! the URC, "specified only at their interface"). Opens the default output
//! device via `rodio` and exposes one mixer sink per logical channel; the
//! URC never touches this crate, `sound` sits between it and applications.

use rodio::{OutputStream, OutputStreamBuilder, Sink};

/// Owns the platform audio stream. Must stay alive for as long as any
/// [`Sink`] created from it plays; dropping it silences every sink.
pub struct AudioDevice {
    stream: OutputStream,
}

impl AudioDevice {
    pub fn open_default() -> anyhow::Result<Self> {
        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|err| anyhow::anyhow!("failed to open default audio device: {err}"))?;
        Ok(Self { stream })
    }

    /// A new, independently-pausable/volume-controlled playback sink
    /// (spec.md's audio pipeline is a mixing pipeline; each sink is one
    /// mixed voice).
    pub fn new_sink(&self) -> Sink {
        Sink::connect_new(self.stream.mixer())
    }
}
