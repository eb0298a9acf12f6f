//! The audio mixing pipeline (spec.md §1, listed as out of scope for the
//! URC at its interface). A thin named-channel mixer over `sound-backend`'s
//! device sinks: applications call `Mixer::play`/`set_volume` the same way
//! they'd call into the URC for graphics, but nothing here is consulted by
//! `graphics-backend` — the two subsystems are fully independent, only
//! sharing the `base-io` file-loading facade.

use std::collections::HashMap;
use std::io::Cursor;

use rodio::{Decoder, Sink, Source};
use sound_backend::AudioDevice;

/// One mixed playback channel (e.g. "music", "sfx", "voice"), each with its
/// own independently-settable volume.
pub struct Channel {
    sink: Sink,
}

impl Channel {
    pub fn set_volume(&self, volume: f32) {
        self.sink.set_volume(volume.clamp(0.0, 4.0));
    }

    pub fn pause(&self) {
        self.sink.pause();
    }

    pub fn resume(&self) {
        self.sink.play();
    }
}

/// Owns the audio device and a set of named [`Channel`]s created on demand.
pub struct Mixer {
    device: AudioDevice,
    channels: HashMap<String, Channel>,
}

impl Mixer {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            device: AudioDevice::open_default()?,
            channels: HashMap::new(),
        })
    }

    fn channel(&mut self, name: &str) -> anyhow::Result<&Channel> {
        if !self.channels.contains_key(name) {
            let sink = self.device.new_sink();
            self.channels.insert(name.to_string(), Channel { sink });
        }
        Ok(self.channels.get(name).expect("just inserted"))
    }

    /// Decodes `bytes` (any container `rodio::Decoder` recognizes: WAV,
    /// OGG/Vorbis, MP3) and appends it to `channel`'s queue.
    pub fn play(&mut self, channel: &str, bytes: Vec<u8>) -> anyhow::Result<()> {
        let source = Decoder::new(Cursor::new(bytes))
            .map_err(|err| anyhow::anyhow!("failed to decode audio: {err}"))?;
        let channel = self.channel(channel)?;
        channel.sink.append(source.convert_samples::<f32>());
        Ok(())
    }

    pub fn set_channel_volume(&mut self, channel: &str, volume: f32) -> anyhow::Result<()> {
        self.channel(channel)?.set_volume(volume);
        Ok(())
    }
}
