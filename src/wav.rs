use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use anyhow::{Context, ensure};
use hound::{SampleFormat, WavSpec, WavWriter};

use crate::Result;
use crate::error::Error;
use crate::frame::Frame;
use crate::handler::{CallbackContext, DecodeHandler};
use crate::metadata::{Metadata, StreamInfo};
use crate::status::WriteStatus;

/// A [`DecodeHandler`] that writes the decoded stream to a WAV file.
///
/// What we write:
/// - integer PCM at the stream's own bit depth, channel count and sample rate
/// - the WAV header is created when STREAMINFO arrives, so the output is opened lazily
///
/// Callers must call [`WavSink::finalize`] once decoding is done; hound only patches the header
/// lengths at that point.
pub struct WavSink<W: Write + Seek> {
    pending: Option<W>,
    writer: Option<WavWriter<W>>,
    spec: Option<WavSpec>,
    frames_written: u64,
}

impl WavSink<BufWriter<File>> {
    /// Create (or truncate) `path` and write to it.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|err| {
            Error::msg(format!("failed to create WAV file '{}': {err}", path.display()))
        })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Seek> WavSink<W> {
    pub fn new(w: W) -> Self {
        Self {
            pending: Some(w),
            writer: None,
            spec: None,
            frames_written: 0,
        }
    }

    /// The WAV format, once stream info has been seen.
    pub fn spec(&self) -> Option<WavSpec> {
        self.spec
    }

    /// Interleaved frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Flush samples and fix up the header.
    pub fn finalize(self) -> Result<()> {
        let writer = self
            .writer
            .ok_or_else(|| Error::msg("no stream info was decoded; nothing to finalize"))?;
        writer.finalize()?;
        Ok(())
    }

    fn start(&mut self, info: &StreamInfo) -> anyhow::Result<()> {
        let spec = wav_spec(info)?;
        let w = self
            .pending
            .take()
            .context("WAV output was already started")?;

        self.writer = Some(WavWriter::new(w, spec).context("failed to write WAV header")?);
        self.spec = Some(spec);
        Ok(())
    }
}

impl<W: Write + Seek> DecodeHandler for WavSink<W> {
    fn on_metadata(&mut self, _ctx: &CallbackContext, metadata: &Metadata) -> anyhow::Result<()> {
        let Metadata::StreamInfo(info) = metadata else {
            return Ok(());
        };

        // A second STREAMINFO would describe the same stream; keep the first header.
        if self.writer.is_some() {
            tracing::debug!("ignoring repeated STREAMINFO block");
            return Ok(());
        }
        self.start(info)
    }

    fn on_write(
        &mut self,
        _ctx: &CallbackContext,
        frame: &Frame<'_>,
    ) -> anyhow::Result<WriteStatus> {
        let spec = self
            .spec
            .context("received a FLAC frame before stream info")?;
        ensure!(
            frame.channel_count() == spec.channels as usize,
            "frame has {} channels but the WAV header declares {}",
            frame.channel_count(),
            spec.channels
        );

        let writer = self
            .writer
            .as_mut()
            .context("WAV writer is not open")?;
        for sample in frame.interleaved() {
            writer.write_sample(sample)?;
        }

        self.frames_written += frame.sample_count() as u64;
        Ok(WriteStatus::Continue)
    }
}

fn wav_spec(info: &StreamInfo) -> anyhow::Result<WavSpec> {
    let channels = u16::try_from(info.channels).context("channel count does not fit a WAV header")?;
    let bits_per_sample =
        u16::try_from(info.bits_per_sample).context("bit depth does not fit a WAV header")?;
    ensure!(channels > 0, "stream info declares zero channels");
    ensure!(
        (1..=32).contains(&bits_per_sample),
        "unsupported bit depth {bits_per_sample}"
    );

    Ok(WavSpec {
        channels,
        sample_rate: info.sample_rate,
        bits_per_sample,
        sample_format: SampleFormat::Int,
    })
}
