//! Interleaved little-endian PCM packing for decoded FLAC frames.
//!
//! libFLAC hands out one `i32` array per channel. Audio sinks usually want interleaved bytes
//! instead, at a fixed width. [`PcmLayout`] describes that conversion and [`PcmBuffer`] is a
//! [`DecodeHandler`] that applies it to every frame and queues the result for a pull-style
//! reader.
//!
//! Width rules:
//! - the container width is the stream bit depth rounded up to whole bytes
//! - the output width is the container width capped at `PcmOpts::max_output_bit_depth`
//! - when the output is narrower, the least significant bytes are dropped (24-bit samples
//!   packed as 16-bit keep their top two bytes)

use std::collections::VecDeque;

use anyhow::{Context, ensure};

use crate::Result;
use crate::error::Error;
use crate::frame::Frame;
use crate::handler::{CallbackContext, DecodeHandler};
use crate::metadata::{Metadata, StreamInfo};
use crate::opts::PcmOpts;
use crate::status::WriteStatus;

/// The byte layout of packed output for one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmLayout {
    pub channels: u32,
    pub sample_rate: u32,
    pub bits_per_sample: u32,

    /// Bytes per sample as decoded (`ceil(bits_per_sample / 8)`).
    pub container_bytes: usize,

    /// Bytes per sample as emitted.
    pub output_bytes: usize,
}

impl PcmLayout {
    pub fn new(info: &StreamInfo, opts: &PcmOpts) -> Result<Self> {
        opts.validate()?;

        if !(1..=8).contains(&info.channels) {
            return Err(Error::msg(format!(
                "unsupported channel count {}",
                info.channels
            )));
        }
        if !(4..=32).contains(&info.bits_per_sample) {
            return Err(Error::msg(format!(
                "unsupported bit depth {}",
                info.bits_per_sample
            )));
        }

        let container_bytes = info.bits_per_sample.div_ceil(8) as usize;
        let output_bytes = container_bytes.min((opts.max_output_bit_depth / 8) as usize);

        Ok(Self {
            channels: info.channels,
            sample_rate: info.sample_rate,
            bits_per_sample: info.bits_per_sample,
            container_bytes,
            output_bytes,
        })
    }

    /// Output bit depth.
    pub fn output_bits(&self) -> u32 {
        (self.output_bytes * 8) as u32
    }

    /// Bytes per interleaved frame (one sample for every channel).
    pub fn frame_bytes(&self) -> usize {
        self.output_bytes * self.channels as usize
    }

    /// Pack one sample. Narrower outputs keep the most significant bytes.
    pub fn pack_sample(&self, sample: i32, out: &mut impl Extend<u8>) {
        let shift = (self.container_bytes - self.output_bytes) * 8;
        let bytes = (sample >> shift).to_le_bytes();
        out.extend(bytes[..self.output_bytes].iter().copied());
    }

    /// Pack a whole frame in interleaved order.
    pub fn pack_frame(&self, frame: &Frame<'_>, out: &mut impl Extend<u8>) {
        for sample in frame.interleaved() {
            self.pack_sample(sample, out);
        }
    }
}

/// A [`DecodeHandler`] that packs every frame into an in-memory FIFO of interleaved PCM.
///
/// The layout is fixed by the first STREAMINFO block. A frame that arrives before stream info,
/// or whose channel count disagrees with it, aborts decoding.
#[derive(Debug)]
pub struct PcmBuffer {
    opts: PcmOpts,
    stream_info: Option<StreamInfo>,
    layout: Option<PcmLayout>,
    queue: VecDeque<u8>,
}

impl PcmBuffer {
    pub fn new(opts: PcmOpts) -> Result<Self> {
        opts.validate()?;
        Ok(Self {
            opts,
            stream_info: None,
            layout: None,
            queue: VecDeque::new(),
        })
    }

    pub fn stream_info(&self) -> Option<&StreamInfo> {
        self.stream_info.as_ref()
    }

    pub fn layout(&self) -> Option<&PcmLayout> {
        self.layout.as_ref()
    }

    /// Whole interleaved frames ready to be read.
    pub fn frames_available(&self) -> usize {
        match self.layout {
            Some(layout) => self.queue.len() / layout.frame_bytes(),
            None => 0,
        }
    }

    /// Move up to `frames` whole frames into `out`, bounded by what fits. Returns frames read.
    pub fn read_frames(&mut self, frames: usize, out: &mut [u8]) -> usize {
        let Some(layout) = self.layout else {
            return 0;
        };

        let frame_bytes = layout.frame_bytes();
        let n = frames
            .min(self.frames_available())
            .min(out.len() / frame_bytes);
        let bytes = n * frame_bytes;

        for (dst, src) in out[..bytes].iter_mut().zip(self.queue.drain(..bytes)) {
            *dst = src;
        }
        n
    }

    /// Drop everything queued, e.g. after a seek.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl DecodeHandler for PcmBuffer {
    fn on_metadata(&mut self, _ctx: &CallbackContext, metadata: &Metadata) -> anyhow::Result<()> {
        let Metadata::StreamInfo(info) = metadata else {
            return Ok(());
        };

        self.layout = Some(PcmLayout::new(info, &self.opts)?);
        self.stream_info = Some(*info);
        Ok(())
    }

    fn on_write(
        &mut self,
        _ctx: &CallbackContext,
        frame: &Frame<'_>,
    ) -> anyhow::Result<WriteStatus> {
        let layout = self
            .layout
            .context("received a FLAC frame before usable stream info")?;

        ensure!(
            frame.channel_count() == layout.channels as usize,
            "frame has {} channels but the stream declares {}",
            frame.channel_count(),
            layout.channels
        );

        layout.pack_frame(frame, &mut self.queue);
        Ok(WriteStatus::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{ChannelAssignment, FrameInfo, FrameNumber};
    use crate::handler::{DecoderHandle, SessionId};

    fn info(bits_per_sample: u32, channels: u32) -> StreamInfo {
        StreamInfo {
            min_block_size: 4,
            max_block_size: 4,
            min_frame_size: 0,
            max_frame_size: 0,
            sample_rate: 44_100,
            channels,
            bits_per_sample,
            total_samples: 8,
            md5: [0; 16],
        }
    }

    fn frame_info(block_size: u32, channels: u32, bits_per_sample: u32) -> FrameInfo {
        FrameInfo {
            block_size,
            sample_rate: 44_100,
            channels,
            bits_per_sample,
            channel_assignment: ChannelAssignment::Independent,
            number: FrameNumber::Sample(0),
        }
    }

    fn ctx() -> CallbackContext {
        CallbackContext {
            session: SessionId(0),
            decoder: DecoderHandle::from_raw(std::ptr::null()),
        }
    }

    fn pack(layout: &PcmLayout, sample: i32) -> Vec<u8> {
        let mut out = Vec::new();
        layout.pack_sample(sample, &mut out);
        out
    }

    #[test]
    fn sixteen_bit_samples_pack_little_endian() -> anyhow::Result<()> {
        let layout = PcmLayout::new(&info(16, 2), &PcmOpts::default())?;
        assert_eq!(layout.output_bytes, 2);
        assert_eq!(layout.frame_bytes(), 4);
        assert_eq!(pack(&layout, 0x1234), vec![0x34, 0x12]);
        assert_eq!(pack(&layout, -2), vec![0xFE, 0xFF]);
        Ok(())
    }

    #[test]
    fn twenty_four_bit_samples_keep_three_bytes_when_allowed() -> anyhow::Result<()> {
        let opts = PcmOpts {
            max_output_bit_depth: 24,
        };
        let layout = PcmLayout::new(&info(24, 1), &opts)?;
        assert_eq!(layout.output_bits(), 24);
        assert_eq!(pack(&layout, 0x12_3456), vec![0x56, 0x34, 0x12]);
        assert_eq!(pack(&layout, -1), vec![0xFF, 0xFF, 0xFF]);
        Ok(())
    }

    #[test]
    fn twenty_four_bit_samples_truncate_to_sixteen() -> anyhow::Result<()> {
        let layout = PcmLayout::new(&info(24, 1), &PcmOpts::default())?;
        assert_eq!(layout.output_bytes, 2);
        assert_eq!(pack(&layout, 0x12_3456), vec![0x34, 0x12]);
        assert_eq!(pack(&layout, -0x80_0000), vec![0x00, 0x80]);
        Ok(())
    }

    #[test]
    fn shallow_streams_are_never_widened() -> anyhow::Result<()> {
        let opts = PcmOpts {
            max_output_bit_depth: 32,
        };
        let layout = PcmLayout::new(&info(8, 1), &opts)?;
        assert_eq!(layout.output_bytes, 1);
        assert_eq!(pack(&layout, -3), vec![0xFD]);
        Ok(())
    }

    #[test]
    fn rejects_unsupported_stream_formats() {
        assert!(PcmLayout::new(&info(0, 2), &PcmOpts::default()).is_err());
        assert!(PcmLayout::new(&info(16, 0), &PcmOpts::default()).is_err());
        assert!(PcmLayout::new(&info(16, 9), &PcmOpts::default()).is_err());
    }

    #[test]
    fn buffer_queues_whole_frames() -> anyhow::Result<()> {
        let mut buf = PcmBuffer::new(PcmOpts::default())?;
        buf.on_metadata(&ctx(), &Metadata::StreamInfo(info(16, 2)))?;

        let left = [1, 2, 3];
        let right = [-1, -2, -3];
        let frame = Frame::new(frame_info(3, 2, 16), &[&left[..], &right[..]])?;
        assert_eq!(buf.on_write(&ctx(), &frame)?, WriteStatus::Continue);
        assert_eq!(buf.frames_available(), 3);

        let mut out = [0u8; 10];
        // Only two whole frames fit in ten bytes.
        assert_eq!(buf.read_frames(3, &mut out), 2);
        assert_eq!(&out[..8], &[1, 0, 0xFF, 0xFF, 2, 0, 0xFE, 0xFF]);
        assert_eq!(buf.frames_available(), 1);

        buf.clear();
        assert_eq!(buf.frames_available(), 0);
        Ok(())
    }

    #[test]
    fn buffer_rejects_frames_before_stream_info() -> anyhow::Result<()> {
        let mut buf = PcmBuffer::new(PcmOpts::default())?;
        let mono = [0, 0];
        let frame = Frame::new(frame_info(2, 1, 16), &[&mono[..]])?;
        assert!(buf.on_write(&ctx(), &frame).is_err());
        assert_eq!(buf.read_frames(1, &mut [0u8; 4]), 0);
        Ok(())
    }

    #[test]
    fn buffer_rejects_channel_mismatch() -> anyhow::Result<()> {
        let mut buf = PcmBuffer::new(PcmOpts::default())?;
        buf.on_metadata(&ctx(), &Metadata::StreamInfo(info(16, 2)))?;
        let mono = [0, 0];
        let frame = Frame::new(frame_info(2, 1, 16), &[&mono[..]])?;
        let err = buf.on_write(&ctx(), &frame).unwrap_err();
        assert!(err.to_string().contains("stream declares 2"));
        Ok(())
    }
}
