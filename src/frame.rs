//! Borrowed views over one decoded frame.
//!
//! libFLAC owns the sample buffers and only lends them for the duration of the write callback.
//! [`Frame<'a>`] carries that restriction in its lifetime: the bridge creates it inside the
//! callback, and `'a` ends when the callback returns, so a handler cannot stash the slices.
//!
//! Every channel slice is exactly `block_size` samples long. That is the only bound libFLAC
//! gives us, so we never read past it.

use std::slice;

use anyhow::{Result, ensure};

use crate::ffi::{self, FLAC__ChannelAssignment, FLAC__Frame, FLAC__int32, MAX_CHANNELS};

/// How the channels of a stereo frame were coded. Samples are always delivered decorrelated
/// (left/right), so this is informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelAssignment {
    Independent,
    LeftSide,
    RightSide,
    MidSide,
    Unknown(FLAC__ChannelAssignment),
}

impl ChannelAssignment {
    pub fn from_raw(code: FLAC__ChannelAssignment) -> Self {
        match code {
            ffi::FLAC__CHANNEL_ASSIGNMENT_INDEPENDENT => Self::Independent,
            ffi::FLAC__CHANNEL_ASSIGNMENT_LEFT_SIDE => Self::LeftSide,
            ffi::FLAC__CHANNEL_ASSIGNMENT_RIGHT_SIDE => Self::RightSide,
            ffi::FLAC__CHANNEL_ASSIGNMENT_MID_SIDE => Self::MidSide,
            other => Self::Unknown(other),
        }
    }
}

/// Position of a frame in the stream, as encoded in its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameNumber {
    /// Fixed-blocksize streams count frames.
    Frame(u32),
    /// Variable-blocksize streams count samples. libFLAC also rewrites fixed-blocksize headers
    /// to sample numbers before calling the write callback.
    Sample(u64),
}

/// Owned copy of the frame header fields handlers care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub block_size: u32,
    pub sample_rate: u32,
    pub channels: u32,
    pub bits_per_sample: u32,
    pub channel_assignment: ChannelAssignment,
    pub number: FrameNumber,
}

impl FrameInfo {
    /// # Safety
    /// `raw` must come from libFLAC (or mirror its layout), so the `number` union holds the
    /// variant named by `number_type`.
    pub unsafe fn from_raw(raw: &FLAC__Frame) -> Self {
        let header = &raw.header;
        let number = if header.number_type == ffi::FLAC__FRAME_NUMBER_TYPE_FRAME_NUMBER {
            FrameNumber::Frame(unsafe { header.number.frame_number })
        } else {
            FrameNumber::Sample(unsafe { header.number.sample_number })
        };

        Self {
            block_size: header.blocksize,
            sample_rate: header.sample_rate,
            channels: header.channels,
            bits_per_sample: header.bits_per_sample,
            channel_assignment: ChannelAssignment::from_raw(header.channel_assignment),
            number,
        }
    }
}

/// One decoded frame: per-channel, non-interleaved `i32` samples.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    info: FrameInfo,
    channels: [&'a [i32]; MAX_CHANNELS],
    channel_count: usize,
}

impl<'a> Frame<'a> {
    /// Build a frame from caller-owned channel slices.
    ///
    /// Fails if there are more than eight channels, if the slice count disagrees with
    /// `info.channels`, or if any slice length differs from `info.block_size`.
    pub fn new(info: FrameInfo, channels: &[&'a [i32]]) -> Result<Self> {
        ensure!(
            channels.len() <= MAX_CHANNELS,
            "a FLAC frame has at most {MAX_CHANNELS} channels, got {}",
            channels.len()
        );
        ensure!(
            channels.len() == info.channels as usize,
            "frame header says {} channels but {} buffers were given",
            info.channels,
            channels.len()
        );
        for (idx, chan) in channels.iter().enumerate() {
            ensure!(
                chan.len() == info.block_size as usize,
                "channel {idx} has {} samples, expected {}",
                chan.len(),
                info.block_size
            );
        }

        let mut slots: [&'a [i32]; MAX_CHANNELS] = [&[][..]; MAX_CHANNELS];
        slots[..channels.len()].copy_from_slice(channels);

        Ok(Self {
            info,
            channels: slots,
            channel_count: channels.len(),
        })
    }

    /// Build a view over the native write-callback arguments.
    ///
    /// Returns `None` for null pointers or an impossible channel count.
    ///
    /// # Safety
    /// `frame` and `buffers` must be the pointers libFLAC passed to the write callback, and the
    /// returned frame must not outlive that callback.
    pub unsafe fn from_raw(
        frame: *const FLAC__Frame,
        buffers: *const *const FLAC__int32,
    ) -> Option<Self> {
        let raw = unsafe { frame.as_ref() }?;
        let info = unsafe { FrameInfo::from_raw(raw) };

        let channel_count = info.channels as usize;
        if channel_count > MAX_CHANNELS || (channel_count > 0 && buffers.is_null()) {
            return None;
        }

        let block_size = info.block_size as usize;
        let mut slots: [&'a [i32]; MAX_CHANNELS] = [&[][..]; MAX_CHANNELS];
        for (idx, slot) in slots.iter_mut().take(channel_count).enumerate() {
            let ptr = unsafe { *buffers.add(idx) };
            if block_size == 0 {
                continue;
            }
            if ptr.is_null() {
                return None;
            }
            *slot = unsafe { slice::from_raw_parts(ptr, block_size) };
        }

        Some(Self {
            info,
            channels: slots,
            channel_count,
        })
    }

    pub fn info(&self) -> &FrameInfo {
        &self.info
    }

    /// Samples per channel in this frame.
    pub fn sample_count(&self) -> usize {
        self.info.block_size as usize
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn channel(&self, idx: usize) -> Option<&'a [i32]> {
        self.channels[..self.channel_count].get(idx).copied()
    }

    pub fn channels(&self) -> impl ExactSizeIterator<Item = &'a [i32]> + '_ {
        self.channels[..self.channel_count].iter().copied()
    }

    /// Samples in interleaved order: `L0 R0 L1 R1 ...`.
    pub fn interleaved(&self) -> impl Iterator<Item = i32> + '_ {
        let chans = &self.channels[..self.channel_count];
        (0..self.sample_count()).flat_map(move |i| chans.iter().map(move |c| c[i]))
    }
}
