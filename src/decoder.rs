// src/decoder.rs

//! Drive a native libFLAC stream decoder through the callback bridge.
//!
//! This module is the only place that calls into libFLAC itself:
//! - [`FlacDecoder`] owns a `FLAC__StreamDecoder` and the [`Registration`] whose session address
//!   is the decoder's `client_data`
//! - [`PcmDecoder`] layers a pull-style "give me N frames of packed PCM" API on top, using a
//!   [`PcmBuffer`] as the session's handler
//!
//! Decoding itself is entirely libFLAC's job. We only set it up, step it, and report its state.
//!
//! Requires the `native` feature (links libFLAC through `libflac-sys`).

use std::ffi::{CStr, CString};
use std::io::SeekFrom;
use std::path::Path;
use std::ptr::NonNull;

use libflac_sys as sys;

use crate::Result;
use crate::bridge::{Registration, Session};
use crate::error::Error;
use crate::ffi::{FLAC__StreamDecoder, FLAC__bool};
use crate::handler::DecodeHandler;
use crate::metadata::{MetadataKind, StreamInfo};
use crate::opts::{DecoderOpts, PcmOpts};
use crate::pcm::{PcmBuffer, PcmLayout};
use crate::status::{DecoderState, InitStatus};

/// The libFLAC version string, e.g. `"1.4.3"`.
pub fn version() -> String {
    let ptr = unsafe { sys::FLAC__VERSION_STRING };
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// A native decoder bound to one handler type.
///
/// The session is held by a [`Registration`], so its address (the `client_data` token) stays
/// put while libFLAC runs callbacks, even if the `FlacDecoder` itself moves.
pub struct FlacDecoder<H: DecodeHandler> {
    raw: NonNull<FLAC__StreamDecoder>,
    registration: Option<Registration<H>>,
    opts: DecoderOpts,
}

// The native decoder is only ever touched through `&mut self`, one thread at a time.
unsafe impl<H: DecodeHandler + Send> Send for FlacDecoder<H> {}

impl<H: DecodeHandler> FlacDecoder<H> {
    pub fn new(opts: DecoderOpts) -> Result<Self> {
        let raw = NonNull::new(unsafe { sys::FLAC__stream_decoder_new() })
            .ok_or_else(|| Error::msg("FLAC__stream_decoder_new returned null"))?;

        Ok(Self {
            raw,
            registration: None,
            opts,
        })
    }

    /// Open a FLAC file and decode its metadata blocks.
    ///
    /// Stream info (and, if enabled, vorbis comments) reach `handler` before this returns.
    /// A previously opened stream is finished first and its handler dropped.
    pub fn open(&mut self, path: impl AsRef<Path>, handler: H) -> Result<()> {
        if self.registration.is_some() {
            self.close()?;
        }

        let path = path.as_ref();
        let filename = path_to_cstring(path)?;
        self.configure()?;

        let callbacks = Session::<H>::callbacks();
        let registration = Registration::new(Session::new(handler));
        let client_data = registration.client_data();
        let session_id = registration.session().id();
        // Store before init so the session outlives every callback libFLAC might make.
        self.registration = Some(registration);

        let status = unsafe {
            sys::FLAC__stream_decoder_init_file(
                self.raw.as_ptr(),
                filename.as_ptr(),
                Some(callbacks.write),
                Some(callbacks.metadata),
                Some(callbacks.error),
                client_data,
            )
        };

        let status = InitStatus::from_raw(status);
        if status != InitStatus::Ok {
            self.registration = None;
            return Err(Error::Init(status));
        }

        tracing::debug!(session = session_id.0, path = %path.display(), "opened FLAC stream");

        self.check("process_until_end_of_metadata", unsafe {
            sys::FLAC__stream_decoder_process_until_end_of_metadata(self.raw.as_ptr())
        })
    }

    /// Decode one metadata block or frame.
    ///
    /// Returns `false` once the end of the stream has been reached.
    pub fn process_single(&mut self) -> Result<bool> {
        self.ensure_open()?;
        let ok = unsafe { sys::FLAC__stream_decoder_process_single(self.raw.as_ptr()) };
        self.check("process_single", ok)?;
        Ok(self.state() != DecoderState::EndOfStream)
    }

    /// Decode everything that is left.
    pub fn process_until_end_of_stream(&mut self) -> Result<()> {
        self.ensure_open()?;
        let ok =
            unsafe { sys::FLAC__stream_decoder_process_until_end_of_stream(self.raw.as_ptr()) };
        self.check("process_until_end_of_stream", ok)
    }

    /// Seek so the next frame handed to the write handler starts at `sample`.
    ///
    /// libFLAC decodes the target frame as part of the seek, so the write handler runs before
    /// this returns. libFLAC also stops verifying the MD5 signature after a seek.
    pub fn seek_absolute(&mut self, sample: u64) -> Result<()> {
        self.ensure_open()?;
        if let Some(registration) = self.registration.as_mut() {
            registration.session_mut().reset();
        }
        let ok = unsafe { sys::FLAC__stream_decoder_seek_absolute(self.raw.as_ptr(), sample) };
        self.check("seek_absolute", ok)
    }

    pub fn state(&self) -> DecoderState {
        DecoderState::from_raw(unsafe { sys::FLAC__stream_decoder_get_state(self.raw.as_ptr()) })
    }

    /// libFLAC's own description of the current state.
    pub fn resolved_state(&self) -> String {
        let ptr =
            unsafe { sys::FLAC__stream_decoder_get_resolved_state_string(self.raw.as_ptr()) };
        if ptr.is_null() {
            return self.state().to_string();
        }
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }

    pub fn handler(&self) -> Option<&H> {
        self.session().map(Session::handler)
    }

    pub fn handler_mut(&mut self) -> Option<&mut H> {
        self.registration
            .as_mut()
            .map(|registration| registration.session_mut().handler_mut())
    }

    pub fn session(&self) -> Option<&Session<H>> {
        self.registration.as_ref().map(Registration::session)
    }

    /// Finish the current stream and hand back its handler.
    ///
    /// With MD5 checking enabled, a checksum mismatch on a stream decoded to its end is
    /// reported as an error here (the handler is dropped in that case). A stream closed early
    /// has nothing to verify.
    pub fn close(&mut self) -> Result<Option<H>> {
        let Some(registration) = self.registration.take() else {
            return Ok(None);
        };

        let reached_end = self.state() == DecoderState::EndOfStream;
        let md5_ok = unsafe { sys::FLAC__stream_decoder_finish(self.raw.as_ptr()) } != 0;
        // libFLAC is done with `client_data` once `finish` returns.
        let session = registration.into_session();
        tracing::debug!(session = session.id().0, reached_end, "closed FLAC stream");

        if !md5_ok && self.opts.md5_checking {
            if reached_end {
                return Err(Error::msg(
                    "decoded audio does not match the stream's MD5 signature",
                ));
            }
            tracing::debug!(
                session = session.id().0,
                "stream closed before its end; MD5 signature not verified"
            );
        }
        Ok(Some(session.into_handler()))
    }

    fn configure(&mut self) -> Result<()> {
        let raw = self.raw.as_ptr();
        let md5 = FLAC__bool::from(self.opts.md5_checking);
        if unsafe { sys::FLAC__stream_decoder_set_md5_checking(raw, md5) } == 0 {
            return Err(self.failure("set_md5_checking"));
        }

        if self.opts.vorbis_comments {
            let kind = MetadataKind::VorbisComment.as_raw();
            if unsafe { sys::FLAC__stream_decoder_set_metadata_respond(raw, kind) } == 0 {
                return Err(self.failure("set_metadata_respond"));
            }
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.registration.is_none() {
            return Err(Error::msg("no FLAC stream is open"));
        }
        Ok(())
    }

    fn check(&self, op: &'static str, ok: FLAC__bool) -> Result<()> {
        if ok == 0 {
            return Err(self.failure(op));
        }
        Ok(())
    }

    fn failure(&self, op: &'static str) -> Error {
        Error::Decoder {
            op,
            state: self.state(),
        }
    }
}

impl<H: DecodeHandler> Drop for FlacDecoder<H> {
    fn drop(&mut self) {
        unsafe {
            // `delete` finishes an initialized decoder itself, which may still call back into
            // the session, so the registration must outlive this call.
            sys::FLAC__stream_decoder_delete(self.raw.as_ptr());
        }
        self.registration = None;
    }
}

/// Stream format as seen by a [`PcmDecoder`] consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u32,
    pub bits_per_sample: u32,
    pub output_bytes_per_sample: usize,
}

impl From<&PcmLayout> for PcmFormat {
    fn from(layout: &PcmLayout) -> Self {
        Self {
            sample_rate: layout.sample_rate,
            channels: layout.channels,
            bits_per_sample: layout.bits_per_sample,
            output_bytes_per_sample: layout.output_bytes,
        }
    }
}

/// Pull-style decoding into interleaved little-endian PCM bytes.
pub struct PcmDecoder {
    inner: FlacDecoder<PcmBuffer>,
    pcm_opts: PcmOpts,
    current_sample: u64,
}

impl PcmDecoder {
    pub fn new(opts: DecoderOpts, pcm_opts: PcmOpts) -> Result<Self> {
        pcm_opts.validate()?;
        Ok(Self {
            inner: FlacDecoder::new(opts)?,
            pcm_opts,
            current_sample: 0,
        })
    }

    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let buffer = PcmBuffer::new(self.pcm_opts.clone())?;
        self.current_sample = 0;
        self.inner.open(path, buffer)?;

        if self.format().is_none() {
            return Err(Error::msg("FLAC stream has no usable STREAMINFO block"));
        }
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.current_sample = 0;
        self.inner.close()?;
        Ok(())
    }

    pub fn format(&self) -> Option<PcmFormat> {
        self.inner.handler()?.layout().map(PcmFormat::from)
    }

    pub fn stream_info(&self) -> Option<&StreamInfo> {
        self.inner.handler()?.stream_info()
    }

    /// Samples per channel in the stream; `0` when unknown.
    pub fn total_samples(&self) -> u64 {
        self.stream_info().map_or(0, |info| info.total_samples)
    }

    /// Position of the next frame `decode_samples` will return.
    pub fn tell(&self) -> u64 {
        self.current_sample
    }

    /// Fill `out` with up to `frames` interleaved frames. Returns the number of frames written;
    /// `0` means the stream is exhausted.
    ///
    /// We keep stepping the native decoder until enough frames are buffered or the stream ends,
    /// so a short read only happens at end of stream or when `out` is too small.
    pub fn decode_samples(&mut self, frames: usize, out: &mut [u8]) -> Result<usize> {
        loop {
            let state = self.inner.state();
            let buffer = self
                .inner
                .handler_mut()
                .ok_or_else(|| Error::msg("no FLAC stream is open"))?;

            if state == DecoderState::EndOfStream || buffer.frames_available() >= frames {
                let read = buffer.read_frames(frames, out);
                self.current_sample += read as u64;
                return Ok(read);
            }

            self.inner.process_single()?;
        }
    }

    /// Seek to an absolute or relative sample position. `SeekFrom::End` counts back from
    /// `total_samples`, which must be known.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Start(sample) => Some(sample),
            SeekFrom::Current(delta) => self.current_sample.checked_add_signed(delta),
            SeekFrom::End(delta) => match self.total_samples() {
                0 => {
                    return Err(Error::msg(
                        "cannot seek from the end of a stream of unknown length",
                    ));
                }
                total => total.checked_add_signed(delta),
            },
        }
        .ok_or_else(|| Error::msg("seek position out of range"))?;

        if let Some(buffer) = self.inner.handler_mut() {
            buffer.clear();
        }
        self.inner.seek_absolute(target)?;
        self.current_sample = target;
        Ok(target)
    }
}

#[cfg(unix)]
fn path_to_cstring(path: &Path) -> Result<CString> {
    use std::os::unix::ffi::OsStrExt;

    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| Error::msg(format!("path contains a NUL byte: '{}'", path.display())))
}

#[cfg(not(unix))]
fn path_to_cstring(path: &Path) -> Result<CString> {
    let s = path
        .to_str()
        .ok_or_else(|| Error::msg(format!("path is not valid UTF-8: '{}'", path.display())))?;
    CString::new(s).map_err(|_| Error::msg(format!("path contains a NUL byte: '{s}'")))
}
