//! The caller-facing side of the bridge.
//!
//! Application code implements [`DecodeHandler`] (or builds a [`Handlers`] from closures). The
//! bridge invokes it from libFLAC's callbacks with owned or lifetime-bounded values only, plus a
//! [`CallbackContext`] identifying which registration and which native decoder the call is for.
//!
//! Handler errors never reach libFLAC: the bridge logs them and, for writes, answers ABORT.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;

use crate::ffi::FLAC__StreamDecoder;
use crate::frame::Frame;
use crate::metadata::{Metadata, StreamInfo};
use crate::status::{ErrorStatus, WriteStatus};

/// Identifies one registered session. Allocated by the bridge unless the caller picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl SessionId {
    /// A process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Non-owning reference to the native decoder that raised a callback.
///
/// It can be compared and logged but never dereferenced from safe code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecoderHandle(*const FLAC__StreamDecoder);

// Only the address is ever read, so handles can be collected and compared across threads.
unsafe impl Send for DecoderHandle {}
unsafe impl Sync for DecoderHandle {}

impl DecoderHandle {
    pub fn from_raw(ptr: *const FLAC__StreamDecoder) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(self) -> *const FLAC__StreamDecoder {
        self.0
    }

    pub fn addr(self) -> usize {
        self.0 as usize
    }
}

/// Passed to every handler call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackContext {
    pub session: SessionId,
    pub decoder: DecoderHandle,
}

/// Receives decoder events for one session.
///
/// All three methods run on whatever thread is driving the decoder, one at a time. They must
/// return promptly: libFLAC blocks its decode loop on each call.
pub trait DecodeHandler {
    /// A recoverable stream error. libFLAC keeps decoding after reporting it.
    fn on_error(&mut self, ctx: &CallbackContext, status: ErrorStatus) -> Result<()> {
        tracing::debug!(session = ctx.session.0, %status, "unhandled FLAC stream error");
        Ok(())
    }

    /// A metadata block. Stream info always arrives before the first frame.
    fn on_metadata(&mut self, _ctx: &CallbackContext, _metadata: &Metadata) -> Result<()> {
        Ok(())
    }

    /// One decoded frame. Returning `Ok(WriteStatus::Abort)` or an error stops decoding.
    fn on_write(&mut self, ctx: &CallbackContext, frame: &Frame<'_>) -> Result<WriteStatus>;
}

type ErrorFn<'a> = Box<dyn FnMut(ErrorStatus, &CallbackContext) -> Result<()> + Send + 'a>;
type StreamInfoFn<'a> = Box<dyn FnMut(&StreamInfo, &CallbackContext) -> Result<()> + Send + 'a>;
type MetadataFn<'a> = Box<dyn FnMut(&Metadata, &CallbackContext) -> Result<()> + Send + 'a>;
type WriteFn<'a> =
    Box<dyn FnMut(&Frame<'_>, &CallbackContext) -> Result<WriteStatus> + Send + 'a>;

/// A [`DecodeHandler`] assembled from independent closures.
///
/// Only the write handler is required; missing error and metadata handlers are no-ops.
///
/// ```
/// use flac_bridge::{Handlers, WriteStatus};
///
/// let mut frames = 0usize;
/// let handlers = Handlers::new(|_frame, _ctx| {
///     frames += 1;
///     Ok(WriteStatus::Continue)
/// })
/// .with_stream_info(|info, _ctx| {
///     println!("{} Hz, {} channels", info.sample_rate, info.channels);
///     Ok(())
/// });
/// # drop(handlers);
/// ```
pub struct Handlers<'a> {
    error: Option<ErrorFn<'a>>,
    stream_info: Option<StreamInfoFn<'a>>,
    metadata: Option<MetadataFn<'a>>,
    write: WriteFn<'a>,
}

impl<'a> Handlers<'a> {
    pub fn new<W>(write: W) -> Self
    where
        W: FnMut(&Frame<'_>, &CallbackContext) -> Result<WriteStatus> + Send + 'a,
    {
        Self {
            error: None,
            stream_info: None,
            metadata: None,
            write: Box::new(write),
        }
    }

    pub fn with_error<F>(mut self, f: F) -> Self
    where
        F: FnMut(ErrorStatus, &CallbackContext) -> Result<()> + Send + 'a,
    {
        self.error = Some(Box::new(f));
        self
    }

    /// Called for STREAMINFO blocks only.
    pub fn with_stream_info<F>(mut self, f: F) -> Self
    where
        F: FnMut(&StreamInfo, &CallbackContext) -> Result<()> + Send + 'a,
    {
        self.stream_info = Some(Box::new(f));
        self
    }

    /// Called for every metadata block, after the stream-info handler if both apply.
    pub fn with_metadata<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Metadata, &CallbackContext) -> Result<()> + Send + 'a,
    {
        self.metadata = Some(Box::new(f));
        self
    }
}

impl DecodeHandler for Handlers<'_> {
    fn on_error(&mut self, ctx: &CallbackContext, status: ErrorStatus) -> Result<()> {
        match self.error.as_mut() {
            Some(f) => f(status, ctx),
            None => Ok(()),
        }
    }

    fn on_metadata(&mut self, ctx: &CallbackContext, metadata: &Metadata) -> Result<()> {
        if let (Some(f), Metadata::StreamInfo(info)) = (self.stream_info.as_mut(), metadata) {
            f(info, ctx)?;
        }
        match self.metadata.as_mut() {
            Some(f) => f(metadata, ctx),
            None => Ok(()),
        }
    }

    fn on_write(&mut self, ctx: &CallbackContext, frame: &Frame<'_>) -> Result<WriteStatus> {
        (self.write)(frame, ctx)
    }
}

impl<H: DecodeHandler + ?Sized> DecodeHandler for Box<H> {
    fn on_error(&mut self, ctx: &CallbackContext, status: ErrorStatus) -> Result<()> {
        (**self).on_error(ctx, status)
    }

    fn on_metadata(&mut self, ctx: &CallbackContext, metadata: &Metadata) -> Result<()> {
        (**self).on_metadata(ctx, metadata)
    }

    fn on_write(&mut self, ctx: &CallbackContext, frame: &Frame<'_>) -> Result<WriteStatus> {
        (**self).on_write(ctx, frame)
    }
}
