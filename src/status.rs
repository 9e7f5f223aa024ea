//! Strongly-typed views of libFLAC's status enums.
//!
//! libFLAC reports everything as plain C enums. We translate them at the
//! boundary so handler code can `match` instead of comparing magic numbers. Codes we do not know
//! about are preserved in an `Unknown` variant rather than rejected: newer libFLAC releases add
//! values over time.

use std::fmt;

use crate::ffi::{
    self, FLAC__StreamDecoderErrorStatus, FLAC__StreamDecoderInitStatus, FLAC__StreamDecoderState,
    FLAC__StreamDecoderWriteStatus,
};

/// `FLAC__StreamDecoderErrorStatus`: a recoverable stream error reported through the error
/// callback. The native decoder keeps going after reporting one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    /// The decoder lost synchronization and is searching for the next frame.
    LostSync,
    /// A corrupted frame header was encountered.
    BadHeader,
    /// A frame's data did not match the CRC in its footer.
    FrameCrcMismatch,
    /// Reserved fields are in use; the stream cannot be parsed by this decoder.
    UnparseableStream,
    /// A corrupted metadata block was encountered.
    BadMetadata,
    /// Decoded samples exceeded the range of the stated bit depth.
    OutOfBounds,
    /// A frame was missing; the decoder inserted silence.
    MissingFrame,
    /// A code this crate does not know about.
    Unknown(FLAC__StreamDecoderErrorStatus),
}

impl ErrorStatus {
    pub fn from_raw(code: FLAC__StreamDecoderErrorStatus) -> Self {
        match code {
            ffi::FLAC__STREAM_DECODER_ERROR_STATUS_LOST_SYNC => Self::LostSync,
            ffi::FLAC__STREAM_DECODER_ERROR_STATUS_BAD_HEADER => Self::BadHeader,
            ffi::FLAC__STREAM_DECODER_ERROR_STATUS_FRAME_CRC_MISMATCH => Self::FrameCrcMismatch,
            ffi::FLAC__STREAM_DECODER_ERROR_STATUS_UNPARSEABLE_STREAM => Self::UnparseableStream,
            ffi::FLAC__STREAM_DECODER_ERROR_STATUS_BAD_METADATA => Self::BadMetadata,
            ffi::FLAC__STREAM_DECODER_ERROR_STATUS_OUT_OF_BOUNDS => Self::OutOfBounds,
            ffi::FLAC__STREAM_DECODER_ERROR_STATUS_MISSING_FRAME => Self::MissingFrame,
            other => Self::Unknown(other),
        }
    }

    pub fn as_raw(self) -> FLAC__StreamDecoderErrorStatus {
        match self {
            Self::LostSync => ffi::FLAC__STREAM_DECODER_ERROR_STATUS_LOST_SYNC,
            Self::BadHeader => ffi::FLAC__STREAM_DECODER_ERROR_STATUS_BAD_HEADER,
            Self::FrameCrcMismatch => ffi::FLAC__STREAM_DECODER_ERROR_STATUS_FRAME_CRC_MISMATCH,
            Self::UnparseableStream => ffi::FLAC__STREAM_DECODER_ERROR_STATUS_UNPARSEABLE_STREAM,
            Self::BadMetadata => ffi::FLAC__STREAM_DECODER_ERROR_STATUS_BAD_METADATA,
            Self::OutOfBounds => ffi::FLAC__STREAM_DECODER_ERROR_STATUS_OUT_OF_BOUNDS,
            Self::MissingFrame => ffi::FLAC__STREAM_DECODER_ERROR_STATUS_MISSING_FRAME,
            Self::Unknown(code) => code,
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LostSync => f.write_str("lost sync"),
            Self::BadHeader => f.write_str("bad frame header"),
            Self::FrameCrcMismatch => f.write_str("frame CRC mismatch"),
            Self::UnparseableStream => f.write_str("unparseable stream"),
            Self::BadMetadata => f.write_str("bad metadata block"),
            Self::OutOfBounds => f.write_str("sample out of bounds"),
            Self::MissingFrame => f.write_str("missing frame"),
            Self::Unknown(code) => write!(f, "unknown decoder error status {code}"),
        }
    }
}

/// What a write handler wants the native decoder to do next.
///
/// This maps 1:1 onto `FLAC__StreamDecoderWriteStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteStatus {
    Continue,
    Abort,
}

impl WriteStatus {
    pub fn as_raw(self) -> FLAC__StreamDecoderWriteStatus {
        match self {
            Self::Continue => ffi::FLAC__STREAM_DECODER_WRITE_STATUS_CONTINUE,
            Self::Abort => ffi::FLAC__STREAM_DECODER_WRITE_STATUS_ABORT,
        }
    }

    /// Anything other than CONTINUE is treated as ABORT.
    pub fn from_raw(code: FLAC__StreamDecoderWriteStatus) -> Self {
        if code == ffi::FLAC__STREAM_DECODER_WRITE_STATUS_CONTINUE {
            Self::Continue
        } else {
            Self::Abort
        }
    }
}

/// `FLAC__StreamDecoderState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderState {
    SearchForMetadata,
    ReadMetadata,
    SearchForFrameSync,
    ReadFrame,
    EndOfStream,
    OggError,
    SeekError,
    Aborted,
    MemoryAllocationError,
    Uninitialized,
    Unknown(FLAC__StreamDecoderState),
}

impl DecoderState {
    pub fn from_raw(code: FLAC__StreamDecoderState) -> Self {
        match code {
            ffi::FLAC__STREAM_DECODER_SEARCH_FOR_METADATA => Self::SearchForMetadata,
            ffi::FLAC__STREAM_DECODER_READ_METADATA => Self::ReadMetadata,
            ffi::FLAC__STREAM_DECODER_SEARCH_FOR_FRAME_SYNC => Self::SearchForFrameSync,
            ffi::FLAC__STREAM_DECODER_READ_FRAME => Self::ReadFrame,
            ffi::FLAC__STREAM_DECODER_END_OF_STREAM => Self::EndOfStream,
            ffi::FLAC__STREAM_DECODER_OGG_ERROR => Self::OggError,
            ffi::FLAC__STREAM_DECODER_SEEK_ERROR => Self::SeekError,
            ffi::FLAC__STREAM_DECODER_ABORTED => Self::Aborted,
            ffi::FLAC__STREAM_DECODER_MEMORY_ALLOCATION_ERROR => Self::MemoryAllocationError,
            ffi::FLAC__STREAM_DECODER_UNINITIALIZED => Self::Uninitialized,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for DecoderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SearchForMetadata => f.write_str("searching for metadata"),
            Self::ReadMetadata => f.write_str("reading metadata"),
            Self::SearchForFrameSync => f.write_str("searching for frame sync"),
            Self::ReadFrame => f.write_str("reading frame"),
            Self::EndOfStream => f.write_str("end of stream"),
            Self::OggError => f.write_str("ogg layer error"),
            Self::SeekError => f.write_str("seek error"),
            Self::Aborted => f.write_str("aborted by a callback"),
            Self::MemoryAllocationError => f.write_str("memory allocation error"),
            Self::Uninitialized => f.write_str("uninitialized"),
            Self::Unknown(code) => write!(f, "unknown decoder state {code}"),
        }
    }
}

/// `FLAC__StreamDecoderInitStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitStatus {
    Ok,
    UnsupportedContainer,
    InvalidCallbacks,
    MemoryAllocationError,
    ErrorOpeningFile,
    AlreadyInitialized,
    Unknown(FLAC__StreamDecoderInitStatus),
}

impl InitStatus {
    pub fn from_raw(code: FLAC__StreamDecoderInitStatus) -> Self {
        match code {
            ffi::FLAC__STREAM_DECODER_INIT_STATUS_OK => Self::Ok,
            ffi::FLAC__STREAM_DECODER_INIT_STATUS_UNSUPPORTED_CONTAINER => {
                Self::UnsupportedContainer
            }
            ffi::FLAC__STREAM_DECODER_INIT_STATUS_INVALID_CALLBACKS => Self::InvalidCallbacks,
            ffi::FLAC__STREAM_DECODER_INIT_STATUS_MEMORY_ALLOCATION_ERROR => {
                Self::MemoryAllocationError
            }
            ffi::FLAC__STREAM_DECODER_INIT_STATUS_ERROR_OPENING_FILE => Self::ErrorOpeningFile,
            ffi::FLAC__STREAM_DECODER_INIT_STATUS_ALREADY_INITIALIZED => Self::AlreadyInitialized,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for InitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::UnsupportedContainer => {
                f.write_str("the library was not compiled with support for the container")
            }
            Self::InvalidCallbacks => f.write_str("a required callback was not supplied"),
            Self::MemoryAllocationError => f.write_str("memory allocation failed"),
            Self::ErrorOpeningFile => f.write_str("the file could not be opened"),
            Self::AlreadyInitialized => f.write_str("the decoder is already initialized"),
            Self::Unknown(code) => write!(f, "unknown init status {code}"),
        }
    }
}
