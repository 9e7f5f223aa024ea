//! `flac-bridge` — a safe callback bridge between libFLAC's stream decoder and Rust handlers.
//!
//! This crate provides:
//! - The three C trampolines libFLAC calls while decoding (error, metadata, write)
//! - Checked, owned views of metadata blocks and borrowed views of decoded frames
//! - A handler trait (plus a closure-based builder) that those trampolines dispatch to
//! - PCM packing and WAV output built on the handler interface
//! - A native driver that owns a libFLAC decoder (`native` feature)
//!
//! libFLAC does the decoding. This crate only moves its callbacks safely into Rust: handler
//! errors and panics never cross back into C, and a handler that aborts decoding is never called
//! again for that session.

// Handler interface (most consumers should start here).
pub mod handler;
pub mod opts;

// Values handed to handlers.
pub mod frame;
pub mod metadata;
pub mod status;

// The C-facing side: raw declarations and the trampolines.
pub mod bridge;
pub mod ffi;

// Handlers that ship with the crate.
pub mod pcm;
pub mod wav;

// Native libFLAC driver.
#[cfg(feature = "native")]
pub mod decoder;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

mod error;

pub use bridge::{
    Callbacks, Registration, Session, error_callback, metadata_callback, write_callback,
};
pub use error::{Error, Result};
pub use frame::{ChannelAssignment, Frame, FrameInfo, FrameNumber};
pub use handler::{CallbackContext, DecodeHandler, DecoderHandle, Handlers, SessionId};
pub use metadata::{
    Metadata, MetadataKind, StreamInfo, VorbisComment, bits_per_sample, channel_count,
    sample_rate, total_samples,
};
pub use opts::{DecoderOpts, PcmOpts};
pub use pcm::{PcmBuffer, PcmLayout};
pub use status::{DecoderState, ErrorStatus, InitStatus, WriteStatus};
pub use wav::WavSink;

#[cfg(feature = "native")]
pub use decoder::{FlacDecoder, PcmDecoder, PcmFormat, version};
