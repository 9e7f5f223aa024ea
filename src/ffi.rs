//! libFLAC declarations used by the bridge.
//!
//! With the `native` feature everything here comes from `libflac-sys`, which also links the
//! system libFLAC. Without it the crate has no link-time dependency on libFLAC, and `layout`
//! supplies `#[repr(C)]` prefixes of the same structs under the same names so the trampolines can
//! still be driven by a caller that follows libFLAC's callback contract (the integration tests do
//! this with a scripted driver).
//!
//! The bridge only ever reads these structs through pointers handed to it, so code written
//! against one set of definitions works against the other.

use std::ffi::c_void;

#[cfg(feature = "native")]
pub use libflac_sys::{
    FLAC__CHANNEL_ASSIGNMENT_INDEPENDENT, FLAC__CHANNEL_ASSIGNMENT_LEFT_SIDE,
    FLAC__CHANNEL_ASSIGNMENT_MID_SIDE, FLAC__CHANNEL_ASSIGNMENT_RIGHT_SIDE, FLAC__ChannelAssignment,
    FLAC__FRAME_NUMBER_TYPE_FRAME_NUMBER, FLAC__FRAME_NUMBER_TYPE_SAMPLE_NUMBER, FLAC__Frame,
    FLAC__FrameHeader, FLAC__FrameNumberType, FLAC__METADATA_TYPE_APPLICATION,
    FLAC__METADATA_TYPE_CUESHEET, FLAC__METADATA_TYPE_PADDING, FLAC__METADATA_TYPE_PICTURE,
    FLAC__METADATA_TYPE_SEEKTABLE, FLAC__METADATA_TYPE_STREAMINFO,
    FLAC__METADATA_TYPE_VORBIS_COMMENT, FLAC__MetadataType, FLAC__STREAM_DECODER_ABORTED,
    FLAC__STREAM_DECODER_END_OF_STREAM, FLAC__STREAM_DECODER_ERROR_STATUS_BAD_HEADER,
    FLAC__STREAM_DECODER_ERROR_STATUS_FRAME_CRC_MISMATCH,
    FLAC__STREAM_DECODER_ERROR_STATUS_LOST_SYNC,
    FLAC__STREAM_DECODER_ERROR_STATUS_UNPARSEABLE_STREAM,
    FLAC__STREAM_DECODER_INIT_STATUS_ALREADY_INITIALIZED,
    FLAC__STREAM_DECODER_INIT_STATUS_ERROR_OPENING_FILE,
    FLAC__STREAM_DECODER_INIT_STATUS_INVALID_CALLBACKS,
    FLAC__STREAM_DECODER_INIT_STATUS_MEMORY_ALLOCATION_ERROR, FLAC__STREAM_DECODER_INIT_STATUS_OK,
    FLAC__STREAM_DECODER_INIT_STATUS_UNSUPPORTED_CONTAINER,
    FLAC__STREAM_DECODER_MEMORY_ALLOCATION_ERROR, FLAC__STREAM_DECODER_OGG_ERROR,
    FLAC__STREAM_DECODER_READ_FRAME, FLAC__STREAM_DECODER_READ_METADATA,
    FLAC__STREAM_DECODER_SEARCH_FOR_FRAME_SYNC, FLAC__STREAM_DECODER_SEARCH_FOR_METADATA,
    FLAC__STREAM_DECODER_SEEK_ERROR, FLAC__STREAM_DECODER_UNINITIALIZED,
    FLAC__STREAM_DECODER_WRITE_STATUS_ABORT, FLAC__STREAM_DECODER_WRITE_STATUS_CONTINUE,
    FLAC__StreamDecoder, FLAC__StreamDecoderErrorStatus, FLAC__StreamDecoderInitStatus,
    FLAC__StreamDecoderState, FLAC__StreamDecoderWriteStatus, FLAC__StreamMetadata,
    FLAC__StreamMetadata_StreamInfo, FLAC__StreamMetadata_VorbisComment,
    FLAC__StreamMetadata_VorbisComment_Entry, FLAC__bool, FLAC__int32,
};

#[cfg(not(feature = "native"))]
pub mod layout;
#[cfg(not(feature = "native"))]
pub use layout::*;

/// `FLAC__MAX_CHANNELS`
pub const MAX_CHANNELS: usize = 8;

// Error statuses added in libFLAC 1.4; older headers (and so some `libflac-sys` releases) lack
// the named constants.
pub const FLAC__STREAM_DECODER_ERROR_STATUS_BAD_METADATA: FLAC__StreamDecoderErrorStatus = 4;
pub const FLAC__STREAM_DECODER_ERROR_STATUS_OUT_OF_BOUNDS: FLAC__StreamDecoderErrorStatus = 5;
pub const FLAC__STREAM_DECODER_ERROR_STATUS_MISSING_FRAME: FLAC__StreamDecoderErrorStatus = 6;

/// `FLAC__StreamDecoderErrorCallback`, without the `Option` wrapper.
pub type ErrorCallback =
    unsafe extern "C" fn(*const FLAC__StreamDecoder, FLAC__StreamDecoderErrorStatus, *mut c_void);

/// `FLAC__StreamDecoderMetadataCallback`, without the `Option` wrapper.
pub type MetadataCallback =
    unsafe extern "C" fn(*const FLAC__StreamDecoder, *const FLAC__StreamMetadata, *mut c_void);

/// `FLAC__StreamDecoderWriteCallback`, without the `Option` wrapper.
pub type WriteCallback = unsafe extern "C" fn(
    *const FLAC__StreamDecoder,
    *const FLAC__Frame,
    *const *const FLAC__int32,
    *mut c_void,
) -> FLAC__StreamDecoderWriteStatus;
