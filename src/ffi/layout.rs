//! `#[repr(C)]` layouts of the libFLAC types the bridge reads, for builds without `native`.
//!
//! Names, field names and field order follow `FLAC/format.h` and `FLAC/stream_decoder.h`, as
//! `libflac-sys` exposes them. Only the leading fields the bridge touches are declared: libFLAC
//! always hands these out by pointer, so a prefix is enough to read them. The metadata union
//! declares only the STREAMINFO and VORBIS_COMMENT arms.
#![allow(non_camel_case_types, non_upper_case_globals)]

use std::ffi::{c_int, c_uint};

pub type FLAC__bool = c_int;
pub type FLAC__int32 = i32;

pub type FLAC__MetadataType = c_uint;
pub type FLAC__ChannelAssignment = c_uint;
pub type FLAC__FrameNumberType = c_uint;
pub type FLAC__StreamDecoderErrorStatus = c_uint;
pub type FLAC__StreamDecoderWriteStatus = c_uint;
pub type FLAC__StreamDecoderState = c_uint;
pub type FLAC__StreamDecoderInitStatus = c_uint;

pub const FLAC__METADATA_TYPE_STREAMINFO: FLAC__MetadataType = 0;
pub const FLAC__METADATA_TYPE_PADDING: FLAC__MetadataType = 1;
pub const FLAC__METADATA_TYPE_APPLICATION: FLAC__MetadataType = 2;
pub const FLAC__METADATA_TYPE_SEEKTABLE: FLAC__MetadataType = 3;
pub const FLAC__METADATA_TYPE_VORBIS_COMMENT: FLAC__MetadataType = 4;
pub const FLAC__METADATA_TYPE_CUESHEET: FLAC__MetadataType = 5;
pub const FLAC__METADATA_TYPE_PICTURE: FLAC__MetadataType = 6;

pub const FLAC__CHANNEL_ASSIGNMENT_INDEPENDENT: FLAC__ChannelAssignment = 0;
pub const FLAC__CHANNEL_ASSIGNMENT_LEFT_SIDE: FLAC__ChannelAssignment = 1;
pub const FLAC__CHANNEL_ASSIGNMENT_RIGHT_SIDE: FLAC__ChannelAssignment = 2;
pub const FLAC__CHANNEL_ASSIGNMENT_MID_SIDE: FLAC__ChannelAssignment = 3;

pub const FLAC__FRAME_NUMBER_TYPE_FRAME_NUMBER: FLAC__FrameNumberType = 0;
pub const FLAC__FRAME_NUMBER_TYPE_SAMPLE_NUMBER: FLAC__FrameNumberType = 1;

pub const FLAC__STREAM_DECODER_ERROR_STATUS_LOST_SYNC: FLAC__StreamDecoderErrorStatus = 0;
pub const FLAC__STREAM_DECODER_ERROR_STATUS_BAD_HEADER: FLAC__StreamDecoderErrorStatus = 1;
pub const FLAC__STREAM_DECODER_ERROR_STATUS_FRAME_CRC_MISMATCH: FLAC__StreamDecoderErrorStatus = 2;
pub const FLAC__STREAM_DECODER_ERROR_STATUS_UNPARSEABLE_STREAM: FLAC__StreamDecoderErrorStatus = 3;

pub const FLAC__STREAM_DECODER_WRITE_STATUS_CONTINUE: FLAC__StreamDecoderWriteStatus = 0;
pub const FLAC__STREAM_DECODER_WRITE_STATUS_ABORT: FLAC__StreamDecoderWriteStatus = 1;

pub const FLAC__STREAM_DECODER_SEARCH_FOR_METADATA: FLAC__StreamDecoderState = 0;
pub const FLAC__STREAM_DECODER_READ_METADATA: FLAC__StreamDecoderState = 1;
pub const FLAC__STREAM_DECODER_SEARCH_FOR_FRAME_SYNC: FLAC__StreamDecoderState = 2;
pub const FLAC__STREAM_DECODER_READ_FRAME: FLAC__StreamDecoderState = 3;
pub const FLAC__STREAM_DECODER_END_OF_STREAM: FLAC__StreamDecoderState = 4;
pub const FLAC__STREAM_DECODER_OGG_ERROR: FLAC__StreamDecoderState = 5;
pub const FLAC__STREAM_DECODER_SEEK_ERROR: FLAC__StreamDecoderState = 6;
pub const FLAC__STREAM_DECODER_ABORTED: FLAC__StreamDecoderState = 7;
pub const FLAC__STREAM_DECODER_MEMORY_ALLOCATION_ERROR: FLAC__StreamDecoderState = 8;
pub const FLAC__STREAM_DECODER_UNINITIALIZED: FLAC__StreamDecoderState = 9;

pub const FLAC__STREAM_DECODER_INIT_STATUS_OK: FLAC__StreamDecoderInitStatus = 0;
pub const FLAC__STREAM_DECODER_INIT_STATUS_UNSUPPORTED_CONTAINER: FLAC__StreamDecoderInitStatus =
    1;
pub const FLAC__STREAM_DECODER_INIT_STATUS_INVALID_CALLBACKS: FLAC__StreamDecoderInitStatus = 2;
pub const FLAC__STREAM_DECODER_INIT_STATUS_MEMORY_ALLOCATION_ERROR:
    FLAC__StreamDecoderInitStatus = 3;
pub const FLAC__STREAM_DECODER_INIT_STATUS_ERROR_OPENING_FILE: FLAC__StreamDecoderInitStatus = 4;
pub const FLAC__STREAM_DECODER_INIT_STATUS_ALREADY_INITIALIZED: FLAC__StreamDecoderInitStatus = 5;

/// Opaque `FLAC__StreamDecoder`.
#[repr(C)]
pub struct FLAC__StreamDecoder {
    _private: [u8; 0],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FLAC__StreamMetadata_StreamInfo {
    pub min_blocksize: c_uint,
    pub max_blocksize: c_uint,
    pub min_framesize: c_uint,
    pub max_framesize: c_uint,
    pub sample_rate: c_uint,
    pub channels: c_uint,
    pub bits_per_sample: c_uint,
    pub total_samples: u64,
    pub md5sum: [u8; 16],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FLAC__StreamMetadata_VorbisComment_Entry {
    pub length: u32,
    pub entry: *mut u8,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FLAC__StreamMetadata_VorbisComment {
    pub vendor_string: FLAC__StreamMetadata_VorbisComment_Entry,
    pub num_comments: u32,
    pub comments: *mut FLAC__StreamMetadata_VorbisComment_Entry,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union FLAC__StreamMetadata__bindgen_ty_1 {
    pub stream_info: FLAC__StreamMetadata_StreamInfo,
    pub vorbis_comment: FLAC__StreamMetadata_VorbisComment,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct FLAC__StreamMetadata {
    pub type_: FLAC__MetadataType,
    pub is_last: FLAC__bool,
    pub length: c_uint,
    pub data: FLAC__StreamMetadata__bindgen_ty_1,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union FLAC__FrameHeader__bindgen_ty_1 {
    pub frame_number: u32,
    pub sample_number: u64,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct FLAC__FrameHeader {
    pub blocksize: c_uint,
    pub sample_rate: c_uint,
    pub channels: c_uint,
    pub channel_assignment: FLAC__ChannelAssignment,
    pub bits_per_sample: c_uint,
    pub number_type: FLAC__FrameNumberType,
    pub number: FLAC__FrameHeader__bindgen_ty_1,
    pub crc: u8,
}

/// `FLAC__Frame` up to its header; the subframes and footer follow in native memory.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FLAC__Frame {
    pub header: FLAC__FrameHeader,
}
