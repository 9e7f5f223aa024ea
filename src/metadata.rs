//! Stream metadata: raw field accessors and the checked, owned view handed to handlers.
//!
//! libFLAC describes metadata blocks as a tagged union (`FLAC__StreamMetadata`). Reading a
//! stream-info field off a record of another kind is undefined behavior, so we offer two layers:
//! - `channel_count` / `bits_per_sample` / `sample_rate` / `total_samples`: unchecked accessors
//!   for callers that already matched on the kind tag
//! - [`Metadata`]: an owned enum built by checking the tag first, which is what the bridge
//!   dispatches to handlers
//!
//! Everything in [`Metadata`] is copied out of native memory, so it can outlive the callback.

use std::slice;
use std::time::Duration;

use serde::Serialize;

use crate::ffi::{
    self, FLAC__MetadataType, FLAC__StreamMetadata, FLAC__StreamMetadata_VorbisComment_Entry,
};

/// Channel count of a stream-info record.
///
/// # Safety
/// `record.type_` must be `FLAC__METADATA_TYPE_STREAMINFO`.
pub unsafe fn channel_count(record: &FLAC__StreamMetadata) -> u32 {
    unsafe { record.data.stream_info.channels }
}

/// Bit depth of a stream-info record.
///
/// # Safety
/// `record.type_` must be `FLAC__METADATA_TYPE_STREAMINFO`.
pub unsafe fn bits_per_sample(record: &FLAC__StreamMetadata) -> u32 {
    unsafe { record.data.stream_info.bits_per_sample }
}

/// Sample rate (Hz) of a stream-info record.
///
/// # Safety
/// `record.type_` must be `FLAC__METADATA_TYPE_STREAMINFO`.
pub unsafe fn sample_rate(record: &FLAC__StreamMetadata) -> u32 {
    unsafe { record.data.stream_info.sample_rate }
}

/// Total samples per channel of a stream-info record. `0` means "unknown".
///
/// # Safety
/// `record.type_` must be `FLAC__METADATA_TYPE_STREAMINFO`.
pub unsafe fn total_samples(record: &FLAC__StreamMetadata) -> u64 {
    unsafe { record.data.stream_info.total_samples }
}

/// The kind tag of a metadata block (`FLAC__MetadataType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataKind {
    StreamInfo,
    Padding,
    Application,
    SeekTable,
    VorbisComment,
    CueSheet,
    Picture,
    Unknown(FLAC__MetadataType),
}

impl MetadataKind {
    pub fn from_raw(code: FLAC__MetadataType) -> Self {
        match code {
            ffi::FLAC__METADATA_TYPE_STREAMINFO => Self::StreamInfo,
            ffi::FLAC__METADATA_TYPE_PADDING => Self::Padding,
            ffi::FLAC__METADATA_TYPE_APPLICATION => Self::Application,
            ffi::FLAC__METADATA_TYPE_SEEKTABLE => Self::SeekTable,
            ffi::FLAC__METADATA_TYPE_VORBIS_COMMENT => Self::VorbisComment,
            ffi::FLAC__METADATA_TYPE_CUESHEET => Self::CueSheet,
            ffi::FLAC__METADATA_TYPE_PICTURE => Self::Picture,
            other => Self::Unknown(other),
        }
    }

    pub fn as_raw(self) -> FLAC__MetadataType {
        match self {
            Self::StreamInfo => ffi::FLAC__METADATA_TYPE_STREAMINFO,
            Self::Padding => ffi::FLAC__METADATA_TYPE_PADDING,
            Self::Application => ffi::FLAC__METADATA_TYPE_APPLICATION,
            Self::SeekTable => ffi::FLAC__METADATA_TYPE_SEEKTABLE,
            Self::VorbisComment => ffi::FLAC__METADATA_TYPE_VORBIS_COMMENT,
            Self::CueSheet => ffi::FLAC__METADATA_TYPE_CUESHEET,
            Self::Picture => ffi::FLAC__METADATA_TYPE_PICTURE,
            Self::Unknown(code) => code,
        }
    }
}

/// The STREAMINFO block: the format of the decoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamInfo {
    pub min_block_size: u32,
    pub max_block_size: u32,
    pub min_frame_size: u32,
    pub max_frame_size: u32,
    pub sample_rate: u32,
    pub channels: u32,
    pub bits_per_sample: u32,

    /// Samples per channel; `0` when the encoder did not know the length up front.
    pub total_samples: u64,

    /// MD5 of the unencoded audio; all zeroes when not set.
    #[serde(skip)]
    pub md5: [u8; 16],
}

impl StreamInfo {
    /// Copy the stream info out of a record, or `None` if the record is of another kind.
    ///
    /// # Safety
    /// `record` must be a well-formed metadata record: its `data` union must hold the variant
    /// named by `type_`.
    pub unsafe fn from_record(record: &FLAC__StreamMetadata) -> Option<Self> {
        if record.type_ != ffi::FLAC__METADATA_TYPE_STREAMINFO {
            return None;
        }

        let raw = unsafe { record.data.stream_info };
        Some(Self {
            min_block_size: raw.min_blocksize,
            max_block_size: raw.max_blocksize,
            min_frame_size: raw.min_framesize,
            max_frame_size: raw.max_framesize,
            sample_rate: raw.sample_rate,
            channels: raw.channels,
            bits_per_sample: raw.bits_per_sample,
            total_samples: raw.total_samples,
            md5: raw.md5sum,
        })
    }

    /// Stream length, when both the total sample count and the sample rate are known.
    pub fn duration(&self) -> Option<Duration> {
        if self.total_samples == 0 || self.sample_rate == 0 {
            return None;
        }
        let rate = u64::from(self.sample_rate);
        let secs = self.total_samples / rate;
        let rem = self.total_samples % rate;
        Some(Duration::from_secs(secs) + Duration::from_nanos(rem * 1_000_000_000 / rate))
    }
}

/// The VORBIS_COMMENT block: vendor string plus `NAME=value` tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VorbisComment {
    pub vendor: String,
    pub tags: Vec<(String, String)>,
}

impl VorbisComment {
    /// # Safety
    /// Same contract as [`StreamInfo::from_record`]; additionally every entry pointer must be
    /// valid for `length` bytes.
    pub unsafe fn from_record(record: &FLAC__StreamMetadata) -> Option<Self> {
        if record.type_ != ffi::FLAC__METADATA_TYPE_VORBIS_COMMENT {
            return None;
        }

        let raw = unsafe { record.data.vorbis_comment };
        let vendor = unsafe { entry_to_string(&raw.vendor_string) };

        let entries: &[FLAC__StreamMetadata_VorbisComment_Entry] =
            if raw.comments.is_null() || raw.num_comments == 0 {
                &[]
            } else {
                unsafe { slice::from_raw_parts(raw.comments, raw.num_comments as usize) }
            };

        let mut tags = Vec::with_capacity(entries.len());
        for entry in entries {
            let comment = unsafe { entry_to_string(entry) };
            match comment.split_once('=') {
                Some((name, value)) => tags.push((name.to_string(), value.to_string())),
                None => tracing::debug!(comment = %comment, "skipping vorbis comment without '='"),
            }
        }

        Some(Self { vendor, tags })
    }

    /// Look up the first tag with the given name. Tag names are case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An owned, checked copy of one metadata block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadata {
    StreamInfo(StreamInfo),
    VorbisComment(VorbisComment),

    /// A block kind we do not copy out. Only the tag is reported.
    Other(MetadataKind),
}

impl Metadata {
    /// Copy a native record into an owned value, dispatching on its kind tag.
    ///
    /// # Safety
    /// `record` must be a well-formed metadata record as delivered by libFLAC.
    pub unsafe fn from_raw(record: &FLAC__StreamMetadata) -> Self {
        let kind = MetadataKind::from_raw(record.type_);
        match kind {
            MetadataKind::StreamInfo => unsafe { StreamInfo::from_record(record) }
                .map_or(Self::Other(kind), Self::StreamInfo),
            MetadataKind::VorbisComment => unsafe { VorbisComment::from_record(record) }
                .map_or(Self::Other(kind), Self::VorbisComment),
            other => Self::Other(other),
        }
    }

    pub fn kind(&self) -> MetadataKind {
        match self {
            Self::StreamInfo(_) => MetadataKind::StreamInfo,
            Self::VorbisComment(_) => MetadataKind::VorbisComment,
            Self::Other(kind) => *kind,
        }
    }

    pub fn stream_info(&self) -> Option<&StreamInfo> {
        match self {
            Self::StreamInfo(info) => Some(info),
            _ => None,
        }
    }
}

/// Vorbis comment entries are length-prefixed UTF-8; some encoders pad them with NULs.
unsafe fn entry_to_string(entry: &FLAC__StreamMetadata_VorbisComment_Entry) -> String {
    if entry.entry.is_null() || entry.length == 0 {
        return String::new();
    }
    let bytes = unsafe { slice::from_raw_parts(entry.entry, entry.length as usize) };
    String::from_utf8_lossy(bytes).replace('\0', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::{FLAC__StreamMetadata_StreamInfo, FLAC__StreamMetadata_VorbisComment};

    fn stream_info_record(total_samples: u64) -> FLAC__StreamMetadata {
        // All-zero is a valid bit pattern for every field of the record.
        let mut record: FLAC__StreamMetadata = unsafe { std::mem::zeroed() };
        record.type_ = ffi::FLAC__METADATA_TYPE_STREAMINFO;
        record.length = 34;
        record.data.stream_info = FLAC__StreamMetadata_StreamInfo {
            min_blocksize: 4096,
            max_blocksize: 4096,
            min_framesize: 14,
            max_framesize: 12_000,
            sample_rate: 44_100,
            channels: 2,
            bits_per_sample: 24,
            total_samples,
            md5sum: [7; 16],
        };
        record
    }

    #[test]
    fn accessors_read_back_hand_built_record() {
        let record = stream_info_record(1_234_567);
        unsafe {
            assert_eq!(channel_count(&record), 2);
            assert_eq!(bits_per_sample(&record), 24);
            assert_eq!(sample_rate(&record), 44_100);
            assert_eq!(total_samples(&record), 1_234_567);
        }
    }

    #[test]
    fn checked_view_matches_accessors() {
        let record = stream_info_record(88_200);
        let metadata = unsafe { Metadata::from_raw(&record) };
        let info = metadata.stream_info().expect("stream info");
        assert_eq!(info.channels, 2);
        assert_eq!(info.md5, [7; 16]);
        assert_eq!(info.duration(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn unknown_length_has_no_duration() {
        let record = stream_info_record(0);
        let info = unsafe { StreamInfo::from_record(&record) }.expect("stream info");
        assert_eq!(info.duration(), None);
    }

    #[test]
    fn other_kinds_are_reported_by_tag_only() {
        let mut record = stream_info_record(0);
        record.type_ = ffi::FLAC__METADATA_TYPE_PICTURE;
        assert_eq!(unsafe { StreamInfo::from_record(&record) }, None);
        assert_eq!(
            unsafe { Metadata::from_raw(&record) },
            Metadata::Other(MetadataKind::Picture)
        );

        record.type_ = 99;
        assert_eq!(
            unsafe { Metadata::from_raw(&record) }.kind(),
            MetadataKind::Unknown(99)
        );
    }

    #[test]
    fn vorbis_comments_are_split_on_first_equals() {
        let mut vendor = b"reference libFLAC 1.4.3".to_vec();
        let mut title = b"TITLE=a=b".to_vec();
        let mut artist = b"artist=Someone\0".to_vec();
        let mut junk = b"no separator".to_vec();

        let mut entries = [
            FLAC__StreamMetadata_VorbisComment_Entry {
                length: title.len() as u32,
                entry: title.as_mut_ptr(),
            },
            FLAC__StreamMetadata_VorbisComment_Entry {
                length: artist.len() as u32,
                entry: artist.as_mut_ptr(),
            },
            FLAC__StreamMetadata_VorbisComment_Entry {
                length: junk.len() as u32,
                entry: junk.as_mut_ptr(),
            },
        ];

        let mut record: FLAC__StreamMetadata = unsafe { std::mem::zeroed() };
        record.type_ = ffi::FLAC__METADATA_TYPE_VORBIS_COMMENT;
        record.is_last = 1;
        record.data.vorbis_comment = FLAC__StreamMetadata_VorbisComment {
            vendor_string: FLAC__StreamMetadata_VorbisComment_Entry {
                length: vendor.len() as u32,
                entry: vendor.as_mut_ptr(),
            },
            num_comments: entries.len() as u32,
            comments: entries.as_mut_ptr(),
        };

        let Metadata::VorbisComment(comment) = (unsafe { Metadata::from_raw(&record) }) else {
            panic!("expected a vorbis comment");
        };

        assert_eq!(comment.vendor, "reference libFLAC 1.4.3");
        assert_eq!(comment.tags.len(), 2);
        assert_eq!(comment.get("title"), Some("a=b"));
        assert_eq!(comment.get("ARTIST"), Some("Someone"));
        assert_eq!(comment.get("album"), None);
    }
}
