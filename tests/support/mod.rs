#![allow(dead_code)]

//! A scripted stand-in for libFLAC's decode loop.
//!
//! It calls the bridge's trampolines the way the native decoder does: hand-built records and
//! frames, a stable decoder address, and the session pointer as `client_data`. Like libFLAC it
//! stops delivering frames once a write callback answers ABORT.

use std::ffi::c_uint;

use flac_bridge::DecodeHandler;
use flac_bridge::Session;
use flac_bridge::ffi::{
    self, FLAC__Frame, FLAC__MetadataType, FLAC__StreamDecoder, FLAC__StreamDecoderErrorStatus,
    FLAC__StreamDecoderWriteStatus, FLAC__StreamMetadata, FLAC__StreamMetadata_StreamInfo,
};

#[derive(Clone)]
pub enum Step {
    Error(FLAC__StreamDecoderErrorStatus),
    StreamInfo(FLAC__StreamMetadata_StreamInfo),
    /// A metadata block of another kind; only its tag is meaningful.
    Metadata(FLAC__MetadataType),
    /// One frame, as per-channel sample vectors of equal length.
    Frame(Vec<Vec<i32>>),
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// Raw write statuses in delivery order.
    pub write_statuses: Vec<FLAC__StreamDecoderWriteStatus>,
    /// Whether the run stopped on an ABORT.
    pub aborted: bool,
}

pub struct FakeDriver {
    // Boxed so the address handed out as the decoder pointer is stable and unique.
    handle: Box<u64>,
    steps: Vec<Step>,
}

impl FakeDriver {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            handle: Box::new(0),
            steps,
        }
    }

    pub fn decoder_ptr(&self) -> *const FLAC__StreamDecoder {
        (&*self.handle as *const u64).cast()
    }

    pub fn decoder_addr(&self) -> usize {
        self.decoder_ptr() as usize
    }

    pub fn run<H: DecodeHandler>(&self, session: &mut Session<H>) -> RunReport {
        let callbacks = Session::<H>::callbacks();
        let client_data = session.as_client_data();
        let decoder = self.decoder_ptr();
        let mut report = RunReport::default();
        let mut next_sample = 0u64;

        for step in &self.steps {
            match step {
                Step::Error(code) => unsafe { (callbacks.error)(decoder, *code, client_data) },
                Step::StreamInfo(info) => {
                    let record = stream_info_record(*info);
                    unsafe { (callbacks.metadata)(decoder, &record, client_data) };
                }
                Step::Metadata(kind) => {
                    let mut record = stream_info_record(stream_info(0, 0, 0, 0));
                    record.type_ = *kind;
                    unsafe { (callbacks.metadata)(decoder, &record, client_data) };
                }
                Step::Frame(channels) => {
                    let block_size = channels.first().map_or(0, Vec::len);
                    let raw = frame_header(channels.len(), block_size, next_sample);
                    let buffers: Vec<*const i32> = channels.iter().map(|c| c.as_ptr()).collect();

                    let status =
                        unsafe { (callbacks.write)(decoder, &raw, buffers.as_ptr(), client_data) };
                    report.write_statuses.push(status);
                    next_sample += block_size as u64;

                    if status == ffi::FLAC__STREAM_DECODER_WRITE_STATUS_ABORT {
                        report.aborted = true;
                        break;
                    }
                }
            }
        }
        report
    }
}

pub fn stream_info(
    channels: u32,
    bits_per_sample: u32,
    sample_rate: u32,
    total_samples: u64,
) -> FLAC__StreamMetadata_StreamInfo {
    FLAC__StreamMetadata_StreamInfo {
        min_blocksize: 16,
        max_blocksize: 4096,
        min_framesize: 0,
        max_framesize: 0,
        sample_rate,
        channels,
        bits_per_sample,
        total_samples,
        md5sum: [0; 16],
    }
}

pub fn stream_info_record(info: FLAC__StreamMetadata_StreamInfo) -> FLAC__StreamMetadata {
    // All-zero is a valid bit pattern for the record; only the tag and one arm are filled in.
    let mut record: FLAC__StreamMetadata = unsafe { std::mem::zeroed() };
    record.type_ = ffi::FLAC__METADATA_TYPE_STREAMINFO;
    record.length = 34;
    record.data.stream_info = info;
    record
}

fn frame_header(channels: usize, block_size: usize, first_sample: u64) -> FLAC__Frame {
    let mut frame: FLAC__Frame = unsafe { std::mem::zeroed() };
    frame.header.blocksize = block_size as c_uint;
    frame.header.sample_rate = 44_100;
    frame.header.channels = channels as c_uint;
    frame.header.channel_assignment = ffi::FLAC__CHANNEL_ASSIGNMENT_INDEPENDENT;
    frame.header.bits_per_sample = 16;
    frame.header.number_type = ffi::FLAC__FRAME_NUMBER_TYPE_SAMPLE_NUMBER;
    frame.header.number.sample_number = first_sample;
    frame
}
