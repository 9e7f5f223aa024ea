#![cfg(feature = "native")]

use std::io::SeekFrom;
use std::path::PathBuf;

use flac_bridge::{
    DecoderOpts, DecoderState, Error, FlacDecoder, Handlers, Metadata, PcmDecoder, PcmFormat,
    PcmOpts, WriteStatus,
};

// tests/fixtures/ramp.flac: 10 000 samples of 16-bit stereo at 44.1 kHz, stored as three
// verbatim frames (4096, 4096, 1808 samples), with a correct MD5 signature and two tags.
const TOTAL: u64 = 10_000;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/ramp.flac")
}

fn left(i: u64) -> i16 {
    ((i * 7 % 30_000) as i32 - 15_000) as i16
}

fn right(i: u64) -> i16 {
    (15_000 - (i * 3 % 30_000) as i32) as i16
}

/// Interleaved little-endian 16-bit PCM for samples `start..end`.
fn expected_pcm(start: u64, end: u64) -> Vec<u8> {
    (start..end)
        .flat_map(|i| {
            let mut frame = [0u8; 4];
            frame[..2].copy_from_slice(&left(i).to_le_bytes());
            frame[2..].copy_from_slice(&right(i).to_le_bytes());
            frame
        })
        .collect()
}

fn open_pcm(md5_checking: bool) -> anyhow::Result<PcmDecoder> {
    let opts = DecoderOpts {
        md5_checking,
        ..DecoderOpts::default()
    };
    let mut decoder = PcmDecoder::new(opts, PcmOpts::default())?;
    decoder.open(fixture())?;
    Ok(decoder)
}

#[test]
fn opening_reports_format_and_length() -> anyhow::Result<()> {
    let decoder = open_pcm(false)?;

    assert_eq!(
        decoder.format(),
        Some(PcmFormat {
            sample_rate: 44_100,
            channels: 2,
            bits_per_sample: 16,
            output_bytes_per_sample: 2,
        })
    );
    assert_eq!(decoder.total_samples(), TOTAL);
    assert_eq!(decoder.tell(), 0);
    Ok(())
}

#[test]
fn decodes_interleaved_pcm_across_frame_boundaries() -> anyhow::Result<()> {
    let mut decoder = open_pcm(false)?;

    // 5000 samples straddle the first two 4096-sample frames.
    let mut out = vec![0u8; 5_000 * 4];
    assert_eq!(decoder.decode_samples(5_000, &mut out)?, 5_000);
    assert_eq!(out, expected_pcm(0, 5_000));
    assert_eq!(decoder.tell(), 5_000);

    let mut out = vec![0u8; 16 * 4];
    assert_eq!(decoder.decode_samples(16, &mut out)?, 16);
    assert_eq!(out, expected_pcm(5_000, 5_016));
    assert_eq!(decoder.tell(), 5_016);
    Ok(())
}

#[test]
fn seek_resumes_at_the_target_sample() -> anyhow::Result<()> {
    let mut decoder = open_pcm(false)?;
    let mut out = vec![0u8; 64 * 4];

    // Buffer some audio first; the seek must discard it.
    assert_eq!(decoder.decode_samples(64, &mut out)?, 64);

    assert_eq!(decoder.seek(SeekFrom::Start(6_000))?, 6_000);
    assert_eq!(decoder.tell(), 6_000);
    assert_eq!(decoder.decode_samples(64, &mut out)?, 64);
    assert_eq!(out, expected_pcm(6_000, 6_064));
    assert_eq!(decoder.tell(), 6_064);

    assert_eq!(decoder.seek(SeekFrom::Current(-1_064))?, 5_000);
    assert_eq!(decoder.decode_samples(64, &mut out)?, 64);
    assert_eq!(out, expected_pcm(5_000, 5_064));
    Ok(())
}

#[test]
fn end_of_stream_yields_a_short_read_then_zero() -> anyhow::Result<()> {
    let mut decoder = open_pcm(false)?;

    assert_eq!(decoder.seek(SeekFrom::End(-100))?, TOTAL - 100);

    let mut out = vec![0u8; 4_096 * 4];
    assert_eq!(decoder.decode_samples(4_096, &mut out)?, 100);
    assert_eq!(&out[..100 * 4], &expected_pcm(TOTAL - 100, TOTAL)[..]);
    assert_eq!(decoder.tell(), TOTAL);

    assert_eq!(decoder.decode_samples(4_096, &mut out)?, 0);
    assert_eq!(decoder.tell(), TOTAL);
    decoder.close()?;
    Ok(())
}

#[test]
fn full_decode_with_md5_checking_closes_cleanly() -> anyhow::Result<()> {
    let mut decoder = open_pcm(true)?;
    let mut out = vec![0u8; 4_096 * 4];
    let mut decoded = 0u64;

    loop {
        let frames = decoder.decode_samples(4_096, &mut out)?;
        if frames == 0 {
            break;
        }
        decoded += frames as u64;
    }

    assert_eq!(decoded, TOTAL);
    decoder.close()?;
    Ok(())
}

#[test]
fn closing_before_the_end_skips_md5_verification() -> anyhow::Result<()> {
    let mut decoder = open_pcm(true)?;
    let mut out = vec![0u8; 16 * 4];
    assert_eq!(decoder.decode_samples(16, &mut out)?, 16);

    decoder.close()?;
    Ok(())
}

#[test]
fn md5_mismatch_is_reported_on_close() -> anyhow::Result<()> {
    // STREAMINFO's body starts after "fLaC" and the 4-byte block header; its MD5 is the last
    // 16 of its 34 bytes.
    let mut bytes = std::fs::read(fixture())?;
    bytes[8 + 18] ^= 0xFF;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bad-md5.flac");
    std::fs::write(&path, &bytes)?;

    let opts = DecoderOpts {
        md5_checking: true,
        ..DecoderOpts::default()
    };
    let mut writes = 0usize;
    let mut decoder = FlacDecoder::new(opts)?;
    decoder.open(
        &path,
        Handlers::new(|_frame, _ctx| {
            writes += 1;
            Ok(WriteStatus::Continue)
        }),
    )?;
    decoder.process_until_end_of_stream()?;
    assert_eq!(decoder.state(), DecoderState::EndOfStream);

    match decoder.close() {
        Err(Error::Message(msg)) => assert!(msg.contains("MD5"), "unexpected message: {msg}"),
        Err(other) => return Err(other.into()),
        Ok(_) => panic!("a corrupted MD5 signature went unnoticed"),
    }
    drop(decoder);
    assert_eq!(writes, 3);
    Ok(())
}

#[test]
fn metadata_and_frames_reach_closure_handlers() -> anyhow::Result<()> {
    let mut tags = Vec::new();
    let mut vendor = None;
    let mut block_sizes = Vec::new();
    let mut rates = Vec::new();

    {
        let mut decoder = FlacDecoder::new(DecoderOpts::default())?;
        decoder.open(
            fixture(),
            Handlers::new(|frame, _ctx| {
                block_sizes.push(frame.sample_count());
                Ok(WriteStatus::Continue)
            })
            .with_stream_info(|info, _ctx| {
                rates.push(info.sample_rate);
                Ok(())
            })
            .with_metadata(|metadata, _ctx| {
                if let Metadata::VorbisComment(comment) = metadata {
                    vendor = Some(comment.vendor.clone());
                    tags.extend(comment.tags.iter().cloned());
                }
                Ok(())
            }),
        )?;

        while decoder.process_single()? {}
        assert!(decoder.close()?.is_some());
    }

    assert_eq!(rates, vec![44_100]);
    assert_eq!(vendor.as_deref(), Some("flac-bridge test fixture"));
    assert_eq!(
        tags,
        vec![
            ("TITLE".to_string(), "Ramp".to_string()),
            ("ARTIST".to_string(), "flac-bridge".to_string()),
        ]
    );
    assert_eq!(block_sizes, vec![4_096, 4_096, 1_808]);
    Ok(())
}
