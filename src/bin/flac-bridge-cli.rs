use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use flac_bridge::logging;
use flac_bridge::{
    CallbackContext, DecodeHandler, DecoderOpts, FlacDecoder, Frame, Metadata, PcmDecoder,
    PcmOpts, StreamInfo, WavSink, WriteStatus,
};

fn main() -> Result<()> {
    logging::init();
    let params = Params::parse();

    match params.command {
        Command::Info { path } => {
            if params.md5 {
                tracing::warn!("--md5 has no effect on `info`; only `decode` reads the audio");
            }
            info(path)
        }
        Command::Decode {
            input,
            output,
            raw,
            max_bit_depth,
        } => {
            let opts = DecoderOpts {
                md5_checking: params.md5,
                ..DecoderOpts::default()
            };
            if raw {
                decode_raw(input, output, opts, max_bit_depth)
            } else {
                decode_wav(input, output, opts)
            }
        }
        Command::Version => {
            println!(
                "flac-bridge {} (libFLAC {})",
                env!("CARGO_PKG_VERSION"),
                flac_bridge::version()
            );
            Ok(())
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "flac-bridge")]
#[command(about = "Decode FLAC files through libFLAC")]
struct Params {
    /// Verify decoded audio against the stream's MD5 signature (`decode` only).
    #[arg(long = "md5", global = true, default_value_t = false)]
    pub md5: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print stream info and tags as JSON.
    Info { path: PathBuf },

    /// Decode a FLAC file to WAV (or raw interleaved PCM).
    Decode {
        #[arg(short = 'i', long = "input")]
        input: PathBuf,

        /// Output path; `-` writes raw PCM to stdout.
        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        /// Write headerless little-endian PCM instead of WAV.
        #[arg(long = "raw", default_value_t = false)]
        raw: bool,

        /// Widest raw sample to emit, in bits (8, 16, 24 or 32).
        #[arg(long = "max-bit-depth", default_value_t = 16)]
        max_bit_depth: u32,
    },

    /// Print crate and libFLAC versions.
    Version,
}

#[derive(Serialize)]
struct InfoReport {
    path: PathBuf,
    libflac: String,
    stream_info: Option<StreamInfo>,
    duration_secs: Option<f64>,
    vendor: Option<String>,
    tags: Vec<(String, String)>,
}

/// Collects metadata only; frames are never requested.
#[derive(Default)]
struct InfoCollector {
    stream_info: Option<StreamInfo>,
    vendor: Option<String>,
    tags: Vec<(String, String)>,
}

impl DecodeHandler for InfoCollector {
    fn on_metadata(&mut self, _ctx: &CallbackContext, metadata: &Metadata) -> Result<()> {
        match metadata {
            Metadata::StreamInfo(info) => self.stream_info = Some(*info),
            Metadata::VorbisComment(comment) => {
                self.vendor = Some(comment.vendor.clone());
                self.tags.extend(comment.tags.iter().cloned());
            }
            Metadata::Other(_) => {}
        }
        Ok(())
    }

    fn on_write(&mut self, _ctx: &CallbackContext, _frame: &Frame<'_>) -> Result<WriteStatus> {
        Ok(WriteStatus::Abort)
    }
}

fn info(path: PathBuf) -> Result<()> {
    // Only metadata is decoded here, so there is no audio to check a signature against.
    let opts = DecoderOpts {
        md5_checking: false,
        ..DecoderOpts::default()
    };
    let mut decoder = FlacDecoder::new(opts)?;
    decoder
        .open(&path, InfoCollector::default())
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let collected = decoder.close()?.unwrap_or_default();

    let report = InfoReport {
        path,
        libflac: flac_bridge::version(),
        duration_secs: collected
            .stream_info
            .and_then(|info| info.duration())
            .map(|d| d.as_secs_f64()),
        stream_info: collected.stream_info,
        vendor: collected.vendor,
        tags: collected.tags,
    };

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn decode_wav(input: PathBuf, output: PathBuf, opts: DecoderOpts) -> Result<()> {
    let sink = WavSink::create(&output)?;
    let mut decoder = FlacDecoder::new(opts)?;
    decoder.open(&input, sink)?;
    decoder.process_until_end_of_stream()?;

    let sink = decoder
        .close()?
        .context("decoder closed without a WAV sink")?;
    tracing::info!(frames = sink.frames_written(), output = %output.display(), "wrote WAV");
    sink.finalize()?;
    Ok(())
}

fn decode_raw(
    input: PathBuf,
    output: PathBuf,
    opts: DecoderOpts,
    max_bit_depth: u32,
) -> Result<()> {
    let pcm_opts = PcmOpts {
        max_output_bit_depth: max_bit_depth,
    };
    let mut decoder = PcmDecoder::new(opts, pcm_opts)?;
    decoder.open(&input)?;

    let format = decoder
        .format()
        .context("stream format is unknown after opening")?;
    tracing::info!(?format, "decoding to raw PCM");

    let mut writer: Box<dyn Write> = if output.as_os_str() == "-" {
        Box::new(BufWriter::new(io::stdout().lock()))
    } else {
        Box::new(BufWriter::new(File::create(&output).with_context(|| {
            format!("failed to create '{}'", output.display())
        })?))
    };

    const CHUNK_FRAMES: usize = 4096;
    let frame_bytes = format.output_bytes_per_sample * format.channels as usize;
    let mut buf = vec![0u8; CHUNK_FRAMES * frame_bytes];

    loop {
        let frames = decoder.decode_samples(CHUNK_FRAMES, &mut buf)?;
        if frames == 0 {
            break;
        }
        writer.write_all(&buf[..frames * frame_bytes])?;
    }

    writer.flush()?;
    decoder.close()?;
    Ok(())
}
