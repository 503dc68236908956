//! beatmash - rewrite a track's beats from the command line
//!
//! Decodes an input file, runs the chosen beat modifier over it on a
//! worker pool, and writes the reassembled stream to a WAV or raw PCM
//! output.

mod registry;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use beatmash_audio::pipeline::Pipeline;
use beatmash_audio::{PcmSource, SampleModifier};
use beatmash_codec::{Endianness, RawPcmSink, RawPcmSource, SymphoniaSource, WavSink};
use tracing::info;
use tracing_subscriber::EnvFilter;

use registry::{build_modifier, ModifierOptions, MODIFIERS};

/// Sample rate assumed for headerless input unless overridden
const DEFAULT_RAW_RATE: u32 = 44_100;

#[derive(Debug)]
struct Args {
    modifier: String,
    options: HashMap<String, String>,
    input: PathBuf,
    output: PathBuf,
    raw_rate: u32,
    raw_channels: u16,
    raw_endian: Endianness,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let raw_args: Vec<String> = std::env::args().skip(1).collect();
    if raw_args.iter().any(|a| a == "--help" || a == "-h") || raw_args.is_empty() {
        print_usage();
        return Ok(());
    }

    let args = parse_args(raw_args)?;
    let modifier = build_modifier(&args.modifier, ModifierOptions::new(args.options.clone()))?;

    let source = open_source(&args)?;
    let sample_rate = source.sample_rate();
    let mut sink = open_sink(&args.output, sample_rate, args.raw_endian)?;

    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        modifier = %modifier.describe(),
        "processing"
    );
    let stats = Pipeline::new()
        .run(source, sink.as_mut(), modifier.as_ref())
        .with_context(|| format!("processing {}", args.input.display()))?;
    info!(
        batches = stats.batches,
        frames_read = stats.frames_read,
        frames_written = stats.frames_written,
        "done"
    );
    Ok(())
}

fn parse_args(raw: Vec<String>) -> Result<Args> {
    let mut modifier = None;
    let mut options = HashMap::new();
    let mut input = None;
    let mut output = None;
    let mut raw_rate = DEFAULT_RAW_RATE;
    let mut raw_channels = 2u16;
    let mut raw_endian = Endianness::Big;

    let mut iter = raw.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "-o" || arg == "--output" {
            let value = iter.next().context("-o expects an output path")?;
            output = Some(PathBuf::from(value));
        } else if let Some(key) = arg.strip_prefix("--") {
            let value = iter
                .next()
                .with_context(|| format!("--{key} expects a value"))?;
            match key {
                "raw-rate" => {
                    raw_rate = value
                        .parse()
                        .with_context(|| format!("--raw-rate expects a number, got `{value}`"))?;
                }
                "raw-channels" => {
                    raw_channels = value
                        .parse()
                        .with_context(|| format!("--raw-channels expects 1 or 2, got `{value}`"))?;
                }
                "raw-endian" => {
                    raw_endian = match value.as_str() {
                        "big" | "be" => Endianness::Big,
                        "little" | "le" => Endianness::Little,
                        other => bail!("--raw-endian expects `big` or `little`, got `{other}`"),
                    };
                }
                _ => {
                    options.insert(key.to_string(), value);
                }
            }
        } else if modifier.is_none() {
            modifier = Some(arg);
        } else if input.is_none() {
            input = Some(PathBuf::from(arg));
        } else {
            bail!("unexpected argument `{arg}`");
        }
    }

    Ok(Args {
        modifier: modifier.context("no modifier given; run with --help")?,
        options,
        input: input.context("no input file given")?,
        output: output.context("no output file given; use -o <path>")?,
        raw_rate,
        raw_channels,
        raw_endian,
    })
}

fn is_raw(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("pcm") | Some("raw")
    )
}

fn open_source(args: &Args) -> Result<Box<dyn PcmSource + Send>> {
    if is_raw(&args.input) {
        let file = File::open(&args.input)
            .with_context(|| format!("opening {}", args.input.display()))?;
        Ok(Box::new(RawPcmSource::new(
            BufReader::new(file),
            args.raw_rate,
            args.raw_channels,
            args.raw_endian,
        )))
    } else {
        Ok(Box::new(SymphoniaSource::open(&args.input).with_context(
            || format!("opening {}", args.input.display()),
        )?))
    }
}

fn open_sink(
    output: &Path,
    sample_rate: u32,
    endian: Endianness,
) -> Result<Box<dyn beatmash_audio::PcmSink>> {
    if is_raw(output) {
        let file =
            File::create(output).with_context(|| format!("creating {}", output.display()))?;
        Ok(Box::new(RawPcmSink::new(BufWriter::new(file), endian)))
    } else if output.extension().and_then(|e| e.to_str()) == Some("wav") {
        Ok(Box::new(WavSink::create(output, sample_rate)?))
    } else {
        bail!(
            "unsupported output `{}`; use a .wav, .pcm, or .raw path",
            output.display()
        );
    }
}

fn print_usage() {
    println!("beatmash - rewrite a track's beats");
    println!();
    println!("usage: beatmash <modifier> [--option value ...] <input> -o <output>");
    println!();
    println!("modifiers:");
    for (name, help) in MODIFIERS {
        println!("  {name:<20} {help}");
    }
    println!();
    println!("input:  mp3/flac/ogg/wav/aac, or headerless .pcm/.raw");
    println!("output: .wav, or headerless .pcm/.raw");
    println!();
    println!("raw PCM options:");
    println!("  --raw-rate HZ        sample rate of raw input (default {DEFAULT_RAW_RATE})");
    println!("  --raw-channels N     1 or 2 (default 2)");
    println!("  --raw-endian ORDER   big or little (default big)");
}
