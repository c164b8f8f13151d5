//! pcmix-play - mix WAV files through the pcmix mixer
//!
//! Plays every input at once on an output device, or renders the mix to a
//! 16-bit WAV file.
//!
//! ## Usage
//!
//! ```text
//! pcmix-play [--config <file>] [--render <out.wav>] <input>...
//! pcmix-play --list-devices
//! ```
//!
//! Each input is `path[:volume[:balance]]`, volume 0..=255 (default 255) and
//! balance -127..=127 (default 0).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};

use pcmix_core::audio::{
    get_output_devices, AudioConfig, CpalDevice, ManualDevice, OutputSpec, RequestedFormat,
};
use pcmix_core::config::{load_config, read_config};
use pcmix_core::source::load_wav;
use pcmix_core::{Mixer, MAX_CHANNEL_VOLUME};

/// Config used when `--config` is not given
const DEFAULT_CONFIG_FILE: &str = "pcmix.yaml";

/// How often playback checks whether every channel has finished
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, PartialEq)]
struct Input {
    path: PathBuf,
    volume: u8,
    balance: i8,
}

#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    render: Option<PathBuf>,
    list_devices: bool,
    inputs: Vec<Input>,
}

fn main() -> Result<()> {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let options = parse_args(std::env::args().skip(1))?;

    if options.list_devices {
        return list_devices();
    }
    if options.inputs.is_empty() {
        bail!("usage: pcmix-play [--config <file>] [--render <out.wav>] <path[:volume[:balance]]>...");
    }

    let config: AudioConfig = match &options.config {
        Some(path) => read_config(path)?,
        None => load_config(Path::new(DEFAULT_CONFIG_FILE)),
    };

    match &options.render {
        Some(out) => render_to_file(&config, &options.inputs, out),
        None => play(&config, &options.inputs),
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options> {
    let mut options = Options::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a file")?;
                options.config = Some(PathBuf::from(path));
            }
            "--render" => {
                let path = args.next().context("--render needs an output file")?;
                options.render = Some(PathBuf::from(path));
            }
            "--list-devices" => options.list_devices = true,
            flag if flag.starts_with("--") => bail!("Unknown option {}", flag),
            _ => options.inputs.push(parse_input(&arg)?),
        }
    }
    Ok(options)
}

/// Split `path[:volume[:balance]]`
///
/// Only trailing numeric fields are taken, so paths containing ':' still work.
fn parse_input(arg: &str) -> Result<Input> {
    let mut path = arg;
    let mut fields = Vec::new();
    while fields.len() < 2 {
        match path.rsplit_once(':') {
            Some((head, tail)) if tail.parse::<i32>().is_ok() => {
                fields.push(tail);
                path = head;
            }
            _ => break,
        }
    }
    fields.reverse();

    let volume = match fields.first() {
        Some(v) => v
            .parse::<u8>()
            .with_context(|| format!("Volume {} out of range 0..=255", v))?,
        None => MAX_CHANNEL_VOLUME,
    };
    let balance = match fields.get(1) {
        Some(b) => b
            .parse::<i8>()
            .ok()
            .filter(|b| *b >= -127)
            .with_context(|| format!("Balance {} out of range -127..=127", b))?,
        None => 0,
    };

    Ok(Input {
        path: PathBuf::from(path),
        volume,
        balance,
    })
}

fn list_devices() -> Result<()> {
    for device in get_output_devices()? {
        let stereo = if device.supports_stereo { "" } else { " (no stereo)" };
        println!("{}{}  formats: {:?}", device, stereo, device.sample_formats);
    }
    Ok(())
}

fn start_inputs(mixer: &Mixer, inputs: &[Input]) -> Result<()> {
    for input in inputs {
        let source = load_wav(&input.path)
            .with_context(|| format!("Failed to load {}", input.path.display()))?;
        let handle = mixer.play_with(source, input.volume, input.balance);
        if !handle.is_valid() {
            bail!("Mixer refused {}", input.path.display());
        }
        log::info!(
            "Channel {}: {} (volume {}, balance {})",
            handle,
            input.path.display(),
            input.volume,
            input.balance
        );
    }
    Ok(())
}

fn play(config: &AudioConfig, inputs: &[Input]) -> Result<()> {
    let mut device = CpalDevice::open(config.device.as_ref())?;
    let mixer = Mixer::new();
    let spec = mixer.init(&mut device, config)?;
    ensure_writable(&spec)?;
    log::info!(
        "Playing on {} at {}Hz ({:.1}ms buffer)",
        device.name(),
        spec.sample_rate,
        spec.latency_ms()
    );

    start_inputs(&mixer, inputs)?;
    while mixer.channel_count() > 0 {
        std::thread::sleep(POLL_INTERVAL);
    }

    // Let the last period reach the speakers before the stream drops
    std::thread::sleep(Duration::from_secs_f32(spec.latency_ms() / 1000.0));
    log::info!("Playback finished");
    Ok(())
}

/// Refuse formats the mixer renders as silence
///
/// Nothing is consumed from the sources in that case, so waiting for the
/// channels to finish would never return.
fn ensure_writable(spec: &OutputSpec) -> Result<()> {
    if !spec.format.is_supported() {
        bail!(
            "Output device negotiated {:?}, which the mixer cannot write (need I16, F32 or I32)",
            spec.format
        );
    }
    Ok(())
}

fn render_to_file(config: &AudioConfig, inputs: &[Input], out: &Path) -> Result<()> {
    let config = config.clone().with_sample_format(RequestedFormat::I16);
    let mut device = ManualDevice::new();
    let mixer = Mixer::new();
    let spec = mixer.init(&mut device, &config)?;

    start_inputs(&mixer, inputs)?;

    let wav_spec = hound::WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(out, wav_spec)
        .with_context(|| format!("Failed to create {}", out.display()))?;

    let mut frames = 0usize;
    while mixer.channel_count() > 0 {
        let period = device.pull_frames(spec.buffer_frames as usize);
        for sample in period.chunks_exact(2) {
            writer.write_sample(i16::from_ne_bytes([sample[0], sample[1]]))?;
        }
        frames += spec.buffer_frames as usize;
    }
    writer.finalize()?;

    log::info!(
        "Rendered {} frames ({:.2}s) to {}",
        frames,
        frames as f32 / spec.sample_rate as f32,
        out.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcmix_core::mixer::OutputFormat;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_input_fields() {
        assert_eq!(
            parse_input("a.wav").unwrap(),
            Input { path: "a.wav".into(), volume: 255, balance: 0 }
        );
        assert_eq!(
            parse_input("a.wav:128").unwrap(),
            Input { path: "a.wav".into(), volume: 128, balance: 0 }
        );
        assert_eq!(
            parse_input("C:/music/a.wav:128:-64").unwrap(),
            Input { path: "C:/music/a.wav".into(), volume: 128, balance: -64 }
        );
    }

    #[test]
    fn test_parse_input_rejects_out_of_range() {
        assert!(parse_input("a.wav:300").is_err());
        assert!(parse_input("a.wav:10:-128").is_err());
        assert!(parse_input("a.wav:10:200").is_err());
    }

    #[test]
    fn test_parse_args() {
        let options =
            parse_args(args(&["--render", "out.wav", "x.wav:10", "--config", "c.yaml"])).unwrap();
        assert_eq!(options.render, Some(PathBuf::from("out.wav")));
        assert_eq!(options.config, Some(PathBuf::from("c.yaml")));
        assert_eq!(options.inputs.len(), 1);
        assert!(!options.list_devices);

        assert!(parse_args(args(&["--bogus"])).is_err());
        assert!(parse_args(args(&["--render"])).is_err());
    }

    #[test]
    fn test_ensure_writable() {
        let spec = |format| OutputSpec {
            sample_rate: 44100,
            format,
            channels: 2,
            buffer_frames: 512,
        };
        assert!(ensure_writable(&spec(OutputFormat::F32)).is_ok());
        assert!(ensure_writable(&spec(OutputFormat::Unsupported(cpal::SampleFormat::U16))).is_err());
    }
}
