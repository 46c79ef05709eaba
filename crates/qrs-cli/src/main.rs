use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info};
use qrs_lib::{
    config::{AppConfig, OutputFormat},
    detectors::{InitialPhase, QrsDetector},
    io::{
        slot::sample_slot,
        stream::{run_stream, CsvSink, EventSink, JsonLinesSink, SymbolSink},
        text as text_io,
    },
    signal::{BeatEvent, Sample, StreamSummary},
    synth::SpikeTrain,
};
use serde::Serialize;
use std::{
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

#[derive(Parser)]
#[command(
    name = "qrs",
    version,
    about = "Streaming Pan-Tompkins QRS detection tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatArg {
    Symbols,
    Json,
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Symbols => OutputFormat::Symbols,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PhaseArg {
    Unknown,
    Qrs,
    T,
}

impl From<PhaseArg> for InitialPhase {
    fn from(arg: PhaseArg) -> Self {
        match arg {
            PhaseArg::Unknown => InitialPhase::Unknown,
            PhaseArg::Qrs => InitialPhase::Qrs,
            PhaseArg::T => InitialPhase::T,
        }
    }
}

/// Options shared by every command that runs the detector.
#[derive(Args)]
struct DetectorArgs {
    /// Newline-delimited samples; stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,
    /// TOML settings file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum)]
    initial_phase: Option<PhaseArg>,
    #[arg(long)]
    warmup_holdoff: Option<u32>,
    #[arg(long)]
    agreement_window: Option<u32>,
    /// History samples the bandpass channel rescans on a marginal peak
    #[arg(long)]
    bandpass_searchback: Option<usize>,
    #[arg(long)]
    sample_rate: Option<f64>,
}

impl DetectorArgs {
    fn app_config(&self, format: Option<FormatArg>) -> Result<AppConfig> {
        let mut cfg = match &self.config {
            Some(path) => AppConfig::from_path(path)?,
            None => AppConfig::default(),
        };
        if let Some(phase) = self.initial_phase {
            cfg.detector.initial_phase = phase.into();
        }
        if let Some(holdoff) = self.warmup_holdoff {
            cfg.detector.warmup_holdoff = holdoff;
        }
        if let Some(window) = self.agreement_window {
            cfg.detector.agreement_window = window;
        }
        if let Some(depth) = self.bandpass_searchback {
            cfg.detector.bandpass_searchback = depth;
        }
        if let Some(rate) = self.sample_rate {
            cfg.sample_rate_hz = rate;
        }
        if let Some(format) = format {
            cfg.output = format.into();
        }
        cfg.validate()?;
        debug!("effective config: {:?}", cfg);
        Ok(cfg)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Detect beats in a recording and write one event per beat to stdout
    Detect {
        #[command(flatten)]
        detector: DetectorArgs,
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
    /// Like detect, but feed samples from a producer thread through the sample slot
    Stream {
        #[command(flatten)]
        detector: DetectorArgs,
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
        /// Post samples at the configured sample rate instead of as fast as possible
        #[arg(long)]
        paced: bool,
    },
    /// Print a synthetic spike-train recording, one sample per line
    Synth {
        #[arg(long, default_value_t = 10)]
        beats: usize,
        #[arg(long, default_value_t = 160)]
        period: usize,
        #[arg(long, default_value_t = 300)]
        amplitude: u16,
        #[arg(long, default_value_t = 512)]
        baseline: u16,
        #[arg(long, default_value_t = 0)]
        t_amplitude: u16,
        #[arg(long, default_value_t = 0)]
        noise: u16,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Run the detector and print aggregate counts and heart rate as JSON
    Summary {
        #[command(flatten)]
        detector: DetectorArgs,
    },
}

#[derive(Serialize)]
struct SummaryReport {
    #[serde(flatten)]
    summary: StreamSummary,
    sample_rate_hz: f64,
    bpm: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Detect { detector, format } => cmd_detect(&detector, format)?,
        Commands::Stream {
            detector,
            format,
            paced,
        } => cmd_stream(&detector, format, paced)?,
        Commands::Synth {
            beats,
            period,
            amplitude,
            baseline,
            t_amplitude,
            noise,
            seed,
        } => cmd_synth(SpikeTrain {
            beats,
            period,
            amplitude,
            baseline,
            t_amplitude,
            noise,
            seed,
            ..SpikeTrain::default()
        })?,
        Commands::Summary { detector } => cmd_summary(&detector)?,
    }
    Ok(())
}

fn read_samples(input: Option<&Path>) -> Result<Vec<Sample>> {
    let samples = match input {
        Some(path) => text_io::read_sample_series(path)?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read samples from stdin")?;
            text_io::parse_sample_series(&buf)?
        }
    };
    Ok(samples)
}

fn event_sink<'a, W: Write + 'a>(format: OutputFormat, writer: W) -> Box<dyn EventSink + 'a> {
    match format {
        OutputFormat::Symbols => Box::new(SymbolSink::new(writer)),
        OutputFormat::Json => Box::new(JsonLinesSink::new(writer)),
        OutputFormat::Csv => Box::new(CsvSink::new(writer)),
    }
}

fn log_summary(summary: &StreamSummary, sample_rate_hz: f64) {
    info!(
        "{} samples, {} beats ({} qrs, {} t), {}",
        summary.samples,
        summary.beats,
        summary.qrs,
        summary.t_waves,
        summary
            .bpm(sample_rate_hz)
            .map(|bpm| format!("{bpm:.1} bpm"))
            .unwrap_or_else(|| "no confirmed rr".to_string())
    );
}

fn cmd_detect(args: &DetectorArgs, format: Option<FormatArg>) -> Result<()> {
    let cfg = args.app_config(format)?;
    let samples = read_samples(args.input.as_deref())?;
    let mut detector = QrsDetector::new(cfg.detector);
    let stdout = io::stdout();
    let mut sink = event_sink(cfg.output, BufWriter::new(stdout.lock()));
    let summary = run_stream(&mut detector, &mut samples.into_iter(), sink.as_mut())?;
    log_summary(&summary, cfg.sample_rate_hz);
    Ok(())
}

fn cmd_stream(args: &DetectorArgs, format: Option<FormatArg>, paced: bool) -> Result<()> {
    let cfg = args.app_config(format)?;
    let samples = read_samples(args.input.as_deref())?;
    let period = Duration::try_from_secs_f64(1.0 / cfg.sample_rate_hz)
        .context("sample rate too low to pace")?;

    let (producer, mut slot) = sample_slot();
    let feeder = thread::spawn(move || {
        let start = Instant::now();
        for (n, sample) in samples.into_iter().enumerate() {
            if paced {
                let due = start + period.mul_f64(n as f64);
                if let Some(wait) = due.checked_duration_since(Instant::now()) {
                    thread::sleep(wait);
                }
            }
            producer.post(sample)?;
        }
        Ok::<(), qrs_lib::SlotError>(())
    });

    let mut detector = QrsDetector::new(cfg.detector);
    let stdout = io::stdout();
    let mut sink = event_sink(cfg.output, BufWriter::new(stdout.lock()));
    let summary = run_stream(&mut detector, &mut slot, sink.as_mut())?;
    feeder
        .join()
        .map_err(|_| anyhow!("sample producer panicked"))??;
    log_summary(&summary, cfg.sample_rate_hz);
    Ok(())
}

fn cmd_synth(train: SpikeTrain) -> Result<()> {
    if train.period == 0 {
        return Err(anyhow!("period must be at least one sample"));
    }
    let samples = train.generate();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    out.write_all(text_io::format_sample_series(&samples).as_bytes())?;
    out.flush()?;
    Ok(())
}

fn cmd_summary(args: &DetectorArgs) -> Result<()> {
    let cfg = args.app_config(None)?;
    let samples = read_samples(args.input.as_deref())?;
    let mut detector = QrsDetector::new(cfg.detector);
    let mut events: Vec<BeatEvent> = Vec::new();
    let summary = run_stream(&mut detector, &mut samples.into_iter(), &mut events)?;
    let report = SummaryReport {
        bpm: summary.bpm(cfg.sample_rate_hz),
        sample_rate_hz: cfg.sample_rate_hz,
        summary,
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
