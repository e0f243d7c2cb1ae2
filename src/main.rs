use std::{
    error::Error as _,
    path::{Path, PathBuf},
};

use clap::{AppSettings, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use itertools::Itertools;
use log::{error, info};

use continental::{read_continental, SampleDataSet};

#[derive(Parser)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_long_args = true)]
struct Args {
    /// The Continental files (.prf) to be decoded.
    #[clap(required = true)]
    files: Vec<PathBuf>,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    verbosity: u8,

    /// Disable progress bars.
    #[clap(long)]
    no_progress_bars: bool,
}

fn main() {
    let args = Args::parse();
    setup_logging(args.verbosity);

    let progress = ProgressBar::with_draw_target(
        Some(args.files.len() as _),
        if args.no_progress_bars {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stdout()
        },
    )
    .with_style(
        ProgressStyle::default_bar()
            .template("{msg:17}: [{wide_bar:.blue}] {pos:2}/{len:2} files ({elapsed_precise}<{eta_precise})")
            .unwrap()
            .progress_chars("=> "),
    )
    .with_position(0)
    .with_message("Decoding");
    progress.tick();

    let mut num_failed = 0;
    for file in &args.files {
        match read_continental(file) {
            Ok(ds) => progress.suspend(|| print_summary(file, &ds)),
            Err(e) => {
                num_failed += 1;
                let mut message = format!("{}: {e}", file.display());
                let mut source = e.source();
                while let Some(s) = source {
                    message.push_str(&format!(": {s}"));
                    source = s.source();
                }
                progress.suspend(|| error!("{message}"));
            }
        }
        progress.inc(1);
    }
    progress.finish_with_message("Finished");

    if num_failed > 0 {
        error!("{num_failed} of {} files failed to decode", args.files.len());
        std::process::exit(1);
    }
    info!("Decoded {} files", args.files.len());
}

fn print_summary(file: &Path, ds: &SampleDataSet) {
    let m = &ds.meta;
    println!("{}", file.display());
    println!(
        "  {} {} (serial {}, firmware {})",
        m.instrument_make, m.instrument_model, m.instrument_serial_no, m.instrument_firmware
    );
    match m.instrument_sample_interval {
        Some(i) => println!("  sample interval: {i}"),
        None => println!("  sample interval: unknown"),
    }
    println!(
        "  bin size: {:.4} m, beam angle: {} deg, coordinates: {}",
        m.bin_size, m.beam_angle, m.coordinate_system
    );
    println!(
        "  dimensions: {}",
        ds.dimensions()
            .iter()
            .map(|d| format!("{}={}", d.name(), d.len()))
            .join(", ")
    );
    for v in ds.variables() {
        println!(
            "  {:<8} ({}) {:?} {:?}",
            v.name(),
            v.dimensions().join(", "),
            v.storage_type(),
            v.shape()
        );
    }
}

fn setup_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.init();
}
