mod monitor;
mod replay;
mod trace;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use touchpad_core::config::{X_LINES, Y_LINES};
use touchpad_core::engine::baseline_avg;
use touchpad_core::{keymap, Cell, Polarity};

use replay::Start;

#[derive(Parser)]
#[command(name = "touchpad-cli")]
#[command(about = "Host tools for the capacitive touch keypad")]
struct Cli {
    /// Log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the values in a captured debug trace
    Decode {
        /// Path to the captured trace
        trace: PathBuf,
        /// Signal polarity used to compute thresholds
        #[arg(long, value_enum, default_value_t = PolarityArg::Falling)]
        polarity: PolarityArg,
        /// Drop malformed lines instead of failing
        #[arg(long)]
        skip_invalid: bool,
    },
    /// Run a captured trace through the decision engine
    Replay {
        /// Path to the captured trace
        trace: PathBuf,
        #[arg(long, value_enum, default_value_t = PolarityArg::Falling)]
        polarity: PolarityArg,
        /// Calibrate from the first 16 scans instead of the printed baselines
        #[arg(long)]
        calibrate: bool,
        /// Drop malformed lines instead of failing
        #[arg(long)]
        skip_invalid: bool,
    },
    /// Stream device output from a serial port
    Monitor {
        /// Serial port, e.g. /dev/ttyUSB0
        port: String,
        #[arg(long, default_value_t = 9600)]
        baud: u32,
        /// Send the debug toggle command after opening the port
        #[arg(long)]
        debug: bool,
        /// Also write everything received to this file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// Show which symbol each matrix cell produces
    Layout,
}

#[derive(Copy, Clone, ValueEnum)]
enum PolarityArg {
    /// Touch lowers the reading
    Falling,
    /// Touch raises the reading
    Rising,
}

impl From<PolarityArg> for Polarity {
    fn from(arg: PolarityArg) -> Self {
        match arg {
            PolarityArg::Falling => Polarity::Falling,
            PolarityArg::Rising => Polarity::Rising,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    match cli.command {
        Command::Decode {
            trace,
            polarity,
            skip_invalid,
        } => {
            let lines = read_trace(&trace, skip_invalid)?;
            let polarity = Polarity::from(polarity);

            for scan in &lines {
                println!("line {}:", scan.line);
                for e in &scan.entries {
                    println!(
                        "  {} ({},{})  raw {:5}  avg {:5}  entry {:5}  exit {:5}",
                        keymap::symbol(e.cell) as char,
                        e.cell.x(),
                        e.cell.y(),
                        e.raw,
                        baseline_avg(e.baseline),
                        polarity.signal_threshold(e.baseline),
                        polarity.no_signal_threshold(e.baseline),
                    );
                }
                if !scan.presses.is_empty() {
                    let presses: String = scan
                        .presses
                        .iter()
                        .map(|&c| keymap::symbol(c) as char)
                        .collect();
                    println!("  pressed: {}", presses);
                }
            }
        }
        Command::Replay {
            trace,
            polarity,
            calibrate,
            skip_invalid,
        } => {
            let lines = read_trace(&trace, skip_invalid)?;
            let start = if calibrate {
                Start::Calibrate
            } else {
                Start::TraceBaselines
            };

            let pb = ProgressBar::new(lines.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} scans")
                    .unwrap()
                    .progress_chars("=> "),
            );
            pb.set_message("Replaying");

            let report = replay::replay(&lines, polarity.into(), start, &pb)?;
            pb.finish_and_clear();

            for press in &report.detected {
                println!(
                    "line {}: '{}'",
                    press.line,
                    keymap::symbol(press.cell) as char
                );
            }
            println!(
                "{} scans, {} presses detected, {} recorded by device",
                report.scans,
                report.detected.len(),
                report.recorded.len()
            );
            if report.baseline_mismatches > 0 {
                println!(
                    "{} scans with baselines differing from the device",
                    report.baseline_mismatches
                );
            }
            if !report.matches() {
                eprintln!("Replayed presses differ from the presses the device reported.");
                std::process::exit(1);
            }
        }
        Command::Monitor {
            port,
            baud,
            debug,
            output,
            seconds,
        } => {
            let mut monitor = monitor::Monitor::open(&port, baud, output.as_deref())?;
            if debug {
                monitor.toggle_debug()?;
            }
            monitor.run(seconds.map(Duration::from_secs))?;
        }
        Command::Layout => {
            print!("     ");
            for x in 0..X_LINES {
                print!(" X{}  ", x);
            }
            println!();
            for y in 0..Y_LINES as u8 {
                print!("Y{}   ", y);
                for x in 0..X_LINES as u8 {
                    if let Some(cell) = Cell::new(x, y) {
                        print!(" {}:{:<2} ", keymap::symbol(cell) as char, cell.index());
                    }
                }
                println!();
            }
        }
    }

    Ok(())
}

fn read_trace(path: &Path, skip_invalid: bool) -> Result<Vec<trace::ScanLine>> {
    // Serial captures may carry line noise; it fails the affected line only.
    let contents = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    trace::parse_trace(&String::from_utf8_lossy(&contents), skip_invalid)
        .context("parsing debug trace")
}
