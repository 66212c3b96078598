//! `etpu`: command-line interface for the ETPU accelerator.
//!
//! ```text
//! USAGE:
//!   etpu run [--frames N] [--verify]   Run frames against /dev/mem
//!   etpu dry-run                       Run one frame on a recording bus, print the trace
//!   etpu plan [--dimension N]          Print weight traversal and stream packing
//!   etpu layout                        Print the register window map
//! ```
//!
//! Matrices are given as `"1,5,6;4,8,7;5,9,11"` and default to the
//! reference frame.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use etpu_driver::chip::{self, Window};
use etpu_driver::{
    ArrayGeometry, DevMemBus, DriverConfig, FrameDriver, FrameReport, Matrix, ReadoutSpan,
    RecordingBus, StreamPacker, DEV_MEM,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "etpu", about = "ETPU convolution accelerator CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run frames on the accelerator through a physical memory mapping.
    Run {
        #[command(flatten)]
        frame: FrameArgs,
        /// Frames to run back to back.
        #[arg(long, default_value_t = 1)]
        frames: u32,
        /// Read the weight window back after loading.
        #[arg(long)]
        verify: bool,
        /// Physical memory device.
        #[arg(long, default_value = DEV_MEM)]
        mem: PathBuf,
    },
    /// Run one frame on the software recording bus and print every access.
    DryRun {
        #[command(flatten)]
        frame: FrameArgs,
    },
    /// Print the weight traversal table and packed stream words.
    Plan {
        /// Array dimension (1-3).
        #[arg(long, default_value_t = chip::DIMENSION)]
        dimension: usize,
        /// Input matrix; defaults to the reference input (3x3 only).
        #[arg(long)]
        input: Option<Matrix>,
    },
    /// Print the register window map.
    Layout,
}

#[derive(Args)]
struct FrameArgs {
    /// Weight matrix, rows separated by ';'.
    #[arg(long, default_value_t = Matrix::reference_weights())]
    weights: Matrix,
    /// Input matrix, rows separated by ';'.
    #[arg(long, default_value_t = Matrix::reference_input())]
    input: Matrix,
    /// First readout slot polled.
    #[arg(long, default_value_t = chip::READOUT_FIRST_SLOT)]
    readout_first: usize,
    /// Readout slots polled per frame.
    #[arg(long, default_value_t = chip::READOUT_WORDS)]
    readout_count: usize,
}

impl FrameArgs {
    fn config(&self) -> Result<DriverConfig> {
        let span = ReadoutSpan::new(self.readout_first, self.readout_count)?;
        Ok(DriverConfig::new()
            .with_dimension(self.weights.dim())
            .with_readout(span))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Run {
            frame,
            frames,
            verify,
            mem,
        } => cmd_run(&frame, frames, verify, &mem)?,
        Cmd::DryRun { frame } => cmd_dry_run(&frame)?,
        Cmd::Plan { dimension, input } => cmd_plan(dimension, input)?,
        Cmd::Layout => cmd_layout(),
    }

    Ok(())
}

fn cmd_run(args: &FrameArgs, frames: u32, verify: bool, mem: &Path) -> Result<()> {
    let config = args.config()?.with_verify_weights(verify);
    tracing::info!("Running {frames} frame(s) through {}", mem.display());
    let bus = DevMemBus::open(mem)
        .with_context(|| format!("mapping accelerator through {}", mem.display()))?;
    let mut driver = FrameDriver::new(bus, &config)?;

    for _ in 0..frames {
        let report = driver.run_frame(&args.weights, &args.input)?;
        print_report(&report);
    }
    Ok(())
}

fn cmd_dry_run(args: &FrameArgs) -> Result<()> {
    let mut driver = FrameDriver::new(RecordingBus::new(), &args.config()?)?;
    let report = driver.run_frame(&args.weights, &args.input)?;

    for event in driver.bus().events() {
        println!("{event}");
    }
    println!();
    print_report(&report);
    Ok(())
}

fn cmd_plan(dimension: usize, input: Option<Matrix>) -> Result<()> {
    let geometry = ArrayGeometry::new(dimension)?;

    println!("Weight traversal ({0}x{0})", geometry.dim());
    for (slot, (r, c)) in geometry.traversal().iter().enumerate() {
        println!("  weight[{slot}] <- W[{r}][{c}]");
    }
    println!();

    println!("Wavefront schedule");
    for step in geometry.schedule() {
        let lanes: Vec<String> = step
            .lanes
            .iter()
            .rev()
            .map(|l| l.map_or_else(|| "  -   ".to_string(), |(r, c)| format!("I[{r}][{c}]")))
            .collect();
        println!(
            "  stream[{}]  tag {}  lanes(2..0) {}",
            step.slot,
            step.tag,
            lanes.join(" ")
        );
    }

    let packer = StreamPacker::new(&geometry);
    let input = match input {
        Some(m) => Some(m),
        None if dimension == chip::DIMENSION => Some(Matrix::reference_input()),
        None => None,
    };
    if let Some(input) = input {
        println!();
        println!("Packed input {input}");
        for word in packer.pack(&input)? {
            println!("  stream[{}] = {:#010x}", word.slot, word.value);
        }
    }
    let terminal = packer.terminal_word();
    println!(
        "  stream[{}] = {:#010x}  (after readout drain)",
        terminal.slot, terminal.value
    );
    Ok(())
}

fn cmd_layout() {
    println!("{:<8}  {:>12}  {:>6}  protocol", "window", "base", "slots");
    println!("{:-<8}  {:->12}  {:->6}  {:-<24}", "", "", "", "");
    for window in Window::ALL {
        let protocol = match window {
            Window::Weight => format!("slots 0..{} written", chip::WEIGHT_WORDS),
            Window::Stream => format!(
                "slots 0..{} written, [{}] terminal",
                chip::STREAM_WORDS,
                chip::TERMINAL_SLOT
            ),
            Window::Readout => format!(
                "slots {}..{} read",
                chip::READOUT_FIRST_SLOT,
                chip::READOUT_FIRST_SLOT + chip::READOUT_WORDS
            ),
        };
        println!(
            "{:<8}  {:>#12x}  {:>6}  {protocol}",
            window.to_string(),
            window.base(),
            chip::WINDOW_SLOTS
        );
    }
    println!();
    println!(
        "Slot stride {} bytes; accelerator decodes {:#x} bytes from {:#x}",
        chip::SLOT_STRIDE,
        chip::ACCEL_SPAN,
        chip::ACCEL_BASE
    );
}

fn print_report(report: &FrameReport) {
    println!(
        "Frame {}: {} weight words, {} stream words, {} readout words ({:?})",
        report.frame,
        report.weight_words,
        report.stream_words,
        report.readout.len(),
        report.elapsed
    );
    for (i, chunk) in report.readout.chunks(5).enumerate() {
        let words: Vec<String> = chunk.iter().map(|w| format!("{w:#010x}")).collect();
        println!("  readout[{:>2}..] {}", i * 5, words.join(" "));
    }
}
