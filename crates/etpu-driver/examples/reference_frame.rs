//! Reference frame on the recording bus
//!
//! Runs the fixed 3x3 frame without hardware and prints the access trace,
//! then the stream window as the accelerator would see it.

use etpu_driver::chip::Window;
use etpu_driver::{FrameDriver, RecordingBus, Result};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("etpu_driver=debug")
        .init();

    let mut driver = FrameDriver::reference(RecordingBus::new());
    let report = driver.run_reference_frame()?;

    for event in driver.bus().events() {
        println!("{event}");
    }

    println!("\nStream window after frame {}:", report.frame);
    for slot in 0..driver.packer().word_count() {
        let value = driver.bus().peek(Window::Stream.addr(slot));
        println!("  stream[{slot}] = {value:#010x}");
    }

    Ok(())
}
