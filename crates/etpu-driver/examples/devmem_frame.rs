//! Reference frame on real hardware
//!
//! Maps the accelerator windows through `/dev/mem` (root required) and
//! runs one frame with weight readback enabled.

use etpu_driver::{DevMemBus, DriverConfig, FrameDriver, Result, DEV_MEM};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("etpu_driver=info")
        .init();

    let bus = DevMemBus::open(DEV_MEM)?;
    println!("Mapped accelerator through {}", bus.path().display());

    let config = DriverConfig::new().with_verify_weights(true);
    let mut driver = FrameDriver::new(bus, &config)?;
    let report = driver.run_reference_frame()?;

    println!(
        "Frame {} done in {:?}, {} readout words:",
        report.frame,
        report.elapsed,
        report.readout.len()
    );
    for (slot, word) in report.readout.iter().enumerate() {
        println!("  readout[{}] = {word:#010x}", slot + 5);
    }

    Ok(())
}
