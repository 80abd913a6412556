use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use clap::Args;
use owo_colors::OwoColorize;
use serde_json::json;

use super::Cli;

/// List the connected analog devices.
#[derive(Args)]
pub struct DevicesCommand {
    /// The maximum amount of devices to list
    #[arg(short, long, default_value_t = 5)]
    max: usize,
}

impl DevicesCommand {
    pub fn execute(&self, root: &Cli) -> Result<()> {
        let mut stdout = BufWriter::new(anstream::stdout());

        let client = root.open()?;
        let devices = client
            .get_connected_devices_info(self.max)
            .context("could not enumerate devices")?;

        if root.json {
            writeln!(stdout, "{}", json!(devices))?;
            return Ok(());
        }

        if devices.is_empty() {
            writeln!(stdout, "{}", "No analog devices were found.".bright_black())?;
            return Ok(());
        }

        for (i, device) in devices.into_iter().enumerate() {
            if i != 0 {
                writeln!(stdout)?;
            }

            writeln!(
                stdout,
                "{}: {} ({:#06x}:{:#06x})",
                device.device_id.bright_black(),
                device.device_name,
                device.vendor_id.bright_black(),
                device.product_id.bright_black()
            )?;
            writeln!(
                stdout,
                " ├─ MANUFACTURER: {}",
                device.manufacturer_name.bright_black()
            )?;
            writeln!(stdout, " ╰─ TYPE: {:?}", device.device_type.green())?;
        }

        stdout.flush()?;

        Ok(())
    }
}
