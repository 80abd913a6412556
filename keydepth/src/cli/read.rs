use std::io::{BufWriter, Write};

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;
use serde_json::json;

use super::{Cli, PollArgs};
use crate::keys;

/// The width of the depth bar at full actuation.
const BAR_WIDTH: usize = 20;

/// Poll the analog value of a single key.
#[derive(Args)]
pub struct ReadCommand {
    /// The key, either a HID key name like `A` or a keycode like `0x04`
    key: String,

    #[command(flatten)]
    poll: PollArgs,
}

fn bar(value: f32) -> String {
    let filled = (value.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize;
    format!("{}{}", "█".repeat(filled), "·".repeat(BAR_WIDTH - filled))
}

impl ReadCommand {
    pub fn execute(&self, root: &Cli) -> Result<()> {
        let mut stdout = BufWriter::new(anstream::stdout());

        let code = keys::parse_key(&self.key, root.mode)?;
        let name = keys::key_name(code, root.mode);
        let client = root.open()?;

        self.poll.run(
            || client.read_analog(code, self.poll.device),
            |&value| {
                if root.json {
                    writeln!(stdout, "{}", json!({ "code": code, "name": name, "value": value }))?;
                } else {
                    writeln!(
                        stdout,
                        "{} ({:#06x}): {} {:.3}",
                        name.unwrap_or("?").bright_blue(),
                        code.bright_black(),
                        bar(value).green(),
                        value
                    )?;
                }

                stdout.flush()?;
                Ok(())
            },
        )
    }
}
