use std::io::{BufWriter, Write};

use analog::{
    FullBuffer,
    device::{DeviceEvent, DeviceEventKind},
    keycode::KeycodeType,
};
use anyhow::Result;
use clap::Args;
use itertools::Itertools;
use log::warn;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

use super::{Cli, PollArgs};
use crate::keys;

/// Poll all actuated keys.
#[derive(Args)]
pub struct WatchCommand {
    /// The maximum amount of keys read at once
    #[arg(short, long, default_value_t = 20)]
    max_keys: usize,

    #[command(flatten)]
    poll: PollArgs,
}

#[derive(Serialize)]
struct KeyReading {
    code: u16,
    name: Option<&'static str>,
    value: f32,
}

fn readings(buffer: &FullBuffer, mode: KeycodeType) -> Vec<KeyReading> {
    buffer
        .sorted()
        .into_iter()
        .map(|(code, value)| KeyReading {
            code,
            name: keys::key_name(code, mode),
            value,
        })
        .collect()
}

fn write_event(stdout: &mut impl Write, event: &DeviceEvent, json: bool) -> Result<()> {
    if json {
        writeln!(stdout, "{}", json!({ "event": event }))?;
        return Ok(());
    }

    let marker = match event.kind {
        DeviceEventKind::Connected => "●".green().into_styled(),
        DeviceEventKind::Disconnected => "●".red().into_styled(),
    };
    writeln!(
        stdout,
        "{} {} {:?}",
        marker,
        event.device.device_name,
        event.kind.bright_black()
    )?;

    Ok(())
}

impl WatchCommand {
    pub fn execute(&self, root: &Cli) -> Result<()> {
        let mut stdout = BufWriter::new(anstream::stdout());

        let mut client = root.open()?;
        let events = client.device_events()?;

        self.poll.run(
            || {
                let buffer = client.read_full_buffer_device(self.max_keys, self.poll.device);

                // Connection changes are printed as soon as the next poll
                // returns.
                for event in events.try_iter() {
                    if let Err(err) = write_event(&mut anstream::stdout(), &event, root.json) {
                        warn!("could not print device event: {err}");
                    }
                }

                buffer
            },
            |buffer| {
                let readings = readings(buffer, root.mode);

                if root.json {
                    writeln!(stdout, "{}", json!(readings))?;
                } else if readings.is_empty() {
                    writeln!(stdout, "{}", "No keys are pressed.".bright_black())?;
                } else {
                    let line = readings
                        .iter()
                        .map(|reading| {
                            format!(
                                "{}: {:.3}",
                                reading.name.map_or_else(
                                    || format!("{:#06x}", reading.code),
                                    str::to_owned
                                ),
                                reading.value.green()
                            )
                        })
                        .join("  ");
                    writeln!(stdout, "{line}")?;
                }

                stdout.flush()?;
                Ok(())
            },
        )
    }
}
