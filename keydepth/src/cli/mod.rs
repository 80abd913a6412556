mod devices;
mod read;
mod watch;

use std::{thread, time::Duration};

use analog::{
    AnalogClient,
    ClientError,
    backend::{Backend, simulated::SimulatedBackend},
    device::DeviceId,
    keycode::KeycodeType,
    poll::Backoff,
};
use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use devices::DevicesCommand;
use log::{info, warn};
use owo_colors::OwoColorize;
use read::ReadCommand;
use watch::WatchCommand;

use crate::keys;

/// The longest pause between polls while devices are missing.
const MAX_POLL_DELAY: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    color: colorchoice_clap::Color,

    #[command(subcommand)]
    command: Commands,

    /// Output plain JSON without color and interactivity
    #[arg(short, long, global = true)]
    json: bool,

    /// Use a simulated keyboard instead of the installed analog SDK
    #[arg(long, global = true)]
    simulate: bool,

    /// The keycode type keys are given and printed in
    #[arg(long, global = true, default_value_t = KeycodeType::Hid)]
    mode: KeycodeType,

    /// Log more details, can be repeated
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    Devices(DevicesCommand),
    Read(ReadCommand),
    Watch(WatchCommand),
}

impl Cli {
    fn backend(&self) -> Result<Box<dyn Backend>> {
        if self.simulate {
            return Ok(Box::new(SimulatedBackend::demo()));
        }

        native_backend()
    }

    /// Creates a client with an open session and the requested keycode mode.
    fn open(&self) -> Result<AnalogClient<Box<dyn Backend>>> {
        let mut client = AnalogClient::new(self.backend()?);

        if let Ok(version) = client.backend_version() {
            info!("using analog SDK version {version}");
        }

        match client.initialize() {
            Ok(count) => info!("found {count} devices"),
            // Devices may still be connected later on.
            Err(err) if client.is_initialized() => warn!("{err}"),
            Err(err) => return Err(err).context("could not initialise the analog SDK"),
        }

        client
            .set_keycode_mode(self.mode)
            .with_context(|| format!("could not switch to {} mode", self.mode))?;

        Ok(client)
    }
}

#[cfg(feature = "native")]
fn native_backend() -> Result<Box<dyn Backend>> {
    let backend = analog::backend::native::NativeBackend::claim()
        .context("the analog SDK is already in use by this process")?;

    Ok(Box::new(backend))
}

#[cfg(not(feature = "native"))]
fn native_backend() -> Result<Box<dyn Backend>> {
    anyhow::bail!("built without the `native` feature, pass --simulate to use a simulated keyboard")
}

/// Options shared by the polling commands.
#[derive(Args)]
struct PollArgs {
    /// Only read from the device with this ID
    #[arg(short, long, value_parser = keys::parse_device_id)]
    device: Option<DeviceId>,

    /// Milliseconds between two polls
    #[arg(short, long, env = "KEYDEPTH_INTERVAL_MS", default_value_t = 50)]
    interval_ms: u64,

    /// Stop after this many polls
    #[arg(short = 'n', long)]
    count: Option<u64>,
}

impl PollArgs {
    /// Polls until the count is reached or a fatal error occurs.
    ///
    /// `show` is called for the first value and whenever it changes. Errors
    /// are reported once until the next successful poll.
    fn run<T: PartialEq>(
        &self,
        mut read: impl FnMut() -> Result<T, ClientError>,
        mut show: impl FnMut(&T) -> Result<()>,
    ) -> Result<()> {
        let mut backoff = Backoff::new(Duration::from_millis(self.interval_ms), MAX_POLL_DELAY);
        let mut last: Option<T> = None;
        let mut reported: Option<ClientError> = None;
        let mut polls = 0u64;

        loop {
            let result = read();
            let delay = backoff.next(&result);

            match result {
                Ok(value) => {
                    reported = None;
                    if last.as_ref() != Some(&value) {
                        show(&value)?;
                        last = Some(value);
                    }
                },
                Err(err) => {
                    if delay.is_none() {
                        return Err(err).context("stopped polling");
                    }
                    if reported != Some(err) {
                        anstream::eprintln!("{}: {err}", "error".red().bold());
                        reported = Some(err);
                    }
                },
            }

            polls += 1;
            if self.count.is_some_and(|count| polls >= count) {
                return Ok(());
            }
            if let Some(delay) = delay {
                thread::sleep(delay);
            }
        }
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

pub fn execute() -> Result<()> {
    let cli = Cli::parse();

    cli.color.write_global();
    init_logger(cli.verbose);

    match &cli.command {
        Commands::Devices(cmd) => cmd.execute(&cli),
        Commands::Read(cmd) => cmd.execute(&cli),
        Commands::Watch(cmd) => cmd.execute(&cli),
    }
}
