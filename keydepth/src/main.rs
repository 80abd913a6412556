use anyhow::Result;

mod cli;
mod keys;

fn main() -> Result<()> {
    cli::execute()
}
