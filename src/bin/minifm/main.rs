//! minifm - terminal front end for the FM engine
//!
//! Run with: cargo run -- [--headless]

mod app;
mod ui;

use clap::Parser;

/// Play the FM engine from the keyboard, or run a logged demo phrase.
#[derive(Parser, Debug)]
#[command(name = "minifm", version, about)]
pub struct Args {
    /// Skip the TUI: play a demo across the bank and log every event
    #[arg(long)]
    headless: bool,

    /// Length of the headless demo in seconds
    #[arg(long, default_value_t = 12.0)]
    seconds: f32,

    /// Starting instrument (0-11)
    #[arg(long, default_value_t = 0)]
    instrument: u8,

    /// Global volume in percent
    #[arg(long, default_value_t = 70)]
    volume: u8,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
        app::run_headless(&args)
    } else {
        app::run_tui(&args)
    }
}
