use clap::{Parser, Subcommand};

use self::{play::PlayArg, scenarios::ScenariosArg, train::TrainArg};

mod play;
mod scenarios;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve a fuzzy pilot with the genetic algorithm
    Train(#[clap(flatten)] TrainArg),
    /// Fly a trained pilot through scenarios and print its scores
    Play(#[clap(flatten)] PlayArg),
    /// List the available scenarios
    Scenarios(#[clap(flatten)] ScenariosArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Play(arg) => play::run(&arg)?,
        Mode::Scenarios(arg) => scenarios::run(&arg)?,
    }
    Ok(())
}
