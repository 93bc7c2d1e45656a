mod reveal;
mod split_lens;
mod svg;
mod utils;

use crate::cli::{Cli, Commands, GlobalOptions};
use sketchline::SketchResult;

/// The main function to run the command based on CLI input.
pub fn run(cli: Cli) -> SketchResult<()> {
    let Cli { global, command } = cli;
    dispatch(&global, command)
}

/// Dispatch the command to the appropriate handler.
fn dispatch(global: &GlobalOptions, command: Commands) -> SketchResult<()> {
    match command {
        Commands::Svg(cmd) => svg::run(global, cmd),
        Commands::Reveal(cmd) => reveal::run(global, cmd),
        Commands::SplitLens => split_lens::run(global),
    }
}
