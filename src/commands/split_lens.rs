use sketchline::{SketchResult, default_split_len, suggest_split_lens};

use crate::cli::GlobalOptions;

/// The main function to run the split-lens command.
pub fn run(global: &GlobalOptions) -> SketchResult<()> {
    let options = suggest_split_lens(global.width, global.height);
    let default = default_split_len(&options);
    let listed: Vec<String> = options
        .iter()
        .map(|len| {
            if *len == default {
                format!("{len} (default)")
            } else {
                len.to_string()
            }
        })
        .collect();
    println!(
        "Split lengths for {}x{}: {}",
        global.width,
        global.height,
        listed.join(", ")
    );
    Ok(())
}
