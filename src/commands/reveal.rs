use sketchline::{PngSequenceSink, PointCategory, SketchResult};

use crate::cli::{GlobalOptions, RevealCommand};

use super::utils::{build_sketcher, derive_variant_path, prepare};

/// The main function to run the reveal command.
pub fn run(global: &GlobalOptions, cmd: RevealCommand) -> SketchResult<()> {
    let sketcher =
        build_sketcher(global, &cmd.grid, &cmd.mask).with_reveal_options((&cmd.reveal).into());
    let prepared = prepare(&sketcher, &cmd.input, &cmd.mask)?;

    let reveal = prepared.reveal()?;
    let plan = reveal.plan();
    println!(
        "Reveal plan: {} object and {} background points, {} drawing + {} hold frames ({:.2}s at {} fps)",
        plan.count(PointCategory::Object),
        plan.count(PointCategory::Background),
        plan.drawing_frames(),
        plan.hold_frames(),
        plan.duration(),
        plan.frame_rate()
    );
    if cmd.plan_only {
        return Ok(());
    }

    let output_dir = cmd
        .output
        .clone()
        .unwrap_or_else(|| derive_variant_path(&cmd.input, "frames"));
    let mut sink = PngSequenceSink::new(&output_dir)?;
    let frames = reveal.render(&mut sink)?;
    println!("{frames} frames saved to {}", sink.dir().display());

    Ok(())
}
