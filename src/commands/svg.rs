use sketchline::SketchResult;

use crate::cli::{GlobalOptions, SvgCommand};

use super::utils::{build_sketcher, derive_svg_path, prepare};

/// The main function to run the svg command.
pub fn run(global: &GlobalOptions, cmd: SvgCommand) -> SketchResult<()> {
    let sketcher = build_sketcher(global, &cmd.grid, &cmd.mask).with_stroke_style((&cmd.stroke).into());
    let prepared = prepare(&sketcher, &cmd.input, &cmd.mask)?;
    let output_path = cmd
        .output
        .clone()
        .unwrap_or_else(|| derive_svg_path(&cmd.input));

    let polyline = prepared.polyline()?;
    if polyline.is_empty() {
        eprintln!("Warning: no cell reached the ink threshold; the SVG has no path.");
    }
    let (width, height) = sketcher.target_size();
    sketchline::svg::write_svg(&output_path, &sketchline::svg::serialize(&polyline, width, height))?;
    println!(
        "SVG with {} points saved to {}",
        polyline.points().len(),
        output_path.display()
    );

    Ok(())
}
