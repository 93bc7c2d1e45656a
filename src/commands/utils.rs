use std::path::{Path, PathBuf};

use sketchline::{PreprocessOptions, PreparedImage, SketchResult, Sketcher, load_mask};

use crate::cli::{GlobalOptions, GridArgs, MaskArgs};

/// Build a Sketcher from the global options and the per-command grid and mask arguments.
pub fn build_sketcher(global: &GlobalOptions, grid: &GridArgs, mask: &MaskArgs) -> Sketcher {
    let preprocess: PreprocessOptions = global.into();
    Sketcher::new()
        .with_preprocess_options(preprocess)
        .with_grid_options(grid.into())
        .with_nearest_search(grid.search.into())
        .with_mask_scope(mask.scope.into())
}

/// Load the input image and attach the object mask, if one was given.
pub fn prepare(sketcher: &Sketcher, input: &Path, mask: &MaskArgs) -> SketchResult<PreparedImage> {
    let prepared = sketcher.for_image(input)?;
    let Some(mask_path) = &mask.mask else {
        return Ok(prepared);
    };
    let (width, height) = sketcher.target_size();
    let object = load_mask(mask_path, &mask.into(), width, height)?;
    Ok(prepared.with_mask(object))
}

/// Derive a sibling path by appending a suffix to the file stem, without an extension.
pub fn derive_variant_path(input: &Path, suffix: &str) -> PathBuf {
    let mut derived = input.to_path_buf();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| suffix.to_string());
    derived.set_file_name(format!("{stem}-{suffix}"));
    derived
}

/// Derive an SVG file path by changing the extension to "svg".
pub fn derive_svg_path(input: &Path) -> PathBuf {
    let mut path = input.to_path_buf();
    path.set_extension("svg");
    path
}
