use sketchline::SketchError;
use sketchline::preprocess::{MAX_IMAGE_BYTES, SUPPORTED_EXTENSIONS};

pub fn report_error(err: &SketchError) {
    eprintln!("{err}");
    match err {
        SketchError::InvalidImage { .. } => {
            eprintln!();
            eprintln!(
                "Inputs must be {} files no larger than {} MiB.",
                SUPPORTED_EXTENSIONS.join("/"),
                MAX_IMAGE_BYTES / (1024 * 1024)
            );
        }
        SketchError::InvalidParameter { name: "split_len", .. } => {
            eprintln!();
            eprintln!("Run `sketchline split-lens` to list grid sizes that fit the working resolution.");
        }
        SketchError::InvalidParameter { name: "object_mask", .. } => {
            eprintln!();
            eprintln!("The mask is resized to --width x --height; check that it loaded correctly.");
        }
        _ => {}
    }
}
