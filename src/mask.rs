use std::path::Path;

use image::imageops::FilterType;
use image::{GrayImage, Luma};
use imageproc::contrast::{ThresholdType, threshold as ip_threshold};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;

use crate::config::MaskRefinement;
use crate::preprocess::{BinarizedRaster, load_image};
use crate::{SketchError, SketchResult};

const FOREGROUND: u8 = 255;
const OUTSIDE: u8 = 0;

/// A boolean raster restricting tracing to a foreground region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMask {
    image: GrayImage,
}

impl ObjectMask {
    /// Build a mask from a grayscale matte: threshold it, then optionally grow the foreground.
    pub fn from_gray(gray: &GrayImage, refinement: &MaskRefinement) -> SketchResult<Self> {
        let (w, h) = gray.dimensions();
        if w == 0 || h == 0 {
            return Err(SketchError::invalid_image(format!(
                "object mask has zero dimension ({w}x{h})"
            )));
        }
        let mut image = threshold_mask(gray, refinement.threshold);
        if let Some(radius) = refinement.dilation_radius {
            image = dilate(&image, Norm::L2, radius);
        }
        Ok(Self { image })
    }

    /// Build a mask from a predicate returning `true` for foreground.
    pub fn from_fn(width: u32, height: u32, mut inside: impl FnMut(u32, u32) -> bool) -> Self {
        let image = GrayImage::from_fn(width, height, |x, y| {
            Luma([if inside(x, y) { FOREGROUND } else { OUTSIDE }])
        });
        Self { image }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Whether `(x, y)` lies in the foreground. Out-of-bounds positions are outside.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.image
            .get_pixel_checked(x, y)
            .is_some_and(|px| px[0] != OUTSIDE)
    }

    /// Number of foreground samples.
    pub fn foreground_count(&self) -> usize {
        self.image.pixels().filter(|px| px[0] != OUTSIDE).count()
    }

    /// The complementary mask, covering everything this one does not.
    pub fn inverted(&self) -> Self {
        let mut image = self.image.clone();
        for px in image.pixels_mut() {
            px[0] = if px[0] == OUTSIDE { FOREGROUND } else { OUTSIDE };
        }
        Self { image }
    }

    /// Resample to a new size with nearest-neighbor sampling, keeping the mask binary.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        Self {
            image: image::imageops::resize(&self.image, width, height, FilterType::Nearest),
        }
    }

    /// Return a copy of `raster` where every sample outside the mask is background.
    pub fn restrict(&self, raster: &BinarizedRaster) -> SketchResult<BinarizedRaster> {
        if self.dimensions() != raster.dimensions() {
            return Err(SketchError::invalid_parameter(
                "object_mask",
                format!(
                    "mask size {:?} does not match raster size {:?}",
                    self.dimensions(),
                    raster.dimensions()
                ),
            ));
        }
        let mut image = raster.image().clone();
        for (out_px, mask_px) in image.pixels_mut().zip(self.image.pixels()) {
            if mask_px[0] == OUTSIDE {
                *out_px = Luma([BinarizedRaster::BACKGROUND]);
            }
        }
        Ok(BinarizedRaster::from_binary_unchecked(image))
    }

    /// Get a reference to the mask image (255 inside, 0 outside).
    pub fn image(&self) -> &GrayImage {
        &self.image
    }
}

/// Threshold the grayscale image to produce a binary mask.
pub fn threshold_mask(gray: &GrayImage, thr: u8) -> GrayImage {
    ip_threshold(gray, thr, ThresholdType::Binary)
}

/// Load a mask image, refine it at its own resolution, then fit it to the working resolution.
pub fn load_mask(
    path: impl AsRef<Path>,
    refinement: &MaskRefinement,
    width: u32,
    height: u32,
) -> SketchResult<ObjectMask> {
    let gray = load_image(path)?.to_luma8();
    Ok(ObjectMask::from_gray(&gray, refinement)?.resized(width, height))
}
