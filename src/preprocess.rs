use std::fs;
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageReader, Luma};
use imageproc::filter::gaussian_blur_f32;

use crate::config::PreprocessOptions;
use crate::error::ensure_positive;
use crate::mask::ObjectMask;
use crate::{SketchError, SketchResult};

/// File extensions accepted by [`load_image`].
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];
/// Largest source file accepted by [`load_image`].
pub const MAX_IMAGE_BYTES: u64 = 50 * 1024 * 1024;

/// A single-channel raster whose samples are either [`BinarizedRaster::INK`] or
/// [`BinarizedRaster::BACKGROUND`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarizedRaster {
    image: GrayImage,
}

impl BinarizedRaster {
    pub const INK: u8 = 0;
    pub const BACKGROUND: u8 = 255;

    /// Wrap an already binary image, rejecting empty images and intermediate gray values.
    pub fn from_gray(image: GrayImage) -> SketchResult<Self> {
        ensure_non_empty(image.width(), image.height())?;
        if let Some((x, y, px)) = image
            .enumerate_pixels()
            .find(|(_, _, px)| px[0] != Self::INK && px[0] != Self::BACKGROUND)
        {
            return Err(SketchError::invalid_image(format!(
                "sample {} at ({x}, {y}) is neither ink nor background",
                px[0]
            )));
        }
        Ok(Self { image })
    }

    /// Build a raster from a predicate returning `true` for ink.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut is_ink: impl FnMut(u32, u32) -> bool,
    ) -> SketchResult<Self> {
        ensure_non_empty(width, height)?;
        let image = GrayImage::from_fn(width, height, |x, y| {
            Luma([if is_ink(x, y) {
                Self::INK
            } else {
                Self::BACKGROUND
            }])
        });
        Ok(Self { image })
    }

    /// An all-background raster.
    pub fn blank(width: u32, height: u32) -> SketchResult<Self> {
        Self::from_fn(width, height, |_, _| false)
    }

    pub(crate) fn from_binary_unchecked(image: GrayImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Whether the sample at `(x, y)` is ink. Out-of-bounds samples count as background.
    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        self.image
            .get_pixel_checked(x, y)
            .is_some_and(|px| px[0] == Self::INK)
    }

    /// Total number of ink samples.
    pub fn ink_count(&self) -> usize {
        self.image.pixels().filter(|px| px[0] == Self::INK).count()
    }

    /// Get a reference to the underlying image.
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Consume the raster and return the underlying image.
    pub fn into_image(self) -> GrayImage {
        self.image
    }
}

fn ensure_non_empty(width: u32, height: u32) -> SketchResult<()> {
    if width == 0 || height == 0 {
        return Err(SketchError::invalid_image(format!(
            "image has zero dimension ({width}x{height})"
        )));
    }
    Ok(())
}

/// Load and decode an image file after checking its type and size.
pub fn load_image(path: impl AsRef<Path>) -> SketchResult<DynamicImage> {
    let path = path.as_ref();
    let metadata = fs::metadata(path).map_err(|err| {
        SketchError::invalid_image(format!("cannot access {}: {err}", path.display()))
    })?;
    if !metadata.is_file() {
        return Err(SketchError::invalid_image(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(SketchError::invalid_image(format!(
            "unsupported file type `.{extension}` (expected one of {})",
            SUPPORTED_EXTENSIONS.join(", ")
        )));
    }

    if metadata.len() > MAX_IMAGE_BYTES {
        return Err(SketchError::invalid_image(format!(
            "{} is {} bytes, the limit is {MAX_IMAGE_BYTES}",
            path.display(),
            metadata.len()
        )));
    }

    let image = ImageReader::open(path)
        .map_err(|err| SketchError::invalid_image(format!("cannot open {}: {err}", path.display())))?
        .with_guessed_format()
        .map_err(|err| SketchError::invalid_image(format!("cannot read {}: {err}", path.display())))?
        .decode()
        .map_err(|err| SketchError::invalid_image(format!("cannot decode {}: {err}", path.display())))?;
    ensure_non_empty(image.width(), image.height())?;
    tracing::debug!(path = %path.display(), width = image.width(), height = image.height(), "loaded image");
    Ok(image)
}

/// Decode an image held in memory.
pub fn load_image_from_memory(bytes: &[u8]) -> SketchResult<DynamicImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|err| SketchError::invalid_image(format!("cannot decode buffer: {err}")))?;
    ensure_non_empty(image.width(), image.height())?;
    Ok(image)
}

/// Resize, convert to intensity, binarize, and optionally restrict to an object mask.
///
/// The mask is applied after thresholding so that only pixels outside the mask change.
#[tracing::instrument(skip_all, fields(width = options.target_width, height = options.target_height))]
pub fn preprocess(
    image: &DynamicImage,
    options: &PreprocessOptions,
    mask: Option<&ObjectMask>,
) -> SketchResult<BinarizedRaster> {
    ensure_non_empty(image.width(), image.height())?;
    let width = ensure_positive("target_width", options.target_width)?;
    let height = ensure_positive("target_height", options.target_height)?;
    validate_threshold(options.block_size, options.bias)?;
    if let Some(mask) = mask
        && mask.dimensions() != (width, height)
    {
        return Err(SketchError::invalid_parameter(
            "object_mask",
            format!(
                "mask size {:?} does not match working size {:?}",
                mask.dimensions(),
                (width, height)
            ),
        ));
    }

    let resized = image
        .resize_exact(width, height, options.resize_filter)
        .to_luma8();
    let binarized = adaptive_threshold(&resized, options.block_size, options.bias)?;
    tracing::debug!(ink = binarized.ink_count(), "binarized working image");

    match mask {
        Some(mask) => mask.restrict(&binarized),
        None => Ok(binarized),
    }
}

fn validate_threshold(block_size: u32, bias: i16) -> SketchResult<()> {
    if block_size < 3 || block_size % 2 == 0 {
        return Err(SketchError::invalid_parameter(
            "block_size",
            format!("must be odd and at least 3, got {block_size}"),
        ));
    }
    if !(-255..=255).contains(&bias) {
        return Err(SketchError::invalid_parameter(
            "bias",
            format!("must be within -255..=255, got {bias}"),
        ));
    }
    Ok(())
}

/// Gaussian sigma matching a square kernel of `block_size` taps.
fn block_sigma(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Locally thresholded binarization: a sample stays background when it is brighter than the
/// Gaussian-weighted mean of its neighborhood minus `bias`, otherwise it becomes ink.
pub fn adaptive_threshold(gray: &GrayImage, block_size: u32, bias: i16) -> SketchResult<BinarizedRaster> {
    ensure_non_empty(gray.width(), gray.height())?;
    validate_threshold(block_size, bias)?;

    let local_mean = gaussian_blur_f32(gray, block_sigma(block_size));
    let mut out = GrayImage::new(gray.width(), gray.height());
    for ((out_px, src_px), mean_px) in out.pixels_mut().zip(gray.pixels()).zip(local_mean.pixels()) {
        let cutoff = i16::from(mean_px[0]) - bias;
        let value = if i16::from(src_px[0]) > cutoff {
            BinarizedRaster::BACKGROUND
        } else {
            BinarizedRaster::INK
        };
        *out_px = Luma([value]);
    }
    Ok(BinarizedRaster::from_binary_unchecked(out))
}
