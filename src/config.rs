use image::imageops::FilterType;

/// Default working resolution.
pub const DEFAULT_TARGET_WIDTH: u32 = 640;
pub const DEFAULT_TARGET_HEIGHT: u32 = 480;
pub const DEFAULT_SPLIT_LEN: u32 = 10;
pub const DEFAULT_MIN_INK: u32 = 10;

/// Options for resizing and binarizing the source image.
#[derive(Debug, Clone)]
pub struct PreprocessOptions {
    /// Working width in pixels.
    pub target_width: u32,
    /// Working height in pixels.
    pub target_height: u32,
    /// Filter used to resize the source to the working resolution.
    pub resize_filter: FilterType,
    /// Neighborhood edge length for the adaptive threshold. Must be odd and at least 3.
    pub block_size: u32,
    /// Constant subtracted from the local weighted mean.
    pub bias: i16,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            target_width: DEFAULT_TARGET_WIDTH,
            target_height: DEFAULT_TARGET_HEIGHT,
            resize_filter: FilterType::Triangle,
            block_size: 15,
            bias: 10,
        }
    }
}

impl PreprocessOptions {
    /// Set the working resolution.
    pub fn with_target_size(mut self, width: u32, height: u32) -> Self {
        self.target_width = width;
        self.target_height = height;
        self
    }

    /// Set the resize filter.
    pub fn with_resize_filter(mut self, filter: FilterType) -> Self {
        self.resize_filter = filter;
        self
    }

    /// Set the adaptive threshold neighborhood and bias.
    pub fn with_adaptive_threshold(mut self, block_size: u32, bias: i16) -> Self {
        self.block_size = block_size;
        self.bias = bias;
        self
    }
}

/// Options for quantizing the binarized raster into cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridOptions {
    /// Cell edge length in pixels.
    pub split_len: u32,
    /// A cell is selected when its ink count is strictly greater than this.
    pub min_ink: u32,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            split_len: DEFAULT_SPLIT_LEN,
            min_ink: DEFAULT_MIN_INK,
        }
    }
}

impl GridOptions {
    pub fn new(split_len: u32) -> Self {
        Self {
            split_len,
            ..Self::default()
        }
    }

    pub fn with_min_ink(mut self, min_ink: u32) -> Self {
        self.min_ink = min_ink;
        self
    }
}

/// Stroke attributes of the emitted polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub color: String,
    pub width: f32,
    pub fill: String,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            width: 2.0,
            fill: "none".to_string(),
        }
    }
}

impl StrokeStyle {
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = fill.into();
        self
    }
}

/// Timing of the progressive raster reveal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealOptions {
    /// Frames per second of the rendered sequence.
    pub frame_rate: f64,
    /// Object points drawn per frame.
    pub obj_skip_rate: u32,
    /// Background points drawn per frame.
    pub bck_skip_rate: u32,
    /// Seconds the finished image stays on screen.
    pub main_img_duration: f64,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self {
            frame_rate: 25.0,
            obj_skip_rate: 8,
            bck_skip_rate: 14,
            main_img_duration: 2.0,
        }
    }
}

impl RevealOptions {
    pub fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_skip_rates(mut self, obj_skip_rate: u32, bck_skip_rate: u32) -> Self {
        self.obj_skip_rate = obj_skip_rate;
        self.bck_skip_rate = bck_skip_rate;
        self
    }

    pub fn with_main_img_duration(mut self, seconds: f64) -> Self {
        self.main_img_duration = seconds;
        self
    }
}

/// How an object mask is turned into a binary restriction before tracing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskRefinement {
    /// Mask samples strictly above this value count as foreground.
    pub threshold: u8,
    /// Grow the foreground by this Euclidean radius, in pixels.
    pub dilation_radius: Option<u8>,
}

impl Default for MaskRefinement {
    fn default() -> Self {
        Self {
            threshold: 120,
            dilation_radius: None,
        }
    }
}

/// Which parts of the image get traced when an object mask is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskScope {
    /// Only ink inside the mask is traced.
    #[default]
    ObjectOnly,
    /// Ink inside the mask is traced first, then the rest of the image.
    ObjectThenBackground,
}
