use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use image::imageops::FilterType;
use sketchline::config::{
    DEFAULT_MIN_INK, DEFAULT_SPLIT_LEN, DEFAULT_TARGET_HEIGHT, DEFAULT_TARGET_WIDTH,
};
use sketchline::{
    GridOptions, MaskRefinement, MaskScope, NearestSearch, PreprocessOptions, RevealOptions,
    StrokeStyle,
};

/// Command line interface definition.
#[derive(Parser, Debug)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalOptions {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Working width every input is resized to
    #[arg(long, default_value_t = DEFAULT_TARGET_WIDTH, global = true)]
    pub width: u32,
    /// Working height every input is resized to
    #[arg(long, default_value_t = DEFAULT_TARGET_HEIGHT, global = true)]
    pub height: u32,
    /// Filter used when resizing the input to the working resolution
    #[arg(long = "resample-filter", value_enum, default_value_t = ResampleFilter::Triangle, global = true)]
    pub resample_filter: ResampleFilter,
    /// Neighborhood size for adaptive binarization (odd, at least 3)
    #[arg(long = "block-size", default_value_t = 15, global = true)]
    pub block_size: u32,
    /// Offset subtracted from the neighborhood mean before comparing
    #[arg(long, default_value_t = 10, allow_negative_numbers = true, global = true)]
    pub bias: i16,
}

impl From<&GlobalOptions> for PreprocessOptions {
    fn from(global: &GlobalOptions) -> Self {
        PreprocessOptions::default()
            .with_target_size(global.width, global.height)
            .with_resize_filter(global.resample_filter.into())
            .with_adaptive_threshold(global.block_size, global.bias)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Trace an image into a single-path SVG line drawing
    Svg(SvgCommand),
    /// Render a progressive reveal of the sketch as a PNG frame sequence
    Reveal(RevealCommand),
    /// List grid sizes that evenly divide the working resolution
    SplitLens,
}

/// Resampling filters for image resizing.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(value: ResampleFilter) -> Self {
        match value {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Nearest-neighbor search strategy.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SearchArg {
    Linear,
    Bucketed,
}

impl From<SearchArg> for NearestSearch {
    fn from(value: SearchArg) -> Self {
        match value {
            SearchArg::Linear => NearestSearch::Linear,
            SearchArg::Bucketed => NearestSearch::Bucketed,
        }
    }
}

/// What to trace when an object mask is given.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MaskScopeArg {
    /// Only the masked object
    Object,
    /// The masked object first, then everything else
    ObjectThenBackground,
}

impl From<MaskScopeArg> for MaskScope {
    fn from(value: MaskScopeArg) -> Self {
        match value {
            MaskScopeArg::Object => MaskScope::ObjectOnly,
            MaskScopeArg::ObjectThenBackground => MaskScope::ObjectThenBackground,
        }
    }
}

#[derive(Args, Debug)]
pub struct SvgCommand {
    /// Input image path
    pub input: PathBuf,
    /// Output SVG path (defaults to input name with `.svg`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub grid: GridArgs,
    #[command(flatten)]
    pub mask: MaskArgs,
    #[command(flatten)]
    pub stroke: StrokeArgs,
}

#[derive(Args, Debug)]
pub struct RevealCommand {
    /// Input image path
    pub input: PathBuf,
    /// Directory for the frame sequence (defaults to `<name>-frames`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Only print the plan summary without rendering frames
    #[arg(long = "plan-only")]
    pub plan_only: bool,
    #[command(flatten)]
    pub grid: GridArgs,
    #[command(flatten)]
    pub mask: MaskArgs,
    #[command(flatten)]
    pub reveal: RevealArgs,
}

#[derive(Args, Debug)]
pub struct GridArgs {
    /// Grid cell edge length in pixels
    #[arg(long = "split-len", default_value_t = DEFAULT_SPLIT_LEN)]
    pub split_len: u32,
    /// A cell is selected when it holds more than this many ink pixels
    #[arg(long = "min-ink", default_value_t = DEFAULT_MIN_INK)]
    pub min_ink: u32,
    /// Nearest-neighbor search used when ordering cells
    #[arg(long, value_enum, default_value_t = SearchArg::Bucketed)]
    pub search: SearchArg,
}

impl From<&GridArgs> for GridOptions {
    fn from(args: &GridArgs) -> Self {
        GridOptions::new(args.split_len).with_min_ink(args.min_ink)
    }
}

#[derive(Args, Debug)]
pub struct MaskArgs {
    /// Grayscale object mask; bright pixels mark the object
    #[arg(long = "mask", value_name = "PATH")]
    pub mask: Option<PathBuf>,
    /// Threshold applied to the mask image (0-255)
    #[arg(long = "mask-threshold", default_value_t = 120)]
    pub mask_threshold: u8,
    /// Grow the mask by this radius in pixels
    #[arg(long = "mask-dilate", value_name = "RADIUS")]
    pub mask_dilate: Option<u8>,
    /// What to trace when a mask is given
    #[arg(long = "mask-scope", value_enum, default_value_t = MaskScopeArg::Object)]
    pub scope: MaskScopeArg,
}

impl From<&MaskArgs> for MaskRefinement {
    fn from(args: &MaskArgs) -> Self {
        Self {
            threshold: args.mask_threshold,
            dilation_radius: args.mask_dilate,
        }
    }
}

#[derive(Args, Debug)]
pub struct StrokeArgs {
    /// Stroke color
    #[arg(long = "stroke-color", default_value = "#000000")]
    pub stroke_color: String,
    /// Stroke width
    #[arg(long = "stroke-width", default_value_t = 2.0)]
    pub stroke_width: f32,
    /// Fill value for the path
    #[arg(long, default_value = "none")]
    pub fill: String,
}

impl From<&StrokeArgs> for StrokeStyle {
    fn from(args: &StrokeArgs) -> Self {
        StrokeStyle::default()
            .with_color(args.stroke_color.clone())
            .with_width(args.stroke_width)
            .with_fill(args.fill.clone())
    }
}

#[derive(Args, Debug)]
pub struct RevealArgs {
    /// Frames per second
    #[arg(long = "frame-rate", default_value_t = 25.0)]
    pub frame_rate: f64,
    /// Object points drawn per frame
    #[arg(long = "obj-skip-rate", default_value_t = 8)]
    pub obj_skip_rate: u32,
    /// Background points drawn per frame
    #[arg(long = "bck-skip-rate", default_value_t = 14)]
    pub bck_skip_rate: u32,
    /// Seconds the finished drawing is held at the end
    #[arg(long = "hold", default_value_t = 2.0)]
    pub main_img_duration: f64,
}

impl From<&RevealArgs> for RevealOptions {
    fn from(args: &RevealArgs) -> Self {
        RevealOptions::default()
            .with_frame_rate(args.frame_rate)
            .with_skip_rates(args.obj_skip_rate, args.bck_skip_rate)
            .with_main_img_duration(args.main_img_duration)
    }
}
