use crate::config::RevealOptions;
use crate::error::ensure_positive;
use crate::mask::ObjectMask;
use crate::tracer::{OrderedPath, Point};
use crate::{SketchError, SketchResult};

use super::PathEmitter;

/// Whether a point belongs to the masked object or to the rest of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointCategory {
    Object,
    Background,
}

/// One point of the reveal, with the frame in which it first appears.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealStep {
    pub point: Point,
    pub category: PointCategory,
    /// Zero-based frame index.
    pub frame: u32,
    /// Seconds from the start of the sequence until the point is visible.
    pub delay: f64,
}

/// A time-annotated drawing order for progressive raster rendering.
///
/// Frame `k` shows every step whose `frame` is at most `k`. After the last drawing frame
/// the completed image is held for `hold_frames` frames.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealPlan {
    steps: Vec<RevealStep>,
    frame_rate: f64,
    drawing_frames: u32,
    hold_frames: u32,
}

impl RevealPlan {
    pub fn steps(&self) -> &[RevealStep] {
        &self.steps
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Frames spent drawing, before the hold.
    pub fn drawing_frames(&self) -> u32 {
        self.drawing_frames
    }

    /// Frames showing the completed image.
    pub fn hold_frames(&self) -> u32 {
        self.hold_frames
    }

    pub fn total_frames(&self) -> u32 {
        self.drawing_frames + self.hold_frames
    }

    /// Length of the whole sequence in seconds.
    pub fn duration(&self) -> f64 {
        f64::from(self.total_frames()) / self.frame_rate
    }

    /// Number of steps in `category`.
    pub fn count(&self, category: PointCategory) -> usize {
        self.steps.iter().filter(|s| s.category == category).count()
    }
}

/// Emits a [`RevealPlan`], drawing points inside the optional mask at the object rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RevealEmitter<'a> {
    mask: Option<&'a ObjectMask>,
}

impl<'a> RevealEmitter<'a> {
    pub fn new(mask: Option<&'a ObjectMask>) -> Self {
        Self { mask }
    }

    fn categorize(&self, point: Point) -> PointCategory {
        match self.mask {
            Some(mask) if mask.contains(point.x, point.y) => PointCategory::Object,
            _ => PointCategory::Background,
        }
    }
}

impl PathEmitter for RevealEmitter<'_> {
    type Options = RevealOptions;
    type Output = RevealPlan;

    fn emit(&self, path: OrderedPath, options: &Self::Options) -> SketchResult<Self::Output> {
        let frame_rate = ensure_positive("frame_rate", options.frame_rate)?;
        let obj_rate = u64::from(ensure_positive("obj_skip_rate", options.obj_skip_rate)?);
        let bck_rate = u64::from(ensure_positive("bck_skip_rate", options.bck_skip_rate)?);
        let hold_secs = ensure_positive("main_img_duration", options.main_img_duration)?;
        for (name, value) in [("frame_rate", frame_rate), ("main_img_duration", hold_secs)] {
            if !value.is_finite() {
                return Err(SketchError::invalid_parameter(name, "must be finite"));
            }
        }

        // Progress is object_drawn / obj_rate + background_drawn / bck_rate frames, kept as an
        // exact fraction over obj_rate * bck_rate.
        let denominator = obj_rate * bck_rate;
        let mut numerator: u64 = 0;
        let mut steps = Vec::with_capacity(path.len());
        for point in path.into_points() {
            let category = self.categorize(point);
            let frame = u32::try_from(numerator / denominator).unwrap_or(u32::MAX);
            steps.push(RevealStep {
                point,
                category,
                frame,
                delay: f64::from(frame) / frame_rate,
            });
            numerator += match category {
                PointCategory::Object => bck_rate,
                PointCategory::Background => obj_rate,
            };
        }

        let drawing_frames = steps.last().map_or(0, |s| s.frame.saturating_add(1));
        let hold_frames = (hold_secs * frame_rate).round().max(1.0) as u32;
        tracing::debug!(
            steps = steps.len(),
            drawing_frames,
            hold_frames,
            "planned reveal"
        );
        Ok(RevealPlan {
            steps,
            frame_rate,
            drawing_frames,
            hold_frames,
        })
    }
}
