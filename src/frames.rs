//! Drive a [`RevealPlan`] into a sequence of raster frames.

use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};

use crate::emit::RevealPlan;
use crate::error::ensure_positive;
use crate::{SketchError, SketchResult};

/// Receives rendered frames in order.
pub trait FrameSink {
    fn frame(&mut self, index: u32, frame: &GrayImage) -> SketchResult<()>;
}

impl<F> FrameSink for F
where
    F: FnMut(u32, &GrayImage) -> SketchResult<()>,
{
    fn frame(&mut self, index: u32, frame: &GrayImage) -> SketchResult<()> {
        self(index, frame)
    }
}

/// Writes every frame as `frame_00000.png`, `frame_00001.png`, ... into a directory.
#[derive(Debug, Clone)]
pub struct PngSequenceSink {
    dir: PathBuf,
    written: u32,
}

impl PngSequenceSink {
    /// Create the sink, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> SketchResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| SketchError::IoWrite {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir, written: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of frames written so far.
    pub fn written(&self) -> u32 {
        self.written
    }

    pub fn frame_path(&self, index: u32) -> PathBuf {
        self.dir.join(format!("frame_{index:05}.png"))
    }
}

impl FrameSink for PngSequenceSink {
    fn frame(&mut self, index: u32, frame: &GrayImage) -> SketchResult<()> {
        let path = self.frame_path(index);
        frame
            .save(&path)
            .map_err(|err| SketchError::write_failed(&path, err))?;
        self.written += 1;
        Ok(())
    }
}

/// Copy the cell containing `(x, y)` from `strokes` onto `canvas`, clipped to the image.
fn reveal_cell(canvas: &mut GrayImage, strokes: &GrayImage, x: u32, y: u32, split_len: u32) {
    let x0 = (x / split_len) * split_len;
    let y0 = (y / split_len) * split_len;
    let x1 = (x0 + split_len).min(canvas.width());
    let y1 = (y0 + split_len).min(canvas.height());
    for py in y0..y1 {
        for px in x0..x1 {
            canvas.put_pixel(px, py, *strokes.get_pixel(px, py));
        }
    }
}

/// Render `plan` frame by frame.
///
/// Cells of `strokes` are copied onto a white canvas in plan order. Each drawing frame is
/// handed to `sink` once all of its steps are painted; the hold frames then show `finished`,
/// or the completed canvas when `finished` is `None`. Returns the number of frames emitted,
/// which equals [`RevealPlan::total_frames`].
#[tracing::instrument(skip_all, fields(steps = plan.steps().len(), total = plan.total_frames()))]
pub fn render_frames<S: FrameSink + ?Sized>(
    plan: &RevealPlan,
    strokes: &GrayImage,
    finished: Option<&GrayImage>,
    split_len: u32,
    sink: &mut S,
) -> SketchResult<u32> {
    let split_len = ensure_positive("split_len", split_len)?;
    if let Some(finished) = finished
        && finished.dimensions() != strokes.dimensions()
    {
        return Err(SketchError::invalid_parameter(
            "finished",
            format!(
                "finished image size {:?} does not match stroke image size {:?}",
                finished.dimensions(),
                strokes.dimensions()
            ),
        ));
    }

    let (w, h) = strokes.dimensions();
    let mut canvas = GrayImage::from_pixel(w, h, Luma([255]));
    let mut emitted = 0u32;

    for step in plan.steps() {
        while emitted < step.frame {
            sink.frame(emitted, &canvas)?;
            emitted += 1;
        }
        reveal_cell(&mut canvas, strokes, step.point.x, step.point.y, split_len);
    }
    while emitted < plan.drawing_frames() {
        sink.frame(emitted, &canvas)?;
        emitted += 1;
    }

    let last = finished.unwrap_or(&canvas);
    for _ in 0..plan.hold_frames() {
        sink.frame(emitted, last)?;
        emitted += 1;
    }
    tracing::debug!(frames = emitted, "rendered reveal");
    Ok(emitted)
}
