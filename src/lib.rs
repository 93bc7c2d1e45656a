pub mod config;
pub mod emit;
pub mod error;
pub mod frames;
pub mod grid;
pub mod mask;
pub mod preprocess;
pub mod svg;
pub mod tracer;
pub mod worker;

pub use config::{
    GridOptions, MaskRefinement, MaskScope, PreprocessOptions, RevealOptions, StrokeStyle,
};
pub use emit::{
    EmitMode, Emission, PathEmitter, PointCategory, PolylineEmitter, PolylinePath, RevealEmitter,
    RevealPlan, RevealStep, emit,
};
pub use error::{SketchError, SketchResult};
pub use frames::{FrameSink, PngSequenceSink, render_frames};
pub use grid::{Cell, default_split_len, segment, suggest_split_lens};
pub use mask::{ObjectMask, load_mask};
pub use preprocess::{BinarizedRaster, load_image, load_image_from_memory, preprocess};
pub use tracer::{NearestSearch, OrderedPath, Point, trace, trace_with};
pub use worker::{RequestId, SubmitError, TraceWorker};

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use image::imageops::FilterType;

/// Entry point for configuring and running the sketch pipeline.
#[derive(Debug, Clone, Default)]
pub struct Sketcher {
    preprocess: PreprocessOptions,
    grid: GridOptions,
    stroke: StrokeStyle,
    reveal: RevealOptions,
    mask_scope: MaskScope,
    search: NearestSearch,
}

impl Sketcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the working resolution every input is resized to.
    pub fn with_target_size(mut self, width: u32, height: u32) -> Self {
        self.preprocess = self.preprocess.with_target_size(width, height);
        self
    }

    /// Set the filter used to resize the input to the working resolution.
    pub fn with_resize_filter(mut self, filter: FilterType) -> Self {
        self.preprocess = self.preprocess.with_resize_filter(filter);
        self
    }

    /// Replace all preprocessing options at once.
    pub fn with_preprocess_options(mut self, options: PreprocessOptions) -> Self {
        self.preprocess = options;
        self
    }

    /// Set the grid cell edge length in pixels.
    pub fn with_split_len(mut self, split_len: u32) -> Self {
        self.grid.split_len = split_len;
        self
    }

    pub fn with_grid_options(mut self, options: GridOptions) -> Self {
        self.grid = options;
        self
    }

    pub fn with_stroke_style(mut self, style: StrokeStyle) -> Self {
        self.stroke = style;
        self
    }

    pub fn with_reveal_options(mut self, options: RevealOptions) -> Self {
        self.reveal = options;
        self
    }

    /// Choose what gets traced when an object mask is attached.
    pub fn with_mask_scope(mut self, scope: MaskScope) -> Self {
        self.mask_scope = scope;
        self
    }

    /// Choose the nearest-neighbor search used by the tracer.
    pub fn with_nearest_search(mut self, search: NearestSearch) -> Self {
        self.search = search;
        self
    }

    pub fn preprocess_options(&self) -> &PreprocessOptions {
        &self.preprocess
    }

    pub fn grid_options(&self) -> GridOptions {
        self.grid
    }

    /// Working resolution as `(width, height)`.
    pub fn target_size(&self) -> (u32, u32) {
        (self.preprocess.target_width, self.preprocess.target_height)
    }

    /// Load an image from disk and prepare it for tracing.
    pub fn for_image(&self, image_path: impl AsRef<Path>) -> SketchResult<PreparedImage> {
        let image = load_image(image_path)?;
        Ok(self.for_dynamic_image(image))
    }

    /// Prepare an already decoded image for tracing.
    pub fn for_dynamic_image(&self, image: DynamicImage) -> PreparedImage {
        PreparedImage {
            source: Arc::new(image),
            mask: None,
            settings: self.clone(),
        }
    }
}

/// A loaded image plus everything needed to derive its sketch outputs.
///
/// Every output method recomputes from the source, so the handle can be cloned and moved to
/// a [`TraceWorker`] freely.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    source: Arc<DynamicImage>,
    mask: Option<Arc<ObjectMask>>,
    settings: Sketcher,
}

/// Stroke raster and traced path computed together.
struct Traced {
    strokes: BinarizedRaster,
    path: OrderedPath,
}

impl PreparedImage {
    /// Attach an object mask sized to the working resolution.
    pub fn with_mask(mut self, mask: ObjectMask) -> Self {
        self.mask = Some(Arc::new(mask));
        self
    }

    pub fn source(&self) -> &DynamicImage {
        &self.source
    }

    pub fn mask(&self) -> Option<&ObjectMask> {
        self.mask.as_deref()
    }

    /// The binarized working raster before any mask is applied.
    pub fn binarized(&self) -> SketchResult<BinarizedRaster> {
        preprocess(&self.source, &self.settings.preprocess, None)
    }

    fn trace_cells(&self, cells: BTreeSet<Cell>) -> SketchResult<OrderedPath> {
        trace_with(cells, self.settings.grid.split_len, self.settings.search)
    }

    fn traced(&self) -> SketchResult<Traced> {
        let full = self.binarized()?;
        let grid = self.settings.grid;
        let Some(mask) = self.mask.as_deref() else {
            let path = self.trace_cells(segment(&full, grid)?)?;
            return Ok(Traced { strokes: full, path });
        };

        let object = mask.restrict(&full)?;
        let object_cells = segment(&object, grid)?;
        match self.settings.mask_scope {
            MaskScope::ObjectOnly => Ok(Traced {
                strokes: object,
                path: self.trace_cells(object_cells)?,
            }),
            MaskScope::ObjectThenBackground => {
                // a cell straddling the mask edge can pass in both passes; draw it once
                let background = mask.inverted().restrict(&full)?;
                let background_cells: BTreeSet<Cell> = segment(&background, grid)?
                    .difference(&object_cells)
                    .copied()
                    .collect();
                let object_path = self.trace_cells(object_cells)?;
                let background_path = self.trace_cells(background_cells)?;
                tracing::debug!(
                    object = object_path.len(),
                    background = background_path.len(),
                    "traced object then background"
                );
                Ok(Traced {
                    strokes: full,
                    path: object_path.chain(background_path),
                })
            }
        }
    }

    /// Trace the image into an ordered path.
    pub fn trace(&self) -> SketchResult<OrderedPath> {
        self.traced().map(|traced| traced.path)
    }

    /// Trace and emit a single polyline with the configured stroke style.
    pub fn polyline(&self) -> SketchResult<PolylinePath> {
        PolylineEmitter.emit(self.trace()?, &self.settings.stroke)
    }

    /// Trace and serialize to an SVG document at the working resolution.
    pub fn svg(&self) -> SketchResult<String> {
        let (width, height) = self.settings.target_size();
        Ok(svg::serialize(&self.polyline()?, width, height))
    }

    /// Trace, serialize, and write the SVG document to `path`.
    pub fn save_svg(&self, path: impl AsRef<Path>) -> SketchResult<()> {
        svg::write_svg(path, &self.svg()?)
    }

    /// Trace once and keep the reveal plan together with the strokes it draws.
    pub fn reveal(&self) -> SketchResult<PlannedReveal> {
        let Traced { strokes, path } = self.traced()?;
        let plan = RevealEmitter::new(self.mask.as_deref()).emit(path, &self.settings.reveal)?;
        Ok(PlannedReveal {
            plan,
            strokes,
            split_len: self.settings.grid.split_len,
        })
    }

    /// Trace and build the time-annotated reveal plan.
    pub fn reveal_plan(&self) -> SketchResult<RevealPlan> {
        self.reveal().map(PlannedReveal::into_plan)
    }

    /// Trace, plan, and render the reveal into `sink`. Returns the number of frames emitted.
    pub fn render_frames<S: FrameSink + ?Sized>(&self, sink: &mut S) -> SketchResult<u32> {
        self.reveal()?.render(sink)
    }
}

/// A reveal plan plus the binarized strokes its steps uncover.
#[derive(Debug, Clone)]
pub struct PlannedReveal {
    plan: RevealPlan,
    strokes: BinarizedRaster,
    split_len: u32,
}

impl PlannedReveal {
    pub fn plan(&self) -> &RevealPlan {
        &self.plan
    }

    pub fn strokes(&self) -> &BinarizedRaster {
        &self.strokes
    }

    pub fn into_plan(self) -> RevealPlan {
        self.plan
    }

    /// Render the plan into `sink`, holding the completed canvas at the end.
    pub fn render<S: FrameSink + ?Sized>(&self, sink: &mut S) -> SketchResult<u32> {
        render_frames(&self.plan, self.strokes.image(), None, self.split_len, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    /// 640x480 white canvas with a solid black 50x50 square centered at (320, 240).
    fn centered_square() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(640, 480, |x, y| {
            if (295..345).contains(&x) && (215..265).contains(&y) {
                Luma([0])
            } else {
                Luma([255])
            }
        }))
    }

    fn right_half_mask() -> ObjectMask {
        ObjectMask::from_fn(640, 480, |x, _| x >= 320)
    }

    mod unit {
        use super::*;

        #[test]
        fn blank_image_gives_empty_path_and_bare_svg() {
            let white = DynamicImage::ImageLuma8(GrayImage::from_pixel(640, 480, Luma([255])));
            let prepared = Sketcher::new().for_dynamic_image(white);

            assert!(prepared.trace().unwrap().is_empty());
            let doc = prepared.svg().unwrap();
            assert!(doc.contains("<svg"));
            assert!(!doc.contains("<path"));
        }

        #[test]
        fn square_traces_inside_its_cells() {
            let prepared = Sketcher::new().for_dynamic_image(centered_square());
            let path = prepared.trace().unwrap();

            assert!(!path.is_empty());
            for p in path.points() {
                assert!((290..350).contains(&p.x), "x out of range: {p:?}");
                assert!((210..270).contains(&p.y), "y out of range: {p:?}");
            }
        }

        #[test]
        fn tracing_is_deterministic() {
            let prepared = Sketcher::new().for_dynamic_image(centered_square());
            assert_eq!(prepared.trace().unwrap(), prepared.trace().unwrap());
            assert_eq!(prepared.svg().unwrap(), prepared.svg().unwrap());
        }

        #[test]
        fn search_strategies_agree() {
            let linear = Sketcher::new()
                .with_nearest_search(NearestSearch::Linear)
                .for_dynamic_image(centered_square());
            let bucketed = Sketcher::new()
                .with_nearest_search(NearestSearch::Bucketed)
                .for_dynamic_image(centered_square());
            assert_eq!(linear.trace().unwrap(), bucketed.trace().unwrap());
        }

        #[test]
        fn mask_excludes_left_half() {
            let prepared = Sketcher::new()
                .for_dynamic_image(centered_square())
                .with_mask(right_half_mask());
            let path = prepared.trace().unwrap();

            assert!(!path.is_empty());
            assert!(path.points().iter().all(|p| p.x >= 320));
        }

        #[test]
        fn object_then_background_covers_everything_object_first() {
            let unmasked = Sketcher::new()
                .for_dynamic_image(centered_square())
                .trace()
                .unwrap();
            let two_pass = Sketcher::new()
                .with_mask_scope(MaskScope::ObjectThenBackground)
                .for_dynamic_image(centered_square())
                .with_mask(right_half_mask())
                .trace()
                .unwrap();

            // the mask edge falls on a cell boundary, so no cell changes its ink count
            let mut expected = unmasked.points().to_vec();
            let mut actual = two_pass.points().to_vec();
            expected.sort_by_key(|p| (p.y, p.x));
            actual.sort_by_key(|p| (p.y, p.x));
            assert_eq!(actual, expected);

            let first_left = two_pass
                .points()
                .iter()
                .position(|p| p.x < 320)
                .expect("left half has ink");
            assert!(first_left > 0);
            assert!(two_pass.points()[first_left..].iter().all(|p| p.x < 320));
        }

        #[test]
        fn reveal_plan_marks_object_points() {
            let prepared = Sketcher::new()
                .with_mask_scope(MaskScope::ObjectThenBackground)
                .for_dynamic_image(centered_square())
                .with_mask(right_half_mask());
            let plan = prepared.reveal_plan().unwrap();

            assert!(plan.count(PointCategory::Object) > 0);
            assert!(plan.count(PointCategory::Background) > 0);
            for step in plan.steps() {
                let expected = if step.point.x >= 320 {
                    PointCategory::Object
                } else {
                    PointCategory::Background
                };
                assert_eq!(step.category, expected);
            }
        }

        #[test]
        fn cells_straddling_the_mask_edge_are_drawn_once() {
            // x >= 325 splits the cells at x 320..330 down the middle
            let mask = ObjectMask::from_fn(640, 480, |x, _| x >= 325);
            let prepared = Sketcher::new()
                .with_mask_scope(MaskScope::ObjectThenBackground)
                .for_dynamic_image(centered_square())
                .with_mask(mask);

            let path = prepared.trace().unwrap();
            let unique: std::collections::HashSet<Point> = path.points().iter().copied().collect();
            assert_eq!(unique.len(), path.len());

            let plan = prepared.reveal_plan().unwrap();
            assert_eq!(plan.steps().len(), path.len());
        }

        #[test]
        fn planned_reveal_renders_without_retracing() {
            let prepared = Sketcher::new().for_dynamic_image(centered_square());
            let reveal = prepared.reveal().unwrap();
            assert_eq!(reveal.strokes().dimensions(), (640, 480));

            let mut count = 0u32;
            let mut sink = |_: u32, _: &GrayImage| -> SketchResult<()> {
                count += 1;
                Ok(())
            };
            let emitted = reveal.render(&mut sink).unwrap();
            assert_eq!(emitted, reveal.plan().total_frames());
            assert_eq!(count, emitted);
            assert_eq!(reveal.into_plan(), prepared.reveal_plan().unwrap());
        }

        #[test]
        fn render_frames_emits_whole_plan() {
            let prepared = Sketcher::new().for_dynamic_image(centered_square());
            let plan = prepared.reveal_plan().unwrap();
            let mut count = 0u32;
            let mut sink = |_: u32, _: &GrayImage| -> SketchResult<()> {
                count += 1;
                Ok(())
            };
            let emitted = prepared.render_frames(&mut sink).unwrap();
            assert_eq!(emitted, plan.total_frames());
            assert_eq!(count, emitted);
        }

        #[test]
        fn invalid_split_len_is_reported() {
            let prepared = Sketcher::new()
                .with_split_len(0)
                .for_dynamic_image(centered_square());
            assert!(matches!(
                prepared.trace(),
                Err(SketchError::InvalidParameter { .. })
            ));
        }

        #[test]
        fn mismatched_mask_is_rejected() {
            let prepared = Sketcher::new()
                .for_dynamic_image(centered_square())
                .with_mask(ObjectMask::from_fn(10, 10, |_, _| true));
            assert!(matches!(
                prepared.trace(),
                Err(SketchError::InvalidParameter { .. })
            ));
        }

        #[test]
        fn for_image_reads_and_saves() {
            let dir = tempfile::tempdir().expect("failed to create temp dir");
            let input = dir.path().join("square.png");
            centered_square().save(&input).unwrap();
            let output = dir.path().join("square.svg");

            let prepared = Sketcher::new().for_image(&input).unwrap();
            prepared.save_svg(&output).unwrap();

            let written = std::fs::read_to_string(&output).unwrap();
            assert_eq!(written, prepared.svg().unwrap());
            assert!(written.contains("<path"));
        }

        #[test]
        fn worker_runs_prepared_image() {
            let prepared = Sketcher::new().for_dynamic_image(centered_square());
            let expected = prepared.svg().unwrap();

            let mut worker = TraceWorker::spawn();
            let job = prepared.clone();
            let id = worker.submit(move || job.svg()).unwrap();
            let (done, result) = worker.recv().expect("result");
            assert_eq!(done, id);
            assert_eq!(result.unwrap(), expected);
        }
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(16))]

            /// one point per selected cell, each visited once
            #[test]
            fn path_visits_each_selected_cell_once(
                x in 0u32..100,
                y in 0u32..60,
                size in 10u32..60,
            ) {
                let image = DynamicImage::ImageLuma8(GrayImage::from_fn(160, 120, |px, py| {
                    if (x..x + size).contains(&px) && (y..y + size).contains(&py) {
                        Luma([0])
                    } else {
                        Luma([255])
                    }
                }));
                let sketcher = Sketcher::new().with_target_size(160, 120);
                let prepared = sketcher.for_dynamic_image(image);
                let cells = segment(&prepared.binarized().unwrap(), sketcher.grid_options()).unwrap();
                let path = prepared.trace().unwrap();

                prop_assert_eq!(path.len(), cells.len());
                let mut seen = std::collections::HashSet::new();
                for p in path.points() {
                    prop_assert!(seen.insert(*p));
                }
            }
        }
    }
}
