use crate::config::{RevealOptions, StrokeStyle};
use crate::mask::ObjectMask;
use crate::tracer::OrderedPath;
use crate::SketchResult;

pub mod polyline;
pub mod reveal;

pub use polyline::{PolylineEmitter, PolylinePath};
pub use reveal::{PointCategory, RevealEmitter, RevealPlan, RevealStep};

/// A back-end that turns an ordered path into a drawable representation.
pub trait PathEmitter {
    type Options;
    type Output;

    fn emit(&self, path: OrderedPath, options: &Self::Options) -> SketchResult<Self::Output>;
}

/// Output mode selector for [`emit`].
#[derive(Debug, Clone)]
pub enum EmitMode<'a> {
    /// One polyline through every point.
    Vector(StrokeStyle),
    /// A time-sliced reveal, with points inside `mask` drawn at the object rate.
    RasterReveal {
        options: RevealOptions,
        mask: Option<&'a ObjectMask>,
    },
}

/// Result of [`emit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    Vector(PolylinePath),
    Reveal(RevealPlan),
}

/// Consume an ordered path and produce the output for `mode`.
pub fn emit(path: OrderedPath, mode: &EmitMode<'_>) -> SketchResult<Emission> {
    match mode {
        EmitMode::Vector(style) => PolylineEmitter.emit(path, style).map(Emission::Vector),
        EmitMode::RasterReveal { options, mask } => RevealEmitter::new(*mask)
            .emit(path, options)
            .map(Emission::Reveal),
    }
}
