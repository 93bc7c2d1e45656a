use std::fmt::Write;

use crate::config::StrokeStyle;
use crate::tracer::{OrderedPath, Point};
use crate::{SketchError, SketchResult};

use super::PathEmitter;

/// A single connected polyline with its stroke attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylinePath {
    points: Vec<Point>,
    style: StrokeStyle,
}

impl PolylinePath {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// SVG path data: a move to the first point, then a line to each following point.
    ///
    /// Returns `None` for an empty path.
    pub fn path_data(&self) -> Option<String> {
        let (first, rest) = self.points.split_first()?;
        let mut d = format!("M {},{}", first.x, first.y);
        for p in rest {
            let _ = write!(d, " L {},{}", p.x, p.y);
        }
        Some(d)
    }
}

/// Emits the whole ordered path as one polyline.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolylineEmitter;

impl PathEmitter for PolylineEmitter {
    type Options = StrokeStyle;
    type Output = PolylinePath;

    fn emit(&self, path: OrderedPath, options: &Self::Options) -> SketchResult<Self::Output> {
        if !(options.width.is_finite() && options.width > 0.0) {
            return Err(SketchError::invalid_parameter(
                "stroke_width",
                format!("must be positive, got {}", options.width),
            ));
        }
        Ok(PolylinePath {
            points: path.into_points(),
            style: options.clone(),
        })
    }
}
