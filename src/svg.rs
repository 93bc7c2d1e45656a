//! Minimal SVG document serialization for a traced polyline.

use std::fmt::Write;
use std::fs;
use std::path::Path;

use crate::emit::PolylinePath;
use crate::{SketchError, SketchResult};

/// Escape the five XML special characters for use in attribute values.
fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Serialize `polyline` into an SVG document whose viewport is `width` x `height`.
///
/// An empty polyline produces a document with only the root element.
pub fn serialize(polyline: &PolylinePath, width: u32, height: u32) -> String {
    let mut out = String::new();
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let root = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}""#
    );

    let Some(d) = polyline.path_data() else {
        let _ = writeln!(out, "{root}/>");
        return out;
    };

    let style = polyline.style();
    let _ = writeln!(out, "{root}>");
    let _ = writeln!(
        out,
        r#"  <path d="{d}" stroke="{}" stroke-width="{}" fill="{}" stroke-linecap="round" stroke-linejoin="round"/>"#,
        xml_escape(&style.color),
        style.width,
        xml_escape(&style.fill),
    );
    let _ = writeln!(out, "</svg>");
    out
}

/// Write a serialized document to `path`, replacing any existing file.
pub fn write_svg(path: impl AsRef<Path>, document: &str) -> SketchResult<()> {
    let path = path.as_ref();
    fs::write(path, document).map_err(|source| SketchError::IoWrite {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = document.len(), "wrote svg");
    Ok(())
}
