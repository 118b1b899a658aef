//! Static SVG rendering of a flame layout

use std::fmt::Write as _;

use crate::analysis::{label_color, FlameLayout};

/// Bars narrower than this get no text label
pub const MIN_LABEL_WIDTH: f64 = 35.0;
/// Approximate glyph width used to fit labels
const CHAR_WIDTH: f64 = 7.0;

pub const EMPTY_FLAME_SVG: &str = "<!-- No data for flame graph -->";

#[must_use]
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Cut `text` to at most `max_chars` characters, ending in an ellipsis
#[must_use]
pub fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - 3).collect();
    out.push('…');
    out
}

/// Render `layout` as a standalone SVG document
///
/// `None` (no positive weight) renders as an XML comment.
// Label widths are small positive values
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn render_flame_svg(layout: Option<&FlameLayout>) -> String {
    let Some(layout) = layout else {
        return EMPTY_FLAME_SVG.to_string();
    };

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="100%" role="img" aria-label="Flame graph">"#,
        layout.width, layout.height
    );
    svg.push_str("<style>text{font:11px ui-sans-serif,system-ui,-apple-system,Segoe UI,Roboto} .fg-rect{stroke:#111;stroke-width:.5;}</style>");

    for (i, r) in layout.rects.iter().enumerate() {
        let name = escape_xml(&r.name);
        svg.push_str(r#"<g class="fg-item">"#);
        let _ = write!(
            svg,
            r#"<rect class="fg-rect" x="{:.2}" y="{}" width="{:.2}" height="{}" fill="{}"><title>{name} • {:.0}</title></rect>"#,
            r.x,
            r.y,
            r.w,
            r.h,
            label_color(&r.name),
            r.value
        );
        if r.w >= MIN_LABEL_WIDTH {
            let label = escape_xml(&shorten(&r.name, (r.w / CHAR_WIDTH) as usize));
            let _ = write!(
                svg,
                r#"<clipPath id="clip-{i}"><rect x="{:.2}" y="{}" width="{:.2}" height="{}"></rect></clipPath>"#,
                r.x + 2.0,
                r.y,
                (r.w - 4.0).max(0.0),
                r.h
            );
            let _ = write!(
                svg,
                r##"<text x="{:.2}" y="{}" fill="#000" clip-path="url(#clip-{i})">{label}</text>"##,
                r.x + 4.0,
                r.y + r.h - 5.0
            );
        }
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}
