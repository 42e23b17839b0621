//! Per-character SVG images, with a synthesized placeholder when none exists.

use db::DataLayout;
use tracing::{debug, warn};
use utils::hanja_id::single_char;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub svg: String,
    pub placeholder: bool,
}

pub struct GlyphService {
    layout: DataLayout,
}

impl GlyphService {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    /// Serves `<public>/images/hanja/<c>.svg` when `hanja` is a single
    /// alphanumeric character with an image; anything else gets the
    /// placeholder.
    pub async fn glyph(&self, hanja: &str) -> Glyph {
        if let Some(c) = single_char(hanja).filter(|c| c.is_alphanumeric()) {
            let path = self.layout.glyph_svg(c);
            match tokio::fs::read_to_string(&path).await {
                Ok(svg) => {
                    return Glyph {
                        svg,
                        placeholder: false,
                    };
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(hanja = %c, "no glyph image, using placeholder");
                }
                Err(e) => warn!(hanja = %c, error = %e, "unreadable glyph image"),
            }
        }
        Glyph {
            svg: placeholder_svg(hanja),
            placeholder: true,
        }
    }
}

pub fn placeholder_svg(text: &str) -> String {
    format!(
        concat!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">"##,
            r##"<rect width="100" height="100" fill="#f5f5f5" stroke="#ccc" stroke-width="2"/>"##,
            r##"<text x="50%" y="50%" font-family="Arial, sans-serif" font-size="36" font-weight="bold" "##,
            r##"text-anchor="middle" dominant-baseline="middle" fill="#333">{}</text>"##,
            "</svg>"
        ),
        xml_escape(text)
    )
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
