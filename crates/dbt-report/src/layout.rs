//! Page layout for the paginated document.
//!
//! Single pass: split every line into paragraphs, wrap each to the body
//! width measured in Helvetica glyph widths, flow the wrapped lines down the
//! page at a fixed line height, start a new page at the bottom margin, then
//! give each image its own page. Page numbers are filled in once the page
//! count is known.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::fonts::Font;
use crate::image::{EmbeddedImage, decode_attachment};
use crate::model::ReportRequest;

// A4 in points.
pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN: f32 = 40.0;

pub const HEADER_HEIGHT: f32 = 60.0;
pub const FOOTER_Y: f32 = 30.0;

pub const BODY_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

pub const TITLE_FONT_SIZE: f32 = 16.0;
pub const SUBTITLE_FONT_SIZE: f32 = 9.0;
pub const FOOTER_FONT_SIZE: f32 = 9.0;
pub const BODY_FONT_SIZE: f32 = 11.0;
pub const LINE_HEIGHT: f32 = 16.0;
/// Baseline of the first body line.
pub const BODY_TOP: f32 = PAGE_HEIGHT - HEADER_HEIGHT - 30.0;
/// No body baseline goes below this.
pub const BODY_BOTTOM: f32 = 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderBand {
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub y: f32,
    pub text: String,
}

#[derive(Debug, Clone)]
pub enum ImageSlot {
    Embedded(EmbeddedImage),
    /// Written in place of an image that could not be decoded.
    Placeholder(String),
}

#[derive(Debug, Clone)]
pub enum PageBody {
    Text(Vec<PlacedLine>),
    Image { caption: String, slot: ImageSlot },
}

#[derive(Debug, Clone)]
pub struct Page {
    pub number: usize,
    pub total: usize,
    pub header: HeaderBand,
    pub body: PageBody,
}

impl Page {
    pub fn footer(&self) -> String {
        format!("Page {} of {}", self.number, self.total)
    }

    pub fn is_image_page(&self) -> bool {
        matches!(self.body, PageBody::Image { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub title: String,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn text_pages(&self) -> usize {
        self.pages.iter().filter(|p| !p.is_image_page()).count()
    }

    pub fn image_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.is_image_page()).count()
    }
}

/// Lay out a report. Always produces at least one text page.
pub fn lay_out(request: &ReportRequest, generated_at: DateTime<Utc>) -> Document {
    let header = HeaderBand {
        title: fit_to_width(&request.title, Font::Bold, TITLE_FONT_SIZE, BODY_WIDTH),
        subtitle: format!(
            "Generated on: {}",
            generated_at.format("%d %b %Y, %H:%M UTC")
        ),
    };

    let mut bodies: Vec<PageBody> = Vec::new();
    let mut current: Vec<PlacedLine> = Vec::new();
    let mut y = BODY_TOP;

    for line in &request.lines {
        let text = line.display();
        for paragraph in text.split('\n') {
            let paragraph = paragraph.trim_end_matches('\r');
            for wrapped in wrap_text(paragraph, Font::Regular, BODY_FONT_SIZE, BODY_WIDTH) {
                if y < BODY_BOTTOM {
                    bodies.push(PageBody::Text(std::mem::take(&mut current)));
                    y = BODY_TOP;
                }
                current.push(PlacedLine { y, text: wrapped });
                y -= LINE_HEIGHT;
            }
        }
    }
    bodies.push(PageBody::Text(current));

    for (index, attachment) in request.images.iter().enumerate() {
        let caption = fit_to_width(
            &format!("Photo {}: {}", index + 1, attachment.name),
            Font::Bold,
            BODY_FONT_SIZE,
            BODY_WIDTH,
        );
        let slot = match decode_attachment(&attachment.data) {
            Ok(image) => ImageSlot::Embedded(image),
            Err(e) => {
                warn!("Cannot embed photo {:?} in report {:?}: {}", attachment.name, request.title, e);
                ImageSlot::Placeholder(fit_to_width(
                    &format!("[{} could not be embedded: {}]", attachment.name, e),
                    Font::Regular,
                    BODY_FONT_SIZE,
                    BODY_WIDTH,
                ))
            }
        };
        bodies.push(PageBody::Image { caption, slot });
    }

    let total = bodies.len();
    let pages = bodies
        .into_iter()
        .enumerate()
        .map(|(i, body)| Page {
            number: i + 1,
            total,
            header: header.clone(),
            body,
        })
        .collect();

    Document {
        title: request.title.clone(),
        pages,
    }
}

/// Greedy word wrap on measured glyph widths. Words wider than a line are
/// split between characters. An empty input yields one empty line so blank
/// lines keep their space.
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let space = font.advance(' ', size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0;

    for word in text.split_whitespace() {
        let word_width = font.text_width(word, size);

        if word_width > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current_width = 0.0;
            for c in word.chars() {
                let advance = font.advance(c, size);
                if !current.is_empty() && current_width + advance > max_width {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0.0;
                }
                current.push(c);
                current_width += advance;
            }
            continue;
        }

        if !current.is_empty() && current_width + space + word_width > max_width {
            lines.push(std::mem::take(&mut current));
            current_width = 0.0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_width += space;
        }
        current.push_str(word);
        current_width += word_width;
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// `text` cut to fit `max_width`, ending in `...` when anything was dropped.
pub fn fit_to_width(text: &str, font: Font, size: f32, max_width: f32) -> String {
    if font.text_width(text, size) <= max_width {
        return text.to_string();
    }
    let budget = max_width - font.text_width("...", size);
    let mut out = String::new();
    let mut width = 0.0;
    for c in text.chars() {
        let advance = font.advance(c, size);
        if width + advance > budget {
            break;
        }
        out.push(c);
        width += advance;
    }
    out.push_str("...");
    out
}
