//! Minimal PDF 1.4 writer for laid-out [`Document`]s.
//!
//! Helvetica text, a filled header band, and image XObjects passed through
//! in their original compression. Objects are numbered up front and written
//! in order; the cross-reference table is built from recorded offsets.

use std::fmt::Write as _;

use crate::fonts::Font;
use crate::image::{ColorSpace, EmbeddedImage, ImageEncoding};
use crate::layout::{
    BODY_BOTTOM, BODY_FONT_SIZE, BODY_TOP, Document, FOOTER_FONT_SIZE, FOOTER_Y, HEADER_HEIGHT,
    ImageSlot, MARGIN, PAGE_HEIGHT, PAGE_WIDTH, PageBody, SUBTITLE_FONT_SIZE, TITLE_FONT_SIZE,
};

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const FONT_REGULAR_ID: usize = 3;
const FONT_BOLD_ID: usize = 4;
const FIRST_PAGE_ID: usize = 5;

/// Header band color (navy).
const BAND_RGB: &str = "0 0.129 0.278";

struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new(object_count: usize) -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: vec![0; object_count + 1],
        }
    }

    fn object(&mut self, id: usize, body: &str) {
        self.offsets[id] = self.buf.len();
        self.buf
            .extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", id, body).as_bytes());
    }

    fn stream(&mut self, id: usize, dict: &str, data: &[u8]) {
        self.offsets[id] = self.buf.len();
        self.buf.extend_from_slice(
            format!("{} 0 obj\n<< {} /Length {} >>\nstream\n", id, dict, data.len()).as_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_at = self.buf.len();
        let count = self.offsets.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", count);
        for offset in &self.offsets[1..] {
            let _ = write!(xref, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            count, CATALOG_ID, xref_at
        );
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}

/// Object ids for one page: the page, its content stream, and an optional image.
struct PageIds {
    page: usize,
    content: usize,
    image: Option<usize>,
}

pub fn render(doc: &Document) -> Vec<u8> {
    let mut next_id = FIRST_PAGE_ID;
    let ids: Vec<PageIds> = doc
        .pages
        .iter()
        .map(|page| {
            let has_image = matches!(
                page.body,
                PageBody::Image {
                    slot: ImageSlot::Embedded(_),
                    ..
                }
            );
            let page_ids = PageIds {
                page: next_id,
                content: next_id + 1,
                image: has_image.then_some(next_id + 2),
            };
            next_id += if has_image { 3 } else { 2 };
            page_ids
        })
        .collect();

    let mut pdf = PdfWriter::new(next_id - 1);

    pdf.object(
        CATALOG_ID,
        &format!("<< /Type /Catalog /Pages {} 0 R >>", PAGES_ID),
    );
    let kids: Vec<String> = ids.iter().map(|i| format!("{} 0 R", i.page)).collect();
    pdf.object(
        PAGES_ID,
        &format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            ids.len()
        ),
    );
    pdf.object(
        FONT_REGULAR_ID,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );
    pdf.object(
        FONT_BOLD_ID,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
    );

    for (page, page_ids) in doc.pages.iter().zip(&ids) {
        let mut content = String::new();
        draw_header(&mut content, &page.header.title, &page.header.subtitle);

        match &page.body {
            PageBody::Text(lines) => {
                for line in lines {
                    draw_text(
                        &mut content,
                        Font::Regular,
                        BODY_FONT_SIZE,
                        "0 0 0",
                        MARGIN,
                        line.y,
                        &line.text,
                    );
                }
            }
            PageBody::Image { caption, slot } => {
                draw_text(&mut content, Font::Bold, BODY_FONT_SIZE, "0 0 0", MARGIN, BODY_TOP, caption);
                match slot {
                    ImageSlot::Embedded(image) => draw_image(&mut content, image),
                    ImageSlot::Placeholder(text) => draw_text(
                        &mut content,
                        Font::Regular,
                        BODY_FONT_SIZE,
                        "0.6 0 0",
                        MARGIN,
                        BODY_TOP - 2.0 * BODY_FONT_SIZE,
                        text,
                    ),
                }
            }
        }

        let footer = page.footer();
        let footer_x = (PAGE_WIDTH - Font::Regular.text_width(&footer, FOOTER_FONT_SIZE)) / 2.0;
        draw_text(
            &mut content,
            Font::Regular,
            FOOTER_FONT_SIZE,
            "0.4 0.4 0.4",
            footer_x,
            FOOTER_Y,
            &footer,
        );

        let xobjects = match page_ids.image {
            Some(id) => format!(" /XObject << /Im1 {} 0 R >>", id),
            None => String::new(),
        };
        pdf.object(
            page_ids.page,
            &format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 {} 0 R /F2 {} 0 R >>{} >> /Contents {} 0 R >>",
                PAGES_ID,
                fmt_num(PAGE_WIDTH),
                fmt_num(PAGE_HEIGHT),
                FONT_REGULAR_ID,
                FONT_BOLD_ID,
                xobjects,
                page_ids.content
            ),
        );
        pdf.stream(page_ids.content, "", content.as_bytes());

        if let (
            Some(id),
            PageBody::Image {
                slot: ImageSlot::Embedded(image),
                ..
            },
        ) = (page_ids.image, &page.body)
        {
            pdf.stream(id, &image_dict(image), &image.data);
        }
    }

    pdf.finish()
}

fn draw_header(out: &mut String, title: &str, subtitle: &str) {
    let band_y = PAGE_HEIGHT - HEADER_HEIGHT;
    let _ = writeln!(
        out,
        "q {} rg 0 {} {} {} re f Q",
        BAND_RGB,
        fmt_num(band_y),
        fmt_num(PAGE_WIDTH),
        fmt_num(HEADER_HEIGHT)
    );
    draw_text(out, Font::Bold, TITLE_FONT_SIZE, "1 1 1", MARGIN, PAGE_HEIGHT - 28.0, title);
    draw_text(
        out,
        Font::Regular,
        SUBTITLE_FONT_SIZE,
        "1 1 1",
        MARGIN,
        PAGE_HEIGHT - 46.0,
        subtitle,
    );
}

fn draw_text(out: &mut String, font: Font, size: f32, rgb: &str, x: f32, y: f32, text: &str) {
    let _ = writeln!(
        out,
        "BT /{} {} Tf {} rg {} {} Td ({}) Tj ET",
        font.resource(),
        fmt_num(size),
        rgb,
        fmt_num(x),
        fmt_num(y),
        escape_text(text)
    );
}

/// Scale the image into the body box below the caption, keeping its aspect.
fn draw_image(out: &mut String, image: &EmbeddedImage) {
    let box_width = PAGE_WIDTH - 2.0 * MARGIN;
    let box_top = BODY_TOP - 2.0 * BODY_FONT_SIZE;
    let box_height = box_top - BODY_BOTTOM;

    let (w, h) = (image.width as f32, image.height as f32);
    let scale = (box_width / w).min(box_height / h);
    let (draw_w, draw_h) = (w * scale, h * scale);
    let x = MARGIN + (box_width - draw_w) / 2.0;
    let y = box_top - draw_h;

    let _ = writeln!(
        out,
        "q {} 0 0 {} {} {} cm /Im1 Do Q",
        fmt_num(draw_w),
        fmt_num(draw_h),
        fmt_num(x),
        fmt_num(y)
    );
}

fn image_dict(image: &EmbeddedImage) -> String {
    let color_space = match &image.color {
        ColorSpace::Gray => "/DeviceGray".to_string(),
        ColorSpace::Rgb => "/DeviceRGB".to_string(),
        ColorSpace::Cmyk => "/DeviceCMYK".to_string(),
        ColorSpace::Indexed(palette) => {
            let hex: String = palette.iter().map(|b| format!("{:02X}", b)).collect();
            format!("[/Indexed /DeviceRGB {} <{}>]", (palette.len() / 3).max(1) - 1, hex)
        }
    };
    let filter = match image.encoding {
        ImageEncoding::Jpeg => "/Filter /DCTDecode".to_string(),
        ImageEncoding::PngPredicted => format!(
            "/Filter /FlateDecode /DecodeParms << /Predictor 15 /Colors {} /BitsPerComponent {} /Columns {} >>",
            image.color.components(),
            image.bits_per_component,
            image.width
        ),
    };
    format!(
        "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent {} {}",
        image.width, image.height, color_space, image.bits_per_component, filter
    )
}

/// PDF string literal body. Latin-1 goes out as octal escapes (WinAnsi
/// agrees with Latin-1 there); anything else becomes `?`.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            ' '..='~' => out.push(c),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            '\u{2022}' => out.push_str("\\225"),
            _ => out.push('?'),
        }
    }
    out
}

fn fmt_num(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}
