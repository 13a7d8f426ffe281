//! Turns attachment payloads into something the PDF writer can embed.
//!
//! Nothing is re-encoded. JPEG bytes go in as `DCTDecode`; PNG image data
//! is already a zlib stream with per-row filters, which PDF reads through
//! `FlateDecode` with the PNG predictor.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use thiserror::Error;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("image data is not valid base64")]
    Base64,

    #[error("image is neither JPEG nor PNG")]
    UnknownFormat,

    #[error("image data is truncated or corrupt")]
    Truncated,

    #[error("unsupported image: {0}")]
    Unsupported(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// RGB palette, three bytes per entry.
    Indexed(Vec<u8>),
}

impl ColorSpace {
    /// Color components per pixel as stored in the image data.
    pub fn components(&self) -> u8 {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed(_) => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    Jpeg,
    PngPredicted,
}

#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    pub color: ColorSpace,
    pub bits_per_component: u8,
    pub encoding: ImageEncoding,
    pub data: Vec<u8>,
}

/// Decode a base64 payload (optionally a `data:` URL) into an embeddable image.
pub fn decode_attachment(payload: &str) -> Result<EmbeddedImage, ImageError> {
    let encoded = match payload.trim().strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).ok_or(ImageError::Base64)?,
        None => payload.trim(),
    };
    let cleaned: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = B64.decode(cleaned.as_bytes()).map_err(|_| ImageError::Base64)?;
    decode_bytes(bytes)
}

pub fn decode_bytes(bytes: Vec<u8>) -> Result<EmbeddedImage, ImageError> {
    if bytes.starts_with(&[0xFF, 0xD8]) {
        parse_jpeg(bytes)
    } else if bytes.starts_with(&PNG_SIGNATURE) {
        parse_png(&bytes)
    } else {
        Err(ImageError::UnknownFormat)
    }
}

fn read_u16(bytes: &[u8], at: usize) -> Result<u16, ImageError> {
    bytes
        .get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or(ImageError::Truncated)
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32, ImageError> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(ImageError::Truncated)
}

/// Walk the marker segments until the first start-of-frame.
fn parse_jpeg(bytes: Vec<u8>) -> Result<EmbeddedImage, ImageError> {
    let mut i = 2;
    while i + 1 < bytes.len() {
        if bytes[i] != 0xFF {
            return Err(ImageError::Truncated);
        }
        let marker = bytes[i + 1];
        match marker {
            // fill byte
            0xFF => {
                i += 1;
                continue;
            }
            // standalone markers
            0x01 | 0xD0..=0xD8 => {
                i += 2;
                continue;
            }
            // end of image or scan data before any frame header
            0xD9 | 0xDA => break,
            _ => {}
        }

        let len = read_u16(&bytes, i + 2)? as usize;
        if len < 2 {
            return Err(ImageError::Truncated);
        }

        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            if len < 8 || i + 2 + len > bytes.len() {
                return Err(ImageError::Truncated);
            }
            let bits = bytes[i + 4];
            let height = read_u16(&bytes, i + 5)? as u32;
            let width = read_u16(&bytes, i + 7)? as u32;
            let color = match bytes[i + 9] {
                1 => ColorSpace::Gray,
                3 => ColorSpace::Rgb,
                4 => ColorSpace::Cmyk,
                _ => return Err(ImageError::Unsupported("JPEG component count")),
            };
            if width == 0 || height == 0 {
                return Err(ImageError::Unsupported("JPEG without dimensions"));
            }
            return Ok(EmbeddedImage {
                width,
                height,
                color,
                bits_per_component: bits,
                encoding: ImageEncoding::Jpeg,
                data: bytes,
            });
        }

        i += 2 + len;
    }
    Err(ImageError::Truncated)
}

fn parse_png(bytes: &[u8]) -> Result<EmbeddedImage, ImageError> {
    let mut i = PNG_SIGNATURE.len();
    let mut header: Option<(u32, u32, u8, u8)> = None;
    let mut palette: Option<Vec<u8>> = None;
    let mut idat = Vec::new();

    loop {
        let len = read_u32(bytes, i)? as usize;
        let kind = bytes.get(i + 4..i + 8).ok_or(ImageError::Truncated)?;
        let data = bytes.get(i + 8..i + 8 + len).ok_or(ImageError::Truncated)?;

        match kind {
            b"IHDR" => {
                if len != 13 {
                    return Err(ImageError::Truncated);
                }
                let width = read_u32(data, 0)?;
                let height = read_u32(data, 4)?;
                let (bit_depth, color_type, interlace) = (data[8], data[9], data[12]);
                if interlace != 0 {
                    return Err(ImageError::Unsupported("interlaced PNG"));
                }
                if bit_depth != 8 {
                    return Err(ImageError::Unsupported("PNG bit depth other than 8"));
                }
                if !matches!(color_type, 0 | 2 | 3) {
                    return Err(ImageError::Unsupported("PNG with alpha channel"));
                }
                header = Some((width, height, bit_depth, color_type));
            }
            b"PLTE" => palette = Some(data.to_vec()),
            b"IDAT" => idat.extend_from_slice(data),
            b"IEND" => break,
            _ => {}
        }

        // length + type + data + crc
        i += 12 + len;
    }

    let (width, height, bits, color_type) = header.ok_or(ImageError::Truncated)?;
    if idat.is_empty() || width == 0 || height == 0 {
        return Err(ImageError::Truncated);
    }
    let color = match color_type {
        0 => ColorSpace::Gray,
        2 => ColorSpace::Rgb,
        _ => ColorSpace::Indexed(palette.ok_or(ImageError::Truncated)?),
    };

    Ok(EmbeddedImage {
        width,
        height,
        color,
        bits_per_component: bits,
        encoding: ImageEncoding::PngPredicted,
        data: idat,
    })
}
