//! LSB (least-significant-bit) image hiding.
//!
//! The secret text is substitution-encoded, then its bytes are spread one
//! bit per RGB channel across the carrier's pixels, preceded by a 4-byte
//! little-endian length header. Alpha channels are left untouched. Only
//! lossless output (PNG) preserves the payload.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};
use thiserror::Error;

use crate::crypto::vigenere;

/// Bits hidden per pixel: one in each of R, G, B.
const BITS_PER_PIXEL: usize = 3;

/// Length header size in bytes.
const HEADER_SIZE: usize = 4;

/// Errors that can occur during image hiding.
#[derive(Error, Debug)]
pub enum StegoError {
    /// Secret does not fit the carrier. Reported before any pixel is
    /// written.
    #[error("Secret too large for carrier: need {needed} bytes, capacity is {capacity}")]
    CapacityExceeded { needed: usize, capacity: usize },

    /// Carrier could not be decoded as an image.
    #[error("Carrier image error: {0}")]
    InvalidCarrier(String),

    /// Output image could not be encoded.
    #[error("Image encode error: {0}")]
    EncodeFailed(String),

    /// No hidden payload found in the image.
    #[error("No hidden message found in image")]
    NoHiddenText,

    /// Extracted payload is not valid UTF-8 text.
    #[error("Hidden payload is not text")]
    NotText,
}

/// Embeddable capacity of a carrier, in payload bytes.
fn capacity(image: &RgbaImage) -> usize {
    let total_bits = (image.width() as usize) * (image.height() as usize) * BITS_PER_PIXEL;
    (total_bits / 8).saturating_sub(HEADER_SIZE)
}

/// Channel value for a flat bit index: bit `i` lives in channel `i % 3` of
/// pixel `i / 3`, scanning rows left to right.
fn channel_at(image: &RgbaImage, bit_index: usize) -> (u32, u32, usize) {
    let pixel_index = (bit_index / BITS_PER_PIXEL) as u32;
    let channel = bit_index % BITS_PER_PIXEL;
    let x = pixel_index % image.width();
    let y = pixel_index / image.width();
    (x, y, channel)
}

fn embed(image: &mut RgbaImage, data: &[u8]) {
    for (byte_idx, byte) in data.iter().enumerate() {
        for bit_offset in 0..8 {
            let bit = (byte >> bit_offset) & 1;
            let (x, y, channel) = channel_at(image, byte_idx * 8 + bit_offset);
            let pixel = image.get_pixel_mut(x, y);
            pixel.0[channel] = (pixel.0[channel] & 0xFE) | bit;
        }
    }
}

fn extract(image: &RgbaImage, start_byte: usize, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    for (byte_idx, byte) in out.iter_mut().enumerate() {
        for bit_offset in 0..8 {
            let (x, y, channel) = channel_at(image, (start_byte + byte_idx) * 8 + bit_offset);
            let bit = image.get_pixel(x, y).0[channel] & 1;
            *byte |= bit << bit_offset;
        }
    }
    out
}

/// Hides `secret_text` in the carrier image, returning PNG bytes.
///
/// The text is substitution-encoded with `key` before embedding. Fails with
/// [`StegoError::CapacityExceeded`] before touching any pixel when the
/// encoded payload does not fit.
pub fn hide(carrier_image: &[u8], secret_text: &str, key: &str) -> Result<Vec<u8>, StegoError> {
    let carrier = image::load_from_memory(carrier_image)
        .map_err(|e| StegoError::InvalidCarrier(e.to_string()))?;
    let mut pixels = carrier.to_rgba8();

    let encoded = vigenere::encode(secret_text, key);
    let payload = encoded.as_bytes();

    let capacity = capacity(&pixels);
    if payload.len() > capacity {
        return Err(StegoError::CapacityExceeded {
            needed: payload.len(),
            capacity,
        });
    }

    let mut framed = Vec::with_capacity(HEADER_SIZE + payload.len());
    framed.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    framed.extend_from_slice(payload);
    embed(&mut pixels, &framed);

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(pixels)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| StegoError::EncodeFailed(e.to_string()))?;

    Ok(png)
}

/// Extracts and decodes the text hidden by [`hide`].
pub fn reveal(image_bytes: &[u8], key: &str) -> Result<String, StegoError> {
    let image = image::load_from_memory(image_bytes)
        .map_err(|e| StegoError::InvalidCarrier(e.to_string()))?;
    let pixels = image.to_rgba8();

    let total_bytes =
        (pixels.width() as usize) * (pixels.height() as usize) * BITS_PER_PIXEL / 8;
    if total_bytes < HEADER_SIZE {
        return Err(StegoError::NoHiddenText);
    }

    let header = extract(&pixels, 0, HEADER_SIZE);
    let payload_len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;

    // A length beyond capacity means there is no framed payload here.
    if payload_len == 0 || payload_len > capacity(&pixels) {
        return Err(StegoError::NoHiddenText);
    }

    let payload = extract(&pixels, HEADER_SIZE, payload_len);
    let encoded = String::from_utf8(payload).map_err(|_| StegoError::NotText)?;

    Ok(vigenere::decode(&encoded, key))
}
