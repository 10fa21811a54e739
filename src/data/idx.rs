//! Readers for the IDX binary files MNIST ships its test set in.
//!
//! # IDX3 image file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x03        (number of dimensions = 3)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (image height in pixels, big-endian u32)
//! bytes 12-15:  cols        (image width in pixels, big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # IDX1 label file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x01        (number of dimensions = 1)
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a class index in [0, NCLASSES)
//! ```

use std::{fs::File, io::Read};

use log::debug;

use crate::error::{EvalErr, Result};
use crate::{MNIST_HW, NCLASSES, NINPUT};

const IMAGE_HEADER_LEN: usize = 16;
const LABEL_HEADER_LEN: usize = 8;

/// Reads the first `count` images of the IDX3 file at `path` into `out`,
/// `NINPUT` pixels per image scaled from [0, 255] to [0.0, 1.0].
///
/// Fails if the file is malformed, holds fewer than `count` images, or `out`
/// is too small.
pub fn load_images(path: &str, out: &mut [f64], count: usize) -> Result<()> {
    let bytes = std::fs::read(path).map_err(|e| EvalErr::dataset(path, e.to_string()))?;
    parse_images(&bytes, out, count).map_err(|reason| EvalErr::dataset(path, reason))?;
    debug!("loaded {count} images from {path}");
    Ok(())
}

/// Reads the first `count` labels of the IDX1 file at `path` into `out` as
/// one-hot rows of `NCLASSES` values.
pub fn load_labels(path: &str, out: &mut [f64], count: usize) -> Result<()> {
    let bytes = std::fs::read(path).map_err(|e| EvalErr::dataset(path, e.to_string()))?;
    parse_labels(&bytes, out, count).map_err(|reason| EvalErr::dataset(path, reason))?;
    debug!("loaded {count} labels from {path}");
    Ok(())
}

/// Number of images the IDX3 file at `path` holds, read from its header and
/// capped by the file length. Reads only the header.
pub fn image_count(path: &str) -> Result<usize> {
    available(path, 0x03, IMAGE_HEADER_LEN, NINPUT, "image")
}

/// Number of labels the IDX1 file at `path` holds. Reads only the header.
pub fn label_count(path: &str) -> Result<usize> {
    available(path, 0x01, LABEL_HEADER_LEN, 1, "label")
}

fn available(path: &str, dims: u8, header_len: usize, item_len: usize, kind: &str) -> Result<usize> {
    let mut file = File::open(path).map_err(|e| EvalErr::dataset(path, e.to_string()))?;
    let file_len = file.metadata().map_err(|e| EvalErr::dataset(path, e.to_string()))?.len();

    let mut header = vec![0u8; header_len];
    file.read_exact(&mut header).map_err(|e| {
        EvalErr::dataset(path, format!("IDX {kind} file too short for its {header_len} byte header: {e}"))
    })?;
    let declared = check_header(&header, dims, header_len, kind).map_err(|reason| EvalErr::dataset(path, reason))?;

    let stored = file_len.saturating_sub(header_len as u64) / item_len as u64;
    Ok(declared.min(usize::try_from(stored).unwrap_or(usize::MAX)))
}

fn parse_images(bytes: &[u8], out: &mut [f64], count: usize) -> std::result::Result<(), String> {
    let n_items = check_header(bytes, 0x03, IMAGE_HEADER_LEN, "image")?;

    let rows = read_u32(bytes, 8);
    let cols = read_u32(bytes, 12);
    if rows != MNIST_HW || cols != MNIST_HW {
        return Err(format!(
            "expected {MNIST_HW}x{MNIST_HW} images, header declares {rows}x{cols}."
        ));
    }

    check_count(n_items, count, "images")?;
    let needed = count * NINPUT;
    if bytes.len() < IMAGE_HEADER_LEN + needed {
        return Err(format!(
            "file too short: {count} images need {} bytes after the header, found {}.",
            needed,
            bytes.len() - IMAGE_HEADER_LEN
        ));
    }
    if out.len() < needed {
        return Err(format!("output buffer holds {} values, need {needed}.", out.len()));
    }

    let pixels = &bytes[IMAGE_HEADER_LEN..IMAGE_HEADER_LEN + needed];
    for (dst, &px) in out.iter_mut().zip(pixels) {
        *dst = px as f64 / 255.0;
    }
    Ok(())
}

fn parse_labels(bytes: &[u8], out: &mut [f64], count: usize) -> std::result::Result<(), String> {
    let n_items = check_header(bytes, 0x01, LABEL_HEADER_LEN, "label")?;
    check_count(n_items, count, "labels")?;

    if bytes.len() < LABEL_HEADER_LEN + count {
        return Err(format!(
            "file too short: {count} labels need {count} bytes after the header, found {}.",
            bytes.len() - LABEL_HEADER_LEN
        ));
    }
    if out.len() < count * NCLASSES {
        return Err(format!(
            "output buffer holds {} values, need {}.",
            out.len(),
            count * NCLASSES
        ));
    }

    let classes = &bytes[LABEL_HEADER_LEN..LABEL_HEADER_LEN + count];
    for (i, (row, &class)) in out.chunks_exact_mut(NCLASSES).zip(classes).enumerate() {
        let class = class as usize;
        if class >= NCLASSES {
            return Err(format!(
                "label at index {i}: class index {class} is out of range for {NCLASSES} classes."
            ));
        }
        row.fill(0.0);
        row[class] = 1.0;
    }
    Ok(())
}

/// Validates the magic bytes and returns the declared item count.
fn check_header(bytes: &[u8], dims: u8, header_len: usize, kind: &str) -> std::result::Result<usize, String> {
    if bytes.len() < header_len {
        return Err(format!(
            "IDX {kind} file too short: expected at least {header_len} header bytes, got {}.",
            bytes.len()
        ));
    }
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(format!(
            "IDX {kind} file: bytes 0-1 must be 0x00 0x00 (reserved), got 0x{:02X} 0x{:02X}.",
            bytes[0], bytes[1]
        ));
    }
    if bytes[2] != 0x08 {
        return Err(format!(
            "IDX {kind} file: byte 2 (dtype) must be 0x08 (uint8), got 0x{:02X}.",
            bytes[2]
        ));
    }
    if bytes[3] != dims {
        return Err(format!(
            "IDX {kind} file: byte 3 (dimensions) must be {dims}, got {}.",
            bytes[3]
        ));
    }
    Ok(read_u32(bytes, 4))
}

fn check_count(declared: usize, requested: usize, what: &str) -> std::result::Result<(), String> {
    if declared < requested {
        return Err(format!(
            "header declares {declared} {what} but {requested} were requested."
        ));
    }
    Ok(())
}

fn read_u32(bytes: &[u8], at: usize) -> usize {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
}
