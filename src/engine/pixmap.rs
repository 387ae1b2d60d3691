//! Pixmap conversion helpers
//!
//! MuPDF hands back interleaved samples with `n` components per pixel and
//! possibly padded rows. Everything downstream wants tightly packed RGB.

use crate::document::{DocumentError, DocumentResult, RgbPixels};

/// Copy a pixmap's samples into a packed RGB buffer, dropping alpha
pub fn pixmap_to_rgb(pixmap: &mupdf::Pixmap) -> DocumentResult<RgbPixels> {
    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let n = pixmap.n() as usize;

    let data = samples_to_rgb(pixmap.samples(), width, height, n)?;
    Ok(RgbPixels {
        width: width as u32,
        height: height as u32,
        data,
    })
}

/// Pack `n`-component interleaved rows into RGB
///
/// Row stride is derived from the buffer length so padded rows are handled.
pub fn samples_to_rgb(
    samples: &[u8],
    width: usize,
    height: usize,
    n: usize,
) -> DocumentResult<Vec<u8>> {
    if n < 3 {
        return Err(DocumentError::RenderError(format!(
            "Unsupported pixmap format: {} channels",
            n
        )));
    }
    if width == 0 || height == 0 {
        return Err(DocumentError::RenderError("Pixmap has no pixels".into()));
    }

    let row_bytes = width * n;
    let stride = samples.len() / height;
    if stride < row_bytes {
        return Err(DocumentError::RenderError("Pixmap buffer size mismatch".into()));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row = &samples[y * stride..y * stride + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }

    Ok(out)
}
