use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};
use crate::paths::ensure_distinct;

/// Re-encode any supported image as a JPEG of the given quality.
///
/// The alpha channel, if any, is dropped. The result is written even when it
/// ends up larger than the input.
#[instrument(skip_all, fields(source = %source.as_ref().display(), quality = quality))]
pub fn compress_image<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    output: Q,
    quality: u8,
) -> Result<PathBuf> {
    let source = source.as_ref();
    let output = output.as_ref();
    ensure_distinct(source, output)?;

    let image_error = |err| Error::Image {
        path: source.to_path_buf(),
        source: err,
    };

    let img = image::open(source).map_err(image_error)?;
    debug!(width = img.width(), height = img.height(), "image loaded");

    let rgb = img.to_rgb8();
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(image_error)?;
    std::fs::write(output, &encoded)?;

    info!(bytes = encoded.len(), output = %output.display(), "image compressed");
    Ok(output.to_path_buf())
}
