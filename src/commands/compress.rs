use crate::config::Config;
use crate::media::image::compress_image;
use crate::media::video::{compress_video, VideoSettings};
use crate::paths::with_suffix;
use crate::pdf::compress::compress_pdf;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub fn pdf<P: AsRef<Path>>(
    config: &Config,
    path: P,
    output: Option<PathBuf>,
    password: Option<&str>,
) -> Result<()> {
    let path = path.as_ref();
    let output = output.unwrap_or_else(|| with_suffix(path, &config.compressed_suffix, "pdf"));

    let written = match compress_pdf(path, &output, password) {
        Ok(written) => written,
        Err(err) if err.is_password_required() => {
            anyhow::bail!("{} (pass --password to compress it)", err)
        }
        Err(err) => return Err(err.into()),
    };
    report("PDF", path, &written);
    Ok(())
}

pub fn image<P: AsRef<Path>>(
    config: &Config,
    path: P,
    output: Option<PathBuf>,
    quality: Option<u8>,
) -> Result<()> {
    let path = path.as_ref();
    let output = output.unwrap_or_else(|| with_suffix(path, &config.compressed_suffix, "jpg"));

    let written = compress_image(path, &output, quality.unwrap_or(config.image_quality))?;
    report("Image", path, &written);
    Ok(())
}

pub fn video<P: AsRef<Path>>(
    config: &Config,
    path: P,
    output: Option<PathBuf>,
    bitrate: Option<String>,
    ffmpeg: Option<String>,
) -> Result<()> {
    let path = path.as_ref();
    let output = output.unwrap_or_else(|| with_suffix(path, &config.compressed_suffix, "mp4"));
    let settings = VideoSettings {
        program: ffmpeg.unwrap_or_else(|| config.ffmpeg.clone()),
        bitrate: bitrate.unwrap_or_else(|| config.video_bitrate.clone()),
    };

    let written = compress_video(path, &output, &settings)?;
    report("Video", path, &written);
    Ok(())
}

fn report(kind: &str, source: &Path, output: &Path) {
    let size = |p: &Path| std::fs::metadata(p).map(|m| m.len()).ok();
    match (size(source), size(output)) {
        (Some(before), Some(after)) => println!(
            "Compressed {} saved as {} ({} -> {} bytes)",
            kind,
            output.display(),
            before,
            after
        ),
        _ => println!("Compressed {} saved as {}", kind, output.display()),
    }
}
