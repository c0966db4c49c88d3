use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::paths::ensure_distinct;

/// How to invoke the external encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSettings {
    /// ffmpeg executable name or path
    pub program: String,
    /// Target bitrate, e.g. "800k"
    pub bitrate: String,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            bitrate: "800k".to_string(),
        }
    }
}

fn encoder_args(source: &Path, output: &Path, bitrate: &str) -> Vec<OsString> {
    vec![
        "-hide_banner".into(),
        "-nostdin".into(),
        "-y".into(),
        "-i".into(),
        source.as_os_str().to_owned(),
        "-b:v".into(),
        bitrate.into(),
        output.as_os_str().to_owned(),
    ]
}

/// Re-encode `source` at a fixed video bitrate by running ffmpeg.
///
/// Blocks until the encoder exits. A failed run removes the partial output
/// it created.
#[instrument(skip_all, fields(source = %source.as_ref().display(), bitrate = %settings.bitrate))]
pub fn compress_video<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    output: Q,
    settings: &VideoSettings,
) -> Result<PathBuf> {
    let source = source.as_ref();
    let output = output.as_ref();
    ensure_distinct(source, output)?;

    let existed = output.exists();
    let args = encoder_args(source, output, &settings.bitrate);
    debug!(program = %settings.program, ?args, "running encoder");

    let result = Command::new(&settings.program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| Error::EncoderSpawn {
            program: settings.program.clone(),
            source,
        })?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        warn!(status = %result.status, stderr = %stderr.trim(), "encoder failed");
        if !existed && output.exists() {
            std::fs::remove_file(output)?;
        }
        return Err(Error::Encoder {
            program: settings.program.clone(),
            status: result.status,
        });
    }

    info!(output = %output.display(), "video compressed");
    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_fixed_bitrate() {
        let args = encoder_args(Path::new("in.mov"), Path::new("in_compressed.mp4"), "800k");
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        let input = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[input + 1], "in.mov");
        let rate = args.iter().position(|a| a == "-b:v").unwrap();
        assert_eq!(args[rate + 1], "800k");
        assert_eq!(args.last().unwrap(), "in_compressed.mp4");
    }

    #[test]
    fn missing_encoder_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, b"fake").unwrap();
        let settings = VideoSettings {
            program: "officium-no-such-encoder".to_string(),
            ..VideoSettings::default()
        };

        let err = compress_video(&source, dir.path().join("out.mp4"), &settings).unwrap_err();
        assert!(matches!(err, Error::EncoderSpawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn failing_encoder_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, b"fake").unwrap();
        let output = dir.path().join("clip_compressed.mp4");

        // `false` ignores its arguments and exits 1
        let settings = VideoSettings {
            program: "false".to_string(),
            ..VideoSettings::default()
        };

        let err = compress_video(&source, &output, &settings).unwrap_err();
        assert!(matches!(err, Error::Encoder { .. }));
        assert!(!output.exists());
    }
}
