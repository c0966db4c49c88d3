use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Config;
use crate::media::image::compress_image;
use crate::media::video::{compress_video, VideoSettings};
use crate::page_selection::PageRequest;
use crate::paths::{with_prefix, with_suffix};
use crate::pdf::compress::compress_pdf;
use crate::pdf::remove::remove_from;
use crate::pdf::unlock::unlock;
use crate::pdf::{OpenAttempt, PdfDocument};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemovePagesRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Pages to remove, comma-separated (e.g., '2,5,7-9,end')")]
    pub pages: String,
    #[schemars(description = "Output file path (default: <name>_modified.pdf next to the source)")]
    pub output: Option<String>,
    #[schemars(description = "Password, if the PDF is protected")]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UnlockRequest {
    #[schemars(description = "Path to the protected PDF file")]
    pub path: String,
    #[schemars(description = "Document password")]
    pub password: String,
    #[schemars(description = "Output file path (default: unlocked_<name> next to the source)")]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CompressPdfRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Output file path (default: <name>_compressed.pdf)")]
    pub output: Option<String>,
    #[schemars(description = "Password, if the PDF is protected")]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CompressImageRequest {
    #[schemars(description = "Path to the image file")]
    pub path: String,
    #[schemars(description = "Output file path (default: <name>_compressed.jpg)")]
    pub output: Option<String>,
    #[schemars(description = "JPEG quality 1-100 (default: 50)")]
    pub quality: Option<u8>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CompressVideoRequest {
    #[schemars(description = "Path to the video file")]
    pub path: String,
    #[schemars(description = "Output file path (default: <name>_compressed.mp4)")]
    pub output: Option<String>,
    #[schemars(description = "Target video bitrate (default: '800k')")]
    pub bitrate: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OfficiumServer {
    config: Config,
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

impl OfficiumServer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            tool_router: Self::tool_router(),
        }
    }

    fn output_or(&self, output: Option<String>, default: impl FnOnce() -> PathBuf) -> PathBuf {
        output.map(PathBuf::from).unwrap_or_else(default)
    }

    fn remove_pages(&self, req: RemovePagesRequest) -> crate::error::Result<RemovePagesResult> {
        let source = PathBuf::from(&req.path);
        let request = PageRequest::parse(&req.pages)?;
        let output = self.output_or(req.output, || {
            with_suffix(&source, &self.config.modified_suffix, "pdf")
        });

        let doc = match (PdfDocument::try_open(&source), req.password.as_deref()) {
            (OpenAttempt::Unprotected(doc), _) => doc,
            (OpenAttempt::PasswordRequired, Some(password)) => {
                let mut doc = PdfDocument::open_with_password(&source, password)?;
                doc.strip_encryption();
                doc
            }
            (OpenAttempt::PasswordRequired, None) => {
                return Err(crate::error::Error::PasswordRequired { path: source });
            }
            (OpenAttempt::Failed(err), _) => return Err(err),
        };
        let removal = remove_from(doc, &output, &request)?;
        Ok(RemovePagesResult {
            output_path: removal.output.display().to_string(),
            removed: removal.removed,
            remaining: removal.remaining,
        })
    }
}

fn to_json<T: Serialize>(result: crate::error::Result<T>) -> String {
    match result {
        Ok(value) => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("Error: {}", e))
        }
        Err(e) => format!("Error: {}", e),
    }
}

fn written(path: PathBuf) -> OutputResult {
    let bytes = std::fs::metadata(&path).map(|m| m.len()).ok();
    OutputResult {
        output_path: path.display().to_string(),
        bytes,
    }
}

#[tool_router]
impl OfficiumServer {
    #[tool(description = "Get PDF metadata, page count, and whether the file needs a password")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        let result = match PdfDocument::try_open(&path) {
            OpenAttempt::Unprotected(doc) => {
                let info = doc.get_info();
                Ok(PdfInfoResult {
                    path,
                    password_required: false,
                    encrypted: info.encrypted,
                    page_count: Some(info.page_count),
                    title: info.title,
                    author: info.author,
                    creator: info.creator,
                    producer: info.producer,
                    creation_date: info.creation_date,
                })
            }
            OpenAttempt::PasswordRequired => Ok(PdfInfoResult {
                path,
                password_required: true,
                encrypted: true,
                page_count: None,
                title: None,
                author: None,
                creator: None,
                producer: None,
                creation_date: None,
            }),
            OpenAttempt::Failed(err) => Err(err),
        };
        to_json(result)
    }

    #[tool(description = "Remove pages from a PDF and save the result to a new file. Page numbers are 1-based; numbers outside the document are ignored.")]
    fn pdf_remove_pages(&self, Parameters(req): Parameters<RemovePagesRequest>) -> String {
        to_json(self.remove_pages(req))
    }

    #[tool(description = "Save a decrypted copy of a password-protected PDF")]
    fn pdf_unlock(&self, Parameters(req): Parameters<UnlockRequest>) -> String {
        let source = PathBuf::from(&req.path);
        let output = self.output_or(req.output, || {
            with_prefix(&source, &self.config.unlocked_prefix)
        });
        to_json(unlock(&source, &output, &req.password).map(written))
    }

    #[tool(description = "Compress a PDF by pruning unused objects and compressing streams")]
    fn pdf_compress(&self, Parameters(req): Parameters<CompressPdfRequest>) -> String {
        let source = PathBuf::from(&req.path);
        let output = self.output_or(req.output, || {
            with_suffix(&source, &self.config.compressed_suffix, "pdf")
        });
        to_json(compress_pdf(&source, &output, req.password.as_deref()).map(written))
    }

    #[tool(description = "Re-encode an image as a JPEG of fixed quality")]
    fn image_compress(&self, Parameters(req): Parameters<CompressImageRequest>) -> String {
        let source = PathBuf::from(&req.path);
        let output = self.output_or(req.output, || {
            with_suffix(&source, &self.config.compressed_suffix, "jpg")
        });
        let quality = req.quality.unwrap_or(self.config.image_quality);
        to_json(compress_image(&source, &output, quality).map(written))
    }

    #[tool(description = "Re-encode a video at a fixed bitrate using ffmpeg")]
    fn video_compress(&self, Parameters(req): Parameters<CompressVideoRequest>) -> String {
        let source = PathBuf::from(&req.path);
        let output = self.output_or(req.output, || {
            with_suffix(&source, &self.config.compressed_suffix, "mp4")
        });
        let settings = VideoSettings {
            program: self.config.ffmpeg.clone(),
            bitrate: req.bitrate.unwrap_or_else(|| self.config.video_bitrate.clone()),
        };
        to_json(compress_video(&source, &output, &settings).map(written))
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PdfInfoResult {
    pub path: String,
    pub password_required: bool,
    pub encrypted: bool,
    pub page_count: Option<u32>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RemovePagesResult {
    pub output_path: String,
    /// 1-based page numbers of the source that were removed
    pub removed: Vec<u32>,
    pub remaining: u32,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct OutputResult {
    pub output_path: String,
    pub bytes: Option<u64>,
}

impl ServerHandler for OfficiumServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Office file tools. Use pdf_info to check page count and protection, \
                 pdf_remove_pages to delete pages into a new PDF (pass password for protected \
                 files), pdf_unlock to save a decrypted copy, pdf_compress, image_compress and \
                 video_compress to shrink files. Sources are never modified in place."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let server = OfficiumServer::new(config);

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{encrypted_pdf, load_labels, sample_pdf, write_pdf};

    fn server() -> OfficiumServer {
        OfficiumServer::new(Config::default())
    }

    #[test]
    fn remove_pages_tool_uses_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_pdf(dir.path(), "report.pdf", sample_pdf(5));

        let out = server().pdf_remove_pages(Parameters(RemovePagesRequest {
            path: source.display().to_string(),
            pages: "2, 2, 5".into(),
            output: None,
            password: None,
        }));

        let result: RemovePagesResult = serde_json::from_str(&out).unwrap();
        assert_eq!(result.removed, vec![2, 5]);
        assert_eq!(result.remaining, 3);
        let expected = dir.path().join("report_modified.pdf");
        assert_eq!(result.output_path, expected.display().to_string());
        assert_eq!(load_labels(&expected), vec!["Page 1", "Page 3", "Page 4"]);
    }

    #[test]
    fn remove_pages_tool_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_pdf(dir.path(), "locked.pdf", encrypted_pdf(3, "secret"));

        let out = server().pdf_remove_pages(Parameters(RemovePagesRequest {
            path: source.display().to_string(),
            pages: "1".into(),
            output: None,
            password: None,
        }));
        assert!(out.starts_with("Error:"), "{out}");
        assert!(!dir.path().join("locked_modified.pdf").exists());
    }

    #[test]
    fn remove_pages_tool_unlocks_with_password() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_pdf(dir.path(), "locked.pdf", encrypted_pdf(3, "secret"));

        let out = server().pdf_remove_pages(Parameters(RemovePagesRequest {
            path: source.display().to_string(),
            pages: "3".into(),
            output: None,
            password: Some("secret".into()),
        }));
        let result: RemovePagesResult = serde_json::from_str(&out).unwrap();
        assert_eq!(result.removed, vec![3]);
        assert_eq!(result.remaining, 2);
        assert_eq!(
            load_labels(&dir.path().join("locked_modified.pdf")),
            vec!["Page 1", "Page 2"]
        );
    }

    #[test]
    fn info_tool_flags_protection() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_pdf(dir.path(), "locked.pdf", encrypted_pdf(3, "secret"));

        let out = server().pdf_info(Parameters(PathRequest {
            path: source.display().to_string(),
        }));
        let info: PdfInfoResult = serde_json::from_str(&out).unwrap();
        assert!(info.password_required);
        assert_eq!(info.page_count, None);
    }
}
