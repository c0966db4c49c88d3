use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "officium")]
#[command(about = "Remove pages from, unlock and compress PDFs; compress images and videos")]
#[command(version)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server on stdio
    Mcp,

    /// Display PDF metadata and protection status
    Info {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Remove pages from one or more PDFs
    #[command(alias = "rm")]
    RemovePages {
        /// PDF files, or directories to search for PDFs
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Pages to remove (e.g., "2,5,7-9,end"); asked per file when omitted
        #[arg(short, long)]
        pages: Option<String>,

        /// Write results into this directory under their original names
        /// instead of next to the source with a suffix
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Password for protected files; asked per file when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Save a decrypted copy of a password-protected PDF
    Unlock {
        /// PDF file to unlock
        path: PathBuf,

        /// Document password
        #[arg(long)]
        password: String,

        /// Output file (default: unlocked_<name> next to the source)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compress a PDF
    CompressPdf {
        /// PDF file to compress
        path: PathBuf,

        /// Output file (default: <name>_compressed.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Password, if the file is protected
        #[arg(long)]
        password: Option<String>,
    },

    /// Re-encode an image as JPEG
    CompressImage {
        /// Image file to compress
        path: PathBuf,

        /// Output file (default: <name>_compressed.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JPEG quality, 1-100
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: Option<u8>,
    },

    /// Re-encode a video at a fixed bitrate with ffmpeg
    CompressVideo {
        /// Video file to compress
        path: PathBuf,

        /// Output file (default: <name>_compressed.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Target video bitrate (e.g., "800k")
        #[arg(short, long)]
        bitrate: Option<String>,

        /// ffmpeg executable
        #[arg(long)]
        ffmpeg: Option<String>,
    },
}
