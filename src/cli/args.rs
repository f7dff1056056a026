//! CLI argument parsing with clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::format::BarcodeFormat;

/// Generate and scan 1D/2D barcodes
#[derive(Parser, Debug)]
#[command(name = "barcode-studio")]
#[command(version, about = "Generate and scan barcodes from the terminal", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode text as a barcode
    Generate(GenerateArgs),
    /// Decode barcodes from image files or the camera
    Scan(ScanArgs),
    /// List supported barcode formats
    Formats,
    /// List available cameras
    ListCameras,
    /// Interactive generate/scan session
    Interactive(InteractiveArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct GenerateArgs {
    /// Text to encode
    pub text: String,

    /// Barcode format (default from config, else qr)
    #[arg(long, short)]
    pub format: Option<BarcodeFormat>,

    /// Write the code to this PNG file
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Override the output width in pixels
    #[arg(long, requires = "height")]
    pub width: Option<u32>,

    /// Override the output height in pixels
    #[arg(long, requires = "width")]
    pub height: Option<u32>,

    /// Do not print a terminal preview
    #[arg(long)]
    pub no_preview: bool,

    /// Draw dark modules as blocks (for light terminals)
    #[arg(long)]
    pub invert: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ScanArgs {
    /// Image files to decode
    #[arg(required_unless_present = "camera", conflicts_with = "camera")]
    pub files: Vec<PathBuf>,

    /// Scan live from the camera
    #[arg(long)]
    pub camera: bool,

    /// Restrict decoding to these formats (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub formats: Vec<BarcodeFormat>,

    /// Camera device index (from list-cameras)
    #[arg(long)]
    pub device: Option<u32>,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Keep scanning after each result
    #[arg(long)]
    pub continuous: bool,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct InteractiveArgs {
    /// Camera device index (from list-cameras)
    #[arg(long)]
    pub device: Option<u32>,

    /// Use these images as the camera feed (looped)
    #[arg(long, num_args = 1..)]
    pub replay: Vec<PathBuf>,

    /// Draw dark modules as blocks (for light terminals)
    #[arg(long)]
    pub invert: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}
