//! Subcommand handlers.

use std::path::Path;

use super::args::{ConfigAction, GenerateArgs};
use crate::analyzer::{AnalysisOutcome, FrameAnalyzer, ScanGate};
use crate::camera::{CameraError, CameraFrame, StillFrame};
use crate::codec::{encode_request, BarcodeImage, EncodeRequest};
use crate::config::{default_path, Config};
use crate::error::AppError;
use crate::format::BarcodeFormat;
use crate::render::{render, RenderOptions};

/// Encode, save and preview a code.
///
/// Empty text is not an error: nothing is generated.
pub fn generate(config: &Config, args: &GenerateArgs) -> Result<Option<BarcodeImage>, AppError> {
    if args.text.is_empty() {
        println!("Nothing to encode.");
        return Ok(None);
    }

    let format = args.format.unwrap_or(config.generate.format);
    let mut request = EncodeRequest::new(args.text.as_str(), format);
    if let (Some(width), Some(height)) = (args.width, args.height) {
        request = request.with_size(width, height);
    }

    let image = encode_request(&request)?;

    if !args.no_preview {
        let opts = RenderOptions {
            invert: args.invert,
            ..RenderOptions::default()
        };
        for line in render(&image, &opts) {
            println!("{}", line);
        }
        println!("Type: {}", format);
    }

    if let Some(ref path) = args.output {
        image.save(path)?;
        println!(
            "Saved {}x{} {} to {}",
            image.width(),
            image.height(),
            format,
            path.display()
        );
    }

    Ok(Some(image))
}

/// Outcome of scanning one image file.
#[derive(Debug)]
pub struct FileScan<'a> {
    pub path: &'a Path,
    pub outcome: Result<AnalysisOutcome, CameraError>,
}

/// Decode each file in turn with the configured analyzer.
///
/// Every file is a fresh arm cycle, so each can report its own code.
pub fn scan_files<'a>(
    config: &Config,
    files: &'a [impl AsRef<Path>],
    interrupted: impl Fn() -> bool,
) -> Vec<FileScan<'a>> {
    let gate = ScanGate::new();
    let mut analyzer = FrameAnalyzer::new(config.decoder(), config.crop_policy(), gate.clone());
    let mut scans = Vec::with_capacity(files.len());

    for file in files {
        let path: &Path = file.as_ref();
        if interrupted() {
            break;
        }
        gate.rearm();

        let outcome = StillFrame::load(path)
            .map(|still| CameraFrame::new(still.data, still.width, still.height))
            .map(|frame| analyzer.analyze(frame));
        scans.push(FileScan { path, outcome });
    }

    let stats = analyzer.stats();
    log::debug!(
        "Scanned {} files: {} decoded, {} misses",
        stats.frames,
        stats.decoded,
        stats.misses
    );
    scans
}

/// Print file scan results; returns how many codes were found.
pub fn print_file_scans(scans: &[FileScan<'_>]) -> usize {
    let mut found = 0;
    for scan in scans {
        match &scan.outcome {
            Ok(AnalysisOutcome::Found(result)) => {
                found += 1;
                println!("{}: [{}] {}", scan.path.display(), result.format, result.text);
            }
            Ok(_) => println!("{}: no code found", scan.path.display()),
            Err(e) => eprintln!("{}: {}", scan.path.display(), e),
        }
    }
    found
}

/// Print the supported formats.
pub fn list_formats() {
    println!("Supported formats:");
    for format in BarcodeFormat::ALL {
        let profile = format.profile();
        println!(
            "  {:<12} {:<12} {}x{}",
            format.key(),
            format.display_name(),
            profile.width,
            profile.height
        );
        if let Some(guidance) = format.content_guidance() {
            println!("               {}", guidance);
        }
    }
}

/// List available cameras and print them to stdout.
#[cfg(feature = "camera")]
pub fn list_cameras() -> Result<(), AppError> {
    let devices = crate::camera::list_devices()?;
    if devices.is_empty() {
        println!("No cameras found.");
        println!();
        println!("Make sure your camera is connected and permissions are granted.");
        println!(
            "Grant access in {}.",
            crate::permissions::settings_path()
        );
    } else {
        println!("Available cameras:");
        for device in devices {
            println!("  {}", device);
        }
        println!();
        println!("Use --device <index> to select a camera.");
    }
    Ok(())
}

#[cfg(not(feature = "camera"))]
pub fn list_cameras() -> Result<(), AppError> {
    Err(camera_unavailable())
}

pub fn camera_unavailable() -> AppError {
    AppError::CameraInitFailed(
        "this build has no camera support (rebuild with --features camera)".to_string(),
    )
}

/// Handle config subcommand actions.
pub fn handle_config_action(
    action: ConfigAction,
    config: &Config,
    path: Option<&Path>,
) -> Result<(), AppError> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_path);
    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            println!();
            print!("{}", config.to_toml()?);
            println!();
            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
        }
        ConfigAction::Init => {
            Config::write_default(&config_path)?;
            println!("Created config file: {}", config_path.display());
        }
    }
    Ok(())
}
