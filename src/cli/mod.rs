//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing and subcommand handlers.

mod args;
mod commands;
mod interactive;
mod interrupt;
mod scanner;

pub use args::{Args, Command, ConfigAction, GenerateArgs, InteractiveArgs, ScanArgs};
pub use commands::{
    camera_unavailable, generate, handle_config_action, list_cameras, list_formats,
    print_file_scans, scan_files, FileScan,
};
pub use interactive::{parse_line, run_interactive, Input, HELP};
pub use interrupt::{Interrupt, InterruptHandle};
pub use scanner::{run_camera_scan, LiveScanner, RESCAN_DELAY};
