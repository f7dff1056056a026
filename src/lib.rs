//! barcode-studio library crate.
//!
//! Encodes text into 1D/2D barcodes and decodes them from still images or a
//! live camera feed. The binary is a thin clap front-end over these modules.

pub mod analyzer;
pub mod app;
pub mod camera;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod permissions;
pub mod render;
