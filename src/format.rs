//! Supported barcode symbologies and their encode profiles.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Barcode symbology chosen by the user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum BarcodeFormat {
    #[default]
    #[value(name = "qr")]
    Qr,
    #[value(name = "aztec")]
    Aztec,
    #[value(name = "data-matrix")]
    DataMatrix,
    #[value(name = "pdf417")]
    Pdf417,
    #[value(name = "code128")]
    Code128,
    #[value(name = "code39")]
    Code39,
    #[value(name = "ean13")]
    Ean13,
}

impl BarcodeFormat {
    /// Every supported format, in picker order.
    pub const ALL: [BarcodeFormat; 7] = [
        BarcodeFormat::Qr,
        BarcodeFormat::Aztec,
        BarcodeFormat::DataMatrix,
        BarcodeFormat::Pdf417,
        BarcodeFormat::Code128,
        BarcodeFormat::Code39,
        BarcodeFormat::Ean13,
    ];

    /// Human-readable name shown in the format picker.
    pub fn display_name(&self) -> &'static str {
        match self {
            BarcodeFormat::Qr => "QR Code",
            BarcodeFormat::Aztec => "Aztec",
            BarcodeFormat::DataMatrix => "Data Matrix",
            BarcodeFormat::Pdf417 => "PDF 417",
            BarcodeFormat::Code128 => "Code 128",
            BarcodeFormat::Code39 => "Code 39",
            BarcodeFormat::Ean13 => "EAN-13",
        }
    }

    /// Short identifier used on the command line and in the config file.
    pub fn key(&self) -> &'static str {
        match self {
            BarcodeFormat::Qr => "qr",
            BarcodeFormat::Aztec => "aztec",
            BarcodeFormat::DataMatrix => "data-matrix",
            BarcodeFormat::Pdf417 => "pdf417",
            BarcodeFormat::Code128 => "code128",
            BarcodeFormat::Code39 => "code39",
            BarcodeFormat::Ean13 => "ean13",
        }
    }

    /// Content rules the user should know about before encoding, if any.
    pub fn content_guidance(&self) -> Option<&'static str> {
        match self {
            BarcodeFormat::Ean13 => Some("EAN-13 accepts digits only: enter exactly 12 digits"),
            BarcodeFormat::Code39 => {
                Some("Code 39 works best with upper-case letters, digits and - . $ / + % space")
            }
            _ => None,
        }
    }

    /// Whether the symbology is linear (1D).
    pub fn is_linear(&self) -> bool {
        matches!(
            self,
            BarcodeFormat::Code128 | BarcodeFormat::Code39 | BarcodeFormat::Ean13
        )
    }

    /// Fixed encode settings for this format.
    pub fn profile(&self) -> EncodeProfile {
        match self {
            BarcodeFormat::Qr => EncodeProfile::new(500, 500).error_correction("H"),
            BarcodeFormat::Aztec => EncodeProfile::new(500, 500).error_correction("23"),
            BarcodeFormat::DataMatrix => EncodeProfile::new(500, 500),
            BarcodeFormat::Pdf417 => EncodeProfile::new(1000, 300).error_correction("2"),
            BarcodeFormat::Code128 => EncodeProfile::new(600, 200),
            BarcodeFormat::Code39 => EncodeProfile::new(600, 200),
            BarcodeFormat::Ean13 => EncodeProfile::new(500, 250).margin(10),
        }
    }

    /// The codec library's identifier for this format.
    pub fn to_rxing(self) -> rxing::BarcodeFormat {
        match self {
            BarcodeFormat::Qr => rxing::BarcodeFormat::QR_CODE,
            BarcodeFormat::Aztec => rxing::BarcodeFormat::AZTEC,
            BarcodeFormat::DataMatrix => rxing::BarcodeFormat::DATA_MATRIX,
            BarcodeFormat::Pdf417 => rxing::BarcodeFormat::PDF_417,
            BarcodeFormat::Code128 => rxing::BarcodeFormat::CODE_128,
            BarcodeFormat::Code39 => rxing::BarcodeFormat::CODE_39,
            BarcodeFormat::Ean13 => rxing::BarcodeFormat::EAN_13,
        }
    }

    /// Map a codec library format back, if it is one we support.
    pub fn from_rxing(format: &rxing::BarcodeFormat) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.to_rxing() == *format)
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Error returned when parsing an unknown format name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown barcode format '{0}' (expected one of: qr, aztec, data-matrix, pdf417, code128, code39, ean13)")]
pub struct UnknownFormat(pub String);

impl FromStr for BarcodeFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();
        match normalized.as_str() {
            "qr" | "qrcode" => Ok(BarcodeFormat::Qr),
            "aztec" => Ok(BarcodeFormat::Aztec),
            "datamatrix" | "dm" => Ok(BarcodeFormat::DataMatrix),
            "pdf417" => Ok(BarcodeFormat::Pdf417),
            "code128" => Ok(BarcodeFormat::Code128),
            "code39" => Ok(BarcodeFormat::Code39),
            "ean13" => Ok(BarcodeFormat::Ean13),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Output size and writer hints used when encoding a given format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeProfile {
    pub width: u32,
    pub height: u32,
    /// Symbology-specific error correction setting, as the writer expects it
    pub error_correction: Option<&'static str>,
    /// Quiet zone in modules
    pub margin: Option<u32>,
}

impl EncodeProfile {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            error_correction: None,
            margin: None,
        }
    }

    fn error_correction(mut self, level: &'static str) -> Self {
        self.error_correction = Some(level);
        self
    }

    fn margin(mut self, margin: u32) -> Self {
        self.margin = Some(margin);
        self
    }
}
