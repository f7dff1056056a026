//! Text to bitmap encoding.

use std::collections::HashMap;

use rxing::{EncodeHintType, EncodeHintValue, MultiFormatWriter, Writer};

use super::bitmap::BarcodeImage;
use crate::format::{BarcodeFormat, EncodeProfile};

/// Errors that can occur while encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The input text was empty
    #[error("Nothing to encode: enter some text first")]
    EmptyInput,
    /// The codec rejected the content for this format
    #[error("Cannot encode as {format}: {reason}")]
    Unencodable {
        format: BarcodeFormat,
        reason: String,
    },
}

impl EncodeError {
    /// Format-specific advice to show next to the error, if any.
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            EncodeError::EmptyInput => None,
            EncodeError::Unencodable { format, .. } => format.content_guidance(),
        }
    }
}

/// A single encode job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    pub text: String,
    pub format: BarcodeFormat,
    pub profile: EncodeProfile,
}

impl EncodeRequest {
    /// Build a request using the format's standard profile.
    pub fn new(text: impl Into<String>, format: BarcodeFormat) -> Self {
        Self {
            text: text.into(),
            format,
            profile: format.profile(),
        }
    }

    /// Override the target size, keeping the format's writer hints.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.profile.width = width;
        self.profile.height = height;
        self
    }

    fn hints(&self) -> HashMap<EncodeHintType, EncodeHintValue> {
        let mut hints = HashMap::new();
        if let Some(level) = self.profile.error_correction {
            hints.insert(
                EncodeHintType::ERROR_CORRECTION,
                EncodeHintValue::ErrorCorrection(level.to_string()),
            );
        }
        if let Some(margin) = self.profile.margin {
            hints.insert(
                EncodeHintType::MARGIN,
                EncodeHintValue::Margin(margin.to_string()),
            );
        }
        hints
    }
}

/// Encode `text` as `format` using the format's standard profile.
pub fn encode(text: &str, format: BarcodeFormat) -> Result<BarcodeImage, EncodeError> {
    encode_request(&EncodeRequest::new(text, format))
}

/// Encode an explicit request.
///
/// The same request always yields a pixel-identical bitmap.
pub fn encode_request(request: &EncodeRequest) -> Result<BarcodeImage, EncodeError> {
    if request.text.is_empty() {
        return Err(EncodeError::EmptyInput);
    }

    let writer = MultiFormatWriter::default();
    let matrix = writer
        .encode_with_hints(
            &request.text,
            &request.format.to_rxing(),
            request.profile.width as i32,
            request.profile.height as i32,
            &request.hints(),
        )
        .map_err(|e| {
            log::warn!("Encoding {} failed: {}", request.format, e);
            EncodeError::Unencodable {
                format: request.format,
                reason: e.to_string(),
            }
        })?;

    log::debug!(
        "Encoded {} chars as {} ({}x{})",
        request.text.chars().count(),
        request.format,
        matrix.getWidth(),
        matrix.getHeight()
    );

    Ok(BarcodeImage::from_bit_matrix(request.format, &matrix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_rejected() {
        assert_eq!(encode("", BarcodeFormat::Qr), Err(EncodeError::EmptyInput));
    }

    #[test]
    fn test_qr_meets_profile_size() {
        let image = encode("HELLO123", BarcodeFormat::Qr).unwrap();
        assert!(image.width() >= 500);
        assert!(image.height() >= 500);
        assert_eq!(image.format(), BarcodeFormat::Qr);
    }

    #[test]
    fn test_ean13_rejects_letters() {
        let err = encode("ABCDEFGHIJKLM", BarcodeFormat::Ean13).unwrap_err();
        match &err {
            EncodeError::Unencodable { format, .. } => assert_eq!(*format, BarcodeFormat::Ean13),
            other => panic!("Expected Unencodable, got {:?}", other),
        }
        assert!(err.guidance().is_some_and(|g| g.contains("12 digits")));
    }

    #[test]
    fn test_ean13_accepts_twelve_digits() {
        let image = encode("590123412345", BarcodeFormat::Ean13).unwrap();
        assert!(image.width() >= 500);
    }

    #[test]
    fn test_encode_is_deterministic() {
        for format in [BarcodeFormat::Qr, BarcodeFormat::Code128, BarcodeFormat::Pdf417] {
            let a = encode("HELLO123", format).unwrap();
            let b = encode("HELLO123", format).unwrap();
            assert_eq!(a, b, "{} output differs between calls", format);
        }
    }

    #[test]
    fn test_profile_hints_reach_writer() {
        let qr = EncodeRequest::new("x", BarcodeFormat::Qr).hints();
        assert!(matches!(
            qr.get(&EncodeHintType::ERROR_CORRECTION),
            Some(EncodeHintValue::ErrorCorrection(level)) if level == "H"
        ));
        assert!(!qr.contains_key(&EncodeHintType::MARGIN));

        let ean = EncodeRequest::new("590123412345", BarcodeFormat::Ean13).hints();
        assert!(matches!(
            ean.get(&EncodeHintType::MARGIN),
            Some(EncodeHintValue::Margin(margin)) if margin == "10"
        ));

        assert!(EncodeRequest::new("x", BarcodeFormat::DataMatrix)
            .hints()
            .is_empty());
    }

    #[test]
    fn test_ean13_matches_profile_size() {
        let image = encode("590123412345", BarcodeFormat::Ean13).unwrap();
        assert_eq!((image.width(), image.height()), (500, 250));
    }

    #[test]
    fn test_with_size_keeps_hints() {
        let request = EncodeRequest::new("x", BarcodeFormat::Qr).with_size(100, 120);
        assert_eq!((request.profile.width, request.profile.height), (100, 120));
        assert_eq!(request.profile.error_correction, Some("H"));
    }
}
