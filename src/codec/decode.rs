//! Bitmap to text decoding.

use std::collections::HashSet;

use rxing::common::HybridBinarizer;
use rxing::{
    BinaryBitmap, DecodeHintType, DecodeHintValue, DecodingHintDictionary, Luma8LuminanceSource,
    MultiFormatReader, Reader,
};

use super::luma::LumaView;
use crate::format::BarcodeFormat;

/// A successful decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub text: String,
    pub format: BarcodeFormat,
}

/// Result of one decode attempt. A miss is an ordinary outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    Found(ScanResult),
    NotFound,
}

impl DecodeOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, DecodeOutcome::Found(_))
    }

    pub fn into_result(self) -> Option<ScanResult> {
        match self {
            DecodeOutcome::Found(result) => Some(result),
            DecodeOutcome::NotFound => None,
        }
    }
}

/// Multi-format reader configured once and reused across frames.
pub struct Decoder {
    reader: MultiFormatReader,
    hints: DecodingHintDictionary,
    candidates: Vec<BarcodeFormat>,
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("candidates", &self.candidates)
            .finish_non_exhaustive()
    }
}

impl Decoder {
    /// Create a decoder that looks for any of `candidates` in a single pass.
    ///
    /// An empty candidate list means every supported format.
    pub fn new(candidates: &[BarcodeFormat], try_harder: bool) -> Self {
        let candidates = if candidates.is_empty() {
            BarcodeFormat::ALL.to_vec()
        } else {
            candidates.to_vec()
        };
        let possible: HashSet<rxing::BarcodeFormat> =
            candidates.iter().map(|f| f.to_rxing()).collect();

        let mut hints = DecodingHintDictionary::new();
        hints.insert(
            DecodeHintType::POSSIBLE_FORMATS,
            DecodeHintValue::PossibleFormats(possible),
        );
        hints.insert(
            DecodeHintType::TRY_HARDER,
            DecodeHintValue::TryHarder(try_harder),
        );

        Self {
            reader: MultiFormatReader::default(),
            hints,
            candidates,
        }
    }

    pub fn candidates(&self) -> &[BarcodeFormat] {
        &self.candidates
    }

    /// Try to read a barcode from the view.
    pub fn decode(&mut self, view: &LumaView<'_>) -> DecodeOutcome {
        let source = Luma8LuminanceSource::new(view.to_vec(), view.width(), view.height());
        let mut bitmap = BinaryBitmap::new(HybridBinarizer::new(source));

        match self.reader.decode_with_hints(&mut bitmap, &self.hints) {
            Ok(result) => match BarcodeFormat::from_rxing(result.getBarcodeFormat()) {
                Some(format) => DecodeOutcome::Found(ScanResult {
                    text: result.getText().to_string(),
                    format,
                }),
                None => {
                    log::debug!(
                        "Ignoring unsupported symbology {:?}",
                        result.getBarcodeFormat()
                    );
                    DecodeOutcome::NotFound
                }
            },
            Err(e) => {
                log::trace!("No barcode in {}x{} view: {}", view.width(), view.height(), e);
                DecodeOutcome::NotFound
            }
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(&BarcodeFormat::ALL, true)
    }
}

/// One-shot decode over every candidate format.
pub fn decode(view: &LumaView<'_>, candidates: &[BarcodeFormat]) -> DecodeOutcome {
    Decoder::new(candidates, true).decode(view)
}
