//! Barcode codec adapter.
//!
//! A thin layer over `rxing`:
//! - Encoding via [`encode`] / [`encode_request`] into a [`BarcodeImage`]
//! - Decoding via [`Decoder`] / [`decode`] over a [`LumaView`]

mod bitmap;
mod decode;
mod encode;
mod luma;

pub use bitmap::{BarcodeImage, DARK, LIGHT};
pub use decode::{decode, DecodeOutcome, Decoder, ScanResult};
pub use encode::{encode, encode_request, EncodeError, EncodeRequest};
pub use luma::LumaView;
