//! Camera capture module.
//!
//! - Frame sources via [`FrameSource`] ([`ImageSequenceSource`] for stills,
//!   `NativeCameraSource` with the `camera` feature)
//! - Latest-only hand-off via [`FrameFeed`]
//! - Session lifecycle via [`CameraSession`]

mod feed;
mod frame_utils;
#[cfg(feature = "camera")]
mod native;
mod session;
mod source;
mod types;

pub use feed::FrameFeed;
pub use frame_utils::{rgb_to_luma, rgb_to_luma_into};
#[cfg(feature = "camera")]
pub use native::{list_devices, NativeCameraSource};
pub use session::CameraSession;
pub use source::{FrameSource, ImageSequenceSource, StillFrame, UnavailableSource};
pub use types::{CameraError, CameraFrame, CameraInfo, CameraSettings, Resolution, Rotation};
