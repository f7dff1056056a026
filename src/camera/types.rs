//! Camera types and data structures.

use std::fmt;
use std::time::Instant;

use crate::codec::LumaView;

/// Information about an available camera device.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    /// Device index for selection
    pub index: u32,
    /// Human-readable device name
    pub name: String,
    /// Device description
    pub description: String,
}

impl fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.index, self.name, self.description)
    }
}

/// Camera resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Analysis resolution (640x480): large enough for typical codes, cheap to decode
    pub const ANALYSIS: Resolution = Resolution {
        width: 640,
        height: 480,
    };

    /// High resolution (1280x720) for small or dense codes
    pub const HIGH: Resolution = Resolution {
        width: 1280,
        height: 720,
    };
}

impl Default for Resolution {
    fn default() -> Self {
        Self::ANALYSIS
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Clockwise rotation the sensor image needs to appear upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Snap an arbitrary angle to the nearest quarter turn.
    pub fn from_degrees(degrees: i32) -> Self {
        match (degrees.rem_euclid(360) + 45) / 90 % 4 {
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            3 => Rotation::Deg270,
            _ => Rotation::Deg0,
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// A captured grayscale frame.
///
/// The frame owns its buffer on behalf of the capture backend. Whatever
/// release hook the backend attached runs exactly once, when the frame is
/// dropped or [`closed`](CameraFrame::close).
pub struct CameraFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    rotation: Rotation,
    timestamp: Instant,
    release: Option<ReleaseHook>,
}

impl CameraFrame {
    /// Wrap a row-major luma buffer (one byte per pixel).
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            rotation: Rotation::Deg0,
            timestamp: Instant::now(),
            release: None,
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Attach the callback that hands the buffer back to the backend.
    pub fn on_release(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(hook));
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Full-frame view, or `None` if the buffer is shorter than its dimensions.
    pub fn luma_view(&self) -> Option<LumaView<'_>> {
        LumaView::full(&self.data, self.width, self.height)
    }

    /// Release the frame now.
    pub fn close(self) {}
}

impl Drop for CameraFrame {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation", &self.rotation)
            .field("bytes", &self.data.len())
            .finish_non_exhaustive()
    }
}

/// Settings for a capture session.
#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Camera device index
    pub device_index: u32,
    /// Requested capture resolution
    pub resolution: Resolution,
    /// Target FPS (actual may vary)
    pub fps: u32,
    /// Tear the session down after the first decoded result
    pub stop_on_result: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device_index: 0,
            resolution: Resolution::default(),
            fps: 30,
            stop_on_result: true,
        }
    }
}

/// Errors that can occur during camera operations.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    /// No cameras found on the system
    #[error("No cameras found")]
    NoDevices,
    /// Failed to query camera devices
    #[error("Failed to query cameras: {0}")]
    QueryFailed(String),
    /// Failed to open camera
    #[error("Failed to open camera: {0}")]
    OpenFailed(String),
    /// Camera permission denied
    #[error("Camera permission denied")]
    PermissionDenied,
    /// Camera device not found at specified index
    #[error("Camera device {0} not found. Run 'list-cameras' to see available devices")]
    DeviceNotFound(u32),
    /// Failed to start or read the video stream
    #[error("Camera stream failed: {0}")]
    StreamFailed(String),
    /// Failed to load a still image used as a frame source
    #[error("Failed to load image '{path}': {reason}")]
    ImageLoad { path: String, reason: String },
    /// Session is already running
    #[error("Capture session is already running")]
    AlreadyRunning,
}
