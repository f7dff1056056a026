//! Frame providers for a capture session.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use super::types::{CameraError, CameraFrame, CameraSettings, Resolution};

/// Something that produces grayscale frames.
///
/// Sources are created and driven on the capture thread, so they need not be
/// `Send`.
pub trait FrameSource {
    /// Prepare the stream. Returns the resolution actually in use.
    fn open(&mut self, settings: &CameraSettings) -> Result<Resolution, CameraError>;

    /// Capture the next frame; `Ok(None)` means the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<CameraFrame>, CameraError>;

    /// Stop the stream. Called once after the last `next_frame`.
    fn close(&mut self) {}
}

/// A source that never opens, for builds or hosts without a camera.
#[derive(Debug, Clone)]
pub struct UnavailableSource {
    reason: String,
}

impl UnavailableSource {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl FrameSource for UnavailableSource {
    fn open(&mut self, _settings: &CameraSettings) -> Result<Resolution, CameraError> {
        Err(CameraError::OpenFailed(self.reason.clone()))
    }

    fn next_frame(&mut self) -> Result<Option<CameraFrame>, CameraError> {
        Ok(None)
    }
}

/// A decoded still image kept in memory.
#[derive(Debug, Clone)]
pub struct StillFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl StillFrame {
    /// Load any image format the `image` crate understands and convert to luma.
    pub fn load(path: &Path) -> Result<Self, CameraError> {
        let img = image::open(path).map_err(|e| CameraError::ImageLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let luma = img.to_luma8();
        let (width, height) = luma.dimensions();
        Ok(Self {
            data: luma.into_raw(),
            width,
            height,
        })
    }

    fn to_frame(&self) -> CameraFrame {
        CameraFrame::new(self.data.clone(), self.width, self.height)
    }
}

/// Replays still images as if they came from a camera.
#[derive(Debug, Clone)]
pub struct ImageSequenceSource {
    frames: Vec<StillFrame>,
    paths: Vec<PathBuf>,
    position: usize,
    looping: bool,
    interval: Option<Duration>,
}

impl ImageSequenceSource {
    /// Load the images up front; `open()` fails if any of them was unreadable.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            frames: Vec::new(),
            paths: paths.into_iter().collect(),
            position: 0,
            looping: false,
            interval: None,
        }
    }

    pub fn from_frames(frames: Vec<StillFrame>) -> Self {
        Self {
            frames,
            paths: Vec::new(),
            position: 0,
            looping: false,
            interval: None,
        }
    }

    /// Start over after the last frame instead of ending the stream.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Pace delivery, e.g. to mimic a camera's frame rate.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len() + self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FrameSource for ImageSequenceSource {
    fn open(&mut self, _settings: &CameraSettings) -> Result<Resolution, CameraError> {
        for path in std::mem::take(&mut self.paths) {
            self.frames.push(StillFrame::load(&path)?);
        }
        let first = self.frames.first().ok_or(CameraError::NoDevices)?;
        Ok(Resolution {
            width: first.width,
            height: first.height,
        })
    }

    fn next_frame(&mut self) -> Result<Option<CameraFrame>, CameraError> {
        if self.position >= self.frames.len() {
            if !self.looping || self.frames.is_empty() {
                return Ok(None);
            }
            self.position = 0;
        }
        if let Some(interval) = self.interval {
            thread::sleep(interval);
        }
        let frame = self.frames[self.position].to_frame();
        self.position += 1;
        Ok(Some(frame))
    }
}
