//! UI state, events and effects.

use crate::codec::{BarcodeImage, ScanResult};
use crate::format::BarcodeFormat;
use crate::permissions::PermissionStatus;

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Generate,
    Scan,
}

/// Scan screen progress.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanPhase {
    #[default]
    Scanning,
    /// A code was read; shown until the user scans again
    Result(ScanResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message for the user, shown until dismissed or replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// The user can act (grant permission, reconnect) and try again
    pub retryable: bool,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

/// The last generated code together with the format it was generated as.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub text: String,
    pub image: BarcodeImage,
}

impl Generated {
    pub fn format(&self) -> BarcodeFormat {
        self.image.format()
    }
}

/// Everything the front-end renders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub mode: Mode,
    pub format: BarcodeFormat,
    pub input: String,
    pub generated: Option<Generated>,
    pub scan: ScanPhase,
    pub permission: PermissionStatus,
    /// Whether a camera session is supposed to be running
    pub camera_active: bool,
    pub notice: Option<Notice>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The decoded result on screen, if any.
    pub fn scan_result(&self) -> Option<&ScanResult> {
        match &self.scan {
            ScanPhase::Result(result) => Some(result),
            ScanPhase::Scanning => None,
        }
    }
}

/// User actions and session callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    SelectMode(Mode),
    SelectFormat(BarcodeFormat),
    EditInput(String),
    Generate,
    PermissionResolved(PermissionStatus),
    ScanDecoded(ScanResult),
    ScanAgain,
    CameraFailed(String),
    DismissNotice,
}

/// Side effects the front-end must carry out after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    RequestCameraPermission,
    StartCamera,
    StopCamera,
}

/// Result of reducing one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: AppState,
    pub effects: Vec<Effect>,
}

impl Transition {
    pub fn to(state: AppState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    pub fn with(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}
