//! Camera permission handling.
//!
//! Scanning needs the camera, and the camera needs the user's consent. The
//! permission starts out `NotRequested`, is resolved once by a
//! [`PermissionProbe`], and a `Denied` result is surfaced with a hint for
//! where to grant access before retrying.

use std::fmt;

/// Where the camera permission stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionStatus {
    #[default]
    NotRequested,
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PermissionStatus::NotRequested => "not requested",
            PermissionStatus::Granted => "granted",
            PermissionStatus::Denied => "denied",
        };
        f.write_str(s)
    }
}

/// Result of a permission check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCheckResult {
    pub status: PermissionStatus,
    /// Backend message when access was refused
    pub details: Option<String>,
}

impl PermissionCheckResult {
    pub fn granted() -> Self {
        Self {
            status: PermissionStatus::Granted,
            details: None,
        }
    }

    pub fn denied(details: Option<String>) -> Self {
        Self {
            status: PermissionStatus::Denied,
            details,
        }
    }
}

/// Resolves the camera permission.
pub trait PermissionProbe {
    fn check(&mut self) -> PermissionCheckResult;
}

/// Probe for sources that need no consent, such as image files.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysGranted;

impl PermissionProbe for AlwaysGranted {
    fn check(&mut self) -> PermissionCheckResult {
        PermissionCheckResult::granted()
    }
}

/// Asks the platform camera backend by enumerating devices.
///
/// Only an explicit refusal counts as `Denied`. Other enumeration failures
/// report `Granted` and surface later when the camera is opened.
#[cfg(feature = "camera")]
#[derive(Debug, Default, Clone, Copy)]
pub struct CameraProbe;

#[cfg(feature = "camera")]
impl PermissionProbe for CameraProbe {
    fn check(&mut self) -> PermissionCheckResult {
        match crate::camera::list_devices() {
            Ok(_) => PermissionCheckResult::granted(),
            Err(crate::camera::CameraError::PermissionDenied) => PermissionCheckResult::denied(
                Some("Camera backend refused access".to_string()),
            ),
            Err(e) => {
                log::debug!("Device query failed during permission check: {}", e);
                PermissionCheckResult::granted()
            }
        }
    }
}

/// Whether a backend error message looks like a refused permission.
pub fn is_permission_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["permission", "denied", "authoriz", "not allowed", "access"]
        .iter()
        .any(|needle| lower.contains(needle))
}

/// Where the user grants camera access on this platform.
pub fn settings_path() -> &'static str {
    if cfg!(target_os = "macos") {
        "System Settings > Privacy & Security > Camera"
    } else if cfg!(target_os = "windows") {
        "Settings > Privacy & security > Camera"
    } else {
        "the video device permissions (e.g. add your user to the `video` group)"
    }
}

/// Shell command that opens the camera settings, where one exists.
pub fn settings_command() -> Option<&'static str> {
    if cfg!(target_os = "macos") {
        Some("open \"x-apple.systempreferences:com.apple.preference.security?Privacy_Camera\"")
    } else if cfg!(target_os = "windows") {
        Some("start ms-settings:privacy-webcam")
    } else {
        None
    }
}

/// Camera access was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionError {
    pub details: Option<String>,
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Camera permission is required to scan.\n\n\
            Please grant permission in:\n  {}",
            settings_path()
        )?;

        if let Some(cmd) = settings_command() {
            write!(f, "\n\nYou can open the settings directly by running:\n  {}", cmd)?;
        }

        if let Some(ref details) = self.details {
            write!(f, "\n\nDetails: {}", details)?;
        }

        Ok(())
    }
}

impl std::error::Error for PermissionError {}

/// Print a denied permission with the retry hint.
pub fn print_permission_error(error: &PermissionError) {
    eprintln!("\n{}\n", error);
    eprintln!("After granting permission, run the scan again.\n");
}
