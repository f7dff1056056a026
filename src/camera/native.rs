//! Platform camera backend (nokhwa).

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::{query, Camera};

use super::frame_utils::rgb_to_luma_into;
use super::source::FrameSource;
use super::types::{CameraError, CameraFrame, CameraInfo, CameraSettings, Resolution};
use crate::permissions::is_permission_error;

/// List all available camera devices on the system.
///
/// If no cameras are found, returns an empty vector (not an error).
pub fn list_devices() -> Result<Vec<CameraInfo>, CameraError> {
    let devices = query(ApiBackend::Auto).map_err(|e| {
        let msg = e.to_string();
        if is_permission_error(&msg) {
            CameraError::PermissionDenied
        } else {
            CameraError::QueryFailed(msg)
        }
    })?;

    Ok(devices
        .into_iter()
        .map(|d| CameraInfo {
            index: d.index().as_index().unwrap_or(0),
            name: d.human_name(),
            description: d.description().to_string(),
        })
        .collect())
}

/// Live frames from a physical camera, converted to luma.
pub struct NativeCameraSource {
    camera: Option<Camera>,
    luma: Vec<u8>,
}

impl NativeCameraSource {
    pub fn new() -> Self {
        Self {
            camera: None,
            luma: Vec::new(),
        }
    }
}

impl Default for NativeCameraSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for NativeCameraSource {
    fn open(&mut self, settings: &CameraSettings) -> Result<Resolution, CameraError> {
        let devices = list_devices()?;
        if devices.is_empty() {
            return Err(CameraError::NoDevices);
        }
        if !devices.iter().any(|d| d.index == settings.device_index) {
            return Err(CameraError::DeviceNotFound(settings.device_index));
        }

        let index = CameraIndex::Index(settings.device_index);
        let mut camera = open_camera_with_fallback(&index, settings)?;
        camera
            .open_stream()
            .map_err(|e| CameraError::StreamFailed(e.to_string()))?;

        let res = camera.resolution();
        log::info!(
            "Camera {} streaming at {}x{} @ {} fps",
            settings.device_index,
            res.width(),
            res.height(),
            camera.frame_rate()
        );
        self.camera = Some(camera);
        Ok(Resolution {
            width: res.width(),
            height: res.height(),
        })
    }

    fn next_frame(&mut self) -> Result<Option<CameraFrame>, CameraError> {
        let Some(camera) = self.camera.as_mut() else {
            return Ok(None);
        };
        let raw = camera
            .frame()
            .map_err(|e| CameraError::StreamFailed(e.to_string()))?;
        let rgb = raw
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::StreamFailed(e.to_string()))?;

        rgb_to_luma_into(rgb.as_raw(), &mut self.luma);
        Ok(Some(CameraFrame::new(
            self.luma.clone(),
            rgb.width(),
            rgb.height(),
        )))
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            let _ = camera.stop_stream();
        }
    }
}

/// Try multiple format strategies in order of preference.
fn open_camera_with_fallback(
    index: &CameraIndex,
    settings: &CameraSettings,
) -> Result<Camera, CameraError> {
    let requested = |format| {
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            nokhwa::utils::Resolution::new(settings.resolution.width, settings.resolution.height),
            format,
            settings.fps,
        )))
    };
    let format_attempts = [
        // NV12 is native on macOS
        requested(NokhwaFrameFormat::NV12),
        // MJPEG is widely supported
        requested(NokhwaFrameFormat::MJPEG),
        // Let the camera pick
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = None;
    for format in format_attempts {
        match Camera::new(index.clone(), format) {
            Ok(cam) => return Ok(cam),
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    let msg = last_error.unwrap_or_else(|| "no usable camera format".to_string());
    if is_permission_error(&msg) {
        Err(CameraError::PermissionDenied)
    } else {
        Err(CameraError::OpenFailed(msg))
    }
}
