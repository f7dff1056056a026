//! Per-frame barcode analysis for live scanning.
//!
//! The analyzer is a two-state machine (Scanning / Stopped) whose state lives
//! in a [`ScanGate`] shared with the UI. Each frame is decoded over the crop
//! windows of a [`CropPolicy`]; the first hit flips the gate to Stopped and is
//! reported exactly once until the gate is re-armed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::camera::CameraFrame;
use crate::codec::{DecodeOutcome, Decoder, LumaView, ScanResult};

/// Scanning/Stopped flag shared between the analyzer and the UI.
#[derive(Debug, Clone)]
pub struct ScanGate {
    armed: Arc<AtomicBool>,
}

/// Observable state of a [`ScanGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Scanning,
    Stopped,
}

impl ScanGate {
    /// A new gate, armed (Scanning).
    pub fn new() -> Self {
        Self {
            armed: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn state(&self) -> ScanState {
        if self.armed.load(Ordering::Acquire) {
            ScanState::Scanning
        } else {
            ScanState::Stopped
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.state() == ScanState::Scanning
    }

    /// Return to Scanning ("scan again").
    pub fn rearm(&self) {
        self.armed.store(true, Ordering::Release);
    }

    /// Stop without a result, e.g. when the view goes away.
    pub fn stop(&self) {
        self.armed.store(false, Ordering::Release);
    }

    /// Atomically move Scanning -> Stopped. Only one caller per arm cycle
    /// gets `true`.
    pub fn try_claim(&self) -> bool {
        self.armed
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for ScanGate {
    fn default() -> Self {
        Self::new()
    }
}

/// A crop window expressed as fractions of the frame size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropWindow {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl CropWindow {
    /// The whole frame.
    pub const FULL: CropWindow = CropWindow {
        left: 0.0,
        top: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// A centered window covering `fraction` of each dimension.
    pub fn centered(fraction: f32) -> Self {
        let fraction = fraction.clamp(0.0, 1.0);
        let margin = (1.0 - fraction) / 2.0;
        Self {
            left: margin,
            top: margin,
            width: fraction,
            height: fraction,
        }
    }

    /// Resolve against a view, or `None` if the window rounds to nothing.
    pub fn apply<'a>(&self, view: &LumaView<'a>) -> Option<LumaView<'a>> {
        let w = view.width() as f32;
        let h = view.height() as f32;
        let left = (w * self.left) as u32;
        let top = (h * self.top) as u32;
        let width = ((w * self.width) as u32).min(view.width().saturating_sub(left));
        let height = ((h * self.height) as u32).min(view.height().saturating_sub(top));
        view.crop(left, top, width, height)
    }
}

/// Ordered list of windows to try on each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CropPolicy {
    windows: Vec<CropWindow>,
}

impl CropPolicy {
    /// Full frame first, then the centered half, which helps with small
    /// off-axis codes.
    pub fn standard() -> Self {
        Self::with_center_crop(0.5)
    }

    pub fn full_frame_only() -> Self {
        Self {
            windows: vec![CropWindow::FULL],
        }
    }

    pub fn with_center_crop(fraction: f32) -> Self {
        let mut windows = vec![CropWindow::FULL];
        if fraction > 0.0 && fraction < 1.0 {
            windows.push(CropWindow::centered(fraction));
        }
        Self { windows }
    }

    pub fn windows(&self) -> &[CropWindow] {
        &self.windows
    }

    /// Views over `frame`, in attempt order.
    pub fn views<'a>(&self, frame: &LumaView<'a>) -> Vec<LumaView<'a>> {
        self.windows
            .iter()
            .filter_map(|window| window.apply(frame))
            .collect()
    }
}

impl Default for CropPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// What happened to one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// A code was decoded and this frame won the arm cycle
    Found(ScanResult),
    /// Nothing decodable in any window
    NotFound,
    /// The gate was already stopped; the frame was not decoded
    Skipped,
}

/// Running totals, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzerStats {
    pub frames: u64,
    pub decoded: u64,
    pub misses: u64,
    pub skipped: u64,
}

/// Turns camera frames into at most one result per arm cycle.
#[derive(Debug)]
pub struct FrameAnalyzer {
    decoder: Decoder,
    policy: CropPolicy,
    gate: ScanGate,
    stats: AnalyzerStats,
}

impl FrameAnalyzer {
    pub fn new(decoder: Decoder, policy: CropPolicy, gate: ScanGate) -> Self {
        Self {
            decoder,
            policy,
            gate,
            stats: AnalyzerStats::default(),
        }
    }

    pub fn gate(&self) -> &ScanGate {
        &self.gate
    }

    pub fn stats(&self) -> AnalyzerStats {
        self.stats
    }

    /// Analyze one frame. The frame is released before this returns.
    pub fn analyze(&mut self, frame: CameraFrame) -> AnalysisOutcome {
        self.stats.frames += 1;

        if !self.gate.is_scanning() {
            self.stats.skipped += 1;
            return AnalysisOutcome::Skipped;
        }

        let Some(full) = frame.luma_view() else {
            log::warn!(
                "Dropping malformed frame: {} bytes for {}x{}",
                frame.data().len(),
                frame.width(),
                frame.height()
            );
            self.stats.misses += 1;
            return AnalysisOutcome::NotFound;
        };

        log::trace!(
            "Analyzing {}x{} frame (rotation {})",
            frame.width(),
            frame.height(),
            frame.rotation().degrees()
        );

        for view in self.policy.views(&full) {
            if let DecodeOutcome::Found(result) = self.decoder.decode(&view) {
                if self.gate.try_claim() {
                    log::info!("Decoded {}: {}", result.format, result.text);
                    self.stats.decoded += 1;
                    return AnalysisOutcome::Found(result);
                }
                // Someone else already reported for this arm cycle
                self.stats.skipped += 1;
                return AnalysisOutcome::Skipped;
            }
        }

        self.stats.misses += 1;
        AnalysisOutcome::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::format::BarcodeFormat;

    fn qr_frame(text: &str) -> CameraFrame {
        let image = encode(text, BarcodeFormat::Qr).unwrap();
        CameraFrame::new(image.pixels().to_vec(), image.width(), image.height())
    }

    fn blank_frame() -> CameraFrame {
        CameraFrame::new(vec![255; 200 * 200], 200, 200)
    }

    fn analyzer() -> FrameAnalyzer {
        FrameAnalyzer::new(
            Decoder::new(&[BarcodeFormat::Qr], true),
            CropPolicy::standard(),
            ScanGate::new(),
        )
    }

    #[test]
    fn test_gate_claim_is_exclusive() {
        let gate = ScanGate::new();
        let other = gate.clone();
        assert!(gate.try_claim());
        assert!(!other.try_claim());
        assert_eq!(gate.state(), ScanState::Stopped);
        other.rearm();
        assert_eq!(gate.state(), ScanState::Scanning);
    }

    #[test]
    fn test_centered_window_matches_quarter_offsets() {
        let data = vec![0u8; 640 * 480];
        let view = LumaView::full(&data, 640, 480).unwrap();
        let center = CropWindow::centered(0.5).apply(&view).unwrap();
        assert_eq!((center.width(), center.height()), (320, 240));
        // The window starts at (160, 120): a quarter of each dimension
        let data: Vec<u8> = (0..16).collect();
        let view = LumaView::full(&data, 4, 4).unwrap();
        let center = CropWindow::centered(0.5).apply(&view).unwrap();
        assert_eq!(center.to_vec(), vec![5, 6, 9, 10]);
    }

    #[test]
    fn test_policy_window_order() {
        assert_eq!(CropPolicy::standard().windows().len(), 2);
        assert_eq!(CropPolicy::standard().windows()[0], CropWindow::FULL);
        assert_eq!(CropPolicy::full_frame_only().windows().len(), 1);
        assert_eq!(CropPolicy::with_center_crop(1.0).windows().len(), 1);
    }

    #[test]
    fn test_blank_frame_not_found() {
        let mut analyzer = analyzer();
        assert_eq!(analyzer.analyze(blank_frame()), AnalysisOutcome::NotFound);
        assert!(analyzer.gate().is_scanning());
    }

    #[test]
    fn test_first_hit_stops_gate() {
        let mut analyzer = analyzer();
        match analyzer.analyze(qr_frame("first")) {
            AnalysisOutcome::Found(result) => assert_eq!(result.text, "first"),
            other => panic!("Expected Found, got {:?}", other),
        }
        assert_eq!(analyzer.gate().state(), ScanState::Stopped);
        assert_eq!(analyzer.analyze(qr_frame("second")), AnalysisOutcome::Skipped);

        analyzer.gate().rearm();
        match analyzer.analyze(qr_frame("third")) {
            AnalysisOutcome::Found(result) => assert_eq!(result.text, "third"),
            other => panic!("Expected Found, got {:?}", other),
        }

        let stats = analyzer.stats();
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.decoded, 2);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_malformed_frame_is_a_miss() {
        let mut analyzer = analyzer();
        let frame = CameraFrame::new(vec![0; 10], 100, 100);
        assert_eq!(analyzer.analyze(frame), AnalysisOutcome::NotFound);
    }
}
