//! Capture session: a frame source feeding a frame analyzer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::UnboundedSender;

use super::feed::FrameFeed;
use super::source::FrameSource;
use super::types::{CameraError, CameraSettings, Resolution};
use crate::analyzer::{AnalysisOutcome, FrameAnalyzer, ScanGate};
use crate::codec::ScanResult;

/// A running capture session.
///
/// Two background threads: the capture thread drives the [`FrameSource`] and
/// publishes into a latest-only [`FrameFeed`]; the analysis thread takes
/// frames one at a time and runs the [`FrameAnalyzer`]. Decoded results are
/// sent on the channel given to [`start`](CameraSession::start). The channel
/// closes when the session ends.
pub struct CameraSession {
    capture_thread: Option<JoinHandle<()>>,
    analysis_thread: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    feed: Arc<FrameFeed>,
    gate: ScanGate,
    settings: CameraSettings,
    resolution: Resolution,
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("settings", &self.settings)
            .field("resolution", &self.resolution)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl CameraSession {
    /// Open the source and start both threads.
    ///
    /// `make_source` runs on the capture thread, so backends that are not
    /// `Send` can be used. Returns once the source has opened (or failed to).
    ///
    /// # Errors
    /// Whatever [`FrameSource::open`] reports, or `StreamFailed` if the
    /// capture thread dies before reporting.
    pub fn start<F, S>(
        make_source: F,
        settings: CameraSettings,
        analyzer: FrameAnalyzer,
        results: UnboundedSender<ScanResult>,
    ) -> Result<Self, CameraError>
    where
        F: FnOnce() -> S + Send + 'static,
        S: FrameSource,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let feed = Arc::new(FrameFeed::new());
        let gate = analyzer.gate().clone();

        let (info_tx, info_rx) = std_mpsc::channel::<Result<Resolution, CameraError>>();

        let capture_thread = {
            let stop = Arc::clone(&stop_signal);
            let feed = Arc::clone(&feed);
            let settings = settings.clone();
            thread::Builder::new()
                .name("capture".into())
                .spawn(move || run_capture_loop(make_source, settings, feed, stop, info_tx))
                .map_err(|e| CameraError::StreamFailed(e.to_string()))?
        };

        let resolution = match info_rx.recv() {
            Ok(Ok(res)) => res,
            Ok(Err(e)) => {
                let _ = capture_thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = capture_thread.join();
                return Err(CameraError::StreamFailed(
                    "Capture thread terminated unexpectedly".to_string(),
                ));
            }
        };

        let analysis_thread = {
            let stop = Arc::clone(&stop_signal);
            let feed = Arc::clone(&feed);
            let stop_on_result = settings.stop_on_result;
            thread::Builder::new()
                .name("analysis".into())
                .spawn(move || run_analysis_loop(analyzer, feed, stop, stop_on_result, results))
        };
        let analysis_thread = match analysis_thread {
            Ok(handle) => handle,
            Err(e) => {
                stop_signal.store(true, Ordering::SeqCst);
                feed.close();
                let _ = capture_thread.join();
                return Err(CameraError::StreamFailed(e.to_string()));
            }
        };

        log::info!("Capture session started at {}", resolution);

        Ok(Self {
            capture_thread: Some(capture_thread),
            analysis_thread: Some(analysis_thread),
            stop_signal,
            feed,
            gate,
            settings,
            resolution,
        })
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Resolution reported by the source when it opened.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// The Scanning/Stopped flag; call `rearm()` on it to scan again.
    pub fn gate(&self) -> &ScanGate {
        &self.gate
    }

    /// Frames the analyzer never saw because a newer one replaced them.
    pub fn dropped_frames(&self) -> u64 {
        self.feed.dropped()
    }

    pub fn is_running(&self) -> bool {
        self.analysis_thread
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Stop both threads and wait for them. An in-flight decode completes
    /// first. Safe to call more than once.
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        self.feed.close();

        if let Some(handle) = self.capture_thread.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.analysis_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_capture_loop<F, S>(
    make_source: F,
    settings: CameraSettings,
    feed: Arc<FrameFeed>,
    stop: Arc<AtomicBool>,
    info_tx: std_mpsc::Sender<Result<Resolution, CameraError>>,
) where
    F: FnOnce() -> S,
    S: FrameSource,
{
    let mut source = make_source();

    match source.open(&settings) {
        Ok(res) => {
            let _ = info_tx.send(Ok(res));
        }
        Err(e) => {
            let _ = info_tx.send(Err(e));
            feed.close();
            return;
        }
    }

    while !stop.load(Ordering::Relaxed) {
        match source.next_frame() {
            Ok(Some(frame)) => {
                if !feed.publish(frame) {
                    break;
                }
            }
            Ok(None) => {
                log::debug!("Frame source exhausted");
                break;
            }
            Err(e) => {
                log::warn!("Capture stopped: {}", e);
                break;
            }
        }
    }

    source.close();
    // Lets the analysis thread drain the last frame and exit
    feed.finish();
}

fn run_analysis_loop(
    mut analyzer: FrameAnalyzer,
    feed: Arc<FrameFeed>,
    stop: Arc<AtomicBool>,
    stop_on_result: bool,
    results: UnboundedSender<ScanResult>,
) {
    while let Some(frame) = feed.recv() {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        if let AnalysisOutcome::Found(result) = analyzer.analyze(frame) {
            if results.send(result).is_err() {
                log::debug!("Result receiver dropped, ending session");
                break;
            }
            if stop_on_result {
                break;
            }
        }
    }

    // Unbind: stop the producer too
    stop.store(true, Ordering::SeqCst);
    feed.close();

    let stats = analyzer.stats();
    log::debug!(
        "Analysis finished: {} frames, {} decoded, {} misses, {} skipped",
        stats.frames,
        stats.decoded,
        stats.misses,
        stats.skipped
    );
}
