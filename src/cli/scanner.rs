//! Live scanning: runs the reducer's effects against a camera session.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::runtime::RuntimeFlavor;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use super::interrupt::Interrupt;
use crate::analyzer::{FrameAnalyzer, ScanGate};
use crate::app::{reduce, AppEvent, AppState, Effect, Mode};
use crate::camera::{CameraSession, CameraSettings, FrameSource};
use crate::codec::ScanResult;
use crate::config::Config;
use crate::error::AppError;
use crate::permissions::{PermissionError, PermissionProbe, PermissionStatus};

/// Pause before re-arming in continuous mode, so one code held in front of
/// the camera is not reported on every frame.
pub const RESCAN_DELAY: Duration = Duration::from_millis(1500);

/// Run a blocking camera call without stalling the async workers.
///
/// `block_in_place` needs the multi-threaded runtime; elsewhere (no runtime,
/// or a current-thread one) the call runs inline.
fn blocking<R>(f: impl FnOnce() -> R) -> R {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if matches!(handle.runtime_flavor(), RuntimeFlavor::MultiThread) => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Owns the UI state and the camera session that the state asks for.
pub struct LiveScanner<P, F> {
    probe: P,
    make_source: F,
    config: Config,
    settings: CameraSettings,
    continuous: bool,
    state: AppState,
    session: Option<CameraSession>,
    results: Option<UnboundedReceiver<ScanResult>>,
}

impl<P, F, S> LiveScanner<P, F>
where
    P: PermissionProbe,
    F: Fn() -> S + Clone + Send + 'static,
    S: FrameSource,
{
    /// `continuous` keeps one session open across results instead of
    /// tearing it down after each decode.
    pub fn new(probe: P, make_source: F, config: Config, continuous: bool) -> Self {
        let mut settings = config.camera_settings();
        settings.stop_on_result = !continuous;
        Self {
            probe,
            make_source,
            config,
            settings,
            continuous,
            state: AppState::new(),
            session: None,
            results: None,
        }
    }

    pub fn with_device(mut self, device: Option<u32>) -> Self {
        if let Some(index) = device {
            self.settings.device_index = index;
        }
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn is_camera_running(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_running())
    }

    /// Reduce an event and carry out every effect it causes.
    ///
    /// The state is always advanced. A refused permission or a camera that
    /// fails to start is also returned as an error so the caller can report it.
    pub fn dispatch(&mut self, event: AppEvent) -> Result<(), AppError> {
        let mut queue = VecDeque::from([event]);
        let mut failure = None;

        while let Some(event) = queue.pop_front() {
            let transition = reduce(&self.state, event);
            self.state = transition.state;

            for effect in transition.effects {
                log::debug!("Running effect {:?}", effect);
                match effect {
                    Effect::RequestCameraPermission => {
                        let probe = &mut self.probe;
                        let check = blocking(|| probe.check());
                        if check.status == PermissionStatus::Denied {
                            failure = Some(AppError::PermissionDenied(PermissionError {
                                details: check.details,
                            }));
                        }
                        queue.push_back(AppEvent::PermissionResolved(check.status));
                    }
                    Effect::StartCamera => {
                        if let Err(e) = self.start_camera() {
                            queue.push_back(AppEvent::CameraFailed(e.to_string()));
                            failure = Some(e);
                        }
                    }
                    Effect::StopCamera => self.stop_camera(),
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn start_camera(&mut self) -> Result<(), AppError> {
        if let Some(session) = self.session.as_ref().filter(|s| s.is_running()) {
            session.gate().rearm();
            return Ok(());
        }
        self.stop_session();

        let (tx, rx) = unbounded_channel();
        let analyzer = FrameAnalyzer::new(
            self.config.decoder(),
            self.config.crop_policy(),
            ScanGate::new(),
        );
        let (make_source, settings) = (self.make_source.clone(), self.settings.clone());
        let session = blocking(|| CameraSession::start(make_source, settings, analyzer, tx))?;
        self.session = Some(session);
        self.results = Some(rx);
        Ok(())
    }

    fn stop_camera(&mut self) {
        // Still on the scan screen in continuous mode: pause, keep the stream
        if self.continuous && self.state.mode == Mode::Scan {
            if let Some(session) = &self.session {
                session.gate().stop();
                return;
            }
        }
        self.stop_session();
    }

    fn stop_session(&mut self) {
        self.results = None;
        if let Some(mut session) = self.session.take() {
            // Joins the capture and analysis threads
            blocking(|| session.stop());
            log::debug!(
                "Camera session stopped ({} frames dropped)",
                session.dropped_frames()
            );
        }
    }

    /// Wait for the next decoded code. Returns `None` if the camera stream
    /// ended on its own; never resolves while no session is open.
    pub async fn next_result(&mut self) -> Option<ScanResult> {
        let Some(rx) = self.results.as_mut() else {
            return std::future::pending().await;
        };
        let result = rx.recv().await;
        if result.is_none() {
            self.stop_session();
        }
        result
    }

    /// Stop the camera, if any.
    pub fn shutdown(&mut self) {
        self.stop_session();
    }
}

/// Scan until a code is found (or, in continuous mode, until interrupted).
///
/// Prints each result as it arrives and returns how many were found.
pub async fn run_camera_scan<P, F, S>(
    scanner: &mut LiveScanner<P, F>,
    interrupt: &mut Interrupt,
    timeout: Option<Duration>,
) -> Result<usize, AppError>
where
    P: PermissionProbe,
    F: Fn() -> S + Clone + Send + 'static,
    S: FrameSource,
{
    scanner.dispatch(AppEvent::SelectMode(Mode::Scan))?;
    eprintln!("Scanning... point the camera at a code (Ctrl+C to stop)");

    let deadline = async move {
        match timeout {
            Some(t) => tokio::time::sleep(t).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let mut found = 0;
    let mut rearm_at: Option<tokio::time::Instant> = None;

    loop {
        let rearm = async move {
            match rearm_at {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = interrupt.wait() => break,
            _ = &mut deadline => {
                eprintln!("Timed out waiting for a code");
                break;
            }
            _ = rearm => {
                rearm_at = None;
                scanner.dispatch(AppEvent::ScanAgain)?;
            }
            result = scanner.next_result() => match result {
                Some(result) => {
                    scanner.dispatch(AppEvent::ScanDecoded(result))?;
                    if let Some(shown) = scanner.state().scan_result() {
                        println!("[{}] {}", shown.format, shown.text);
                        found += 1;
                    }
                    if !scanner.continuous {
                        break;
                    }
                    rearm_at = Some(tokio::time::Instant::now() + RESCAN_DELAY);
                }
                None => {
                    let reason = "camera stream ended".to_string();
                    let _ = scanner.dispatch(AppEvent::CameraFailed(reason.clone()));
                    return Err(AppError::CameraInitFailed(reason));
                }
            }
        }
    }

    scanner.shutdown();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ScanPhase;
    use crate::camera::{
        CameraError, CameraFrame, ImageSequenceSource, Resolution, StillFrame,
    };
    use crate::codec::encode;
    use crate::format::BarcodeFormat;
    use crate::permissions::{AlwaysGranted, PermissionCheckResult};

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Refuse;

    /// Takes a while to open, like a camera warming up.
    struct SlowOpen;

    impl FrameSource for SlowOpen {
        fn open(&mut self, _settings: &CameraSettings) -> Result<Resolution, CameraError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(Resolution {
                width: 32,
                height: 32,
            })
        }

        fn next_frame(&mut self) -> Result<Option<CameraFrame>, CameraError> {
            std::thread::sleep(Duration::from_millis(10));
            Ok(Some(CameraFrame::new(vec![255; 32 * 32], 32, 32)))
        }
    }

    impl PermissionProbe for Refuse {
        fn check(&mut self) -> PermissionCheckResult {
            PermissionCheckResult::denied(None)
        }
    }

    fn still(text: &str) -> StillFrame {
        let image = encode(text, BarcodeFormat::Qr).unwrap();
        StillFrame {
            data: image.pixels().to_vec(),
            width: image.width(),
            height: image.height(),
        }
    }

    fn looping_source(
        text: &'static str,
    ) -> impl Fn() -> ImageSequenceSource + Clone + Send + 'static {
        move || {
            ImageSequenceSource::from_frames(vec![still(text)])
                .looping(true)
                .interval(Duration::from_millis(5))
        }
    }

    #[tokio::test]
    async fn test_single_scan_reports_one_result() {
        let mut scanner =
            LiveScanner::new(AlwaysGranted, looping_source("live"), Config::default(), false);
        let (mut interrupt, _handle) = Interrupt::new();

        let found = run_camera_scan(&mut scanner, &mut interrupt, Some(Duration::from_secs(10)))
            .await
            .unwrap();
        assert_eq!(found, 1);
        assert_eq!(scanner.state().scan_result().unwrap().text, "live");
        assert!(!scanner.is_camera_running());
    }

    #[tokio::test]
    async fn test_denied_permission_is_an_error() {
        let mut scanner =
            LiveScanner::new(Refuse, looping_source("live"), Config::default(), false);
        let (mut interrupt, _handle) = Interrupt::new();

        let result = run_camera_scan(&mut scanner, &mut interrupt, None).await;
        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
        assert_eq!(scanner.state().permission, PermissionStatus::Denied);
        assert!(!scanner.is_camera_running());
    }

    #[test]
    fn test_camera_failure_becomes_notice() {
        let empty = || ImageSequenceSource::from_frames(Vec::new());
        let mut scanner = LiveScanner::new(AlwaysGranted, empty, Config::default(), false);

        let result = scanner.dispatch(AppEvent::SelectMode(Mode::Scan));
        assert!(matches!(result, Err(AppError::CameraInitFailed(_))));
        assert!(scanner.state().notice.as_ref().unwrap().retryable);
        assert!(!scanner.state().camera_active);
    }

    #[tokio::test]
    async fn test_continuous_mode_keeps_session_between_results() {
        let mut scanner =
            LiveScanner::new(AlwaysGranted, looping_source("again"), Config::default(), true);
        scanner.dispatch(AppEvent::SelectMode(Mode::Scan)).unwrap();

        let first = scanner.next_result().await.unwrap();
        scanner.dispatch(AppEvent::ScanDecoded(first)).unwrap();
        assert!(matches!(scanner.state().scan, ScanPhase::Result(_)));
        assert!(scanner.is_camera_running());

        scanner.dispatch(AppEvent::ScanAgain).unwrap();
        let second = scanner.next_result().await.unwrap();
        assert_eq!(second.text, "again");

        // Leaving the scan screen closes the session
        scanner.dispatch(AppEvent::SelectMode(Mode::Generate)).unwrap();
        assert!(!scanner.is_camera_running());
    }

    #[tokio::test]
    async fn test_interrupt_ends_continuous_scan() {
        let mut scanner =
            LiveScanner::new(AlwaysGranted, looping_source("x"), Config::default(), true);
        let (mut interrupt, handle) = Interrupt::new();
        handle.fire();

        let found = run_camera_scan(&mut scanner, &mut interrupt, None).await.unwrap();
        assert!(found <= 1);
        assert!(!scanner.is_camera_running());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_slow_camera_open_does_not_stall_runtime() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = Arc::clone(&ticks);
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        let during_open = {
            let ticks = Arc::clone(&ticks);
            tokio::spawn(async move {
                let mut scanner =
                    LiveScanner::new(AlwaysGranted, || SlowOpen, Config::default(), false);
                let before = ticks.load(Ordering::SeqCst);
                scanner.dispatch(AppEvent::SelectMode(Mode::Scan)).unwrap();
                let after = ticks.load(Ordering::SeqCst);
                assert!(scanner.is_camera_running());
                scanner.shutdown();
                after - before
            })
        }
        .await
        .unwrap();

        ticker.abort();
        assert!(
            during_open >= 5,
            "Other tasks should keep running while the camera opens, got {} ticks",
            during_open
        );
    }
}
