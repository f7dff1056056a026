//! The state transition function.

use super::state::{AppEvent, AppState, Effect, Generated, Mode, Notice, ScanPhase, Transition};
use crate::codec::{encode, EncodeError};
use crate::format::BarcodeFormat;
use crate::permissions::{settings_path, PermissionStatus};

/// Apply one event. Pure apart from the encode call, which is deterministic.
pub fn reduce(state: &AppState, event: AppEvent) -> Transition {
    let mut next = state.clone();

    match event {
        AppEvent::SelectMode(mode) => {
            if mode == state.mode {
                return Transition::to(next);
            }
            next.mode = mode;
            match mode {
                Mode::Scan => enter_scan(next),
                Mode::Generate => leave_scan(next),
            }
        }

        AppEvent::SelectFormat(format) => {
            next.format = format;
            if format == BarcodeFormat::Ean13 {
                if let Some(guidance) = format.content_guidance() {
                    next.notice = Some(Notice::info(guidance));
                }
            }
            Transition::to(next)
        }

        AppEvent::EditInput(text) => {
            next.input = text;
            Transition::to(next)
        }

        AppEvent::Generate => {
            if state.input.is_empty() {
                return Transition::to(next);
            }
            match encode(&state.input, state.format) {
                Ok(image) => {
                    next.generated = Some(Generated {
                        text: state.input.clone(),
                        image,
                    });
                    next.notice = None;
                }
                Err(err) => {
                    next.generated = None;
                    next.notice = Some(encode_notice(&err));
                }
            }
            Transition::to(next)
        }

        AppEvent::PermissionResolved(status) => {
            next.permission = status;
            match status {
                PermissionStatus::Granted if next.mode == Mode::Scan => start_scanning(next),
                PermissionStatus::Denied => {
                    next.camera_active = false;
                    next.notice = Some(denied_notice());
                    Transition::to(next)
                }
                _ => Transition::to(next),
            }
        }

        AppEvent::ScanDecoded(result) => {
            if state.mode != Mode::Scan || state.scan != ScanPhase::Scanning {
                return Transition::to(next);
            }
            next.scan = ScanPhase::Result(result);
            next.camera_active = false;
            Transition::to(next).with(Effect::StopCamera)
        }

        AppEvent::ScanAgain => {
            if state.mode != Mode::Scan {
                return Transition::to(next);
            }
            next.scan = ScanPhase::Scanning;
            enter_scan(next)
        }

        AppEvent::CameraFailed(reason) => {
            next.camera_active = false;
            next.notice =
                Some(Notice::error(format!("Camera failed to start: {}", reason)).retryable());
            Transition::to(next)
        }

        AppEvent::DismissNotice => {
            next.notice = None;
            Transition::to(next)
        }
    }
}

/// Either ask for the camera or start it, depending on what we know.
fn enter_scan(mut next: AppState) -> Transition {
    match next.permission {
        PermissionStatus::Granted => start_scanning(next),
        // Not asked yet, or asking again after a refusal
        PermissionStatus::NotRequested | PermissionStatus::Denied => {
            next.camera_active = false;
            Transition::to(next).with(Effect::RequestCameraPermission)
        }
    }
}

fn start_scanning(mut next: AppState) -> Transition {
    next.scan = ScanPhase::Scanning;
    if next.camera_active {
        return Transition::to(next);
    }
    next.camera_active = true;
    Transition::to(next).with(Effect::StartCamera)
}

/// Release the camera, including a session paused on a result.
fn leave_scan(mut next: AppState) -> Transition {
    next.camera_active = false;
    Transition::to(next).with(Effect::StopCamera)
}

fn encode_notice(err: &EncodeError) -> Notice {
    match err.guidance() {
        Some(guidance) => Notice::error(format!("{}\n{}", err, guidance)),
        None => Notice::error(err.to_string()),
    }
}

fn denied_notice() -> Notice {
    Notice::error(format!(
        "Camera permission is required to scan. Grant it in {} and try again.",
        settings_path()
    ))
    .retryable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::NoticeLevel;
    use crate::codec::ScanResult;

    fn apply(state: &AppState, events: Vec<AppEvent>) -> (AppState, Vec<Effect>) {
        let mut state = state.clone();
        let mut effects = Vec::new();
        for event in events {
            let t = reduce(&state, event);
            state = t.state;
            effects.extend(t.effects);
        }
        (state, effects)
    }

    fn scan_result(text: &str) -> ScanResult {
        ScanResult {
            text: text.to_string(),
            format: BarcodeFormat::Qr,
        }
    }

    fn scanning_state() -> AppState {
        let (state, _) = apply(
            &AppState::new(),
            vec![
                AppEvent::SelectMode(Mode::Scan),
                AppEvent::PermissionResolved(PermissionStatus::Granted),
            ],
        );
        state
    }

    #[test]
    fn test_initial_state() {
        let state = AppState::new();
        assert_eq!(state.mode, Mode::Generate);
        assert_eq!(state.format, BarcodeFormat::Qr);
        assert_eq!(state.permission, PermissionStatus::NotRequested);
        assert!(state.generated.is_none());
        assert!(!state.camera_active);
    }

    #[test]
    fn test_generate_with_empty_input_is_noop() {
        let state = AppState::new();
        let t = reduce(&state, AppEvent::Generate);
        assert_eq!(t.state, state);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_generate_sets_image() {
        let (state, _) = apply(
            &AppState::new(),
            vec![AppEvent::EditInput("hello".into()), AppEvent::Generate],
        );
        let generated = state.generated.unwrap();
        assert_eq!(generated.text, "hello");
        assert_eq!(generated.format(), BarcodeFormat::Qr);
        assert!(state.notice.is_none());
    }

    #[test]
    fn test_failed_generate_clears_image_and_gives_guidance() {
        let (state, _) = apply(
            &AppState::new(),
            vec![
                AppEvent::EditInput("hello".into()),
                AppEvent::Generate,
                AppEvent::SelectFormat(BarcodeFormat::Ean13),
                AppEvent::EditInput("ABCDEFGHIJKLM".into()),
                AppEvent::Generate,
            ],
        );
        assert!(state.generated.is_none());
        let notice = state.notice.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.contains("12 digits"));
    }

    #[test]
    fn test_selecting_ean13_posts_guidance() {
        let t = reduce(&AppState::new(), AppEvent::SelectFormat(BarcodeFormat::Ean13));
        let notice = t.state.notice.unwrap();
        assert_eq!(notice.level, NoticeLevel::Info);
        assert_eq!(
            notice.message,
            "EAN-13 accepts digits only: enter exactly 12 digits"
        );

        let t = reduce(&AppState::new(), AppEvent::SelectFormat(BarcodeFormat::Aztec));
        assert!(t.state.notice.is_none());
    }

    #[test]
    fn test_entering_scan_requests_permission_once() {
        let t = reduce(&AppState::new(), AppEvent::SelectMode(Mode::Scan));
        assert_eq!(t.effects, vec![Effect::RequestCameraPermission]);
        assert!(!t.state.camera_active);

        let t = reduce(&t.state, AppEvent::PermissionResolved(PermissionStatus::Granted));
        assert_eq!(t.effects, vec![Effect::StartCamera]);
        assert!(t.state.camera_active);

        // Leaving and coming back skips the request
        let (state, effects) = apply(
            &t.state,
            vec![
                AppEvent::SelectMode(Mode::Generate),
                AppEvent::SelectMode(Mode::Scan),
            ],
        );
        assert_eq!(effects, vec![Effect::StopCamera, Effect::StartCamera]);
        assert!(state.camera_active);
    }

    #[test]
    fn test_leaving_scan_after_result_releases_camera() {
        let (state, _) = apply(
            &scanning_state(),
            vec![AppEvent::ScanDecoded(scan_result("held"))],
        );
        assert!(!state.camera_active);

        let t = reduce(&state, AppEvent::SelectMode(Mode::Generate));
        assert_eq!(t.effects, vec![Effect::StopCamera]);
        assert_eq!(t.state.mode, Mode::Generate);
    }

    #[test]
    fn test_denied_permission_is_retryable() {
        let (state, _) = apply(
            &AppState::new(),
            vec![
                AppEvent::SelectMode(Mode::Scan),
                AppEvent::PermissionResolved(PermissionStatus::Denied),
            ],
        );
        assert!(!state.camera_active);
        assert!(state.notice.as_ref().unwrap().retryable);

        // Retrying asks again
        let t = reduce(&state, AppEvent::ScanAgain);
        assert_eq!(t.effects, vec![Effect::RequestCameraPermission]);
    }

    #[test]
    fn test_decode_stops_camera_and_holds_result() {
        let t = reduce(&scanning_state(), AppEvent::ScanDecoded(scan_result("one")));
        assert_eq!(t.effects, vec![Effect::StopCamera]);
        assert_eq!(t.state.scan_result().unwrap().text, "one");
        assert!(!t.state.camera_active);

        // A late second decode does not overwrite the held result
        let t = reduce(&t.state, AppEvent::ScanDecoded(scan_result("two")));
        assert_eq!(t.state.scan_result().unwrap().text, "one");
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_scan_again_replaces_result() {
        let (state, effects) = apply(
            &scanning_state(),
            vec![
                AppEvent::ScanDecoded(scan_result("first")),
                AppEvent::ScanAgain,
                AppEvent::ScanDecoded(scan_result("second")),
            ],
        );
        assert_eq!(state.scan_result().unwrap().text, "second");
        assert_eq!(
            effects,
            vec![Effect::StopCamera, Effect::StartCamera, Effect::StopCamera]
        );
    }

    #[test]
    fn test_scan_again_clears_result() {
        let (state, _) = apply(
            &scanning_state(),
            vec![AppEvent::ScanDecoded(scan_result("x")), AppEvent::ScanAgain],
        );
        assert_eq!(state.scan, ScanPhase::Scanning);
        assert!(state.scan_result().is_none());
    }

    #[test]
    fn test_decode_ignored_outside_scan_mode() {
        let t = reduce(&AppState::new(), AppEvent::ScanDecoded(scan_result("x")));
        assert_eq!(t.state.scan, ScanPhase::Scanning);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_camera_failure_sets_retryable_notice() {
        let t = reduce(&scanning_state(), AppEvent::CameraFailed("No camera".into()));
        assert!(!t.state.camera_active);
        let notice = t.state.notice.clone().unwrap();
        assert!(notice.retryable);
        assert!(notice.message.contains("No camera"));

        let t = reduce(&t.state, AppEvent::DismissNotice);
        assert!(t.state.notice.is_none());
    }
}
