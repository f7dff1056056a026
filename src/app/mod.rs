//! Front-end state: an immutable [`AppState`] advanced by [`reduce`].
//!
//! Front-ends feed user actions and session callbacks in as [`AppEvent`]s and
//! carry out the returned [`Effect`]s (asking for the camera, starting and
//! stopping it).

mod reducer;
mod state;

pub use reducer::reduce;
pub use state::{
    AppEvent, AppState, Effect, Generated, Mode, Notice, NoticeLevel, ScanPhase, Transition,
};
