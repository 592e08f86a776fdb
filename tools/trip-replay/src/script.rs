use ride_sim_core::{PlaybackController, PlaybackStatus};
use tracing::warn;

/// A single scripted pause during a replay
#[derive(Debug)]
pub struct PauseScript {
    at: Option<usize>,
    seconds: u32,
    fired: bool,
}

impl PauseScript {
    pub fn new(at: Option<usize>, seconds: u32) -> Self {
        Self {
            at,
            seconds,
            fired: false,
        }
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// Pause `controller` if it is running at the scripted waypoint.
    ///
    /// Reads the live cursor rather than a queued update, so it must be called
    /// under the playback lock. If the ticker has already stepped past the
    /// waypoint the pause is skipped with a warning. Fires at most once.
    pub fn apply(&mut self, controller: &mut PlaybackController) -> bool {
        let Some(at) = self.at else {
            return false;
        };

        let state = controller.state();
        if self.fired || state.status != PlaybackStatus::Running || state.cursor < at {
            return false;
        }

        self.fired = true;
        if state.cursor > at {
            warn!(pause_at = at, cursor = state.cursor, "playback already past the pause point, not pausing");
            return false;
        }

        controller.pause();
        true
    }
}
