// fullscreen.rs — fullscreen requests and state tracking
//
// The tracked boolean is never inferred from toggle history alone: every
// frame it is synced from the window's actual fullscreen status, so exits
// triggered by the compositor or a global Esc handler cannot desync it.

use std::time::{Duration, Instant};

use winit::window::Fullscreen;

use crate::error::ViewerError;

/// How long a request may stay unhonored before it is written off as denied.
const REQUEST_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
pub struct FullscreenManager {
    active: bool,
    pending: Option<(bool, Instant)>,
}

impl FullscreenManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Record a user-initiated toggle and return the mode to hand to
    /// `Window::set_fullscreen` — the caller applies it synchronously inside
    /// the triggering input handler. State flips only once the window
    /// reports the change.
    pub fn toggle(&mut self) -> Option<Fullscreen> {
        let target = !self.active;
        self.pending = Some((target, Instant::now()));
        if target {
            Some(Fullscreen::Borderless(None))
        } else {
            None
        }
    }

    /// Adopt the runtime's actual status. Returns `true` when the tracked
    /// state changed (our own toggle landing, or an external exit).
    pub fn sync_with(&mut self, actual: bool) -> bool {
        if let Some((target, _)) = self.pending {
            if actual == target {
                self.pending = None;
            }
        }
        if actual != self.active {
            self.active = actual;
            true
        } else {
            false
        }
    }

    /// Called once per frame after `sync_with`. A request the runtime never
    /// honored is reported (and forgotten) instead of crashing or retrying.
    pub fn poll_denied(&mut self) -> Option<ViewerError> {
        self.poll_denied_at(Instant::now())
    }

    /// [`poll_denied`](Self::poll_denied) against an explicit clock.
    pub fn poll_denied_at(&mut self, now: Instant) -> Option<ViewerError> {
        match self.pending {
            Some((target, since))
                if target != self.active
                    && now.saturating_duration_since(since) > REQUEST_GRACE =>
            {
                self.pending = None;
                Some(ViewerError::FullscreenDenied)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_requests_borderless_then_windowed() {
        let mut fs = FullscreenManager::new();
        assert!(matches!(fs.toggle(), Some(Fullscreen::Borderless(None))));
        // Request issued, not yet honored.
        assert!(!fs.is_active());

        assert!(fs.sync_with(true));
        assert!(fs.is_active());

        assert!(fs.toggle().is_none());
        assert!(fs.sync_with(false));
        assert!(!fs.is_active());
    }

    #[test]
    fn external_exit_syncs_state() {
        let mut fs = FullscreenManager::new();
        fs.toggle();
        fs.sync_with(true);

        // Compositor kicked us out without a toggle.
        assert!(fs.sync_with(false));
        assert!(!fs.is_active());
        // Idempotent afterwards.
        assert!(!fs.sync_with(false));
    }

    #[test]
    fn honored_request_is_not_denied() {
        let mut fs = FullscreenManager::new();
        fs.toggle();
        fs.sync_with(true);
        assert!(fs.poll_denied().is_none());
    }

    #[test]
    fn unhonored_request_within_grace_is_silent() {
        let mut fs = FullscreenManager::new();
        fs.toggle();
        fs.sync_with(false);
        // Still inside the grace window.
        assert!(fs.poll_denied().is_none());
        assert!(!fs.is_active());
    }

    #[test]
    fn unhonored_request_is_denied_after_grace() {
        let mut fs = FullscreenManager::new();
        fs.toggle();
        fs.sync_with(false);

        let later = Instant::now() + REQUEST_GRACE + Duration::from_millis(50);
        assert!(matches!(
            fs.poll_denied_at(later),
            Some(ViewerError::FullscreenDenied)
        ));
        // Reported once, then forgotten; state stays windowed.
        assert!(fs.poll_denied_at(later).is_none());
        assert!(!fs.is_active());

        // A fresh toggle starts a new request cycle.
        assert!(matches!(fs.toggle(), Some(Fullscreen::Borderless(None))));
        assert!(fs.poll_denied_at(Instant::now()).is_none());
    }
}
