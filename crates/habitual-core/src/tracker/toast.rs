use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    RateLimited,
    Failed,
    Connection,
}

/// Transient message shown after a failed tap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastStage {
    /// Attached but not yet shown.
    Entering,
    Visible,
    FadingOut,
    Removed,
}

impl Toast {
    pub const SHOW_AFTER: Duration = Duration::from_millis(10);
    pub const VISIBLE_FOR: Duration = Duration::from_millis(3000);
    pub const FADE_OUT: Duration = Duration::from_millis(300);

    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Stage at `elapsed` since the toast was created. The hide timer starts
    /// at creation, not when the toast becomes visible.
    ///
    /// Hosts that animate toasts drive their display from this. A host that
    /// only prints the message can ignore it.
    pub fn stage(elapsed: Duration) -> ToastStage {
        if elapsed < Self::SHOW_AFTER {
            ToastStage::Entering
        } else if elapsed < Self::VISIBLE_FOR {
            ToastStage::Visible
        } else if elapsed < Self::lifetime() {
            ToastStage::FadingOut
        } else {
            ToastStage::Removed
        }
    }

    pub fn lifetime() -> Duration {
        Self::VISIBLE_FOR + Self::FADE_OUT
    }
}

/// Displays toasts. Every call is an independent notification; nothing is
/// deduplicated or replaced.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_runs_enter_show_fade_remove() {
        let ms = Duration::from_millis;
        assert_eq!(Toast::stage(ms(0)), ToastStage::Entering);
        assert_eq!(Toast::stage(ms(10)), ToastStage::Visible);
        assert_eq!(Toast::stage(ms(2999)), ToastStage::Visible);
        assert_eq!(Toast::stage(ms(3000)), ToastStage::FadingOut);
        assert_eq!(Toast::stage(ms(3300)), ToastStage::Removed);
    }
}
