//! Activity badges and their click handling.
//!
//! Each badge allows one outstanding request. Clicks on a badge with a
//! request in flight are dropped; other badges are unaffected.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use super::activity::{ActivityKind, Effect};
use super::toast::{Notifier, Toast, ToastKind};
use super::wire::{TapApi, TapRequest, TapResponse};
use crate::breathing::Locale;
use crate::events::Event;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BadgeId(pub String);

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BadgeId {
    fn from(s: &str) -> Self {
        BadgeId(s.to_string())
    }
}

/// The on-screen element for one badge.
pub trait BadgeView: Send {
    fn set_count(&mut self, count: u64);
    /// Disabled and dimmed while a request is in flight.
    fn set_busy(&mut self, busy: bool);
    fn play_effect(&mut self, effect: Effect);
}

/// Snapshot of a wired badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub id: BadgeId,
    pub kind: ActivityKind,
    pub count: u64,
    pub in_flight: bool,
}

struct Slot {
    kind: ActivityKind,
    count: u64,
    in_flight: bool,
    view: Box<dyn BadgeView>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// A request for this badge is already in flight.
    Ignored,
    /// No badge with this id was wired.
    NotWired,
    Updated {
        count: u64,
        effect: Option<Effect>,
        event: Event,
    },
    Rejected {
        toast: Toast,
        event: Event,
    },
}

/// One-time setup flag for a page.
#[derive(Debug, Default)]
pub struct InitGuard(AtomicBool);

impl InitGuard {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// True exactly once.
    pub fn begin(&self) -> bool {
        let first = !self.0.swap(true, Ordering::SeqCst);
        if !first {
            tracing::warn!("Activity tracker already initialized");
        }
        first
    }
}

/// Clears a badge's busy state if a click is dropped before the response
/// arrives.
struct InFlight<'a> {
    badges: &'a Mutex<HashMap<BadgeId, Slot>>,
    id: &'a BadgeId,
    armed: bool,
}

impl InFlight<'_> {
    /// Must be called with the badge map already locked by the caller.
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut badges = self.badges.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = badges.get_mut(self.id) {
            tracing::debug!(badge = %self.id, "click dropped mid-request; re-enabling badge");
            slot.in_flight = false;
            slot.view.set_busy(false);
        }
    }
}

pub struct ActivityTracker<A> {
    api: A,
    notifier: Box<dyn Notifier>,
    locale: Locale,
    badges: Mutex<HashMap<BadgeId, Slot>>,
}

impl<A: TapApi> ActivityTracker<A> {
    pub fn new(api: A, notifier: impl Notifier + 'static, locale: Locale) -> Self {
        Self {
            api,
            notifier: Box::new(notifier),
            locale,
            badges: Mutex::new(HashMap::new()),
        }
    }

    /// Register a badge. A badge that is already wired keeps its existing
    /// handler and the call returns false.
    pub fn wire(
        &self,
        id: BadgeId,
        kind: ActivityKind,
        count: u64,
        view: impl BadgeView + 'static,
    ) -> bool {
        let mut badges = self.lock();
        if badges.contains_key(&id) {
            tracing::debug!(badge = %id, "badge already wired");
            return false;
        }
        badges.insert(
            id,
            Slot {
                kind,
                count,
                in_flight: false,
                view: Box::new(view),
            },
        );
        true
    }

    pub fn badge(&self, id: &BadgeId) -> Option<Badge> {
        self.lock().get(id).map(|slot| Badge {
            id: id.clone(),
            kind: slot.kind.clone(),
            count: slot.count,
            in_flight: slot.in_flight,
        })
    }

    pub fn badges(&self) -> Vec<Badge> {
        let mut all: Vec<Badge> = self
            .lock()
            .iter()
            .map(|(id, slot)| Badge {
                id: id.clone(),
                kind: slot.kind.clone(),
                count: slot.count,
                in_flight: slot.in_flight,
            })
            .collect();
        all.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        all
    }

    /// Handle a click on `id`.
    pub async fn click(&self, id: &BadgeId) -> ClickOutcome {
        let kind = {
            let mut badges = self.lock();
            let Some(slot) = badges.get_mut(id) else {
                tracing::warn!(badge = %id, "click on unknown badge");
                return ClickOutcome::NotWired;
            };
            if slot.in_flight {
                tracing::debug!(badge = %id, "Already processing, ignoring click");
                return ClickOutcome::Ignored;
            }
            slot.in_flight = true;
            slot.view.set_busy(true);
            slot.kind.clone()
        };
        let guard = InFlight {
            badges: &self.badges,
            id,
            armed: true,
        };

        let request = TapRequest {
            activity_type: kind.wire_name().to_string(),
        };
        let result = self.api.tap(&request).await;

        let mut badges = self.lock();
        guard.disarm();
        let Some(slot) = badges.get_mut(id) else {
            return ClickOutcome::NotWired;
        };
        slot.in_flight = false;
        slot.view.set_busy(false);

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(badge = %id, "tap failed: {e}");
                let toast = Toast::new(
                    ToastKind::Connection,
                    self.locale.connection_failed_message(),
                );
                return self.reject(&kind, toast, false);
            }
        };

        if !response.success {
            tracing::info!(badge = %id, rate_limited = response.rate_limited, "tap refused");
            let toast = self.refusal_toast(&response);
            return self.reject(&kind, toast, response.rate_limited);
        }

        let count = match response.counts.as_ref().and_then(|c| c.get(&kind.count_key())) {
            Some(&n) => n,
            None => {
                tracing::warn!(badge = %id, "response has no count for {}; incrementing locally", kind.count_key());
                slot.count + 1
            }
        };
        slot.count = count;
        slot.view.set_count(count);

        let effect = kind.effect();
        match effect {
            Some(effect) => slot.view.play_effect(effect),
            None => tracing::warn!("Unknown activity type: {}", kind.wire_name()),
        }

        ClickOutcome::Updated {
            count,
            effect,
            event: Event::BadgeTapped {
                activity_type: kind.wire_name().to_string(),
                count,
                at: Utc::now(),
            },
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn refusal_toast(&self, response: &TapResponse) -> Toast {
        let (kind, fallback) = if response.rate_limited {
            (ToastKind::RateLimited, self.locale.rate_limited_message())
        } else {
            (ToastKind::Failed, self.locale.save_failed_message())
        };
        let message = response
            .error
            .clone()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        Toast::new(kind, message)
    }

    fn reject(&self, kind: &ActivityKind, toast: Toast, rate_limited: bool) -> ClickOutcome {
        self.notifier.notify(toast.clone());
        ClickOutcome::Rejected {
            toast,
            event: Event::TapRejected {
                activity_type: kind.wire_name().to_string(),
                rate_limited,
                at: Utc::now(),
            },
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<BadgeId, Slot>> {
        self.badges.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::tracker::ActivityType;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Clone, Default)]
    struct Screen(Arc<Mutex<Vec<String>>>);

    impl BadgeView for Screen {
        fn set_count(&mut self, count: u64) {
            self.0.lock().unwrap().push(format!("count:{count}"));
        }
        fn set_busy(&mut self, busy: bool) {
            self.0.lock().unwrap().push(format!("busy:{busy}"));
        }
        fn play_effect(&mut self, effect: Effect) {
            self.0.lock().unwrap().push(format!("effect:{effect:?}"));
        }
    }

    #[derive(Clone, Default)]
    struct Toasts(Arc<Mutex<Vec<Toast>>>);

    impl Notifier for Toasts {
        fn notify(&self, toast: Toast) {
            self.0.lock().unwrap().push(toast);
        }
    }

    struct Canned {
        reply: Result<TapResponse, u16>,
        gate: Option<Arc<Notify>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Canned {
        fn ok(reply: TapResponse) -> Self {
            Self {
                reply: Ok(reply),
                gate: None,
                calls: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl TapApi for Canned {
        async fn tap(&self, request: &TapRequest) -> Result<TapResponse, ApiError> {
            self.calls.lock().unwrap().push(request.activity_type.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.reply.clone().map_err(|status| ApiError::Status {
                path: "/api/activity/tap/".into(),
                status,
                body: String::new(),
            })
        }
    }

    fn counts(pairs: &[(&str, u64)]) -> TapResponse {
        TapResponse {
            success: true,
            counts: Some(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()),
            ..TapResponse::default()
        }
    }

    fn tracker(api: Canned) -> (ActivityTracker<Canned>, Screen, Toasts) {
        let toasts = Toasts::default();
        let tracker = ActivityTracker::new(api, toasts.clone(), Locale::Ru);
        let screen = Screen::default();
        (tracker, screen, toasts)
    }

    #[tokio::test]
    async fn server_count_replaces_local_count() {
        let (tracker, screen, _) = tracker(Canned::ok(counts(&[("resist", 12), ("sport", 2)])));
        let id = BadgeId::from("resist");
        tracker.wire(id.clone(), ActivityType::Resist.into(), 4, screen.clone());

        match tracker.click(&id).await {
            ClickOutcome::Updated { count, effect, .. } => {
                assert_eq!(count, 12);
                assert_eq!(effect, Some(Effect::ConfettiBurst));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            *screen.0.lock().unwrap(),
            vec!["busy:true", "busy:false", "count:12", "effect:ConfettiBurst"]
        );
        assert_eq!(tracker.badge(&id).unwrap().count, 12);
    }

    #[tokio::test]
    async fn missing_counts_fall_back_to_increment() {
        let reply = TapResponse {
            success: true,
            ..TapResponse::default()
        };
        let (tracker, screen, _) = tracker(Canned::ok(reply));
        let id = BadgeId::from("smoked");
        tracker.wire(id.clone(), ActivityType::Smoked.into(), 4, screen);
        assert!(matches!(tracker.click(&id).await, ClickOutcome::Updated { count: 5, .. }));
    }

    #[tokio::test]
    async fn rate_limit_prefers_server_text() {
        let reply = TapResponse {
            rate_limited: true,
            error: Some("Подождите".into()),
            ..TapResponse::default()
        };
        let (tracker, screen, toasts) = tracker(Canned::ok(reply));
        let id = BadgeId::from("sport");
        tracker.wire(id.clone(), ActivityType::Sport.into(), 0, screen);
        tracker.click(&id).await;
        let shown = toasts.0.lock().unwrap();
        assert_eq!(shown[0], Toast::new(ToastKind::RateLimited, "Подождите"));
        assert!(!tracker.badge(&id).unwrap().in_flight);
    }

    #[tokio::test]
    async fn rate_limit_without_text_uses_locale_default() {
        let reply = TapResponse {
            success: false,
            rate_limited: true,
            ..TapResponse::default()
        };
        let (tracker, screen, toasts) = tracker(Canned::ok(reply));
        let id = BadgeId::from("smoked");
        tracker.wire(id.clone(), ActivityType::Smoked.into(), 2, screen);
        let outcome = tracker.click(&id).await;
        assert!(matches!(outcome, ClickOutcome::Rejected { .. }));
        let shown = toasts.0.lock().unwrap();
        assert_eq!(
            shown[0],
            Toast::new(
                ToastKind::RateLimited,
                "Слишком часто. Попробуйте через 3 секунды."
            )
        );
        assert_eq!(tracker.badge(&id).unwrap().count, 2);
    }

    #[tokio::test]
    async fn dropped_click_reenables_badge() {
        let api = Canned {
            reply: Ok(counts(&[("resist", 1)])),
            gate: Some(Arc::new(Notify::new())),
            calls: Arc::default(),
        };
        let calls = api.calls.clone();
        let (tracker, screen, _) = tracker(api);
        let id = BadgeId::from("resist");
        tracker.wire(id.clone(), ActivityType::Resist.into(), 0, screen.clone());

        let first = tokio::time::timeout(Duration::from_millis(50), tracker.click(&id)).await;
        assert!(first.is_err());
        assert!(!tracker.badge(&id).unwrap().in_flight);
        assert_eq!(screen.0.lock().unwrap().last().unwrap(), "busy:false");

        // The gate never opens, so the retry also times out, but it must
        // reach the server rather than being ignored.
        let second = tokio::time::timeout(Duration::from_millis(50), tracker.click(&id)).await;
        assert!(second.is_err());
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn refusals_without_text_use_defaults() {
        let (tracker, screen, toasts) = tracker(Canned::ok(TapResponse::default()));
        let id = BadgeId::from("sport");
        tracker.wire(id.clone(), ActivityType::Sport.into(), 0, screen);
        tracker.click(&id).await;
        assert_eq!(toasts.0.lock().unwrap()[0].message, "Ошибка при сохранении.");
    }

    #[tokio::test]
    async fn transport_failure_shows_connection_error_and_reenables() {
        let api = Canned {
            reply: Err(502),
            gate: None,
            calls: Arc::default(),
        };
        let (tracker, screen, toasts) = tracker(api);
        let id = BadgeId::from("resist");
        tracker.wire(id.clone(), ActivityType::Resist.into(), 1, screen.clone());
        let outcome = tracker.click(&id).await;
        assert!(matches!(outcome, ClickOutcome::Rejected { .. }));
        assert_eq!(toasts.0.lock().unwrap()[0].message, "Ошибка соединения.");
        assert_eq!(screen.0.lock().unwrap().last().unwrap(), "busy:false");
        assert_eq!(tracker.badge(&id).unwrap().count, 1);
    }

    #[tokio::test]
    async fn second_click_while_in_flight_is_dropped() {
        let gate = Arc::new(Notify::new());
        let api = Canned {
            reply: Ok(counts(&[("resist", 1)])),
            gate: Some(gate.clone()),
            calls: Arc::default(),
        };
        let calls = api.calls.clone();
        let (tracker, screen, _) = tracker(api);
        let id = BadgeId::from("resist");
        tracker.wire(id.clone(), ActivityType::Resist.into(), 0, screen);

        let (first, second) = tokio::join!(tracker.click(&id), async {
            let second = tracker.click(&id).await;
            gate.notify_one();
            second
        });
        assert!(matches!(first, ClickOutcome::Updated { count: 1, .. }));
        assert_eq!(second, ClickOutcome::Ignored);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_type_posts_but_plays_nothing() {
        let (tracker, screen, _) = tracker(Canned::ok(counts(&[("meditate", 3)])));
        let id = BadgeId::from("odd");
        tracker.wire(id.clone(), ActivityKind::parse("MEDITATE"), 2, screen.clone());
        let outcome = tracker.click(&id).await;
        assert!(matches!(outcome, ClickOutcome::Updated { count: 3, effect: None, .. }));
        assert!(!screen.0.lock().unwrap().iter().any(|e| e.starts_with("effect")));
    }

    #[test]
    fn wiring_and_init_are_idempotent() {
        let (tracker, screen, _) = tracker(Canned::ok(TapResponse::default()));
        let id = BadgeId::from("resist");
        assert!(tracker.wire(id.clone(), ActivityType::Resist.into(), 0, screen.clone()));
        assert!(!tracker.wire(id, ActivityType::Resist.into(), 9, screen));
        assert_eq!(tracker.badges().len(), 1);
        assert_eq!(tracker.badges()[0].count, 0);

        let guard = InitGuard::new();
        assert!(guard.begin());
        assert!(!guard.begin());
    }
}
