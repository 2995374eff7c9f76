//! Habit badges: one tap posts an activity, the server answers with the
//! day's totals, and the badge plays its feedback animation.

mod activity;
mod badge;
mod effects;
mod toast;
mod wire;

pub use activity::{ActivityKind, ActivityType, Effect};
pub use badge::{ActivityTracker, Badge, BadgeId, BadgeView, ClickOutcome, InitGuard};
pub use effects::{
    BadgeFilter, ConfettiBurst, GlowFrame, GreyOut, Particle, ParticleFrame, SuccessGlow,
    CONFETTI_COLORS,
};
pub use toast::{Notifier, Toast, ToastKind, ToastStage};
pub use wire::{TapApi, TapRequest, TapResponse};
