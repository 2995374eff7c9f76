//! Frame models for the badge feedback animations.
//!
//! Each model is a pure function of time since the effect started, so the
//! host can draw it at whatever rate its display runs.

use std::f64::consts::PI;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;

/// Particle palette.
pub const CONFETTI_COLORS: [&str; 8] = [
    "#3ABF83", "#00A38D", "#28a745", "#20c997", "#ffc107", "#fd7e14", "#dc3545", "#6f42c1",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    pub color: &'static str,
    pub size_px: f64,
    /// Round particle; square otherwise.
    pub circle: bool,
    pub angle: f64,
    pub velocity: f64,
    pub rotation_deg: f64,
    /// Degrees per 60 Hz frame.
    pub spin_deg: f64,
    /// How far ahead of the burst clock this particle runs.
    pub lead: Duration,
}

/// Where one particle is drawn, relative to the badge centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParticleFrame {
    pub x: f64,
    pub y: f64,
    pub opacity: f64,
    pub rotation_deg: f64,
}

/// Burst of particles for a resisted craving.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfettiBurst {
    particles: Vec<Particle>,
}

impl ConfettiBurst {
    pub const DURATION: Duration = Duration::from_millis(2000);
    pub const PARTICLES: usize = 50;
    const STAGGER_MS: u64 = 10;

    pub fn new() -> Self {
        Self::with_rng(&mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let particles = (0..Self::PARTICLES)
            .map(|i| Particle {
                color: CONFETTI_COLORS[rng.gen_range(0..CONFETTI_COLORS.len())],
                size_px: rng.gen_range(8.0..14.0),
                circle: rng.gen_bool(0.7),
                angle: 2.0 * PI * i as f64 / Self::PARTICLES as f64 + rng.gen_range(-0.4..0.4),
                velocity: rng.gen_range(3.0..7.0),
                rotation_deg: rng.gen_range(0.0..360.0),
                spin_deg: rng.gen_range(-7.5..7.5),
                lead: Duration::from_millis(i as u64 * Self::STAGGER_MS),
            })
            .collect();
        Self { particles }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Visible particles at `elapsed`. Particles that have run their course
    /// are removed.
    pub fn frame(&self, elapsed: Duration) -> Vec<ParticleFrame> {
        let total = Self::DURATION.as_secs_f64();
        if elapsed >= Self::DURATION {
            return Vec::new();
        }
        self.particles
            .iter()
            .filter_map(|p| {
                let progress = ((elapsed + p.lead).as_secs_f64() / total).min(1.0);
                if progress >= 1.0 {
                    return None;
                }
                let distance = p.velocity * progress * 120.0;
                let gravity = progress * progress * 400.0;
                let frames = elapsed.as_secs_f64() * 60.0;
                Some(ParticleFrame {
                    x: p.angle.cos() * distance,
                    y: p.angle.sin() * distance * 0.5 + gravity,
                    opacity: particle_opacity(progress),
                    rotation_deg: p.rotation_deg + p.spin_deg * frames,
                })
            })
            .collect()
    }

    /// Scale of the badge itself while the burst plays.
    pub fn badge_scale(elapsed: Duration) -> f64 {
        pulse(elapsed, Self::DURATION).map_or(1.0, |s| 1.0 + 0.15 * s)
    }
}

impl Default for ConfettiBurst {
    fn default() -> Self {
        Self::new()
    }
}

fn particle_opacity(progress: f64) -> f64 {
    if progress < 0.1 {
        progress / 0.1
    } else if progress > 0.8 {
        (1.0 - progress) / 0.2
    } else {
        1.0
    }
}

/// `sin(pi * progress)` while the effect runs, `None` once it is over.
fn pulse(elapsed: Duration, duration: Duration) -> Option<f64> {
    let progress = elapsed.as_secs_f64() / duration.as_secs_f64();
    (progress < 1.0).then(|| (progress * PI).sin())
}

/// Filter applied to a badge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BadgeFilter {
    pub grayscale: f64,
    pub brightness: f64,
    pub opacity: f64,
}

/// Dull, dimmed badge after a cigarette was logged.
pub struct GreyOut;

impl GreyOut {
    pub const DURATION: Duration = Duration::from_millis(1200);
    pub const FILTER: BadgeFilter = BadgeFilter {
        grayscale: 0.8,
        brightness: 0.7,
        opacity: 0.6,
    };

    /// The filter while the effect holds, `None` once the badge is restored.
    pub fn filter(elapsed: Duration) -> Option<BadgeFilter> {
        (elapsed < Self::DURATION).then_some(Self::FILTER)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlowFrame {
    pub scale: f64,
    pub shadow_px: f64,
    pub shadow_opacity: f64,
    /// Shadow colour as RGB.
    pub color: (u8, u8, u8),
}

/// Blue glow and pulse after a workout was logged.
pub struct SuccessGlow;

impl SuccessGlow {
    pub const DURATION: Duration = Duration::from_millis(1500);
    const COLOR: (u8, u8, u8) = (0, 123, 255);

    pub fn frame(elapsed: Duration) -> Option<GlowFrame> {
        pulse(elapsed, Self::DURATION).map(|s| GlowFrame {
            scale: 1.0 + 0.12 * s,
            shadow_px: 15.0 + 25.0 * s,
            shadow_opacity: 0.7 + 0.3 * s,
            color: Self::COLOR,
        })
    }
}
