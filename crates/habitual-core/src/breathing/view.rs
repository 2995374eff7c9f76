//! Element bindings for the guide screen.
//!
//! The page may omit any element. A missing handle simply means that part
//! of the frame is not drawn; nothing else changes.

use super::locale::Locale;
use super::phase::PhasePosition;
use super::presentation::{self, BalloonSizer};

/// An element whose square size is set in pixels.
pub trait SizedElement {
    fn set_size_px(&mut self, px: f64);
}

/// An element whose width is set as a percentage of its container.
pub trait BarElement {
    fn set_width_pct(&mut self, pct: f64);
}

pub trait TextElement {
    fn set_text(&mut self, text: &str);
}

/// Everything drawn on one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub balloon_px: f64,
    pub remaining_pct: f64,
    pub remaining_text: String,
    pub phase_label: String,
    /// Empty when the countdown is outside 1..=10.
    pub countdown_text: String,
}

impl Frame {
    pub fn compose(
        position: &PhasePosition,
        elapsed_secs: f64,
        total_secs: f64,
        sizer: &BalloonSizer,
        locale: Locale,
    ) -> Self {
        let pct = presentation::balloon_percent(position.phase, position.progress);
        let remaining = presentation::remaining_secs(total_secs, elapsed_secs);
        let countdown_text = presentation::countdown(position.phase_duration, position.phase_elapsed)
            .and_then(|n| locale.number_name(n))
            .unwrap_or_default()
            .to_string();
        Self {
            balloon_px: sizer.size_px(pct),
            remaining_pct: presentation::remaining_pct(total_secs, elapsed_secs),
            remaining_text: presentation::format_remaining(remaining),
            phase_label: locale.phase_label(position.phase).to_string(),
            countdown_text,
        }
    }
}

#[derive(Default)]
pub struct GuideView {
    balloon: Option<Box<dyn SizedElement>>,
    progress_bar: Option<Box<dyn BarElement>>,
    progress_time: Option<Box<dyn TextElement>>,
    phase_indicator: Option<Box<dyn TextElement>>,
    countdown: Option<Box<dyn TextElement>>,
    pause_button: Option<Box<dyn TextElement>>,
}

impl GuideView {
    pub fn builder() -> GuideViewBuilder {
        GuideViewBuilder::default()
    }

    /// Draw a frame. Missing elements are skipped.
    pub fn render(&mut self, frame: &Frame) {
        if let Some(balloon) = self.balloon.as_mut() {
            balloon.set_size_px(frame.balloon_px);
        }
        // Bar and time are drawn as a pair, as are label and countdown.
        if let (Some(bar), Some(time)) = (self.progress_bar.as_mut(), self.progress_time.as_mut()) {
            bar.set_width_pct(frame.remaining_pct);
            time.set_text(&frame.remaining_text);
        }
        if let (Some(label), Some(count)) = (self.phase_indicator.as_mut(), self.countdown.as_mut()) {
            label.set_text(&frame.phase_label);
            count.set_text(&frame.countdown_text);
        }
    }

    /// Initial state before the first tick.
    pub fn prime(&mut self, balloon_px: f64) {
        if let Some(balloon) = self.balloon.as_mut() {
            balloon.set_size_px(balloon_px);
        }
        if let Some(bar) = self.progress_bar.as_mut() {
            bar.set_width_pct(100.0);
        }
    }

    pub fn set_pause_label(&mut self, label: &str) {
        if let Some(button) = self.pause_button.as_mut() {
            button.set_text(label);
        }
    }
}

#[derive(Default)]
pub struct GuideViewBuilder {
    view: GuideView,
}

impl GuideViewBuilder {
    pub fn balloon(mut self, el: impl SizedElement + 'static) -> Self {
        self.view.balloon = Some(Box::new(el));
        self
    }

    pub fn progress_bar(mut self, el: impl BarElement + 'static) -> Self {
        self.view.progress_bar = Some(Box::new(el));
        self
    }

    pub fn progress_time(mut self, el: impl TextElement + 'static) -> Self {
        self.view.progress_time = Some(Box::new(el));
        self
    }

    pub fn phase_indicator(mut self, el: impl TextElement + 'static) -> Self {
        self.view.phase_indicator = Some(Box::new(el));
        self
    }

    pub fn countdown(mut self, el: impl TextElement + 'static) -> Self {
        self.view.countdown = Some(Box::new(el));
        self
    }

    pub fn pause_button(mut self, el: impl TextElement + 'static) -> Self {
        self.view.pause_button = Some(Box::new(el));
        self
    }

    pub fn build(self) -> GuideView {
        if self.view.balloon.is_none() {
            tracing::warn!("Balloon element not bound; balloon animation disabled");
        }
        self.view
    }
}
