use clap::Args;
use habitual_core::tracker::{
    ActivityKind, ActivityTracker, BadgeId, BadgeView, ClickOutcome, ConfettiBurst, Effect,
    GreyOut, Notifier, SuccessGlow, Toast,
};
use habitual_core::{ApiClient, Config};

#[derive(Args)]
pub struct TapArgs {
    /// Activity type: RESIST, SMOKED or SPORT
    activity: String,
    /// Count currently shown on the badge, used if the server omits totals
    #[arg(long, default_value = "0")]
    count: u64,
}

struct TerminalBadge {
    label: String,
}

impl BadgeView for TerminalBadge {
    fn set_count(&mut self, count: u64) {
        println!("{}: {count}", self.label);
    }

    fn set_busy(&mut self, busy: bool) {
        tracing::debug!(badge = %self.label, busy, "badge state");
    }

    fn play_effect(&mut self, effect: Effect) {
        println!("{}", describe(effect));
    }
}

struct StderrToast;

impl Notifier for StderrToast {
    fn notify(&self, toast: Toast) {
        eprintln!("{}", toast.message);
    }
}

fn describe(effect: Effect) -> String {
    match effect {
        Effect::ConfettiBurst => {
            let burst = ConfettiBurst::new();
            format!(
                "confetti: {} particles over {:.1}s",
                burst.particles().len(),
                ConfettiBurst::DURATION.as_secs_f64()
            )
        }
        Effect::GreyOut => format!(
            "grey-out: grayscale {:.0}% for {:.1}s",
            GreyOut::FILTER.grayscale * 100.0,
            GreyOut::DURATION.as_secs_f64()
        ),
        Effect::SuccessGlow => {
            let peak = SuccessGlow::frame(SuccessGlow::DURATION / 2)
                .map_or(1.0, |frame| frame.scale);
            format!("glow: pulse to {peak:.2}x")
        }
    }
}

pub fn run(args: TapArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let api = ApiClient::from_config(&config.server)?;
    let kind = ActivityKind::parse(&args.activity);
    let tracker = ActivityTracker::new(api, StderrToast, config.display.locale);

    let id = BadgeId(kind.count_key());
    let view = TerminalBadge {
        label: kind.wire_name().to_string(),
    };
    tracker.wire(id.clone(), kind, args.count, view);

    let outcome = super::runtime()?.block_on(tracker.click(&id));
    match outcome {
        ClickOutcome::Updated { event, .. } => {
            tracing::debug!(?event, "tap recorded");
            Ok(())
        }
        ClickOutcome::Rejected { toast, .. } => Err(format!("tap rejected ({:?})", toast.kind).into()),
        ClickOutcome::Ignored | ClickOutcome::NotWired => Err("badge not available".into()),
    }
}
