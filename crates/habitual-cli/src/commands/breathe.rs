use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::Args;
use habitual_core::breathing::{
    AudioCue, AudioSink, BarElement, BreathingEngine, BreathingGuide, FrameOutcome, GuideView,
    HapticSink, SessionEnd, SessionReporter, SizedElement, TextElement,
};
use habitual_core::{ApiClient, Config, CueError, Technique};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// How long queued telemetry may take after the session ends.
const TELEMETRY_GRACE: Duration = Duration::from_secs(3);

#[derive(Args)]
pub struct BreatheArgs {
    /// Technique as JSON (the payload the web page embeds)
    #[arg(long, conflicts_with_all = ["inhale", "hold_start", "exhale", "hold_end", "minutes"])]
    technique: Option<PathBuf>,
    #[arg(long, default_value = "4")]
    inhale: u32,
    #[arg(long, default_value = "4")]
    hold_start: u32,
    #[arg(long, default_value = "4")]
    exhale: u32,
    #[arg(long, default_value = "4")]
    hold_end: u32,
    /// Session length in minutes
    #[arg(long, default_value = "5")]
    minutes: u32,
    /// Technique id reported to the server
    #[arg(long)]
    id: Option<u64>,
    /// Disable spoken cues for this session
    #[arg(long)]
    no_sound: bool,
    /// Disable the phase-start bell for this session
    #[arg(long)]
    no_vibration: bool,
    /// Frames per second
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..=120))]
    fps: u32,
}

// ── Terminal elements ────────────────────────────────────────────────

#[derive(Default)]
struct Screen {
    balloon_px: f64,
    remaining_pct: f64,
    remaining: String,
    phase: String,
    count: String,
    button: String,
}

#[derive(Clone)]
struct Element(Rc<RefCell<Screen>>);

impl SizedElement for Element {
    fn set_size_px(&mut self, px: f64) {
        self.0.borrow_mut().balloon_px = px;
    }
}

impl BarElement for Element {
    fn set_width_pct(&mut self, pct: f64) {
        self.0.borrow_mut().remaining_pct = pct;
    }
}

struct Field<F>(Rc<RefCell<Screen>>, F);

impl<F: Fn(&mut Screen, &str)> TextElement for Field<F> {
    fn set_text(&mut self, text: &str) {
        (self.1)(&mut *self.0.borrow_mut(), text);
    }
}

fn draw(screen: &Screen, max_px: f64) {
    const BALLOON: usize = 30;
    const BAR: usize = 10;
    let balloon = if max_px > 0.0 {
        ((screen.balloon_px / max_px) * BALLOON as f64).round() as usize
    } else {
        0
    };
    let bar = ((screen.remaining_pct / 100.0) * BAR as f64).round() as usize;
    let (balloon, bar) = (balloon.min(BALLOON), bar.min(BAR));
    print!(
        "\r{:<30} {:>9} {:>8} {}{} {:>5} [{}]",
        "o".repeat(balloon),
        screen.phase,
        screen.count,
        "#".repeat(bar),
        ".".repeat(BAR - bar),
        screen.remaining,
        screen.button,
    );
    let _ = std::io::stdout().flush();
}

struct TerminalAudio;

impl AudioSink for TerminalAudio {
    fn play(&mut self, cue: &AudioCue) -> Result<(), CueError> {
        let spoken = match cue {
            AudioCue::Count(n) => n.to_string(),
            other => other.file_name().trim_end_matches(".mp3").to_string(),
        };
        eprint!(" ♪{spoken}");
        Ok(())
    }
}

struct TerminalBell;

impl HapticSink for TerminalBell {
    fn vibrate(&mut self, _pulse: Duration) -> Result<(), CueError> {
        eprint!("\x07");
        Ok(())
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y" | "yes" | "д" | "да")
}

fn spawn_input() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn load_technique(args: &BreatheArgs) -> Result<Technique, Box<dyn std::error::Error>> {
    let technique = match &args.technique {
        Some(path) => Technique::from_json(&std::fs::read_to_string(path)?)?,
        None => Technique::new(args.inhale, args.hold_start, args.exhale, args.hold_end, args.minutes)?,
    };
    Ok(match args.id {
        Some(id) => technique.with_id(id),
        None => technique,
    })
}

pub fn run(args: BreatheArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let technique = load_technique(&args)?;
    let mut options = config.guide_options();
    options.sound_enabled &= !args.no_sound;
    options.vibration_enabled &= !args.no_vibration;

    let api = ApiClient::from_config(&config.server)?;
    let rt = super::runtime()?;

    let screen = Rc::new(RefCell::new(Screen::default()));
    let view = GuideView::builder()
        .balloon(Element(screen.clone()))
        .progress_bar(Element(screen.clone()))
        .progress_time(Field(screen.clone(), |s: &mut Screen, t: &str| s.remaining = t.into()))
        .phase_indicator(Field(screen.clone(), |s: &mut Screen, t: &str| s.phase = t.into()))
        .countdown(Field(screen.clone(), |s: &mut Screen, t: &str| s.count = t.into()))
        .pause_button(Field(screen.clone(), |s: &mut Screen, t: &str| s.button = t.into()))
        .build();

    let max_px = options.sizer.max_px;
    let locale = options.locale;
    let base_url = config.server.base_url.clone();
    let mut input = spawn_input();
    let frame_period = Duration::from_secs_f64(1.0 / f64::from(args.fps));

    rt.block_on(async move {
        let reporter = SessionReporter::spawn(api);
        let mut guide = BreathingGuide::new(BreathingEngine::new(technique), view, reporter, options)
            .with_audio(TerminalAudio)
            .with_haptics(TerminalBell);

        eprintln!("p+Enter: pause/resume, c+Enter: cancel, Ctrl-C: stop");
        guide.start();

        let mut ticker = tokio::time::interval(frame_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let end: Option<SessionEnd> = 'run: loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    break 'run guide.cancel(&mut |_: &str| true);
                }
                _ = ticker.tick() => {
                    while let Ok(line) = input.try_recv() {
                        match line.trim() {
                            "p" => {
                                guide.toggle_pause();
                            }
                            "c" => {
                                // The session reporter shares this thread; never block here.
                                eprint!("\n{} [y/N] ", locale.cancel_prompt());
                                let _ = std::io::stderr().flush();
                                let confirmed = tokio::select! {
                                    answer = input.recv() => answer.is_some_and(|a| is_yes(&a)),
                                    _ = &mut ctrl_c => break 'run guide.cancel(&mut |_: &str| true),
                                };
                                if let Some(end) = guide.cancel(&mut |_: &str| confirmed) {
                                    break 'run Some(end);
                                }
                            }
                            "" => {}
                            other => eprintln!("\nunknown command: {other}"),
                        }
                    }
                    match guide.frame() {
                        FrameOutcome::Continue(_) | FrameOutcome::Halted => {
                            draw(&screen.borrow(), max_px)
                        }
                        FrameOutcome::Finished(end) => break 'run Some(end),
                    }
                    for event in guide.take_events() {
                        tracing::debug!(?event, "guide event");
                    }
                }
            }
        };

        println!();
        if let Some(end) = &end {
            if let Some(message) = &end.message {
                println!("{message}");
            }
            tracing::info!(cycles = end.cycles_completed, state = ?end.state, "session over");
        }
        let session_id = guide.shutdown(TELEMETRY_GRACE).await;
        if let Some(end) = end {
            tokio::time::sleep(end.redirect_after).await;
            let exit_url = format!("{}{}", base_url.trim_end_matches('/'), end.redirect_to);
            match session_id {
                Some(id) => println!("session {id}: {exit_url}"),
                None => println!("{exit_url}"),
            }
        }
    });
    Ok(())
}
