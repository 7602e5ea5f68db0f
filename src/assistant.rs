//! Desktop driver loops: key-driven interactive mode and timer-driven
//! automatic mode.
//!
//! Both share one capture→dispatch→speak cycle. The remote call runs on a
//! spawned task in interactive mode so the key loop keeps polling; quit stays
//! responsive and aborts an in-flight analysis. The loops track only a
//! history-non-empty flag — no turn log exists on the desktop path.

use crate::capture::{CaptureSource, CommandCapture};
use crate::cli::AssistMode;
use crate::config::Config;
use crate::error::Result;
use crate::prompt::select_prompt;
use crate::speech::{CommandSpeech, NullSpeech, SpeechOutput};
use crate::vision::{AnthropicVision, Vision};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Outcome of one capture→dispatch→speak pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No frame available; nothing was dispatched or spoken.
    Skipped,
    /// The model replied and the reply was delivered.
    Answered,
    /// Dispatch failed; the error message was delivered instead.
    Failed,
}

/// One full cycle. A failed capture skips dispatch and speech entirely; a
/// dispatch failure is delivered aloud like any other response.
pub async fn run_cycle(
    capture: &dyn CaptureSource,
    vision: &dyn Vision,
    speech: &dyn SpeechOutput,
    history_is_empty: bool,
    user_override: Option<&str>,
) -> CycleOutcome {
    println!("📸 Capturing image...");
    let Some(image) = capture.capture().await else {
        tracing::warn!("no frame available, skipping this analysis");
        return CycleOutcome::Skipped;
    };

    let prompt = select_prompt(history_is_empty, user_override);
    println!("🤔 Analyzing...");
    let (reply, outcome) = match vision.describe(&image, prompt).await {
        Ok(text) => (text, CycleOutcome::Answered),
        Err(e) => (
            format!("Error calling the vision service: {e}"),
            CycleOutcome::Failed,
        ),
    };

    println!("\n🗣️  {reply}\n");
    if let Err(e) = speech.speak(&reply).await {
        tracing::warn!("speech output failed: {e}");
    }
    outcome
}

enum KeyEvent {
    Trigger,
    Quit,
    Override(String),
}

/// Read keys on a dedicated blocking thread and forward them as events.
/// In interactive mode any other printable key opens a free-text override
/// line; automatic mode only cares about quit.
fn spawn_key_reader(collect_overrides: bool) -> mpsc::UnboundedReceiver<KeyEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let term = console::Term::stdout();
        loop {
            let Ok(key) = term.read_key() else {
                break;
            };
            let event = match key {
                console::Key::Char(' ') => KeyEvent::Trigger,
                console::Key::Char('q') => KeyEvent::Quit,
                console::Key::Char(c) if collect_overrides && !c.is_control() => {
                    match term.read_line_initial_text(&c.to_string()) {
                        Ok(line) => KeyEvent::Override(line),
                        Err(_) => break,
                    }
                }
                _ => continue,
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    });
    rx
}

pub struct Assistant {
    capture: Arc<dyn CaptureSource>,
    vision: Arc<dyn Vision>,
    speech: Arc<dyn SpeechOutput>,
    interval: Duration,
}

/// What finished first while an analysis task was in flight.
enum BusyEvent {
    Done(std::result::Result<CycleOutcome, tokio::task::JoinError>),
    Key(Option<KeyEvent>),
}

impl Assistant {
    pub fn new(
        capture: Arc<dyn CaptureSource>,
        vision: Arc<dyn Vision>,
        speech: Arc<dyn SpeechOutput>,
        interval: Duration,
    ) -> Self {
        Self {
            capture,
            vision,
            speech,
            interval,
        }
    }

    fn spawn_cycle(
        &self,
        history_nonempty: bool,
        user_override: Option<String>,
    ) -> JoinHandle<CycleOutcome> {
        let capture = Arc::clone(&self.capture);
        let vision = Arc::clone(&self.vision);
        let speech = Arc::clone(&self.speech);
        tokio::spawn(async move {
            run_cycle(
                capture.as_ref(),
                vision.as_ref(),
                speech.as_ref(),
                !history_nonempty,
                user_override.as_deref(),
            )
            .await
        })
    }

    /// Interactive mode: space triggers an analysis, `q` quits, any other
    /// text becomes the question for the next analysis.
    pub async fn run_interactive(&self, initial_message: Option<String>) -> Result<()> {
        println!("🍳 Cooking assistant — interactive mode");
        println!("  SPACE  analyze the current scene");
        println!("  q      quit");
        println!("  text   ask a specific question with the next photo\n");

        let mut keys = spawn_key_reader(true);
        let mut pending: Option<JoinHandle<CycleOutcome>> = None;
        let mut history_nonempty = false;
        let mut user_override = initial_message.filter(|m| !m.trim().is_empty());
        if let Some(ref message) = user_override {
            println!("Will ask: {message}");
        }

        loop {
            if let Some(task) = pending.as_mut() {
                let event = tokio::select! {
                    result = task => BusyEvent::Done(result),
                    key = keys.recv() => BusyEvent::Key(key),
                };
                match event {
                    BusyEvent::Done(result) => {
                        pending = None;
                        match result {
                            Ok(CycleOutcome::Answered) => history_nonempty = true,
                            Ok(_) => {}
                            Err(e) if e.is_cancelled() => {}
                            Err(e) => tracing::error!("analysis task failed: {e}"),
                        }
                    }
                    BusyEvent::Key(None) | BusyEvent::Key(Some(KeyEvent::Quit)) => {
                        if let Some(task) = pending.take() {
                            task.abort();
                            println!("Cancelled in-flight analysis.");
                        }
                        break;
                    }
                    BusyEvent::Key(Some(KeyEvent::Trigger)) => {
                        println!("Analysis already in progress…");
                    }
                    BusyEvent::Key(Some(KeyEvent::Override(text))) => {
                        user_override = self.accept_override(text);
                    }
                }
                continue;
            }

            match keys.recv().await {
                None | Some(KeyEvent::Quit) => break,
                Some(KeyEvent::Trigger) => {
                    pending = Some(self.spawn_cycle(history_nonempty, user_override.take()));
                }
                Some(KeyEvent::Override(text)) => {
                    user_override = self.accept_override(text);
                }
            }
        }

        println!("Goodbye! Happy cooking.");
        Ok(())
    }

    #[allow(clippy::unused_self)]
    fn accept_override(&self, text: String) -> Option<String> {
        if text.trim().is_empty() {
            None
        } else {
            println!("Will ask: {text}");
            Some(text)
        }
    }

    /// Automatic mode: analyze, then idle for the configured interval while
    /// watching for `q`; repeat unconditionally.
    pub async fn run_automatic(&self) -> Result<()> {
        println!("🍳 Cooking assistant — automatic mode");
        println!(
            "  analyzing every {}s, press q to quit\n",
            self.interval.as_secs()
        );

        let mut keys = spawn_key_reader(false);
        let mut history_nonempty = false;

        loop {
            let outcome = run_cycle(
                self.capture.as_ref(),
                self.vision.as_ref(),
                self.speech.as_ref(),
                !history_nonempty,
                None,
            )
            .await;
            if outcome == CycleOutcome::Answered {
                history_nonempty = true;
            }

            println!("Next analysis in {}s…", self.interval.as_secs());
            let idle = tokio::time::sleep(self.interval);
            tokio::pin!(idle);
            loop {
                tokio::select! {
                    () = &mut idle => break,
                    key = keys.recv() => match key {
                        None | Some(KeyEvent::Quit) => {
                            println!("Goodbye! Happy cooking.");
                            return Ok(());
                        }
                        _ => {}
                    },
                }
            }
        }
    }
}

/// Entry point for the desktop variant: wire the boundaries from config and
/// run the chosen loop.
pub async fn run_assist(
    config: &Config,
    mode: AssistMode,
    interval_secs: Option<u64>,
    message: Option<String>,
) -> Result<()> {
    let api_key = config.require_api_key()?;

    let capture: Arc<dyn CaptureSource> = Arc::new(CommandCapture::new(
        &config.capture.command,
        &config.capture.media_type,
    ));
    let vision: Arc<dyn Vision> = Arc::new(AnthropicVision::new(
        api_key,
        &config.model,
        config.max_tokens,
    ));
    let speech: Arc<dyn SpeechOutput> = match config.speech.command.as_deref() {
        Some(command) => Arc::new(CommandSpeech::new(command)),
        None => {
            tracing::info!("no speech command configured — replies will be printed only");
            Arc::new(NullSpeech)
        }
    };

    let interval = Duration::from_secs(interval_secs.unwrap_or(config.interval_secs));
    let assistant = Assistant::new(capture, vision, speech, interval);

    match mode {
        AssistMode::Interactive => assistant.run_interactive(message).await,
        AssistMode::Automatic => assistant.run_automatic().await,
    }
}
