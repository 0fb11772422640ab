//! `run` command
//!
//! Plays one simulation in the terminal. Answers come from stdin, or from
//! `--answers` when scripted. Free-text simulations treat every input as an
//! attempt: unsuccessful attempts are probed, the first successful one is
//! recorded, and when input runs out the last attempt is recorded as is.

use std::collections::VecDeque;
use std::io::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::cli::args::{OutputFormat, RunArgs};
use crate::cli::commands::password::format_report;
use crate::cli::render::render_payload;
use crate::deck::{
    AnswerValue, Deck, GroundTruth, InputPredicate, PredicateVerdict, ScenarioRecord,
    SimulationKind, builtin, load_deck_file,
};
use crate::emitter::{EmitReport, ResultEmitter};
use crate::error::CybersimError;
use crate::observability::{Event, EventEmitter, init_metrics, metrics};
use crate::scoring::sql::LoginAttempt;
use crate::scoring::strength::analyze_password;
use crate::session::{Advance, AnswerRecord, Phase, Session, SimulationOutcome};

// ============================================================================
// Entry Point
// ============================================================================

/// Play a simulation and report (and optionally persist) the outcome.
///
/// # Errors
///
/// Returns a `DeckError` for unknown or malformed decks, a usage error for
/// scripted answers that do not fit the scenario, and I/O errors from stdin
/// or the event file. Persistence failures are warnings, not errors.
pub async fn run(args: &RunArgs, quiet: bool) -> Result<(), CybersimError> {
    let deck = resolve_deck(args)?;

    if let Some(port) = args.metrics_port {
        init_metrics(Some(port))?;
    }
    let events = args
        .events
        .as_deref()
        .map(EventEmitter::from_target)
        .transpose()?
        .map(Arc::new);

    let mut input = args
        .answers
        .as_ref()
        .map_or_else(AnswerSource::stdin, |answers| {
            AnswerSource::scripted(answers.clone())
        });

    let mut driver = Driver {
        session: Session::new(deck),
        events: events.clone(),
        show: args.format == OutputFormat::Human && !quiet,
    };
    let started = Instant::now();
    driver.play(&mut input).await?;
    let duration = started.elapsed();

    let report = persist(args, &mut driver.session, events, duration).await?;
    print_summary(args.format, quiet, driver.session.deck(), &report, duration)
}

fn resolve_deck(args: &RunArgs) -> Result<Deck, CybersimError> {
    if let Some(path) = &args.deck {
        let loaded = load_deck_file(path)?;
        for warning in &loaded.warnings {
            warn!(location = %warning.path, "{}", warning.message);
        }
        return Ok(loaded.deck);
    }
    let name = args.simulation.as_deref().ok_or_else(|| {
        CybersimError::Usage("a simulation name or --deck is required".to_owned())
    })?;
    Ok(builtin::resolve(name)?.load()?)
}

async fn persist(
    args: &RunArgs,
    session: &mut Session,
    events: Option<Arc<EventEmitter>>,
    duration: Duration,
) -> Result<EmitReport, CybersimError> {
    let (Some(api_url), Some(user_id)) = (&args.api_url, &args.user_id) else {
        info!("no backend configured, result kept local");
        return Ok(EmitReport {
            outcome: session.take_outcome()?,
            persisted: false,
            warning: None,
        });
    };

    let client = ApiClient::new(api_url)?;
    let mut emitter = ResultEmitter::new(Arc::new(client), user_id.clone());
    if let Some(events) = events {
        emitter = emitter.with_events(events);
    }
    Ok(emitter.emit(session, duration).await?)
}

fn print_summary(
    format: OutputFormat,
    quiet: bool,
    deck: &Deck,
    report: &EmitReport,
    duration: Duration,
) -> Result<(), CybersimError> {
    let outcome = &report.outcome;
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "outcome": outcome,
                "pass_threshold": deck.pass_threshold(),
                "persisted": report.persisted,
                "warning": report.warning,
                "duration_seconds": duration.as_secs(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Human if !quiet => {
            let verdict = if outcome.passed { "PASSED" } else { "FAILED" };
            println!();
            println!(
                "{}: {}% (pass mark {}%) {verdict}",
                deck.title(),
                outcome.score_percent,
                deck.pass_threshold()
            );
            if deck.is_generative() {
                if let Some(record) = outcome.trace.values().next() {
                    println!("Attempts: {}", record.attempts);
                }
            } else {
                println!(
                    "{} of {} correct",
                    outcome.correct_count(),
                    deck.len()
                );
            }
        }
        OutputFormat::Human => {}
    }
    if let Some(warning) = &report.warning {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

// ============================================================================
// Answer Source
// ============================================================================

/// Where answers come from.
enum AnswerSource {
    Scripted(VecDeque<String>),
    Stdin(Lines<BufReader<Stdin>>),
}

impl AnswerSource {
    fn scripted(answers: Vec<String>) -> Self {
        Self::Scripted(answers.into_iter().map(|a| a.trim().to_owned()).collect())
    }

    fn stdin() -> Self {
        Self::Stdin(BufReader::new(tokio::io::stdin()).lines())
    }

    const fn is_scripted(&self) -> bool {
        matches!(self, Self::Scripted(_))
    }

    /// Next answer, or `None` once input is exhausted.
    async fn next(&mut self) -> Result<Option<String>, CybersimError> {
        match self {
            Self::Scripted(queue) => Ok(queue.pop_front()),
            Self::Stdin(lines) => Ok(lines.next_line().await?.map(|l| l.trim().to_owned())),
        }
    }
}

// ============================================================================
// Driver
// ============================================================================

struct Driver {
    session: Session,
    events: Option<Arc<EventEmitter>>,
    show: bool,
}

impl Driver {
    async fn play(&mut self, input: &mut AnswerSource) -> Result<(), CybersimError> {
        self.session.start()?;
        let kind = self.simulation();
        let deck = self.session.deck();
        metrics::record_session_started(kind);
        self.event(Event::SessionStarted {
            timestamp: Utc::now(),
            run_id: uuid::Uuid::new_v4().to_string(),
            simulation: kind,
            scenarios: deck.len(),
            pass_threshold: deck.pass_threshold(),
        });
        if self.show {
            println!("== {} ==", deck.title());
            println!(
                "{} scenario(s), pass mark {}%",
                deck.len(),
                deck.pass_threshold()
            );
        }

        loop {
            match self.session.phase() {
                Phase::Presenting => {
                    let Some(scenario) = self.session.current().cloned() else {
                        break;
                    };
                    self.present(&scenario);
                    let answered = match scenario.truth {
                        GroundTruth::Predicate(predicate) => {
                            self.play_free_text(predicate, &scenario, input).await?
                        }
                        _ => self.play_fixed(&scenario, input).await?,
                    };
                    if !answered {
                        let outcome = self.session.finish_early()?;
                        self.finished(&outcome, true);
                        break;
                    }
                }
                Phase::AwaitingFeedbackAck => match self.session.advance()? {
                    Advance::Next { index } => self.event(Event::ScenarioAdvanced {
                        timestamp: Utc::now(),
                        simulation: kind,
                        index,
                    }),
                    Advance::Finished(outcome) => {
                        self.finished(&outcome, false);
                        break;
                    }
                },
                Phase::NotStarted | Phase::Finished => break,
            }
        }
        Ok(())
    }

    /// Asks for one fixed answer until it parses. Returns `false` when input
    /// ran out before an answer was recorded.
    async fn play_fixed(
        &mut self,
        scenario: &ScenarioRecord,
        input: &mut AnswerSource,
    ) -> Result<bool, CybersimError> {
        let question = question_for(self.simulation(), &scenario.truth);
        loop {
            self.prompt(&question);
            let Some(raw) = input.next().await? else {
                return Ok(false);
            };
            self.echo(input, &raw);

            match parse_answer(&scenario.truth, &raw) {
                Ok(value) => {
                    let record = self.session.submit_answer(value)?.clone();
                    self.answered(&record, scenario);
                    return Ok(true);
                }
                Err(message) if input.is_scripted() => {
                    return Err(CybersimError::Usage(format!(
                        "scenario {}: {message}",
                        scenario.id
                    )));
                }
                Err(message) => {
                    if self.show {
                        println!("  {message}");
                    }
                }
            }
        }
    }

    /// Free-text loop. Each attempt is previewed; a failed attempt becomes a
    /// probe once the next one arrives, so every attempt is counted once.
    async fn play_free_text(
        &mut self,
        predicate: InputPredicate,
        scenario: &ScenarioRecord,
        input: &mut AnswerSource,
    ) -> Result<bool, CybersimError> {
        let mut pending: Option<String> = None;
        loop {
            let attempt = match predicate {
                InputPredicate::SqlInjection => self.read_login(input).await?,
                InputPredicate::StrongPassword => {
                    self.prompt("password");
                    input.next().await?
                }
            };
            let Some(attempt) = attempt.filter(|a| !a.trim().is_empty()) else {
                return match pending {
                    Some(last) => {
                        self.submit_text(last, scenario)?;
                        Ok(true)
                    }
                    None => Ok(false),
                };
            };

            if let Some(previous) = pending.take() {
                let report = self.session.probe(&previous)?;
                self.event(Event::ProbeEvaluated {
                    timestamp: Utc::now(),
                    simulation: self.simulation(),
                    satisfied: report.verdict.satisfied,
                    attempts: report.attempts,
                });
            }

            let verdict = self.session.preview(&attempt)?;
            self.show_verdict(predicate, &attempt, verdict);
            if verdict.satisfied {
                self.submit_text(attempt, scenario)?;
                return Ok(true);
            }
            pending = Some(attempt);
        }
    }

    async fn read_login(
        &self,
        input: &mut AnswerSource,
    ) -> Result<Option<String>, CybersimError> {
        if input.is_scripted() {
            return Ok(input.next().await?.map(|value| {
                let (username, password) = value.split_once('|').unwrap_or((value.as_str(), ""));
                LoginAttempt::new(username, password).as_input()
            }));
        }
        self.prompt("username");
        let Some(username) = input.next().await? else {
            return Ok(None);
        };
        self.prompt("password");
        let password = input.next().await?.unwrap_or_default();
        Ok(Some(LoginAttempt::new(username, password).as_input()))
    }

    fn submit_text(&mut self, text: String, scenario: &ScenarioRecord) -> Result<(), CybersimError> {
        let record = self.session.submit_answer(AnswerValue::Text(text))?.clone();
        self.answered(&record, scenario);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------------

    fn simulation(&self) -> SimulationKind {
        self.session.deck().kind()
    }

    fn event(&self, event: Event) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }

    fn prompt(&self, label: &str) {
        if self.show {
            print!("{label}> ");
            let _ = std::io::stdout().flush();
        }
    }

    fn echo(&self, input: &AnswerSource, raw: &str) {
        if self.show && input.is_scripted() {
            println!("{raw}");
        }
    }

    fn present(&self, scenario: &ScenarioRecord) {
        if !self.show {
            return;
        }
        let position = self.session.state().current_index() + 1;
        println!();
        println!(
            "[{position}/{}] {}",
            self.session.deck().len(),
            scenario.title
        );
        print!("{}", render_payload(&scenario.prompt, 2));
    }

    fn show_verdict(&self, predicate: InputPredicate, attempt: &str, verdict: PredicateVerdict) {
        if !self.show {
            return;
        }
        match predicate {
            InputPredicate::StrongPassword => {
                println!();
                print!("{}", format_report(&analyze_password(attempt)));
            }
            InputPredicate::SqlInjection => {
                let login = LoginAttempt::from_input(attempt);
                println!("  query: {}", login.vulnerable_query());
                if verdict.satisfied {
                    println!("  Access granted: the injection bypassed authentication.");
                } else {
                    println!("  Login failed. Try again.");
                }
            }
        }
    }

    fn answered(&self, record: &AnswerRecord, scenario: &ScenarioRecord) {
        let kind = self.simulation();
        metrics::record_answer(kind, record.is_correct);
        self.event(Event::AnswerRecorded {
            timestamp: Utc::now(),
            simulation: kind,
            scenario_id: record.scenario_id,
            is_correct: record.is_correct,
            attempts: record.attempts,
        });
        if !self.show {
            return;
        }
        if record.is_correct {
            println!("  ✓ Correct");
        } else {
            match &scenario.truth {
                GroundTruth::Binary(truth) => {
                    println!("  ✗ Incorrect, the answer was {}", AnswerValue::Binary(*truth));
                }
                GroundTruth::Choice { best, .. } => {
                    println!("  ✗ Incorrect, the best action was {best}");
                }
                GroundTruth::Predicate(_) => println!("  ✗ Not achieved"),
            }
        }
        print!("{}", render_payload(&scenario.explanation, 4));
    }

    fn finished(&self, outcome: &SimulationOutcome, early: bool) {
        metrics::record_outcome(outcome.simulation, outcome.score_percent, outcome.passed);
        self.event(Event::SessionFinished {
            timestamp: Utc::now(),
            simulation: outcome.simulation,
            score_percent: outcome.score_percent,
            passed: outcome.passed,
            answered: outcome.trace.len(),
            early,
        });
    }
}

// ============================================================================
// Answer Parsing
// ============================================================================

fn question_for(kind: SimulationKind, truth: &GroundTruth) -> String {
    match truth {
        GroundTruth::Binary(_) => match kind {
            SimulationKind::Phishing => "phishing? [y/n]".to_owned(),
            SimulationKind::Malware => "malicious? [y/n]".to_owned(),
            _ => "attack? [y/n]".to_owned(),
        },
        GroundTruth::Choice { options, .. } => format!("[{}]", options.join("/")),
        GroundTruth::Predicate(_) => "input".to_owned(),
    }
}

/// Parses a typed answer for `truth`.
///
/// Binary scenarios accept yes/no words; choice scenarios accept an option
/// token (case-insensitive) or its 1-based position.
fn parse_answer(truth: &GroundTruth, raw: &str) -> Result<AnswerValue, String> {
    let normalized = raw.trim().to_lowercase();
    match truth {
        GroundTruth::Binary(_) => match normalized.as_str() {
            "y" | "yes" | "true" | "phishing" | "malicious" | "attack" => {
                Ok(AnswerValue::Binary(true))
            }
            "n" | "no" | "false" | "legit" | "legitimate" | "safe" => {
                Ok(AnswerValue::Binary(false))
            }
            _ => Err(format!("'{raw}' is not a yes/no answer")),
        },
        GroundTruth::Choice { options, .. } => {
            if let Some(token) = options.iter().find(|o| o.to_lowercase() == normalized) {
                return Ok(AnswerValue::choice(token.clone()));
            }
            normalized
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| options.get(i))
                .map(|token| AnswerValue::choice(token.clone()))
                .ok_or_else(|| format!("expected one of: {}", options.join(", ")))
        }
        GroundTruth::Predicate(_) => Ok(AnswerValue::text(raw)),
    }
}
