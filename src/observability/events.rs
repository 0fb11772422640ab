//! Structured event stream for `cybersim`.
//!
//! Discrete, typed events emitted while a session runs. Events are
//! serialized as newline-delimited JSON (JSONL) and include a monotonically
//! increasing sequence number for ordering guarantees.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::deck::SimulationKind;

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during a simulation run.
///
/// Each variant is tagged with `"type"` when serialized to JSON so consumers
/// can dispatch on the event kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A session left `NotStarted`.
    SessionStarted {
        /// When the session started.
        timestamp: DateTime<Utc>,
        /// Identifier of this run, shared by every event it emits.
        run_id: String,
        /// Simulation being played.
        simulation: SimulationKind,
        /// Number of scenarios in the deck.
        scenarios: usize,
        /// Score needed to pass.
        pass_threshold: u8,
    },

    /// An answer was recorded for a scenario.
    AnswerRecorded {
        /// When the answer was recorded.
        timestamp: DateTime<Utc>,
        /// Simulation being played.
        simulation: SimulationKind,
        /// Scenario the answer belongs to.
        scenario_id: u32,
        /// Whether the answer matched the ground truth.
        is_correct: bool,
        /// Attempts spent on the scenario.
        attempts: u32,
    },

    /// Free text was tried against a predicate scenario.
    ProbeEvaluated {
        /// When the probe ran.
        timestamp: DateTime<Utc>,
        /// Simulation being played.
        simulation: SimulationKind,
        /// Whether the input satisfied the predicate.
        satisfied: bool,
        /// Attempts spent so far.
        attempts: u32,
    },

    /// The cursor moved to the next scenario.
    ScenarioAdvanced {
        /// When the transition occurred.
        timestamp: DateTime<Utc>,
        /// Simulation being played.
        simulation: SimulationKind,
        /// Zero-based index of the new scenario.
        index: usize,
    },

    /// The session reached `Finished`.
    SessionFinished {
        /// When the outcome was computed.
        timestamp: DateTime<Utc>,
        /// Simulation that was played.
        simulation: SimulationKind,
        /// Final score.
        score_percent: u8,
        /// Whether the score reached the threshold.
        passed: bool,
        /// Number of recorded answers.
        answered: usize,
        /// Whether the session ended before the deck was exhausted.
        early: bool,
    },

    /// The outcome was accepted by the backend.
    ResultPersisted {
        /// When the backend acknowledged.
        timestamp: DateTime<Utc>,
        /// Simulation that was persisted.
        simulation: SimulationKind,
    },

    /// The backend rejected or never received the outcome.
    ResultPersistFailed {
        /// When the failure was observed.
        timestamp: DateTime<Utc>,
        /// Simulation whose outcome was not persisted.
        simulation: SimulationKind,
        /// Failure description.
        error: String,
    },
}

// ---------------------------------------------------------------------------
// Envelope (adds sequence number via serde flatten)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Each call to [`emit`](Self::emit) atomically increments the sequence
/// counter, serializes the event as a single JSON line, and flushes the
/// underlying writer. Serialization or I/O failures are dropped; a broken
/// event sink never aborts a session.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Creates an emitter that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Resolves the `--events` target: `-` is stdout, `stderr` is stderr,
    /// anything else is a file path.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a file target cannot be created.
    pub fn from_target(target: &str) -> std::io::Result<Self> {
        match target {
            "-" | "stdout" => Ok(Self::stdout()),
            "stderr" => Ok(Self::stderr()),
            path => Self::from_file(Path::new(path)),
        }
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock()
            && let Ok(line) = serde_json::to_string(&envelope)
        {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
