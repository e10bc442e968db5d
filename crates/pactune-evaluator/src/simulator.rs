//! Subprocess-backed evaluator.
//!
//! [`SimulatorEvaluator`] launches the capture simulator once per match, waits for it to
//! finish, and parses the final status line of its standard output.
//!
//! # Invocation
//!
//! ```text
//! <program> <script> -r <team> [-b <opponent>] [-l <layout>] -i <iterations> <extra args...> <payload>
//! ```
//!
//! The candidate always plays on the red side (`-r`). The payload arguments are produced by
//! [`PayloadStyle::args`].
//!
//! # Output Handling
//!
//! The simulator's output is not framed, and only its last lines matter. Standard output is
//! drained on a helper thread while the process runs; only the trailing `output_budget`
//! bytes are retained.
//!
//! # Timeouts
//!
//! With a timeout configured, the process is polled until the deadline and killed if it is
//! still running. The match then fails with [`EvaluationError::Timeout`]. The deadline also
//! bounds the wait for end of output, which a leftover grandchild holding the pipe could
//! otherwise postpone indefinitely.

use std::{
    collections::VecDeque,
    io::{self, Read},
    path::PathBuf,
    process::{Child, Command, ExitStatus, Stdio},
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use pactune_weights::RoleVectors;

use crate::{EvaluationError, Evaluator, Fitness, outcome::MatchOutcome, payload::PayloadStyle};

/// Default number of trailing output bytes kept for parsing.
pub const DEFAULT_OUTPUT_BUDGET: usize = 2000;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const READ_CHUNK: usize = 4096;

/// How to launch the simulator.
#[derive(Debug, Clone)]
pub struct SimulatorCommand {
    /// Interpreter or executable to run (e.g. `python2`)
    pub program: String,
    /// Simulator entry point passed as the first argument (e.g. `capture.py`)
    pub script: PathBuf,
    /// Team module for the red side, which plays the candidate weights
    pub team: String,
    /// Team module for the blue side; the simulator default when unset
    pub opponent: Option<String>,
    /// Map layout; the simulator default when unset
    pub layout: Option<String>,
    /// Step limit for each match
    pub iterations: u32,
    /// Additional arguments inserted before the payload
    pub extra_args: Vec<String>,
    pub payload: PayloadStyle,
    /// Directory to run the simulator in; the current directory when unset
    pub working_dir: Option<PathBuf>,
}

impl SimulatorCommand {
    /// Builds the argument list (excluding the program) for one match.
    pub fn args(&self, vectors: RoleVectors<'_>) -> Result<Vec<String>, serde_json::Error> {
        let mut args = vec![
            self.script.display().to_string(),
            "-r".to_owned(),
            self.team.clone(),
        ];
        if let Some(opponent) = &self.opponent {
            args.extend(["-b".to_owned(), opponent.clone()]);
        }
        if let Some(layout) = &self.layout {
            args.extend(["-l".to_owned(), layout.clone()]);
        }
        args.extend(["-i".to_owned(), self.iterations.to_string()]);
        args.extend(self.extra_args.iter().cloned());
        args.extend(self.payload.args(vectors)?);
        Ok(args)
    }
}

/// Scores candidates by running the external simulator.
#[derive(Debug, Clone)]
pub struct SimulatorEvaluator {
    command: SimulatorCommand,
    side: String,
    output_budget: usize,
    timeout: Option<Duration>,
}

impl SimulatorEvaluator {
    /// Creates an evaluator that scores matches from the red side's point of view.
    #[must_use]
    pub fn new(command: SimulatorCommand) -> Self {
        Self {
            command,
            side: "Red".to_owned(),
            output_budget: DEFAULT_OUTPUT_BUDGET,
            timeout: None,
        }
    }

    /// Sets the side name the candidate plays as in the simulator's result line.
    #[must_use]
    pub fn with_side<S>(mut self, side: S) -> Self
    where
        S: Into<String>,
    {
        self.side = side.into();
        self
    }

    #[must_use]
    pub fn with_output_budget(mut self, bytes: usize) -> Self {
        self.output_budget = bytes;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn command(&self) -> &SimulatorCommand {
        &self.command
    }

    fn run(&self, vectors: RoleVectors<'_>) -> Result<String, EvaluationError> {
        let args = self
            .command
            .args(vectors)
            .map_err(EvaluationError::Serialize)?;
        log::debug!("running: {} {}", self.command.program, args.join(" "));

        let mut command = Command::new(&self.command.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(dir) = &self.command.working_dir {
            command.current_dir(dir);
        }
        let mut child = command.spawn().map_err(|source| EvaluationError::Spawn {
            program: self.command.program.clone(),
            source,
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EvaluationError::Output(io::Error::other("stdout was not captured")))?;

        // Grandchildren may inherit the pipe and keep it open after the simulator is gone, so
        // the reader is detached and only waited on until the deadline.
        let budget = self.output_budget;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || tx.send(read_tail(stdout, budget)).ok());

        let started = Instant::now();
        let status = wait_with_timeout(&mut child, self.timeout)?;
        let output = match self.timeout {
            Some(timeout) => {
                let remaining = timeout.saturating_sub(started.elapsed()).max(POLL_INTERVAL);
                rx.recv_timeout(remaining).map_err(|e| match e {
                    RecvTimeoutError::Timeout => EvaluationError::Timeout { timeout },
                    RecvTimeoutError::Disconnected => EvaluationError::Panicked,
                })?
            }
            None => rx.recv().map_err(|_| EvaluationError::Panicked)?,
        }
        .map_err(EvaluationError::Output)?;
        let output = String::from_utf8_lossy(&output).into_owned();
        if !status.success() {
            return Err(EvaluationError::AbnormalExit { status });
        }
        Ok(output)
    }
}

impl Evaluator for SimulatorEvaluator {
    fn play_match(&self, vectors: RoleVectors<'_>) -> Result<Fitness, EvaluationError> {
        let output = self.run(vectors)?;
        let outcome = MatchOutcome::from_output(&output).map_err(EvaluationError::Parse)?;
        log::debug!("match outcome: {outcome:?}");
        Ok(outcome.score_for(&self.side))
    }
}

/// Reads `reader` to the end, keeping only the last `budget` bytes.
fn read_tail<R>(mut reader: R, budget: usize) -> io::Result<Vec<u8>>
where
    R: Read,
{
    let mut tail = VecDeque::with_capacity(budget);
    let mut buf = [0; READ_CHUNK];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        tail.extend(&buf[..n]);
        let excess = tail.len().saturating_sub(budget);
        tail.drain(..excess);
    }
    Ok(Vec::from(tail))
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> Result<ExitStatus, EvaluationError> {
    let Some(timeout) = timeout else {
        return child.wait().map_err(EvaluationError::Wait);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().map_err(EvaluationError::Wait)? {
            return Ok(status);
        }
        let now = Instant::now();
        if now >= deadline {
            // the process may exit on its own between try_wait and kill
            if let Err(e) = child.kill() {
                log::warn!("failed to kill timed out simulator: {e}");
            }
            child.wait().map_err(EvaluationError::Wait)?;
            return Err(EvaluationError::Timeout { timeout });
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}
