// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child process adapter.
//!
//! The executor only ever talks to a child through [`ChildProcess`]: wait for
//! it, ask it to stop, force it to stop. Whether a signal was *sent* says
//! nothing about whether the child *exited*; only `wait` reports that.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// Per-stream cap on buffered child output (1 MiB).
pub const MAX_CAPTURED_BYTES: usize = 1024 * 1024;

/// How long `wait` keeps draining pipes after the child exits. Grandchildren
/// that inherited the pipes can hold them open indefinitely.
const PIPE_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

const TRUNCATION_MARKER: &str = "\n[output truncated]\n";

/// Errors from process operations
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn { program: String, source: std::io::Error },
    #[error("failed to signal process group {pid}: {source}")]
    Signal { pid: u32, source: nix::errno::Errno },
    #[error("failed waiting for child: {0}")]
    Wait(std::io::Error),
}

/// Everything needed to start a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnSpec {
    pub program: String,
    pub args: Vec<String>,
    /// The complete child environment; nothing is inherited from the parent.
    pub env: HashMap<String, String>,
    pub cwd: PathBuf,
}

/// How a child ended. `code` is `None` when it was terminated by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Output buffered from a child's stdout and stderr.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Default)]
struct StreamBuffer {
    bytes: Vec<u8>,
    truncated: bool,
}

impl StreamBuffer {
    fn push(&mut self, chunk: &[u8]) {
        let room = MAX_CAPTURED_BYTES.saturating_sub(self.bytes.len());
        if chunk.len() > room {
            self.truncated = true;
        }
        self.bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    fn render(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
        if self.truncated {
            text.push_str(TRUNCATION_MARKER);
        }
        text
    }
}

/// Spawns children.
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    type Child: ChildProcess;

    fn spawn(&self, spec: SpawnSpec) -> Result<Self::Child, ProcessError>;
}

/// A running child.
#[async_trait]
pub trait ChildProcess: Send + 'static {
    fn pid(&self) -> Option<u32>;

    /// Ask the child to exit (SIGTERM).
    fn terminate(&mut self) -> Result<(), ProcessError>;

    /// Force the child to exit (SIGKILL).
    fn kill(&mut self) -> Result<(), ProcessError>;

    /// Wait for the child to exit. Cancel-safe: dropping the future and
    /// calling again resumes waiting.
    async fn wait(&mut self) -> Result<ProcessExit, ProcessError>;

    /// Output buffered so far.
    fn output(&self) -> CapturedOutput;
}

/// Real children via `tokio::process`.
///
/// Each child leads its own process group so signals reach anything it
/// spawned in turn.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioProcessAdapter;

impl ProcessAdapter for TokioProcessAdapter {
    type Child = TokioChild;

    fn spawn(&self, spec: SpawnSpec) -> Result<TokioChild, ProcessError> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .env_clear()
            .envs(&spec.env)
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|source| ProcessError::Spawn { program: spec.program.clone(), source })?;

        let stdout = Arc::new(Mutex::new(StreamBuffer::default()));
        let stderr = Arc::new(Mutex::new(StreamBuffer::default()));
        let mut readers = Vec::with_capacity(2);
        if let Some(out) = child.stdout.take() {
            readers.push(spawn_reader(out, Arc::clone(&stdout)));
        }
        if let Some(err) = child.stderr.take() {
            readers.push(spawn_reader(err, Arc::clone(&stderr)));
        }

        tracing::debug!(program = %spec.program, pid = ?child.id(), "spawned child process");
        Ok(TokioChild { pid: child.id(), child, stdout, stderr, readers })
    }
}

fn spawn_reader<R>(mut stream: R, buffer: Arc<Mutex<StreamBuffer>>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0u8; 8192];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => buffer.lock().push(&chunk[..n]),
                Err(e) => {
                    tracing::debug!(error = %e, "child output stream closed with error");
                    break;
                }
            }
        }
    })
}

pub struct TokioChild {
    /// Captured at spawn; tokio clears `Child::id` once the child is reaped.
    pid: Option<u32>,
    child: Child,
    stdout: Arc<Mutex<StreamBuffer>>,
    stderr: Arc<Mutex<StreamBuffer>>,
    readers: Vec<JoinHandle<()>>,
}

/// Whether a process with `pid` currently exists. A process we may not
/// signal (`EPERM`) still exists. Pids that cannot name a single process
/// (0, or beyond `i32`) are reported dead.
pub fn is_process_alive(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }
    match kill(Pid::from_raw(raw), None) {
        Ok(()) | Err(nix::errno::Errno::EPERM) => true,
        Err(_) => false,
    }
}

impl TokioChild {
    fn signal(&self, signal: Signal) -> Result<(), ProcessError> {
        // Already reaped: nothing left to signal.
        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        match killpg(Pid::from_raw(pid as i32), signal) {
            Ok(()) => Ok(()),
            Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(source) => Err(ProcessError::Signal { pid, source }),
        }
    }
}

#[async_trait]
impl ChildProcess for TokioChild {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn terminate(&mut self) -> Result<(), ProcessError> {
        self.signal(Signal::SIGTERM)
    }

    fn kill(&mut self) -> Result<(), ProcessError> {
        self.signal(Signal::SIGKILL)
    }

    async fn wait(&mut self) -> Result<ProcessExit, ProcessError> {
        let status = self.child.wait().await.map_err(ProcessError::Wait)?;
        for reader in self.readers.drain(..) {
            if tokio::time::timeout(PIPE_DRAIN_TIMEOUT, reader).await.is_err() {
                tracing::debug!(pid = ?self.pid, "child output still open after exit, not waiting");
            }
        }
        Ok(ProcessExit { code: status.code() })
    }

    fn output(&self) -> CapturedOutput {
        CapturedOutput { stdout: self.stdout.lock().render(), stderr: self.stderr.lock().render() }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{CapturedOutput, ChildProcess, ProcessAdapter, ProcessError, ProcessExit, SpawnSpec};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio::time::Instant;

    /// Scripted behavior for the next spawned fake child.
    #[derive(Debug, Clone)]
    pub enum FakeBehavior {
        /// Exit with `code` after `after`, having written `stdout`/`stderr`.
        Exit { code: i32, after: Duration, stdout: String, stderr: String },
        /// Never exits on its own; SIGKILL ends it.
        Hang,
        /// Never exits, ignoring even SIGKILL (a stuck or zombie child).
        Unkillable,
        /// Exits `after` receiving SIGTERM, with no exit code.
        ExitOnTerminate { after: Duration },
        /// `wait` fails with an error after `after`.
        WaitError { after: Duration, message: String },
        /// `spawn` itself fails.
        SpawnError,
    }

    impl FakeBehavior {
        pub fn exit(code: i32) -> Self {
            FakeBehavior::Exit {
                code,
                after: Duration::ZERO,
                stdout: String::new(),
                stderr: String::new(),
            }
        }

        pub fn exit_with_output(code: i32, stdout: &str, stderr: &str) -> Self {
            FakeBehavior::Exit {
                code,
                after: Duration::ZERO,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SignalKind {
        Terminate,
        Kill,
    }

    /// A signal delivered to a fake child, stamped with tokio's clock.
    #[derive(Debug, Clone, Copy)]
    pub struct SignalRecord {
        pub kind: SignalKind,
        pub at: Instant,
    }

    type ExitSlot = Option<Result<ProcessExit, String>>;

    struct ChildShared {
        behavior: FakeBehavior,
        spawned_at: Instant,
        exit_tx: watch::Sender<ExitSlot>,
        signals: Mutex<Vec<SignalRecord>>,
        output: Mutex<CapturedOutput>,
    }

    impl ChildShared {
        fn finish(&self, exit: Result<ProcessExit, String>) {
            self.exit_tx.send_if_modified(|slot| {
                if slot.is_some() {
                    return false;
                }
                *slot = Some(exit);
                true
            });
        }

        fn finish_later(self: &Arc<Self>, after: Duration, exit: Result<ProcessExit, String>) {
            let shared = Arc::clone(self);
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                shared.finish(exit);
            });
        }
    }

    /// Test-side view of a spawned fake child.
    #[derive(Clone)]
    pub struct FakeChildHandle {
        shared: Arc<ChildShared>,
    }

    impl FakeChildHandle {
        pub fn spawned_at(&self) -> Instant {
            self.shared.spawned_at
        }

        pub fn signals(&self) -> Vec<SignalRecord> {
            self.shared.signals.lock().clone()
        }

        pub fn has_exited(&self) -> bool {
            self.shared.exit_tx.borrow().is_some()
        }

        /// Make the child exit now.
        pub fn exit(&self, code: i32) {
            self.shared.finish(Ok(ProcessExit { code: Some(code) }));
        }
    }

    pub struct FakeChild {
        shared: Arc<ChildShared>,
        exit_rx: watch::Receiver<ExitSlot>,
    }

    impl FakeChild {
        fn record(&self, kind: SignalKind) {
            self.shared.signals.lock().push(SignalRecord { kind, at: Instant::now() });
        }
    }

    #[async_trait]
    impl ChildProcess for FakeChild {
        fn pid(&self) -> Option<u32> {
            Some(4242)
        }

        fn terminate(&mut self) -> Result<(), ProcessError> {
            self.record(SignalKind::Terminate);
            if let FakeBehavior::ExitOnTerminate { after } = self.shared.behavior {
                self.shared.finish_later(after, Ok(ProcessExit { code: None }));
            }
            Ok(())
        }

        fn kill(&mut self) -> Result<(), ProcessError> {
            self.record(SignalKind::Kill);
            if !matches!(self.shared.behavior, FakeBehavior::Unkillable) {
                self.shared.finish(Ok(ProcessExit { code: None }));
            }
            Ok(())
        }

        async fn wait(&mut self) -> Result<ProcessExit, ProcessError> {
            loop {
                let current = self.exit_rx.borrow_and_update().clone();
                if let Some(exit) = current {
                    return exit.map_err(|m| ProcessError::Wait(std::io::Error::other(m)));
                }
                if self.exit_rx.changed().await.is_err() {
                    // Sender lives in `shared`, which we hold; unreachable in practice.
                    std::future::pending::<()>().await;
                }
            }
        }

        fn output(&self) -> CapturedOutput {
            self.shared.output.lock().clone()
        }
    }

    #[derive(Default)]
    struct FakeProcessState {
        script: VecDeque<FakeBehavior>,
        default: Option<FakeBehavior>,
        spawns: Vec<SpawnSpec>,
        children: Vec<FakeChildHandle>,
    }

    /// Fake process adapter for testing.
    ///
    /// Each spawn takes the next scripted behavior, falling back to the
    /// default (exit 0 immediately unless changed).
    #[derive(Clone, Default)]
    pub struct FakeProcessAdapter {
        inner: Arc<Mutex<FakeProcessState>>,
    }

    impl FakeProcessAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue the behavior of the next spawn.
        pub fn push(&self, behavior: FakeBehavior) -> &Self {
            self.inner.lock().script.push_back(behavior);
            self
        }

        pub fn set_default(&self, behavior: FakeBehavior) {
            self.inner.lock().default = Some(behavior);
        }

        pub fn spawns(&self) -> Vec<SpawnSpec> {
            self.inner.lock().spawns.clone()
        }

        pub fn child(&self, index: usize) -> Option<FakeChildHandle> {
            self.inner.lock().children.get(index).cloned()
        }
    }

    impl ProcessAdapter for FakeProcessAdapter {
        type Child = FakeChild;

        fn spawn(&self, spec: SpawnSpec) -> Result<FakeChild, ProcessError> {
            let mut state = self.inner.lock();
            let behavior = state
                .script
                .pop_front()
                .or_else(|| state.default.clone())
                .unwrap_or_else(|| FakeBehavior::exit(0));
            let program = spec.program.clone();
            state.spawns.push(spec);

            if matches!(behavior, FakeBehavior::SpawnError) {
                return Err(ProcessError::Spawn {
                    program,
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such program"),
                });
            }

            let (exit_tx, exit_rx) = watch::channel(None);
            let shared = Arc::new(ChildShared {
                behavior: behavior.clone(),
                spawned_at: Instant::now(),
                exit_tx,
                signals: Mutex::new(Vec::new()),
                output: Mutex::new(CapturedOutput::default()),
            });

            match behavior {
                FakeBehavior::Exit { code, after, stdout, stderr } => {
                    *shared.output.lock() = CapturedOutput { stdout, stderr };
                    if after.is_zero() {
                        shared.finish(Ok(ProcessExit { code: Some(code) }));
                    } else {
                        shared.finish_later(after, Ok(ProcessExit { code: Some(code) }));
                    }
                }
                FakeBehavior::WaitError { after, message } => {
                    shared.finish_later(after, Err(message));
                }
                FakeBehavior::Hang
                | FakeBehavior::Unkillable
                | FakeBehavior::ExitOnTerminate { .. }
                | FakeBehavior::SpawnError => {}
            }

            state.children.push(FakeChildHandle { shared: Arc::clone(&shared) });
            Ok(FakeChild { shared, exit_rx })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeBehavior, FakeChild, FakeChildHandle, FakeProcessAdapter, SignalKind, SignalRecord};

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
