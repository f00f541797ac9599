//! The reusable output surface and the processes attached to it

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::{Result, RunnerError};
use crate::host::{Host, OutputStream, SplitSpec, SurfaceId};

use super::recipe::RunPlan;

pub type RunId = u64;

/// Something a running process did, delivered on the host loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Output {
        run: RunId,
        surface: SurfaceId,
        stream: OutputStream,
        line: String,
    },
    /// Sent exactly once per run, after all of its output
    Exited {
        run: RunId,
        surface: SurfaceId,
        code: i32,
    },
}

/// One output surface, reused across runs, and the event channel for every
/// process started through it.
///
/// Owned by the host integration and passed to the runner by `&mut`. A second
/// run does not stop the first: both write to the same surface and both
/// report their exit.
pub struct Session {
    shell: String,
    surface: Option<SurfaceId>,
    next_run: RunId,
    in_flight: usize,
    tx: UnboundedSender<SessionEvent>,
    rx: UnboundedReceiver<SessionEvent>,
}

impl Session {
    pub fn new(shell: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            shell: shell.into(),
            surface: None,
            next_run: 1,
            in_flight: 0,
            tx,
            rx,
        }
    }

    /// Number of spawned processes whose exit has not been received yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Reuse the remembered surface (cleared and focused) if the host still
    /// has it, otherwise open a new split and remember that one.
    pub fn ensure_surface<H: Host + ?Sized>(&mut self, host: &mut H, spec: SplitSpec) -> SurfaceId {
        if let Some(id) = self.surface {
            if host.surface_is_valid(id) {
                host.clear_surface(id);
                host.focus_surface(id);
                return id;
            }
            tracing::debug!("surface {} is gone, opening a new split", id);
        }

        let id = host.open_split(spec);
        self.surface = Some(id);
        id
    }

    /// Start `<shell> -lc <command>` in `cwd` and stream it into `surface`.
    /// Returns as soon as the process is started.
    pub fn spawn(&mut self, plan: &RunPlan, cwd: &Path, surface: SurfaceId) -> Result<RunId> {
        let mut child = Command::new(&self.shell)
            .arg("-lc")
            .arg(&plan.shell_command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                command: plan.shell_command.clone(),
                source,
            })?;

        let run = self.next_run;
        self.next_run += 1;
        self.in_flight += 1;

        tracing::info!(
            run,
            cwd = %cwd.display(),
            "spawned: {} -lc {}",
            self.shell,
            plan.shell_command
        );

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            tokio::join!(
                forward_lines(stdout, run, surface, OutputStream::Stdout, &tx),
                forward_lines(stderr, run, surface, OutputStream::Stderr, &tx),
            );

            let code = match child.wait().await {
                Ok(status) => status.code().unwrap_or(-1),
                Err(e) => {
                    tracing::warn!(run, "failed to wait for process: {}", e);
                    -1
                }
            };

            let _ = tx.send(SessionEvent::Exited { run, surface, code });
        });

        Ok(run)
    }

    /// Next event from any run. Pending forever when nothing is running.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let event = self.rx.recv().await?;
        if let SessionEvent::Exited { .. } = event {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        Some(event)
    }
}

async fn forward_lines<R: AsyncRead + Unpin>(
    reader: Option<R>,
    run: RunId,
    surface: SurfaceId,
    stream: OutputStream,
    tx: &UnboundedSender<SessionEvent>,
) {
    let Some(reader) = reader else {
        return;
    };

    // Raw lines: a process may print bytes that are not UTF-8, and the pipe
    // has to stay open until it exits.
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(run, "failed to read {:?}: {}", stream, e);
                break;
            }
        }

        let event = SessionEvent::Output {
            run,
            surface,
            stream,
            line: decode_line(&buf),
        };
        if tx.send(event).is_err() {
            break;
        }
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
