//! Session-oriented remote execution.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CommandRunner, RunContext, RunnerError};

/// A remote shell session (SSH or similar).
#[async_trait]
pub trait RemoteSession: Send {
    async fn connect(&mut self) -> Result<(), RunnerError>;

    /// Run one shell command line and return its output.
    async fn run(&mut self, command_line: &str) -> Result<String, RunnerError>;

    async fn close(&mut self) -> Result<(), RunnerError>;
}

struct SessionState<S> {
    session: S,
    connected: bool,
}

/// Adapts a [`RemoteSession`] to a [`CommandRunner`].
///
/// Connects on first use; the caller closes the session after the run.
pub struct SessionRunner<S> {
    state: Mutex<SessionState<S>>,
}

impl<S: RemoteSession> SessionRunner<S> {
    pub fn new(session: S) -> Self {
        Self {
            state: Mutex::new(SessionState {
                session,
                connected: false,
            }),
        }
    }

    /// Close the session if it was opened.
    pub async fn close(&self) -> Result<(), RunnerError> {
        let mut state = self.state.lock().await;
        if !state.connected {
            return Ok(());
        }
        state.connected = false;
        state.session.close().await
    }

    /// Recover the session, e.g. to inspect it after a run.
    pub fn into_inner(self) -> S {
        self.state.into_inner().session
    }
}

#[async_trait]
impl<S: RemoteSession> CommandRunner for SessionRunner<S> {
    async fn run(&self, ctx: &RunContext, args: &[String]) -> Result<String, RunnerError> {
        let mut state = self.state.lock().await;
        if !state.connected {
            state.session.connect().await?;
            state.connected = true;
            tracing::debug!(run_id = %ctx.run_id, "remote session connected");
        }
        state.session.run(&shell_join(args)).await
    }
}

/// Join args into one POSIX shell command line.
pub fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,@%+".contains(c));
    if safe {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}
