//! Handles to running connector processes.

use std::process::Stdio;

use relaybyte_types::protocol::{ConnectorMessage, LogLevel};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, Command};
use tracing::Instrument;

use crate::error::{Result, WorkerError};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Reads line-delimited [`ConnectorMessage`]s from a connector's stdout.
///
/// Lines that are not protocol messages are logged and skipped, as are
/// `log` messages, which are forwarded to `tracing`.
pub struct MessageReader {
    image: String,
    lines: Lines<BufReader<BoxedReader>>,
}

impl MessageReader {
    pub fn new(image: impl Into<String>, stdout: BoxedReader) -> Self {
        Self {
            image: image.into(),
            lines: BufReader::new(stdout).lines(),
        }
    }

    /// Next protocol message, or `None` once stdout is closed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if reading stdout fails.
    pub async fn next_message(&mut self) -> Result<Option<ConnectorMessage>> {
        while let Some(line) = self.lines.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !trimmed.starts_with('{') {
                tracing::info!(image = %self.image, "{trimmed}");
                continue;
            }
            match serde_json::from_str::<ConnectorMessage>(trimmed) {
                Ok(ConnectorMessage::Log(log)) => forward_log(&self.image, log.level, &log.message),
                Ok(message) => return Ok(Some(message)),
                Err(err) => {
                    tracing::warn!(image = %self.image, error = %err, "Skipping malformed connector message");
                }
            }
        }
        Ok(None)
    }
}

fn forward_log(image: &str, level: LogLevel, message: &str) {
    match level {
        LogLevel::Fatal | LogLevel::Error => tracing::error!(image, "{message}"),
        LogLevel::Warn => tracing::warn!(image, "{message}"),
        LogLevel::Info => tracing::info!(image, "{message}"),
        LogLevel::Debug => tracing::debug!(image, "{message}"),
        LogLevel::Trace => tracing::trace!(image, "{message}"),
    }
}

/// One running connector: its stdin, its stdout, and (when it is a real
/// process) the child to wait on.
pub struct ConnectorProcess {
    image: String,
    stdin: Option<BoxedWriter>,
    stdout: Option<MessageReader>,
    child: Option<Child>,
    exit_code: i32,
}

impl ConnectorProcess {
    /// Spawn `command` with piped stdio. Stderr is forwarded to `tracing`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Launch`] if the process cannot be spawned.
    pub fn spawn(image: impl Into<String>, mut command: Command) -> Result<Self> {
        let image = image.into();
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| WorkerError::Launch {
            image: image.clone(),
            source,
        })?;
        tracing::debug!(image = %image, pid = child.id(), "Spawned connector process");

        let stdin = child
            .stdin
            .take()
            .map(|stdin| Box::new(stdin) as BoxedWriter);
        let stdout = child
            .stdout
            .take()
            .map(|stdout| MessageReader::new(image.clone(), Box::new(stdout)));
        if let Some(stderr) = child.stderr.take() {
            let stderr_image = image.clone();
            tokio::spawn(
                async move {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        tracing::warn!(image = %stderr_image, "{line}");
                    }
                }
                .instrument(tracing::Span::current()),
            );
        }

        Ok(Self {
            image,
            stdin,
            stdout,
            child: Some(child),
            exit_code: 0,
        })
    }

    /// Process backed by arbitrary streams rather than a child.
    pub fn from_parts(
        image: impl Into<String>,
        stdin: Option<BoxedWriter>,
        stdout: BoxedReader,
    ) -> Self {
        let image = image.into();
        Self {
            stdout: Some(MessageReader::new(image.clone(), stdout)),
            image,
            stdin,
            child: None,
            exit_code: 0,
        }
    }

    /// Exit code reported by [`wait`](Self::wait) for a process without a child.
    #[must_use]
    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Next protocol message from stdout.
    ///
    /// # Errors
    ///
    /// Fails if stdout was taken or cannot be read.
    pub async fn next_message(&mut self) -> Result<Option<ConnectorMessage>> {
        match self.stdout.as_mut() {
            Some(reader) => reader.next_message().await,
            None => Err(self.closed("stdout")),
        }
    }

    /// Take ownership of stdout, e.g. to drain it from another task.
    pub fn take_output(&mut self) -> Option<MessageReader> {
        self.stdout.take()
    }

    /// Write one message as a JSON line to stdin.
    ///
    /// # Errors
    ///
    /// Fails if stdin was closed or the write fails.
    pub async fn send(&mut self, message: &ConnectorMessage) -> Result<()> {
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(self.closed("stdin"));
        };
        stdin.write_all(&line).await?;
        Ok(())
    }

    /// Flush and close stdin, signalling end of input. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from flushing or shutting down the pipe.
    pub async fn close_stdin(&mut self) -> Result<()> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin.flush().await?;
            stdin.shutdown().await?;
        }
        Ok(())
    }

    /// Wait for the process to exit.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::ConnectorExit`] on a non-zero exit code.
    pub async fn wait(&mut self) -> Result<()> {
        self.close_stdin().await?;
        let code = match self.child.as_mut() {
            Some(child) => child.wait().await?.code().unwrap_or(-1),
            None => self.exit_code,
        };
        if code == 0 {
            tracing::debug!(image = %self.image, "Connector process exited");
            Ok(())
        } else {
            Err(WorkerError::ConnectorExit {
                image: self.image.clone(),
                code,
            })
        }
    }

    fn closed(&self, stream: &'static str) -> WorkerError {
        WorkerError::StreamClosed {
            image: self.image.clone(),
            stream,
        }
    }
}
