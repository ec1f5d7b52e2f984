//! In-memory launcher that replays scripted connector output.
//!
//! Lets callers exercise workers and workflows without Docker: no process is
//! started, every launch is recorded, and whatever a worker writes to a
//! connector's stdin is captured per image. The crate's own tests and
//! integration tests run against it.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use relaybyte_types::job::IntegrationLauncherConfig;
use relaybyte_types::protocol::ConnectorMessage;
use tokio::io::AsyncWrite;

use super::{args, ConnectorProcess, IntegrationLauncher, LauncherFactory};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaunchCommand {
    Spec,
    Check,
    Discover,
    Read,
    Write,
}

/// One recorded launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRecord {
    pub image: String,
    pub command: LaunchCommand,
    pub job_root: PathBuf,
    pub args: Vec<String>,
}

#[derive(Debug, Default)]
struct Script {
    stdout: Vec<String>,
    exit_code: i32,
}

#[derive(Debug, Default)]
struct Shared {
    scripts: HashMap<(String, LaunchCommand), Script>,
    created: Vec<IntegrationLauncherConfig>,
    launches: Vec<LaunchRecord>,
    stdin: HashMap<String, Arc<Mutex<Vec<u8>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// [`LauncherFactory`] whose launchers replay scripted stdout.
///
/// Unscripted commands produce no output and exit with code 0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLauncherFactory {
    shared: Arc<Mutex<Shared>>,
}

impl ScriptedLauncherFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the messages `image` prints for `command`.
    pub fn respond(
        &self,
        image: &str,
        command: LaunchCommand,
        messages: impl IntoIterator<Item = ConnectorMessage>,
    ) -> &Self {
        let lines = messages
            .into_iter()
            .filter_map(|message| serde_json::to_string(&message).ok());
        self.respond_lines(image, command, lines)
    }

    /// Script raw stdout lines, including non-protocol ones.
    pub fn respond_lines(
        &self,
        image: &str,
        command: LaunchCommand,
        lines: impl IntoIterator<Item = impl Into<String>>,
    ) -> &Self {
        let mut shared = lock(&self.shared);
        let script = shared
            .scripts
            .entry((image.to_string(), command))
            .or_default();
        script.stdout.extend(lines.into_iter().map(Into::into));
        drop(shared);
        self
    }

    /// Script the exit code of `image` for `command`.
    pub fn exit_with(&self, image: &str, command: LaunchCommand, code: i32) -> &Self {
        lock(&self.shared)
            .scripts
            .entry((image.to_string(), command))
            .or_default()
            .exit_code = code;
        self
    }

    /// Every config passed to [`LauncherFactory::create`], in order.
    #[must_use]
    pub fn created(&self) -> Vec<IntegrationLauncherConfig> {
        lock(&self.shared).created.clone()
    }

    /// Every launch, in order.
    #[must_use]
    pub fn launches(&self) -> Vec<LaunchRecord> {
        lock(&self.shared).launches.clone()
    }

    /// Messages written to the stdin of `image`, across all its launches.
    #[must_use]
    pub fn received(&self, image: &str) -> Vec<ConnectorMessage> {
        let Some(buffer) = lock(&self.shared).stdin.get(image).cloned() else {
            return Vec::new();
        };
        let bytes = lock(&buffer).clone();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

impl LauncherFactory for ScriptedLauncherFactory {
    fn create(&self, config: &IntegrationLauncherConfig) -> Arc<dyn IntegrationLauncher> {
        lock(&self.shared).created.push(config.clone());
        Arc::new(ScriptedLauncher {
            image: config.docker_image.clone(),
            shared: Arc::clone(&self.shared),
        })
    }
}

struct ScriptedLauncher {
    image: String,
    shared: Arc<Mutex<Shared>>,
}

impl ScriptedLauncher {
    fn launch(
        &self,
        command: LaunchCommand,
        job_root: &Path,
        args: Vec<String>,
    ) -> Result<ConnectorProcess> {
        let mut shared = lock(&self.shared);
        shared.launches.push(LaunchRecord {
            image: self.image.clone(),
            command,
            job_root: job_root.to_path_buf(),
            args,
        });
        let (stdout, exit_code) = shared
            .scripts
            .get(&(self.image.clone(), command))
            .map(|script| {
                let mut stdout = script.stdout.join("\n");
                stdout.push('\n');
                (stdout, script.exit_code)
            })
            .unwrap_or_default();
        let stdin = Arc::clone(shared.stdin.entry(self.image.clone()).or_default());
        drop(shared);

        Ok(ConnectorProcess::from_parts(
            self.image.clone(),
            Some(Box::new(CaptureWriter(stdin))),
            Box::new(Cursor::new(stdout.into_bytes())),
        )
        .with_exit_code(exit_code))
    }
}

impl IntegrationLauncher for ScriptedLauncher {
    fn image(&self) -> &str {
        &self.image
    }

    fn spec(&self, job_root: &Path) -> Result<ConnectorProcess> {
        self.launch(LaunchCommand::Spec, job_root, args::spec())
    }

    fn check(&self, job_root: &Path, config_filename: &str) -> Result<ConnectorProcess> {
        self.launch(LaunchCommand::Check, job_root, args::check(config_filename))
    }

    fn discover(&self, job_root: &Path, config_filename: &str) -> Result<ConnectorProcess> {
        self.launch(
            LaunchCommand::Discover,
            job_root,
            args::discover(config_filename),
        )
    }

    fn read(
        &self,
        job_root: &Path,
        config_filename: &str,
        catalog_filename: &str,
        state_filename: Option<&str>,
    ) -> Result<ConnectorProcess> {
        self.launch(
            LaunchCommand::Read,
            job_root,
            args::read(config_filename, catalog_filename, state_filename),
        )
    }

    fn write(
        &self,
        job_root: &Path,
        config_filename: &str,
        catalog_filename: &str,
    ) -> Result<ConnectorProcess> {
        self.launch(
            LaunchCommand::Write,
            job_root,
            args::write(config_filename, catalog_filename),
        )
    }
}

/// Appends everything written to a shared buffer.
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl AsyncWrite for CaptureWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        lock(&self.0).extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
