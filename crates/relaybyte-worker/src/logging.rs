//! Per-attempt log files.
//!
//! [`AttemptLogLayer`] watches for `attempt` spans (opened by
//! [`TracingLogContext`](crate::attempt::TracingLogContext)) and appends
//! every event recorded inside one to the file named by the span's
//! `log_path` field. Install it next to the console layer:
//!
//! ```no_run
//! use tracing_subscriber::layer::SubscriberExt;
//! use tracing_subscriber::util::SubscriberInitExt;
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(relaybyte_worker::logging::AttemptLogLayer)
//!     .init();
//! ```

use std::fmt::{self, Write as _};
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Name of the span that scopes one attempt.
pub const ATTEMPT_SPAN_NAME: &str = "attempt";

/// Field of the attempt span holding the log file path.
pub const LOG_PATH_FIELD: &str = "log_path";

/// Routes events inside an `attempt` span to that attempt's log file.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttemptLogLayer;

impl<S> Layer<S> for AttemptLogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if attrs.metadata().name() != ATTEMPT_SPAN_NAME {
            return;
        }
        let mut visitor = LogPathVisitor::default();
        attrs.record(&mut visitor);
        if let (Some(path), Some(span)) = (visitor.log_path, ctx.span(id)) {
            span.extensions_mut().insert(AttemptLogFile::new(path));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(scope) = ctx.event_scope(event) else {
            return;
        };
        for span in scope {
            if let Some(file) = span.extensions().get::<AttemptLogFile>() {
                file.append(event);
                return;
            }
        }
    }
}

/// Log file of one attempt, opened on the first event that finds the job
/// root in place.
struct AttemptLogFile {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl AttemptLogFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: Mutex::new(None),
        }
    }

    fn append(&self, event: &Event<'_>) {
        let mut guard = self
            .file
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if guard.is_none() {
            // The job root may not exist yet; a later event retries.
            *guard = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .ok();
        }
        if let Some(file) = guard.as_mut() {
            // A full disk must not fail the attempt.
            let _ = file.write_all(format_line(event).as_bytes());
        }
    }
}

fn format_line(event: &Event<'_>) -> String {
    let metadata = event.metadata();
    let mut visitor = LineVisitor::default();
    event.record(&mut visitor);

    let mut line = format!(
        "{} {:>5} {}: {}",
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        metadata.level(),
        metadata.target(),
        visitor.message
    );
    for (name, value) in visitor.fields {
        let _ = write!(line, " {name}={value}");
    }
    line.push('\n');
    line
}

#[derive(Default)]
struct LogPathVisitor {
    log_path: Option<PathBuf>,
}

impl Visit for LogPathVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == LOG_PATH_FIELD {
            self.log_path = Some(PathBuf::from(value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == LOG_PATH_FIELD {
            self.log_path = Some(PathBuf::from(format!("{value:?}")));
        }
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: Vec<(&'static str, String)>,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push((field.name(), format!("{value:?}")));
        }
    }
}
