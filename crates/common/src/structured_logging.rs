use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::Context, layer::SubscriberExt, EnvFilter, Layer, Registry};

/// One line of JSON output.
///
/// `session_id` and `duration_ms` are lifted out of the event fields so log
/// processors can group a negotiation and chart oracle latency without
/// digging through `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredLogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
}

/// Writes one [`StructuredLogEntry`] per event
pub struct JsonLayer<W> {
    make_writer: W,
}

impl<W> JsonLayer<W>
where
    W: for<'a> MakeWriter<'a> + 'static,
{
    pub fn new(make_writer: W) -> Self {
        Self { make_writer }
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'a> MakeWriter<'a> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut entry = StructuredLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            level: metadata.level().to_string(),
            target: metadata.target().to_string(),
            message: String::new(),
            session_id: None,
            duration_ms: None,
            fields: BTreeMap::new(),
        };
        event.record(&mut EntryVisitor(&mut entry));

        if let Ok(line) = serde_json::to_string(&entry) {
            let _ = writeln!(self.make_writer.make_writer(), "{}", line);
        }
    }
}

struct EntryVisitor<'a>(&'a mut StructuredLogEntry);

impl EntryVisitor<'_> {
    fn put(&mut self, field: &Field, value: Value) {
        match (field.name(), value) {
            ("message", Value::String(text)) => self.0.message = text,
            ("session_id", Value::String(id)) => self.0.session_id = Some(id),
            ("duration_ms", Value::Number(n)) if n.is_u64() => self.0.duration_ms = n.as_u64(),
            (name, value) => {
                self.0.fields.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for EntryVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, Value::String(format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// `[logging]` section of the application config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
    pub color_output: bool,
    pub include_line_numbers: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            color_output: true,
            include_line_numbers: cfg!(debug_assertions),
        }
    }
}

impl LoggingConfig {
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()))
    }
}

/// Install the global subscriber. Logs go to stderr so they never mix with
/// the dialogue on stdout.
pub fn init_structured_logging(config: LoggingConfig) -> anyhow::Result<()> {
    let registry = Registry::default().with(config.filter());

    match config.format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(JsonLayer::new(io::stderr)))?
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_writer(io::stderr)
                .with_line_number(config.include_line_numbers)
                .with_ansi(config.color_output);
            tracing::subscriber::set_global_default(registry.with(fmt_layer))?
        }
    }

    Ok(())
}

/// Times one operation (an oracle call, a directory fan-out) and logs the
/// outcome with `duration_ms` when finished
pub struct OperationTimer {
    start: Instant,
    operation: String,
    fields: BTreeMap<String, Value>,
}

impl OperationTimer {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            operation: operation.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn add_field(&mut self, key: impl Into<String>, value: impl Serialize) {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
    }

    pub fn finish(self) -> Duration {
        self.finish_with_result::<(), &str>(&Ok(()))
    }

    pub fn finish_with_result<T, E: std::fmt::Display>(self, result: &Result<T, E>) -> Duration {
        let elapsed = self.start.elapsed();
        let duration_ms = elapsed.as_millis() as u64;
        let context = Value::Object(self.fields.into_iter().collect());
        match result {
            Ok(_) => tracing::debug!(
                operation = %self.operation,
                duration_ms,
                context = %context,
                "Operation completed"
            ),
            Err(e) => tracing::warn!(
                operation = %self.operation,
                duration_ms,
                context = %context,
                error = %e,
                "Operation failed"
            ),
        }
        elapsed
    }
}
