use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::mpsc::Sender;
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

const LOG_FILE: &str = "pipeline.log";
const DEFAULT_DIRECTIVE: &str = "accidents_sql=info";

/// Initializes logging to stderr and to `<logs_dir>/pipeline.log`.
///
/// With `console` off only the file receives events, which keeps the
/// terminal free for the TUI. `warnings` receives every `WARN` event as a
/// plain line. The returned guard flushes the file on drop.
pub fn init_logging(
    logs_dir: &Path,
    console: bool,
    warnings: Option<Sender<String>>,
) -> Result<WorkerGuard> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create logs directory: {:?}", logs_dir))?;

    let file_appender = tracing_appender::rolling::never(logs_dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_DIRECTIVE))
        .context("Invalid log filter")?;

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(file_writer);

    let console_layer = console.then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .with(warnings.map(|sender| warning_layer(sender)))
        .try_init()
        .context("Logging already initialized")?;

    Ok(guard)
}

/// Sends each `WARN` event, without time or level, down `sender`
pub fn warning_layer<S>(sender: Sender<String>) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .without_time()
        .with_level(false)
        .with_target(false)
        .with_ansi(false)
        .with_writer(move || ChannelWriter(sender.clone()))
        .with_filter(filter_fn(|meta| *meta.level() == Level::WARN))
}

struct ChannelWriter(Sender<String>);

impl io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let line = String::from_utf8_lossy(buf).trim_end().to_string();
        if !line.is_empty() {
            // Receiver gone means the TUI already closed
            self.0.send(line).ok();
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
