//! Tracing setup: a human-readable stderr layer and a JSON file layer.
//!
//! Failure causes from the core library go to the file log only. Below `-v`
//! the stderr layer drops every `deckagent_core` event, so the terminal
//! never shows more than the pipeline's user-facing message.

use std::path::PathBuf;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Filter for the JSON file log.
const FILE_DIRECTIVES: &str = "deckagent_core=debug,deckagent=debug";

/// Filter for the stderr layer at the given verbosity.
fn stderr_directives(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error,deckagent_core=off",
        0 => "warn,deckagent_core=off",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn stderr_layer<S, W>(verbose: u8, quiet: bool, writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(writer)
        .with_filter(EnvFilter::new(stderr_directives(verbose, quiet)))
}

fn file_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_writer(writer)
        .with_filter(EnvFilter::new(FILE_DIRECTIVES))
}

/// Directory for the daily rolling log file.
pub fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "codeholics", "deckagent")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file log when dropped; hold it until
/// `main` returns.
pub fn init(verbose: u8, quiet: bool) -> WorkerGuard {
    let log_dir = log_dir();
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "deckagent.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(stderr_layer(verbose, quiet, std::io::stderr))
        .with(file_layer(non_blocking))
        .init();
    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render;
    use crate::repl::{self, OutputOptions};
    use deckagent_core::error::{LlmError, RetrievalError};
    use deckagent_core::{MockResearchProvider, NoOpCallback, PIPELINE_ERROR_MESSAGE, Pipeline};
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn failing_pipeline(cause: &str) -> Pipeline {
        let provider = MockResearchProvider::new();
        provider.queue_retrieval(Err(RetrievalError::from(LlmError::ApiRequest {
            message: cause.to_string(),
        })));
        Pipeline::new(Arc::new(provider), Arc::new(NoOpCallback))
    }

    #[test]
    fn test_stderr_hides_core_below_verbose() {
        assert!(stderr_directives(0, false).contains("deckagent_core=off"));
        assert!(stderr_directives(0, true).contains("deckagent_core=off"));
        assert!(!stderr_directives(1, false).contains("deckagent_core=off"));
    }

    #[tokio::test]
    async fn test_failed_run_cause_reaches_file_log_only() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("deckagent.log");
        let (file_writer, file_guard) =
            tracing_appender::non_blocking(std::fs::File::create(&log_path).unwrap());

        let stderr = Captured::default();
        let stderr_sink = stderr.clone();
        let subscriber = tracing_subscriber::registry()
            .with(stderr_layer(0, false, move || stderr_sink.clone()))
            .with(file_layer(file_writer));
        let default_guard = tracing::subscriber::set_default(subscriber);

        let mut pipeline = failing_pipeline("HTTP 500 upstream exploded");
        let options = OutputOptions {
            json: false,
            quiet: true,
        };
        let succeeded = repl::research_topic(&mut pipeline, "Fusion Energy", options)
            .await
            .unwrap();
        assert!(!succeeded);
        assert_eq!(
            render::render_error(pipeline.error().unwrap()),
            format!("! {}", PIPELINE_ERROR_MESSAGE)
        );

        drop(default_guard);
        drop(file_guard);

        let terminal = stderr.contents();
        assert!(!terminal.contains("upstream exploded"), "{}", terminal);
        assert!(!terminal.contains("Pipeline run failed"), "{}", terminal);

        let log = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(log.matches("Pipeline run failed").count(), 1, "{}", log);
        assert!(log.contains("upstream exploded"));
    }
}
