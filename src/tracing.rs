use tracing::{subscriber::set_global_default, Subscriber};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt, EnvFilter, Registry};

use crate::{setting::LoggingConfig, Error, Result};

// RUST_LOG wins over the configured filter
pub fn subscriber<Sink>(config: &LoggingConfig, sink: Sink) -> Result<impl Subscriber + Send + Sync>
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter).map_err(Error::as_unknown_error)?,
    };

    Ok(Registry::default()
        .with(filter)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(config.name.clone(), sink)))
}

pub fn init(config: &LoggingConfig) -> Result<()> {
    LogTracer::init().map_err(Error::as_unknown_error)?;
    set_global_default(subscriber(config, std::io::stdout)?).map_err(Error::as_unknown_error)?;
    tracing::debug!(name = %config.name, filter = %config.filter, "logging initialised");
    Ok(())
}

#[cfg(test)]
mod test {
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    use super::*;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn config(filter: &str) -> LoggingConfig {
        LoggingConfig {
            name: "poseview_test".into(),
            filter: filter.into(),
        }
    }

    #[test]
    fn writes_bunyan_records_under_configured_name() {
        let buffer = Buffer::default();
        let subscriber = subscriber(&config("warn"), buffer.clone()).unwrap();

        ::tracing::subscriber::with_default(subscriber, || {
            ::tracing::warn!(frame = 7, "detection timed out");
        });

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let record: serde_json::Value = serde_json::from_str(output.lines().last().unwrap()).unwrap();
        assert_eq!(record["name"], "poseview_test");
        assert_eq!(record["msg"], "detection timed out");
        assert_eq!(record["frame"], 7);
    }

    #[test]
    fn invalid_filter_is_an_error() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        assert!(subscriber(&config("poseview=loudest"), Buffer::default()).is_err());
    }
}
