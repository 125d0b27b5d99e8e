use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

const DEFAULT_FILTER: &str = "playerwatch=info,warn";
const DEBUG_FILTER: &str = "playerwatch=debug,warn";

/// `--debug` forces debug output; otherwise RUST_LOG wins when set
pub fn filter(debug: bool) -> EnvFilter {
    if debug {
        return EnvFilter::new(DEBUG_FILTER);
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Swaps the active filter once the configuration is known
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
}

impl LogHandle {
    pub fn set_debug(&self, debug: bool) {
        if let Err(e) = self.filter.reload(filter(debug)) {
            tracing::warn!(error = %e, "could not change log filter");
        }
    }
}

fn reloadable(debug: bool) -> (reload::Layer<EnvFilter, Registry>, LogHandle) {
    let (layer, handle) = reload::Layer::new(filter(debug));
    (layer, LogHandle { filter: handle })
}

pub fn init(debug: bool) -> LogHandle {
    let (filter, handle) = reloadable(debug);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
    handle
}

#[cfg(test)]
pub(crate) mod testing {
    //! Capture formatted log output of the current thread

    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing::subscriber::DefaultGuard;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Events on this thread land in the returned buffer until the guard drops
    pub fn capture() -> (CapturedLogs, DefaultGuard) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }
}
