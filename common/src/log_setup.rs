use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};
use parking_lot::{const_mutex, Mutex};

static LOG_HANDLE: Mutex<Option<LoggerHandle>> = const_mutex(None);

/// Initializes the process logger.
///
/// `RUST_LOG` takes precedence over `base_level`. Calling this again after a
/// successful setup is a no-op.
pub fn setup_logging(base_level: &str) -> Result<(), FlexiLoggerError> {
    let mut handle = LOG_HANDLE.lock();
    if handle.is_some() {
        return Ok(());
    }

    let logger = Logger::try_with_env_or_str(base_level)?
        .format(flexi_logger::detailed_format)
        .log_to_stdout()
        .start()?;
    *handle = Some(logger);

    log::debug!("Logging initialized with base level '{}'", base_level);
    Ok(())
}

pub fn is_logging_initialized() -> bool {
    LOG_HANDLE.lock().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_is_idempotent() {
        setup_logging("info").expect("first setup");
        assert!(is_logging_initialized());
        setup_logging("debug").expect("second setup is a no-op");
    }
}
