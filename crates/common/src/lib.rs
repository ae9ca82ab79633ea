use snafu::ResultExt;
use tracing::error;

/// Turn the first task to leave a `JoinSet` into an error.
///
/// Every task the server spawns is expected to run until shutdown, so any
/// exit, clean or not, is reported.
pub fn handle_background_thread_result<T, E>(
    task: &str,
    result: Option<Result<Result<T, E>, tokio::task::JoinError>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let message = match result {
        Some(Ok(Ok(_))) => format!("{task} exited unexpectedly"),
        Some(Ok(Err(e))) => format!("{task} failed: {e}"),
        Some(Err(e)) if e.is_panic() => format!("{task} panicked: {e}"),
        Some(Err(e)) => format!("{task} was cancelled: {e}"),
        None => format!("{task}: no tasks left to join"),
    };
    error!("{}", message);
    Err(message.into())
}

#[derive(Debug, snafu::Snafu)]
pub enum InitLoggerError {
    #[snafu(display("Failed to initialize logger: {}", source))]
    LoggerFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// `log_level` is an `EnvFilter` directive, e.g. `info` or
/// `shop_server=debug,sqlx=warn`.
pub fn init_logger(log_level: &str) -> Result<(), InitLoggerError> {
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(true)
        .try_init()
        .context(LoggerFailedSnafu)?;

    Ok(())
}
