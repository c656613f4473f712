/// Exit status used when the job is interrupted.
pub(crate) const INTERRUPTED_EXIT_CODE: u8 = 130;

/// Resolve on the first Ctrl+C.
///
/// If the signal handler can't be installed this never resolves, so the job
/// simply runs to completion.
pub(crate) async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::warn!("Interrupt received, halting job");
}
