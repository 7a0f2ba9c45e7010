use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Waits for Ctrl-C and turns it into a graceful stop of the sampler, so that the session in
/// progress gets saved.
///
/// Also returns if the token gets cancelled by someone else.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => {
                info!("Received Ctrl-C, stopping");
                cancelation.cancel();
            }
            Err(e) => {
                error!("Failed to listen for Ctrl-C {e:?}");
                cancelation.cancelled().await;
            }
        },
        _ = cancelation.cancelled() => (),
    };
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::detect_shutdown;

    #[tokio::test(start_paused = true)]
    async fn test_returns_when_cancelled_elsewhere() {
        let token = CancellationToken::new();
        let waiter = tokio::spawn(detect_shutdown(token.clone()));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!waiter.is_finished());

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("detect_shutdown kept waiting after cancel")
            .unwrap();
    }
}
