use tokio::sync::watch;

/// Cooperative cancellation signal for one run. Cheap to clone; every
/// suspension point in the pipeline (HTTP fetch, subprocess wait, bounded
/// queue send) checks `is_cancelled()` or races against `cancelled()`.
#[derive(Clone)]
pub struct CancelToken {
    tx: watch::Sender<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the token is cancelled. Race this against other
    /// futures with `tokio::select!` at suspension points.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        if *rx.borrow() {
            return;
        }
        let _ = rx.changed().await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancelled_resolves_immediately_if_already_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        tokio::time::timeout(std::time::Duration::from_millis(50), token.cancelled()).await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_resolves_after_cancel_called_later() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });
        assert!(!handle.is_finished());
        token.cancel();
        tokio::time::timeout(std::time::Duration::from_millis(100), handle).await.unwrap().unwrap();
    }
}
