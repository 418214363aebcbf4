use std::future::Future;

/// Submits deferred lifecycle work to the runtime.
///
/// Every asynchronous effect of the mock (runner execution, signal-triggered
/// exit emission) goes through here. The extra `yield_now` guarantees at
/// least one full scheduler tick between the call that requested the work
/// and the work itself, so on a current-thread runtime nothing deferred can
/// run inside the caller's stack.
pub(crate) fn defer<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::task::yield_now().await;
        future.await;
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn deferred_work_does_not_run_before_an_await_point() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        super::defer(async move {
            flag.store(true, Ordering::SeqCst);
        });

        assert!(!ran.load(Ordering::SeqCst));
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert!(ran.load(Ordering::SeqCst));
    }
}
