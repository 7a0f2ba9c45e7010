use anyhow::Result;

/// The shell lives on the main thread while sampling runs on a worker.
pub fn multi_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("codetime-worker")
        .enable_all()
        .build()?)
}
