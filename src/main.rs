use anyhow::Result;
use codetime::{cli::run_cli, utils::runtime::multi_thread_runtime};
use tracing::error;

fn main() -> Result<()> {
    multi_thread_runtime()?.block_on(async {
        run_cli().await.inspect_err(|e| {
            error!("Error running cli {e:?}");
        })
    })
}
