use anyhow::{Context, Result};
use log::debug;
use std::sync::OnceLock;
use tokio::runtime::Runtime;

static GLOBAL_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Process-wide runtime that drives the engine for callers outside tokio.
/// Must not be called from inside another runtime.
pub fn init_global_runtime_blocking() -> Result<&'static Runtime> {
    if let Some(rt) = GLOBAL_RUNTIME.get() {
        return Ok(rt);
    }
    let threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .max(2);
    debug!("Initializing global runtime with {} threads", threads);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(threads)
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    // A racing caller may have won; its runtime is kept and ours dropped.
    Ok(GLOBAL_RUNTIME.get_or_init(|| runtime))
}
