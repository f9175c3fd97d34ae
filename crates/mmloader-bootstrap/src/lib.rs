//! In-process bootstrap for the mod loader.
//!
//! Built as a `cdylib`; the host maps it at startup and the constructor
//! below runs the full load sequence on the host's own thread. The host is
//! never informed of, nor blocked by, a loader failure: everything lands
//! in the diagnostic log.

use ctor::ctor;

#[ctor]
fn bootstrap() {
    init_tracing();
    if std::panic::catch_unwind(mmloader_core::run).is_err() {
        tracing::error!("mod loader panicked during startup");
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mmloader=info"));
    // The host may already own a global subscriber; losing this race is fine.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
