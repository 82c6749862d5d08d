use tracing_subscriber::{fmt, EnvFilter};

/// Initialise le souscripteur tracing. `RUST_LOG` prime sur le niveau
/// par défaut.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}
