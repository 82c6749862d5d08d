use std::path::PathBuf;

/// Configuration du serveur, lue une fois au démarrage depuis
/// l'environnement.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Intervalle du rafraîchissement périodique, en minutes. 0 désactive.
    pub refresh_interval_minutes: u64,
    /// Stockage des motifs d'analyse pendant le rafraîchissement.
    pub run_analysis: bool,
    pub database_path: PathBuf,
    pub history_path: PathBuf,
    /// Commande externe de collecte, exécutée par le rafraîchissement.
    pub scraper_cmd: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3310,
            refresh_interval_minutes: 60,
            run_analysis: false,
            database_path: loto90_db::db::db_path(),
            history_path: PathBuf::from("data/predictions.json"),
            scraper_cmd: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("PORT", defaults.port),
            refresh_interval_minutes: env_parse(
                "REFRESH_INTERVAL",
                defaults.refresh_interval_minutes,
            ),
            run_analysis: env_bool("RUN_ANALYSIS", defaults.run_analysis),
            database_path: std::env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            history_path: std::env::var("HISTORY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.history_path),
            scraper_cmd: std::env::var("SCRAPER_CMD").ok().filter(|s| !s.is_empty()),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}
