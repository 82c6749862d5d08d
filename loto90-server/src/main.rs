mod config;
mod display;
mod import;
mod logging;
mod refresh;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use loto90_db::db::{count_draws, find_draw_type, migrate, open_db};
use loto90_db::models::Stream;
use loto90_db::store::DrawStore;
use loto90_engine::predict::{predict, PredictionRequest};

use crate::config::ServerConfig;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "loto90", about = "Prédiction Loto 5/90 — moteur d'ensemble auto-apprenant")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Démarrer le serveur HTTP (défaut)
    Serve,

    /// Importer un fichier CSV de tirages
    Import {
        /// Fichier CSV (date;g1..g5[;m1..m5], séparateur « ; »)
        file: PathBuf,

        /// Nom du type de tirage
        #[arg(short, long)]
        r#type: String,

        /// Catégorie du type
        #[arg(short, long, default_value = "")]
        category: String,
    },

    /// Afficher une prédiction en terminal
    Predict {
        /// Nom du type de tirage (tous si absent)
        #[arg(short, long)]
        r#type: Option<String>,

        /// Jour de semaine 0..6 (0 = dimanche)
        #[arg(short, long)]
        day: Option<u8>,
    },

    /// État du cerveau d'un volet
    Brain {
        /// winning ou machine
        #[arg(short, long, default_value = "winning")]
        stream: String,
    },

    /// Derniers tirages
    History {
        /// Nombre de tirages
        #[arg(short, long, default_value = "10")]
        last: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    let config = ServerConfig::from_env();

    let conn = open_db(&config.database_path)?;
    migrate(&conn)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => cmd_serve(config, conn).await,
        Command::Import {
            file,
            r#type,
            category,
        } => cmd_import(&conn, &file, &r#type, &category),
        Command::Predict { r#type, day } => cmd_predict(config, conn, r#type.as_deref(), day),
        Command::Brain { stream } => cmd_brain(config, conn, &stream),
        Command::History { last } => cmd_history(conn, last),
    }
}

async fn cmd_serve(config: ServerConfig, conn: loto90_db::rusqlite::Connection) -> Result<()> {
    let port = config.port;
    let state = AppState::new(config, DrawStore::new(conn));

    tokio::spawn(refresh::periodic_refresh(state.clone()));

    let app = routes::router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("serveur à l'écoute sur http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Impossible d'écouter sur {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn cmd_import(
    conn: &loto90_db::rusqlite::Connection,
    file: &PathBuf,
    type_name: &str,
    category: &str,
) -> Result<()> {
    let result = import::import_csv(conn, file, type_name, category)?;
    println!(
        "{} ligne(s) lues : {} insérée(s), {} ignorée(s), {} en erreur",
        result.total_records, result.inserted, result.skipped, result.errors
    );
    Ok(())
}

fn resolve_type(
    conn: &loto90_db::rusqlite::Connection,
    name: Option<&str>,
) -> Result<Option<i64>> {
    match name {
        None => Ok(None),
        Some(name) => match find_draw_type(conn, name)? {
            Some(draw_type) => Ok(Some(draw_type.id)),
            None => bail!("Type de tirage inconnu : {name}"),
        },
    }
}

fn cmd_predict(
    config: ServerConfig,
    conn: loto90_db::rusqlite::Connection,
    type_name: Option<&str>,
    day: Option<u8>,
) -> Result<()> {
    if count_draws(&conn)? == 0 {
        bail!("Base vide. Lancez d'abord : loto90 import <fichier> --type <nom>");
    }
    if let Some(day) = day {
        if day > 6 {
            bail!("Jour invalide : {day} (0..6 attendu)");
        }
    }
    let draw_type_id = resolve_type(&conn, type_name)?;
    let state = AppState::new(config, DrawStore::new(conn));

    let draws = state.store.get_draws(draw_type_id);
    let winning = state.brains.snapshot(Stream::Winning);
    let machine = state.brains.snapshot(Stream::Machine);
    let prediction = predict(
        &PredictionRequest {
            draws: &draws,
            draw_type_id,
            day_of_week: day,
            winning_weights: &winning.weights,
            machine_weights: &machine.weights,
            strategies: &state.strategies,
            now: chrono::Utc::now().naive_utc(),
        },
        Some(state.log.as_ref()),
    );
    display::display_prediction(&prediction);
    Ok(())
}

fn cmd_brain(
    config: ServerConfig,
    conn: loto90_db::rusqlite::Connection,
    stream: &str,
) -> Result<()> {
    let stream = match stream {
        "winning" => Stream::Winning,
        "machine" => Stream::Machine,
        other => bail!("Volet inconnu : {other} (winning ou machine)"),
    };
    let state = AppState::new(config, DrawStore::new(conn));
    let brain = state.brains.snapshot(stream);
    display::display_brain(&brain, stream.key());
    Ok(())
}

fn cmd_history(conn: loto90_db::rusqlite::Connection, last: usize) -> Result<()> {
    if count_draws(&conn)? == 0 {
        bail!("Base vide. Lancez d'abord : loto90 import <fichier> --type <nom>");
    }
    let store = DrawStore::new(conn);
    let draws = store.get_draws(None);
    let start = draws.len().saturating_sub(last);
    let mut recent: Vec<_> = draws[start..].to_vec();
    recent.reverse();
    display::display_history(&recent);
    Ok(())
}
