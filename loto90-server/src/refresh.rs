//! Rafraîchissement : collecte externe, invalidation des caches,
//! stockage des motifs, vérification, puis entraînement par type,
//! dans cet ordre. Non réentrant.

use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;
use tracing::{info, warn};

use loto90_db::db;
use loto90_db::models::Stream;

use crate::state::SharedState;

/// Boucle périodique. Un intervalle nul désactive le rafraîchissement
/// automatique ; le déclenchement forcé reste disponible via HTTP.
pub async fn periodic_refresh(state: SharedState) {
    let minutes = state.config.refresh_interval_minutes;
    if minutes == 0 {
        info!("rafraîchissement périodique désactivé");
        return;
    }
    let mut ticker = tokio::time::interval(Duration::from_secs(minutes * 60));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await; // le premier tick part immédiatement
    loop {
        ticker.tick().await;
        run_refresh(state.clone(), false).await;
    }
}

/// Un cycle de rafraîchissement. Retourne le nombre de nouveaux tirages.
pub async fn run_refresh(state: SharedState, force_train: bool) -> u32 {
    if state
        .is_refreshing
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        info!("rafraîchissement déjà en cours, passage ignoré");
        return 0;
    }

    let new_rows = do_refresh(&state, force_train).await;
    state.is_refreshing.store(false, Ordering::SeqCst);
    new_rows
}

async fn do_refresh(state: &SharedState, force_train: bool) -> u32 {
    let before = count_draws(state);

    if let Some(cmd) = state.config.scraper_cmd.clone() {
        match run_scraper(&cmd).await {
            Ok(()) => state.set_last_error(None),
            Err(e) => {
                warn!("collecte en échec : {e:#}");
                state.set_last_error(Some(format!("collecte : {e:#}")));
                return 0;
            }
        }
    }

    state.store.invalidate();
    let after = count_draws(state);
    let new_rows = after.saturating_sub(before);

    if new_rows == 0 && !force_train {
        info!("aucun nouveau tirage");
        return 0;
    }
    info!(nouveaux = new_rows, "nouvelles données ingérées");

    state.prediction_cache.invalidate_all();

    if state.config.run_analysis {
        if let Err(e) = store_patterns(state) {
            warn!("stockage des motifs en échec : {e:#}");
            state.set_last_error(Some(format!("analyse : {e:#}")));
        }
    }

    // La vérification précède toujours l'entraînement du même cycle.
    let draws = state.store.get_draws(None);
    let now = chrono::Utc::now().naive_utc();
    let verified = state.verifier.run(state.log.as_ref(), &draws, now, true);
    if verified > 0 {
        info!(verifies = verified, "prédictions rapprochées");
    }

    train_brains(state, now);
    new_rows
}

fn count_draws(state: &SharedState) -> u32 {
    state
        .store
        .with_conn(|conn| db::count_draws(conn))
        .unwrap_or(0)
}

async fn run_scraper(cmd: &str) -> anyhow::Result<()> {
    info!(commande = cmd, "lancement de la collecte");
    let status = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .status()
        .await?;
    if !status.success() {
        anyhow::bail!("code de sortie {status}");
    }
    Ok(())
}

/// Entraîne chaque cerveau sur le dernier tirage de chaque type qui
/// n'a pas encore été appris.
fn train_brains(state: &SharedState, now: chrono::NaiveDateTime) {
    for draw_type in state.store.get_draw_types() {
        let draws = state.store.get_draws(Some(draw_type.id));
        let Some(latest) = draws.last() else { continue };
        for stream in [Stream::Winning, Stream::Machine] {
            state.brains.learn_if_new(
                stream,
                latest,
                &draws,
                Some(draw_type.id),
                &state.strategies,
                state.store.as_ref(),
                now,
            );
        }
    }
}

/// Persiste les artefacts d'analyse dans la table des motifs. Les
/// forces sont bornées par la couche de stockage.
fn store_patterns(state: &SharedState) -> anyhow::Result<()> {
    use loto90_engine::analysis::{
        correlations::correlation_analysis, decades::decade_analysis,
        finales::finale_analysis, stream_history,
    };

    let now = chrono::Utc::now().naive_utc();
    for draw_type in state.store.get_draw_types() {
        let draws = state.store.get_draws(Some(draw_type.id));
        let sets = stream_history(&draws, Stream::Winning);
        if sets.is_empty() {
            continue;
        }

        let correlations = correlation_analysis(&sets);
        let pairs: Vec<_> = correlations
            .top_pairs
            .iter()
            .take(10)
            .map(|p| json!({ "a": p.a, "b": p.b, "count": p.count, "lift": p.lift }))
            .collect();
        let pair_strength = correlations
            .top_pairs
            .first()
            .map(|p| p.lift * 10.0)
            .unwrap_or(50.0);

        let decades = decade_analysis(&sets);
        let finales = finale_analysis(&sets);
        let best_finale = finales
            .iter()
            .max_by(|a, b| {
                a.percentage
                    .partial_cmp(&b.percentage)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|f| (f.finale, f.percentage))
            .unwrap_or((0, 0.0));

        state.store.with_conn(|conn| {
            db::save_pattern(
                conn,
                draw_type.id,
                "pairs",
                &serde_json::to_string(&pairs)?,
                pair_strength,
                now,
            )?;
            db::save_pattern(
                conn,
                draw_type.id,
                "decades",
                &serde_json::to_string(&decades.counts)?,
                50.0,
                now,
            )?;
            db::save_pattern(
                conn,
                draw_type.id,
                "finales",
                &json!({ "finale": best_finale.0, "percentage": best_finale.1 }).to_string(),
                best_finale.1,
                now,
            )?;
            Ok(())
        })?;
    }
    Ok(())
}
