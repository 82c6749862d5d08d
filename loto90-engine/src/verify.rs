//! Boucle de vérification : rapproche les prédictions journalisées des
//! tirages nouvellement ingérés. Une entrée vérifiée est immuable ;
//! tout échec la laisse en attente pour le prochain passage.

use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use tracing::{debug, warn};

use loto90_db::models::Draw;

use crate::brain::learn::near_misses;
use crate::history::{PredictionLog, PredictionRecord, VerifiedResult};

/// Fenêtre d'attribution, en heures : le tirage doit tomber dans
/// [prédiction − 24 h, prédiction + 72 h).
const WINDOW_BEFORE_HOURS: i64 = 24;
const WINDOW_AFTER_HOURS: i64 = 72;
/// Seules les entrées plus récentes que 7 jours sont candidates.
const LOOKBACK_DAYS: i64 = 7;
const THROTTLE: Duration = Duration::from_secs(60);

pub struct Verifier {
    last_run: Mutex<Option<Instant>>,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Verifier {
    pub fn new() -> Self {
        Self {
            last_run: Mutex::new(None),
        }
    }

    /// Exécution paresseuse, au plus une fois par minute sauf si
    /// forcée. Retourne le nombre d'entrées vérifiées.
    pub fn run(
        &self,
        log: &dyn PredictionLog,
        draws: &[Draw],
        now: NaiveDateTime,
        force: bool,
    ) -> usize {
        {
            let mut last = self.last_run.lock();
            if !force {
                if let Some(at) = *last {
                    if at.elapsed() < THROTTLE {
                        return 0;
                    }
                }
            }
            *last = Some(Instant::now());
        }
        verify_pending(log, draws, now)
    }
}

/// Passe de vérification sans limitation de débit.
pub fn verify_pending(log: &dyn PredictionLog, draws: &[Draw], now: NaiveDateTime) -> usize {
    let cutoff = now - chrono::Duration::days(LOOKBACK_DAYS);
    let recent_draws: Vec<&Draw> = draws.iter().filter(|d| d.date >= cutoff).collect();
    if recent_draws.is_empty() {
        return 0;
    }

    let mut entries = log.entries();
    let mut verified = 0usize;

    for entry in entries.iter_mut() {
        if entry.is_verified() || entry.timestamp < cutoff {
            continue;
        }
        if let Some(draw) = attribute(entry, &recent_draws) {
            apply_result(entry, draw);
            verified += 1;
            debug!(
                date = %draw.date,
                exacts = entry.result.as_ref().map(|r| r.match_count),
                "prédiction vérifiée"
            );
        }
    }

    if verified > 0 {
        if let Err(e) = log.replace(entries) {
            warn!("persistance du journal impossible : {e:#}");
            return 0;
        }
    }
    verified
}

/// Le tirage attribuable : le plus ancien du bon type daté au plus tôt
/// du jour de la prédiction, s'il tombe dans la fenêtre.
fn attribute<'a>(entry: &PredictionRecord, recent: &[&'a Draw]) -> Option<&'a Draw> {
    let prediction_day = entry.timestamp.date().and_hms_opt(0, 0, 0).unwrap();
    let candidate = recent
        .iter()
        .copied()
        .filter(|d| entry.draw_type_id.map_or(true, |t| d.draw_type_id == t))
        .filter(|d| d.date >= prediction_day)
        .min_by_key(|d| (d.date, d.id))?;

    let delta = candidate.date - entry.timestamp;
    if delta >= -chrono::Duration::hours(WINDOW_BEFORE_HOURS)
        && delta < chrono::Duration::hours(WINDOW_AFTER_HOURS)
    {
        Some(candidate)
    } else {
        None
    }
}

fn make_result(predicted: &[u8], actual: &[u8], draw_date: NaiveDateTime) -> VerifiedResult {
    let mut matches: Vec<u8> = predicted
        .iter()
        .copied()
        .filter(|n| actual.contains(n))
        .collect();
    matches.sort_unstable();
    let mut near = near_misses(predicted, actual);
    near.sort_unstable();
    VerifiedResult {
        draw_date,
        actual: actual.to_vec(),
        match_count: matches.len() as u8,
        matches,
        near_misses: near,
    }
}

fn apply_result(entry: &mut PredictionRecord, draw: &Draw) {
    entry.result = Some(make_result(
        &entry.predicted_numbers,
        &draw.winning,
        draw.date,
    ));
    // Les volets machine et hybride ne se vérifient que sur un tirage
    // au groupe machine complet.
    if let Some(machine) = &draw.machine {
        if let Some(numbers) = &entry.machine_numbers {
            entry.machine_result = Some(make_result(numbers, machine, draw.date));
        }
        if let Some(numbers) = &entry.hybrid_numbers {
            entry.hybrid_result = Some(make_result(numbers, &draw.winning, draw.date));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::history::{InMemoryPredictionLog, PredictionRecord};

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn record(timestamp: NaiveDateTime) -> PredictionRecord {
        PredictionRecord {
            timestamp,
            draw_type_id: Some(1),
            day_of_week: None,
            predicted_numbers: vec![7, 15, 23, 42, 71],
            confidence: 60.0,
            scores: vec![1.0, 0.9, 0.8, 0.7, 0.6],
            machine_numbers: Some(vec![10, 20, 30, 40, 50]),
            machine_confidence: Some(55.0),
            hybrid_numbers: Some(vec![7, 15, 23, 42, 71]),
            hybrid_confidence: Some(62.0),
            result: None,
            machine_result: None,
            hybrid_result: None,
        }
    }

    fn draw(date: NaiveDateTime, winning: [u8; 5], machine: Option<[u8; 5]>) -> Draw {
        Draw {
            id: 1,
            draw_type_id: 1,
            date,
            day_of_week: 0,
            winning,
            machine,
        }
    }

    #[test]
    fn test_draw_within_window_verifies() {
        let log = InMemoryPredictionLog::default();
        log.append(record(ts(1, 13))).unwrap();
        // Tirage 48 h après la prédiction.
        let draws = vec![draw(ts(3, 13), [7, 15, 30, 42, 80], None)];

        let verified = verify_pending(&log, &draws, ts(4, 0));
        assert_eq!(verified, 1);
        let entry = &log.entries()[0];
        let result = entry.result.as_ref().unwrap();
        assert_eq!(result.match_count, 3);
        assert_eq!(result.matches, vec![7, 15, 42]);
        // 23 n'est à 1 d'aucun tiré ; 71 non plus.
        assert!(result.near_misses.is_empty());
    }

    #[test]
    fn test_draw_past_window_stays_pending() {
        let log = InMemoryPredictionLog::default();
        log.append(record(ts(1, 13))).unwrap();
        // 96 h après : hors fenêtre.
        let draws = vec![draw(ts(5, 13), [7, 15, 30, 42, 80], None)];

        let verified = verify_pending(&log, &draws, ts(6, 0));
        assert_eq!(verified, 0);
        assert!(log.entries()[0].result.is_none());
    }

    #[test]
    fn test_wrong_type_not_attributed() {
        let log = InMemoryPredictionLog::default();
        log.append(record(ts(1, 13))).unwrap();
        let mut other = draw(ts(2, 13), [7, 15, 30, 42, 80], None);
        other.draw_type_id = 2;

        assert_eq!(verify_pending(&log, &[other], ts(3, 0)), 0);
    }

    #[test]
    fn test_verified_entry_never_rewritten() {
        let log = InMemoryPredictionLog::default();
        log.append(record(ts(1, 13))).unwrap();
        let first = vec![draw(ts(2, 13), [7, 15, 30, 42, 80], None)];
        verify_pending(&log, &first, ts(3, 0));
        let before = log.entries()[0].result.clone().unwrap();

        // Un autre tirage attribuable arrive : l'entrée ne bouge plus.
        let mut second = draw(ts(2, 18), [1, 2, 3, 4, 5], None);
        second.id = 2;
        verify_pending(&log, &[first[0].clone(), second], ts(3, 6));
        assert_eq!(log.entries()[0].result.as_ref().unwrap(), &before);
    }

    #[test]
    fn test_machine_and_hybrid_results_need_full_machine_set() {
        let log = InMemoryPredictionLog::default();
        log.append(record(ts(1, 13))).unwrap();
        let no_machine = vec![draw(ts(2, 13), [7, 15, 30, 42, 80], None)];
        verify_pending(&log, &no_machine, ts(3, 0));
        let entry = &log.entries()[0];
        assert!(entry.result.is_some());
        assert!(entry.machine_result.is_none());
        assert!(entry.hybrid_result.is_none());

        let log = InMemoryPredictionLog::default();
        log.append(record(ts(1, 13))).unwrap();
        let with_machine = vec![draw(
            ts(2, 13),
            [7, 15, 30, 42, 80],
            Some([10, 21, 30, 41, 50]),
        )];
        verify_pending(&log, &with_machine, ts(3, 0));
        let entry = &log.entries()[0];
        let machine_result = entry.machine_result.as_ref().unwrap();
        assert_eq!(machine_result.matches, vec![10, 30, 50]);
        // 20 est à 1 de 21, 40 à 1 de 41.
        assert_eq!(machine_result.near_misses, vec![20, 40]);
        assert!(entry.hybrid_result.is_some());
    }

    #[test]
    fn test_day_before_prediction_window() {
        // Un tirage daté de la veille n'est jamais candidat (date < jour
        // de la prédiction), même s'il tombe dans les −24 h.
        let log = InMemoryPredictionLog::default();
        log.append(record(ts(2, 13))).unwrap();
        let draws = vec![draw(ts(1, 20), [7, 15, 30, 42, 80], None)];
        assert_eq!(verify_pending(&log, &draws, ts(3, 0)), 0);

        // Le même jour avant l'heure de prédiction reste attribuable.
        let log = InMemoryPredictionLog::default();
        log.append(record(ts(2, 13))).unwrap();
        let draws = vec![draw(ts(2, 10), [7, 15, 30, 42, 80], None)];
        assert_eq!(verify_pending(&log, &draws, ts(3, 0)), 1);
    }

    #[test]
    fn test_old_entries_ignored() {
        let log = InMemoryPredictionLog::default();
        log.append(record(ts(1, 13))).unwrap();
        // 10 jours plus tard : l'entrée est sortie de la fenêtre de 7 jours.
        let draws = vec![draw(ts(11, 13), [7, 15, 30, 42, 80], None)];
        assert_eq!(verify_pending(&log, &draws, ts(11, 14)), 0);
    }

    #[test]
    fn test_throttle_unless_forced() {
        let verifier = Verifier::new();
        let log = InMemoryPredictionLog::default();
        log.append(record(ts(1, 13))).unwrap();
        let draws = vec![draw(ts(2, 13), [7, 15, 30, 42, 80], None)];

        assert_eq!(verifier.run(&log, &draws, ts(3, 0), false), 1);
        // Deuxième passage immédiat : limité, sauf si forcé.
        let log2 = InMemoryPredictionLog::default();
        log2.append(record(ts(1, 13))).unwrap();
        assert_eq!(verifier.run(&log2, &draws, ts(3, 0), false), 0);
        assert_eq!(verifier.run(&log2, &draws, ts(3, 0), true), 1);
    }
}
