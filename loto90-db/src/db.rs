use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::models::{Draw, DrawType};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draw_types (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL UNIQUE,
    category      TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS draws (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    draw_type_id      INTEGER NOT NULL REFERENCES draw_types(id),
    draw_date         TEXT NOT NULL,
    day_of_week       INTEGER NOT NULL,
    week_of_year      INTEGER NOT NULL,
    month_year        TEXT NOT NULL,
    winning_number_1  INTEGER NOT NULL,
    winning_number_2  INTEGER NOT NULL,
    winning_number_3  INTEGER NOT NULL,
    winning_number_4  INTEGER NOT NULL,
    winning_number_5  INTEGER NOT NULL,
    machine_number_1  INTEGER,
    machine_number_2  INTEGER,
    machine_number_3  INTEGER,
    machine_number_4  INTEGER,
    machine_number_5  INTEGER,
    raw_winning       TEXT NOT NULL,
    raw_machine       TEXT,
    UNIQUE (draw_type_id, draw_date, raw_winning)
);

CREATE TABLE IF NOT EXISTS number_frequency (
    draw_type_id      INTEGER NOT NULL,
    number            INTEGER NOT NULL,
    total_count       INTEGER NOT NULL DEFAULT 0,
    position_1_count  INTEGER NOT NULL DEFAULT 0,
    position_2_count  INTEGER NOT NULL DEFAULT 0,
    position_3_count  INTEGER NOT NULL DEFAULT 0,
    position_4_count  INTEGER NOT NULL DEFAULT 0,
    position_5_count  INTEGER NOT NULL DEFAULT 0,
    last_seen         TEXT,
    UNIQUE (draw_type_id, number)
);

CREATE TABLE IF NOT EXISTS ai_memory (
    id            TEXT PRIMARY KEY,
    data          TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS patterns (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    draw_type_id  INTEGER NOT NULL DEFAULT 0,
    kind          TEXT NOT NULL,
    payload       TEXT NOT NULL,
    strength      REAL NOT NULL,
    updated_at    TEXT NOT NULL,
    UNIQUE (draw_type_id, kind)
);

CREATE TABLE IF NOT EXISTS predictions (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at    TEXT NOT NULL,
    draw_type_id  INTEGER,
    payload       TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS trg_draws_frequency AFTER INSERT ON draws
BEGIN
    INSERT INTO number_frequency (draw_type_id, number, total_count, position_1_count, last_seen)
    VALUES (NEW.draw_type_id, NEW.winning_number_1, 1, 1, NEW.draw_date)
    ON CONFLICT (draw_type_id, number) DO UPDATE SET
        total_count = total_count + 1,
        position_1_count = position_1_count + 1,
        last_seen = NEW.draw_date;
    INSERT INTO number_frequency (draw_type_id, number, total_count, position_2_count, last_seen)
    VALUES (NEW.draw_type_id, NEW.winning_number_2, 1, 1, NEW.draw_date)
    ON CONFLICT (draw_type_id, number) DO UPDATE SET
        total_count = total_count + 1,
        position_2_count = position_2_count + 1,
        last_seen = NEW.draw_date;
    INSERT INTO number_frequency (draw_type_id, number, total_count, position_3_count, last_seen)
    VALUES (NEW.draw_type_id, NEW.winning_number_3, 1, 1, NEW.draw_date)
    ON CONFLICT (draw_type_id, number) DO UPDATE SET
        total_count = total_count + 1,
        position_3_count = position_3_count + 1,
        last_seen = NEW.draw_date;
    INSERT INTO number_frequency (draw_type_id, number, total_count, position_4_count, last_seen)
    VALUES (NEW.draw_type_id, NEW.winning_number_4, 1, 1, NEW.draw_date)
    ON CONFLICT (draw_type_id, number) DO UPDATE SET
        total_count = total_count + 1,
        position_4_count = position_4_count + 1,
        last_seen = NEW.draw_date;
    INSERT INTO number_frequency (draw_type_id, number, total_count, position_5_count, last_seen)
    VALUES (NEW.draw_type_id, NEW.winning_number_5, 1, 1, NEW.draw_date)
    ON CONFLICT (draw_type_id, number) DO UPDATE SET
        total_count = total_count + 1,
        position_5_count = position_5_count + 1,
        last_seen = NEW.draw_date;
END;
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("loto90.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA).context("Échec de la migration")?;
    Ok(())
}

/// Recherche insensible à la casse ; crée le type s'il n'existe pas.
pub fn get_or_create_draw_type(conn: &Connection, name: &str, category: &str) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM draw_types WHERE name = ?1 COLLATE NOCASE",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO draw_types (name, category) VALUES (?1, ?2)",
        rusqlite::params![name, category],
    )
    .context("Échec de l'insertion du type de tirage")?;
    Ok(conn.last_insert_rowid())
}

pub fn find_draw_type(conn: &Connection, name: &str) -> Result<Option<DrawType>> {
    let found = conn
        .query_row(
            "SELECT id, name, category FROM draw_types WHERE name = ?1 COLLATE NOCASE",
            [name],
            |row| {
                Ok(DrawType {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    category: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(found)
}

pub fn list_draw_types(conn: &Connection) -> Result<Vec<DrawType>> {
    let mut stmt = conn.prepare("SELECT id, name, category FROM draw_types ORDER BY id")?;
    let types = stmt
        .query_map([], |row| {
            Ok(DrawType {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(types)
}

fn raw_numbers(numbers: &[u8; 5]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join("-")
}

/// Insère un tirage. Retourne false si la contrainte d'unicité
/// (type, date, numéros gagnants) l'a fait ignorer.
pub fn insert_draw(
    conn: &Connection,
    draw_type_id: i64,
    date: NaiveDateTime,
    winning: &[u8; 5],
    machine: Option<&[u8; 5]>,
) -> Result<bool> {
    let day_of_week = date.weekday().num_days_from_sunday();
    let week_of_year = date.iso_week().week();
    let month_year = format!("{:02}-{}", date.month(), date.year());
    let raw_winning = raw_numbers(winning);
    let raw_machine = machine.map(raw_numbers);

    let changed = conn
        .execute(
            "INSERT OR IGNORE INTO draws (draw_type_id, draw_date, day_of_week, week_of_year, month_year,
                winning_number_1, winning_number_2, winning_number_3, winning_number_4, winning_number_5,
                machine_number_1, machine_number_2, machine_number_3, machine_number_4, machine_number_5,
                raw_winning, raw_machine)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            rusqlite::params![
                draw_type_id,
                date,
                day_of_week,
                week_of_year,
                month_year,
                winning[0],
                winning[1],
                winning[2],
                winning[3],
                winning[4],
                machine.map(|m| m[0]),
                machine.map(|m| m[1]),
                machine.map(|m| m[2]),
                machine.map(|m| m[3]),
                machine.map(|m| m[4]),
                raw_winning,
                raw_machine,
            ],
        )
        .context("Échec de l'insertion du tirage")?;
    Ok(changed > 0)
}

fn draw_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Draw> {
    let machine_cols: [Option<u8>; 5] = [
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
        row.get(13)?,
    ];
    // Le groupe machine n'existe que si les cinq colonnes sont renseignées.
    let machine = if machine_cols.iter().all(|c| c.is_some()) {
        Some([
            machine_cols[0].unwrap(),
            machine_cols[1].unwrap(),
            machine_cols[2].unwrap(),
            machine_cols[3].unwrap(),
            machine_cols[4].unwrap(),
        ])
    } else {
        None
    };
    Ok(Draw {
        id: row.get(0)?,
        draw_type_id: row.get(1)?,
        date: row.get(2)?,
        day_of_week: row.get::<_, u32>(3)? as u8,
        winning: [
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
        ],
        machine,
    })
}

fn select_draws(
    conn: &Connection,
    where_clause: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Draw>> {
    let sql = format!(
        "SELECT id, draw_type_id, draw_date, day_of_week,
            winning_number_1, winning_number_2, winning_number_3, winning_number_4, winning_number_5,
            machine_number_1, machine_number_2, machine_number_3, machine_number_4, machine_number_5
         FROM draws {where_clause}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let draws = stmt
        .query_map(params, draw_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

/// Historique complet d'un type, en ordre chronologique (plus ancien d'abord).
pub fn fetch_draws_for_type(conn: &Connection, draw_type_id: i64) -> Result<Vec<Draw>> {
    select_draws(
        conn,
        "WHERE draw_type_id = ?1 ORDER BY draw_date ASC, id ASC",
        &[&draw_type_id],
    )
}

/// Les `limit` tirages les plus récents tous types confondus, du plus
/// récent au plus ancien. L'adaptateur les renverse côté cache.
pub fn fetch_recent_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    select_draws(
        conn,
        "ORDER BY draw_date DESC, id DESC LIMIT ?1",
        &[&limit],
    )
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

pub fn ai_memory_get(conn: &Connection, id: &str) -> Result<Option<String>> {
    let data = conn
        .query_row("SELECT data FROM ai_memory WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(data)
}

pub fn ai_memory_put(conn: &Connection, id: &str, data: &str, now: NaiveDateTime) -> Result<()> {
    conn.execute(
        "INSERT INTO ai_memory (id, data, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT (id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        rusqlite::params![id, data, now],
    )
    .context("Échec de l'écriture de la mémoire")?;
    Ok(())
}

/// Persiste un motif d'analyse. La force est bornée à [0, 99.99] ;
/// une valeur non finie est remplacée par 50.
pub fn save_pattern(
    conn: &Connection,
    draw_type_id: i64,
    kind: &str,
    payload: &str,
    strength: f64,
    now: NaiveDateTime,
) -> Result<()> {
    let strength = if strength.is_finite() {
        strength.clamp(0.0, 99.99)
    } else {
        50.0
    };
    conn.execute(
        "INSERT INTO patterns (draw_type_id, kind, payload, strength, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (draw_type_id, kind) DO UPDATE SET
            payload = excluded.payload,
            strength = excluded.strength,
            updated_at = excluded.updated_at",
        rusqlite::params![draw_type_id, kind, payload, strength, now],
    )
    .context("Échec de l'écriture du motif")?;
    Ok(())
}

pub fn number_frequencies(conn: &Connection, draw_type_id: i64) -> Result<Vec<(u8, u32)>> {
    let mut stmt = conn.prepare(
        "SELECT number, total_count FROM number_frequency
         WHERE draw_type_id = ?1 ORDER BY total_count DESC, number ASC",
    )?;
    let rows = stmt
        .query_map([draw_type_id], |row| {
            Ok((row.get::<_, u8>(0)?, row.get::<_, u32>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn setup() -> (Connection, i64) {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let type_id = get_or_create_draw_type(&conn, "Fortune", "midi").unwrap();
        (conn, type_id)
    }

    #[test]
    fn test_insert_and_count() {
        let (conn, type_id) = setup();
        assert_eq!(count_draws(&conn).unwrap(), 0);
        insert_draw(&conn, type_id, date(2024, 1, 1), &[1, 2, 3, 4, 5], None).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_ignored() {
        let (conn, type_id) = setup();
        let inserted =
            insert_draw(&conn, type_id, date(2024, 1, 1), &[1, 2, 3, 4, 5], None).unwrap();
        assert!(inserted);
        let inserted =
            insert_draw(&conn, type_id, date(2024, 1, 1), &[1, 2, 3, 4, 5], None).unwrap();
        assert!(!inserted);
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_fetch_chronological() {
        let (conn, type_id) = setup();
        insert_draw(&conn, type_id, date(2024, 1, 5), &[1, 2, 3, 4, 5], None).unwrap();
        insert_draw(&conn, type_id, date(2024, 1, 1), &[6, 7, 8, 9, 10], None).unwrap();
        insert_draw(&conn, type_id, date(2024, 1, 3), &[11, 12, 13, 14, 15], None).unwrap();

        let draws = fetch_draws_for_type(&conn, type_id).unwrap();
        assert_eq!(draws.len(), 3);
        assert_eq!(draws[0].winning, [6, 7, 8, 9, 10]);
        assert_eq!(draws[2].winning, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_machine_group_all_or_nothing() {
        let (conn, type_id) = setup();
        insert_draw(
            &conn,
            type_id,
            date(2024, 1, 1),
            &[1, 2, 3, 4, 5],
            Some(&[10, 20, 30, 40, 50]),
        )
        .unwrap();
        insert_draw(&conn, type_id, date(2024, 1, 2), &[6, 7, 8, 9, 10], None).unwrap();

        let draws = fetch_draws_for_type(&conn, type_id).unwrap();
        assert_eq!(draws[0].machine, Some([10, 20, 30, 40, 50]));
        assert_eq!(draws[1].machine, None);
    }

    #[test]
    fn test_draw_type_case_insensitive() {
        let (conn, type_id) = setup();
        let again = get_or_create_draw_type(&conn, "FORTUNE", "midi").unwrap();
        assert_eq!(type_id, again);
        let found = find_draw_type(&conn, "fortune").unwrap().unwrap();
        assert_eq!(found.id, type_id);
    }

    #[test]
    fn test_frequency_trigger() {
        let (conn, type_id) = setup();
        insert_draw(&conn, type_id, date(2024, 1, 1), &[7, 2, 3, 4, 5], None).unwrap();
        insert_draw(&conn, type_id, date(2024, 1, 2), &[7, 8, 9, 10, 11], None).unwrap();

        let freqs = number_frequencies(&conn, type_id).unwrap();
        assert_eq!(freqs[0], (7, 2));
    }

    #[test]
    fn test_ai_memory_roundtrip() {
        let (conn, _) = setup();
        assert!(ai_memory_get(&conn, "winning").unwrap().is_none());
        ai_memory_put(&conn, "winning", "{\"version\":1}", date(2024, 1, 1)).unwrap();
        assert_eq!(
            ai_memory_get(&conn, "winning").unwrap().as_deref(),
            Some("{\"version\":1}")
        );
        ai_memory_put(&conn, "winning", "{\"version\":2}", date(2024, 1, 2)).unwrap();
        assert_eq!(
            ai_memory_get(&conn, "winning").unwrap().as_deref(),
            Some("{\"version\":2}")
        );
    }

    #[test]
    fn test_pattern_strength_clamped() {
        let (conn, type_id) = setup();
        save_pattern(&conn, type_id, "pairs", "{}", 150.0, date(2024, 1, 1)).unwrap();
        let s: f64 = conn
            .query_row("SELECT strength FROM patterns WHERE kind = 'pairs'", [], |r| r.get(0))
            .unwrap();
        assert!((s - 99.99).abs() < 1e-9);

        save_pattern(&conn, type_id, "pairs", "{}", f64::NAN, date(2024, 1, 2)).unwrap();
        let s: f64 = conn
            .query_row("SELECT strength FROM patterns WHERE kind = 'pairs'", [], |r| r.get(0))
            .unwrap();
        assert!((s - 50.0).abs() < 1e-9);
    }
}
