use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use std::path::Path;

use loto90_db::db::{get_or_create_draw_type, insert_draw};
use loto90_db::models::validate_numbers;
use loto90_db::rusqlite::Connection;

/// Format attendu : `date;g1;g2;g3;g4;g5[;m1;m2;m3;m4;m5]`, date en
/// JJ/MM/AAAA. Les colonnes machine sont optionnelles en bloc.
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

fn parse_date(raw: &str) -> Result<NaiveDateTime> {
    let parts: Vec<&str> = raw.trim().split('/').collect();
    if parts.len() != 3 {
        bail!("Format de date invalide : '{}'", raw);
    }
    let date = chrono::NaiveDate::from_ymd_opt(
        parts[2].parse().with_context(|| format!("année : '{}'", parts[2]))?,
        parts[1].parse().with_context(|| format!("mois : '{}'", parts[1]))?,
        parts[0].parse().with_context(|| format!("jour : '{}'", parts[0]))?,
    )
    .with_context(|| format!("Date invalide : '{}'", raw))?;
    Ok(date.and_hms_opt(0, 0, 0).unwrap())
}

fn parse_record(record: &csv::StringRecord) -> Result<(NaiveDateTime, [u8; 5], Option<[u8; 5]>)> {
    let get = |idx: usize| -> Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };
    let get_u8 = |idx: usize| -> Result<u8> {
        let s = get(idx)?;
        s.parse::<u8>()
            .with_context(|| format!("Impossible de parser '{}' (index {})", s, idx))
    };

    let date = parse_date(&get(0)?)?;
    let winning: [u8; 5] = [get_u8(1)?, get_u8(2)?, get_u8(3)?, get_u8(4)?, get_u8(5)?];
    validate_numbers(&winning)?;

    // Le groupe machine n'est retenu que si les cinq colonnes sont là.
    let machine_cols: Vec<u8> = (6..11).filter_map(|i| get_u8(i).ok()).collect();
    let machine = if machine_cols.len() == 5 {
        let m: [u8; 5] = [
            machine_cols[0],
            machine_cols[1],
            machine_cols[2],
            machine_cols[3],
            machine_cols[4],
        ];
        validate_numbers(&m)?;
        Some(m)
    } else {
        None
    };

    Ok((date, winning, machine))
}

pub fn import_csv(
    conn: &Connection,
    path: &Path,
    type_name: &str,
    category: &str,
) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let draw_type_id = get_or_create_draw_type(conn, type_name, category)?;

    let tx = conn
        .unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult {
        total_records: 0,
        inserted: 0,
        skipped: 0,
        errors: 0,
    };

    for record_result in reader.records() {
        result.total_records += 1;
        match record_result {
            Ok(record) => match parse_record(&record) {
                Ok((date, winning, machine)) => {
                    match insert_draw(&tx, draw_type_id, date, &winning, machine.as_ref()) {
                        Ok(true) => result.inserted += 1,
                        Ok(false) => result.skipped += 1,
                        Err(e) => {
                            eprintln!("Erreur insertion tirage {}: {}", result.total_records, e);
                            result.errors += 1;
                        }
                    }
                }
                Err(e) => {
                    eprintln!("Erreur parsing ligne {}: {}", result.total_records, e);
                    result.errors += 1;
                }
            },
            Err(e) => {
                eprintln!("Erreur lecture ligne {}: {}", result.total_records, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loto90_db::db::{count_draws, migrate};

    #[test]
    fn test_parse_date() {
        let d = parse_date("17/02/2026").unwrap();
        assert_eq!(d.to_string(), "2026-02-17 00:00:00");
        assert!(parse_date("2026-02-17").is_err());
    }

    #[test]
    fn test_parse_record_with_and_without_machine() {
        let full = csv::StringRecord::from(vec![
            "01/03/2024", "7", "15", "23", "42", "71", "10", "20", "30", "40", "50",
        ]);
        let (_, winning, machine) = parse_record(&full).unwrap();
        assert_eq!(winning, [7, 15, 23, 42, 71]);
        assert_eq!(machine, Some([10, 20, 30, 40, 50]));

        let short = csv::StringRecord::from(vec!["01/03/2024", "7", "15", "23", "42", "71"]);
        let (_, _, machine) = parse_record(&short).unwrap();
        assert_eq!(machine, None);
    }

    #[test]
    fn test_parse_record_rejects_invalid_numbers() {
        let bad = csv::StringRecord::from(vec!["01/03/2024", "0", "15", "23", "42", "71"]);
        assert!(parse_record(&bad).is_err());
        let dup = csv::StringRecord::from(vec!["01/03/2024", "7", "7", "23", "42", "71"]);
        assert!(parse_record(&dup).is_err());
    }

    #[test]
    fn test_import_csv_counts() {
        let dir = std::env::temp_dir().join("loto90-test-import");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("tirages.csv");
        std::fs::write(
            &file,
            "01/03/2024;7;15;23;42;71;10;20;30;40;50\n\
             02/03/2024;1;2;3;4;5\n\
             02/03/2024;1;2;3;4;5\n\
             pas-une-date;1;2;3;4;5\n",
        )
        .unwrap();

        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let result = import_csv(&conn, &file, "Fortune", "midi").unwrap();
        assert_eq!(result.total_records, 4);
        assert_eq!(result.inserted, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors, 1);
        assert_eq!(count_draws(&conn).unwrap(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
