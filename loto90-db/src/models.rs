use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Pool : numéros de 1 à 90, 5 numéros tirés par volet.
pub const POOL_SIZE: usize = 90;
pub const PICK_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Draw {
    pub id: i64,
    pub draw_type_id: i64,
    pub date: NaiveDateTime,
    /// 0 = dimanche .. 6 = samedi
    pub day_of_week: u8,
    pub winning: [u8; 5],
    /// Numéros machine : présents seulement si les cinq sont renseignés.
    pub machine: Option<[u8; 5]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawType {
    pub id: i64,
    pub name: String,
    pub category: String,
}

/// Les deux volets prédits indépendamment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Winning,
    Machine,
}

impl Stream {
    pub fn key(&self) -> &'static str {
        match self {
            Stream::Winning => "winning",
            Stream::Machine => "machine",
        }
    }

    /// Numéros du volet pour un tirage. None si le tirage n'a pas de
    /// numéros machine.
    pub fn numbers_from<'a>(&self, draw: &'a Draw) -> Option<&'a [u8; 5]> {
        match self {
            Stream::Winning => Some(&draw.winning),
            Stream::Machine => draw.machine.as_ref(),
        }
    }
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

pub fn validate_numbers(numbers: &[u8; 5]) -> Result<()> {
    for &n in numbers {
        if n < 1 || n > 90 {
            bail!("Numéro {} hors limites (1-90)", n);
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("Numéro en double : {}", numbers[i]);
            }
        }
    }
    Ok(())
}
