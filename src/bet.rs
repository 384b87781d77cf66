use chrono::{
    Datelike,
    NaiveDate,
};
use serde::{
    Deserialize,
    Serialize,
    Serializer,
};
use std::fmt;

/// Source label the service assigns to bets recorded without one.
pub const UNSPECIFIED_SOURCE: &str = "unspecified";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BetId(pub i64);

impl fmt::Display for BetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetResult {
    Win,
    Loss,
    Return,
    Pending,
}

impl BetResult {
    pub const ALL: [BetResult; 4] = [
        BetResult::Win,
        BetResult::Loss,
        BetResult::Return,
        BetResult::Pending,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BetResult::Win => "WIN",
            BetResult::Loss => "LOSS",
            BetResult::Return => "RETURN",
            BetResult::Pending => "PENDING",
        }
    }
}

impl fmt::Display for BetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub date: NaiveDate,
    pub event: String,
    pub coefficient: f64,
    pub stake: f64,
    pub result: BetResult,
    #[serde(default = "unspecified_source")]
    pub source: String,
}

fn unspecified_source() -> String {
    UNSPECIFIED_SOURCE.to_string()
}

impl Bet {
    /// Profit contributed by this bet: returns and pending bets count as zero.
    pub fn profit(&self) -> f64 {
        match self.result {
            BetResult::Win => self.stake * (self.coefficient - 1.0),
            BetResult::Loss => -self.stake,
            BetResult::Return | BetResult::Pending => 0.0,
        }
    }

    pub fn month(&self) -> Month {
        Month(self.date.month() as u8)
    }

    pub fn has_source(&self) -> bool {
        !self.source.is_empty() && self.source != UNSPECIFIED_SOURCE
    }
}

/// Calendar month code, rendered as two digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month(pub u8);

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// A `DD.MM.YYYY` date as typed into the form.
///
/// Only the ranges of day and month are checked, so values such as
/// `31.02.2025` are representable and are passed on to the service as typed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerDate {
    pub day: u8,
    pub month: u8,
    pub year: u16,
}

impl LedgerDate {
    pub fn from_naive(date: NaiveDate) -> Self {
        Self {
            day: date.day() as u8,
            month: date.month() as u8,
            year: date.year().clamp(0, 9999) as u16,
        }
    }
}

impl fmt::Display for LedgerDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}.{:02}.{:04}", self.day, self.month, self.year)
    }
}

impl Serialize for LedgerDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Fields sent to the service when creating or updating a bet.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BetDraft {
    pub date: LedgerDate,
    pub event: String,
    pub coefficient: f64,
    pub stake: f64,
    pub result: BetResult,
    pub source: String,
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    fn bet(result: BetResult, stake: f64, coefficient: f64) -> Bet {
        Bet {
            id: BetId(1),
            date: NaiveDate::from_ymd_opt(2025, 7, 17).unwrap(),
            event: "Home - Away".to_string(),
            coefficient,
            stake,
            result,
            source: UNSPECIFIED_SOURCE.to_string(),
        }
    }

    #[test]
    fn profit__win_pays_stake_times_coefficient_minus_one() {
        assert_eq!(bet(BetResult::Win, 100.0, 2.5).profit(), 150.0);
    }

    #[test]
    fn profit__loss_costs_the_stake() {
        assert_eq!(bet(BetResult::Loss, 100.0, 2.5).profit(), -100.0);
    }

    #[test]
    fn profit__return_and_pending_are_zero() {
        assert_eq!(bet(BetResult::Return, 100.0, 2.5).profit(), 0.0);
        assert_eq!(bet(BetResult::Pending, 100.0, 2.5).profit(), 0.0);
    }

    #[test]
    fn ledger_date__serializes_as_dotted_string() {
        // given
        let date = LedgerDate {
            day: 31,
            month: 2,
            year: 2025,
        };

        // when
        let json = serde_json::to_string(&date).unwrap();

        // then
        assert_eq!(json, "\"31.02.2025\"");
    }

    #[test]
    fn bet__missing_source_defaults_to_unspecified() {
        // given
        let json = r#"{"id":7,"date":"2025-03-04","event":"A - B","coefficient":1.9,"stake":50.0,"result":"return"}"#;

        // when
        let bet: Bet = serde_json::from_str(json).unwrap();

        // then
        assert_eq!(bet.source, UNSPECIFIED_SOURCE);
        assert_eq!(bet.month(), Month(3));
        assert!(!bet.has_source());
    }
}
