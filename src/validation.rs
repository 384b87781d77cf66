use crate::{
    bet::{
        Bet,
        BetDraft,
        BetResult,
        LedgerDate,
        UNSPECIFIED_SOURCE,
    },
    service::CoefficientRange,
};
use regex::Regex;
use std::{
    fmt,
    sync::LazyLock,
};

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2})\.(\d{2})\.(\d{4})$").expect("date pattern is valid")
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    InvalidDate,
    MissingResult,
    InvalidNumber(&'static str),
    IncompleteRange,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidDate => f.write_str("Enter the date as 17.07.2025"),
            ValidationError::MissingResult => f.write_str("Select the bet result"),
            ValidationError::InvalidNumber(field) => write!(f, "{field} must be a number"),
            ValidationError::IncompleteRange => {
                f.write_str("Enter both the lower and the upper coefficient")
            }
        }
    }
}

/// Users type commas on numeric keypads; the ledger format uses dots.
pub fn normalize_date_input(raw: &str) -> String {
    raw.trim().replace(',', ".")
}

/// Shallow `DD.MM.YYYY` check: month 1-12 and day 1-31, with no
/// days-per-month or leap-year rule.
pub fn validate_date(raw: &str) -> Result<LedgerDate, ValidationError> {
    let normalized = normalize_date_input(raw);
    let caps = DATE_PATTERN
        .captures(&normalized)
        .ok_or(ValidationError::InvalidDate)?;
    let field = |i: usize| caps[i].parse::<u16>().map_err(|_| ValidationError::InvalidDate);
    let (day, month, year) = (field(1)?, field(2)?, field(3)?);
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(ValidationError::InvalidDate);
    }
    Ok(LedgerDate {
        day: day as u8,
        month: month as u8,
        year,
    })
}

fn parse_number(raw: &str, field: &'static str) -> Result<f64, ValidationError> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(ValidationError::InvalidNumber(field))
}

/// Current values of the bet form, read at submit time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormFields {
    pub date: String,
    pub event: String,
    pub coefficient: String,
    pub stake: String,
    pub result: Option<BetResult>,
    pub source: String,
}

impl FormFields {
    pub fn blank(date: LedgerDate) -> Self {
        Self {
            date: date.to_string(),
            ..Self::default()
        }
    }

    pub fn from_bet(bet: &Bet) -> Self {
        Self {
            date: LedgerDate::from_naive(bet.date).to_string(),
            event: bet.event.clone(),
            coefficient: bet.coefficient.to_string(),
            stake: bet.stake.to_string(),
            result: Some(bet.result),
            source: if bet.has_source() {
                bet.source.clone()
            } else {
                String::new()
            },
        }
    }

    /// Empties the form after a successful submit. The date is kept so that
    /// several bets from the same day can be entered in a row.
    pub fn cleared(&self) -> Self {
        Self {
            date: self.date.clone(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<BetDraft, ValidationError> {
        let date = validate_date(&self.date)?;
        let result = self.result.ok_or(ValidationError::MissingResult)?;
        let coefficient = parse_number(&self.coefficient, "Coefficient")?;
        let stake = parse_number(&self.stake, "Stake")?;
        let source = match self.source.trim() {
            "" => UNSPECIFIED_SOURCE.to_string(),
            other => other.to_string(),
        };
        Ok(BetDraft {
            date,
            event: self.event.trim().to_string(),
            coefficient,
            stake,
            result,
            source,
        })
    }
}

/// Coefficient bounds as typed into the filter panel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoefficientInput {
    pub min: String,
    pub max: String,
}

impl CoefficientInput {
    /// Both bounds or neither. Ordering of the bounds is left to the service.
    pub fn parse(&self) -> Result<Option<CoefficientRange>, ValidationError> {
        match (self.min.trim().is_empty(), self.max.trim().is_empty()) {
            (true, true) => Ok(None),
            (false, false) => Ok(Some(CoefficientRange {
                min: parse_number(&self.min, "Lower coefficient")?,
                max: parse_number(&self.max, "Upper coefficient")?,
            })),
            _ => Err(ValidationError::IncompleteRange),
        }
    }

    pub fn from_range(range: Option<CoefficientRange>) -> Self {
        match range {
            Some(r) => Self {
                min: r.min.to_string(),
                max: r.max.to_string(),
            },
            None => Self::default(),
        }
    }
}
