use crate::bet::{
    Bet,
    BetDraft,
    BetId,
    Month,
    UNSPECIFIED_SOURCE,
};
use color_eyre::eyre::Result;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::BTreeSet,
    fmt,
};

/// Aggregate metrics computed by the service for the current query.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub total_profit: f64,
    pub pass_rate: f64,
    pub won_bets: u32,
    pub returned_bets: u32,
    pub total_bets: u32,
    pub max_drawdown: f64,
    pub roi: f64,
    pub avg_coefficient: f64,
    pub win_streak: u32,
    pub loss_streak: u32,
}

/// Everything one listing query returns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overview {
    pub stats: Stats,
    /// Encoded chart image, absent when there is nothing to plot.
    pub chart: Option<Vec<u8>>,
    pub bets: Vec<Bet>,
    pub sources: BTreeSet<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MonthFilter {
    #[default]
    All,
    Month(Month),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SourceFilter {
    #[default]
    All,
    Unspecified,
    Named(String),
}

impl SourceFilter {
    /// Value sent to the service; `None` means no source restriction.
    pub fn as_query(&self) -> Option<&str> {
        match self {
            SourceFilter::All => None,
            SourceFilter::Unspecified => Some(UNSPECIFIED_SOURCE),
            SourceFilter::Named(name) => Some(name),
        }
    }
}

impl fmt::Display for SourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFilter::All => f.write_str("All sources"),
            SourceFilter::Unspecified => f.write_str("Unspecified"),
            SourceFilter::Named(name) => f.write_str(name),
        }
    }
}

/// Inclusive coefficient bounds. The service decides whether `min > max` is valid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoefficientRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filters {
    pub month: MonthFilter,
    pub source: SourceFilter,
    pub coefficient: Option<CoefficientRange>,
}

impl Filters {
    pub fn is_unfiltered(&self) -> bool {
        *self == Filters::default()
    }
}

/// A business failure reported by the service, shown to the user verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection(pub String);

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type Reply<T> = std::result::Result<T, Rejection>;

/// Acknowledgement of a mutating call, optionally carrying a message.
pub type Ack = Reply<Option<String>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// The external collaborator that owns persistence, statistics, charts and
/// the spreadsheet codec.
///
/// `Err` from any call is a transport failure; business failures arrive as
/// `Ok(Err(Rejection))`.
pub trait DataService: Send + Sync + 'static {
    fn query(&self, filters: &Filters) -> impl Future<Output = Result<Overview>> + Send;

    fn get_bet(&self, id: BetId) -> impl Future<Output = Result<Reply<Bet>>> + Send;

    fn create_bet(&self, draft: &BetDraft) -> impl Future<Output = Result<Ack>> + Send;

    fn update_bet(
        &self,
        id: BetId,
        draft: &BetDraft,
    ) -> impl Future<Output = Result<Ack>> + Send;

    fn delete_bet(&self, id: BetId) -> impl Future<Output = Result<Ack>> + Send;

    fn export(&self) -> impl Future<Output = Result<Reply<ExportFile>>> + Send;

    /// Replaces all stored bets with the contents of the given spreadsheet.
    fn import(&self, file: &[u8]) -> impl Future<Output = Result<Ack>> + Send;

    fn shutdown(&self) -> impl Future<Output = Result<()>> + Send;
}
