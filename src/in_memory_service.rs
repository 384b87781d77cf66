use crate::{
    bet::{
        Bet,
        BetDraft,
        BetId,
        BetResult,
        LedgerDate,
        UNSPECIFIED_SOURCE,
    },
    service::{
        Ack,
        DataService,
        ExportFile,
        Filters,
        MonthFilter,
        Overview,
        Rejection,
        Reply,
        Stats,
    },
};
use chrono::{
    Days,
    NaiveDate,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use rand::Rng;
use std::{
    collections::BTreeSet,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
    },
};
use tracing::debug;

pub const EXPORT_FILENAME: &str = "bet_history.json";

const DEMO_SOURCES: [&str; 4] = ["Telegram", "Forum", "Friend", UNSPECIFIED_SOURCE];

/// Call received by [`InMemoryDataService`], in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedCall {
    Query(Filters),
    GetBet(BetId),
    Create(BetDraft),
    Update(BetId, BetDraft),
    Delete(BetId),
    Export,
    Import(usize),
    Shutdown,
}

#[derive(Default)]
struct Ledger {
    bets: Vec<Bet>,
    calls: Vec<RecordedCall>,
    fail_transport: bool,
    reject_next: Option<String>,
    shut_down: bool,
}

/// Process-local data service. Exports and imports use a JSON list of bets
/// in place of a spreadsheet.
#[derive(Clone, Default)]
pub struct InMemoryDataService {
    ledger: Arc<Mutex<Ledger>>,
}

impl InMemoryDataService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_bets(bets: Vec<Bet>) -> Self {
        let service = Self::default();
        service
            .ledger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .bets = bets;
        service
    }

    /// A few months of made-up history ending today.
    pub fn seeded(count: usize) -> Self {
        let mut rng = rand::rng();
        let today = chrono::Local::now().date_naive();
        let bets = (1..=count)
            .map(|i| {
                let days_back = rng.random_range(0..150u64);
                let result = match rng.random_range(0..10) {
                    0..=4 => BetResult::Win,
                    5..=7 => BetResult::Loss,
                    8 => BetResult::Return,
                    _ => BetResult::Pending,
                };
                let coefficient: f64 = rng.random_range(1.3..3.2);
                Bet {
                    id: BetId(i as i64),
                    date: today - Days::new(days_back),
                    event: format!(
                        "{} - {}",
                        fakeit::address::city(),
                        fakeit::address::city()
                    ),
                    coefficient: (coefficient * 100.0).round() / 100.0,
                    stake: rng.random_range(1..=20u32) as f64 * 50.0,
                    result,
                    source: DEMO_SOURCES[rng.random_range(0..DEMO_SOURCES.len())]
                        .to_string(),
                }
            })
            .collect();
        Self::new_with_bets(bets)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().map(|l| l.calls.clone()).unwrap_or_default()
    }

    pub fn bets(&self) -> Vec<Bet> {
        self.lock().map(|l| l.bets.clone()).unwrap_or_default()
    }

    /// Every following call fails as if the service were unreachable.
    pub fn set_unreachable(&self, unreachable: bool) {
        if let Ok(mut ledger) = self.lock() {
            ledger.fail_transport = unreachable;
        }
    }

    /// The next call that can be rejected is rejected with `message`.
    pub fn reject_next(&self, message: impl Into<String>) {
        if let Ok(mut ledger) = self.lock() {
            ledger.reject_next = Some(message.into());
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.lock().map(|l| l.shut_down).unwrap_or(false)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>> {
        self.ledger
            .lock()
            .map_err(|_| eyre!("in-memory ledger lock poisoned"))
    }

    fn begin(&self, call: RecordedCall) -> Result<MutexGuard<'_, Ledger>> {
        let mut ledger = self.lock()?;
        debug!(?call, "in-memory data service call");
        ledger.calls.push(call);
        if ledger.fail_transport {
            return Err(eyre!("data service unreachable"));
        }
        Ok(ledger)
    }
}

impl Ledger {
    fn take_rejection(&mut self) -> Option<Rejection> {
        self.reject_next.take().map(Rejection)
    }

    fn next_id(&self) -> BetId {
        BetId(self.bets.iter().map(|b| b.id.0).max().unwrap_or(0) + 1)
    }
}

fn to_naive(date: LedgerDate) -> Reply<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year as i32, date.month as u32, date.day as u32)
        .ok_or_else(|| Rejection(format!("Invalid date {date}")))
}

fn store(id: BetId, draft: &BetDraft) -> Reply<Bet> {
    Ok(Bet {
        id,
        date: to_naive(draft.date)?,
        event: draft.event.clone(),
        coefficient: draft.coefficient,
        stake: draft.stake,
        result: draft.result,
        source: draft.source.clone(),
    })
}

fn matches(bet: &Bet, filters: &Filters) -> bool {
    let month = match filters.month {
        MonthFilter::All => true,
        MonthFilter::Month(m) => bet.month() == m,
    };
    let source = filters
        .source
        .as_query()
        .is_none_or(|s| bet.source == s);
    let coefficient = filters
        .coefficient
        .is_none_or(|r| r.min <= bet.coefficient && bet.coefficient <= r.max);
    month && source && coefficient
}

/// Aggregates over `bets` in chronological order.
pub fn compute_stats(bets: &[Bet]) -> Stats {
    let mut ordered: Vec<&Bet> = bets.iter().collect();
    ordered.sort_by_key(|b| (b.date, b.id));

    let total_bets = ordered.len() as u32;
    let won_bets = count(&ordered, BetResult::Win);
    let returned_bets = count(&ordered, BetResult::Return);
    let total_profit: f64 = ordered.iter().map(|b| b.profit()).sum();
    let decided = total_bets - returned_bets;
    let pass_rate = if decided > 0 {
        won_bets as f64 / decided as f64 * 100.0
    } else {
        0.0
    };
    let invested: f64 = ordered
        .iter()
        .filter(|b| b.result != BetResult::Return)
        .map(|b| b.stake)
        .sum();
    let roi = if invested > 0.0 {
        total_profit / invested * 100.0
    } else {
        0.0
    };
    let avg_coefficient = if total_bets > 0 {
        ordered.iter().map(|b| b.coefficient).sum::<f64>() / total_bets as f64
    } else {
        0.0
    };

    let (mut balance, mut peak, mut max_drawdown) = (0.0f64, 0.0f64, 0.0f64);
    for bet in &ordered {
        balance += bet.profit();
        peak = peak.max(balance);
        max_drawdown = max_drawdown.max(peak - balance);
    }

    let (mut win_streak, mut loss_streak, mut current) = (0, 0, 0);
    let mut last = None;
    for bet in &ordered {
        match bet.result {
            BetResult::Win | BetResult::Loss => {
                current = if last == Some(bet.result) { current + 1 } else { 1 };
                if bet.result == BetResult::Win {
                    win_streak = win_streak.max(current);
                } else {
                    loss_streak = loss_streak.max(current);
                }
            }
            BetResult::Return | BetResult::Pending => {}
        }
        last = Some(bet.result);
    }

    Stats {
        total_profit,
        pass_rate,
        won_bets,
        returned_bets,
        total_bets,
        max_drawdown,
        roi,
        avg_coefficient,
        win_streak,
        loss_streak,
    }
}

fn count(bets: &[&Bet], result: BetResult) -> u32 {
    bets.iter().filter(|b| b.result == result).count() as u32
}

impl DataService for InMemoryDataService {
    async fn query(&self, filters: &Filters) -> Result<Overview> {
        let ledger = self.begin(RecordedCall::Query(filters.clone()))?;
        let mut bets: Vec<Bet> = ledger
            .bets
            .iter()
            .filter(|b| matches(b, filters))
            .cloned()
            .collect();
        bets.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        let sources: BTreeSet<String> =
            ledger.bets.iter().map(|b| b.source.clone()).collect();
        Ok(Overview {
            stats: compute_stats(&bets),
            chart: None,
            bets,
            sources,
        })
    }

    async fn get_bet(&self, id: BetId) -> Result<Reply<Bet>> {
        let mut ledger = self.begin(RecordedCall::GetBet(id))?;
        if let Some(rejection) = ledger.take_rejection() {
            return Ok(Err(rejection));
        }
        Ok(ledger
            .bets
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| Rejection(format!("Bet #{id} not found"))))
    }

    async fn create_bet(&self, draft: &BetDraft) -> Result<Ack> {
        let mut ledger = self.begin(RecordedCall::Create(draft.clone()))?;
        if let Some(rejection) = ledger.take_rejection() {
            return Ok(Err(rejection));
        }
        let bet = match store(ledger.next_id(), draft) {
            Ok(bet) => bet,
            Err(rejection) => return Ok(Err(rejection)),
        };
        ledger.bets.push(bet);
        Ok(Ok(Some("Bet added".to_string())))
    }

    async fn update_bet(&self, id: BetId, draft: &BetDraft) -> Result<Ack> {
        let mut ledger = self.begin(RecordedCall::Update(id, draft.clone()))?;
        if let Some(rejection) = ledger.take_rejection() {
            return Ok(Err(rejection));
        }
        let bet = match store(id, draft) {
            Ok(bet) => bet,
            Err(rejection) => return Ok(Err(rejection)),
        };
        match ledger.bets.iter_mut().find(|b| b.id == id) {
            Some(slot) => {
                *slot = bet;
                Ok(Ok(Some("Bet updated".to_string())))
            }
            None => Ok(Err(Rejection(format!("Bet #{id} not found")))),
        }
    }

    async fn delete_bet(&self, id: BetId) -> Result<Ack> {
        let mut ledger = self.begin(RecordedCall::Delete(id))?;
        if let Some(rejection) = ledger.take_rejection() {
            return Ok(Err(rejection));
        }
        let before = ledger.bets.len();
        ledger.bets.retain(|b| b.id != id);
        if ledger.bets.len() == before {
            return Ok(Err(Rejection(format!("Bet #{id} not found"))));
        }
        Ok(Ok(Some("Bet deleted".to_string())))
    }

    async fn export(&self) -> Result<Reply<ExportFile>> {
        let mut ledger = self.begin(RecordedCall::Export)?;
        if let Some(rejection) = ledger.take_rejection() {
            return Ok(Err(rejection));
        }
        let bytes = serde_json::to_vec_pretty(&ledger.bets)?;
        Ok(Ok(ExportFile {
            filename: EXPORT_FILENAME.to_string(),
            bytes,
        }))
    }

    async fn import(&self, file: &[u8]) -> Result<Ack> {
        let mut ledger = self.begin(RecordedCall::Import(file.len()))?;
        if let Some(rejection) = ledger.take_rejection() {
            return Ok(Err(rejection));
        }
        let bets: Vec<Bet> = match serde_json::from_slice(file) {
            Ok(bets) => bets,
            Err(e) => return Ok(Err(Rejection(format!("Import failed: {e}")))),
        };
        let count = bets.len();
        ledger.bets = bets;
        Ok(Ok(Some(format!("Imported {count} bets"))))
    }

    async fn shutdown(&self) -> Result<()> {
        let mut ledger = self.begin(RecordedCall::Shutdown)?;
        ledger.shut_down = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::{
        bet::Month,
        service::{
            CoefficientRange,
            SourceFilter,
        },
    };

    fn bet(id: i64, day: u32, result: BetResult, coefficient: f64, stake: f64) -> Bet {
        Bet {
            id: BetId(id),
            date: NaiveDate::from_ymd_opt(2025, 7, day).unwrap(),
            event: format!("Event {id}"),
            coefficient,
            stake,
            result,
            source: UNSPECIFIED_SOURCE.to_string(),
        }
    }

    #[test]
    fn compute_stats__matches_hand_computed_values() {
        // given
        let bets = vec![
            bet(1, 1, BetResult::Win, 2.0, 100.0),
            bet(2, 2, BetResult::Loss, 1.5, 100.0),
            bet(3, 3, BetResult::Loss, 1.5, 50.0),
            bet(4, 4, BetResult::Return, 3.0, 100.0),
            bet(5, 5, BetResult::Win, 2.0, 50.0),
        ];

        // when
        let stats = compute_stats(&bets);

        // then
        assert_eq!(stats.total_bets, 5);
        assert_eq!(stats.won_bets, 2);
        assert_eq!(stats.returned_bets, 1);
        assert_eq!(stats.total_profit, 0.0);
        assert_eq!(stats.pass_rate, 50.0);
        assert_eq!(stats.max_drawdown, 150.0);
        assert_eq!(stats.roi, 0.0);
        assert_eq!(stats.avg_coefficient, 2.0);
        assert_eq!(stats.win_streak, 1);
        assert_eq!(stats.loss_streak, 2);
    }

    #[test]
    fn compute_stats__empty_is_all_zero() {
        assert_eq!(compute_stats(&[]), Stats::default());
    }

    #[tokio::test]
    async fn query__filters_and_orders_newest_first() {
        // given
        let mut forum = bet(3, 9, BetResult::Win, 2.5, 10.0);
        forum.source = "Forum".to_string();
        let service = InMemoryDataService::new_with_bets(vec![
            bet(1, 1, BetResult::Win, 1.5, 10.0),
            bet(2, 5, BetResult::Loss, 2.2, 10.0),
            forum,
        ]);
        let filters = Filters {
            month: MonthFilter::Month(Month(7)),
            source: SourceFilter::All,
            coefficient: Some(CoefficientRange { min: 2.0, max: 3.0 }),
        };

        // when
        let overview = service.query(&filters).await.unwrap();

        // then
        let ids: Vec<i64> = overview.bets.iter().map(|b| b.id.0).collect();
        assert_eq!(ids, vec![3, 2]);
        assert_eq!(overview.stats.total_bets, 2);
        assert!(overview.sources.contains("Forum"));
    }

    #[tokio::test]
    async fn create_bet__rejects_impossible_calendar_date() {
        // given
        let service = InMemoryDataService::new();
        let draft = BetDraft {
            date: LedgerDate {
                day: 31,
                month: 2,
                year: 2025,
            },
            event: "A - B".to_string(),
            coefficient: 2.0,
            stake: 10.0,
            result: BetResult::Win,
            source: UNSPECIFIED_SOURCE.to_string(),
        };

        // when
        let ack = service.create_bet(&draft).await.unwrap();

        // then
        assert_eq!(ack, Err(Rejection("Invalid date 31.02.2025".to_string())));
        assert!(service.bets().is_empty());
    }

    #[tokio::test]
    async fn export_then_import__replaces_all_bets() {
        // given
        let source = InMemoryDataService::new_with_bets(vec![bet(1, 1, BetResult::Win, 2.0, 5.0)]);
        let target = InMemoryDataService::new_with_bets(vec![
            bet(7, 2, BetResult::Loss, 1.7, 5.0),
            bet(8, 3, BetResult::Loss, 1.7, 5.0),
        ]);
        let file = source.export().await.unwrap().unwrap();

        // when
        let ack = target.import(&file.bytes).await.unwrap();

        // then
        assert_eq!(ack, Ok(Some("Imported 1 bets".to_string())));
        assert_eq!(target.bets(), source.bets());
    }

    #[tokio::test]
    async fn unreachable__fails_every_call() {
        let service = InMemoryDataService::new();
        service.set_unreachable(true);
        assert!(service.query(&Filters::default()).await.is_err());
        assert!(service.delete_bet(BetId(1)).await.is_err());
    }

    #[test]
    fn seeded__produces_requested_number_of_bets() {
        let service = InMemoryDataService::seeded(30);
        let bets = service.bets();
        assert_eq!(bets.len(), 30);
        assert!(bets.iter().all(|b| b.coefficient >= 1.3 && b.stake >= 50.0));
    }
}
