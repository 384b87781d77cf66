//! Pure derivations from the controller state to what the terminal shows.
//!
//! Nothing in here touches the terminal, so every rule about paging, row
//! presentation and dropdown contents can be checked directly.

use crate::{
    bet::{
        Bet,
        BetId,
        BetResult,
        Month,
        UNSPECIFIED_SOURCE,
    },
    controller::ViewState,
    service::{
        MonthFilter,
        SourceFilter,
        Stats,
    },
    validation::CoefficientInput,
};
use itertools::Itertools;
use std::{
    collections::BTreeSet,
    ops::RangeInclusive,
};

pub const PAGE_SIZE: usize = 50;
const PAGE_LINKS: usize = 5;

pub fn total_pages(rows: usize) -> usize {
    rows.div_ceil(PAGE_SIZE)
}

/// Pulls `page` back into `[1, total_pages]`, or 1 when there are no rows.
pub fn clamp_page(page: usize, rows: usize) -> usize {
    page.clamp(1, total_pages(rows).max(1))
}

pub fn visible_rows(bets: &[Bet], page: usize) -> &[Bet] {
    let start = page.saturating_sub(1).saturating_mul(PAGE_SIZE);
    if start >= bets.len() {
        return &[];
    }
    let end = (page * PAGE_SIZE).min(bets.len());
    &bets[start..end]
}

/// Page links around `current`, sliding to the first or last five pages near
/// either end. Empty when there are no pages.
pub fn page_window(current: usize, total: usize) -> RangeInclusive<usize> {
    if total == 0 {
        return 1..=0;
    }
    let mut start = current.saturating_sub(2).max(1);
    let mut end = (current + 2).min(total);
    if current <= 3 {
        end = PAGE_LINKS.min(total);
    }
    if current >= total.saturating_sub(2) {
        start = total.saturating_sub(PAGE_LINKS - 1).max(1);
    }
    start..=end
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaginationView {
    pub visible: bool,
    pub current: usize,
    pub total: usize,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub links: Vec<usize>,
}

impl PaginationView {
    pub fn new(current: usize, rows: usize) -> Self {
        let total = total_pages(rows);
        Self {
            visible: total > 0,
            current,
            total,
            prev_enabled: total > 0 && current > 1,
            next_enabled: current < total,
            links: page_window(current, total).collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

impl From<BetResult> for Tone {
    fn from(result: BetResult) -> Self {
        match result {
            BetResult::Win => Tone::Positive,
            BetResult::Loss => Tone::Negative,
            BetResult::Return | BetResult::Pending => Tone::Neutral,
        }
    }
}

/// Groups the integer part in thousands with spaces: `-12345.6` with one
/// decimal becomes `-12 345.6`.
pub fn format_number(value: f64, decimals: usize) -> String {
    let raw = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    if value < 0.0 && raw.chars().any(|c| c != '0' && c != '.') {
        grouped.push('-');
    }
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(*c);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

fn signed(value: f64, decimals: usize) -> String {
    let text = format_number(value, decimals);
    if value >= 0.0 { format!("+{text}") } else { text }
}

/// One table row, presentation only.
#[derive(Clone, Debug, PartialEq)]
pub struct RowView {
    pub id: BetId,
    pub date: String,
    pub event: String,
    pub source: String,
    pub coefficient: String,
    pub stake: String,
    pub profit: f64,
    pub profit_text: String,
    pub label: &'static str,
    pub tone: Tone,
}

impl RowView {
    pub fn new(bet: &Bet) -> Self {
        let profit = bet.profit();
        let profit_text = match bet.result {
            BetResult::Win => format!("+{}", format_number(profit.abs(), 0)),
            BetResult::Loss => format!("-{}", format_number(profit.abs(), 0)),
            BetResult::Return | BetResult::Pending => "0".to_string(),
        };
        Self {
            id: bet.id,
            date: bet.date.format("%d.%m.%y").to_string(),
            event: bet.event.clone(),
            source: if bet.has_source() {
                bet.source.clone()
            } else {
                "-".to_string()
            },
            coefficient: format!("{:.2}", bet.coefficient),
            stake: format_number(bet.stake, 0),
            profit,
            profit_text,
            label: bet.result.label(),
            tone: bet.result.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatSegment {
    pub text: String,
    pub tone: Tone,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatCard {
    pub title: &'static str,
    pub segments: Vec<StatSegment>,
}

impl StatCard {
    fn single(title: &'static str, text: String, tone: Tone) -> Self {
        Self {
            title,
            segments: vec![StatSegment { text, tone }],
        }
    }

    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).join(" / ")
    }
}

fn sign_tone(value: f64) -> Tone {
    if value >= 0.0 { Tone::Positive } else { Tone::Negative }
}

pub fn stat_cards(stats: &Stats) -> Vec<StatCard> {
    let losses = stats
        .total_bets
        .saturating_sub(stats.won_bets)
        .saturating_sub(stats.returned_bets);
    vec![
        StatCard::single(
            "Profit",
            signed(stats.total_profit, 0),
            sign_tone(stats.total_profit),
        ),
        StatCard::single(
            "Pass rate",
            format!("{:.1}%", stats.pass_rate),
            Tone::Neutral,
        ),
        StatCard {
            title: "W / L / R",
            segments: vec![
                StatSegment {
                    text: stats.won_bets.to_string(),
                    tone: Tone::Positive,
                },
                StatSegment {
                    text: losses.to_string(),
                    tone: Tone::Negative,
                },
                StatSegment {
                    text: stats.returned_bets.to_string(),
                    tone: Tone::Neutral,
                },
            ],
        },
        StatCard::single(
            "Max drawdown",
            format_number(stats.max_drawdown, 0),
            Tone::Negative,
        ),
        StatCard::single(
            "ROI",
            format!("{}%", signed(stats.roi, 1)),
            sign_tone(stats.roi),
        ),
        StatCard::single(
            "Avg coefficient",
            format!("{:.2}", stats.avg_coefficient),
            Tone::Neutral,
        ),
        StatCard::single("Win streak", stats.win_streak.to_string(), Tone::Positive),
        StatCard::single("Loss streak", stats.loss_streak.to_string(), Tone::Negative),
    ]
}

pub fn derive_months(bets: &[Bet]) -> BTreeSet<Month> {
    bets.iter().map(Bet::month).collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropdownOption<T> {
    pub label: String,
    pub value: T,
    pub selected: bool,
}

pub fn month_options(
    months: Option<&BTreeSet<Month>>,
    selected: MonthFilter,
) -> Vec<DropdownOption<MonthFilter>> {
    std::iter::once(MonthFilter::All)
        .chain(months.into_iter().flatten().map(|m| MonthFilter::Month(*m)))
        .map(|value| DropdownOption {
            label: match value {
                MonthFilter::All => "All months".to_string(),
                MonthFilter::Month(m) => m.to_string(),
            },
            value,
            selected: value == selected,
        })
        .collect()
}

pub fn source_options(
    sources: &BTreeSet<String>,
    selected: &SourceFilter,
) -> Vec<DropdownOption<SourceFilter>> {
    let mut values = vec![SourceFilter::All, SourceFilter::Unspecified];
    values.extend(
        sources
            .iter()
            .filter(|s| !s.is_empty() && s.as_str() != UNSPECIFIED_SOURCE)
            .map(|s| SourceFilter::Named(s.clone())),
    );
    // keep a selection that the latest query no longer reports
    if !values.contains(selected) {
        values.push(selected.clone());
    }
    values
        .into_iter()
        .map(|value| DropdownOption {
            label: value.to_string(),
            selected: &value == selected,
            value,
        })
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ChartSlot {
    #[default]
    Hidden,
    Image {
        size: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderScope {
    Full,
    /// Bet table and pagination strip.
    Table,
    /// Form fields, submit label and inline validation message.
    Form,
    /// Filter dropdowns and coefficient bounds.
    Filters,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewModel {
    pub stat_cards: Vec<StatCard>,
    pub chart: ChartSlot,
    pub rows: Vec<RowView>,
    pub pagination: PaginationView,
    pub month_options: Vec<DropdownOption<MonthFilter>>,
    pub source_options: Vec<DropdownOption<SourceFilter>>,
    pub coefficient: CoefficientInput,
    pub filter_error: Option<String>,
    pub form_error: Option<String>,
    pub submit_label: &'static str,
    pub editing: Option<BetId>,
    pub loading: bool,
}

impl ViewModel {
    pub fn build(state: &ViewState) -> Self {
        let mut model = Self::default();
        model.refresh(RenderScope::Full, state);
        model
    }

    /// Recomputes the regions covered by `scope`, leaving the rest as drawn.
    pub fn refresh(&mut self, scope: RenderScope, state: &ViewState) {
        let all = scope == RenderScope::Full;
        if all {
            self.stat_cards = stat_cards(&state.stats);
            self.chart = match &state.chart {
                Some(bytes) if !bytes.is_empty() => ChartSlot::Image { size: bytes.len() },
                _ => ChartSlot::Hidden,
            };
            self.loading = state.in_flight.load;
        }
        if all || scope == RenderScope::Table {
            self.rows = visible_rows(&state.bets, state.page)
                .iter()
                .map(RowView::new)
                .collect();
            self.pagination = PaginationView::new(state.page, state.bets.len());
        }
        if all || scope == RenderScope::Filters {
            self.month_options = month_options(state.months.as_ref(), state.filters.month);
            self.source_options = source_options(&state.sources, &state.filters.source);
            self.coefficient = CoefficientInput::from_range(state.filters.coefficient);
            self.filter_error = state.filter_error.clone();
        }
        if all || scope == RenderScope::Form {
            self.form_error = state.form_error.clone();
            self.editing = state.editing;
            self.submit_label = if state.editing.is_some() { "Save" } else { "Add" };
        }
    }

    pub fn table_visible(&self) -> bool {
        self.pagination.visible
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn bet(id: i64, month: u32, result: BetResult) -> Bet {
        Bet {
            id: BetId(id),
            date: NaiveDate::from_ymd_opt(2025, month, 1).unwrap(),
            event: format!("Event {id}"),
            coefficient: 2.0,
            stake: 100.0,
            result,
            source: UNSPECIFIED_SOURCE.to_string(),
        }
    }

    fn bets(n: usize) -> Vec<Bet> {
        (0..n).map(|i| bet(i as i64, 1, BetResult::Win)).collect()
    }

    #[test]
    fn total_pages__rounds_up() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(50), 1);
        assert_eq!(total_pages(51), 2);
        assert_eq!(total_pages(500), 10);
    }

    #[test]
    fn clamp_page__is_one_without_rows() {
        assert_eq!(clamp_page(4, 0), 1);
    }

    #[test]
    fn clamp_page__pulls_back_when_pages_shrink() {
        assert_eq!(clamp_page(5, 120), 3);
        assert_eq!(clamp_page(2, 120), 2);
    }

    #[test]
    fn visible_rows__last_page_is_partial() {
        // given
        let list = bets(120);

        // when
        let rows = visible_rows(&list, 3);

        // then
        assert_eq!(rows.len(), 20);
        assert_eq!(rows[0].id, BetId(100));
    }

    #[test]
    fn visible_rows__out_of_range_page_is_empty() {
        assert!(visible_rows(&bets(10), 2).is_empty());
    }

    #[test]
    fn page_window__slides_at_boundaries() {
        assert_eq!(page_window(1, 10), 1..=5);
        assert_eq!(page_window(10, 10), 6..=10);
        assert_eq!(page_window(6, 10), 4..=8);
        assert_eq!(page_window(3, 10), 1..=5);
        assert_eq!(page_window(8, 10), 6..=10);
    }

    #[test]
    fn page_window__few_pages_shows_all() {
        assert_eq!(page_window(2, 3), 1..=3);
        assert_eq!(page_window(1, 1), 1..=1);
        assert!(page_window(1, 0).is_empty());
    }

    #[test]
    fn pagination_view__disables_prev_and_next_at_edges() {
        // given
        let first = PaginationView::new(1, 500);
        let last = PaginationView::new(10, 500);
        let middle = PaginationView::new(5, 500);

        // then
        assert!(!first.prev_enabled && first.next_enabled);
        assert!(last.prev_enabled && !last.next_enabled);
        assert!(middle.prev_enabled && middle.next_enabled);
    }

    #[test]
    fn pagination_view__hidden_without_rows() {
        let view = PaginationView::new(1, 0);
        assert!(!view.visible);
        assert!(!view.prev_enabled && !view.next_enabled);
        assert!(view.links.is_empty());
    }

    proptest! {
        #[test]
        fn page_window__has_at_most_five_links_and_contains_current(
            total in 1usize..400,
            pick in 0usize..400,
        ) {
            let current = pick % total + 1;
            let window = page_window(current, total);
            let links: Vec<usize> = window.clone().collect();
            prop_assert!(links.len() <= 5);
            prop_assert!(window.contains(&current));
            prop_assert!(*window.start() >= 1);
            prop_assert!(*window.end() <= total);
            prop_assert_eq!(links.len(), total.min(5));
        }

        #[test]
        fn clamp_page__always_lands_in_range(page in 0usize..1000, rows in 0usize..5000) {
            let clamped = clamp_page(page, rows);
            prop_assert!(clamped >= 1);
            prop_assert!(clamped <= total_pages(rows).max(1));
        }
    }

    #[test]
    fn row_view__profit_text_per_result() {
        // given
        let mut win = bet(1, 7, BetResult::Win);
        win.coefficient = 2.5;
        let loss = bet(2, 7, BetResult::Loss);
        let ret = bet(3, 7, BetResult::Return);
        let pending = bet(4, 7, BetResult::Pending);

        // when
        let rows: Vec<RowView> = [&win, &loss, &ret, &pending]
            .into_iter()
            .map(RowView::new)
            .collect();

        // then
        assert_eq!(rows[0].profit, 150.0);
        assert_eq!(rows[0].profit_text, "+150");
        assert_eq!(rows[1].profit, -100.0);
        assert_eq!(rows[1].profit_text, "-100");
        assert_eq!(rows[2].profit_text, "0");
        assert_eq!(rows[3].profit_text, "0");
        assert_eq!(rows[3].tone, Tone::Neutral);
        assert_eq!(rows[0].label, "WIN");
        assert_eq!(rows[0].date, "01.07.25");
    }

    #[test]
    fn format_number__groups_thousands() {
        assert_eq!(format_number(1234567.0, 0), "1 234 567");
        assert_eq!(format_number(-12345.64, 1), "-12 345.6");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(0.0, 2), "0.00");
        assert_eq!(format_number(-0.2, 0), "0");
    }

    #[test]
    fn stat_cards__derive_losses_and_signs() {
        // given
        let stats = Stats {
            total_profit: -2500.0,
            pass_rate: 55.555,
            won_bets: 5,
            returned_bets: 1,
            total_bets: 10,
            roi: 12.34,
            avg_coefficient: 1.876,
            ..Stats::default()
        };

        // when
        let cards = stat_cards(&stats);

        // then
        assert_eq!(cards.len(), 8);
        assert_eq!(cards[0].text(), "-2 500");
        assert_eq!(cards[0].segments[0].tone, Tone::Negative);
        assert_eq!(cards[1].text(), "55.6%");
        assert_eq!(cards[2].text(), "5 / 4 / 1");
        assert_eq!(cards[4].text(), "+12.3%");
        assert_eq!(cards[5].text(), "1.88");
    }

    #[test]
    fn derive_months__distinct_and_sorted() {
        let list = vec![
            bet(1, 7, BetResult::Win),
            bet(2, 3, BetResult::Loss),
            bet(3, 7, BetResult::Return),
        ];
        let months: Vec<String> = derive_months(&list).iter().map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["03", "07"]);
    }

    #[test]
    fn source_options__skip_sentinel_and_keep_selection() {
        // given
        let sources: BTreeSet<String> = [UNSPECIFIED_SOURCE, "Telegram", "Forum"]
            .into_iter()
            .map(String::from)
            .collect();
        let selected = SourceFilter::Named("Gone".to_string());

        // when
        let options = source_options(&sources, &selected);

        // then
        let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["All sources", "Unspecified", "Forum", "Telegram", "Gone"]
        );
        assert!(options.last().unwrap().selected);
    }

    #[test]
    fn month_options__start_with_all() {
        let months: BTreeSet<Month> = [Month(1), Month(12)].into_iter().collect();
        let options = month_options(Some(&months), MonthFilter::Month(Month(12)));
        let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["All months", "01", "12"]);
        assert!(options[2].selected);
    }
}
