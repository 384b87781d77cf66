//! Session state and its transitions.
//!
//! The whole session lives in one [`ViewState`] value. [`update`] takes the
//! state and one [`Msg`] and hands back the next state together with the
//! [`Effect`]s the runner has to carry out: service calls, partial redraws,
//! notices, confirmation prompts and form writes. Service replies come back
//! in as [`Msg::Replied`].

use crate::{
    bet::{
        Bet,
        BetDraft,
        BetId,
        Month,
    },
    service::{
        Ack,
        ExportFile,
        Filters,
        MonthFilter,
        Overview,
        Reply,
        SourceFilter,
        Stats,
    },
    validation::{
        CoefficientInput,
        FormFields,
    },
    view::{
        self,
        RenderScope,
    },
};
use std::{
    collections::BTreeSet,
    fmt,
};
use tracing::{
    debug,
    error,
    info,
    warn,
};

pub const CHART_FILENAME: &str = "profit_chart.png";

/// Which action classes currently wait on the service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InFlight {
    pub load: bool,
    /// create, update, delete and import
    pub mutation: bool,
    pub edit: bool,
    pub export: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PendingConfirmation {
    Delete(BetId),
    Import(Vec<u8>),
}

impl PendingConfirmation {
    pub fn prompt(&self) -> String {
        match self {
            PendingConfirmation::Delete(id) => {
                format!("Delete bet #{id}? This cannot be undone.")
            }
            PendingConfirmation::Import(_) => "All existing bets will be deleted and \
                 replaced with the contents of the file. Continue?"
                .to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub bets: Vec<Bet>,
    pub stats: Stats,
    pub chart: Option<Vec<u8>>,
    pub sources: BTreeSet<String>,
    /// Months seen in the first unfiltered load, kept for the whole session.
    pub months: Option<BTreeSet<Month>>,
    pub filters: Filters,
    /// Filters of the newest load issued or queued, `filters` when idle.
    pub requested_filters: Filters,
    pub page: usize,
    pub editing: Option<BetId>,
    /// The edit reference a pending create or update was submitted under.
    pub saving_edit: Option<BetId>,
    pub form_error: Option<String>,
    pub filter_error: Option<String>,
    pub in_flight: InFlight,
    pub queued_load: Option<LoadRequest>,
    pub confirmation: Option<PendingConfirmation>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            bets: Vec::new(),
            stats: Stats::default(),
            chart: None,
            sources: BTreeSet::new(),
            months: None,
            filters: Filters::default(),
            requested_filters: Filters::default(),
            page: 1,
            editing: None,
            saving_edit: None,
            form_error: None,
            filter_error: None,
            in_flight: InFlight::default(),
            queued_load: None,
            confirmation: None,
        }
    }
}

impl ViewState {
    pub fn total_pages(&self) -> usize {
        view::total_pages(self.bets.len())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoadRequest {
    pub filters: Filters,
    pub reset_page: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ServiceRequest {
    Query(LoadRequest),
    GetBet(BetId),
    Create(BetDraft),
    Update(BetId, BetDraft),
    Delete(BetId),
    Export,
    Import(Vec<u8>),
    Shutdown,
}

/// A call that never produced a reply: network, decoding or server fault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type Transport<T> = Result<T, TransportError>;

#[derive(Clone, Debug, PartialEq)]
pub enum ServiceResponse {
    Loaded {
        request: LoadRequest,
        result: Transport<Overview>,
    },
    Fetched(Transport<Reply<Bet>>),
    Saved(Transport<Ack>),
    Deleted(Transport<Ack>),
    Exported(Transport<Reply<ExportFile>>),
    Imported(Transport<Ack>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Msg {
    /// Session start: unfiltered load.
    Start,
    /// Reload with the filters currently applied.
    Reload,
    SetPage(usize),
    ApplyFilters {
        month: MonthFilter,
        source: SourceFilter,
        coefficient: CoefficientInput,
    },
    ResetFilters,
    BeginEdit(BetId),
    Submit(FormFields),
    Delete(BetId),
    Export,
    Import(Vec<u8>),
    SaveChart,
    Confirmed(bool),
    Replied(ServiceResponse),
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Call(ServiceRequest),
    Render(RenderScope),
    Notify(Notice),
    Confirm(String),
    FillForm(FormFields),
    ClearForm,
    SaveFile(ExportFile),
}

const BUSY: &str = "Still waiting for the previous operation to finish";

pub fn update(mut state: ViewState, msg: Msg) -> (ViewState, Vec<Effect>) {
    let mut fx = Vec::new();
    state.handle(msg, &mut fx);
    (state, fx)
}

impl ViewState {
    fn handle(&mut self, msg: Msg, fx: &mut Vec<Effect>) {
        match msg {
            Msg::Start => self.request_load(
                LoadRequest {
                    filters: Filters::default(),
                    reset_page: true,
                },
                fx,
            ),
            Msg::Reload => self.reload(fx),
            Msg::SetPage(page) => self.set_page(page, fx),
            Msg::ApplyFilters {
                month,
                source,
                coefficient,
            } => self.apply_filters(month, source, &coefficient, fx),
            Msg::ResetFilters => {
                self.filter_error = None;
                self.request_load(
                    LoadRequest {
                        filters: Filters::default(),
                        reset_page: true,
                    },
                    fx,
                );
                fx.push(Effect::Render(RenderScope::Filters));
            }
            Msg::BeginEdit(id) => {
                if self.in_flight.edit {
                    return busy(fx);
                }
                self.in_flight.edit = true;
                fx.push(Effect::Call(ServiceRequest::GetBet(id)));
            }
            Msg::Submit(fields) => self.submit(&fields, fx),
            Msg::Delete(id) => self.ask(PendingConfirmation::Delete(id), fx),
            Msg::Import(bytes) => self.ask(PendingConfirmation::Import(bytes), fx),
            Msg::Confirmed(yes) => self.confirmed(yes, fx),
            Msg::Export => {
                if self.in_flight.export {
                    return busy(fx);
                }
                self.in_flight.export = true;
                fx.push(Effect::Call(ServiceRequest::Export));
            }
            Msg::SaveChart => match &self.chart {
                Some(bytes) if !bytes.is_empty() => fx.push(Effect::SaveFile(ExportFile {
                    filename: CHART_FILENAME.to_string(),
                    bytes: bytes.clone(),
                })),
                _ => fx.push(Effect::Notify(Notice::info("No chart to save yet"))),
            },
            Msg::Replied(response) => self.replied(response, fx),
            Msg::Quit => fx.push(Effect::Call(ServiceRequest::Shutdown)),
        }
    }

    fn request_load(&mut self, request: LoadRequest, fx: &mut Vec<Effect>) {
        self.requested_filters = request.filters.clone();
        if self.in_flight.load {
            debug!(?request, "load already running, queueing");
            self.queued_load = Some(request);
            return;
        }
        self.in_flight.load = true;
        fx.push(Effect::Call(ServiceRequest::Query(request)));
    }

    /// Refreshes the list under the newest requested filters. A queued load
    /// already runs after the current reply, so it covers the refresh.
    fn reload(&mut self, fx: &mut Vec<Effect>) {
        if self.queued_load.is_some() {
            return;
        }
        self.request_load(
            LoadRequest {
                filters: self.requested_filters.clone(),
                reset_page: false,
            },
            fx,
        );
    }

    fn set_page(&mut self, page: usize, fx: &mut Vec<Effect>) {
        if page < 1 || page > self.total_pages() || page == self.page {
            return;
        }
        self.page = page;
        fx.push(Effect::Render(RenderScope::Table));
    }

    fn apply_filters(
        &mut self,
        month: MonthFilter,
        source: SourceFilter,
        coefficient: &CoefficientInput,
        fx: &mut Vec<Effect>,
    ) {
        match coefficient.parse() {
            Ok(range) => {
                self.filter_error = None;
                self.request_load(
                    LoadRequest {
                        filters: Filters {
                            month,
                            source,
                            coefficient: range,
                        },
                        reset_page: true,
                    },
                    fx,
                );
            }
            Err(e) => {
                self.filter_error = Some(e.to_string());
                fx.push(Effect::Render(RenderScope::Filters));
            }
        }
    }

    fn submit(&mut self, fields: &FormFields, fx: &mut Vec<Effect>) {
        if self.in_flight.mutation {
            return busy(fx);
        }
        match fields.validate() {
            Ok(draft) => {
                self.form_error = None;
                self.in_flight.mutation = true;
                self.saving_edit = self.editing;
                let request = match self.editing {
                    Some(id) => ServiceRequest::Update(id, draft),
                    None => ServiceRequest::Create(draft),
                };
                fx.push(Effect::Call(request));
            }
            Err(e) => {
                debug!(error = %e, "bet form rejected locally");
                self.form_error = Some(e.to_string());
            }
        }
        fx.push(Effect::Render(RenderScope::Form));
    }

    fn ask(&mut self, confirmation: PendingConfirmation, fx: &mut Vec<Effect>) {
        if self.in_flight.mutation || self.confirmation.is_some() {
            return busy(fx);
        }
        fx.push(Effect::Confirm(confirmation.prompt()));
        self.confirmation = Some(confirmation);
    }

    fn confirmed(&mut self, yes: bool, fx: &mut Vec<Effect>) {
        let Some(confirmation) = self.confirmation.take() else {
            return;
        };
        if !yes {
            debug!(?confirmation, "declined");
            return;
        }
        if self.in_flight.mutation {
            return busy(fx);
        }
        self.in_flight.mutation = true;
        let request = match confirmation {
            PendingConfirmation::Delete(id) => ServiceRequest::Delete(id),
            PendingConfirmation::Import(bytes) => ServiceRequest::Import(bytes),
        };
        fx.push(Effect::Call(request));
    }

    fn replied(&mut self, response: ServiceResponse, fx: &mut Vec<Effect>) {
        match response {
            ServiceResponse::Loaded { request, result } => {
                self.in_flight.load = false;
                match result {
                    Ok(overview) => self.apply_overview(request, overview, fx),
                    Err(e) => {
                        error!(error = %e, "loading bets failed");
                        if self.queued_load.is_none() {
                            self.requested_filters = self.filters.clone();
                        }
                        fx.push(Effect::Notify(Notice::error(
                            "Failed to load data. Please try again.",
                        )));
                        fx.push(Effect::Render(RenderScope::Filters));
                    }
                }
                if let Some(next) = self.queued_load.take() {
                    self.request_load(next, fx);
                }
            }
            ServiceResponse::Fetched(result) => {
                self.in_flight.edit = false;
                match result {
                    Ok(Ok(bet)) => {
                        info!(id = %bet.id, "editing bet");
                        self.editing = Some(bet.id);
                        self.form_error = None;
                        fx.push(Effect::FillForm(FormFields::from_bet(&bet)));
                        fx.push(Effect::Render(RenderScope::Form));
                    }
                    Ok(Err(rejection)) => rejected(rejection.0, fx),
                    Err(e) => failed(&e, "Failed to fetch the bet for editing.", fx),
                }
            }
            ServiceResponse::Saved(result) => {
                self.in_flight.mutation = false;
                let submitted_under = self.saving_edit.take();
                match result {
                    Ok(Ok(_)) => {
                        // A form opened for another bet meanwhile stays put.
                        if self.editing == submitted_under {
                            self.editing = None;
                            self.form_error = None;
                            fx.push(Effect::ClearForm);
                            fx.push(Effect::Render(RenderScope::Form));
                        }
                        self.reload(fx);
                    }
                    Ok(Err(rejection)) => rejected(rejection.0, fx),
                    Err(e) => failed(&e, "Failed to save the bet.", fx),
                }
            }
            ServiceResponse::Deleted(result) => {
                self.in_flight.mutation = false;
                match result {
                    Ok(Ok(_)) => self.reload(fx),
                    Ok(Err(rejection)) => rejected(rejection.0, fx),
                    Err(e) => failed(&e, "Failed to delete the bet.", fx),
                }
            }
            ServiceResponse::Imported(result) => {
                self.in_flight.mutation = false;
                match result {
                    Ok(Ok(message)) => {
                        self.reload(fx);
                        fx.push(Effect::Notify(Notice::info(
                            message.unwrap_or_else(|| "Data imported".to_string()),
                        )));
                    }
                    Ok(Err(rejection)) => rejected(rejection.0, fx),
                    Err(e) => failed(&e, "Failed to import data.", fx),
                }
            }
            ServiceResponse::Exported(result) => {
                self.in_flight.export = false;
                match result {
                    Ok(Ok(file)) => fx.push(Effect::SaveFile(file)),
                    Ok(Err(rejection)) => rejected(rejection.0, fx),
                    Err(e) => failed(&e, "Failed to export data.", fx),
                }
            }
        }
    }

    fn apply_overview(
        &mut self,
        request: LoadRequest,
        overview: Overview,
        fx: &mut Vec<Effect>,
    ) {
        let Overview {
            stats,
            chart,
            bets,
            sources,
        } = overview;
        if self.months.is_none() && request.filters.is_unfiltered() {
            self.months = Some(view::derive_months(&bets));
        }
        info!(bets = bets.len(), filtered = !request.filters.is_unfiltered(), "bets loaded");
        self.bets = bets;
        self.stats = stats;
        self.chart = chart;
        self.sources = sources;
        self.filters = request.filters;
        self.page = if request.reset_page {
            1
        } else {
            view::clamp_page(self.page, self.bets.len())
        };
        fx.push(Effect::Render(RenderScope::Full));
    }
}

fn busy(fx: &mut Vec<Effect>) {
    warn!("rejected overlapping action");
    fx.push(Effect::Notify(Notice::info(BUSY)));
}

fn rejected(message: String, fx: &mut Vec<Effect>) {
    warn!(%message, "data service rejected the request");
    fx.push(Effect::Notify(Notice::error(message)));
}

fn failed(e: &TransportError, notice: &str, fx: &mut Vec<Effect>) {
    error!(error = %e, "data service call failed");
    fx.push(Effect::Notify(Notice::error(notice)));
}
