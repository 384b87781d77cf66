use crate::{
    bet::{
        BetResult,
        LedgerDate,
    },
    controller::{
        Msg,
        Notice,
        NoticeLevel,
    },
    validation::{
        CoefficientInput,
        FormFields,
    },
    view::{
        ChartSlot,
        DropdownOption,
        Tone,
        ViewModel,
    },
};
use chrono::NaiveDate;
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        Event,
        EventStream,
        KeyCode,
        KeyEvent,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use futures::StreamExt;
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;
use unicode_width::UnicodeWidthStr;

pub type InputEventReceiver = EventStream;

pub fn input_event_stream() -> InputEventReceiver {
    EventStream::new()
}

pub async fn next_raw_event(events: &mut InputEventReceiver) -> Result<Event> {
    match events.next().await {
        Some(event) => Ok(event?),
        None => Err(eyre!("terminal input stream closed")),
    }
}

#[derive(Debug, PartialEq)]
pub enum UserEvent {
    Quit,
    Redraw,
    Send(Msg),
    /// Path typed into the import prompt, not yet expanded.
    ImportFrom(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FormField {
    Date,
    Event,
    Coefficient,
    Stake,
    Result,
    Source,
}

impl FormField {
    const ALL: [FormField; 6] = [
        FormField::Date,
        FormField::Event,
        FormField::Coefficient,
        FormField::Stake,
        FormField::Result,
        FormField::Source,
    ];

    fn label(self) -> &'static str {
        match self {
            FormField::Date => "Date",
            FormField::Event => "Event",
            FormField::Coefficient => "Coefficient",
            FormField::Stake => "Stake",
            FormField::Result => "Result",
            FormField::Source => "Source",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FilterField {
    Month,
    Source,
    MinCoefficient,
    MaxCoefficient,
}

impl FilterField {
    const ALL: [FilterField; 4] = [
        FilterField::Month,
        FilterField::Source,
        FilterField::MinCoefficient,
        FilterField::MaxCoefficient,
    ];

    fn label(self) -> &'static str {
        match self {
            FilterField::Month => "Month",
            FilterField::Source => "Source",
            FilterField::MinCoefficient => "Coef. from",
            FilterField::MaxCoefficient => "Coef. to",
        }
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let idx = all.iter().position(|f| *f == current).unwrap_or(0);
    let next = if forward {
        (idx + 1) % all.len()
    } else {
        (idx + all.len() - 1) % all.len()
    };
    all[next]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Focus {
    Table,
    Form(FormField),
    Filters(FilterField),
}

#[derive(Clone, Debug, Default, PartialEq)]
enum Mode {
    #[default]
    Normal,
    Confirm(String),
    Notice(Notice),
    ImportPrompt(String),
}

pub struct UiState {
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
    mode: Mode,
    focus: Focus,
    form: FormFields,
    month_idx: usize,
    source_idx: usize,
    coefficient: CoefficientInput,
    selected_row: usize,
    status: Option<Notice>,
    /// Error dialog pushed aside by a confirmation prompt.
    held_notice: Option<Notice>,
}

impl UiState {
    pub fn new(today: NaiveDate) -> Self {
        UiState {
            terminal: None,
            mode: Mode::Normal,
            focus: Focus::Table,
            form: FormFields::blank(LedgerDate::from_naive(today)),
            month_idx: 0,
            source_idx: 0,
            coefficient: CoefficientInput::default(),
            selected_row: 0,
            status: None,
            held_notice: None,
        }
    }

    /// Errors also pop up unless another dialog is already open.
    pub fn show_notice(&mut self, notice: Notice) {
        if notice.level == NoticeLevel::Error && self.mode == Mode::Normal {
            self.mode = Mode::Notice(notice.clone());
        }
        self.status = Some(notice);
    }

    pub fn ask(&mut self, prompt: String) {
        if let Mode::Notice(notice) = std::mem::replace(&mut self.mode, Mode::Confirm(prompt)) {
            self.held_notice = Some(notice);
        }
    }

    fn close_confirmation(&mut self) {
        self.mode = self.held_notice.take().map(Mode::Notice).unwrap_or_default();
    }

    pub fn fill_form(&mut self, fields: FormFields) {
        self.form = fields;
        self.focus = Focus::Form(FormField::Date);
    }

    pub fn clear_form(&mut self) {
        self.form = self.form.cleared();
    }

    /// Drops any unapplied edits in the filter panel.
    pub fn sync_filters(&mut self, view: &ViewModel) {
        self.month_idx = selected_index(&view.month_options);
        self.source_idx = selected_index(&view.source_options);
        self.coefficient = view.coefficient.clone();
    }

    pub fn clamp_selection(&mut self, rows: usize) {
        self.selected_row = self.selected_row.min(rows.saturating_sub(1));
    }
}

fn selected_index<T>(options: &[DropdownOption<T>]) -> usize {
    options.iter().position(|o| o.selected).unwrap_or(0)
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

pub fn draw(state: &mut UiState, view: &ViewModel) -> Result<()> {
    if let Some(mut term) = state.terminal.take() {
        let res = term.draw(|f| ui(f, state, view)).map(|_| ());
        state.terminal = Some(term);
        res?;
    }
    Ok(())
}

pub fn interpret_event(
    state: &mut UiState,
    view: &ViewModel,
    event: Event,
) -> Option<UserEvent> {
    let k = match event {
        Event::Key(k) if k.kind == KeyEventKind::Press => k,
        Event::Resize(..) => return Some(UserEvent::Redraw),
        _ => return None,
    };
    if state.mode != Mode::Normal {
        return on_modal_key(state, k);
    }
    match state.focus {
        Focus::Table => on_table_key(state, view, k),
        Focus::Form(field) => on_form_key(state, field, k),
        Focus::Filters(field) => on_filter_key(state, view, field, k),
    }
}

fn on_modal_key(state: &mut UiState, k: KeyEvent) -> Option<UserEvent> {
    match &mut state.mode {
        Mode::Normal => None,
        Mode::Confirm(_) => match k.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                state.close_confirmation();
                Some(UserEvent::Send(Msg::Confirmed(true)))
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.close_confirmation();
                Some(UserEvent::Send(Msg::Confirmed(false)))
            }
            _ => None,
        },
        Mode::Notice(_) => match k.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::ImportPrompt(path) => match k.code {
            KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Enter => {
                let path = path.trim().to_string();
                state.mode = Mode::Normal;
                if path.is_empty() {
                    Some(UserEvent::Redraw)
                } else {
                    Some(UserEvent::ImportFrom(path))
                }
            }
            code => edit_text(path, code).then_some(UserEvent::Redraw),
        },
    }
}

fn on_table_key(state: &mut UiState, view: &ViewModel, k: KeyEvent) -> Option<UserEvent> {
    let pagination = &view.pagination;
    let selected = view.rows.get(state.selected_row).map(|r| r.id);
    let send = |msg| Some(UserEvent::Send(msg));
    match k.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(UserEvent::Quit),
        KeyCode::Left | KeyCode::Char('p') if pagination.prev_enabled => {
            send(Msg::SetPage(pagination.current - 1))
        }
        KeyCode::Right | KeyCode::Char('n') if pagination.next_enabled => {
            send(Msg::SetPage(pagination.current + 1))
        }
        KeyCode::Char(c @ '1'..='9') => {
            let idx = c as usize - '1' as usize;
            pagination.links.get(idx).and_then(|page| send(Msg::SetPage(*page)))
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.selected_row = state.selected_row.saturating_sub(1);
            Some(UserEvent::Redraw)
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.selected_row + 1 < view.rows.len() {
                state.selected_row += 1;
            }
            Some(UserEvent::Redraw)
        }
        KeyCode::Char('e') => selected.and_then(|id| send(Msg::BeginEdit(id))),
        KeyCode::Char('d') => selected.and_then(|id| send(Msg::Delete(id))),
        KeyCode::Char('a') | KeyCode::Tab => {
            state.focus = Focus::Form(FormField::Date);
            Some(UserEvent::Redraw)
        }
        KeyCode::Char('f') => {
            state.focus = Focus::Filters(FilterField::Month);
            Some(UserEvent::Redraw)
        }
        KeyCode::Char('r') => send(Msg::ResetFilters),
        KeyCode::Char('x') => send(Msg::Export),
        KeyCode::Char('g') => send(Msg::SaveChart),
        KeyCode::Char('i') => {
            state.mode = Mode::ImportPrompt(String::new());
            Some(UserEvent::Redraw)
        }
        _ => None,
    }
}

fn on_form_key(state: &mut UiState, field: FormField, k: KeyEvent) -> Option<UserEvent> {
    match k.code {
        KeyCode::Esc => state.focus = Focus::Table,
        KeyCode::Tab | KeyCode::Down => {
            state.focus = Focus::Form(cycle(&FormField::ALL, field, true));
        }
        KeyCode::BackTab | KeyCode::Up => {
            state.focus = Focus::Form(cycle(&FormField::ALL, field, false));
        }
        KeyCode::Enter => return Some(UserEvent::Send(Msg::Submit(state.form.clone()))),
        code if field == FormField::Result => {
            let forward = match code {
                KeyCode::Right | KeyCode::Char(' ') => true,
                KeyCode::Left => false,
                _ => return None,
            };
            state.form.result = Some(match state.form.result {
                Some(current) => cycle(&BetResult::ALL, current, forward),
                None if forward => BetResult::ALL[0],
                None => BetResult::ALL[BetResult::ALL.len() - 1],
            });
        }
        code => {
            let form = &mut state.form;
            let buf = match field {
                FormField::Date => &mut form.date,
                FormField::Event => &mut form.event,
                FormField::Coefficient => &mut form.coefficient,
                FormField::Stake => &mut form.stake,
                FormField::Source => &mut form.source,
                FormField::Result => return None,
            };
            if !edit_text(buf, code) {
                return None;
            }
        }
    }
    Some(UserEvent::Redraw)
}

fn on_filter_key(
    state: &mut UiState,
    view: &ViewModel,
    field: FilterField,
    k: KeyEvent,
) -> Option<UserEvent> {
    match k.code {
        KeyCode::Esc => {
            state.sync_filters(view);
            state.focus = Focus::Table;
        }
        KeyCode::Tab | KeyCode::Down => {
            state.focus = Focus::Filters(cycle(&FilterField::ALL, field, true));
        }
        KeyCode::BackTab | KeyCode::Up => {
            state.focus = Focus::Filters(cycle(&FilterField::ALL, field, false));
        }
        KeyCode::Enter => {
            let month = view
                .month_options
                .get(state.month_idx)
                .map(|o| o.value)
                .unwrap_or_default();
            let source = view
                .source_options
                .get(state.source_idx)
                .map(|o| o.value.clone())
                .unwrap_or_default();
            return Some(UserEvent::Send(Msg::ApplyFilters {
                month,
                source,
                coefficient: state.coefficient.clone(),
            }));
        }
        code @ (KeyCode::Left | KeyCode::Right)
            if matches!(field, FilterField::Month | FilterField::Source) =>
        {
            let (idx, len) = match field {
                FilterField::Month => (&mut state.month_idx, view.month_options.len()),
                _ => (&mut state.source_idx, view.source_options.len()),
            };
            if len == 0 {
                return None;
            }
            *idx = if code == KeyCode::Right {
                (*idx + 1) % len
            } else {
                (*idx + len - 1) % len
            };
        }
        code => {
            let buf = match field {
                FilterField::MinCoefficient => &mut state.coefficient.min,
                FilterField::MaxCoefficient => &mut state.coefficient.max,
                _ => return None,
            };
            if !edit_text(buf, code) {
                return None;
            }
        }
    }
    Some(UserEvent::Redraw)
}

fn edit_text(buf: &mut String, code: KeyCode) -> bool {
    match code {
        KeyCode::Char(c) => buf.push(c),
        KeyCode::Backspace => {
            buf.pop();
        }
        _ => return false,
    }
    true
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Positive => Color::Green,
        Tone::Negative => Color::Red,
        Tone::Neutral => Color::Gray,
    }
}

fn focus_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn ui(f: &mut Frame, state: &UiState, view: &ViewModel) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // stat cards, two rows of four
            Constraint::Min(10),
            Constraint::Length(3), // status
            Constraint::Length(3), // help
        ])
        .split(f.area());

    draw_stat_cards(f, chunks[0], view);
    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(60), Constraint::Length(42)])
        .split(chunks[1]);
    draw_table(f, state, middle[0], view);
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Min(3),
        ])
        .split(middle[1]);
    draw_form(f, state, side[0], view);
    draw_filters(f, state, side[1], view);
    draw_chart(f, side[2], view);
    draw_status(f, state, chunks[2], view);
    draw_help(f, state, chunks[3]);
    draw_modals(f, state);
}

fn draw_stat_cards(f: &mut Frame, area: Rect, view: &ViewModel) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3)])
        .split(area);
    for (row_idx, cards) in view.stat_cards.chunks(4).enumerate().take(2) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(rows[row_idx]);
        for (card, col) in cards.iter().zip(cols.iter()) {
            let mut spans = Vec::new();
            for (i, seg) in card.segments.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::raw(" / "));
                }
                spans.push(Span::styled(
                    seg.text.clone(),
                    Style::default().fg(tone_color(seg.tone)),
                ));
            }
            let widget = Paragraph::new(Line::from(spans))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(card.title));
            f.render_widget(widget, *col);
        }
    }
}

fn draw_table(f: &mut Frame, state: &UiState, area: Rect, view: &ViewModel) {
    let title = if view.loading { "Bets (loading...)" } else { "Bets" };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(focus_style(state.focus == Focus::Table));
    if !view.table_visible() {
        let empty = Paragraph::new("No bets recorded")
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(block.inner(area));
    f.render_widget(block, area);

    let header = Row::new(["Date", "Event", "Source", "Coef", "Stake", "Profit", "Result"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = view.rows.iter().map(|r| {
        let color = tone_color(r.tone);
        Row::new(vec![
            Cell::from(r.date.clone()),
            Cell::from(r.event.clone()),
            Cell::from(r.source.clone()),
            Cell::from(r.coefficient.clone()),
            Cell::from(r.stake.clone()),
            Cell::from(Span::styled(r.profit_text.clone(), Style::default().fg(color))),
            Cell::from(Span::styled(r.label, Style::default().fg(color))),
        ])
    });
    let widths = [
        Constraint::Length(8),
        Constraint::Min(20),
        Constraint::Length(12),
        Constraint::Length(6),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(8),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut table_state = TableState::default().with_selected(Some(state.selected_row));
    f.render_stateful_widget(table, parts[0], &mut table_state);

    let p = &view.pagination;
    let mut spans = vec![Span::styled(
        "< prev ",
        if p.prev_enabled {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        },
    )];
    for page in &p.links {
        let style = if *page == p.current {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!(" {page} "), style));
    }
    spans.push(Span::styled(
        " next >",
        if p.next_enabled {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        },
    ));
    spans.push(Span::raw(format!("   page {}/{}", p.current, p.total)));
    f.render_widget(Paragraph::new(Line::from(spans)), parts[1]);
}

/// Renders `label: value` rows and places the cursor on the focused one.
fn draw_fields(
    f: &mut Frame,
    area: Rect,
    block: Block,
    fields: &[(&str, String, bool, bool)],
    footer: Option<Line>,
) {
    let inner = block.inner(area);
    let label_width = fields
        .iter()
        .map(|(label, ..)| label.width())
        .max()
        .unwrap_or(0)
        + 2;
    let mut lines: Vec<Line> = fields
        .iter()
        .map(|(label, value, focused, _)| {
            Line::from(vec![
                Span::styled(
                    format!("{:<width$}", format!("{label}:"), width = label_width),
                    focus_style(*focused),
                ),
                Span::raw(value.clone()),
            ])
        })
        .collect();
    lines.extend(footer);
    f.render_widget(Paragraph::new(lines).block(block), area);

    if let Some((row, (_, value, _, _))) = fields
        .iter()
        .enumerate()
        .find(|(_, (_, _, focused, text))| *focused && *text)
    {
        let x = inner.x + (label_width + value.width()) as u16;
        let y = inner.y + row as u16;
        if x < inner.right() && y < inner.bottom() {
            f.set_cursor_position((x, y));
        }
    }
}

fn draw_form(f: &mut Frame, state: &UiState, area: Rect, view: &ViewModel) {
    let focused = match state.focus {
        Focus::Form(field) => Some(field),
        _ => None,
    };
    let title = match view.editing {
        Some(id) => format!("Edit bet #{id}"),
        None => "New bet".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(focus_style(focused.is_some()));
    let form = &state.form;
    let fields: Vec<(&str, String, bool, bool)> = FormField::ALL
        .iter()
        .map(|field| {
            let value = match field {
                FormField::Date => form.date.clone(),
                FormField::Event => form.event.clone(),
                FormField::Coefficient => form.coefficient.clone(),
                FormField::Stake => form.stake.clone(),
                FormField::Source => form.source.clone(),
                FormField::Result => format!(
                    "< {} >",
                    form.result.map(BetResult::label).unwrap_or("-")
                ),
            };
            let is_text = *field != FormField::Result;
            (field.label(), value, focused == Some(*field), is_text)
        })
        .collect();
    let footer = match &view.form_error {
        Some(err) => Line::styled(err.clone(), Style::default().fg(Color::Red)),
        None => Line::styled(
            format!("[Enter] {}", view.submit_label),
            Style::default().fg(Color::DarkGray),
        ),
    };
    draw_fields(f, area, block, &fields, Some(footer));
}

fn draw_filters(f: &mut Frame, state: &UiState, area: Rect, view: &ViewModel) {
    let focused = match state.focus {
        Focus::Filters(field) => Some(field),
        _ => None,
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Filters")
        .border_style(focus_style(focused.is_some()));
    let fields: Vec<(&str, String, bool, bool)> = FilterField::ALL
        .iter()
        .map(|field| {
            let (value, is_text) = match field {
                FilterField::Month => (option_label(&view.month_options, state.month_idx), false),
                FilterField::Source => {
                    (option_label(&view.source_options, state.source_idx), false)
                }
                FilterField::MinCoefficient => (state.coefficient.min.clone(), true),
                FilterField::MaxCoefficient => (state.coefficient.max.clone(), true),
            };
            (field.label(), value, focused == Some(*field), is_text)
        })
        .collect();
    let footer = view
        .filter_error
        .as_ref()
        .map(|err| Line::styled(err.clone(), Style::default().fg(Color::Red)));
    draw_fields(f, area, block, &fields, footer);
}

fn option_label<T>(options: &[DropdownOption<T>], idx: usize) -> String {
    options
        .get(idx)
        .map(|o| format!("< {} >", o.label))
        .unwrap_or_default()
}

fn draw_chart(f: &mut Frame, area: Rect, view: &ViewModel) {
    let text = match view.chart {
        ChartSlot::Hidden => "No chart".to_string(),
        ChartSlot::Image { size } => {
            format!("Profit chart ready ({size} bytes)\n[g] save as PNG")
        }
    };
    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Chart"));
    f.render_widget(widget, area);
}

fn draw_status(f: &mut Frame, state: &UiState, area: Rect, view: &ViewModel) {
    let (text, color) = match &state.status {
        Some(n) => (
            n.text.clone(),
            match n.level {
                NoticeLevel::Info => Color::Green,
                NoticeLevel::Error => Color::Red,
            },
        ),
        None if view.loading => ("Loading...".to_string(), Color::Gray),
        None => ("Ready".to_string(), Color::Gray),
    };
    let widget = Paragraph::new(text)
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(widget, area);
}

fn draw_help(f: &mut Frame, state: &UiState, area: Rect) {
    let text = match state.focus {
        Focus::Table => {
            "←/→ page | 1-5 page link | ↑/↓ select | e edit | d delete | a add | f filters | r reset | x export | i import | g save chart | q quit"
        }
        Focus::Form(_) => "Tab/↑/↓ field | ←/→ result | Enter submit | Esc back",
        Focus::Filters(_) => "Tab/↑/↓ field | ←/→ choose | Enter apply | Esc discard",
    };
    let help = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn draw_modals(f: &mut Frame, state: &UiState) {
    let (title, body, color) = match &state.mode {
        Mode::Normal => return,
        Mode::Confirm(prompt) => (
            "Confirm",
            format!("{prompt}\n\ny/Enter=yes  n/Esc=no"),
            Color::Yellow,
        ),
        Mode::Notice(notice) => ("Error", format!("{}\n\nEnter=close", notice.text), Color::Red),
        Mode::ImportPrompt(path) => (
            "Import bets",
            format!("File path: {path}\n\nEnter=import  Esc=cancel"),
            Color::Cyan,
        ),
    };
    let area = centered_rect(50, 30, f.area());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(color));
    let p = Paragraph::new(body).wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(block.clone(), area);
    f.render_widget(p, block.inner(area));
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}
