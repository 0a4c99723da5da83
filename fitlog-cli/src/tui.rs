use anyhow::Result;
use crossterm::event::{self, KeyCode};
use fitlog::dates::{local_date, parse_date};
use fitlog::db::models::SetEntry;
use fitlog::session::{DaySummary, ExerciseDraft, HistoryMirror, Session};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

const DAYS_HELP: &str = "j/k: navigate | enter: open | t: today | g: go to date | d: delete day | q: quit";
const WORKOUT_HELP: &str = "j/k: navigate | e: enter values | c: complete | q: back";

fn selected_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn draw_frame(frame: &mut Frame, title: &str, status: &str) -> Rect {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(1),
        Constraint::Length(3),
    ])
    .split(frame.area());

    let header = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    let footer = Paragraph::new(status)
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(footer, chunks[2]);

    chunks[1]
}

fn draw_input(frame: &mut Frame, area: Rect, title: &str, buffer: &str) {
    let input = Paragraph::new(buffer)
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(input, area);
}

enum InputMode {
    Normal,
    Editing,
}

struct DaySelector<'a> {
    session: &'a Session,
    days: Vec<DaySummary>,
    selected: usize,
    status_message: String,
    input_mode: InputMode,
    input_buffer: String,
}

impl<'a> DaySelector<'a> {
    async fn new(session: &'a Session) -> Result<Self> {
        let mut selector = Self {
            session,
            days: Vec::new(),
            selected: 0,
            status_message: DAYS_HELP.to_string(),
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
        };
        selector.refresh().await?;
        Ok(selector)
    }

    async fn refresh(&mut self) -> Result<()> {
        let total = self.session.workout_history_count().await?;
        self.days = self.session.workout_history(total, 0).await?;
        if self.selected >= self.days.len() {
            self.selected = self.days.len().saturating_sub(1);
        }
        Ok(())
    }

    fn scroll_down(&mut self) {
        if self.selected + 1 < self.days.len() {
            self.selected += 1;
        }
    }

    fn scroll_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn selected_date(&self) -> Option<String> {
        self.days.get(self.selected).map(|d| d.date.clone())
    }

    async fn delete_selected(&mut self) -> Result<()> {
        let Some(date) = self.selected_date() else {
            return Ok(());
        };
        let removed = self.session.delete_history_by_date(&date).await?;
        self.status_message = format!("Deleted {} records from {}", removed, date);
        self.refresh().await
    }

    fn draw(&self, frame: &mut Frame) {
        let area = draw_frame(frame, "Fitlog - Logged Days", &self.status_message);
        if let InputMode::Editing = self.input_mode {
            draw_input(frame, area, "Go to date (YYYY-MM-DD)", &self.input_buffer);
            return;
        }
        if self.days.is_empty() {
            let empty = Paragraph::new("Nothing logged yet.\nPress 't' to start today's workout!")
                .style(Style::default().fg(Color::Gray))
                .block(Block::default().borders(Borders::ALL).title("Days"));
            frame.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = self
            .days
            .iter()
            .enumerate()
            .map(|(idx, day)| {
                let content = format!(
                    "{}  {} exercises, {} sets  ({})",
                    day.date,
                    day.exercise_count,
                    day.total_sets,
                    day.exercises.join(", ")
                );
                let style = if idx == self.selected {
                    selected_style()
                } else {
                    Style::default()
                };
                ListItem::new(content).style(style)
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Days ({} total)", self.days.len())),
        );
        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

/// Pick a day to open. `None` means quit.
async fn run_day_selector(terminal: &mut DefaultTerminal, session: &Session) -> Result<Option<String>> {
    let mut selector = DaySelector::new(session).await?;

    loop {
        terminal.draw(|frame| selector.draw(frame))?;

        if let event::Event::Key(key) = event::read()? {
            match selector.input_mode {
                InputMode::Normal => match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(None),
                    KeyCode::Char('j') | KeyCode::Down => selector.scroll_down(),
                    KeyCode::Char('k') | KeyCode::Up => selector.scroll_up(),
                    KeyCode::Char('t') | KeyCode::Char('T') => return Ok(Some(local_date())),
                    KeyCode::Char('g') | KeyCode::Char('G') => {
                        selector.input_mode = InputMode::Editing;
                        selector.input_buffer.clear();
                        selector.status_message = "Enter: open | Esc: cancel".to_string();
                    }
                    KeyCode::Char('d') | KeyCode::Char('D') => {
                        if let Err(e) = selector.delete_selected().await {
                            selector.status_message = format!("Delete failed: {:#}", e);
                        }
                    }
                    KeyCode::Enter | KeyCode::Char('r') => {
                        if let Some(date) = selector.selected_date() {
                            return Ok(Some(date));
                        }
                    }
                    _ => {}
                },
                InputMode::Editing => match key.code {
                    KeyCode::Enter => {
                        let date = selector.input_buffer.trim().to_string();
                        if parse_date(&date).is_ok() {
                            return Ok(Some(date));
                        }
                        selector.status_message = format!("Not a date: {}", date);
                        selector.input_mode = InputMode::Normal;
                    }
                    KeyCode::Esc => {
                        selector.input_mode = InputMode::Normal;
                        selector.status_message = DAYS_HELP.to_string();
                    }
                    KeyCode::Char(c) => selector.input_buffer.push(c),
                    KeyCode::Backspace => {
                        selector.input_buffer.pop();
                    }
                    _ => {}
                },
            }
        }
    }
}

struct WorkoutDay<'a> {
    session: &'a Session,
    date: String,
    cards: Vec<ExerciseDraft>,
    selected: usize,
    status_message: String,
    input_mode: InputMode,
    input_buffer: String,
}

fn describe(card: &ExerciseDraft) -> String {
    let draft = &card.draft;
    let weight = draft
        .weight
        .map(|w| format!("{:.1}kg", w))
        .unwrap_or_else(|| "-".to_string());
    let reps = draft.reps.map(|r| r.to_string()).unwrap_or_else(|| "-".into());
    let sets = draft.sets.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
    let done = if card.link.as_ref().is_some_and(|l| l.is_completed) {
        " [done]"
    } else {
        ""
    };
    let muscle = card
        .exercise
        .muscle_group
        .as_deref()
        .map(|m| format!(" ({})", m))
        .unwrap_or_default();
    format!(
        "{}{}: {} x {} reps x {} sets{}",
        card.exercise.name, muscle, weight, reps, sets, done
    )
}

impl<'a> WorkoutDay<'a> {
    async fn new(session: &'a Session, date: String) -> Result<Self> {
        let mut day = Self {
            session,
            date,
            cards: Vec::new(),
            selected: 0,
            status_message: WORKOUT_HELP.to_string(),
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
        };
        day.refresh().await?;
        Ok(day)
    }

    async fn refresh(&mut self) -> Result<()> {
        self.cards = self.session.drafts_for_day(&self.date).await?;
        if self.selected >= self.cards.len() {
            self.selected = self.cards.len().saturating_sub(1);
        }
        Ok(())
    }

    fn scroll_down(&mut self) {
        if self.selected + 1 < self.cards.len() {
            self.selected += 1;
        }
    }

    fn scroll_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    async fn save(&mut self, entry: SetEntry) -> Result<()> {
        let Some(card) = self.cards.get(self.selected) else {
            return Ok(());
        };
        let name = card.exercise.name.clone();
        let link_id = self.session.ensure_link(card.exercise.id, &self.date).await?;
        let outcome = self.session.save_set(link_id, &entry).await?;
        self.status_message = match outcome.history {
            HistoryMirror::Skipped => format!("Saved draft for {}", name),
            HistoryMirror::Archived { .. } => format!("Completed {}", name),
            HistoryMirror::Failed(e) => format!("Saved {} but not archived: {}", name, e),
        };
        self.refresh().await
    }

    /// Values typed as "weight reps sets [notes...]".
    async fn save_typed(&mut self) -> Result<()> {
        let input = std::mem::take(&mut self.input_buffer);
        let mut parts = input.split_whitespace();
        let weight = parts.next().unwrap_or_default();
        let reps = parts.next().unwrap_or_default();
        let sets = parts.next().unwrap_or_default();
        let notes: Vec<&str> = parts.collect();
        let completed = self
            .cards
            .get(self.selected)
            .and_then(|c| c.link.as_ref())
            .is_some_and(|l| l.is_completed);
        let notes = (!notes.is_empty()).then(|| notes.join(" "));
        self.save(SetEntry::from_text(weight, reps, sets, notes, completed))
            .await
    }

    /// Complete the selected exercise with the values on screen.
    async fn complete_selected(&mut self) -> Result<()> {
        let Some(card) = self.cards.get(self.selected) else {
            return Ok(());
        };
        let draft = &card.draft;
        let entry = SetEntry {
            weight: draft.weight.unwrap_or(0.0),
            reps: draft.reps.unwrap_or(0),
            set_count: draft.sets.unwrap_or(0),
            notes: Some(draft.notes.clone()),
            completed: true,
        };
        self.save(entry).await
    }

    fn draw(&self, frame: &mut Frame) {
        let title = format!("Workout {}", self.date);
        let area = draw_frame(frame, &title, &self.status_message);
        if let InputMode::Editing = self.input_mode {
            draw_input(frame, area, "weight reps sets [notes]", &self.input_buffer);
            return;
        }
        if self.cards.is_empty() {
            let empty = Paragraph::new("The exercise library is empty.\nRun `fitlog seed` first.")
                .style(Style::default().fg(Color::Gray))
                .block(Block::default().borders(Borders::ALL).title("Exercises"));
            frame.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = self
            .cards
            .iter()
            .enumerate()
            .map(|(idx, card)| {
                let style = if idx == self.selected {
                    selected_style()
                } else if card.link.is_none() {
                    // Values shown are suggestions only.
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                ListItem::new(describe(card)).style(style)
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Exercises ({} total)", self.cards.len())),
        );
        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

async fn run_workout_day(terminal: &mut DefaultTerminal, session: &Session, date: String) -> Result<()> {
    let mut day = WorkoutDay::new(session, date).await?;

    loop {
        terminal.draw(|frame| day.draw(frame))?;

        if let event::Event::Key(key) = event::read()? {
            match day.input_mode {
                InputMode::Normal => match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('j') | KeyCode::Down => day.scroll_down(),
                    KeyCode::Char('k') | KeyCode::Up => day.scroll_up(),
                    KeyCode::Char('e') | KeyCode::Char('E') => {
                        day.input_mode = InputMode::Editing;
                        day.input_buffer.clear();
                        day.status_message = "Enter: save | Esc: cancel".to_string();
                    }
                    KeyCode::Char('c') | KeyCode::Char('C') => {
                        if let Err(e) = day.complete_selected().await {
                            day.status_message = format!("Save failed: {:#}", e);
                        }
                    }
                    _ => {}
                },
                InputMode::Editing => match key.code {
                    KeyCode::Enter => {
                        day.input_mode = InputMode::Normal;
                        if let Err(e) = day.save_typed().await {
                            day.status_message = format!("Save failed: {:#}", e);
                        }
                    }
                    KeyCode::Esc => {
                        day.input_mode = InputMode::Normal;
                        day.input_buffer.clear();
                        day.status_message = WORKOUT_HELP.to_string();
                    }
                    KeyCode::Char(c) => day.input_buffer.push(c),
                    KeyCode::Backspace => {
                        day.input_buffer.pop();
                    }
                    _ => {}
                },
            }
        }
    }
}

/// Browse logged days and record workouts until the user quits.
pub async fn run(session: &Session) -> Result<()> {
    let mut terminal = ratatui::init();
    let result = async {
        while let Some(date) = run_day_selector(&mut terminal, session).await? {
            run_workout_day(&mut terminal, session, date).await?;
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;
    ratatui::restore();
    result
}
