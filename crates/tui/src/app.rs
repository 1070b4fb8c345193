use std::{cmp, io, path::PathBuf, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gameshelf_core::{
    export::export_to_path,
    filter::GameFilter,
    import::{
        read_csv_file, ImportError, ImportState, Importer, ParseTicket, ParsedCsv, FIELD_CATALOG,
    },
    library::{Action, Library},
    models::{Game, GameStatus},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::forms::{EditorField, RecordEditor, TextInput};

const TICK_RATE: Duration = Duration::from_millis(250);
const DEFAULT_EXPORT_PATH: &str = "gameshelf-export.csv";

#[derive(Debug, Clone)]
struct Theme {
    primary_bg: Color,
    primary_fg: Color,
    accent: Color,
    accent_alt: Color,
    muted: Color,
    selection_bg: Color,
    selection_fg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Theme {
    fn dark() -> Self {
        Self {
            primary_bg: Color::Black,
            primary_fg: Color::White,
            accent: Color::Cyan,
            accent_alt: Color::Blue,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            selection_fg: Color::White,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }

    fn light() -> Self {
        Self {
            primary_bg: Color::White,
            primary_fg: Color::Black,
            accent: Color::Blue,
            accent_alt: Color::Magenta,
            muted: Color::Gray,
            selection_bg: Color::Rgb(220, 220, 235),
            selection_fg: Color::Black,
            success: Color::Rgb(0, 128, 0),
            warning: Color::Rgb(170, 110, 0),
            danger: Color::Rgb(190, 0, 0),
        }
    }

    fn for_mode(dark: bool) -> Self {
        if dark {
            Self::dark()
        } else {
            Self::light()
        }
    }

    fn status_color(&self, status: GameStatus) -> Color {
        match status {
            GameStatus::Finished => self.success,
            GameStatus::Backlog => self.accent_alt,
            GameStatus::Replay => self.accent,
            GameStatus::Abandoned => self.danger,
            GameStatus::Suspended => self.warning,
            GameStatus::Wishlist => self.muted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PromptPurpose {
    ImportPath,
    ExportPath,
    NewTag,
    RenameTag(String),
}

impl PromptPurpose {
    fn title(&self) -> String {
        match self {
            PromptPurpose::ImportPath => "Import CSV".to_string(),
            PromptPurpose::ExportPath => "Export CSV".to_string(),
            PromptPurpose::NewTag => "New Tag".to_string(),
            PromptPurpose::RenameTag(from) => format!("Rename \"{from}\""),
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            PromptPurpose::ImportPath => "Path of the CSV file to import",
            PromptPurpose::ExportPath => "Write the collection to",
            PromptPurpose::NewTag => "Tag name",
            PromptPurpose::RenameTag(_) => "New tag name",
        }
    }
}

#[derive(Debug, Clone)]
struct PromptModal {
    purpose: PromptPurpose,
    input: TextInput,
}

#[derive(Debug, Clone)]
enum Modal {
    Prompt(PromptModal),
    Editor(RecordEditor),
    ConfirmDelete { id: u64, title: String },
    Tags,
    Import,
}

enum AppEvent {
    Input(Event),
    Tick,
    CsvParsed(ParseTicket, Result<ParsedCsv, ImportError>),
}

/// Terminal front end over an in-memory [`Library`].
pub struct GameshelfApp {
    library: Library,
    importer: Importer,
    filter: GameFilter,
    state: UiState,
    modal: Option<Modal>,
    dark_mode: bool,
    theme: Theme,
    last_import_path: String,
    event_tx: Option<mpsc::Sender<AppEvent>>,
}

impl GameshelfApp {
    pub fn new(library: Library, importer: Importer, dark_mode: bool) -> Self {
        Self {
            library,
            importer,
            filter: GameFilter::default(),
            state: UiState::default(),
            modal: None,
            dark_mode,
            theme: Theme::for_mode(dark_mode),
            last_import_path: String::new(),
            event_tx: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.refresh();
        self.state.set_status(format!(
            "{} games, {} tags",
            self.library.games().len(),
            self.library.tags().len()
        ));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) || self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        info!(games = self.library.games().len(), "Session closed");
        Ok(())
    }

    fn refresh(&mut self) {
        let visible = self
            .filter
            .apply(self.library.games())
            .into_iter()
            .map(|game| game.id)
            .collect();
        self.state.set_visible(visible);
    }

    /// Run `action` against the library, keeping the old state on error.
    fn commit(&mut self, action: Action) -> Result<()> {
        self.library = self.library.apply(action)?;
        self.refresh();
        Ok(())
    }

    fn current_game(&self) -> Option<&Game> {
        self.state.current_id().and_then(|id| self.library.game(id))
    }

    fn handle_tick(&mut self) {
        if self.state.mode == Mode::Search {
            self.state
                .set_status(format!("Search: {}", self.filter.query));
        }
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) => {
                let result = if self.modal.is_some() {
                    self.handle_modal_key(key)
                } else {
                    self.handle_key(key)
                };
                if let Err(err) = result {
                    self.state.set_status(format!("Error: {err}"));
                }
                true
            }
            Some(AppEvent::Input(_)) => true,
            Some(AppEvent::Tick) => {
                self.handle_tick();
                true
            }
            Some(AppEvent::CsvParsed(ticket, result)) => {
                if !self.importer.resolve(ticket, result) {
                    debug!("Ignored parse result for a superseded import");
                    return true;
                }
                match self.importer.state() {
                    ImportState::Ready(prepared) => {
                        let problems = prepared.errors().len();
                        self.state.set_status(format!(
                            "Parsed {} rows from {}{}",
                            prepared.parsed.rows.len(),
                            prepared.source.display(),
                            if problems == 0 {
                                String::new()
                            } else {
                                format!(" ({problems} mapping issues)")
                            }
                        ));
                    }
                    ImportState::Failed(errors) => {
                        self.state
                            .set_status(format!("Import failed: {}", errors.join("; ")));
                    }
                    _ => {}
                }
                true
            }
            None => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.state.mode {
            Mode::Search => self.handle_search_key(key),
            Mode::Browse => self.handle_browse_key(key),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.state.mode = Mode::Browse;
                self.state.set_status("Search cancelled".to_string());
            }
            KeyCode::Enter => {
                self.state.mode = Mode::Browse;
                self.state.set_status(format!(
                    "{} of {} games match",
                    self.state.visible.len(),
                    self.library.games().len()
                ));
            }
            KeyCode::Backspace => {
                self.filter.query.pop();
                self.refresh();
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.filter.query.push(c);
                    self.refresh();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Result<()> {
        if !(key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT) {
            return Ok(());
        }
        match key.code {
            KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_cursor(-1),
            KeyCode::Char('g') | KeyCode::Home => self.state.move_to(0),
            KeyCode::Char('G') | KeyCode::End => self.state.move_to_end(),
            KeyCode::PageDown => self.state.page_down(),
            KeyCode::PageUp => self.state.page_up(),
            KeyCode::Char('/') => {
                self.state.mode = Mode::Search;
                self.state.set_status("Type to search titles".to_string());
            }
            KeyCode::Char('s') => {
                self.filter.cycle_status();
                self.refresh();
                let label = self.filter.status.map_or("All", GameStatus::label);
                self.state.set_status(format!("Status filter: {label}"));
            }
            KeyCode::Char('t') => {
                let tags = self.library.tags().sorted();
                self.filter.cycle_tag(&tags);
                self.refresh();
                let label = self.filter.tag.clone().unwrap_or_else(|| "All".to_string());
                self.state.set_status(format!("Tag filter: {label}"));
            }
            KeyCode::Char('c') => {
                self.filter.clear();
                self.refresh();
                self.state.set_status("Filters cleared".to_string());
            }
            KeyCode::Char('a') => self.modal = Some(Modal::Editor(RecordEditor::blank())),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(game) = self.current_game() {
                    self.modal = Some(Modal::Editor(RecordEditor::for_game(game)));
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(game) = self.current_game() {
                    self.modal = Some(Modal::ConfirmDelete {
                        id: game.id,
                        title: game.title.clone(),
                    });
                }
            }
            KeyCode::Char('m') => {
                self.state.tag_cursor = 0;
                self.modal = Some(Modal::Tags);
            }
            KeyCode::Char('i') => {
                if self.importer.is_parsing() {
                    self.modal = Some(Modal::Import);
                } else {
                    self.open_prompt(PromptPurpose::ImportPath, self.last_import_path.clone());
                }
            }
            KeyCode::Char('o') => {
                self.open_prompt(PromptPurpose::ExportPath, DEFAULT_EXPORT_PATH.to_string())
            }
            KeyCode::Char('d') => {
                self.dark_mode = !self.dark_mode;
                self.theme = Theme::for_mode(self.dark_mode);
                let label = if self.dark_mode { "Dark" } else { "Light" };
                self.state.set_status(format!("{label} palette"));
            }
            _ => {}
        }
        Ok(())
    }

    fn open_prompt(&mut self, purpose: PromptPurpose, initial: String) {
        self.modal = Some(Modal::Prompt(PromptModal {
            purpose,
            input: TextInput::new(initial),
        }));
    }

    fn handle_modal_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(modal) = self.modal.take() else {
            return Ok(());
        };
        self.modal = match modal {
            Modal::Prompt(prompt) => self.handle_prompt_key(prompt, key)?,
            Modal::Editor(editor) => self.handle_editor_key(editor, key)?,
            Modal::ConfirmDelete { id, title } => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.commit(Action::DeleteGame(id))?;
                    self.state.set_status(format!("Deleted {title}"));
                    None
                }
                KeyCode::Char('n') | KeyCode::Esc => None,
                _ => Some(Modal::ConfirmDelete { id, title }),
            },
            Modal::Tags => self.handle_tags_key(key)?,
            Modal::Import => self.handle_import_key(key)?,
        };
        Ok(())
    }

    fn handle_prompt_key(&mut self, mut prompt: PromptModal, key: KeyEvent) -> Result<Option<Modal>> {
        let back = |purpose: &PromptPurpose| match purpose {
            PromptPurpose::NewTag | PromptPurpose::RenameTag(_) => Some(Modal::Tags),
            PromptPurpose::ImportPath | PromptPurpose::ExportPath => None,
        };
        match key.code {
            KeyCode::Esc => return Ok(back(&prompt.purpose)),
            KeyCode::Enter => {
                let value = prompt.input.trimmed().to_string();
                return match self.submit_prompt(&prompt.purpose, value) {
                    Ok(next) => Ok(next.or_else(|| back(&prompt.purpose))),
                    Err(err) => {
                        self.state.set_status(err.to_string());
                        Ok(Some(Modal::Prompt(prompt)))
                    }
                };
            }
            KeyCode::Left => prompt.input.move_cursor(-1),
            KeyCode::Right => prompt.input.move_cursor(1),
            KeyCode::Home => prompt.input.move_home(),
            KeyCode::End => prompt.input.move_end(),
            KeyCode::Backspace => prompt.input.backspace(),
            KeyCode::Delete => prompt.input.delete(),
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    prompt.input.insert(ch);
                }
            }
            _ => {}
        }
        Ok(Some(Modal::Prompt(prompt)))
    }

    fn submit_prompt(&mut self, purpose: &PromptPurpose, value: String) -> Result<Option<Modal>> {
        match purpose {
            PromptPurpose::ImportPath => {
                if value.is_empty() {
                    anyhow::bail!("Enter a file path");
                }
                self.last_import_path = value.clone();
                self.start_import(PathBuf::from(value));
                Ok(Some(Modal::Import))
            }
            PromptPurpose::ExportPath => {
                let path = if value.is_empty() {
                    PathBuf::from(DEFAULT_EXPORT_PATH)
                } else {
                    PathBuf::from(value)
                };
                export_to_path(self.library.games(), &path)?;
                self.state.set_status(format!(
                    "Exported {} games to {}",
                    self.library.games().len(),
                    path.display()
                ));
                Ok(None)
            }
            PromptPurpose::NewTag => {
                self.commit(Action::AddTag(value.clone()))?;
                self.state.set_status(format!("Added tag {}", value.trim()));
                Ok(None)
            }
            PromptPurpose::RenameTag(from) => {
                self.commit(Action::RenameTag {
                    from: from.clone(),
                    to: value.clone(),
                })?;
                if self.filter.tag.as_deref() == Some(from.as_str()) {
                    self.filter.tag = Some(value.clone());
                    self.refresh();
                }
                self.state.set_status(format!("Renamed {from} to {value}"));
                Ok(None)
            }
        }
    }

    fn start_import(&mut self, path: PathBuf) {
        let ticket = self.importer.begin(&path);
        self.state
            .set_status(format!("Reading {}...", path.display()));
        let Some(tx) = self.event_tx.clone() else {
            warn!("Import requested without an event channel");
            return;
        };
        tokio::spawn(async move {
            let result = read_csv_file(&path).await;
            if tx.send(AppEvent::CsvParsed(ticket, result)).await.is_err() {
                debug!("Event loop closed before the parse finished");
            }
        });
    }

    fn handle_import_key(&mut self, key: KeyEvent) -> Result<Option<Modal>> {
        let fields = FIELD_CATALOG.len();
        match key.code {
            KeyCode::Esc => {
                self.importer.reset();
                self.state.set_status("Import cancelled".to_string());
                return Ok(None);
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.import_cursor = (self.state.import_cursor + 1) % fields;
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.import_cursor = (self.state.import_cursor + fields - 1) % fields;
            }
            KeyCode::Char('l') | KeyCode::Right => {
                self.importer
                    .cycle_mapping(FIELD_CATALOG[self.state.import_cursor], true);
            }
            KeyCode::Char('h') | KeyCode::Left => {
                self.importer
                    .cycle_mapping(FIELD_CATALOG[self.state.import_cursor], false);
            }
            KeyCode::Backspace | KeyCode::Delete => {
                self.importer
                    .clear_mapping(FIELD_CATALOG[self.state.import_cursor]);
            }
            KeyCode::Char('i') if matches!(self.importer.state(), ImportState::Failed(_)) => {
                self.open_prompt(PromptPurpose::ImportPath, self.last_import_path.clone());
                return Ok(self.modal.take());
            }
            KeyCode::Enter => return self.confirm_import(),
            _ => {}
        }
        Ok(Some(Modal::Import))
    }

    fn confirm_import(&mut self) -> Result<Option<Modal>> {
        match self.importer.confirm(self.library.next_id()) {
            Ok(games) => {
                let count = games.len();
                if let Err(err) = self.commit(Action::ImportGames(games)) {
                    error!(%err, "Import could not be merged");
                    return Err(err);
                }
                self.state.import_cursor = 0;
                self.state.set_status(format!("Imported {count} games"));
                Ok(None)
            }
            Err(ImportError::NotReady) => {
                self.state
                    .set_status("Nothing to import yet".to_string());
                Ok(Some(Modal::Import))
            }
            Err(err) => {
                self.state.set_status(format!("Cannot import: {err}"));
                Ok(Some(Modal::Import))
            }
        }
    }

    fn handle_tags_key(&mut self, key: KeyEvent) -> Result<Option<Modal>> {
        let tags = self.library.tags().sorted();
        let selected = tags.get(self.state.tag_cursor).cloned();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Ok(None),
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.tag_cursor = cmp::min(
                    self.state.tag_cursor + 1,
                    tags.len().saturating_sub(1),
                );
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.tag_cursor = self.state.tag_cursor.saturating_sub(1);
            }
            KeyCode::Char('a') => {
                self.open_prompt(PromptPurpose::NewTag, String::new());
                return Ok(self.modal.take());
            }
            KeyCode::Char('r') | KeyCode::Enter => {
                if let Some(tag) = selected {
                    self.open_prompt(PromptPurpose::RenameTag(tag.clone()), tag);
                    return Ok(self.modal.take());
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(tag) = selected {
                    self.commit(Action::DeleteTag(tag.clone()))?;
                    if self.filter.tag.as_deref() == Some(tag.as_str()) {
                        self.filter.tag = None;
                        self.refresh();
                    }
                    self.state.tag_cursor = self
                        .state
                        .tag_cursor
                        .min(self.library.tags().len().saturating_sub(1));
                    self.state.set_status(format!("Deleted tag {tag}"));
                }
            }
            _ => {}
        }
        Ok(Some(Modal::Tags))
    }

    fn handle_editor_key(&mut self, mut editor: RecordEditor, key: KeyEvent) -> Result<Option<Modal>> {
        match key.code {
            KeyCode::Esc => {
                self.state.set_status("Edit cancelled".to_string());
                return Ok(None);
            }
            KeyCode::Enter => {
                let saved = editor.to_action().and_then(|action| self.commit(action));
                return match saved {
                    Ok(()) => {
                        let id = editor.id().unwrap_or_else(|| self.library.next_id() - 1);
                        self.state.select_id(id);
                        self.state.set_status(if editor.id().is_some() {
                            "Game updated".to_string()
                        } else {
                            "Game added".to_string()
                        });
                        Ok(None)
                    }
                    Err(err) => {
                        self.state.set_status(err.to_string());
                        Ok(Some(Modal::Editor(editor)))
                    }
                };
            }
            KeyCode::Tab | KeyCode::Down => editor.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => editor.move_focus(-1),
            _ if editor.focused() == EditorField::Status => match key.code {
                KeyCode::Right | KeyCode::Char(' ') | KeyCode::Char('l') => {
                    editor.cycle_status(true)
                }
                KeyCode::Left | KeyCode::Char('h') => editor.cycle_status(false),
                _ => {}
            },
            _ => {
                if let Some(input) = editor.focused_input_mut() {
                    match key.code {
                        KeyCode::Left => input.move_cursor(-1),
                        KeyCode::Right => input.move_cursor(1),
                        KeyCode::Home => input.move_home(),
                        KeyCode::End => input.move_end(),
                        KeyCode::Backspace => input.backspace(),
                        KeyCode::Delete => input.delete(),
                        KeyCode::Char(ch)
                            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
                        {
                            input.insert(ch)
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(Some(Modal::Editor(editor)))
    }

    fn draw(&mut self, frame: &mut Frame) {
        let size = frame.size();
        frame.render_widget(
            Block::default().style(
                Style::default()
                    .bg(self.theme.primary_bg)
                    .fg(self.theme.primary_fg),
            ),
            size,
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(size);
        let body_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[1]);

        self.render_filter_bar(frame, chunks[0]);
        self.render_game_list(frame, body_chunks[0]);
        self.render_game_info(frame, body_chunks[1]);
        self.render_status(frame, chunks[2]);

        match &self.modal {
            Some(Modal::Prompt(prompt)) => self.render_prompt(frame, prompt),
            Some(Modal::Editor(editor)) => self.render_editor(frame, editor),
            Some(Modal::ConfirmDelete { title, .. }) => self.render_confirm(frame, title),
            Some(Modal::Tags) => self.render_tags(frame),
            Some(Modal::Import) => self.render_import(frame),
            None => {}
        }
    }

    fn render_filter_bar(&self, frame: &mut Frame, area: Rect) {
        let label = |text: &'static str| {
            Span::styled(text, Style::default().add_modifier(Modifier::BOLD))
        };
        let active = Style::default().fg(self.theme.accent);
        let idle = Style::default().fg(self.theme.muted);
        let query_style = if self.state.mode == Mode::Search {
            active.add_modifier(Modifier::UNDERLINED)
        } else if self.filter.query.is_empty() {
            idle
        } else {
            active
        };
        let line = Line::from(vec![
            label("Search: "),
            Span::styled(
                if self.filter.query.is_empty() && self.state.mode != Mode::Search {
                    "-".to_string()
                } else {
                    self.filter.query.clone()
                },
                query_style,
            ),
            Span::raw("   "),
            label("Status: "),
            Span::styled(
                self.filter.status.map_or("All", GameStatus::label),
                if self.filter.status.is_some() { active } else { idle },
            ),
            Span::raw("   "),
            label("Tag: "),
            Span::styled(
                self.filter.tag.clone().unwrap_or_else(|| "All".to_string()),
                if self.filter.tag.is_some() { active } else { idle },
            ),
        ]);
        let paragraph =
            Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Filters"));
        frame.render_widget(paragraph, area);
    }

    fn render_game_list(&mut self, frame: &mut Frame, area: Rect) {
        self.state.list_height = area.height.saturating_sub(2) as usize;
        self.state.clamp_cursor();
        self.state.ensure_cursor_visible();

        let mut list_state = ListState::default();
        let ids = self.state.visible_ids(self.state.list_height);
        if !ids.is_empty() {
            let selected = self
                .state
                .cursor
                .saturating_sub(self.state.offset)
                .min(ids.len().saturating_sub(1));
            list_state.select(Some(selected));
        }
        let items: Vec<ListItem> = ids
            .iter()
            .enumerate()
            .filter_map(|(idx, id)| self.library.game(*id).map(|game| (idx, game)))
            .map(|(idx, game)| {
                let is_selected = self.state.cursor == self.state.offset + idx;
                let marker = if is_selected {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let mut line = vec![
                    marker,
                    Span::styled(
                        game.title.clone(),
                        Style::default()
                            .fg(self.theme.primary_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                ];
                if let Some(platform) = game.platform.as_deref() {
                    line.push(Span::styled(
                        format!(" · {platform}"),
                        Style::default().fg(self.theme.muted),
                    ));
                }
                let status = game.status.kind();
                line.push(Span::styled(
                    format!("  [{}]", status.label()),
                    Style::default().fg(self.theme.status_color(status)),
                ));
                ListItem::new(Line::from(line))
            })
            .collect();

        let title = if self.filter.is_active() {
            format!("Games ({}/{})", self.state.visible.len(), self.library.games().len())
        } else {
            format!("Games ({})", self.library.games().len())
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .bg(self.theme.selection_bg)
                    .fg(self.theme.selection_fg),
            );
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_game_info(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Game Details");
        let Some(game) = self.current_game() else {
            let message = if self.library.games().is_empty() {
                "No games yet. Press a to add one or i to import a CSV."
            } else {
                "No games match the current filters"
            };
            frame.render_widget(Paragraph::new(message).block(block), area);
            return;
        };

        let muted = Style::default().fg(self.theme.muted);
        let status = game.status.kind();
        let mut lines = vec![Line::from(Span::styled(
            game.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        if let Some(platform) = &game.platform {
            lines.push(Line::from(Span::styled(platform.clone(), muted)));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::raw("Status: "),
            Span::styled(
                status.label(),
                Style::default().fg(self.theme.status_color(status)),
            ),
        ]));
        if let Some(date) = game.status.completed_on() {
            lines.push(Line::from(format!("Completed: {}", date.format("%Y-%m-%d"))));
        }
        if let Some(date) = game.wishlist_release() {
            lines.push(Line::from(format!("Releases: {}", date.format("%Y-%m-%d"))));
        }
        lines.push(Line::from(match game.score {
            Some(score) => format!("Score: {score} / 10"),
            None => "Score: -".to_string(),
        }));
        if !game.tags.is_empty() {
            lines.push(Line::from(format!("Tags: {}", game.tags.join(", "))));
        }
        if let Some(cover) = &game.cover_image {
            lines.push(Line::from(vec![Span::raw("Cover: "), Span::styled(cover.clone(), muted)]));
        }
        if !game.comments.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(game.comments.clone()));
        }
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = if self.state.mode == Mode::Search {
            format!("Search: {}", self.filter.query)
        } else {
            self.state.status.clone()
        };
        let help = "a add  e edit  x delete  / search  s status  t tag  c clear  m tags  i import  o export  d theme  q quit";
        let paragraph = Paragraph::new(vec![
            Line::from(primary),
            Line::from(Span::styled(help, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_prompt(&self, frame: &mut Frame, prompt: &PromptModal) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(70_u16, frame_area.width.saturating_sub(4)), 24);
        let area = centered_rect(width, 6, frame_area);
        frame.render_widget(Clear, area);

        let input_line = Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.accent)),
            Span::raw(prompt.input.as_str().to_string()),
        ]);
        let paragraph = Paragraph::new(vec![
            Line::from(prompt.purpose.instruction()),
            input_line,
            Line::from(""),
            key_hints(&[("Enter", "ok"), ("Esc", "cancel")]),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(prompt.purpose.title()),
        );
        frame.render_widget(paragraph, area);

        let cursor_x = (area.x + 3 + prompt.input.cursor() as u16)
            .min(area.x + area.width.saturating_sub(2));
        frame.set_cursor(cursor_x, area.y + 2);
    }

    fn render_editor(&self, frame: &mut Frame, editor: &RecordEditor) {
        let fields = editor.fields();
        let frame_area = frame.size();
        let width = cmp::min(80_u16, frame_area.width.saturating_sub(4));
        let area = centered_rect(width, fields.len() as u16 + 5, frame_area);
        frame.render_widget(Clear, area);

        const LABEL_WIDTH: usize = 14;
        let mut cursor = None;
        let mut lines: Vec<Line> = Vec::new();
        for (row, field) in fields.iter().enumerate() {
            let focused = *field == editor.focused();
            let label_style = if focused {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted)
            };
            let value = match editor.input(*field) {
                Some(input) => {
                    if focused {
                        cursor = Some((input.cursor(), row));
                    }
                    let mut text = input.as_str().to_string();
                    if *field == EditorField::Comments {
                        text.push_str(&format!("  ({}/{})", input.len(), input.limit()));
                    }
                    Span::raw(text)
                }
                None => Span::styled(
                    format!("◀ {} ▶", editor.status().label()),
                    Style::default().fg(self.theme.status_color(editor.status())),
                ),
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<width$}", field.label(), width = LABEL_WIDTH),
                    label_style,
                ),
                value,
            ]));
        }
        lines.push(Line::from(""));
        lines.push(key_hints(&[
            ("Tab", "next"),
            ("Shift-Tab", "previous"),
            ("←/→", "status"),
            ("Enter", "save"),
            ("Esc", "cancel"),
        ]));

        let title = match editor.id() {
            Some(_) => "Edit Game",
            None => "Add Game",
        };
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title)),
            area,
        );
        if let Some((column, row)) = cursor {
            let x = (area.x + 1 + LABEL_WIDTH as u16 + column as u16)
                .min(area.x + area.width.saturating_sub(2));
            frame.set_cursor(x, area.y + 1 + row as u16);
        }
    }

    fn render_confirm(&self, frame: &mut Frame, title: &str) {
        let area = centered_rect(50, 5, frame.size());
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(vec![
            Line::from(format!("Delete \"{title}\"?")),
            Line::from(""),
            key_hints(&[("y", "delete"), ("n", "keep")]),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Delete Game")
                .border_style(Style::default().fg(self.theme.danger)),
        )
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_tags(&self, frame: &mut Frame) {
        let tags = self.library.tags().sorted();
        let frame_area = frame.size();
        let height = cmp::min(tags.len() as u16 + 4, frame_area.height.saturating_sub(2));
        let area = centered_rect(44, height.max(6), frame_area);
        frame.render_widget(Clear, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(Rect::new(
                area.x + 1,
                area.y + 1,
                area.width.saturating_sub(2),
                area.height.saturating_sub(2),
            ));

        let used = self.library.tags_in_use();
        let items: Vec<ListItem> = tags
            .iter()
            .map(|tag| {
                let count = self
                    .library
                    .games()
                    .iter()
                    .filter(|game| game.has_tag(tag))
                    .count();
                let style = if used.contains(tag) {
                    Style::default().fg(self.theme.primary_fg)
                } else {
                    Style::default().fg(self.theme.muted)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(tag.clone(), style),
                    Span::styled(format!("  ({count})"), Style::default().fg(self.theme.muted)),
                ]))
            })
            .collect();
        let mut list_state = ListState::default();
        if !tags.is_empty() {
            list_state.select(Some(self.state.tag_cursor.min(tags.len() - 1)));
        }

        frame.render_widget(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Tags ({})", tags.len())),
            area,
        );
        frame.render_stateful_widget(
            List::new(items)
                .highlight_symbol("▶ ")
                .highlight_style(
                    Style::default()
                        .bg(self.theme.selection_bg)
                        .fg(self.theme.selection_fg),
                ),
            chunks[0],
            &mut list_state,
        );
        frame.render_widget(
            Paragraph::new(key_hints(&[("a", "add"), ("r", "rename"), ("x", "delete"), ("Esc", "close")])),
            chunks[1],
        );
    }

    fn render_import(&self, frame: &mut Frame) {
        let frame_area = frame.size();
        let width = cmp::min(76_u16, frame_area.width.saturating_sub(4));
        let area = centered_rect(width, FIELD_CATALOG.len() as u16 + 9, frame_area);
        frame.render_widget(Clear, area);
        let block = Block::default().borders(Borders::ALL).title("Import CSV");

        let prepared = match self.importer.state() {
            ImportState::Ready(prepared) => prepared,
            ImportState::Parsing { source, .. } => {
                let paragraph = Paragraph::new(vec![
                    Line::from(format!("Reading {}...", source.display())),
                    Line::from(""),
                    key_hints(&[("Esc", "cancel")]),
                ])
                .block(block);
                frame.render_widget(paragraph, area);
                return;
            }
            ImportState::Failed(errors) => {
                let mut lines: Vec<Line> = errors
                    .iter()
                    .map(|err| {
                        Line::from(Span::styled(err.clone(), Style::default().fg(self.theme.danger)))
                    })
                    .collect();
                lines.push(Line::from(""));
                lines.push(key_hints(&[("i", "choose another file"), ("Esc", "close")]));
                frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
                return;
            }
            ImportState::Idle => {
                frame.render_widget(Paragraph::new("No file selected").block(block), area);
                return;
            }
        };

        let mut lines = vec![
            Line::from(format!(
                "{}: {} rows, {} columns",
                prepared.source.display(),
                prepared.parsed.rows.len(),
                prepared.parsed.columns.len()
            )),
            Line::from(""),
        ];
        for (idx, field) in FIELD_CATALOG.iter().enumerate() {
            let selected = idx == self.state.import_cursor;
            let marker = if selected { "▶ " } else { "  " };
            let mut label = field.label().to_string();
            if field.required() {
                label.push('*');
            }
            let column = match prepared.mapping.column(*field) {
                Some(column) => Span::styled(
                    format!("← {column}"),
                    Style::default().fg(self.theme.success),
                ),
                None if field.required() => {
                    Span::styled("unmapped", Style::default().fg(self.theme.danger))
                }
                None => Span::styled("skip", Style::default().fg(self.theme.muted)),
            };
            let style = if selected {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{marker}{label:<18}"), style),
                column,
            ]));
        }
        lines.push(Line::from(""));
        let errors = prepared.errors();
        if errors.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("Ready to import {} games", prepared.parsed.rows.len()),
                Style::default().fg(self.theme.success),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                errors.join("; "),
                Style::default().fg(self.theme.danger),
            )));
        }
        lines.push(key_hints(&[
            ("←/→", "column"),
            ("Bksp", "unmap"),
            ("Enter", "import"),
            ("Esc", "cancel"),
        ]));
        frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
    }
}

fn key_hints(pairs: &[(&'static str, &'static str)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (key, action) in pairs {
        spans.push(Span::styled(*key, Style::default().add_modifier(Modifier::BOLD)));
        spans.push(Span::raw(format!(" {action}  ")));
    }
    Line::from(spans)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    visible: Vec<u64>,
    cursor: usize,
    offset: usize,
    list_height: usize,
    tag_cursor: usize,
    import_cursor: usize,
    status: String,
    mode: Mode,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            visible: Vec::new(),
            cursor: 0,
            offset: 0,
            list_height: 1,
            tag_cursor: 0,
            import_cursor: 0,
            status: "Ready".to_string(),
            mode: Mode::Browse,
            should_quit: false,
        }
    }
}

impl UiState {
    /// Replace the visible ids, keeping the selected record when it is
    /// still shown.
    fn set_visible(&mut self, ids: Vec<u64>) {
        let selected = self.current_id();
        self.visible = ids;
        match selected.and_then(|id| self.visible.iter().position(|v| *v == id)) {
            Some(pos) => self.cursor = pos,
            None => self.clamp_cursor(),
        }
        self.ensure_cursor_visible();
    }

    fn current_id(&self) -> Option<u64> {
        self.visible.get(self.cursor).copied()
    }

    fn select_id(&mut self, id: u64) -> bool {
        match self.visible.iter().position(|v| *v == id) {
            Some(pos) => {
                self.cursor = pos;
                self.ensure_cursor_visible();
                true
            }
            None => false,
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let len = self.visible.len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len - 1) as usize;
        self.ensure_cursor_visible();
    }

    fn move_to(&mut self, index: usize) {
        if self.visible.is_empty() {
            return;
        }
        self.cursor = index.min(self.visible.len() - 1);
        self.ensure_cursor_visible();
    }

    fn move_to_end(&mut self) {
        self.move_to(self.visible.len().saturating_sub(1));
    }

    fn page_down(&mut self) {
        if self.visible.is_empty() || self.list_height == 0 {
            return;
        }
        let delta = self.list_height.min(self.visible.len());
        self.move_cursor(delta as isize);
    }

    fn page_up(&mut self) {
        if self.visible.is_empty() || self.list_height == 0 {
            return;
        }
        let delta = self.list_height.min(self.visible.len());
        self.move_cursor(-(delta as isize));
    }

    fn visible_ids(&self, height: usize) -> &[u64] {
        if self.visible.is_empty() {
            return &[];
        }
        let end = (self.offset + height).min(self.visible.len());
        &self.visible[self.offset..end]
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn clamp_cursor(&mut self) {
        if self.visible.is_empty() {
            self.cursor = 0;
            self.offset = 0;
        } else if self.cursor >= self.visible.len() {
            self.cursor = self.visible.len() - 1;
        }
    }

    fn ensure_cursor_visible(&mut self) {
        if self.visible.is_empty() || self.list_height == 0 {
            self.offset = 0;
            return;
        }
        let height = self.list_height;
        let max_offset = self.visible.len().saturating_sub(height);

        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }

        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use gameshelf_core::{import::ScoreScale, models::GameDraft};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn app() -> GameshelfApp {
        let mut app = GameshelfApp::new(
            Library::seeded(["RPG", "Indie", "Adventure"], true),
            Importer::new(ScoreScale::Hundred, true),
            true,
        );
        app.state.list_height = 10;
        app.refresh();
        app
    }

    fn press(app: &mut GameshelfApp, code: KeyCode) {
        app.process_app_event(Some(AppEvent::Input(Event::Key(key(code)))));
    }

    #[test]
    fn cursor_stays_within_visible_list() {
        let mut state = UiState {
            list_height: 2,
            ..UiState::default()
        };
        state.set_visible(vec![1, 2, 3, 4, 5]);
        state.move_cursor(10);
        assert_eq!(state.cursor, 4);
        assert_eq!(state.offset, 3);
        state.page_up();
        assert_eq!(state.cursor, 2);
        state.set_visible(vec![3, 5]);
        assert_eq!(state.current_id(), Some(3));
        state.set_visible(vec![]);
        assert_eq!(state.current_id(), None);
        state.move_to_end();
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn filters_narrow_the_list() {
        let mut app = app();
        assert_eq!(app.state.visible.len(), 2);
        press(&mut app, KeyCode::Char('/'));
        for ch in "stardew".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state.visible.len(), 1);
        assert_eq!(app.current_game().map(|g| g.title.as_str()), Some("Stardew Valley"));

        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.filter.status, Some(GameStatus::Finished));
        assert_eq!(app.state.visible.len(), 1);
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.state.visible.len(), 2);
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut app = app();
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.library.games().len(), 2);
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.library.games().len(), 1);
        assert!(app.modal.is_none());
    }

    #[test]
    fn editor_rejects_blank_title_and_keeps_form_open() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.modal, Some(Modal::Editor(_))));
        assert_eq!(app.state.status, "Title cannot be empty");

        for ch in "Hades".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        press(&mut app, KeyCode::Enter);
        assert!(app.modal.is_none());
        assert_eq!(app.library.games().len(), 3);
        assert_eq!(app.current_game().map(|g| g.title.as_str()), Some("Hades"));
    }

    #[test]
    fn tag_manager_surfaces_duplicate_names() {
        let mut app = app();
        press(&mut app, KeyCode::Char('m'));
        press(&mut app, KeyCode::Char('a'));
        for ch in "rpg".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.modal, Some(Modal::Prompt(_))));
        assert_eq!(app.state.status, "Tag already exists as \"RPG\"");
        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.modal, Some(Modal::Tags)));
    }

    #[test]
    fn stale_parse_result_is_ignored() {
        let mut app = app();
        let old = app.importer.begin("old.csv");
        let current = app.importer.begin("new.csv");
        app.modal = Some(Modal::Import);

        let parsed = |text: &str| gameshelf_core::import::parse_csv(text);
        app.process_app_event(Some(AppEvent::CsvParsed(
            old,
            parsed("title,platform\nStale,PC\n"),
        )));
        assert!(app.importer.is_parsing());

        app.process_app_event(Some(AppEvent::CsvParsed(
            current,
            parsed("name,platform,user_rating\nCeleste,Switch,90\n"),
        )));
        press(&mut app, KeyCode::Enter);
        assert!(app.modal.is_none());
        let imported = app.library.games().last().cloned();
        assert_eq!(imported.as_ref().map(|g| g.title.as_str()), Some("Celeste"));
        assert_eq!(imported.and_then(|g| g.score).map(|s| s.value()), Some(9.0));
    }

    #[test]
    fn import_waits_for_required_columns() {
        let mut app = app();
        let ticket = app.importer.begin("games.csv");
        app.modal = Some(Modal::Import);
        app.process_app_event(Some(AppEvent::CsvParsed(
            ticket,
            gameshelf_core::import::parse_csv("col_a,col_b\nCeleste,Switch\n"),
        )));
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.modal, Some(Modal::Import)));
        assert_eq!(app.library.games().len(), 2);

        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        assert!(app.modal.is_none());
        let added = app.library.games().last().cloned().map(GameDraft::from);
        assert_eq!(added.as_ref().map(|g| g.title.as_str()), Some("Celeste"));
        assert_eq!(added.and_then(|g| g.platform).as_deref(), Some("Switch"));
    }
}
