//! Terminal client: a search line with suggestions, a tag bar, the snippet
//! list, and popups for the detail view, the add form and alerts.

pub mod add_form;
pub mod detail;
pub mod search;
pub mod shell;

use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use tracing::{error, info, warn};

use crate::client::{Gateway, SnippetGateway, Source};
use crate::clipboard::{ClipboardSink, SystemClipboard};
use crate::errors::{QvError, Result};
use add_form::{AddForm, Field};
use detail::DetailView;
use search::{SearchBox, SearchKey, SearchOutcome, highlight};
use shell::Shell;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    List,
    Search,
    Tags,
}

struct App {
    shell: Shell,
    list_state: ListState,
    search: SearchBox,
    focus: Focus,
    /// Cursor in the tag bar; 0 is the "All" entry.
    tag_cursor: usize,
    detail: Option<DetailView>,
    form: AddForm,
    status: String,
    status_time: Option<Instant>,
    should_quit: bool,
}

impl App {
    fn new() -> Self {
        Self {
            shell: Shell::new(),
            list_state: ListState::default(),
            search: SearchBox::new(),
            focus: Focus::List,
            tag_cursor: 0,
            detail: None,
            form: AddForm::new(),
            status: String::new(),
            status_time: None,
            should_quit: false,
        }
    }

    fn set_status(&mut self, msg: String) {
        self.status = msg;
        self.status_time = Some(Instant::now());
    }

    fn load(&mut self, gateway: &impl SnippetGateway) {
        self.shell.search_term.clear();
        self.shell.selected_tag = None;
        self.tag_cursor = 0;
        match self.shell.load(gateway) {
            Ok(()) => info!(count = self.shell.snippets.len(), "snippets loaded"),
            Err(e) => {
                error!(%e, "loading snippets failed");
                self.shell.alert = Some(format!("Could not load snippets: {e}"));
            }
        }
        self.snippets_changed();
    }

    fn snippets_changed(&mut self) {
        let term = self.shell.search_term.clone();
        self.search.refresh(&self.shell.snippets, &term);
        self.tag_cursor = self.tag_cursor.min(self.shell.tags.len());
        self.reset_selection();
    }

    fn reset_selection(&mut self) {
        let selected = (!self.shell.filtered.is_empty()).then_some(0);
        self.list_state.select(selected);
    }

    fn select_by(&mut self, delta: isize) {
        if self.shell.filtered.is_empty() {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0) as isize;
        let last = self.shell.filtered.len() as isize - 1;
        self.list_state.select(Some((current + delta).clamp(0, last) as usize));
    }

    fn apply_term(&mut self, term: String) {
        self.shell.search(&term);
        self.search.update(&self.shell.snippets, &term);
        self.reset_selection();
    }

    fn open_selected(&mut self) {
        let Some(index) = self.list_state.selected() else {
            return;
        };
        self.shell.open_detail(index);
        self.detail = self.shell.detail.clone().map(DetailView::new);
    }

    fn close_detail(&mut self) {
        self.shell.close_detail();
        self.detail = None;
    }

    fn tick(&mut self, now: Instant) {
        self.search.tick(now);
        if let Some(t) = self.status_time
            && now.saturating_duration_since(t) > STATUS_TIMEOUT
        {
            self.status.clear();
            self.status_time = None;
        }
    }

    fn handle_key(
        &mut self,
        key: KeyEvent,
        gateway: &impl SnippetGateway,
        clipboard: &mut impl ClipboardSink,
        now: Instant,
    ) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.shell.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.shell.alert = None;
            }
            return;
        }
        if self.detail.is_some() {
            self.handle_detail_key(key, clipboard, now);
            return;
        }
        if self.shell.adding {
            self.handle_add_key(key, gateway);
            return;
        }
        match self.focus {
            Focus::List => self.handle_list_key(key, gateway),
            Focus::Search => self.handle_search_key(key, now),
            Focus::Tags => self.handle_tags_key(key),
        }
    }

    fn focus_search(&mut self) {
        self.focus = Focus::Search;
        self.search.focus(&self.shell.search_term);
    }

    fn handle_list_key(&mut self, key: KeyEvent, gateway: &impl SnippetGateway) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.select_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.select_by(-1),
            KeyCode::PageDown => self.select_by(10),
            KeyCode::PageUp => self.select_by(-10),
            KeyCode::Char('g') | KeyCode::Home => self.reset_selection(),
            KeyCode::Char('G') | KeyCode::End => {
                let last = self.shell.filtered.len().checked_sub(1);
                self.list_state.select(last);
            }
            KeyCode::Enter => self.open_selected(),
            KeyCode::Char('/') | KeyCode::Tab => self.focus_search(),
            KeyCode::Char('t') => self.focus = Focus::Tags,
            KeyCode::Char('a') => self.shell.adding = true,
            KeyCode::Char('r') => {
                self.load(gateway);
                self.set_status("Reloaded".to_string());
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent, now: Instant) {
        let search_key = match key.code {
            KeyCode::Char(c) => {
                let mut term = self.shell.search_term.clone();
                term.push(c);
                self.apply_term(term);
                return;
            }
            KeyCode::Backspace => {
                let mut term = self.shell.search_term.clone();
                term.pop();
                self.apply_term(term);
                return;
            }
            KeyCode::Tab => {
                self.search.blur(now);
                self.focus = Focus::Tags;
                return;
            }
            KeyCode::Down => SearchKey::Down,
            KeyCode::Up => SearchKey::Up,
            KeyCode::Enter => SearchKey::Enter,
            KeyCode::Esc => SearchKey::Escape,
            _ => return,
        };

        match self.search.handle_key(search_key) {
            SearchOutcome::Activated(term) => {
                self.shell.search(&term);
                self.search.refresh(&self.shell.snippets, &term);
                self.reset_selection();
            }
            SearchOutcome::Dismissed => self.focus = Focus::List,
            SearchOutcome::Moved => {}
            SearchOutcome::Ignored => {
                if search_key != SearchKey::Up {
                    self.search.blur(now);
                    self.focus = Focus::List;
                }
            }
        }
    }

    fn handle_tags_key(&mut self, key: KeyEvent) {
        let entries = self.shell.tags.len() + 1;
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.tag_cursor = (self.tag_cursor + entries - 1) % entries;
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.tag_cursor = (self.tag_cursor + 1) % entries;
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                let tag = self
                    .tag_cursor
                    .checked_sub(1)
                    .and_then(|i| self.shell.tags.get(i))
                    .cloned();
                self.shell.select_tag(tag);
                self.reset_selection();
            }
            KeyCode::Char('/') => self.focus_search(),
            KeyCode::Esc | KeyCode::Tab | KeyCode::Down => self.focus = Focus::List,
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent, clipboard: &mut impl ClipboardSink, now: Instant) {
        let Some(view) = self.detail.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.close_detail(),
            KeyCode::Char('e') | KeyCode::Char(' ') => view.toggle_expanded(),
            KeyCode::Char('j') | KeyCode::Down => view.scroll = view.scroll.saturating_add(1),
            KeyCode::Char('k') | KeyCode::Up => view.scroll = view.scroll.saturating_sub(1),
            KeyCode::Char('c') | KeyCode::Char('y') => {
                if let Err(e) = view.copy(clipboard, now) {
                    warn!(%e, "copy failed");
                    self.set_status(format!("Copy failed: {e}"));
                }
            }
            _ => {}
        }
    }

    fn handle_add_key(&mut self, key: KeyEvent, gateway: &impl SnippetGateway) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.form.clear();
                self.shell.adding = false;
            }
            KeyCode::Char('s') if ctrl => self.submit(gateway),
            KeyCode::Tab => self.form.next_field(),
            KeyCode::BackTab => self.form.prev_field(),
            KeyCode::Enter => match self.form.focus {
                Field::Sql => self.form.newline(),
                Field::Author => self.submit(gateway),
                _ => self.form.next_field(),
            },
            KeyCode::Backspace => self.form.backspace(),
            KeyCode::Char(c) if !ctrl => self.form.input(c),
            _ => {}
        }
    }

    fn submit(&mut self, gateway: &impl SnippetGateway) {
        match self.form.submit() {
            Ok(draft) => {
                self.shell.save(gateway, draft);
                self.shell.adding = false;
                self.snippets_changed();
            }
            Err(QvError::InvalidInput(msg)) => self.shell.alert = Some(msg),
            Err(e) => self.shell.alert = Some(e.to_string()),
        }
    }
}

// UI rendering

fn centered(area: Rect, width: Constraint, height: Constraint) -> Rect {
    let [area] = Layout::vertical([height]).flex(Flex::Center).areas(area);
    let [area] = Layout::horizontal([width]).flex(Flex::Center).areas(area);
    area
}

fn focused_border(focused: bool) -> Style {
    if focused {
        Style::new().fg(Color::Yellow)
    } else {
        Style::new()
    }
}

fn draw(frame: &mut Frame, app: &mut App, now: Instant) {
    let [title_area, search_area, tags_area, list_area, help_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let source = match app.shell.source {
        Source::Service => "online".to_string(),
        Source::LocalCache => "offline: local cache, may be stale".to_string(),
    };
    let title = format!(
        " QueryVault | {} of {} snippets | {source} ",
        app.shell.filtered.len(),
        app.shell.snippets.len()
    );
    let title_style = match app.shell.source {
        Source::Service => Style::new().fg(Color::Black).bg(Color::Cyan),
        Source::LocalCache => Style::new().fg(Color::Black).bg(Color::Yellow),
    };
    frame.render_widget(Paragraph::new(title).style(title_style), title_area);

    let cursor = if app.focus == Focus::Search { "_" } else { "" };
    frame.render_widget(
        Paragraph::new(format!("{}{cursor}", app.shell.search_term)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focused_border(app.focus == Focus::Search))
                .title("Search (#tag, @author)"),
        ),
        search_area,
    );

    draw_tags(frame, app, tags_area);
    draw_list(frame, app, list_area);

    if app.search.is_visible() {
        draw_suggestions(frame, app, search_area);
    }

    let help_text = if !app.status.is_empty() {
        format!(" {} ", app.status)
    } else if app.shell.alert.is_some() {
        " [Enter] OK".to_string()
    } else if app.detail.is_some() {
        " [c]opy [e]xpand [j/k]scroll [Esc] close".to_string()
    } else if app.shell.adding {
        " [Tab] next field [Ctrl+S] save [Esc] cancel".to_string()
    } else {
        match app.focus {
            Focus::List => {
                " [q]uit [/]search [t]ags [Enter]open [a]dd [r]eload [j/k]move".to_string()
            }
            Focus::Search => " Type to search · [Up/Down] suggestions · [Esc] close".to_string(),
            Focus::Tags => " [Left/Right] move · [Enter] filter · [Esc] back".to_string(),
        }
    };
    frame.render_widget(
        Paragraph::new(help_text).style(Style::new().fg(Color::Black).bg(Color::White)),
        help_area,
    );

    if app.detail.is_some() {
        draw_detail(frame, app, now);
    } else if app.shell.adding {
        draw_add_form(frame, app);
    }
    if let Some(msg) = &app.shell.alert {
        let area = centered(frame.area(), Constraint::Percentage(50), Constraint::Length(5));
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(msg.as_str())
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::new().fg(Color::Red))
                        .title("Alert"),
                ),
            area,
        );
    }
}

fn draw_tags(frame: &mut Frame, app: &App, area: Rect) {
    let entries = std::iter::once(("All", app.shell.selected_tag.is_none())).chain(
        app.shell
            .tags
            .iter()
            .map(|t| (t.as_str(), app.shell.selected_tag.as_deref() == Some(t.as_str()))),
    );
    let mut spans = Vec::new();
    for (i, (label, active)) in entries.enumerate() {
        let mut style = if active {
            Style::new().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::new().fg(Color::Cyan)
        };
        if app.focus == Focus::Tags && i == app.tag_cursor {
            style = style.add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
        }
        spans.push(Span::styled(format!(" {label} "), style));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focused_border(app.focus == Focus::Tags))
                .title("Tags"),
        ),
        area,
    );
}

fn draw_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .shell
        .filtered
        .iter()
        .map(|s| {
            let mut spans = vec![Span::raw(s.title.clone())];
            if let Some(author) = &s.author {
                spans.push(Span::styled(format!("  @{author}"), Style::new().fg(Color::Green)));
            }
            if !s.tags.is_empty() {
                spans.push(Span::styled(
                    format!("  #{}", s.tags.join(" #")),
                    Style::new().fg(Color::DarkGray),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let title = if items.is_empty() {
        "No snippets found"
    } else {
        "Snippets"
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focused_border(app.focus == Focus::List))
                .title(title),
        )
        .highlight_style(
            Style::new()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn draw_suggestions(frame: &mut Frame, app: &App, search_area: Rect) {
    let screen = frame.area();
    let top = search_area.y + search_area.height;
    let wanted = app.search.suggestions().len() as u16 + 2;
    let area = Rect {
        x: search_area.x + 1,
        y: top,
        width: search_area.width.saturating_sub(2).min(60),
        height: wanted.min(screen.bottom().saturating_sub(top)),
    };
    if area.height == 0 {
        return;
    }

    let term = &app.shell.search_term;
    let items: Vec<ListItem> = app
        .search
        .suggestions()
        .iter()
        .map(|s| {
            let mut spans = vec![Span::styled(
                format!("{:<8}", s.kind.label()),
                Style::new().fg(Color::DarkGray),
            )];
            spans.extend(highlight(&s.text, term).into_iter().map(|(text, hit)| {
                if hit {
                    Span::styled(text, Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD))
                } else {
                    Span::raw(text)
                }
            }));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let mut state = ListState::default();
    state.select(app.search.selected());
    frame.render_widget(Clear, area);
    frame.render_stateful_widget(
        List::new(items)
            .block(Block::default().borders(Borders::ALL))
            .highlight_style(Style::new().bg(Color::DarkGray)),
        area,
        &mut state,
    );
}

fn draw_detail(frame: &mut Frame, app: &App, now: Instant) {
    let Some(view) = &app.detail else {
        return;
    };
    let label = Style::new().fg(Color::DarkGray);
    let snippet = &view.snippet;

    let mut lines = vec![
        Line::styled(snippet.title.clone(), Style::new().add_modifier(Modifier::BOLD)),
        Line::from(vec![
            Span::styled("Author:  ", label),
            Span::raw(snippet.author.clone().unwrap_or_else(|| "-".to_string())),
        ]),
        Line::from(vec![
            Span::styled("Created: ", label),
            Span::raw(view.created_label()),
        ]),
    ];
    if let Some(description) = &snippet.description {
        lines.push(Line::raw(""));
        lines.push(Line::raw(description.clone()));
    }
    if !snippet.tags.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Tags:    ", label),
            Span::styled(snippet.tags.join(", "), Style::new().fg(Color::Cyan)),
        ]));
    }
    lines.push(Line::raw("─────────────────────────"));
    lines.extend(
        view.display_body()
            .into_iter()
            .map(|l| Line::styled(l.to_string(), Style::new().fg(Color::LightGreen))),
    );
    if let Some(toggle) = view.expand_label() {
        lines.push(Line::styled(format!("[e] {toggle}"), label));
    }

    let title = if view.is_copied(now) {
        " Copied! ".to_string()
    } else {
        format!(" Snippet #{} ", snippet.id)
    };
    let area = centered(frame.area(), Constraint::Percentage(85), Constraint::Percentage(85));
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false })
            .scroll((view.scroll, 0)),
        area,
    );
}

fn draw_add_form(frame: &mut Frame, app: &App) {
    let area = centered(frame.area(), Constraint::Percentage(80), Constraint::Percentage(85));
    frame.render_widget(Clear, area);
    let outer = Block::default().borders(Borders::ALL).title(" New snippet ");
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let areas: [Rect; 5] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .areas(inner);

    for (field, field_area) in Field::ALL.into_iter().zip(areas) {
        let focused = app.form.focus == field;
        let cursor = if focused { "_" } else { "" };
        frame.render_widget(
            Paragraph::new(format!("{}{cursor}", app.form.value(field)))
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(focused_border(focused))
                        .title(field.label()),
                ),
            field_area,
        );
    }
}

// Entry point

pub fn run(gateway: Gateway) -> Result<()> {
    let mut app = App::new();
    app.load(&gateway);
    let mut clipboard = SystemClipboard;

    let mut terminal = ratatui::init();

    let result = (|| {
        loop {
            terminal.draw(|frame| draw(frame, &mut app, Instant::now()))?;
            if event::poll(POLL_INTERVAL)?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                app.handle_key(key, &gateway, &mut clipboard, Instant::now());
            }
            app.tick(Instant::now());
            if app.should_quit {
                break;
            }
        }
        Ok::<(), std::io::Error>(())
    })();

    ratatui::restore();

    result.map_err(|e| QvError::Terminal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Draft, Fetched, Snippet};
    use chrono::Utc;

    struct FakeGateway {
        snippets: Vec<Snippet>,
    }

    impl SnippetGateway for FakeGateway {
        fn load_all(&self) -> Result<Fetched<Vec<Snippet>>> {
            Ok(Fetched::service(self.snippets.clone()))
        }

        fn create(&self, draft: Draft) -> Result<Fetched<Snippet>> {
            Ok(Fetched::cached(draft.into_snippet(99, Utc::now())))
        }
    }

    #[derive(Default)]
    struct FakeClipboard {
        text: Option<String>,
    }

    impl ClipboardSink for FakeClipboard {
        fn set_text(&mut self, text: &str) -> Result<()> {
            self.text = Some(text.to_string());
            Ok(())
        }
    }

    fn snippet(id: i64, title: &str, tags: &[&str]) -> Snippet {
        Snippet {
            id,
            title: title.to_string(),
            content: format!("SELECT {id}"),
            description: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            author: None,
            created_at: Utc::now(),
            favorite: false,
        }
    }

    struct Harness {
        app: App,
        gateway: FakeGateway,
        clipboard: FakeClipboard,
    }

    impl Harness {
        fn new() -> Self {
            let gateway = FakeGateway {
                snippets: vec![
                    snippet(1, "Listar usuarios", &["select", "users"]),
                    snippet(2, "Listar productos", &["select"]),
                    snippet(3, "Sales report", &["report"]),
                ],
            };
            let mut app = App::new();
            app.load(&gateway);
            Self {
                app,
                gateway,
                clipboard: FakeClipboard::default(),
            }
        }

        fn press(&mut self, code: KeyCode) {
            self.press_with(code, KeyModifiers::NONE);
        }

        fn press_with(&mut self, code: KeyCode, modifiers: KeyModifiers) {
            self.app.handle_key(
                KeyEvent::new(code, modifiers),
                &self.gateway,
                &mut self.clipboard,
                Instant::now(),
            );
        }

        fn type_str(&mut self, s: &str) {
            for c in s.chars() {
                self.press(KeyCode::Char(c));
            }
        }

        fn titles(&self) -> Vec<&str> {
            self.app.shell.filtered.iter().map(|s| s.title.as_str()).collect()
        }
    }

    #[test]
    fn test_load_selects_first() {
        let h = Harness::new();
        assert_eq!(h.app.shell.filtered.len(), 3);
        assert_eq!(h.app.list_state.selected(), Some(0));
        assert_eq!(h.app.shell.tags, vec!["select", "users", "report"]);
    }

    #[test]
    fn test_typing_filters_and_suggests() {
        let mut h = Harness::new();
        h.press(KeyCode::Char('/'));
        h.type_str("listar");
        assert_eq!(h.titles(), vec!["Listar usuarios", "Listar productos"]);
        assert!(h.app.search.is_visible());

        h.press(KeyCode::Down);
        h.press(KeyCode::Enter);
        assert_eq!(h.app.shell.search_term, "Listar usuarios");
        assert_eq!(h.titles(), vec!["Listar usuarios"]);
        assert!(!h.app.search.is_visible());
        assert_eq!(h.app.focus, Focus::Search);
    }

    #[test]
    fn test_refocus_after_activation_shows_current_suggestions() {
        let mut h = Harness::new();
        h.press(KeyCode::Char('/'));
        h.type_str("rep");
        h.press(KeyCode::Up);
        h.press(KeyCode::Enter);
        assert_eq!(h.app.shell.search_term, "#report");

        h.press(KeyCode::Tab);
        h.press(KeyCode::Esc);
        h.press(KeyCode::Char('/'));
        assert_eq!(h.app.focus, Focus::Search);
        assert!(h.app.search.suggestions().is_empty());
        assert!(!h.app.search.is_visible());
    }

    #[test]
    fn test_escape_leaves_search() {
        let mut h = Harness::new();
        h.press(KeyCode::Char('/'));
        h.type_str("rep");
        h.press(KeyCode::Esc);
        assert_eq!(h.app.focus, Focus::List);
        assert!(!h.app.search.is_visible());
        assert_eq!(h.titles(), vec!["Sales report"]);
    }

    #[test]
    fn test_tag_bar_selects_and_clears() {
        let mut h = Harness::new();
        h.press(KeyCode::Char('t'));
        h.press(KeyCode::Right);
        h.press(KeyCode::Enter);
        assert_eq!(h.app.shell.selected_tag.as_deref(), Some("select"));
        assert_eq!(h.titles(), vec!["Listar usuarios", "Listar productos"]);

        h.press(KeyCode::Left);
        h.press(KeyCode::Enter);
        assert_eq!(h.app.shell.selected_tag, None);
        assert_eq!(h.titles().len(), 3);
    }

    #[test]
    fn test_tag_cursor_wraps() {
        let mut h = Harness::new();
        h.press(KeyCode::Char('t'));
        h.press(KeyCode::Left);
        assert_eq!(h.app.tag_cursor, 3);
        h.press(KeyCode::Enter);
        assert_eq!(h.app.shell.selected_tag.as_deref(), Some("report"));
    }

    #[test]
    fn test_detail_open_copy_close() {
        let mut h = Harness::new();
        h.press(KeyCode::Down);
        h.press(KeyCode::Enter);
        assert_eq!(h.app.detail.as_ref().map(|d| d.snippet.id), Some(2));

        h.press(KeyCode::Char('c'));
        assert_eq!(h.clipboard.text.as_deref(), Some("SELECT 2"));
        assert!(h.app.detail.as_ref().is_some_and(|d| d.is_copied(Instant::now())));

        h.press(KeyCode::Esc);
        assert!(h.app.detail.is_none());
        assert!(h.app.shell.detail.is_none());
        assert!(!h.app.should_quit);
    }

    #[test]
    fn test_add_form_saves_snippet() {
        let mut h = Harness::new();
        h.press(KeyCode::Char('a'));
        assert!(h.app.shell.adding);
        h.type_str("New one");
        h.press(KeyCode::Tab);
        h.press(KeyCode::Tab);
        h.type_str("SELECT 42");
        h.press(KeyCode::Tab);
        h.type_str("fresh");
        h.press_with(KeyCode::Char('s'), KeyModifiers::CONTROL);

        assert!(!h.app.shell.adding);
        assert_eq!(h.app.shell.snippets.len(), 4);
        assert_eq!(h.app.shell.filtered.len(), 4);
        assert_eq!(h.app.shell.tags.last().map(String::as_str), Some("fresh"));
        assert_eq!(h.app.form.title, "");
    }

    #[test]
    fn test_add_form_blank_raises_alert() {
        let mut h = Harness::new();
        h.press(KeyCode::Char('a'));
        h.type_str("Only a title");
        h.press_with(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(h.app.shell.alert.as_deref(), Some("Title and SQL are required"));
        assert_eq!(h.app.shell.snippets.len(), 3);

        h.press(KeyCode::Char('x'));
        assert!(h.app.shell.alert.is_some());
        h.press(KeyCode::Enter);
        assert!(h.app.shell.alert.is_none());
        assert!(h.app.shell.adding);
        assert_eq!(h.app.form.title, "Only a title");
    }

    #[test]
    fn test_ctrl_c_quits_anywhere() {
        let mut h = Harness::new();
        h.press(KeyCode::Char('a'));
        h.press_with(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(h.app.should_quit);
    }

    #[test]
    fn test_status_clears_after_timeout() {
        let mut h = Harness::new();
        h.press(KeyCode::Char('r'));
        assert_eq!(h.app.status, "Reloaded");
        let later = Instant::now() + STATUS_TIMEOUT + Duration::from_millis(1);
        h.app.tick(later);
        assert!(h.app.status.is_empty());
    }
}
