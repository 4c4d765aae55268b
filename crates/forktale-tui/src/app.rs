//! Terminal setup, teardown, and the main event loop.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseButton, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use forktale_engine::console::{OptionAction, Rgb, TextStyle};
use forktale_engine::{Interpreter, NullSpeech};

use crate::console::{Segment, TuiConsole};

/// The interpreter type this frontend drives.
pub type TuiInterpreter = Interpreter<TuiConsole, NullSpeech>;

/// Frontend state that lives outside the engine.
struct AppState {
    input_text: String,
    input_cursor: usize,
    selected_option: usize,
    scroll: u16,
    follow: bool,
    should_quit: bool,
    output_area: Rect,
    options_area: Rect,
    input_area: Rect,
}

impl AppState {
    fn new() -> Self {
        Self {
            input_text: String::new(),
            input_cursor: 0,
            selected_option: 0,
            scroll: 0,
            follow: true,
            should_quit: false,
            output_area: Rect::default(),
            options_area: Rect::default(),
            input_area: Rect::default(),
        }
    }
}

/// Launch the terminal frontend around a loaded interpreter.
pub fn run(mut interp: TuiInterpreter) -> Result<(), String> {
    enable_raw_mode().map_err(|e| format!("terminal error: {e}"))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .map_err(|e| format!("terminal error: {e}"))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| format!("terminal error: {e}"))?;

    let result = run_loop(&mut terminal, &mut interp);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    result
}

/// Main event loop: draw, wait for input or the next engine timer, repeat.
fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    interp: &mut TuiInterpreter,
) -> Result<(), String> {
    let start = Instant::now();
    let mut app = AppState::new();

    loop {
        let now = start.elapsed().as_millis() as u64;
        interp.tick(now).map_err(|e| e.to_string())?;

        if interp.console_mut().dirty {
            interp.console_mut().dirty = false;
            app.follow = true;
            let option_count = interp.console().options.len();
            if app.selected_option >= option_count {
                app.selected_option = option_count.saturating_sub(1);
            }
        }

        terminal
            .draw(|frame| draw(frame, interp.console(), &mut app))
            .map_err(|e| format!("draw error: {e}"))?;

        if app.should_quit {
            return Ok(());
        }

        // Sleep until the next engine timer or a short UI heartbeat.
        let now = start.elapsed().as_millis() as u64;
        let timeout = interp
            .next_deadline()
            .map(|due| due.saturating_sub(now))
            .unwrap_or(250)
            .min(250);

        let ready = event::poll(Duration::from_millis(timeout))
            .map_err(|e| format!("event error: {e}"))?;
        if ready {
            let ev = event::read().map_err(|e| format!("event error: {e}"))?;
            let now = start.elapsed().as_millis() as u64;
            handle_event(&mut app, interp, ev, now)?;
        }
    }
}

fn handle_event(
    app: &mut AppState,
    interp: &mut TuiInterpreter,
    ev: Event,
    now: u64,
) -> Result<(), String> {
    match ev {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, interp, key, now),
        Event::Mouse(mouse) => handle_mouse(app, interp, mouse, now),
        _ => Ok(()),
    }
}

fn handle_key(
    app: &mut AppState,
    interp: &mut TuiInterpreter,
    key: crossterm::event::KeyEvent,
    now: u64,
) -> Result<(), String> {
    // Ctrl+C always quits.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return Ok(());
    }

    let input_enabled = interp.console().input_enabled;
    let option_count = interp.console().options.len();

    match key.code {
        KeyCode::Up => {
            app.selected_option = app.selected_option.saturating_sub(1);
            return Ok(());
        }
        KeyCode::Down => {
            if option_count > 0 {
                app.selected_option = (app.selected_option + 1).min(option_count - 1);
            }
            return Ok(());
        }
        KeyCode::PageUp => {
            app.follow = false;
            app.scroll = app.scroll.saturating_sub(10);
            return Ok(());
        }
        KeyCode::PageDown => {
            app.scroll = app.scroll.saturating_add(10);
            return Ok(());
        }
        _ => {}
    }

    if input_enabled {
        match key.code {
            KeyCode::Enter => {
                if app.input_text.is_empty() {
                    activate_selected(app, interp, now)?;
                } else {
                    let text = std::mem::take(&mut app.input_text);
                    app.input_cursor = 0;
                    interp.submit(&text, now).map_err(|e| e.to_string())?;
                }
            }
            KeyCode::Backspace => {
                if app.input_cursor > 0 {
                    app.input_cursor -= 1;
                    app.input_text.remove(app.input_cursor);
                }
            }
            KeyCode::Left => app.input_cursor = app.input_cursor.saturating_sub(1),
            KeyCode::Right => {
                app.input_cursor = (app.input_cursor + 1).min(app.input_text.len());
            }
            KeyCode::Char(c) => {
                app.input_text.insert(app.input_cursor, c);
                app.input_cursor += 1;
            }
            _ => {}
        }
        return Ok(());
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => activate_selected(app, interp, now)?,
        KeyCode::Char(c) => {
            if let Some(digit) = c.to_digit(10)
                && digit >= 1
                && (digit as usize) <= option_count
            {
                let action = interp.console().options[digit as usize - 1].1.clone();
                interp.activate(&action, now).map_err(|e| e.to_string())?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn activate_selected(
    app: &mut AppState,
    interp: &mut TuiInterpreter,
    now: u64,
) -> Result<(), String> {
    if let Some((_, action)) = interp.console().options.get(app.selected_option) {
        let action = action.clone();
        app.selected_option = 0;
        interp.activate(&action, now).map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn handle_mouse(
    app: &mut AppState,
    interp: &mut TuiInterpreter,
    mouse: crossterm::event::MouseEvent,
    now: u64,
) -> Result<(), String> {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            app.follow = false;
            app.scroll = app.scroll.saturating_sub(2);
        }
        MouseEventKind::ScrollDown => {
            app.scroll = app.scroll.saturating_add(2);
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(action) = hit_test(app, interp.console(), mouse.column, mouse.row) {
                interp.activate(&action, now).map_err(|e| e.to_string())?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Map a click to an option entry or an inline link segment.
fn hit_test(app: &AppState, console: &TuiConsole, col: u16, row: u16) -> Option<OptionAction> {
    // Options pane: one option per row inside the border.
    let opts = app.options_area;
    if opts.height > 0 && row > opts.y && row < opts.y + opts.height - 1 {
        let index = (row - opts.y - 1) as usize;
        return console.options.get(index).map(|(_, a)| a.clone());
    }

    // Output pane: find the clicked segment and return its action, if any.
    let out = app.output_area;
    if row > out.y && row < out.y + out.height - 1 && col > out.x {
        let line_idx = app.scroll as usize + (row - out.y - 1) as usize;
        let line = console.lines.get(line_idx)?;
        let mut x = out.x + 1;
        for segment in line {
            let width = segment.text.chars().count() as u16;
            if col >= x && col < x + width {
                return segment.action.clone();
            }
            x += width;
        }
    }

    None
}

fn rgb(color: Rgb) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

fn segment_style(segment: &Segment, console: &TuiConsole) -> Style {
    let mut style = Style::default();
    if let Some(color) = segment.color {
        style = style.fg(rgb(color));
    }
    style = match segment.style {
        TextStyle::Regular => style,
        TextStyle::Italic => style.add_modifier(Modifier::ITALIC),
        TextStyle::Bold => style.add_modifier(Modifier::BOLD),
        TextStyle::BoldItalic => style.add_modifier(Modifier::BOLD | Modifier::ITALIC),
    };
    if segment.action.is_some() && !console.prefs.link_style_text {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    style
}

/// Main draw function.
fn draw(frame: &mut Frame, console: &TuiConsole, app: &mut AppState) {
    let options_height = if console.options.is_empty() {
        0
    } else {
        console.options.len() as u16 + 2
    };
    let input_height = if console.input_enabled { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(options_height),
            Constraint::Length(input_height),
            Constraint::Length(1),
        ])
        .split(frame.area());

    app.output_area = chunks[0];
    app.options_area = chunks[1];
    app.input_area = chunks[2];

    draw_output(frame, console, app, chunks[0]);
    if options_height > 0 {
        draw_options(frame, console, app, chunks[1]);
    }
    if input_height > 0 {
        draw_input(frame, app, chunks[2]);
    }
    draw_status(frame, console, chunks[3]);
}

fn draw_output(frame: &mut Frame, console: &TuiConsole, app: &mut AppState, area: Rect) {
    let background = rgb(console.prefs.background_color);
    let lines: Vec<Line> = console
        .lines
        .iter()
        .map(|segments| {
            Line::from(
                segments
                    .iter()
                    .map(|s| Span::styled(s.text.clone(), segment_style(s, console)))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    let viewport = area.height.saturating_sub(2);
    let max_scroll = (lines.len() as u16).saturating_sub(viewport);
    if app.follow || app.scroll > max_scroll {
        app.scroll = max_scroll;
    }

    let output = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(console.title.clone()),
        )
        .style(Style::default().bg(background))
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0));
    frame.render_widget(output, area);
}

fn draw_options(frame: &mut Frame, console: &TuiConsole, app: &mut AppState, area: Rect) {
    let items: Vec<ListItem> = console
        .options
        .iter()
        .enumerate()
        .map(|(i, (run, _))| {
            let mut style = Style::default();
            if let Some(color) = run.color {
                style = style.fg(rgb(color));
            }
            ListItem::new(Span::styled(format!("{}. {}", i + 1, run.text), style))
        })
        .collect();

    let hover = rgb(console.prefs.option_hover_color);
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().fg(hover).add_modifier(Modifier::BOLD));

    let mut state = ListState::default();
    state.select(Some(app.selected_option.min(console.options.len() - 1)));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_input(frame: &mut Frame, app: &AppState, area: Rect) {
    let display = format!("> {}", app.input_text);
    let input = Paragraph::new(display).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    );
    frame.render_widget(input, area);

    let cursor_x = area.x + 1 + 2 + app.input_cursor as u16;
    let cursor_y = area.y + 1;
    if cursor_x < area.x + area.width.saturating_sub(1) {
        frame.set_cursor_position(Position::new(cursor_x, cursor_y));
    }
}

fn draw_status(frame: &mut Frame, console: &TuiConsole, area: Rect) {
    let mut spans = vec![
        Span::styled("\u{2191}\u{2193}", Style::default().fg(Color::Yellow)),
        Span::raw(":options  "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(if console.input_enabled {
            ":send  "
        } else {
            ":choose  "
        }),
    ];
    if !console.input_enabled {
        spans.push(Span::styled("q", Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(":quit  "));
    }
    spans.push(Span::styled("Ctrl+C", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(":quit"));

    let status =
        Paragraph::new(Line::from(spans)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(status, area);
}
