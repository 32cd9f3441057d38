//! Replay viewer state and event loop

use crate::runner::RunReport;
use crate::trace::{EventKind, TraceEvent};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

use super::panes::{
    render_heap_pane, render_source_pane, render_stack_pane, render_status_bar,
    render_terminal_pane, HeapScrollState, SourceScrollState, StackScrollState, StatusRenderData,
};

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Stack,
    Heap,
    Terminal,
}

impl FocusedPane {
    /// Move focus to the next pane (clockwise: source -> terminal -> stack -> heap)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Terminal,
            FocusedPane::Terminal => FocusedPane::Stack,
            FocusedPane::Stack => FocusedPane::Heap,
            FocusedPane::Heap => FocusedPane::Source,
        }
    }

    /// Move focus to the previous pane (counter-clockwise)
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Heap,
            FocusedPane::Terminal => FocusedPane::Source,
            FocusedPane::Stack => FocusedPane::Terminal,
            FocusedPane::Heap => FocusedPane::Stack,
        }
    }
}

/// The replay viewer: a cursor over the recorded events of one run
pub struct App {
    pub report: RunReport,

    /// Source of the traced program
    pub source_code: String,

    /// Index of the event being shown
    pub position: usize,

    pub focused_pane: FocusedPane,

    pub source_scroll: SourceScrollState,
    pub stack_scroll: StackScrollState,
    pub heap_scroll: HeapScrollState,
    pub terminal_scroll: usize,

    pub should_quit: bool,

    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,

    /// Last time space was pressed (for debouncing)
    pub last_space_press: Instant,
}

impl App {
    pub fn new(report: RunReport, source_code: String) -> Self {
        let status_message = match &report.error {
            Some(error) => format!("Run failed: {}", error.message),
            None if report.events.is_empty() => "No steps recorded".to_string(),
            None => "Ready!".to_string(),
        };
        App {
            report,
            source_code,
            position: 0,
            focused_pane: FocusedPane::Source,
            source_scroll: SourceScrollState::default(),
            stack_scroll: StackScrollState::default(),
            heap_scroll: HeapScrollState::default(),
            terminal_scroll: 0,
            should_quit: false,
            status_message,
            is_playing: false,
            last_play_time: Instant::now(),
            last_space_press: Instant::now()
                .checked_sub(Duration::from_secs(1))
                .unwrap_or_else(Instant::now),
        }
    }

    /// The event under the cursor
    pub fn current_event(&self) -> Option<&TraceEvent> {
        self.report.events.get(self.position)
    }

    pub fn total_steps(&self) -> usize {
        self.report.events.len()
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.is_playing && self.last_play_time.elapsed() >= Duration::from_secs(1) {
                if self.step_forward() {
                    self.status_message = "Playing...".to_string();
                } else {
                    self.is_playing = false;
                    self.status_message = "Playback complete".to_string();
                }
                self.last_play_time = Instant::now();
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // 4 panes in 2 columns, plus status bar at bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(main_chunks[0]);

        // Left column: Source (top) | Terminal (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(columns[0]);

        // Right column: Stack (top) | Heap (bottom)
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(columns[1]);

        let event = self.report.events.get(self.position);
        let is_exception = event.is_some_and(|e| e.event == EventKind::Exception);

        render_source_pane(
            frame,
            left_rows[0],
            &self.source_code,
            event.map_or(0, |e| e.line),
            is_exception,
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        let stdout = match event {
            Some(event) => event.stdout.as_str(),
            None => self.report.stdout.as_str(),
        };
        render_terminal_pane(
            frame,
            left_rows[1],
            stdout,
            self.focused_pane == FocusedPane::Terminal,
            &mut self.terminal_scroll,
        );

        render_stack_pane(
            frame,
            right_rows[0],
            event,
            self.focused_pane == FocusedPane::Stack,
            &mut self.stack_scroll,
        );

        render_heap_pane(
            frame,
            right_rows[1],
            event.map(|e| &e.memory),
            self.focused_pane == FocusedPane::Heap,
            &mut self.heap_scroll,
        );

        render_status_bar(
            frame,
            main_chunks[1],
            StatusRenderData {
                message: &self.status_message,
                current_step: self.position,
                total_steps: self.total_steps(),
                event: event.map(|e| e.event),
                failed: !self.report.success,
                is_playing: self.is_playing,
            },
        );
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            // Number keys step forward N times directly
            KeyCode::Char(c @ '1'..='9') => {
                self.is_playing = false;
                let n = c.to_digit(10).unwrap_or(1);
                let mut stepped = 0;
                for _ in 0..n {
                    if !self.step_forward() {
                        break;
                    }
                    stepped += 1;
                }
                self.status_message = format!("Stepped forward {} step(s)", stepped);
            }
            KeyCode::Tab => self.focused_pane = self.focused_pane.next(),
            KeyCode::BackTab => self.focused_pane = self.focused_pane.prev(),
            KeyCode::Left => {
                self.is_playing = false;
                self.status_message = if self.step_backward() {
                    "Stepped backward".to_string()
                } else {
                    "Cannot step backward: at the first step".to_string()
                };
            }
            KeyCode::Right => {
                self.is_playing = false;
                self.status_message = if self.step_forward() {
                    "Stepped forward".to_string()
                } else {
                    "Cannot step forward: at the last step".to_string()
                };
            }
            KeyCode::Char('n') => {
                self.is_playing = false;
                self.status_message = if self.step_over() {
                    "Stepped over".to_string()
                } else {
                    "Cannot step over: at the last step".to_string()
                };
            }
            KeyCode::Up => self.scroll(-1),
            KeyCode::Down => self.scroll(1),
            KeyCode::Char(' ') => {
                // Toggle auto-play mode (with 200ms debounce to prevent key repeat spam)
                if self.last_space_press.elapsed() >= Duration::from_millis(200) {
                    self.last_space_press = Instant::now();
                    self.is_playing = !self.is_playing;
                    if self.is_playing {
                        self.last_play_time = Instant::now()
                            .checked_sub(Duration::from_secs(1))
                            .unwrap_or_else(Instant::now);
                        self.status_message = "Playing...".to_string();
                    } else {
                        self.status_message = "Paused".to_string();
                    }
                }
            }
            KeyCode::Enter => {
                self.is_playing = false;
                self.jump_to(self.total_steps().saturating_sub(1));
                self.status_message = "Jumped to end".to_string();
            }
            KeyCode::Backspace => {
                self.is_playing = false;
                self.jump_to(0);
                self.status_message = "Jumped to start".to_string();
            }
            _ => {}
        }
    }

    fn scroll(&mut self, delta: isize) {
        let apply = |offset: &mut usize| {
            *offset = offset.saturating_add_signed(delta);
        };
        match self.focused_pane {
            FocusedPane::Source => {
                // Scrolling down makes the current line move up visually
                if let Some(row) = self.source_scroll.target_line_row.as_mut() {
                    *row = row.saturating_add_signed(-delta);
                }
            }
            FocusedPane::Stack => apply(&mut self.stack_scroll.offset),
            FocusedPane::Heap => apply(&mut self.heap_scroll.offset),
            FocusedPane::Terminal => apply(&mut self.terminal_scroll),
        }
    }

    fn jump_to(&mut self, position: usize) {
        self.position = position.min(self.total_steps().saturating_sub(1));
        // Auto-scroll terminal to bottom
        self.terminal_scroll = usize::MAX;
    }

    /// Advance one event; false at the end of the trace
    pub fn step_forward(&mut self) -> bool {
        if self.position + 1 >= self.total_steps() {
            return false;
        }
        self.jump_to(self.position + 1);
        true
    }

    /// Go back one event; false at the start of the trace
    pub fn step_backward(&mut self) -> bool {
        if self.position == 0 {
            return false;
        }
        self.jump_to(self.position - 1);
        true
    }

    /// Advance to the next event whose stack is no deeper than the current
    /// one, skipping over the calls made from this line
    pub fn step_over(&mut self) -> bool {
        let Some(depth) = self.current_event().map(|e| e.stack.len()) else {
            return false;
        };
        let next = self
            .report
            .events
            .iter()
            .enumerate()
            .skip(self.position + 1)
            .find(|(_, event)| event.stack.len() <= depth)
            .map(|(index, _)| index);
        match next {
            Some(index) => {
                self.jump_to(index);
                true
            }
            None => self.step_forward(),
        }
    }
}
