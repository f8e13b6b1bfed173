use std::collections::VecDeque;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs};

use crate::events::{Level, NodeEvent};
use crate::node::{NibRow, NodeStats};

const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Entities,
    Log,
}

impl Tab {
    const ALL: [Tab; 2] = [Tab::Entities, Tab::Log];

    fn title(self) -> &'static str {
        match self {
            Tab::Entities => "Entities",
            Tab::Log => "Event Log",
        }
    }
}

pub struct TuiState {
    log: VecDeque<(Level, String)>,
    tab: Tab,
    /// Lines scrolled up from the newest log entry.
    scroll: usize,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            log: VecDeque::new(),
            tab: Tab::Entities,
            scroll: 0,
        }
    }

    pub fn log_event(&mut self, event: &NodeEvent) {
        self.push(event.level(), event.to_string());
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.push(Level::Info, message.into());
    }

    fn push(&mut self, level: Level, message: String) {
        if self.log.len() == MAX_LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back((level, message));
    }

    pub fn next_tab(&mut self) {
        self.tab = match self.tab {
            Tab::Entities => Tab::Log,
            Tab::Log => Tab::Entities,
        };
    }

    pub fn scroll_up(&mut self) {
        self.scroll = (self.scroll + 10).min(self.log.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_sub(10);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }
}

pub fn render(frame: &mut Frame, state: &TuiState, stats: &NodeStats) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(6),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], stats);
    render_tabs(frame, chunks[1], state.tab);
    match state.tab {
        Tab::Entities => render_entities(frame, chunks[2], stats),
        Tab::Log => render_log(frame, chunks[2], state),
    }
    render_network(frame, chunks[3], stats);
    render_help(frame, chunks[4]);
}

fn render_header(frame: &mut Frame, area: Rect, stats: &NodeStats) {
    let title = format!(" simbridge node - Uptime: {} ", format_duration(stats.uptime_secs));
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let state = if stats.frozen {
        Span::styled("FROZEN", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("RUNNING", Style::default().fg(Color::Green))
    };
    let line = Line::from(vec![
        Span::raw(format!(
            "Tick: {}  |  Exec: {:.1}s  |  Outputs: {}  |  Inputs: {}  |  Missiles: {}  |  ",
            stats.tick,
            stats.exec_time,
            stats.outputs.len(),
            stats.inputs.len(),
            stats.missiles_in_flight
        )),
        state,
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_tabs(frame: &mut Frame, area: Rect, active: Tab) {
    let titles = Tab::ALL.iter().map(|t| t.title());
    let selected = Tab::ALL.iter().position(|t| *t == active).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, area);
}

fn nib_table<'a>(title: &'a str, rows: &'a [NibRow], color: Color) -> Table<'a> {
    let header = Row::new(["Entity", "Marking", "Template", "Mode", "Lat", "Lon", "Alt"])
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let body = rows.iter().map(|row| {
        Row::new(vec![
            Cell::from(row.id.to_string()),
            Cell::from(row.marking.clone()),
            Cell::from(row.template.clone()),
            Cell::from(format!("{:?}", row.mode)),
            Cell::from(format!("{:.4}", row.latitude)),
            Cell::from(format!("{:.4}", row.longitude)),
            Cell::from(format!("{:.0}", row.altitude)),
        ])
    });
    Table::new(
        body,
        [
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color)),
    )
}

fn render_entities(frame: &mut Frame, area: Rect, stats: &NodeStats) {
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    frame.render_widget(nib_table(" Output NIBs ", &stats.outputs, Color::Green), halves[0]);
    frame.render_widget(nib_table(" Input NIBs ", &stats.inputs, Color::Magenta), halves[1]);
}

fn render_log(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default()
        .title(" Events ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let visible = area.height.saturating_sub(2) as usize;
    let end = state.log.len().saturating_sub(state.scroll);
    let start = end.saturating_sub(visible);
    let lines: Vec<Line> = state
        .log
        .range(start..end)
        .map(|(level, message)| {
            let color = match level {
                Level::Info => Color::White,
                Level::Warn => Color::Yellow,
                Level::Error => Color::Red,
            };
            Line::from(Span::styled(message.as_str(), Style::default().fg(color)))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_network(frame: &mut Frame, area: Rect, stats: &NodeStats) {
    let block = Block::default()
        .title(" Network ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let net = &stats.network;
    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::Gray));
    let lines = vec![
        Line::from(vec![
            label("PDUs: "),
            Span::raw(format!("{} sent / {} recv", net.pdus_sent, net.pdus_received)),
        ]),
        Line::from(vec![
            label("Bytes: "),
            Span::raw(format!(
                "{} sent / {} recv",
                format_bytes(net.bytes_sent),
                format_bytes(net.bytes_received)
            )),
        ]),
        Line::from(vec![
            label("Dropped: "),
            Span::raw(format!(
                "{} echoes, {} foreign exercise, {} unhandled, {} timed out",
                net.echoes_dropped,
                net.foreign_exercise_dropped,
                net.unhandled,
                net.entities_timed_out
            )),
        ]),
        Line::from(vec![
            label("Errors: "),
            Span::styled(
                format!("{} send, {} decode", net.send_failures, net.decode_errors),
                Style::default().fg(if net.send_failures + net.decode_errors > 0 {
                    Color::Red
                } else {
                    Color::White
                }),
            ),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = Paragraph::new("q/ESC quit  |  Tab switch view  |  PgUp/PgDn/End scroll log")
        .block(block)
        .style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        );
    frame.render_widget(text, area);
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_bounded() {
        let mut state = TuiState::new();
        for i in 0..MAX_LOG_LINES + 20 {
            state.log_info(format!("line {i}"));
        }
        assert_eq!(state.log.len(), MAX_LOG_LINES);
        assert_eq!(state.log.front().map(|(_, m)| m.as_str()), Some("line 20"));

        state.scroll_up();
        assert_eq!(state.scroll, 10);
        state.scroll_to_bottom();
        assert_eq!(state.scroll, 0);
    }
}
