use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, Widget, Wrap},
};
use std::time::Duration;
use time_humanize::{Accuracy, HumanTime, Tense};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::games::{Board, Glyph, Mark};
use crate::input::Cursor;
use crate::leaderboard::{LeaderboardEntry, ScoreRepository};
use crate::palette::Rgb;
use crate::session::{Notice, SessionState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// "3 minutes ago" style age of a score
pub fn age_text(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - created_at).num_seconds().max(0) as u64;
    HumanTime::from(Duration::from_secs(secs)).to_text_en(Accuracy::Rough, Tense::Past)
}

pub fn notice_text(notice: &Notice) -> String {
    match notice {
        Notice::Streak(n) => format!("{n} in a row!"),
        Notice::NewHighScore(score) => format!("New high score: {score}"),
        Notice::ScoreSaved(score) => format!("Score {score} saved to the leaderboard"),
        Notice::ScoreNotSaved => "Could not save your score".to_string(),
        Notice::SignInToSave => "Pass --player NAME to save scores".to_string(),
    }
}

fn glyph_style(glyph: &Glyph) -> Style {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match (glyph.color.map(to_color), glyph.mark) {
        (_, Mark::Hidden) => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM),
        (Some(color), Mark::Plain) => Style::default().bg(color).fg(Color::Black),
        (Some(color), Mark::Highlight) => bold
            .bg(color)
            .fg(Color::White)
            .add_modifier(Modifier::UNDERLINED),
        (Some(color), Mark::Selected) => bold.bg(color).fg(Color::Black),
        (None, Mark::Plain) => Style::default(),
        (None, Mark::Highlight) => bold.fg(Color::Yellow),
        (None, Mark::Selected) => bold.fg(Color::Green),
    }
}

fn pad(label: &str, width: usize) -> String {
    let gap = width.saturating_sub(label.width());
    let left = gap / 2;
    format!("{}{}{}", " ".repeat(left), label, " ".repeat(gap - left))
}

/// One line per board row. Cells in a row share a width so grids line up.
pub fn board_lines(board: &Board, cursor: Option<Cursor>) -> Vec<Line<'static>> {
    let width = board
        .rows
        .iter()
        .flatten()
        .map(|g| g.label.width())
        .max()
        .unwrap_or(1)
        + 2;

    board
        .rows
        .iter()
        .enumerate()
        .map(|(y, row)| {
            let spans: Vec<Span> = row
                .iter()
                .enumerate()
                .flat_map(|(x, glyph)| {
                    let mut style = glyph_style(glyph);
                    if board.grid.is_some() && cursor == Some(Cursor { x, y }) {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    [
                        Span::styled(pad(&glyph.label, width), style),
                        Span::raw(" "),
                    ]
                })
                .collect();
            Line::from(spans).alignment(Alignment::Center)
        })
        .collect()
}

pub fn standings_table(entries: &[LeaderboardEntry], now: DateTime<Utc>) -> Table<'static> {
    let header = Row::new(vec!["#", "player", "score", "streak", "when"])
        .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));
    let rows = entries.iter().enumerate().map(|(i, entry)| {
        Row::new(vec![
            Cell::from(format!("{}", i + 1)),
            Cell::from(entry.display_name.clone()),
            Cell::from(entry.score.to_string()),
            Cell::from(entry.streak.to_string()),
            Cell::from(age_text(entry.created_at, now)),
        ])
    });
    Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(18),
        ],
    )
    .header(header)
}

fn status_bar<S: ScoreRepository>(app: &App<S>) -> Line<'static> {
    let session = &app.session;
    let dim = Style::default().add_modifier(Modifier::DIM);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let player = session
        .player()
        .map_or_else(|| "guest".to_string(), |p| p.display_name.clone());
    Line::from(vec![
        Span::styled(session.mode().title().to_string(), bold.fg(Color::Magenta)),
        Span::styled("   score ", dim),
        Span::styled(session.score().to_string(), bold),
        Span::styled("   streak ", dim),
        Span::styled(session.streak().to_string(), bold),
        Span::styled("   best ", dim),
        Span::styled(session.high_score().to_string(), bold),
        Span::styled(format!("   {player}"), dim),
    ])
}

fn play_lines<S: ScoreRepository>(app: &App<S>) -> Vec<Line<'static>> {
    let board = app.session.board();
    let mut lines = vec![
        Line::from(Span::styled(
            board.headline.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::default(),
    ];
    lines.extend(board_lines(&board, Some(app.cursor)));
    if let Some(text) = &board.text {
        lines.push(Line::default());
        lines.push(
            Line::from(Span::styled(
                format!("> {text}_"),
                Style::default().fg(Color::Cyan),
            ))
            .alignment(Alignment::Center),
        );
    }
    if let Some(status) = &board.status {
        lines.push(Line::default());
        lines.push(
            Line::from(Span::styled(
                status.clone(),
                Style::default().add_modifier(Modifier::DIM),
            ))
            .alignment(Alignment::Center),
        );
    }
    lines
}

fn waiting_lines<S: ScoreRepository>(app: &App<S>) -> Vec<Line<'static>> {
    let mode = app.session.mode();
    vec![
        Line::from(Span::styled(
            mode.title().to_string(),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(mode.controls().to_string()),
        Line::default(),
        Line::from(Span::styled(
            "press enter to start, esc to quit",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ]
    .into_iter()
    .map(|line| line.alignment(Alignment::Center))
    .collect()
}

impl<S: ScoreRepository> Widget for &App<S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        Paragraph::new(status_bar(self)).render(chunks[0], buf);

        match self.session.state() {
            SessionState::Waiting => {
                Paragraph::new(waiting_lines(self))
                    .wrap(Wrap { trim: true })
                    .render(chunks[2], buf);
            }
            SessionState::Playing => {
                Paragraph::new(play_lines(self))
                    .wrap(Wrap { trim: false })
                    .render(chunks[2], buf);
                let hint = self.session.board().hint;
                Paragraph::new(Span::styled(
                    hint,
                    Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
                ))
                .alignment(Alignment::Center)
                .render(chunks[4], buf);
            }
            SessionState::GameOver => {
                let inner = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(4), Constraint::Min(2)])
                    .split(chunks[2]);
                let summary = vec![
                    Line::from(Span::styled(
                        "Game over",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(format!(
                        "score {}   best {}",
                        self.session.score(),
                        self.session.high_score()
                    )),
                    Line::default(),
                    Line::from(Span::styled(
                        "(r)etry / (q)uit",
                        Style::default().add_modifier(Modifier::ITALIC),
                    )),
                ];
                Paragraph::new(summary)
                    .alignment(Alignment::Center)
                    .render(inner[0], buf);
                if !self.standings().is_empty() {
                    standings_table(self.standings(), Utc::now()).render(inner[1], buf);
                }
            }
        }

        if let Some(notice) = self.banner() {
            Paragraph::new(Span::styled(
                notice_text(notice),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
        }
    }
}
