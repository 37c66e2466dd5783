pub mod charting;

use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Chart, Clear, Dataset, Gauge, GraphType, Paragraph, Row, Table,
        Widget, Wrap,
    },
};
use time_humanize::HumanTime;
use unicode_width::UnicodeWidthStr;

use sysoverride::challenge::ChallengeKind;
use sysoverride::events::InfoWindow;
use sysoverride::game::{ChallengeView, GameSnapshot};
use sysoverride::mechanics::ChallengePhase;
use sysoverride::util::{format_clock, std_dev};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Options => render_options(self, area, buf),
            AppState::Mission => render_mission(self, area, buf),
            AppState::Complete => render_complete(self, area, buf),
            AppState::GameOver => render_game_over(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn green_bold() -> Style {
    bold().fg(Color::Green)
}

fn red_bold() -> Style {
    bold().fg(Color::Red)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn render_options(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(area.height / 4),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .split(area);

    Paragraph::new(Span::styled("SYSTEM OVERRIDE", green_bold()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!("OPERATOR: {}", app.operator.display_name),
        dim_bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    let lang = format!("(l) payload language: {}", app.pending_language).to_lowercase();
    Paragraph::new(Span::styled(lang, bold()))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    let tier = app.pending_difficulty;
    let diff = format!(
        "(1/2/3) difficulty: {} ({}s mission clock)",
        tier,
        tier.time_limit_secs()
    )
    .to_lowercase();
    Paragraph::new(Span::styled(diff, bold()))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

    Paragraph::new(Span::styled(
        "(enter) begin breach  (esc) abort",
        dim_bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[5], buf);
}

fn render_mission(app: &App, area: Rect, buf: &mut Buffer) {
    let snap = app.game.snapshot();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(2), // status bar
            Constraint::Min(5),    // typing / graph area
            Constraint::Length(6), // event feed
            Constraint::Length(1), // hints
        ])
        .split(area);

    render_status_bar(&snap, chunks[0], buf);

    if snap.unlocked.contains(&InfoWindow::NetworkGraph) && chunks[1].width > 60 {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        render_typing_zone(&snap, halves[0], buf);
        render_wpm_chart(&snap, halves[1], buf);
    } else {
        render_typing_zone(&snap, chunks[1], buf);
    }

    render_feed(app, chunks[2], buf);

    Paragraph::new(Span::styled(
        "(esc) pause :: type the phrase to advance the breach",
        dim_bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    if let Some(view) = &snap.challenge {
        render_challenge_popup(view, area, buf);
    }

    if snap.paused {
        render_pause_overlay(area, buf);
    }
}

fn render_status_bar(snap: &GameSnapshot, area: Rect, buf: &mut Buffer) {
    let breach_marks: String = (0..3u8)
        .map(|i| if i < snap.breaches { 'x' } else { '.' })
        .collect();

    let mut spans = vec![
        Span::styled(format!("PROGRESS {:>3}%", snap.progress), green_bold()),
        Span::raw("  "),
        Span::styled(format!("{} WPM", snap.typing_speed), bold()),
        Span::raw("  "),
        Span::styled(format_clock(snap.seconds_remaining), bold()),
        Span::raw("  "),
        Span::styled(
            format!("{}", snap.difficulty).to_uppercase(),
            dim_bold(),
        ),
        Span::raw("/"),
        Span::styled(
            format!("{}", snap.dynamic_difficulty).to_uppercase(),
            dim_bold(),
        ),
        Span::raw("  "),
        Span::styled(format!("BREACHES {breach_marks}"), red_bold()),
    ];

    if snap.trace_active {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "TRACE DETECTED :: BREACH IN PROGRESS",
            red_bold().add_modifier(Modifier::SLOW_BLINK),
        ));
    }

    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_typing_zone(snap: &GameSnapshot, area: Rect, buf: &mut Buffer) {
    if let Some(percent) = snap.patch_percent {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(3),
                Constraint::Length(2),
                Constraint::Min(1),
            ])
            .split(area);

        Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("SECURITY PATCHING IN PROGRESS")
                    .border_style(red_bold()),
            )
            .gauge_style(Style::default().fg(Color::Red))
            .percent(percent as u16)
            .render(chunks[1], buf);

        Paragraph::new(Span::styled("TYPE FASTER TO CANCEL SECURITY PATCH", red_bold()))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
        return;
    }

    let phrase_chars: Vec<char> = snap.phrase.chars().collect();
    let buffer_chars: Vec<char> = snap.buffer.chars().collect();

    let mut spans: Vec<Span> = Vec::with_capacity(phrase_chars.len());
    for (idx, &expected) in phrase_chars.iter().enumerate() {
        let span = match buffer_chars.get(idx) {
            Some(&typed) if typed == expected => Span::styled(expected.to_string(), green_bold()),
            Some(&typed) => Span::styled(
                match typed {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                red_bold(),
            ),
            None if idx == buffer_chars.len() => Span::styled(
                expected.to_string(),
                dim_bold().add_modifier(Modifier::UNDERLINED),
            ),
            None => Span::styled(expected.to_string(), dim_bold()),
        };
        spans.push(span);
    }
    // Overflow past the phrase end stays visible as errors
    for &typed in buffer_chars.iter().skip(phrase_chars.len()) {
        spans.push(Span::styled(typed.to_string(), red_bold()));
    }

    let max_chars_per_line = area.width.saturating_sub(2).max(1);
    let occupied = (snap.phrase.width() as f64 / max_chars_per_line as f64).ceil() as u16 + 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(occupied + 2) / 2),
            Constraint::Length(1),
            Constraint::Length(occupied),
            Constraint::Min(1),
        ])
        .split(area);

    Paragraph::new(Span::styled(
        format!("COMMANDS EXECUTED: {}", snap.completed_phrases),
        dim_bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Line::from(spans))
        .alignment(if occupied <= 2 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);
}

fn render_wpm_chart(snap: &GameSnapshot, area: Rect, buf: &mut Buffer) {
    let ([x_lo, x_hi], [y_lo, y_hi]) = charting::wpm_chart_bounds(&snap.wpm_coords);

    let datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&snap.wpm_coords)];

    Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("NETWORK GRAPH :: WPM"),
        )
        .x_axis(
            Axis::default()
                .bounds([x_lo, x_hi])
                .labels(vec![
                    charting::format_label(x_lo),
                    charting::format_label(x_hi),
                ]),
        )
        .y_axis(
            Axis::default()
                .bounds([y_lo, y_hi])
                .labels(vec![
                    charting::format_label(y_lo),
                    charting::format_label(y_hi),
                ]),
        )
        .render(area, buf);
}

fn render_feed(app: &App, area: Rect, buf: &mut Buffer) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .feed
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(|entry| Line::from(Span::styled(entry.clone(), dim_bold())))
        .collect();

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("SYSTEM LOGS"))
        .render(area, buf);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

fn challenge_title(kind: ChallengeKind) -> &'static str {
    match kind {
        ChallengeKind::Bruteforce => "BRUTE FORCE :: REPRODUCE PASSWORD",
        ChallengeKind::Portscan => "PORT SCANNING :: MEMORY CHALLENGE",
        ChallengeKind::Firewall => "FIREWALL :: SOLVE TO BYPASS",
        ChallengeKind::Intrusion => "INTRUSION DETECTED :: DISABLE SECURITY",
        ChallengeKind::Virus => "PAYLOAD READY :: DEPLOY VIRUS",
        ChallengeKind::Webcam => "WEBCAM ACCESS :: BLOCK SURVEILLANCE",
    }
}

fn render_challenge_popup(view: &ChallengeView, area: Rect, buf: &mut Buffer) {
    let popup = centered_rect(60, 9, area);
    Clear.render(popup, buf);

    let urgent = view.seconds_left <= 3;
    let countdown_style = if urgent { red_bold() } else { bold().fg(Color::Yellow) };

    let mut lines = Vec::new();
    match view.phase {
        ChallengePhase::Memorize => {
            lines.push(Line::from(Span::styled("MEMORIZE TARGET", countdown_style)));
            lines.push(Line::from(Span::styled(view.prompt.clone(), green_bold())));
            lines.push(Line::from(Span::styled(
                format!("MEMORIZING PHASE: {}s", view.seconds_left),
                dim_bold(),
            )));
        }
        ChallengePhase::Recall => {
            lines.push(Line::from(Span::styled(
                "ENTER TARGET AS ip:port",
                countdown_style,
            )));
            lines.push(Line::from(Span::styled(format!("> {}", view.input), bold())));
            lines.push(Line::from(Span::styled(
                format!("RECALL PHASE: {}s", view.seconds_left),
                dim_bold(),
            )));
        }
        ChallengePhase::Single => {
            lines.push(Line::from(Span::styled(view.prompt.clone(), green_bold())));
            lines.push(Line::from(Span::styled(format!("> {}", view.input), bold())));
            lines.push(Line::from(Span::styled(
                format!("TIME REMAINING: {}s / {}s", view.seconds_left, view.time_limit),
                countdown_style,
            )));
        }
    }
    lines.push(Line::from(Span::styled("(enter) submit", dim_bold())));

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(challenge_title(view.kind))
                .border_style(if urgent { red_bold() } else { bold() }),
        )
        .wrap(Wrap { trim: true })
        .render(popup, buf);
}

fn render_pause_overlay(area: Rect, buf: &mut Buffer) {
    let popup = centered_rect(44, 7, area);
    Clear.render(popup, buf);

    let lines = vec![
        Line::from(Span::styled("SYSTEM PAUSED", bold().fg(Color::Yellow))),
        Line::from(Span::raw("")),
        Line::from(Span::styled("all clocks frozen", dim_bold())),
        Line::from(Span::styled("(esc) resume  (h) home  (q) quit", dim_bold())),
    ];

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .render(popup, buf);
}

fn render_complete(app: &App, area: Rect, buf: &mut Buffer) {
    let snap = app.game.snapshot();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(Span::styled("MISSION COMPLETE", green_bold()))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let consistency = std_dev(
        &snap
            .wpm_coords
            .iter()
            .map(|p| p.1)
            .collect::<Vec<f64>>(),
    )
    .unwrap_or(0.0);
    Paragraph::new(Span::styled(
        format!("{} wpm / {:.1} sd", snap.typing_speed, consistency),
        bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    if let Some(status) = &app.score_status {
        Paragraph::new(Span::styled(status.clone(), dim_bold()))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
    }

    render_leaderboard(app, chunks[4], buf);

    Paragraph::new(Span::styled(
        "(r)etry  (n)ew mission  (t)weet  (esc)ape",
        dim_bold().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[5], buf);
}

fn render_leaderboard(app: &App, area: Rect, buf: &mut Buffer) {
    if app.leaderboard.is_empty() {
        Paragraph::new("Leaderboard offline; mission results kept locally.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray))
            .render(area, buf);
        return;
    }

    let header = Row::new(vec!["#", "OPERATOR", "WPM", "WHEN"])
        .style(bold().fg(Color::Cyan));

    let rows: Vec<Row> = app
        .leaderboard
        .iter()
        .enumerate()
        .map(|(rank, entry)| {
            let age_secs = Local::now()
                .signed_duration_since(entry.timestamp)
                .num_seconds();
            let when = HumanTime::from(-age_secs).to_string();
            Row::new(vec![
                format!("{}", rank + 1),
                entry.display_name.clone(),
                format!("{}", entry.wpm),
                when,
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Length(18),
        Constraint::Length(6),
        Constraint::Min(12),
    ];

    Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("TOP OPERATORS"))
        .column_spacing(2)
        .render(area, buf);
}

fn render_game_over(app: &App, area: Rect, buf: &mut Buffer) {
    let snap = app.game.snapshot();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(area.height / 3),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .split(area);

    Paragraph::new(Span::styled("CONNECTION TERMINATED", red_bold()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!(
            "security breaches: {} :: connection severed at {}% progress",
            snap.breaches, snap.progress
        ),
        bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        "(r)etry mission  (n)ew mission  (esc)ape",
        dim_bold().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);
}
