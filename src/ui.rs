pub mod charting;
pub mod keyboard;
pub mod profile;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Sparkline, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::App,
    celebration::Celebration,
    config::QUICK_STARTS,
    metrics::Outcome,
    scores::DashboardSummary,
    ui::keyboard::KeyboardView,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

/// Settings screen shown before a session
pub struct SetupView<'a>(pub &'a App);

impl Widget for SetupView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.0;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(2), // title
                Constraint::Length(1), // user
                Constraint::Length(2), // settings
                Constraint::Length(1), // dashboard
                Constraint::Length(3), // recent wpm
                Constraint::Length(2), // notice
                Constraint::Length(2), // quick starts
                Constraint::Length(1), // legend
                Constraint::Min(0),
            ])
            .split(area);

        Paragraph::new(Span::styled("typerush", bold().fg(Color::Magenta)))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        let user_line = match app.current_user() {
            Some(user) => Span::styled(format!("typing as {}", user.display_name), italic()),
            None => Span::styled(
                "not signed in: pass --user <name> to record scores",
                italic().fg(Color::Yellow),
            ),
        };
        Paragraph::new(user_line)
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        let settings = Line::from(vec![
            Span::styled("difficulty ", dim_bold()),
            Span::styled(app.session.difficulty().to_string(), bold().fg(Color::Cyan)),
            Span::styled("   duration ", dim_bold()),
            Span::styled(
                format!("{}s", app.session.duration_secs()),
                bold().fg(Color::Cyan),
            ),
        ]);
        Paragraph::new(settings)
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        if let Some(dashboard) = &app.dashboard {
            Paragraph::new(Span::styled(dashboard_line(dashboard), italic()))
                .alignment(Alignment::Center)
                .render(chunks[4], buf);

            let recent: Vec<u64> = dashboard.wpm_chart.iter().map(|p| p.value as u64).collect();
            let spark_width = (recent.len() as u16 * 2).min(chunks[5].width);
            let spark_area = Rect {
                x: chunks[5].x + (chunks[5].width - spark_width) / 2,
                width: spark_width,
                ..chunks[5]
            };
            Sparkline::default()
                .data(&recent)
                .style(Style::default().fg(Color::Magenta))
                .render(spark_area, buf);
        }

        if let Some(notice) = &app.notice {
            Paragraph::new(Span::styled(notice.as_str(), bold().fg(Color::Red)))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(chunks[6], buf);
        }

        let presets = QUICK_STARTS
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let cfg = crate::config::parse_launch_query(q);
                format!("({}) {} {}s", i + 1, cfg.difficulty, cfg.duration_secs)
            })
            .collect::<Vec<_>>()
            .join("   ");
        Paragraph::new(Span::styled(presets, italic()))
            .alignment(Alignment::Center)
            .render(chunks[7], buf);

        Paragraph::new(Span::styled(
            "(enter) start / (d)ifficulty / (t)ime / (p)rofile / (esc)ape",
            italic(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[8], buf);
    }
}

fn dashboard_line(dashboard: &DashboardSummary) -> String {
    if dashboard.recent.is_empty() {
        return "no tests yet".to_string();
    }
    let recent = dashboard
        .recent
        .iter()
        .map(|r| r.wpm.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "best {} wpm / avg {} wpm / recent {recent}",
        dashboard.high_score, dashboard.average_wpm
    )
}

/// Spans for the target text: typed characters colored by correctness, the next
/// expected character underlined while input has focus, the remainder dimmed
pub fn prompt_spans(
    target: &str,
    input: &str,
    outcomes: &[Outcome],
    focused: bool,
) -> Vec<Span<'static>> {
    let green = bold().fg(Color::Green);
    let red = bold().fg(Color::Red).add_modifier(Modifier::UNDERLINED);
    let target_chars: Vec<char> = target.chars().collect();

    let mut spans: Vec<Span> = input
        .chars()
        .zip(outcomes)
        .enumerate()
        .map(|(idx, (typed, outcome))| {
            let shown = target_chars.get(idx).copied().unwrap_or(typed);
            match outcome {
                Outcome::Correct => Span::styled(shown.to_string(), green),
                Outcome::Incorrect => Span::styled(
                    match shown {
                        ' ' => "·".to_owned(),
                        c => c.to_string(),
                    },
                    red,
                ),
            }
        })
        .collect();

    let cursor = outcomes.len();
    if let Some(next) = target_chars.get(cursor) {
        let style = if focused {
            dim_bold().add_modifier(Modifier::UNDERLINED)
        } else {
            dim_bold()
        };
        spans.push(Span::styled(next.to_string(), style));
    }
    if cursor + 1 < target_chars.len() {
        spans.push(Span::styled(
            target_chars[cursor + 1..].iter().collect::<String>(),
            dim_bold(),
        ));
    }
    spans
}

/// Screen shown while a session is running
pub struct TypingView<'a>(pub &'a App);

impl Widget for TypingView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.0;
        let session = &app.session;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(1)
            .constraints([
                Constraint::Length(2), // timer
                Constraint::Min(3),    // prompt
                Constraint::Length(1), // padding
                Constraint::Length(KeyboardView::HEIGHT),
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(
            format!("{} seconds left", session.remaining_secs()),
            bold().fg(Color::Red),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        let outcomes = session.char_outcomes();
        let spans = prompt_spans(
            session.target_text(),
            session.input(),
            &outcomes,
            app.input_focused,
        );

        // keep the cursor line in view for long passages
        let width = chunks[1].width.max(1) as usize;
        let typed_width = session.input().width();
        let cursor_line = (typed_width / width) as u16;
        let scroll = cursor_line.saturating_sub(chunks[1].height / 2);

        Paragraph::new(Line::from(spans))
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .render(chunks[1], buf);

        KeyboardView::new(&app.keyboard).render(chunks[3], buf);

        Paragraph::new(Span::styled("(tab) finish now / (esc) abandon", italic()))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }
}

/// Final metrics for the completed session
pub struct ResultsView<'a>(pub &'a App);

impl Widget for ResultsView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.0;
        let Some(outcome) = app.outcome.as_ref() else {
            return;
        };
        let metrics = &outcome.report.metrics;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(2), // banner
                Constraint::Length(2), // stats
                Constraint::Length(2), // detail
                Constraint::Length(2), // warning
                Constraint::Length(1), // legend
                Constraint::Min(0),
            ])
            .split(area);

        if outcome.is_new_high_score {
            Paragraph::new(Span::styled(
                "New High Score! Congratulations on your new personal best!",
                bold().fg(Color::Yellow),
            ))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
        }

        Paragraph::new(Span::styled(
            format!(
                "{} wpm   {}% acc   {}",
                metrics.wpm,
                metrics.accuracy,
                outcome.report.record.difficulty
            ),
            bold(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        Paragraph::new(Span::styled(
            format!(
                "{} words / {} of {} chars correct / {:.1}s / previous best {} wpm",
                metrics.word_count,
                metrics.correct_chars,
                metrics.typed_chars,
                metrics.elapsed_ms as f64 / 1000.0,
                outcome.prior_high
            ),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

        if let Some(warning) = outcome.warning() {
            Paragraph::new(Span::styled(warning, bold().fg(Color::Red)))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(chunks[4], buf);
        }

        Paragraph::new(Span::styled(
            "(r)etry / (n)ew settings / (p)rofile / (esc)ape",
            italic(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);

        if app.celebration.is_active {
            render_celebration(&app.celebration, area, buf);
        }
    }
}

/// Draw celebration particles on top of the results
fn render_celebration(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for particle in &celebration.particles {
        if particle.x < 0.0 || particle.y < 0.0 {
            continue;
        }
        let (x, y) = (particle.x as u16, particle.y as u16);
        if x >= area.width || y >= area.height {
            continue;
        }

        let color = colors[particle.color_index % colors.len()];
        let fading = particle.age / particle.max_age > 0.6;
        let style = match (particle.is_text, fading) {
            (true, _) => Style::default().fg(color).add_modifier(Modifier::BOLD),
            (false, true) => Style::default().fg(color).add_modifier(Modifier::DIM),
            (false, false) => Style::default().fg(color),
        };

        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_char(particle.symbol).set_style(style);
        }
    }
}
