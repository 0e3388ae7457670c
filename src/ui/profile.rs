use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Widget,
    },
};

use crate::{
    app::App,
    scores::{ChartPoint, ProfileSummary, ScoreRecord},
    ui::charting::{chart_tuples, compute_chart_params, format_label},
};

/// Pure presenter for one history row
pub fn present_score_row(record: &ScoreRecord) -> Row<'static> {
    let accuracy_color = match record.accuracy {
        95..=100 => Color::Green,
        85..=94 => Color::Yellow,
        _ => Color::Red,
    };

    Row::new(vec![
        Cell::from(record.wpm.to_string()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format!("{}%", record.accuracy)).style(Style::default().fg(accuracy_color)),
        Cell::from(record.difficulty.to_string()),
        Cell::from(format!("{}s", record.duration_secs)),
        Cell::from(
            record
                .completed_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
        ),
    ])
}

fn history_chart<'a>(
    title: &'a str,
    points: &[ChartPoint],
    tuples: &'a [(f64, f64)],
    color: Color,
) -> Chart<'a> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let (last_test, highest) = compute_chart_params(points, 10.0);

    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(Style::default().fg(color))
        .graph_type(GraphType::Line)
        .data(tuples)];

    Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_axis(
            Axis::default()
                .title("test")
                .bounds([1.0, last_test])
                .labels(vec![
                    Span::styled("1", bold),
                    Span::styled(format_label(last_test), bold),
                ]),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, highest])
                .labels(vec![
                    Span::styled("0", bold),
                    Span::styled(format_label(highest), bold),
                ]),
        )
}

fn headline(summary: &ProfileSummary) -> String {
    let per_tier = summary
        .by_difficulty
        .iter()
        .map(|(d, n)| format!("{d} {n}"))
        .collect::<Vec<_>>()
        .join(" / ");
    format!(
        "{} tests   best {} wpm   avg {} wpm   avg {}% acc   ({per_tier})",
        summary.total_tests, summary.high_score, summary.average_wpm, summary.average_accuracy
    )
}

/// Lifetime stats for the signed-in user
pub struct ProfileView<'a>(pub &'a App);

impl Widget for ProfileView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.0;
        let title = app
            .current_user()
            .map_or_else(|| "Profile".to_string(), |u| format!("Profile: {}", u.display_name));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),  // title + stats
                Constraint::Length(12), // charts
                Constraint::Min(4),     // history
                Constraint::Length(1),  // legend
            ])
            .split(area);

        let Some(summary) = app.profile.as_ref() else {
            Paragraph::new("no profile loaded")
                .alignment(Alignment::Center)
                .render(chunks[0], buf);
            return;
        };

        Paragraph::new(headline(summary))
            .block(Block::default().borders(Borders::ALL).title(title))
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        if summary.total_tests == 0 {
            Paragraph::new("No tests yet. Finish a session to start your history.")
                .alignment(Alignment::Center)
                .render(chunks[2], buf);
        } else {
            let charts = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[1]);

            let wpm = chart_tuples(&summary.wpm_series);
            let accuracy = chart_tuples(&summary.accuracy_series);
            history_chart("wpm", &summary.wpm_series, &wpm, Color::Magenta)
                .render(charts[0], buf);
            history_chart("accuracy", &summary.accuracy_series, &accuracy, Color::Green)
                .render(charts[1], buf);

            let visible = chunks[2].height.saturating_sub(3) as usize;
            let rows: Vec<Row> = summary
                .scores
                .iter()
                .take(visible)
                .map(present_score_row)
                .collect();

            let header = Row::new(vec!["WPM", "Acc", "Difficulty", "Time", "Completed"])
                .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));

            Table::new(
                rows,
                [
                    Constraint::Length(6),
                    Constraint::Length(6),
                    Constraint::Length(11),
                    Constraint::Length(6),
                    Constraint::Min(16),
                ],
            )
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("History"))
            .render(chunks[2], buf);
        }

        Paragraph::new(Span::styled(
            "(b)ack / (esc) back",
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Difficulty;
    use chrono::{TimeZone, Utc};

    fn record(wpm: u32, accuracy: u8, difficulty: Difficulty) -> ScoreRecord {
        ScoreRecord {
            wpm,
            accuracy,
            difficulty,
            duration_secs: 60,
            completed_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn headline_lists_totals_and_tiers() {
        let summary = ProfileSummary::from_records(&[
            record(40, 90, Difficulty::Easy),
            record(60, 100, Difficulty::Hard),
        ]);

        let text = headline(&summary);

        assert!(text.starts_with("2 tests   best 60 wpm   avg 50 wpm   avg 95% acc"));
        assert!(text.contains("easy 1 / medium 0 / hard 1"));
    }

    #[test]
    fn profile_renders_history_rows() {
        let rows: Vec<Row> = [record(40, 90, Difficulty::Easy)]
            .iter()
            .map(present_score_row)
            .collect();
        assert_eq!(rows.len(), 1);
    }
}
