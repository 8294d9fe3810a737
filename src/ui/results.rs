use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};

use dactyl::metrics::{format_clock, GoalBand, GoalProgress, SessionResult};

use super::{marked_lines, HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::App;

pub(crate) struct ResultsLayout {
    pub stats: Rect,
    pub detail: Rect,
    pub goal: Rect,
    pub review: Rect,
    pub legend: Rect,
}

pub(crate) fn results_layout(area: Rect) -> ResultsLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // wpm / accuracy
            Constraint::Length(1), // words / time
            Constraint::Length(1), // padding
            Constraint::Length(3), // goal gauge
            Constraint::Min(3),    // typed text review
            Constraint::Length(1), // legend
        ])
        .split(area);

    ResultsLayout {
        stats: chunks[0],
        detail: chunks[1],
        goal: chunks[3],
        review: chunks[4],
        legend: chunks[5],
    }
}

/// Gauge colour, from red at the bottom to greens past the goal
pub fn band_color(band: GoalBand) -> Color {
    match band {
        GoalBand::Critical => Color::Red,
        GoalBand::Low => Color::LightRed,
        GoalBand::Fair => Color::Rgb(255, 165, 0),
        GoalBand::Near => Color::Yellow,
        GoalBand::Met => Color::LightGreen,
        GoalBand::Strong => Color::Green,
        GoalBand::Excellent => Color::Rgb(0, 160, 60),
        GoalBand::Outstanding => Color::Rgb(0, 120, 40),
    }
}

pub fn stats_line(result: &SessionResult) -> String {
    format!("{} wpm   {}% acc", result.wpm, result.accuracy)
}

pub fn detail_line(result: &SessionResult) -> String {
    format!(
        "{} of {} words correct   {} wrong   {} typed   {}",
        result.correct_words,
        result.total_words,
        result.error_words,
        result.typed_words,
        format_clock(result.time_elapsed)
    )
}

pub fn goal_label(goal: &GoalProgress) -> String {
    format!(
        "{} / {} words ({:.0}%){}",
        goal.correct_words,
        goal.minimum_words,
        goal.percent,
        if goal.passed() { "  passed" } else { "" }
    )
}

pub(crate) fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let layout = results_layout(area);

    let Some(result) = app.session.result() else {
        return;
    };

    Paragraph::new(Span::styled(stats_line(result), bold_style))
        .alignment(Alignment::Center)
        .render(layout.stats, buf);

    Paragraph::new(Span::styled(
        detail_line(result),
        Style::default().fg(Color::Gray),
    ))
    .alignment(Alignment::Center)
    .render(layout.detail, buf);

    if let Some(goal) = result.goal() {
        let title = match &app.test {
            Some(test) => format!(" goal: {} words in {} min ", test.minimum_words, test.minutes),
            None => format!(" goal: {} words ", goal.minimum_words),
        };
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(title))
            .gauge_style(Style::default().fg(band_color(goal.band)))
            .ratio(goal.ratio())
            .label(goal_label(&goal))
            .render(layout.goal, buf);
    }

    let review_block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" review {} ", result.finished_at.format("%H:%M")));
    let inner = review_block.inner(layout.review);
    review_block.render(layout.review, buf);
    Paragraph::new(marked_lines(app.session.word_states(), inner.width))
        .scroll((app.scroll.offset(), 0))
        .render(inner, buf);

    Paragraph::new(Line::from(Span::styled(
        "(r)etry / (n)ew text / (esc)ape",
        italic_style,
    )))
    .render(layout.legend, buf);
}
