pub mod results;
pub mod scroll;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use dactyl::compare::{focus_index, WordState, WordStatus};
use dactyl::metrics::format_clock;

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

/// Draw the current screen, keeping the focused word in view first
pub fn ui(app: &mut App, f: &mut Frame) {
    let area = f.area();
    let viewport = text_viewport(app.state, area);
    let words: Vec<&str> = app
        .session
        .word_states()
        .iter()
        .map(|s| s.word.as_str())
        .collect();
    let lines = scroll::word_lines(&words, viewport.width);
    let focus = match app.state {
        AppState::Typing => focus_index(app.session.word_states()),
        AppState::Idle | AppState::Results => None,
    };
    app.scroll.follow(focus, &lines, viewport.height);

    f.render_widget(&*app, area);
}

pub(crate) fn status_style(status: WordStatus) -> Style {
    match status {
        WordStatus::Correct => Style::default().fg(Color::Green),
        WordStatus::Error => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::UNDERLINED),
        WordStatus::Current => Style::default()
            .fg(Color::Black)
            .bg(Color::LightBlue)
            .add_modifier(Modifier::BOLD),
        WordStatus::Pending => Style::default().add_modifier(Modifier::DIM),
    }
}

/// Lay out classified words into wrapped, styled lines
pub(crate) fn marked_lines(states: &[WordState], width: u16) -> Vec<Line<'static>> {
    let words: Vec<&str> = states.iter().map(|s| s.word.as_str()).collect();
    let placement = scroll::word_lines(&words, width);

    let mut lines: Vec<Line<'static>> = Vec::new();
    for (state, line) in states.iter().zip(placement) {
        if lines.len() <= line {
            lines.push(Line::default());
        } else {
            lines[line].spans.push(Span::raw(" "));
        }
        lines[line]
            .spans
            .push(Span::styled(state.word.clone(), status_style(state.status)));
    }
    lines
}

/// The last part of `text` that fits in `width` columns
pub(crate) fn tail_fitting(text: &str, width: usize) -> String {
    let mut used = 0;
    let mut start = text.len();
    for (idx, c) in text.char_indices().rev() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        start = idx;
    }
    text[start..].replace('\n', " ")
}

struct TypingLayout {
    header: Rect,
    text: Rect,
    input: Rect,
    legend: Rect,
}

fn typing_layout(area: Rect) -> TypingLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // clock + metrics
            Constraint::Length(1), // padding
            Constraint::Min(3),    // reference text
            Constraint::Length(3), // typed text
            Constraint::Length(1), // legend
        ])
        .split(area);

    TypingLayout {
        header: chunks[0],
        text: chunks[2],
        input: chunks[3],
        legend: chunks[4],
    }
}

/// Inner area the reference text is drawn into for a given screen
fn text_viewport(state: AppState, area: Rect) -> Rect {
    let outer = match state {
        AppState::Idle | AppState::Typing => typing_layout(area).text,
        AppState::Results => results::results_layout(area).review,
    };
    Block::default().borders(Borders::ALL).inner(outer)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Idle | AppState::Typing => render_typing(self, area, buf),
            AppState::Results => results::render_results(self, area, buf),
        }
    }
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let layout = typing_layout(area);
    let session = &app.session;
    let running = app.state == AppState::Typing;

    // header
    let clock_style = if running && session.remaining_secs() <= 10 {
        bold_style.fg(Color::Red)
    } else {
        bold_style
    };
    let mut header = vec![Span::styled(format_clock(session.remaining_secs()), clock_style)];
    if running {
        let live = session.live_metrics();
        header.push(Span::styled(
            format!("   {} wpm   {} correct", live.wpm, live.correct_words),
            bold_style,
        ));
    } else if let Some(test) = &app.test {
        header.push(Span::styled(
            format!(
                "   {} ({} min, goal {} words)",
                test.name, test.minutes, test.minimum_words
            ),
            dim_bold_style,
        ));
    }
    Paragraph::new(Line::from(header))
        .alignment(Alignment::Center)
        .render(layout.header, buf);

    // reference text
    let text_block = Block::default().borders(Borders::ALL).title(" text ");
    let inner = text_block.inner(layout.text);
    text_block.render(layout.text, buf);

    match session.content().reference() {
        Some(_) => {
            Paragraph::new(marked_lines(session.word_states(), inner.width))
                .scroll((app.scroll.offset(), 0))
                .render(inner, buf);
        }
        None => {
            Paragraph::new(Span::styled(
                session.content().display_text().to_string(),
                italic_style.fg(Color::Yellow),
            ))
            .alignment(Alignment::Center)
            .wrap(ratatui::widgets::Wrap { trim: true })
            .render(inner, buf);
        }
    }

    // typed text
    let input_block = Block::default().borders(Borders::ALL).title(" typing ");
    let inner = input_block.inner(layout.input);
    input_block.render(layout.input, buf);
    if running {
        let width = usize::from(inner.width.saturating_sub(1));
        let typed = tail_fitting(session.input().raw(), width);
        Paragraph::new(Line::from(vec![
            Span::raw(typed),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]))
        .render(inner, buf);
    }

    let legend = if running {
        "(tab) finish / (esc) cancel"
    } else if !session.can_start() {
        "(n)ew text / (esc)ape"
    } else if app.test.is_some() {
        "(enter) start / (n)ew text / (esc)ape"
    } else {
        "(enter) start / (n)ew text / (+/-) minutes / (esc)ape"
    };
    Paragraph::new(Span::styled(legend, italic_style)).render(layout.legend, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use dactyl::compare::compare_text;

    #[test]
    fn test_marked_lines_wrap_and_style() {
        let states = compare_text("el perro corre rapido", "el gato co");
        let lines = marked_lines(&states, 9);

        // "el perro" | "corre" | "rapido"
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].spans.len(), 3);
        assert_eq!(lines[0].spans[0].content, "el");
        assert_eq!(lines[0].spans[0].style, status_style(WordStatus::Correct));
        assert_eq!(lines[0].spans[2].style, status_style(WordStatus::Error));
        assert_eq!(lines[1].spans[0].style, status_style(WordStatus::Current));
        assert_eq!(lines[2].spans[0].style, status_style(WordStatus::Pending));
    }

    #[test]
    fn test_marked_lines_empty() {
        assert!(marked_lines(&[], 20).is_empty());
    }

    #[test]
    fn test_tail_fitting() {
        assert_eq!(tail_fitting("el perro corre", 5), "corre");
        assert_eq!(tail_fitting("el perro", 20), "el perro");
        assert_eq!(tail_fitting("", 5), "");
        assert_eq!(tail_fitting("línea\nnueva", 11), "línea nueva");
        assert_eq!(tail_fitting("abc", 0), "");
    }

    #[test]
    fn test_text_viewport_is_inside_area() {
        let area = Rect::new(0, 0, 80, 24);
        for state in [AppState::Idle, AppState::Typing, AppState::Results] {
            let viewport = text_viewport(state, area);
            assert!(viewport.width > 0 && viewport.height > 0);
            assert!(viewport.right() <= area.right());
            assert!(viewport.bottom() <= area.bottom());
        }
    }
}
