use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::keyboard::{VirtualKeyboard, KEYBOARD_LAYOUT};

/// On-screen keyboard with the last typed key lit up
pub struct KeyboardView<'a> {
    keyboard: &'a VirtualKeyboard,
}

impl<'a> KeyboardView<'a> {
    pub const HEIGHT: u16 = KEYBOARD_LAYOUT.len() as u16;

    pub fn new(keyboard: &'a VirtualKeyboard) -> Self {
        Self { keyboard }
    }

    pub fn lines(&self) -> Vec<Line<'static>> {
        let plain = Style::default().add_modifier(Modifier::DIM);
        let lit = Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD);

        KEYBOARD_LAYOUT
            .iter()
            .enumerate()
            .map(|(row, keys)| {
                let spans: Vec<Span> = keys
                    .iter()
                    .enumerate()
                    .flat_map(|(col, label)| {
                        let style = if self.keyboard.is_highlighted(row, col) {
                            lit
                        } else {
                            plain
                        };
                        [Span::styled(format!("[{label}]"), style), Span::raw(" ")]
                    })
                    .collect();
                Line::from(spans)
            })
            .collect()
    }
}

impl Widget for KeyboardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.lines())
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_only_the_pressed_key() {
        let mut keyboard = VirtualKeyboard::new();
        keyboard.press(Some('q'));

        let lines = KeyboardView::new(&keyboard).lines();
        let lit: Vec<String> = lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .filter(|s| s.style.bg == Some(Color::Cyan))
            .map(|s| s.content.to_string())
            .collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lit, vec!["[q]"]);
    }

    #[test]
    fn nothing_lit_before_typing() {
        let keyboard = VirtualKeyboard::new();
        let lines = KeyboardView::new(&keyboard).lines();

        assert!(lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .all(|s| s.style.bg.is_none()));
    }
}
