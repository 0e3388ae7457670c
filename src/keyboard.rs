/// Static keyboard layout, row by row
pub const KEYBOARD_LAYOUT: [&[&str]; 5] = [
    &["`", "1", "2", "3", "4", "5", "6", "7", "8", "9", "0", "-", "=", "Backspace"],
    &["Tab", "q", "w", "e", "r", "t", "y", "u", "i", "o", "p", "[", "]", "\\"],
    &["Caps", "a", "s", "d", "f", "g", "h", "j", "k", "l", ";", "'", "Enter"],
    &["Shift", "z", "x", "c", "v", "b", "n", "m", ",", ".", "/", "Shift"],
    &["Ctrl", "Win", "Alt", "Space", "Alt", "Menu", "Ctrl"],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPos {
    pub row: usize,
    pub col: usize,
}

/// Position of the key for a typed character, matched case-insensitively.
/// A typed space maps to the space bar.
pub fn key_for(c: char) -> Option<KeyPos> {
    let wanted = if c == ' ' {
        "space".to_string()
    } else {
        c.to_lowercase().collect::<String>()
    };

    KEYBOARD_LAYOUT.iter().enumerate().find_map(|(row, keys)| {
        keys.iter()
            .position(|label| label.to_lowercase() == wanted)
            .map(|col| KeyPos { row, col })
    })
}

/// Tracks which key to highlight for the last typed character
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualKeyboard {
    highlighted: Option<KeyPos>,
}

impl VirtualKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, last_typed: Option<char>) {
        self.highlighted = last_typed.and_then(key_for);
    }

    pub fn highlighted(&self) -> Option<KeyPos> {
        self.highlighted
    }

    pub fn is_highlighted(&self, row: usize, col: usize) -> bool {
        self.highlighted == Some(KeyPos { row, col })
    }

    pub fn highlighted_label(&self) -> Option<&'static str> {
        self.highlighted.map(|p| KEYBOARD_LAYOUT[p.row][p.col])
    }
}
