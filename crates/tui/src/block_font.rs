use std::collections::HashMap;

use once_cell::sync::Lazy;

const FONT_HEIGHT: usize = 5;
const FONT_WIDTH: usize = 5;
const FILL_CHAR: char = '█';

type Glyph = [&'static str; FONT_HEIGHT];

static GLYPHS: Lazy<HashMap<char, Glyph>> = Lazy::new(|| {
    HashMap::from([
        ('A', [" 111 ", "1   1", "11111", "1   1", "1   1"]),
        ('B', ["1111 ", "1   1", "1111 ", "1   1", "1111 "]),
        ('C', [" 1111", "1    ", "1    ", "1    ", " 1111"]),
        ('D', ["1111 ", "1   1", "1   1", "1   1", "1111 "]),
        ('E', ["11111", "1    ", "111  ", "1    ", "11111"]),
        ('F', ["11111", "1    ", "111  ", "1    ", "1    "]),
        ('G', [" 1111", "1    ", "1  11", "1   1", " 111 "]),
        ('H', ["1   1", "1   1", "11111", "1   1", "1   1"]),
        ('I', ["11111", "  1  ", "  1  ", "  1  ", "11111"]),
        ('J', ["    1", "    1", "    1", "1   1", " 111 "]),
        ('K', ["1   1", "1  1 ", "111  ", "1  1 ", "1   1"]),
        ('L', ["1    ", "1    ", "1    ", "1    ", "11111"]),
        ('M', ["1   1", "11 11", "1 1 1", "1   1", "1   1"]),
        ('N', ["1   1", "11  1", "1 1 1", "1  11", "1   1"]),
        ('O', [" 111 ", "1   1", "1   1", "1   1", " 111 "]),
        ('P', ["1111 ", "1   1", "1111 ", "1    ", "1    "]),
        ('Q', [" 111 ", "1   1", "1   1", "1  11", " 1111"]),
        ('R', ["1111 ", "1   1", "1111 ", "1  1 ", "1   1"]),
        ('S', [" 1111", "1    ", " 111 ", "    1", "1111 "]),
        ('T', ["11111", "  1  ", "  1  ", "  1  ", "  1  "]),
        ('U', ["1   1", "1   1", "1   1", "1   1", " 111 "]),
        ('V', ["1   1", "1   1", "1   1", " 1 1 ", "  1  "]),
        ('W', ["1   1", "1   1", "1 1 1", "11 11", "1   1"]),
        ('X', ["1   1", " 1 1 ", "  1  ", " 1 1 ", "1   1"]),
        ('Y', ["1   1", " 1 1 ", "  1  ", "  1  ", "  1  "]),
        ('Z', ["11111", "   1 ", "  1  ", " 1   ", "11111"]),
        ('?', [" 111 ", "1   1", "  11 ", "     ", "  1  "]),
        (' ', ["     ", "     ", "     ", "     ", "     "]),
    ])
});

/// Render `text` as banner lines using the block glyph set.
pub fn render(text: &str) -> Vec<String> {
    let content: Vec<char> = text.chars().map(|c| c.to_ascii_uppercase()).collect();
    if content.is_empty() {
        return vec![String::new(); FONT_HEIGHT];
    }

    let mut lines = vec![String::new(); FONT_HEIGHT];
    for (index, ch) in content.iter().enumerate() {
        let glyph = GLYPHS.get(ch).or_else(|| GLYPHS.get(&'?')).unwrap();
        for (row_idx, row) in glyph.iter().enumerate() {
            if index > 0 {
                lines[row_idx].push(' ');
            }
            for symbol in row.chars().take(FONT_WIDTH) {
                lines[row_idx].push(if symbol == '1' { FILL_CHAR } else { ' ' });
            }
        }
    }

    lines
        .into_iter()
        .map(|line| line.trim_end().to_string())
        .collect()
}
