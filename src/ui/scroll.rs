use unicode_width::UnicodeWidthStr;

/// Greedy word wrap: the line each word lands on for a given width.
///
/// Words wider than the line get a line of their own.
pub fn word_lines<S: AsRef<str>>(words: &[S], width: u16) -> Vec<usize> {
    let width = usize::from(width.max(1));
    let mut lines = Vec::with_capacity(words.len());
    let (mut line, mut used) = (0usize, 0usize);

    for word in words {
        let w = word.as_ref().width();
        if used > 0 && used + 1 + w > width {
            line += 1;
            used = 0;
        }
        used += if used == 0 { w } else { w + 1 };
        lines.push(line);
    }

    lines
}

/// Keeps the focused word in view.
///
/// The offset only moves when the focused word changes, so manual resizes
/// or redraws do not make the text jump around.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollState {
    focus: Option<usize>,
    offset: usize,
}

impl ScrollState {
    /// Offset for `Paragraph::scroll`, which cannot go past `u16::MAX`
    pub fn offset(&self) -> u16 {
        u16::try_from(self.offset).unwrap_or(u16::MAX)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn follow(&mut self, focus: Option<usize>, lines: &[usize], viewport: u16) {
        let viewport = usize::from(viewport);
        let total = lines.last().map_or(0, |l| l + 1);
        let max_offset = total.saturating_sub(viewport);

        if focus != self.focus {
            self.focus = focus;
            if let Some(line) = focus.and_then(|idx| lines.get(idx)) {
                let top = self.offset;
                let bottom = self.offset + viewport;
                if *line < top || *line >= bottom {
                    self.offset = line.saturating_sub(viewport / 2);
                }
            }
        }

        self.offset = self.offset.min(max_offset);
    }
}
