//! Page layout in absolute millimetre coordinates.
//!
//! Coordinates are measured from the top-left corner of an A4 page; the
//! backend flips them. A [`PageFlow`] keeps a vertical cursor and starts a new
//! page whenever the next block would cross the bottom margin.

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 18.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const PT_TO_MM: f32 = 0.3528;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;
const LINE_SPACING: f32 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Colour {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    pub const BLACK: Colour = Colour::rgb(33, 37, 41);
    pub const MUTED: Colour = Colour::rgb(108, 117, 125);
    pub const WHITE: Colour = Colour::rgb(255, 255, 255);
    pub const BRAND: Colour = Colour::rgb(14, 116, 144);
    pub const ACCENT: Colour = Colour::rgb(245, 158, 11);
    pub const PANEL: Colour = Colour::rgb(241, 245, 249);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `y` is the text baseline.
    Text {
        x: f32,
        y: f32,
        size: f32,
        style: FontStyle,
        colour: Colour,
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        colour: Colour,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// All text on the page, one op per line.
    pub fn text(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                DrawOp::Rect { .. } => None,
            })
            .collect()
    }
}

pub fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * LINE_SPACING
}

/// Greedy word wrap using the average glyph width estimate. Words longer than
/// a line are split.
pub fn wrap_text(text: &str, size: f32, width: f32) -> Vec<String> {
    let glyph = size * PT_TO_MM * AVG_GLYPH_WIDTH;
    let max_chars = ((width / glyph).floor() as usize).max(1);

    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                lines.push(word.drain(..max_chars).collect());
            }
            let word: String = word.into_iter().collect();
            if word.is_empty() {
                continue;
            }

            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}

/// Vertical flow of blocks over as many pages as needed.
#[derive(Debug, Clone)]
pub struct PageFlow {
    pages: Vec<Page>,
    y: f32,
}

impl Default for PageFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl PageFlow {
    pub fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: MARGIN,
        }
    }

    pub fn cursor(&self) -> f32 {
        self.y
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = MARGIN;
    }

    /// Start a new section page unless the current page is still empty.
    pub fn section(&mut self) {
        let current_is_empty = self.pages.last().map_or(true, |page| page.ops.is_empty());
        if !current_is_empty {
            self.new_page();
        }
    }

    /// Break the page if a block of `height` does not fit below the cursor.
    pub fn ensure(&mut self, height: f32) -> bool {
        if self.y + height > PAGE_HEIGHT - MARGIN && self.y > MARGIN {
            self.new_page();
            true
        } else {
            false
        }
    }

    pub fn advance(&mut self, height: f32) {
        self.y += height;
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    /// Place a shape at an absolute position without moving the cursor.
    pub fn rect_at(&mut self, x: f32, y: f32, width: f32, height: f32, colour: Colour) {
        self.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            colour,
        });
    }

    /// Place one line at an absolute baseline without moving the cursor.
    pub fn text_at(&mut self, x: f32, y: f32, size: f32, style: FontStyle, colour: Colour, text: &str) {
        self.push(DrawOp::Text {
            x,
            y,
            size,
            style,
            colour,
            text: text.to_string(),
        });
    }

    /// Wrapped text at `indent` from the left margin, line by line so long
    /// paragraphs can break across pages.
    pub fn paragraph(&mut self, text: &str, size: f32, style: FontStyle, colour: Colour, indent: f32) {
        let height = line_height(size);
        for line in wrap_text(text, size, CONTENT_WIDTH - indent) {
            self.ensure(height);
            let baseline = self.y + size * PT_TO_MM;
            self.text_at(MARGIN + indent, baseline, size, style, colour, &line);
            self.y += height;
        }
    }

    pub fn heading(&mut self, text: &str, size: f32) {
        self.ensure(line_height(size) + line_height(10.0) * 2.0);
        self.paragraph(text, size, FontStyle::Bold, Colour::BRAND, 0.0);
        let y = self.y;
        self.rect_at(MARGIN, y, 24.0, 0.8, Colour::ACCENT);
        self.y += 4.0;
    }

    pub fn bullets(&mut self, items: &[String], size: f32) {
        for item in items {
            let first_line = line_height(size);
            self.ensure(first_line);
            let baseline = self.y + size * PT_TO_MM;
            self.text_at(MARGIN + 2.0, baseline, size, FontStyle::Bold, Colour::ACCENT, "-");
            self.paragraph(item, size, FontStyle::Regular, Colour::BLACK, 7.0);
        }
    }

    /// `label: value` on one row, label in bold.
    pub fn key_value(&mut self, label: &str, value: &str, size: f32) {
        const LABEL_WIDTH: f32 = 45.0;
        let lines = wrap_text(value, size, CONTENT_WIDTH - LABEL_WIDTH);
        let height = line_height(size) * lines.len().max(1) as f32;
        self.ensure(height);

        let baseline = self.y + size * PT_TO_MM;
        self.text_at(MARGIN, baseline, size, FontStyle::Bold, Colour::MUTED, label);
        for (index, line) in lines.iter().enumerate() {
            let y = baseline + index as f32 * line_height(size);
            self.text_at(MARGIN + LABEL_WIDTH, y, size, FontStyle::Regular, Colour::BLACK, line);
        }
        self.y += height;
    }

    pub fn spacer(&mut self, height: f32) {
        self.y += height;
    }

    /// Finish layout, stamping a footer on every page.
    pub fn finish(mut self, footer: &str) -> Vec<Page> {
        let total = self.pages.len();
        for (index, page) in self.pages.iter_mut().enumerate() {
            let baseline = PAGE_HEIGHT - MARGIN / 2.0;
            page.ops.push(DrawOp::Text {
                x: MARGIN,
                y: baseline,
                size: 8.0,
                style: FontStyle::Regular,
                colour: Colour::MUTED,
                text: footer.to_string(),
            });
            page.ops.push(DrawOp::Text {
                x: PAGE_WIDTH - MARGIN - 22.0,
                y: baseline,
                size: 8.0,
                style: FontStyle::Regular,
                colour: Colour::MUTED,
                text: format!("Page {} of {}", index + 1, total),
            });
        }
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_text("the quick brown fox jumps over the lazy dog", 10.0, 30.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| line.chars().count() <= 17));
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn splits_words_longer_than_a_line() {
        let lines = wrap_text(&"x".repeat(40), 10.0, 10.0);
        assert!(lines.len() >= 6);
        assert!(lines.iter().all(|line| !line.is_empty()));
    }

    #[test]
    fn breaks_page_when_block_would_cross_bottom_margin() {
        let mut flow = PageFlow::new();
        flow.advance(PAGE_HEIGHT - MARGIN - 5.0);
        assert!(flow.ensure(10.0));
        assert_eq!(flow.page_count(), 2);
        assert_eq!(flow.cursor(), MARGIN);

        assert!(!flow.ensure(10.0));
        assert_eq!(flow.page_count(), 2);
    }

    #[test]
    fn long_paragraph_spills_onto_new_pages() {
        let mut flow = PageFlow::new();
        let text = "Lorem ipsum dolor sit amet. ".repeat(400);
        flow.paragraph(&text, 10.0, FontStyle::Regular, Colour::BLACK, 0.0);
        assert!(flow.page_count() > 1);

        let pages = flow.finish("footer");
        for page in &pages {
            for op in &page.ops {
                if let DrawOp::Text { y, .. } = op {
                    assert!(*y <= PAGE_HEIGHT - MARGIN / 2.0 + 0.01);
                }
            }
        }
        assert_eq!(pages.last().map(|p| p.text().contains(&"footer")), Some(true));
    }

    #[test]
    fn section_reuses_an_empty_page() {
        let mut flow = PageFlow::new();
        flow.section();
        assert_eq!(flow.page_count(), 1);
        flow.heading("Itinerary", 18.0);
        flow.section();
        assert_eq!(flow.page_count(), 2);
    }
}
