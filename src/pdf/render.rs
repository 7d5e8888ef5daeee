use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};

use super::layout::{Colour, DrawOp, FontStyle, Page, PAGE_HEIGHT, PAGE_WIDTH};

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("nothing to render")]
    Empty,

    #[error("font setup failed: {0}")]
    Font(String),

    #[error("could not serialize document: {0}")]
    Write(String),
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
        }
    }
}

fn fill(colour: Colour) -> Color {
    Color::Rgb(Rgb::new(colour.r, colour.g, colour.b, None))
}

/// Built-in PDF fonts only cover a Latin character set; map the rest.
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '→' => "->".to_string(),
            '–' | '—' => "-".to_string(),
            '‘' | '’' => "'".to_string(),
            '“' | '”' => "\"".to_string(),
            '•' => "-".to_string(),
            c if c.is_ascii() && !c.is_ascii_control() => c.to_string(),
            _ => "?".to_string(),
        })
        .collect()
}

fn draw(layer: &PdfLayerReference, fonts: &Fonts, op: &DrawOp) {
    match op {
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            colour,
        } => {
            layer.set_fill_color(fill(*colour));
            let rect = Rect::new(
                Mm(*x),
                Mm(PAGE_HEIGHT - y - height),
                Mm(x + width),
                Mm(PAGE_HEIGHT - y),
            )
            .with_mode(PaintMode::Fill);
            layer.add_rect(rect);
        }
        DrawOp::Text {
            x,
            y,
            size,
            style,
            colour,
            text,
        } => {
            layer.set_fill_color(fill(*colour));
            layer.use_text(printable(text), *size, Mm(*x), Mm(PAGE_HEIGHT - y), fonts.get(*style));
        }
    }
}

/// Serialize laid-out pages into PDF bytes.
pub fn render(title: &str, pages: &[Page]) -> Result<Vec<u8>, PdfError> {
    let (first, rest) = pages.split_first().ok_or(PdfError::Empty)?;

    let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|err| PdfError::Font(format!("{err:?}")))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|err| PdfError::Font(format!("{err:?}")))?,
    };

    let current = doc.get_page(page).get_layer(layer);
    for op in &first.ops {
        draw(&current, &fonts, op);
    }
    for next in rest {
        let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
        let current = doc.get_page(page).get_layer(layer);
        for op in &next.ops {
            draw(&current, &fonts, op);
        }
    }

    doc.save_to_bytes()
        .map_err(|err| PdfError::Write(format!("{err:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::layout::PageFlow;

    #[test]
    fn renders_a_pdf_header() {
        let mut flow = PageFlow::new();
        flow.heading("Hello → world", 18.0);
        flow.new_page();
        flow.paragraph("Second page", 10.0, FontStyle::Regular, Colour::BLACK, 0.0);
        let bytes = render("test", &flow.finish("footer")).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn filled_panels_render() {
        let mut flow = PageFlow::new();
        flow.rect_at(0.0, 0.0, PAGE_WIDTH, 40.0, Colour::BRAND);
        flow.text_at(20.0, 25.0, 24.0, FontStyle::Bold, Colour::WHITE, "Cover");
        let bytes = render("panels", &flow.finish("footer")).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_documents_are_rejected() {
        assert!(matches!(render("empty", &[]), Err(PdfError::Empty)));
    }

    #[test]
    fn non_latin_text_is_replaced() {
        assert_eq!(printable("Bali → Ubud"), "Bali -> Ubud");
        assert_eq!(printable("東京"), "??");
    }
}
