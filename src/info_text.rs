use crate::theme::{Background, Rgb};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Side padding, in cells, around the label pair.
const PADDING: u16 = 1;
/// Gap between name and value in horizontal mode.
const GAP: u16 = 1;

/// A name/value label pair with optional background.
///
/// Owners push the two strings and the resolved styles in right before
/// each draw; this widget only does measurement and cell writes.
#[derive(Debug, Clone)]
pub struct InfoText {
    pub name: String,
    pub value: String,
    pub display_two_rows: bool,
    pub background: Background,
    pub name_style: Style,
    pub value_style: Style,
    pub name_shadow: bool,
    pub value_shadow: bool,
}

impl InfoText {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            display_two_rows: false,
            background: Background::default(),
            name_style: Style::default(),
            value_style: Style::default(),
            name_shadow: false,
            value_shadow: false,
        }
    }

    pub fn vertical_height(&self) -> u16 {
        if self.display_two_rows {
            2
        } else {
            1
        }
    }

    pub fn minimum_height(&self) -> u16 {
        1
    }

    pub fn minimum_width(&self) -> u16 {
        let widest = self.name.width().max(self.value.width()) as u16;
        widest + 2 * PADDING
    }

    pub fn horizontal_width(&self) -> u16 {
        (self.name.width() + self.value.width()) as u16 + GAP + 2 * PADDING
    }

    /// Stacked layout: one row with the name left and the value right,
    /// or two rows with the value beneath the name. The value is drawn
    /// last, so it wins any overlap in a too-narrow area.
    pub fn draw_vertical(&self, buf: &mut Buffer, area: Rect) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        self.fill_background(buf, area);

        let name_x = area.x + PADDING.min(area.width - 1);
        if self.display_two_rows && area.height >= 2 {
            self.draw_label(buf, area, name_x, area.y, &self.name, self.name_style, self.name_shadow);
            let value_x = self.right_aligned_x(area, &self.value);
            self.draw_label(buf, area, value_x, area.y + 1, &self.value, self.value_style, self.value_shadow);
        } else {
            self.draw_label(buf, area, name_x, area.y, &self.name, self.name_style, self.name_shadow);
            let value_x = self.right_aligned_x(area, &self.value);
            self.draw_label(buf, area, value_x, area.y, &self.value, self.value_style, self.value_shadow);
        }
    }

    /// Side-by-side layout: name, gap, value on the vertically centered
    /// row of the area.
    pub fn draw_horizontal(&self, buf: &mut Buffer, area: Rect) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        self.fill_background(buf, area);

        let y = area.y + area.height / 2;
        let name_x = area.x + PADDING.min(area.width - 1);
        self.draw_label(buf, area, name_x, y, &self.name, self.name_style, self.name_shadow);
        let value_x = name_x + self.name.width() as u16 + GAP;
        self.draw_label(buf, area, value_x, y, &self.value, self.value_style, self.value_shadow);
    }

    fn right_aligned_x(&self, area: Rect, text: &str) -> u16 {
        let text_width = text.width() as u16 + PADDING;
        area.right().saturating_sub(text_width).max(area.x)
    }

    fn fill_background(&self, buf: &mut Buffer, area: Rect) {
        for y in 0..area.height {
            for x in 0..area.width {
                if let Some(color) = self.background.color_at(x, y, area.width, area.height) {
                    if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                        cell.set_bg(color.to_color());
                    }
                }
            }
        }
    }

    fn draw_label(
        &self,
        buf: &mut Buffer,
        area: Rect,
        x: u16,
        y: u16,
        text: &str,
        style: Style,
        shadow: bool,
    ) {
        if y >= area.bottom() {
            return;
        }
        let mut x = x;
        for symbol in text.chars() {
            let symbol_width = symbol.width().unwrap_or(0) as u16;
            if symbol_width == 0 {
                continue;
            }
            if x + symbol_width > area.right() {
                break;
            }
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_symbol(symbol.to_string().as_str());
                cell.set_style(style);
                if shadow {
                    cell.bg = shaded(cell.bg);
                }
            }
            x += symbol_width;
        }
    }
}

/// Darkened backdrop behind shadowed glyphs.
fn shaded(current: Color) -> Color {
    match current {
        Color::Rgb(r, g, b) => Rgb(r, g, b).darken(0.55).to_color(),
        _ => Rgb(22, 22, 22).to_color(),
    }
}
