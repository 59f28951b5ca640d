use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

/// A 24-bit color, serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    pub fn to_color(self) -> Color {
        Color::Rgb(self.0, self.1, self.2)
    }

    /// Linear interpolation toward `other`; `t` is clamped to 0..=1.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb(
            channel(self.0, other.0),
            channel(self.1, other.1),
            channel(self.2, other.2),
        )
    }

    /// Scale all channels toward black. `factor` 1.0 keeps the color.
    pub fn darken(self, factor: f32) -> Rgb {
        let factor = factor.clamp(0.0, 1.0);
        let channel = |a: u8| (a as f32 * factor).round() as u8;
        Rgb(channel(self.0), channel(self.1), channel(self.2))
    }
}

/// A terminal "font": the modifier set applied to a label's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FontSpec {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub dim: bool,
}

impl FontSpec {
    pub fn modifiers(&self) -> Modifier {
        let mut modifiers = Modifier::empty();
        if self.bold {
            modifiers |= Modifier::BOLD;
        }
        if self.italic {
            modifiers |= Modifier::ITALIC;
        }
        if self.dim {
            modifiers |= Modifier::DIM;
        }
        modifiers
    }

    pub fn style(&self, color: Rgb) -> Style {
        Style::default()
            .fg(color.to_color())
            .add_modifier(self.modifiers())
    }
}

/// Fill direction for a two-color background.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display,
)]
pub enum GradientKind {
    #[default]
    Plain,
    Horizontal,
    Vertical,
}

/// Optional solid or gradient background. A `None` color slot is
/// transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Background {
    #[serde(default)]
    pub color: Option<Rgb>,
    #[serde(default)]
    pub color2: Option<Rgb>,
    #[serde(default)]
    pub gradient: GradientKind,
}

impl Background {
    pub fn solid(color: Rgb) -> Self {
        Self {
            color: Some(color),
            color2: None,
            gradient: GradientKind::Plain,
        }
    }

    pub fn gradient(kind: GradientKind, first: Rgb, second: Rgb) -> Self {
        Self {
            color: Some(first),
            color2: Some(second),
            gradient: kind,
        }
    }

    /// Whether anything gets painted at all: a first color, or a real
    /// gradient with a visible second stop.
    pub fn is_visible(&self) -> bool {
        self.color.is_some()
            || (self.gradient != GradientKind::Plain && self.color2.is_some())
    }

    /// Resolve the fill color of the cell at (x, y) within a w x h area.
    /// Returns None when the background is fully transparent.
    pub fn color_at(&self, x: u16, y: u16, width: u16, height: u16) -> Option<Rgb> {
        if !self.is_visible() {
            return None;
        }
        let first = self.color.unwrap_or(Rgb::BLACK);
        match self.gradient {
            GradientKind::Plain => Some(first),
            GradientKind::Horizontal => {
                let second = self.color2.unwrap_or(first);
                let t = if width > 1 {
                    x as f32 / (width - 1) as f32
                } else {
                    0.0
                };
                Some(first.lerp(second, t))
            }
            GradientKind::Vertical => {
                let second = self.color2.unwrap_or(first);
                let t = if height > 1 {
                    y as f32 / (height - 1) as f32
                } else {
                    0.0
                };
                Some(first.lerp(second, t))
            }
        }
    }
}

/// Global layout theme. Components fall back to these values wherever a
/// per-component override is off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutTheme {
    pub text_color: Rgb,
    pub label_font: FontSpec,
    pub value_font: FontSpec,
    pub drop_shadows: bool,
    pub background: Background,
}

impl Default for LayoutTheme {
    fn default() -> Self {
        Self {
            text_color: Rgb::WHITE,
            label_font: FontSpec::default(),
            value_font: FontSpec {
                bold: true,
                ..FontSpec::default()
            },
            drop_shadows: false,
            background: Background::solid(Rgb(18, 18, 18)),
        }
    }
}
