use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout as RectLayout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::layout::Layout;
use crate::timer::{Timer, TimerPhase};

/// The demo host: one timer, one layout, and a draw orientation toggle.
pub struct App {
    pub timer: Timer,
    pub layout: Layout,
    pub horizontal: bool,
}

impl App {
    pub fn new(timer: Timer, layout: Layout) -> Self {
        Self {
            timer,
            layout,
            horizontal: false,
        }
    }

    /// Deliver pending timer events and tick every component. Returns
    /// true when any component wants a redraw.
    pub fn tick(&mut self) -> bool {
        self.layout.dispatch(&mut self.timer);
        self.layout.update(&self.timer)
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = RectLayout::default()
            .direction(Direction::Vertical)
            .constraints(
                [
                    Constraint::Length(2),
                    Constraint::Min(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                ]
                .as_ref(),
            )
            .split(area);

        render_header(self, chunks[0], buf);
        render_components(self, chunks[1], buf);
        render_history_strip(self, chunks[2], buf);
        render_help(chunks[3], buf);
    }
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let run = app.timer.run();
    let method = app.timer.current_timing_method();
    let elapsed = app
        .timer
        .current_time()
        .get(method)
        .map_or_else(|| "-".to_string(), |span| span.to_string());

    let title = Line::from(vec![
        Span::styled(
            run.game_name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" / "),
        Span::raw(run.category_name.clone()),
    ]);
    let status = Line::from(vec![
        Span::styled(
            format!("{} ", app.timer.phase()),
            Style::default().fg(phase_color(app.timer.phase())),
        ),
        Span::styled(elapsed, Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("  [{}]", method),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);

    Paragraph::new(vec![title, status]).render(area, buf);
}

fn phase_color(phase: TimerPhase) -> Color {
    match phase {
        TimerPhase::NotRunning => Color::Gray,
        TimerPhase::Running => Color::Green,
        TimerPhase::Ended => Color::Cyan,
    }
}

fn render_components(app: &mut App, area: Rect, buf: &mut Buffer) {
    let App {
        timer,
        layout,
        horizontal,
    } = app;
    let theme = layout.theme;

    if *horizontal {
        let mut x = area.x;
        for component in layout.components_mut() {
            let width = component.horizontal_width().min(area.right().saturating_sub(x));
            if width == 0 {
                break;
            }
            let slot = Rect::new(x, area.y, width, area.height.min(1));
            component.draw_horizontal(buf, slot, timer, &theme);
            x += width;
        }
    } else {
        let mut y = area.y;
        for component in layout.components_mut() {
            let height = component
                .vertical_height()
                .min(area.bottom().saturating_sub(y));
            if height == 0 {
                break;
            }
            let slot = Rect::new(area.x, y, area.width, height);
            component.draw_vertical(buf, slot, timer, &theme);
            y += height;
        }
    }
}

/// One line summarizing the most recent attempts, newest last.
fn render_history_strip(app: &App, area: Rect, buf: &mut Buffer) {
    let method = app.timer.current_timing_method();
    let history = &app.timer.run().attempt_history;
    let visible = history.len().min(8);

    let mut spans = vec![Span::styled(
        "history: ",
        Style::default().add_modifier(Modifier::DIM),
    )];
    if history.is_empty() {
        spans.push(Span::styled(
            "(none)",
            Style::default().add_modifier(Modifier::DIM),
        ));
    }
    for attempt in &history[history.len() - visible..] {
        match attempt.time.get(method) {
            Some(span) => spans.push(Span::raw(format!("{}  ", span))),
            None => spans.push(Span::styled("--  ", Style::default().fg(Color::Red))),
        }
    }

    Paragraph::new(Line::from(spans)).render(area, buf);
}

fn render_help(area: Rect, buf: &mut Buffer) {
    let help = Paragraph::new(Span::styled(
        "space start/split  u undo  r reset  x discard  t method  b best  2 rows  o orient  g/G goal  q quit",
        Style::default().add_modifier(Modifier::DIM),
    ));
    help.render(area, buf);
}
