use crate::theme::LayoutTheme;
use crate::timer::{Timer, TimerEvent};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use serde_json::Value;
use std::hash::{Hash, Hasher};

/// Where a component is grouped in the host's add-component menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ComponentCategory {
    List,
    Timer,
    Information,
    Media,
    Control,
    Other,
}

/// Contract every layout component implements.
///
/// The host owns boxed components, delivers timer events to them
/// synchronously on its thread, ticks `update` once per frame, and asks
/// them to draw into its buffer in vertical or horizontal layout mode.
/// All sizes are in terminal cells.
pub trait Component {
    fn name(&self) -> &'static str;

    /// React to a timer event. Called once per drained event, before the
    /// next draw.
    fn handle_event(&mut self, event: TimerEvent, timer: &Timer);

    /// Per-frame tick. Returns true when the rendered output changed and
    /// the host needs to redraw this component.
    fn update(&mut self, timer: &Timer, theme: &LayoutTheme) -> bool;

    fn draw_vertical(
        &mut self,
        buf: &mut Buffer,
        area: Rect,
        timer: &Timer,
        theme: &LayoutTheme,
    );

    fn draw_horizontal(
        &mut self,
        buf: &mut Buffer,
        area: Rect,
        timer: &Timer,
        theme: &LayoutTheme,
    );

    /// Rows consumed in a vertical layout.
    fn vertical_height(&self) -> u16;

    /// Columns consumed in a horizontal layout.
    fn horizontal_width(&self) -> u16;

    fn minimum_width(&self) -> u16;

    fn minimum_height(&self) -> u16 {
        1
    }

    /// The component's settings as a node of the host layout file.
    fn settings(&self) -> Value;

    /// Restore settings from a layout node. Missing or malformed fields
    /// keep their defaults; the host never fails a layout load over a
    /// component's settings.
    fn set_settings(&mut self, node: &Value);

    /// Hash of the current settings, for host-side change detection.
    fn settings_hash(&self) -> u64;

    /// Drop host references. Called when the component is removed from
    /// the layout.
    fn dispose(&mut self) {}
}

/// Discovery metadata for a component, including what the host's
/// self-update mechanism needs.
pub trait ComponentFactory {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn category(&self) -> ComponentCategory;
    fn create(&self, timer: &Timer) -> Box<dyn Component>;

    fn update_name(&self) -> &'static str {
        self.name()
    }
    fn manifest_url(&self) -> &'static str;
    fn update_url(&self) -> &'static str;
    fn version(&self) -> &'static str;
}

/// Stable hash of a settings node: hashes the canonical serialized form.
pub fn settings_hash_of(node: &Value) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    node.to_string().hash(&mut hasher);
    hasher.finish()
}
