use crate::component::{Component, ComponentFactory};
use crate::theme::LayoutTheme;
use crate::timer::Timer;
use directories::ProjectDirs;
use serde_json::{json, Value};
use std::io;
use std::path::{Path, PathBuf};

/// The host layout: the global theme plus the registered components, in
/// display order. Owns event fan-out and settings persistence.
pub struct Layout {
    pub theme: LayoutTheme,
    components: Vec<Box<dyn Component>>,
}

impl Layout {
    pub fn new() -> Self {
        Self {
            theme: LayoutTheme::default(),
            components: Vec::new(),
        }
    }

    pub fn add_component(&mut self, component: Box<dyn Component>) {
        self.components.push(component);
    }

    /// Remove and dispose the component at `index`.
    pub fn remove_component(&mut self, index: usize) -> bool {
        if index >= self.components.len() {
            return false;
        }
        let mut component = self.components.remove(index);
        component.dispose();
        true
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components_mut(&mut self) -> std::slice::IterMut<'_, Box<dyn Component>> {
        self.components.iter_mut()
    }

    /// Drain the timer's pending events and deliver each to every
    /// component, synchronously, in registration order.
    pub fn dispatch(&mut self, timer: &mut Timer) {
        let events = timer.drain_events();
        for event in events {
            for component in &mut self.components {
                component.handle_event(event, timer);
            }
        }
    }

    /// Per-frame tick fan-out. True when any component needs a redraw.
    pub fn update(&mut self, timer: &Timer) -> bool {
        let mut invalidated = false;
        for component in &mut self.components {
            if component.update(timer, &self.theme) {
                invalidated = true;
            }
        }
        invalidated
    }

    /// The layout as a settings node tree: the theme plus one entry per
    /// component carrying its name and settings node.
    pub fn to_node(&self) -> Value {
        let components: Vec<Value> = self
            .components
            .iter()
            .map(|component| {
                json!({
                    "component": component.name(),
                    "settings": component.settings(),
                })
            })
            .collect();
        json!({
            "theme": serde_json::to_value(self.theme).unwrap_or(Value::Null),
            "components": components,
        })
    }

    /// Rebuild a layout from a settings node tree. Component entries
    /// whose name no known factory claims are skipped; a malformed theme
    /// node falls back to the default theme.
    pub fn from_node(node: &Value, factories: &[&dyn ComponentFactory], timer: &Timer) -> Layout {
        let theme = node
            .get("theme")
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default();

        let mut layout = Layout {
            theme,
            components: Vec::new(),
        };
        let entries = node
            .get("components")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for entry in &entries {
            let Some(name) = entry.get("component").and_then(Value::as_str) else {
                continue;
            };
            let Some(factory) = factories.iter().find(|factory| factory.name() == name) else {
                continue;
            };
            let mut component = factory.create(timer);
            if let Some(settings) = entry.get("settings") {
                component.set_settings(settings);
            }
            layout.components.push(component);
        }
        layout
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Layout {
    fn drop(&mut self) {
        for component in &mut self.components {
            component.dispose();
        }
    }
}

/// Where a layout is persisted.
pub trait LayoutStore {
    fn load(&self, factories: &[&dyn ComponentFactory], timer: &Timer) -> Layout;
    fn save(&self, layout: &Layout) -> io::Result<()>;
}

/// JSON file-backed layout store. Loading a missing or malformed file
/// yields an empty default layout.
#[derive(Debug, Clone)]
pub struct FileLayoutStore {
    path: PathBuf,
}

impl FileLayoutStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: Self::default_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn default_path() -> PathBuf {
        if let Some(project_dirs) = ProjectDirs::from("", "", "splitstreak") {
            project_dirs.config_dir().join("layout.json")
        } else {
            PathBuf::from("splitstreak_layout.json")
        }
    }
}

impl LayoutStore for FileLayoutStore {
    fn load(&self, factories: &[&dyn ComponentFactory], timer: &Timer) -> Layout {
        if let Ok(bytes) = std::fs::read(&self.path) {
            if let Ok(node) = serde_json::from_slice::<Value>(&bytes) {
                return Layout::from_node(&node, factories, timer);
            }
        }
        Layout::new()
    }

    fn save(&self, layout: &Layout) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&layout.to_node()).unwrap_or_default();
        std::fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::Run;
    use crate::streak::{StreakComponent, StreakFactory};
    use crate::timer::TimerEvent;
    use crate::timing::TimeSpan;
    use ratatui::buffer::Buffer;
    use ratatui::layout::Rect;
    use std::cell::Cell;
    use std::rc::Rc;
    use tempfile::tempdir;

    struct ProbeComponent {
        disposed: Rc<Cell<bool>>,
        events_seen: Rc<Cell<usize>>,
    }

    impl Component for ProbeComponent {
        fn name(&self) -> &'static str {
            "Probe"
        }
        fn handle_event(&mut self, _event: TimerEvent, _timer: &Timer) {
            self.events_seen.set(self.events_seen.get() + 1);
        }
        fn update(&mut self, _timer: &Timer, _theme: &LayoutTheme) -> bool {
            false
        }
        fn draw_vertical(&mut self, _: &mut Buffer, _: Rect, _: &Timer, _: &LayoutTheme) {}
        fn draw_horizontal(&mut self, _: &mut Buffer, _: Rect, _: &Timer, _: &LayoutTheme) {}
        fn vertical_height(&self) -> u16 {
            1
        }
        fn horizontal_width(&self) -> u16 {
            1
        }
        fn minimum_width(&self) -> u16 {
            1
        }
        fn settings(&self) -> Value {
            Value::Null
        }
        fn set_settings(&mut self, _node: &Value) {}
        fn settings_hash(&self) -> u64 {
            0
        }
        fn dispose(&mut self) {
            self.disposed.set(true);
        }
    }

    fn one_segment_timer() -> Timer {
        let mut run = Run::new("Game", "Any%");
        run.segment_names = vec!["Done".into()];
        Timer::new(run)
    }

    #[test]
    fn remove_component_disposes_it() {
        let disposed = Rc::new(Cell::new(false));
        let mut layout = Layout::new();
        layout.add_component(Box::new(ProbeComponent {
            disposed: disposed.clone(),
            events_seen: Rc::new(Cell::new(0)),
        }));

        assert!(layout.remove_component(0));
        assert!(disposed.get());
        assert!(!layout.remove_component(0));
    }

    #[test]
    fn dropping_the_layout_disposes_components() {
        let disposed = Rc::new(Cell::new(false));
        {
            let mut layout = Layout::new();
            layout.add_component(Box::new(ProbeComponent {
                disposed: disposed.clone(),
                events_seen: Rc::new(Cell::new(0)),
            }));
        }
        assert!(disposed.get());
    }

    #[test]
    fn dispatch_delivers_every_drained_event() {
        let events_seen = Rc::new(Cell::new(0));
        let mut layout = Layout::new();
        layout.add_component(Box::new(ProbeComponent {
            disposed: Rc::new(Cell::new(false)),
            events_seen: events_seen.clone(),
        }));

        let mut timer = one_segment_timer();
        timer.start();
        timer.split();
        timer.reset(true);
        layout.dispatch(&mut timer);

        // Start, Split, Reset.
        assert_eq!(events_seen.get(), 3);
        // The queue is drained; a second dispatch delivers nothing.
        layout.dispatch(&mut timer);
        assert_eq!(events_seen.get(), 3);
    }

    #[test]
    fn dispatch_keeps_streak_component_in_step_with_the_timer() {
        let mut timer = one_segment_timer();
        let mut component = StreakComponent::new(&timer);
        component.settings_mut().goal_time = TimeSpan::from_hms(1, 0, 0);
        let mut layout = Layout::new();
        layout.add_component(Box::new(component));
        assert!(!layout.update(&timer));

        // A completed attempt under the goal lands in the history; the
        // recompute happens during dispatch and invalidates the next
        // update.
        timer.start();
        timer.split();
        timer.reset(true);
        layout.dispatch(&mut timer);
        assert!(layout.update(&timer));
        assert!(!layout.update(&timer));
    }

    #[test]
    fn node_round_trip_restores_components_and_theme() {
        let timer = one_segment_timer();
        let mut layout = Layout::new();
        layout.theme.drop_shadows = true;
        let mut component = StreakComponent::new(&timer);
        component.settings_mut().goal_time = TimeSpan::from_hms(0, 28, 30);
        layout.add_component(Box::new(component));

        let node = layout.to_node();
        let factories: [&dyn ComponentFactory; 1] = [&StreakFactory];
        let restored = Layout::from_node(&node, &factories, &timer);

        assert!(restored.theme.drop_shadows);
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.to_node(), node);
    }

    #[test]
    fn unknown_component_entries_are_skipped() {
        let timer = one_segment_timer();
        let node = json!({
            "components": [
                {"component": "Nonexistent", "settings": {}},
                {"component": "Streak", "settings": {}},
            ]
        });
        let factories: [&dyn ComponentFactory; 1] = [&StreakFactory];
        let layout = Layout::from_node(&node, &factories, &timer);
        assert_eq!(layout.len(), 1);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileLayoutStore::with_path(dir.path().join("layout.json"));
        let timer = one_segment_timer();
        let factories: [&dyn ComponentFactory; 1] = [&StreakFactory];

        let mut layout = Layout::new();
        layout.add_component(StreakFactory.create(&timer));
        store.save(&layout).unwrap();

        let loaded = store.load(&factories, &timer);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.to_node(), layout.to_node());
    }

    #[test]
    fn missing_file_loads_an_empty_layout() {
        let dir = tempdir().unwrap();
        let store = FileLayoutStore::with_path(dir.path().join("missing.json"));
        let timer = one_segment_timer();
        let layout = store.load(&[], &timer);
        assert!(layout.is_empty());
    }
}
