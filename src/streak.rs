use crate::component::{settings_hash_of, Component, ComponentCategory, ComponentFactory};
use crate::info_text::InfoText;
use crate::run::Attempt;
use crate::theme::{Background, FontSpec, LayoutTheme, Rgb};
use crate::timer::{Timer, TimerEvent};
use crate::timing::{TimeSpan, TimingMethod};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User-facing settings of the streak component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakSettings {
    pub label: String,
    pub goal_time: TimeSpan,
    pub show_best: bool,
    pub display_two_rows: bool,
    pub override_label_color: bool,
    pub label_color: Rgb,
    pub override_value_color: bool,
    pub value_color: Rgb,
    pub override_label_font: bool,
    pub label_font: FontSpec,
    pub override_value_font: bool,
    pub value_font: FontSpec,
    pub background: Background,
}

impl Default for StreakSettings {
    fn default() -> Self {
        Self {
            label: "Streak".to_string(),
            goal_time: TimeSpan::from_hms(0, 30, 0),
            show_best: true,
            display_two_rows: false,
            override_label_color: false,
            label_color: Rgb::WHITE,
            override_value_color: false,
            value_color: Rgb::WHITE,
            override_label_font: false,
            label_font: FontSpec::default(),
            override_value_font: false,
            value_font: FontSpec::default(),
            background: Background::default(),
        }
    }
}

impl StreakSettings {
    pub fn to_node(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Read named fields out of a layout node. Missing or malformed
    /// fields keep their current values, matching the host's generic
    /// settings fallback.
    pub fn merge_node(&mut self, node: &Value) {
        if let Some(text) = node.get("label").and_then(Value::as_str) {
            self.label = text.to_string();
        }
        if let Some(span) = node
            .get("goal_time")
            .and_then(Value::as_str)
            .and_then(TimeSpan::parse)
        {
            self.goal_time = span;
        }
        if let Some(flag) = node.get("show_best").and_then(Value::as_bool) {
            self.show_best = flag;
        }
        if let Some(flag) = node.get("display_two_rows").and_then(Value::as_bool) {
            self.display_two_rows = flag;
        }
        if let Some(flag) = node.get("override_label_color").and_then(Value::as_bool) {
            self.override_label_color = flag;
        }
        if let Some(flag) = node.get("override_value_color").and_then(Value::as_bool) {
            self.override_value_color = flag;
        }
        if let Some(flag) = node.get("override_label_font").and_then(Value::as_bool) {
            self.override_label_font = flag;
        }
        if let Some(flag) = node.get("override_value_font").and_then(Value::as_bool) {
            self.override_value_font = flag;
        }
        if let Some(color) = read_field::<Rgb>(node, "label_color") {
            self.label_color = color;
        }
        if let Some(color) = read_field::<Rgb>(node, "value_color") {
            self.value_color = color;
        }
        if let Some(font) = read_field::<FontSpec>(node, "label_font") {
            self.label_font = font;
        }
        if let Some(font) = read_field::<FontSpec>(node, "value_font") {
            self.value_font = font;
        }
        if let Some(background) = read_field::<Background>(node, "background") {
            self.background = background;
        }
    }
}

fn read_field<T: serde::de::DeserializeOwned>(node: &Value, field: &str) -> Option<T> {
    node.get(field)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

/// Result of a streak scan over the attempt history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreakCounts {
    /// Qualifying attempts immediately preceding the present.
    pub current: u32,
    /// Longest contiguous qualifying run anywhere in the history.
    pub best: u32,
}

/// Scan the history from most recent to oldest. An attempt qualifies
/// when it has a time for `method` and that time is within `goal`; an
/// unfinished attempt always disqualifies. The first disqualifier seen
/// fixes the current streak; the best streak tracks the running counter
/// over the whole scan. A history with no disqualifier at all yields
/// `current == best == qualifying count`.
pub fn streak_counts(history: &[Attempt], method: TimingMethod, goal: TimeSpan) -> StreakCounts {
    let mut current: Option<u32> = None;
    let mut counter: u32 = 0;
    let mut best: u32 = 0;

    for attempt in history.iter().rev() {
        let qualifies = attempt
            .time
            .get(method)
            .is_some_and(|span| span <= goal);
        if qualifies {
            counter += 1;
            best = best.max(counter);
        } else {
            if current.is_none() {
                current = Some(counter);
            }
            counter = 0;
        }
    }

    StreakCounts {
        current: current.unwrap_or(counter),
        best,
    }
}

/// Shows the current run of attempts under the goal time, optionally
/// with the best streak on record.
#[derive(Debug)]
pub struct StreakComponent {
    settings: StreakSettings,
    inner: InfoText,
    counts: StreakCounts,
    streak_text: String,
    last_goal_time: TimeSpan,
    last_timing_method: TimingMethod,
}

impl StreakComponent {
    pub fn new(timer: &Timer) -> Self {
        Self::with_settings(StreakSettings::default(), timer)
    }

    pub fn with_settings(settings: StreakSettings, timer: &Timer) -> Self {
        let mut component = Self {
            inner: InfoText::new(settings.label.clone(), "0"),
            counts: StreakCounts::default(),
            streak_text: String::new(),
            last_goal_time: settings.goal_time,
            last_timing_method: timer.current_timing_method(),
            settings,
        };
        component.recompute(timer);
        component.streak_text = component.formatted();
        component.sync_inner();
        component
    }

    pub fn settings(&self) -> &StreakSettings {
        &self.settings
    }

    /// Mutable settings access for the host's settings UI. Goal-time and
    /// display changes are picked up by the next `update`.
    pub fn settings_mut(&mut self) -> &mut StreakSettings {
        &mut self.settings
    }

    pub fn counts(&self) -> StreakCounts {
        self.counts
    }

    fn recompute(&mut self, timer: &Timer) {
        self.counts = streak_counts(
            &timer.run().attempt_history,
            timer.current_timing_method(),
            self.settings.goal_time,
        );
        self.last_goal_time = self.settings.goal_time;
        self.last_timing_method = timer.current_timing_method();
    }

    fn formatted(&self) -> String {
        if self.settings.show_best {
            format!("{} (best: {})", self.counts.current, self.counts.best)
        } else {
            self.counts.current.to_string()
        }
    }

    fn sync_inner(&mut self) {
        self.inner.name = self.settings.label.clone();
        self.inner.value = self.streak_text.clone();
        self.inner.display_two_rows = self.settings.display_two_rows;
        self.inner.background = self.settings.background;
    }

    /// Resolve fonts, colors, and the shadow flag against the theme
    /// right before a draw.
    fn prepare_draw(&mut self, theme: &LayoutTheme) {
        self.sync_inner();

        let label_color = if self.settings.override_label_color {
            self.settings.label_color
        } else {
            theme.text_color
        };
        let value_color = if self.settings.override_value_color {
            self.settings.value_color
        } else {
            theme.text_color
        };
        let label_font = if self.settings.override_label_font {
            self.settings.label_font
        } else {
            theme.label_font
        };
        let value_font = if self.settings.override_value_font {
            self.settings.value_font
        } else {
            theme.value_font
        };

        self.inner.name_style = label_font.style(label_color);
        self.inner.value_style = value_font.style(value_color);
        self.inner.name_shadow = theme.drop_shadows;
        self.inner.value_shadow = theme.drop_shadows;
    }
}

impl Component for StreakComponent {
    fn name(&self) -> &'static str {
        "Streak"
    }

    fn handle_event(&mut self, event: TimerEvent, timer: &Timer) {
        match event {
            TimerEvent::Split
            | TimerEvent::UndoSplit
            | TimerEvent::Reset
            | TimerEvent::RunManuallyModified => self.recompute(timer),
            TimerEvent::Start => {}
        }
    }

    fn update(&mut self, timer: &Timer, _theme: &LayoutTheme) -> bool {
        if self.last_timing_method != timer.current_timing_method()
            || self.last_goal_time != self.settings.goal_time
        {
            self.recompute(timer);
        }

        let text = self.formatted();
        if text != self.streak_text {
            self.streak_text = text;
            self.sync_inner();
            true
        } else {
            false
        }
    }

    fn draw_vertical(
        &mut self,
        buf: &mut Buffer,
        area: Rect,
        _timer: &Timer,
        theme: &LayoutTheme,
    ) {
        self.prepare_draw(theme);
        self.inner.draw_vertical(buf, area);
    }

    fn draw_horizontal(
        &mut self,
        buf: &mut Buffer,
        area: Rect,
        _timer: &Timer,
        theme: &LayoutTheme,
    ) {
        self.prepare_draw(theme);
        self.inner.draw_horizontal(buf, area);
    }

    fn vertical_height(&self) -> u16 {
        self.inner.vertical_height()
    }

    fn horizontal_width(&self) -> u16 {
        self.inner.horizontal_width()
    }

    fn minimum_width(&self) -> u16 {
        self.inner.minimum_width()
    }

    fn minimum_height(&self) -> u16 {
        self.inner.minimum_height()
    }

    fn settings(&self) -> Value {
        self.settings.to_node()
    }

    fn set_settings(&mut self, node: &Value) {
        self.settings.merge_node(node);
        // Sizing queries may come in before the next update or draw.
        self.sync_inner();
    }

    fn settings_hash(&self) -> u64 {
        settings_hash_of(&self.settings.to_node())
    }
}

/// Factory the host uses to list and instantiate the component.
pub struct StreakFactory;

impl ComponentFactory for StreakFactory {
    fn name(&self) -> &'static str {
        "Streak"
    }

    fn description(&self) -> &'static str {
        "Tracks how many consecutive runs finish under a goal time."
    }

    fn category(&self) -> ComponentCategory {
        ComponentCategory::Information
    }

    fn create(&self, timer: &Timer) -> Box<dyn Component> {
        Box::new(StreakComponent::new(timer))
    }

    fn manifest_url(&self) -> &'static str {
        "https://splitstreak.dev/update/components/streak.json"
    }

    fn update_url(&self) -> &'static str {
        "https://splitstreak.dev/update/"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::Run;
    use crate::timing::Time;
    use serde_json::json;

    fn attempt(index: u32, real_time: Option<TimeSpan>) -> Attempt {
        let mut time = Time::new();
        time.real_time = real_time;
        Attempt {
            index,
            time,
            started: None,
            ended: None,
        }
    }

    /// Encode a pass/fail pattern (oldest first) as a history with 10s
    /// passes and 60s failures against a 30s goal.
    fn history(pattern: &[bool]) -> Vec<Attempt> {
        pattern
            .iter()
            .enumerate()
            .map(|(i, &pass)| {
                let seconds = if pass { 10.0 } else { 60.0 };
                attempt(i as u32 + 1, Some(TimeSpan::from_seconds(seconds)))
            })
            .collect()
    }

    fn goal() -> TimeSpan {
        TimeSpan::from_seconds(30.0)
    }

    #[test]
    fn empty_history_has_no_streak() {
        let counts = streak_counts(&[], TimingMethod::RealTime, goal());
        assert_eq!(counts, StreakCounts { current: 0, best: 0 });
    }

    #[test]
    fn most_recent_failure_fixes_current_at_zero() {
        // Most recent attempt (last) failed; the two passes behind the
        // older failure are the best streak.
        let history = history(&[true, false, true, true, false]);
        let counts = streak_counts(&history, TimingMethod::RealTime, goal());
        assert_eq!(counts.current, 0);
        assert_eq!(counts.best, 2);
    }

    #[test]
    fn current_counts_trailing_passes() {
        let history = history(&[false, true, true]);
        let counts = streak_counts(&history, TimingMethod::RealTime, goal());
        assert_eq!(counts, StreakCounts { current: 2, best: 2 });
    }

    #[test]
    fn best_streak_found_anywhere_in_history() {
        let history = history(&[true, true, true, false, true]);
        let counts = streak_counts(&history, TimingMethod::RealTime, goal());
        assert_eq!(counts, StreakCounts { current: 1, best: 3 });
    }

    #[test]
    fn all_qualifying_history_counts_in_full() {
        // Pins the policy for a history with no disqualifier: the
        // current streak is the whole history, not a sentinel.
        let history = history(&[true, true, true]);
        let counts = streak_counts(&history, TimingMethod::RealTime, goal());
        assert_eq!(counts, StreakCounts { current: 3, best: 3 });
    }

    #[test]
    fn missing_time_disqualifies_regardless_of_goal() {
        let history = vec![
            attempt(1, Some(TimeSpan::from_seconds(10.0))),
            attempt(2, None),
            attempt(3, Some(TimeSpan::from_seconds(10.0))),
        ];
        let counts = streak_counts(&history, TimingMethod::RealTime, goal());
        assert_eq!(counts, StreakCounts { current: 1, best: 1 });

        // A huge goal does not rescue an unfinished attempt.
        let counts = streak_counts(&history, TimingMethod::RealTime, TimeSpan::from_hms(99, 0, 0));
        assert_eq!(counts, StreakCounts { current: 1, best: 1 });
    }

    #[test]
    fn exactly_on_goal_qualifies() {
        let history = vec![attempt(1, Some(goal()))];
        let counts = streak_counts(&history, TimingMethod::RealTime, goal());
        assert_eq!(counts, StreakCounts { current: 1, best: 1 });
    }

    #[test]
    fn scan_respects_timing_method() {
        let mut time = Time::new();
        time.game_time = Some(TimeSpan::from_seconds(10.0));
        let history = vec![Attempt {
            index: 1,
            time,
            started: None,
            ended: None,
        }];

        let real = streak_counts(&history, TimingMethod::RealTime, goal());
        assert_eq!(real.current, 0);
        let game = streak_counts(&history, TimingMethod::GameTime, goal());
        assert_eq!(game.current, 1);
    }

    fn timer_with_history(pattern: &[bool]) -> Timer {
        let mut run = Run::new("Game", "Any%");
        for attempt in history(pattern) {
            run.attempt_count += 1;
            run.attempt_history.push(attempt);
        }
        Timer::new(run)
    }

    #[test]
    fn formatted_with_and_without_best() {
        let timer = timer_with_history(&[false, true, true]);
        let mut settings = StreakSettings {
            goal_time: goal(),
            ..StreakSettings::default()
        };
        settings.show_best = false;
        let component = StreakComponent::with_settings(settings.clone(), &timer);
        assert_eq!(component.streak_text, "2");

        settings.show_best = true;
        let component = StreakComponent::with_settings(settings, &timer);
        assert_eq!(component.streak_text, "2 (best: 2)");
    }

    #[test]
    fn update_detects_goal_time_drift() {
        let timer = timer_with_history(&[true, true]);
        let theme = LayoutTheme::default();
        let mut component = StreakComponent::with_settings(
            StreakSettings {
                goal_time: goal(),
                ..StreakSettings::default()
            },
            &timer,
        );
        assert!(!component.update(&timer, &theme));

        // Tighten the goal below every recorded time: both counts drop.
        component.settings_mut().goal_time = TimeSpan::from_seconds(1.0);
        assert!(component.update(&timer, &theme));
        assert_eq!(component.counts(), StreakCounts { current: 0, best: 0 });
    }

    #[test]
    fn update_detects_timing_method_drift() {
        let mut timer = timer_with_history(&[true, true]);
        let theme = LayoutTheme::default();
        let mut component = StreakComponent::with_settings(
            StreakSettings {
                goal_time: goal(),
                ..StreakSettings::default()
            },
            &timer,
        );
        assert_eq!(component.counts().current, 2);

        // No attempt has a game time, so switching methods zeroes both.
        timer.set_current_timing_method(TimingMethod::GameTime);
        assert!(component.update(&timer, &theme));
        assert_eq!(component.counts(), StreakCounts { current: 0, best: 0 });
    }

    #[test]
    fn show_best_toggle_invalidates_without_rescan() {
        let timer = timer_with_history(&[true]);
        let theme = LayoutTheme::default();
        let mut component = StreakComponent::with_settings(
            StreakSettings {
                goal_time: goal(),
                ..StreakSettings::default()
            },
            &timer,
        );
        component.settings_mut().show_best = false;
        assert!(component.update(&timer, &theme));
        assert_eq!(component.streak_text, "1");
    }

    #[test]
    fn settings_node_round_trip() {
        let mut settings = StreakSettings::default();
        settings.goal_time = TimeSpan::from_hms(0, 28, 30);
        settings.show_best = false;
        settings.label_color = Rgb(1, 2, 3);
        settings.override_label_color = true;

        let node = settings.to_node();
        let mut restored = StreakSettings::default();
        restored.merge_node(&node);
        assert_eq!(settings, restored);
    }

    #[test]
    fn malformed_node_fields_keep_defaults() {
        let mut settings = StreakSettings::default();
        settings.merge_node(&json!({
            "goal_time": "not a time",
            "show_best": "yes",
            "label_color": [1, 2],
            "label": "Sub 30"
        }));

        let defaults = StreakSettings::default();
        assert_eq!(settings.goal_time, defaults.goal_time);
        assert_eq!(settings.show_best, defaults.show_best);
        assert_eq!(settings.label_color, defaults.label_color);
        // Well-formed fields still land.
        assert_eq!(settings.label, "Sub 30");
    }

    #[test]
    fn settings_hash_tracks_changes() {
        let timer = timer_with_history(&[]);
        let mut component = StreakComponent::new(&timer);
        let before = component.settings_hash();
        component.settings_mut().goal_time = TimeSpan::from_seconds(1.0);
        assert_ne!(before, component.settings_hash());
    }
}
