use crate::run::Run;
use crate::timing::{Time, TimeSpan, TimingMethod};
use chrono::Local;
use std::time::Instant;

/// Lifecycle phase of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TimerPhase {
    #[strum(serialize = "Not Running")]
    NotRunning,
    Running,
    Ended,
}

/// Host events components can react to. The host drains these from the
/// timer and delivers them synchronously on its own thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Start,
    Split,
    UndoSplit,
    Reset,
    RunManuallyModified,
}

/// The host timer: owns the run, the active timing method, and a queue
/// of pending events.
#[derive(Debug)]
pub struct Timer {
    run: Run,
    phase: TimerPhase,
    current_timing_method: TimingMethod,
    current_split_index: usize,
    started_at: Option<Instant>,
    attempt_started: Option<chrono::DateTime<Local>>,
    completion_time: Option<Time>,
    pending_game_time: Option<TimeSpan>,
    pending_events: Vec<TimerEvent>,
}

impl Timer {
    pub fn new(run: Run) -> Self {
        Self {
            run,
            phase: TimerPhase::NotRunning,
            current_timing_method: TimingMethod::RealTime,
            current_split_index: 0,
            started_at: None,
            attempt_started: None,
            completion_time: None,
            pending_game_time: None,
            pending_events: Vec::new(),
        }
    }

    pub fn run(&self) -> &Run {
        &self.run
    }

    pub fn into_run(self) -> Run {
        self.run
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn current_timing_method(&self) -> TimingMethod {
        self.current_timing_method
    }

    pub fn set_current_timing_method(&mut self, method: TimingMethod) {
        self.current_timing_method = method;
    }

    pub fn current_split_index(&self) -> usize {
        self.current_split_index
    }

    fn segment_count(&self) -> usize {
        self.run.segment_names.len().max(1)
    }

    /// Elapsed/recorded time for the ongoing attempt.
    pub fn current_time(&self) -> Time {
        match self.phase {
            TimerPhase::NotRunning => Time::new(),
            TimerPhase::Running => {
                let mut time = Time::new();
                if let Some(started) = self.started_at {
                    time.real_time =
                        Some(TimeSpan::from_seconds(started.elapsed().as_secs_f64()));
                }
                time.game_time = self.pending_game_time;
                time
            }
            TimerPhase::Ended => self.completion_time.unwrap_or_default(),
        }
    }

    pub fn start(&mut self) {
        if self.phase != TimerPhase::NotRunning {
            return;
        }
        self.phase = TimerPhase::Running;
        self.current_split_index = 0;
        self.started_at = Some(Instant::now());
        self.attempt_started = Some(Local::now());
        self.completion_time = None;
        self.pending_game_time = None;
        self.pending_events.push(TimerEvent::Start);
    }

    pub fn split(&mut self) {
        if self.phase != TimerPhase::Running {
            return;
        }
        self.current_split_index += 1;
        if self.current_split_index >= self.segment_count() {
            self.phase = TimerPhase::Ended;
            self.completion_time = Some(self.current_completion_time());
        }
        self.pending_events.push(TimerEvent::Split);
    }

    pub fn undo_split(&mut self) {
        if self.current_split_index == 0 {
            return;
        }
        if self.phase == TimerPhase::Ended {
            self.phase = TimerPhase::Running;
            self.completion_time = None;
        }
        if self.phase != TimerPhase::Running {
            return;
        }
        self.current_split_index -= 1;
        self.pending_events.push(TimerEvent::UndoSplit);
    }

    /// Stop the attempt. When saving, it lands in the history: with its
    /// completion time if the run ended, otherwise as an unfinished
    /// attempt with no recorded time.
    pub fn reset(&mut self, save_attempt: bool) {
        if self.phase == TimerPhase::NotRunning {
            return;
        }
        if save_attempt {
            let time = match self.phase {
                TimerPhase::Ended => self.completion_time.unwrap_or_default(),
                _ => Time::new(),
            };
            self.run
                .add_attempt(time, self.attempt_started, Some(Local::now()));
        }
        self.phase = TimerPhase::NotRunning;
        self.current_split_index = 0;
        self.started_at = None;
        self.attempt_started = None;
        self.completion_time = None;
        self.pending_game_time = None;
        self.pending_events.push(TimerEvent::Reset);
    }

    /// Feed the game-time clock; picked up as the attempt's game time
    /// when the run completes.
    pub fn set_game_time(&mut self, span: TimeSpan) {
        self.pending_game_time = Some(span);
    }

    /// Manual run edit: rewrite a recorded attempt's time.
    pub fn set_run_time(&mut self, index: u32, time: Time) -> bool {
        let updated = self.run.update_attempt(index, time);
        if updated {
            self.pending_events.push(TimerEvent::RunManuallyModified);
        }
        updated
    }

    /// Take all pending events. The host delivers them to components
    /// before the next draw.
    pub fn drain_events(&mut self) -> Vec<TimerEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn current_completion_time(&self) -> Time {
        let mut time = Time::new();
        if let Some(started) = self.started_at {
            time.real_time = Some(TimeSpan::from_seconds(started.elapsed().as_secs_f64()));
        }
        time.game_time = self.pending_game_time;
        time
    }
}
