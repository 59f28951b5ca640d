use crate::timing::{Time, TimingMethod};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// One finished or abandoned attempt at the run.
///
/// An attempt with no time for a given method was not completed on that
/// clock; the streak scan treats it as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub index: u32,
    #[serde(default)]
    pub time: Time,
    #[serde(default)]
    pub started: Option<DateTime<Local>>,
    #[serde(default)]
    pub ended: Option<DateTime<Local>>,
}

impl Attempt {
    pub fn completed(&self, method: TimingMethod) -> bool {
        self.time.get(method).is_some()
    }
}

/// A run definition plus its attempt history, oldest attempt first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub game_name: String,
    pub category_name: String,
    #[serde(default)]
    pub segment_names: Vec<String>,
    #[serde(default)]
    pub attempt_count: u32,
    #[serde(default)]
    pub attempt_history: Vec<Attempt>,
}

impl Run {
    pub fn new(game_name: impl Into<String>, category_name: impl Into<String>) -> Self {
        Self {
            game_name: game_name.into(),
            category_name: category_name.into(),
            segment_names: Vec::new(),
            attempt_count: 0,
            attempt_history: Vec::new(),
        }
    }

    /// Append an attempt with the next free index.
    pub fn add_attempt(
        &mut self,
        time: Time,
        started: Option<DateTime<Local>>,
        ended: Option<DateTime<Local>>,
    ) {
        self.attempt_count += 1;
        self.attempt_history.push(Attempt {
            index: self.attempt_count,
            time,
            started,
            ended,
        });
    }

    /// Rewrite the recorded time of an existing attempt (manual edit).
    /// Returns false when no attempt has the given index.
    pub fn update_attempt(&mut self, index: u32, time: Time) -> bool {
        match self
            .attempt_history
            .iter_mut()
            .find(|attempt| attempt.index == index)
        {
            Some(attempt) => {
                attempt.time = time;
                true
            }
            None => false,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Run> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(io::Error::other)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self).map_err(io::Error::other)?;
        std::fs::write(path, data)
    }

    /// Export the attempt history as CSV.
    pub fn export_history_csv<W: io::Write>(&self, writer: W) -> csv::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["index", "real_time", "game_time", "started", "ended"])?;
        for attempt in &self.attempt_history {
            csv_writer.write_record([
                attempt.index.to_string(),
                attempt
                    .time
                    .real_time
                    .map_or_else(String::new, |span| span.to_string()),
                attempt
                    .time
                    .game_time
                    .map_or_else(String::new, |span| span.to_string()),
                attempt
                    .started
                    .map_or_else(String::new, |stamp| stamp.to_rfc3339()),
                attempt
                    .ended
                    .map_or_else(String::new, |stamp| stamp.to_rfc3339()),
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
