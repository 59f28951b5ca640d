// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod component;
pub mod info_text;
pub mod layout;
pub mod run;
pub mod streak;
pub mod theme;
pub mod timer;
pub mod timing;
pub mod ui;
