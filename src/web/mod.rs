//! Settings HTTP surface

mod settings;

pub use settings::{router, SettingsState};
