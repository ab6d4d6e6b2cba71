//! UI state consumed by the renderer

pub mod status;

pub use status::{StatusBar, StatusInputs, LOADING_TEXT, STATUS_BAR_HEIGHT, STATUS_REFRESH_MS};
