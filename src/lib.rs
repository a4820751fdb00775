pub mod camelot;
pub mod config;
pub mod energy;
pub mod error;
pub mod flow;
pub mod harmonic;
pub mod loader;
pub mod model;
pub mod suggest;
pub mod tempo;

pub use camelot::{CamelotKey, Mode};
pub use error::{FlowError, Result};
pub use flow::{FlowReport, Transition, analyze};
pub use harmonic::{TransitionKind, classify, compatible_set, score};
pub use model::{DjSet, Track};

/// Application name for XDG paths
pub const APP_NAME: &str = "setflow";
