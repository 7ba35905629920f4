pub mod arbitration;
pub mod config;
pub mod errors;
pub mod judge;
pub mod model;
pub mod panel;
pub mod providers;
pub mod report;
pub mod rubric;
pub mod rules;

pub use arbitration::{ArbitrationRun, ChiefJustice};
pub use config::EngineConfig;
pub use model::{
    Dimension, DimensionScore, Evidence, EvidenceContent, EvidenceSource, FinalVerdict, Opinion,
    Verdict,
};
pub use panel::JudgingPanel;
pub use rubric::Rubric;
