//! Deterministic arbitration rules, applied in this order:
//! security override, fact supremacy, variance.

pub mod facts;
pub mod security;
pub mod variance;

pub use facts::{FactReport, FactSupremacy};
pub use security::{SecurityOverride, SecurityReport, SECURITY_CAP};
pub use variance::{ReEvaluationBudget, VarianceDetector, VarianceReport};
