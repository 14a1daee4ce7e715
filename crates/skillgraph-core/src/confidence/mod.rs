//! Evidential confidence engine
//!
//! Turns every path between a person and a skill into a discounted
//! [`Opinion`] and fuses them with Yager's rule, keeping conflict as
//! uncertainty instead of renormalizing it away.

mod calculator;
mod opinion;
mod profile;

pub use calculator::{ConfidenceCalculator, MODEL_TAG, SkillConfidence};
pub use opinion::{Opinion, SUM_TOLERANCE};
pub use profile::{SkillProfile, compute_profile};
