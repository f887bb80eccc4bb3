//! Damage mitigation: one damage event resolved against a character's
//! absorption layers in a fixed order.
//!
//! ```text
//! Bonus HP → Shield (SR) → Damage Reduction (DR) → Temporary HP → Real HP
//! ```
//!
//! Every function here is pure. The caller persists the returned result as a
//! single update (see [`LayerUpdate`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod event;
mod layers;
mod pipeline;
mod reduction;
mod shield;

pub use event::{BypassFlags, DamageEvent, DamageType};
pub use layers::{
    DrSource, HitPointPool, LayerUpdate, LayerValues, MitigationLayers, PersistenceUpdate,
    ShieldRating,
};
pub use pipeline::{LayerStep, MitigationPipeline, MitigationResult, StepStatus};
pub use reduction::{DamageReductionResolver, ReductionOutcome};
pub use shield::{ShieldOutcome, ShieldResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    BonusHp,
    Shield,
    DamageReduction,
    TemporaryHp,
    RealHp,
}

/// Traversal order of the pipeline. Never reordered.
pub const LAYER_ORDER: [Layer; 5] = [
    Layer::BonusHp,
    Layer::Shield,
    Layer::DamageReduction,
    Layer::TemporaryHp,
    Layer::RealHp,
];

impl Layer {
    /// Short tag used in audit lines.
    pub fn tag(self) -> &'static str {
        match self {
            Layer::BonusHp => "BONUS",
            Layer::Shield => "SR",
            Layer::DamageReduction => "DR",
            Layer::TemporaryHp => "TEMP",
            Layer::RealHp => "HP",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Invalid input to a damage or recovery call. Nothing was applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MitigationError {
    #[error("amount must be non-negative, got {0}")]
    NegativeAmount(i32),
    #[error("invalid layer state: {0}")]
    InvalidLayerState(String),
    #[error("layer snapshot changed since the update was resolved")]
    StaleSnapshot,
}

impl MitigationError {
    /// Stable reason code for presentation collaborators.
    pub fn code(&self) -> &'static str {
        match self {
            MitigationError::NegativeAmount(_) => "negative_amount",
            MitigationError::InvalidLayerState(_) => "invalid_layer_state",
            MitigationError::StaleSnapshot => "stale_snapshot",
        }
    }
}
