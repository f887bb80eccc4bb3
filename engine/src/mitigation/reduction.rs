use serde::{Deserialize, Serialize};

use super::{DamageEvent, DrSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReductionOutcome {
    /// DR total of the sources that applied to this event.
    pub rating: i32,
    pub applied: i32,
    pub remaining: i32,
}

/// Flat, non-depleting reduction summed over equipped sources.
pub struct DamageReductionResolver;

impl DamageReductionResolver {
    pub fn resolve(damage: i32, sources: &[DrSource], event: &DamageEvent) -> ReductionOutcome {
        let damage = damage.max(0);
        let rating = sources
            .iter()
            .filter(|s| s.applies_to(event.damage_type))
            .map(|s| s.value.max(0))
            .fold(0i32, i32::saturating_add);
        let applied = rating.min(damage);
        ReductionOutcome {
            rating,
            applied,
            remaining: damage - applied,
        }
    }
}
