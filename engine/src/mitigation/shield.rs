use serde::{Deserialize, Serialize};

use super::{DamageEvent, ShieldRating};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldOutcome {
    pub absorbed: i32,
    /// How far SR drops. Equal to `absorbed`: the shield is a pool.
    pub degradation: i32,
    pub remaining: i32,
    /// SR hit exactly zero during this event.
    pub depleted: bool,
}

/// Shield rating as a depletable pool.
///
/// Absorbs `min(damage, current)`; anything past that carries into the next
/// layer in the same event. SR never goes negative.
pub struct ShieldResolver;

impl ShieldResolver {
    pub fn resolve(damage: i32, shield: &ShieldRating, _event: &DamageEvent) -> ShieldOutcome {
        let damage = damage.max(0);
        let absorbed = damage.min(shield.current.max(0));
        ShieldOutcome {
            absorbed,
            degradation: absorbed,
            remaining: damage - absorbed,
            depleted: absorbed > 0 && shield.current - absorbed == 0,
        }
    }
}
