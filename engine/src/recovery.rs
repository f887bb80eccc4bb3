//! Healing and pool refills, resolved the same way as damage: pure functions
//! returning an update the caller commits in one step.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::mitigation::{LayerUpdate, LayerValues, MitigationError, MitigationLayers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryKind {
    Heal,
    TemporaryHp,
    ShieldRecharge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryResult {
    pub kind: RecoveryKind,
    pub requested: i32,
    pub restored: i32,
    pub before: LayerValues,
    pub after: LayerValues,
}

impl RecoveryResult {
    pub fn audit_line(&self, name: &str) -> String {
        let (tag, old, new) = match self.kind {
            RecoveryKind::Heal => ("HEAL", self.before.hp_value, self.after.hp_value),
            RecoveryKind::TemporaryHp => ("TEMP", self.before.temporary_hp, self.after.temporary_hp),
            RecoveryKind::ShieldRecharge => {
                ("SR", self.before.shield_current, self.after.shield_current)
            }
        };
        format!("[{}][{}] +{} ({} → {})", tag, name, self.restored, old, new)
    }
}

impl LayerUpdate for RecoveryResult {
    fn before(&self) -> LayerValues {
        self.before
    }

    fn after(&self) -> LayerValues {
        self.after
    }
}

fn checked(layers: &MitigationLayers, amount: i32) -> Result<LayerValues, MitigationError> {
    if amount < 0 {
        warn!(amount, "rejecting negative recovery amount");
        return Err(MitigationError::NegativeAmount(amount));
    }
    layers.validate()?;
    Ok(layers.values())
}

fn finish(kind: RecoveryKind, requested: i32, before: LayerValues, after: LayerValues) -> RecoveryResult {
    let restored = match kind {
        RecoveryKind::Heal => after.hp_value - before.hp_value,
        RecoveryKind::TemporaryHp => after.temporary_hp - before.temporary_hp,
        RecoveryKind::ShieldRecharge => after.shield_current - before.shield_current,
    };
    debug!(?kind, requested, restored, "recovery resolved");
    RecoveryResult {
        kind,
        requested,
        restored,
        before,
        after,
    }
}

/// Restore real HP, capped at max. HP already above max is left alone.
pub fn heal(layers: &MitigationLayers, amount: i32) -> Result<RecoveryResult, MitigationError> {
    let before = checked(layers, amount)?;
    let mut after = before;
    if before.hp_value < layers.hp.max {
        after.hp_value = before.hp_value.saturating_add(amount).min(layers.hp.max);
    }
    Ok(finish(RecoveryKind::Heal, amount, before, after))
}

/// Temporary HP does not stack; the higher value wins.
pub fn grant_temporary_hp(
    layers: &MitigationLayers,
    amount: i32,
) -> Result<RecoveryResult, MitigationError> {
    let before = checked(layers, amount)?;
    let mut after = before;
    after.temporary_hp = before.temporary_hp.max(amount);
    Ok(finish(RecoveryKind::TemporaryHp, amount, before, after))
}

/// Restore shield rating, capped at the shield's max.
pub fn recharge_shield(
    layers: &MitigationLayers,
    amount: i32,
) -> Result<RecoveryResult, MitigationError> {
    let before = checked(layers, amount)?;
    let mut after = before;
    if before.shield_current < layers.shield.max {
        after.shield_current = before
            .shield_current
            .saturating_add(amount)
            .min(layers.shield.max);
    }
    Ok(finish(RecoveryKind::ShieldRecharge, amount, before, after))
}
