use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    DamageEvent, DamageReductionResolver, Layer, LayerUpdate, LayerValues, MitigationError,
    MitigationLayers, ShieldResolver, LAYER_ORDER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Applied,
    /// Skipped by an explicit bypass flag on the event.
    Bypassed,
    /// Nothing to absorb with (empty pool, SR down, no DR source).
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerStep {
    pub layer: Layer,
    pub status: StepStatus,
    pub amount_before: i32,
    pub amount_absorbed: i32,
    pub amount_remaining: i32,
}

impl LayerStep {
    fn skipped(layer: Layer, status: StepStatus, amount: i32) -> Self {
        Self {
            layer,
            status,
            amount_before: amount,
            amount_absorbed: 0,
            amount_remaining: amount,
        }
    }

    fn applied(layer: Layer, amount_before: i32, amount_absorbed: i32) -> Self {
        Self {
            layer,
            status: StepStatus::Applied,
            amount_before,
            amount_absorbed,
            amount_remaining: amount_before - amount_absorbed,
        }
    }
}

/// Outcome of one damage event. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationResult {
    pub event: DamageEvent,
    /// One entry per layer, in traversal order.
    pub steps: Vec<LayerStep>,
    pub bonus_consumed: i32,
    pub shield_degraded: i32,
    pub shield_depleted: bool,
    pub dr_applied: i32,
    pub temp_consumed: i32,
    /// Damage that reached real HP.
    pub hp_damage: i32,
    /// Part of `hp_damage` past zero HP.
    pub overflow: i32,
    pub destroyed: bool,
    pub before: LayerValues,
    pub after: LayerValues,
}

impl MitigationResult {
    pub fn step(&self, layer: Layer) -> Option<&LayerStep> {
        self.steps.iter().find(|s| s.layer == layer)
    }

    /// Human-readable audit trail, one line per layer.
    pub fn audit_lines(&self, name: &str) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.steps.len() + 2);
        for step in &self.steps {
            let tag = step.layer.tag();
            let line = match step.status {
                StepStatus::Bypassed => format!("[{}][{}] bypassed", tag, name),
                StepStatus::Inactive => format!("[{}][{}] inactive", tag, name),
                StepStatus::Applied => {
                    let mut line = format!(
                        "[{}][{}] {} → -{} → {}",
                        tag, name, step.amount_before, step.amount_absorbed, step.amount_remaining
                    );
                    if step.layer == Layer::Shield && self.shield_depleted {
                        line.push_str(" (depleted)");
                    }
                    line
                }
            };
            lines.push(line);
        }
        lines.push(format!(
            "[HP][{}] value {} → {}",
            name, self.before.hp_value, self.after.hp_value
        ));
        if self.destroyed {
            lines.push(format!("[STATE][{}] reduced to 0 HP", name));
        }
        lines
    }
}

impl LayerUpdate for MitigationResult {
    fn before(&self) -> LayerValues {
        self.before
    }

    fn after(&self) -> LayerValues {
        self.after
    }
}

/// Consume up to `pool` from `remaining`; returns the amount absorbed.
fn drain(pool: &mut i32, remaining: &mut i32) -> i32 {
    let absorbed = (*remaining).min(*pool);
    *pool -= absorbed;
    *remaining -= absorbed;
    absorbed
}

/// Resolves damage events against [`MitigationLayers`].
pub struct MitigationPipeline;

impl MitigationPipeline {
    /// Resolve `event` against `layers` without touching them.
    ///
    /// Negative amounts and negative pools are rejected; nothing is clamped
    /// into healing. State-track consequences of reaching 0 HP are left to
    /// the caller.
    pub fn resolve(
        event: &DamageEvent,
        layers: &MitigationLayers,
    ) -> Result<MitigationResult, MitigationError> {
        if event.amount < 0 {
            warn!(amount = event.amount, "rejecting negative damage");
            return Err(MitigationError::NegativeAmount(event.amount));
        }
        layers.validate()?;

        let before = layers.values();
        let mut after = before;
        let mut remaining = event.amount;
        let mut steps = Vec::with_capacity(LAYER_ORDER.len());

        let mut bonus_consumed = 0;
        let mut shield_degraded = 0;
        let mut shield_depleted = false;
        let mut dr_applied = 0;
        let mut temp_consumed = 0;
        let mut hp_damage = 0;
        let mut overflow = 0;

        for layer in LAYER_ORDER {
            if event.bypass.bypasses(layer) {
                steps.push(LayerStep::skipped(layer, StepStatus::Bypassed, remaining));
                continue;
            }
            let amount_before = remaining;
            let step = match layer {
                Layer::BonusHp => {
                    if after.bonus_hp <= 0 {
                        LayerStep::skipped(layer, StepStatus::Inactive, remaining)
                    } else {
                        bonus_consumed = drain(&mut after.bonus_hp, &mut remaining);
                        LayerStep::applied(layer, amount_before, bonus_consumed)
                    }
                }
                Layer::Shield => {
                    if !layers.shield.is_up() {
                        LayerStep::skipped(layer, StepStatus::Inactive, remaining)
                    } else {
                        let outcome = ShieldResolver::resolve(remaining, &layers.shield, event);
                        after.shield_current -= outcome.degradation;
                        shield_degraded = outcome.degradation;
                        shield_depleted = outcome.depleted;
                        remaining = outcome.remaining;
                        LayerStep::applied(layer, amount_before, outcome.absorbed)
                    }
                }
                Layer::DamageReduction => {
                    let outcome =
                        DamageReductionResolver::resolve(remaining, &layers.damage_reduction, event);
                    if outcome.rating == 0 {
                        LayerStep::skipped(layer, StepStatus::Inactive, remaining)
                    } else {
                        dr_applied = outcome.applied;
                        remaining = outcome.remaining;
                        LayerStep::applied(layer, amount_before, outcome.applied)
                    }
                }
                Layer::TemporaryHp => {
                    if after.temporary_hp <= 0 {
                        LayerStep::skipped(layer, StepStatus::Inactive, remaining)
                    } else {
                        temp_consumed = drain(&mut after.temporary_hp, &mut remaining);
                        LayerStep::applied(layer, amount_before, temp_consumed)
                    }
                }
                Layer::RealHp => {
                    hp_damage = remaining;
                    let lost = drain(&mut after.hp_value, &mut remaining);
                    overflow = remaining;
                    LayerStep::applied(layer, amount_before, lost)
                }
            };
            debug!(
                layer = %step.layer,
                status = ?step.status,
                before = step.amount_before,
                absorbed = step.amount_absorbed,
                remaining = step.amount_remaining,
                "mitigation step"
            );
            steps.push(step);
        }

        let destroyed = after.hp_value == 0;
        debug!(
            amount = event.amount,
            hp_before = before.hp_value,
            hp_after = after.hp_value,
            destroyed,
            "damage resolved"
        );

        Ok(MitigationResult {
            event: event.clone(),
            steps,
            bonus_consumed,
            shield_degraded,
            shield_depleted,
            dr_applied,
            temp_consumed,
            hp_damage,
            overflow,
            destroyed,
            before,
            after,
        })
    }
}
