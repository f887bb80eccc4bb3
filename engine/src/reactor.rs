//! Secondary effects of an ability modifier change (retroactive HP, extra
//! trained skills and languages, power slots).
//!
//! Effects are descriptions of grants. Some need a player choice before they
//! can be applied, so nothing here mutates the character.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Ability, AbilityModel, CharacterKind, CharacterSnapshot, ClassTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierChange {
    pub ability: Ability,
    pub old_modifier: i32,
    pub new_modifier: i32,
}

impl ModifierChange {
    pub fn delta(&self) -> i32 {
        self.new_modifier - self.old_modifier
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum SecondaryEffect {
    /// Signed change to max HP; the host moves current HP by the same amount.
    MaxHitPoints { amount: i32, heroic_levels: u32 },
    TrainedSkills { count: u32 },
    BonusLanguages { count: u32 },
    PowerSlots { count: u32 },
}

impl SecondaryEffect {
    /// Whether the player has to pick something before the grant is final.
    pub fn requires_choice(&self) -> bool {
        matches!(
            self,
            SecondaryEffect::TrainedSkills { .. }
                | SecondaryEffect::BonusLanguages { .. }
                | SecondaryEffect::PowerSlots { .. }
        )
    }
}

/// Abilities whose modifier differs between `before` and `after`. A raw score
/// change that keeps the modifier (14 → 15) is not reported.
pub fn detect_modifier_changes(before: &AbilityModel, after: &AbilityModel) -> Vec<ModifierChange> {
    Ability::ALL
        .iter()
        .filter_map(|&ability| {
            let old_modifier = before.modifier(ability)?;
            let new_modifier = after.modifier(ability)?;
            (old_modifier != new_modifier).then_some(ModifierChange {
                ability,
                old_modifier,
                new_modifier,
            })
        })
        .collect()
}

pub fn on_ability_modifier_change(
    character: &CharacterSnapshot,
    classes: &ClassTable,
    ability: Ability,
    old_modifier: i32,
    new_modifier: i32,
) -> Vec<SecondaryEffect> {
    let delta = new_modifier - old_modifier;
    if delta == 0 {
        return Vec::new();
    }

    let effects = match ability {
        Ability::Con => match character.kind {
            CharacterKind::Construct => {
                debug!(character = %character.id, "construct ignores CON change");
                Vec::new()
            }
            CharacterKind::Organic => {
                let heroic_levels = character.classes.heroic_levels(classes);
                vec![SecondaryEffect::MaxHitPoints {
                    amount: delta * heroic_levels as i32,
                    heroic_levels,
                }]
            }
        },
        Ability::Int if delta > 0 => {
            let count = delta as u32;
            vec![
                SecondaryEffect::TrainedSkills { count },
                SecondaryEffect::BonusLanguages { count },
            ]
        }
        Ability::Wis if delta > 0 && character.power_trainings > 0 => {
            vec![SecondaryEffect::PowerSlots {
                count: delta as u32 * character.power_trainings,
            }]
        }
        _ => Vec::new(),
    };

    debug!(
        character = %character.id,
        %ability,
        old_modifier,
        new_modifier,
        effects = effects.len(),
        "ability modifier change"
    );
    effects
}

/// Detect modifier changes between the character's abilities and `after`
/// and collect the effects of each.
pub fn react_to_changes(
    character: &CharacterSnapshot,
    classes: &ClassTable,
    after: &AbilityModel,
) -> Vec<SecondaryEffect> {
    detect_modifier_changes(&character.abilities, after)
        .into_iter()
        .flat_map(|change| {
            on_ability_modifier_change(
                character,
                classes,
                change.ability,
                change.old_modifier,
                change.new_modifier,
            )
        })
        .collect()
}
