//! Rules-resolution core for a d20 space-fantasy tabletop engine.
//!
//! Turns a character snapshot (ability scores, class levels, equipped
//! mitigation) into derived combat statistics, and resolves damage events
//! against the character's absorption layers. Everything here is a pure
//! function over snapshots; persistence and presentation live outside.

pub mod abilities;
pub mod api;
pub mod catalog;
pub mod character;
pub mod classes;
pub mod config;
pub mod content;
pub mod derived;
pub mod dice;
pub mod logging;
pub mod mitigation;
pub mod queue;
pub mod reactor;
pub mod recovery;
pub mod skills;

pub use abilities::{Ability, AbilityError, AbilityModel, AbilityScore};
pub use catalog::{
    resolve_classes, CachedCatalog, CatalogError, ClassCatalog, ClassDefinition, ClassId,
    ClassLedger, ClassLevelEntry, ClassTable, StaticCatalog,
};
pub use character::{
    CharacterId, CharacterKind, CharacterSnapshot, Defense, DefenseBonuses, SheetOverrides,
    SkillTraining,
};
pub use config::{ConfigError, RulesConfig};
pub use derived::{
    DefenseBreakdown, Defenses, DerivedStats, DerivedStatsCalculator, Diagnostic, HitPoints,
    LineItem, SkillBreakdown,
};
pub use dice::{DamageDice, DamageRoll, Dice, DieRoller, ScriptedDice, MAX_DICE};
pub use mitigation::{
    BypassFlags, DamageEvent, DamageType, DrSource, HitPointPool, Layer, LayerStep, LayerUpdate,
    LayerValues, MitigationError, MitigationLayers, MitigationPipeline, MitigationResult,
    PersistenceUpdate, ShieldRating,
};
pub use reactor::{ModifierChange, SecondaryEffect};
pub use skills::Skill;

/// Ability modifier = floor((score - 10) / 2) for integer scores.
pub fn ability_mod(score: i32) -> i32 {
    // `div_euclid` with positive divisor matches mathematical floor division.
    score.saturating_sub(10).div_euclid(2)
}
