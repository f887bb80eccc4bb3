//! Derived statistics: HP, BAB, defenses, and skill totals computed from
//! abilities, class levels, and character kind.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    Ability, AbilityModel, CharacterKind, CharacterSnapshot, ClassId, ClassLedger, ClassTable,
    Defense, RulesConfig, SheetOverrides, Skill,
};

/// One row of a "source → value → running total" breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub source: String,
    pub value: i32,
    pub running_total: i32,
}

impl fmt::Display for LineItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {:+} → {}", self.source, self.value, self.running_total)
    }
}

fn line_items(parts: Vec<(String, i32)>) -> Vec<LineItem> {
    let mut running_total = 0;
    parts
        .into_iter()
        .map(|(source, value)| {
            running_total += value;
            LineItem {
                source,
                value,
                running_total,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub max: i32,
    pub current: i32,
    pub breakdown: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenseBreakdown {
    pub base: i32,
    pub level_term: i32,
    pub class_bonus: i32,
    /// Ability that supplied `ability_bonus`.
    pub ability: Ability,
    pub ability_bonus: i32,
    pub misc_bonus: i32,
    pub total: i32,
}

impl DefenseBreakdown {
    pub fn line_items(&self) -> Vec<LineItem> {
        line_items(vec![
            ("base".to_string(), self.base),
            ("half level".to_string(), self.level_term),
            ("class".to_string(), self.class_bonus),
            (self.ability.abbreviation().to_string(), self.ability_bonus),
            ("misc".to_string(), self.misc_bonus),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defenses {
    pub fortitude: DefenseBreakdown,
    pub reflex: DefenseBreakdown,
    pub will: DefenseBreakdown,
}

impl Defenses {
    pub fn get(&self, defense: Defense) -> &DefenseBreakdown {
        match defense {
            Defense::Fortitude => &self.fortitude,
            Defense::Reflex => &self.reflex,
            Defense::Will => &self.will,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillBreakdown {
    pub ability: Ability,
    pub ability_mod: i32,
    pub trained_bonus: i32,
    pub focus_bonus: i32,
    pub misc_bonus: i32,
    pub half_level_bonus: i32,
    pub total: i32,
}

impl SkillBreakdown {
    pub fn line_items(&self) -> Vec<LineItem> {
        line_items(vec![
            (self.ability.abbreviation().to_string(), self.ability_mod),
            ("trained".to_string(), self.trained_bonus),
            ("focus".to_string(), self.focus_bonus),
            ("misc".to_string(), self.misc_bonus),
            ("half level".to_string(), self.half_level_bonus),
        ])
    }
}

/// Data the calculator had to default to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Diagnostic {
    MissingAbility { ability: Ability, needed_for: String },
    MissingClass { class_id: ClassId },
    MissingProgression {
        class_id: ClassId,
        level: u32,
        table: String,
    },
    NoClassLevels,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingAbility {
                ability,
                needed_for,
            } => write!(f, "{} score missing; {} uses 0", ability, needed_for),
            Diagnostic::MissingClass { class_id } => {
                write!(f, "class '{}' not in catalog; contributes 0", class_id)
            }
            Diagnostic::MissingProgression {
                class_id,
                level,
                table,
            } => write!(
                f,
                "class '{}' has no {} entry for level {}; contributes 0",
                class_id, table, level
            ),
            Diagnostic::NoClassLevels => f.write_str("character has no class levels"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub hp: HitPoints,
    pub bab: i32,
    pub defenses: Defenses,
    pub skills: IndexMap<Skill, SkillBreakdown>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DerivedStats {
    /// True when nothing had to be defaulted.
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Collects data-absence diagnostics while stats are computed.
struct Lookup<'a> {
    abilities: &'a AbilityModel,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lookup<'a> {
    fn new(abilities: &'a AbilityModel) -> Self {
        Self {
            abilities,
            diagnostics: Vec::new(),
        }
    }

    fn modifier(&mut self, ability: Ability, needed_for: &str) -> i32 {
        match self.abilities.modifier(ability) {
            Some(m) => m,
            None => {
                self.note(Diagnostic::MissingAbility {
                    ability,
                    needed_for: needed_for.to_string(),
                });
                0
            }
        }
    }

    fn note(&mut self, diagnostic: Diagnostic) {
        if !self.diagnostics.contains(&diagnostic) {
            warn!("{}", diagnostic);
            self.diagnostics.push(diagnostic);
        }
    }
}

/// Computes [`DerivedStats`]. Pure: same inputs, same output.
#[derive(Debug, Clone, Default)]
pub struct DerivedStatsCalculator {
    config: RulesConfig,
}

impl DerivedStatsCalculator {
    pub fn new(config: RulesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn compute(
        &self,
        abilities: &AbilityModel,
        ledger: &ClassLedger,
        kind: CharacterKind,
        classes: &ClassTable,
        overrides: &SheetOverrides,
    ) -> DerivedStats {
        let mut lookup = Lookup::new(abilities);
        if ledger.is_empty() {
            lookup.note(Diagnostic::NoClassLevels);
        }

        let hp = self.hit_points(ledger, kind, &mut lookup);
        let bab = base_attack_bonus(ledger, classes, &mut lookup);
        let defenses = self.defenses(ledger, kind, classes, overrides, &mut lookup);
        let skills = self.skills(ledger, kind, overrides, &mut lookup);

        debug!(
            level = ledger.total_level(),
            ?kind,
            hp = hp.max,
            bab,
            fortitude = defenses.fortitude.total,
            reflex = defenses.reflex.total,
            will = defenses.will.total,
            "derived stats computed"
        );

        DerivedStats {
            hp,
            bab,
            defenses,
            skills,
            diagnostics: lookup.diagnostics,
        }
    }

    /// [`DerivedStatsCalculator::compute`] for a whole snapshot; current HP is
    /// taken from the snapshot's layers and clamped into `0..=max`.
    pub fn compute_for(&self, character: &CharacterSnapshot, classes: &ClassTable) -> DerivedStats {
        let mut stats = self.compute(
            &character.abilities,
            &character.classes,
            character.kind,
            classes,
            &character.overrides,
        );
        if let Some(layers) = &character.layers {
            stats.hp.current = layers.hp.value.clamp(0, stats.hp.max);
        }
        stats
    }

    fn hit_points(&self, ledger: &ClassLedger, kind: CharacterKind, lookup: &mut Lookup<'_>) -> HitPoints {
        let con_bonus = constitution_bonus(kind, lookup);
        let multiplier = self.config.first_level_hit_die_multiplier;

        let mut parts = Vec::with_capacity(ledger.entries().len() + 2);
        for (idx, entry) in ledger.entries().iter().enumerate() {
            let die = i32::from(entry.hit_die);
            let (label, gain) = if idx == 0 {
                (
                    format!("{} {} (d{} x{})", entry.class_id, entry.level_in_class, die, multiplier),
                    die * multiplier,
                )
            } else {
                (
                    format!("{} {} (d{}/2+1)", entry.class_id, entry.level_in_class, die),
                    die / 2 + 1,
                )
            };
            parts.push((label, gain));
        }
        if kind == CharacterKind::Organic && !ledger.is_empty() {
            let levels = ledger.total_level() as i32;
            parts.push((format!("CON x{}", levels), con_bonus * levels));
        }

        let raw: i32 = parts.iter().map(|(_, v)| *v).sum();
        if raw < self.config.minimum_hp {
            parts.push(("minimum".to_string(), self.config.minimum_hp - raw));
        }
        let max = raw.max(self.config.minimum_hp);

        HitPoints {
            max,
            current: max,
            breakdown: line_items(parts),
        }
    }

    fn defenses(
        &self,
        ledger: &ClassLedger,
        kind: CharacterKind,
        classes: &ClassTable,
        overrides: &SheetOverrides,
        lookup: &mut Lookup<'_>,
    ) -> Defenses {
        let level_term = ledger.half_level();
        let class_levels = ledger.class_levels();
        let build = |defense: Defense, ability: Ability, ability_bonus: i32, lookup: &mut Lookup<'_>| {
            let class_bonus = best_class_bonus(&class_levels, classes, defense, lookup);
            let misc_bonus = overrides.defense_misc.get(defense);
            let base = self.config.defense_base;
            DefenseBreakdown {
                base,
                level_term,
                class_bonus,
                ability,
                ability_bonus,
                misc_bonus,
                total: base + level_term + class_bonus + ability_bonus + misc_bonus,
            }
        };

        let (fort_ability, fort_bonus) = fortitude_ability(kind, lookup);
        let fortitude = build(Defense::Fortitude, fort_ability, fort_bonus, lookup);
        let dex = lookup.modifier(Ability::Dex, "reflex defense");
        let reflex = build(Defense::Reflex, Ability::Dex, dex, lookup);
        let wis = lookup.modifier(Ability::Wis, "will defense");
        let will = build(Defense::Will, Ability::Wis, wis, lookup);

        Defenses {
            fortitude,
            reflex,
            will,
        }
    }

    fn skills(
        &self,
        ledger: &ClassLedger,
        kind: CharacterKind,
        overrides: &SheetOverrides,
        lookup: &mut Lookup<'_>,
    ) -> IndexMap<Skill, SkillBreakdown> {
        let half_level_bonus = ledger.half_level();
        Skill::ALL
            .iter()
            .map(|&skill| {
                let ability = skill_ability(skill, kind);
                let ability_mod = lookup.modifier(ability, "skills");
                let training = overrides.skill(skill);
                let trained_bonus = if training.trained {
                    self.config.trained_skill_bonus
                } else {
                    0
                };
                let focus_bonus = if training.focused {
                    self.config.skill_focus_bonus
                } else {
                    0
                };
                let breakdown = SkillBreakdown {
                    ability,
                    ability_mod,
                    trained_bonus,
                    focus_bonus,
                    misc_bonus: training.misc,
                    half_level_bonus,
                    total: ability_mod + trained_bonus + focus_bonus + training.misc + half_level_bonus,
                };
                (skill, breakdown)
            })
            .collect()
    }
}

/// CON modifier for organics, exactly zero for constructs. CON is not even
/// looked up for a construct.
fn constitution_bonus(kind: CharacterKind, lookup: &mut Lookup<'_>) -> i32 {
    match kind {
        CharacterKind::Organic => lookup.modifier(Ability::Con, "hit points"),
        CharacterKind::Construct => 0,
    }
}

fn fortitude_ability(kind: CharacterKind, lookup: &mut Lookup<'_>) -> (Ability, i32) {
    match kind {
        CharacterKind::Organic => {
            let str_mod = lookup.modifier(Ability::Str, "fortitude defense");
            let con_mod = lookup.modifier(Ability::Con, "fortitude defense");
            if con_mod > str_mod {
                (Ability::Con, con_mod)
            } else {
                (Ability::Str, str_mod)
            }
        }
        CharacterKind::Construct => (
            Ability::Str,
            lookup.modifier(Ability::Str, "fortitude defense"),
        ),
    }
}

/// Constructs substitute STR for CON-keyed skills.
fn skill_ability(skill: Skill, kind: CharacterKind) -> Ability {
    match (skill.key_ability(), kind) {
        (Ability::Con, CharacterKind::Construct) => Ability::Str,
        (ability, _) => ability,
    }
}

fn base_attack_bonus(ledger: &ClassLedger, classes: &ClassTable, lookup: &mut Lookup<'_>) -> i32 {
    let mut total = 0;
    for (class_id, level) in ledger.class_levels() {
        let Some(def) = classes.get(&class_id) else {
            lookup.note(Diagnostic::MissingClass { class_id });
            continue;
        };
        match def.bab_at(level) {
            Some(bab) => total += bab,
            None => lookup.note(Diagnostic::MissingProgression {
                class_id,
                level,
                table: "bab".to_string(),
            }),
        }
    }
    total
}

/// Class defense bonuses never stack: the best single class wins.
fn best_class_bonus(
    class_levels: &IndexMap<ClassId, u32>,
    classes: &ClassTable,
    defense: Defense,
    lookup: &mut Lookup<'_>,
) -> i32 {
    let mut best: Option<i32> = None;
    for (class_id, &level) in class_levels {
        let Some(def) = classes.get(class_id) else {
            lookup.note(Diagnostic::MissingClass {
                class_id: class_id.clone(),
            });
            continue;
        };
        match def.defenses_at(level) {
            Some(bonuses) => {
                let bonus = bonuses.get(defense);
                best = Some(best.map_or(bonus, |current| current.max(bonus)));
            }
            None => lookup.note(Diagnostic::MissingProgression {
                class_id: class_id.clone(),
                level,
                table: "defenses".to_string(),
            }),
        }
    }
    best.unwrap_or(0)
}
