use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::mitigation::MitigationLayers;
use crate::{AbilityModel, ClassLedger, Skill};

/// Organic characters add CON wherever the rules call for it; constructs
/// (droids) never read CON at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterKind {
    Organic,
    Construct,
}

impl CharacterKind {
    pub fn is_construct(self) -> bool {
        matches!(self, CharacterKind::Construct)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(String);

impl CharacterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CharacterId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Defense {
    Fortitude,
    Reflex,
    Will,
}

impl Defense {
    pub const ALL: [Defense; 3] = [Defense::Fortitude, Defense::Reflex, Defense::Will];
}

impl fmt::Display for Defense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Defense::Fortitude => f.write_str("Fortitude"),
            Defense::Reflex => f.write_str("Reflex"),
            Defense::Will => f.write_str("Will"),
        }
    }
}

/// A value per defense, used both for class bonuses and misc overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DefenseBonuses {
    #[serde(default)]
    pub fortitude: i32,
    #[serde(default)]
    pub reflex: i32,
    #[serde(default)]
    pub will: i32,
}

impl DefenseBonuses {
    pub fn new(fortitude: i32, reflex: i32, will: i32) -> Self {
        Self {
            fortitude,
            reflex,
            will,
        }
    }

    pub fn get(&self, defense: Defense) -> i32 {
        match defense {
            Defense::Fortitude => self.fortitude,
            Defense::Reflex => self.reflex,
            Defense::Will => self.will,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillTraining {
    #[serde(default)]
    pub trained: bool,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub misc: i32,
}

/// The only hand-edited inputs to derived stats.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SheetOverrides {
    #[serde(default)]
    pub defense_misc: DefenseBonuses,
    #[serde(default)]
    pub skills: IndexMap<Skill, SkillTraining>,
}

impl SheetOverrides {
    pub fn skill(&self, skill: Skill) -> SkillTraining {
        self.skills.get(&skill).copied().unwrap_or_default()
    }

    pub fn train(mut self, skill: Skill) -> Self {
        self.skills.entry(skill).or_default().trained = true;
        self
    }

    pub fn focus(mut self, skill: Skill) -> Self {
        self.skills.entry(skill).or_default().focused = true;
        self
    }
}

/// Character record as handed over by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    pub id: CharacterId,
    pub name: String,
    pub kind: CharacterKind,
    pub abilities: AbilityModel,
    #[serde(default)]
    pub classes: ClassLedger,
    #[serde(default)]
    pub overrides: SheetOverrides,
    /// Number of power-training feats; scales WIS-driven power slots.
    #[serde(default)]
    pub power_trainings: u32,
    #[serde(default)]
    pub layers: Option<MitigationLayers>,
}

impl CharacterSnapshot {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: CharacterKind,
        abilities: AbilityModel,
    ) -> Self {
        Self {
            id: CharacterId::new(id),
            name: name.into(),
            kind,
            abilities,
            classes: ClassLedger::default(),
            overrides: SheetOverrides::default(),
            power_trainings: 0,
            layers: None,
        }
    }

    pub fn with_classes(self, classes: ClassLedger) -> Self {
        Self { classes, ..self }
    }

    pub fn with_overrides(self, overrides: SheetOverrides) -> Self {
        Self { overrides, ..self }
    }

    pub fn with_layers(self, layers: MitigationLayers) -> Self {
        Self {
            layers: Some(layers),
            ..self
        }
    }

    pub fn with_power_trainings(self, power_trainings: u32) -> Self {
        Self {
            power_trainings,
            ..self
        }
    }
}
