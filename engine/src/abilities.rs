use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ability_mod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Str,
        Ability::Dex,
        Ability::Con,
        Ability::Int,
        Ability::Wis,
        Ability::Cha,
    ];

    pub fn abbreviation(self) -> &'static str {
        match self {
            Ability::Str => "STR",
            Ability::Dex => "DEX",
            Ability::Con => "CON",
            Ability::Int => "INT",
            Ability::Wis => "WIS",
            Ability::Cha => "CHA",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

impl FromStr for Ability {
    type Err = AbilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "str" | "strength" => Ok(Ability::Str),
            "dex" | "dexterity" => Ok(Ability::Dex),
            "con" | "constitution" => Ok(Ability::Con),
            "int" | "intelligence" => Ok(Ability::Int),
            "wis" | "wisdom" => Ok(Ability::Wis),
            "cha" | "charisma" => Ok(Ability::Cha),
            _ => Err(AbilityError::Unknown(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbilityError {
    #[error("{ability} total {total} is outside {min}..={max}")]
    OutOfRange {
        ability: Ability,
        total: i32,
        min: i32,
        max: i32,
    },
    #[error("unknown ability '{0}'")]
    Unknown(String),
}

impl AbilityError {
    /// Stable reason code for presentation collaborators.
    pub fn code(&self) -> &'static str {
        match self {
            AbilityError::OutOfRange { .. } => "ability_out_of_range",
            AbilityError::Unknown(_) => "unknown_ability",
        }
    }
}

/// One ability score split into its stored components.
///
/// Only the components are persisted; `total` and `modifier` are always
/// computed from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AbilityScore {
    pub base: i32,
    #[serde(default)]
    pub racial: i32,
    #[serde(default)]
    pub temporary: i32,
}

impl AbilityScore {
    pub fn new(base: i32) -> Self {
        Self {
            base,
            racial: 0,
            temporary: 0,
        }
    }

    pub fn with_racial(self, racial: i32) -> Self {
        Self { racial, ..self }
    }

    pub fn with_temporary(self, temporary: i32) -> Self {
        Self { temporary, ..self }
    }

    /// Saturates, so absurd components still land outside any valid range.
    pub fn total(&self) -> i32 {
        self.base
            .saturating_add(self.racial)
            .saturating_add(self.temporary)
    }

    pub fn modifier(&self) -> i32 {
        ability_mod(self.total())
    }
}

/// The six ability scores of a character, keyed by ability.
///
/// A record may be missing an ability entirely (partial import, a construct
/// without a CON block). Lookups return `None` and the calculator decides how
/// to degrade.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityModel {
    scores: IndexMap<Ability, AbilityScore>,
}

impl AbilityModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from base scores in STR, DEX, CON, INT, WIS, CHA order.
    pub fn from_bases(bases: [i32; 6]) -> Self {
        let scores = Ability::ALL
            .iter()
            .zip(bases)
            .map(|(ability, base)| (*ability, AbilityScore::new(base)))
            .collect();
        Self { scores }
    }

    pub fn with(mut self, ability: Ability, score: AbilityScore) -> Self {
        self.set(ability, score);
        self
    }

    pub fn without(mut self, ability: Ability) -> Self {
        self.scores.shift_remove(&ability);
        self
    }

    pub fn set(&mut self, ability: Ability, score: AbilityScore) {
        self.scores.insert(ability, score);
    }

    pub fn score(&self, ability: Ability) -> Option<&AbilityScore> {
        self.scores.get(&ability)
    }

    pub fn score_mut(&mut self, ability: Ability) -> Option<&mut AbilityScore> {
        self.scores.get_mut(&ability)
    }

    pub fn total(&self, ability: Ability) -> Option<i32> {
        self.score(ability).map(AbilityScore::total)
    }

    pub fn modifier(&self, ability: Ability) -> Option<i32> {
        self.score(ability).map(AbilityScore::modifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Ability, &AbilityScore)> {
        self.scores.iter().map(|(a, s)| (*a, s))
    }

    /// Reject totals outside `min..=max`. Missing abilities are not an error here.
    pub fn validate(&self, min: i32, max: i32) -> Result<(), AbilityError> {
        for (ability, score) in self.iter() {
            let total = score.total();
            if total < min || total > max {
                return Err(AbilityError::OutOfRange {
                    ability,
                    total,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}
