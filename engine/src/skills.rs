use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Ability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Acrobatics,
    Climb,
    Deception,
    Endurance,
    GatherInformation,
    Initiative,
    Jump,
    Knowledge,
    Mechanics,
    Perception,
    Persuasion,
    Pilot,
    Ride,
    Stealth,
    Survival,
    Swim,
    TreatInjury,
    UseComputer,
    UseTheForce,
}

impl Skill {
    pub const ALL: [Skill; 19] = [
        Skill::Acrobatics,
        Skill::Climb,
        Skill::Deception,
        Skill::Endurance,
        Skill::GatherInformation,
        Skill::Initiative,
        Skill::Jump,
        Skill::Knowledge,
        Skill::Mechanics,
        Skill::Perception,
        Skill::Persuasion,
        Skill::Pilot,
        Skill::Ride,
        Skill::Stealth,
        Skill::Survival,
        Skill::Swim,
        Skill::TreatInjury,
        Skill::UseComputer,
        Skill::UseTheForce,
    ];

    /// The ability whose modifier this skill adds.
    pub fn key_ability(self) -> Ability {
        use Skill::*;
        match self {
            Climb | Jump | Swim => Ability::Str,
            Acrobatics | Initiative | Pilot | Ride | Stealth => Ability::Dex,
            Endurance => Ability::Con,
            Knowledge | Mechanics | UseComputer => Ability::Int,
            Perception | Survival | TreatInjury => Ability::Wis,
            Deception | GatherInformation | Persuasion | UseTheForce => Ability::Cha,
        }
    }

    pub fn name(self) -> &'static str {
        use Skill::*;
        match self {
            Acrobatics => "Acrobatics",
            Climb => "Climb",
            Deception => "Deception",
            Endurance => "Endurance",
            GatherInformation => "Gather Information",
            Initiative => "Initiative",
            Jump => "Jump",
            Knowledge => "Knowledge",
            Mechanics => "Mechanics",
            Perception => "Perception",
            Persuasion => "Persuasion",
            Pilot => "Pilot",
            Ride => "Ride",
            Stealth => "Stealth",
            Survival => "Survival",
            Swim => "Swim",
            TreatInjury => "Treat Injury",
            UseComputer => "Use Computer",
            UseTheForce => "Use the Force",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Skill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        Skill::ALL
            .iter()
            .copied()
            .find(|skill| {
                skill
                    .name()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .to_lowercase()
                    == wanted
            })
            .ok_or_else(|| format!("unknown skill '{}'", s))
    }
}
