use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::Layer;
use crate::dice::{DamageDice, DamageRoll, DieRoller};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    #[default]
    Untyped,
    Kinetic,
    Energy,
    Ion,
    Fire,
    Cold,
    Acid,
    Sonic,
    Force,
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DamageType::Untyped => "untyped",
            DamageType::Kinetic => "kinetic",
            DamageType::Energy => "energy",
            DamageType::Ion => "ion",
            DamageType::Fire => "fire",
            DamageType::Cold => "cold",
            DamageType::Acid => "acid",
            DamageType::Sonic => "sonic",
            DamageType::Force => "force",
        };
        f.write_str(name)
    }
}

impl FromStr for DamageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use DamageType::*;
        match s.trim().to_lowercase().as_str() {
            "untyped" | "" => Ok(Untyped),
            "kinetic" => Ok(Kinetic),
            "energy" => Ok(Energy),
            "ion" => Ok(Ion),
            "fire" => Ok(Fire),
            "cold" => Ok(Cold),
            "acid" => Ok(Acid),
            "sonic" => Ok(Sonic),
            "force" => Ok(Force),
            other => Err(format!("unknown damage type '{}'", other)),
        }
    }
}

/// Layers an event skips. Real HP can never be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BypassFlags {
    #[serde(default)]
    pub ignores_bonus: bool,
    #[serde(default)]
    pub ignores_shield: bool,
    #[serde(default)]
    pub ignores_dr: bool,
    #[serde(default)]
    pub ignores_temp: bool,
}

impl BypassFlags {
    pub fn bypasses(&self, layer: Layer) -> bool {
        match layer {
            Layer::BonusHp => self.ignores_bonus,
            Layer::Shield => self.ignores_shield,
            Layer::DamageReduction => self.ignores_dr,
            Layer::TemporaryHp => self.ignores_temp,
            Layer::RealHp => false,
        }
    }

    pub fn with(mut self, layer: Layer) -> Self {
        match layer {
            Layer::BonusHp => self.ignores_bonus = true,
            Layer::Shield => self.ignores_shield = true,
            Layer::DamageReduction => self.ignores_dr = true,
            Layer::TemporaryHp => self.ignores_temp = true,
            Layer::RealHp => {}
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub amount: i32,
    #[serde(default)]
    pub damage_type: DamageType,
    #[serde(default)]
    pub source_tag: String,
    #[serde(default)]
    pub bypass: BypassFlags,
}

impl DamageEvent {
    pub fn new(amount: i32) -> Self {
        Self {
            amount,
            damage_type: DamageType::Untyped,
            source_tag: String::new(),
            bypass: BypassFlags::default(),
        }
    }

    /// Roll `dice` with the injected roller and build an event from the total.
    pub fn rolled(dice: DamageDice, roller: &mut impl DieRoller) -> (Self, DamageRoll) {
        let roll = dice.roll(roller);
        (Self::new(roll.total), roll)
    }

    pub fn of_type(self, damage_type: DamageType) -> Self {
        Self {
            damage_type,
            ..self
        }
    }

    pub fn from_source(self, source_tag: impl Into<String>) -> Self {
        Self {
            source_tag: source_tag.into(),
            ..self
        }
    }

    pub fn bypassing(self, layer: Layer) -> Self {
        Self {
            bypass: self.bypass.with(layer),
            ..self
        }
    }
}
