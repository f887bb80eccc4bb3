use std::{collections::VecDeque, fmt, str::FromStr};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Source of die results. The rules core never rolls on its own; callers
/// inject one of these.
pub trait DieRoller {
    /// A result in `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> u32;
}

/// Seeded, deterministic roller.
pub struct Dice {
    rng: ChaCha8Rng,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl DieRoller for Dice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.rng.gen_range(1..=sides.max(1))
    }
}

/// Replays fixed results, for tests and for values rolled at the table.
/// Results are clamped into `1..=sides`; once exhausted every die shows 1.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<u32>,
}

impl ScriptedDice {
    pub fn from_scripted(rolls: Vec<u32>) -> Self {
        Self {
            rolls: rolls.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl DieRoller for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.rolls.pop_front().unwrap_or(1).clamp(1, sides.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    #[error("malformed dice expression '{0}' (expected XdY, XdY+Z or XdY-Z)")]
    Malformed(String),
    #[error("dice expression '{0}' has zero sides")]
    ZeroSides(String),
    #[error("dice expression '{0}' rolls more than {} dice", MAX_DICE)]
    TooManyDice(String),
}

/// Upper bound on dice rolled by one expression.
pub const MAX_DICE: u32 = 1000;

/// `count`d`sides` plus a flat bonus, e.g. `2d6+3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageDice {
    pub count: u32,
    pub sides: u32,
    #[serde(default)]
    pub bonus: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRoll {
    pub dice: DamageDice,
    pub rolls: Vec<u32>,
    /// Sum of rolls plus bonus, never below zero.
    pub total: i32,
}

impl DamageDice {
    pub fn new(count: u32, sides: u32) -> Self {
        Self {
            count,
            sides,
            bonus: 0,
        }
    }

    pub fn with_bonus(self, bonus: i32) -> Self {
        Self { bonus, ..self }
    }

    /// Rolls at most [`MAX_DICE`] dice; larger counts are clamped.
    pub fn roll(&self, roller: &mut impl DieRoller) -> DamageRoll {
        let rolls: Vec<u32> = (0..self.count.min(MAX_DICE))
            .map(|_| roller.roll_die(self.sides))
            .collect();
        let sum = rolls
            .iter()
            .map(|&r| i32::try_from(r).unwrap_or(i32::MAX))
            .fold(0i32, i32::saturating_add);
        DamageRoll {
            dice: *self,
            rolls,
            total: sum.saturating_add(self.bonus).max(0),
        }
    }
}

impl fmt::Display for DamageDice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.bonus {
            0 => Ok(()),
            b if b > 0 => write!(f, "+{}", b),
            b => write!(f, "{}", b),
        }
    }
}

impl FromStr for DamageDice {
    type Err = DiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DiceParseError::Malformed(s.to_string());
        let lowered = s.trim().to_lowercase();
        let (count, rest) = lowered.split_once('d').ok_or_else(malformed)?;
        let count = if count.is_empty() {
            1
        } else {
            count.parse().map_err(|_| malformed())?
        };
        let (sides, bonus) = match rest.find(['+', '-']) {
            Some(idx) => {
                let (sides, bonus) = rest.split_at(idx);
                (sides, bonus.parse::<i32>().map_err(|_| malformed())?)
            }
            None => (rest, 0),
        };
        let sides: u32 = sides.parse().map_err(|_| malformed())?;
        if sides == 0 {
            return Err(DiceParseError::ZeroSides(s.to_string()));
        }
        if count > MAX_DICE {
            return Err(DiceParseError::TooManyDice(s.to_string()));
        }
        Ok(Self {
            count,
            sides,
            bonus,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_expressions() {
        assert_eq!("2d6".parse::<DamageDice>().unwrap(), DamageDice::new(2, 6));
        assert_eq!(
            "2d6+3".parse::<DamageDice>().unwrap(),
            DamageDice::new(2, 6).with_bonus(3)
        );
        assert_eq!(
            "1D8-1".parse::<DamageDice>().unwrap(),
            DamageDice::new(1, 8).with_bonus(-1)
        );
        assert_eq!("d20".parse::<DamageDice>().unwrap(), DamageDice::new(1, 20));
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<DamageDice>().is_err());
        assert!("2x6".parse::<DamageDice>().is_err());
        assert!("2d".parse::<DamageDice>().is_err());
        assert_eq!(
            "3d0".parse::<DamageDice>(),
            Err(DiceParseError::ZeroSides("3d0".to_string()))
        );
    }

    #[test]
    fn dice_count_is_bounded() {
        assert!("1000d6".parse::<DamageDice>().is_ok());
        assert_eq!(
            "4000000000d6".parse::<DamageDice>(),
            Err(DiceParseError::TooManyDice("4000000000d6".to_string()))
        );

        let roll = DamageDice::new(u32::MAX, 6).roll(&mut ScriptedDice::default());
        assert_eq!(roll.rolls.len(), MAX_DICE as usize);
        assert_eq!(roll.total, MAX_DICE as i32);
    }

    #[test]
    fn huge_sides_and_bonus_saturate() {
        let mut dice = ScriptedDice::from_scripted(vec![u32::MAX, u32::MAX]);
        let roll = DamageDice::new(2, u32::MAX).with_bonus(i32::MAX).roll(&mut dice);
        assert_eq!(roll.total, i32::MAX);
    }

    #[test]
    fn display_round_trips_bonus_sign() {
        assert_eq!(DamageDice::new(3, 6).with_bonus(-2).to_string(), "3d6-2");
        assert_eq!(DamageDice::new(1, 10).to_string(), "1d10");
    }

    #[test]
    fn seeded_dice_stay_in_range() {
        let mut dice = Dice::from_seed(42);
        for _ in 0..200 {
            let r = dice.roll_die(6);
            assert!((1..=6).contains(&r));
        }
    }
}
