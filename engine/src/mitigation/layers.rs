use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{DamageType, MitigationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShieldRating {
    pub current: i32,
    pub max: i32,
}

impl ShieldRating {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn is_up(&self) -> bool {
        self.current > 0
    }
}

/// One equipped or installed item granting damage reduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrSource {
    pub name: String,
    pub value: i32,
    /// Damage types that ignore this source.
    #[serde(default)]
    pub bypassed_by: Vec<DamageType>,
}

impl DrSource {
    pub fn new(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into(),
            value,
            bypassed_by: Vec::new(),
        }
    }

    pub fn bypassed_by(mut self, damage_type: DamageType) -> Self {
        self.bypassed_by.push(damage_type);
        self
    }

    pub fn applies_to(&self, damage_type: DamageType) -> bool {
        !self.bypassed_by.contains(&damage_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HitPointPool {
    pub value: i32,
    pub max: i32,
}

impl HitPointPool {
    pub fn new(max: i32) -> Self {
        Self { value: max, max }
    }
}

/// Mutable resource state of one character, as persisted by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MitigationLayers {
    #[serde(default)]
    pub bonus_hp: i32,
    #[serde(default)]
    pub shield: ShieldRating,
    #[serde(default)]
    pub damage_reduction: Vec<DrSource>,
    #[serde(default)]
    pub temporary_hp: i32,
    pub hp: HitPointPool,
}

impl MitigationLayers {
    pub fn new(hp: HitPointPool) -> Self {
        Self {
            hp,
            ..Self::default()
        }
    }

    pub fn with_bonus_hp(self, bonus_hp: i32) -> Self {
        Self { bonus_hp, ..self }
    }

    pub fn with_shield(self, shield: ShieldRating) -> Self {
        Self { shield, ..self }
    }

    pub fn with_dr(mut self, source: DrSource) -> Self {
        self.damage_reduction.push(source);
        self
    }

    pub fn with_temporary_hp(self, temporary_hp: i32) -> Self {
        Self {
            temporary_hp,
            ..self
        }
    }

    /// Pools must be non-negative; a negative pool would turn damage into healing.
    /// Pools above their max are accepted with a warning.
    pub fn validate(&self) -> Result<(), MitigationError> {
        let checks = [
            ("bonus_hp", self.bonus_hp),
            ("shield.current", self.shield.current),
            ("shield.max", self.shield.max),
            ("hp.temp", self.temporary_hp),
            ("hp.value", self.hp.value),
            ("hp.max", self.hp.max),
        ];
        for (field, value) in checks {
            if value < 0 {
                return Err(MitigationError::InvalidLayerState(format!(
                    "{} is negative ({})",
                    field, value
                )));
            }
        }
        if let Some(source) = self.damage_reduction.iter().find(|s| s.value < 0) {
            return Err(MitigationError::InvalidLayerState(format!(
                "DR source '{}' is negative ({})",
                source.name, source.value
            )));
        }
        if self.hp.value > self.hp.max {
            warn!(value = self.hp.value, max = self.hp.max, "hp above max");
        }
        if self.shield.current > self.shield.max {
            warn!(
                current = self.shield.current,
                max = self.shield.max,
                "shield rating above max"
            );
        }
        Ok(())
    }

    pub fn values(&self) -> LayerValues {
        LayerValues {
            bonus_hp: self.bonus_hp,
            shield_current: self.shield.current,
            temporary_hp: self.temporary_hp,
            hp_value: self.hp.value,
        }
    }

    /// Apply a whole resolved update in one step. Fails when these layers are
    /// not the ones the update was resolved against.
    pub fn commit<U: LayerUpdate>(&self, update: &U) -> Result<Self, MitigationError> {
        if self.values() != update.before() {
            return Err(MitigationError::StaleSnapshot);
        }
        let after = update.after();
        Ok(Self {
            bonus_hp: after.bonus_hp,
            shield: ShieldRating {
                current: after.shield_current,
                ..self.shield
            },
            damage_reduction: self.damage_reduction.clone(),
            temporary_hp: after.temporary_hp,
            hp: HitPointPool {
                value: after.hp_value,
                ..self.hp
            },
        })
    }
}

/// The depletable values of [`MitigationLayers`]. DR never depletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayerValues {
    pub bonus_hp: i32,
    pub shield_current: i32,
    pub temporary_hp: i32,
    pub hp_value: i32,
}

/// A resolved change to a character's layers, committed as one unit.
pub trait LayerUpdate {
    fn before(&self) -> LayerValues;
    fn after(&self) -> LayerValues;

    fn persistence_update(&self) -> PersistenceUpdate {
        PersistenceUpdate::between(self.before(), self.after())
    }
}

/// Field-level writes the host must persist, keyed by document path. Only
/// fields that changed are present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistenceUpdate {
    fields: IndexMap<String, i32>,
}

impl PersistenceUpdate {
    pub const BONUS_HP: &'static str = "bonus_hp";
    pub const SHIELD_CURRENT: &'static str = "shield.current";
    pub const TEMP_HP: &'static str = "hp.temp";
    pub const HP_VALUE: &'static str = "hp.value";

    pub fn between(before: LayerValues, after: LayerValues) -> Self {
        let mut fields = IndexMap::new();
        let pairs = [
            (Self::BONUS_HP, before.bonus_hp, after.bonus_hp),
            (Self::SHIELD_CURRENT, before.shield_current, after.shield_current),
            (Self::TEMP_HP, before.temporary_hp, after.temporary_hp),
            (Self::HP_VALUE, before.hp_value, after.hp_value),
        ];
        for (path, old, new) in pairs {
            if old != new {
                fields.insert(path.to_string(), new);
            }
        }
        Self { fields }
    }

    pub fn get(&self, path: &str) -> Option<i32> {
        self.fields.get(path).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
