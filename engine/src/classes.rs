use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::DefenseBonuses;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(String);

impl ClassId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClassId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One level taken in one class. `level_in_class` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLevelEntry {
    pub class_id: ClassId,
    pub hit_die: u8,
    pub level_in_class: u32,
}

/// Ordered class levels of one character. Character level is the entry count.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassLedger {
    entries: Vec<ClassLevelEntry>,
}

impl ClassLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<ClassLevelEntry>) -> Self {
        Self { entries }
    }

    /// Append one level of `class`, numbering it within that class.
    pub fn push_level(&mut self, class: &ClassDefinition) -> &ClassLevelEntry {
        let level_in_class = self.levels_in(&class.id) + 1;
        self.entries.push(ClassLevelEntry {
            class_id: class.id.clone(),
            hit_die: class.hit_die,
            level_in_class,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Builder form of [`ClassLedger::push_level`], repeated `levels` times.
    pub fn with_levels(mut self, class: &ClassDefinition, levels: u32) -> Self {
        for _ in 0..levels {
            self.push_level(class);
        }
        self
    }

    pub fn entries(&self) -> &[ClassLevelEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_level(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn half_level(&self) -> i32 {
        (self.total_level() / 2) as i32
    }

    pub fn levels_in(&self, class_id: &ClassId) -> u32 {
        self.entries
            .iter()
            .filter(|e| &e.class_id == class_id)
            .map(|e| e.level_in_class)
            .max()
            .unwrap_or(0)
    }

    /// Highest level reached in each class, in order of first appearance.
    pub fn class_levels(&self) -> IndexMap<ClassId, u32> {
        let mut levels: IndexMap<ClassId, u32> = IndexMap::new();
        for entry in &self.entries {
            let slot = levels.entry(entry.class_id.clone()).or_insert(0);
            *slot = (*slot).max(entry.level_in_class);
        }
        levels
    }

    /// Levels taken in heroic classes. Unknown classes do not count.
    pub fn heroic_levels(&self, classes: &ClassTable) -> u32 {
        let mut count = 0;
        for entry in &self.entries {
            match classes.get(&entry.class_id) {
                Some(def) if def.heroic => count += 1,
                Some(_) => {}
                None => warn!(
                    class = %entry.class_id,
                    "class missing from catalog; level not counted as heroic"
                ),
            }
        }
        count
    }
}

/// Catalog entry for one class: hit die and per-level progression tables.
///
/// Both tables are indexed by level within the class (row 0 is level 1) and
/// behave as step functions: levels past the last row reuse the last row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub id: ClassId,
    pub name: String,
    pub hit_die: u8,
    pub heroic: bool,
    pub bab: Vec<i32>,
    pub defenses: Vec<DefenseBonuses>,
}

impl ClassDefinition {
    pub fn bab_at(&self, level_in_class: u32) -> Option<i32> {
        step_lookup(&self.bab, level_in_class).copied()
    }

    pub fn defenses_at(&self, level_in_class: u32) -> Option<DefenseBonuses> {
        step_lookup(&self.defenses, level_in_class).copied()
    }
}

fn step_lookup<T>(table: &[T], level: u32) -> Option<&T> {
    if level == 0 || table.is_empty() {
        return None;
    }
    let idx = (level as usize - 1).min(table.len() - 1);
    table.get(idx)
}

/// Class definitions resolved for one computation.
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    classes: IndexMap<ClassId, Arc<ClassDefinition>>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, def: Arc<ClassDefinition>) {
        self.classes.insert(def.id.clone(), def);
    }

    pub fn with(mut self, def: ClassDefinition) -> Self {
        self.insert(Arc::new(def));
        self
    }

    pub fn get(&self, id: &ClassId) -> Option<&ClassDefinition> {
        self.classes.get(id).map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<Arc<ClassDefinition>> for ClassTable {
    fn from_iter<I: IntoIterator<Item = Arc<ClassDefinition>>>(iter: I) -> Self {
        let mut table = ClassTable::new();
        for def in iter {
            table.insert(def);
        }
        table
    }
}
