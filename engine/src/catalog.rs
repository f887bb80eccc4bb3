//! Class catalog: immutable per-class reference data (hit die, BAB and
//! defense progression), fetched asynchronously and validated on load.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, warn};

pub use crate::classes::{ClassDefinition, ClassId, ClassLedger, ClassLevelEntry, ClassTable};

const HIT_DICE: [u8; 5] = [4, 6, 8, 10, 12];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read class catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse class catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to parse class catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("class '{class_id}' is invalid: {reason}")]
    InvalidClass { class_id: ClassId, reason: String },
    #[error("class '{0}' is defined more than once")]
    DuplicateClass(ClassId),
    #[error("class catalog unavailable: {0}")]
    Unavailable(String),
}

/// Source of class definitions. The only suspension point of the core.
#[async_trait]
pub trait ClassCatalog: Send + Sync {
    async fn fetch(&self, id: &ClassId) -> Result<Option<Arc<ClassDefinition>>, CatalogError>;
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    classes: Vec<ClassDefinition>,
}

/// In-memory catalog loaded from a YAML or JSON document.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    classes: IndexMap<ClassId, Arc<ClassDefinition>>,
}

impl StaticCatalog {
    pub fn from_definitions(defs: Vec<ClassDefinition>) -> Result<Self, CatalogError> {
        let mut classes = IndexMap::new();
        for def in defs {
            if let Err(e) = validate_class(&def) {
                error!(class = %def.id, "rejecting class catalog: {}", e);
                return Err(e);
            }
            if classes.contains_key(&def.id) {
                error!(class = %def.id, "rejecting class catalog: duplicate class id");
                return Err(CatalogError::DuplicateClass(def.id));
            }
            classes.insert(def.id.clone(), Arc::new(def));
        }
        debug!(classes = classes.len(), "class catalog loaded");
        Ok(Self { classes })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(text).inspect_err(|e| {
            error!("class catalog YAML rejected: {}", e);
        })?;
        Self::from_definitions(file.classes)
    }

    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(text).inspect_err(|e| {
            error!("class catalog JSON rejected: {}", e);
        })?;
        Self::from_definitions(file.classes)
    }

    /// Load by extension: `.json` is JSON, anything else is YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    pub fn get(&self, id: &ClassId) -> Option<&ClassDefinition> {
        self.classes.get(id).map(Arc::as_ref)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ClassId> {
        self.classes.keys()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[async_trait]
impl ClassCatalog for StaticCatalog {
    async fn fetch(&self, id: &ClassId) -> Result<Option<Arc<ClassDefinition>>, CatalogError> {
        Ok(self.classes.get(id).cloned())
    }
}

fn validate_class(def: &ClassDefinition) -> Result<(), CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidClass {
        class_id: def.id.clone(),
        reason,
    };
    if def.id.as_str().trim().is_empty() {
        return Err(invalid("empty class id".to_string()));
    }
    if !HIT_DICE.contains(&def.hit_die) {
        return Err(invalid(format!("hit die d{} is not a standard die", def.hit_die)));
    }
    if def.bab.is_empty() {
        return Err(invalid("BAB progression is empty".to_string()));
    }
    if let Some(level) = def.bab.windows(2).position(|w| w[1] < w[0]) {
        return Err(invalid(format!(
            "BAB progression decreases at level {}",
            level + 2
        )));
    }
    if def.defenses.is_empty() {
        return Err(invalid("defense progression is empty".to_string()));
    }
    Ok(())
}

/// Memoizes another catalog. Class data is immutable, so hits never expire.
#[derive(Debug)]
pub struct CachedCatalog<C> {
    inner: C,
    cache: Mutex<HashMap<ClassId, Arc<ClassDefinition>>>,
}

impl<C: ClassCatalog> CachedCatalog<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn cached_len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn cached(&self, id: &ClassId) -> Option<Arc<ClassDefinition>> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

#[async_trait]
impl<C: ClassCatalog> ClassCatalog for CachedCatalog<C> {
    async fn fetch(&self, id: &ClassId) -> Result<Option<Arc<ClassDefinition>>, CatalogError> {
        if let Some(hit) = self.cached(id) {
            return Ok(Some(hit));
        }
        let fetched = self.inner.fetch(id).await?;
        if let Some(def) = &fetched {
            self.cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(id.clone(), Arc::clone(def));
        }
        Ok(fetched)
    }
}

/// Fetch every distinct class in `ledger` once. Classes the catalog does not
/// know are logged and left out; the calculator then counts them as zero.
pub async fn resolve_classes<C>(ledger: &ClassLedger, catalog: &C) -> Result<ClassTable, CatalogError>
where
    C: ClassCatalog + ?Sized,
{
    let mut table = ClassTable::new();
    for class_id in ledger.class_levels().keys() {
        match catalog.fetch(class_id).await? {
            Some(def) => table.insert(def),
            None => warn!(class = %class_id, "class not found in catalog"),
        }
    }
    Ok(table)
}
