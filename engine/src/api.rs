//! JSON-facing orchestration used by the CLI and the JNI bridge.
//!
//! Rule rejections (bad amounts, out-of-range scores, missing layer state)
//! come back as `{success: false, reason}` envelopes. Infrastructure failures
//! (unreadable files, unknown sample ids) are `anyhow` errors.

use std::future::Future;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::content::{builtin_catalog, builtin_character};
use crate::reactor::{detect_modifier_changes, react_to_changes};
use crate::{
    resolve_classes, AbilityModel, CharacterSnapshot, ClassTable, DamageEvent, DerivedStats,
    DerivedStatsCalculator, LayerUpdate, MitigationPipeline, MitigationResult, ModifierChange,
    PersistenceUpdate, RulesConfig, SecondaryEffect, StaticCatalog,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            reason: None,
            message: None,
        }
    }

    pub fn rejected(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            reason: Some(reason.into()),
            message: Some(message.into()),
        }
    }
}

/// Either an inline character or the id of a bundled sample.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CharacterSource {
    #[serde(default)]
    pub character: Option<CharacterSnapshot>,
    #[serde(default)]
    pub character_id: Option<String>,
}

impl CharacterSource {
    pub fn inline(character: CharacterSnapshot) -> Self {
        Self {
            character: Some(character),
            character_id: None,
        }
    }

    pub fn sample(id: impl Into<String>) -> Self {
        Self {
            character: None,
            character_id: Some(id.into()),
        }
    }

    fn load(&self) -> Result<CharacterSnapshot> {
        if let Some(character) = &self.character {
            return Ok(character.clone());
        }
        let Some(id) = &self.character_id else {
            bail!("request needs either `character` or `character_id`");
        };
        builtin_character(id)
            .with_context(|| format!("failed to parse bundled character: {}", id))?
            .with_context(|| format!("unknown character id: {}", id))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeriveRequest {
    #[serde(flatten)]
    pub source: CharacterSource,
    #[serde(default)]
    pub catalog_path: Option<String>,
    #[serde(default)]
    pub config: Option<RulesConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DamageRequest {
    #[serde(flatten)]
    pub source: CharacterSource,
    pub event: DamageEvent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReactRequest {
    #[serde(flatten)]
    pub source: CharacterSource,
    /// Ability scores after the change.
    pub after: AbilityModel,
    #[serde(default)]
    pub catalog_path: Option<String>,
    #[serde(default)]
    pub config: Option<RulesConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageResponse {
    pub result: MitigationResult,
    pub update: PersistenceUpdate,
    pub audit: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactResponse {
    pub changes: Vec<ModifierChange>,
    pub effects: Vec<SecondaryEffect>,
}

fn load_catalog(path: Option<&str>) -> Result<StaticCatalog> {
    match path {
        Some(path) => StaticCatalog::from_path(path)
            .with_context(|| format!("failed to load class catalog: {}", path)),
        None => builtin_catalog().context("bundled class catalog is invalid"),
    }
}

async fn class_table(character: &CharacterSnapshot, catalog_path: Option<&str>) -> Result<ClassTable> {
    let catalog = load_catalog(catalog_path)?;
    resolve_classes(&character.classes, &catalog)
        .await
        .context("failed to resolve classes")
}

pub async fn derive_sheet(request: DeriveRequest) -> Result<Envelope<DerivedStats>> {
    let character = request.source.load()?;
    let config = request.config.unwrap_or_default();
    if let Err(err) = config.validate() {
        return Ok(Envelope::rejected("invalid_config", err.to_string()));
    }
    if let Err(err) = character
        .abilities
        .validate(config.ability_total_min, config.ability_total_max)
    {
        return Ok(Envelope::rejected(err.code(), err.to_string()));
    }

    let classes = class_table(&character, request.catalog_path.as_deref()).await?;
    let stats = DerivedStatsCalculator::new(config).compute_for(&character, &classes);
    info!(
        character = %character.id,
        hp = stats.hp.max,
        bab = stats.bab,
        diagnostics = stats.diagnostics.len(),
        "sheet derived"
    );
    Ok(Envelope::ok(stats))
}

pub async fn resolve_damage(request: DamageRequest) -> Result<Envelope<DamageResponse>> {
    let character = request.source.load()?;
    let Some(layers) = &character.layers else {
        return Ok(Envelope::rejected(
            "insufficient_data",
            format!("character '{}' has no mitigation layers", character.id),
        ));
    };

    let result = match MitigationPipeline::resolve(&request.event, layers) {
        Ok(result) => result,
        Err(err) => return Ok(Envelope::rejected(err.code(), err.to_string())),
    };
    let audit = result.audit_lines(&character.name);
    Ok(Envelope::ok(DamageResponse {
        update: result.persistence_update(),
        audit,
        result,
    }))
}

pub async fn react(request: ReactRequest) -> Result<Envelope<ReactResponse>> {
    let character = request.source.load()?;
    let config = request.config.unwrap_or_default();
    if let Err(err) = config.validate() {
        return Ok(Envelope::rejected("invalid_config", err.to_string()));
    }
    for abilities in [&character.abilities, &request.after] {
        if let Err(err) = abilities.validate(config.ability_total_min, config.ability_total_max) {
            return Ok(Envelope::rejected(err.code(), err.to_string()));
        }
    }

    let classes = class_table(&character, request.catalog_path.as_deref()).await?;
    let changes = detect_modifier_changes(&character.abilities, &request.after);
    let effects = react_to_changes(&character, &classes, &request.after);
    Ok(Envelope::ok(ReactResponse { changes, effects }))
}

/// Drive one of the async entry points to completion on a private
/// current-thread runtime, for callers that are not async themselves.
pub fn run_blocking<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}
