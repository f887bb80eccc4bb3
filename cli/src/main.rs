use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use d20core::api::{
    derive_sheet, react, resolve_damage, run_blocking, CharacterSource, DamageRequest,
    DeriveRequest, Envelope, ReactRequest,
};
use d20core::content::builtin_character;
use d20core::{
    Ability, AbilityScore, CharacterSnapshot, DamageDice, DamageEvent, DamageType, Dice, Layer,
    RulesConfig,
};
use encoding_rs::Encoding;
use serde::Serialize;

#[derive(clap::Args)]
struct CharacterArgs {
    /// Path to a character snapshot JSON file
    #[arg(long, conflicts_with = "character_id")]
    file: Option<PathBuf>,
    /// Id of a bundled sample character (sample_jedi, sample_droid)
    #[arg(long)]
    character_id: Option<String>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Compute HP, BAB, defenses and skills for a character
    Derive {
        #[command(flatten)]
        character: CharacterArgs,
        /// Class catalog (YAML, or JSON by extension); defaults to the core classes
        #[arg(long)]
        catalog: Option<String>,
        /// Rules config YAML
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print breakdown lines instead of JSON
        #[arg(long)]
        lines: bool,
    },
    /// Resolve one damage event against the character's layers
    Mitigate {
        #[command(flatten)]
        character: CharacterArgs,
        /// Flat damage amount
        #[arg(long, conflicts_with = "dice", required_unless_present = "dice")]
        amount: Option<i32>,
        /// Damage dice such as 2d6+3
        #[arg(long)]
        dice: Option<DamageDice>,
        /// RNG seed when rolling dice
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Damage type (kinetic, energy, ion, ...)
        #[arg(long, default_value = "untyped")]
        damage_type: DamageType,
        #[arg(long)]
        ignore_bonus: bool,
        #[arg(long)]
        ignore_shield: bool,
        #[arg(long)]
        ignore_dr: bool,
        #[arg(long)]
        ignore_temp: bool,
        /// Print the audit trail instead of JSON
        #[arg(long)]
        audit: bool,
    },
    /// Report secondary effects of new ability scores
    React {
        #[command(flatten)]
        character: CharacterArgs,
        /// New base score, e.g. --set con=14 (repeatable)
        #[arg(long = "set", value_parser = parse_assignment, required = true)]
        set: Vec<(Ability, i32)>,
        #[arg(long)]
        catalog: Option<String>,
    },
    /// Roll damage dice
    Roll {
        /// Dice expression such as 2d6+3
        dice: DamageDice,
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Number of rolls
        #[arg(long, default_value_t = 1)]
        times: u32,
    },
    /// Print a bundled sample character as JSON
    Dump {
        #[arg(long)]
        character_id: String,
    },
}

#[derive(Parser)]
#[command(name = "d20core")]
#[command(about = "d20 rules core: derived stats and damage mitigation")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

fn parse_assignment(s: &str) -> Result<(Ability, i32), String> {
    let (ability, score) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ABILITY=SCORE, got '{}'", s))?;
    let ability = ability.parse::<Ability>().map_err(|e| e.to_string())?;
    let score = score
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("bad score '{}': {}", score, e))?;
    Ok((ability, score))
}

fn read_text_auto(path: &std::path::Path) -> anyhow::Result<String> {
    let bytes = fs::read(path)?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        Ok(String::from_utf8(bytes)?)
    }
}

fn load_character(args: CharacterArgs) -> anyhow::Result<CharacterSource> {
    match (args.file, args.character_id) {
        (Some(path), _) => {
            let text = read_text_auto(&path)
                .with_context(|| format!("failed to read character file: {}", path.display()))?;
            let character: CharacterSnapshot = serde_json::from_str(&text)
                .with_context(|| format!("failed to parse character file: {}", path.display()))?;
            Ok(CharacterSource::inline(character))
        }
        (None, Some(id)) => Ok(CharacterSource::sample(id)),
        (None, None) => bail!("pass --file or --character-id"),
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Option<RulesConfig>> {
    path.map(|p| {
        let text = read_text_auto(&p)
            .with_context(|| format!("failed to read config: {}", p.display()))?;
        RulesConfig::from_yaml_str(&text)
            .with_context(|| format!("failed to parse config: {}", p.display()))
    })
    .transpose()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_for<T>(env: &Envelope<T>) -> ExitCode {
    if env.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

fn main() -> anyhow::Result<ExitCode> {
    d20core::logging::init("warn");
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Derive {
            character,
            catalog,
            config,
            lines,
        } => {
            let request = DeriveRequest {
                source: load_character(character)?,
                catalog_path: catalog,
                config: load_config(config)?,
            };
            let env = run_blocking(derive_sheet(request))??;
            match (&env.result, lines) {
                (Some(stats), true) => {
                    println!("HP {}/{}", stats.hp.current, stats.hp.max);
                    for item in &stats.hp.breakdown {
                        println!("  {}", item);
                    }
                    println!("BAB +{}", stats.bab);
                    for (name, defense) in [
                        ("Fortitude", &stats.defenses.fortitude),
                        ("Reflex", &stats.defenses.reflex),
                        ("Will", &stats.defenses.will),
                    ] {
                        println!("{} {}", name, defense.total);
                        for item in defense.line_items() {
                            println!("  {}", item);
                        }
                    }
                    for (skill, breakdown) in &stats.skills {
                        println!("{} {:+}", skill, breakdown.total);
                    }
                    for diagnostic in &stats.diagnostics {
                        println!("! {}", diagnostic);
                    }
                }
                _ => print_json(&env)?,
            }
            Ok(exit_for(&env))
        }
        Cmd::Mitigate {
            character,
            amount,
            dice,
            seed,
            damage_type,
            ignore_bonus,
            ignore_shield,
            ignore_dr,
            ignore_temp,
            audit,
        } => {
            let mut event = match (amount, dice) {
                (Some(amount), _) => DamageEvent::new(amount),
                (None, Some(dice)) => {
                    let mut roller = Dice::from_seed(seed);
                    let (event, roll) = DamageEvent::rolled(dice, &mut roller);
                    eprintln!("rolled {} {:?} = {}", dice, roll.rolls, roll.total);
                    event
                }
                (None, None) => bail!("pass --amount or --dice"),
            };
            event = event.of_type(damage_type).from_source("cli");
            for (flag, layer) in [
                (ignore_bonus, Layer::BonusHp),
                (ignore_shield, Layer::Shield),
                (ignore_dr, Layer::DamageReduction),
                (ignore_temp, Layer::TemporaryHp),
            ] {
                if flag {
                    event = event.bypassing(layer);
                }
            }

            let request = DamageRequest {
                source: load_character(character)?,
                event,
            };
            let env = run_blocking(resolve_damage(request))??;
            match (&env.result, audit) {
                (Some(response), true) => {
                    for line in &response.audit {
                        println!("{}", line);
                    }
                }
                _ => print_json(&env)?,
            }
            Ok(exit_for(&env))
        }
        Cmd::React {
            character,
            set,
            catalog,
        } => {
            let source = load_character(character)?;
            let mut after = match &source.character {
                Some(c) => c.abilities.clone(),
                None => {
                    let id = source.character_id.as_deref().unwrap_or_default();
                    builtin_character(id)?
                        .with_context(|| format!("unknown character id: {}", id))?
                        .abilities
                }
            };
            for (ability, base) in set {
                let score = after
                    .score(ability)
                    .map_or(AbilityScore::new(base), |s| AbilityScore { base, ..*s });
                after.set(ability, score);
            }
            let request = ReactRequest {
                source,
                after,
                catalog_path: catalog,
                config: None,
            };
            let env = run_blocking(react(request))??;
            print_json(&env)?;
            Ok(exit_for(&env))
        }
        Cmd::Roll { dice, seed, times } => {
            let mut roller = Dice::from_seed(seed);
            for _ in 0..times {
                let roll = dice.roll(&mut roller);
                println!("{} {:?} = {}", dice, roll.rolls, roll.total);
            }
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Dump { character_id } => {
            let character = builtin_character(&character_id)?
                .with_context(|| format!("unknown character id: {}", character_id))?;
            print_json(&character)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
