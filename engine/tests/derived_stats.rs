use std::sync::Arc;

use d20core::*;
use proptest::prelude::*;

fn class(id: &str, hit_die: u8, bab: Vec<i32>, defenses: DefenseBonuses) -> ClassDefinition {
    ClassDefinition {
        id: ClassId::new(id),
        name: id.to_string(),
        hit_die,
        heroic: true,
        bab,
        defenses: vec![defenses],
    }
}

fn soldier() -> ClassDefinition {
    class("soldier", 10, (1..=20).collect(), DefenseBonuses::new(2, 1, 0))
}

fn scout() -> ClassDefinition {
    class(
        "scout",
        8,
        vec![0, 1, 2, 3, 3, 4, 5, 6, 6, 7],
        DefenseBonuses::new(1, 2, 0),
    )
}

fn table(defs: &[ClassDefinition]) -> ClassTable {
    defs.iter().cloned().map(Arc::new).collect()
}

fn abilities(str_: i32, dex: i32, con: i32, int: i32, wis: i32, cha: i32) -> AbilityModel {
    AbilityModel::from_bases([str_, dex, con, int, wis, cha])
}

fn derive(
    abilities: &AbilityModel,
    ledger: &ClassLedger,
    kind: CharacterKind,
    classes: &ClassTable,
) -> DerivedStats {
    DerivedStatsCalculator::default().compute(
        abilities,
        ledger,
        kind,
        classes,
        &SheetOverrides::default(),
    )
}

#[test]
fn organic_level_one_adds_con_to_tripled_hit_die() {
    let def = soldier();
    let ledger = ClassLedger::new().with_levels(&def, 1);
    let stats = derive(
        &abilities(10, 10, 14, 10, 10, 10),
        &ledger,
        CharacterKind::Organic,
        &table(&[def]),
    );
    assert_eq!(stats.hp.max, 32);
    assert_eq!(stats.hp.current, 32);
    assert!(stats.is_complete());
}

#[test]
fn construct_level_one_ignores_con() {
    let def = soldier();
    let ledger = ClassLedger::new().with_levels(&def, 1);
    let stats = derive(
        &abilities(10, 10, 14, 10, 10, 10),
        &ledger,
        CharacterKind::Construct,
        &table(&[def]),
    );
    assert_eq!(stats.hp.max, 30);
    assert!(stats.hp.breakdown.iter().all(|item| !item.source.starts_with("CON")));
}

#[test]
fn later_levels_add_half_die_plus_one() {
    let def = soldier();
    let ledger = ClassLedger::new().with_levels(&def, 3);
    let stats = derive(
        &abilities(10, 10, 12, 10, 10, 10),
        &ledger,
        CharacterKind::Organic,
        &table(&[def]),
    );
    // 30 + 6 + 6 + 1*3
    assert_eq!(stats.hp.max, 45);
    let last = stats.hp.breakdown.last().unwrap();
    assert_eq!(last.source, "CON x3");
    assert_eq!(last.running_total, 45);
}

#[test]
fn hp_never_drops_below_minimum() {
    let def = class("weakling", 4, vec![0], DefenseBonuses::default());
    let ledger = ClassLedger::new().with_levels(&def, 1);
    let stats = derive(
        &abilities(10, 10, 1, 10, 10, 10),
        &ledger,
        CharacterKind::Organic,
        &table(&[def]),
    );
    // 4*3 + (-5) = 7, still above minimum
    assert_eq!(stats.hp.max, 7);

    let empty = derive(
        &abilities(10, 10, 1, 10, 10, 10),
        &ClassLedger::new(),
        CharacterKind::Organic,
        &ClassTable::new(),
    );
    assert_eq!(empty.hp.max, 1);
    assert!(empty.diagnostics.contains(&Diagnostic::NoClassLevels));
}

#[test]
fn construct_fortitude_uses_strength_only() {
    let def = soldier();
    let ledger = ClassLedger::new().with_levels(&def, 2);
    let stats = derive(
        &abilities(12, 10, 18, 10, 10, 10),
        &ledger,
        CharacterKind::Construct,
        &table(&[def]),
    );
    let fort = &stats.defenses.fortitude;
    assert_eq!(fort.ability, Ability::Str);
    assert_eq!(fort.ability_bonus, 1);
    // 10 + 1 (half of 2) + 2 class + 1 STR
    assert_eq!(fort.total, 14);
}

#[test]
fn organic_fortitude_takes_better_of_str_and_con() {
    let def = soldier();
    let ledger = ClassLedger::new().with_levels(&def, 1);
    let classes = table(&[def]);

    let con_heavy = derive(&abilities(10, 10, 16, 10, 10, 10), &ledger, CharacterKind::Organic, &classes);
    assert_eq!(con_heavy.defenses.fortitude.ability, Ability::Con);
    assert_eq!(con_heavy.defenses.fortitude.ability_bonus, 3);

    let str_heavy = derive(&abilities(18, 10, 12, 10, 10, 10), &ledger, CharacterKind::Organic, &classes);
    assert_eq!(str_heavy.defenses.fortitude.ability, Ability::Str);
    assert_eq!(str_heavy.defenses.fortitude.ability_bonus, 4);
}

#[test]
fn multiclass_defense_bonus_is_max_not_sum() {
    let a = class("a", 8, vec![1], DefenseBonuses::new(0, 2, 0));
    let b = class("b", 8, vec![1], DefenseBonuses::new(1, 2, 0));
    let ledger = ClassLedger::new().with_levels(&a, 1).with_levels(&b, 1);
    let stats = derive(
        &abilities(10, 10, 10, 10, 10, 10),
        &ledger,
        CharacterKind::Organic,
        &table(&[a, b]),
    );
    assert_eq!(stats.defenses.reflex.class_bonus, 2);
    assert_eq!(stats.defenses.fortitude.class_bonus, 1);
}

#[test]
fn bab_sums_per_class_progressions() {
    let soldier = soldier();
    let scout = scout();
    let ledger = ClassLedger::new()
        .with_levels(&soldier, 3)
        .with_levels(&scout, 2);
    let stats = derive(
        &abilities(10, 10, 10, 10, 10, 10),
        &ledger,
        CharacterKind::Organic,
        &table(&[soldier, scout]),
    );
    assert_eq!(stats.bab, 3 + 1);
}

#[test]
fn progression_past_table_end_reuses_last_row() {
    let short = class("short", 8, vec![0, 1], DefenseBonuses::new(1, 1, 1));
    let ledger = ClassLedger::new().with_levels(&short, 5);
    let stats = derive(
        &abilities(10, 10, 10, 10, 10, 10),
        &ledger,
        CharacterKind::Organic,
        &table(&[short]),
    );
    assert_eq!(stats.bab, 1);
    assert!(stats.is_complete());
}

#[test]
fn missing_class_contributes_zero_with_diagnostic() {
    let def = soldier();
    let ledger = ClassLedger::new().with_levels(&def, 2);
    let stats = derive(
        &abilities(10, 10, 10, 10, 10, 10),
        &ledger,
        CharacterKind::Organic,
        &ClassTable::new(),
    );
    assert_eq!(stats.bab, 0);
    assert_eq!(stats.defenses.reflex.class_bonus, 0);
    assert!(stats.diagnostics.contains(&Diagnostic::MissingClass {
        class_id: ClassId::new("soldier"),
    }));
    // reported once even though BAB and three defenses all looked it up
    let missing = stats
        .diagnostics
        .iter()
        .filter(|d| matches!(d, Diagnostic::MissingClass { .. }))
        .count();
    assert_eq!(missing, 1);
}

#[test]
fn missing_ability_defaults_to_zero_and_is_reported() {
    let def = soldier();
    let ledger = ClassLedger::new().with_levels(&def, 1);
    let model = abilities(10, 16, 10, 10, 10, 10).without(Ability::Wis);
    let stats = derive(&model, &ledger, CharacterKind::Organic, &table(&[def]));
    assert_eq!(stats.defenses.will.ability_bonus, 0);
    assert_eq!(stats.defenses.reflex.ability_bonus, 3);
    assert!(stats.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::MissingAbility { ability: Ability::Wis, .. }
    )));
}

#[test]
fn construct_without_con_score_is_complete() {
    let def = soldier();
    let ledger = ClassLedger::new().with_levels(&def, 1);
    let model = abilities(14, 12, 10, 12, 10, 8).without(Ability::Con);
    let stats = derive(&model, &ledger, CharacterKind::Construct, &table(&[def]));
    assert!(stats.is_complete(), "{:?}", stats.diagnostics);
    assert_eq!(stats.skills[&Skill::Endurance].ability, Ability::Str);
    assert_eq!(stats.skills[&Skill::Endurance].ability_mod, 2);
}

#[test]
fn skills_stack_training_focus_and_half_level() {
    let def = soldier();
    let ledger = ClassLedger::new().with_levels(&def, 4);
    let overrides = SheetOverrides::default()
        .train(Skill::Perception)
        .focus(Skill::Perception);
    let stats = DerivedStatsCalculator::default().compute(
        &abilities(10, 10, 10, 10, 14, 10),
        &ledger,
        CharacterKind::Organic,
        &table(&[def]),
        &overrides,
    );
    let perception = &stats.skills[&Skill::Perception];
    assert_eq!(perception.total, 2 + 5 + 5 + 2);
    let items = perception.line_items();
    assert_eq!(items.last().unwrap().running_total, perception.total);

    let stealth = &stats.skills[&Skill::Stealth];
    assert_eq!(stealth.trained_bonus, 0);
    assert_eq!(stealth.total, 2);
}

#[test]
fn compute_is_idempotent() {
    let def = soldier();
    let ledger = ClassLedger::new().with_levels(&def, 5);
    let model = abilities(13, 15, 12, 8, 11, 16);
    let classes = table(&[def]);
    let first = derive(&model, &ledger, CharacterKind::Organic, &classes);
    let second = derive(&model, &ledger, CharacterKind::Organic, &classes);
    assert_eq!(first, second);
}

#[test]
fn compute_for_clamps_current_hp_from_layers() {
    let def = soldier();
    let character = CharacterSnapshot::new(
        "c1",
        "Tess",
        CharacterKind::Organic,
        abilities(10, 10, 14, 10, 10, 10),
    )
    .with_classes(ClassLedger::new().with_levels(&def, 1))
    .with_layers(MitigationLayers::new(HitPointPool { value: 50, max: 50 }));
    let stats = DerivedStatsCalculator::default().compute_for(&character, &table(&[def]));
    assert_eq!(stats.hp.max, 32);
    assert_eq!(stats.hp.current, 32);
}

#[test]
fn config_changes_defense_base() {
    let def = soldier();
    let ledger = ClassLedger::new().with_levels(&def, 1);
    let config = RulesConfig {
        defense_base: 12,
        ..RulesConfig::default()
    };
    let stats = DerivedStatsCalculator::new(config).compute(
        &abilities(10, 10, 10, 10, 10, 10),
        &ledger,
        CharacterKind::Organic,
        &table(&[def]),
        &SheetOverrides::default(),
    );
    assert_eq!(stats.defenses.will.total, 12);
}

proptest! {
    #[test]
    fn construct_outputs_ignore_con(con in 1i32..=40, levels in 1u32..=10) {
        let def = soldier();
        let ledger = ClassLedger::new().with_levels(&def, levels);
        let classes = table(&[def]);
        let baseline = derive(&abilities(14, 12, 10, 10, 10, 10), &ledger, CharacterKind::Construct, &classes);
        let fuzzed = derive(&abilities(14, 12, con, 10, 10, 10), &ledger, CharacterKind::Construct, &classes);
        prop_assert_eq!(baseline.hp, fuzzed.hp);
        prop_assert_eq!(baseline.defenses.fortitude, fuzzed.defenses.fortitude);
    }
}
