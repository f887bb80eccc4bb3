use std::sync::Arc;

use d20core::reactor::{detect_modifier_changes, on_ability_modifier_change, react_to_changes};
use d20core::*;

fn heroic() -> ClassDefinition {
    ClassDefinition {
        id: ClassId::new("scout"),
        name: "Scout".into(),
        hit_die: 8,
        heroic: true,
        bab: vec![0, 1, 2, 3],
        defenses: vec![DefenseBonuses::new(1, 2, 0)],
    }
}

fn nonheroic() -> ClassDefinition {
    ClassDefinition {
        id: ClassId::new("nonheroic"),
        name: "Nonheroic".into(),
        hit_die: 4,
        heroic: false,
        bab: vec![0, 1, 2],
        defenses: vec![DefenseBonuses::default()],
    }
}

fn character(kind: CharacterKind, ledger: ClassLedger) -> CharacterSnapshot {
    CharacterSnapshot::new(
        "r1",
        "Rill",
        kind,
        AbilityModel::from_bases([10, 12, 13, 11, 13, 10]),
    )
    .with_classes(ledger)
}

fn classes() -> ClassTable {
    [heroic(), nonheroic()].into_iter().map(Arc::new).collect()
}

#[test]
fn con_increase_grants_hp_per_heroic_level() {
    let pc = character(CharacterKind::Organic, ClassLedger::new().with_levels(&heroic(), 4));
    let effects = on_ability_modifier_change(&pc, &classes(), Ability::Con, 1, 2);
    assert_eq!(
        effects,
        vec![SecondaryEffect::MaxHitPoints {
            amount: 4,
            heroic_levels: 4,
        }]
    );
}

#[test]
fn nonheroic_levels_do_not_count() {
    let ledger = ClassLedger::new()
        .with_levels(&heroic(), 2)
        .with_levels(&nonheroic(), 3);
    let pc = character(CharacterKind::Organic, ledger);
    let effects = on_ability_modifier_change(&pc, &classes(), Ability::Con, 0, 1);
    assert_eq!(
        effects,
        vec![SecondaryEffect::MaxHitPoints {
            amount: 2,
            heroic_levels: 2,
        }]
    );
}

#[test]
fn con_decrease_removes_hp() {
    let pc = character(CharacterKind::Organic, ClassLedger::new().with_levels(&heroic(), 3));
    let effects = on_ability_modifier_change(&pc, &classes(), Ability::Con, 2, 1);
    assert_eq!(
        effects,
        vec![SecondaryEffect::MaxHitPoints {
            amount: -3,
            heroic_levels: 3,
        }]
    );
}

#[test]
fn construct_con_change_has_no_effect() {
    let droid = character(CharacterKind::Construct, ClassLedger::new().with_levels(&heroic(), 4));
    assert!(on_ability_modifier_change(&droid, &classes(), Ability::Con, 1, 3).is_empty());
}

#[test]
fn int_increase_grants_skill_and_language_choices() {
    let pc = character(CharacterKind::Organic, ClassLedger::new().with_levels(&heroic(), 1));
    let effects = on_ability_modifier_change(&pc, &classes(), Ability::Int, 0, 1);
    assert_eq!(
        effects,
        vec![
            SecondaryEffect::TrainedSkills { count: 1 },
            SecondaryEffect::BonusLanguages { count: 1 },
        ]
    );
    assert!(effects.iter().all(SecondaryEffect::requires_choice));
}

#[test]
fn int_decrease_takes_nothing_back() {
    let pc = character(CharacterKind::Organic, ClassLedger::new().with_levels(&heroic(), 1));
    assert!(on_ability_modifier_change(&pc, &classes(), Ability::Int, 1, 0).is_empty());
}

#[test]
fn wis_increase_scales_with_power_trainings() {
    let ledger = ClassLedger::new().with_levels(&heroic(), 2);
    let trained = character(CharacterKind::Organic, ledger.clone()).with_power_trainings(2);
    assert_eq!(
        on_ability_modifier_change(&trained, &classes(), Ability::Wis, 1, 2),
        vec![SecondaryEffect::PowerSlots { count: 2 }]
    );

    let untrained = character(CharacterKind::Organic, ledger);
    assert!(on_ability_modifier_change(&untrained, &classes(), Ability::Wis, 1, 2).is_empty());
}

#[test]
fn raw_score_change_without_modifier_change_is_ignored() {
    let pc = character(CharacterKind::Organic, ClassLedger::new().with_levels(&heroic(), 4));
    // CON 13 -> 12 keeps +1; INT 11 -> 12 moves 0 -> +1
    let mut after = pc.abilities.clone();
    after.set(Ability::Con, AbilityScore::new(12));
    after.set(Ability::Int, AbilityScore::new(12));

    let changes = detect_modifier_changes(&pc.abilities, &after);
    assert_eq!(
        changes,
        vec![ModifierChange {
            ability: Ability::Int,
            old_modifier: 0,
            new_modifier: 1,
        }]
    );

    let effects = react_to_changes(&pc, &classes(), &after);
    assert_eq!(effects.len(), 2);
}

#[test]
fn effects_serialize_with_tag() {
    let effect = SecondaryEffect::PowerSlots { count: 3 };
    let json = serde_json::to_value(effect).unwrap();
    assert_eq!(json["effect"], "power_slots");
    assert_eq!(json["count"], 3);
}
