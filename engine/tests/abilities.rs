use d20core::*;
use proptest::prelude::*;

#[test]
fn modifier_is_floored() {
    assert_eq!(ability_mod(10), 0);
    assert_eq!(ability_mod(11), 0);
    assert_eq!(ability_mod(12), 1);
    assert_eq!(ability_mod(9), -1);
    assert_eq!(ability_mod(8), -1);
    assert_eq!(ability_mod(1), -5);
}

#[test]
fn total_sums_components() {
    let score = AbilityScore::new(14).with_racial(2).with_temporary(-4);
    assert_eq!(score.total(), 12);
    assert_eq!(score.modifier(), 1);
}

#[test]
fn extreme_components_saturate_and_fail_validation() {
    let high = AbilityScore::new(i32::MAX).with_racial(1).with_temporary(5);
    assert_eq!(high.total(), i32::MAX);
    let low = AbilityScore::new(i32::MIN).with_temporary(-1);
    assert_eq!(low.total(), i32::MIN);
    assert_eq!(low.modifier(), i32::MIN / 2);

    let model = AbilityModel::from_bases([10; 6]).with(Ability::Str, high);
    assert_eq!(
        model.validate(1, 40).unwrap_err(),
        AbilityError::OutOfRange {
            ability: Ability::Str,
            total: i32::MAX,
            min: 1,
            max: 40,
        }
    );
}

#[test]
fn model_reports_missing_abilities_as_none() {
    let model = AbilityModel::from_bases([10, 12, 14, 16, 18, 8]).without(Ability::Con);
    assert_eq!(model.modifier(Ability::Con), None);
    assert_eq!(model.modifier(Ability::Wis), Some(4));
    assert_eq!(model.total(Ability::Cha), Some(8));
}

#[test]
fn validate_rejects_out_of_range_totals() {
    let model = AbilityModel::from_bases([10, 10, 10, 10, 10, 10])
        .with(Ability::Str, AbilityScore::new(38).with_temporary(4));
    let err = model.validate(1, 40).unwrap_err();
    assert_eq!(err.code(), "ability_out_of_range");
    assert_eq!(
        err,
        AbilityError::OutOfRange {
            ability: Ability::Str,
            total: 42,
            min: 1,
            max: 40,
        }
    );
    assert!(AbilityModel::from_bases([10; 6]).validate(1, 40).is_ok());
}

#[test]
fn abilities_parse_from_short_and_long_names() {
    assert_eq!("con".parse::<Ability>().unwrap(), Ability::Con);
    assert_eq!("Wisdom".parse::<Ability>().unwrap(), Ability::Wis);
    assert_eq!("luck".parse::<Ability>().unwrap_err().code(), "unknown_ability");
}

#[test]
fn model_serializes_as_plain_map() {
    let model = AbilityModel::new().with(Ability::Dex, AbilityScore::new(14).with_racial(2));
    let json = serde_json::to_value(&model).unwrap();
    assert_eq!(json["dex"]["base"], 14);
    assert_eq!(json["dex"]["racial"], 2);
    let back: AbilityModel = serde_json::from_value(json).unwrap();
    assert_eq!(back, model);
}

proptest! {
    #[test]
    fn modifier_matches_floor_division(score in -20i32..=60) {
        let expected = ((score - 10) as f64 / 2.0).floor() as i32;
        prop_assert_eq!(ability_mod(score), expected);
    }

    #[test]
    fn modifier_never_decreases_with_score(score in 1i32..=39) {
        prop_assert!(ability_mod(score + 1) >= ability_mod(score));
    }
}
