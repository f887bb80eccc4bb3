use d20core::*;

#[test]
fn empty_document_yields_defaults() {
    let cfg = RulesConfig::from_yaml_str("{}").unwrap();
    assert_eq!(cfg, RulesConfig::default());
    assert_eq!(cfg.defense_base, 10);
    assert_eq!(cfg.first_level_hit_die_multiplier, 3);
}

#[test]
fn partial_document_overrides_named_fields() {
    let cfg = RulesConfig::from_yaml_str("trained_skill_bonus: 4\nminimum_hp: 0\n").unwrap();
    assert_eq!(cfg.trained_skill_bonus, 4);
    assert_eq!(cfg.minimum_hp, 0);
    assert_eq!(cfg.skill_focus_bonus, 5);
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(matches!(
        RulesConfig::from_yaml_str("defence_base: 12\n"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn inverted_ability_bounds_are_invalid() {
    let err = RulesConfig::from_yaml_str("ability_total_min: 20\nability_total_max: 10\n")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}
