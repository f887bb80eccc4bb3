use std::{fmt::Display, future::Future};

use d20core::api::{derive_sheet, react, resolve_damage, run_blocking, Envelope};
use d20core::{DamageDice, Dice};
use jni::objects::{JClass, JString};
use jni::sys::{jint, jlong, jstring};
use jni::JNIEnv;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;

fn rejection(reason: &str, e: impl Display) -> String {
    json!({ "success": false, "reason": reason, "message": e.to_string() }).to_string()
}

/// Parse a request, run it to completion and serialize the envelope.
/// Every failure becomes a `{success: false}` document; nothing panics
/// across the JNI boundary.
fn handle<Req, T, E, F, Fut>(input: &str, run: F) -> String
where
    Req: DeserializeOwned,
    T: Serialize,
    E: Display,
    F: FnOnce(Req) -> Fut,
    Fut: Future<Output = Result<Envelope<T>, E>>,
{
    let request: Req = match serde_json::from_str(input) {
        Ok(r) => r,
        Err(e) => return rejection("invalid_request", e),
    };
    match run_blocking(run(request)) {
        Ok(Ok(envelope)) => serde_json::to_string(&envelope)
            .unwrap_or_else(|e| rejection("serialization_failed", e)),
        Ok(Err(e)) => rejection("error", format!("{:#}", e)),
        Err(e) => rejection("error", format!("{:#}", e)),
    }
}

pub fn derive_sheet_json(input: &str) -> String {
    handle(input, derive_sheet)
}

pub fn resolve_damage_json(input: &str) -> String {
    handle(input, resolve_damage)
}

pub fn react_json(input: &str) -> String {
    handle(input, react)
}

/// Sum of `n` rolls of a `sides`-sided die from the seeded engine roller.
/// `n <= 0` gives 0; `sides <= 1` gives 1 per die; `n` is capped at `MAX_DICE`.
pub fn roll_internal(seed: i64, n: i32, sides: i32) -> i32 {
    let dice = DamageDice::new(n.max(0) as u32, sides.max(1) as u32);
    dice.roll(&mut Dice::from_seed(seed as u64)).total
}

fn into_jstring(env: &JNIEnv, text: String) -> jstring {
    env.new_string(text)
        .map(JString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}

fn call(env: &mut JNIEnv, json: &JString, handler: fn(&str) -> String) -> jstring {
    let input: String = match env.get_string(json) {
        Ok(s) => s.into(),
        Err(e) => return into_jstring(env, rejection("invalid_string", e)),
    };
    into_jstring(env, handler(&input))
}

#[no_mangle]
pub extern "system" fn Java_com_d20core_Ffi_version(env: JNIEnv, _class: JClass) -> jstring {
    into_jstring(&env, format!("d20core-ffi {}", env!("CARGO_PKG_VERSION")))
}

#[no_mangle]
pub extern "system" fn Java_com_d20core_Ffi_roll(
    _env: JNIEnv<'_>,
    _class: JClass<'_>,
    seed: jlong,
    n: jint,
    sides: jint,
) -> jint {
    roll_internal(seed, n, sides)
}

#[no_mangle]
pub extern "system" fn Java_com_d20core_Ffi_deriveSheetJson(
    mut env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    call(&mut env, &json, derive_sheet_json)
}

#[no_mangle]
pub extern "system" fn Java_com_d20core_Ffi_resolveDamageJson(
    mut env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    call(&mut env, &json, resolve_damage_json)
}

#[no_mangle]
pub extern "system" fn Java_com_d20core_Ffi_reactJson(
    mut env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    call(&mut env, &json, react_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parse(text: String) -> Value {
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn roll_is_deterministic_and_in_range() {
        let first = roll_internal(42, 3, 6);
        assert_eq!(first, roll_internal(42, 3, 6));
        assert!((3..=18).contains(&first));
    }

    #[test]
    fn roll_edge_cases() {
        assert_eq!(roll_internal(42, 0, 6), 0);
        assert_eq!(roll_internal(42, -2, 6), 0);
        assert_eq!(roll_internal(42, 4, 1), 4);
        assert_eq!(roll_internal(42, i32::MAX, 1), 1000);
    }

    #[test]
    fn overflowing_scores_come_back_as_rejection() {
        let mut character = d20core::content::builtin_character("sample_jedi")
            .unwrap()
            .unwrap();
        character.abilities.set(
            d20core::Ability::Str,
            d20core::AbilityScore::new(i32::MAX).with_racial(1),
        );
        let request = json!({ "character": character }).to_string();
        let out = parse(derive_sheet_json(&request));
        assert_eq!(out["success"], false);
        assert_eq!(out["reason"], "ability_out_of_range");
    }

    #[test]
    fn derive_sample_droid() {
        let out = parse(derive_sheet_json(r#"{"character_id":"sample_droid"}"#));
        assert_eq!(out["success"], true);
        assert_eq!(out["result"]["hp"]["max"], 36);
    }

    #[test]
    fn damage_returns_update_and_audit() {
        let out = parse(resolve_damage_json(
            r#"{"character_id":"sample_droid","event":{"amount":12}}"#,
        ));
        assert_eq!(out["result"]["update"]["hp.value"], 18);
        assert_eq!(out["result"]["audit"][0], "[BONUS][K4-RX] inactive");
    }

    #[test]
    fn malformed_request_is_rejected() {
        let out = parse(resolve_damage_json(r#"{"character_id":"sample_droid"}"#));
        assert_eq!(out["success"], false);
        assert_eq!(out["reason"], "invalid_request");
    }

    #[test]
    fn unknown_sample_is_an_error_envelope() {
        let out = parse(derive_sheet_json(r#"{"character_id":"nobody"}"#));
        assert_eq!(out["success"], false);
        assert_eq!(out["reason"], "error");
        assert!(out["message"].as_str().unwrap().contains("nobody"));
    }

    #[test]
    fn react_reports_language_and_skill_choices() {
        let out = parse(react_json(
            r#"{"character_id":"sample_jedi","after":{
                "str":{"base":10},"dex":{"base":14},"con":{"base":12},
                "int":{"base":12},"wis":{"base":13},"cha":{"base":12,"racial":2}}}"#,
        ));
        let effects = out["result"]["effects"].as_array().unwrap();
        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0]["effect"], "trained_skills");
    }
}
