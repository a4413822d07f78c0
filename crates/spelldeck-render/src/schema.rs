// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Schema validation — turns one raw catalogue entry into a canonical `Spell`.
//
// Every failure names the spell and the offending field. Unknown fields are
// ignored so newer catalogues keep loading.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::debug;

use spelldeck_core::error::{Result, SpelldeckError};
use spelldeck_core::types::{Component, MAX_SPELL_LEVEL, School, Spell};

/// Validate the entry stored under `name`.
pub fn validate_entry(name: &str, entry: &Value) -> Result<Spell> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SpelldeckError::schema(name, "name", "must not be empty"));
    }
    let Some(obj) = entry.as_object() else {
        return Err(SpelldeckError::schema(name, "entry", "must be a JSON object"));
    };
    let entry = Entry { name, obj };

    let level = entry.level()?;
    let school = entry.school()?;
    let casting_time = entry.required_string(&["time", "casting_time", "castingTime"])?;
    let range = entry.required_string(&["range"])?;
    let duration = entry.required_string(&["duration"])?;
    let components = entry.components()?;
    let text = entry.required_string(&["text"])?;

    let mut material_text =
        entry.optional_string(&["material", "material_text", "materialText"])?;
    if material_text.is_some() && !components.contains(&Component::Material) {
        debug!(spell = name, "material text without M component, ignoring it");
        material_text = None;
    }

    let declared_concentration = entry.optional_bool(&["concentration"])?.unwrap_or(false);
    let concentration =
        declared_concentration || duration.to_lowercase().contains("concentration");

    Ok(Spell {
        name: name.to_string(),
        level,
        school,
        casting_time,
        range,
        duration,
        components,
        material_text,
        concentration,
        ritual: entry.optional_bool(&["ritual"])?.unwrap_or(false),
        classes: entry.classes()?,
        text,
        attack_save: entry
            .optional_string(&["attack_save", "attackSave"])?
            .filter(|s| !is_placeholder(s)),
        damage_effect: entry
            .optional_string(&["damage_effect", "damageEffect"])?
            .filter(|s| !is_placeholder(s)),
        source: entry.optional_string(&["source"])?,
        source_page: entry.source_page()?,
    })
}

/// Borrowed view of one entry, carrying the spell name for error messages.
struct Entry<'a> {
    name: &'a str,
    obj: &'a Map<String, Value>,
}

impl<'a> Entry<'a> {
    /// First non-null value among the accepted spellings, with the spelling
    /// that matched. Errors report `keys[0]` when nothing matched.
    fn lookup(&self, keys: &[&'static str]) -> Option<(&'static str, &'a Value)> {
        keys.iter()
            .find_map(|key| self.obj.get(*key).filter(|v| !v.is_null()).map(|v| (*key, v)))
    }

    fn error(&self, field: &str, reason: impl Into<String>) -> SpelldeckError {
        SpelldeckError::schema(self.name, field, reason)
    }

    fn required_string(&self, keys: &[&'static str]) -> Result<String> {
        match self.lookup(keys) {
            Some((_, Value::String(s))) => Ok(s.clone()),
            Some((key, other)) => Err(self.error(key, format!("expected a string, got {other}"))),
            None => Err(self.error(keys[0], "is required")),
        }
    }

    /// Blank strings count as absent.
    fn optional_string(&self, keys: &[&'static str]) -> Result<Option<String>> {
        match self.lookup(keys) {
            Some((_, Value::String(s))) if s.trim().is_empty() => Ok(None),
            Some((_, Value::String(s))) => Ok(Some(s.clone())),
            Some((key, other)) => Err(self.error(key, format!("expected a string, got {other}"))),
            None => Ok(None),
        }
    }

    fn optional_bool(&self, keys: &[&'static str]) -> Result<Option<bool>> {
        match self.lookup(keys) {
            Some((_, Value::Bool(b))) => Ok(Some(*b)),
            Some((key, other)) => Err(self.error(key, format!("expected true or false, got {other}"))),
            None => Ok(None),
        }
    }

    fn level(&self) -> Result<u8> {
        let Some((key, value)) = self.lookup(&["level"]) else {
            return Err(self.error("level", "is required"));
        };
        let Some(level) = value.as_i64() else {
            return Err(self.error(key, format!("expected an integer, got {value}")));
        };
        match u8::try_from(level) {
            Ok(level) if level <= MAX_SPELL_LEVEL => Ok(level),
            _ => Err(self.error(
                key,
                format!("{level} is outside 0..={MAX_SPELL_LEVEL}"),
            )),
        }
    }

    fn school(&self) -> Result<School> {
        let raw = self.required_string(&["school"])?;
        School::parse(&raw).ok_or_else(|| self.error("school", format!("unknown school '{raw}'")))
    }

    /// Accepts `["V", "S", "M"]` or `"V, S, M"`.
    fn components(&self) -> Result<BTreeSet<Component>> {
        let Some((key, value)) = self.lookup(&["components"]) else {
            return Err(self.error("components", "is required"));
        };

        let tokens: Vec<&str> = match value {
            Value::Array(items) => {
                let mut tokens = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(token) => tokens.push(token),
                        None => {
                            return Err(self.error(key, format!("expected strings, got {item}")));
                        }
                    }
                }
                tokens
            }
            Value::String(s) => s.split(',').filter(|t| !t.trim().is_empty()).collect(),
            other => {
                return Err(self.error(key, format!("expected a list or string, got {other}")));
            }
        };

        let mut components = BTreeSet::new();
        for token in tokens {
            let component = Component::parse(token)
                .ok_or_else(|| self.error(key, format!("unknown component '{}'", token.trim())))?;
            components.insert(component);
        }

        if components.is_empty() {
            return Err(self.error(key, "must name at least one of V, S, M"));
        }
        Ok(components)
    }

    fn classes(&self) -> Result<BTreeSet<String>> {
        let Some((key, value)) = self.lookup(&["classes"]) else {
            return Ok(BTreeSet::new());
        };
        let Some(items) = value.as_array() else {
            return Err(self.error(key, format!("expected a list, got {value}")));
        };
        items
            .iter()
            .map(|item| match item.as_str() {
                Some(class) => Ok(class.trim().to_string()),
                None => Err(self.error(key, format!("expected strings, got {item}"))),
            })
            .filter(|class| !matches!(class, Ok(c) if c.is_empty()))
            .collect()
    }

    /// Page numbers arrive as integers from the parser and as strings from
    /// hand-edited catalogues.
    fn source_page(&self) -> Result<Option<String>> {
        match self.lookup(&["source_page", "sourcePage"]) {
            Some((_, Value::Number(n))) => Ok(Some(n.to_string())),
            Some((_, Value::String(s))) if s.trim().is_empty() => Ok(None),
            Some((_, Value::String(s))) => Ok(Some(s.trim().to_string())),
            Some((key, other)) => Err(self.error(key, format!("expected a page number, got {other}"))),
            None => Ok(None),
        }
    }
}

/// Catalogues write "None" or a dash for spells with no attack or effect.
fn is_placeholder(value: &str) -> bool {
    matches!(value.trim(), "-" | "—" | "–") || value.trim().eq_ignore_ascii_case("none")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fireball() -> Value {
        json!({
            "level": 3,
            "school": "Evocation",
            "time": "1 action",
            "range": "150 feet",
            "duration": "Instantaneous",
            "components": ["V", "S", "M"],
            "material": "a tiny ball of bat guano and sulfur",
            "ritual": false,
            "classes": ["Sorcerer", "Wizard"],
            "text": "A bright streak flashes from your pointing finger.",
            "attack_save": "DEX Save",
            "damage_effect": "Fire",
            "source": "Player's Handbook",
            "source_page": 241
        })
    }

    fn field_of(err: SpelldeckError) -> String {
        match err {
            SpelldeckError::Schema { field, .. } => field,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn valid_entry_becomes_spell() {
        let spell = validate_entry("Fireball", &fireball()).unwrap();
        assert_eq!(spell.name, "Fireball");
        assert_eq!(spell.level, 3);
        assert_eq!(spell.school, School::Evocation);
        assert_eq!(spell.casting_time, "1 action");
        assert_eq!(spell.components.len(), 3);
        assert_eq!(spell.material(), Some("a tiny ball of bat guano and sulfur"));
        assert!(!spell.concentration);
        assert!(spell.has_class("wizard"));
        assert_eq!(spell.source_page.as_deref(), Some("241"));
        assert_eq!(spell.attack_save.as_deref(), Some("DEX Save"));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut entry = fireball();
        entry["homebrew_rating"] = json!(5);
        entry["tags"] = json!(["damage"]);
        assert!(validate_entry("Fireball", &entry).is_ok());
    }

    #[test]
    fn missing_required_field_names_spell_and_field() {
        let mut entry = fireball();
        entry.as_object_mut().unwrap().remove("range");
        match validate_entry("Fireball", &entry).unwrap_err() {
            SpelldeckError::Schema { spell, field, .. } => {
                assert_eq!(spell, "Fireball");
                assert_eq!(field, "range");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn level_out_of_range_is_rejected() {
        for bad in [json!(10), json!(-1), json!(2.5), json!("3")] {
            let mut entry = fireball();
            entry["level"] = bad;
            assert_eq!(field_of(validate_entry("Fireball", &entry).unwrap_err()), "level");
        }
    }

    #[test]
    fn empty_or_invalid_components_are_rejected() {
        for bad in [json!([]), json!(["V", "X"]), json!(""), json!(7)] {
            let mut entry = fireball();
            entry["components"] = bad;
            assert_eq!(
                field_of(validate_entry("Fireball", &entry).unwrap_err()),
                "components"
            );
        }
    }

    #[test]
    fn components_as_string_are_accepted() {
        let mut entry = fireball();
        entry["components"] = json!("V, S, M *");
        let spell = validate_entry("Fireball", &entry).unwrap();
        assert!(spell.components.contains(&Component::Material));
    }

    #[test]
    fn null_text_is_rejected_but_empty_text_is_fine() {
        let mut entry = fireball();
        entry["text"] = Value::Null;
        assert_eq!(field_of(validate_entry("Fireball", &entry).unwrap_err()), "text");

        entry["text"] = json!("");
        assert_eq!(validate_entry("Fireball", &entry).unwrap().text, "");
    }

    #[test]
    fn concentration_is_derived_from_duration() {
        let mut entry = fireball();
        entry["duration"] = json!("Concentration, up to 1 minute");
        assert!(validate_entry("Fireball", &entry).unwrap().concentration);

        entry["duration"] = json!("1 minute");
        entry["concentration"] = json!(true);
        assert!(validate_entry("Fireball", &entry).unwrap().concentration);
    }

    #[test]
    fn material_without_component_is_dropped() {
        let mut entry = fireball();
        entry["components"] = json!(["V", "S"]);
        let spell = validate_entry("Fireball", &entry).unwrap();
        assert_eq!(spell.material_text, None);
    }

    #[test]
    fn camel_case_spellings_are_accepted() {
        let entry = json!({
            "level": 0,
            "school": "conjuration",
            "castingTime": "1 action",
            "range": "10 feet",
            "duration": "Instantaneous",
            "components": ["Verbal", "Somatic"],
            "text": "",
            "attackSave": "",
            "sourcePage": "12"
        });
        let spell = validate_entry("Acid Splash", &entry).unwrap();
        assert_eq!(spell.school, School::Conjuration);
        assert_eq!(spell.attack_save, None);
        assert_eq!(spell.source_page.as_deref(), Some("12"));
        assert!(spell.classes.is_empty());
    }

    #[test]
    fn placeholder_attack_and_effect_are_absent() {
        for placeholder in ["None", "none", " NONE ", "-", "—"] {
            let mut entry = fireball();
            entry["attack_save"] = json!(placeholder);
            entry["damage_effect"] = json!(placeholder);
            let spell = validate_entry("Fireball", &entry).unwrap();
            assert_eq!(spell.attack_save, None, "{placeholder:?}");
            assert_eq!(spell.damage_effect, None, "{placeholder:?}");
        }

        let mut entry = fireball();
        entry["attack_save"] = json!("None");
        entry["damage_effect"] = json!("Detection");
        let spell = validate_entry("Fireball", &entry).unwrap();
        assert_eq!(spell.damage_effect.as_deref(), Some("Detection"));
    }

    #[test]
    fn empty_name_and_non_object_are_rejected() {
        assert_eq!(field_of(validate_entry("  ", &fireball()).unwrap_err()), "name");
        assert_eq!(
            field_of(validate_entry("Fireball", &json!(["not", "an", "object"])).unwrap_err()),
            "entry"
        );
    }
}
