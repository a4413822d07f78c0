// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spell selection — class/level/school/name criteria and card ordering.

use std::collections::BTreeSet;

use tracing::debug;

use spelldeck_core::error::{Result, SpelldeckError};
use spelldeck_core::types::{FilterCriteria, MAX_SPELL_LEVEL, SortMode, Spell};

/// Expand level tokens (`"3"`, `"1-3"`) into the set of levels they name.
///
/// Ranges are inclusive and must satisfy `a <= b`, both within 0..=9.
pub fn parse_levels<S: AsRef<str>>(tokens: &[S]) -> Result<BTreeSet<u8>> {
    let mut levels = BTreeSet::new();
    for token in tokens {
        let token = token.as_ref().trim();
        match token.split_once('-') {
            Some((low, high)) => {
                let low = parse_level(token, low)?;
                let high = parse_level(token, high)?;
                if low > high {
                    return Err(SpelldeckError::filter(token, "range bounds are reversed"));
                }
                levels.extend(low..=high);
            }
            None => {
                levels.insert(parse_level(token, token)?);
            }
        }
    }
    Ok(levels)
}

fn parse_level(token: &str, raw: &str) -> Result<u8> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SpelldeckError::filter(token, "expected a level or a range like 1-3"));
    }
    let level: u8 = raw
        .parse()
        .map_err(|_| SpelldeckError::filter(token, format!("'{raw}' is not a level")))?;
    if level > MAX_SPELL_LEVEL {
        return Err(SpelldeckError::filter(
            token,
            format!("level {level} is outside 0-{MAX_SPELL_LEVEL}"),
        ));
    }
    Ok(level)
}

/// Whether `spell` satisfies every active dimension of `criteria`.
///
/// An empty class or level set is treated like an absent one.
pub fn matches(spell: &Spell, criteria: &FilterCriteria) -> bool {
    let class_ok = match &criteria.classes {
        Some(classes) if !classes.is_empty() => classes.iter().any(|c| spell.has_class(c)),
        _ => true,
    };
    let level_ok = match &criteria.levels {
        Some(levels) if !levels.is_empty() => levels.contains(&spell.level),
        _ => true,
    };
    let school_ok = criteria
        .school
        .as_deref()
        .is_none_or(|school| spell.school.name().eq_ignore_ascii_case(school.trim()));
    let name_ok = criteria
        .name_substring
        .as_deref()
        .is_none_or(|needle| spell.name.to_lowercase().contains(&needle.to_lowercase()));

    class_ok && level_ok && school_ok && name_ok
}

/// Matching spells in card order. The input is left untouched.
pub fn select<'a>(spells: &'a [Spell], criteria: &FilterCriteria, mode: SortMode) -> Vec<&'a Spell> {
    let mut selected: Vec<&Spell> = spells
        .iter()
        .filter(|spell| matches(spell, criteria))
        .collect();
    sort(&mut selected, mode);
    debug!(
        candidates = spells.len(),
        selected = selected.len(),
        ?mode,
        "filtered spells"
    );
    selected
}

/// Stable sort; equal keys keep their incoming order.
pub fn sort(spells: &mut [&Spell], mode: SortMode) {
    match mode {
        SortMode::Name => spells.sort_by_cached_key(|spell| spell.name.to_lowercase()),
        SortMode::Level => {
            spells.sort_by_cached_key(|spell| (spell.level, spell.name.to_lowercase()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spelldeck_core::types::{Component, School};

    fn spell(name: &str, level: u8, school: School, classes: &[&str]) -> Spell {
        Spell {
            name: name.into(),
            level,
            school,
            casting_time: "1 action".into(),
            range: "60 feet".into(),
            duration: "Instantaneous".into(),
            components: [Component::Verbal].into_iter().collect(),
            material_text: None,
            concentration: false,
            ritual: false,
            classes: classes.iter().map(|c| c.to_string()).collect(),
            text: String::new(),
            attack_save: None,
            damage_effect: None,
            source: None,
            source_page: None,
        }
    }

    fn catalogue() -> Vec<Spell> {
        vec![
            spell("fireball", 3, School::Evocation, &["Sorcerer", "Wizard"]),
            spell("Cure Wounds", 1, School::Evocation, &["Cleric", "Druid"]),
            spell("Bless", 1, School::Enchantment, &["Cleric", "Paladin"]),
            spell("Fire Bolt", 0, School::Evocation, &["Sorcerer", "Wizard"]),
            spell("Wish", 9, School::Conjuration, &["Sorcerer", "Wizard"]),
        ]
    }

    fn names(spells: &[&Spell]) -> Vec<String> {
        spells.iter().map(|s| s.name.clone()).collect()
    }

    #[test]
    fn level_ranges_expand() {
        assert_eq!(parse_levels(&["1-3"]).unwrap(), BTreeSet::from([1, 2, 3]));
        assert_eq!(parse_levels(&["5-5"]).unwrap(), BTreeSet::from([5]));
        assert_eq!(
            parse_levels(&["0", "2-3", "3"]).unwrap(),
            BTreeSet::from([0, 2, 3])
        );
        assert!(parse_levels::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn malformed_level_tokens_fail_with_the_token() {
        for bad in ["3-1", "10-12", "10", "x", "1-x", "", "-1", "1-2-3", "2.5"] {
            match parse_levels(&[bad]) {
                Err(SpelldeckError::Filter { token, .. }) => assert_eq!(token, bad.trim()),
                other => panic!("{bad:?} gave {other:?}"),
            }
        }
    }

    #[test]
    fn no_criteria_selects_everything_sorted_by_name() {
        let spells = catalogue();
        let selected = select(&spells, &FilterCriteria::default(), SortMode::Name);
        assert_eq!(
            names(&selected),
            ["Bless", "Cure Wounds", "Fire Bolt", "fireball", "Wish"]
        );
    }

    #[test]
    fn classes_are_or_and_case_insensitive() {
        let spells = catalogue();
        let criteria = FilterCriteria {
            classes: Some(["paladin".to_string(), "DRUID".to_string()].into()),
            ..Default::default()
        };
        let selected = select(&spells, &criteria, SortMode::Name);
        assert_eq!(names(&selected), ["Bless", "Cure Wounds"]);
    }

    #[test]
    fn dimensions_combine_with_and() {
        let spells = catalogue();
        let criteria = FilterCriteria {
            classes: Some(["Wizard".to_string()].into()),
            levels: Some(parse_levels(&["0-3"]).unwrap()),
            school: Some("evocation".into()),
            name_substring: Some("FIRE".into()),
        };
        let selected = select(&spells, &criteria, SortMode::Level);
        assert_eq!(names(&selected), ["Fire Bolt", "fireball"]);
    }

    #[test]
    fn level_sort_breaks_ties_by_name() {
        let spells = catalogue();
        let selected = select(&spells, &FilterCriteria::default(), SortMode::Level);
        assert_eq!(
            names(&selected),
            ["Fire Bolt", "Bless", "Cure Wounds", "fireball", "Wish"]
        );
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let spells = vec![
            spell("Shield", 1, School::Abjuration, &[]),
            spell("shield", 1, School::Abjuration, &[]),
        ];
        let selected = select(&spells, &FilterCriteria::default(), SortMode::Name);
        assert_eq!(names(&selected), ["Shield", "shield"]);
    }

    #[test]
    fn unknown_school_selects_nothing() {
        let spells = catalogue();
        let criteria = FilterCriteria {
            school: Some("Chronurgy".into()),
            ..Default::default()
        };
        assert!(select(&spells, &criteria, SortMode::Name).is_empty());
    }

    #[test]
    fn select_is_idempotent() {
        let spells = catalogue();
        let criteria = FilterCriteria {
            levels: Some(BTreeSet::from([1])),
            ..Default::default()
        };
        let once: Vec<Spell> = select(&spells, &criteria, SortMode::Name)
            .into_iter()
            .cloned()
            .collect();
        let twice = select(&once, &criteria, SortMode::Name);
        assert_eq!(names(&twice), ["Bless", "Cure Wounds"]);
    }
}
