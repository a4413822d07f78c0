// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Spelldeck.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Highest spell level a catalogue entry may carry.
pub const MAX_SPELL_LEVEL: u8 = 9;

/// The eight schools of magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum School {
    Abjuration,
    Conjuration,
    Divination,
    Enchantment,
    Evocation,
    Illusion,
    Necromancy,
    Transmutation,
}

impl School {
    pub const ALL: [School; 8] = [
        Self::Abjuration,
        Self::Conjuration,
        Self::Divination,
        Self::Enchantment,
        Self::Evocation,
        Self::Illusion,
        Self::Necromancy,
        Self::Transmutation,
    ];

    /// Display name as printed on a card.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Abjuration => "Abjuration",
            Self::Conjuration => "Conjuration",
            Self::Divination => "Divination",
            Self::Enchantment => "Enchantment",
            Self::Evocation => "Evocation",
            Self::Illusion => "Illusion",
            Self::Necromancy => "Necromancy",
            Self::Transmutation => "Transmutation",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        Self::ALL
            .into_iter()
            .find(|school| school.name().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for School {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Spell components. Declaration order is the order they are printed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Component {
    Verbal,
    Somatic,
    Material,
}

impl Component {
    /// Single-letter abbreviation (`V`, `S`, `M`).
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::Verbal => "V",
            Self::Somatic => "S",
            Self::Material => "M",
        }
    }

    /// Accepts the abbreviation or the full name, case-insensitively. A
    /// trailing footnote asterisk (`M *`) is tolerated.
    pub fn parse(raw: &str) -> Option<Self> {
        let token = raw.trim().trim_end_matches('*').trim();
        match token.to_ascii_lowercase().as_str() {
            "v" | "verbal" => Some(Self::Verbal),
            "s" | "somatic" => Some(Self::Somatic),
            "m" | "material" => Some(Self::Material),
            _ => None,
        }
    }
}

/// Canonical spell record. Built once by the schema validator and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Spell {
    pub name: String,
    /// 0 for cantrips, otherwise 1..=9.
    pub level: u8,
    pub school: School,
    pub casting_time: String,
    pub range: String,
    pub duration: String,
    /// Never empty.
    pub components: BTreeSet<Component>,
    /// Only set when `components` contains `Material`.
    pub material_text: Option<String>,
    pub concentration: bool,
    pub ritual: bool,
    /// Case preserved for display; compare with [`Spell::has_class`].
    pub classes: BTreeSet<String>,
    /// May contain LaTeX groups and `\n\n` paragraph breaks. May be empty.
    pub text: String,
    pub attack_save: Option<String>,
    pub damage_effect: Option<String>,
    pub source: Option<String>,
    pub source_page: Option<String>,
}

impl Spell {
    pub fn is_cantrip(&self) -> bool {
        self.level == 0
    }

    /// Case-insensitive class membership.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes
            .iter()
            .any(|own| own.to_lowercase() == class.to_lowercase())
    }

    /// Non-empty material description, if the spell has a material component.
    pub fn material(&self) -> Option<&str> {
        if !self.components.contains(&Component::Material) {
            return None;
        }
        self.material_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// "Source page N", "Source", "page N", or `None`.
    pub fn provenance(&self) -> Option<String> {
        match (self.source.as_deref(), self.source_page.as_deref()) {
            (Some(source), Some(page)) => Some(format!("{source} page {page}")),
            (Some(source), None) => Some(source.to_string()),
            (None, Some(page)) => Some(format!("page {page}")),
            (None, None) => None,
        }
    }
}

/// Area-of-effect geometries that have a card icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaKind {
    Cone,
    Sphere,
    Cube,
    Line,
    Cylinder,
    Emanation,
}

impl AreaKind {
    pub const ALL: [AreaKind; 6] = [
        Self::Cone,
        Self::Sphere,
        Self::Cube,
        Self::Line,
        Self::Cylinder,
        Self::Emanation,
    ];

    /// Keyword as it appears in range text, and the icon identifier.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Cone => "cone",
            Self::Sphere => "sphere",
            Self::Cube => "cube",
            Self::Line => "line",
            Self::Cylinder => "cylinder",
            Self::Emanation => "emanation",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.keyword().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for AreaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A geometry recognised in a spell's range. `size_feet == 0` means the
/// shape was found but no size next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaEffect {
    pub kind: AreaKind,
    pub size_feet: u32,
}

/// Selection criteria. `None` imposes no constraint on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Matches when the spell has any of these classes.
    pub classes: Option<BTreeSet<String>>,
    /// Already expanded from literal and range tokens.
    pub levels: Option<BTreeSet<u8>>,
    pub school: Option<String>,
    pub name_substring: Option<String>,
}

impl FilterCriteria {
    pub fn is_unconstrained(&self) -> bool {
        self.classes.is_none()
            && self.levels.is_none()
            && self.school.is_none()
            && self.name_substring.is_none()
    }
}

/// Output ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Case-insensitive alphabetical by name.
    #[default]
    Name,
    /// Level ascending, then alphabetical within each level.
    Level,
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "level" => Ok(Self::Level),
            other => Err(format!("unknown sort mode '{other}' (expected name or level)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spell() -> Spell {
        Spell {
            name: "Fireball".into(),
            level: 3,
            school: School::Evocation,
            casting_time: "1 action".into(),
            range: "150 feet".into(),
            duration: "Instantaneous".into(),
            components: [Component::Verbal, Component::Somatic, Component::Material]
                .into_iter()
                .collect(),
            material_text: Some("a tiny ball of bat guano and sulfur".into()),
            concentration: false,
            ritual: false,
            classes: ["Sorcerer".to_string(), "Wizard".to_string()]
                .into_iter()
                .collect(),
            text: String::new(),
            attack_save: None,
            damage_effect: None,
            source: Some("Player's Handbook".into()),
            source_page: Some("241".into()),
        }
    }

    #[test]
    fn school_parse_is_case_insensitive() {
        assert_eq!(School::parse("evocation"), Some(School::Evocation));
        assert_eq!(School::parse(" NECROMANCY "), Some(School::Necromancy));
        assert_eq!(School::parse("Chronurgy"), None);
    }

    #[test]
    fn component_accepts_abbreviation_full_name_and_footnote() {
        assert_eq!(Component::parse("V"), Some(Component::Verbal));
        assert_eq!(Component::parse("somatic"), Some(Component::Somatic));
        assert_eq!(Component::parse("M *"), Some(Component::Material));
        assert_eq!(Component::parse("X"), None);
    }

    #[test]
    fn components_order_is_v_s_m() {
        let set: BTreeSet<Component> = [Component::Material, Component::Verbal, Component::Somatic]
            .into_iter()
            .collect();
        let order: Vec<&str> = set.iter().map(Component::abbreviation).collect();
        assert_eq!(order, ["V", "S", "M"]);
    }

    #[test]
    fn class_match_ignores_case() {
        let s = spell();
        assert!(s.has_class("wizard"));
        assert!(s.has_class("SORCERER"));
        assert!(!s.has_class("Cleric"));
    }

    #[test]
    fn material_requires_the_component() {
        let mut s = spell();
        assert_eq!(s.material(), Some("a tiny ball of bat guano and sulfur"));
        s.components.remove(&Component::Material);
        assert_eq!(s.material(), None);
    }

    #[test]
    fn provenance_combinations() {
        let mut s = spell();
        assert_eq!(s.provenance().as_deref(), Some("Player's Handbook page 241"));
        s.source_page = None;
        assert_eq!(s.provenance().as_deref(), Some("Player's Handbook"));
        s.source = None;
        assert_eq!(s.provenance(), None);
        s.source_page = Some("12".into());
        assert_eq!(s.provenance().as_deref(), Some("page 12"));
    }

    #[test]
    fn sort_mode_from_str() {
        assert_eq!("Level".parse::<SortMode>(), Ok(SortMode::Level));
        assert_eq!("name".parse::<SortMode>(), Ok(SortMode::Name));
        assert!("school".parse::<SortMode>().is_err());
    }

    #[test]
    fn empty_criteria_is_unconstrained() {
        assert!(FilterCriteria::default().is_unconstrained());
        let criteria = FilterCriteria {
            school: Some("Evocation".into()),
            ..Default::default()
        };
        assert!(!criteria.is_unconstrained());
    }
}
