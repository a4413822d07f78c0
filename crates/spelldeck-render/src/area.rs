// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Area-of-effect resolution — finds the geometry (cone, sphere, ...) and its
// size in feet inside free-form range text.
//
// Range strings come in several house styles: "Self (15-foot cone)",
// "Self (30-foot-radius sphere)", "150 ft. (20 ft. sphere)",
// "Self (10-foot Emanation)". The first geometry keyword in reading order wins.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use spelldeck_core::types::{AreaEffect, AreaKind};

// ============================================================================
// Patterns (compiled once)
// ============================================================================

static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(cone|sphere|cube|line|cylinder|emanation)s?\b")
        .expect("invalid area keyword regex")
});

/// Size immediately before a keyword, anchored at the end of the text that
/// precedes it: "15-foot ", "30-foot-radius ", "20 ft. ", "10 feet long ".
static SIZE_BEFORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        (\d+)                                   # size
        \s*(?:-\s*)?
        (?:foot|feet|ft\.?)?                    # unit
        (?:[\s-]+(?:radius|diameter|long|wide|high|tall|square))*
        [\s-]*$",
    )
    .expect("invalid area size regex")
});

/// Resolve the area effect named in a range field.
///
/// A keyword without an adjacent number still resolves, with `size_feet`
/// set to 0. Text without any keyword resolves to `None`.
pub fn resolve(range: &str) -> Option<AreaEffect> {
    let found = KEYWORD_RE
        .captures(range)
        .and_then(|caps| effect_at(range, &caps));
    trace!(range, ?found, "resolved area from range");
    found
}

/// Look for a sized area effect in a spell description.
///
/// Description prose uses the keywords loosely ("a line of sight", "a cube
/// of force"), so only mentions with an explicit size count here.
pub fn resolve_in_text(text: &str) -> Option<AreaEffect> {
    KEYWORD_RE
        .captures_iter(text)
        .filter_map(|caps| effect_at(text, &caps))
        .find(|effect| effect.size_feet > 0)
}

/// Range first, then a sized mention in the description. Range lines such as
/// "150 feet" carry no geometry while the text describes the blast.
pub fn resolve_for(range: &str, text: &str) -> Option<AreaEffect> {
    resolve(range).or_else(|| resolve_in_text(text))
}

fn effect_at(haystack: &str, caps: &regex::Captures<'_>) -> Option<AreaEffect> {
    let keyword = caps.get(1)?;
    let kind = AreaKind::parse(keyword.as_str())?;
    let before = &haystack[..keyword.start()];

    let size_feet = SIZE_BEFORE_RE
        .captures(before)
        .and_then(|size| size.get(1))
        .and_then(|digits| digits.as_str().parse::<u32>().ok())
        .unwrap_or(0);

    Some(AreaEffect { kind, size_feet })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(kind: AreaKind, size_feet: u32) -> Option<AreaEffect> {
        Some(AreaEffect { kind, size_feet })
    }

    #[test]
    fn hyphenated_size() {
        assert_eq!(resolve("Self (15-foot cone)"), area(AreaKind::Cone, 15));
    }

    #[test]
    fn radius_qualifier() {
        assert_eq!(
            resolve("Self (30-foot-radius sphere)"),
            area(AreaKind::Sphere, 30)
        );
    }

    #[test]
    fn abbreviated_units() {
        assert_eq!(resolve("Self (15 ft. cone)"), area(AreaKind::Cone, 15));
        assert_eq!(resolve("150 ft. (20 ft. sphere)"), area(AreaKind::Sphere, 20));
        assert_eq!(resolve("Self (100 feet line)"), area(AreaKind::Line, 100));
    }

    #[test]
    fn plain_distance_has_no_area() {
        assert_eq!(resolve("60 feet"), None);
        assert_eq!(resolve("Touch"), None);
        assert_eq!(resolve(""), None);
    }

    #[test]
    fn keyword_without_size_resolves_to_zero() {
        assert_eq!(resolve("Self (cone)"), area(AreaKind::Cone, 0));
        assert_eq!(resolve("Self (Emanation)"), area(AreaKind::Emanation, 0));
    }

    #[test]
    fn keywords_are_case_insensitive_and_may_be_plural() {
        assert_eq!(resolve("Self (10-foot Emanation)"), area(AreaKind::Emanation, 10));
        assert_eq!(resolve("90 feet (ten 10-foot CUBES)"), area(AreaKind::Cube, 10));
    }

    #[test]
    fn first_keyword_wins_every_time() {
        let range = "Self (60-foot line or 30-foot cone)";
        for _ in 0..10 {
            assert_eq!(resolve(range), area(AreaKind::Line, 60));
        }
        assert_eq!(
            resolve("Self (15-foot cube, sphere optional)"),
            area(AreaKind::Cube, 15)
        );
    }

    #[test]
    fn keyword_inside_word_is_ignored() {
        assert_eq!(resolve("Self (outline)"), None);
        assert_eq!(resolve("Conehead"), None);
    }

    #[test]
    fn text_mentions_need_a_size() {
        let text = "You can see a line of sight. Each creature in a 20-foot-radius sphere \
                    centered on that point must make a Dexterity saving throw.";
        assert_eq!(resolve_in_text(text), area(AreaKind::Sphere, 20));
        assert_eq!(resolve_in_text("a cube of force"), None);
    }

    #[test]
    fn range_takes_priority_over_text() {
        let text = "a 20-foot-radius sphere";
        assert_eq!(
            resolve_for("Self (15-foot cone)", text),
            area(AreaKind::Cone, 15)
        );
        assert_eq!(resolve_for("150 feet", text), area(AreaKind::Sphere, 20));
        assert_eq!(resolve_for("150 feet", "no geometry here"), None);
    }
}
