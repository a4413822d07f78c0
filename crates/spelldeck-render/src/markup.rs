// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Markup renderer — one `\begin{spell}...\end{spell}` block per card.
//
// The LaTeX templates define `spell`, `\spellattack`, `\spelleffect`,
// `\areaicon`, `\ritualmark` and `\concentrationmark`. Field values are
// passed through untouched; catalogue text is already LaTeX.

use spelldeck_core::types::{AreaEffect, Component, Spell};

/// Footnote marker appended to `M` when a material description follows.
pub const MATERIAL_MARKER: &str = "*";

/// Render one spell. `body` is the already processed description.
///
/// Never fails: anything that could be missing was rejected by validation.
pub fn render(spell: &Spell, area: Option<&AreaEffect>, body: &str) -> String {
    let mut opening = format!(
        "\\begin{{spell}}{{{}}}{{{}}}{{{}}}{{{}}}{{{}}}{{{}}}{{{}}}{{{}}}",
        spell.name,
        header(spell),
        spell.range,
        area.map(area_icon).unwrap_or_default(),
        spell.casting_time,
        duration(spell),
        components(spell),
        spell.provenance().unwrap_or_default(),
    );
    if let Some(attack) = present(spell.attack_save.as_deref()) {
        opening.push_str(&format!("\n\\spellattack{{{attack}}}"));
    }
    if let Some(effect) = present(spell.damage_effect.as_deref()) {
        opening.push_str(&format!("\n\\spelleffect{{{effect}}}"));
    }

    let mut sections = vec![opening];
    if !body.trim().is_empty() {
        sections.push(body.to_string());
    }
    if let Some(material) = spell.material() {
        sections.push(format!("{MATERIAL_MARKER} — ({material})"));
    }
    sections.push("\\end{spell}".to_string());

    sections.join("\n\n")
}

/// "Cantrip — Evocation" or "3rd-level — Evocation", plus the ritual mark.
pub fn header(spell: &Spell) -> String {
    let level = if spell.is_cantrip() {
        "Cantrip".to_string()
    } else {
        format!("{}-level", ordinal(spell.level))
    };
    let mut header = format!("{level} — {}", spell.school);
    if spell.ritual {
        header.push_str(" \\ritualmark{}");
    }
    header
}

/// 1st, 2nd, 3rd, 4th, ... 11th, 12th, 13th, 21st.
pub fn ordinal(n: u8) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// `V, S, M` in fixed order; `M *` when the footnote follows.
pub fn components(spell: &Spell) -> String {
    let has_footnote = spell.material().is_some();
    spell
        .components
        .iter()
        .map(|component| {
            let abbreviation = component.abbreviation();
            if has_footnote && *component == Component::Material {
                format!("{abbreviation} {MATERIAL_MARKER}")
            } else {
                abbreviation.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn duration(spell: &Spell) -> String {
    if spell.concentration {
        format!("\\concentrationmark{{}} {}", spell.duration)
    } else {
        spell.duration.clone()
    }
}

/// `\areaicon{sphere}{20}`; the size argument stays empty when unknown.
pub fn area_icon(area: &AreaEffect) -> String {
    if area.size_feet == 0 {
        format!("\\areaicon{{{}}}{{}}", area.kind)
    } else {
        format!("\\areaicon{{{}}}{{{}}}", area.kind, area.size_feet)
    }
}

fn present(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|value| !value.is_empty())
}
