//! Deterministic cleanup of recognised text before it is reported.
//!
//! ## Why is cleanup necessary?
//!
//! Recognition engines emit artefacts that are *visually* right but
//! *textually* wrong: typographic ligatures where the document used plain
//! letters, curly quotes for straight ones, stray combining marks from
//! half-recognised diacritics, and ragged whitespace from token
//! reassembly. These rules fix engine quirks without touching content.
//! Each rule is a pure `&str → String` function applied in a defined
//! order, independently testable.

/// Known mis-encoded glyph replacements.
const GLYPH_FIXES: &[(&str, &str)] = &[
    ("\u{FB01}", "fi"), // ﬁ ligature
    ("\u{FB02}", "fl"), // ﬂ ligature
    ("\u{02DC}", " "),  // stray small tilde
    ("\u{02C6}", " "),  // stray circumflex
    ("\u{00A8}", " "),  // stray diaeresis
    ("\u{2026}", "..."),
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
    ("\u{201C}", "\""),
    ("\u{201D}", "\""),
];

/// Common run-together compounds the engine merges when letter spacing is
/// tight; restored with their diacritics.
const COMPOUND_FIXES: &[(&str, &str)] = &[
    ("sinhvien", "sinh viên"),
    ("giaovien", "giáo viên"),
];

/// Apply all cleanup rules in order:
/// 1. collapse runs of whitespace (including newlines) to single spaces
/// 2. replace known mis-encoded glyphs
/// 3. restore known run-together compounds
/// 4. trim
pub fn clean_text(input: &str) -> String {
    let s = collapse_whitespace(input);
    let s = fix_glyphs(&s);
    let s = fix_compounds(&s);
    s.trim().to_string()
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fix_glyphs(input: &str) -> String {
    let mut s = input.to_string();
    for (from, to) in GLYPH_FIXES {
        s = s.replace(from, to);
    }
    s
}

fn fix_compounds(input: &str) -> String {
    let mut s = input.to_string();
    for (from, to) in COMPOUND_FIXES {
        s = s.replace(from, to);
    }
    s
}
