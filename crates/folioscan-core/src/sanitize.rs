// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Path component sanitization for labels that come from arbitrary page text.

/// Characters that are illegal in a path component on at least one platform.
const ILLEGAL: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Device names Windows refuses as file stems, regardless of extension.
const RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Longest component we emit, in characters.
pub const MAX_COMPONENT_CHARS: usize = 120;

/// Used when nothing printable survives sanitization.
pub const FALLBACK_NAME: &str = "untitled";

/// Turn an arbitrary label into a safe, deterministic path component.
///
/// Illegal and control characters become `_`, surrounding whitespace and
/// trailing dots are trimmed, reserved device names get a `_` prefix, and the
/// result is capped at [`MAX_COMPONENT_CHARS`]. The same input always yields
/// the same output.
pub fn sanitize_component(label: &str) -> String {
    let replaced: String = label
        .chars()
        .map(|c| {
            if ILLEGAL.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let mut name: String = replaced
        .trim()
        .trim_end_matches('.')
        .trim_end()
        .chars()
        .take(MAX_COMPONENT_CHARS)
        .collect();

    // Truncation can expose a fresh trailing dot or space.
    while name.ends_with('.') || name.ends_with(' ') {
        name.pop();
    }

    if name.is_empty() {
        return FALLBACK_NAME.to_owned();
    }

    let stem = name.split('.').next().unwrap_or_default();
    if RESERVED.iter().any(|r| r.eq_ignore_ascii_case(stem)) {
        name.insert(0, '_');
    }

    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_illegal_characters() {
        assert_eq!(sanitize_component("Part 1: Begin/End?"), "Part 1_ Begin_End_");
        assert_eq!(sanitize_component("a<b>c|d*e\"f\\g"), "a_b_c_d_e_f_g");
    }

    #[test]
    fn strips_control_characters() {
        assert_eq!(sanitize_component("line\nbreak\ttab"), "line_break_tab");
    }

    #[test]
    fn trims_whitespace_and_trailing_dots() {
        assert_eq!(sanitize_component("  Preface...  "), "Preface");
    }

    #[test]
    fn keeps_unicode_text() {
        assert_eq!(sanitize_component("第一章 序言"), "第一章 序言");
    }

    #[test]
    fn empty_label_falls_back() {
        assert_eq!(sanitize_component(""), FALLBACK_NAME);
        assert_eq!(sanitize_component("   "), FALLBACK_NAME);
        assert_eq!(sanitize_component("..."), FALLBACK_NAME);
    }

    #[test]
    fn reserved_device_names_are_prefixed() {
        assert_eq!(sanitize_component("con"), "_con");
        assert_eq!(sanitize_component("LPT1.txt"), "_LPT1.txt");
        assert_eq!(sanitize_component("Console"), "Console");
    }

    #[test]
    fn long_labels_are_capped() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_component(&long).chars().count(), MAX_COMPONENT_CHARS);
    }

    #[test]
    fn is_deterministic() {
        let label = "Chapter 7: \"Quoted\" / Slashed";
        assert_eq!(sanitize_component(label), sanitize_component(label));
    }
}
