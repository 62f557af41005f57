//! Text helpers shared by the generators: accent-insensitive normalization,
//! grade/bimester key extraction, fuzzy header lookup and file-name cleanup.

use regex::Regex;
use std::sync::LazyLock;

static ANO_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)ano\s*").expect("valid regex"));

static DIGITS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Strip accents (transliterating to ASCII), lowercase and trim.
///
/// `"  SÉRIE "` becomes `"serie"`.
pub fn normalize_text(text: &str) -> String {
    deunicode::deunicode(text).to_lowercase().trim().to_string()
}

/// Extract the grade number from values such as `"6° ano"`, `"1ª série"` or
/// `"Ano 9"`. Returns an empty string when no digits are present.
pub fn extract_series_number(text: &str) -> String {
    let without_ano = ANO_PATTERN.replace_all(text.trim(), "");
    DIGITS_PATTERN
        .find(&without_ano)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Comparison key for grade and bimester cells: the number when there is
/// one, otherwise the normalized text.
pub fn match_key(text: &str) -> String {
    let number = extract_series_number(text);
    if number.is_empty() {
        normalize_text(text)
    } else {
        number
    }
}

/// Index of the header matching `patterns`, most specific pattern first:
/// for each pattern in order, the first header whose normalized text
/// contains it.
pub fn find_column<S: AsRef<str>>(headers: &[S], patterns: &[&str]) -> Option<usize> {
    let headers: Vec<String> = headers.iter().map(|h| normalize_text(h.as_ref())).collect();

    patterns
        .iter()
        .map(|p| normalize_text(p))
        .filter(|p| !p.is_empty())
        .find_map(|pattern| headers.iter().position(|h| h.contains(pattern.as_str())))
}

/// Keep alphanumerics and `" _-()"`, replace everything else with `_`,
/// uppercase the result and turn spaces into underscores.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || " _-()".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .to_uppercase()
        .replace(' ', "_")
}

/// Replace path separators so a client-supplied value stays one file-name
/// component.
pub fn path_safe(text: &str) -> String {
    text.replace(['/', '\\'], "_")
}

/// First `max` characters of `text` (character-based, never splits a code point).
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_safe_replaces_separators() {
        assert_eq!(path_safe("Ana/Souza\\Lima"), "Ana_Souza_Lima");
        assert_eq!(path_safe("Matemática"), "Matemática");
    }

    #[test]
    fn test_normalize_text_removes_accents() {
        assert_eq!(normalize_text("  ANO/SÉRIE "), "ano/serie");
        assert_eq!(normalize_text("Conteúdo"), "conteudo");
        assert_eq!(normalize_text("PERÍODO"), "periodo");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_extract_series_number_variants() {
        assert_eq!(extract_series_number("6° ano"), "6");
        assert_eq!(extract_series_number("6º Ano"), "6");
        assert_eq!(extract_series_number("1ª série"), "1");
        assert_eq!(extract_series_number("Ano 9"), "9");
        assert_eq!(extract_series_number("  12 "), "12");
        assert_eq!(extract_series_number("3º Bimestre"), "3");
    }

    #[test]
    fn test_extract_series_number_without_digits() {
        assert_eq!(extract_series_number("ano"), "");
        assert_eq!(extract_series_number("Primeiro bimestre"), "");
        assert_eq!(extract_series_number(""), "");
    }

    #[test]
    fn test_match_key_falls_back_to_normalized_text() {
        assert_eq!(match_key("2º"), "2");
        assert_eq!(match_key("Primeiro Bimestre"), "primeiro bimestre");
    }

    #[test]
    fn test_find_column_matches_accent_insensitively() {
        let headers = ["Componente", "ANO/SERIE", "Bimestre", "Título da aula"];
        assert_eq!(find_column(&headers, &["ANO/SÉRIE", "ANO"]), Some(1));
        assert_eq!(find_column(&headers, &["BIMESTRE", "BIM"]), Some(2));
        assert_eq!(find_column(&headers, &["TÍTULO DA AULA", "TITULO"]), Some(3));
        assert_eq!(find_column(&headers, &["OBJETIVOS"]), None);
    }

    #[test]
    fn test_find_column_prefers_specific_patterns() {
        // "Plano de aula" contains "ano" but the exact grade header wins.
        let headers = ["Plano de aula", "Ano/Série"];
        assert_eq!(find_column(&headers, &["ANO/SÉRIE", "ANO"]), Some(1));
        // Generic pattern still applies when nothing specific matches.
        let headers = ["Plano de aula", "Turma"];
        assert_eq!(find_column(&headers, &["ANO/SÉRIE", "ANO"]), Some(0));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Robótica & Games"), "ROBÓTICA___GAMES");
        assert_eq!(sanitize_filename("Arte (Visual) - 2025"), "ARTE_(VISUAL)_-_2025");
        assert_eq!(sanitize_filename("a/b\\c"), "A_B_C");
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("Matemática", 7), "Matemát");
        assert_eq!(truncate_chars("curto", 20), "curto");
        assert_eq!(truncate_chars("", 3), "");
    }
}
