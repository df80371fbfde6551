//! Free-text canonicalization for fuzzy matching of sheet names and labels.
//!
//! `normalize` lowercases, applies the configured character-folding table,
//! strips remaining diacritics through NFD decomposition and finally keeps
//! only ASCII letters and digits. `"Ficha Cierre"`, `"FICHA_CIERRE"` and
//! `"fícha-cierre"` all become `"fichacierre"`.

use unicode_normalization::UnicodeNormalization;

use crate::config::FichasConfig;

/// Case, accent and character-set folding for free text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextNormalizer {
    replacements: Vec<(String, String)>,
}

impl TextNormalizer {
    /// Build a normalizer from a folding table (`"ñ" -> "n"`, `"ß" -> "ss"`).
    ///
    /// Entries are applied in table order. Keys are lowercased so they match the lowercased input; empty keys are
    /// ignored.
    pub fn new(replacements: &[(String, String)]) -> Self {
        let replacements = replacements
            .iter()
            .filter(|(from, _)| !from.is_empty())
            .map(|(from, to)| (from.to_lowercase(), to.to_lowercase()))
            .collect();
        Self { replacements }
    }

    pub fn from_config(config: &FichasConfig) -> Self {
        Self::new(&config.character_replacements)
    }

    pub fn normalize(&self, value: &str) -> String {
        let mut folded = value.to_lowercase();
        for (from, to) in &self.replacements {
            if folded.contains(from.as_str()) {
                folded = folded.replace(from.as_str(), to);
            }
        }
        folded.nfd().filter(char::is_ascii_alphanumeric).collect()
    }

    /// `true` when both strings normalize to the same canonical form.
    pub fn matches(&self, value: &str, canonical: &str) -> bool {
        self.normalize(value) == canonical
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::config::default_character_replacements;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new(&default_character_replacements())
    }

    #[rstest]
    #[case("Portada", "portada")]
    #[case("PORTADA", "portada")]
    #[case("pórtada", "portada")]
    #[case("Ficha Cierre", "fichacierre")]
    #[case("FICHA_CIERRE ", "fichacierre")]
    #[case("Conexión Cronograma", "conexioncronograma")]
    #[case("Acciones de Mitigación:", "accionesdemitigacion")]
    #[case("Lecciones aprendidas", "leccionesaprendidas")]
    #[case("Año 2024", "ano2024")]
    fn folds_case_accents_and_punctuation(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalizer().normalize(input), expected);
    }

    #[test]
    fn accent_insensitive_equality() {
        let n = normalizer();
        assert_eq!(n.normalize("Portada"), n.normalize("PORTADA"));
        assert_eq!(n.normalize("PORTADA"), n.normalize("pórtada"));
    }

    #[test]
    fn diacritics_outside_table_are_still_stripped() {
        let n = TextNormalizer::default();
        assert_eq!(n.normalize("Çédula"), "cedula");
    }

    #[test]
    fn table_entries_can_expand_characters() {
        let n = TextNormalizer::new(&[("ß".to_string(), "ss".to_string())]);
        assert_eq!(n.normalize("Straße"), "strasse");
        assert_eq!(TextNormalizer::default().normalize("Straße"), "strae");
    }

    #[test]
    fn overlapping_entries_apply_in_table_order() {
        let pairs = |p: &[(&str, &str)]| -> Vec<(String, String)> {
            p.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
        };
        let umlaut_first = TextNormalizer::new(&pairs(&[("ü", "ue"), ("ue", "u")]));
        assert_eq!(umlaut_first.normalize("Müller"), "muller");

        let digraph_first = TextNormalizer::new(&pairs(&[("ue", "u"), ("ü", "ue")]));
        assert_eq!(digraph_first.normalize("Müller"), "mueller");
    }

    #[test]
    fn empty_and_symbol_only_input_normalizes_to_empty() {
        let n = normalizer();
        assert_eq!(n.normalize(""), "");
        assert_eq!(n.normalize(" -- ¿? "), "");
    }

    #[test]
    fn matches_compares_against_canonical_form() {
        assert!(normalizer().matches("Retos:", "retos"));
        assert!(!normalizer().matches("Retos pendientes", "retos"));
    }
}
