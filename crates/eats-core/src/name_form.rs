//! Name-form generation: the normalised and variant renderings of a name
//! that are written to the search index.
//!
//! Forms are never displayed. Stored names are expanded with their
//! language and script; search queries are expanded with neither, which
//! disables abbreviation but keeps ASCII folding.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use unicode_general_category::{GeneralCategory, get_general_category};
use unicode_normalization::UnicodeNormalization;

/// Script code under which ASCII-folded variants are generated.
pub const LATIN_SCRIPT_CODE: &str = "Latn";

/// Literal substring abbreviations, keyed by language code.
const ABBREVIATIONS: &[(&str, &[(&str, &str)])] = &[("en", &[(" and ", " & ")])];

/// Non-ASCII characters with multi-character ASCII equivalents. Applied
/// before remaining non-ASCII characters are dropped.
const ASCII_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("Æ", "AE"),
    ("æ", "ae"),
    ("Œ", "OE"),
    ("œ", "oe"),
    ("ß", "ss"),
    ("ſ", "s"),
    ("\u{02BB}", "'"),
    ("\u{201C}", "\""),
    ("\u{201D}", "\""),
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
];

fn macron_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("([aeiou])\u{0304}").expect("macron regex must compile"))
}

/// Returns every form of `name` to be indexed.
///
/// The canonically decomposed (NFD) input is always a member. Each later
/// step adds variants derived from every form produced so far, in order:
/// ASCII folding (Latin or absent script), macron doubling, abbreviation
/// (language present), punctuation removal.
pub fn create_name_forms(
    name: &str,
    language_code: Option<&str>,
    script_code: Option<&str>,
) -> BTreeSet<String> {
    let mut forms = BTreeSet::new();
    forms.insert(name.nfd().collect::<String>());

    if script_code.is_none_or(|code| code == LATIN_SCRIPT_CODE) {
        expand(&mut forms, asciify_name);
    }
    expand(&mut forms, demacronise_name);
    if let Some(language_code) = language_code {
        expand(&mut forms, |form| abbreviate_name(form, language_code));
    }
    expand(&mut forms, unpunctuate_name);

    forms
}

fn expand(forms: &mut BTreeSet<String>, derive: impl Fn(&str) -> String) {
    let derived: Vec<String> = forms.iter().map(|form| derive(form)).collect();
    forms.extend(derived);
}

/// Split forms into the whitespace-delimited terms stored as index rows.
pub fn index_terms<'a>(forms: impl IntoIterator<Item = &'a String>) -> BTreeSet<String> {
    forms
        .into_iter()
        .flat_map(|form| form.split_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns `name` with full elements abbreviated according to the
/// conventions of `language_code`.
pub fn abbreviate_name(name: &str, language_code: &str) -> String {
    let rules = ABBREVIATIONS
        .iter()
        .find(|(code, _)| *code == language_code)
        .map(|(_, rules)| *rules)
        .unwrap_or(&[]);
    rules
        .iter()
        .fold(name.to_string(), |acc, (full, abbreviated)| {
            acc.replace(full, abbreviated)
        })
}

/// Returns `name` converted to ASCII: known special letters are expanded,
/// any other non-ASCII character is dropped.
pub fn asciify_name(name: &str) -> String {
    substitute_ascii(name)
        .chars()
        .filter(char::is_ascii)
        .collect()
}

/// Returns `name` with macronised vowels changed into double vowels.
///
/// Expects decomposed input: a base vowel followed by U+0304.
pub fn demacronise_name(name: &str) -> String {
    macron_re().replace_all(name, "$1$1").into_owned()
}

/// Returns `name` with characters that have ASCII equivalents substituted.
pub fn substitute_ascii(name: &str) -> String {
    ASCII_SUBSTITUTIONS
        .iter()
        .fold(name.to_string(), |acc, (original, substitute)| {
            acc.replace(original, substitute)
        })
}

/// Returns `name` with every Unicode punctuation character (general
/// category P*) removed. Spaces are left untouched and none are inserted.
pub fn unpunctuate_name(name: &str) -> String {
    name.chars().filter(|c| !is_punctuation(*c)).collect()
}

fn is_punctuation(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::ConnectorPunctuation
            | GeneralCategory::DashPunctuation
            | GeneralCategory::OpenPunctuation
            | GeneralCategory::ClosePunctuation
            | GeneralCategory::InitialPunctuation
            | GeneralCategory::FinalPunctuation
            | GeneralCategory::OtherPunctuation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nfd(s: &str) -> String {
        s.nfd().collect()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| nfd(s)).collect()
    }

    #[test]
    fn abbreviate_name_uses_language_table() {
        assert_eq!(abbreviate_name("Smith and Smith", "en"), "Smith & Smith");
        assert_eq!(abbreviate_name("Smith and Smith", "fr"), "Smith and Smith");
    }

    #[test]
    fn asciify_name_cases() {
        let data = [
            ("Alan Smith", "Alan Smith"),
            ("Ægypt", "AEgypt"),
            ("Encyclopædia Brittanica", "Encyclopaedia Brittanica"),
            ("Œdipus", "OEdipus"),
            ("Schloß", "Schloss"),
            ("Hawaiʻi", "Hawai'i"),
            ("Paradiſe Loſt", "Paradise Lost"),
            ("War’s End", "War's End"),
            ("“Quoted”", "\"Quoted\""),
        ];
        for (original, expected) in data {
            assert_eq!(asciify_name(original), expected, "asciify {original}");
        }
    }

    #[test]
    fn asciify_name_drops_combining_marks_of_decomposed_input() {
        assert_eq!(asciify_name(&nfd("François")), "Francois");
        assert_eq!(asciify_name(&nfd("Māori")), "Maori");
    }

    #[test]
    fn asciify_name_may_empty_non_latin_input() {
        assert_eq!(asciify_name("Москва"), "");
    }

    #[test]
    fn substitute_ascii_keeps_other_characters() {
        assert_eq!(substitute_ascii("Schloß Ørsted"), "Schloss Ørsted");
    }

    #[test]
    fn demacronise_name_doubles_vowels() {
        assert_eq!(demacronise_name(&nfd("Māori")), "Maaori");
        assert_eq!(demacronise_name(&nfd("Tūhoe ōtaki")), "Tuuhoe ootaki");
        // Precomposed input is not matched.
        assert_eq!(demacronise_name("M\u{0101}ori"), "M\u{0101}ori");
    }

    #[test]
    fn unpunctuate_name_cases() {
        let data = [
            ("Alan Smith", "Alan Smith"),
            ("A. Smith", "A Smith"),
            ("Smith, Alan", "Smith Alan"),
            ("Middle-earth", "Middleearth"),
            ("War's End", "Wars End"),
            ("War’s End", "Wars End"),
            ("Never say never (again)", "Never say never again"),
        ];
        for (original, expected) in data {
            assert_eq!(unpunctuate_name(original), expected, "unpunctuate {original}");
        }
    }

    #[test]
    fn create_name_forms_cases() {
        assert_eq!(
            create_name_forms("Māori", Some("mi"), Some("Latn")),
            set(&["Māori", "Maori", "Maaori"])
        );
        assert_eq!(
            create_name_forms("François", Some("fr"), Some("Latn")),
            set(&["François", "Francois"])
        );
        assert_eq!(
            create_name_forms("A. Smith", None, None),
            set(&["A. Smith", "A Smith"])
        );
    }

    #[test]
    fn create_name_forms_skips_folding_for_non_latin_script() {
        let forms = create_name_forms("Ægypt", Some("en"), Some("Grek"));
        assert_eq!(forms, set(&["Ægypt"]));
    }

    #[test]
    fn create_name_forms_always_contains_nfd_input() {
        for input in ["", "Москва", "Ōkārito", "O'Brien-Smith", "\u{0301}"] {
            let forms = create_name_forms(input, None, None);
            assert!(forms.contains(&nfd(input)), "missing NFD form of {input:?}");
        }
    }

    #[test]
    fn create_name_forms_of_normalised_input_is_subset() {
        let original = "Ngā Tāngata, and Friends";
        let normalised = nfd(original);
        let from_original = create_name_forms(original, Some("en"), Some("Latn"));
        let from_normalised = create_name_forms(&normalised, Some("en"), Some("Latn"));
        assert!(from_normalised.is_subset(&from_original));
    }

    #[test]
    fn index_terms_splits_on_whitespace() {
        let forms = set(&["J. S. Bach", "J S Bach"]);
        let terms = index_terms(&forms);
        let expected: BTreeSet<String> = ["J.", "S.", "J", "S", "Bach"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(terms, expected);
    }
}
