//! Classify a typing string by resolution.
//!
//! | Category | Example |
//! |----------|---------|
//! | Serology | `15`, `3901` |
//! | Allele | `01:01`, `01:01:01:02N` |
//! | PGroup | `01:01P` |
//! | GGroup | `01:01:01G` |
//! | XxCode | `01:XX` |
//! | NmdpCode | `01:AB` |
//! | AlleleStringOfNames | `01:01/02:01` |
//! | AlleleStringOfSubtypes | `01:01/02/03` |

use crate::core::allele::{strip_locus_prefix, FIELD_DELIMITER};
use crate::core::types::HlaTypingCategory;

/// Separator between names in an allele string
pub const ALLELE_STRING_DELIMITER: char = '/';

/// Classify `name`, ignoring any `A*` style locus prefix.
///
/// Returns `None` if the string is not a recognisable HLA typing.
///
/// ```
/// use hla_dictionary::core::types::HlaTypingCategory;
/// use hla_dictionary::lookup::categorise::categorise;
///
/// assert_eq!(categorise("A*01:01P"), Some(HlaTypingCategory::PGroup));
/// assert_eq!(categorise("01:01/01:02"), Some(HlaTypingCategory::AlleleStringOfNames));
/// assert_eq!(categorise("01:01;"), None);
/// ```
#[must_use]
pub fn categorise(name: &str) -> Option<HlaTypingCategory> {
    let name = name.trim();
    if name.contains(ALLELE_STRING_DELIMITER) {
        return categorise_allele_string(name);
    }

    let name = strip_locus_prefix(name);
    if name.is_empty() {
        return None;
    }

    if is_digits(name) {
        return Some(HlaTypingCategory::Serology);
    }

    let fields: Vec<&str> = name.split(FIELD_DELIMITER).collect();
    if fields.len() < 2 || !is_digits(fields[0]) {
        return None;
    }
    let last = fields[fields.len() - 1];
    let inner_fields_are_digits = fields[1..fields.len() - 1].iter().all(|f| is_digits(f));

    if fields.len() == 2 {
        if last.eq_ignore_ascii_case("XX") {
            return Some(HlaTypingCategory::XxCode);
        }
        if last.len() >= 2 && last.chars().all(|c| c.is_ascii_alphabetic()) {
            return Some(HlaTypingCategory::NmdpCode);
        }
    }

    if !inner_fields_are_digits || fields.len() > 4 {
        return None;
    }

    if let Some(group_field) = last.strip_suffix(['P', 'p']) {
        return is_digits(group_field).then_some(HlaTypingCategory::PGroup);
    }
    if let Some(group_field) = last.strip_suffix(['G', 'g']) {
        return is_digits(group_field).then_some(HlaTypingCategory::GGroup);
    }

    is_allele_field(last).then_some(HlaTypingCategory::Allele)
}

fn categorise_allele_string(name: &str) -> Option<HlaTypingCategory> {
    let parts: Vec<&str> = name.split(ALLELE_STRING_DELIMITER).map(str::trim).collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }

    let is_allele = |part: &str| categorise(part) == Some(HlaTypingCategory::Allele);

    if parts.iter().all(|part| is_allele(part)) {
        return Some(HlaTypingCategory::AlleleStringOfNames);
    }

    // `01:01/02/03`: the first name fixes the leading field for the subtypes
    if is_allele(parts[0]) && parts[1..].iter().all(|part| is_allele_field(part)) {
        return Some(HlaTypingCategory::AlleleStringOfSubtypes);
    }

    None
}

/// A field of digits with an optional single-letter expression suffix
fn is_allele_field(field: &str) -> bool {
    let digits = match field.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => &field[..field.len() - 1],
        _ => field,
    };
    is_digits(digits)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorise_each_category() {
        let cases = [
            ("15", HlaTypingCategory::Serology),
            ("3901", HlaTypingCategory::Serology),
            ("01:01", HlaTypingCategory::Allele),
            ("01:01:01:02N", HlaTypingCategory::Allele),
            ("39:01:01:02L", HlaTypingCategory::Allele),
            ("01:01P", HlaTypingCategory::PGroup),
            ("01:01:01G", HlaTypingCategory::GGroup),
            ("01:XX", HlaTypingCategory::XxCode),
            ("01:AB", HlaTypingCategory::NmdpCode),
            ("01:ABCD", HlaTypingCategory::NmdpCode),
            ("01:01/02:01", HlaTypingCategory::AlleleStringOfNames),
            ("01:01:01/01:02N", HlaTypingCategory::AlleleStringOfNames),
            ("01:01/02/03", HlaTypingCategory::AlleleStringOfSubtypes),
        ];

        for (name, expected) in cases {
            assert_eq!(categorise(name), Some(expected), "{name}");
        }
    }

    #[test]
    fn test_categorise_strips_locus_prefix() {
        assert_eq!(categorise("A*01:01"), Some(HlaTypingCategory::Allele));
        assert_eq!(categorise("DRB1*15:01P"), Some(HlaTypingCategory::PGroup));
        assert_eq!(
            categorise("B*15:01/15:03"),
            Some(HlaTypingCategory::AlleleStringOfNames)
        );
        assert_eq!(
            categorise("B*15:01/B*15:03"),
            Some(HlaTypingCategory::AlleleStringOfNames)
        );
    }

    #[test]
    fn test_categorise_rejects_unrecognised_strings() {
        let names = [
            "",
            "A*",
            "01:",
            ":01",
            "01:01:01:01:01",
            "01:A",
            "01:01X:01",
            "01:01/",
            "01:01//02",
            "/01:01",
            "01:AB/01:01",
            "xyz",
        ];
        for name in names {
            assert_eq!(categorise(name), None, "{name}");
        }
    }
}
