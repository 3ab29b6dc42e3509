use serde::Serialize;

use crate::core::types::{AlleleTypingStatus, Locus};

/// Expression suffix marking an allele that is not expressed at the cell surface
pub const NULL_EXPRESSION_SUFFIX: &str = "N";

/// Field separator in allele names
pub const FIELD_DELIMITER: char = ':';

/// A molecular typing at single-allele resolution.
///
/// Everything derived from the name (fields, suffix, truncated variants) is
/// computed once in [`AlleleTyping::new`] and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AlleleTyping {
    pub locus: Locus,

    /// Full allele name without the locus prefix, e.g. `01:01:01:02N`
    pub name: String,

    pub status: AlleleTypingStatus,

    pub is_deleted: bool,

    fields: Vec<String>,
    expression_suffix: String,
    is_null_expresser: bool,
    two_field_name_including_suffix: String,
    two_field_name_excluding_suffix: String,
    name_variants: Vec<String>,
}

impl AlleleTyping {
    pub fn new(locus: Locus, name: impl Into<String>) -> Self {
        let name = name.into();
        let expression_suffix = expression_suffix_of(&name).to_string();
        let fields: Vec<String> = name[..name.len() - expression_suffix.len()]
            .split(FIELD_DELIMITER)
            .map(str::to_string)
            .collect();

        let two_field_name_excluding_suffix = fields
            .iter()
            .take(2)
            .cloned()
            .collect::<Vec<_>>()
            .join(":");
        let two_field_name_including_suffix =
            format!("{two_field_name_excluding_suffix}{expression_suffix}");
        let name_variants = name_variants_of(&fields, &expression_suffix);

        Self {
            locus,
            is_null_expresser: expression_suffix == NULL_EXPRESSION_SUFFIX,
            name,
            status: AlleleTypingStatus::default(),
            is_deleted: false,
            fields,
            expression_suffix,
            two_field_name_including_suffix,
            two_field_name_excluding_suffix,
            name_variants,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: AlleleTypingStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn deleted(mut self, is_deleted: bool) -> Self {
        self.is_deleted = is_deleted;
        self
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn first_field(&self) -> &str {
        self.fields.first().map_or("", String::as_str)
    }

    pub fn expression_suffix(&self) -> &str {
        &self.expression_suffix
    }

    pub fn is_null_expresser(&self) -> bool {
        self.is_null_expresser
    }

    pub fn two_field_name_including_suffix(&self) -> &str {
        &self.two_field_name_including_suffix
    }

    pub fn two_field_name_excluding_suffix(&self) -> &str {
        &self.two_field_name_excluding_suffix
    }

    /// Truncated forms of the name that should also resolve to this allele,
    /// longest first. The full name itself is not included.
    pub fn name_variants(&self) -> &[String] {
        &self.name_variants
    }

    /// The XX code covering this allele's first field, e.g. `01:XX`
    pub fn xx_code(&self) -> String {
        format!("{}:XX", self.first_field())
    }
}

impl std::fmt::Display for AlleleTyping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*{}", self.locus, self.name)
    }
}

/// Trailing single-letter expression suffix of an allele name, or ""
#[must_use]
pub fn expression_suffix_of(name: &str) -> &str {
    match name.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => &name[name.len() - 1..],
        _ => "",
    }
}

/// Drop a leading `A*` style locus prefix from a typing name
#[must_use]
pub fn strip_locus_prefix(name: &str) -> &str {
    name.trim().rsplit_once('*').map_or(name.trim(), |(_, rest)| rest)
}

fn name_variants_of(fields: &[String], suffix: &str) -> Vec<String> {
    let mut variants = Vec::new();

    if !suffix.is_empty() {
        variants.push(fields.join(":"));
    }

    for field_count in (2..fields.len()).rev() {
        let truncated = fields[..field_count].join(":");
        if !suffix.is_empty() {
            variants.push(format!("{truncated}{suffix}"));
        }
        variants.push(truncated);
    }

    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_and_suffix() {
        let allele = AlleleTyping::new(Locus::A, "01:01:01:02N");
        assert_eq!(allele.fields(), ["01", "01", "01", "02"]);
        assert_eq!(allele.expression_suffix(), "N");
        assert!(allele.is_null_expresser());
        assert_eq!(allele.first_field(), "01");
    }

    #[test]
    fn test_expression_suffix_not_null() {
        let allele = AlleleTyping::new(Locus::B, "39:01:01:02L");
        assert_eq!(allele.expression_suffix(), "L");
        assert!(!allele.is_null_expresser());
    }

    #[test]
    fn test_two_field_names() {
        let allele = AlleleTyping::new(Locus::A, "01:01:01:02N");
        assert_eq!(allele.two_field_name_including_suffix(), "01:01N");
        assert_eq!(allele.two_field_name_excluding_suffix(), "01:01");

        let plain = AlleleTyping::new(Locus::C, "07:01");
        assert_eq!(plain.two_field_name_including_suffix(), "07:01");
    }

    #[test]
    fn test_name_variants_with_suffix() {
        let allele = AlleleTyping::new(Locus::A, "01:01:01:02N");
        assert_eq!(
            allele.name_variants(),
            ["01:01:01:02", "01:01:01N", "01:01:01", "01:01N", "01:01"]
        );
    }

    #[test]
    fn test_name_variants_without_suffix() {
        let allele = AlleleTyping::new(Locus::A, "01:01:01:01");
        assert_eq!(allele.name_variants(), ["01:01:01", "01:01"]);

        let two_field = AlleleTyping::new(Locus::A, "01:01");
        assert!(two_field.name_variants().is_empty());
    }

    #[test]
    fn test_strip_locus_prefix() {
        assert_eq!(strip_locus_prefix("A*11:02:01"), "11:02:01");
        assert_eq!(strip_locus_prefix("11:02:01"), "11:02:01");
        assert_eq!(strip_locus_prefix(" DRB1*15:01 "), "15:01");
    }

    #[test]
    fn test_xx_code() {
        let allele = AlleleTyping::new(Locus::Drb1, "15:01:01:01");
        assert_eq!(allele.xx_code(), "15:XX");
        assert_eq!(allele.to_string(), "DRB1*15:01:01:01");
    }
}
