use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::allele::{strip_locus_prefix, FIELD_DELIMITER};

#[derive(Error, Debug)]
pub enum MacParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid MAC file format: {0}")]
    InvalidFormat(String),
}

/// Separator between subtypes in a MAC expansion
pub const SUBTYPE_DELIMITER: char = '/';

/// Multiple allele codes and the subtypes they expand to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacDictionary {
    /// Code (upper case) -> raw expansion, e.g. `AB` -> `01/02`
    codes: HashMap<String, String>,
}

impl MacDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: &str, expansion: &str) {
        self.codes
            .insert(code.trim().to_uppercase(), expansion.trim().to_string());
    }

    /// Expand an NMDP code name such as `01:AB` into allele names.
    ///
    /// Generic expansions (`01/02`) are appended to the code's first field;
    /// specific expansions (`01:01/02:01`) are used as they are. Returns
    /// `None` if the name is not `<first field>:<code>` or the code is unknown.
    ///
    /// ```
    /// use hla_dictionary::parsing::mac::MacDictionary;
    ///
    /// let mut macs = MacDictionary::new();
    /// macs.insert("AB", "01/02");
    /// assert_eq!(macs.expand("01:AB").unwrap(), vec!["01:01", "01:02"]);
    /// ```
    pub fn expand(&self, nmdp_code: &str) -> Option<Vec<String>> {
        let (first_field, code) = strip_locus_prefix(nmdp_code).split_once(FIELD_DELIMITER)?;
        let expansion = self.codes.get(&code.to_uppercase())?;

        Some(
            expansion
                .split(SUBTYPE_DELIMITER)
                .map(str::trim)
                .filter(|subtype| !subtype.is_empty())
                .map(|subtype| {
                    if subtype.contains(FIELD_DELIMITER) {
                        subtype.to_string()
                    } else {
                        format!("{first_field}{FIELD_DELIMITER}{subtype}")
                    }
                })
                .collect(),
        )
    }

    /// Number of codes in the dictionary
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Check if the dictionary has no codes
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Parse a MAC file with columns: code, expansion
///
/// # Errors
///
/// Returns `MacParseError::Io` if the file cannot be read, or
/// `MacParseError::InvalidFormat` if the content is invalid.
pub fn parse_mac_file(path: &Path) -> Result<MacDictionary, MacParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_mac_text(&content)
}

/// Parse tab-separated MAC text with columns: code, expansion
///
/// Blank lines, `#` comments and a leading `CODE` header line are skipped.
///
/// # Errors
///
/// Returns `MacParseError::InvalidFormat` if a line has fewer than 2 fields,
/// an empty code or expansion, or if no codes are found.
pub fn parse_mac_text(text: &str) -> Result<MacDictionary, MacParseError> {
    let mut macs = MacDictionary::new();
    let mut first_data_line = true;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();

        if first_data_line {
            first_data_line = false;
            if fields[0].trim().eq_ignore_ascii_case("code") {
                continue;
            }
        }

        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;

        if fields.len() < 2 {
            return Err(MacParseError::InvalidFormat(format!(
                "Line {line_num} has fewer than 2 fields"
            )));
        }

        let code = fields[0].trim();
        let expansion = fields[1].trim();
        if code.is_empty() || expansion.is_empty() {
            return Err(MacParseError::InvalidFormat(format!(
                "Line {line_num} has an empty code or expansion"
            )));
        }
        if !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(MacParseError::InvalidFormat(format!(
                "Invalid code on line {line_num}: '{code}'"
            )));
        }

        macs.insert(code, expansion);
    }

    if macs.is_empty() {
        return Err(MacParseError::InvalidFormat(
            "No codes found in MAC file".to_string(),
        ));
    }

    Ok(macs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mac_text() {
        let text = "# comment\nCODE\tSUBTYPES\nAB\t01/02\nABC\t01:01/11:02\n";
        let macs = parse_mac_text(text).unwrap();
        assert_eq!(macs.len(), 2);
    }

    #[test]
    fn test_generic_expansion_uses_first_field() {
        let macs = parse_mac_text("AB\t01/02\n").unwrap();
        assert_eq!(macs.expand("11:AB").unwrap(), vec!["11:01", "11:02"]);
        assert_eq!(macs.expand("A*11:ab").unwrap(), vec!["11:01", "11:02"]);
    }

    #[test]
    fn test_specific_expansion_is_verbatim() {
        let macs = parse_mac_text("ABC\t01:01/11:02\n").unwrap();
        assert_eq!(macs.expand("01:ABC").unwrap(), vec!["01:01", "11:02"]);
    }

    #[test]
    fn test_unknown_code() {
        let macs = parse_mac_text("AB\t01/02\n").unwrap();
        assert!(macs.expand("01:ZZZ").is_none());
        assert!(macs.expand("AB").is_none());
    }

    #[test]
    fn test_parse_mac_text_errors() {
        assert!(parse_mac_text("AB\n").is_err());
        assert!(parse_mac_text("A1\t01/02\n").is_err());
        assert!(parse_mac_text("# only comments\n").is_err());
    }

    #[test]
    fn test_parse_mac_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/mac.tsv");
        let macs = parse_mac_file(&path).unwrap();
        assert_eq!(macs.len(), 4);
        assert_eq!(macs.expand("01:XY").unwrap(), vec!["01:01", "01:77"]);
    }
}
