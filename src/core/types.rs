use serde::{Deserialize, Serialize};

/// Matching locus.
///
/// Only these loci take part in matching; typings at any other locus are
/// dropped before pre-calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Locus {
    A,
    B,
    C,
    Dpb1,
    Dqb1,
    Drb1,
}

impl Locus {
    pub const ALL: [Locus; 6] = [
        Locus::A,
        Locus::B,
        Locus::C,
        Locus::Dpb1,
        Locus::Dqb1,
        Locus::Drb1,
    ];

    /// Map a molecular locus string (`A*`, `DRB1*`, or without the star) to a matching locus
    #[must_use]
    pub fn from_molecular(typing_locus: &str) -> Option<Self> {
        match typing_locus.trim().trim_end_matches('*').to_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "DPB1" => Some(Self::Dpb1),
            "DQB1" => Some(Self::Dqb1),
            "DRB1" => Some(Self::Drb1),
            _ => None,
        }
    }

    /// Map a serology locus string (`A`, `B`, `Cw`, `DQ`, `DR`) to a matching locus
    #[must_use]
    pub fn from_serology(typing_locus: &str) -> Option<Self> {
        match typing_locus.trim().to_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "CW" => Some(Self::C),
            "DQ" => Some(Self::Dqb1),
            "DR" => Some(Self::Drb1),
            _ => None,
        }
    }

    /// Parse a user supplied locus name (`A`, `drb1`, `DRB1*`)
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::from_molecular(s)
    }
}

impl std::fmt::Display for Locus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
            Self::C => write!(f, "C"),
            Self::Dpb1 => write!(f, "DPB1"),
            Self::Dqb1 => write!(f, "DQB1"),
            Self::Drb1 => write!(f, "DRB1"),
        }
    }
}

impl std::str::FromStr for Locus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("'{s}' is not a matching locus"))
    }
}

/// How a typing was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypingMethod {
    Molecular,
    Serology,
}

impl std::fmt::Display for TypingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Molecular => write!(f, "molecular"),
            Self::Serology => write!(f, "serology"),
        }
    }
}

/// Position of a serology in the broad/split/associated hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerologySubtype {
    NotSplit,
    Broad,
    Split,
    Associated,
}

impl std::fmt::Display for SerologySubtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotSplit => write!(f, "NotSplit"),
            Self::Broad => write!(f, "Broad"),
            Self::Split => write!(f, "Split"),
            Self::Associated => write!(f, "Associated"),
        }
    }
}

/// Confidence of a DNA to serology assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assignment {
    None,
    Unambiguous,
    Possible,
    Assumed,
    Expert,
}

impl Assignment {
    /// Lower rank wins when several assignments apply
    #[must_use]
    pub fn precedence(self) -> u8 {
        match self {
            Self::Unambiguous => 0,
            Self::Possible => 1,
            Self::Assumed => 2,
            Self::Expert => 3,
            Self::None => 4,
        }
    }
}

/// Sequencing coverage of an allele
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SequenceStatus {
    #[default]
    Unknown,
    Partial,
    Full,
}

/// Kind of DNA the allele sequence was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DnaCategory {
    #[default]
    Unknown,
    GDna,
    CDna,
    NucleotideSequence,
}

/// Sequence status and DNA category of an allele
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct AlleleTypingStatus {
    pub sequence_status: SequenceStatus,
    pub dna_category: DnaCategory,
}

impl AlleleTypingStatus {
    #[must_use]
    pub fn new(sequence_status: SequenceStatus, dna_category: DnaCategory) -> Self {
        Self {
            sequence_status,
            dna_category,
        }
    }
}

/// Resolution class of a lookup string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum HlaTypingCategory {
    Allele,
    GGroup,
    PGroup,
    Serology,
    XxCode,
    NmdpCode,
    AlleleStringOfNames,
    AlleleStringOfSubtypes,
}

impl HlaTypingCategory {
    pub const ALL: [HlaTypingCategory; 8] = [
        HlaTypingCategory::Allele,
        HlaTypingCategory::GGroup,
        HlaTypingCategory::PGroup,
        HlaTypingCategory::Serology,
        HlaTypingCategory::XxCode,
        HlaTypingCategory::NmdpCode,
        HlaTypingCategory::AlleleStringOfNames,
        HlaTypingCategory::AlleleStringOfSubtypes,
    ];

    /// Typing method of the dictionary rows this category resolves to
    #[must_use]
    pub fn typing_method(self) -> TypingMethod {
        match self {
            Self::Serology => TypingMethod::Serology,
            _ => TypingMethod::Molecular,
        }
    }
}

impl std::fmt::Display for HlaTypingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allele => write!(f, "allele"),
            Self::GGroup => write!(f, "g_group"),
            Self::PGroup => write!(f, "p_group"),
            Self::Serology => write!(f, "serology"),
            Self::XxCode => write!(f, "xx_code"),
            Self::NmdpCode => write!(f, "nmdp_code"),
            Self::AlleleStringOfNames => write!(f, "allele_string_of_names"),
            Self::AlleleStringOfSubtypes => write!(f, "allele_string_of_subtypes"),
        }
    }
}

/// Output category for name conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TargetHlaCategory {
    TwoFieldAlleleIncludingExpressionSuffix,
    TwoFieldAlleleExcludingExpressionSuffix,
    GGroup,
    PGroup,
    Serology,
}
