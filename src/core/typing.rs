use serde::Serialize;

use crate::core::allele::AlleleTyping;
use crate::core::serology::SerologyTyping;
use crate::core::types::{Locus, TypingMethod};

/// Any typing that can appear in the matching dictionary
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HlaTyping {
    Allele(AlleleTyping),
    Serology(SerologyTyping),
}

impl HlaTyping {
    pub fn locus(&self) -> Locus {
        match self {
            Self::Allele(allele) => allele.locus,
            Self::Serology(serology) => serology.locus,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Allele(allele) => &allele.name,
            Self::Serology(serology) => &serology.name,
        }
    }

    pub fn typing_method(&self) -> TypingMethod {
        match self {
            Self::Allele(_) => TypingMethod::Molecular,
            Self::Serology(_) => TypingMethod::Serology,
        }
    }

    pub fn is_deleted(&self) -> bool {
        match self {
            Self::Allele(allele) => allele.is_deleted,
            Self::Serology(serology) => serology.is_deleted,
        }
    }
}

impl From<AlleleTyping> for HlaTyping {
    fn from(allele: AlleleTyping) -> Self {
        Self::Allele(allele)
    }
}

impl From<SerologyTyping> for HlaTyping {
    fn from(serology: SerologyTyping) -> Self {
        Self::Serology(serology)
    }
}

impl std::fmt::Display for HlaTyping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allele(allele) => write!(f, "{allele}"),
            Self::Serology(serology) => write!(f, "{serology}"),
        }
    }
}
