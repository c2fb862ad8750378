use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── CONJUGATION FORMS ─────────────────────────────────────────────────────────
//

/// Conjugation targets drilled by the verb quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConjugationForm {
    NegativePlain,
    NegativePolite,
    PastPlain,
    PastPolite,
    TeForm,
    Potential,
    Passive,
    Causative,
    Conditional,
    Volitional,
    Imperative,
}

impl ConjugationForm {
    pub const ALL: [ConjugationForm; 11] = [
        Self::NegativePlain,
        Self::NegativePolite,
        Self::PastPlain,
        Self::PastPolite,
        Self::TeForm,
        Self::Potential,
        Self::Passive,
        Self::Causative,
        Self::Conditional,
        Self::Volitional,
        Self::Imperative,
    ];

    /// Stable identifier used in data files and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NegativePlain => "negative-plain",
            Self::NegativePolite => "negative-polite",
            Self::PastPlain => "past-plain",
            Self::PastPolite => "past-polite",
            Self::TeForm => "te-form",
            Self::Potential => "potential",
            Self::Passive => "passive",
            Self::Causative => "causative",
            Self::Conditional => "conditional",
            Self::Volitional => "volitional",
            Self::Imperative => "imperative",
        }
    }

    /// Japanese grammar name shown to the learner.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::NegativePlain => "否定形（普通体）",
            Self::NegativePolite => "否定形（丁寧語）",
            Self::PastPlain => "過去形（普通体）",
            Self::PastPolite => "過去形（丁寧語）",
            Self::TeForm => "て形",
            Self::Potential => "可能形",
            Self::Passive => "受身形",
            Self::Causative => "使役形",
            Self::Conditional => "条件形",
            Self::Volitional => "意志形",
            Self::Imperative => "命令形",
        }
    }
}

impl fmt::Display for ConjugationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown conjugation form: {0}")]
pub struct UnknownFormError(pub String);

impl FromStr for ConjugationForm {
    type Err = UnknownFormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|form| form.as_str() == s)
            .ok_or_else(|| UnknownFormError(s.to_owned()))
    }
}

//
// ─── VERBS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbGroup {
    Godan,
    Ichidan,
    Irregular,
}

/// One conjugated form of a verb, with an optional kana-only spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbConjugation {
    #[serde(rename = "type")]
    pub form: ConjugationForm,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub furigana: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verb {
    pub id: String,
    pub dictionary_form: String,
    pub reading: String,
    pub meaning: String,
    pub group: VerbGroup,
    pub conjugations: Vec<VerbConjugation>,
}

impl Verb {
    #[must_use]
    pub fn conjugation(&self, form: ConjugationForm) -> Option<&VerbConjugation> {
        self.conjugations.iter().find(|c| c.form == form)
    }
}
