//! Structured Hanja identifiers of the form `HJ-GG-OOOO-UUUU[U]`.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use thiserror::Error;

pub const MIN_GRADE: u8 = 1;
pub const MAX_GRADE: u8 = 15;

static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^HJ-[0-9]{2}-[0-9]{4}-[0-9A-Fa-f]{4,5}$").expect("static id pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HanjaIdError {
    #[error("'{0}' does not match HJ-GG-OOOO-UUUU")]
    Malformed(String),
    #[error("ordinal {0} does not fit in four digits")]
    OrdinalOverflow(u32),
}

/// Returns true when `s` matches the identifier pattern exactly. Pure, no I/O.
pub fn is_valid_id(s: &str) -> bool {
    ID_PATTERN.is_match(s)
}

/// Parses a grade parameter, accepting only integers in 1..=15.
pub fn parse_grade(s: &str) -> Option<u8> {
    s.trim()
        .parse::<u8>()
        .ok()
        .filter(|g| (MIN_GRADE..=MAX_GRADE).contains(g))
}

/// Returns the only code point of `s`, or `None` if `s` is empty or longer.
pub fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Percent-decodes `s` and returns it as a single code point, if it is one.
pub fn percent_decoded_char(s: &str) -> Option<char> {
    if !s.contains('%') {
        return None;
    }
    let decoded = urlencoding::decode(s).ok()?;
    single_char(&decoded)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HanjaId {
    pub grade: u8,
    pub ordinal: u32,
    pub code_point: u32,
}

impl HanjaId {
    /// Builds the ID for the `index`-th (zero-based) character of a grade list.
    pub fn derive(grade: u8, index: usize, character: char) -> Result<Self, HanjaIdError> {
        let ordinal = u32::try_from(index + 1).unwrap_or(u32::MAX);
        if ordinal > 9999 {
            return Err(HanjaIdError::OrdinalOverflow(ordinal));
        }
        Ok(Self {
            grade,
            ordinal,
            code_point: character as u32,
        })
    }

    /// The character encoded in the unicode segment.
    pub fn character(&self) -> Option<char> {
        char::from_u32(self.code_point)
    }

    /// Canonical uppercase hex of the code point, at least four digits.
    pub fn unicode_hex(&self) -> String {
        format!("{:04X}", self.code_point)
    }
}

impl fmt::Display for HanjaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HJ-{:02}-{:04}-{:04X}",
            self.grade, self.ordinal, self.code_point
        )
    }
}

impl FromStr for HanjaId {
    type Err = HanjaIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_valid_id(s) {
            return Err(HanjaIdError::Malformed(s.to_string()));
        }
        let malformed = || HanjaIdError::Malformed(s.to_string());
        let mut parts = s.split('-').skip(1);
        let grade = parts.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
        let ordinal = parts.next().ok_or_else(malformed)?.parse().map_err(|_| malformed())?;
        let code_point = parts
            .next()
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .ok_or_else(malformed)?;
        Ok(Self {
            grade,
            ordinal,
            code_point,
        })
    }
}
