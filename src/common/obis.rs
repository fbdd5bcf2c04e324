// src/common/obis.rs

use super::error::SmlError;
use arrayvec::{ArrayString, ArrayVec};
use core::fmt::{self, Write};
use core::str::FromStr;

/// Longest textual form: `255-255:255.255.255*255`.
pub const OBIS_REPR_LEN: usize = 23;

/// OBIS (Object Identification System) code identifying a measured quantity.
///
/// Six value groups `A-B:C.D.E*F`, e.g. `1-0:1.8.0*255` for the total
/// imported active energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObisCode {
    bytes: [u8; 6],
}

impl ObisCode {
    pub const fn new(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> Self {
        Self { bytes: [a, b, c, d, e, f] }
    }

    pub const fn from_bytes(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    /// Builds a code from a decoded octet string; `None` unless it is exactly six bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; 6] = bytes.try_into().ok()?;
        Some(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.bytes
    }

    /// Formats the code as `A-B:C.D.E*F` without allocating.
    pub fn repr(&self) -> ArrayString<OBIS_REPR_LEN> {
        let mut out = ArrayString::new();
        // cannot overflow: every group is at most three digits
        let _ = write!(out, "{}", self);
        out
    }
}

impl fmt::Display for ObisCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.bytes;
        write!(f, "{}-{}:{}.{}.{}*{}", b[0], b[1], b[2], b[3], b[4], b[5])
    }
}

impl FromStr for ObisCode {
    type Err = SmlError;

    /// Accepts `A-B:C.D.E*F`, `A-B:C.D.E` (F defaults to 255) and `A.B.C.D.E.F`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (groups, count) = parse_groups(s).ok_or(SmlError::InvalidObisCode)?;
        let mut bytes = [255u8; 6];
        for (slot, group) in bytes.iter_mut().zip(groups.iter()).take(count) {
            *slot = group.ok_or(SmlError::InvalidObisCode)?;
        }
        Ok(Self { bytes })
    }
}

// --- Patterns ---

/// OBIS code with per-group wildcards, used to select records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObisPattern {
    code: [u8; 6],
    /// Bit `i` set means group `i` must match exactly.
    mask: u8,
}

impl ObisPattern {
    const ALL_GROUPS: u8 = 0b0011_1111;

    /// Pattern with explicit wildcards; `wildcard[i] == true` matches any value in group `i`.
    pub fn new(code: [u8; 6], wildcard: [bool; 6]) -> Self {
        let mask = wildcard
            .iter()
            .enumerate()
            .filter(|(_, w)| !**w)
            .fold(0u8, |m, (i, _)| m | (1 << i));
        Self { code, mask }
    }

    /// Pattern matching a single code.
    pub fn exact(code: ObisCode) -> Self {
        Self { code: code.bytes, mask: Self::ALL_GROUPS }
    }

    /// Pattern matching every code.
    pub fn any() -> Self {
        Self { code: [0; 6], mask: 0 }
    }

    pub fn is_wildcard(&self, group: usize) -> bool {
        group < 6 && self.mask & (1 << group) == 0
    }

    pub fn matches(&self, code: &ObisCode) -> bool {
        (0..6).all(|i| self.is_wildcard(i) || self.code[i] == code.bytes[i])
    }
}

impl From<ObisCode> for ObisPattern {
    fn from(code: ObisCode) -> Self {
        Self::exact(code)
    }
}

impl FromStr for ObisPattern {
    type Err = SmlError;

    /// Same syntax as [`ObisCode`], with `?` as a wildcard group. Omitting
    /// `*F` leaves F as a wildcard.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (groups, count) = parse_groups(s).ok_or(SmlError::InvalidObisCode)?;
        let mut code = [0u8; 6];
        let mut wildcard = [true; 6];
        for i in 0..count {
            if let Some(value) = groups[i] {
                code[i] = value;
                wildcard[i] = false;
            }
        }
        Ok(Self::new(code, wildcard))
    }
}

impl fmt::Display for ObisPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SEPARATORS: [&str; 6] = ["", "-", ":", ".", ".", "*"];
        for (i, sep) in SEPARATORS.iter().enumerate() {
            f.write_str(sep)?;
            if self.is_wildcard(i) {
                f.write_char('?')?;
            } else {
                write!(f, "{}", self.code[i])?;
            }
        }
        Ok(())
    }
}

/// Splits an OBIS string into its groups (`None` = `?`) and the number of groups found.
fn parse_groups(s: &str) -> Option<([Option<u8>; 6], usize)> {
    let mut groups = [None; 6];
    let mut separators: ArrayVec<char, 5> = ArrayVec::new();
    let mut count = 0;
    let mut rest = s.trim();

    loop {
        let end = rest.find(['-', ':', '.', '*']).unwrap_or(rest.len());
        if count == groups.len() {
            return None;
        }
        groups[count] = match &rest[..end] {
            "?" => None,
            token => Some(token.parse::<u8>().ok()?),
        };
        count += 1;
        if end == rest.len() {
            break;
        }
        let sep = rest[end..].chars().next()?;
        separators.try_push(sep).ok()?;
        rest = &rest[end + sep.len_utf8()..];
    }

    let valid = match (count, separators.as_slice()) {
        (6, ['.', '.', '.', '.', '.']) => true,
        (6, ['-', ':', '.', '.', '*']) => true,
        (5, ['-', ':', '.', '.']) => true,
        _ => false,
    };
    valid.then_some((groups, count))
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obis_code_parse_formats() {
        let expected = ObisCode::new(1, 0, 1, 8, 0, 255);
        assert_eq!("1-0:1.8.0*255".parse::<ObisCode>().unwrap(), expected);
        assert_eq!("1-0:1.8.0".parse::<ObisCode>().unwrap(), expected);
        assert_eq!("1.0.1.8.0.255".parse::<ObisCode>().unwrap(), expected);
    }

    #[test]
    fn test_obis_code_parse_invalid() {
        for bad in ["", "1-0:1.8", "1-0:1.8.0*256", "1-0:1.8.0*1*2", "1:0-1.8.0*255", "a-0:1.8.0*255", "1-0:?.8.0*255"] {
            assert!(bad.parse::<ObisCode>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_obis_code_display_and_repr() {
        let code = ObisCode::new(1, 0, 16, 7, 0, 255);
        assert_eq!(format!("{}", code), "1-0:16.7.0*255");
        assert_eq!(code.repr().as_str(), "1-0:16.7.0*255");
        assert_eq!(ObisCode::new(255, 255, 255, 255, 255, 255).repr().len(), OBIS_REPR_LEN);
    }

    #[test]
    fn test_obis_code_from_slice() {
        assert_eq!(ObisCode::from_slice(&[1, 0, 1, 8, 0, 255]), Some(ObisCode::new(1, 0, 1, 8, 0, 255)));
        assert_eq!(ObisCode::from_slice(&[1, 0, 1, 8, 0]), None);
    }

    #[test]
    fn test_pattern_exact() {
        let pattern = ObisPattern::exact(ObisCode::new(1, 0, 1, 8, 0, 255));
        assert!(pattern.matches(&ObisCode::new(1, 0, 1, 8, 0, 255)));
        assert!(!pattern.matches(&ObisCode::new(1, 0, 2, 8, 0, 255)));
    }

    #[test]
    fn test_pattern_wildcards() {
        let pattern: ObisPattern = "1-?:1.8.?".parse().unwrap();
        assert!(pattern.matches(&ObisCode::new(1, 0, 1, 8, 0, 255)));
        assert!(pattern.matches(&ObisCode::new(1, 1, 1, 8, 2, 3)));
        assert!(!pattern.matches(&ObisCode::new(1, 0, 2, 8, 0, 255)));
        assert!(pattern.is_wildcard(5));
        assert_eq!(format!("{}", pattern), "1-?:1.8.?*?");
    }

    #[test]
    fn test_pattern_any() {
        assert!(ObisPattern::any().matches(&ObisCode::new(9, 9, 9, 9, 9, 9)));
    }
}
