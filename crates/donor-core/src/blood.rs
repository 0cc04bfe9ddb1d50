//! Blood groups and donor/request compatibility.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EnumerationError;

/// One of the eight ABO/Rh blood groups.
///
/// The backend identifies groups by a numeric code (1-8); the session record
/// and user input use the label ("A+", "O-", ...). Both forms are accepted
/// when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BloodType {
    APositive,
    ANegative,
    BPositive,
    BNegative,
    AbPositive,
    AbNegative,
    OPositive,
    ONegative,
}

/// Request groups a donor of the given group is shown when the
/// compatibility filter is enabled, keyed by the donor's group.
pub const BLOOD_TYPE_COMPATIBILITY: [(BloodType, &[BloodType]); 8] = {
    use BloodType::*;
    [
        (APositive, &[APositive, ANegative, OPositive, ONegative]),
        (ANegative, &[ANegative, ONegative]),
        (BPositive, &[BPositive, BNegative, OPositive, ONegative]),
        (BNegative, &[BNegative, ONegative]),
        (
            AbPositive,
            &[
                APositive, ANegative, BPositive, BNegative, AbPositive, AbNegative, OPositive,
                ONegative,
            ],
        ),
        (AbNegative, &[AbNegative, ANegative, BNegative, ONegative]),
        (OPositive, &[OPositive, ONegative]),
        (ONegative, &[ONegative]),
    ]
};

impl BloodType {
    /// All groups in code order.
    pub const ALL: [BloodType; 8] = [
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
        BloodType::OPositive,
        BloodType::ONegative,
    ];

    /// Numeric code used by the backend (1-8).
    pub fn code(self) -> u8 {
        match self {
            BloodType::APositive => 1,
            BloodType::ANegative => 2,
            BloodType::BPositive => 3,
            BloodType::BNegative => 4,
            BloodType::AbPositive => 5,
            BloodType::AbNegative => 6,
            BloodType::OPositive => 7,
            BloodType::ONegative => 8,
        }
    }

    /// Look up a group by its backend code.
    pub fn from_code(code: i64) -> Result<Self, EnumerationError> {
        usize::try_from(code)
            .ok()
            .and_then(|c| c.checked_sub(1))
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or_else(|| EnumerationError::unrecognized("blood type code", code.to_string()))
    }

    /// Display label ("A+", "AB-", ...).
    pub fn label(self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
        }
    }

    /// Request groups this donor is matched against.
    pub fn compatible_requests(self) -> &'static [BloodType] {
        BLOOD_TYPE_COMPATIBILITY
            .iter()
            .find(|(donor, _)| *donor == self)
            .map(|(_, accepted)| *accepted)
            .unwrap_or(&[])
    }

    /// Whether a request for `requested` is shown to a donor of this group.
    pub fn can_serve(self, requested: BloodType) -> bool {
        self.compatible_requests().contains(&requested)
    }

    /// Serialize an optional group as its numeric code.
    ///
    /// For use with `#[serde(serialize_with = ...)]` on request bodies.
    pub fn serialize_code<S: Serializer>(
        value: &Option<BloodType>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(blood_type) => serializer.serialize_some(&blood_type.code()),
            None => serializer.serialize_none(),
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BloodType {
    type Err = EnumerationError;

    /// Parse a label ("ab+", " O- ") or a numeric code ("8").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(' ', "");

        if let Ok(code) = normalized.parse::<i64>() {
            return Self::from_code(code);
        }

        let normalized = normalized
            .replace("POSITIVE", "+")
            .replace("NEGATIVE", "-")
            .replace("POS", "+")
            .replace("NEG", "-");

        Self::ALL
            .into_iter()
            .find(|bt| bt.label() == normalized)
            .ok_or_else(|| EnumerationError::unrecognized("blood type", s.trim()))
    }
}

impl Serialize for BloodType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for BloodType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(i64),
            Label(String),
        }

        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Code(code) => BloodType::from_code(code),
            Raw::Label(label) => label.parse(),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for bt in BloodType::ALL {
            assert_eq!(BloodType::from_code(bt.code() as i64).unwrap(), bt);
        }
        assert!(BloodType::from_code(0).is_err());
        assert!(BloodType::from_code(9).is_err());
        assert!(BloodType::from_code(-1).is_err());
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("O-".parse::<BloodType>().unwrap(), BloodType::ONegative);
        assert_eq!(" ab+ ".parse::<BloodType>().unwrap(), BloodType::AbPositive);
        assert_eq!("A Positive".parse::<BloodType>().unwrap(), BloodType::APositive);
        assert_eq!("3".parse::<BloodType>().unwrap(), BloodType::BPositive);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "C+".parse::<BloodType>().unwrap_err();
        assert_eq!(err.to_string(), "unrecognized blood type: 'C+'");
        assert!("".parse::<BloodType>().is_err());
    }

    #[test]
    fn test_deserialize_code_or_label() {
        let from_code: BloodType = serde_json::from_str("5").unwrap();
        assert_eq!(from_code, BloodType::AbPositive);

        let from_label: BloodType = serde_json::from_str("\"B-\"").unwrap();
        assert_eq!(from_label, BloodType::BNegative);

        assert!(serde_json::from_str::<BloodType>("12").is_err());
    }

    #[test]
    fn test_o_negative_donor_only_sees_o_negative() {
        assert!(BloodType::ONegative.can_serve(BloodType::ONegative));
        assert!(!BloodType::ONegative.can_serve(BloodType::APositive));
    }

    #[test]
    fn test_ab_positive_sees_everything() {
        for bt in BloodType::ALL {
            assert!(BloodType::AbPositive.can_serve(bt));
        }
    }

    #[test]
    fn test_every_group_serves_itself() {
        for bt in BloodType::ALL {
            assert!(bt.can_serve(bt), "{} should serve itself", bt);
        }
    }
}
