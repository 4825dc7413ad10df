use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-entity, strictly increasing version number. Assigned by the store,
/// starting at 1 for the create snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceNumber(i64);

impl SequenceNumber {
    pub fn new(value: i64) -> Result<Self, String> {
        if value < 1 {
            return Err("Sequence number must be at least 1".to_string());
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SequenceNumber> for i64 {
    fn from(value: SequenceNumber) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_and_negative() {
        assert!(SequenceNumber::new(0).is_err());
        assert!(SequenceNumber::new(-3).is_err());
        assert_eq!(SequenceNumber::new(1).unwrap().value(), 1);
    }

    #[test]
    fn test_ordering_follows_value() {
        let first = SequenceNumber::new(1).unwrap();
        let second = SequenceNumber::new(2).unwrap();
        assert!(second > first);
    }
}
