use rand::Rng;
use std::fmt;
use thiserror::Error;

/// Longest `refId` the gateway accepts.
pub const MAX_REF_ID_LEN: usize = 20;

/// Merchant reference id, echoed back by the gateway in the reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefId(String);

#[derive(Debug, Error)]
#[error("refId is {0} characters long, the gateway accepts at most {MAX_REF_ID_LEN}")]
pub struct RefIdTooLong(pub usize);

impl RefId {
    /// # Errors
    /// Returns `RefIdTooLong` if `value` exceeds [`MAX_REF_ID_LEN`] characters.
    pub fn new(value: impl Into<String>) -> Result<Self, RefIdTooLong> {
        let value = value.into();
        let len = value.chars().count();
        if len > MAX_REF_ID_LEN {
            return Err(RefIdTooLong(len));
        }
        Ok(Self(value))
    }

    /// Random numeric id below 100000.
    #[must_use]
    pub fn random() -> Self {
        let n: u32 = rand::rng().random_range(0..100_000);
        Self(n.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn accepts_up_to_twenty_chars() {
        assert!(RefId::new("12345678901234567890").is_ok());
        let err = RefId::new("123456789012345678901").unwrap_err();
        assert_eq!(err.0, 21);
    }

    #[test]
    fn random_is_numeric_and_short() {
        for _ in 0..32 {
            let id = RefId::random();
            assert!(id.as_str().len() <= 5);
            assert!(id.as_str().chars().all(|c| c.is_ascii_digit()));
        }
    }
}
