use crate::error::{LungoError, Result};

/// An immutable cacheable object: a string identity and a size in bytes.
///
/// Fields are private so a policy that receives a `&CacheObject` can only
/// read it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheObject {
    key: String,
    size: u64,
}

impl CacheObject {
    /// Creates an object. The key must be non-empty and the size positive.
    pub fn new(key: impl Into<String>, size: u64) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(LungoError::InvalidObject("key must not be empty".into()));
        }
        if size == 0 {
            return Err(LungoError::InvalidObject(format!(
                "size of {key} must be a positive integer"
            )));
        }
        Ok(CacheObject { key, size })
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_key_and_zero_size() {
        assert!(matches!(
            CacheObject::new("", 1),
            Err(LungoError::InvalidObject(_))
        ));
        assert!(matches!(
            CacheObject::new("a", 0),
            Err(LungoError::InvalidObject(_))
        ));
    }

    #[test]
    fn exposes_key_and_size() {
        let obj = CacheObject::new("blob", 42).unwrap();
        assert_eq!(obj.key(), "blob");
        assert_eq!(obj.size(), 42);
    }
}
