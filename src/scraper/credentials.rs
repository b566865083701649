use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialPoolError {
    #[error("credential pool must contain at least one API key")]
    Empty,
}

/// Ordered set of API keys with a cursor on the one currently in use.
///
/// Keys are tried strictly in order; once the cursor has moved past a key
/// it is never used again for the lifetime of the pool.
#[derive(Clone)]
pub struct CredentialPool {
    keys: Vec<String>,
    active: usize,
}

impl CredentialPool {
    pub fn new(keys: Vec<String>) -> Result<Self, CredentialPoolError> {
        let keys: Vec<String> = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            return Err(CredentialPoolError::Empty);
        }
        Ok(Self { keys, active: 0 })
    }

    pub fn active_key(&self) -> &str {
        &self.keys[self.active]
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Move to the next key. Returns `None` when every key has been used,
    /// in which case the cursor stays on the last key.
    pub fn advance(&mut self) -> Option<&str> {
        if self.active + 1 < self.keys.len() {
            self.active += 1;
            Some(self.active_key())
        } else {
            None
        }
    }
}

// Keys are secrets; only their count and position are printed.
impl std::fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPool")
            .field("keys", &self.keys.len())
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn pool(keys: &[&str]) -> CredentialPool {
        CredentialPool::new(keys.iter().map(|k| k.to_string()).collect()).unwrap()
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert_matches!(CredentialPool::new(vec![]), Err(CredentialPoolError::Empty));
        assert_matches!(
            CredentialPool::new(vec!["  ".into(), String::new()]),
            Err(CredentialPoolError::Empty)
        );
    }

    #[test]
    fn advances_in_order_until_exhausted() {
        let mut pool = pool(&["k1", "k2", "k3"]);
        assert_eq!(pool.active_key(), "k1");
        assert_eq!(pool.advance(), Some("k2"));
        assert_eq!(pool.advance(), Some("k3"));
        assert_eq!(pool.advance(), None);
        assert_eq!(pool.active_key(), "k3");
        assert_eq!(pool.active_index(), 2);
    }

    #[test]
    fn single_key_pool_exhausts_immediately() {
        let mut pool = pool(&["only"]);
        assert_eq!(pool.len(), 1);
        assert!(pool.advance().is_none());
    }

    #[test]
    fn debug_output_hides_keys() {
        let pool = pool(&["secret-key"]);
        assert!(!format!("{:?}", pool).contains("secret-key"));
    }
}
