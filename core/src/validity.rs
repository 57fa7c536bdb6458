//! Validity flags and one-time guards.

/// Whether a record is usable.
///
/// Records start valid. Once invalidated they stay invalid; there is no way
/// to mark a record valid again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity(bool);

impl Validity {
    pub fn new() -> Self {
        Self(true)
    }

    pub fn is_valid(&self) -> bool {
        self.0
    }

    pub fn invalidate(&mut self) {
        self.0 = false;
    }
}

impl Default for Validity {
    fn default() -> Self {
        Self::new()
    }
}

/// A guard for work that must happen at most once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OnceFlag(bool);

impl OnceFlag {
    pub fn new() -> Self {
        Self(false)
    }

    /// Returns true the first time it is called and false afterwards.
    pub fn first(&mut self) -> bool {
        if self.0 {
            false
        } else {
            self.0 = true;
            true
        }
    }

    pub fn is_done(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_is_monotone() {
        let mut v = Validity::new();
        assert!(v.is_valid());
        v.invalidate();
        assert!(!v.is_valid());
        v.invalidate();
        assert!(!v.is_valid());
    }

    #[test]
    fn test_once_flag() {
        let mut flag = OnceFlag::new();
        assert!(!flag.is_done());
        assert!(flag.first());
        assert!(!flag.first());
        assert!(flag.is_done());
    }
}
