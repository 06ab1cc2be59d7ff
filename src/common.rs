//! Shared identifiers used across the dispatcher and reporting code

/// Type-safe wrapper for worker IDs to prevent confusion with request counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct WorkerId(pub u32);

impl WorkerId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl From<u32> for WorkerId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
