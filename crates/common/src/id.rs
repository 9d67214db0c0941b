//! ID generation utilities.

use ulid::Ulid;

/// ID generator for server-assigned entities (groups, join requests,
/// order requests, chat messages). User IDs are supplied by clients.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new lowercase ULID.
    ///
    /// ULIDs sort by creation time, which keeps chat history and listings
    /// in a stable order when timestamps collide.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }
}
