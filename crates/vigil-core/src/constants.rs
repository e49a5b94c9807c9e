//! Well-known names understood by every service definition.

/// Group that every user implicitly belongs to. Compared case-insensitively.
pub const GROUP_PUBLIC: &str = "public";

/// Access type meaning "any access type the policy grants".
pub const ANY_ACCESS: &str = "_any";

/// Access type requested when administering a policy (delegated admin).
pub const ADMIN_ACCESS: &str = "_admin";

/// Resource pattern matching any run of characters.
pub const MATCH_ANY: &str = "*";

/// Resource pattern matching exactly one character.
pub const MATCH_ONE: &str = "?";
