//! The entity that typed a command line.

/// A connected client, the console, or anything else that can issue
/// commands.
///
/// Permission evaluation itself lives outside this crate; commands and
/// grammar requirements consult it through [`has_permission`](Self::has_permission).
pub trait CommandSource: Send + Sync {
    /// Display name used in logs.
    fn name(&self) -> &str;

    /// Whether this source holds `permission`.
    fn has_permission(&self, permission: &str) -> bool;
}
