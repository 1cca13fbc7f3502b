//! Well-known role name constants carried in access tokens.

/// Store owner. May undo/redo any entry in their tenant.
pub const ROLE_OWNER: &str = "owner";
pub const ROLE_STAFF: &str = "staff";

/// Returns `true` if the role grants tenant-wide authority over history.
pub fn is_elevated(role: &str) -> bool {
    role == ROLE_OWNER
}
