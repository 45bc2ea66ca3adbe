use rusqlite::Connection;

use crate::auth::Subject;
use crate::db::queries;
use crate::errors::AppError;

/// The set of properties a caller may act on, computed once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyScope {
    /// A single property: property tokens always, owner tokens when the
    /// request names a property.
    Exact(String),
    /// Every property owned by this owner.
    OwnerAll(String),
}

/// Resolve the acting scope from a verified subject.
///
/// Property tokens scope to the id baked into the token, never to client
/// input. Owner tokens may name a property (validated against the join
/// table) or omit it to act across all owned properties.
pub fn resolve_property_scope(
    conn: &Connection,
    subject: &Subject,
    explicit_property_id: Option<&str>,
) -> Result<PropertyScope, AppError> {
    match subject {
        Subject::Property { property_id, .. } => {
            if queries::get_property(conn, property_id)?.is_none() {
                return Err(AppError::NotFound("Property not found".to_string()));
            }
            Ok(PropertyScope::Exact(property_id.clone()))
        }
        Subject::Owner { owner_id, .. } => match explicit_property_id {
            Some(property_id) => {
                if !queries::owner_owns_property(conn, owner_id, property_id)? {
                    return Err(AppError::Forbidden(
                        "Access denied. You do not own this property.".to_string(),
                    ));
                }
                Ok(PropertyScope::Exact(property_id.to_string()))
            }
            None => Ok(PropertyScope::OwnerAll(owner_id.clone())),
        },
        _ => Err(AppError::Unauthorized(
            "Authentication required - no valid property or owner token found".to_string(),
        )),
    }
}

/// Expand a scope into concrete property ids. May be empty for an owner
/// with no linked properties.
pub fn scope_property_ids(
    conn: &Connection,
    scope: &PropertyScope,
) -> Result<Vec<String>, AppError> {
    match scope {
        PropertyScope::Exact(id) => Ok(vec![id.clone()]),
        PropertyScope::OwnerAll(owner_id) => {
            Ok(queries::get_owner_property_ids(conn, owner_id)?)
        }
    }
}
