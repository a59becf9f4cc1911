//! Actor identity as resolved by the upstream auth gateway.
//!
//! Session/token resolution happens outside this service. By the time a
//! request reaches a handler, the gateway has already authenticated the
//! caller and forwarded their identity; this module only models who the
//! caller is and what standing they have.

use thiserror::Error;
use uuid::Uuid;

/// Role of the calling actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A candidate (first or second party on a suggestion).
    Party,
    /// A matchmaker stewarding suggestions.
    Matchmaker,
    /// Platform administrator.
    Admin,
    /// Internal caller (sweeps, maintenance). Never accepted from HTTP.
    System,
}

impl Role {
    /// Parse a role forwarded by the auth gateway. `system` is deliberately
    /// not parseable: internal callers construct actors directly.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "party" => Some(Role::Party),
            "matchmaker" => Some(Role::Matchmaker),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    /// Actor used by internal periodic sweeps.
    pub fn system() -> Self {
        Self {
            id: Uuid::nil(),
            role: Role::System,
        }
    }

    /// Administrators and internal callers may override normal standing checks.
    pub fn is_privileged(&self) -> bool {
        matches!(self.role, Role::Admin | Role::System)
    }

    pub fn is_matchmaker(&self) -> bool {
        matches!(self.role, Role::Matchmaker)
    }
}

/// Authorization errors for the platform.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("authentication required")]
    AuthenticationRequired,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("matchmaker or administrator role required")]
    MatchmakerRequired,
}
