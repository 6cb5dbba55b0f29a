use thiserror::Error;

use crate::model::ids::AgentId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AgentError {
    #[error("agent name cannot be empty")]
    EmptyName,

    #[error("agent email is not plausible: {0}")]
    InvalidEmail(String),
}

//
// ─── ROLE ──────────────────────────────────────────────────────────────────────
//

/// Portal role for an agent.
///
/// Managers may see cross-agent aggregations (analytics, full rankings);
/// field agents only see their own history plus the public leaderboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    /// Field worker: own data only.
    Agent,
    /// Supervisor: full cross-agent visibility.
    Manager,
}

impl AgentRole {
    /// Parses the storage representation of a role.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "agent" => Some(Self::Agent),
            "manager" => Some(Self::Manager),
            _ => None,
        }
    }

    /// Storage representation of the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AgentRole::Agent => "agent",
            AgentRole::Manager => "manager",
        }
    }
}

//
// ─── AGENT ─────────────────────────────────────────────────────────────────────
//

/// A field worker or manager using the portal.
///
/// Identity is supplied by the external authentication collaborator; the core
/// only keeps what aggregations need (name for denormalized snapshots, role
/// for visibility gating).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    id: AgentId,
    name: String,
    email: String,
    role: AgentRole,
}

impl Agent {
    /// Creates a new Agent.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::EmptyName` if the name is empty or whitespace-only,
    /// `AgentError::InvalidEmail` if the email lacks the minimal `a@b` shape.
    pub fn new(
        id: AgentId,
        name: impl Into<String>,
        email: impl Into<String>,
        role: AgentRole,
    ) -> Result<Self, AgentError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AgentError::EmptyName);
        }

        let email = email.into().trim().to_owned();
        if !is_plausible_email(&email) {
            return Err(AgentError::InvalidEmail(email));
        }

        Ok(Self {
            id,
            name: name.trim().to_owned(),
            email,
            role,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn role(&self) -> AgentRole {
        self.role
    }

    /// True when this agent may view cross-agent aggregation views.
    #[must_use]
    pub fn is_manager(&self) -> bool {
        self.role == AgentRole::Manager
    }
}

// Minimal shape check; real address validation belongs to the admin boundary.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_new_happy_path() {
        let agent = Agent::new(
            AgentId::new(1),
            "  Silva  ",
            " silva.agente@example.org ",
            AgentRole::Agent,
        )
        .unwrap();

        assert_eq!(agent.id(), AgentId::new(1));
        assert_eq!(agent.name(), "Silva");
        assert_eq!(agent.email(), "silva.agente@example.org");
        assert!(!agent.is_manager());
    }

    #[test]
    fn agent_rejects_empty_name() {
        let err = Agent::new(AgentId::new(1), "   ", "a@b.org", AgentRole::Agent).unwrap_err();
        assert_eq!(err, AgentError::EmptyName);
    }

    #[test]
    fn agent_rejects_implausible_email() {
        for bad in ["", "no-at-sign", "@missing.local", "local@nodot"] {
            let err = Agent::new(AgentId::new(1), "Silva", bad, AgentRole::Agent).unwrap_err();
            assert!(matches!(err, AgentError::InvalidEmail(_)), "{bad}");
        }
    }

    #[test]
    fn role_round_trips_storage_form() {
        for role in [AgentRole::Agent, AgentRole::Manager] {
            assert_eq!(AgentRole::from_str_opt(role.as_str()), Some(role));
        }
        assert_eq!(AgentRole::from_str_opt("gestor"), None);
    }
}
