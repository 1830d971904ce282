//! Capability checks
//!
//! A [`CapabilityService`] decides whether an actor may perform an
//! [`Action`] on a node. A document without one places no restrictions.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{NotionError, Result};
use crate::node::NodeId;

/// Something an actor can do to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Dump,
    Read,
    Create,
    Modify,
    Delete,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Dump,
        Action::Read,
        Action::Create,
        Action::Modify,
        Action::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dump => "dump",
            Self::Read => "read",
            Self::Create => "create",
            Self::Modify => "modify",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The account (and optionally the person) a session acts for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<String>,
}

impl Actor {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            person: None,
        }
    }

    pub fn with_person(account: impl Into<String>, person: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            person: Some(person.into()),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.person {
            Some(person) => write!(f, "{} ({})", self.account, person),
            None => f.write_str(&self.account),
        }
    }
}

/// Authorization collaborator
pub trait CapabilityService: Send + Sync {
    /// Admit an actor to a document
    fn authenticate(&self, actor: &Actor) -> Result<()>;

    /// Whether `actor` may perform `action` on `node`
    fn allow(&self, actor: &Actor, node: NodeId, action: Action) -> bool;
}

/// Grants everything to everyone
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl CapabilityService for AllowAll {
    fn authenticate(&self, _actor: &Actor) -> Result<()> {
        Ok(())
    }

    fn allow(&self, _actor: &Actor, _node: NodeId, _action: Action) -> bool {
        true
    }
}

/// Table of actions granted per account
///
/// Grants can be document-wide or scoped to a single node. A node-scoped
/// grant replaces the document-wide one for that node. Accounts with no
/// grants at all fail authentication.
#[derive(Debug, Clone, Default)]
pub struct ActionGrants {
    global: HashMap<String, HashSet<Action>>,
    scoped: HashMap<(String, NodeId), HashSet<Action>>,
    blocked: HashSet<String>,
}

impl ActionGrants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant actions on every node
    pub fn grant(
        mut self,
        account: impl Into<String>,
        actions: impl IntoIterator<Item = Action>,
    ) -> Self {
        self.global
            .entry(account.into())
            .or_default()
            .extend(actions);
        self
    }

    /// Grant actions on one node only
    pub fn grant_on(
        mut self,
        account: impl Into<String>,
        node: NodeId,
        actions: impl IntoIterator<Item = Action>,
    ) -> Self {
        self.scoped
            .entry((account.into(), node))
            .or_default()
            .extend(actions);
        self
    }

    /// Refuse authentication for an account regardless of grants
    pub fn block(mut self, account: impl Into<String>) -> Self {
        self.blocked.insert(account.into());
        self
    }

    fn knows(&self, account: &str) -> bool {
        self.global.contains_key(account) || self.scoped.keys().any(|(a, _)| a == account)
    }
}

impl CapabilityService for ActionGrants {
    fn authenticate(&self, actor: &Actor) -> Result<()> {
        let reason = if self.blocked.contains(&actor.account) {
            "account is blocked"
        } else if !self.knows(&actor.account) {
            "no grants for account"
        } else {
            return Ok(());
        };
        Err(NotionError::Unauthenticated {
            account: actor.account.clone(),
            reason: reason.to_string(),
        })
    }

    fn allow(&self, actor: &Actor, node: NodeId, action: Action) -> bool {
        if self.blocked.contains(&actor.account) {
            return false;
        }
        if let Some(actions) = self.scoped.get(&(actor.account.clone(), node)) {
            return actions.contains(&action);
        }
        self.global
            .get(&actor.account)
            .is_some_and(|actions| actions.contains(&action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_action_names() {
        let names: Vec<_> = Action::ALL.iter().map(|a| a.to_string()).collect();
        assert_eq!(names, ["dump", "read", "create", "modify", "delete"]);
    }

    #[test]
    fn test_allow_all() {
        let caps = AllowAll;
        let actor = Actor::new("anyone");
        assert!(caps.authenticate(&actor).is_ok());
        assert!(caps.allow(&actor, NodeId::ROOT, Action::Delete));
    }

    #[test]
    fn test_grants_global() {
        let caps = ActionGrants::new().grant("reader", [Action::Read, Action::Dump]);
        let reader = Actor::new("reader");

        assert!(caps.authenticate(&reader).is_ok());
        assert!(caps.allow(&reader, NodeId::new(5), Action::Read));
        assert!(!caps.allow(&reader, NodeId::new(5), Action::Modify));
    }

    #[test]
    fn test_grants_scoped_override() {
        let caps = ActionGrants::new()
            .grant("editor", [Action::Read])
            .grant_on("editor", NodeId::new(3), [Action::Read, Action::Modify]);
        let editor = Actor::with_person("editor", "Paul");

        assert!(caps.allow(&editor, NodeId::new(3), Action::Modify));
        assert!(!caps.allow(&editor, NodeId::new(4), Action::Modify));
    }

    #[test]
    fn test_authentication_failures() {
        let caps = ActionGrants::new()
            .grant("mallory", Action::ALL)
            .block("mallory");

        let err = caps.authenticate(&Actor::new("mallory")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        assert!(!caps.allow(&Actor::new("mallory"), NodeId::ROOT, Action::Read));

        let err = caps.authenticate(&Actor::new("stranger")).unwrap_err();
        assert!(err.to_string().contains("no grants"));
    }
}
