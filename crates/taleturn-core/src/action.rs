//! Offered actions.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of an action the user may choose.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    /// Creates a new action identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ActionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Returned when an action list offers the same identifier twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("action `{0}` is offered more than once")]
pub struct DuplicateAction(pub ActionId);

/// Ordered set of distinct actions offered to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActionSet(Vec<ActionId>);

impl ActionSet {
    /// Builds an action set, preserving order.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAction` if any identifier appears more than once.
    pub fn new(actions: Vec<ActionId>) -> Result<Self, DuplicateAction> {
        for (index, action) in actions.iter().enumerate() {
            if actions[..index].contains(action) {
                return Err(DuplicateAction(action.clone()));
            }
        }
        Ok(Self(actions))
    }

    /// The empty set, offered before the first turn completes.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, action: &ActionId) -> bool {
        self.0.contains(action)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ActionId] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActionId> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a ActionSet {
    type Item = &'a ActionId;
    type IntoIter = std::slice::Iter<'a, ActionId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_preserves_order() {
        let set = ActionSet::new(vec!["flee".into(), "fight".into()]).unwrap();
        let ids: Vec<&str> = set.iter().map(ActionId::as_str).collect();
        assert_eq!(ids, ["flee", "fight"]);
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let result = ActionSet::new(vec!["flee".into(), "fight".into(), "flee".into()]);
        assert_eq!(result, Err(DuplicateAction(ActionId::from("flee"))));
    }

    #[test]
    fn test_action_set_serializes_as_plain_list() {
        let set = ActionSet::new(vec!["rest".into()]).unwrap();
        assert_eq!(serde_json::to_value(&set).unwrap(), serde_json::json!(["rest"]));
    }
}
