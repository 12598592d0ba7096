//! Action registration and visibility.
//!
//! Every stack owns an [`ActionRegistry`] mapping action ids to handlers.
//! Defining an action and publishing it are separate steps: only published
//! actions are dispatchable, so helpers and internal actions can never be
//! reached from a URL.
//!
//! # Example
//!
//! ```
//! use shortstack_core::{Format, Reply};
//! use shortstack_server::registry::{action_handler, ActionRegistry};
//!
//! let mut registry = ActionRegistry::new();
//! registry.provides(None, vec![Format::JSON]);
//! registry.define("show", action_handler(|_c| Ok(Reply::from("show"))));
//!
//! assert!(!registry.visible("show"));
//! registry.publish("show");
//! assert!(registry.visible("show"));
//! assert_eq!(registry.formats_for("show"), &[Format::JSON]);
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use shortstack_core::{ActionResult, Format, HttpError, Reply};

use crate::controller::Controller;

/// A type-erased action handler.
pub type ActionHandler = Arc<dyn Fn(&mut Controller<'_>) -> ActionResult + Send + Sync>;

/// Erases a closure into an [`ActionHandler`].
pub fn action_handler<F>(handler: F) -> ActionHandler
where
    F: Fn(&mut Controller<'_>) -> ActionResult + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// A type-erased exception handler.
///
/// Runs with the controller's status already set from the error; its reply is
/// normalized like an action's.
pub type ExceptionHandler = Arc<dyn Fn(&mut Controller<'_>, &HttpError) -> Reply + Send + Sync>;

/// A defined action.
#[derive(Clone)]
pub struct Action {
    id: String,
    handler: ActionHandler,
    formats: Vec<Format>,
}

impl Action {
    /// Action id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The handler.
    #[must_use]
    pub fn handler(&self) -> &ActionHandler {
        &self.handler
    }

    /// Declared formats, in preference order. Empty means any.
    #[must_use]
    pub fn formats(&self) -> &[Format] {
        &self.formats
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.id)
            .field("formats", &self.formats)
            .finish_non_exhaustive()
    }
}

/// Action ids to handlers, declared formats and the publish allow-list.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Action>,
    published: HashSet<String>,
    default_formats: Vec<Format>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines (or redefines) an action, unpublished.
    ///
    /// The action captures the current default formats. Redefining keeps the
    /// publish state.
    pub fn define(&mut self, id: impl Into<String>, handler: ActionHandler) {
        let id = id.into();
        let action = Action {
            id: id.clone(),
            handler,
            formats: self.default_formats.clone(),
        };
        self.actions.insert(id, action);
    }

    /// Adds `id` to the allow-list.
    pub fn publish(&mut self, id: impl Into<String>) {
        self.published.insert(id.into());
    }

    /// Defines and publishes in one step.
    pub fn define_published(&mut self, id: impl Into<String>, handler: ActionHandler) {
        let id = id.into();
        self.define(id.clone(), handler);
        self.publish(id);
    }

    /// Whether `id` is defined and published.
    #[must_use]
    pub fn visible(&self, id: &str) -> bool {
        self.published.contains(id) && self.actions.contains_key(id)
    }

    /// The action for `id`, only when it is visible.
    #[must_use]
    pub fn dispatchable(&self, id: &str) -> Option<&Action> {
        if self.published.contains(id) {
            self.actions.get(id)
        } else {
            None
        }
    }

    /// The action for `id`, published or not.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Action> {
        self.actions.get(id)
    }

    /// Declared formats for `id`; empty when unknown or undeclared.
    #[must_use]
    pub fn formats_for(&self, id: &str) -> &[Format] {
        self.actions.get(id).map_or(&[], |a| a.formats.as_slice())
    }

    /// With an id, replaces that action's formats. Without one, sets the
    /// default captured by actions defined afterwards.
    pub fn provides(&mut self, id: Option<&str>, formats: Vec<Format>) {
        match id {
            Some(id) => {
                if let Some(action) = self.actions.get_mut(id) {
                    action.formats = formats;
                } else {
                    tracing::warn!(action = id, "provides for an undefined action ignored");
                }
            }
            None => self.default_formats = formats,
        }
    }

    /// The formats new actions capture.
    #[must_use]
    pub fn default_formats(&self) -> &[Format] {
        &self.default_formats
    }

    /// Number of defined actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether no action is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(text: &'static str) -> ActionHandler {
        action_handler(move |_c| Ok(Reply::from(text)))
    }

    #[test]
    fn test_unpublished_is_invisible() {
        let mut registry = ActionRegistry::new();
        registry.define("helper", handler("nope"));
        assert!(!registry.visible("helper"));
        assert!(registry.dispatchable("helper").is_none());
        assert!(registry.get("helper").is_some());
    }

    #[test]
    fn test_published_without_definition_is_invisible() {
        let mut registry = ActionRegistry::new();
        registry.publish("ghost");
        assert!(!registry.visible("ghost"));
    }

    #[test]
    fn test_formats_captured_at_definition() {
        let mut registry = ActionRegistry::new();
        registry.define_published("before", handler("a"));
        registry.provides(None, vec![Format::JSON, Format::XML]);
        registry.define_published("after", handler("b"));

        assert!(registry.formats_for("before").is_empty());
        assert_eq!(registry.formats_for("after"), &[Format::JSON, Format::XML]);
        assert!(registry.formats_for("unknown").is_empty());
    }

    #[test]
    fn test_provides_for_one_action() {
        let mut registry = ActionRegistry::new();
        registry.provides(None, vec![Format::HTML]);
        registry.define_published("a", handler("a"));
        registry.define_published("b", handler("b"));
        registry.provides(Some("a"), vec![Format::TEXT]);

        assert_eq!(registry.formats_for("a"), &[Format::TEXT]);
        assert_eq!(registry.formats_for("b"), &[Format::HTML]);
    }

    #[test]
    fn test_redefine_keeps_publish_state() {
        let mut registry = ActionRegistry::new();
        registry.define_published("a", handler("one"));
        registry.define("a", handler("two"));
        assert!(registry.visible("a"));
        assert_eq!(registry.len(), 1);
    }
}
