//! Per-stack helper values.
//!
//! Helpers are shared values a stack makes available to its handlers,
//! looked up by type. They are never actions, so nothing routes to them.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A type-keyed set of helper values.
///
/// # Example
///
/// ```
/// use shortstack_server::helpers::Helpers;
///
/// struct SiteName(&'static str);
///
/// let mut helpers = Helpers::new();
/// helpers.insert(SiteName("pancakes"));
/// assert_eq!(helpers.get::<SiteName>().map(|s| s.0), Some("pancakes"));
/// assert!(helpers.get::<String>().is_none());
/// ```
#[derive(Clone, Default)]
pub struct Helpers {
    values: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Helpers {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a helper, replacing one of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.values.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Looks up a helper by type.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Copies in every helper of `other`, keeping ours on conflict.
    pub fn extend_missing(&mut self, other: &Self) {
        for (id, value) in &other.values {
            self.values.entry(*id).or_insert_with(|| Arc::clone(value));
        }
    }

    /// Number of helpers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are none.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Helpers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Helpers").field("len", &self.len()).finish()
    }
}
