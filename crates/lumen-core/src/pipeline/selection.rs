//! Per-stage selection records and their copy-on-write slot.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::params::ParamValues;

/// What a stage does to frames passing through it.
///
/// Selections are immutable once published; every change builds a new
/// record and swaps it into the stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Selection {
    /// Pass-through.
    #[default]
    Identity,
    /// One enhancer with its current parameter values.
    Active {
        enhancer: String,
        params: ParamValues,
    },
}

impl Selection {
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }

    /// Whether `name` is the active enhancer.
    pub fn is_active(&self, name: &str) -> bool {
        matches!(self, Self::Active { enhancer, .. } if enhancer == name)
    }

    /// Name of the active enhancer, if any.
    pub fn enhancer(&self) -> Option<&str> {
        match self {
            Self::Identity => None,
            Self::Active { enhancer, .. } => Some(enhancer),
        }
    }

    /// Parameter values of the active enhancer, if any.
    pub fn params(&self) -> Option<&ParamValues> {
        match self {
            Self::Identity => None,
            Self::Active { params, .. } => Some(params),
        }
    }
}

/// A named stage holding its current selection.
///
/// Readers clone the `Arc` and drop the lock immediately, so pixel work never
/// runs under it. Writers hold the write lock only while building the next
/// record.
#[derive(Debug)]
pub struct Stage {
    name: String,
    selection: RwLock<Arc<Selection>>,
}

impl Stage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selection: RwLock::new(Arc::new(Selection::Identity)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current selection snapshot.
    pub fn selection(&self) -> Arc<Selection> {
        self.selection.read().clone()
    }

    /// Compute the next selection from the current one and publish it.
    ///
    /// `update` returns `None` to leave the stage untouched. Returns the
    /// selection in effect afterwards and whether it changed.
    pub(crate) fn update<F>(&self, update: F) -> (Arc<Selection>, bool)
    where
        F: FnOnce(&Selection) -> Option<Selection>,
    {
        let mut slot = self.selection.write();
        match update(&**slot) {
            Some(next) => {
                let next = Arc::new(next);
                *slot = Arc::clone(&next);
                (next, true)
            }
            None => (Arc::clone(&*slot), false),
        }
    }

    /// Publish `selection` unconditionally.
    pub(crate) fn replace(&self, selection: Selection) {
        *self.selection.write() = Arc::new(selection);
    }
}
