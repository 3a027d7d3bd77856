// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use super::StageError;

struct Entry {
    value: Box<dyn Any + Send + Sync>,
    changed: bool,
}

/// A type-map carrying port values between stages.
///
/// Each entry carries a change flag. Producers set it when they write a new
/// value; consumers read it with [`has_changed`](StageContext::has_changed) to
/// skip work when nothing moved. [`Pipeline`](super::Pipeline) clears every
/// flag at the end of a frame.
///
/// ```rust,ignore
/// let mut ctx = StageContext::new();
/// ctx.publish(Viewport::new(800, 600));
/// assert!(ctx.has_changed::<Viewport>());
/// ```
#[derive(Default)]
pub struct StageContext {
    data: HashMap<TypeId, Entry>,
}

impl StageContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, keyed by its concrete type, and marks it changed.
    pub fn insert<T: 'static + Send + Sync>(&mut self, value: T) {
        self.data.insert(
            TypeId::of::<T>(),
            Entry {
                value: Box::new(value),
                changed: true,
            },
        );
    }

    /// Stores a value, marking it changed only if it differs from the value
    /// already present. Returns whether it was marked.
    pub fn publish<T: 'static + Send + Sync + PartialEq>(&mut self, value: T) -> bool {
        match self.data.get_mut(&TypeId::of::<T>()) {
            Some(entry) => {
                let differs = entry.value.downcast_ref::<T>() != Some(&value);
                if differs {
                    entry.value = Box::new(value);
                    entry.changed = true;
                }
                differs
            }
            None => {
                self.insert(value);
                true
            }
        }
    }

    /// Returns a shared reference to a value by type.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.data.get(&TypeId::of::<T>())?.value.downcast_ref()
    }

    /// Returns a mutable reference to a value by type. Does not touch the
    /// change flag.
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.data.get_mut(&TypeId::of::<T>())?.value.downcast_mut()
    }

    /// Like [`get`](Self::get), failing with [`StageError::InvalidContext`]
    /// when the value is absent.
    pub fn require<T: 'static>(&self) -> Result<&T, StageError> {
        self.get().ok_or_else(|| StageError::missing(type_name::<T>()))
    }

    /// Checks whether a value of the given type is present.
    pub fn contains<T: 'static>(&self) -> bool {
        self.data.contains_key(&TypeId::of::<T>())
    }

    /// Removes and returns a value by type.
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.data
            .remove(&TypeId::of::<T>())
            .and_then(|e| e.value.downcast().ok().map(|b| *b))
    }

    /// Whether the value of type `T` was written since the last
    /// [`clear_changes`](Self::clear_changes). `false` when absent.
    pub fn has_changed<T: 'static>(&self) -> bool {
        self.data
            .get(&TypeId::of::<T>())
            .is_some_and(|e| e.changed)
    }

    /// Resets every change flag.
    pub fn clear_changes(&mut self) {
        for entry in self.data.values_mut() {
            entry.changed = false;
        }
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the context holds no value.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for StageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageContext")
            .field("entries", &self.data.len())
            .finish()
    }
}
