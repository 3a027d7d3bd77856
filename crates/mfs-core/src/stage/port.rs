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

use std::any::{type_name, TypeId};

/// A named, typed port of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortDecl {
    /// Port name, used to match producers and consumers.
    pub name: &'static str,
    /// Type of the value carried in the [`StageContext`](super::StageContext).
    pub type_id: TypeId,
    /// Type name, for diagnostics.
    pub type_name: &'static str,
    /// Whether a consumer may run without a producer.
    pub optional: bool,
}

impl PortDecl {
    /// A port that must be connected.
    pub fn required<T: 'static>(name: &'static str) -> Self {
        Self {
            name,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            optional: false,
        }
    }

    /// An input port that may stay unconnected.
    pub fn optional<T: 'static>(name: &'static str) -> Self {
        Self {
            optional: true,
            ..Self::required::<T>(name)
        }
    }

    /// Whether both ports carry the same value type.
    pub fn same_type(&self, other: &PortDecl) -> bool {
        self.type_id == other.type_id
    }
}
