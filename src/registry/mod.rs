//! Variable registry: the build-time mapping from human-readable
//! control/telemetry names to stable 1-byte wire IDs and their type
//! metadata.
//!
//! The registry is built once from a declarative list and consumed
//! read-only at runtime by the transport and the code generators.

mod assign;
mod codegen;
mod version;

pub use assign::{ID_MAX, ID_MIN, assign_ids, fnv1a8};
pub use codegen::{generate_firmware_header, generate_host_table};
pub use version::ProtocolVersion;

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::protocol::VariableType;

/// Registry construction errors. Fatal at build time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// More names than assignable IDs.
    #[error("variable ID space exhausted: capacity {capacity}")]
    IdSpaceExhausted {
        /// Number of assignable IDs.
        capacity: usize,
    },

    /// The same name was declared twice.
    #[error("duplicate variable name: {name}")]
    DuplicateName {
        /// The offending name.
        name: String,
    },

    /// Two names sanitize to the same generated constant identifier.
    #[error("names {first} and {second} both generate identifier {ident}")]
    IdentCollision {
        /// First colliding name in sorted order.
        first: String,
        /// Second colliding name in sorted order.
        second: String,
        /// The shared sanitized identifier.
        ident: String,
    },
}

/// One registered quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    /// Stable 1-byte wire ID.
    pub id: u8,
    /// Human-readable name.
    pub key: String,
    /// Declared wire type.
    pub vtype: VariableType,
}

impl Variable {
    /// Size in bytes for fixed-width variables, `None` for
    /// length-delimited ones.
    #[must_use]
    pub const fn fixed_size(&self) -> Option<u8> {
        self.vtype.fixed_size()
    }
}

/// Immutable name/ID/type table shared by the host-side stack.
#[derive(Debug, Clone)]
pub struct VariableRegistry {
    version: ProtocolVersion,
    by_id: BTreeMap<u8, Variable>,
    by_name: HashMap<String, u8>,
}

impl VariableRegistry {
    /// Build a registry from `(name, type)` declarations.
    ///
    /// Declaration order does not matter; ID assignment is driven by
    /// the lexicographically sorted names.
    pub fn build(
        declarations: &[(&str, VariableType)],
        version: ProtocolVersion,
    ) -> Result<Self, RegistryError> {
        let mut types: HashMap<&str, VariableType> = HashMap::with_capacity(declarations.len());
        for (name, vtype) in declarations {
            if types.insert(*name, *vtype).is_some() {
                return Err(RegistryError::DuplicateName {
                    name: (*name).to_owned(),
                });
            }
        }

        let mut names: Vec<&str> = types.keys().copied().collect();
        names.sort_unstable();

        // Distinct names may still sanitize to the same generated
        // identifier ("arm-pos" and "arm_pos" both become ARM_POS),
        // which would silently shadow a constant in the emitted
        // artifacts. Reject that at build time.
        let mut idents: HashMap<String, &str> = HashMap::with_capacity(names.len());
        for name in &names {
            let ident = codegen::const_ident(name);
            if let Some(previous) = idents.insert(ident.clone(), *name) {
                return Err(RegistryError::IdentCollision {
                    first: previous.to_owned(),
                    second: (*name).to_owned(),
                    ident,
                });
            }
        }

        let mut by_id = BTreeMap::new();
        let mut by_name = HashMap::with_capacity(declarations.len());
        for (key, id) in assign_ids(&names)? {
            let vtype = types[key.as_str()];
            by_name.insert(key.clone(), id);
            by_id.insert(id, Variable { id, key, vtype });
        }

        Ok(Self {
            version,
            by_id,
            by_name,
        })
    }

    /// The build stamp embedded in generated artifacts.
    #[must_use]
    pub const fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Look a variable up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.by_name.get(name).and_then(|id| self.by_id.get(id))
    }

    /// Look a variable up by wire ID.
    #[must_use]
    pub fn by_id(&self, id: u8) -> Option<&Variable> {
        self.by_id.get(&id)
    }

    /// Iterate variables in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.by_id.values()
    }

    /// Number of registered variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_registry() -> VariableRegistry {
        VariableRegistry::build(
            &[
                ("motor_left", VariableType::I16Le),
                ("motor_right", VariableType::I16Le),
                ("battery_mv", VariableType::U16Le),
                ("led_on", VariableType::Bool),
                ("status_text", VariableType::Str),
            ],
            ProtocolVersion::new(20250831093000),
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_both_ways() {
        let registry = test_registry();
        let var = registry.get("battery_mv").unwrap();
        assert_eq!(var.key, "battery_mv");
        assert_eq!(var.vtype, VariableType::U16Le);
        assert_eq!(registry.by_id(var.id).unwrap().key, "battery_mv");
    }

    #[test]
    fn test_declaration_order_irrelevant() {
        let registry = test_registry();
        let shuffled = VariableRegistry::build(
            &[
                ("led_on", VariableType::Bool),
                ("status_text", VariableType::Str),
                ("motor_right", VariableType::I16Le),
                ("battery_mv", VariableType::U16Le),
                ("motor_left", VariableType::I16Le),
            ],
            registry.version(),
        )
        .unwrap();
        for var in registry.iter() {
            assert_eq!(shuffled.by_id(var.id).unwrap(), var);
        }
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = VariableRegistry::build(
            &[
                ("led_on", VariableType::Bool),
                ("led_on", VariableType::U8),
            ],
            ProtocolVersion::new(0),
        );
        assert!(matches!(result, Err(RegistryError::DuplicateName { .. })));
    }

    #[test]
    fn test_colliding_generated_idents_rejected() {
        let result = VariableRegistry::build(
            &[
                ("arm-pos", VariableType::U8),
                ("arm_pos", VariableType::U8),
            ],
            ProtocolVersion::new(0),
        );
        assert_eq!(
            result.unwrap_err(),
            RegistryError::IdentCollision {
                first: "arm-pos".into(),
                second: "arm_pos".into(),
                ident: "ARM_POS".into(),
            }
        );
    }

    #[test]
    fn test_iteration_is_id_ordered() {
        let registry = test_registry();
        let ids: Vec<u8> = registry.iter().map(|v| v.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }
}
