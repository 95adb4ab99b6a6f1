use crate::error::JsonApiError;
use crate::resource::{AsAny, Resource, ResourceType};
use serde_json::Value;
use std::any::TypeId;
use std::collections::HashMap;

type DecodeFn = fn(Value) -> Result<Box<dyn Resource>, serde_json::Error>;
type EncodeFn = fn(&dyn Resource) -> Option<Result<Value, serde_json::Error>>;

/// A native type registered under a type name.
#[derive(Clone)]
pub struct TypeEntry {
    type_name: String,
    declared: &'static str,
    type_id: TypeId,
    decode: DecodeFn,
    encode: EncodeFn,
}

impl TypeEntry {
    fn of<T: ResourceType>(type_name: String) -> Self {
        TypeEntry {
            type_name,
            declared: T::TYPE,
            type_id: TypeId::of::<T>(),
            decode: decode_attributes::<T>,
            encode: encode_attributes::<T>,
        }
    }

    /// The name this entry is registered under.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The type name the native type declares for itself.
    pub fn declared(&self) -> &'static str {
        self.declared
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Materializes a native instance from an `attributes` object.
    pub(crate) fn decode(&self, attributes: Value) -> Result<Box<dyn Resource>, serde_json::Error> {
        (self.decode)(attributes)
    }

    /// Serializes the attributes of `resource`; `None` if it is not of this entry's type.
    pub(crate) fn encode(&self, resource: &dyn Resource) -> Option<Result<Value, serde_json::Error>> {
        (self.encode)(resource)
    }
}

impl std::fmt::Debug for TypeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeEntry")
            .field("type_name", &self.type_name)
            .field("declared", &self.declared)
            .finish_non_exhaustive()
    }
}

fn decode_attributes<T: ResourceType>(
    attributes: Value,
) -> Result<Box<dyn Resource>, serde_json::Error> {
    let resource: T = serde_json::from_value(attributes)?;
    Ok(Box::new(resource))
}

fn encode_attributes<T: ResourceType>(
    resource: &dyn Resource,
) -> Option<Result<Value, serde_json::Error>> {
    let resource = AsAny::as_any(resource).downcast_ref::<T>()?;
    Some(serde_json::to_value(resource))
}

/// Maps type names to native resource types.
///
/// Immutable once built; share it between any number of decode/encode passes.
#[derive(Debug, Clone)]
pub struct Registry {
    by_name: HashMap<String, TypeEntry>,
    by_type: HashMap<TypeId, String>,
    allow_unregistered_types: bool,
    strict_types: bool,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The entry registered under `type_name`, or `None` if the name is unregistered.
    pub fn resolve(&self, type_name: &str) -> Option<&TypeEntry> {
        self.by_name.get(type_name)
    }

    /// The entry of the native type `type_id`; the first registration wins.
    pub fn resolve_native(&self, type_id: TypeId) -> Option<&TypeEntry> {
        let name = self.by_type.get(&type_id)?;
        self.by_name.get(name)
    }

    /// The name `T` is registered under.
    pub fn type_name_of<T: Resource>(&self) -> Option<&str> {
        self.by_type.get(&TypeId::of::<T>()).map(String::as_str)
    }

    pub fn allows_unregistered_types(&self) -> bool {
        self.allow_unregistered_types
    }

    pub fn strict_types(&self) -> bool {
        self.strict_types
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry {
            by_name: HashMap::new(),
            by_type: HashMap::new(),
            allow_unregistered_types: true,
            strict_types: false,
        }
    }
}

/// Collects registrations and policies; validation happens in [`RegistryBuilder::build`].
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    entries: Vec<TypeEntry>,
    allow_unregistered_types: bool,
    strict_types: bool,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        RegistryBuilder {
            entries: Vec::new(),
            allow_unregistered_types: true,
            strict_types: false,
        }
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under `type_name`.
    #[must_use]
    pub fn register<T: ResourceType>(mut self, type_name: impl Into<String>) -> Self {
        self.entries.push(TypeEntry::of::<T>(type_name.into()));
        self
    }

    /// Registers `T` under the type name it declares.
    #[must_use]
    pub fn register_type<T: ResourceType>(self) -> Self {
        self.register::<T>(T::TYPE)
    }

    /// When disabled, decoding a resource of an unknown type fails instead of
    /// producing a generic resource object. Enabled by default.
    #[must_use]
    pub fn allow_unregistered_types(mut self, allow: bool) -> Self {
        self.allow_unregistered_types = allow;
        self
    }

    /// When enabled, decoded and encoded type names must equal the declared type
    /// name of the native type. Disabled by default.
    #[must_use]
    pub fn strict_types(mut self, enabled: bool) -> Self {
        self.strict_types = enabled;
        self
    }

    /// Validates the registrations and builds the registry.
    ///
    /// # Errors
    /// Returns a configuration error if a type name is blank or is registered for
    /// two different native types.
    pub fn build(self) -> Result<Registry, JsonApiError> {
        let mut registry = Registry {
            allow_unregistered_types: self.allow_unregistered_types,
            strict_types: self.strict_types,
            ..Registry::default()
        };

        for entry in self.entries {
            if entry.type_name.trim().is_empty() {
                return Err(JsonApiError::configuration(format!(
                    "Type name registered for '{}' is blank. \
                     The values of type members MUST adhere to the same constraints as member names.",
                    entry.declared
                )));
            }

            if let Some(existing) = registry.by_name.get(&entry.type_name) {
                if existing.type_id == entry.type_id {
                    continue;
                }
                return Err(JsonApiError::configuration(format!(
                    "Type name '{}' is already registered for a different type (declared as '{}').",
                    entry.type_name, existing.declared
                )));
            }

            log::debug!(
                "registering resource type '{}' (declared '{}')",
                entry.type_name,
                entry.declared
            );
            registry
                .by_type
                .entry(entry.type_id)
                .or_insert_with(|| entry.type_name.clone());
            registry.by_name.insert(entry.type_name.clone(), entry);
        }

        Ok(registry)
    }
}
