use std::{
    any::TypeId,
    collections::HashMap,
    fmt,
    sync::Arc,
};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{DynMessage, from_cbor, schema_name_from_url, wkt};

/// Allocates a fresh instance of a message type from its encoded bytes.
pub type DecodeFn = fn(&[u8]) -> Result<DynMessage, serde_cbor::Error>;

/// Decodes `bytes` as `T` and erases the result. Coerces to [`DecodeFn`].
pub fn decode_boxed<T>(bytes: &[u8]) -> Result<DynMessage, serde_cbor::Error>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let value: T = from_cbor(bytes)?;
    Ok(Box::new(value))
}

/// A message type known to a catalog.
#[derive(Clone)]
pub struct CatalogEntry {
    name: &'static str,
    type_id: TypeId,
    rust_type: &'static str,
    decode: DecodeFn,
}

impl CatalogEntry {
    pub fn of<T>(name: &'static str) -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            name,
            type_id: TypeId::of::<T>(),
            rust_type: std::any::type_name::<T>(),
            decode: decode_boxed::<T>,
        }
    }

    /// Fully-qualified schema name, e.g. `google.protobuf.Timestamp`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn rust_type(&self) -> &'static str {
        self.rust_type
    }

    /// Allocate and decode a new instance of this entry's type.
    pub fn decode(&self, bytes: &[u8]) -> Result<DynMessage, serde_cbor::Error> {
        (self.decode)(bytes)
    }

    pub fn decoder(&self) -> DecodeFn {
        self.decode
    }
}

impl fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("name", &self.name)
            .field("rust_type", &self.rust_type)
            .finish()
    }
}

/// Directory of schema-described message types, keyed by fully-qualified name.
pub trait TypeCatalog: Send + Sync {
    /// Finds an entry by fully-qualified schema name.
    fn find(&self, name: &str) -> Option<&CatalogEntry>;

    /// Fully-qualified schema name of a cataloged Rust type.
    fn schema_name(&self, type_id: TypeId) -> Option<&'static str>;

    /// Finds an entry by type URL; only the segment after the last `/` is significant.
    fn find_by_url(&self, type_url: &str) -> Option<&CatalogEntry> {
        self.find(schema_name_from_url(type_url))
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("schema name '{0}' is cataloged more than once")]
    DuplicateName(&'static str),
    #[error("type {rust_type} is cataloged as both '{existing}' and '{name}'")]
    DuplicateType {
        rust_type: &'static str,
        existing: &'static str,
        name: &'static str,
    },
}

/// Immutable catalog built once and shared across registries.
#[derive(Debug, Default)]
pub struct MessageCatalog {
    entries: IndexMap<&'static str, CatalogEntry>,
    by_type: HashMap<TypeId, usize>,
}

impl MessageCatalog {
    pub fn builder() -> MessageCatalogBuilder {
        MessageCatalogBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }
}

impl TypeCatalog for MessageCatalog {
    fn find(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    fn schema_name(&self, type_id: TypeId) -> Option<&'static str> {
        self.by_type
            .get(&type_id)
            .and_then(|idx| self.entries.get_index(*idx))
            .map(|(name, _)| *name)
    }
}

#[derive(Debug, Default)]
pub struct MessageCatalogBuilder {
    entries: Vec<CatalogEntry>,
}

impl MessageCatalogBuilder {
    /// Adds a message type under its fully-qualified schema name.
    pub fn message<T>(mut self, name: &'static str) -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.entries.push(CatalogEntry::of::<T>(name));
        self
    }

    pub fn build(self) -> Result<MessageCatalog, CatalogError> {
        let mut catalog = MessageCatalog::default();
        for entry in self.entries {
            if catalog.entries.contains_key(entry.name) {
                return Err(CatalogError::DuplicateName(entry.name));
            }
            if let Some(existing) = catalog.schema_name(entry.type_id) {
                return Err(CatalogError::DuplicateType {
                    rust_type: entry.rust_type,
                    existing,
                    name: entry.name,
                });
            }
            let type_id = entry.type_id;
            let (idx, _) = catalog.entries.insert_full(entry.name, entry);
            catalog.by_type.insert(type_id, idx);
        }
        Ok(catalog)
    }
}

static GLOBAL_CATALOG: Lazy<Arc<MessageCatalog>> = Lazy::new(|| {
    let catalog = wkt::register_well_known(MessageCatalog::builder())
        .build()
        .expect("well-known message catalog must be consistent");
    tracing::debug!(entries = catalog.len(), "initialized global message catalog");
    Arc::new(catalog)
});

/// Process-wide catalog of the well-known message types.
pub fn global_catalog() -> Arc<MessageCatalog> {
    Arc::clone(&GLOBAL_CATALOG)
}
