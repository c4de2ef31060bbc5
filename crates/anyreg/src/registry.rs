use std::{
    any::{TypeId, type_name},
    fmt,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use anyreg_cbor::{
    DEFAULT_TYPE_URL_PREFIX, DecodeFn, TypeCatalog, catalog::decode_boxed, global_catalog,
};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Message, RegistryError, RegistryResult};

/// Registry configuration; hosts typically embed this in their own config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryOptions {
    /// Joined with a cataloged schema name to form the type URL of unregistered messages.
    pub type_url_prefix: String,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            type_url_prefix: DEFAULT_TYPE_URL_PREFIX.to_string(),
        }
    }
}

struct Registration {
    type_url: String,
    aliases: Vec<String>,
    rust_type: &'static str,
    decode: DecodeFn,
}

/// Maps Rust types to type URLs and back.
///
/// Populate it during startup with [`Registry::register`]; every other method only takes
/// the shared lock, so a registry is cheap to consult from many threads. Type URLs the
/// registry does not know are resolved through the injected [`TypeCatalog`].
pub struct Registry {
    types: RwLock<IndexMap<TypeId, Registration>>,
    catalog: Arc<dyn TypeCatalog>,
    options: RegistryOptions,
}

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

impl Registry {
    /// Empty registry backed by the global well-known catalog.
    pub fn new() -> Self {
        Self::with_catalog(global_catalog())
    }

    pub fn with_catalog(catalog: Arc<dyn TypeCatalog>) -> Self {
        Self::with_options(RegistryOptions::default(), catalog)
    }

    pub fn with_options(options: RegistryOptions, catalog: Arc<dyn TypeCatalog>) -> Self {
        Self {
            types: RwLock::new(IndexMap::new()),
            catalog,
            options,
        }
    }

    /// Lazily-initialized process-wide registry for hosts that do not inject their own.
    pub fn global() -> &'static Registry {
        &GLOBAL_REGISTRY
    }

    /// Registers `T` under `type_url`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is already registered under a different type URL.
    pub fn register<T: Message>(&self, type_url: impl Into<String>) {
        self.register_with_aliases::<T>(type_url, std::iter::empty::<String>());
    }

    /// Registers `T` under a canonical `type_url` plus alternate names.
    ///
    /// The canonical URL is what marshaling emits and what unmarshaling matches; aliases are
    /// recorded with the registration and only participate in the consistency check.
    ///
    /// # Panics
    ///
    /// Panics if `T` is already registered with a different URL or alias list. Two parts of
    /// a program disagreeing about a type's wire identity is a configuration bug.
    pub fn register_with_aliases<T: Message>(
        &self,
        type_url: impl Into<String>,
        aliases: impl IntoIterator<Item = impl Into<String>>,
    ) {
        let type_url = type_url.into();
        let aliases: Vec<String> = aliases.into_iter().map(Into::into).collect();
        let rust_type = type_name::<T>();

        let mut types = self.write_types();
        if let Some(existing) = types.get(&TypeId::of::<T>()) {
            if existing.type_url == type_url && existing.aliases == aliases {
                return;
            }
            let existing_url = existing.type_url.clone();
            let existing_aliases = existing.aliases.clone();
            // release the lock so the panic does not poison it
            drop(types);
            panic!(
                "type {rust_type} is already registered as {existing_url:?} \
                 (aliases {existing_aliases:?}); cannot register it as {type_url:?} \
                 (aliases {aliases:?})"
            );
        }

        debug!(%type_url, rust_type, aliases = aliases.len(), "registered type");
        types.insert(
            TypeId::of::<T>(),
            Registration {
                type_url,
                aliases,
                rust_type,
                decode: decode_boxed::<T>,
            },
        );
    }

    /// Type URL for `value`.
    ///
    /// Envelopes report their own type URL. Other values resolve through the registry and
    /// then the catalog.
    pub fn type_url<M: Message>(&self, value: &M) -> RegistryResult<String> {
        if let Some(envelope) = value.as_envelope() {
            return Ok(envelope.type_url().to_owned());
        }
        self.type_url_of::<M>()
    }

    /// Type URL for the type `T` itself, without envelope pass-through.
    pub fn type_url_of<T: 'static>(&self) -> RegistryResult<String> {
        let type_id = TypeId::of::<T>();
        if let Some(registration) = self.read_types().get(&type_id) {
            return Ok(registration.type_url.clone());
        }
        match self.catalog.schema_name(type_id) {
            Some(name) => Ok(format!("{}{}", self.options.type_url_prefix, name)),
            None => Err(RegistryError::NotRegistered {
                rust_type: type_name::<T>(),
            }),
        }
    }

    /// Aliases recorded for `T`, if it is registered.
    pub fn aliases<T: 'static>(&self) -> Option<Vec<String>> {
        self.read_types()
            .get(&TypeId::of::<T>())
            .map(|registration| registration.aliases.clone())
    }

    pub fn len(&self) -> usize {
        self.read_types().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_types().is_empty()
    }

    /// Finds the decoder for `type_url`: registered types first, in registration order,
    /// then the catalog.
    pub(crate) fn resolve_url(&self, type_url: &str) -> RegistryResult<DecodeFn> {
        {
            let types = self.read_types();
            if let Some(registration) = types.values().find(|r| r.type_url == type_url) {
                return Ok(registration.decode);
            }
        }

        match self.catalog.find_by_url(type_url) {
            Some(entry) => {
                debug!(
                    type_url,
                    schema = entry.name(),
                    rust_type = entry.rust_type(),
                    "resolved type url through catalog"
                );
                Ok(entry.decoder())
            }
            None => Err(RegistryError::UnknownTypeUrl {
                type_url: type_url.to_owned(),
            }),
        }
    }

    fn read_types(&self) -> RwLockReadGuard<'_, IndexMap<TypeId, Registration>> {
        self.types.read().expect("type registry lock poisoned")
    }

    fn write_types(&self) -> RwLockWriteGuard<'_, IndexMap<TypeId, Registration>> {
        self.types.write().expect("type registry lock poisoned")
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types = self.read_types();
        f.debug_struct("Registry")
            .field(
                "types",
                &types
                    .values()
                    .map(|r| (r.rust_type, r.type_url.as_str()))
                    .collect::<Vec<_>>(),
            )
            .field("options", &self.options)
            .finish()
    }
}
