//! Canonical CBOR codec and the process-wide catalog of schema-described message types.
//!
//! This crate is the serialization framework the envelope registry delegates to: it turns
//! values into bytes, bytes back into values, and knows the fully-qualified schema name of
//! every message type it catalogs.

pub mod catalog;
pub mod wkt;

use serde::{Serialize, de::DeserializeOwned};
use serde_cbor::{ser::Write as CborWrite, value::Value as CborValue};
use std::any::Any;

pub use catalog::{
    CatalogEntry, CatalogError, DecodeFn, MessageCatalog, MessageCatalogBuilder, TypeCatalog,
    global_catalog,
};

/// Loosely-typed handle to a decoded message; callers downcast to the concrete type.
pub type DynMessage = Box<dyn Any + Send + Sync>;

/// Prefix joined with a fully-qualified schema name to form a type URL.
pub const DEFAULT_TYPE_URL_PREFIX: &str = "type.googleapis.com/";

/// Serialize a value into canonical CBOR bytes using RFC 8949 deterministic rules.
pub fn to_canonical_cbor<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_cbor::Error> {
    let mut buf = Vec::with_capacity(128);
    write_canonical_cbor(value, &mut buf)?;
    Ok(buf)
}

/// Serialize a value directly into an arbitrary CBOR writer using canonical settings.
pub fn write_canonical_cbor<T: Serialize + ?Sized, W>(
    value: &T,
    writer: W,
) -> Result<(), serde_cbor::Error>
where
    W: CborWrite,
{
    let canonical_value: CborValue = serde_cbor::value::to_value(value)?;
    let mut serializer = serde_cbor::ser::Serializer::new(writer);
    serializer.self_describe()?;
    canonical_value.serialize(&mut serializer)
}

/// Decode CBOR bytes produced by [`to_canonical_cbor`] (or any plain CBOR encoder).
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_cbor::Error> {
    serde_cbor::from_slice(bytes)
}

/// Returns the schema name portion of a type URL: everything after the last `/`.
///
/// A URL without any `/` is treated as a bare schema name.
pub fn schema_name_from_url(type_url: &str) -> &str {
    match type_url.rfind('/') {
        Some(idx) => &type_url[idx + 1..],
        None => type_url,
    }
}
