use thiserror::Error;

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The value is neither an envelope, a registered type, nor a cataloged message.
    #[error("type {rust_type}: not found")]
    NotRegistered { rust_type: &'static str },
    /// Neither the registry nor the catalog knows this type URL.
    #[error("type with url {type_url}: not found")]
    UnknownTypeUrl { type_url: String },
    #[error("failed to encode {type_url}: {source}")]
    Encode {
        type_url: String,
        #[source]
        source: serde_cbor::Error,
    },
    #[error("failed to decode {type_url}: {source}")]
    Decode {
        type_url: String,
        #[source]
        source: serde_cbor::Error,
    },
    #[error("can't unmarshal type \"{envelope}\" to output \"{target}\"")]
    TypeMismatch { envelope: String, target: String },
}

impl RegistryError {
    /// True when a type or type URL has no known mapping.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::NotRegistered { .. } | RegistryError::UnknownTypeUrl { .. }
        )
    }
}
