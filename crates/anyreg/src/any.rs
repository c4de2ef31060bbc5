use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Anything carrying a type URL plus an opaque payload.
///
/// The engine only ever talks to envelopes through this trait, so older and newer wire
/// shapes can be handed in interchangeably.
pub trait Envelope {
    fn type_url(&self) -> &str;
    fn value(&self) -> &[u8];

    /// True for an absent envelope (e.g. `None`); unmarshaling it yields nothing.
    fn is_absent(&self) -> bool {
        false
    }
}

/// A value the registry can marshal into an envelope.
///
/// Implement with an empty body for plain data types. Envelope types override
/// [`Message::as_envelope`] so that marshaling them passes their contents through.
pub trait Message: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn as_envelope(&self) -> Option<&dyn Envelope> {
        None
    }
}

/// Current envelope representation (type URL + payload).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnyValue {
    pub type_url: String,
    #[serde(with = "serde_bytes")]
    pub value: Vec<u8>,
}

impl AnyValue {
    pub fn new(type_url: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }

    /// Copies any envelope into the current representation. The payload is never shared.
    pub fn from_envelope<E: Envelope + ?Sized>(envelope: &E) -> Self {
        Self {
            type_url: envelope.type_url().to_owned(),
            value: envelope.value().to_vec(),
        }
    }
}

impl Envelope for AnyValue {
    fn type_url(&self) -> &str {
        &self.type_url
    }

    fn value(&self) -> &[u8] {
        &self.value
    }
}

impl Message for AnyValue {
    fn as_envelope(&self) -> Option<&dyn Envelope> {
        Some(self)
    }
}

/// Journal-era envelope shape: schema name + payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegacyAny {
    pub schema: String,
    #[serde(with = "serde_bytes")]
    pub value: Vec<u8>,
}

impl LegacyAny {
    pub fn new(schema: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            schema: schema.into(),
            value,
        }
    }
}

impl Envelope for LegacyAny {
    fn type_url(&self) -> &str {
        &self.schema
    }

    fn value(&self) -> &[u8] {
        &self.value
    }
}

impl Message for LegacyAny {
    fn as_envelope(&self) -> Option<&dyn Envelope> {
        Some(self)
    }
}

impl From<LegacyAny> for AnyValue {
    fn from(legacy: LegacyAny) -> Self {
        Self {
            type_url: legacy.schema,
            value: legacy.value,
        }
    }
}

impl<E: Envelope> Envelope for Option<E> {
    fn type_url(&self) -> &str {
        self.as_ref().map_or("", |e| e.type_url())
    }

    fn value(&self) -> &[u8] {
        match self {
            Some(e) => e.value(),
            None => &[],
        }
    }

    fn is_absent(&self) -> bool {
        self.as_ref().is_none_or(|e| e.is_absent())
    }
}

impl<E: Envelope + ?Sized> Envelope for &E {
    fn type_url(&self) -> &str {
        (**self).type_url()
    }

    fn value(&self) -> &[u8] {
        (**self).value()
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<E: Envelope + ?Sized> Envelope for Box<E> {
    fn type_url(&self) -> &str {
        (**self).type_url()
    }

    fn value(&self) -> &[u8] {
        (**self).value()
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}
