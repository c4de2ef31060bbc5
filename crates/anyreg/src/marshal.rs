//! Marshaling values into envelopes and back.

use anyreg_cbor::{DynMessage, from_cbor, to_canonical_cbor};
use tracing::trace;

use crate::{AnyValue, Envelope, Message, Registry, RegistryError, RegistryResult};

impl Registry {
    /// Wraps `value` in a fresh [`AnyValue`].
    ///
    /// Envelopes are copied as they are, with their own payload buffer. Anything else is
    /// resolved to a type URL and encoded as canonical CBOR.
    pub fn marshal_any<M: Message>(&self, value: &M) -> RegistryResult<AnyValue> {
        if let Some(envelope) = value.as_envelope() {
            return Ok(AnyValue::from_envelope(envelope));
        }

        let type_url = self.type_url_of::<M>()?;
        let payload = to_canonical_cbor(value).map_err(|source| RegistryError::Encode {
            type_url: type_url.clone(),
            source,
        })?;
        trace!(%type_url, bytes = payload.len(), "marshaled value");
        Ok(AnyValue::new(type_url, payload))
    }

    /// Decodes an envelope into a freshly allocated value of whatever type its URL names.
    ///
    /// An absent envelope yields `Ok(None)`.
    pub fn unmarshal_any<E: Envelope + ?Sized>(
        &self,
        any: &E,
    ) -> RegistryResult<Option<DynMessage>> {
        if any.is_absent() {
            return Ok(None);
        }
        self.unmarshal_by_type_url(any.type_url(), any.value()).map(Some)
    }

    /// Decodes a raw type URL / payload pair.
    pub fn unmarshal_by_type_url(
        &self,
        type_url: &str,
        value: &[u8],
    ) -> RegistryResult<DynMessage> {
        let decode = self.resolve_url(type_url)?;
        let decoded = decode(value).map_err(|source| RegistryError::Decode {
            type_url: type_url.to_owned(),
            source,
        })?;
        trace!(type_url, bytes = value.len(), "unmarshaled value");
        Ok(decoded)
    }

    /// Decodes an envelope into `out`, which must be of the type the envelope names.
    pub fn unmarshal_to<E, M>(&self, any: &E, out: &mut M) -> RegistryResult<()>
    where
        E: Envelope + ?Sized,
        M: Message,
    {
        self.unmarshal_to_by_type_url(any.type_url(), any.value(), out)
    }

    /// Decodes a raw type URL / payload pair into `out`.
    ///
    /// Fails with [`RegistryError::TypeMismatch`] when `out`'s own type URL differs from
    /// `type_url`; `out` is left untouched on any error.
    pub fn unmarshal_to_by_type_url<M: Message>(
        &self,
        type_url: &str,
        value: &[u8],
        out: &mut M,
    ) -> RegistryResult<()> {
        self.resolve_url(type_url)?;
        let target = self.type_url(out)?;
        if target != type_url {
            return Err(RegistryError::TypeMismatch {
                envelope: type_url.to_owned(),
                target,
            });
        }

        *out = from_cbor(value).map_err(|source| RegistryError::Decode {
            type_url: type_url.to_owned(),
            source,
        })?;
        trace!(type_url, bytes = value.len(), "unmarshaled value into target");
        Ok(())
    }

    /// Whether `any` holds a value of `sample`'s type. Compares type URLs only.
    pub fn is<E, M>(&self, any: &E, sample: &M) -> bool
    where
        E: Envelope + ?Sized,
        M: Message,
    {
        if any.is_absent() {
            return false;
        }
        matches!(self.type_url(sample), Ok(url) if url == any.type_url())
    }
}
