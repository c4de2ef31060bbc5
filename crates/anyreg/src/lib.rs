//! Type-tagged envelopes: register Rust types under type URLs, marshal values into
//! [`AnyValue`] envelopes, and decode envelopes back into concrete values.
//!
//! ```ignore
//! let registry = Registry::new();
//! registry.register::<Ping>("sys/Ping@1");
//! let any = registry.marshal_any(&Ping { seq: 1 })?;
//! let ping = registry.unmarshal_any(&any)?.unwrap().downcast::<Ping>();
//! ```

mod any;
mod error;
mod marshal;
mod registry;

pub use any::{AnyValue, Envelope, LegacyAny, Message};
pub use anyreg_cbor::{DynMessage, MessageCatalog, TypeCatalog, global_catalog, wkt};
pub use error::{RegistryError, RegistryResult};
pub use registry::{Registry, RegistryOptions};

macro_rules! well_known_messages {
    ($($ty:ty),+ $(,)?) => {
        $(impl Message for $ty {})+
    };
}

well_known_messages! {
    wkt::Timestamp,
    wkt::Duration,
    wkt::Empty,
    wkt::StringValue,
    wkt::BytesValue,
    wkt::BoolValue,
    wkt::Int64Value,
}
