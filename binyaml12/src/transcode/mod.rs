//! Output encodings the loader itself does not provide.

pub mod cbor;
