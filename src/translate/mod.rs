//! Translation Interface Module
//!
//! The translation engine itself is an external service; this module owns
//! the boundary to it: the `Translator` interface, the production HTTP
//! client, and the source-document repository workers read from.
//!
//! ## Submodules
//! - **`types`**: Source and translated document records.
//! - **`source`**: The work-root repository of source documents (one JSON
//!   file per document id).
//! - **`client`**: The `Translator` trait and the HTTP-backed engine client.

pub mod types;
pub mod source;
pub mod client;

#[cfg(test)]
mod tests;
