//! # Adapters Layer
//!
//! Secondary adapters for the wallet ledger: address book, snapshot
//! persistence and API gateway queries.

pub mod address_book;
pub mod api_handler;
pub mod persistence;

pub use address_book::SharedAddressBook;
pub use api_handler::{handle_api_query, ApiGatewayHandler, ApiQueryError};
pub use persistence::{FileSnapshotStore, InMemoryPersistence, NoPersistence};
