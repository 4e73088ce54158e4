//! One bridge per resource family, each translating idiomatic operations
//! into dispatcher calls and parsing the replies into records.
//!
//! Every record keeps a clone of the bridge that produced it, so
//! `record.update(..)` and friends route back through the same dispatcher
//! without the caller passing the bridge around.

pub mod clients;
pub mod general;
pub mod invoices;
pub mod orders;
pub mod products;
pub mod promotions;
pub mod tickets;
