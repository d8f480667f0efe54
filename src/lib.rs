//! A tiny typed relational store over PostgreSQL.
//!
//! A record type describes how it maps onto one table through [`Relational`]
//! (usually derived), and a [`RelationalStore`] gives typed CRUD over that table
//! through any [`Gateway`].

extern crate self as relstore;

pub mod config;
pub use config::PgConfig;

pub mod gateway;
pub use gateway::{ColumnInfo, Gateway, Statement};

pub mod pg;
pub use pg::PgGateway;

pub mod record;
pub use record::{Column, Relational};

pub mod result;
pub use result::{DbResult, StoreError};

pub mod schema;
pub use schema::TableSchema;

pub mod sql;

pub mod store;
pub use store::RelationalStore;

pub mod value;
pub use value::{FromValue, ToValue, Value};

#[cfg(any(test, feature = "derive"))]
pub use relstore_derive::Relational;
