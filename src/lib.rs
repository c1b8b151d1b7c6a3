//! Bibliothekar: a minimal file-backed document store.
//!
//! Clients create named collections, each declaring the fields to be
//! indexed; documents added to a collection are queryable by
//! exact-match values on those fields, receiving the intersection of
//! per-field matches. Entry point: [`core::repository::Repository`].

pub mod core;
pub mod storage;
pub mod collection;
pub mod index;
pub mod document;
pub mod query;
