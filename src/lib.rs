//! Mirror a photo library's catalog into SQLite and browse it.
//!
//! The [`sync`] module reconciles a [`source::CatalogSource`] against the
//! [`db`] store; [`serve`] exposes the mirrored catalog over HTTP.

pub mod config;
pub mod db;
pub mod logging;
pub mod serve;
pub mod source;
pub mod sync;
