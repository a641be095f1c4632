// SPDX-License-Identifier: GPL-3.0-or-later

#![doc = "The data layer: identity model, schema validator, the generic\nStatement accessor, and the language-map canonicalizer."]

pub mod canonical;
mod data_error;
pub mod identity;
pub mod language_tag;
pub mod schema;
pub mod statement;
pub mod timestamp;
pub mod validate;

pub use data_error::DataError;
pub use language_tag::MyLanguageTag;
pub use statement::Statement;
pub use timestamp::MyTimestamp;
pub use validate::ValidationError;
