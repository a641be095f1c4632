// SPDX-License-Identifier: GPL-3.0-or-later

use crate::data::ValidationError;
use std::borrow::Cow;
use thiserror::Error;

/// Enumeration of the error types raised by the data module.
#[derive(Debug, Error)]
pub enum DataError {
    /// JSON serialization / deserialization error.
    #[error("JSON error: {0}")]
    JSON(
        #[doc(hidden)]
        #[from]
        serde_json::Error,
    ),

    /// Malformed UUID error.
    #[error("UUID error: {0:?}")]
    UUID(
        #[doc(hidden)]
        #[from]
        uuid::Error,
    ),

    /// Date, time and timestamp parsing error.
    #[error("Date-Time error: {0}")]
    Time(
        #[doc(hidden)]
        #[from]
        chrono::format::ParseError,
    ),

    /// Invalid Language Tag error.
    #[error("Language Tag error: {0:?}")]
    LanguageTag(
        #[doc(hidden)]
        #[from]
        language_tags::ParseError,
    ),

    /// Language Tag validation error.
    #[error("Language Tag validation error: {0:?}")]
    LTValidationError(
        #[doc(hidden)]
        #[from]
        language_tags::ValidationError,
    ),

    /// General validation error.
    #[error("{0}")]
    Validation(
        #[doc(hidden)]
        #[from]
        ValidationError,
    ),

    /// Unexpected runtime error.
    #[error("Runtime error: {0}")]
    Runtime(#[doc(hidden)] Cow<'static, str>),
}
