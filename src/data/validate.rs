// SPDX-License-Identifier: GPL-3.0-or-later

use std::borrow::Cow;
use thiserror::Error;

/// An error that denotes a validation constraint violation not covered by
/// JSON-Schema validation (C1) — i.e. the cross-field invariants of spec
/// §3/§4.5 such as voiding rules and hash cross-checks.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required value was absent.
    #[error("Missing field: '{0}'")]
    MissingField(Cow<'static, str>),

    /// A constraint specific to xAPI semantics was violated.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(Cow<'static, str>),
}
