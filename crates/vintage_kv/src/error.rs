// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for backend operations.

/// An error from a key-value backend operation.
///
/// This is an opaque error type that can wrap any underlying error from a
/// backend implementation. Use [`std::error::Error::source()`] to access the
/// underlying cause if needed.
///
/// Callers in the caching layer never see this type cross the public API:
/// every backend failure degrades to the "miss"/"absent" outcome there. It
/// exists so backends have a uniform way to report what went wrong.
///
/// # Example
///
/// ```
/// use vintage_kv::Error;
///
/// let error = Error::from_message("connection reset");
/// ```
#[ohno::error]
pub struct Error {}

impl Error {
    /// Creates a new error from any type that can be converted to an error.
    ///
    /// This is the public API for creating backend errors from external crates.
    ///
    /// # Examples
    ///
    /// ```
    /// use vintage_kv::Error;
    ///
    /// let error = Error::from_message("connection reset");
    /// ```
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(cause)
    }
}

/// A specialized [`Result`] type for backend operations.
pub type Result<T> = std::result::Result<T, Error>;
