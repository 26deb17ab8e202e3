//! The errors encountered in this crate.
//!
//! Everything is surfaced as a [`failure::Error`]. Errors coming out of a
//! builder or provider are never wrapped by the crawler, so callers can
//! `downcast_ref()` to whatever type the provider raised.

use failure::Error;
use reqwest::StatusCode;

/// None of the registered builders recognised the configured root URL.
#[derive(Debug, Clone, PartialEq, Fail)]
#[fail(display = "Nothing is matching the root url [{}]", root_url)]
pub struct NoMatchingProvider {
    pub root_url: String,
}

/// A provider recognised the options, but couldn't make sense of the root
/// URL.
#[derive(Debug, Clone, PartialEq, Fail)]
#[fail(display = "\"{}\" is not a valid root url ({})", root_url, reason)]
pub struct InvalidRootUrl {
    pub root_url: String,
    pub reason: String,
}

/// An organisation, repository, or file path which can't be turned into a
/// request without changing its meaning.
#[derive(Debug, Clone, PartialEq, Fail)]
#[fail(display = "Invalid path \"{}\" ({})", path, reason)]
pub struct InvalidPath {
    pub path: String,
    pub reason: String,
}

/// The server responded with a non-successful status code.
#[derive(Debug, Clone, PartialEq, Fail)]
#[fail(display = "Request to {} failed with {}", url, status)]
pub struct FailedRequest {
    pub status: StatusCode,
    pub url: String,
}

pub(crate) fn is_not_found(err: &Error) -> bool {
    err.downcast_ref::<FailedRequest>()
        .map(|f| f.status == StatusCode::NOT_FOUND)
        .unwrap_or(false)
}
