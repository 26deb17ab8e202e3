use failure::{Error, ResultExt};
use log::Level;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, LINK};
use reqwest::Url;
use sec::Secret;
use serde::Deserialize;
use std::marker::PhantomData;
use std::sync::{Mutex, PoisonError};
use std::vec::IntoIter;

use crate::errors::{FailedRequest, InvalidPath};
use crate::Options;

pub(crate) const USER_AGENT: &str = concat!("project-crawler/", env!("CARGO_PKG_VERSION"));

/// How requests should be authenticated.
#[derive(Debug, Clone)]
pub(crate) enum Auth {
    Anonymous,
    Header {
        name: &'static str,
        prefix: &'static str,
        value: Secret<String>,
    },
    Basic {
        username: String,
        password: Option<Secret<String>>,
    },
}

impl Auth {
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match *self {
            Auth::Anonymous => request,
            Auth::Header {
                name,
                prefix,
                ref value,
            } => request.header(name, format!("{}{}", prefix, value.reveal())),
            Auth::Basic {
                ref username,
                ref password,
            } => request.basic_auth(username, password.as_ref().map(|p| p.reveal())),
        }
    }

    /// Scrub the credentials out of some text before it gets logged.
    pub fn redact(&self, text: &str) -> String {
        match self.secret().filter(|s| !s.is_empty()) {
            Some(secret) => text.replace(secret, "XXXXXXXXXX"),
            None => text.to_string(),
        }
    }

    fn secret(&self) -> Option<&str> {
        match *self {
            Auth::Anonymous => None,
            Auth::Header { ref value, .. } => Some(value.reveal().as_str()),
            Auth::Basic { ref password, .. } => {
                password.as_ref().map(|p| p.reveal().as_str())
            }
        }
    }
}

lazy_static! {
    static ref SHARED_CLIENT: Mutex<Option<Client>> = Mutex::new(None);
}

#[cfg(test)]
static CLIENTS_CREATED: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

/// Get a handle to the HTTP client shared by every provider.
///
/// Providers are rebuilt on every crawler call, so the client (and the
/// runtime thread behind it) is created once and cloned from then on.
pub(crate) fn http_client() -> Result<Client, Error> {
    let mut shared = SHARED_CLIENT.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(ref client) = *shared {
        return Ok(client.clone());
    }

    debug!("Creating the HTTP client");
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Unable to create the HTTP client")?;
    #[cfg(test)]
    CLIENTS_CREATED.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

    *shared = Some(client.clone());
    Ok(client)
}

/// Make sure an organisation or repository name can be used as a single
/// path segment.
pub(crate) fn check_identifier<'a>(what: &str, value: &'a str) -> Result<&'a str, Error> {
    let reason = if value.is_empty() {
        Some("it is empty")
    } else if value.contains('/') {
        Some("it contains a \"/\"")
    } else if value == "." || value == ".." {
        Some("it is a relative path component")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(InvalidPath {
            path: value.to_string(),
            reason: format!("not a valid {} name, {}", what, reason),
        }
        .into()),
        None => Ok(value),
    }
}

/// Split a repository-relative file path into its segments, refusing
/// anything which would be normalised into a different file.
pub(crate) fn file_path_segments(file_path: &str) -> Result<Vec<&str>, Error> {
    let segments: Vec<&str> = file_path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        return Err(InvalidPath {
            path: file_path.to_string(),
            reason: String::from("no file was given"),
        }
        .into());
    }

    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(InvalidPath {
            path: file_path.to_string(),
            reason: String::from("\".\" and \"..\" aren't allowed"),
        }
        .into());
    }

    Ok(segments)
}

/// Make sure the root URL has a trailing slash so `Url::join()` appends to
/// it instead of replacing its last segment.
pub(crate) fn parse_root_url(options: &Options) -> Result<Url, Error> {
    let mut url = Url::parse(&options.root_url).map_err(|e| {
        crate::errors::InvalidRootUrl {
            root_url: options.root_url.clone(),
            reason: e.to_string(),
        }
    })?;

    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(crate::errors::InvalidRootUrl {
            root_url: options.root_url.clone(),
            reason: String::from("the url has no host"),
        }
        .into());
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Append some path segments to a base URL, percent-encoding each one.
pub(crate) fn endpoint<'a, I>(base: &Url, segments: I) -> Url
where
    I: IntoIterator<Item = &'a str>,
{
    let mut url = base.clone();

    // the caller has already checked this URL can be a base
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }

    url
}

/// Send a `GET` request, turning any non-successful status code into a
/// [`FailedRequest`].
pub(crate) fn send(
    client: &Client,
    auth: &Auth,
    url: Url,
    accept: &str,
) -> Result<Response, Error> {
    debug!("Sending request to {}", url);

    let request = auth
        .apply(client.get(url.clone()).header(ACCEPT, accept))
        .build()
        .context("Generated invalid request. This is a bug.")?;

    if log_enabled!(Level::Trace) {
        let redacted_header = auth.redact(&format!("Request Headers {:#?}", request.headers()));

        for line in redacted_header.lines() {
            trace!("{}", line);
        }
    }

    let response = client
        .execute(request)
        .context("Unable to send request")?;

    let status = response.status();
    debug!("Received response ({})", status);

    if log_enabled!(Level::Trace) {
        for line in format!("Response Headers {:#?}", response.headers()).lines() {
            trace!("{}", line);
        }
    }

    if !status.is_success() {
        warn!("Request to {} failed with {}", url, status);

        let err = FailedRequest {
            status,
            url: url.to_string(),
        };

        return Err(err.into());
    }

    Ok(response)
}

/// Iterate over every item in a paginated JSON array, following the
/// `rel="next"` entry in each response's `Link` header.
pub(crate) struct Paginated<I>
where
    I: for<'de> Deserialize<'de>,
{
    client: Client,
    auth: Auth,
    accept: &'static str,
    _phantom: PhantomData<I>,
    next_endpoint: Option<Url>,
    items: IntoIter<I>,
}

impl<I> Paginated<I>
where
    for<'de> I: Deserialize<'de>,
{
    pub fn new(client: Client, auth: Auth, accept: &'static str, endpoint: Url) -> Self {
        Paginated {
            client,
            auth,
            accept,
            _phantom: PhantomData,
            next_endpoint: Some(endpoint),
            items: Vec::new().into_iter(),
        }
    }

    fn send_request(&mut self, endpoint: Url) -> Result<Vec<I>, Error> {
        let response = send(&self.client, &self.auth, endpoint, self.accept)?;

        self.next_endpoint = response
            .headers()
            .get(LINK)
            .and_then(|link| link.to_str().ok())
            .and_then(next_link)
            .and_then(|link| Url::parse(link).ok());

        let got = response
            .json()
            .context("Unable to deserialize response")?;

        Ok(got)
    }
}

impl<I> Iterator for Paginated<I>
where
    for<'de> I: Deserialize<'de>,
{
    type Item = Result<I, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(next_item) = self.items.next() {
                return Some(Ok(next_item));
            }

            let next_endpoint = self.next_endpoint.take()?;

            match self.send_request(next_endpoint) {
                // an empty page may still link to another one
                Ok(values) => self.items = values.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Find the URL marked `rel="next"` in a `Link` header.
pub(crate) fn next_link(header: &str) -> Option<&str> {
    header.split(',').filter_map(parse_link_value).find_map(|(url, rels)| {
        if rels.split_whitespace().any(|rel| rel == "next") {
            Some(url)
        } else {
            None
        }
    })
}

fn parse_link_value(value: &str) -> Option<(&str, &str)> {
    let mut pieces = value.split(';');
    let url = pieces.next()?.trim();
    let url = url.trim_start_matches('<').trim_end_matches('>');

    let rels = pieces.map(str::trim).find_map(|param| {
        let mut kv = param.splitn(2, '=');
        match (kv.next()?.trim(), kv.next()) {
            ("rel", Some(rels)) => Some(rels.trim().trim_matches('"')),
            _ => None,
        }
    })?;

    Some((url, rels))
}
