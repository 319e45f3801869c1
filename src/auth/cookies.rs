//! Session cookie jar.

use std::collections::BTreeMap;
use std::fmt;

/// Cookies sent with every call to the web frontend.
///
/// Only names and values are tracked: every cookie the service issues is scoped
/// to the Google domains the client talks to.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    /// Creates an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a cookie, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    /// Returns a cookie value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Removes a cookie.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.cookies.remove(name)
    }

    /// Number of cookies held.
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Returns true when no cookie is held.
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Merges one `Set-Cookie` header value, returning the cookie name.
    ///
    /// A cookie expired through `Max-Age=0` is removed instead.
    pub fn merge_set_cookie(&mut self, header: &str) -> Option<String> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let expired = parts.any(|attr| {
            attr.split_once('=')
                .is_some_and(|(k, v)| k.trim().eq_ignore_ascii_case("max-age") && v.trim() == "0")
        });
        if expired {
            self.cookies.remove(name);
        } else {
            self.cookies.insert(name.to_string(), value.trim().to_string());
        }
        Some(name.to_string())
    }

    /// Builds the `Cookie` request header value.
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Copies the cookies into a plain map.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.cookies.clone()
    }
}

impl fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieJar")
            .field("names", &self.cookies.keys().collect::<Vec<_>>())
            .finish()
    }
}
