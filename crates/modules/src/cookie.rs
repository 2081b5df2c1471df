//! Signed or encrypted cookies holding a small string map.
//!
//! Values are form-urlencoded, then protected with the `cookie` crate's jars:
//!
//! - hash key only: signed (HMAC-SHA256), the client can read but not forge the values
//! - hash and block key, or generated keys: encrypted (AES-256-GCM), the client can do neither
//!
//! Key material is expanded into the jar key with HKDF, so the hash and block strings may have any
//! length as long as together they carry at least [`MIN_KEY_MATERIAL`] bytes.
//!
//! In both modes the protected value is `name|issued|payload`: a token only verifies under the
//! cookie name it was issued for, and only until the configured max age has passed since `issued`.

use crate::config::CookieSection;
use cookie::time::{Duration, OffsetDateTime};
use cookie::{Cookie, CookieJar, Key};
use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

pub const MIN_KEY_MATERIAL: usize = 32;

/// Longest protected value accepted, browsers drop larger cookies.
pub const MAX_TOKEN_LEN: usize = 4096;

const DEFAULT_MAX_AGE: Duration = Duration::days(30);

#[derive(Error, Debug)]
pub enum CookieError {
    #[error("no cookie key configured, set a hash key or generate keys")]
    MissingKey,

    #[error("cookie key material is {len} bytes, at least {min} are required")]
    KeyTooShort { len: usize, min: usize },

    #[error("unable to encode cookie values: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),

    #[error("unable to decode cookie values: {0}")]
    Decode(#[from] serde_urlencoded::de::Error),

    #[error("cookie '{name}' failed verification")]
    Invalid { name: String },

    #[error("cookie '{name}' is {len} bytes once protected, the limit is {max}")]
    TooLong { name: String, len: usize, max: usize },

    #[error("no cookie named '{name}'")]
    NotFound { name: String },

    #[error("no value for key: {key}")]
    MissingValue { key: String },

    #[error("invalid set-cookie header: {0}")]
    Header(#[from] http::header::InvalidHeaderValue),
}

/// Key settings for [`SecureCookie`].
#[derive(Clone)]
pub struct CookieOptions {
    hash_key: Option<Vec<u8>>,
    block_key: Option<Vec<u8>>,
    generate: bool,
    max_age: Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self { hash_key: None, block_key: None, generate: false, max_age: DEFAULT_MAX_AGE }
    }
}

impl CookieOptions {
    /// Authentication key material.
    #[must_use]
    pub fn hash_key(mut self, hash: impl AsRef<[u8]>) -> Self {
        self.hash_key = Some(hash.as_ref().to_vec());
        self
    }

    /// Encryption key material, turns signed cookies into encrypted ones.
    #[must_use]
    pub fn block_key(mut self, block: impl AsRef<[u8]>) -> Self {
        self.block_key = Some(block.as_ref().to_vec());
        self
    }

    /// Random keys, cookies do not survive a restart.
    #[must_use]
    pub fn generate(mut self) -> Self {
        self.generate = true;
        self
    }

    /// How long after issue a token still decodes, 30 days unless set. Zero turns the check off.
    #[must_use]
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }
}

impl fmt::Debug for CookieOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieOptions")
            .field("hash_key", &self.hash_key.as_ref().map(Vec::len))
            .field("block_key", &self.block_key.as_ref().map(Vec::len))
            .field("generate", &self.generate)
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl From<&CookieSection> for CookieOptions {
    fn from(section: &CookieSection) -> Self {
        let mut options = CookieOptions { generate: section.generate, ..CookieOptions::default() };
        if let Some(hash) = &section.hash {
            options = options.hash_key(hash);
        }
        if let Some(block) = &section.block {
            options = options.block_key(block);
        }
        options
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    Signed,
    Encrypted,
}

#[derive(Clone)]
pub struct SecureCookie {
    key: Key,
    protection: Protection,
    max_age: Duration,
}

impl SecureCookie {
    /// Derives the jar key from `options`.
    ///
    /// Generated keys and a hash plus block key give [`Protection::Encrypted`], a hash key alone
    /// gives [`Protection::Signed`]. Fails without any key, or with less than
    /// [`MIN_KEY_MATERIAL`] bytes of material.
    pub fn new(options: CookieOptions) -> Result<Self, CookieError> {
        let max_age = options.max_age;
        if options.generate {
            return Ok(Self { key: Key::generate(), protection: Protection::Encrypted, max_age });
        }

        let hash = options.hash_key.ok_or(CookieError::MissingKey)?;
        let (material, protection) = match options.block_key {
            Some(block) => ([hash, block].concat(), Protection::Encrypted),
            None => (hash, Protection::Signed),
        };

        if material.len() < MIN_KEY_MATERIAL {
            return Err(CookieError::KeyTooShort { len: material.len(), min: MIN_KEY_MATERIAL });
        }

        Ok(Self { key: Key::derive_from(&material), protection, max_age })
    }

    pub fn protection(&self) -> Protection {
        self.protection
    }

    /// Serializes and protects `values`; the token is only valid for cookies named `name`.
    pub fn encode(&self, name: &str, values: &HashMap<String, String>) -> Result<String, CookieError> {
        self.encode_at(name, values, OffsetDateTime::now_utc())
    }

    fn encode_at(
        &self,
        name: &str,
        values: &HashMap<String, String>,
        issued: OffsetDateTime,
    ) -> Result<String, CookieError> {
        let payload = serde_urlencoded::to_string(values)?;
        let cookie = Cookie::new(name.to_owned(), format!("{name}|{}|{payload}", issued.unix_timestamp()));

        let mut jar = CookieJar::new();
        match self.protection {
            Protection::Signed => jar.signed_mut(&self.key).add(cookie),
            Protection::Encrypted => jar.private_mut(&self.key).add(cookie),
        }

        let token = jar.get(name).map(|protected| protected.value().to_owned()).ok_or_else(|| invalid(name))?;
        if token.len() > MAX_TOKEN_LEN {
            return Err(CookieError::TooLong { name: name.to_owned(), len: token.len(), max: MAX_TOKEN_LEN });
        }
        Ok(token)
    }

    /// Verifies `token` as the value of cookie `name` and returns the map it carries.
    ///
    /// A forged or tampered token, one issued for another cookie name, and one older than the
    /// max age all fail with [`CookieError::Invalid`].
    pub fn decode(&self, name: &str, token: &str) -> Result<HashMap<String, String>, CookieError> {
        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new(name.to_owned(), token.to_owned()));

        let verified = match self.protection {
            Protection::Signed => jar.signed(&self.key).get(name),
            Protection::Encrypted => jar.private(&self.key).get(name),
        };

        let Some(verified) = verified else {
            debug!(cookie = name, "cookie failed verification");
            return Err(invalid(name));
        };

        let Some((issued, payload)) = verified
            .value()
            .strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('|'))
            .and_then(|rest| rest.split_once('|'))
        else {
            debug!(cookie = name, "cookie was issued for another name");
            return Err(invalid(name));
        };

        let issued = issued
            .parse::<i64>()
            .ok()
            .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
            .ok_or_else(|| invalid(name))?;
        if !self.max_age.is_zero() && OffsetDateTime::now_utc() - issued > self.max_age {
            debug!(cookie = name, issued = issued.unix_timestamp(), "cookie expired");
            return Err(invalid(name));
        }

        Ok(serde_urlencoded::from_str(payload)?)
    }

    /// Appends a `Set-Cookie` header holding the protected `values`, valid for `hours`.
    pub fn add(
        &self,
        headers: &mut HeaderMap,
        name: &str,
        hours: u32,
        values: &HashMap<String, String>,
    ) -> Result<(), CookieError> {
        let lifetime = Duration::hours(i64::from(hours));
        let cookie = Cookie::build((name.to_owned(), self.encode(name, values)?))
            .path("/")
            .max_age(lifetime)
            .expires(OffsetDateTime::now_utc() + lifetime)
            .http_only(false)
            .build();

        headers.append(SET_COOKIE, HeaderValue::try_from(cookie.to_string())?);
        Ok(())
    }

    /// Appends a `Set-Cookie` header telling the client to drop `name`.
    pub fn delete(headers: &mut HeaderMap, name: &str) -> Result<(), CookieError> {
        let mut cookie = Cookie::build((name.to_owned(), "")).path("/").build();
        cookie.make_removal();

        headers.append(SET_COOKIE, HeaderValue::try_from(cookie.to_string())?);
        Ok(())
    }

    /// Reads and decodes the cookie `name` from the request headers.
    pub fn get(&self, headers: &HeaderMap, name: &str) -> Result<HashMap<String, String>, CookieError> {
        let cookie = find_cookie(headers, name)?;
        self.decode(name, cookie.value())
    }

    /// Like [`SecureCookie::get`], but returns the values of `keys` in order.
    pub fn get_values(&self, headers: &HeaderMap, name: &str, keys: &[&str]) -> Result<Vec<String>, CookieError> {
        let mut values = self.get(headers, name)?;
        keys.iter()
            .map(|key| values.remove(*key).ok_or_else(|| CookieError::MissingValue { key: (*key).to_owned() }))
            .collect()
    }
}

impl TryFrom<&CookieSection> for SecureCookie {
    type Error = CookieError;

    fn try_from(section: &CookieSection) -> Result<Self, Self::Error> {
        SecureCookie::new(CookieOptions::from(section))
    }
}

impl fmt::Debug for SecureCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureCookie")
            .field("protection", &self.protection)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

fn invalid(name: &str) -> CookieError {
    CookieError::Invalid { name: name.to_owned() }
}

fn find_cookie(headers: &HeaderMap, name: &str) -> Result<Cookie<'static>, CookieError> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(Cookie::into_owned)
        .ok_or_else(|| CookieError::NotFound { name: name.to_owned() })
}
