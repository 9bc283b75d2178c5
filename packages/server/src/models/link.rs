use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use common::IdentityHash;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::entity::link;
use crate::error::AppError;

/// Maximum length of the raw `link` text, in characters.
pub const MAX_CONTENT_CHARS: usize = 160;
/// Maximum length of a description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 512;
/// Length of a link identifier in hex characters.
pub const LINK_ID_HEX_LEN: usize = 24;

/// Request body for `POST /newlink`.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct CreateLinkRequest {
    /// A URL or free text (at most 160 characters). Required, may be empty
    /// or `null` when a description is given.
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(example = "https://www.rust-lang.org/", nullable)]
    pub link: Option<String>,
    /// Free text (at most 512 characters).
    #[schema(example = "Rust homepage")]
    pub description: Option<String>,
}

/// Request body for `PUT /editlink`.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct EditLinkRequest {
    /// 24-character hex identifier of the link to replace.
    #[schema(example = "65f1c0de9a3b4c5d6e7f8a9b")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(nullable)]
    pub link: Option<String>,
    pub description: Option<String>,
}

/// `None` only when the field is absent; an explicit `null` reads as `""`.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|v| Some(v.unwrap_or_default()))
}

/// Request body for `POST /deletelink`.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct DeleteLinkRequest {
    #[schema(example = "65f1c0de9a3b4c5d6e7f8a9b")]
    pub id: Option<String>,
}

/// The client-visible projection of a stored link.
///
/// The owner hash and creation time never leave the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromQueryResult, utoipa::ToSchema)]
pub struct LinkResponse {
    #[schema(example = "65f1c0de9a3b4c5d6e7f8a9b")]
    pub id: String,
    #[schema(example = "https://www.rust-lang.org/")]
    pub content: String,
    #[serde(rename = "isLink")]
    pub is_link: bool,
    #[schema(example = "Rust homepage")]
    pub description: String,
}

impl From<link::Model> for LinkResponse {
    fn from(m: link::Model) -> Self {
        Self {
            id: m.id,
            content: m.content,
            is_link: m.is_link,
            description: m.description,
        }
    }
}

/// Identifier of a stored link: 12 bytes rendered as 24 lowercase hex characters.
///
/// Laid out like a MongoDB ObjectId: big-endian creation time in seconds, five
/// random bytes fixed for the process, then a three-byte counter. Ids from one
/// process therefore sort in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkId(String);

static PROCESS_TAG: LazyLock<[u8; 5]> = LazyLock::new(rand::random);
static COUNTER: LazyLock<AtomicU32> =
    LazyLock::new(|| AtomicU32::new(rand::random::<u32>() & 0x00ff_ffff));

impl LinkId {
    pub fn generate() -> Self {
        let secs = Utc::now().timestamp() as u32;
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_TAG);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(hex::encode(bytes))
    }

    /// Accepts exactly 24 hex digits in either case.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        if raw.len() != LINK_ID_HEX_LEN || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AppError::Validation(format!(
                "id must be {LINK_ID_HEX_LEN} hex characters"
            )));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// Parse an optional request field; absence is a validation failure.
    pub fn from_field(raw: Option<&str>) -> Result<Self, AppError> {
        match raw {
            Some(raw) => Self::parse(raw),
            None => Err(AppError::Validation("id is required".into())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully populated record about to be written.
///
/// Built server-side from the request, so it can only ever carry these five
/// fields.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkDraft {
    pub identity_hash: String,
    pub content: String,
    pub is_link: bool,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl LinkDraft {
    /// Normalise raw request fields into a record owned by `identity`.
    ///
    /// `link` must be present (it may be empty); a missing description is
    /// stored as empty. A record with neither content nor description is
    /// refused.
    pub fn from_input(
        identity: &IdentityHash,
        link: Option<String>,
        description: Option<String>,
    ) -> Result<Self, AppError> {
        let Some(content) = link else {
            return Err(AppError::Validation("link is required".into()));
        };
        let description = description.unwrap_or_default();
        if content.is_empty() && description.is_empty() {
            return Err(AppError::Validation(
                "link and description are both empty".into(),
            ));
        }

        Ok(Self {
            identity_hash: identity.to_hex(),
            is_link: is_web_uri(&content),
            content,
            description,
            created_at: Utc::now(),
        })
    }

    pub fn validate(&self) -> Result<(), AppError> {
        IdentityHash::from_hex(&self.identity_hash)
            .map_err(|e| AppError::Validation(format!("identity hash: {e}")))?;
        if self.content.chars().count() > MAX_CONTENT_CHARS {
            return Err(AppError::Validation(format!(
                "link must be at most {MAX_CONTENT_CHARS} characters"
            )));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(AppError::Validation(format!(
                "description must be at most {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
        Ok(())
    }
}

/// Whether `value` is a well-formed absolute `http` or `https` URI with a host.
///
/// Stricter than `Url::parse`, which silently repairs input: characters
/// outside the RFC 3986 set, broken percent escapes and a missing `//`
/// authority all disqualify the value. So do a non-numeric port and an empty
/// host after userinfo.
pub fn is_web_uri(value: &str) -> bool {
    const ALLOWED_PUNCT: &str = ":/?#[]@!$&'()*+,;=.-_~%";

    if value.is_empty()
        || !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ALLOWED_PUNCT.contains(c))
    {
        return false;
    }

    let bytes = value.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'%'
            && !(bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit))
        {
            return false;
        }
    }

    let Some((scheme, rest)) = value.split_once(':') else {
        return false;
    };
    if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
        return false;
    }
    let Some(after_slashes) = rest.strip_prefix("//") else {
        return false;
    };
    let authority_end = after_slashes
        .find(['/', '?', '#'])
        .unwrap_or(after_slashes.len());
    if authority_end == 0 {
        return false;
    }

    match Url::parse(value) {
        Ok(url) => url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}
