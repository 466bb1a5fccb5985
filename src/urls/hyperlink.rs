use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

use super::priority::Priority13;

/// Creation counter; ties between equal deadlines are broken by creation order
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn next_sequence() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// Position of a URL in every ordered structure of the frontier
///
/// URLs with an earlier deadline come first; URLs without a deadline come after
/// every URL that has one, in creation order.
pub type OrderKey = (i64, u64);

/// A URL with scheduling metadata.
///
/// The URL is validated and canonicalized on construction. The identity is a
/// content hash of the URL without its fragment, so `page#a` and `page#b`
/// share one identity under the non-reentrant and n-reentrant policies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Hyperlink {
    spec: String,
    #[serde(default)]
    args: String,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    deadline: Option<DateTime<Utc>>,
    identity: u64,
    #[serde(skip, default = "next_sequence")]
    sequence: u64,
}

impl Hyperlink {
    pub fn parse(input: &str) -> Result<Self> {
        let parsed = Url::parse(input).context("Failed to parse URL")?;
        let identity = Self::identity_of(&parsed);
        Ok(Self {
            spec: parsed.as_str().to_string(),
            args: String::new(),
            priority: Priority13::NORMAL.value(),
            deadline: None,
            identity,
            sequence: next_sequence(),
        })
    }

    fn identity_of(url: &Url) -> u64 {
        let mut url = url.clone();
        url.set_fragment(None);
        xxhash_rust::xxh3::xxh3_64(url.as_str().as_bytes())
    }

    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<i32>) -> Self {
        self.priority = priority.into();
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_args(mut self, args: impl Into<String>) -> Self {
        self.args = args.into();
        self
    }

    /// Append load arguments, space separated
    pub fn append_args(&mut self, args: &str) {
        if args.is_empty() {
            return;
        }
        if !self.args.is_empty() {
            self.args.push(' ');
        }
        self.args.push_str(args);
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn as_str(&self) -> &str {
        &self.spec
    }

    pub fn args(&self) -> &str {
        &self.args
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn identity(&self) -> u64 {
        self.identity
    }

    pub fn order_key(&self) -> OrderKey {
        let deadline = self.deadline.map_or(i64::MAX, |d| d.timestamp_millis());
        (deadline, self.sequence)
    }

    /// True once the deadline has passed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|d| d < now)
    }

    pub fn host(&self) -> Option<String> {
        Url::parse(&self.spec)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

impl PartialEq for Hyperlink {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity && self.spec == other.spec
    }
}

impl Eq for Hyperlink {}

impl Hash for Hyperlink {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl fmt::Display for Hyperlink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spec)
    }
}

impl FromStr for Hyperlink {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for Hyperlink {
    fn as_ref(&self) -> &str {
        &self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_parse_canonicalizes() {
        let link = Hyperlink::parse("HTTPS://Example.com").unwrap();
        assert_eq!(link.spec(), "https://example.com/");
        assert!(Hyperlink::parse("not a url").is_err());
    }

    #[test]
    fn test_identity_ignores_fragment() {
        let a = Hyperlink::parse("https://example.com/page#one").unwrap();
        let b = Hyperlink::parse("https://example.com/page#two").unwrap();
        let c = Hyperlink::parse("https://example.com/other").unwrap();
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a.identity(), c.identity());
    }

    #[test]
    fn test_order_key_deadline_first() {
        let now = Utc::now();
        let late = Hyperlink::parse("https://example.com/a")
            .unwrap()
            .with_deadline(now + Duration::hours(2));
        let early = Hyperlink::parse("https://example.com/b")
            .unwrap()
            .with_deadline(now + Duration::hours(1));
        let none = Hyperlink::parse("https://example.com/c").unwrap();
        assert!(early.order_key() < late.order_key());
        assert!(late.order_key() < none.order_key());
    }

    #[test]
    fn test_expired() {
        let now = Utc::now();
        let link = Hyperlink::parse("https://example.com/")
            .unwrap()
            .with_deadline(now - Duration::seconds(1));
        assert!(link.is_expired(now));
        assert!(!Hyperlink::parse("https://example.com/").unwrap().is_expired(now));
    }

    #[test]
    fn test_append_args() {
        let mut link = Hyperlink::parse("https://example.com/").unwrap().with_args("-i 1d");
        link.append_args("-taskId 7");
        assert_eq!(link.args(), "-i 1d -taskId 7");
        link.append_args("");
        assert_eq!(link.args(), "-i 1d -taskId 7");
    }

    #[test]
    fn test_serde_keeps_identity() {
        let link = Hyperlink::parse("https://example.com/x")
            .unwrap()
            .with_priority(Priority13::HIGHER);
        let json = serde_json::to_string(&link).unwrap();
        let back: Hyperlink = serde_json::from_str(&json).unwrap();
        assert_eq!(back, link);
        assert_eq!(back.priority(), 1000);
    }
}
