//! Module source address handling.
//!
//! Two separate concerns live here:
//!
//! - **Resolution** ([`subfolder`], [`is_local`]): the exact string rules
//!   used to map a `source` argument onto a directory. These are deliberately
//!   simple substring operations so that every address form found in the
//!   wild yields a predictable subfolder.
//! - **Classification** ([`SourceAddress::parse`]): a best-effort structured
//!   view of the address (registry, git, s3, ...) used for logs, diagnostics
//!   and the text report. Classification never changes where a module is
//!   loaded from.
//!
//! # Supported Source Types
//!
//! - **Local**: `./path`, `../path`, `/abs/path`
//! - **Registry**: `namespace/name/provider` or `hostname/namespace/name/provider`
//! - **Git**: `git::https://...`, `git::ssh://...`, `git@github.com:...`, `github.com/...`
//! - **Mercurial**: `hg::http://...`
//! - **HTTP**: `https://...` (archive downloads)
//! - **S3**: `s3::https://...`
//! - **GCS**: `gcs::https://...`

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Default module registry hostname.
const DEFAULT_REGISTRY: &str = "registry.terraform.io";

/// Query suffixes removed before looking for a subfolder.
const QUERY_MARKERS: &[&str] = &["?ref=", "?archive="];

/// Scheme prefixes removed before looking for a subfolder, in order.
const SCHEME_MARKERS: &[&str] = &["https://", "ssh://", "http://"];

static REGISTRY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // namespace/name/provider or hostname/namespace/name/provider
    Regex::new(r"^(?:([a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)+)/)?([a-zA-Z0-9_-]+)/([a-zA-Z0-9_-]+)/([a-zA-Z0-9_-]+)$")
        .expect("Invalid regex")
});

static GIT_SSH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // git@host:path
    Regex::new(r"^git@([^:]+):(.+?)(?:\.git)?$").expect("Invalid regex")
});

static S3_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://s3(?:[-.]([a-z0-9-]+))?\.amazonaws\.com/([^/]+)/(.+)$").expect("Invalid regex")
});

static GCS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://(?:www\.)?googleapis\.com/storage/v1/([^/]+)/(.+)$").expect("Invalid regex")
});

/// True when `source` is a filesystem path relative to (or independent of)
/// the calling module: it starts with `/`, `./` or `../`.
#[must_use]
pub fn is_local(source: &str) -> bool {
    source.starts_with('/') || source.starts_with("./") || source.starts_with("../")
}

/// Remove `?ref=` / `?archive=` suffixes and one scheme prefix per marker.
///
/// Each marker is checked independently, anywhere in the string: the part
/// before a query marker is kept, the part after a scheme marker is kept.
#[must_use]
pub fn strip_source(source: &str) -> String {
    let mut stripped = source.to_string();
    for marker in QUERY_MARKERS {
        if let Some((head, _)) = stripped.split_once(marker) {
            stripped = head.to_string();
        }
    }
    for marker in SCHEME_MARKERS {
        if stripped.contains(marker) {
            stripped = stripped.split(marker).nth(1).unwrap_or_default().to_string();
        }
    }
    stripped
}

/// Subfolder inside a fetched package: everything after the first `//` of
/// the stripped address, or an empty string.
#[must_use]
pub fn subfolder(source: &str) -> String {
    strip_source(source)
        .split_once("//")
        .map(|(_, sub)| sub.to_string())
        .unwrap_or_default()
}

/// Structured kind of a module source address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceKind {
    /// Local file path
    Local,
    /// Module registry address
    Registry {
        hostname: String,
        namespace: String,
        name: String,
        provider: String,
    },
    /// Git repository
    Git { url: String },
    /// Mercurial repository
    Mercurial { url: String },
    /// HTTP(S) archive
    Http { url: String },
    /// S3 bucket object
    S3 {
        bucket: String,
        key: String,
        region: Option<String>,
    },
    /// GCS bucket object
    Gcs { bucket: String, path: String },
    /// Anything else
    Unknown,
}

impl SourceKind {
    /// Short lowercase label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Registry { .. } => "registry",
            Self::Git { .. } => "git",
            Self::Mercurial { .. } => "hg",
            Self::Http { .. } => "http",
            Self::S3 { .. } => "s3",
            Self::Gcs { .. } => "gcs",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A classified module source address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceAddress {
    /// The address as written
    pub raw: String,
    pub kind: SourceKind,
    /// `?ref=` value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    /// `?archive=` value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
    /// Package subfolder, see [`subfolder`]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subfolder: String,
}

impl SourceAddress {
    /// Classify a source address.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tfinspect::resolver::{SourceAddress, SourceKind};
    ///
    /// let address = SourceAddress::parse("git::https://example.com/vpc.git?ref=v1.2.0");
    /// assert!(matches!(address.kind, SourceKind::Git { .. }));
    /// assert_eq!(address.git_ref.as_deref(), Some("v1.2.0"));
    ///
    /// let address = SourceAddress::parse("./local-mod");
    /// assert_eq!(address.kind, SourceKind::Local);
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        Self {
            raw: raw.to_string(),
            kind: classify(raw),
            git_ref: query_value(raw, "ref"),
            archive: query_value(raw, "archive"),
            subfolder: subfolder(raw),
        }
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        self.kind == SourceKind::Local
    }
}

impl fmt::Display for SourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.raw, self.kind)
    }
}

fn query_value(source: &str, key: &str) -> Option<String> {
    let (_, query) = source.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.split("//").next().unwrap_or(v).to_string())
}

/// Address without query string and without a `//subfolder` suffix.
fn package_address(source: &str) -> &str {
    let without_query = source.split_once('?').map_or(source, |(head, _)| head);
    let scheme_end = without_query.find("://").map_or(0, |i| i + 3);
    match without_query[scheme_end..].find("//") {
        Some(i) => &without_query[..scheme_end + i],
        None => without_query,
    }
}

fn classify(source: &str) -> SourceKind {
    if is_local(source) {
        return SourceKind::Local;
    }

    if let Some((getter, rest)) = source.split_once("::") {
        let url = package_address(rest).to_string();
        return match getter {
            "git" => SourceKind::Git { url },
            "hg" => SourceKind::Mercurial { url },
            "s3" => classify_s3(&url),
            "gcs" => classify_gcs(&url),
            "http" | "https" => SourceKind::Http { url },
            other => {
                tracing::debug!(getter = other, "Unknown source getter");
                SourceKind::Unknown
            }
        };
    }

    let address = package_address(source);

    if let Some(caps) = GIT_SSH_PATTERN.captures(address) {
        let host = caps.get(1).map_or("", |m| m.as_str());
        let path = caps.get(2).map_or("", |m| m.as_str());
        return SourceKind::Git {
            url: format!("ssh://git@{host}/{path}.git"),
        };
    }

    if address.starts_with("github.com/") || address.starts_with("bitbucket.org/") {
        return SourceKind::Git {
            url: format!("https://{address}"),
        };
    }

    if address.starts_with("http://") || address.starts_with("https://") {
        return SourceKind::Http {
            url: address.to_string(),
        };
    }

    if let Some(caps) = REGISTRY_PATTERN.captures(address) {
        let part = |i: usize| caps.get(i).map_or("", |m| m.as_str()).to_string();
        let hostname = caps
            .get(1)
            .map_or_else(|| DEFAULT_REGISTRY.to_string(), |m| m.as_str().to_string());
        return SourceKind::Registry {
            hostname,
            namespace: part(2),
            name: part(3),
            provider: part(4),
        };
    }

    tracing::debug!(source = %source, "Unknown module source format");
    SourceKind::Unknown
}

fn classify_s3(url: &str) -> SourceKind {
    match S3_PATTERN.captures(url) {
        Some(caps) => SourceKind::S3 {
            bucket: caps.get(2).map_or("", |m| m.as_str()).to_string(),
            key: caps.get(3).map_or("", |m| m.as_str()).to_string(),
            region: caps.get(1).map(|m| m.as_str().to_string()),
        },
        None => SourceKind::Http {
            url: url.to_string(),
        },
    }
}

fn classify_gcs(url: &str) -> SourceKind {
    match GCS_PATTERN.captures(url) {
        Some(caps) => SourceKind::Gcs {
            bucket: caps.get(1).map_or("", |m| m.as_str()).to_string(),
            path: caps.get(2).map_or("", |m| m.as_str()).to_string(),
        },
        None => SourceKind::Http {
            url: url.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("./consul", "" ; "local")]
    #[test_case("hashicorp/consul/aws", "" ; "registry")]
    #[test_case("app.terraform.io/example-corp/k8s-cluster/azurerm", "" ; "private registry")]
    #[test_case("github.com/hashicorp/example", "" ; "github shorthand")]
    #[test_case("git@github.com:hashicorp/example.git", "" ; "git ssh shorthand")]
    #[test_case("git::https://example.com/vpc.git", "" ; "git https")]
    #[test_case("git::ssh://username@example.com/storage.git", "" ; "git ssh")]
    #[test_case("git::https://example.com/vpc.git?ref=v1.2.0", "" ; "git ref")]
    #[test_case("git::username@example.com:storage.git", "" ; "git scp-like")]
    #[test_case("hg::http://example.com/vpc.hg?ref=v1.2.0", "" ; "mercurial")]
    #[test_case("https://example.com/vpc-module?archive=zip", "" ; "archive query")]
    #[test_case("s3::https://s3-eu-west-1.amazonaws.com/examplecorp-terraform-modules/vpc.zip", "" ; "s3")]
    #[test_case("gcs::https://www.googleapis.com/storage/v1/modules/foomodule.zip", "" ; "gcs")]
    #[test_case("hashicorp/consul/aws//modules/consul-cluster", "modules/consul-cluster" ; "registry subfolder")]
    #[test_case("git::https://example.com/network.git//modules/vpc", "modules/vpc" ; "git subfolder")]
    #[test_case("https://example.com/network-module.zip//modules/vpc", "modules/vpc" ; "http subfolder")]
    #[test_case("s3::https://s3-eu-west-1.amazonaws.com/examplecorp-terraform-modules/network.zip//modules/vpc", "modules/vpc" ; "s3 subfolder")]
    #[test_case("git::https://example.com/network.git//modules/vpc?ref=v1.0.0", "modules/vpc" ; "subfolder before ref")]
    #[test_case("hashicorp/consul/aws//modules/a//b", "modules/a//b" ; "second separator kept")]
    fn test_subfolder(source: &str, expected: &str) {
        assert_eq!(subfolder(source), expected);
    }

    #[test]
    fn test_strip_source_removes_ref_then_scheme() {
        assert_eq!(
            strip_source("git::https://example.com/vpc.git?ref=v1.2.0"),
            "example.com/vpc.git"
        );
        assert_eq!(
            strip_source("https://example.com/vpc-module?archive=zip"),
            "example.com/vpc-module"
        );
    }

    #[test_case("./local-mod", true)]
    #[test_case("../shared/vpc", true)]
    #[test_case("/opt/modules/vpc", true)]
    #[test_case("terraform-ibm-modules/db", false)]
    #[test_case("git::https://example.com/vpc.git", false)]
    #[test_case("local-mod", false ; "bare name is not local")]
    fn test_is_local(source: &str, expected: bool) {
        assert_eq!(is_local(source), expected);
    }

    #[test]
    fn test_classify_registry() {
        let address = SourceAddress::parse("hashicorp/consul/aws//modules/consul-cluster");
        assert_eq!(
            address.kind,
            SourceKind::Registry {
                hostname: DEFAULT_REGISTRY.to_string(),
                namespace: "hashicorp".to_string(),
                name: "consul".to_string(),
                provider: "aws".to_string(),
            }
        );
        assert_eq!(address.subfolder, "modules/consul-cluster");
    }

    #[test]
    fn test_classify_registry_with_hostname() {
        let address = SourceAddress::parse("app.terraform.io/example-corp/k8s-cluster/azurerm");
        match address.kind {
            SourceKind::Registry { hostname, namespace, .. } => {
                assert_eq!(hostname, "app.terraform.io");
                assert_eq!(namespace, "example-corp");
            }
            other => panic!("Expected Registry source, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_git_forms() {
        let address = SourceAddress::parse("git::https://example.com/network.git//modules/vpc?ref=v1.0.0");
        assert_eq!(
            address.kind,
            SourceKind::Git {
                url: "https://example.com/network.git".to_string()
            }
        );
        assert_eq!(address.git_ref.as_deref(), Some("v1.0.0"));

        let address = SourceAddress::parse("git@github.com:hashicorp/example.git");
        assert_eq!(
            address.kind,
            SourceKind::Git {
                url: "ssh://git@github.com/hashicorp/example.git".to_string()
            }
        );

        let address = SourceAddress::parse("github.com/hashicorp/example");
        assert_eq!(address.kind.label(), "git");
    }

    #[test]
    fn test_classify_other_getters() {
        assert_eq!(
            SourceAddress::parse("hg::http://example.com/vpc.hg").kind,
            SourceKind::Mercurial {
                url: "http://example.com/vpc.hg".to_string()
            }
        );
        assert_eq!(
            SourceAddress::parse("s3::https://s3-eu-west-1.amazonaws.com/examplecorp-terraform-modules/vpc.zip").kind,
            SourceKind::S3 {
                bucket: "examplecorp-terraform-modules".to_string(),
                key: "vpc.zip".to_string(),
                region: Some("eu-west-1".to_string()),
            }
        );
        assert_eq!(
            SourceAddress::parse("gcs::https://www.googleapis.com/storage/v1/modules/foomodule.zip").kind,
            SourceKind::Gcs {
                bucket: "modules".to_string(),
                path: "foomodule.zip".to_string(),
            }
        );
        let archive = SourceAddress::parse("https://example.com/vpc-module?archive=zip");
        assert_eq!(archive.kind.label(), "http");
        assert_eq!(archive.archive.as_deref(), Some("zip"));
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(SourceAddress::parse("terraform-ibm-modules/db").kind, SourceKind::Unknown);
        assert_eq!(SourceAddress::parse("./local-mod").to_string(), "./local-mod (local)");
    }
}
