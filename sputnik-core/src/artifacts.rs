//! Artifact normalization and type detection
//!
//! The triage pipeline for a single user-supplied artifact:
//! - Normalize: trim and reverse threat-intel defanging (`hxxp://`, `[.]`)
//! - Classify: first matching rule wins (IP, hash, URL, domain)
//! - Label: human-readable name for the detected type
//!
//! Everything here is pure and total. `ArtifactType::Unknown` is a valid
//! result, not an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Categories of triage artifacts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactType {
    /// IPv4 address
    Ip,
    /// Domain name
    Domain,
    /// MD5, SHA1 or SHA256 file hash
    Hash,
    /// http(s) URL
    Url,
    /// Nothing matched
    #[default]
    Unknown,
}

impl ArtifactType {
    /// Every category, in declaration order
    pub const ALL: [ArtifactType; 5] = [
        ArtifactType::Ip,
        ArtifactType::Domain,
        ArtifactType::Hash,
        ArtifactType::Url,
        ArtifactType::Unknown,
    ];

    /// Human-readable name
    pub fn label(self) -> &'static str {
        match self {
            ArtifactType::Ip => "IP Address",
            ArtifactType::Domain => "Domain Name",
            ArtifactType::Hash => "File Hash",
            ArtifactType::Url => "URL",
            ArtifactType::Unknown => "Unknown Artifact",
        }
    }

    /// Wire name, as used in config files and prompts
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactType::Ip => "IP",
            ArtifactType::Domain => "DOMAIN",
            ArtifactType::Hash => "HASH",
            ArtifactType::Url => "URL",
            ArtifactType::Unknown => "UNKNOWN",
        }
    }

    pub fn is_known(self) -> bool {
        self != ArtifactType::Unknown
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a category to its display name
pub fn label_of(artifact_type: ArtifactType) -> &'static str {
    artifact_type.label()
}

/// Hash algorithm implied by digest length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// Guess the algorithm of a string already classified as a hash
    pub fn from_digest(digest: &str) -> Option<Self> {
        match digest.len() {
            32 => Some(HashAlgorithm::Md5),
            40 => Some(HashAlgorithm::Sha1),
            64 => Some(HashAlgorithm::Sha256),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA1",
            HashAlgorithm::Sha256 => "SHA256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Defanging tokens and their canonical form
const DEFANG_RULES: &[(&str, &str)] = &[
    ("[.]", "."),
    ("hxxp://", "http://"),
    ("hxxps://", "https://"),
];

/// Whitespace as browsers trim it: BOM included, NEL (U+0085) kept
fn is_trimmed(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}

/// Strip surrounding whitespace and reverse defanging.
///
/// Each substitution is repeated until the token no longer occurs, so
/// nested input such as `[[.]]` collapses all the way to `.`.
pub fn normalize(raw: &str) -> String {
    let mut cleaned = raw.trim_matches(is_trimmed).to_string();

    for (defanged, canonical) in DEFANG_RULES {
        while cleaned.contains(defanged) {
            cleaned = cleaned.replace(defanged, canonical);
        }
    }

    cleaned
}

static IPV4_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$").unwrap()
});

// Leading label needs 3+ characters; single and double character labels do not match.
static DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]{1,61}[a-zA-Z0-9](?:\.[a-zA-Z]{2,})+$").unwrap()
});

fn is_ipv4(s: &str) -> bool {
    IPV4_REGEX.is_match(s)
}

fn is_hash(s: &str) -> bool {
    matches!(s.len(), 32 | 40 | 64) && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_url(s: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        s.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

fn is_domain(s: &str) -> bool {
    DOMAIN_REGEX.is_match(s)
}

/// A single detection rule
struct Rule {
    matches: fn(&str) -> bool,
    artifact_type: ArtifactType,
}

/// Detection rules in priority order
static RULES: &[Rule] = &[
    Rule { matches: is_ipv4, artifact_type: ArtifactType::Ip },
    Rule { matches: is_hash, artifact_type: ArtifactType::Hash },
    Rule { matches: is_url, artifact_type: ArtifactType::Url },
    Rule { matches: is_domain, artifact_type: ArtifactType::Domain },
];

/// Detect the type of a normalized artifact
pub fn classify(normalized: &str) -> ArtifactType {
    if normalized.is_empty() {
        return ArtifactType::Unknown;
    }

    RULES
        .iter()
        .find(|rule| (rule.matches)(normalized))
        .map(|rule| rule.artifact_type)
        .unwrap_or(ArtifactType::Unknown)
}

/// Result of running the full pipeline on raw input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Input as typed
    pub raw: String,
    /// Refanged, trimmed form
    pub normalized: String,
    /// Detected category
    pub artifact_type: ArtifactType,
    /// Display name of the category
    pub label: String,
    /// Digest algorithm, for hashes only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_algorithm: Option<HashAlgorithm>,
}

impl Classification {
    /// Normalize then classify raw input
    pub fn of(raw: &str) -> Self {
        let normalized = normalize(raw);
        let artifact_type = classify(&normalized);
        let hash_algorithm = match artifact_type {
            ArtifactType::Hash => HashAlgorithm::from_digest(&normalized),
            _ => None,
        };

        Self {
            raw: raw.to_string(),
            label: artifact_type.label().to_string(),
            normalized,
            artifact_type,
            hash_algorithm,
        }
    }

    /// True when there is nothing to look up
    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_brackets() {
        assert_eq!(normalize("1[.]2[.]3[.]4"), "1.2.3.4");
        assert_eq!(normalize("[[.]]"), ".");
    }

    #[test]
    fn test_normalize_schemes() {
        assert_eq!(normalize("hxxp://evil.com"), "http://evil.com");
        assert_eq!(normalize("hxxps://evil.com"), "https://evil.com");
        assert_eq!(normalize("  hxxps://a[.]b  "), "https://a.b");
    }

    #[test]
    fn test_normalize_every_scheme_occurrence() {
        assert_eq!(normalize("hxxp://a hxxp://b"), "http://a http://b");
        assert_eq!(normalize("hxxps://hxxps://x"), "https://https://x");
        assert_eq!(normalize("hxxp://a[.]b hxxps://c[.]d"), "http://a.b https://c.d");
        for s in ["hxxp://a hxxp://b", "hxxps://hxxps://x"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_normalize_keeps_next_line_char() {
        assert_eq!(normalize("\u{85}8.8.8.8\u{85}"), "\u{85}8.8.8.8\u{85}");
        assert_eq!(normalize("\u{a0}\u{2003}8.8.8.8\u{3000}"), "8.8.8.8");
    }

    #[test]
    fn test_normalize_leaves_case_and_inner_space() {
        assert_eq!(normalize("HXXP://Evil.com"), "HXXP://Evil.com");
        assert_eq!(normalize(" not a valid thing!! "), "not a valid thing!!");
        assert_eq!(normalize("\u{feff}8.8.8.8\n"), "8.8.8.8");
    }

    #[test]
    fn test_normalize_no_match_is_noop() {
        assert_eq!(normalize("example.com"), "example.com");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_classify_ip() {
        assert_eq!(classify("8.8.8.8"), ArtifactType::Ip);
        assert_eq!(classify("255.255.255.255"), ArtifactType::Ip);
        assert_eq!(classify("0.0.0.0"), ArtifactType::Ip);
        assert_ne!(classify("256.1.1.1"), ArtifactType::Ip);
        assert_ne!(classify("1.2.3"), ArtifactType::Ip);
        assert_ne!(classify("1.2.3.4.5"), ArtifactType::Ip);
        assert_ne!(classify("1.2.3.4 "), ArtifactType::Ip);
    }

    #[test]
    fn test_classify_hash() {
        assert_eq!(classify("d41d8cd98f00b204e9800998ecf8427e"), ArtifactType::Hash);
        assert_eq!(
            classify("DA39A3EE5E6B4B0D3255BFEF95601890AFD80709"),
            ArtifactType::Hash
        );
        assert_eq!(
            classify("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"),
            ArtifactType::Hash
        );
        // right length, not hex
        assert_eq!(classify("g41d8cd98f00b204e9800998ecf8427e"), ArtifactType::Unknown);
        // hex, wrong length
        assert_eq!(classify("d41d8cd98f00b204e9800998ecf8427"), ArtifactType::Unknown);
    }

    #[test]
    fn test_classify_url() {
        assert_eq!(classify("http://example.com/path"), ArtifactType::Url);
        assert_eq!(classify("HTTP://example.com"), ArtifactType::Url);
        assert_eq!(classify("HttpS://example.com"), ArtifactType::Url);
        assert_eq!(classify("ftp://example.com"), ArtifactType::Unknown);
    }

    #[test]
    fn test_classify_domain() {
        assert_eq!(classify("example.com"), ArtifactType::Domain);
        assert_eq!(classify("www.example.co.uk"), ArtifactType::Domain);
        assert_eq!(classify("my-site.org"), ArtifactType::Domain);
    }

    #[test]
    fn test_domain_short_leading_label_is_unknown() {
        assert_eq!(classify("ab.com"), ArtifactType::Unknown);
        assert_eq!(classify("x.io"), ArtifactType::Unknown);
        assert_eq!(classify("abc.com"), ArtifactType::Domain);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify(""), ArtifactType::Unknown);
        assert_eq!(classify("not a valid thing!!"), ArtifactType::Unknown);
        assert_eq!(classify("пример.рф"), ArtifactType::Unknown);
    }

    #[test]
    fn test_pipeline_defanged_url() {
        let normalized = normalize("hxxp://sub[.]evil-domain[.]com/x");
        assert_eq!(normalized, "http://sub.evil-domain.com/x");
        assert_eq!(classify(&normalized), ArtifactType::Url);
    }

    #[test]
    fn test_classification_of() {
        let c = Classification::of(" 1[.]2[.]3[.]4 ");
        assert_eq!(c.normalized, "1.2.3.4");
        assert_eq!(c.artifact_type, ArtifactType::Ip);
        assert_eq!(c.label, "IP Address");
        assert!(c.hash_algorithm.is_none());

        let c = Classification::of("da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert_eq!(c.hash_algorithm, Some(HashAlgorithm::Sha1));
        assert_eq!(HashAlgorithm::Sha1.to_string(), "SHA1");

        assert!(Classification::of("   ").is_empty());
    }

    #[test]
    fn test_labels() {
        assert_eq!(label_of(ArtifactType::Hash), "File Hash");
        assert_eq!(label_of(ArtifactType::Unknown), "Unknown Artifact");
        assert_eq!(label_of(ArtifactType::Ip), "IP Address");
        assert_eq!(label_of(ArtifactType::Domain), "Domain Name");
        assert_eq!(label_of(ArtifactType::Url), "URL");
        assert_eq!(ArtifactType::Domain.to_string(), "Domain Name");
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&ArtifactType::Ip).unwrap(), "\"IP\"");
        for t in ArtifactType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
        for algo in [HashAlgorithm::Md5, HashAlgorithm::Sha1, HashAlgorithm::Sha256] {
            let json = serde_json::to_string(&algo).unwrap();
            assert_eq!(json, format!("\"{algo}\""));
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 512,
                .. ProptestConfig::default()
            })]

            #[test]
            fn prop_normalize_idempotent(s in r"[ \t\[\].hxps:/a-z0-9]{0,40}") {
                let once = normalize(&s);
                prop_assert_eq!(normalize(&once), once);
            }

            #[test]
            fn prop_normalize_idempotent_any(s in any::<String>()) {
                let once = normalize(&s);
                prop_assert_eq!(normalize(&once), once);
            }

            #[test]
            fn prop_normalize_leaves_no_bracket_dot(s in r"[\[\].a]{0,30}") {
                prop_assert!(!normalize(&s).contains("[.]"));
            }

            #[test]
            fn prop_classify_total(s in any::<String>()) {
                prop_assert!(ArtifactType::ALL.contains(&classify(&s)));
            }

            #[test]
            fn prop_dotted_quads_are_ip(a in 0u8..=255, b in 0u8..=255, c in 0u8..=255, d in 0u8..=255) {
                let ip = format!("{a}.{b}.{c}.{d}");
                prop_assert_eq!(classify(&ip), ArtifactType::Ip);
            }

            #[test]
            fn prop_hex_digests_are_hash(s in r"[0-9a-fA-F]{32}|[0-9a-fA-F]{40}|[0-9a-fA-F]{64}") {
                prop_assert_eq!(classify(&s), ArtifactType::Hash);
            }
        }

        #[test]
        fn single_pass_substitution_is_not_enough() {
            let single = "[[.]]".replace("[.]", ".");
            assert_eq!(single, "[.]");
            assert_eq!(normalize("[[.]]"), ".");
        }
    }
}
