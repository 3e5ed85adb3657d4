//! Classification of decoded payloads as navigation targets.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::frame::DecodedPayload;

/// Which parsed URLs are acceptable navigation targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlPolicy {
    /// Only `http` and `https`.
    #[default]
    Strict,
    /// Any URL that parses, whatever its scheme.
    Permissive,
}

impl UrlPolicy {
    pub fn accepts(self, url: &Url) -> bool {
        match self {
            UrlPolicy::Strict => matches!(url.scheme(), "http" | "https"),
            UrlPolicy::Permissive => true,
        }
    }
}

/// What one processed frame produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    NotFound,
    AcceptedAddress(String),
    RejectedPayload(String),
}

/// Classify a payload under `policy`.
///
/// Accepted addresses carry the payload verbatim.
pub fn classify(payload: &str, policy: UrlPolicy) -> ScanOutcome {
    match Url::parse(payload) {
        Ok(url) if policy.accepts(&url) => ScanOutcome::AcceptedAddress(payload.to_owned()),
        _ => ScanOutcome::RejectedPayload(payload.to_owned()),
    }
}

pub(crate) fn outcome_for(decoded: Option<DecodedPayload>, policy: UrlPolicy) -> ScanOutcome {
    match decoded {
        Some(decoded) => classify(&decoded.payload, policy),
        None => ScanOutcome::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_policy_accepts_only_http_schemes() {
        for ok in ["https://example.com", "http://a.test/path?q=1", "HTTPS://Upper.test"] {
            assert_eq!(
                classify(ok, UrlPolicy::Strict),
                ScanOutcome::AcceptedAddress(ok.to_owned()),
                "{ok}"
            );
        }
        for bad in [
            "not a url",
            "ftp://x.com",
            "javascript:alert(1)",
            "mailto:a@b.c",
            "",
            "example.com",
        ] {
            assert_eq!(
                classify(bad, UrlPolicy::Strict),
                ScanOutcome::RejectedPayload(bad.to_owned()),
                "{bad}"
            );
        }
    }

    #[test]
    fn permissive_policy_accepts_any_parseable_url() {
        assert_eq!(
            classify("ftp://x.com", UrlPolicy::Permissive),
            ScanOutcome::AcceptedAddress("ftp://x.com".into())
        );
        assert_eq!(
            classify("not a url", UrlPolicy::Permissive),
            ScanOutcome::RejectedPayload("not a url".into())
        );
    }

    #[test]
    fn missing_payload_is_not_found() {
        assert_eq!(outcome_for(None, UrlPolicy::Strict), ScanOutcome::NotFound);
    }

    #[test]
    fn policy_deserializes_from_snake_case() {
        let policy: UrlPolicy = serde_json::from_str("\"permissive\"").expect("parse");
        assert_eq!(policy, UrlPolicy::Permissive);
    }
}
