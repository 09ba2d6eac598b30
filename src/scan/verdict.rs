//! Verdict translation from AIRS scan responses
//!
//! Upstream naming is normalized here so callers only ever see the two-valued
//! verdict/action enums and namespaced threat tags.

use std::collections::BTreeSet;
use std::fmt;

use log::debug;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::client::models::RawResponse;
use crate::error::{ApiError, Result};

/// Upstream safety classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Benign,
    Malicious,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Benign => "benign",
            Verdict::Malicious => "malicious",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "benign" | "safe" | "clean" => Some(Verdict::Benign),
            "malicious" | "unsafe" | "threat" => Some(Verdict::Malicious),
            _ => None,
        }
    }
}

/// Recommended enforcement decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Allow,
    Block,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "allow",
            Action::Block => "block",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "allow" | "allowed" | "pass" | "permit" => Some(Action::Allow),
            "block" | "blocked" | "deny" | "denied" => Some(Action::Block),
            _ => None,
        }
    }
}

/// Which side of the interaction a threat was detected in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ThreatNamespace {
    Prompt,
    Response,
}

impl ThreatNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatNamespace::Prompt => "prompt",
            ThreatNamespace::Response => "response",
        }
    }

    /// Field of the upstream response listing detections for this side
    fn field(&self) -> &'static str {
        match self {
            ThreatNamespace::Prompt => "prompt_detected",
            ThreatNamespace::Response => "response_detected",
        }
    }
}

/// Threat taxonomy. Categories this build does not know are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ThreatCategory {
    Injection,
    Jailbreak,
    MaliciousCode,
    ToxicContent,
    DataExposure,
    Ungrounded,
    MaliciousUrls,
    PolicyViolation,
    Other(String),
}

impl ThreatCategory {
    /// Map an upstream detection key onto the taxonomy.
    pub fn from_upstream(key: &str) -> Self {
        match key {
            "injection" | "prompt_injection" => ThreatCategory::Injection,
            "jailbreak" => ThreatCategory::Jailbreak,
            "malicious_code" => ThreatCategory::MaliciousCode,
            "toxic_content" | "toxicity" => ThreatCategory::ToxicContent,
            "dlp" | "data_exposure" | "data_leak" => ThreatCategory::DataExposure,
            "ungrounded" => ThreatCategory::Ungrounded,
            "url_cats" | "malicious_urls" => ThreatCategory::MaliciousUrls,
            "topic_violation" | "policy_violation" => ThreatCategory::PolicyViolation,
            other => ThreatCategory::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ThreatCategory::Injection => "injection",
            ThreatCategory::Jailbreak => "jailbreak",
            ThreatCategory::MaliciousCode => "malicious_code",
            ThreatCategory::ToxicContent => "toxic_content",
            ThreatCategory::DataExposure => "data_exposure",
            ThreatCategory::Ungrounded => "ungrounded",
            ThreatCategory::MaliciousUrls => "malicious_urls",
            ThreatCategory::PolicyViolation => "policy_violation",
            ThreatCategory::Other(raw) => raw,
        }
    }
}

/// Namespaced threat label such as `prompt:injection`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreatTag {
    pub namespace: ThreatNamespace,
    pub category: ThreatCategory,
}

impl fmt::Display for ThreatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace.as_str(), self.category.as_str())
    }
}

impl Serialize for ThreatTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Normalized outcome of a single scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub scan_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,

    pub verdict: Verdict,

    pub action: Action,

    pub threats: BTreeSet<ThreatTag>,
}

/// Acknowledgement of an async batch submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReceipt {
    pub scan_ids: Vec<String>,
    pub count: usize,
}

/// Translate a synchronous scan response.
pub fn translate(raw: &RawResponse) -> Result<ScanResult> {
    let body = &raw.body;
    if !body.is_object() {
        return Err(malformed("expected a JSON object"));
    }

    let scan_id = required_str(body, "scan_id")?;

    let verdict_raw = required_str(body, "category")
        .map_err(|_| malformed("missing verdict field 'category'"))?;
    let verdict = Verdict::parse(verdict_raw)
        .ok_or_else(|| malformed(&format!("unrecognized verdict '{}'", verdict_raw)))?;

    let action_raw = required_str(body, "action")?;
    let action = Action::parse(action_raw)
        .ok_or_else(|| malformed(&format!("unrecognized action '{}'", action_raw)))?;

    if verdict == Verdict::Benign && action == Action::Block {
        debug!("Scan {} blocked by policy despite benign verdict", scan_id);
    }

    let threats = [ThreatNamespace::Prompt, ThreatNamespace::Response]
        .into_iter()
        .flat_map(|namespace| detected(body, namespace))
        .collect();

    Ok(ScanResult {
        scan_id: scan_id.to_string(),
        report_id: body
            .get("report_id")
            .and_then(Value::as_str)
            .map(str::to_string),
        verdict,
        action,
        threats,
    })
}

/// Translate an async batch submission response.
///
/// Upstream must acknowledge every submitted object with its own scan id.
pub fn translate_batch(raw: &RawResponse, submitted: usize) -> Result<BatchReceipt> {
    let ids = raw
        .body
        .get("scan_ids")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("missing 'scan_ids' array"))?;

    let scan_ids = ids
        .iter()
        .map(|id| {
            id.as_str()
                .map(str::to_string)
                .ok_or_else(|| malformed("'scan_ids' must contain strings"))
        })
        .collect::<Result<Vec<_>>>()?;

    if scan_ids.len() != submitted {
        return Err(malformed(&format!(
            "acknowledged {} scan id(s) for {} submitted object(s)",
            scan_ids.len(),
            submitted
        )));
    }

    Ok(BatchReceipt {
        count: scan_ids.len(),
        scan_ids,
    })
}

fn detected(body: &Value, namespace: ThreatNamespace) -> Vec<ThreatTag> {
    let Some(findings) = body.get(namespace.field()).and_then(Value::as_object) else {
        return Vec::new();
    };

    findings
        .iter()
        .filter(|(_, flagged)| flagged.as_bool().unwrap_or(false))
        .map(|(key, _)| ThreatTag {
            namespace,
            category: ThreatCategory::from_upstream(key),
        })
        .collect()
}

fn required_str<'a>(body: &'a Value, field: &str) -> Result<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| malformed(&format!("missing field '{}'", field)))
}

fn malformed(reason: &str) -> crate::error::Error {
    ApiError::MalformedResponse(reason.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn raw(body: Value) -> RawResponse {
        RawResponse { status: 200, body }
    }

    #[test]
    fn test_translates_malicious_scan() {
        let result = translate(&raw(json!({
            "scan_id": "abc",
            "report_id": "Rabc",
            "category": "malicious",
            "action": "block",
            "prompt_detected": {"injection": true, "dlp": false, "url_cats": true},
            "response_detected": {"toxic_content": true}
        })))
        .unwrap();

        assert_eq!(result.scan_id, "abc");
        assert_eq!(result.report_id.as_deref(), Some("Rabc"));
        assert_eq!(result.verdict, Verdict::Malicious);
        assert_eq!(result.action, Action::Block);

        let tags: Vec<String> = result.threats.iter().map(ToString::to_string).collect();
        assert_eq!(
            tags,
            vec![
                "prompt:injection",
                "prompt:malicious_urls",
                "response:toxic_content"
            ]
        );
    }

    #[test]
    fn test_benign_scan_without_detections() {
        let result = translate(&raw(json!({
            "scan_id": "abc",
            "category": "benign",
            "action": "allow"
        })))
        .unwrap();

        assert_eq!(result.verdict, Verdict::Benign);
        assert_eq!(result.action, Action::Allow);
        assert!(result.threats.is_empty());
        assert!(result.report_id.is_none());
    }

    #[test]
    fn test_missing_verdict_is_malformed() {
        let err = translate(&raw(json!({"scan_id": "abc"}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
        assert!(err.to_string().contains("verdict"));
    }

    #[test]
    fn test_missing_scan_id_is_malformed() {
        let err = translate(&raw(json!({"category": "benign", "action": "allow"}))).unwrap_err();
        assert!(err.to_string().contains("scan_id"));
    }

    #[test]
    fn test_non_object_body_is_malformed() {
        let err = translate(&raw(json!(["not", "an", "object"]))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn test_normalizes_casing_and_synonyms() {
        let result = translate(&raw(json!({
            "scan_id": "abc",
            "category": "MALICIOUS",
            "action": "Blocked"
        })))
        .unwrap();
        assert_eq!(result.verdict, Verdict::Malicious);
        assert_eq!(result.action, Action::Block);

        assert_eq!(Verdict::parse(" Safe "), Some(Verdict::Benign));
        assert_eq!(Action::parse("deny"), Some(Action::Block));
        assert_eq!(Action::parse("permit"), Some(Action::Allow));
    }

    #[test]
    fn test_unknown_verdict_is_malformed() {
        let err = translate(&raw(json!({
            "scan_id": "abc",
            "category": "suspicious",
            "action": "allow"
        })))
        .unwrap_err();
        assert!(err.to_string().contains("suspicious"));
    }

    #[test]
    fn test_action_is_taken_from_upstream() {
        // Policy-only blocks are passed through rather than derived from the verdict
        let result = translate(&raw(json!({
            "scan_id": "abc",
            "category": "benign",
            "action": "block"
        })))
        .unwrap();
        assert_eq!(result.verdict, Verdict::Benign);
        assert_eq!(result.action, Action::Block);
    }

    #[test]
    fn test_unknown_categories_preserved_verbatim() {
        let result = translate(&raw(json!({
            "scan_id": "abc",
            "category": "malicious",
            "action": "block",
            "response_detected": {"agent_hijack": true, "db_security": false}
        })))
        .unwrap();

        let tags: Vec<String> = result.threats.iter().map(ToString::to_string).collect();
        assert_eq!(tags, vec!["response:agent_hijack"]);
    }

    #[test]
    fn test_serialized_shape() {
        let result = translate(&raw(json!({
            "scan_id": "abc",
            "category": "malicious",
            "action": "block",
            "prompt_detected": {"injection": true}
        })))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "scan_id": "abc",
                "verdict": "malicious",
                "action": "block",
                "threats": ["prompt:injection"]
            })
        );
    }

    #[test]
    fn test_batch_receipt() {
        let receipt = translate_batch(&raw(json!({"scan_ids": ["a", "b", "c"]})), 3).unwrap();
        assert_eq!(receipt.count, 3);
        assert_eq!(receipt.scan_ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_batch_receipt_count_mismatch_is_malformed() {
        let err = translate_batch(&raw(json!({"scan_ids": ["a"]})), 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
        assert!(err.to_string().contains("1 scan id(s) for 2"));
    }

    #[test]
    fn test_batch_receipt_missing_ids_is_malformed() {
        let err = translate_batch(&raw(json!({"received": "2024-01-01"})), 1).unwrap_err();
        assert!(err.to_string().contains("scan_ids"));
    }
}
