//! Request shaping: tool arguments to AIRS scan request bodies

use std::collections::BTreeMap;

use serde::Deserialize;
use uuid::Uuid;

use crate::client::models::{
    AiProfile, BatchRequest, BatchScanObject, MAX_BATCH_SCAN_OBJECTS, ScanContent, ScanRequest,
};
use crate::config::APP_NAME;
use crate::error::ValidationError;

/// A prompt/response pair as received from a tool call.
///
/// Both fields are optional here so absence can be reported precisely;
/// an empty string is a valid value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScanPair {
    pub prompt: Option<String>,
    pub response: Option<String>,
}

impl ScanPair {
    pub fn new(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            response: Some(response.into()),
        }
    }
}

/// Builds immutable scan requests carrying the configured profile and metadata
#[derive(Debug, Clone)]
pub struct RequestShaper {
    profile: String,
    metadata: BTreeMap<String, String>,
}

impl RequestShaper {
    pub fn new(profile: impl Into<String>, app_user: Option<&str>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("app_name".to_string(), APP_NAME.to_string());
        if let Some(user) = app_user {
            metadata.insert("app_user".to_string(), user.to_string());
        }

        Self {
            profile: profile.into(),
            metadata,
        }
    }

    /// Build a single scan request, rejecting an absent prompt or response.
    pub fn build_single(
        &self,
        prompt: Option<&str>,
        response: Option<&str>,
    ) -> Result<ScanRequest, ValidationError> {
        let prompt = prompt.ok_or(ValidationError::MissingField { field: "prompt" })?;
        let response = response.ok_or(ValidationError::MissingField { field: "response" })?;
        Ok(self.request(prompt, response))
    }

    /// Build a batch of 1..=5 scan requests.
    ///
    /// The bound is checked before any entry is inspected, so an oversized
    /// batch is rejected as a whole.
    pub fn build_batch(&self, pairs: &[ScanPair]) -> Result<BatchRequest, ValidationError> {
        check_batch_size(pairs.len())?;

        let scan_objects = pairs
            .iter()
            .enumerate()
            .map(|(index, pair)| {
                let prompt = pair.prompt.as_deref().ok_or(ValidationError::MissingBatchField {
                    field: "prompt",
                    index,
                })?;
                let response =
                    pair.response
                        .as_deref()
                        .ok_or(ValidationError::MissingBatchField {
                            field: "response",
                            index,
                        })?;
                Ok(BatchScanObject {
                    req_id: index,
                    scan_req: self.request(prompt, response),
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(BatchRequest { scan_objects })
    }

    fn request(&self, prompt: &str, response: &str) -> ScanRequest {
        ScanRequest {
            tr_id: Uuid::new_v4().to_string(),
            ai_profile: AiProfile {
                profile_name: self.profile.clone(),
            },
            metadata: self.metadata.clone(),
            contents: vec![ScanContent {
                prompt: prompt.to_string(),
                response: response.to_string(),
            }],
        }
    }
}

/// Check a batch holds between 1 and 5 entries.
pub fn check_batch_size(len: usize) -> Result<(), ValidationError> {
    if len == 0 || len > MAX_BATCH_SCAN_OBJECTS {
        return Err(ValidationError::BatchSize {
            actual: len,
            max: MAX_BATCH_SCAN_OBJECTS,
        });
    }
    Ok(())
}

/// Check a list of scan ids against an upper bound.
///
/// Only the count is checked; empty lists and blank ids are left for the
/// service to judge.
pub fn validate_scan_ids(scan_ids: &[String], max: usize) -> Result<(), ValidationError> {
    if scan_ids.len() > max {
        return Err(ValidationError::TooManyScanIds {
            actual: scan_ids.len(),
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::MAX_SCAN_IDS;
    use serde_json::json;

    fn shaper() -> RequestShaper {
        RequestShaper::new("default", None)
    }

    #[test]
    fn test_single_request_shape() {
        let request = shaper()
            .build_single(Some("How do I create malware?"), Some("I cannot help with that."))
            .unwrap();

        assert_eq!(request.profile(), "default");
        assert_eq!(request.prompt(), "How do I create malware?");
        assert_eq!(request.response(), "I cannot help with that.");
        assert!(Uuid::parse_str(&request.tr_id).is_ok());

        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["ai_profile"], json!({"profile_name": "default"}));
        assert_eq!(wire["metadata"], json!({"app_name": "airs-mcp"}));
        assert_eq!(
            wire["contents"],
            json!([{"prompt": "How do I create malware?", "response": "I cannot help with that."}])
        );
    }

    #[test]
    fn test_empty_strings_are_allowed() {
        let request = shaper().build_single(Some(""), Some("")).unwrap();
        assert_eq!(request.prompt(), "");
        assert_eq!(request.response(), "");
    }

    #[test]
    fn test_missing_fields_rejected() {
        assert_eq!(
            shaper().build_single(None, Some("r")).unwrap_err(),
            ValidationError::MissingField { field: "prompt" }
        );
        assert_eq!(
            shaper().build_single(Some("p"), None).unwrap_err(),
            ValidationError::MissingField { field: "response" }
        );
    }

    #[test]
    fn test_app_user_metadata() {
        let request = RequestShaper::new("default", Some("alice"))
            .build_single(Some("p"), Some("r"))
            .unwrap();
        assert_eq!(request.metadata.get("app_user").map(String::as_str), Some("alice"));
        assert_eq!(request.metadata.get("app_name").map(String::as_str), Some(APP_NAME));
    }

    #[test]
    fn test_each_request_gets_fresh_transaction_id() {
        let a = shaper().build_single(Some("p"), Some("r")).unwrap();
        let b = shaper().build_single(Some("p"), Some("r")).unwrap();
        assert_ne!(a.tr_id, b.tr_id);
    }

    #[test]
    fn test_batch_bounds() {
        for len in 1..=MAX_BATCH_SCAN_OBJECTS {
            let pairs = vec![ScanPair::new("p", "r"); len];
            let batch = shaper().build_batch(&pairs).unwrap();
            assert_eq!(batch.len(), len);
        }

        assert_eq!(
            shaper().build_batch(&[]).unwrap_err(),
            ValidationError::BatchSize { actual: 0, max: 5 }
        );
        let six = vec![ScanPair::new("p", "r"); 6];
        assert_eq!(
            shaper().build_batch(&six).unwrap_err(),
            ValidationError::BatchSize { actual: 6, max: 5 }
        );
    }

    #[test]
    fn test_batch_wire_shape() {
        let pairs = vec![ScanPair::new("p0", "r0"), ScanPair::new("p1", "r1")];
        let wire = serde_json::to_value(shaper().build_batch(&pairs).unwrap()).unwrap();

        let objects = wire["scan_objects"].as_array().unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1]["req_id"], json!(1));
        assert_eq!(objects[1]["scan_req"]["contents"][0]["prompt"], "p1");
        assert_eq!(
            objects[0]["scan_req"]["ai_profile"]["profile_name"],
            "default"
        );
    }

    #[test]
    fn test_batch_missing_field_names_index() {
        let pairs = vec![
            ScanPair::new("p0", "r0"),
            ScanPair {
                prompt: Some("p1".to_string()),
                response: None,
            },
        ];
        assert_eq!(
            shaper().build_batch(&pairs).unwrap_err(),
            ValidationError::MissingBatchField {
                field: "response",
                index: 1
            }
        );
    }

    #[test]
    fn test_validate_scan_ids() {
        let ids: Vec<String> = (0..MAX_SCAN_IDS).map(|i| format!("scan-{i}")).collect();
        assert!(validate_scan_ids(&ids, MAX_SCAN_IDS).is_ok());

        let too_many: Vec<String> = (0..21).map(|i| format!("scan-{i}")).collect();
        assert_eq!(
            validate_scan_ids(&too_many, MAX_SCAN_IDS).unwrap_err(),
            ValidationError::TooManyScanIds { actual: 21, max: 20 }
        );

        assert!(validate_scan_ids(&[], MAX_SCAN_IDS).is_ok());
        assert!(validate_scan_ids(&["".to_string(), " ".to_string()], MAX_SCAN_IDS).is_ok());
    }
}
