use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Body of `POST /api/activity/tap/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TapRequest {
    pub activity_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TapResponse {
    #[serde(default)]
    pub success: bool,
    /// Today's totals keyed by lowercase activity type.
    #[serde(default)]
    pub counts: Option<HashMap<String, u64>>,
    #[serde(default)]
    pub rate_limited: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[async_trait]
pub trait TapApi: Send + Sync {
    async fn tap(&self, request: &TapRequest) -> Result<TapResponse, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_body_decodes() {
        let body = r#"{"success":false,"error":"Слишком часто","rate_limited":true}"#;
        let resp: TapResponse = serde_json::from_str(body).unwrap();
        assert!(!resp.success);
        assert!(resp.rate_limited);
        assert_eq!(resp.counts, None);
    }

    #[test]
    fn success_body_carries_counts() {
        let body = r#"{"success":true,"counts":{"resist":3,"smoked":1,"sport":0},"message":"ok"}"#;
        let resp: TapResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.counts.unwrap()["resist"], 3);
    }
}
