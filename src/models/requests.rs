use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query parameters for the match listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListMatchesQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    #[serde(alias = "minScore", rename = "minScore")]
    pub min_score: f64,
    #[serde(default)]
    #[serde(alias = "userId", rename = "userId")]
    pub user_id: Option<i64>,
}

fn default_limit() -> i64 {
    100
}

impl ListMatchesQuery {
    /// Clamp pagination and score filters to sane bounds
    pub fn normalized(&self) -> Self {
        Self {
            limit: self.limit.clamp(1, 1000),
            offset: self.offset.max(0),
            min_score: self.min_score.clamp(0.0, 100.0),
            user_id: self.user_id,
        }
    }
}

/// Body for the match cancellation endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CancelMatchRequest {
    #[validate(length(min = 1, message = "justification is required"))]
    pub justification: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_normalization() {
        let query = ListMatchesQuery {
            limit: 5000,
            offset: -3,
            min_score: 150.0,
            user_id: None,
        };

        let normalized = query.normalized();
        assert_eq!(normalized.limit, 1000);
        assert_eq!(normalized.offset, 0);
        assert_eq!(normalized.min_score, 100.0);
    }

    #[test]
    fn test_cancel_request_requires_justification() {
        use validator::Validate;

        let empty = CancelMatchRequest {
            justification: String::new(),
        };
        assert!(empty.validate().is_err());

        let filled = CancelMatchRequest {
            justification: "duplicated pairing".to_string(),
        };
        assert!(filled.validate().is_ok());
    }
}
