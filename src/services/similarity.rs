use crate::core::similarity::{cosine_similarity, round_similarity, InterestScorer, ScoringError};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Client for the sentence-similarity inference endpoint
///
/// Talks to a Hugging Face style sentence-transformers endpoint. The API has
/// shipped two response shapes over time and both are supported:
/// - a direct similarity array, e.g. `[0.52]`
/// - a pair of embedding vectors, in which case cosine similarity is
///   computed locally
///
/// An unrecognized-but-successful response degrades to similarity 0 instead
/// of failing the caller.
#[derive(Debug, Clone)]
pub struct SimilarityClient {
    api_url: String,
    api_key: String,
    client: Client,
}

impl SimilarityClient {
    /// Create a new similarity client with a bounded request timeout
    pub fn new(api_url: String, api_key: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_url,
            api_key,
            client,
        }
    }

    /// Compare two texts, returning a similarity in [0, 1]
    pub async fn compare_texts(&self, text_a: &str, text_b: &str) -> Result<f64, ScoringError> {
        if self.api_key.is_empty() {
            return Err(ScoringError::Configuration(
                "similarity API key is not set".to_string(),
            ));
        }

        let payload = json!({
            "inputs": {
                "source_sentence": text_a.trim(),
                "sentences": [text_b.trim()],
            }
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    ScoringError::Transport(e.to_string())
                } else {
                    ScoringError::Api(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ScoringError::Configuration(format!(
                "similarity API rejected credentials: {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(ScoringError::Api(format!(
                "similarity API returned {}",
                status
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ScoringError::InvalidResponse(e.to_string()))?;

        Ok(round_similarity(parse_similarity(&body)))
    }
}

/// Extract a similarity from either known response shape
///
/// Unknown shapes map to 0 so one odd response never aborts a whole run.
fn parse_similarity(body: &Value) -> f64 {
    if let Some(items) = body.as_array() {
        // Current shape: direct similarity scalar(s), e.g. [0.52]
        if let Some(similarity) = items.first().and_then(Value::as_f64) {
            return similarity.clamp(0.0, 1.0);
        }

        // Legacy shape: two embedding vectors
        if items.len() >= 2 {
            let embedding_a = parse_vector(&items[0]);
            let embedding_b = parse_vector(&items[1]);
            if !embedding_a.is_empty() && !embedding_b.is_empty() {
                return cosine_similarity(&embedding_a, &embedding_b);
            }
        }
    }

    tracing::warn!(
        "Unrecognized similarity response shape, treating as 0: {}",
        truncate_for_log(body)
    );
    0.0
}

fn parse_vector(value: &Value) -> Vec<f64> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default()
}

fn truncate_for_log(body: &Value) -> String {
    body.to_string().chars().take(200).collect()
}

impl InterestScorer for SimilarityClient {
    async fn score(&self, text_a: &str, text_b: &str) -> Result<f64, ScoringError> {
        let a = text_a.trim();
        let b = text_b.trim();

        // Fail closed: nothing to compare means zero similarity, no request
        if a.is_empty() || b.is_empty() {
            return Ok(0.0);
        }

        self.compare_texts(a, b).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> SimilarityClient {
        SimilarityClient::new(server.url(), "test_key".to_string(), 5)
    }

    #[tokio::test]
    async fn test_direct_similarity_shape() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[0.5234]")
            .create_async()
            .await;

        let client = client_for(&server);
        let similarity = client.score("AI, robotics", "AI, mentoring").await.unwrap();

        assert_eq!(similarity, 0.5234);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embedding_pair_shape_computes_cosine() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[[1.0, 0.0], [1.0, 0.0]]")
            .create_async()
            .await;

        let client = client_for(&server);
        let similarity = client.score("games", "gaming").await.unwrap();

        assert_eq!(similarity, 1.0);
    }

    #[tokio::test]
    async fn test_unrecognized_shape_degrades_to_zero() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"unexpected": true}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let similarity = client.score("a", "b").await.unwrap();

        assert_eq!(similarity, 0.0);
    }

    #[tokio::test]
    async fn test_empty_text_short_circuits() {
        // No server on purpose: an empty side must never reach the network
        let client = SimilarityClient::new(
            "http://127.0.0.1:1".to_string(),
            "test_key".to_string(),
            1,
        );

        assert_eq!(client.score("  ", "AI").await.unwrap(), 0.0);
        assert_eq!(client.score("AI", "").await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_unauthorized_is_configuration_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(401)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.score("a", "b").await;

        assert!(matches!(result, Err(ScoringError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(503)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.score("a", "b").await;

        assert!(matches!(result, Err(ScoringError::Api(_))));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let client = SimilarityClient::new(
            "http://127.0.0.1:1".to_string(),
            String::new(),
            1,
        );

        let result = client.score("a", "b").await;
        assert!(matches!(result, Err(ScoringError::Configuration(_))));
    }

    #[test]
    fn test_parse_similarity_clamps_out_of_range() {
        let body: Value = serde_json::from_str("[1.7]").unwrap();
        assert_eq!(parse_similarity(&body), 1.0);

        let body: Value = serde_json::from_str("[-0.3]").unwrap();
        assert_eq!(parse_similarity(&body), 0.0);
    }
}
