//! Health endpoint integration tests.

#[cfg(test)]
mod tests {
    use crate::{endpoint_url, http_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_running_service() {
        let client = http_client();
        let resp = client
            .get(format!("{}/_keystack/health", endpoint_url()))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["services"]["event-access"], "running");
        assert!(json["version"].is_string());
    }
}
