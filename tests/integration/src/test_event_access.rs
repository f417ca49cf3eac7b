//! Event access key integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::{Value, json};

    use crate::{access_url, http_client, test_tenant};

    const TENANT_HEADER: &str = "x-keystack-tenant";

    async fn create_secret(client: &reqwest::Client, tenant: &str, name: &str) -> Value {
        let resp = client
            .post(access_url("/secrets"))
            .header(TENANT_HEADER, tenant)
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "create secret should succeed");
        resp.json().await.unwrap()
    }

    async fn verify(client: &reqwest::Client, body: Value) -> reqwest::Response {
        client
            .post(access_url("/verify"))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_and_verify_secret_pair() {
        let client = http_client();
        let tenant = test_tenant("t");

        let created = create_secret(&client, &tenant, "Orders Webhook").await;
        let test_key = created["testKey"].as_str().unwrap();
        let live_key = created["liveKey"].as_str().unwrap();
        assert!(test_key.starts_with("sk_test_"));
        assert!(live_key.starts_with("sk_live_"));

        let resp = verify(&client, json!({ "secret": live_key })).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let record: Value = resp.json().await.unwrap();
        assert_eq!(record["group"], "orders-webhook");
        assert_eq!(record["environment"], "live");
        assert!(record.get("secret").is_none());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unknown_secret() {
        let client = http_client();
        let resp = verify(&client, json!({ "secret": "sk_test_bm90LWEta2V5" })).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = verify(&client, json!({})).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["message"], "No identifier or secret provided.");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_and_verify_identifier() {
        let client = http_client();
        let tenant = test_tenant("t");

        let resp = client
            .post(access_url("/identifiers"))
            .header(TENANT_HEADER, &tenant)
            .json(&json!({
                "name": "Stripe Events",
                "type": "stripe",
                "paths": { "id": "data.id", "event": "type", "timestamp": "created" },
                "environment": "live",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let created: Value = resp.json().await.unwrap();
        let identifier = created["identifier"].as_str().unwrap();
        assert!(identifier.starts_with("id_live_"));

        let resp = verify(&client, json!({ "identifier": identifier })).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let decoded: Value = resp.json().await.unwrap();
        assert!(
            decoded["topicPrefix"]
                .as_str()
                .unwrap()
                .contains("stripe-events")
        );
        assert_eq!(decoded["paths"]["event"], "type");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_rotate_and_delete_secret() {
        let client = http_client();
        let tenant = test_tenant("t");
        let created = create_secret(&client, &tenant, "Billing").await;
        let old_live = created["liveKey"].as_str().unwrap().to_owned();

        let resp = client
            .get(access_url("/secrets?pageSize=10"))
            .header(TENANT_HEADER, &tenant)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let listing: Value = resp.json().await.unwrap();
        assert_eq!(listing["total"], 2);
        assert!(
            listing["rows"]
                .as_array()
                .unwrap()
                .iter()
                .all(|row| row["secret"].as_str().unwrap().contains("..."))
        );

        let resp = client
            .post(access_url("/secrets/Billing/rotate"))
            .header(TENANT_HEADER, &tenant)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let rotated: Value = resp.json().await.unwrap();
        let new_live = rotated["liveKey"].as_str().unwrap().to_owned();
        assert_ne!(new_live, old_live);

        let resp = verify(&client, json!({ "secret": old_live })).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = verify(&client, json!({ "secret": new_live })).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = client
            .delete(access_url("/secrets/Billing"))
            .header(TENANT_HEADER, &tenant)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let deleted: Value = resp.json().await.unwrap();
        assert_eq!(deleted["deleted"], 2);

        let resp = verify(&client, json!({ "secret": new_live })).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_require_identity_for_management() {
        let client = http_client();
        let resp = client
            .post(access_url("/secrets"))
            .json(&json!({ "name": "nobody" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unsupported_integration_type() {
        let client = http_client();
        let resp = client
            .post(access_url("/verify/signature"))
            .json(&json!({
                "type": "carrier-pigeon",
                "payload": { "headers": {}, "body": "{}" },
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
