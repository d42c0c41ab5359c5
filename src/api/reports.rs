//! Dashboard statistics and report export.

use super::client::{ApiClient, RequestOptions};
use super::error::ApiError;
use super::types::StatsSummary;
use crate::config::EXPORT_TIMEOUT;

/// GET /api/stats/admin/.
pub async fn admin_summary(client: &ApiClient) -> Result<StatsSummary, ApiError> {
    client.get("/api/stats/admin/").await?.json()
}

/// GET /api/stats/researcher/.
pub async fn researcher_summary(client: &ApiClient) -> Result<StatsSummary, ApiError> {
    client.get("/api/stats/researcher/").await?.json()
}

/// GET /api/reports/export-csv/ as raw bytes (30s timeout, uncached).
pub async fn export_csv(client: &ApiClient) -> Result<Vec<u8>, ApiError> {
    let options = RequestOptions {
        timeout: Some(EXPORT_TIMEOUT),
        bypass_cache: true,
        accept: None,
    };
    let resp = client
        .get_with("/api/reports/export-csv/", &[], options)
        .await?;
    Ok(resp.into_bytes())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::testing::signed_in_client;

    #[tokio::test]
    async fn test_summaries_are_cached_separately() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/stats/admin/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pending_reviews": 3})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/stats/researcher/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"submitted": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let client = signed_in_client(&server, "t");
        for _ in 0..2 {
            let admin = admin_summary(&client).await.unwrap();
            assert_eq!(admin["pending_reviews"], 3);
            let researcher = researcher_summary(&client).await.unwrap();
            assert_eq!(researcher["submitted"], 1);
        }
    }

    #[tokio::test]
    async fn test_export_csv_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/reports/export-csv/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("id,title\n"))
            .expect(2)
            .mount(&server)
            .await;

        let client = signed_in_client(&server, "t");
        assert_eq!(export_csv(&client).await.unwrap(), b"id,title\n");
        export_csv(&client).await.unwrap();
    }
}
