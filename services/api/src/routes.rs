use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use esgine::compliance::{compliance_router, ComplianceService, RuleSetSource};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_compliance_routes<S>(service: Arc<ComplianceService<S>>) -> axum::Router
where
    S: RuleSetSource + 'static,
{
    compliance_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::FileRuleSetSource;
    use axum::body::Body;
    use axum::http::Request;
    use esgine::config::{FrameworkCatalog, RulesConfig};
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn shipped_rules_service() -> Arc<ComplianceService<FileRuleSetSource>> {
        let rules_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../rules");
        let source = FileRuleSetSource::new(RulesConfig {
            rules_dir,
            catalog: FrameworkCatalog::standard(),
        });
        Arc::new(ComplianceService::new(Arc::new(source)))
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn shipped_frameworks_evaluate_over_http() {
        let router = with_compliance_routes(shipped_rules_service());
        let payload = json!({
            "framework": "uk-fca",
            "report": {
                "climate_disclosure": "TCFD-aligned disclosure covering governance and strategy",
                "risk_management": "Climate risks are integrated into enterprise risk management",
            },
        });

        let response = router
            .oneshot(
                Request::post("/api/v1/compliance/evaluate")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::to_vec(&payload).expect("payload encodes"),
                    ))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        let body: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
        let total = body["passed"].as_u64().unwrap_or(0) + body["failed"].as_u64().unwrap_or(0);
        assert!(total > 0);
        assert_eq!(body["rule_results"][0]["field"], "climate_disclosure");
        assert_eq!(body["rule_results"][0]["status"], true);
    }

    #[tokio::test]
    async fn every_catalog_entry_has_a_shipped_rule_file() {
        let service = shipped_rules_service();

        for entry in service.frameworks() {
            let rule_set = service
                .resolve_rules(None, Some(&entry.key))
                .unwrap_or_else(|err| panic!("{} failed to load: {err}", entry.key));
            assert!(!rule_set.is_empty(), "{} has no rules", entry.key);
        }
    }
}
