//! Tests for the end-to-end authentication pipeline
//!
//! The external verification primitive is replaced with canned
//! implementations; everything else (resolver, codec, orchestrator) runs
//! for real against an in-memory database.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::extract::Extension;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use chrono::Duration;
    use jsonwebtoken::Algorithm;
    use serde_json::{json, Value};
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    use crate::auth::auth_routes;
    use crate::auth::error::AuthError;
    use crate::auth::service::AuthService;
    use crate::auth::verifier::{AssertionVerifier, VerifierError};
    use crate::common::config::AuthConfig;
    use crate::common::{ApiError, AppState};

    /// Primitive that accepts any assertion and returns a fixed payload
    struct StaticVerifier(Value);

    #[async_trait]
    impl AssertionVerifier for StaticVerifier {
        async fn verify(
            &self,
            _assertion: &str,
            _expected_audience: &str,
        ) -> Result<Value, VerifierError> {
            Ok(self.0.clone())
        }
    }

    /// Primitive that rejects everything
    struct RejectingVerifier;

    #[async_trait]
    impl AssertionVerifier for RejectingVerifier {
        async fn verify(
            &self,
            _assertion: &str,
            _expected_audience: &str,
        ) -> Result<Value, VerifierError> {
            Err(VerifierError::Rejected("signature mismatch".to_string()))
        }
    }

    fn test_config(ttl: Duration) -> AuthConfig {
        AuthConfig {
            jwt_secret: "test_secret_key".to_string(),
            jwt_algorithm: Algorithm::HS256,
            session_ttl: ttl,
            google_client_id: "client-1".to_string(),
        }
    }

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        crate::common::migrations::create_user_tables(&pool)
            .await
            .unwrap();

        pool
    }

    fn service(db: SqlitePool, primitive: Arc<dyn AssertionVerifier>, ttl: Duration) -> AuthService {
        AuthService::new(&test_config(ttl), db, primitive)
    }

    fn google_payload() -> Value {
        json!({
            "sub": "g1",
            "email": "a@x.com",
            "given_name": "A",
            "aud": "client-1",
        })
    }

    #[tokio::test]
    async fn exchange_issues_session_that_resolves_back() {
        let db = setup_test_db().await;
        let auth = service(
            db,
            Arc::new(StaticVerifier(google_payload())),
            Duration::minutes(30),
        );

        let grant = auth.exchange_assertion("some-assertion").await.unwrap();

        assert_eq!(grant.token_type, "bearer");
        assert_eq!(grant.user.email, "a@x.com");
        assert_eq!(grant.user.first_name.as_deref(), Some("A"));
        assert!(!grant.access_token.is_empty());

        let resolved = auth.resolve_session(&grant.access_token).await.unwrap();
        assert_eq!(resolved.id, grant.user.id);
        assert_eq!(resolved.email, "a@x.com");
    }

    #[tokio::test]
    async fn repeat_exchange_is_id_stable() {
        let db = setup_test_db().await;
        let auth = service(
            db.clone(),
            Arc::new(StaticVerifier(google_payload())),
            Duration::minutes(30),
        );

        let first = auth.exchange_assertion("assertion").await.unwrap();
        let second = auth.exchange_assertion("assertion").await.unwrap();

        assert_eq!(first.user.id, second.user.id);
        assert_eq!(first.user.created_at, second.user.created_at);

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn missing_email_claim_is_a_client_error() {
        let db = setup_test_db().await;
        let payload = json!({"sub": "g1", "aud": "client-1"});
        let auth = service(db, Arc::new(StaticVerifier(payload)), Duration::minutes(30));

        let err = auth.exchange_assertion("assertion").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingClaim("Email")));
        assert!(matches!(ApiError::from(err), ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn rejected_assertion_surfaces_generically() {
        let db = setup_test_db().await;
        let auth = service(db.clone(), Arc::new(RejectingVerifier), Duration::minutes(30));

        let err = auth.exchange_assertion("assertion").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidAssertion(_)));

        // The client-facing message must not leak the underlying reason
        match ApiError::from(err) {
            ApiError::Unauthorized(msg) => {
                assert_eq!(msg, "Invalid or expired Google token");
            }
            other => panic!("expected Unauthorized, got {}", other),
        }

        // No record is created for a failed exchange
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn stale_session_subject_is_unauthenticated() {
        let db = setup_test_db().await;
        let auth = service(
            db.clone(),
            Arc::new(StaticVerifier(google_payload())),
            Duration::minutes(30),
        );

        let grant = auth.exchange_assertion("assertion").await.unwrap();

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(grant.user.id)
            .execute(&db)
            .await
            .unwrap();

        let err = auth.resolve_session(&grant.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));
    }

    #[tokio::test]
    async fn expired_session_is_unauthenticated() {
        let db = setup_test_db().await;
        // A negative TTL stands in for the clock moving past the expiry
        let auth = service(
            db,
            Arc::new(StaticVerifier(google_payload())),
            Duration::minutes(-31),
        );

        let grant = auth.exchange_assertion("assertion").await.unwrap();
        let err = auth.resolve_session(&grant.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));
    }

    /// Router wired like main.rs, with the primitive replaced
    async fn test_app() -> Router {
        let db = setup_test_db().await;
        let auth = Arc::new(service(
            db.clone(),
            Arc::new(StaticVerifier(google_payload())),
            Duration::minutes(30),
        ));
        let state = AppState { db, auth };
        Router::new()
            .merge(auth_routes())
            .layer(Extension(Arc::new(RwLock::new(state))))
    }

    fn post_google(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/auth/google")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn missing_token_field_is_a_400() {
        let app = test_app().await;

        let response = app.oneshot(post_google("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn empty_token_field_is_a_400() {
        let app = test_app().await;

        for body in [r#"{"token": ""}"#, r#"{"token": "   "}"#] {
            let response = app.clone().oneshot(post_google(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        }
    }

    #[tokio::test]
    async fn me_without_authorization_header_is_a_401() {
        let app = test_app().await;

        let request = Request::builder()
            .method("GET")
            .uri("/auth/me")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn exchange_then_me_over_http() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(post_google(r#"{"token": "some-assertion"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let grant: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(grant["token_type"], "bearer");
        let access_token = grant["access_token"].as_str().unwrap();

        let request = Request::builder()
            .method("GET")
            .uri("/auth/me")
            .header("authorization", format!("Bearer {}", access_token))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let me: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(me["email"], "a@x.com");
        assert_eq!(me["id"], grant["user"]["id"]);
    }

    #[tokio::test]
    async fn garbage_session_token_is_unauthenticated() {
        let db = setup_test_db().await;
        let auth = service(
            db,
            Arc::new(StaticVerifier(google_payload())),
            Duration::minutes(30),
        );

        for token in ["", "not-a-jwt", "a.b.c"] {
            let err = auth.resolve_session(token).await.unwrap_err();
            assert!(matches!(err, AuthError::Unauthenticated));
        }
    }
}
