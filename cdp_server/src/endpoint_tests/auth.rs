use actix_web::{
    cookie::Cookie,
    http::{header, StatusCode},
    test::TestRequest,
};
use cdp_engine::{db_types::Session, traits::AuthProviderError};

use super::{
    helpers::{call, no_provider_calls, ALICE},
    mocks::MockBackend,
};

fn exchanges_codes(db: &mut MockBackend) {
    db.expect_exchange_code_for_session().returning(|code, verifier| match (code, verifier.as_deref()) {
        ("good-code", Some("pkce-verifier")) => {
            let mut session = Session::new(ALICE, "fresh-access-token".to_string());
            session.expires_in = Some(3600);
            Ok(session)
        },
        _ => Err(AuthProviderError::ExchangeFailed("Invalid or expired authentication code".into())),
    });
}

fn no_exchange(db: &mut MockBackend) {
    db.expect_exchange_code_for_session().never();
}

fn location(headers: &header::HeaderMap) -> &str {
    headers.get(header::LOCATION).and_then(|v| v.to_str().ok()).unwrap_or_default()
}

#[actix_web::test]
async fn health() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) = call(TestRequest::get().uri("/health"), no_exchange, no_provider_calls()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn callback_without_a_code() {
    let _ = env_logger::try_init().ok();
    let (status, headers, _) = call(TestRequest::get().uri("/auth/callback"), no_exchange, no_provider_calls()).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/auth?error=No%20authentication%20code%20provided");
}

#[actix_web::test]
async fn callback_sets_the_session_cookie() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get()
        .uri("/auth/callback?code=good-code")
        .cookie(Cookie::new("sb-access-token-code-verifier", "pkce-verifier"));
    let (status, headers, _) = call(req, exchanges_codes, no_provider_calls()).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/dashboard");
    let cookies = headers
        .get_all(header::SET_COOKIE)
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| Cookie::parse(v.to_string()).ok())
        .collect::<Vec<_>>();
    let session = cookies.iter().find(|c| c.name() == "sb-access-token").expect("session cookie");
    assert_eq!(session.value(), "fresh-access-token");
    assert_eq!(session.http_only(), Some(true));
    assert_eq!(session.path(), Some("/"));
    assert_eq!(session.same_site(), Some(actix_web::cookie::SameSite::Lax));
    let verifier = cookies.iter().find(|c| c.name() == "sb-access-token-code-verifier").expect("verifier cookie");
    assert_eq!(verifier.value(), "");
}

#[actix_web::test]
async fn failed_exchange_redirects_with_the_reason() {
    let _ = env_logger::try_init().ok();
    // No verifier cookie, so the exchange is refused
    let req = TestRequest::get().uri("/auth/callback?code=good-code");
    let (status, headers, _) = call(req, exchanges_codes, no_provider_calls()).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/auth?error=Invalid%20or%20expired%20authentication%20code");
}
