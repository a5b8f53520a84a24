// Token issuer lifecycle: register, login, refresh, logout.

mod common;

use chrono::Utc;
use common::{ctx, harness, harness_with};
use identity_service::config::TokenSettings;
use identity_service::models::NewUser;
use identity_service::security::RefreshTokenRecord;
use identity_service::IdentityError;
use std::time::Duration;
use uuid::Uuid;

fn alice() -> NewUser {
    NewUser::new(
        "alice@example.com",
        "pw123".to_string(),
        "Alice".to_string(),
        "Liddell".to_string(),
    )
}

#[tokio::test]
async fn test_alice_end_to_end() {
    let h = harness();

    let alice_id = h.issuer.register(&ctx(), alice()).await.unwrap();

    let login = h
        .issuer
        .login(&ctx(), "alice@example.com", "pw123")
        .await
        .unwrap();
    let a = login.access_token.token.clone();
    let r = login.refresh_token.clone();

    let claims = h.keys.verify(&a).unwrap();
    assert_eq!(claims.user_id().unwrap(), alice_id);
    assert!(claims.exp > Utc::now().timestamp());

    let a2 = h.issuer.refresh(&ctx(), &r).await.unwrap();
    assert_ne!(a2.token, a);
    assert_eq!(
        h.keys.verify(&a2.token).unwrap().user_id().unwrap(),
        alice_id
    );

    h.issuer.logout(&ctx(), &r).await.unwrap();

    let err = h.issuer.refresh(&ctx(), &r).await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidToken));
}

#[tokio::test]
async fn test_duplicate_registration_leaves_one_row() {
    let h = harness();

    h.issuer.register(&ctx(), alice()).await.unwrap();
    let err = h.issuer.register(&ctx(), alice()).await.unwrap_err();

    assert!(matches!(err, IdentityError::AlreadyExists));
    assert_eq!(h.users.count_with_email("alice@example.com"), 1);
}

#[tokio::test]
async fn test_register_rejects_bad_input_before_store() {
    let h = harness();

    let bad_email = NewUser::new("alice", "pw123".into(), "".into(), "".into());
    let err = h.issuer.register(&ctx(), bad_email).await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidArgument(_)));

    let no_password = NewUser::new("bob@example.com", "".into(), "".into(), "".into());
    let err = h.issuer.register(&ctx(), no_password).await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidArgument(_)));

    assert_eq!(h.users.count_with_email("bob@example.com"), 0);
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_are_indistinguishable() {
    let h = harness();
    h.issuer.register(&ctx(), alice()).await.unwrap();

    let wrong_password = h
        .issuer
        .login(&ctx(), "alice@example.com", "nope")
        .await
        .unwrap_err();
    let unknown_email = h
        .issuer
        .login(&ctx(), "mallory@example.com", "pw123")
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, IdentityError::InvalidCredentials));
    assert!(matches!(unknown_email, IdentityError::InvalidCredentials));

    let a = wrong_password.to_status();
    let b = unknown_email.to_status();
    assert_eq!(a.code(), b.code());
    assert_eq!(a.message(), b.message());

    assert_eq!(h.tokens.len(), 0);
}

#[tokio::test]
async fn test_email_is_case_sensitive_as_stored() {
    let h = harness();
    h.issuer.register(&ctx(), alice()).await.unwrap();

    let err = h
        .issuer
        .login(&ctx(), "Alice@Example.com", "pw123")
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::InvalidCredentials));

    // Surrounding whitespace is not part of the address
    assert!(h
        .issuer
        .login(&ctx(), "  alice@example.com ", "pw123")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let h = harness();
    h.issuer.register(&ctx(), alice()).await.unwrap();
    let login = h
        .issuer
        .login(&ctx(), "alice@example.com", "pw123")
        .await
        .unwrap();

    h.issuer.logout(&ctx(), &login.refresh_token).await.unwrap();
    h.issuer.logout(&ctx(), &login.refresh_token).await.unwrap();
    h.issuer.logout(&ctx(), "never-issued").await.unwrap();

    assert!(!h.tokens.contains(&login.refresh_token));
}

#[tokio::test]
async fn test_refresh_with_stored_expiry_in_past_is_rejected() {
    let h = harness();
    let user_id = h.issuer.register(&ctx(), alice()).await.unwrap();

    // Still physically present in the store
    h.tokens.insert_raw(
        "stale-token",
        RefreshTokenRecord {
            user_id,
            expires_at: Utc::now().timestamp() - 1,
        },
    );

    let err = h.issuer.refresh(&ctx(), "stale-token").await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidToken));
    assert!(!h.tokens.contains("stale-token"));
}

#[tokio::test]
async fn test_refresh_unknown_token_is_invalid() {
    let h = harness();

    let err = h.issuer.refresh(&ctx(), "garbage").await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidToken));

    let err = h.issuer.refresh(&ctx(), "").await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidToken));
}

#[tokio::test]
async fn test_refresh_reflects_current_superuser_flag() {
    let h = harness();
    let user_id = h.issuer.register(&ctx(), alice()).await.unwrap();
    let login = h
        .issuer
        .login(&ctx(), "alice@example.com", "pw123")
        .await
        .unwrap();
    assert!(!login.access_token.claims.is_superuser);

    h.users.set_superuser(user_id, true);

    let refreshed = h.issuer.refresh(&ctx(), &login.refresh_token).await.unwrap();
    assert!(h.keys.verify(&refreshed.token).unwrap().is_superuser);
}

#[tokio::test]
async fn test_refresh_for_deleted_user_is_invalid() {
    let h = harness();
    let user_id = h.issuer.register(&ctx(), alice()).await.unwrap();
    let login = h
        .issuer
        .login(&ctx(), "alice@example.com", "pw123")
        .await
        .unwrap();

    h.users.remove(user_id);

    let err = h
        .issuer
        .refresh(&ctx(), &login.refresh_token)
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::InvalidToken));
}

#[tokio::test]
async fn test_refresh_does_not_rotate() {
    let h = harness();
    h.issuer.register(&ctx(), alice()).await.unwrap();
    let login = h
        .issuer
        .login(&ctx(), "alice@example.com", "pw123")
        .await
        .unwrap();

    for _ in 0..3 {
        h.issuer.refresh(&ctx(), &login.refresh_token).await.unwrap();
    }
    assert!(h.tokens.contains(&login.refresh_token));
}

#[tokio::test]
async fn test_multiple_sessions_are_independent() {
    let h = harness();
    h.issuer.register(&ctx(), alice()).await.unwrap();

    let phone = h
        .issuer
        .login(&ctx(), "alice@example.com", "pw123")
        .await
        .unwrap();
    let laptop = h
        .issuer
        .login(&ctx(), "alice@example.com", "pw123")
        .await
        .unwrap();
    assert_ne!(phone.refresh_token, laptop.refresh_token);

    h.issuer.logout(&ctx(), &phone.refresh_token).await.unwrap();

    assert!(h.issuer.refresh(&ctx(), &laptop.refresh_token).await.is_ok());
    assert!(h.issuer.refresh(&ctx(), &phone.refresh_token).await.is_err());
}

#[tokio::test]
async fn test_token_store_outage_fails_login() {
    let h = harness();
    h.issuer.register(&ctx(), alice()).await.unwrap();
    h.tokens.set_unavailable(true);

    let err = h
        .issuer
        .login(&ctx(), "alice@example.com", "pw123")
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::Unavailable(_)));
}

#[tokio::test]
async fn test_out_of_range_refresh_ttl_fails_login_without_storing() {
    for secs in [u64::MAX, i64::MAX as u64] {
        let h = harness_with(TokenSettings {
            refresh_ttl: Duration::from_secs(secs),
            ..TokenSettings::default()
        });
        h.issuer.register(&ctx(), alice()).await.unwrap();

        let err = h
            .issuer
            .login(&ctx(), "alice@example.com", "pw123")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Internal(_)));
        assert_eq!(h.tokens.len(), 0);
    }
}

#[tokio::test]
async fn test_get_user_info() {
    let h = harness();
    let user_id = h.issuer.register(&ctx(), alice()).await.unwrap();

    let user = h.issuer.get_user_info(user_id).await.unwrap();
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.first_name, "Alice");

    let err = h.issuer.get_user_info(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, IdentityError::NotFound));
}
