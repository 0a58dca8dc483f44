use super::*;

use crate::state::test_helpers::in_memory_state;

async fn seed_local(app: &AppState, pairs: &[(&str, &str)]) {
    let mut local = app.local.write().await;
    for (k, v) in pairs {
        local.set(k, v).unwrap();
    }
}

// ===== login =====

#[tokio::test]
async fn login_sets_memory_and_durable_keys() {
    let app = in_memory_state();
    let ctx = SessionContext::init(app.clone()).await;

    ctx.login("9876543210", UserRole::Farmer, "Asha Patel", "Gujarat", "Rajkot")
        .await
        .unwrap();

    let snapshot = ctx.snapshot().await;
    assert!(snapshot.is_authenticated);
    assert_eq!(snapshot.role, Some(UserRole::Farmer));
    assert_eq!(snapshot.phone_number, "9876543210");
    assert_eq!(snapshot.full_name, "Asha Patel");
    assert_eq!(snapshot.state, "Gujarat");
    assert_eq!(snapshot.city, "Rajkot");

    let local = app.local.read().await;
    assert_eq!(local.get("isAuthenticated"), Some("true"));
    assert_eq!(local.get("userRole"), Some("farmer"));
    assert_eq!(local.get("phoneNumber"), Some("9876543210"));
    assert_eq!(local.get("fullName"), Some("Asha Patel"));
    assert_eq!(local.get("state"), Some("Gujarat"));
    assert_eq!(local.get("city"), Some("Rajkot"));
}

#[tokio::test]
async fn login_skips_empty_optional_fields() {
    let app = in_memory_state();
    let ctx = SessionContext::init(app.clone()).await;

    // Login path: only phone and role are known.
    ctx.login("9876543210", UserRole::Buyer, "", "", "").await.unwrap();

    let snapshot = ctx.snapshot().await;
    assert!(snapshot.is_authenticated);
    assert_eq!(snapshot.full_name, "");

    let local = app.local.read().await;
    assert_eq!(local.get("fullName"), None);
    assert_eq!(local.get("state"), None);
    assert_eq!(local.get("city"), None);
}

// ===== logout =====

#[tokio::test]
async fn logout_clears_fields_and_durable_keys() {
    let app = in_memory_state();
    let ctx = SessionContext::init(app.clone()).await;
    ctx.login("9876543210", UserRole::Farmer, "Asha Patel", "Gujarat", "Rajkot")
        .await
        .unwrap();

    ctx.logout().await.unwrap();

    assert_eq!(ctx.snapshot().await, SessionSnapshot::default());
    let local = app.local.read().await;
    for key in SESSION_KEYS {
        assert_eq!(local.get(key), None, "key {key} should be removed");
    }
}

#[tokio::test]
async fn fresh_hydration_after_logout_finds_no_session() {
    let app = in_memory_state();
    let ctx = SessionContext::init(app.clone()).await;
    ctx.login("9876543210", UserRole::Farmer, "Asha Patel", "Gujarat", "Rajkot")
        .await
        .unwrap();
    ctx.logout().await.unwrap();

    let rehydrated = SessionContext::init(app).await;
    assert!(!rehydrated.is_authenticated().await);
}

// ===== startup hydration =====

#[tokio::test]
async fn init_restores_complete_session() {
    let app = in_memory_state();
    seed_local(
        &app,
        &[
            ("isAuthenticated", "true"),
            ("userRole", "buyer"),
            ("phoneNumber", "1234567890"),
            ("fullName", "Ravi Kumar"),
            ("state", "Punjab"),
            ("city", "Ludhiana"),
        ],
    )
    .await;

    let ctx = SessionContext::init(app).await;
    let snapshot = ctx.snapshot().await;
    assert!(snapshot.is_authenticated);
    assert_eq!(snapshot.role, Some(UserRole::Buyer));
    assert_eq!(snapshot.phone_number, "1234567890");
    assert_eq!(snapshot.full_name, "Ravi Kumar");
}

#[tokio::test]
async fn init_without_name_fields_still_authenticates() {
    let app = in_memory_state();
    seed_local(
        &app,
        &[("isAuthenticated", "true"), ("userRole", "farmer"), ("phoneNumber", "9876543210")],
    )
    .await;

    let ctx = SessionContext::init(app).await;
    let snapshot = ctx.snapshot().await;
    assert!(snapshot.is_authenticated);
    assert_eq!(snapshot.full_name, "");
}

#[tokio::test]
async fn init_ignores_partial_keys() {
    // Flag without role.
    let app = in_memory_state();
    seed_local(&app, &[("isAuthenticated", "true"), ("phoneNumber", "9876543210")]).await;
    assert!(!SessionContext::init(app).await.is_authenticated().await);

    // Flag and role without phone.
    let app = in_memory_state();
    seed_local(&app, &[("isAuthenticated", "true"), ("userRole", "farmer")]).await;
    assert!(!SessionContext::init(app).await.is_authenticated().await);

    // Role and phone without the flag.
    let app = in_memory_state();
    seed_local(&app, &[("userRole", "farmer"), ("phoneNumber", "9876543210")]).await;
    assert!(!SessionContext::init(app).await.is_authenticated().await);
}

#[tokio::test]
async fn init_rejects_unknown_role() {
    let app = in_memory_state();
    seed_local(
        &app,
        &[("isAuthenticated", "true"), ("userRole", "admin"), ("phoneNumber", "9876543210")],
    )
    .await;
    assert!(!SessionContext::init(app).await.is_authenticated().await);
}

#[tokio::test]
async fn init_rejects_non_true_flag() {
    let app = in_memory_state();
    seed_local(
        &app,
        &[("isAuthenticated", "TRUE"), ("userRole", "farmer"), ("phoneNumber", "9876543210")],
    )
    .await;
    assert!(!SessionContext::init(app).await.is_authenticated().await);
}

// ===== handle semantics =====

#[tokio::test]
async fn clones_share_one_session() {
    let app = in_memory_state();
    let ctx = SessionContext::init(app).await;
    let other = ctx.clone();

    ctx.login("9876543210", UserRole::Farmer, "", "", "").await.unwrap();
    assert!(other.is_authenticated().await);

    other.logout().await.unwrap();
    assert!(!ctx.is_authenticated().await);
}
