use std::path::Path;
use std::sync::Arc;

use agriconnect::services::auth::{AuthError, AuthFlow, SignupForm};
use agriconnect::services::profile::UserRole;
use agriconnect::services::scanner::{CropAnalyzer, GeminiAnalyzer};
use agriconnect::services::session::SessionContext;
use agriconnect::state::AppState;
use agriconnect::storage::KvStore;

const DEMO_PHONE: &str = "9876543210";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let data_dir = std::env::var("AGRI_DATA_DIR").unwrap_or_else(|_| "data".into());
    let local = KvStore::open(Path::new(&data_dir).join("local.json")).expect("app store init failed");
    let session = KvStore::in_memory();

    // Optional capability: scanner features are simply absent without a key.
    let analyzer: Option<Arc<dyn CropAnalyzer>> = match GeminiAnalyzer::from_env() {
        Ok(client) => {
            tracing::info!("crop analyzer configured");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "crop analyzer not configured — scanner disabled");
            None
        }
    };

    let app = AppState::new(local, session, analyzer);
    let session_ctx = SessionContext::init(app.clone()).await;

    if session_ctx.is_authenticated().await {
        let snapshot = session_ctx.snapshot().await;
        tracing::info!(phone = %snapshot.phone_number, "previous session restored — logging out for a fresh run");
        session_ctx.logout().await.expect("logout failed");
    }

    run_demo(app, session_ctx).await.expect("demo flow failed");
}

/// Scripted walk-through: signup (or login on a reused data dir), OTP
/// verification, then logout.
async fn run_demo(app: AppState, session_ctx: SessionContext) -> Result<(), AuthError> {
    let mut flow = AuthFlow::signup(app.clone(), session_ctx.clone());
    let form = SignupForm {
        phone_number: DEMO_PHONE.to_owned(),
        full_name: "Asha Patel".to_owned(),
        state: "Gujarat".to_owned(),
        city: "Rajkot".to_owned(),
        role: Some(UserRole::Farmer),
    };

    match flow.submit_signup(form).await {
        Ok(intent) => tracing::info!(?intent, "signup accepted"),
        Err(AuthError::AccountExists) => {
            tracing::info!("phone already registered — switching to login");
            flow = AuthFlow::login(app, session_ctx.clone());
            let intent = flow.submit_login(DEMO_PHONE).await?;
            tracing::info!(?intent, "login accepted");
        }
        Err(e) => return Err(e),
    }

    // No SMS delivery in the demo: read the code straight off the flow.
    let code = flow.issued_code().expect("code was just issued").to_owned();
    tracing::info!(%code, "verification code (shown in lieu of SMS)");

    let intent = flow.submit_otp(&code).await?;
    let snapshot = session_ctx.snapshot().await;
    tracing::info!(
        ?intent,
        phone = %snapshot.phone_number,
        role = ?snapshot.role,
        name = %snapshot.full_name,
        "authenticated"
    );

    session_ctx.logout().await?;
    tracing::info!("logged out — demo complete");
    Ok(())
}
