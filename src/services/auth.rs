//! Authentication state machine — login, signup, OTP verification.
//!
//! ARCHITECTURE
//! ============
//! `AuthFlow` drives the multi-step phone auth flow:
//!
//! ```text
//!   LoggingIn ──(submit phone, profile exists)──┐
//!                                               ├──→ AwaitingOtp ──(code match)──→ Authenticated
//!   SigningUp ──(submit form, phone unclaimed)──┘        │ ↺ resend / wrong code
//! ```
//!
//! Guard ordering matters: existence checks (`UserNotFound`, `AccountExists`)
//! run before any OTP is issued, so a request that will be rejected never
//! produces a code. The login and signup paths converge at verification —
//! whether a role was collected decides between loading the stored profile
//! and creating a new one — and both end with the same terminal action: set
//! the session, clear the OTP record, clear the draft.
//!
//! ERROR HANDLING
//! ==============
//! Every failure leaves the machine in its current stage so the user can
//! correct input and resubmit. Nothing here is fatal and nothing retries.
//!
//! CONCURRENCY
//! ===========
//! Each submit passes through an artificial delay standing in for a network
//! round-trip. A `submitting` flag rejects a second trigger while one is
//! pending, and the delay runs under a `CancellationToken` — never cancelled
//! today, but the seam is where a timeout would go.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::services::draft::{self, DraftField};
use crate::services::otp::{self, OTP_LEN};
use crate::services::profile::{self, ProfileError, UserProfile, UserRole};
use crate::services::session::{SessionContext, SessionError};
use crate::state::{AppState, env_parse};
use crate::storage::StorageError;

const PHONE_LEN: usize = 10;
const DEFAULT_SUBMIT_DELAY_MS: u64 = 800;

/// Where the flow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    LoggingIn,
    SigningUp,
    AwaitingOtp,
    Authenticated,
}

/// Which screen the caller should show next. Returned instead of navigating
/// directly so routing stays out of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationIntent {
    VerifyOtp,
    Dashboard,
}

/// Errors from the auth flow. All recoverable: the stage is unchanged after
/// any of these.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("phone number must be exactly {PHONE_LEN} digits")]
    InvalidPhone,
    #[error("name, state, city and role are all required")]
    IncompleteSignup,
    #[error("no account found for this phone number")]
    UserNotFound,
    #[error("an account already exists for this phone number")]
    AccountExists,
    #[error("incorrect verification code")]
    InvalidOtp,
    #[error("verified login has no matching profile")]
    ProfileNotFound,
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("operation not valid in the current stage")]
    WrongStage,
    #[error("submission cancelled")]
    Cancelled,
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("profile error: {0}")]
    Profile(#[from] ProfileError),
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

/// Everything the signup screen collects.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub phone_number: String,
    pub full_name: String,
    pub state: String,
    pub city: String,
    pub role: Option<UserRole>,
}

/// One user's pass through the auth flow. Created per entry screen;
/// discarded once `Authenticated`.
pub struct AuthFlow {
    app: AppState,
    session_ctx: SessionContext,
    stage: AuthStage,
    /// Phone the pending OTP belongs to.
    pending_phone: String,
    /// Collected signup form; `None` means the login path (no role was
    /// selected this session, which is how the paths are told apart).
    pending_signup: Option<SignupForm>,
    /// Last generated code, kept in memory as a fallback if the stored
    /// record goes missing (observed source behavior, kept deliberately).
    last_sent: Option<String>,
    submitting: bool,
    delay: Duration,
    cancel: CancellationToken,
}

impl AuthFlow {
    /// Start from the login screen.
    #[must_use]
    pub fn login(app: AppState, session_ctx: SessionContext) -> Self {
        Self::new(app, session_ctx, AuthStage::LoggingIn)
    }

    /// Start from the signup screen.
    #[must_use]
    pub fn signup(app: AppState, session_ctx: SessionContext) -> Self {
        Self::new(app, session_ctx, AuthStage::SigningUp)
    }

    fn new(app: AppState, session_ctx: SessionContext, stage: AuthStage) -> Self {
        Self {
            app,
            session_ctx,
            stage,
            pending_phone: String::new(),
            pending_signup: None,
            last_sent: None,
            submitting: false,
            delay: Duration::from_millis(env_parse("AUTH_SUBMIT_DELAY_MS", DEFAULT_SUBMIT_DELAY_MS)),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn stage(&self) -> AuthStage {
        self.stage
    }

    /// True while a submission's simulated round-trip is pending. The UI
    /// disables its submit control off this.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Token governing the simulated round-trip. Cancelling it makes any
    /// in-flight submit return [`AuthError::Cancelled`] with the stage
    /// unchanged.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The code most recently issued in this flow. Demo surface: with no
    /// real SMS delivery the app shows the code to the user itself.
    #[must_use]
    pub fn issued_code(&self) -> Option<&str> {
        self.last_sent.as_deref()
    }

    /// Submit a phone number from the login screen.
    ///
    /// # Errors
    ///
    /// `InvalidPhone` for anything but 10 digits, `UserNotFound` when no
    /// profile is registered for the phone (checked before any OTP is
    /// issued), plus storage/profile failures.
    pub async fn submit_login(&mut self, phone: &str) -> Result<NavigationIntent, AuthError> {
        self.begin_submit(AuthStage::LoggingIn)?;
        let result = self.do_submit_login(phone).await;
        self.submitting = false;
        result
    }

    async fn do_submit_login(&mut self, phone: &str) -> Result<NavigationIntent, AuthError> {
        if !is_valid_phone(phone) {
            return Err(AuthError::InvalidPhone);
        }
        self.network_delay().await?;

        let existing = {
            let local = self.app.local.read().await;
            profile::find_profile(&local, phone)?
        };
        if existing.is_none() {
            warn!(%phone, "login for unregistered phone");
            return Err(AuthError::UserNotFound);
        }

        let code = otp::generate_otp(OTP_LEN);
        {
            let mut session = self.app.session.write().await;
            otp::store_otp(&mut session, phone, &code)?;
            draft::save_draft_field(&mut session, DraftField::Phone, phone)?;
        }
        debug!(%code, "login verification code generated");
        info!(%phone, "login verification code issued");

        self.last_sent = Some(code);
        self.pending_phone = phone.to_owned();
        self.pending_signup = None;
        self.stage = AuthStage::AwaitingOtp;
        Ok(NavigationIntent::VerifyOtp)
    }

    /// Submit the signup form.
    ///
    /// # Errors
    ///
    /// `InvalidPhone` / `IncompleteSignup` for failed field guards,
    /// `AccountExists` when the phone already has a profile (checked before
    /// any OTP is issued), plus storage/profile failures.
    pub async fn submit_signup(&mut self, form: SignupForm) -> Result<NavigationIntent, AuthError> {
        self.begin_submit(AuthStage::SigningUp)?;
        let result = self.do_submit_signup(form).await;
        self.submitting = false;
        result
    }

    async fn do_submit_signup(&mut self, form: SignupForm) -> Result<NavigationIntent, AuthError> {
        let role = validate_signup(&form)?;
        self.network_delay().await?;

        let existing = {
            let local = self.app.local.read().await;
            profile::find_profile(&local, &form.phone_number)?
        };
        if existing.is_some() {
            warn!(phone = %form.phone_number, "signup for already-registered phone");
            return Err(AuthError::AccountExists);
        }

        let code = otp::generate_otp(OTP_LEN);
        {
            let mut session = self.app.session.write().await;
            otp::store_otp(&mut session, &form.phone_number, &code)?;
            draft::save_draft_field(&mut session, DraftField::Phone, &form.phone_number)?;
            draft::save_draft_field(&mut session, DraftField::Name, &form.full_name)?;
            draft::save_draft_field(&mut session, DraftField::State, &form.state)?;
            draft::save_draft_field(&mut session, DraftField::City, &form.city)?;
            draft::save_draft_field(&mut session, DraftField::Role, role.as_str())?;
        }
        debug!(%code, "signup verification code generated");
        info!(phone = %form.phone_number, role = role.as_str(), "signup verification code issued");

        self.last_sent = Some(code);
        self.pending_phone = form.phone_number.clone();
        self.pending_signup = Some(form);
        self.stage = AuthStage::AwaitingOtp;
        Ok(NavigationIntent::VerifyOtp)
    }

    /// Submit the verification code.
    ///
    /// On a match, exactly one of two things happens: the signup path
    /// creates and stores a new profile, or the login path loads the
    /// existing one. Either way the session is authenticated, the OTP
    /// record deleted and the draft cleared.
    ///
    /// # Errors
    ///
    /// `InvalidOtp` on a wrong-shape or mismatched code (OTP record kept so
    /// the user can retry), `ProfileNotFound` if a verified login has no
    /// stored profile (unreachable unless the store was tampered with
    /// between steps), plus storage/profile/session failures.
    pub async fn submit_otp(&mut self, code: &str) -> Result<NavigationIntent, AuthError> {
        self.begin_submit(AuthStage::AwaitingOtp)?;
        let result = self.do_submit_otp(code).await;
        self.submitting = false;
        result
    }

    async fn do_submit_otp(&mut self, code: &str) -> Result<NavigationIntent, AuthError> {
        if code.len() != OTP_LEN || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(AuthError::InvalidOtp);
        }
        self.network_delay().await?;

        let stored = {
            let session = self.app.session.read().await;
            otp::retrieve_otp(&session, &self.pending_phone)
        };
        // Storage is the source of truth; the in-memory copy only covers a
        // cleared-underneath-us record.
        let Some(expected) = stored.or_else(|| self.last_sent.clone()) else {
            warn!(phone = %self.pending_phone, "no verification code on record");
            return Err(AuthError::InvalidOtp);
        };
        if !otp::verify_otp(code, &expected) {
            warn!(phone = %self.pending_phone, "verification code mismatch");
            return Err(AuthError::InvalidOtp);
        }

        if let Some(form) = self.pending_signup.clone() {
            // Signup path: the role collected this session marks it.
            let Some(role) = form.role else {
                return Err(AuthError::IncompleteSignup);
            };
            let new_profile = UserProfile {
                phone_number: form.phone_number.clone(),
                full_name: form.full_name.clone(),
                state: form.state.clone(),
                city: form.city.clone(),
                role,
                created_at: profile::now_unix_ms(),
            };
            {
                let mut local = self.app.local.write().await;
                profile::upsert_profile(&mut local, &new_profile)?;
            }
            self.session_ctx
                .login(&new_profile.phone_number, role, &new_profile.full_name, &new_profile.state, &new_profile.city)
                .await?;
            info!(phone = %new_profile.phone_number, role = role.as_str(), "signup verified, profile created");
        } else {
            // Login path: the profile must already exist.
            let stored_profile = {
                let local = self.app.local.read().await;
                profile::find_profile(&local, &self.pending_phone)?
            };
            let Some(stored_profile) = stored_profile else {
                warn!(phone = %self.pending_phone, "verified login but no profile on record");
                return Err(AuthError::ProfileNotFound);
            };
            self.session_ctx
                .login(
                    &stored_profile.phone_number,
                    stored_profile.role,
                    &stored_profile.full_name,
                    &stored_profile.state,
                    &stored_profile.city,
                )
                .await?;
            info!(phone = %stored_profile.phone_number, "login verified, profile loaded");
        }

        {
            let mut session = self.app.session.write().await;
            otp::clear_otp(&mut session, &self.pending_phone)?;
            draft::clear_draft(&mut session)?;
        }
        self.last_sent = None;
        self.pending_signup = None;
        self.stage = AuthStage::Authenticated;
        Ok(NavigationIntent::Dashboard)
    }

    /// Issue a fresh code for the pending phone, replacing the previous one.
    ///
    /// # Errors
    ///
    /// `WrongStage` outside `AwaitingOtp`, plus storage failures.
    pub async fn resend_otp(&mut self) -> Result<(), AuthError> {
        if self.stage != AuthStage::AwaitingOtp {
            return Err(AuthError::WrongStage);
        }
        let code = otp::generate_otp(OTP_LEN);
        {
            let mut session = self.app.session.write().await;
            otp::store_otp(&mut session, &self.pending_phone, &code)?;
        }
        debug!(%code, "resent verification code generated");
        info!(phone = %self.pending_phone, "verification code resent");
        self.last_sent = Some(code);
        Ok(())
    }

    fn begin_submit(&mut self, expected: AuthStage) -> Result<(), AuthError> {
        if self.submitting {
            return Err(AuthError::SubmissionInFlight);
        }
        if self.stage != expected {
            return Err(AuthError::WrongStage);
        }
        self.submitting = true;
        Ok(())
    }

    /// Simulated network round-trip. Completes normally, or early with
    /// `Cancelled` if the flow's token fires first.
    async fn network_delay(&self) -> Result<(), AuthError> {
        tokio::select! {
            () = self.cancel.cancelled() => Err(AuthError::Cancelled),
            () = tokio::time::sleep(self.delay) => Ok(()),
        }
    }
}

fn is_valid_phone(phone: &str) -> bool {
    phone.len() == PHONE_LEN && phone.chars().all(|c| c.is_ascii_digit())
}

fn validate_signup(form: &SignupForm) -> Result<UserRole, AuthError> {
    if !is_valid_phone(&form.phone_number) {
        return Err(AuthError::InvalidPhone);
    }
    if form.full_name.trim().is_empty() || form.state.trim().is_empty() || form.city.trim().is_empty() {
        return Err(AuthError::IncompleteSignup);
    }
    form.role.ok_or(AuthError::IncompleteSignup)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
