//! Authentication service
//!
//! Handles sign-up, sign-in, session refresh, and sign-out.

use roomchat_common::validate_password_strength;
use roomchat_core::validation::validate_username;
use roomchat_core::{AuthUser, Session};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::dto::{AuthResponse, SignInRequest, SignUpRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create an account and its profile, then sign in
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn sign_up(&self, request: SignUpRequest) -> ServiceResult<AuthResponse> {
        request.validate()?;
        validate_username(&request.username)?;
        validate_password_strength(&request.password)?;

        let (session, profile) = self
            .ctx
            .auth()
            .sign_up(request.email.trim(), &request.password, &request.username)
            .await?;

        self.ctx.session().set(session.clone());
        info!(user_id = %profile.id, "Account created");

        Ok(AuthResponse { session, profile })
    }

    /// Sign in with email and password
    #[instrument(skip(self, request))]
    pub async fn sign_in(&self, request: SignInRequest) -> ServiceResult<AuthResponse> {
        request.validate()?;

        let session = self
            .ctx
            .auth()
            .sign_in(request.email.trim(), &request.password)
            .await?;

        let profile = self
            .ctx
            .profiles()
            .find_by_id(session.user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Profile", session.user_id))?;

        self.ctx.session().set(session.clone());
        info!(user_id = %session.user_id, "Signed in");

        Ok(AuthResponse { session, profile })
    }

    /// Current session, if signed in
    pub fn current_session(&self) -> Option<Session> {
        self.ctx.session().current()
    }

    /// Identity behind the current access token
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> ServiceResult<AuthUser> {
        let session = self
            .ctx
            .session()
            .current()
            .ok_or(ServiceError::NotAuthenticated)?;

        Ok(self.ctx.auth().verify_access_token(&session.access_token).await?)
    }

    /// Rotate the refresh token; the old one stops working
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> ServiceResult<Session> {
        let refresh_token = self.ctx.session().refresh_token()?;

        match self.ctx.auth().refresh(&refresh_token).await {
            Ok(session) => {
                self.ctx.session().set(session.clone());
                Ok(session)
            }
            Err(e) if e.is_authentication() => {
                // Revoked or expired upstream: nothing left to keep locally
                warn!("Refresh rejected, clearing session");
                self.ctx.session().clear();
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Sign out: drop local state, then revoke the refresh token
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> ServiceResult<()> {
        let Some(session) = self.ctx.session().clear() else {
            return Ok(());
        };

        self.ctx.auth().sign_out(&session.refresh_token).await?;
        info!(user_id = %session.user_id, "Signed out");

        Ok(())
    }
}
