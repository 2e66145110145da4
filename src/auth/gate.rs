//! Request-boundary gate for protected routes.
//!
//! The gate verifies the bearer token, then re-resolves the user from the
//! credential store by the claim's subject id. Claims are trusted only for
//! identity: a deactivated or deleted account loses access on its very next
//! request, before the token's natural expiry, at the cost of one lookup.

use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{FromRequest, HttpMessage, HttpRequest, ResponseError};
use futures::future::LocalBoxFuture;
use tracing::debug;

use crate::auth::tokens::{Identity, TokenCodec};
use crate::db::store::CredentialStore;
use crate::error::{AppError, AuthError};

/// Gate interceptor. Compose with `.wrap()` on any protected resource or
/// scope; handlers downstream receive the resolved [`Identity`] either as
/// an extractor or from request extensions.
pub struct AuthGate {
    codec: Arc<TokenCodec>,
    credentials: Arc<dyn CredentialStore>,
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self { codec, credentials }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Transform = AuthGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service: Rc::new(service),
            codec: self.codec.clone(),
            credentials: self.credentials.clone(),
        }))
    }
}

pub struct AuthGateMiddleware<S> {
    service: Rc<S>,
    codec: Arc<TokenCodec>,
    credentials: Arc<dyn CredentialStore>,
}

impl<S> AuthGateMiddleware<S> {
    /// Steps 1-4 of the gate contract: extract, verify, re-resolve, check
    /// the active flag.
    async fn resolve_identity(
        codec: &TokenCodec,
        credentials: &dyn CredentialStore,
        req: &ServiceRequest,
    ) -> Result<Identity, AppError> {
        let claims = {
            let token = TokenCodec::extract_bearer(req.headers().get(header::AUTHORIZATION))?;
            codec.verify_access_token(token)?
        };

        let user = credentials
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            debug!(user_id = %user.id, "gate rejected: account inactive");
            return Err(AuthError::AccountInactive.into());
        }

        Ok(Identity {
            id: user.id,
            email: user.email,
            role: user.role,
        })
    }
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let codec = self.codec.clone();
        let credentials = self.credentials.clone();

        Box::pin(async move {
            match Self::resolve_identity(&codec, credentials.as_ref(), &req).await {
                Ok(identity) => {
                    req.extensions_mut().insert(identity);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(err) => {
                    let response = err.error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

/// Handler-side access to the identity the gate attached. Fails
/// `Unauthenticated` when the gate did not run on this route.
impl FromRequest for Identity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Identity>()
                .cloned()
                .ok_or_else(|| AppError::from(AuthError::Unauthenticated).into()),
        )
    }
}
