//! Role-based authorization policy, applied after the gate.

use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{HttpMessage, ResponseError};
use futures::future::LocalBoxFuture;
use tracing::debug;

use crate::auth::tokens::Identity;
use crate::db::models::Role;
use crate::error::{AppError, AuthError};

/// Allow-list guard. A missing identity means the gate was skipped — that is
/// a wiring bug, but it is still checked and rejected rather than assumed.
/// Passing requests flow through unchanged.
pub struct RequireRole {
    allowed: Rc<Vec<Role>>,
}

impl RequireRole {
    pub fn any_of(allowed: &[Role]) -> Self {
        Self {
            allowed: Rc::new(allowed.to_vec()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Transform = RequireRoleMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            allowed: Rc::clone(&self.allowed),
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    allowed: Rc<Vec<Role>>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
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
        let allowed = Rc::clone(&self.allowed);

        Box::pin(async move {
            let decision = {
                let extensions = req.extensions();
                match extensions.get::<Identity>() {
                    None => Err(AuthError::Unauthenticated),
                    Some(identity) if !allowed.contains(&identity.role) => {
                        debug!(user_id = %identity.id, role = %identity.role, "policy rejected");
                        Err(AuthError::Forbidden)
                    }
                    Some(_) => Ok(()),
                }
            };

            match decision {
                Ok(()) => service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_left_body),
                Err(err) => {
                    let response = AppError::from(err).error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}
