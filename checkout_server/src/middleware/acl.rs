//! Access control list middleware for the checkout server.
//! This middleware can be placed on any route or service.
//!
//! It validates the bearer token on the incoming request and stores the claims in the request extensions, where the
//! [`JwtClaims`] extractor picks them up. Callers without a valid token get a 401. Blocked callers, and callers without
//! every one of the required roles, get a 403.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
    HttpMessage,
};
use checkout_engine::db_types::Role;
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::{
    auth::{JwtClaims, TokenValidator},
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_roles: self.required_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let claims = check_access(&req, &required_roles).map_err(|e| {
                debug!("🔐️ {} {} denied. {e}", req.method(), req.path());
                ServerError::AuthenticationError(e)
            })?;
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}

fn check_access(req: &ServiceRequest, required_roles: &[Role]) -> Result<JwtClaims, AuthError> {
    let existing = req.extensions().get::<JwtClaims>().cloned();
    let claims = match existing {
        Some(claims) => claims,
        None => {
            let validator = req.app_data::<web::Data<TokenValidator>>().ok_or_else(|| {
                error!("🔐️ No token validator has been configured for this server");
                AuthError::ValidationError("Tokens cannot be validated".to_string())
            })?;
            validator.authenticate(req.headers())?
        },
    };
    if claims.blocked {
        return Err(AuthError::AccountBlocked);
    }
    if required_roles.iter().all(|role| claims.has_role(*role)) {
        Ok(claims)
    } else {
        Err(AuthError::InsufficientPermissions("Admin only".to_string()))
    }
}
