mod acl;
mod hmac;

pub use acl::{AclMiddlewareFactory, AclMiddlewareService};
pub use hmac::{HmacMiddlewareFactory, HmacMiddlewareService, PAYSTACK_SIGNATURE_HEADER};
