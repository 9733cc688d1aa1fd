//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, gateway calls) should be
//! expressed as futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus
//! don’t block execution.
use actix_web::{get, web, HttpResponse, Responder};
use checkout_engine::{
    db_types::{OrderId, Role},
    payment_objects::{CheckoutRequest, PollRequest},
    traits::{CheckoutDatabase, OrderManagement, PaymentGateway, SettingsManagement, SettlementOutcome},
    AdminApi,
    CheckoutFlowApi,
    OrdersApi,
    SettingsApi,
    SettlementApi,
};
use log::*;
use paystack_tools::WebhookEvent;

use crate::{
    auth::JwtClaims,
    data_objects::{
        DeliveryFeeRequest,
        DeliveryFeeResponse,
        JsonResponse,
        OrdersQuery,
        StatusUpdateRequest,
        TrackingNoteRequest,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// Each bound becomes a type parameter of the handler, in the order given.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:ty),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

fn parse_order_id(raw: &str) -> Result<OrderId, ServerError> {
    raw.parse::<OrderId>().map_err(|e| ServerError::InvalidRequestPath(format!("{raw} is not a valid order id. {e}")))
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Settings  ----------------------------------------------------
route!(delivery_fee => Get "/settings/delivery_fee" impl SettingsManagement);
/// The delivery fee the next checkout will be charged, in pesewas. The storefront shows this before checkout; the
/// checkout route looks the fee up again, so the client never supplies it.
pub async fn delivery_fee<B: SettingsManagement>(
    api: web::Data<SettingsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET delivery fee");
    let delivery_fee = api.delivery_fee().await?;
    Ok(HttpResponse::Ok().json(DeliveryFeeResponse { delivery_fee }))
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout" impl CheckoutDatabase, PaymentGateway where requires [Role::User]);
/// Route handler for the checkout endpoint
///
/// Reserves the stock for the cart, creates the order and asks the payment provider to prompt the payer's phone. The
/// response carries the payment reference that the client polls with, and guidance on how the payer completes the
/// payment.
///
/// Stock problems are reported with a 409 that names the offending item. If the provider cannot be reached, the
/// reservation is released and a 503 is returned.
pub async fn checkout<B, G>(
    claims: JwtClaims,
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutFlowApi<B, G>>,
    settings: web::Data<SettingsApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    let principal = claims.principal();
    debug!("💻️ POST checkout for {}", principal.id);
    let delivery_fee = settings.delivery_fee().await?;
    let result = api.checkout(&principal, body.into_inner(), delivery_fee).await.map_err(|e| {
        debug!("💻️ Checkout for {} failed. {e}", principal.id);
        ServerError::from(e)
    })?;
    info!("💻️ Order {} checked out by {}. Payment reference [{}]", result.order_id, principal.id, result.reference);
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(verify_payment => Post "/payments/verify" impl CheckoutDatabase, PaymentGateway where requires [Role::User]);
/// Route handler for the payment poll endpoint
///
/// Clients call this repeatedly after checkout until the status is `success` or `failed`. Terminal payments are
/// answered locally. Pending ones are checked with the provider, and the verdict is applied to the order if there is
/// one. Only the payer or an admin can poll a payment.
pub async fn verify_payment<B, G>(
    claims: JwtClaims,
    body: web::Json<PollRequest>,
    api: web::Data<SettlementApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    let reference = body.into_inner().reference.trim().to_string();
    if reference.is_empty() {
        return Err(ServerError::InvalidRequestBody("Missing reference".to_string()));
    }
    let principal = claims.principal();
    trace!("💻️ POST verify [{reference}] for {}", principal.id);
    let result = api.poll(&principal, &reference).await?;
    debug!("💻️ Payment [{reference}] is {}", result.status);
    Ok(HttpResponse::Ok().json(result))
}

route!(my_payments => Get "/payments" impl OrderManagement where requires [Role::User]);
pub async fn my_payments<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_payments for {}", claims.sub);
    let payments = api.my_payments(&claims.principal()).await?;
    Ok(HttpResponse::Ok().json(payments))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(my_orders => Get "/orders" impl OrderManagement where requires [Role::User]);
/// Authenticated users fetch their own orders, newest first. The customer id is taken from the access token.
pub async fn my_orders<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for {}", claims.sub);
    let orders = api.my_orders(&claims.principal()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(my_order => Get "/orders/{order_id}" impl OrderManagement where requires [Role::User]);
/// The order with its line items, tracking notes and payment. Orders belonging to someone else return a 404.
pub async fn my_order<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = parse_order_id(&path.into_inner())?;
    debug!("💻️ GET order {order_id} for {}", claims.sub);
    let order = api.my_order(&claims.principal(), order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(paystack_webhook => Post "/webhook" impl CheckoutDatabase, PaymentGateway);
/// Route handler for Paystack webhook notifications
///
/// The HMAC middleware has already checked the signature by the time this runs. The event status in the body is never
/// trusted: the reference is looked up with Paystack, and only the verified status is applied.
///
/// Paystack retries anything that isn't a 2xx, so events we cannot act on (no reference, a reference we never issued,
/// Paystack being unreachable) are still acknowledged with a 200. Unreachable-gateway cases are picked up again by the
/// client poll or the expiry worker.
pub async fn paystack_webhook<B, G>(
    body: web::Bytes,
    api: web::Data<SettlementApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    let event = serde_json::from_slice::<WebhookEvent>(&body).map_err(|e| {
        warn!("💻️ Could not parse Paystack webhook body. {e}");
        ServerError::InvalidRequestBody("Invalid JSON".to_string())
    })?;
    let Some(reference) = event.reference() else {
        info!("💻️ Ignoring Paystack '{}' event without a reference", event.event);
        return Ok(HttpResponse::Ok().json(JsonResponse::success("Event ignored. It has no reference.")));
    };
    debug!("💻️ Paystack '{}' event for [{reference}]", event.event);
    let response = match api.verify_and_settle(reference).await {
        Ok(SettlementOutcome::UnknownReference) => JsonResponse::success("Event ignored. Unknown reference."),
        Ok(SettlementOutcome::AlreadySettled { payment }) => {
            JsonResponse::success(format!("Payment was already settled as {}.", payment.status))
        },
        Ok(SettlementOutcome::Pending { .. }) => JsonResponse::success("Payment is still pending."),
        Ok(SettlementOutcome::Settled { payment, order }) => {
            info!("💻️ Paystack webhook settled [{reference}] as {}. {order}", payment.status);
            JsonResponse::success(format!("Payment settled as {}.", payment.status))
        },
        Err(e) => {
            warn!("💻️ Could not process Paystack webhook for [{reference}]. {e}");
            JsonResponse::failure("Payment could not be verified. It will be retried.")
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Admin  ----------------------------------------------------
route!(kpis => Get "/kpis" impl CheckoutDatabase where requires [Role::Admin]);
/// Sales, order counts by status, payment count and variants running low on stock.
pub async fn kpis<B: CheckoutDatabase>(
    claims: JwtClaims,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET kpis for {}", claims.sub);
    let kpis = api.kpis(&claims.principal()).await?;
    Ok(HttpResponse::Ok().json(kpis))
}

route!(orders => Get "/orders" impl CheckoutDatabase where requires [Role::Admin]);
/// All orders, newest first, optionally filtered with `?status=pending|paid|failed|fulfilled`.
pub async fn orders<B: CheckoutDatabase>(
    claims: JwtClaims,
    query: web::Query<OrdersQuery>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let status = query.status().map_err(ServerError::InvalidRequestPath)?;
    debug!("💻️ GET orders ({status:?}) for {}", claims.sub);
    let orders = api.orders(&claims.principal(), status).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl CheckoutDatabase where requires [Role::Admin]);
pub async fn order_by_id<B: CheckoutDatabase>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = parse_order_id(&path.into_inner())?;
    debug!("💻️ GET order {order_id} for admin {}", claims.sub);
    let order = api.order(&claims.principal(), order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(set_order_status => Post "/orders/{order_id}/status" impl CheckoutDatabase where requires [Role::Admin]);
/// Manual status override. Only `pending → paid` and `paid → fulfilled` are allowed; everything else is a 409 and
/// leaves the order as it was. Stock is not touched.
pub async fn set_order_status<B: CheckoutDatabase>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = parse_order_id(&path.into_inner())?;
    let status = body.status().map_err(ServerError::InvalidRequestBody)?;
    info!("💻️ {} is moving order {order_id} to {status}", claims.sub);
    let order = api.set_status(&claims.principal(), order_id, status).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Post "/orders/{order_id}/cancel" impl CheckoutDatabase where requires [Role::Admin]);
/// Cancels a pending order and releases its stock. Paid, fulfilled and failed orders cannot be cancelled.
pub async fn cancel_order<B: CheckoutDatabase>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = parse_order_id(&path.into_inner())?;
    info!("💻️ {} is cancelling order {order_id}", claims.sub);
    let order = api.cancel(&claims.principal(), order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(add_tracking_note => Post "/orders/{order_id}/notes" impl CheckoutDatabase where requires [Role::Admin]);
pub async fn add_tracking_note<B: CheckoutDatabase>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<TrackingNoteRequest>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = parse_order_id(&path.into_inner())?;
    let TrackingNoteRequest { note, label } = body.into_inner();
    debug!("💻️ {} is adding a tracking note to order {order_id}", claims.sub);
    let notes = api.add_tracking_note(&claims.principal(), order_id, &note, label.as_deref()).await?;
    Ok(HttpResponse::Ok().json(notes))
}

route!(payments => Get "/payments" impl CheckoutDatabase where requires [Role::Admin]);
pub async fn payments<B: CheckoutDatabase>(
    claims: JwtClaims,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET payments for {}", claims.sub);
    let payments = api.payments(&claims.principal()).await?;
    Ok(HttpResponse::Ok().json(payments))
}

route!(payment_by_reference => Get "/payments/{reference}" impl CheckoutDatabase where requires [Role::Admin]);
/// The payment, including the provider's raw payload, with the order it pays for.
pub async fn payment_by_reference<B: CheckoutDatabase>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let reference = path.into_inner();
    debug!("💻️ GET payment [{reference}] for {}", claims.sub);
    let payment = api.payment(&claims.principal(), &reference).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(set_delivery_fee => Post "/settings/delivery_fee" impl CheckoutDatabase where requires [Role::Admin]);
/// Sets the delivery fee for future checkouts. The fee is given in cedis, e.g. `{"delivery_fee_ghs": 25}`. Orders that
/// already exist keep the fee they were created with.
pub async fn set_delivery_fee<B: CheckoutDatabase>(
    claims: JwtClaims,
    body: web::Json<DeliveryFeeRequest>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let fee = body.fee().map_err(ServerError::InvalidRequestBody)?;
    info!("💻️ {} is setting the delivery fee to {fee}", claims.sub);
    let delivery_fee = api.set_delivery_fee(&claims.principal(), fee).await?;
    Ok(HttpResponse::Ok().json(DeliveryFeeResponse { delivery_fee }))
}
