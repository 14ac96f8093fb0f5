//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into a separate module.
//! Keep this module neat and tidy 🙏
//!
//! Webhook handlers never block the worker thread: reconciliation is all awaited I/O against the persistence layer,
//! and notification dispatch happens on a channel, off the request path entirely.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use boutique_payment_engine::{
    provider_events::PaymentEvent,
    traits::PaymentReconciliationDatabase,
    ReconciliationApi,
};
use log::*;

use crate::data_objects::WebhookAck;

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
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
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// -------------------------------------------   Order webhook  ------------------------------------------------
route!(order_webhook => Post "/order" impl PaymentReconciliationDatabase);
pub async fn order_webhook<B>(
    req: HttpRequest,
    body: web::Json<PaymentEvent>,
    api: web::Data<ReconciliationApi<B>>,
) -> HttpResponse
where
    B: PaymentReconciliationDatabase,
{
    trace!("🛒️ Received order payment webhook request: {}", req.uri());
    let event = body.into_inner();
    // Webhook responses must always be in the 200 range, otherwise the provider will keep retrying. The ledger, not
    // this response, records whether we actually handled the event.
    match api.process_order_event(&event).await {
        Ok(outcome) => info!("🛒️ Event [{}] ({}): {outcome}", event.event_id, event.event_type()),
        Err(e) => {
            error!(
                "🛒️ Infrastructure failure while handling event [{}]: {e}. The event remains retryable.",
                event.event_id
            );
        },
    }
    HttpResponse::Ok().json(WebhookAck::received())
}

// ----------------------------------------   Reservation webhook  ---------------------------------------------
route!(reservation_webhook => Post "/reservation" impl PaymentReconciliationDatabase);
pub async fn reservation_webhook<B>(
    req: HttpRequest,
    body: web::Json<PaymentEvent>,
    api: web::Data<ReconciliationApi<B>>,
) -> HttpResponse
where
    B: PaymentReconciliationDatabase,
{
    trace!("📅️ Received reservation payment webhook request: {}", req.uri());
    let event = body.into_inner();
    match api.process_reservation_event(&event).await {
        Ok(outcome) => info!("📅️ Event [{}] ({}): {outcome}", event.event_id, event.event_type()),
        Err(e) => {
            error!(
                "📅️ Infrastructure failure while handling event [{}]: {e}. The event remains retryable.",
                event.event_id
            );
        },
    }
    HttpResponse::Ok().json(WebhookAck::received())
}
