use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use lens_track_engine::{
    events::{EventHandlers, EventHooks, EventProducers, OtpRecipient},
    RiderApi,
    ShopOrderApi,
    SqliteDatabase,
    TrackingApi,
};
use log::*;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    expiry_worker::start_otp_purge_worker,
    middleware::ApiKeyMiddlewareFactory,
    routes::{
        health,
        AcceptPickupRoute,
        ActiveAdminOrdersRoute,
        ActiveShopOrdersRoute,
        AllRidersRoute,
        AssignRiderRoute,
        CallForPickupRoute,
        CompleteTransitRoute,
        CompleteWorkRoute,
        CreateGroupOrderRoute,
        CreateShopRoute,
        DeleteOrderRoute,
        EditPhoneNumberRoute,
        EditWorkingStatusRoute,
        FetchGroupOrderRoute,
        OrderByIdRoute,
        OrdersForShopRoute,
        PlaceOrderRoute,
        RegisterPushTokenRoute,
        RiderByCodeRoute,
        RiderHistoryRoute,
        RiderLoginRoute,
        RiderSignupRoute,
        ShopByIdRoute,
        VerifyAdminOtpRoute,
        VerifyAdminPickupOtpRoute,
        VerifyDeliveryOtpRoute,
        VerifyPickupOtpRoute,
    },
};

/// Queued events per handler before producers start waiting on the channel.
const EVENT_BUFFER_SIZE: usize = 128;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    if config.admin_id.is_empty() {
        return Err(ServerError::ConfigurationError(
            "No admin id is set. Configure LTG_ADMIN_ID and restart the server.".to_string(),
        ));
    }
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, default_event_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    start_otp_purge_worker(db.clone(), config.otp);
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// The stock hook set just logs every event. Deployments that actually send mail or push
/// notifications build their own [`EventHooks`] and call [`create_server_instance`] directly.
pub fn default_event_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_rider_broadcast(|ev| {
            Box::pin(async move {
                info!("📬️ {:?} {} job on leg {}", ev.kind, ev.delivery_type, ev.order_key);
            })
        })
        .on_otp_dispatch(|ev| {
            Box::pin(async move {
                let recipient = match &ev.recipient {
                    OtpRecipient::ShopEmail(email) => format!("shop <{email}>"),
                    OtpRecipient::Admin(admin_id) => format!("admin {admin_id}"),
                };
                info!("📨️ {} code {} for {} goes to {recipient}", ev.purpose, ev.code, ev.reference);
            })
        })
        .on_rider_welcome(|ev| {
            Box::pin(async move {
                info!("📨️ Welcome mail queued for {} <{}>", ev.name, ev.email);
            })
        });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let tracking_api = TrackingApi::new(db.clone(), producers.clone(), config.otp);
        let rider_api = RiderApi::new(db.clone(), producers.clone());
        let shop_order_api = ShopOrderApi::new(db.clone());
        let options = ServerOptions::from_config(&config);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ltg::access_log"))
            .app_data(web::Data::new(tracking_api))
            .app_data(web::Data::new(rider_api))
            .app_data(web::Data::new(shop_order_api))
            .app_data(web::Data::new(options));
        let orders_scope = web::scope("/api/orders")
            .wrap(ApiKeyMiddlewareFactory::new(
                config.api_key.clone(),
                config.use_x_forwarded_for,
                config.use_forwarded,
            ))
            .service(PlaceOrderRoute::<SqliteDatabase>::new())
            .service(OrdersForShopRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(DeleteOrderRoute::<SqliteDatabase>::new())
            .service(CreateGroupOrderRoute::<SqliteDatabase>::new())
            .service(FetchGroupOrderRoute::<SqliteDatabase>::new())
            .service(AcceptPickupRoute::<SqliteDatabase>::new())
            .service(VerifyPickupOtpRoute::<SqliteDatabase>::new())
            .service(VerifyAdminOtpRoute::<SqliteDatabase>::new())
            .service(CompleteWorkRoute::<SqliteDatabase>::new())
            .service(CallForPickupRoute::<SqliteDatabase>::new())
            .service(AssignRiderRoute::<SqliteDatabase>::new())
            .service(VerifyAdminPickupOtpRoute::<SqliteDatabase>::new())
            .service(VerifyDeliveryOtpRoute::<SqliteDatabase>::new())
            .service(CompleteTransitRoute::<SqliteDatabase>::new())
            .service(ActiveShopOrdersRoute::<SqliteDatabase>::new())
            .service(ActiveAdminOrdersRoute::<SqliteDatabase>::new());
        let riders_scope = web::scope("/api/riders")
            .wrap(ApiKeyMiddlewareFactory::new(
                config.api_key.clone(),
                config.use_x_forwarded_for,
                config.use_forwarded,
            ))
            .service(RiderSignupRoute::<SqliteDatabase>::new())
            .service(RiderLoginRoute::<SqliteDatabase>::new())
            .service(RiderHistoryRoute::<SqliteDatabase>::new())
            .service(EditWorkingStatusRoute::<SqliteDatabase>::new())
            .service(EditPhoneNumberRoute::<SqliteDatabase>::new())
            .service(RegisterPushTokenRoute::<SqliteDatabase>::new())
            .service(AllRidersRoute::<SqliteDatabase>::new())
            .service(RiderByCodeRoute::<SqliteDatabase>::new());
        let shops_scope = web::scope("/api/shops")
            .wrap(ApiKeyMiddlewareFactory::new(
                config.api_key.clone(),
                config.use_x_forwarded_for,
                config.use_forwarded,
            ))
            .service(CreateShopRoute::<SqliteDatabase>::new())
            .service(ShopByIdRoute::<SqliteDatabase>::new());
        app.service(health).service(orders_scope).service(riders_scope).service(shops_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
