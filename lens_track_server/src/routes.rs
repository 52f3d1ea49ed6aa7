//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (I/O, database calls) must be
//! expressed as a future or asynchronous function so that worker threads can interleave requests.

use actix_web::{get, web, HttpResponse, Responder};
use lens_track_engine::{
    db_types::{NewGroupOrder, NewOrder, NewShop, OrderKey},
    traits::{RiderManagement, ShopOrderManagement, TrackingGatewayDatabase},
    RiderApi,
    RiderRegistration,
    ShopOrderApi,
    TrackingApi,
};
use log::*;
use serde_json::json;

use crate::{
    config::ServerOptions,
    data_objects::{
        AcceptPickupRequest,
        AssignRiderRequest,
        CallForPickupRequest,
        CompleteTransitRequest,
        CreateGroupOrderRequest,
        JsonResponse,
        OtpRequest,
        PushTokenRequest,
        RiderLoginRequest,
        RiderOtpRequest,
        UpdatePhoneRequest,
        WorkingStatusRequest,
    },
    errors::ServerError,
};

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

//----------------------------------------------   Group orders  ----------------------------------------------------

route!(create_group_order => Post "/create-group-order" impl TrackingGatewayDatabase);
/// Bundles a shop's pending orders into a new group order.
///
/// The payment split is applied immediately: `full` settles the whole bundle up front, `delivery`
/// pays only the delivery charge and carries the order total forward on the shop's credit
/// balance. The inbound pickup leg is opened and broadcast to the rider pool.
pub async fn create_group_order<B: TrackingGatewayDatabase>(
    body: web::Json<CreateGroupOrderRequest>,
    api: web::Data<TrackingApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    debug!("💻️ POST create-group-order for shop #{} with {} orders", params.shop_id, params.order_ids.len());
    let order = NewGroupOrder::new(params.shop_id, params.order_ids, params.payment_option, options.admin_id.clone());
    let bundle = api.create_group_order(order).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Group order created successfully",
        "data": bundle,
    })))
}

route!(fetch_group_order => Get "/get-group-order/{group_order_id}" impl TrackingGatewayDatabase);
pub async fn fetch_group_order<B: TrackingGatewayDatabase>(
    path: web::Path<i64>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let group_order_id = path.into_inner();
    debug!("💻️ GET group order #{group_order_id}");
    let order = api.fetch_group_order(group_order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(accept_pickup => Post "/{group_order_id}/accept-pickup" impl TrackingGatewayDatabase);
/// A rider claims the inbound pickup job. The shop_pickup code in the response goes to the shop,
/// not the rider; it is echoed here so operator dashboards can surface it immediately.
pub async fn accept_pickup<B: TrackingGatewayDatabase>(
    path: web::Path<i64>,
    body: web::Json<AcceptPickupRequest>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let group_order_id = path.into_inner();
    let rider_id = body.into_inner().pickup_rider_id;
    debug!("💻️ POST accept-pickup on group order #{group_order_id} by rider #{rider_id}");
    let acceptance = api.accept_pickup(group_order_id, rider_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Pickup accepted successfully. OTP sent to your email.",
        "data": acceptance.group_order,
        "otp": acceptance.otp,
    })))
}

route!(verify_pickup_otp => Post "/{group_order_id}/verify-pickup-otp" impl TrackingGatewayDatabase);
/// Shop hand-over checkpoint. On success the admin facility receives its receipt code.
pub async fn verify_pickup_otp<B: TrackingGatewayDatabase>(
    path: web::Path<i64>,
    body: web::Json<OtpRequest>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let group_order_id = path.into_inner();
    let params = body.into_inner();
    debug!("💻️ POST verify-pickup-otp on group order #{group_order_id}");
    let verification = api.verify_pickup_otp(group_order_id, &params.otp_code).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "OTP verified successfully. Admin OTP sent.",
        "data": verification.group_order,
    })))
}

route!(verify_admin_otp => Post "/{group_order_id}/verify-admin-otp" impl TrackingGatewayDatabase);
/// Facility receipt checkpoint for an inbound parcel.
pub async fn verify_admin_otp<B: TrackingGatewayDatabase>(
    path: web::Path<i64>,
    body: web::Json<RiderOtpRequest>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let group_order_id = path.into_inner();
    let params = body.into_inner();
    debug!("💻️ POST verify-admin-otp on group order #{group_order_id} by rider #{}", params.rider_id);
    let receipt = api.verify_admin_otp(group_order_id, params.rider_id, &params.otp_code).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "OTP verified successfully",
        "data": receipt.group_order,
    })))
}

route!(complete_work => Patch "/{group_order_id}/complete-work" impl TrackingGatewayDatabase);
pub async fn complete_work<B: TrackingGatewayDatabase>(
    path: web::Path<i64>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let group_order_id = path.into_inner();
    debug!("💻️ PATCH complete-work on group order #{group_order_id}");
    let group_order = api.complete_work(group_order_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Work completed successfully",
        "data": group_order,
    })))
}

route!(call_for_pickup => Post "/call-for-pickup" impl TrackingGatewayDatabase);
/// Opens an outbound delivery leg over a batch of work-completed bundles. The whole batch must
/// be ready; the ids of any bundles still in progress are reported back.
pub async fn call_for_pickup<B: TrackingGatewayDatabase>(
    body: web::Json<CallForPickupRequest>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    debug!("💻️ POST call-for-pickup for {} group orders", params.group_order_ids.len());
    let call = api.call_for_pickup(&params.group_order_ids, params.delivery_amount).await?;
    let group_order_ids = call.group_orders.iter().map(|o| o.id).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Admin pickup key assigned successfully",
        "data": { "admin_pickup_key": call.leg.order_key, "group_order_ids": group_order_ids },
    })))
}

route!(assign_rider => Post "/assign-rider" impl TrackingGatewayDatabase);
/// A rider claims the outbound batch by its routing key. The admin_pickup code in the response
/// goes to the facility counter.
pub async fn assign_rider<B: TrackingGatewayDatabase>(
    body: web::Json<AssignRiderRequest>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    debug!("💻️ POST assign-rider #{} to leg {}", params.delivery_rider_id, params.admin_pickup_key);
    let assignment = api.assign_rider(&params.admin_pickup_key, params.delivery_rider_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Rider assigned successfully. OTP sent to admin.",
        "data": { "rider": assignment.rider, "otp": assignment.otp },
    })))
}

route!(verify_admin_pickup_otp => Post "/{order_key}/verify-admin-pickup-otp" impl TrackingGatewayDatabase);
/// Facility hand-over checkpoint for the outbound batch. Every bundled group order moves to
/// `Out For Delivery` together, and each shop in the batch receives its delivery code.
pub async fn verify_admin_pickup_otp<B: TrackingGatewayDatabase>(
    path: web::Path<OrderKey>,
    body: web::Json<RiderOtpRequest>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_key = path.into_inner();
    let params = body.into_inner();
    debug!("💻️ POST verify-admin-pickup-otp on leg {order_key} by rider #{}", params.rider_id);
    let dispatch = api.verify_admin_pickup_otp(&order_key, params.rider_id, &params.otp_code).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "OTP verified successfully. Orders marked as out for delivery. OTPs sent to users.",
        "data": dispatch.group_orders,
    })))
}

route!(verify_delivery_otp => Post "/{group_order_id}/verify-delivery-otp" impl TrackingGatewayDatabase);
/// Shop receipt checkpoint for one delivered bundle.
pub async fn verify_delivery_otp<B: TrackingGatewayDatabase>(
    path: web::Path<i64>,
    body: web::Json<RiderOtpRequest>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let group_order_id = path.into_inner();
    let params = body.into_inner();
    debug!("💻️ POST verify-delivery-otp on group order #{group_order_id} by rider #{}", params.rider_id);
    let receipt = api.verify_delivery_otp(group_order_id, params.rider_id, &params.otp_code).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "OTP verified successfully",
        "data": receipt.group_order,
    })))
}

route!(complete_transit => Patch "/{order_key}/complete-transit" impl TrackingGatewayDatabase);
/// The bound rider settles a fully delivered leg, collecting their payment and becoming
/// available for new work.
pub async fn complete_transit<B: TrackingGatewayDatabase>(
    path: web::Path<OrderKey>,
    body: web::Json<CompleteTransitRequest>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_key = path.into_inner();
    let params = body.into_inner();
    debug!("💻️ PATCH complete-transit on leg {order_key} by rider #{}", params.rider_id);
    let completion = api.complete_transit(&order_key, params.rider_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Work completed successfully",
        "data": completion.leg,
    })))
}

//----------------------------------------------   Dashboards  ----------------------------------------------------

route!(active_shop_orders => Get "/active-shop-orders/{shop_id}" impl TrackingGatewayDatabase);
/// Shop dashboard: in-flight bundles with their live checkpoint codes and rider contacts.
pub async fn active_shop_orders<B: TrackingGatewayDatabase>(
    path: web::Path<i64>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let shop_id = path.into_inner();
    debug!("💻️ GET active-shop-orders for shop #{shop_id}");
    let orders = api.active_shop_orders(shop_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(active_admin_orders => Get "/active-admin-orders/{admin_id}" impl TrackingGatewayDatabase);
/// Admin dashboard: open legs touching the facility with their live checkpoint codes.
pub async fn active_admin_orders<B: TrackingGatewayDatabase>(
    path: web::Path<String>,
    api: web::Data<TrackingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let admin_id = path.into_inner();
    debug!("💻️ GET active-admin-orders for {admin_id}");
    let legs = api.active_admin_legs(&admin_id).await?;
    Ok(HttpResponse::Ok().json(legs))
}

//----------------------------------------------   Order intake  ----------------------------------------------------

route!(place_order => Post "/place-order" impl ShopOrderManagement);
pub async fn place_order<B: ShopOrderManagement>(
    body: web::Json<NewOrder>,
    api: web::Data<ShopOrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order = body.into_inner();
    debug!("💻️ POST place-order for shop #{}", order.shop_id);
    let order = api.place_order(order).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Order placed successfully",
        "data": order,
    })))
}

route!(orders_for_shop => Get "/get-order/{shop_id}" impl ShopOrderManagement);
pub async fn orders_for_shop<B: ShopOrderManagement>(
    path: web::Path<i64>,
    api: web::Data<ShopOrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let shop_id = path.into_inner();
    debug!("💻️ GET orders for shop #{shop_id}");
    let orders = api.orders_for_shop(shop_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/order/{order_id}" impl ShopOrderManagement);
pub async fn order_by_id<B: ShopOrderManagement>(
    path: web::Path<i64>,
    api: web::Data<ShopOrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order #{order_id}");
    let order = api.order_by_id(order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(delete_order => Delete "/delete-order/{order_id}" impl ShopOrderManagement);
/// Removes an order that has not been bundled yet. Bundled orders belong to the tracking state
/// machine and are refused.
pub async fn delete_order<B: ShopOrderManagement>(
    path: web::Path<i64>,
    api: web::Data<ShopOrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ DELETE order #{order_id}");
    api.delete_order(order_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Order deleted successfully")))
}

//----------------------------------------------   Riders  ----------------------------------------------------

route!(rider_signup => Post "/signup" impl RiderManagement);
pub async fn rider_signup<B: RiderManagement>(
    body: web::Json<RiderRegistration>,
    api: web::Data<RiderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let registration = body.into_inner();
    debug!("💻️ POST rider signup: {registration:?}");
    let rider = api.register(registration).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Signup successful",
        "data": rider,
    })))
}

route!(rider_login => Post "/login" impl RiderManagement);
pub async fn rider_login<B: RiderManagement>(
    body: web::Json<RiderLoginRequest>,
    api: web::Data<RiderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    debug!("💻️ POST rider login for {}", params.email);
    let rider = api.login(&params.email, &params.password).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Login Successful",
        "data": rider,
    })))
}

route!(all_riders => Get "" impl RiderManagement);
pub async fn all_riders<B: RiderManagement>(api: web::Data<RiderApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET all riders");
    let riders = api.all_riders().await?;
    Ok(HttpResponse::Ok().json(riders))
}

route!(rider_by_code => Get "/{rider_code}" impl RiderManagement);
pub async fn rider_by_code<B: RiderManagement>(
    path: web::Path<String>,
    api: web::Data<RiderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let rider_code = path.into_inner();
    debug!("💻️ GET rider {rider_code}");
    let rider = api.rider_by_code(&rider_code).await?;
    Ok(HttpResponse::Ok().json(rider))
}

route!(edit_working_status => Put "/{rider_code}/edit-working-status" impl RiderManagement);
/// Flips the rider's shift switch. Refused while the rider holds an assignment.
pub async fn edit_working_status<B: RiderManagement>(
    path: web::Path<String>,
    body: web::Json<WorkingStatusRequest>,
    api: web::Data<RiderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let rider_code = path.into_inner();
    let params = body.into_inner();
    debug!("💻️ PUT working status {} for rider {rider_code}", params.working);
    let rider = api.set_working_status(&rider_code, params.working).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Working Status updated successfully",
        "data": rider,
    })))
}

route!(edit_phone_number => Put "/{rider_code}/edit-phone-number" impl RiderManagement);
pub async fn edit_phone_number<B: RiderManagement>(
    path: web::Path<String>,
    body: web::Json<UpdatePhoneRequest>,
    api: web::Data<RiderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let rider_code = path.into_inner();
    let params = body.into_inner();
    debug!("💻️ PUT phone number for rider {rider_code}");
    let rider = api.update_phone(&rider_code, &params.phone).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Mobile Number updated successfully",
        "data": rider,
    })))
}

route!(register_push_token => Put "/{rider_code}/push-token" impl RiderManagement);
pub async fn register_push_token<B: RiderManagement>(
    path: web::Path<String>,
    body: web::Json<PushTokenRequest>,
    api: web::Data<RiderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let rider_code = path.into_inner();
    let params = body.into_inner();
    debug!("💻️ PUT push token for rider {rider_code}");
    let rider = api.register_push_token(&rider_code, &params.push_token).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Push token updated successfully",
        "data": rider,
    })))
}

route!(rider_history => Get "/order-history/{rider_code}" impl RiderManagement);
/// Every leg the rider has carried, newest first.
pub async fn rider_history<B: RiderManagement>(
    path: web::Path<String>,
    api: web::Data<RiderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let rider_code = path.into_inner();
    debug!("💻️ GET order history for rider {rider_code}");
    let legs = api.history(&rider_code).await?;
    Ok(HttpResponse::Ok().json(legs))
}

//----------------------------------------------   Shops  ----------------------------------------------------

route!(create_shop => Post "" impl ShopOrderManagement);
pub async fn create_shop<B: ShopOrderManagement>(
    body: web::Json<NewShop>,
    api: web::Data<ShopOrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let shop = body.into_inner();
    debug!("💻️ POST create shop {}", shop.shop_name);
    let shop = api.create_shop(shop).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Shop created successfully",
        "data": shop,
    })))
}

route!(shop_by_id => Get "/{shop_id}" impl ShopOrderManagement);
pub async fn shop_by_id<B: ShopOrderManagement>(
    path: web::Path<i64>,
    api: web::Data<ShopOrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let shop_id = path.into_inner();
    debug!("💻️ GET shop #{shop_id}");
    let shop = api.shop_by_id(shop_id).await?;
    Ok(HttpResponse::Ok().json(shop))
}
