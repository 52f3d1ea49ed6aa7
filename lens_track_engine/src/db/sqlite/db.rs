use std::{collections::BTreeMap, fmt::Debug};

use chrono::Duration;
use log::debug;
use ltg_common::Paisa;
use sqlx::SqlitePool;

use super::{group_orders, legs, legs::NewDeliveryLeg, new_pool, orders, otps, riders, shops, SqliteDatabaseError};
use crate::{
    db_types::{
        DeliveryLeg,
        DeliveryType,
        GroupOrder,
        LegManifest,
        NewGroupOrder,
        NewOrder,
        NewRider,
        NewShop,
        Order,
        OrderKey,
        OtpPurpose,
        OtpSubject,
        Rider,
        Shop,
        ShopGroup,
        TrackingStatus,
    },
    otp::OtpCheck,
    settlement,
    traits::{
        ActiveAdminLeg,
        ActiveShopOrder,
        AdminReceipt,
        DeliveryCall,
        DeliveryReceipt,
        GroupOrderBundle,
        OutboundDispatch,
        PickupAcceptance,
        PickupVerification,
        RiderApiError,
        RiderAssignment,
        RiderManagement,
        ShopOrderApiError,
        ShopOrderManagement,
        ShopOtp,
        TrackingApiError,
        TrackingGatewayDatabase,
        TrackingQueries,
        TransitCompletion,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) {
        self.pool.close().await;
    }
}

impl TrackingQueries for SqliteDatabase {
    async fn fetch_group_order(&self, id: i64) -> Result<Option<GroupOrder>, TrackingApiError> {
        let mut conn = self.pool.acquire().await?;
        let group_order = group_orders::fetch_group_order(id, &mut conn).await?;
        Ok(group_order)
    }

    async fn fetch_leg(&self, id: i64) -> Result<Option<DeliveryLeg>, TrackingApiError> {
        let mut conn = self.pool.acquire().await?;
        let leg = legs::fetch_leg(id, &mut conn).await?;
        Ok(leg)
    }

    async fn fetch_leg_by_key(&self, key: &OrderKey) -> Result<Option<DeliveryLeg>, TrackingApiError> {
        let mut conn = self.pool.acquire().await?;
        let leg = legs::fetch_leg_by_key(key, &mut conn).await?;
        Ok(leg)
    }

    async fn group_orders_for_leg(&self, leg_id: i64) -> Result<Vec<GroupOrder>, TrackingApiError> {
        let mut conn = self.pool.acquire().await?;
        let ids = legs::group_order_ids_for_leg(leg_id, &mut conn).await?;
        let group_orders = group_orders::fetch_group_orders_by_ids(&ids, &mut conn).await?;
        Ok(group_orders)
    }

    async fn active_shop_orders(&self, shop_id: i64, otp_ttl: Duration) -> Result<Vec<ActiveShopOrder>, TrackingApiError> {
        let mut conn = self.pool.acquire().await?;
        shops::fetch_shop(shop_id, &mut conn)
            .await?
            .ok_or_else(|| TrackingApiError::NotFound("Shop not found".into()))?;
        let statuses = [TrackingStatus::PickupAccepted, TrackingStatus::OutForDelivery];
        let bundles = group_orders::fetch_by_statuses_for_shop(shop_id, &statuses, &mut conn).await?;
        let mut result = Vec::with_capacity(bundles.len());
        for bundle in bundles {
            let (purpose, leg_id) = match bundle.tracking_status {
                TrackingStatus::PickupAccepted => (OtpPurpose::ShopPickup, bundle.shop_pickup_leg),
                TrackingStatus::OutForDelivery => (OtpPurpose::ShopDelivery, bundle.admin_pickup_leg),
                _ => continue,
            };
            let subject = OtpSubject::GroupOrder(bundle.id);
            let otp = otps::current_for_subject(&subject, purpose, otp_ttl, &mut conn).await?;
            let rider = match leg_id {
                Some(id) => match legs::fetch_leg(id, &mut conn).await?.and_then(|leg| leg.rider_id) {
                    Some(rider_id) => riders::fetch_rider(rider_id, &mut conn).await?,
                    None => None,
                },
                None => None,
            };
            result.push(ActiveShopOrder {
                group_order_id: bundle.id,
                tracking_status: bundle.tracking_status,
                otp_code: otp.map(|o| o.otp_code),
                rider_name: rider.as_ref().map(|r| r.name.clone()),
                rider_phone: rider.map(|r| r.phone),
            });
        }
        Ok(result)
    }

    async fn active_admin_legs(&self, admin_id: &str, otp_ttl: Duration) -> Result<Vec<ActiveAdminLeg>, TrackingApiError> {
        let mut conn = self.pool.acquire().await?;
        let open_legs = legs::open_legs_for_admin(admin_id, &mut conn).await?;
        let mut result = Vec::with_capacity(open_legs.len());
        for leg in open_legs {
            let ids = legs::group_order_ids_for_leg(leg.id, &mut conn).await?;
            let otp = match leg.delivery_type {
                // Inbound parcels are receipted per group order.
                DeliveryType::Pickup => match ids.first() {
                    Some(id) => {
                        otps::current_for_subject(&OtpSubject::GroupOrder(*id), OtpPurpose::AdminDelivery, otp_ttl, &mut conn)
                            .await?
                    },
                    None => None,
                },
                // Outbound batches are released against the leg's routing key.
                DeliveryType::Delivery => {
                    otps::current_for_subject(&OtpSubject::Leg(leg.order_key.clone()), OtpPurpose::AdminPickup, otp_ttl, &mut conn)
                        .await?
                },
            };
            let rider = match leg.rider_id {
                Some(rider_id) => riders::fetch_rider(rider_id, &mut conn).await?,
                None => None,
            };
            result.push(ActiveAdminLeg {
                leg_id: leg.id,
                order_key: leg.order_key,
                delivery_type: leg.delivery_type,
                otp_code: otp.map(|o| o.otp_code),
                group_order_ids: ids,
                rider_name: rider.as_ref().map(|r| r.name.clone()),
                rider_phone: rider.map(|r| r.phone),
            });
        }
        Ok(result)
    }
}

impl TrackingGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_group_order(&self, order: NewGroupOrder) -> Result<GroupOrderBundle, TrackingApiError> {
        let mut tx = self.pool.begin().await?;
        let shop = shops::fetch_shop(order.shop_id, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::NotFound("Shop not found".into()))?;
        let eligible = orders::fetch_unbundled_orders(&order.order_ids, &mut tx).await?;
        if eligible.is_empty() {
            return Err(TrackingApiError::NotFound("No orders found".into()));
        }
        let order_ids = eligible.iter().map(|o| o.id).collect::<Vec<i64>>();
        let total_amount = eligible.iter().map(|o| o.total_amount).sum::<Paisa>();
        let delivery_charge = shop.delivery_charge;
        let split = settlement::split_payment(total_amount, delivery_charge, order.payment_option);
        let group_order = group_orders::insert_group_order(
            group_orders::NewGroupOrderRow {
                shop_id: shop.id,
                admin_id: &order.admin_id,
                total_amount,
                delivery_charge,
                final_amount: total_amount + delivery_charge,
                paid_amount: split.paid_amount,
                left_amount: split.left_amount,
                payment_status: split.status,
            },
            &mut tx,
        )
        .await?;
        orders::bind_orders_to_group(&order_ids, group_order.id, split.status, &mut tx).await?;
        let leg = legs::insert_leg(
            NewDeliveryLeg {
                delivery_type: DeliveryType::Pickup,
                order_key: order.order_key.clone(),
                payment_amount: settlement::pickup_leg_fee(delivery_charge),
                manifest: LegManifest::Shop(shop.details()),
            },
            &mut tx,
        )
        .await?;
        legs::link_group_orders(leg.id, &[group_order.id], &mut tx).await?;
        let group_order = group_orders::set_shop_pickup_slot(group_order.id, leg.id, &order.order_key, &mut tx).await?;
        let shop = if split.left_amount.is_zero() {
            shop
        } else {
            shops::credit_shop_balance(shop.id, split.left_amount, &mut tx).await?
        };
        let bundled = orders::fetch_orders_for_group(group_order.id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Group order #{} created with {} orders", group_order.id, bundled.len());
        Ok(GroupOrderBundle { group_order, leg, orders: bundled, shop })
    }

    async fn accept_pickup(&self, group_order_id: i64, rider_id: i64) -> Result<PickupAcceptance, TrackingApiError> {
        let mut tx = self.pool.begin().await?;
        let group_order = group_orders::fetch_group_order(group_order_id, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::NotFound("Group order not found".into()))?;
        let rider = riders::fetch_rider(rider_id, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::NotFound("Rider not found".into()))?;
        if group_order.tracking_status != TrackingStatus::PlacedForPickup {
            return Err(TrackingApiError::InvalidState("Order is not in 'Order Placed For Pickup' status".into()));
        }
        if !rider.is_working || !rider.is_available {
            return Err(TrackingApiError::RiderUnavailable);
        }
        let leg_id = group_order
            .shop_pickup_leg
            .ok_or_else(|| TrackingApiError::DatabaseError(format!("Group order #{group_order_id} has no pickup leg")))?;
        let leg = legs::fetch_leg(leg_id, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::DatabaseError(format!("Pickup leg #{leg_id} is missing")))?;
        if leg.rider_id.is_some() {
            return Err(TrackingApiError::AlreadyAssigned("Rider is already assigned to this order".into()));
        }
        let rider = riders::try_lock(rider_id, &mut tx).await?.ok_or(TrackingApiError::RiderUnavailable)?;
        let leg = legs::bind_rider(leg.id, rider_id, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::AlreadyAssigned("Rider is already assigned to this order".into()))?;
        let group_order = group_orders::advance_status(
            group_order.id,
            TrackingStatus::PlacedForPickup,
            TrackingStatus::PickupAccepted,
            &mut tx,
        )
        .await?
        .ok_or_else(|| TrackingApiError::InvalidState("Order is not in 'Order Placed For Pickup' status".into()))?;
        let otp = otps::issue(&OtpSubject::GroupOrder(group_order.id), OtpPurpose::ShopPickup, &mut tx).await?;
        let shop = shops::fetch_shop(group_order.shop_id, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::NotFound("Shop not found".into()))?;
        tx.commit().await?;
        debug!("🗃️ Rider #{rider_id} accepted pickup for group order #{group_order_id}");
        Ok(PickupAcceptance { group_order, leg, rider, shop, otp: otp.otp_code })
    }

    async fn verify_pickup_otp(
        &self,
        group_order_id: i64,
        check: OtpCheck,
        ttl: Duration,
    ) -> Result<PickupVerification, TrackingApiError> {
        let mut tx = self.pool.begin().await?;
        let group_order = group_orders::fetch_group_order(group_order_id, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::NotFound("Group order not found".into()))?;
        if let OtpCheck::Code(code) = &check {
            let subject = OtpSubject::GroupOrder(group_order.id);
            if !otps::consume(&subject, OtpPurpose::ShopPickup, code, ttl, &mut tx).await? {
                return Err(TrackingApiError::InvalidOtp);
            }
        }
        let leg_id = group_order
            .shop_pickup_leg
            .ok_or_else(|| TrackingApiError::DatabaseError(format!("Group order #{group_order_id} has no pickup leg")))?;
        let leg = legs::set_pickup_verified(leg_id, &mut tx).await?;
        let group_order = group_orders::advance_status(
            group_order.id,
            TrackingStatus::PickupAccepted,
            TrackingStatus::PickedUp,
            &mut tx,
        )
        .await?
        .ok_or_else(|| TrackingApiError::InvalidState("Order is not in 'Pickup Accepted' status".into()))?;
        let admin_otp = otps::issue(&OtpSubject::GroupOrder(group_order.id), OtpPurpose::AdminDelivery, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Pickup verified for group order #{group_order_id}");
        Ok(PickupVerification { group_order, leg, admin_otp: admin_otp.otp_code })
    }

    async fn verify_admin_otp(
        &self,
        group_order_id: i64,
        rider_id: i64,
        check: OtpCheck,
        ttl: Duration,
    ) -> Result<AdminReceipt, TrackingApiError> {
        let mut tx = self.pool.begin().await?;
        let group_order = group_orders::fetch_group_order(group_order_id, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::NotFound("Group order not found".into()))?;
        let leg_id = group_order
            .shop_pickup_leg
            .ok_or_else(|| TrackingApiError::DatabaseError(format!("Group order #{group_order_id} has no pickup leg")))?;
        let leg = legs::fetch_leg(leg_id, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::DatabaseError(format!("Pickup leg #{leg_id} is missing")))?;
        if leg.rider_id != Some(rider_id) {
            return Err(TrackingApiError::InvalidRider);
        }
        if leg.delivery_type != DeliveryType::Pickup {
            return Err(TrackingApiError::InvalidDeliveryType);
        }
        if let OtpCheck::Code(code) = &check {
            let subject = OtpSubject::GroupOrder(group_order.id);
            if !otps::consume(&subject, OtpPurpose::AdminDelivery, code, ttl, &mut tx).await? {
                return Err(TrackingApiError::InvalidOtp);
            }
        }
        let leg = legs::set_drop_verified(leg.id, &mut tx).await?;
        let rider = riders::record_delivery(rider_id, &mut tx).await?;
        let group_order = group_orders::advance_status(
            group_order.id,
            TrackingStatus::PickedUp,
            TrackingStatus::ReceivedByAdmin,
            &mut tx,
        )
        .await?
        .ok_or_else(|| TrackingApiError::InvalidState("Order is not in 'Order Picked Up' status".into()))?;
        tx.commit().await?;
        debug!("🗃️ Group order #{group_order_id} received by admin {}", group_order.admin_id);
        Ok(AdminReceipt { group_order, leg, rider })
    }

    async fn complete_work(&self, group_order_id: i64) -> Result<GroupOrder, TrackingApiError> {
        let mut tx = self.pool.begin().await?;
        let group_order = group_orders::fetch_group_order(group_order_id, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::NotFound("Group order not found".into()))?;
        let updated = group_orders::advance_status(
            group_order.id,
            TrackingStatus::ReceivedByAdmin,
            TrackingStatus::WorkCompleted,
            &mut tx,
        )
        .await?;
        let Some(updated) = updated else {
            let message = match group_order.tracking_status {
                TrackingStatus::OutForDelivery => {
                    "Work cannot be completed because the order is already out for delivery.".to_string()
                },
                TrackingStatus::Completed => {
                    "Work cannot be completed because the order is already completed.".to_string()
                },
                other => format!("Work cannot be completed at this stage. The order is currently in '{other}' status."),
            };
            return Err(TrackingApiError::InvalidState(message));
        };
        tx.commit().await?;
        debug!("🗃️ Work completed for group order #{group_order_id}");
        Ok(updated)
    }

    async fn call_for_pickup(
        &self,
        group_order_ids: &[i64],
        delivery_amount: Paisa,
        order_key: OrderKey,
    ) -> Result<DeliveryCall, TrackingApiError> {
        if group_order_ids.is_empty() {
            return Err(TrackingApiError::ValidationError("group_order_ids must be a non-empty array".into()));
        }
        let mut unique = group_order_ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let mut tx = self.pool.begin().await?;
        let bundles = group_orders::fetch_group_orders_by_ids(&unique, &mut tx).await?;
        if bundles.len() != unique.len() {
            return Err(TrackingApiError::NotFound("Some group orders not found".into()));
        }
        let invalid_ids = bundles
            .iter()
            .filter(|g| g.tracking_status != TrackingStatus::WorkCompleted)
            .map(|g| g.id)
            .collect::<Vec<i64>>();
        if !invalid_ids.is_empty() {
            return Err(TrackingApiError::BatchNotReady { invalid_ids });
        }

        let mut by_shop = BTreeMap::<i64, Vec<i64>>::new();
        for bundle in &bundles {
            by_shop.entry(bundle.shop_id).or_default().push(bundle.id);
        }
        let mut shop_groups = Vec::with_capacity(by_shop.len());
        for (shop_id, ids) in by_shop {
            let shop = shops::fetch_shop(shop_id, &mut tx)
                .await?
                .ok_or_else(|| TrackingApiError::NotFound("Shop not found".into()))?;
            shop_groups.push(ShopGroup {
                shop_id,
                shop_name: shop.shop_name,
                dealer_name: shop.dealer_name,
                address: shop.address,
                phone: shop.phone,
                alternate_phone: shop.alternate_phone,
                group_order_ids: ids,
            });
        }

        let leg = legs::insert_leg(
            NewDeliveryLeg {
                delivery_type: DeliveryType::Delivery,
                order_key: order_key.clone(),
                payment_amount: delivery_amount,
                manifest: LegManifest::Grouped { shops: shop_groups },
            },
            &mut tx,
        )
        .await?;
        legs::link_group_orders(leg.id, &unique, &mut tx).await?;
        group_orders::set_admin_pickup_slot(&unique, leg.id, &order_key, &mut tx).await?;
        let moved = group_orders::advance_status_batch(
            &unique,
            TrackingStatus::WorkCompleted,
            TrackingStatus::InternalTracking,
            &mut tx,
        )
        .await?;
        if moved.len() != unique.len() {
            let moved_ids = moved.iter().map(|g| g.id).collect::<Vec<i64>>();
            let invalid_ids = unique.iter().copied().filter(|id| !moved_ids.contains(id)).collect::<Vec<i64>>();
            return Err(TrackingApiError::BatchNotReady { invalid_ids });
        }
        tx.commit().await?;
        debug!("🗃️ Delivery leg {} opened for {} group orders", leg.order_key, moved.len());
        Ok(DeliveryCall { leg, group_orders: moved })
    }

    async fn assign_rider(
        &self,
        admin_pickup_key: &OrderKey,
        rider_id: i64,
    ) -> Result<RiderAssignment, TrackingApiError> {
        let mut tx = self.pool.begin().await?;
        let rider = riders::fetch_rider(rider_id, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::NotFound("Rider not found".into()))?;
        if !rider.is_working || !rider.is_available {
            return Err(TrackingApiError::RiderUnavailable);
        }
        let leg = legs::fetch_leg_by_key_and_type(admin_pickup_key, DeliveryType::Delivery, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::NotFound("Order not found".into()))?;
        if leg.rider_id.is_some() {
            return Err(TrackingApiError::AlreadyAssigned("Rider already assigned".into()));
        }
        let rider = riders::try_lock(rider_id, &mut tx).await?.ok_or(TrackingApiError::RiderUnavailable)?;
        let leg = legs::bind_rider(leg.id, rider_id, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::AlreadyAssigned("Rider already assigned".into()))?;
        let ids = legs::group_order_ids_for_leg(leg.id, &mut tx).await?;
        let first = ids
            .first()
            .ok_or_else(|| TrackingApiError::DatabaseError(format!("Leg {} carries no group orders", leg.order_key)))?;
        let admin_id = group_orders::fetch_group_order(*first, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::DatabaseError(format!("Group order #{first} is missing")))?
            .admin_id;
        let otp = otps::issue(&OtpSubject::Leg(leg.order_key.clone()), OtpPurpose::AdminPickup, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Rider #{rider_id} assigned to delivery leg {}", leg.order_key);
        Ok(RiderAssignment { leg, rider, admin_id, otp: otp.otp_code })
    }

    async fn verify_admin_pickup_otp(
        &self,
        order_key: &OrderKey,
        rider_id: i64,
        check: OtpCheck,
        ttl: Duration,
    ) -> Result<OutboundDispatch, TrackingApiError> {
        let mut tx = self.pool.begin().await?;
        let leg = legs::fetch_leg_by_key_and_type(order_key, DeliveryType::Delivery, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::NotFound("Order not found".into()))?;
        if leg.rider_id != Some(rider_id) {
            return Err(TrackingApiError::InvalidRider);
        }
        if let OtpCheck::Code(code) = &check {
            let subject = OtpSubject::Leg(leg.order_key.clone());
            if !otps::consume(&subject, OtpPurpose::AdminPickup, code, ttl, &mut tx).await? {
                return Err(TrackingApiError::InvalidOtp);
            }
        }
        let leg = legs::set_pickup_verified(leg.id, &mut tx).await?;
        let ids = legs::group_order_ids_for_leg(leg.id, &mut tx).await?;
        let moved = group_orders::advance_status_batch(
            &ids,
            TrackingStatus::InternalTracking,
            TrackingStatus::OutForDelivery,
            &mut tx,
        )
        .await?;
        if moved.len() != ids.len() {
            return Err(TrackingApiError::InvalidState("Some group orders are not in 'Internal Tracking' status".into()));
        }
        let mut shop_otps = Vec::with_capacity(moved.len());
        for bundle in &moved {
            let otp = otps::issue(&OtpSubject::GroupOrder(bundle.id), OtpPurpose::ShopDelivery, &mut tx).await?;
            let shop = shops::fetch_shop(bundle.shop_id, &mut tx)
                .await?
                .ok_or_else(|| TrackingApiError::NotFound("Shop not found".into()))?;
            shop_otps.push(ShopOtp { group_order_id: bundle.id, shop_email: shop.email, code: otp.otp_code });
        }
        tx.commit().await?;
        debug!("🗃️ Delivery leg {} dispatched with {} group orders", leg.order_key, moved.len());
        Ok(OutboundDispatch { leg, group_orders: moved, shop_otps })
    }

    async fn verify_delivery_otp(
        &self,
        group_order_id: i64,
        rider_id: i64,
        check: OtpCheck,
        ttl: Duration,
    ) -> Result<DeliveryReceipt, TrackingApiError> {
        let mut tx = self.pool.begin().await?;
        let group_order = group_orders::fetch_group_order(group_order_id, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::NotFound("Group order not found".into()))?;
        let leg_id = group_order
            .admin_pickup_leg
            .ok_or_else(|| TrackingApiError::NotFound("Order not found".into()))?;
        let mut leg = legs::fetch_leg(leg_id, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::NotFound("Order not found".into()))?;
        if leg.rider_id != Some(rider_id) {
            return Err(TrackingApiError::InvalidRider);
        }
        if leg.delivery_type != DeliveryType::Delivery {
            return Err(TrackingApiError::InvalidDeliveryType);
        }
        if let OtpCheck::Code(code) = &check {
            let subject = OtpSubject::GroupOrder(group_order.id);
            if !otps::consume(&subject, OtpPurpose::ShopDelivery, code, ttl, &mut tx).await? {
                return Err(TrackingApiError::Unauthorized("Invalid OTP".into()));
            }
        }
        let group_order = group_orders::advance_status(
            group_order.id,
            TrackingStatus::OutForDelivery,
            TrackingStatus::Completed,
            &mut tx,
        )
        .await?
        .ok_or_else(|| TrackingApiError::InvalidState("Order is not in 'Out For Delivery' status".into()))?;
        let rider = riders::record_delivery(rider_id, &mut tx).await?;
        let ids = legs::group_order_ids_for_leg(leg.id, &mut tx).await?;
        let siblings = group_orders::fetch_group_orders_by_ids(&ids, &mut tx).await?;
        let leg_cleared = siblings.iter().all(|g| g.tracking_status == TrackingStatus::Completed);
        if leg_cleared {
            leg = legs::set_drop_verified(leg.id, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Group order #{group_order_id} delivered (leg cleared: {leg_cleared})");
        Ok(DeliveryReceipt { group_order, leg, rider, leg_cleared })
    }

    async fn complete_transit(&self, order_key: &OrderKey, rider_id: i64) -> Result<TransitCompletion, TrackingApiError> {
        let mut tx = self.pool.begin().await?;
        let leg = legs::fetch_leg_by_key(order_key, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::NotFound("Order not found".into()))?;
        if leg.is_completed {
            return Err(TrackingApiError::InvalidState("Order already completed".into()));
        }
        if leg.rider_id != Some(rider_id) {
            return Err(TrackingApiError::Unauthorized("Unauthorized".into()));
        }
        if !leg.is_drop_verified {
            return Err(TrackingApiError::InvalidState("Drop is not completed".into()));
        }
        let leg = legs::complete_leg(leg.id, &mut tx)
            .await?
            .ok_or_else(|| TrackingApiError::InvalidState("Order already completed".into()))?;
        riders::accrue_earnings(rider_id, leg.payment_amount, &mut tx).await?;
        let rider = riders::unlock(rider_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Leg {} completed by rider #{rider_id}", leg.order_key);
        Ok(TransitCompletion { leg, rider })
    }

    async fn purge_expired_otps(&self, ttl: Duration) -> Result<u64, TrackingApiError> {
        let mut conn = self.pool.acquire().await?;
        let removed = otps::purge_expired(ttl, &mut conn).await?;
        Ok(removed)
    }
}

impl RiderManagement for SqliteDatabase {
    async fn insert_rider(&self, rider: NewRider) -> Result<Rider, RiderApiError> {
        let mut conn = self.pool.acquire().await?;
        riders::insert_rider(rider, &mut conn).await
    }

    async fn rider_code_exists(&self, code: &str) -> Result<bool, RiderApiError> {
        let mut conn = self.pool.acquire().await?;
        let exists = riders::code_exists(code, &mut conn).await?;
        Ok(exists)
    }

    async fn fetch_rider(&self, id: i64) -> Result<Option<Rider>, RiderApiError> {
        let mut conn = self.pool.acquire().await?;
        let rider = riders::fetch_rider(id, &mut conn).await?;
        Ok(rider)
    }

    async fn fetch_rider_by_code(&self, code: &str) -> Result<Option<Rider>, RiderApiError> {
        let mut conn = self.pool.acquire().await?;
        let rider = riders::fetch_rider_by_code(code, &mut conn).await?;
        Ok(rider)
    }

    async fn fetch_rider_by_email(&self, email: &str) -> Result<Option<Rider>, RiderApiError> {
        let mut conn = self.pool.acquire().await?;
        let rider = riders::fetch_rider_by_email(email, &mut conn).await?;
        Ok(rider)
    }

    async fn fetch_all_riders(&self) -> Result<Vec<Rider>, RiderApiError> {
        let mut conn = self.pool.acquire().await?;
        let all = riders::fetch_all_riders(&mut conn).await?;
        Ok(all)
    }

    async fn set_working_status(&self, rider_code: &str, working: bool) -> Result<Rider, RiderApiError> {
        let mut tx = self.pool.begin().await?;
        let rider = riders::set_working_status(rider_code, working, &mut tx).await?;
        tx.commit().await?;
        Ok(rider)
    }

    async fn update_phone(&self, rider_code: &str, phone: &str) -> Result<Rider, RiderApiError> {
        let mut conn = self.pool.acquire().await?;
        riders::update_phone(rider_code, phone, &mut conn).await
    }

    async fn register_push_token(&self, rider_code: &str, token: &str) -> Result<Rider, RiderApiError> {
        let mut conn = self.pool.acquire().await?;
        riders::set_push_token(rider_code, token, &mut conn).await
    }

    async fn rider_history(&self, rider_id: i64) -> Result<Vec<DeliveryLeg>, RiderApiError> {
        let mut conn = self.pool.acquire().await?;
        let history = legs::legs_for_rider(rider_id, &mut conn).await?;
        Ok(history)
    }
}

impl ShopOrderManagement for SqliteDatabase {
    async fn insert_shop(&self, shop: NewShop) -> Result<Shop, ShopOrderApiError> {
        let mut conn = self.pool.acquire().await?;
        shops::insert_shop(shop, &mut conn).await
    }

    async fn fetch_shop(&self, id: i64) -> Result<Option<Shop>, ShopOrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let shop = shops::fetch_shop(id, &mut conn).await?;
        Ok(shop)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, ShopOrderApiError> {
        let mut tx = self.pool.begin().await?;
        shops::fetch_shop(order.shop_id, &mut tx).await?.ok_or(ShopOrderApiError::ShopNotFound)?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, ShopOrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(id, &mut conn).await?;
        Ok(order)
    }

    async fn orders_for_shop(&self, shop_id: i64) -> Result<Vec<Order>, ShopOrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let list = orders::fetch_orders_for_shop(shop_id, &mut conn).await?;
        Ok(list)
    }

    async fn delete_order(&self, id: i64) -> Result<(), ShopOrderApiError> {
        let mut tx = self.pool.begin().await?;
        orders::delete_order(id, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }
}
