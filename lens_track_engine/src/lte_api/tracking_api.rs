use std::fmt::Debug;

use log::*;
use ltg_common::Paisa;

use crate::{
    db_types::{DeliveryType, GroupOrder, NewGroupOrder, OrderKey, OtpPurpose},
    events::{BroadcastKind, EventProducers, OtpDispatchEvent, OtpRecipient, RiderBroadcastEvent},
    helpers,
    otp::OtpSettings,
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
        RiderAssignment,
        TrackingApiError,
        TrackingGatewayDatabase,
        TransitCompletion,
    },
};

/// `TrackingApi` drives the group-order lifecycle: bundle creation, the two rider legs, the four
/// OTP checkpoints, and the dashboards. Every mutation delegates to a single atomic backend
/// transition; hooks fire only after the transition has committed.
pub struct TrackingApi<B> {
    db: B,
    producers: EventProducers,
    otp_settings: OtpSettings,
}

impl<B> Debug for TrackingApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TrackingApi")
    }
}

impl<B> TrackingApi<B> {
    pub fn new(db: B, producers: EventProducers, otp_settings: OtpSettings) -> Self {
        Self { db, producers, otp_settings }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub fn otp_settings(&self) -> OtpSettings {
        self.otp_settings
    }
}

impl<B> TrackingApi<B>
where B: TrackingGatewayDatabase
{
    /// Bundles a shop's orders into a new group order and opens the inbound pickup leg. The new
    /// leg is broadcast to the rider pool.
    pub async fn create_group_order(&self, order: NewGroupOrder) -> Result<GroupOrderBundle, TrackingApiError> {
        let bundle = self.db.create_group_order(order).await?;
        self.call_rider_broadcast_hook(RiderBroadcastEvent::new(
            bundle.leg.order_key.clone(),
            BroadcastKind::New,
            DeliveryType::Pickup,
        ))
        .await;
        debug!(
            "🔄️📦️ Group order #{} created for shop #{} with {} orders",
            bundle.group_order.id,
            bundle.shop.id,
            bundle.orders.len()
        );
        Ok(bundle)
    }

    /// A rider claims the inbound pickup. On success the shop receives the shop_pickup code and
    /// the job leaves the rider pool.
    pub async fn accept_pickup(&self, group_order_id: i64, rider_id: i64) -> Result<PickupAcceptance, TrackingApiError> {
        let acceptance = self.db.accept_pickup(group_order_id, rider_id).await?;
        self.call_otp_dispatch_hook(OtpDispatchEvent::new(
            OtpRecipient::ShopEmail(acceptance.shop.email.clone()),
            OtpPurpose::ShopPickup,
            acceptance.otp.clone(),
            format!("group order #{}", acceptance.group_order.id),
        ))
        .await;
        self.call_rider_broadcast_hook(RiderBroadcastEvent::new(
            acceptance.leg.order_key.clone(),
            BroadcastKind::Withdrawn,
            DeliveryType::Pickup,
        ))
        .await;
        debug!("🔄️🛵️ Rider #{rider_id} accepted pickup for group order #{group_order_id}");
        Ok(acceptance)
    }

    /// Shop hand-over checkpoint. On success the admin facility receives the admin_delivery code.
    pub async fn verify_pickup_otp(&self, group_order_id: i64, code: &str) -> Result<PickupVerification, TrackingApiError> {
        let check = self.otp_settings.check_for(code);
        let verification = self.db.verify_pickup_otp(group_order_id, check, self.otp_settings.ttl).await?;
        self.call_otp_dispatch_hook(OtpDispatchEvent::new(
            OtpRecipient::Admin(verification.group_order.admin_id.clone()),
            OtpPurpose::AdminDelivery,
            verification.admin_otp.clone(),
            format!("group order #{}", verification.group_order.id),
        ))
        .await;
        debug!("🔄️🔐️ Pickup verified for group order #{group_order_id}");
        Ok(verification)
    }

    /// Admin receipt checkpoint for an inbound parcel.
    pub async fn verify_admin_otp(
        &self,
        group_order_id: i64,
        rider_id: i64,
        code: &str,
    ) -> Result<AdminReceipt, TrackingApiError> {
        let check = self.otp_settings.check_for(code);
        let receipt = self.db.verify_admin_otp(group_order_id, rider_id, check, self.otp_settings.ttl).await?;
        debug!("🔄️🔐️ Group order #{group_order_id} receipted at the facility");
        Ok(receipt)
    }

    /// Marks the lens work on a bundle as done.
    pub async fn complete_work(&self, group_order_id: i64) -> Result<GroupOrder, TrackingApiError> {
        let group_order = self.db.complete_work(group_order_id).await?;
        debug!("🔄️🏭️ Work completed for group order #{group_order_id}");
        Ok(group_order)
    }

    /// Opens an outbound delivery leg over a batch of work-completed bundles and broadcasts the
    /// new job to the rider pool.
    pub async fn call_for_pickup(
        &self,
        group_order_ids: &[i64],
        delivery_amount: Paisa,
    ) -> Result<DeliveryCall, TrackingApiError> {
        let order_key = helpers::new_order_key();
        let call = self.db.call_for_pickup(group_order_ids, delivery_amount, order_key).await?;
        self.call_rider_broadcast_hook(RiderBroadcastEvent::new(
            call.leg.order_key.clone(),
            BroadcastKind::New,
            DeliveryType::Delivery,
        ))
        .await;
        debug!("🔄️📦️ Delivery called for {} group orders on leg {}", call.group_orders.len(), call.leg.order_key);
        Ok(call)
    }

    /// A rider claims the outbound batch. On success the admin facility receives the
    /// admin_pickup code and the job leaves the rider pool.
    pub async fn assign_rider(&self, admin_pickup_key: &OrderKey, rider_id: i64) -> Result<RiderAssignment, TrackingApiError> {
        let assignment = self.db.assign_rider(admin_pickup_key, rider_id).await?;
        self.call_otp_dispatch_hook(OtpDispatchEvent::new(
            OtpRecipient::Admin(assignment.admin_id.clone()),
            OtpPurpose::AdminPickup,
            assignment.otp.clone(),
            format!("leg {}", assignment.leg.order_key),
        ))
        .await;
        self.call_rider_broadcast_hook(RiderBroadcastEvent::new(
            assignment.leg.order_key.clone(),
            BroadcastKind::Withdrawn,
            DeliveryType::Delivery,
        ))
        .await;
        debug!("🔄️🛵️ Rider #{rider_id} assigned to leg {admin_pickup_key}");
        Ok(assignment)
    }

    /// Facility hand-over checkpoint for the outbound batch. On success every shop in the batch
    /// receives its shop_delivery code.
    pub async fn verify_admin_pickup_otp(
        &self,
        order_key: &OrderKey,
        rider_id: i64,
        code: &str,
    ) -> Result<OutboundDispatch, TrackingApiError> {
        let check = self.otp_settings.check_for(code);
        let dispatch = self.db.verify_admin_pickup_otp(order_key, rider_id, check, self.otp_settings.ttl).await?;
        for shop_otp in &dispatch.shop_otps {
            self.call_otp_dispatch_hook(OtpDispatchEvent::new(
                OtpRecipient::ShopEmail(shop_otp.shop_email.clone()),
                OtpPurpose::ShopDelivery,
                shop_otp.code.clone(),
                format!("group order #{}", shop_otp.group_order_id),
            ))
            .await;
        }
        debug!("🔄️🔐️ Leg {order_key} released with {} group orders", dispatch.group_orders.len());
        Ok(dispatch)
    }

    /// Shop receipt checkpoint for one delivered bundle.
    pub async fn verify_delivery_otp(
        &self,
        group_order_id: i64,
        rider_id: i64,
        code: &str,
    ) -> Result<DeliveryReceipt, TrackingApiError> {
        let check = self.otp_settings.check_for(code);
        let receipt = self.db.verify_delivery_otp(group_order_id, rider_id, check, self.otp_settings.ttl).await?;
        debug!("🔄️🔐️ Group order #{group_order_id} delivered (leg cleared: {})", receipt.leg_cleared);
        Ok(receipt)
    }

    /// The rider settles a fully delivered leg, collecting their payment and becoming available
    /// again.
    pub async fn complete_transit(&self, order_key: &OrderKey, rider_id: i64) -> Result<TransitCompletion, TrackingApiError> {
        let completion = self.db.complete_transit(order_key, rider_id).await?;
        debug!("🔄️🏁️ Leg {order_key} completed by rider #{rider_id}");
        Ok(completion)
    }

    /// Sweeps expired OTP rows. Run periodically by the server.
    pub async fn purge_expired_otps(&self) -> Result<u64, TrackingApiError> {
        let removed = self.db.purge_expired_otps(self.otp_settings.ttl).await?;
        if removed > 0 {
            debug!("🔄️🧹️ Purged {removed} expired OTPs");
        }
        Ok(removed)
    }

    pub async fn fetch_group_order(&self, id: i64) -> Result<Option<GroupOrder>, TrackingApiError> {
        self.db.fetch_group_order(id).await
    }

    /// Shop dashboard: in-flight bundles with their live checkpoint codes and rider contacts.
    pub async fn active_shop_orders(&self, shop_id: i64) -> Result<Vec<ActiveShopOrder>, TrackingApiError> {
        self.db.active_shop_orders(shop_id, self.otp_settings.ttl).await
    }

    /// Admin dashboard: open legs touching the facility with their live checkpoint codes.
    pub async fn active_admin_legs(&self, admin_id: &str) -> Result<Vec<ActiveAdminLeg>, TrackingApiError> {
        self.db.active_admin_legs(admin_id, self.otp_settings.ttl).await
    }

    async fn call_rider_broadcast_hook(&self, event: RiderBroadcastEvent) {
        for emitter in &self.producers.rider_broadcast_producer {
            emitter.publish_event(event.clone()).await;
        }
    }

    async fn call_otp_dispatch_hook(&self, event: OtpDispatchEvent) {
        for emitter in &self.producers.otp_dispatch_producer {
            emitter.publish_event(event.clone()).await;
        }
    }
}
