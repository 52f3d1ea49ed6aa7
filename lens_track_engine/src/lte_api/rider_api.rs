use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{DeliveryLeg, NewRider, Rider},
    events::{EventProducers, RiderWelcomeEvent},
    helpers,
    traits::{RiderApiError, RiderManagement},
};

/// Signup details as submitted by a new rider. The public rider code and the password hash are
/// produced by the API, not the caller.
#[derive(Clone, Serialize, Deserialize)]
pub struct RiderRegistration {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub vehicle_number: String,
    pub password: String,
}

impl Debug for RiderRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RiderRegistration {{ name: {}, email: {}, password: **** }}", self.name, self.email)
    }
}

/// `RiderApi` handles the rider account surface: signup, login, shift state, contact details and
/// delivery history. Assignment locking lives with the tracking transitions, not here.
pub struct RiderApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for RiderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RiderApi")
    }
}

impl<B> RiderApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> RiderApi<B>
where B: RiderManagement
{
    /// Registers a new rider: draws an unused six-digit code, hashes the password, stores the
    /// account and fires the welcome hook.
    pub async fn register(&self, registration: RiderRegistration) -> Result<Rider, RiderApiError> {
        let mut rider_code = helpers::generate_rider_code();
        while self.db.rider_code_exists(&rider_code).await? {
            rider_code = helpers::generate_rider_code();
        }
        let password_hash =
            bcrypt::hash(registration.password.as_str(), bcrypt::DEFAULT_COST).map_err(|e| RiderApiError::HashError(e.to_string()))?;
        let rider = self
            .db
            .insert_rider(NewRider {
                rider_code,
                name: registration.name,
                phone: registration.phone,
                email: registration.email,
                vehicle_number: registration.vehicle_number,
                password_hash,
            })
            .await?;
        self.call_welcome_hook(RiderWelcomeEvent::new(rider.name.clone(), rider.email.clone())).await;
        info!("🔄️🛵️ Rider {} registered with code {}", rider.name, rider.rider_code);
        Ok(rider)
    }

    /// Checks credentials against the stored hash. The returned rider drives the client session;
    /// there is no server-side session state.
    pub async fn login(&self, email: &str, password: &str) -> Result<Rider, RiderApiError> {
        let rider = self.db.fetch_rider_by_email(email).await?.ok_or(RiderApiError::UnknownRider)?;
        let valid = bcrypt::verify(password, &rider.password_hash).map_err(|e| RiderApiError::HashError(e.to_string()))?;
        if !valid {
            return Err(RiderApiError::WrongPassword);
        }
        debug!("🔄️🛵️ Rider {} logged in", rider.rider_code);
        Ok(rider)
    }

    pub async fn rider_by_code(&self, code: &str) -> Result<Rider, RiderApiError> {
        self.db.fetch_rider_by_code(code).await?.ok_or(RiderApiError::NotFound)
    }

    pub async fn all_riders(&self) -> Result<Vec<Rider>, RiderApiError> {
        self.db.fetch_all_riders().await
    }

    /// Flips the rider's shift switch. Refused mid-assignment.
    pub async fn set_working_status(&self, code: &str, working: bool) -> Result<Rider, RiderApiError> {
        let rider = self.db.set_working_status(code, working).await?;
        debug!("🔄️🛵️ Rider {} is now {}", rider.rider_code, if working { "on shift" } else { "off shift" });
        Ok(rider)
    }

    pub async fn update_phone(&self, code: &str, phone: &str) -> Result<Rider, RiderApiError> {
        self.db.update_phone(code, phone).await
    }

    pub async fn register_push_token(&self, code: &str, token: &str) -> Result<Rider, RiderApiError> {
        self.db.register_push_token(code, token).await
    }

    /// Every leg the rider has carried, newest first. An empty history is reported as
    /// [`RiderApiError::NoHistory`].
    pub async fn history(&self, code: &str) -> Result<Vec<DeliveryLeg>, RiderApiError> {
        let rider = self.db.fetch_rider_by_code(code).await?.ok_or(RiderApiError::NotFound)?;
        let legs = self.db.rider_history(rider.id).await?;
        if legs.is_empty() {
            return Err(RiderApiError::NoHistory);
        }
        Ok(legs)
    }

    async fn call_welcome_hook(&self, event: RiderWelcomeEvent) {
        for emitter in &self.producers.rider_welcome_producer {
            emitter.publish_event(event.clone()).await;
        }
    }
}
