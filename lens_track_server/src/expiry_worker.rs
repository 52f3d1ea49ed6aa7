use lens_track_engine::{events::EventProducers, otp::OtpSettings, SqliteDatabase, TrackingApi};
use log::*;
use tokio::task::JoinHandle;

/// Starts the OTP purge worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_otp_purge_worker(db: SqliteDatabase, otp_settings: OtpSettings) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(60));
        let api = TrackingApi::new(db, EventProducers::default(), otp_settings);
        info!("🕰️ Expired OTP purge worker started");
        loop {
            timer.tick().await;
            match api.purge_expired_otps().await {
                Ok(0) => debug!("🕰️ No expired OTPs to purge"),
                Ok(n) => info!("🕰️ {n} expired OTPs purged"),
                Err(e) => error!("🕰️ Error purging expired OTPs: {e}"),
            }
        }
    })
}
