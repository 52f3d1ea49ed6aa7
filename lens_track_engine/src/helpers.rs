use rand::Rng;
use uuid::Uuid;

use crate::db_types::OrderKey;

/// Generates a fresh routing key for a delivery leg: the last segment of a v4 UUID. Short enough
/// to read out over the phone, random enough to not collide in practice.
pub fn new_order_key() -> OrderKey {
    let id = Uuid::new_v4().to_string();
    let key = id.rsplit('-').next().map(String::from).unwrap_or(id);
    OrderKey(key)
}

/// Generates a candidate six-digit public rider code. Uniqueness is enforced by the caller
/// against the store.
pub fn generate_rider_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}
