//! Payment arithmetic for group orders and delivery legs.

use ltg_common::Paisa;

use crate::db_types::{PaymentOption, PaymentStatus};

/// The rider's share of the delivery charge for running the inbound shop pickup leg.
pub const PICKUP_SHARE_PERCENT: i64 = 40;

/// The creation-time settlement of a bundle. `paid_amount + left_amount` always equals the
/// bundle's final amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentSplit {
    pub paid_amount: Paisa,
    pub left_amount: Paisa,
    pub status: PaymentStatus,
}

/// Splits the bundle total according to the shop's payment choice. Paying in full settles goods
/// and delivery up front; pay-on-delivery settles the delivery charge only and carries the goods
/// total forward on the shop's credit.
pub fn split_payment(total: Paisa, delivery_charge: Paisa, option: PaymentOption) -> PaymentSplit {
    match option {
        PaymentOption::Full => PaymentSplit {
            paid_amount: total + delivery_charge,
            left_amount: Paisa::from(0),
            status: PaymentStatus::Completed,
        },
        PaymentOption::OnDelivery => PaymentSplit {
            paid_amount: delivery_charge,
            left_amount: total,
            status: PaymentStatus::Pending,
        },
    }
}

/// What the rider earns for the inbound leg of a new bundle.
pub fn pickup_leg_fee(delivery_charge: Paisa) -> Paisa {
    delivery_charge.percent(PICKUP_SHARE_PERCENT)
}
