mod helpers;
mod mocks;

mod riders;
mod shop_orders;
mod tracking;
