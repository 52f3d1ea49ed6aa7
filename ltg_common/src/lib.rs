mod paisa;

pub mod op;
mod secret;

mod helpers;

pub use helpers::parse_boolean_flag;
pub use paisa::{Paisa, PaisaConversionError, INR_CURRENCY_CODE, INR_CURRENCY_CODE_LOWER};
pub use secret::Secret;
