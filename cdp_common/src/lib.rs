mod amount;

pub mod helpers;
pub mod op;
mod secret;

pub use amount::{AmountConversionError, Paise, Rupees, CURRENCY_CODE, PAISE_PER_RUPEE};
pub use secret::Secret;
