mod rupee;

pub mod op;
mod secret;
mod weight;

pub use rupee::{Rupee, RupeeConversionError, RUPEE_CURRENCY_CODE};
pub use secret::Secret;
pub use weight::Grams;
