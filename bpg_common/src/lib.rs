mod money;

pub mod helpers;
pub mod op;

pub use money::{MoneyCents, MoneyConversionError, SHOP_CURRENCY_CODE};
