pub mod limiter;
pub mod offline;
pub mod openexchange;

pub use offline::OfflineRateProvider;
pub use openexchange::OpenExchangeProvider;
