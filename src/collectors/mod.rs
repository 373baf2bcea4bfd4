pub mod cars_com;
pub mod traits;
pub mod types;
pub mod webmotors;

pub use cars_com::CarsComCollector;
pub use traits::Collector;
pub use types::{CollectorConfig, Filters};
pub use webmotors::WebmotorsCollector;
