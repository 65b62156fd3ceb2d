pub mod params;
pub mod pv;
pub mod search;
pub mod stats;
pub mod tt;
pub mod worker;

pub use params::SearchParams;
pub use search::{Search, SearchResult};
pub use worker::SearchWorker;
