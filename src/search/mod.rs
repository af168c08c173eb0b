pub mod engine;
pub mod types;

pub use engine::{available_cities, available_property_types, search, SearchPage};
pub use types::{SearchCriteria, DEFAULT_PAGE_SIZE};
