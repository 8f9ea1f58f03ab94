pub mod alpha_beta;
pub mod common;
pub mod move_ordering;
pub mod move_picker;
pub mod repetition;
pub mod tt;


pub use alpha_beta::Search;
pub use common::{SearchConfig, SearchLimits, SearchResult, SearchStats};
