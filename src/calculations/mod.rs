pub mod bands;
pub mod range_filter;
pub mod stacking;
pub mod timeline;
