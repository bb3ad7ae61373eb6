pub mod feed;
pub mod pagination;
