pub mod pagination;

pub use pagination::{PageMeta, PaginationParams};
