//! Read-only projections of the submission cache.

pub mod dashboard;
pub mod gallery;

pub use dashboard::{DashboardStats, ScoreBands};
pub use gallery::{GalleryFilter, SortOption};
