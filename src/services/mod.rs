pub mod movie_service;
pub use movie_service::{
    DiscoverQuery, DiscoverResult, HealthInfo, MovieError, MovieService, YearFilter,
};

pub mod movie_service_impl;
pub use movie_service_impl::SpoilerPipeline;
