pub const SECRET_MASK: &str = "********";

pub const OVERVIEW_ELLIPSIS: &str = "...";

pub mod images {

    pub const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

    pub const POSTER_SIZE: &str = "w500";

    pub const BACKDROP_SIZE: &str = "w1280";
}

pub mod discover {

    pub const DEFAULT_YEAR: &str = "2025";

    pub const DEFAULT_PAGE: u32 = 1;
}

pub mod limits {

    pub const TRENDING_LIMIT: usize = 50;
}
