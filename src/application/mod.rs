pub mod ai_service;
pub mod market_service;
pub mod series_fetcher;
pub mod statistics_service;

pub use ai_service::AiService;
pub use market_service::MarketService;
pub use series_fetcher::PagedSeriesFetcher;
pub use statistics_service::StatisticsService;
