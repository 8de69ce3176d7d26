use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // System
        crate::api::handlers::health_handler,
        crate::api::handlers::metrics_handler,
        crate::api::handlers::config_handler,
        crate::api::handlers::config_update_handler,
        // ECOS
        crate::api::ecos_handlers::stat_search_handler,
        crate::api::ecos_handlers::key_stats_handler,
        // AI
        crate::api::ai_handlers::chat_diagnostic_handler,
        crate::api::ai_handlers::chat_completions_handler,
        crate::api::ai_handlers::prompt_handler,
        // Market
        crate::api::market_handlers::yahoo_chart_handler,
        crate::api::market_handlers::fdr_handler
    ),
    components(
        schemas(
            crate::api::handlers::HealthResponse,
            crate::api::handlers::HealthUpstreams,
            crate::api::handlers::ConfigStatus,
            crate::api::handlers::ConfigMessage,
            crate::api::ai_handlers::ChatDiagnostic,
            crate::api::ai_handlers::PromptRequest,
            crate::api::ai_handlers::PromptResponse,
            crate::domain::Series,
            crate::domain::Cycle,
            crate::domain::DataPoint,
            crate::domain::FdrResponse,
            crate::error::ErrorResponse
        )
    ),
    tags(
        (name = "system", description = "Health, metrics and configuration status"),
        (name = "ECOS", description = "Bank of Korea statistics"),
        (name = "AI", description = "Chat completion proxy"),
        (name = "Market", description = "Yahoo Finance market data")
    ),
    info(
        title = "Macro Data Gateway",
        description = "Proxy for Bank of Korea ECOS statistics, chat completions and market charts. Upstream keys stay server-side.",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
