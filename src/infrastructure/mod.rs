pub mod ecos_client;
pub mod http;
pub mod openai_client;
pub mod secrets;
pub mod yahoo_client;

pub use ecos_client::EcosClient;
pub use http::UpstreamHttp;
pub use openai_client::OpenAiClient;
pub use secrets::Secrets;
pub use yahoo_client::YahooClient;
