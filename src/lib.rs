pub mod fetch;
pub mod infra;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod resolver;
pub mod retriever;
pub mod services;
