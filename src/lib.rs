pub mod aggregate;
pub mod combine;
pub mod config;
pub mod delivery;
pub mod delivery_store;
pub mod graph_export;
pub mod match_schema;
pub mod matchup_graph;
pub mod normalize;
pub mod pipeline;
pub mod stats_export;
