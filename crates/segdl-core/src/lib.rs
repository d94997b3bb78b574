pub mod assembler;
pub mod batch;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetcher;
pub mod item;
pub mod logging;
pub mod naming;
pub mod pipeline;
pub mod playlist;
pub mod retry;
pub mod state_store;
pub mod transcode;
pub mod transport;
