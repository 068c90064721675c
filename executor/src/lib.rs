pub mod bloxroute;
pub mod error;
pub mod jito;
pub mod raydium_builder;
pub mod rpc;
pub mod submitter;

pub use bloxroute::BloxrouteRelay;
pub use error::RelayError;
pub use jito::JitoRelay;
pub use raydium_builder::RaydiumSwapBuilder;
pub use rpc::RpcRelay;
pub use submitter::Submitter;
