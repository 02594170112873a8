pub mod aggregator;
pub mod party;
pub mod protocol_messages;
