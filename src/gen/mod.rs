pub mod client;
pub mod hint;
pub mod pipeline;
