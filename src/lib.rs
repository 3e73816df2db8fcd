pub mod announce;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod stats;
