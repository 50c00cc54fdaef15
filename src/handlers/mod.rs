pub mod history;
pub mod meta;
pub mod symbols;
