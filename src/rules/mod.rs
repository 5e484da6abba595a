pub mod annotate;
pub mod evaluate;
