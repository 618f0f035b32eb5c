//! Operation traits; `ops::cpu` and `ops::cuda` implement them per client.

mod split;

pub use split::SplitOps;
