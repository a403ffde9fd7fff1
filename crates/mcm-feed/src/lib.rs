//! Oracle spot price feeds.
//!
//! Each market names an oracle URL. The payload behind it is provider
//! specific, so every provider gets an adapter that reduces it to a
//! `NormalizedPrice`. The `OracleFeed` trait is the fetch seam the pricer
//! depends on.

pub mod error;
pub mod normalize;
pub mod oracle;

pub use error::{FeedError, FeedResult};
pub use normalize::{normalize, FeedProvider, NormalizedPrice};
pub use oracle::{BoxFuture, HttpOracleFeed, OracleFeed, StaticOracleFeed};
