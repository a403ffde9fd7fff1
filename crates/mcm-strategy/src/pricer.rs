//! Position token pricing.
//!
//! Fair value of the long token is `spot - floor`, of the short token
//! `ceiling - spot`. The bot sells above and buys below fair value by the
//! skew:
//!
//! ```text
//! skew     = max(min_spread / 2, spread_width * (ceiling + floor) / 2)
//! maker    = fair + skew   (bot gives the token away)
//! taker    = fair - skew   (bot takes the token in)
//! ```
//!
//! Every skewed price must be above zero and within the band spread.

use crate::context::MarketContext;
use crate::error::StrategyResult;
use crate::sanity::{SanityChecker, SanityError};
use mcm_core::{Address, Price, QuoteSide, TokenRole};
use mcm_feed::OracleFeed;
use mcm_telemetry::Metrics;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub struct Pricer {
    feed: Arc<dyn OracleFeed>,
}

impl Pricer {
    pub fn new(feed: Arc<dyn OracleFeed>) -> Self {
        Self { feed }
    }

    /// Price of `token` for the given side of a trade.
    pub async fn get(
        &self,
        ctx: &MarketContext,
        token: &Address,
        side: QuoteSide,
    ) -> StrategyResult<Price> {
        match ctx.role_of(token)? {
            TokenRole::Collateral => Ok(ctx.config.collateral_price),
            TokenRole::Long => self.long_price(ctx, side).await,
            TokenRole::Short => self.short_price(ctx, side).await,
        }
    }

    pub async fn long_price(&self, ctx: &MarketContext, side: QuoteSide) -> StrategyResult<Price> {
        let spot = self.spot_price(ctx).await?;
        let fair = spot - ctx.floor();
        self.apply_skew(ctx, fair, side)
    }

    pub async fn short_price(&self, ctx: &MarketContext, side: QuoteSide) -> StrategyResult<Price> {
        let spot = self.spot_price(ctx).await?;
        let fair = ctx.ceiling() - spot;
        self.apply_skew(ctx, fair, side)
    }

    /// Offset from fair value, never below `min_spread / 2`.
    pub fn skew(ctx: &MarketContext) -> Decimal {
        let pricing = &ctx.config.pricing;
        let midpoint = (ctx.ceiling() + ctx.floor()) / Decimal::TWO;
        let skew = pricing.spread_width * midpoint;
        skew.max(pricing.min_skew())
    }

    /// Current spot price from the market's oracle.
    ///
    /// Fetch and parse failures are returned, never replaced by a stale value.
    pub async fn spot_price(&self, ctx: &MarketContext) -> StrategyResult<Decimal> {
        let market = ctx.market();
        let url = &ctx.snapshot.oracle_url;
        let started = Instant::now();

        let reading = match self.feed.fetch(url).await {
            Ok(reading) => reading,
            Err(e) => {
                warn!(%market, oracle = %url, error = %e, "Oracle fetch failed");
                Metrics::oracle_failure(&market);
                return Err(e.into());
            }
        };
        Metrics::oracle_latency(&market, started.elapsed().as_secs_f64() * 1000.0);

        let spot = SanityChecker::is_numeric(&reading.price).map_err(|e| reject(&market, e))?;
        debug!(%market, %spot, symbol = ?reading.symbol, "Spot price");
        Ok(spot)
    }

    fn apply_skew(&self, ctx: &MarketContext, fair: Decimal, side: QuoteSide) -> StrategyResult<Price> {
        let skew = Self::skew(ctx);
        let proposed = match side {
            QuoteSide::Taker => fair - skew,
            QuoteSide::Maker => fair + skew,
        };

        let market = ctx.market();
        SanityChecker::greater_than_zero(proposed).map_err(|e| reject(&market, e))?;
        SanityChecker::less_than_band(proposed, ctx).map_err(|e| reject(&market, e))?;

        debug!(%market, %side, %fair, %skew, %proposed, "Skewed price");
        Ok(Price::new(proposed))
    }
}

fn reject(market: &str, error: SanityError) -> SanityError {
    warn!(%market, check = error.check(), %error, "Price rejected");
    Metrics::sanity_rejected(error.check());
    error
}
