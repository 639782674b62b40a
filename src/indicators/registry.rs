use once_cell::sync::Lazy;

use crate::indicators::net_liquidity::NetLiquidity;
use crate::indicators::ratio::{CopperGoldRatio, GoldOilRatio};
use crate::indicators::spread::LiquidityStress;
use crate::indicators::CalculatedIndicator;
use crate::models::{SourceKind, SourceSpec};

// Helper macro to reduce boilerplate
macro_rules! spec {
    ($key:expr, $code:expr, $source:expr, $lookback:expr, $gap:expr) => {
        SourceSpec {
            source: $source,
            code: $code.to_string(),
            key: $key.to_string(),
            lookback_days: $lookback,
            gap_limit: $gap,
        }
    };
}

/// The default acquisition set: the liquidity complex from the statistical
/// source, the macro tape from the quotes source. Statistical series are
/// daily-resampled with a 2-day interpolation window; market series keep
/// their trading calendar.
static SOURCE_SPECS: Lazy<Vec<SourceSpec>> = Lazy::new(|| {
    vec![
        // ================================================================
        // STATISTICAL SERIES (central-bank liquidity & rates)
        // ================================================================
        spec!("TGA", "WTREGEN", SourceKind::Fred, 365, Some(2)),
        spec!("ON_RRP", "RRPONTSYD", SourceKind::Fred, 365, Some(2)),
        spec!("Fed_BS", "WALCL", SourceKind::Fred, 365, Some(2)),
        spec!("SOFR", "SOFR", SourceKind::Fred, 365, Some(2)),
        spec!("Fed_Funds", "DFF", SourceKind::Fred, 365, Some(2)),
        spec!("Yield_Curve", "T10Y2Y", SourceKind::Fred, 365, Some(2)),
        // ================================================================
        // MARKET DAILY BARS (close only)
        // ================================================================
        spec!("Gold", "GC=F", SourceKind::Market, 365, None),
        spec!("Oil", "CL=F", SourceKind::Market, 365, None),
        spec!("Copper", "HG=F", SourceKind::Market, 365, None),
        spec!("DXY", "DX-Y.NYB", SourceKind::Market, 365, None),
        spec!("CNH", "CNY=X", SourceKind::Market, 365, None),
        spec!("US10Y", "^TNX", SourceKind::Market, 365, None),
        spec!("A50_HK", "2823.HK", SourceKind::Market, 365, None),
    ]
});

pub struct Registry;

impl Registry {
    pub fn default_specs() -> &'static [SourceSpec] {
        &SOURCE_SPECS
    }

    pub fn spec_for(key: &str) -> Option<&'static SourceSpec> {
        SOURCE_SPECS.iter().find(|s| s.key == key)
    }

    /// Every derived metric, in computation order. Each one is attempted
    /// after the fetch fan-out; metrics with missing inputs are skipped.
    pub fn derived_indicators() -> Vec<Box<dyn CalculatedIndicator + Send + Sync>> {
        vec![
            Box::new(LiquidityStress),
            Box::new(NetLiquidity),
            Box::new(GoldOilRatio),
            Box::new(CopperGoldRatio),
        ]
    }
}
