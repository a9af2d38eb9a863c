//! Euro amounts written the Austrian way: `12,50 €` or `€ 12,50`.

use once_cell::sync::Lazy;
use regex::Regex;

static AMOUNT_FIRST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+),(\d{2})\s*€").expect("valid amount-first price regex"));
static SYMBOL_FIRST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"€\s*(\d+),(\d{2})").expect("valid symbol-first price regex"));

/// Where a site puts the euro sign relative to the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EuroSign {
    AfterAmount,
    BeforeAmount,
}

impl EuroSign {
    fn pattern(self) -> &'static Regex {
        match self {
            EuroSign::AfterAmount => &*AMOUNT_FIRST_RE,
            EuroSign::BeforeAmount => &*SYMBOL_FIRST_RE,
        }
    }
}

/// Cheapest price in one fragment, in cents.
pub fn price_in(text: &str, sign: EuroSign) -> Option<u32> {
    sign.pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole: u32 = caps[1].parse().ok()?;
            let fraction: u32 = caps[2].parse().ok()?;
            whole.checked_mul(100)?.checked_add(fraction)
        })
        .min()
}

/// Cheapest price across all fragments; fragments without a price are ignored.
pub fn lowest_price<I, S>(fragments: I, sign: EuroSign) -> Option<u32>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fragments
        .into_iter()
        .filter_map(|fragment| price_in(fragment.as_ref(), sign))
        .min()
}
