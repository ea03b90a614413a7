//! Sales velocity statistics over the sales log
//!
//! Only sale and return lines carrying the site-sales SID prefix and a usable
//! date are counted. Broad query shapes are bounded by the
//! [`DegradationPolicy`]; rows left out get [`SalesStats::default`], which
//! callers read as "not computed".

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use shared::{SalesLine, SalesLineKind};

use super::query::{multi_site_key, DegradationPolicy, QueryShape, ReportFilter};

/// Per (site, item) sales statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SalesStats {
    pub max_daily_sales: Decimal,
    /// Smallest daily total among days with positive sales
    pub min_daily_sales: Decimal,
    pub avg_daily_sales: Decimal,
    pub sales_transactions: u64,
    pub total_sales_qty: Decimal,
    pub sales_period_days: i64,
}

/// Why no analytics were computed for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    SalesTableMissing,
    MultipleSites,
    AllItemsAllSites,
}

/// Sales statistics for the rows of one report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesAnalytics {
    by_site: BTreeMap<String, BTreeMap<String, SalesStats>>,
    pub skipped: Option<SkipReason>,
}

impl SalesAnalytics {
    fn skipped(reason: SkipReason) -> Self {
        tracing::debug!(reason = ?reason, "Sales analytics skipped");
        Self {
            by_site: BTreeMap::new(),
            skipped: Some(reason),
        }
    }

    /// Stats for a row, zeroed when they were not computed
    pub fn get(&self, site: &str, item: &str) -> SalesStats {
        self.by_site
            .get(site)
            .and_then(|items| items.get(item))
            .copied()
            .unwrap_or_default()
    }

    pub fn contains(&self, site: &str, item: &str) -> bool {
        self.by_site
            .get(site)
            .is_some_and(|items| items.contains_key(item))
    }

    /// Number of (site, item) groups with statistics
    pub fn len(&self) -> usize {
        self.by_site.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct DailyTally {
    daily: BTreeMap<NaiveDate, Decimal>,
    transactions: u64,
}

impl DailyTally {
    fn add(&mut self, date: NaiveDate, qty: Decimal) {
        let day = self.daily.entry(date).or_default();
        *day = day.saturating_add(qty);
        self.transactions += 1;
    }

    fn stats(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> SalesStats {
        let total = self
            .daily
            .values()
            .copied()
            .fold(Decimal::ZERO, Decimal::saturating_add);
        let period = sales_period_days(
            from,
            to,
            self.daily.keys().next().copied(),
            self.daily.keys().next_back().copied(),
        );

        SalesStats {
            max_daily_sales: self.daily.values().copied().max().unwrap_or_default(),
            min_daily_sales: self
                .daily
                .values()
                .copied()
                .filter(|qty| *qty > Decimal::ZERO)
                .min()
                .unwrap_or_default(),
            avg_daily_sales: average_daily_sales(total, period),
            sales_transactions: self.transactions,
            total_sales_qty: total,
            sales_period_days: period,
        }
    }
}

/// Length in days of the window sales are averaged over.
///
/// Explicit bounds win; a missing bound falls back to the first or last
/// observed sale date. Returns 0 when a needed date is unavailable.
pub fn sales_period_days(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    first_sale: Option<NaiveDate>,
    last_sale: Option<NaiveDate>,
) -> i64 {
    let (start, end) = match (from, to) {
        (Some(from), Some(to)) => (Some(from), Some(to)),
        (Some(from), None) => (Some(from), last_sale),
        (None, Some(to)) => (first_sale, Some(to)),
        (None, None) => (first_sale, last_sale),
    };
    match (start, end) {
        (Some(start), Some(end)) => (end - start).num_days() + 1,
        _ => 0,
    }
}

/// `total / period`, rounded to a whole number (half to even)
pub fn average_daily_sales(total: Decimal, period_days: i64) -> Decimal {
    if period_days <= 0 {
        return Decimal::ZERO;
    }
    (total / Decimal::from(period_days))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
}

/// Lines that count toward sales analytics, paired with their date
pub fn qualifying_lines<'a>(
    lines: &'a [SalesLine],
    site_sales_prefix: &'a str,
) -> impl Iterator<Item = (&'a SalesLine, NaiveDate)> + 'a {
    lines.iter().filter_map(move |line| {
        let counted = matches!(line.kind(), SalesLineKind::Sale | SalesLineKind::Return)
            && line.sid_starts_with(site_sales_prefix);
        if counted {
            line.date.map(|date| (line, date))
        } else {
            None
        }
    })
}

fn site_of(line: &SalesLine) -> &str {
    &line.site
}

fn item_of(line: &SalesLine) -> &str {
    &line.item
}

/// Keep only lines whose key is among the `limit` largest by total quantity.
/// Ties go to the smaller key.
fn retain_top<'a>(
    lines: &mut Vec<(&'a SalesLine, NaiveDate)>,
    limit: usize,
    key: fn(&SalesLine) -> &str,
) {
    let mut totals: BTreeMap<&'a str, Decimal> = BTreeMap::new();
    for (line, _) in lines.iter() {
        let total = totals.entry(key(*line)).or_default();
        *total = total.saturating_add(line.quantity());
    }
    if totals.len() <= limit {
        return;
    }

    let mut ranked: Vec<(&str, Decimal)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let kept: HashSet<&str> = ranked.into_iter().take(limit).map(|(k, _)| k).collect();
    tracing::debug!(limit, "Sales analytics limited to top groups by volume");

    lines.retain(|(line, _)| kept.contains(key(*line)));
}

/// Compute sales statistics for the rows `filter` selects
pub fn compute_sales(
    sales: Option<&[SalesLine]>,
    filter: &ReportFilter,
    policy: &DegradationPolicy,
    site_sales_prefix: &str,
) -> SalesAnalytics {
    let Some(sales) = sales else {
        tracing::warn!("Sales table not loaded; sales analytics unavailable");
        return SalesAnalytics::skipped(SkipReason::SalesTableMissing);
    };
    if policy.skip_multi_site_sales && filter.site_codes.len() > 1 {
        return SalesAnalytics::skipped(SkipReason::MultipleSites);
    }

    let shape = filter.shape();
    // synthetic rows are keyed by the multi-site label instead of a site id
    let synthetic_site = match &shape {
        QueryShape::ByMultiSite { sites, .. } => {
            if policy.skip_multi_site_sales {
                return SalesAnalytics::skipped(SkipReason::MultipleSites);
            }
            Some(multi_site_key(sites.len()))
        }
        QueryShape::ByAll if policy.skip_all_by_all_sales => {
            return SalesAnalytics::skipped(SkipReason::AllItemsAllSites);
        }
        _ => None,
    };

    let mut lines: Vec<(&SalesLine, NaiveDate)> = qualifying_lines(sales, site_sales_prefix)
        .filter(|(line, date)| filter.matches(&line.site, &line.item) && filter.in_sales_window(*date))
        .collect();

    match shape {
        QueryShape::ByItem { .. } => {
            if let Some(limit) = policy.top_sites_per_item {
                retain_top(&mut lines, limit, site_of);
            }
        }
        QueryShape::BySite { .. } => {
            if let Some(limit) = policy.top_items_per_site {
                retain_top(&mut lines, limit, item_of);
            }
        }
        _ => {}
    }

    let mut tallies: BTreeMap<String, BTreeMap<String, DailyTally>> = BTreeMap::new();
    for (line, date) in &lines {
        let site = synthetic_site.as_deref().unwrap_or(line.site.as_str());
        tallies
            .entry(site.to_string())
            .or_default()
            .entry(line.item.clone())
            .or_default()
            .add(*date, line.quantity());
    }

    let by_site: BTreeMap<String, BTreeMap<String, SalesStats>> = tallies
        .into_iter()
        .map(|(site, items)| {
            let stats = items
                .into_iter()
                .map(|(item, tally)| (item, tally.stats(filter.from_date, filter.to_date)))
                .collect();
            (site, stats)
        })
        .collect();

    let analytics = SalesAnalytics {
        by_site,
        skipped: None,
    };
    tracing::debug!(
        lines = lines.len(),
        groups = analytics.len(),
        "Sales analytics computed"
    );
    analytics
}
