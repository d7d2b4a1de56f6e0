use std::collections::BTreeMap;
use std::fmt::Write as _;

use itertools::Itertools;
use rust_decimal::Decimal;

use crate::{
    model::{AnalysisRecord, DecadeRanking, midpoint},
    table::{self, Align},
};

#[derive(Default)]
struct DishTally {
    frequency: usize,
    prices: Vec<Decimal>,
}

/// Median of `values`, averaging the two middle values for even counts.
///
/// `None` for an empty slice or when the two middle values overflow.
pub fn median(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        midpoint(sorted[mid - 1], sorted[mid])
    } else {
        Some(sorted[mid])
    }
}

/// Top `per_decade` dishes by row count within each decade.
///
/// Decades are emitted in ascending order. Within a decade, equal frequencies
/// are ordered by dish name ascending.
pub fn rank_decades(records: &[AnalysisRecord], per_decade: usize) -> Vec<DecadeRanking> {
    let mut decades: BTreeMap<i32, BTreeMap<&str, DishTally>> = BTreeMap::new();
    for record in records {
        let tally = decades
            .entry(record.decade)
            .or_default()
            .entry(record.dish_name.as_str())
            .or_default();
        tally.frequency += 1;
        if let Some(price) = record.avg_price {
            tally.prices.push(price);
        }
    }

    let mut rankings = Vec::new();
    for (decade, dishes) in decades {
        let ranked = dishes
            .into_iter()
            .sorted_by(|a, b| b.1.frequency.cmp(&a.1.frequency))
            .take(per_decade);
        for (idx, (name, tally)) in ranked.enumerate() {
            rankings.push(DecadeRanking {
                decade,
                rank: idx + 1,
                dish_name: name.to_string(),
                frequency: tally.frequency,
                median_price: median(&tally.prices),
            });
        }
    }
    rankings
}

/// Record count per decade, ascending by decade.
pub fn decade_totals(records: &[AnalysisRecord]) -> BTreeMap<i32, usize> {
    records.iter().map(|r| r.decade).counts().into_iter().collect()
}

pub fn render_rankings(records: &[AnalysisRecord], rankings: &[DecadeRanking]) -> String {
    let totals = decade_totals(records);
    let priced = records.iter().filter(|r| r.avg_price.is_some()).count();
    let priced_pct = if records.is_empty() {
        0.0
    } else {
        100.0 * priced as f64 / records.len() as f64
    };

    let mut out = String::new();
    let _ = writeln!(out, "Top Dishes by Decade");
    let _ = writeln!(out, "{}", "=".repeat(55));
    let _ = writeln!(
        out,
        "Dataset: {} records across {} decades",
        records.len(),
        totals.len()
    );
    let _ = writeln!(out, "Price data: {priced} records ({priced_pct:.1}%)");

    for (decade, group) in &rankings.iter().chunk_by(|r| r.decade) {
        let total = totals.get(&decade).copied().unwrap_or(0);
        let rows = group
            .map(|r| {
                let share = if total == 0 {
                    0.0
                } else {
                    100.0 * r.frequency as f64 / total as f64
                };
                vec![
                    format!("{}.", r.rank),
                    r.dish_name.clone(),
                    format!("{}x", r.frequency),
                    format!("{share:.1}%"),
                    r.median_price
                        .map(|p| format!("${:.2}", p.round_dp(2)))
                        .unwrap_or_else(|| "No price".to_string()),
                ]
            })
            .collect::<Vec<_>>();
        let _ = writeln!(out);
        let _ = writeln!(out, "{decade}s ({total} total records):");
        out.push_str(&table::render_table(
            &["rank", "dish", "freq", "share", "median"],
            &rows,
            &[Align::Right, Align::Left, Align::Right, Align::Right, Align::Right],
            "   ",
        ));
    }
    out
}
