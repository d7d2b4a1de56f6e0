//! Console, text, and JSON renderings of a [`QualityReport`].

use std::fmt;

use anyhow::{Context, Result};
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{CONSOLE_DECADES, QualityReport, TableDelta, TemporalProfile};
use crate::{
    model::decade_of,
    table::{self, Align},
};

fn or_no_data<T: fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "no data".to_string())
}

fn money(value: Option<Decimal>) -> String {
    value
        .map(|v| format!("${:.2}", v.round_dp(2)))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Line-oriented buffer shared by the console and text renderers.
#[derive(Default)]
struct Lines(String);

impl Lines {
    fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.0.push_str(text.as_ref());
        self.0.push('\n');
        self
    }

    fn all<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.line(line);
        }
        self
    }

    fn bullets(&mut self, items: &[&str]) -> &mut Self {
        self.all(items.iter().map(|item| format!("• {item}")))
    }

    /// Blank line, then `title` between two rules.
    fn banner(&mut self, title: &str, rule: &str) -> &mut Self {
        self.all(["", rule, title, rule])
    }

    /// Blank line, then `title` underlined by `rule`.
    fn heading(&mut self, title: &str, rule: &str) -> &mut Self {
        self.all(["", title, rule])
    }

    fn table(&mut self, headers: &[&str], rows: &[Vec<String>], align: &[Align]) -> &mut Self {
        self.0
            .push_str(&table::render_table(headers, rows, align, "  "));
        self
    }
}

fn year_span(temporal: &TemporalProfile) -> Option<(i32, i32)> {
    temporal.min_year.zip(temporal.max_year)
}

/// Console summary printed while the assessment runs.
pub fn render_console(report: &QualityReport, generated_at: &str) -> String {
    let rule = "=".repeat(60);
    let sub = "-".repeat(30);
    let integrity = &report.integrity;
    let coverage = &report.coverage;
    let temporal = &report.temporal;
    let derivation = &report.price_derivation;
    let mut out = Lines::default();

    out.all([
        "DATA QUALITY ASSESSMENT REPORT".to_string(),
        rule.clone(),
        format!("Generated: {generated_at}"),
        rule.clone(),
        format!(
            "Original data: {} dishes, {} menu items",
            report.dish.original, report.menu_item.original
        ),
        format!(
            "Cleaned data: {} dishes, {} menu items",
            report.dish.cleaned, report.menu_item.cleaned
        ),
        format!("Final dataset: {} analysis-ready records", integrity.total_records),
    ]);

    out.banner("STAGE 1: CLEANING IMPROVEMENTS", &rule)
        .heading("1.1 DISH DATA CLEANING", &sub)
        .line(format!(
            "Records: {} -> {} ({} removed)",
            report.dish.original, report.dish.cleaned, report.dish.removed
        ))
        .all(["", "Example dish name improvements:"])
        .all(report.name_preview.iter().map(|p| {
            if p.changed {
                format!("  ID {}: '{}' -> '{}'", p.dish_id, p.original, p.cleaned)
            } else {
                format!("  ID {}: '{}' (no change needed)", p.dish_id, p.original)
            }
        }));

    out.heading("1.2 MENU ITEM DATA CLEANING", &sub).line(format!(
        "Records: {} -> {} ({} removed)",
        report.menu_item.original, report.menu_item.cleaned, report.menu_item.removed
    ));
    for (label, nulls) in [
        ("price", &report.price_nulls),
        ("high_price", &report.high_price_nulls),
    ] {
        out.all([
            format!("{label} completeness improvement:"),
            format!("  Original NULL {label}s: {}", nulls.original_nulls),
            format!("  Cleaned NULL {label}s: {}", nulls.cleaned_nulls),
            format!("  Improvement: {} additional {label} values", nulls.improvement),
        ]);
    }

    let shares = report
        .top_dishes
        .iter()
        .map(|s| {
            vec![
                s.dish_name.clone(),
                s.records.to_string(),
                format!("{:.1}%", s.share_pct),
            ]
        })
        .collect::<Vec<_>>();
    out.banner("STAGE 2: JOIN AND FILTERING IMPROVEMENTS", &rule)
        .heading("2.1 DATA SCOPE REFINEMENT", &sub)
        .all([
            format!("  Input records: {}", report.scope.input_records),
            format!("  Output records: {}", report.scope.output_records),
            format!(
                "  Reduction: {:.1}% (focused on top dishes)",
                report.scope.reduction_pct
            ),
            String::new(),
            "Top dishes selected:".to_string(),
        ])
        .table(
            &["dish", "records", "share"],
            &shares,
            &[Align::Left, Align::Right, Align::Right],
        );

    out.heading("2.2 CALCULATED FIELD CREATION", &sub).all([
        format!("  Price ranges processed: {} (averaged)", derivation.ranges_averaged),
        format!("  Single prices processed: {} (used directly)", derivation.single_prices),
        format!(
            "  Total calculated prices: {}",
            derivation.ranges_averaged + derivation.single_prices
        ),
    ]);
    if !derivation.examples.is_empty() {
        out.all(["", "Example price calculations:"])
            .all(derivation.examples.iter().map(|e| {
                format!(
                    "  {}: {}-{} -> {}",
                    e.dish_name,
                    money(Some(e.price)),
                    money(Some(e.high_price)),
                    money(e.avg_price)
                )
            }));
    }

    let decades = temporal
        .decade_distribution
        .iter()
        .take(CONSOLE_DECADES)
        .map(|d| vec![format!("{}s", d.decade), d.records.to_string()])
        .collect::<Vec<_>>();
    out.heading("2.3 TEMPORAL STANDARDIZATION", &sub)
        .line(match year_span(temporal) {
            Some((min, max)) => format!("  Date range: {min}-{max}"),
            None => "  Date range: no data".to_string(),
        })
        .all([
            format!("  Unique years: {}", temporal.distinct_years),
            format!("  Organized into decades: {}", temporal.distinct_decades),
            String::new(),
            "Decade distribution:".to_string(),
        ])
        .table(&["decade", "records"], &decades, &[Align::Left, Align::Right]);
    if temporal.decade_distribution.len() > CONSOLE_DECADES {
        out.line(format!(
            "  ... and {} more decades",
            temporal.decade_distribution.len() - CONSOLE_DECADES
        ));
    }

    out.banner("QUALITY VALIDATION RESULTS", &rule)
        .heading("3.1 DATA INTEGRITY CHECKS", &sub)
        .all([
            format!(
                "Dish ID consistency: {} name(s) per ID (should be 1)",
                integrity.max_names_per_dish_id
            ),
            format!(
                "Date validity: {}/{} ({:.1}%)",
                integrity.valid_dates, integrity.total_records, integrity.date_validity_pct
            ),
            format!(
                "Price availability: {}/{} ({:.1}%)",
                integrity.priced_records, integrity.total_records, integrity.price_coverage_pct
            ),
        ])
        .heading("3.2 ANALYTICAL READINESS", &sub)
        .all([
            format!("  Decades with data: {}", coverage.decades_with_data),
            format!(
                "  Records per decade: {} (min) to {} (max)",
                or_no_data(coverage.min_records_per_decade),
                or_no_data(coverage.max_records_per_decade)
            ),
            format!("  Decades with price data: {}", coverage.decades_with_price_data),
        ])
        .heading("3.3 SUMMARY STATISTICS", &sub)
        .all([
            format!("  Stage 1 record improvements: {}", report.stage1_improvement),
            format!(
                "  Stage 2 scope refinement: {:.1}% focused",
                report.scope.reduction_pct
            ),
            format!(
                "  Final dataset completeness: {:.1}% dates, {:.1}% prices",
                integrity.date_validity_pct, integrity.price_coverage_pct
            ),
            format!(
                "  Quality score: {:.1}% ({})",
                report.quality_score, report.grade
            ),
        ]);
    out.0
}

/// Full text report written to disk.
pub fn render_text(report: &QualityReport, generated_at: &str) -> String {
    let banner = "═".repeat(63);
    let integrity = &report.integrity;
    let coverage = &report.coverage;
    let temporal = &report.temporal;
    let scope = &report.scope;
    let mut out = Lines::default();

    out.all([
        banner.clone(),
        format!("{:^63}", "DATA QUALITY ASSESSMENT"),
        format!("{:^63}", "Historical Menu Dataset Analysis"),
        banner.clone(),
        format!("Generated: {generated_at}"),
    ]);
    out.heading("SUMMARY", &"─".repeat(17)).all([
        format!(
            "Total Data Quality Improvement: {} records enhanced",
            report.stage1_improvement
        ),
        format!(
            "Scope Refinement: {:.1}% focused on analysis requirements",
            scope.reduction_pct
        ),
        format!(
            "Final Dataset Integrity: {:.1}% date validity, {:.1}% price coverage",
            integrity.date_validity_pct, integrity.price_coverage_pct
        ),
        format!("Analysis-Ready Records: {} records", integrity.total_records),
    ]);

    out.heading("STAGE 1: CONSTRAINT VIOLATION CORRECTIONS", &"─".repeat(57));
    table_delta_lines(&mut out, "DISH.CSV IMPROVEMENTS:", &report.dish)
        .line("Primary Constraint Violations Corrected:")
        .bullets(&[
            "Name normalization (case, spacing, punctuation)",
            "Duplicate removal with semantic analysis",
            "Missing value standardization",
            "Format consistency enforcement",
        ])
        .all(["", "Sample Corrections in Dish.csv:"]);
    if report.sample_changes.is_empty() {
        out.line("  (no name changes found)");
    }
    out.all(report.sample_changes.iter().enumerate().map(|(idx, c)| {
        format!(
            "  {}. ID {}: '{}' → '{}'",
            idx + 1,
            c.dish_id,
            c.original,
            c.cleaned
        )
    }));

    table_delta_lines(&mut out, "MENUITEM.CSV IMPROVEMENTS:", &report.menu_item)
        .line("Primary Constraint Violations Corrected:")
        .bullets(&[
            "Price format standardization (decimal precision)",
            "Missing price value handling",
            "Date format consistency enforcement",
            "Reference integrity validation",
        ])
        .all([
            String::new(),
            "Sample Improvements in MenuItem.csv:".to_string(),
            format!(
                "  • Price data completeness: {} missing values addressed",
                report.price_nulls.improvement
            ),
            format!("  • Original null prices: {}", report.price_nulls.original_nulls),
            format!("  • Cleaned null prices: {}", report.price_nulls.cleaned_nulls),
            format!(
                "  • High price completeness: {} missing values addressed",
                report.high_price_nulls.improvement
            ),
        ]);

    out.heading("STAGE 2: PROCESSING PIPELINE REFINEMENTS", &"─".repeat(42))
        .all([
            "SCOPE REFINEMENT ANALYSIS:".to_string(),
            format!("• Initial combined records: {}", scope.input_records),
            format!("• Analysis-focused final records: {}", scope.output_records),
            format!(
                "• Scope reduction: {:.1}% (methodological focus)",
                scope.reduction_pct
            ),
            String::new(),
            "Refinement Strategy:".to_string(),
        ])
        .bullets(&[
            "Elimination of records without valid dates",
            "Removal of entries lacking price information",
            "Focus on complete dish-price-date combinations",
            "Optimization for temporal analysis requirements",
        ]);

    out.heading("DATA INTEGRITY VALIDATION", &"─".repeat(25))
        .line("FINAL DATASET QUALITY METRICS:")
        .line(format!(
            "• Dish ID Consistency: {} name(s) per ID",
            integrity.max_names_per_dish_id
        ));
    if !integrity.inconsistent_dish_ids.is_empty() {
        out.line(format!(
            "• Dish IDs with conflicting names: {}",
            integrity.inconsistent_dish_ids.iter().join(", ")
        ));
    }
    out.all([
        format!(
            "• Date Validity: {:.1}% ({}/{} records)",
            integrity.date_validity_pct, integrity.valid_dates, integrity.total_records
        ),
        format!(
            "• Price Coverage: {:.1}% ({}/{} records)",
            integrity.price_coverage_pct, integrity.priced_records, integrity.total_records
        ),
        format!(
            "• Complete Records: {} analysis-ready entries",
            integrity.total_records
        ),
        String::new(),
        "TEMPORAL COVERAGE ANALYSIS:".to_string(),
    ]);
    match year_span(temporal) {
        Some((min, max)) => out.all([
            format!(
                "• Temporal Span: {min}-{max} ({}s-{}s)",
                decade_of(min),
                decade_of(max)
            ),
            format!(
                "• Decade Coverage: {} distinct decades",
                temporal.distinct_decades
            ),
            format!("• Annual Distribution: {} years represented", max - min + 1),
        ]),
        None => out.line("• No dated records"),
    };

    out.all([
        String::new(),
        "DECADE ANALYSIS READINESS:".to_string(),
        format!("• Decades with data: {}", coverage.decades_with_data),
        format!(
            "• Records per decade: {} (min) to {} (max)",
            coverage.min_records_per_decade.unwrap_or(0),
            coverage.max_records_per_decade.unwrap_or(0)
        ),
        format!(
            "• Decades with price data: {}",
            coverage.decades_with_price_data
        ),
    ]);

    out.heading("OVERALL ASSESSMENT", &"─".repeat(18))
        .all([
            format!("Data Quality Score: {:.1}%", report.quality_score),
            format!("Quality Classification: {}", report.grade),
            String::new(),
            "RECOMMENDATIONS:".to_string(),
        ])
        .bullets(&[
            "Dataset ready for comprehensive temporal analysis",
            "Strong foundation for decade-based price trends",
            "Sufficient data density for statistical significance",
            "Quality constraints successfully enforced",
        ])
        .all([
            "",
            banner.as_str(),
            "Assessment Complete - Dataset Validated for Analysis",
            banner.as_str(),
        ]);
    out.0
}

fn table_delta_lines<'a>(out: &'a mut Lines, title: &str, delta: &TableDelta) -> &'a mut Lines {
    out.all([
        String::new(),
        title.to_string(),
        format!("• Total records processed: {}", delta.original),
        format!("• Records after cleaning: {}", delta.cleaned),
        format!("• Records removed: {}", delta.removed),
        format!("• Improvement rate: {:.1}%", delta.improvement_rate_pct),
        String::new(),
    ])
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: &'a str,
    #[serde(flatten)]
    report: &'a QualityReport,
}

pub fn render_json(report: &QualityReport, generated_at: &str) -> Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        generated_at,
        report,
    })
    .context("Serializing quality report to JSON")
}
