//! Quality comparator for the two cleaning stages.
//!
//! [`assess`] is a pure function from the loaded tables to an immutable
//! [`QualityReport`]; rendering to the console, the text report, or JSON
//! happens afterwards and never feeds back into the computed values.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fmt,
    fs,
    path::PathBuf,
};

use anyhow::{Context, Result};
use chrono::Local;
use encoding_rs::Encoding;
use itertools::Itertools;
use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    cli::{AssessArgs, ReportFormat},
    config::Settings,
    data::parse_calendar_date,
    dataset::RawTable,
    io_utils,
    model::{AnalysisRecord, Dish, MenuItem, PricePresence},
};

mod render;

pub use render::{render_console, render_json, render_text};

const PUNCTUATION: &str = ".,;:!?()[]{}\"'-";
const NAME_PREVIEW_SIZE: usize = 5;
const TOP_DISH_SHARES: usize = 5;
const PRICE_EXAMPLES: usize = 3;
const CONSOLE_DECADES: usize = 5;

/// Everything the comparator reads, already parsed.
///
/// The original exports are read leniently: only their ids must parse, and
/// menu items are reduced to which price cells are filled in.
#[derive(Debug, Clone, Default)]
pub struct QualityInputs {
    pub dish_original: Vec<Dish>,
    pub dish_cleaned: Vec<Dish>,
    pub menu_item_original: Vec<PricePresence>,
    pub menu_item_cleaned: Vec<PricePresence>,
    pub analysis: Vec<AnalysisRecord>,
}

impl QualityInputs {
    /// Opens every input before parsing any of them, so a missing file aborts
    /// the run before anything is computed or written.
    pub fn load(
        settings: &Settings,
        delimiter: Option<u8>,
        encoding: &'static Encoding,
    ) -> Result<Self> {
        let files = &settings.tables;
        let load = |name: &str, file: &std::path::Path| -> Result<RawTable> {
            let path = settings.resolve(file);
            let delimiter = io_utils::resolve_input_delimiter(&path, delimiter);
            RawTable::load(name, &path, delimiter, encoding)
        };
        let dish_original = load("Dish", &files.dish_original)?;
        let menu_item_original = load("MenuItem", &files.menu_item_original)?;
        let dish_cleaned = load("Dish-cleaned", &files.dish_cleaned)?;
        let menu_item_cleaned = load("MenuItem-cleaned", &files.menu_item_cleaned)?;
        let analysis = load("final_cleaned_dataset", &settings.analysis_output)?;

        Ok(Self {
            dish_original: Dish::load_lenient(&dish_original)
                .with_context(|| format!("Parsing dishes from {:?}", dish_original.path))?,
            dish_cleaned: Dish::load_all(&dish_cleaned)
                .with_context(|| format!("Parsing dishes from {:?}", dish_cleaned.path))?,
            menu_item_original: PricePresence::scan(&menu_item_original).with_context(|| {
                format!("Scanning menu items from {:?}", menu_item_original.path)
            })?,
            menu_item_cleaned: MenuItem::load_all(&menu_item_cleaned)
                .with_context(|| format!("Parsing menu items from {:?}", menu_item_cleaned.path))?
                .iter()
                .map(PricePresence::from)
                .collect(),
            analysis: AnalysisRecord::load_all(&analysis)
                .with_context(|| format!("Parsing analysis records from {:?}", analysis.path))?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssessOptions {
    pub diff_sample_size: usize,
    pub max_sample_changes: usize,
}

impl Default for AssessOptions {
    fn default() -> Self {
        Self {
            diff_sample_size: 50,
            max_sample_changes: 6,
        }
    }
}

impl From<&Settings> for AssessOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            diff_sample_size: settings.diff_sample_size,
            max_sample_changes: settings.max_sample_changes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityGrade {
    #[serde(rename = "EXCELLENT")]
    Excellent,
    #[serde(rename = "GOOD")]
    Good,
    #[serde(rename = "ACCEPTABLE")]
    Acceptable,
    #[serde(rename = "NEEDS IMPROVEMENT")]
    NeedsImprovement,
}

impl QualityGrade {
    pub fn classify(score: f64) -> Self {
        if score >= 90.0 {
            QualityGrade::Excellent
        } else if score >= 80.0 {
            QualityGrade::Good
        } else if score >= 70.0 {
            QualityGrade::Acceptable
        } else {
            QualityGrade::NeedsImprovement
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QualityGrade::Excellent => "EXCELLENT",
            QualityGrade::Good => "GOOD",
            QualityGrade::Acceptable => "ACCEPTABLE",
            QualityGrade::NeedsImprovement => "NEEDS IMPROVEMENT",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDelta {
    pub original: usize,
    pub cleaned: usize,
    pub removed: i64,
    pub improvement_rate_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamePreview {
    pub dish_id: i64,
    pub original: String,
    pub cleaned: String,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameChange {
    pub dish_id: i64,
    pub original: String,
    pub cleaned: String,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullDelta {
    pub original_nulls: usize,
    pub cleaned_nulls: usize,
    pub improvement: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeReduction {
    pub input_records: usize,
    pub output_records: usize,
    pub reduction_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishShare {
    pub dish_name: String,
    pub records: usize,
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceExample {
    pub dish_name: String,
    pub price: Decimal,
    pub high_price: Decimal,
    pub avg_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceDerivation {
    pub ranges_averaged: usize,
    pub single_prices: usize,
    pub examples: Vec<PriceExample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecadeCount {
    pub decade: i32,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalProfile {
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub distinct_years: usize,
    pub distinct_decades: usize,
    pub decade_distribution: Vec<DecadeCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityChecks {
    pub total_records: usize,
    pub max_names_per_dish_id: usize,
    pub inconsistent_dish_ids: Vec<i64>,
    pub valid_dates: usize,
    pub date_validity_pct: f64,
    pub priced_records: usize,
    pub price_coverage_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecadeCoverage {
    pub decades_with_data: usize,
    pub min_records_per_decade: Option<usize>,
    pub max_records_per_decade: Option<usize>,
    pub decades_with_price_data: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub dish: TableDelta,
    pub menu_item: TableDelta,
    pub name_preview: Vec<NamePreview>,
    pub sample_changes: Vec<NameChange>,
    pub price_nulls: NullDelta,
    pub high_price_nulls: NullDelta,
    pub scope: ScopeReduction,
    pub top_dishes: Vec<DishShare>,
    pub price_derivation: PriceDerivation,
    pub temporal: TemporalProfile,
    pub integrity: IntegrityChecks,
    pub coverage: DecadeCoverage,
    pub stage1_improvement: i64,
    pub quality_score: f64,
    pub grade: QualityGrade,
}

pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Scores how illustrative a name correction is for the report.
///
/// Punctuation anywhere in either name scores 3, a case-only change 2, a
/// change in word count 2, and a change in length 1.
pub fn interest_score(original: &str, cleaned: &str) -> u32 {
    let mut score = 0;
    if original
        .chars()
        .chain(cleaned.chars())
        .any(|c| PUNCTUATION.contains(c))
    {
        score += 3;
    }
    if original != cleaned && original.to_lowercase() == cleaned.to_lowercase() {
        score += 2;
    }
    if original.split_whitespace().count() != cleaned.split_whitespace().count() {
        score += 2;
    }
    if original.chars().count() != cleaned.chars().count() {
        score += 1;
    }
    score
}

pub fn table_delta(original: usize, cleaned: usize) -> TableDelta {
    let removed = original as i64 - cleaned as i64;
    TableDelta {
        original,
        cleaned,
        removed,
        improvement_rate_pct: if original == 0 {
            0.0
        } else {
            removed as f64 / original as f64 * 100.0
        },
    }
}

pub fn null_delta(
    original: &[PricePresence],
    cleaned: &[PricePresence],
    present: impl Fn(&PricePresence) -> bool,
) -> NullDelta {
    let original_nulls = original.iter().filter(|item| !present(item)).count();
    let cleaned_nulls = cleaned.iter().filter(|item| !present(item)).count();
    NullDelta {
        original_nulls,
        cleaned_nulls,
        improvement: original_nulls as i64 - cleaned_nulls as i64,
    }
}

/// Ids present in both tables, ascending, with their first-occurrence names.
fn common_names<'a>(original: &'a [Dish], cleaned: &'a [Dish]) -> Vec<(i64, &'a str, &'a str)> {
    let first_names = |dishes: &'a [Dish]| {
        let mut names: HashMap<i64, &'a str> = HashMap::with_capacity(dishes.len());
        for dish in dishes {
            names.entry(dish.id).or_insert(dish.name.as_str());
        }
        names
    };
    let cleaned = first_names(cleaned);
    first_names(original)
        .into_iter()
        .filter_map(|(id, orig)| cleaned.get(&id).map(|clean| (id, orig, *clean)))
        .sorted_by_key(|(id, _, _)| *id)
        .collect()
}

pub fn name_preview(original: &[Dish], cleaned: &[Dish], limit: usize) -> Vec<NamePreview> {
    common_names(original, cleaned)
        .into_iter()
        .take(limit)
        .map(|(dish_id, orig, clean)| NamePreview {
            dish_id,
            original: orig.to_string(),
            cleaned: clean.to_string(),
            changed: orig != clean,
        })
        .collect()
}

/// Picks up to `max_changes` name corrections for the report.
///
/// The first `sample_size` common ids (ascending) are scored with
/// [`interest_score`] and ordered by score descending, then id descending. When
/// none of the sampled names changed, the first changed names across all
/// common ids are used instead.
pub fn sample_name_changes(
    original: &[Dish],
    cleaned: &[Dish],
    sample_size: usize,
    max_changes: usize,
) -> Vec<NameChange> {
    let common = common_names(original, cleaned);
    let to_change = |(dish_id, orig, clean): &(i64, &str, &str)| NameChange {
        dish_id: *dish_id,
        original: orig.to_string(),
        cleaned: clean.to_string(),
        score: interest_score(orig, clean),
    };

    let sampled = common
        .iter()
        .take(sample_size)
        .filter(|(_, orig, clean)| orig != clean)
        .map(to_change)
        .sorted_by(|a, b| b.score.cmp(&a.score).then(b.dish_id.cmp(&a.dish_id)))
        .take(max_changes)
        .collect::<Vec<_>>();
    if !sampled.is_empty() {
        return sampled;
    }
    common
        .iter()
        .filter(|(_, orig, clean)| orig != clean)
        .take(max_changes)
        .map(to_change)
        .collect()
}

fn top_dish_shares(records: &[AnalysisRecord], limit: usize) -> Vec<DishShare> {
    records
        .iter()
        .map(|r| r.dish_name.as_str())
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)))
        .take(limit)
        .map(|(name, count)| DishShare {
            dish_name: name.to_string(),
            records: count,
            share_pct: percent(count, records.len()),
        })
        .collect()
}

fn price_derivation(records: &[AnalysisRecord]) -> PriceDerivation {
    let ranges = records
        .iter()
        .filter_map(|r| match (r.price, r.high_price) {
            (Some(price), Some(high_price)) => Some((r, price, high_price)),
            _ => None,
        })
        .collect::<Vec<_>>();
    let single_prices = records
        .iter()
        .filter(|r| r.price.is_some() && r.high_price.is_none())
        .count();
    PriceDerivation {
        ranges_averaged: ranges.len(),
        single_prices,
        examples: ranges
            .iter()
            .take(PRICE_EXAMPLES)
            .map(|(r, price, high_price)| PriceExample {
                dish_name: r.dish_name.clone(),
                price: *price,
                high_price: *high_price,
                avg_price: r.avg_price,
            })
            .collect(),
    }
}

fn temporal_profile(records: &[AnalysisRecord]) -> TemporalProfile {
    let years = records.iter().map(|r| r.year).collect::<BTreeSet<_>>();
    let decade_distribution = records
        .iter()
        .map(|r| r.decade)
        .counts()
        .into_iter()
        .sorted()
        .map(|(decade, records)| DecadeCount { decade, records })
        .collect::<Vec<_>>();
    TemporalProfile {
        min_year: years.first().copied(),
        max_year: years.last().copied(),
        distinct_years: years.len(),
        distinct_decades: decade_distribution.len(),
        decade_distribution,
    }
}

fn integrity_checks(records: &[AnalysisRecord]) -> IntegrityChecks {
    let mut names: BTreeMap<i64, HashSet<&str>> = BTreeMap::new();
    for record in records {
        names
            .entry(record.dish_id)
            .or_default()
            .insert(record.dish_name.as_str());
    }
    let max_names_per_dish_id = names.values().map(HashSet::len).max().unwrap_or(0);
    let inconsistent_dish_ids = names
        .iter()
        .filter(|(_, set)| set.len() > 1)
        .map(|(id, _)| *id)
        .collect::<Vec<_>>();

    let valid_dates = records
        .iter()
        .filter(|r| parse_calendar_date(&r.date).is_some())
        .count();
    let priced_records = records.iter().filter(|r| r.avg_price.is_some()).count();
    IntegrityChecks {
        total_records: records.len(),
        max_names_per_dish_id,
        inconsistent_dish_ids,
        valid_dates,
        date_validity_pct: percent(valid_dates, records.len()),
        priced_records,
        price_coverage_pct: percent(priced_records, records.len()),
    }
}

fn decade_coverage(records: &[AnalysisRecord], temporal: &TemporalProfile) -> DecadeCoverage {
    let per_decade = temporal.decade_distribution.iter().map(|d| d.records);
    let decades_with_price_data = records
        .iter()
        .filter(|r| r.avg_price.is_some())
        .map(|r| r.decade)
        .collect::<HashSet<_>>()
        .len();
    DecadeCoverage {
        decades_with_data: temporal.decade_distribution.len(),
        min_records_per_decade: per_decade.clone().min(),
        max_records_per_decade: per_decade.max(),
        decades_with_price_data,
    }
}

pub fn assess(inputs: &QualityInputs, options: AssessOptions) -> QualityReport {
    let dish = table_delta(inputs.dish_original.len(), inputs.dish_cleaned.len());
    let menu_item = table_delta(
        inputs.menu_item_original.len(),
        inputs.menu_item_cleaned.len(),
    );
    let records = &inputs.analysis;
    let input_records = inputs.menu_item_cleaned.len();
    let scope = ScopeReduction {
        input_records,
        output_records: records.len(),
        reduction_pct: if input_records == 0 {
            0.0
        } else {
            (input_records as f64 - records.len() as f64) / input_records as f64 * 100.0
        },
    };
    let temporal = temporal_profile(records);
    let integrity = integrity_checks(records);
    let coverage = decade_coverage(records, &temporal);
    let quality_score = (integrity.date_validity_pct + integrity.price_coverage_pct) / 2.0;

    QualityReport {
        stage1_improvement: dish.removed + menu_item.removed,
        name_preview: name_preview(
            &inputs.dish_original,
            &inputs.dish_cleaned,
            NAME_PREVIEW_SIZE,
        ),
        sample_changes: sample_name_changes(
            &inputs.dish_original,
            &inputs.dish_cleaned,
            options.diff_sample_size,
            options.max_sample_changes,
        ),
        price_nulls: null_delta(
            &inputs.menu_item_original,
            &inputs.menu_item_cleaned,
            |item| item.price,
        ),
        high_price_nulls: null_delta(
            &inputs.menu_item_original,
            &inputs.menu_item_cleaned,
            |item| item.high_price,
        ),
        top_dishes: top_dish_shares(records, TOP_DISH_SHARES),
        price_derivation: price_derivation(records),
        dish,
        menu_item,
        scope,
        temporal,
        integrity,
        coverage,
        quality_score,
        grade: QualityGrade::classify(quality_score),
    }
}

fn report_path(settings: &Settings, args: &AssessArgs) -> PathBuf {
    let path = settings.resolve(&settings.report_output);
    if args.report.is_none() && args.format == ReportFormat::Json {
        path.with_extension("json")
    } else {
        path
    }
}

pub fn execute(args: &AssessArgs) -> Result<()> {
    let settings = Settings::for_assess(args)?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let inputs = QualityInputs::load(&settings, args.delimiter, encoding)?;
    info!(
        "Assessing {} original / {} cleaned dishes and {} analysis record(s)",
        inputs.dish_original.len(),
        inputs.dish_cleaned.len(),
        inputs.analysis.len()
    );

    let report = assess(&inputs, AssessOptions::from(&settings));
    if report.integrity.max_names_per_dish_id > 1 {
        warn!(
            "Dish ids with more than one name in the analysis dataset: {:?}",
            report.integrity.inconsistent_dish_ids
        );
    }

    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    print!("{}", render_console(&report, &generated_at));

    let rendered = match args.format {
        ReportFormat::Text => render_text(&report, &generated_at),
        ReportFormat::Json => render_json(&report, &generated_at)?,
    };
    let path = report_path(&settings, args);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Creating report directory {parent:?}"))?;
    }
    fs::write(&path, rendered).with_context(|| format!("Writing report to {path:?}"))?;
    println!("\nComprehensive report saved to: {}", path.display());
    info!(
        "Quality score {:.1}% ({}) written to {:?}",
        report.quality_score, report.grade, path
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interest_score_weights() {
        assert_eq!(interest_score("Consomme", "Consommé"), 0);
        assert_eq!(interest_score("CONSOMME", "Consomme"), 2);
        assert_eq!(interest_score("coffee", "Coffee"), 2);
        assert_eq!(interest_score("Tea,", "Tea"), 3 + 1);
        assert_eq!(interest_score("Ice  cream", "Ice cream"), 1);
        assert_eq!(interest_score("Icecream", "Ice cream"), 2 + 1);
        assert_eq!(interest_score("Potatoes (Boiled)", "potatoes (boiled)"), 3 + 2);
        assert_eq!(interest_score("abc", "abc"), 0);
    }

    #[test]
    fn grade_bands() {
        assert_eq!(QualityGrade::classify(90.0), QualityGrade::Excellent);
        assert_eq!(QualityGrade::classify(89.99), QualityGrade::Good);
        assert_eq!(QualityGrade::classify(80.0), QualityGrade::Good);
        assert_eq!(QualityGrade::classify(70.0), QualityGrade::Acceptable);
        assert_eq!(QualityGrade::classify(69.9), QualityGrade::NeedsImprovement);
        assert_eq!(
            QualityGrade::NeedsImprovement.to_string(),
            "NEEDS IMPROVEMENT"
        );
    }

    #[test]
    fn percent_of_empty_is_zero() {
        assert_eq!(percent(3, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }

    #[test]
    fn empty_inputs_produce_sentinels() {
        let report = assess(&QualityInputs::default(), AssessOptions::default());
        assert_eq!(report.scope.reduction_pct, 0.0);
        assert_eq!(report.coverage.min_records_per_decade, None);
        assert_eq!(report.quality_score, 0.0);
        assert_eq!(report.grade, QualityGrade::NeedsImprovement);
        assert!(render_text(&report, "now").contains("Records per decade: 0 (min) to 0 (max)"));
        assert!(render_console(&report, "now").contains("no data"));
    }
}
