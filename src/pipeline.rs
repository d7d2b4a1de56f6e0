//! Join-filter-aggregate pipeline.
//!
//! Cleaned menu items are hash-joined to their page, menu, and dish rows,
//! restricted to the most frequently appearing dishes and to menus dated
//! inside the configured year range, then written out as the analysis
//! dataset. The ranking pass in [`crate::ranking`] runs over the same
//! records.

use std::{
    cmp::Reverse,
    collections::{HashMap, HashSet},
    path::Path,
};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{debug, info, warn};

use crate::{
    cli::PipelineArgs,
    config::{Settings, YearRange},
    data::parse_year,
    dataset::RawTable,
    io_utils,
    model::{ANALYSIS_COLUMNS, AnalysisRecord, Dish, Menu, MenuItem, MenuPage, average_price, decade_of},
    ranking, table,
};

/// The four reference tables the join reads.
#[derive(Debug, Clone, Default)]
pub struct PipelineTables {
    pub menus: Vec<Menu>,
    pub pages: Vec<MenuPage>,
    pub items: Vec<MenuItem>,
    pub dishes: Vec<Dish>,
}

impl PipelineTables {
    pub fn load(settings: &Settings, delimiter: Option<u8>, encoding: &'static Encoding) -> Result<Self> {
        let files = &settings.tables;
        let load = |name: &str, file: &Path| -> Result<RawTable> {
            let path = settings.resolve(file);
            let delimiter = io_utils::resolve_input_delimiter(&path, delimiter);
            RawTable::load(name, &path, delimiter, encoding)
        };
        let menu_raw = load("Menu", &files.menu)?;
        let page_raw = load("MenuPage", &files.menu_page)?;
        let item_raw = load("MenuItem-cleaned", &files.menu_item_cleaned)?;
        let dish_raw = load("Dish-cleaned", &files.dish_cleaned)?;

        Ok(Self {
            menus: Menu::load_all(&menu_raw)
                .with_context(|| format!("Parsing menus from {:?}", menu_raw.path))?,
            pages: MenuPage::load_all(&page_raw)
                .with_context(|| format!("Parsing menu pages from {:?}", page_raw.path))?,
            items: MenuItem::load_all(&item_raw)
                .with_context(|| format!("Parsing menu items from {:?}", item_raw.path))?,
            dishes: Dish::load_all(&dish_raw)
                .with_context(|| format!("Parsing dishes from {:?}", dish_raw.path))?,
        })
    }
}

/// Counters describing why menu items did not survive the join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub candidate_items: usize,
    pub missing_page: usize,
    pub missing_menu: usize,
    pub missing_date: usize,
    pub outside_year_range: usize,
    pub missing_dish: usize,
    pub emitted: usize,
}

/// Dishes with `times_appeared > 0`, most frequent first, truncated to `limit`.
///
/// The sort is stable, so equal counts keep their table order. Fewer than
/// `limit` qualifying dishes yields the shorter list.
pub fn select_top_dishes(dishes: &[Dish], limit: usize) -> Vec<Dish> {
    let mut qualifying = dishes
        .iter()
        .filter(|dish| dish.times_appeared > 0)
        .cloned()
        .collect::<Vec<_>>();
    qualifying.sort_by_key(|dish| Reverse(dish.times_appeared));
    qualifying.truncate(limit);
    if qualifying.len() < limit {
        warn!(
            "Only {} dish(es) have times_appeared > 0; expected {}",
            qualifying.len(),
            limit
        );
    }
    qualifying
}

fn index_by<T, K>(rows: &[T], key: impl Fn(&T) -> K) -> HashMap<K, Vec<&T>>
where
    K: std::hash::Hash + Eq,
{
    let mut map: HashMap<K, Vec<&T>> = HashMap::with_capacity(rows.len());
    for row in rows {
        map.entry(key(row)).or_default().push(row);
    }
    map
}

/// Inner-joins menu items to pages, menus, and dishes for the selected dishes.
///
/// Output is ordered by dish `times_appeared` descending, then by the menu
/// date text ascending; remaining ties keep menu item order.
pub fn build_analysis_records(
    tables: &PipelineTables,
    top_dishes: &[Dish],
    years: YearRange,
) -> (Vec<AnalysisRecord>, JoinStats) {
    let selected: HashSet<i64> = top_dishes.iter().map(|dish| dish.id).collect();
    let pages = index_by(&tables.pages, |page| page.id);
    let menus = index_by(&tables.menus, |menu| menu.id);
    let dishes = index_by(&tables.dishes, |dish| dish.id);

    let mut stats = JoinStats::default();
    let mut joined: Vec<(i64, AnalysisRecord)> = Vec::new();

    for item in &tables.items {
        let Some(dish_id) = item.dish_id.filter(|id| selected.contains(id)) else {
            continue;
        };
        stats.candidate_items += 1;

        let Some(page_rows) = item.menu_page_id.and_then(|id| pages.get(&id)) else {
            stats.missing_page += 1;
            continue;
        };
        let Some(dish_rows) = dishes.get(&dish_id) else {
            stats.missing_dish += 1;
            continue;
        };
        let avg_price = average_price(item.price, item.high_price);

        for page in page_rows {
            let Some(menu_rows) = page.menu_id.and_then(|id| menus.get(&id)) else {
                stats.missing_menu += 1;
                continue;
            };
            for menu in menu_rows {
                let Some(date) = menu.date.as_deref() else {
                    stats.missing_date += 1;
                    continue;
                };
                let Some(year) = parse_year(date).filter(|year| years.contains(*year)) else {
                    stats.outside_year_range += 1;
                    continue;
                };
                for dish in dish_rows {
                    joined.push((
                        dish.times_appeared,
                        AnalysisRecord {
                            dish_id: dish.id,
                            dish_name: dish.name.clone(),
                            price: item.price,
                            high_price: item.high_price,
                            avg_price,
                            date: date.to_string(),
                            year,
                            decade: decade_of(year),
                            location: menu.location.clone(),
                            venue: menu.venue.clone(),
                        },
                    ));
                }
            }
        }
    }

    joined.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.date.cmp(&b.1.date)));
    stats.emitted = joined.len();
    debug!("Join statistics: {:?}", stats);
    (joined.into_iter().map(|(_, record)| record).collect(), stats)
}

pub fn write_analysis_records(path: &Path, records: &[AnalysisRecord]) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(path, None);
    let mut writer = io_utils::open_csv_writer(path, delimiter)?;
    writer
        .write_record(ANALYSIS_COLUMNS)
        .context("Writing analysis headers")?;
    for (idx, record) in records.iter().enumerate() {
        writer
            .write_record(record.to_record())
            .with_context(|| format!("Writing analysis row {}", idx + 2))?;
    }
    writer.flush().context("Flushing analysis dataset")?;
    Ok(())
}

pub fn read_analysis_records(
    path: &Path,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<Vec<AnalysisRecord>> {
    let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
    let raw = RawTable::load("final_cleaned_dataset", path, delimiter, encoding)?;
    AnalysisRecord::load_all(&raw).with_context(|| format!("Parsing analysis records from {path:?}"))
}

pub fn execute(args: &PipelineArgs) -> Result<()> {
    let settings = Settings::for_pipeline(args)?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;

    println!("What's on The Menu? Dish Analysis");
    println!("{}", "=".repeat(55));

    let tables = PipelineTables::load(&settings, args.delimiter, encoding)?;
    info!(
        "Loaded {} menus, {} menu pages, {} menu items, {} dishes",
        tables.menus.len(),
        tables.pages.len(),
        tables.items.len(),
        tables.dishes.len()
    );
    println!(
        "Loaded {} menus, {} menu items, {} dishes",
        tables.menus.len(),
        tables.items.len(),
        tables.dishes.len()
    );

    let top = select_top_dishes(&tables.dishes, settings.top_dishes);
    println!("Top {} dishes:", top.len());
    let top_rows = top
        .iter()
        .enumerate()
        .map(|(idx, dish)| {
            vec![
                format!("{}.", idx + 1),
                dish.name.clone(),
                dish.times_appeared.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    print!(
        "{}",
        table::render_table(
            &["#", "dish", "times_appeared"],
            &top_rows,
            &[table::Align::Right, table::Align::Left, table::Align::Right],
            "   ",
        )
    );

    let (records, stats) = build_analysis_records(&tables, &top, settings.year_range);
    let output = settings.resolve(&settings.analysis_output);
    write_analysis_records(&output, &records)?;
    info!(
        "Analysis dataset with {} row(s) written to {:?} ({} candidate item(s) considered)",
        records.len(),
        output,
        stats.candidate_items
    );
    println!("Final cleaned dataset saved to: {}", output.display());

    let priced = records.iter().filter(|r| r.avg_price.is_some()).count();
    println!();
    println!("Dataset summary:");
    println!("Total records: {}", records.len());
    match (
        records.iter().map(|r| r.year).min(),
        records.iter().map(|r| r.year).max(),
    ) {
        (Some(min), Some(max)) => println!("Date range: {min}-{max}"),
        _ => println!("Date range: no data"),
    }
    println!("Records with prices: {priced}");

    let rankings = ranking::rank_decades(&records, settings.rankings_per_decade);
    println!();
    print!("{}", ranking::render_rankings(&records, &rankings));
    info!(
        "Ranked dishes across {} decade(s)",
        ranking::decade_totals(&records).len()
    );
    Ok(())
}
