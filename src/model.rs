//! Typed rows for the menu tables and the derived analysis records.
//!
//! Loaders read columns by header name from a [`RawTable`]. Every parse
//! failure is reported as [`InputError::InvalidValue`] with the 1-based file
//! row (header included) so the offending cell can be found in a spreadsheet.

use anyhow::Result;
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    data::{is_null, parse_count, parse_decimal, parse_id},
    dataset::RawTable,
    error::InputError,
};

/// Column order of the persisted analysis table.
pub const ANALYSIS_COLUMNS: [&str; 10] = [
    "dish_id",
    "dish_name",
    "price",
    "high_price",
    "avg_price",
    "date",
    "year",
    "decade",
    "location",
    "venue",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dish {
    pub id: i64,
    pub name: String,
    pub times_appeared: i64,
    pub menus_appeared: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub menu_page_id: Option<i64>,
    pub dish_id: Option<i64>,
    pub price: Option<Decimal>,
    pub high_price: Option<Decimal>,
}

/// Which price columns of a menu item row hold a value.
///
/// Presence is judged on the cell text, so a value that does not parse as a
/// price still counts as present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePresence {
    pub price: bool,
    pub high_price: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuPage {
    pub id: i64,
    pub menu_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub id: i64,
    pub date: Option<String>,
    pub location: String,
    pub venue: String,
}

/// One joined, filtered, and derived row of the analysis table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub dish_id: i64,
    pub dish_name: String,
    pub price: Option<Decimal>,
    pub high_price: Option<Decimal>,
    pub avg_price: Option<Decimal>,
    pub date: String,
    pub year: i32,
    pub decade: i32,
    pub location: String,
    pub venue: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecadeRanking {
    pub decade: i32,
    pub rank: usize,
    pub dish_name: String,
    pub frequency: usize,
    pub median_price: Option<Decimal>,
}

/// Midpoint of a price range when a positive upper bound is present,
/// otherwise the listed price itself.
pub fn average_price(price: Option<Decimal>, high_price: Option<Decimal>) -> Option<Decimal> {
    match (price, high_price) {
        (Some(low), Some(high)) if high > Decimal::ZERO => midpoint(low, high),
        (price, _) => price,
    }
}

/// `(a + b) / 2`, or `None` when the result is outside the `Decimal` range.
pub fn midpoint(a: Decimal, b: Decimal) -> Option<Decimal> {
    a.checked_add(b)
        .map(|sum| sum / Decimal::TWO)
        .or_else(|| (a / Decimal::TWO).checked_add(b / Decimal::TWO))
}

pub fn decade_of(year: i32) -> i32 {
    year.div_euclid(10) * 10
}

fn invalid(table: &RawTable, row: usize, column: &str, value: &str) -> InputError {
    InputError::InvalidValue {
        table: table.name.clone(),
        row: row + 2,
        column: column.to_string(),
        value: value.to_string(),
    }
}

struct Cells<'a> {
    table: &'a RawTable,
    row: usize,
}

impl<'a> Cells<'a> {
    fn raw(&self, col: (usize, &str)) -> &'a str {
        self.table.cell(self.row, col.0)
    }

    fn id(&self, col: (usize, &str)) -> Result<i64, InputError> {
        let raw = self.raw(col);
        parse_id(raw).map_err(|_| invalid(self.table, self.row, col.1, raw))
    }

    fn optional_id(&self, col: (usize, &str)) -> Result<Option<i64>, InputError> {
        let raw = self.raw(col);
        if is_null(raw) {
            return Ok(None);
        }
        self.id(col).map(Some)
    }

    fn year(&self, col: (usize, &str)) -> Result<i32, InputError> {
        let raw = self.raw(col);
        let value = self.id(col)?;
        i32::try_from(value).map_err(|_| invalid(self.table, self.row, col.1, raw))
    }

    fn count(&self, col: (usize, &str)) -> Result<i64, InputError> {
        let raw = self.raw(col);
        parse_count(raw)
            .map(|value| value.unwrap_or(0))
            .map_err(|_| invalid(self.table, self.row, col.1, raw))
    }

    fn decimal(&self, col: (usize, &str)) -> Result<Option<Decimal>, InputError> {
        let raw = self.raw(col);
        parse_decimal(raw).map_err(|_| invalid(self.table, self.row, col.1, raw))
    }

    /// Like [`Cells::count`], but an unparsable cell reads as 0 with a warning.
    fn count_or_zero(&self, col: (usize, &str)) -> i64 {
        self.count(col).unwrap_or_else(|err| {
            warn!("{err}; counting it as 0");
            0
        })
    }

    /// Cell holds something other than a null token, parsable or not.
    fn present(&self, col: (usize, &str)) -> bool {
        let raw = self.raw(col);
        if is_null(raw) {
            return false;
        }
        if parse_decimal(raw).is_err() {
            warn!(
                "{}; keeping it as a present value",
                invalid(self.table, self.row, col.1, raw)
            );
        }
        true
    }

    fn text(&self, col: (usize, &str)) -> String {
        let raw = self.raw(col);
        if is_null(raw) {
            String::new()
        } else {
            raw.to_string()
        }
    }

    fn optional_text(&self, col: (usize, &str)) -> Option<String> {
        let raw = self.raw(col);
        (!is_null(raw)).then(|| raw.trim().to_string())
    }
}

fn columns<'c, const N: usize>(
    table: &RawTable,
    names: [&'c str; N],
) -> Result<[(usize, &'c str); N], InputError> {
    let mut resolved = [(0usize, ""); N];
    for (slot, name) in resolved.iter_mut().zip(names) {
        *slot = (table.require_column(name)?, name);
    }
    Ok(resolved)
}

fn load_rows<T>(
    table: &RawTable,
    mut parse: impl FnMut(&Cells<'_>) -> Result<T, InputError>,
) -> Result<Vec<T>> {
    let mut out = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        out.push(parse(&Cells { table, row })?);
    }
    Ok(out)
}

impl Dish {
    pub fn load_all(table: &RawTable) -> Result<Vec<Dish>> {
        let [id, name, times, menus] =
            columns(table, ["id", "name", "times_appeared", "menus_appeared"])?;
        load_rows(table, |cells| {
            Ok(Dish {
                id: cells.id(id)?,
                name: cells.raw(name).to_string(),
                times_appeared: cells.count(times)?,
                menus_appeared: cells.count(menus)?,
            })
        })
    }

    /// Loader for uncleaned dish exports: ids must still parse, but bad
    /// appearance counts are logged and read as 0.
    pub fn load_lenient(table: &RawTable) -> Result<Vec<Dish>> {
        let [id, name, times, menus] =
            columns(table, ["id", "name", "times_appeared", "menus_appeared"])?;
        load_rows(table, |cells| {
            Ok(Dish {
                id: cells.id(id)?,
                name: cells.raw(name).to_string(),
                times_appeared: cells.count_or_zero(times),
                menus_appeared: cells.count_or_zero(menus),
            })
        })
    }
}

impl PricePresence {
    /// Reads price presence straight from the cell text of a menu item table.
    pub fn scan(table: &RawTable) -> Result<Vec<PricePresence>> {
        let [price, high_price] = columns(table, ["price", "high_price"])?;
        load_rows(table, |cells| {
            Ok(PricePresence {
                price: cells.present(price),
                high_price: cells.present(high_price),
            })
        })
    }
}

impl From<&MenuItem> for PricePresence {
    fn from(item: &MenuItem) -> Self {
        Self {
            price: item.price.is_some(),
            high_price: item.high_price.is_some(),
        }
    }
}

impl MenuItem {
    pub fn load_all(table: &RawTable) -> Result<Vec<MenuItem>> {
        let [id, page, dish, price, high] = columns(
            table,
            ["id", "menu_page_id", "dish_id", "price", "high_price"],
        )?;
        load_rows(table, |cells| {
            Ok(MenuItem {
                id: cells.id(id)?,
                menu_page_id: cells.optional_id(page)?,
                dish_id: cells.optional_id(dish)?,
                price: cells.decimal(price)?,
                high_price: cells.decimal(high)?,
            })
        })
    }
}

impl MenuPage {
    pub fn load_all(table: &RawTable) -> Result<Vec<MenuPage>> {
        let [id, menu] = columns(table, ["id", "menu_id"])?;
        load_rows(table, |cells| {
            Ok(MenuPage {
                id: cells.id(id)?,
                menu_id: cells.optional_id(menu)?,
            })
        })
    }
}

impl Menu {
    pub fn load_all(table: &RawTable) -> Result<Vec<Menu>> {
        let [id, date, location, venue] = columns(table, ["id", "date", "location", "venue"])?;
        load_rows(table, |cells| {
            Ok(Menu {
                id: cells.id(id)?,
                date: cells.optional_text(date),
                location: cells.text(location),
                venue: cells.text(venue),
            })
        })
    }
}

impl AnalysisRecord {
    pub fn load_all(table: &RawTable) -> Result<Vec<AnalysisRecord>> {
        let [
            dish_id,
            dish_name,
            price,
            high_price,
            avg_price,
            date,
            year,
            decade,
            location,
            venue,
        ] = columns(table, ANALYSIS_COLUMNS)?;
        load_rows(table, |cells| {
            Ok(AnalysisRecord {
                dish_id: cells.id(dish_id)?,
                dish_name: cells.raw(dish_name).to_string(),
                price: cells.decimal(price)?,
                high_price: cells.decimal(high_price)?,
                avg_price: cells.decimal(avg_price)?,
                date: cells.raw(date).to_string(),
                year: cells.year(year)?,
                decade: cells.year(decade)?,
                location: cells.raw(location).to_string(),
                venue: cells.raw(venue).to_string(),
            })
        })
    }

    pub fn to_record(&self) -> Vec<String> {
        fn opt(value: &Option<Decimal>) -> String {
            value.map(|d| d.to_string()).unwrap_or_default()
        }
        vec![
            self.dish_id.to_string(),
            self.dish_name.clone(),
            opt(&self.price),
            opt(&self.high_price),
            opt(&self.avg_price),
            self.date.clone(),
            self.year.to_string(),
            self.decade.to_string(),
            self.location.clone(),
            self.venue.clone(),
        ]
    }
}
