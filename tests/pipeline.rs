mod common;

use std::collections::BTreeSet;
use std::fs;

use encoding_rs::UTF_8;
use proptest::prelude::*;
use rust_decimal::Decimal;

use common::TestWorkspace;
use menu_refine::{
    cli::PipelineArgs,
    config::{Settings, YearRange},
    error::InputError,
    model::{AnalysisRecord, Dish, average_price, decade_of},
    pipeline::{self, PipelineTables},
};

fn dec(value: &str) -> Decimal {
    value.parse().expect("decimal literal")
}

fn settings_for(workspace: &TestWorkspace) -> Settings {
    Settings {
        data_dir: workspace.path().to_path_buf(),
        ..Settings::default()
    }
}

fn load_tables(workspace: &TestWorkspace) -> PipelineTables {
    PipelineTables::load(&settings_for(workspace), None, UTF_8).expect("load tables")
}

fn joined_records(workspace: &TestWorkspace) -> Vec<AnalysisRecord> {
    let tables = load_tables(workspace);
    let top = pipeline::select_top_dishes(&tables.dishes, 5);
    pipeline::build_analysis_records(&tables, &top, YearRange::default()).0
}

fn dish(id: i64, times_appeared: i64) -> Dish {
    Dish {
        id,
        name: format!("dish {id}"),
        times_appeared,
        menus_appeared: times_appeared,
    }
}

#[test]
fn top_dishes_keep_table_order_for_equal_counts() {
    let workspace = TestWorkspace::with_menu_tables();
    let tables = load_tables(&workspace);
    let top = pipeline::select_top_dishes(&tables.dishes, 5);
    let ids = top.iter().map(|d| d.id).collect::<Vec<_>>();
    // Olives (5) and Radishes (6) both appear 100 times; Olives comes first.
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn top_dishes_return_whatever_qualifies() {
    let dishes = vec![dish(1, 4), dish(2, 0), dish(3, -2), dish(4, 9)];
    let top = pipeline::select_top_dishes(&dishes, 5);
    assert_eq!(top.iter().map(|d| d.id).collect::<Vec<_>>(), vec![4, 1]);
}

#[test]
fn join_keeps_only_dated_matched_rows_for_top_dishes() {
    let workspace = TestWorkspace::with_menu_tables();
    let tables = load_tables(&workspace);
    let top = pipeline::select_top_dishes(&tables.dishes, 5);
    let (records, stats) =
        pipeline::build_analysis_records(&tables, &top, YearRange::default());

    assert_eq!(records.len(), 6);
    assert_eq!(stats.emitted, 6);
    assert_eq!(stats.missing_page, 1);
    assert_eq!(stats.missing_menu, 1);
    assert_eq!(stats.missing_date, 1);
    assert_eq!(stats.outside_year_range, 3);

    let order = records
        .iter()
        .map(|r| (r.dish_id, r.date.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        order,
        vec![
            (1, "1875-03-01"),
            (1, "1910-01-01"),
            (2, "1901-06-15"),
            (3, "1910-01-01"),
            (4, "1901-06-15"),
            (5, "1875-03-01"),
        ]
    );

    let distinct = records.iter().map(|r| r.dish_id).collect::<BTreeSet<_>>();
    let expected = top.iter().map(|d| d.id).collect::<BTreeSet<_>>();
    assert_eq!(distinct, expected);
}

#[test]
fn consomme_range_and_1875_menu_derive_expected_fields() {
    let workspace = TestWorkspace::with_menu_tables();
    let records = joined_records(&workspace);
    let first = &records[0];
    assert_eq!(first.dish_name, "Coffee");
    assert_eq!(first.price, Some(dec("2.00")));
    assert_eq!(first.high_price, Some(dec("4.00")));
    assert_eq!(first.avg_price, Some(dec("3.00")));
    assert_eq!(first.year, 1875);
    assert_eq!(first.decade, 1870);
    assert_eq!(first.location, "Hotel A");
    assert_eq!(first.venue, "COMMERCIAL");
}

#[test]
fn derived_fields_hold_for_every_record() {
    let workspace = TestWorkspace::with_menu_tables();
    for record in joined_records(&workspace) {
        let expected = match (record.price, record.high_price) {
            (Some(p), Some(h)) if h > Decimal::ZERO => Some((p + h) / Decimal::TWO),
            (p, _) => p,
        };
        assert_eq!(record.avg_price, expected, "{record:?}");
        assert_eq!(record.decade, (record.year / 10) * 10);
        assert!((1850..=2020).contains(&record.year));
    }
}

#[test]
fn zero_high_price_falls_back_to_price() {
    let workspace = TestWorkspace::with_menu_tables();
    let records = joined_records(&workspace);
    let celery = records
        .iter()
        .find(|r| r.dish_name == "Celery")
        .expect("celery row");
    assert_eq!(celery.high_price, Some(Decimal::ZERO));
    assert_eq!(celery.avg_price, Some(dec("0.10")));

    let ice_cream = records
        .iter()
        .find(|r| r.dish_name == "Ice cream")
        .expect("ice cream row");
    assert_eq!(ice_cream.avg_price, None);
}

#[test]
fn narrower_year_range_filters_rows() {
    let workspace = TestWorkspace::with_menu_tables();
    let tables = load_tables(&workspace);
    let top = pipeline::select_top_dishes(&tables.dishes, 5);
    let (records, _) = pipeline::build_analysis_records(
        &tables,
        &top,
        YearRange {
            start: 1900,
            end: 1909,
        },
    );
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.decade == 1900));
}

#[test]
fn analysis_file_round_trips_row_for_row() {
    let workspace = TestWorkspace::with_menu_tables();
    let records = joined_records(&workspace);
    let path = workspace.path().join("out").join("final_cleaned_dataset.csv");
    pipeline::write_analysis_records(&path, &records).expect("write records");

    let header = fs::read_to_string(&path)
        .expect("read output")
        .lines()
        .next()
        .map(str::to_string)
        .expect("header line");
    assert_eq!(
        header,
        "\"dish_id\",\"dish_name\",\"price\",\"high_price\",\"avg_price\",\"date\",\"year\",\"decade\",\"location\",\"venue\""
    );

    let reread = pipeline::read_analysis_records(&path, None, UTF_8).expect("read records");
    assert_eq!(reread, records);
}

#[test]
fn execute_writes_dataset_under_data_dir() {
    let workspace = TestWorkspace::with_menu_tables();
    let args = PipelineArgs {
        config: None,
        data_dir: Some(workspace.path().to_path_buf()),
        output: None,
        top_dishes: None,
        delimiter: None,
        input_encoding: None,
    };
    pipeline::execute(&args).expect("pipeline run");
    let written = workspace.path().join("final_cleaned_dataset.csv");
    let records = pipeline::read_analysis_records(&written, None, UTF_8).expect("read output");
    assert_eq!(records.len(), 6);
}

#[test]
fn missing_table_is_reported_before_output() {
    let workspace = TestWorkspace::with_menu_tables();
    fs::remove_file(workspace.path().join("MenuPage.csv")).expect("remove page table");
    let err = PipelineTables::load(&settings_for(&workspace), None, UTF_8).unwrap_err();
    match err.downcast_ref::<InputError>() {
        Some(InputError::MissingInput { table, path }) => {
            assert_eq!(table, "MenuPage");
            assert!(path.ends_with("MenuPage.csv"));
        }
        other => panic!("expected MissingInput, got {other:?}"),
    }
    assert!(!workspace.path().join("final_cleaned_dataset.csv").exists());
}

proptest! {
    #[test]
    fn average_price_is_midpoint_price_or_null(
        price in proptest::option::of(0i64..100_000),
        high in proptest::option::of(-100i64..100_000),
    ) {
        let price = price.map(|cents| Decimal::new(cents, 2));
        let high = high.map(|cents| Decimal::new(cents, 2));
        let expected = match (price, high) {
            (Some(p), Some(h)) if h > Decimal::ZERO => Some((p + h) / Decimal::TWO),
            (p, _) => p,
        };
        prop_assert_eq!(average_price(price, high), expected);
    }

    #[test]
    fn decade_is_year_floored_to_ten(year in 1850i32..=2020) {
        let decade = decade_of(year);
        prop_assert_eq!(decade % 10, 0);
        prop_assert!(decade <= year && year - decade < 10);
    }
}
