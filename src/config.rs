//! Run settings: built-in defaults, optionally overridden by a YAML file, then
//! by command-line flags.
//!
//! ```yaml
//! data_dir: data
//! tables:
//!   menu: Menu.csv
//!   dish_cleaned: Dish-cleaned.csv
//! top_dishes: 5
//! year_range: { start: 1850, end: 2020 }
//! ```

use std::{
    fs::File,
    io::BufReader,
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::cli::{AssessArgs, PipelineArgs};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableFiles {
    pub menu: PathBuf,
    pub menu_page: PathBuf,
    pub dish_original: PathBuf,
    pub dish_cleaned: PathBuf,
    pub menu_item_original: PathBuf,
    pub menu_item_cleaned: PathBuf,
}

impl Default for TableFiles {
    fn default() -> Self {
        Self {
            menu: PathBuf::from("Menu.csv"),
            menu_page: PathBuf::from("MenuPage.csv"),
            dish_original: PathBuf::from("Dish.csv"),
            dish_cleaned: PathBuf::from("Dish-cleaned.csv"),
            menu_item_original: PathBuf::from("MenuItem.csv"),
            menu_item_cleaned: PathBuf::from("MenuItem-cleaned.csv"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn contains(&self, year: i32) -> bool {
        self.as_range().contains(&year)
    }

    pub fn as_range(&self) -> RangeInclusive<i32> {
        self.start..=self.end
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            start: 1850,
            end: 2020,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub tables: TableFiles,
    pub analysis_output: PathBuf,
    pub report_output: PathBuf,
    pub top_dishes: usize,
    pub rankings_per_decade: usize,
    pub year_range: YearRange,
    pub diff_sample_size: usize,
    pub max_sample_changes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            tables: TableFiles::default(),
            analysis_output: PathBuf::from("final_cleaned_dataset.csv"),
            report_output: PathBuf::from("data_quality_analysis_report.txt"),
            top_dishes: 5,
            rankings_per_decade: 5,
            year_range: YearRange::default(),
            diff_sample_size: 50,
            max_sample_changes: 6,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening settings file {path:?}"))?;
        let settings: Settings = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing settings YAML {path:?}"))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.top_dishes > 0, "top_dishes must be at least 1");
        ensure!(
            self.rankings_per_decade > 0,
            "rankings_per_decade must be at least 1"
        );
        ensure!(
            self.year_range.start <= self.year_range.end,
            "year_range start {} is after end {}",
            self.year_range.start,
            self.year_range.end
        );
        Ok(())
    }

    pub fn for_pipeline(args: &PipelineArgs) -> Result<Self> {
        let mut settings = Self::base(args.config.as_deref())?;
        if let Some(dir) = &args.data_dir {
            settings.data_dir = dir.clone();
        }
        if let Some(output) = &args.output {
            settings.analysis_output = output.clone();
        }
        if let Some(top) = args.top_dishes {
            settings.top_dishes = top;
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn for_assess(args: &AssessArgs) -> Result<Self> {
        let mut settings = Self::base(args.config.as_deref())?;
        if let Some(dir) = &args.data_dir {
            settings.data_dir = dir.clone();
        }
        if let Some(analysis) = &args.analysis {
            settings.analysis_output = analysis.clone();
        }
        if let Some(report) = &args.report {
            settings.report_output = report.clone();
        }
        settings.validate()?;
        Ok(settings)
    }

    fn base(config: Option<&Path>) -> Result<Self> {
        match config {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Resolves a configured file against `data_dir` unless it is absolute.
    pub fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_dir.join(file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "data_dir: raw\ntables:\n  menu: menus.tsv\nyear_range: { start: 1880, end: 1950 }\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("raw"));
        assert_eq!(settings.tables.menu, PathBuf::from("menus.tsv"));
        assert_eq!(settings.tables.dish_cleaned, PathBuf::from("Dish-cleaned.csv"));
        assert_eq!(settings.top_dishes, 5);
        assert!(settings.year_range.contains(1880));
        assert!(!settings.year_range.contains(1951));
    }

    #[test]
    fn inverted_year_range_is_rejected() {
        let settings = Settings {
            year_range: YearRange {
                start: 2000,
                end: 1900,
            },
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn relative_files_resolve_under_data_dir() {
        let settings = Settings {
            data_dir: PathBuf::from("nypl"),
            ..Settings::default()
        };
        assert_eq!(
            settings.resolve(&settings.tables.menu),
            PathBuf::from("nypl").join("Menu.csv")
        );
    }
}
