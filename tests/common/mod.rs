#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const DISH_CLEANED: &str = "\
id,name,description,menus_appeared,times_appeared,lowest_price,highest_price
1,Coffee,,280,300,0.0,3.0
2,Tea,,240,250,0.0,1.0
3,Ice cream,,190,200,0.0,1.0
4,Celery,,140,150,0.0,0.5
5,Olives,,90,100,0.0,0.7
6,Radishes,,95,100,0.0,0.3
7,Never served,,0,0,,
";

pub const DISH_ORIGINAL: &str = "\
id,name,description,menus_appeared,times_appeared,lowest_price,highest_price
1,coffee,,280,300,0.0,3.0
2,\"Tea,\",,240,250,0.0,1.0
3,Ice  cream,,190,200,0.0,1.0
4,Celery,,140,150,0.0,0.5
5,Olives,,90,100,0.0,0.7
6,Radishes,,95,100,0.0,0.3
7,Never served,,0,0,,
8,Duplicate coffee,,1,1,,
";

pub const MENU: &str = "\
id,name,venue,date,location,status
100,,COMMERCIAL,1875-03-01,Hotel A,complete
101,,SOCIAL,1901-06-15,Club B,complete
102,,,1910-01-01,\"Restaurant, C\",complete
103,,,,Undated House,complete
104,,,1820-05-01,Too Early Inn,complete
105,,,2025-01-01,Future Diner,complete
106,,,1900-02-30,Impossible Cafe,complete
";

pub const MENU_PAGE: &str = "\
id,menu_id,page_number
1000,100,1
1001,101,1
1002,102,1
1003,103,1
1004,104,1
1005,105,1
1006,106,1
1007,999,1
";

pub const MENU_ITEM_CLEANED: &str = "\
id,menu_page_id,price,high_price,dish_id,created_at
1,1000,2.00,4.00,1,2011-03-28
2,1001,0.25,,2,2011-03-28
3,1002,,,3,2011-03-28
4,1003,0.30,,1,2011-03-28
5,1004,0.30,,1,2011-03-28
6,1005,0.30,,2,2011-03-28
7,1006,0.30,,4,2011-03-28
8,1007,0.30,,5,2011-03-28
9,9999,0.30,,1,2011-03-28
10,1000,0.30,,6,2011-03-28
11,1001,0.10,0,4,2011-03-28
12,1000,0.50,0.70,5,2011-03-28
13,1002,1.00,,1,2011-03-28
14,1001,0.30,,,2011-03-28
";

pub const MENU_ITEM_ORIGINAL: &str = "\
id,menu_page_id,price,high_price,dish_id,created_at
1,1000,2.00,4.00,1,2011-03-28
2,1001,0.25,,2,2011-03-28
3,1002,,,3,2011-03-28
4,1003,,,1,2011-03-28
5,1004,,,1,2011-03-28
6,1005,0.30,,2,2011-03-28
7,1006,0.30,,4,2011-03-28
8,1007,0.30,,5,2011-03-28
9,9999,0.30,,1,2011-03-28
10,1000,0.30,,6,2011-03-28
11,1001,0.10,0,4,2011-03-28
12,1000,0.50,0.70,5,2011-03-28
13,1002,1.00,,1,2011-03-28
14,1001,0.30,,,2011-03-28
15,1001,,,2,2011-03-28
16,1002,,,2,2011-03-28
";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes the six menu tables under their default file names.
    pub fn with_menu_tables() -> Self {
        let workspace = Self::new();
        workspace.write("Dish.csv", DISH_ORIGINAL);
        workspace.write("Dish-cleaned.csv", DISH_CLEANED);
        workspace.write("MenuItem.csv", MENU_ITEM_ORIGINAL);
        workspace.write("MenuItem-cleaned.csv", MENU_ITEM_CLEANED);
        workspace.write("Menu.csv", MENU);
        workspace.write("MenuPage.csv", MENU_PAGE);
        workspace
    }
}
