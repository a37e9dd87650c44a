#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use osc_cli::ConvertInput;

pub const THEMES: &str = "\
theme,description,link,image
Climate,Climate related research,https://example.org/climate,
Ocean,Marine research,https://example.org/ocean,images/ocean.png
";

pub const VARIABLES: &str = "\
variable,variable description,link,theme
Sea Surface Height,Height of the sea surface,https://example.org/ssh,Ocean
";

pub const EO_MISSIONS: &str = "\
name,description,link
Jason-3,Altimetry mission,https://example.org/jason-3
";

pub const PROJECTS: &str = "\
Short_Name,Status,Project_Name,Short_Description,Website,Eo4Society_link,Consortium,Start_Date_Project,End_Date_Project,TO,TO_E-mail,Themes
Ocean Watch,ongoing,Ocean Watch Project,Watching the ocean,https://example.org/ocean-watch,https://eo4society.example.org/ocean-watch,\"ESA, CNES\",2020-01-01,2020-12-31,Jane Doe,jane@example.org,Ocean
";

pub const PRODUCTS: &str = "\
Short_Name,Status,Website,Product,Description,Project,Variable,Themes,Access,Documentation,DOI,Version,Start,End,Polygon,Region,Released,EO_Missions
SSH 2020,completed,,Sea surface height 2020,Gridded SSH,Ocean Watch,Sea Surface Height,Ocean,https://example.org/data/ssh,https://example.org/docs/ssh,https://doi.org/10.5285/ssh.2020,1.0,2020-01-01,2020-12-31,\"[[[0,0],[10,0],[10,10],[0,10],[0,0]]]\",Atlantic,2021-03-01,Jason-3
";

/// Writes the five source tables below `dir` and returns the convert input
/// targeting `dir/data`.
pub fn write_tables(dir: &Path, products: &str) -> ConvertInput {
    let tables = dir.join("tables");
    fs::create_dir_all(&tables).unwrap();
    let write = |name: &str, text: &str| -> PathBuf {
        let path = tables.join(name);
        fs::write(&path, text).unwrap();
        path
    };
    ConvertInput {
        themes: write("themes.csv", THEMES),
        variables: write("variables.csv", VARIABLES),
        eo_missions: write("eo-missions.csv", EO_MISSIONS),
        projects: write("projects.csv", PROJECTS),
        products: write("products.csv", products),
        out_dir: dir.join("data"),
    }
}

pub fn read_json(path: &Path) -> serde_json::Value {
    let text = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("read {}: {}", path.display(), err));
    serde_json::from_str(&text).unwrap_or_else(|err| panic!("parse {}: {}", path.display(), err))
}
