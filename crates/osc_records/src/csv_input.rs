//! Reading the five source tables into typed records.
//!
//! Every reader fails fast: the first malformed row aborts the whole table
//! with a [`RecordError::MalformedInput`] naming the source, the 1-based row
//! number (the header is row 1) and, where known, the column.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use crate::error::RecordError;
use crate::geometry::{is_multipolygon, parse_geometry};
use crate::ident::slugify;
use crate::parse::{
    end_of_day, parse_doi, parse_product_date, parse_project_date, parse_released, split_list,
    start_of_day,
};
use crate::types::{Contact, EoMission, Product, Project, Status, Theme, Variable};

const LIST_SEPARATOR: char = ';';
const CONSORTIUM_SEPARATOR: char = ',';
const NUMBERED_THEME_COLUMNS: usize = 6;

struct Row<'a> {
    source: &'a str,
    row: usize,
    headers: &'a StringRecord,
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    fn error(&self, column: Option<&str>, message: impl Into<String>) -> RecordError {
        RecordError::MalformedInput {
            source: self.source.to_string(),
            row: self.row,
            column: column.map(str::to_string),
            message: message.into(),
        }
    }

    fn cell(&self, column: &str) -> Option<&'a str> {
        let idx = self.headers.iter().position(|h| h == column)?;
        Some(self.record.get(idx).unwrap_or(""))
    }

    /// Column must exist; the cell may be empty.
    fn text(&self, column: &str) -> Result<String, RecordError> {
        self.cell(column)
            .map(str::to_string)
            .ok_or_else(|| self.error(Some(column), "missing column"))
    }

    /// Column must exist and the cell must be non-empty.
    fn required(&self, column: &str) -> Result<String, RecordError> {
        let value = self.text(column)?;
        if value.is_empty() {
            return Err(self.error(Some(column), "empty value"));
        }
        Ok(value)
    }

    /// Absent column and empty cell both read as `None`.
    fn optional(&self, column: &str) -> Option<String> {
        self.cell(column)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn status(&self, column: &str) -> Result<Status, RecordError> {
        self.required(column)?
            .parse::<Status>()
            .map_err(|err| self.error(Some(column), err))
    }

    /// `Themes` as a list column, or the numbered `Theme1`..`Theme6` columns.
    fn themes(&self) -> Vec<String> {
        if let Some(themes) = self.cell("Themes") {
            return split_list(themes, LIST_SEPARATOR);
        }
        (1..=NUMBERED_THEME_COLUMNS)
            .filter_map(|i| self.optional(&format!("Theme{}", i)))
            .collect()
    }

    fn list(&self, column: &str) -> Vec<String> {
        self.cell(column)
            .map(|value| split_list(value, LIST_SEPARATOR))
            .unwrap_or_default()
    }
}

fn read_rows<R, T, F>(source: &str, reader: R, parse: F) -> Result<Vec<T>, RecordError>
where
    R: Read,
    F: FnMut(&Row<'_>) -> Result<T, RecordError>,
{
    read_table(source, reader, None, parse)
}

/// Reads a table whose first row is a header. With `implicit` columns the
/// header is optional: a first row whose first cell is not `implicit[0]` is
/// data, and the columns are taken from `implicit` in order.
fn read_table<R, T, F>(
    source: &str,
    reader: R,
    implicit: Option<&[&str]>,
    mut parse: F,
) -> Result<Vec<T>, RecordError>
where
    R: Read,
    F: FnMut(&Row<'_>) -> Result<T, RecordError>,
{
    let mut csv = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(false)
        .from_reader(reader);
    let mut records = csv.records();
    let first = match records.next() {
        Some(record) => record.map_err(|err| csv_error(source, &err))?,
        None => return Ok(Vec::new()),
    };
    let (headers, leading, first_row) = match implicit {
        Some(columns)
            if !columns.is_empty()
                && !first
                    .get(0)
                    .is_some_and(|cell| cell.eq_ignore_ascii_case(columns[0])) =>
        {
            (StringRecord::from(columns.to_vec()), Some(first), 1)
        }
        _ => (first, None, 2),
    };

    let mut out = Vec::new();
    for (idx, record) in leading.into_iter().map(Ok).chain(records).enumerate() {
        let record = record.map_err(|err| csv_error(source, &err))?;
        let row = Row {
            source,
            row: idx + first_row,
            headers: &headers,
            record: &record,
        };
        let _span = tracing::debug_span!("row", source, row = row.row).entered();
        out.push(parse(&row)?);
    }
    debug!(source, rows = out.len(), "read source table");
    Ok(out)
}

fn csv_error(source: &str, err: &csv::Error) -> RecordError {
    RecordError::MalformedInput {
        source: source.to_string(),
        row: err.position().map(|p| p.line() as usize).unwrap_or(0),
        column: None,
        message: err.to_string(),
    }
}

/// Columns: `theme, description, link[, image]`.
pub fn read_themes<R: Read>(source: &str, reader: R) -> Result<Vec<Theme>, RecordError> {
    read_rows(source, reader, |row| {
        Ok(Theme {
            name: row.required("theme")?,
            description: row.text("description")?,
            link: row.optional("link"),
            image: row.optional("image"),
        })
    })
}

/// Columns: `variable, variable description, link, theme` (`;`-list of themes).
pub fn read_variables<R: Read>(source: &str, reader: R) -> Result<Vec<Variable>, RecordError> {
    read_rows(source, reader, |row| {
        Ok(Variable {
            name: row.required("variable")?,
            description: row.text("variable description")?,
            link: row.optional("link"),
            themes: split_list(&row.text("theme")?, LIST_SEPARATOR),
        })
    })
}

const EO_MISSION_COLUMNS: [&str; 3] = ["name", "description", "link"];

/// Columns: `name[, description, link]`. The header row may be omitted, in
/// which case every line is a mission and the columns are taken in that order.
pub fn read_eo_missions<R: Read>(source: &str, reader: R) -> Result<Vec<EoMission>, RecordError> {
    read_table(source, reader, Some(&EO_MISSION_COLUMNS[..]), |row| {
        Ok(EoMission {
            name: row.required("name")?,
            description: row.optional("description"),
            link: row.optional("link"),
        })
    })
}

pub fn read_projects<R: Read>(source: &str, reader: R) -> Result<Vec<Project>, RecordError> {
    read_rows(source, reader, |row| {
        let short_name = row.required("Short_Name")?;
        let id = slugify(&short_name);
        if id.is_empty() {
            return Err(row.error(Some("Short_Name"), "name has no identifier characters"));
        }
        let start = row.required("Start_Date_Project")?;
        let start = parse_project_date(&start)
            .map_err(|err| row.error(Some("Start_Date_Project"), err))?;
        let end = row.required("End_Date_Project")?;
        let end =
            parse_project_date(&end).map_err(|err| row.error(Some("End_Date_Project"), err))?;

        Ok(Project {
            id,
            status: row.status("Status")?,
            name: row.text("Project_Name")?,
            title: short_name,
            description: row.text("Short_Description")?,
            website: row.text("Website")?,
            eo4society_link: row.optional("Eo4Society_link"),
            consortium: split_list(&row.text("Consortium")?, CONSORTIUM_SEPARATOR),
            start: start_of_day(start),
            end: end_of_day(end),
            technical_officer: Contact {
                name: row.text("TO")?,
                email: row.text("TO_E-mail")?,
            },
            themes: row.themes(),
        })
    })
}

pub fn read_products<R: Read>(source: &str, reader: R) -> Result<Vec<Product>, RecordError> {
    read_rows(source, reader, |row| {
        let short_name = row.required("Short_Name")?;
        let id = slugify(&short_name);
        if id.is_empty() {
            return Err(row.error(Some("Short_Name"), "name has no identifier characters"));
        }
        let start = match row.optional("Start") {
            Some(value) => Some(start_of_day(
                parse_product_date(&value).map_err(|err| row.error(Some("Start"), err))?,
            )),
            None => None,
        };
        let end = match row.optional("End") {
            Some(value) => Some(end_of_day(
                parse_product_date(&value).map_err(|err| row.error(Some("End"), err))?,
            )),
            None => None,
        };
        let polygon = row.optional("Polygon").unwrap_or_default();
        if is_multipolygon(&polygon) {
            warn!(
                "{} row {}: multipolygon geometry is not supported; using the whole-globe extent",
                row.source, row.row
            );
        }
        let geometry = parse_geometry(&polygon).map_err(|err| row.error(Some("Polygon"), err))?;
        let released = parse_released(&row.optional("Released").unwrap_or_default())
            .map_err(|err| row.error(Some("Released"), err))?;

        Ok(Product {
            id,
            status: row.status("Status")?,
            title: row.required("Product")?,
            description: row.text("Description")?,
            project: row.required("Project")?,
            variables: row.list("Variable"),
            themes: row.themes(),
            website: row.optional("Website"),
            access: row.text("Access")?,
            documentation: row.optional("Documentation"),
            doi: row.optional("DOI").and_then(|doi| parse_doi(&doi)),
            version: row.optional("Version"),
            start,
            end,
            geometry,
            region: row.optional("Region"),
            released,
            eo_missions: row.list("EO_Missions"),
        })
    })
}
