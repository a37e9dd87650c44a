pub mod csv_input;
pub mod error;
pub mod geometry;
pub mod ident;
pub mod parse;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use csv_input::{read_eo_missions, read_products, read_projects, read_themes, read_variables};
pub use error::RecordError;
pub use geometry::{bbox_or_globe, is_multipolygon, parse_geometry, Geometry, WHOLE_GLOBE_BBOX};
pub use ident::slugify;
pub use parse::years_between;
pub use store::{load_dir, store_dir, Record, Records};
pub use types::{Contact, EoMission, Product, Project, Released, Status, Theme, Variable};
