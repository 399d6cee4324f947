//! # PMU stats
//!
//! Parsing and aggregation of the performance-counter reports printed by the
//! PMU benchmark programs.
//!
//! A benchmark prints one block per phase:
//!
//! ```text
//! ==== PMU statistics for phase1 ====
//! instructions : 1000
//! l1i_ref      : 500
//! cycles       : 2000
//! ```
//!
//! [`parse_pmu_output`] turns that text into ordered [`Sections`],
//! [`Table::from_sections`] lays them out as rows, and [`add_miss_rates`]
//! appends the derived miss-rate columns:
//!
//! ```
//! use pmu_stats::{add_miss_rates, parse_pmu_output, Table};
//!
//! let text = "==== PMU statistics for phase1 ====\n\
//!             l1d_ref: 400\n\
//!             l1d_miss: 40\n";
//! let sections = parse_pmu_output(text).unwrap();
//! let mut table = Table::from_sections("phase", &sections);
//! add_miss_rates(&mut table);
//!
//! assert_eq!(table.value("phase1", "l1d_miss_rate"), Some(0.1));
//! ```

pub mod csv_io;
pub mod error;
pub mod loader;
pub mod metric;
pub mod parser;
pub mod rates;
pub mod section;
pub mod table;

pub use csv_io::{load_table, read_table, save_table, write_table};
pub use error::{Error, Result};
pub use loader::run_executable;
pub use metric::{Metric, MissRate};
pub use parser::parse_pmu_output;
pub use rates::add_miss_rates;
pub use section::{Section, Sections};
pub use table::{Cell, Row, Schema, Table};
