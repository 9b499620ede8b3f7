//! Data layer: series sources, per-symbol CSV storage, labeled-table
//! persistence, and the market-capitalization reference table.

pub mod csv_store;
pub mod provider;
pub mod reference;
pub mod table_store;
pub mod yahoo;

pub use csv_store::CsvSeriesStore;
pub use provider::{DataError, SeriesSource};
pub use reference::{ReferenceEntry, ReferenceTable};
pub use table_store::{dataframe_to_dataset, dataset_to_dataframe, TableFormat, TableStore};
pub use yahoo::YahooSource;
