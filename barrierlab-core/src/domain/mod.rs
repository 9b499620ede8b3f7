//! Domain types for barrierlab

pub mod bar;
pub mod dataset;
pub mod row;
pub mod series;

pub use bar::PriceBar;
pub use dataset::Dataset;
pub use row::LabeledRow;
pub use series::{PriceSeries, SeriesError};
