//! Domain types: series, tables, symbols and windows.

pub mod series;
pub mod symbols;
pub mod table;
pub mod window;

pub use series::{PriceSeries, TimeSeries};
pub use symbols::{SymbolSet, SymbolSource};
pub use table::{columns, PriceTable, TableColumn};
pub use window::Window;
