//! Domain types for the BOPS engine

pub mod bar;
pub mod equity;
pub mod position;
pub mod series;
pub mod timeframe;
pub mod trade;

pub use bar::{Bar, BarError};
pub use equity::{equity_values, EquityPoint};
pub use position::{Bracket, Position, PositionSide, Side};
pub use series::{BarSeries, SeriesError};
pub use timeframe::{Timeframe, TimeframeParseError};
pub use trade::{ExitReason, Trade};
