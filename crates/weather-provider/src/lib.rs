//! Weather provider client and block rendering
//!
//! Queries the provider's current-conditions API by city id, converts Kelvin
//! readings to the block's scale, and renders the `weather` block.

pub mod block;
mod error_mapping;
pub mod provider;
pub mod types;

pub use block::{
    scale_symbol, BlockDisplay, BlockError, BlockForm, WeatherBlock, WeatherBlockPlugin, BLOCK_ID,
    BLOCK_THEME,
};
pub use provider::{build_request_url, convert_temperature, WeatherQueryService};
pub use types::*;
