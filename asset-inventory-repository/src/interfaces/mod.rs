//! Interface definitions for the telemetry store.
//!
//! Reading and writing are separate traits so the collectors only ever see a
//! read handle, and so both sides can be swapped for in-memory fakes in tests.

mod asset_writer;
mod telemetry_reader;

pub use asset_writer::AssetWriter;
pub use telemetry_reader::TelemetryReader;
