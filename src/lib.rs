//! Shell command telemetry: decode captured records (migrating the legacy
//! schema), enrich them with the parsed command and validation state, and
//! rank history against a query record by contextual distance.

pub mod capture;
pub mod command;
pub mod config;
pub mod enrich;
pub mod error;
pub mod predict;
pub mod record;
pub mod similarity;
pub mod validate;

pub use capture::{session_record, BuildInfo, SessionInit};
pub use command::{command_and_first_token, TokenizeError};
pub use config::Config;
pub use enrich::{enrich, enrich_batch};
pub use error::{Error, Result};
pub use predict::stripped;
pub use record::{
    decode_record, BaseRecord, EnrichedRecord, FallbackRecord, Record, RecordError,
    RecordErrorKind,
};
pub use similarity::{rank, rank_parallel, DistParams, Dimension, Ranked};
pub use validate::{validate, Violation};
