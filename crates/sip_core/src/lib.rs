pub mod date;
pub mod delivery;
pub mod error;
pub mod storage;
pub mod types;

pub use date::{DateInterpreter, DatePrecision, DateVocabulary, ParsedDate};
pub use delivery::{Delivery, Notifier};
pub use error::{Error, Result};
pub use storage::SeenLedger;
pub use types::{
    Article, Author, ContinuationUnit, Field, ImagePlacement, MessageUnit, PrimaryUnit,
};
