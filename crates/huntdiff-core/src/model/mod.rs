pub mod classification;
pub mod hunt;
pub mod label;
pub mod sample;
pub mod timeframe;

pub use classification::{Classification, ParseClassificationError};
pub use hunt::{COMPLETED_STATUS, Hunt, HuntStats};
pub use label::LabelRecord;
pub use sample::{NO_SUBJECT, Sample};
pub use timeframe::Timeframe;
