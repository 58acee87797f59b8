pub mod field;
pub mod outcome;
pub mod product;
pub mod request;
pub mod result;

pub use field::Field;
pub use outcome::{ErrorKind, ExtractionFailure, PageOutcome};
pub use product::ProductRecord;
pub use request::{split_list, BackendKind, CrawlRequest, InputList};
pub use result::CrawlResult;
