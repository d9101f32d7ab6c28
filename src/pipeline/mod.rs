//! Request/response pipelines
//!
//! One pipeline per verb, each driving a provider-supplied handler:
//!
//! ```text
//! Read:   validate → registry → incremental plan → [probe] → build → send
//!         → parse (records + cursor) → time filter → marshal → ReadResult
//! Write:  validate → registry → create/update → build → send → parse
//! Delete: validate → registry → build → send → 200/204 check
//! ```

mod delete;
mod handlers;
mod locate;
mod marshal;
mod read;
mod write;

pub use delete::Deleter;
pub use handlers::{
    DeleteContext, DeleteHandler, ReadContext, ReadHandler, ReadPage, WriteContext, WriteHandler,
    WriteMethod,
};
pub use locate::{parse_page, RecordIdLocator, RecordLocator};
pub use marshal::marshal;
pub use read::{ReadSampler, Reader};
pub use write::Writer;
