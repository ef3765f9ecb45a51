pub use crate::features::registry::{ProbeRegistry, add_record, list_records, remove_record};
