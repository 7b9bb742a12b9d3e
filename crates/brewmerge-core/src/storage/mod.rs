pub mod json_records;

pub use json_records::{
    LoadedRecords, load_merged, load_records, load_source_file, load_sources, save_merged,
    save_records, source_id_for,
};
