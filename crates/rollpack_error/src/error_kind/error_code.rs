pub const UNRESOLVED_ENTRY: &str = "UNRESOLVED_ENTRY";
pub const UNRESOLVED_IMPORT: &str = "UNRESOLVED_IMPORT";
pub const TRANSFORM_FAILED: &str = "TRANSFORM_FAILED";
pub const PARSE_FAILED: &str = "PARSE_FAILED";
pub const MISSING_MODULE: &str = "MISSING_MODULE";
pub const INVALID_CONFIG: &str = "INVALID_CONFIG";
pub const ORPHANED_MODULE: &str = "ORPHANED_MODULE";
pub const CHUNK_NAME_CONFLICT: &str = "CHUNK_NAME_CONFLICT";
pub const ASSET_TOO_LARGE: &str = "ASSET_TOO_LARGE";
pub const READ_FILE_FAILED: &str = "READ_FILE_FAILED";
pub const IO_ERROR: &str = "IO_ERROR";
pub const PANIC: &str = "PANIC";
