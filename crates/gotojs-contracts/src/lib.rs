//! Shared, version-pinned protocol identifiers.
//!
//! These constants are the single source of truth for the content type and
//! schema/version strings that appear in machine-readable I/O.

/// Content type a host loader tags goto-enabled script blocks with.
pub const GOTO_CONTENT_TYPE: &str = "text/jsplusgoto";

pub const GOTOJS_REPORT_SCHEMA_VERSION: &str = "gotojs.report@0.1.0";
pub const GOTOJS_MANIFEST_SCHEMA_VERSION: &str = "gotojs.manifest@0.1.0";

/// Prefix of the generated loop-exit flag, followed by the label name.
pub const SENTINEL_PREFIX: &str = "goto_function_";
