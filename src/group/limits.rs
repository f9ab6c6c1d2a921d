/// Group model constants.
///
/// Process-wide values shared by the model and the update describer.

/// Length in bytes of every group identifier.
pub const GROUP_ID_LENGTH: usize = 16;

/// Separator used when several update descriptions are rendered as one notice.
pub const NOTICE_SEPARATOR: &str = "; ";

/// Notice text when an update produced no describable change.
pub const GENERIC_UPDATE_NOTICE: &str = "group updated";
