use std::fmt;

/// Errors produced by board commands.
///
/// The first three are user-facing and recoverable: the command is refused
/// and no state changes. The last three are contract violations — a correct
/// driver never triggers them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// A required field was committed empty. The edit session stays open.
    RequiredFieldEmpty { field: &'static str },
    /// Another edit session holds an incomplete required field.
    EditInProgress,
    /// A tag-association session is active and blocks this operation.
    AssociationInProgress,
    /// Confirm was requested with no formula rows picked.
    NothingPicked,
    /// A field name outside the row kind's known field set.
    InvalidField(String),
    /// The command addressed a row id that does not exist.
    UnknownRow(crate::row::RowId),
    /// A draft or pick command arrived with no matching active session.
    NoActiveSession,
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequiredFieldEmpty { field } => {
                write!(f, "field '{field}' cannot be empty")
            }
            Self::EditInProgress => write!(f, "finish the current edit first"),
            Self::AssociationInProgress => {
                write!(f, "finish the tag association first")
            }
            Self::NothingPicked => write!(f, "pick at least one formula row to associate"),
            Self::InvalidField(name) => write!(f, "unknown field: '{name}'"),
            Self::UnknownRow(id) => write!(f, "no such row: {id}"),
            Self::NoActiveSession => write!(f, "no active edit or association session"),
        }
    }
}

impl std::error::Error for EditError {}
