use serde::{Deserialize, Serialize};

/// A control message exchanged between agents.
///
/// The unit of application-level communication: an action name plus
/// ordered string arguments, e.g. `delete ["app1"]` or
/// `rename ["old", "new"]`. Messages are values; each consumer gets its
/// own copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The verb.
    pub action: String,
    /// Ordered operands for the action.
    pub args: Vec<String>,
}

impl Message {
    /// Create a new message.
    pub fn new<A, I, S>(action: A, args: I) -> Self
    where
        A: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action: action.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}
