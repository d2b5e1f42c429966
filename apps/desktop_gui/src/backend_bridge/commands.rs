//! Backend commands queued from UI to backend worker.

use shared::domain::InputState;

pub enum BackendCommand {
    /// Carries the form values as they were when the button was pressed.
    Submit(InputState),
    Forget,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit(_) => "submit",
            Self::Forget => "forget",
        }
    }
}
