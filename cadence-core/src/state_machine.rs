/// Run loop lifecycle. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEvent {
    /// The drain found the native quit message.
    QuitReceived,
    /// A source failure the configured policy treats as fatal.
    FatalFailure,
    /// An iteration completed without stopping.
    IterationCompleted,
}

pub fn next_state(current: LoopState, event: TransitionEvent) -> LoopState {
    match (current, event) {
        (LoopState::Stopped, _) => LoopState::Stopped,
        (LoopState::Running, TransitionEvent::QuitReceived | TransitionEvent::FatalFailure) => {
            LoopState::Stopped
        }
        (LoopState::Running, TransitionEvent::IterationCompleted) => LoopState::Running,
    }
}

impl LoopState {
    pub fn is_running(self) -> bool {
        self == LoopState::Running
    }
}
