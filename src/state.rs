/// Lifecycle step machine and the transient progress surface.
///
/// One linear machine drives the whole flow; each transition disables the
/// triggers for every other operation, so no two operations can run
/// against the same root at once.
use std::fmt;

/// The externally visible lifecycle steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Idle,
    Scanning,
    Duplicates,
    Review,
    Verifying,
    Exporting,
    Completed,
}

impl Step {
    pub fn label(&self) -> &'static str {
        match self {
            Step::Idle => "idle",
            Step::Scanning => "scanning",
            Step::Duplicates => "resolving duplicates",
            Step::Review => "review",
            Step::Verifying => "verifying",
            Step::Exporting => "moving files",
            Step::Completed => "completed",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Default for Step {
    fn default() -> Self {
        Step::Idle
    }
}

/// An attempted transition outside the declared edges.
#[derive(Debug)]
pub struct StateError {
    pub from: Step,
    pub to: Step,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot go from {} to {}", self.from, self.to)
    }
}

impl std::error::Error for StateError {}

/// The step machine. Starts at `Idle`; `reset` returns there from any
/// state. All other movement goes through `transition`, which rejects
/// edges not in the lifecycle, so the machine can never end up outside
/// the declared states.
#[derive(Debug, Default)]
pub struct StepMachine {
    current: Step,
}

impl StepMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Step {
        self.current
    }

    /// Explicit reset; legal from every state.
    pub fn reset(&mut self) {
        self.current = Step::Idle;
    }

    pub fn transition(&mut self, to: Step) -> Result<(), StateError> {
        if Self::allowed(self.current, to) {
            self.current = to;
            Ok(())
        } else {
            Err(StateError {
                from: self.current,
                to,
            })
        }
    }

    /// The lifecycle edges, including the failure/cancel returns:
    /// a failed scan goes back to Idle, and a cancelled or failed move
    /// returns to the last stable review state.
    fn allowed(from: Step, to: Step) -> bool {
        matches!(
            (from, to),
            (Step::Idle, Step::Scanning)
                | (Step::Scanning, Step::Duplicates)
                | (Step::Scanning, Step::Review)
                | (Step::Scanning, Step::Idle)
                | (Step::Duplicates, Step::Review)
                | (Step::Review, Step::Verifying)
                | (Step::Review, Step::Exporting)
                | (Step::Verifying, Step::Exporting)
                | (Step::Verifying, Step::Review)
                | (Step::Exporting, Step::Completed)
                | (Step::Exporting, Step::Review)
                | (Step::Completed, Step::Idle)
        )
    }
}

/// Transient progress and error surface for the active operation.
/// Not persisted; reset when a new operation starts.
#[derive(Debug, Clone, Default)]
pub struct ProcessingState {
    pub is_scanning: bool,
    pub is_organizing: bool,
    pub error: Option<String>,
    /// 0 to 100, monotonic within one operation.
    pub progress: u8,
    pub activity: String,
    pub current_file: Option<String>,
}

impl ProcessingState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn begin(&mut self, activity: &str) {
        self.reset();
        self.activity = activity.to_string();
    }

    pub fn file_progress(&mut self, progress: u8, file_name: &str) {
        self.progress = progress;
        self.current_file = Some(file_name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        assert_eq!(StepMachine::new().current(), Step::Idle);
    }

    #[test]
    fn full_happy_path_with_duplicates() {
        let mut machine = StepMachine::new();
        for step in [
            Step::Scanning,
            Step::Duplicates,
            Step::Review,
            Step::Verifying,
            Step::Exporting,
            Step::Completed,
            Step::Idle,
        ] {
            machine.transition(step).expect("legal transition rejected");
        }
    }

    #[test]
    fn scan_without_duplicates_goes_straight_to_review() {
        let mut machine = StepMachine::new();
        machine.transition(Step::Scanning).unwrap();
        machine.transition(Step::Review).unwrap();
        machine.transition(Step::Exporting).unwrap();
        machine.transition(Step::Completed).unwrap();
    }

    #[test]
    fn failed_scan_returns_to_idle() {
        let mut machine = StepMachine::new();
        machine.transition(Step::Scanning).unwrap();
        machine.transition(Step::Idle).unwrap();
    }

    #[test]
    fn cancelled_move_returns_to_review() {
        let mut machine = StepMachine::new();
        machine.transition(Step::Scanning).unwrap();
        machine.transition(Step::Review).unwrap();
        machine.transition(Step::Exporting).unwrap();
        machine.transition(Step::Review).unwrap();
    }

    #[test]
    fn illegal_edges_are_rejected_and_state_is_unchanged() {
        let mut machine = StepMachine::new();
        let err = machine.transition(Step::Completed).unwrap_err();
        assert_eq!(err.from, Step::Idle);
        assert_eq!(err.to, Step::Completed);
        assert_eq!(machine.current(), Step::Idle);

        machine.transition(Step::Scanning).unwrap();
        assert!(machine.transition(Step::Exporting).is_err());
        assert_eq!(machine.current(), Step::Scanning);
    }

    #[test]
    fn reset_works_from_any_state() {
        let mut machine = StepMachine::new();
        machine.transition(Step::Scanning).unwrap();
        machine.transition(Step::Duplicates).unwrap();
        machine.reset();
        assert_eq!(machine.current(), Step::Idle);
    }

    #[test]
    fn processing_state_resets_between_operations() {
        let mut state = ProcessingState::default();
        state.begin("Organizing files");
        state.file_progress(40, "a.txt");
        state.error = Some("boom".to_string());

        state.begin("Scanning folder");
        assert_eq!(state.progress, 0);
        assert_eq!(state.error, None);
        assert_eq!(state.current_file, None);
        assert_eq!(state.activity, "Scanning folder");
    }
}
