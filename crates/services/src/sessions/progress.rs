/// Aggregated view of test progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub current_index: usize,
    pub is_finished: bool,
}
