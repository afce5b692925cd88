/// Aggregated view of session progress, useful for UI.
///
/// `step` is 1-based; `percent` measures visited questions against the
/// template's nominal count, so branched-over questions still count toward
/// the denominator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub step: usize,
    pub total_questions: usize,
    pub percent: u8,
    pub is_complete: bool,
}
