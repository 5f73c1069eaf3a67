//! Stage templates for the dispatch and return workflows.
//!
//! Stages are static `(key, label)` pairs. They are never instantiated; the
//! engine walks the fixed lists in place.

mod result;

pub use result::StageResult;

use crate::core::WorkflowMode;

/// A named step with a fixed human-readable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageTemplate {
    /// Machine key, also the target of failure injection.
    pub key: &'static str,
    /// Label written as the progress message.
    pub label: &'static str,
}

impl StageTemplate {
    /// Creates a new stage template.
    #[must_use]
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self { key, label }
    }

    /// Message used when this stage fails without an explicit reason.
    #[must_use]
    pub fn default_failure_message(&self) -> String {
        format!("{} 실패", self.label)
    }
}

/// Stages of the dispatch workflow, in order.
pub const DISPATCH_STAGES: &[StageTemplate] = &[
    StageTemplate::new("prepare", "불출 준비 중"),
    StageTemplate::new("pick", "요청 장비 수거"),
    StageTemplate::new("verify", "출고 전 시각 검사"),
    StageTemplate::new("handover", "사용자에게 전달"),
];

/// Stages of the return workflow, in order.
pub const RETURN_STAGES: &[StageTemplate] = &[
    StageTemplate::new("prepare", "반납 준비 중"),
    StageTemplate::new("verify", "반납 물품 시각 검사"),
    StageTemplate::new("stow", "보관 구역으로 이동"),
    StageTemplate::new("complete", "보관 완료"),
];

/// Intake inspections run after the return stages.
pub const VISION_CHECKS: &[StageTemplate] = &[
    StageTemplate::new("magazine_top", "탄창 최상단 탄알 위치 확인"),
    StageTemplate::new("selector", "조정간 위치 확인"),
    StageTemplate::new("serial", "총기 QR 코드 확인"),
];

/// Returns the stage list for a mode.
#[must_use]
pub const fn stages_for(mode: WorkflowMode) -> &'static [StageTemplate] {
    match mode {
        WorkflowMode::Dispatch => DISPATCH_STAGES,
        WorkflowMode::Return => RETURN_STAGES,
    }
}

/// Returns the vision checks for a mode (empty for dispatch).
#[must_use]
pub const fn checks_for(mode: WorkflowMode) -> &'static [StageTemplate] {
    if mode.runs_vision_checks() {
        VISION_CHECKS
    } else {
        &[]
    }
}

/// Returns true if `key` names a stage or check reachable in `mode`.
#[must_use]
pub fn is_active_key(mode: WorkflowMode, key: &str) -> bool {
    stages_for(mode)
        .iter()
        .chain(checks_for(mode))
        .any(|t| t.key == key)
}
