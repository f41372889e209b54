//! Evaluation-eligibility rules.
//!
//! Two entry points with deliberately different strictness: the tier-keyed
//! decision table used while importing assignments (which creates the
//! relationships), and the ranked five-rule check used at evaluation time
//! when full entities with precomputed rank are available. The asymmetry is
//! intentional: import creates what the runtime check later verifies.

use thiserror::Error;

use crate::contract::model::Tier;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("a council member may only supervise directors or the mayor")]
    CouncilScope,

    #[error("the mayor may only supervise directors")]
    MayorScope,

    #[error("a council member may only be evaluated by themselves")]
    CouncilEvaluatedByOther,

    #[error("the mayor may only be evaluated by a council member")]
    MayorEvaluator,

    #[error("self-evaluation is not allowed here")]
    SelfEvaluation,

    #[error("an evaluator may not evaluate someone of higher rank")]
    HigherRank,

    #[error("an evaluator may not evaluate someone of equal rank")]
    EqualRank,
}

/// Import-time decision table, keyed on the evaluator's tier.
///
/// Ordinary tiers carry no restriction at import time; the runtime check
/// below is the stricter gate that additionally requires an existing active
/// assignment.
pub fn check_import(evaluator: Tier, evaluated: Tier) -> Result<(), PermissionError> {
    match evaluator {
        Tier::Council => match evaluated {
            Tier::Director | Tier::Mayor => Ok(()),
            _ => Err(PermissionError::CouncilScope),
        },
        Tier::Mayor => match evaluated {
            Tier::Director => Ok(()),
            _ => Err(PermissionError::MayorScope),
        },
        _ => Ok(()),
    }
}

/// A participant of a runtime evaluation check: identity plus precomputed
/// tier and rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub dpi: String,
    pub tier: Tier,
    pub rank: i32,
}

/// Runtime evaluation check: five ordered rules, first violation wins.
///
/// 1. A council member may only be evaluated by themselves.
/// 2. The mayor may only be evaluated by a council member.
/// 3. Self-evaluation is rejected unless explicitly allowed.
/// 4. An evaluator may not evaluate strictly higher rank.
/// 5. An evaluator may not evaluate equal rank.
///
/// Rules 4 and 5 are waived for council-evaluating-mayor.
pub fn check_evaluation(
    evaluator: &Subject,
    evaluated: &Subject,
    allow_self: bool,
) -> Result<(), PermissionError> {
    let is_self = evaluator.dpi == evaluated.dpi;

    if evaluated.tier == Tier::Council && !is_self {
        return Err(PermissionError::CouncilEvaluatedByOther);
    }
    if evaluated.tier == Tier::Mayor && evaluator.tier != Tier::Council {
        return Err(PermissionError::MayorEvaluator);
    }
    if is_self {
        return if allow_self {
            Ok(())
        } else {
            Err(PermissionError::SelfEvaluation)
        };
    }

    let waived = evaluator.tier == Tier::Council && evaluated.tier == Tier::Mayor;
    if !waived {
        if evaluated.rank > evaluator.rank {
            return Err(PermissionError::HigherRank);
        }
        if evaluated.rank == evaluator.rank {
            return Err(PermissionError::EqualRank);
        }
    }
    Ok(())
}
