use crate::{error::RolloutError, Act, ActionSpaceKind};

/// Converts an action computed by a policy into the form the environment expects.
///
/// For a [`ActionSpaceKind::Tuple`] space the policy emits a batched tuple action; its
/// arity must match the space and the first element of the batch is returned.
/// Flat actions pass through unchanged. Any other combination is a mismatch between
/// the policy and the environment.
pub fn normalize_action<A: Act>(act: A, kind: ActionSpaceKind) -> Result<A, RolloutError> {
    match (kind, act.tuple_arity()) {
        (ActionSpaceKind::Flat, None) => Ok(act),
        (ActionSpaceKind::Flat, Some(arity)) => Err(RolloutError::ActionSpaceMismatch(format!(
            "tuple action of arity {} for a flat action space",
            arity
        ))),
        (ActionSpaceKind::Tuple(expected), Some(arity)) if arity == expected => {
            act.unbatch(0).ok_or_else(|| {
                RolloutError::ActionSpaceMismatch("empty batch of tuple actions".to_string())
            })
        }
        (ActionSpaceKind::Tuple(expected), Some(arity)) => {
            Err(RolloutError::ActionSpaceMismatch(format!(
                "tuple action of arity {} for a tuple action space of arity {}",
                arity, expected
            )))
        }
        (ActionSpaceKind::Tuple(expected), None) => Err(RolloutError::ActionSpaceMismatch(
            format!("flat action for a tuple action space of arity {}", expected),
        )),
    }
}
