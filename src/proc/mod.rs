//! Module processing functionality.

mod constant_evaluator;
mod layouter;

pub use constant_evaluator::{ConstEvalError, ConstValue, ConstantEvaluator};
pub use layouter::{
    align_of, layout_of, round_up, struct_placements, Alignment, LayoutError, TypeLayout,
};
