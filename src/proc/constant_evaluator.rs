use std::convert::TryFrom;

use crate::arena::Handle;
use crate::ast;
use crate::resolve::{Scope, ScopeEntry};
use crate::types::Type;
use crate::FastIndexMap;

/// The value of a constant expression.
///
/// Composite values keep their elements unevaluated: only the element an
/// index or member access actually selects gets evaluated.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    Int(i64),
    /// Elements of an array, in order.
    Indexed(Vec<Handle<ast::Expression>>),
    /// Members of a struct, in declaration order.
    Named(FastIndexMap<String, Handle<ast::Expression>>),
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConstEvalError {
    #[error("{kind} `{name}` cannot be used in a constant expression")]
    NotConstant { name: String, kind: &'static str },
    #[error("unknown identifier `{0}` in a constant expression")]
    UnknownIdentifier(String),
    #[error("override `{0}` has no initializer")]
    UninitializedOverride(String),
    #[error("expression {0:?} is not supported in constant expressions")]
    NotImplemented(Handle<ast::Expression>),
    #[error("expression {0:?} does not evaluate to an integer")]
    NotAnInteger(Handle<ast::Expression>),
    #[error("expression {0:?} cannot be indexed")]
    NotIndexable(Handle<ast::Expression>),
    #[error("index {index} is out of bounds for {len} elements")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error("expression {expr:?} has no member `{member}`")]
    NoSuchMember {
        expr: Handle<ast::Expression>,
        member: String,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("{0} operation overflowed")]
    Overflow(&'static str),
    #[error("value {0} is not a valid unsigned 32-bit integer")]
    OutOfRange(i64),
}

/// Evaluates the small integer subset of constant expressions needed to size
/// arrays and read attribute arguments.
///
/// Identifiers are looked up in `scope`; only module-scope constants and
/// overrides with initializers have values.
pub struct ConstantEvaluator<'a> {
    tu: &'a ast::TranslationUnit,
    scope: &'a Scope,
}

impl<'a> ConstantEvaluator<'a> {
    pub const fn new(tu: &'a ast::TranslationUnit, scope: &'a Scope) -> Self {
        Self { tu, scope }
    }

    pub fn eval(&self, expr: Handle<ast::Expression>) -> Result<ConstValue, ConstEvalError> {
        match self.tu.expressions[expr] {
            ast::Expression::Literal(literal) => match literal {
                ast::Literal::AbstractInt(value) => Ok(ConstValue::Int(value)),
                ast::Literal::I32(value) => Ok(ConstValue::Int(value.into())),
                ast::Literal::U32(value) => Ok(ConstValue::Int(value.into())),
                _ => Err(ConstEvalError::NotImplemented(expr)),
            },
            ast::Expression::Paren(inner) => self.eval(inner),
            ast::Expression::Identifier(ref name) => self.identifier(name),
            ast::Expression::Index { base, index } => {
                let index = self.eval_int(index)?;
                match self.eval(base)? {
                    ConstValue::Indexed(elements) => {
                        let element = usize::try_from(index)
                            .ok()
                            .and_then(|i| elements.get(i).copied())
                            .ok_or(ConstEvalError::IndexOutOfBounds {
                                index,
                                len: elements.len(),
                            })?;
                        self.eval(element)
                    }
                    _ => Err(ConstEvalError::NotIndexable(base)),
                }
            }
            ast::Expression::Member { base, ref member } => match self.eval(base)? {
                ConstValue::Named(members) => match members.get(member) {
                    Some(&value) => self.eval(value),
                    None => Err(ConstEvalError::NoSuchMember {
                        expr: base,
                        member: member.clone(),
                    }),
                },
                _ => Err(ConstEvalError::NoSuchMember {
                    expr: base,
                    member: member.clone(),
                }),
            },
            ast::Expression::Construct {
                ty: ast::ConstructorType::Array { .. },
                ref args,
            } if !args.is_empty() => Ok(ConstValue::Indexed(args.clone())),
            ast::Expression::Call {
                ref callee,
                template: None,
                ref args,
            } => match self.scope.lookup(callee).and_then(ScopeEntry::declared_type) {
                Some(&Type::Struct(ref st)) if st.members.len() == args.len() => Ok(
                    ConstValue::Named(
                        st.members
                            .iter()
                            .map(|member| member.name.clone())
                            .zip(args.iter().copied())
                            .collect(),
                    ),
                ),
                _ => Err(ConstEvalError::NotImplemented(expr)),
            },
            ast::Expression::Binary { op, left, right } => {
                let (left, right) = (self.eval_int(left)?, self.eval_int(right)?);
                match op {
                    ast::BinaryOperator::Multiply => left
                        .checked_mul(right)
                        .map(ConstValue::Int)
                        .ok_or(ConstEvalError::Overflow("multiplication")),
                    ast::BinaryOperator::Divide => {
                        if right == 0 {
                            return Err(ConstEvalError::DivisionByZero);
                        }
                        left.checked_div(right)
                            .map(ConstValue::Int)
                            .ok_or(ConstEvalError::Overflow("division"))
                    }
                    ast::BinaryOperator::ShiftLeft => {
                        let shifted = u32::try_from(right)
                            .ok()
                            .and_then(|amount| left.checked_shl(amount))
                            .filter(|&shifted| shifted >> right == left);
                        shifted
                            .map(ConstValue::Int)
                            .ok_or(ConstEvalError::Overflow("shift"))
                    }
                    _ => Err(ConstEvalError::NotImplemented(expr)),
                }
            }
            ast::Expression::Augmented(ref augmented) => self.eval(augmented.wrapped()),
            ast::Expression::Unary { .. }
            | ast::Expression::Construct { .. }
            | ast::Expression::Call { .. } => Err(ConstEvalError::NotImplemented(expr)),
        }
    }

    fn identifier(&self, name: &str) -> Result<ConstValue, ConstEvalError> {
        let entry = self
            .scope
            .lookup(name)
            .ok_or_else(|| ConstEvalError::UnknownIdentifier(name.to_string()))?;
        let init = match *entry {
            ScopeEntry::GlobalConstant { decl, .. } => match self.tu.decls[decl] {
                ast::GlobalDecl::Constant(ref c) => Some(c.init),
                _ => None,
            },
            ScopeEntry::GlobalOverride { decl, .. } => match self.tu.decls[decl] {
                ast::GlobalDecl::Override(ref o) => Some(
                    o.init
                        .ok_or_else(|| ConstEvalError::UninitializedOverride(name.to_string()))?,
                ),
                _ => None,
            },
            _ => None,
        };
        match init {
            Some(init) => self.eval(init),
            None => Err(ConstEvalError::NotConstant {
                name: name.to_string(),
                kind: entry.kind(),
            }),
        }
    }

    pub fn eval_int(&self, expr: Handle<ast::Expression>) -> Result<i64, ConstEvalError> {
        match self.eval(expr)? {
            ConstValue::Int(value) => Ok(value),
            ConstValue::Indexed(_) | ConstValue::Named(_) => Err(ConstEvalError::NotAnInteger(expr)),
        }
    }

    pub fn eval_u32(&self, expr: Handle<ast::Expression>) -> Result<u32, ConstEvalError> {
        let value = self.eval_int(expr)?;
        u32::try_from(value).map_err(|_| ConstEvalError::OutOfRange(value))
    }
}
