//! Typing of value constructors: `vec3(1, 2, 3)`, `array<u32, 2>(...)`,
//! `S(a, b)` and friends.

use std::convert::TryFrom;

use super::{Capabilities, Context, Error};
use crate::arena::Handle;
use crate::ast;
use crate::proc::{ConstEvalError, ConstantEvaluator};
use crate::types::{Scalar, Type};

impl Context<'_> {
    /// Resolve a constructor expression, inferring whatever parts of the
    /// constructed type were left out.
    pub(super) fn construct(
        &mut self,
        expr: Handle<ast::Expression>,
        ty: &ast::ConstructorType,
        args: &[Handle<ast::Expression>],
    ) -> Result<Type, Error> {
        let (target, arg_types) = match *ty {
            ast::ConstructorType::Scalar(scalar) => {
                if scalar == Scalar::F16 {
                    self.require(Capabilities::F16)?;
                }
                (Type::Scalar(scalar), self.values(args)?)
            }
            ast::ConstructorType::Vector { size, component } => {
                let explicit = self.component(component)?;
                let arg_types = self.values(args)?;
                let scalar = match explicit {
                    Some(scalar) => scalar,
                    None => infer_scalar(expr, &arg_types)?.unwrap_or(Scalar::AbstractInt),
                };
                (Type::vector(size, scalar), arg_types)
            }
            ast::ConstructorType::Matrix {
                columns,
                rows,
                component,
            } => {
                let explicit = self.component(component)?;
                let arg_types = self.values(args)?;
                let scalar = match explicit {
                    Some(scalar) => scalar,
                    None => match infer_scalar(expr, &arg_types)? {
                        None | Some(Scalar::AbstractInt) => Scalar::AbstractFloat,
                        Some(scalar) => scalar,
                    },
                };
                if !scalar.is_float() {
                    return Err(match arg_types.first() {
                        Some(first) => Error::InvalidConstructorArgument {
                            expr,
                            index: 0,
                            ty: first.clone(),
                        },
                        None => Error::NotConstructible {
                            expr,
                            ty: Type::Matrix {
                                columns,
                                rows,
                                scalar,
                            },
                        },
                    });
                }
                (
                    Type::Matrix {
                        columns,
                        rows,
                        scalar,
                    },
                    arg_types,
                )
            }
            ast::ConstructorType::Array { base, size } => {
                let explicit = base.map(|base| self.ty(base)).transpose()?;
                let size = match size {
                    Some(size) => Some(self.constructed_array_length(size)?),
                    None => None,
                };
                let arg_types = self.values(args)?;
                let base = match explicit {
                    Some(base) => base,
                    None => infer_element(expr, &arg_types)?,
                };
                let size = match (size, arg_types.len()) {
                    (Some(size), _) => Some(size),
                    (None, 0) => None,
                    (None, count) => u32::try_from(count).ok(),
                };
                (Type::array(base, size), arg_types)
            }
        };

        check_constructor(expr, &target, &arg_types)?;
        Ok(target)
    }

    fn component(
        &mut self,
        component: Option<Handle<ast::TypeDecl>>,
    ) -> Result<Option<Scalar>, Error> {
        let handle = match component {
            Some(handle) => handle,
            None => return Ok(None),
        };
        match self.ty(handle)? {
            Type::Scalar(scalar) => Ok(Some(scalar)),
            other => Err(Error::InvalidComponentType {
                ty: handle,
                component: other,
            }),
        }
    }

    /// Evaluate the explicit element count of an array constructor.
    fn constructed_array_length(&mut self, size: Handle<ast::Expression>) -> Result<u32, Error> {
        self.expression(size)?;
        let length = ConstantEvaluator::new(self.tu, &self.scope).eval_int(size)?;
        match u32::try_from(length) {
            Ok(length) if length > 0 => Ok(length),
            _ => Err(ConstEvalError::OutOfRange(length).into()),
        }
    }
}

/// The scalar every argument converts to, or `None` without arguments.
fn infer_scalar(expr: Handle<ast::Expression>, args: &[Type]) -> Result<Option<Scalar>, Error> {
    let mut consensus = None;
    for (index, arg) in args.iter().enumerate() {
        let invalid = || Error::InvalidConstructorArgument {
            expr,
            index,
            ty: arg.clone(),
        };
        let scalar = arg.scalar().ok_or_else(invalid)?;
        consensus = Some(match consensus {
            None => scalar,
            Some(previous) => {
                Scalar::automatic_conversion_combine(previous, scalar).ok_or_else(invalid)?
            }
        });
    }
    Ok(consensus)
}

/// The element type of an array constructed without one.
fn infer_element(expr: Handle<ast::Expression>, args: &[Type]) -> Result<Type, Error> {
    let mut consensus: Option<Type> = None;
    for (index, arg) in args.iter().enumerate() {
        consensus = Some(match consensus {
            None => arg.clone(),
            Some(previous) => previous.automatic_conversion_combine(arg).ok_or_else(|| {
                Error::InvalidConstructorArgument {
                    expr,
                    index,
                    ty: arg.clone(),
                }
            })?,
        });
    }
    consensus.ok_or(Error::CannotInferElementType { expr })
}

/// Check that `args` can construct a value of type `target`.
///
/// A zero-argument constructor builds the zero value of any constructible
/// type.
pub(super) fn check_constructor(
    expr: Handle<ast::Expression>,
    target: &Type,
    args: &[Type],
) -> Result<(), Error> {
    let invalid = |index: usize| Error::InvalidConstructorArgument {
        expr,
        index,
        ty: args[index].clone(),
    };
    let count = |expected: usize| -> Result<(), Error> {
        if args.is_empty() || args.len() == expected {
            Ok(())
        } else {
            Err(Error::WrongComponentCount {
                expr,
                expected,
                found: args.len(),
            })
        }
    };

    match *target {
        // Scalar constructors convert between any two scalar types.
        Type::Scalar(_) => {
            if let Some(index) = args
                .iter()
                .position(|arg| !matches!(*arg, Type::Scalar(_)))
            {
                return Err(invalid(index));
            }
            count(1)
        }
        Type::Vector { size, scalar } => {
            if let [Type::Vector {
                size: arg_size, ..
            }] = *args
            {
                if arg_size == size {
                    return Ok(());
                }
            }
            let mut components = 0;
            for (index, arg) in args.iter().enumerate() {
                components += match *arg {
                    Type::Scalar(arg_scalar) if arg_scalar.is_abstraction_of(scalar) => 1,
                    Type::Vector {
                        size: arg_size,
                        scalar: arg_scalar,
                    } if arg_scalar.is_abstraction_of(scalar) => arg_size as usize,
                    _ => return Err(invalid(index)),
                };
            }
            let splat = matches!(*args, [Type::Scalar(_)]);
            if components == 0 || splat || components == size as usize {
                Ok(())
            } else {
                Err(Error::WrongComponentCount {
                    expr,
                    expected: size as usize,
                    found: components,
                })
            }
        }
        Type::Matrix {
            columns,
            rows,
            scalar,
        } => {
            if let [Type::Matrix {
                columns: arg_columns,
                rows: arg_rows,
                ..
            }] = *args
            {
                if arg_columns == columns && arg_rows == rows {
                    return Ok(());
                }
            }
            let column = Type::vector(rows, scalar);
            let by_columns = matches!(args.first(), Some(&Type::Vector { .. }));
            for (index, arg) in args.iter().enumerate() {
                let fits = if by_columns {
                    arg.is_abstraction_of(&column)
                } else {
                    arg.is_abstraction_of(&Type::Scalar(scalar))
                };
                if !fits {
                    return Err(invalid(index));
                }
            }
            if by_columns {
                count(columns as usize)
            } else {
                count(columns as usize * rows as usize)
            }
        }
        Type::Array {
            ref base,
            size: Some(size),
        } => {
            if let Some(index) = args.iter().position(|arg| !arg.is_abstraction_of(base)) {
                return Err(invalid(index));
            }
            count(size as usize)
        }
        Type::Struct(ref st) => {
            for (index, (arg, member)) in args.iter().zip(st.members.iter()).enumerate() {
                if !arg.is_abstraction_of(&member.ty) {
                    return Err(invalid(index));
                }
            }
            count(st.members.len())
        }
        Type::Array { size: None, .. }
        | Type::Atomic(_)
        | Type::Pointer { .. }
        | Type::Reference { .. }
        | Type::Texture(_)
        | Type::Sampler { .. } => Err(Error::NotConstructible {
            expr,
            ty: target.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::arena::Arena;
    use crate::types::{StructMember, StructType, VectorSize};

    fn handle() -> Handle<ast::Expression> {
        let mut expressions = Arena::new();
        expressions.append(ast::Expression::Literal(ast::Literal::Bool(true)))
    }

    const ABSTRACT_INT: Type = Type::Scalar(Scalar::AbstractInt);
    const ABSTRACT_FLOAT: Type = Type::Scalar(Scalar::AbstractFloat);

    #[test]
    fn vector_counts() {
        let expr = handle();
        let vec3 = Type::vector(VectorSize::Tri, Scalar::F32);
        let vec2 = Type::vector(VectorSize::Bi, Scalar::F32);
        assert!(check_constructor(expr, &vec3, &[]).is_ok());
        assert!(check_constructor(expr, &vec3, &[ABSTRACT_INT]).is_ok());
        assert!(check_constructor(expr, &vec3, &[vec2.clone(), Type::F32]).is_ok());
        assert!(check_constructor(
            expr,
            &vec3,
            &[Type::vector(VectorSize::Tri, Scalar::I32)]
        )
        .is_ok());
        assert!(matches!(
            check_constructor(expr, &vec3, &[Type::F32, Type::F32]),
            Err(Error::WrongComponentCount {
                expected: 3,
                found: 2,
                ..
            })
        ));
        assert!(matches!(
            check_constructor(expr, &vec3, &[Type::F32, Type::I32, Type::F32]),
            Err(Error::InvalidConstructorArgument { index: 1, .. })
        ));
    }

    #[test]
    fn matrix_arguments() {
        let expr = handle();
        let mat = Type::Matrix {
            columns: VectorSize::Bi,
            rows: VectorSize::Bi,
            scalar: Scalar::F32,
        };
        let column = Type::vector(VectorSize::Bi, Scalar::AbstractFloat);
        assert!(check_constructor(expr, &mat, &[column.clone(), column.clone()]).is_ok());
        assert!(check_constructor(expr, &mat, &vec![ABSTRACT_FLOAT; 4]).is_ok());
        assert!(matches!(
            check_constructor(expr, &mat, &[column]),
            Err(Error::WrongComponentCount { expected: 2, .. })
        ));
    }

    #[test]
    fn arrays_and_structs() {
        let expr = handle();
        let array = Type::array(Type::U32, Some(2));
        assert!(check_constructor(expr, &array, &[ABSTRACT_INT, Type::U32]).is_ok());
        assert!(matches!(
            check_constructor(expr, &array, &[Type::I32, Type::U32]),
            Err(Error::InvalidConstructorArgument { index: 0, .. })
        ));
        assert!(matches!(
            check_constructor(expr, &Type::array(Type::U32, None), &[]),
            Err(Error::NotConstructible { .. })
        ));

        let st = Type::Struct(Arc::new(StructType {
            name: "S".to_string(),
            members: vec![
                StructMember {
                    name: "a".to_string(),
                    ty: Type::I32,
                    align: None,
                    size: None,
                },
                StructMember {
                    name: "b".to_string(),
                    ty: Type::F32,
                    align: None,
                    size: None,
                },
            ],
        }));
        assert!(check_constructor(expr, &st, &[ABSTRACT_INT, ABSTRACT_INT]).is_ok());
        assert!(matches!(
            check_constructor(expr, &st, &[Type::I32]),
            Err(Error::WrongComponentCount {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn inference() {
        let expr = handle();
        assert_eq!(
            infer_scalar(expr, &[ABSTRACT_INT, ABSTRACT_FLOAT]).unwrap(),
            Some(Scalar::AbstractFloat)
        );
        assert!(matches!(
            infer_scalar(expr, &[Type::I32, Type::U32]),
            Err(Error::InvalidConstructorArgument { index: 1, .. })
        ));
        assert_eq!(
            infer_element(expr, &[ABSTRACT_INT, Type::I32]).unwrap(),
            Type::I32
        );
        assert!(matches!(
            infer_element(expr, &[]),
            Err(Error::CannotInferElementType { .. })
        ));
    }
}
