use std::convert::TryFrom;

use super::{check, components, CodecError};
use crate::arena::Handle;
use crate::ast;
use crate::proc;
use crate::types::{Scalar, Type};

/// Encode the literal expression `expr` as a value of type `ty`.
///
/// `expr` must be built from literals and constructors the way
/// [`decode`](super::decode) builds it, though abstract literals, splatted
/// vectors and zero-value constructors are accepted too. Bytes no value
/// covers are left zero.
pub fn encode(
    tu: &ast::TranslationUnit,
    expr: Handle<ast::Expression>,
    ty: &Type,
) -> Result<Vec<u8>, CodecError> {
    check(ty)?;
    let mut encoder = Encoder {
        tu,
        bytes: vec![0; proc::layout_of(ty)?.extent as usize],
    };
    encoder.value(expr, ty, 0)?;
    Ok(encoder.bytes)
}

struct Encoder<'a> {
    tu: &'a ast::TranslationUnit,
    bytes: Vec<u8>,
}

impl Encoder<'_> {
    /// Look through parentheses and value-preserving wrappers.
    fn literal_tree(&self, mut expr: Handle<ast::Expression>) -> Handle<ast::Expression> {
        loop {
            expr = match self.tu.expressions[expr] {
                ast::Expression::Paren(inner) => inner,
                ast::Expression::Augmented(ref augmented) => augmented.wrapped(),
                _ => return expr,
            };
        }
    }

    fn value(
        &mut self,
        expr: Handle<ast::Expression>,
        ty: &Type,
        offset: usize,
    ) -> Result<(), CodecError> {
        let expr = self.literal_tree(expr);
        let tu = self.tu;
        let unexpected = || CodecError::UnexpectedExpression {
            expr,
            ty: ty.clone(),
        };

        match *ty {
            Type::Scalar(scalar) | Type::Atomic(scalar) => {
                let literal = match tu.expressions[expr] {
                    ast::Expression::Literal(literal) => literal,
                    _ => return Err(unexpected()),
                };
                let word = scalar_bytes(literal, scalar).ok_or_else(unexpected)?;
                log::trace!("Encoded {:?} at offset {}", literal, offset);
                self.bytes[offset..offset + 4].copy_from_slice(&word);
                Ok(())
            }
            Type::Vector { scalar, .. } => {
                let args = match tu.expressions[expr] {
                    ast::Expression::Construct {
                        ty: ast::ConstructorType::Vector { .. },
                        ref args,
                    } => args,
                    _ => return Err(unexpected()),
                };
                let elements = components(ty)?;
                match args.len() {
                    0 => Ok(()),
                    // A single scalar fills every component.
                    1 if elements.len() > 1 => {
                        for (_, start) in elements {
                            self.value(args[0], &Type::Scalar(scalar), offset + start)?;
                        }
                        Ok(())
                    }
                    count if count == elements.len() => self.elements(args, elements, offset),
                    _ => Err(unexpected()),
                }
            }
            Type::Matrix { .. } => {
                let args = match tu.expressions[expr] {
                    ast::Expression::Construct {
                        ty: ast::ConstructorType::Matrix { .. },
                        ref args,
                    } => args,
                    _ => return Err(unexpected()),
                };
                let elements = components(ty)?;
                match args.len() {
                    0 => Ok(()),
                    count if count == elements.len() => self.elements(args, elements, offset),
                    _ => {
                        // Column-major scalars.
                        let mut scalars = Vec::with_capacity(args.len());
                        for (column, start) in elements {
                            for (element, inner) in components(&column)? {
                                scalars.push((element, start + inner));
                            }
                        }
                        if args.len() != scalars.len() {
                            return Err(unexpected());
                        }
                        self.elements(args, scalars, offset)
                    }
                }
            }
            Type::Array { .. } => {
                let args = match tu.expressions[expr] {
                    ast::Expression::Construct {
                        ty: ast::ConstructorType::Array { .. },
                        ref args,
                    } => args,
                    _ => return Err(unexpected()),
                };
                let elements = components(ty)?;
                if !args.is_empty() && args.len() != elements.len() {
                    return Err(unexpected());
                }
                self.elements(args, elements, offset)
            }
            Type::Struct(ref st) => {
                let args = match tu.expressions[expr] {
                    ast::Expression::Call {
                        ref callee,
                        template: None,
                        ref args,
                    } if *callee == st.name => args,
                    _ => return Err(unexpected()),
                };
                let elements = components(ty)?;
                if !args.is_empty() && args.len() != elements.len() {
                    return Err(unexpected());
                }
                self.elements(args, elements, offset)
            }
            Type::Pointer { .. } | Type::Reference { .. } | Type::Texture(_) | Type::Sampler { .. } => {
                Err(CodecError::UnsupportedType(ty.clone()))
            }
        }
    }

    fn elements(
        &mut self,
        args: &[Handle<ast::Expression>],
        elements: Vec<(Type, usize)>,
        offset: usize,
    ) -> Result<(), CodecError> {
        for (&arg, (element, start)) in args.iter().zip(elements) {
            self.value(arg, &element, offset + start)?;
        }
        Ok(())
    }
}

/// The four bytes of `literal` converted to `scalar`, if it converts
/// without changing its value's kind.
fn scalar_bytes(literal: ast::Literal, scalar: Scalar) -> Option<[u8; 4]> {
    use ast::Literal as Li;

    Some(match (scalar, literal) {
        (Scalar::I32, Li::I32(value)) => value.to_le_bytes(),
        (Scalar::I32, Li::AbstractInt(value)) => i32::try_from(value).ok()?.to_le_bytes(),
        (Scalar::U32, Li::U32(value)) => value.to_le_bytes(),
        (Scalar::U32, Li::AbstractInt(value)) => u32::try_from(value).ok()?.to_le_bytes(),
        (Scalar::F32, Li::F32(value)) => value.to_le_bytes(),
        (Scalar::F32, Li::AbstractFloat(value)) => (value as f32).to_le_bytes(),
        (Scalar::F32, Li::AbstractInt(value)) => (value as f32).to_le_bytes(),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::decode;
    use crate::types::VectorSize;

    fn literal(tu: &mut ast::TranslationUnit, literal: ast::Literal) -> Handle<ast::Expression> {
        tu.append_expression(ast::Expression::Literal(literal))
    }

    #[test]
    fn abstract_literals() {
        let mut tu = ast::TranslationUnit::new();
        let one = literal(&mut tu, ast::Literal::AbstractInt(1));
        assert_eq!(encode(&tu, one, &Type::U32).unwrap(), vec![1, 0, 0, 0]);
        assert_eq!(
            encode(&tu, one, &Type::F32).unwrap(),
            1.0f32.to_le_bytes().to_vec()
        );
        let negative = literal(&mut tu, ast::Literal::AbstractInt(-1));
        assert!(matches!(
            encode(&tu, negative, &Type::U32),
            Err(CodecError::UnexpectedExpression { .. })
        ));
        let float = literal(&mut tu, ast::Literal::F32(1.0));
        assert!(matches!(
            encode(&tu, float, &Type::I32),
            Err(CodecError::UnexpectedExpression { .. })
        ));
    }

    #[test]
    fn splat_and_zero_vectors() {
        let mut tu = ast::TranslationUnit::new();
        let two = literal(&mut tu, ast::Literal::AbstractInt(2));
        let splat = tu.append_expression(ast::Expression::Construct {
            ty: ast::ConstructorType::Vector {
                size: VectorSize::Tri,
                component: None,
            },
            args: vec![two],
        });
        let vec3 = Type::vector(VectorSize::Tri, Scalar::I32);
        assert_eq!(
            encode(&tu, splat, &vec3).unwrap(),
            vec![2, 0, 0, 0, 2, 0, 0, 0, 2, 0, 0, 0]
        );
        let zero = tu.append_expression(ast::Expression::Construct {
            ty: ast::ConstructorType::Vector {
                size: VectorSize::Tri,
                component: None,
            },
            args: Vec::new(),
        });
        assert_eq!(encode(&tu, zero, &vec3).unwrap(), vec![0; 12]);
    }

    #[test]
    fn matrix_from_scalars() {
        let mut tu = ast::TranslationUnit::new();
        let args = (1..=6)
            .map(|i| literal(&mut tu, ast::Literal::AbstractFloat(f64::from(i))))
            .collect();
        let expr = tu.append_expression(ast::Expression::Construct {
            ty: ast::ConstructorType::Matrix {
                columns: VectorSize::Bi,
                rows: VectorSize::Tri,
                component: None,
            },
            args,
        });
        let mat = Type::Matrix {
            columns: VectorSize::Bi,
            rows: VectorSize::Tri,
            scalar: Scalar::F32,
        };
        let bytes = encode(&tu, expr, &mat).unwrap();
        assert_eq!(bytes.len(), 28);
        assert_eq!(bytes[16..20], 4.0f32.to_le_bytes());
        assert_eq!(bytes[12..16], [0; 4]);
    }

    #[test]
    fn decoded_values_encode_back() {
        let mut tu = ast::TranslationUnit::new();
        let ty = Type::array(Type::vector(VectorSize::Tri, Scalar::U32), Some(2));
        let mut bytes = Vec::new();
        for word in 0u32..7 {
            bytes.extend_from_slice(&(word * 3).to_le_bytes());
        }
        let expr = decode(&bytes, &ty, &mut tu).unwrap();
        let encoded = encode(&tu, expr, &ty).unwrap();
        // The fourth word is padding.
        assert_eq!(encoded[..12], bytes[..12]);
        assert_eq!(encoded[12..16], [0; 4]);
        assert_eq!(encoded[16..], bytes[16..]);
    }
}
