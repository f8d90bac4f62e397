use std::convert::TryFrom;

use super::{check, components, CodecError};
use crate::arena::Handle;
use crate::ast;
use crate::proc;
use crate::types::{Scalar, Type};

/// Decode the value of type `ty` stored at the start of `bytes`, appending
/// its literal expression tree to `tu`.
///
/// Vectors, matrices and arrays become constructors naming their element
/// types explicitly; structs become calls to the struct's name.
pub fn decode(
    bytes: &[u8],
    ty: &Type,
    tu: &mut ast::TranslationUnit,
) -> Result<Handle<ast::Expression>, CodecError> {
    check(ty)?;
    let needed = proc::layout_of(ty)?.extent as usize;
    if bytes.len() < needed {
        return Err(CodecError::BufferTooShort {
            needed,
            found: bytes.len(),
        });
    }
    Decoder { bytes, tu }.value(ty, 0)
}

struct Decoder<'a> {
    bytes: &'a [u8],
    tu: &'a mut ast::TranslationUnit,
}

impl Decoder<'_> {
    fn word(&self, offset: usize) -> Result<[u8; 4], CodecError> {
        self.bytes
            .get(offset..offset + 4)
            .and_then(|word| <[u8; 4]>::try_from(word).ok())
            .ok_or(CodecError::BufferTooShort {
                needed: offset + 4,
                found: self.bytes.len(),
            })
    }

    fn value(&mut self, ty: &Type, offset: usize) -> Result<Handle<ast::Expression>, CodecError> {
        let expression = match *ty {
            Type::Scalar(scalar) | Type::Atomic(scalar) => {
                let word = self.word(offset)?;
                let literal = match scalar {
                    Scalar::I32 => ast::Literal::I32(i32::from_le_bytes(word)),
                    Scalar::U32 => ast::Literal::U32(u32::from_le_bytes(word)),
                    Scalar::F32 => ast::Literal::F32(f32::from_le_bytes(word)),
                    _ => return Err(CodecError::UnsupportedType(ty.clone())),
                };
                log::trace!("Decoded {:?} at offset {}", literal, offset);
                ast::Expression::Literal(literal)
            }
            Type::Vector { size, scalar } => {
                let component = Some(self.type_decl(&Type::Scalar(scalar))?);
                ast::Expression::Construct {
                    ty: ast::ConstructorType::Vector { size, component },
                    args: self.elements(ty, offset)?,
                }
            }
            Type::Matrix {
                columns,
                rows,
                scalar,
            } => {
                let component = Some(self.type_decl(&Type::Scalar(scalar))?);
                ast::Expression::Construct {
                    ty: ast::ConstructorType::Matrix {
                        columns,
                        rows,
                        component,
                    },
                    args: self.elements(ty, offset)?,
                }
            }
            Type::Array {
                ref base,
                size: Some(count),
            } => {
                let base = Some(self.type_decl(base)?);
                let size = Some(
                    self.tu
                        .append_expression(ast::Expression::Literal(ast::Literal::AbstractInt(
                            i64::from(count),
                        ))),
                );
                ast::Expression::Construct {
                    ty: ast::ConstructorType::Array { base, size },
                    args: self.elements(ty, offset)?,
                }
            }
            Type::Struct(ref st) => ast::Expression::Call {
                callee: st.name.clone(),
                template: None,
                args: self.elements(ty, offset)?,
            },
            Type::Array { size: None, .. } => return Err(CodecError::UnsizedArray(ty.clone())),
            Type::Pointer { .. } | Type::Reference { .. } | Type::Texture(_) | Type::Sampler { .. } => {
                return Err(CodecError::UnsupportedType(ty.clone()))
            }
        };
        Ok(self.tu.append_expression(expression))
    }

    fn elements(
        &mut self,
        ty: &Type,
        offset: usize,
    ) -> Result<Vec<Handle<ast::Expression>>, CodecError> {
        components(ty)?
            .into_iter()
            .map(|(element, start)| self.value(&element, offset + start))
            .collect()
    }

    /// Spell out `ty` as a type annotation.
    fn type_decl(&mut self, ty: &Type) -> Result<Handle<ast::TypeDecl>, CodecError> {
        let decl = match *ty {
            Type::Scalar(scalar) => ast::TypeDecl::Scalar(scalar),
            Type::Vector { size, scalar } => ast::TypeDecl::Vector {
                size,
                component: self.type_decl(&Type::Scalar(scalar))?,
            },
            Type::Matrix {
                columns,
                rows,
                scalar,
            } => ast::TypeDecl::Matrix {
                columns,
                rows,
                component: self.type_decl(&Type::Scalar(scalar))?,
            },
            Type::Array { ref base, size } => {
                let base = self.type_decl(base)?;
                let size = size.map(|count| {
                    self.tu
                        .append_expression(ast::Expression::Literal(ast::Literal::AbstractInt(
                            i64::from(count),
                        )))
                });
                ast::TypeDecl::Array { base, size }
            }
            Type::Atomic(scalar) => ast::TypeDecl::Atomic(self.type_decl(&Type::Scalar(scalar))?),
            Type::Struct(ref st) => ast::TypeDecl::Named(st.name.clone()),
            Type::Pointer { .. } | Type::Reference { .. } | Type::Texture(_) | Type::Sampler { .. } => {
                return Err(CodecError::UnsupportedType(ty.clone()))
            }
        };
        Ok(self.tu.append_type(decl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VectorSize;

    #[test]
    fn scalars_are_little_endian() {
        let mut tu = ast::TranslationUnit::new();
        let expr = decode(&[0xff, 0xff, 0xff, 0xff], &Type::I32, &mut tu).unwrap();
        assert!(matches!(
            tu.expressions[expr],
            ast::Expression::Literal(ast::Literal::I32(-1))
        ));
        let expr = decode(&[0, 0, 128, 63], &Type::F32, &mut tu).unwrap();
        assert!(matches!(
            tu.expressions[expr],
            ast::Expression::Literal(ast::Literal::F32(value)) if value == 1.0
        ));
        let expr = decode(&[1, 1, 0, 0], &Type::Atomic(Scalar::U32), &mut tu).unwrap();
        assert!(matches!(
            tu.expressions[expr],
            ast::Expression::Literal(ast::Literal::U32(257))
        ));
    }

    #[test]
    fn short_buffer() {
        let mut tu = ast::TranslationUnit::new();
        let vec2 = Type::vector(VectorSize::Bi, Scalar::U32);
        assert_eq!(
            decode(&[0; 6], &vec2, &mut tu),
            Err(CodecError::BufferTooShort {
                needed: 8,
                found: 6
            })
        );
    }

    #[test]
    fn matrix_columns() {
        let mut tu = ast::TranslationUnit::new();
        let mat = Type::Matrix {
            columns: VectorSize::Bi,
            rows: VectorSize::Tri,
            scalar: Scalar::F32,
        };
        // The second column starts at 16, after the first column's padding.
        let mut bytes = vec![0; 28];
        bytes[16..20].copy_from_slice(&2.5f32.to_le_bytes());
        let expr = decode(&bytes, &mat, &mut tu).unwrap();
        let columns = match tu.expressions[expr] {
            ast::Expression::Construct { ref args, .. } => args.clone(),
            _ => unreachable!(),
        };
        assert_eq!(columns.len(), 2);
        let first = match tu.expressions[columns[1]] {
            ast::Expression::Construct { ref args, .. } => args[0],
            _ => unreachable!(),
        };
        assert!(matches!(
            tu.expressions[first],
            ast::Expression::Literal(ast::Literal::F32(value)) if value == 2.5
        ));
    }
}
