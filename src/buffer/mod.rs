/*!
Conversion between raw buffer contents and literal expression trees.

Values are laid out by the host-shareable memory layout rules implemented
in [`proc::layout_of`](crate::proc::layout_of): scalars take four
little-endian bytes, vectors and matrices are aligned to 8 or 16 bytes, and
array elements and struct members follow each other in order, each at its
own alignment.

The byte sequence of a value ends with its last scalar. Decoding accepts
longer buffers and ignores what follows; encoding never writes trailing
padding.

Only 32-bit scalars are supported. `bool` has no host-shareable
representation and `f16` takes two bytes, so both are rejected.
*/

mod decode;
mod encode;

use crate::arena::Handle;
use crate::ast;
use crate::proc::{self, LayoutError};
use crate::resolve::ResolvedEnvironment;
use crate::types::{Scalar, Type};
use crate::ResourceBinding;

pub use decode::decode;
pub use encode::encode;

#[cfg(feature = "deserialize")]
use serde::Deserialize;
#[cfg(feature = "serialize")]
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("type `{0}` cannot be stored in a buffer")]
    UnsupportedType(Type),
    #[error("runtime-sized array `{0}` has no fixed size")]
    UnsizedArray(Type),
    #[error("buffer holds {found} bytes, but {needed} are needed")]
    BufferTooShort { needed: usize, found: usize },
    #[error("expression {expr:?} is not a literal value of type `{ty}`")]
    UnexpectedExpression {
        expr: Handle<ast::Expression>,
        ty: Type,
    },
    #[error("no variable is bound to @group({}) @binding({})", .0.group, .0.binding)]
    UnknownBinding(ResourceBinding),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Contents of one bound buffer, as listed in a job file.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub struct UniformBuffer {
    pub group: u32,
    pub binding: u32,
    pub data: Vec<u8>,
}

/// A buffer decoded into the value of the variable it is bound to.
#[derive(Clone, Debug)]
pub struct DecodedBuffer {
    pub binding: ResourceBinding,
    /// Name of the module-scope variable.
    pub name: String,
    pub value: Handle<ast::Expression>,
}

/// Size of `ty`'s byte sequence: the offset just past its last scalar.
pub fn byte_size(ty: &Type) -> Result<usize, CodecError> {
    check(ty)?;
    Ok(proc::layout_of(ty)?.extent as usize)
}

/// Decode every buffer into the value of the variable bound to it, in the
/// order given.
pub fn decode_uniform_buffers(
    env: &ResolvedEnvironment,
    tu: &mut ast::TranslationUnit,
    buffers: &[UniformBuffer],
) -> Result<Vec<DecodedBuffer>, CodecError> {
    buffers
        .iter()
        .map(|buffer| {
            let binding = ResourceBinding {
                group: buffer.group,
                binding: buffer.binding,
            };
            let (name, ty) = env
                .binding(binding)
                .ok_or(CodecError::UnknownBinding(binding))?;
            log::debug!(
                "Decoding {} bytes for `{}` at {:?}",
                buffer.data.len(),
                name,
                binding
            );
            let value = decode(&buffer.data, ty, tu)?;
            Ok(DecodedBuffer {
                binding,
                name: name.to_string(),
                value,
            })
        })
        .collect()
}

/// Reject types the codec has no encoding for.
fn check(ty: &Type) -> Result<(), CodecError> {
    match *ty {
        Type::Scalar(scalar) | Type::Vector { scalar, .. } | Type::Matrix { scalar, .. } => {
            match scalar {
                Scalar::I32 | Scalar::U32 | Scalar::F32 => Ok(()),
                _ => Err(CodecError::UnsupportedType(ty.clone())),
            }
        }
        Type::Atomic(_) => Ok(()),
        Type::Array { size: None, .. } => Err(CodecError::UnsizedArray(ty.clone())),
        Type::Array { ref base, .. } => check(base),
        Type::Struct(ref st) => st.members.iter().try_for_each(|member| check(&member.ty)),
        Type::Pointer { .. } | Type::Reference { .. } | Type::Texture(_) | Type::Sampler { .. } => {
            Err(CodecError::UnsupportedType(ty.clone()))
        }
    }
}

/// The pieces of a composite value, with their offsets from its start.
fn components(ty: &Type) -> Result<Vec<(Type, usize)>, CodecError> {
    let spaced = |element: Type, count: usize| -> Result<Vec<(Type, usize)>, CodecError> {
        let stride = proc::layout_of(&element)?.to_stride() as usize;
        Ok((0..count).map(|i| (element.clone(), i * stride)).collect())
    };
    match *ty {
        Type::Vector { size, scalar } => spaced(Type::Scalar(scalar), size as usize),
        Type::Matrix {
            columns,
            rows,
            scalar,
        } => spaced(Type::vector(rows, scalar), columns as usize),
        Type::Array {
            ref base,
            size: Some(count),
        } => spaced((**base).clone(), count as usize),
        Type::Struct(ref st) => Ok(st
            .members
            .iter()
            .zip(proc::struct_placements(st)?)
            .map(|(member, placement)| (member.ty.clone(), placement.start as usize))
            .collect()),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::{StructMember, StructType, VectorSize};

    #[test]
    fn sizes() {
        assert_eq!(byte_size(&Type::F32).unwrap(), 4);
        let vec3 = Type::vector(VectorSize::Tri, Scalar::F32);
        assert_eq!(byte_size(&vec3).unwrap(), 12);
        assert_eq!(byte_size(&Type::array(vec3, Some(2))).unwrap(), 28);
        let st = Type::Struct(Arc::new(StructType {
            name: "S".to_string(),
            members: vec![
                StructMember {
                    name: "a".to_string(),
                    ty: Type::vector(VectorSize::Tri, Scalar::F32),
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
        assert_eq!(byte_size(&st).unwrap(), 20);
    }

    #[test]
    fn unsupported() {
        assert_eq!(
            byte_size(&Type::BOOL),
            Err(CodecError::UnsupportedType(Type::BOOL))
        );
        let half = Type::Scalar(Scalar::F16);
        assert_eq!(byte_size(&half), Err(CodecError::UnsupportedType(half)));
        let unsized_array = Type::array(Type::U32, None);
        assert_eq!(
            byte_size(&unsized_array),
            Err(CodecError::UnsizedArray(unsized_array))
        );
    }
}
