use std::{num::NonZeroU32, ops};

use crate::types::{Scalar, StructType, Type};

pub type Alignment = NonZeroU32;

/// Size and alignment information for a type.
///
/// `size` is the space the type reserves when followed by another value:
/// its natural size rounded up to its alignment. A `vec3<f32>` therefore
/// reserves 16 bytes, like an array element would.
#[derive(Clone, Copy, Debug, Hash, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "deserialize", derive(serde::Deserialize))]
pub struct TypeLayout {
    pub size: u32,
    pub alignment: Alignment,
    /// Bytes actually covered by scalars, counted from the start of the
    /// value. Trailing padding is not part of the extent.
    pub extent: u32,
}

impl TypeLayout {
    /// Produce the stride as if this type is a base of an array.
    ///
    /// `size` is already a multiple of the alignment.
    pub const fn to_stride(&self) -> u32 {
        self.size
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("type `{0}` has no host-shareable memory layout")]
    NotHostShareable(Type),
    #[error("runtime-sized array `{0}` has no fixed size")]
    RuntimeSizedArray(Type),
    #[error("alignment {align} of member `{member}` of `{ty}` is not a power of two")]
    InvalidAlignment {
        ty: String,
        member: String,
        align: u32,
    },
    #[error("size {size} of member `{member}` of `{ty}` is smaller than its type needs")]
    InvalidSize {
        ty: String,
        member: String,
        size: u32,
    },
    #[error("type `{0}` is too large")]
    Overflow(Type),
    #[error("member `{member}` of `{ty}` ends past the largest offset")]
    MemberOverflow { ty: String, member: String },
}

/// Round `offset` up to the nearest `alignment` boundary, or `None` if that
/// does not fit in a `u32`.
pub const fn round_up(alignment: Alignment, offset: u32) -> Option<u32> {
    match offset & (alignment.get() - 1) {
        0 => Some(offset),
        other => offset.checked_add(alignment.get() - other),
    }
}

const fn alignment(value: u32) -> Alignment {
    match Alignment::new(value) {
        Some(alignment) => alignment,
        None => Alignment::MIN,
    }
}

const fn scalar_size(scalar: Scalar) -> Option<u32> {
    match scalar {
        Scalar::F16 => Some(2),
        Scalar::Bool | Scalar::I32 | Scalar::U32 | Scalar::F32 => Some(4),
        Scalar::AbstractInt | Scalar::AbstractFloat => None,
    }
}

/// Alignment of `ty` in bytes.
///
/// A two-component vector aligns to twice its scalar, wider vectors to four
/// times it. Matrices align like their column vectors, arrays like their
/// elements, structs like their most aligned member (after `@align`).
pub fn align_of(ty: &Type) -> Result<Alignment, LayoutError> {
    Ok(match *ty {
        Type::Scalar(scalar) | Type::Atomic(scalar) => match scalar_size(scalar) {
            Some(size) => alignment(size),
            None => return Err(LayoutError::NotHostShareable(ty.clone())),
        },
        Type::Vector { size, scalar }
        | Type::Matrix {
            rows: size,
            scalar,
            ..
        } => {
            let width = scalar_size(scalar)
                .ok_or_else(|| LayoutError::NotHostShareable(ty.clone()))?;
            let count = if size >= crate::types::VectorSize::Tri {
                4
            } else {
                2
            };
            alignment(count * width)
        }
        Type::Array { ref base, .. } => align_of(base)?,
        Type::Struct(ref st) => {
            let mut max = Alignment::MIN;
            for member in st.members.iter() {
                max = max.max(member_alignment(st, member)?);
            }
            max
        }
        Type::Pointer { .. }
        | Type::Reference { .. }
        | Type::Texture(_)
        | Type::Sampler { .. } => return Err(LayoutError::NotHostShareable(ty.clone())),
    })
}

fn member_alignment(
    st: &StructType,
    member: &crate::types::StructMember,
) -> Result<Alignment, LayoutError> {
    match member.align {
        Some(align) if align.is_power_of_two() => Ok(alignment(align)),
        Some(align) => Err(LayoutError::InvalidAlignment {
            ty: st.name.clone(),
            member: member.name.clone(),
            align,
        }),
        None => align_of(&member.ty),
    }
}

/// Compute the layout of a fixed-footprint type.
pub fn layout_of(ty: &Type) -> Result<TypeLayout, LayoutError> {
    let overflow = || LayoutError::Overflow(ty.clone());
    let alignment = align_of(ty)?;
    let (natural, extent) = match *ty {
        Type::Scalar(scalar) | Type::Atomic(scalar) => {
            let size = scalar_size(scalar).ok_or_else(overflow)?;
            (size, size)
        }
        Type::Vector { size, scalar } => {
            let size = size as u32 * scalar_size(scalar).ok_or_else(overflow)?;
            (size, size)
        }
        Type::Matrix {
            columns,
            rows,
            scalar,
        } => {
            let column = layout_of(&Type::Vector { size: rows, scalar })?;
            let extent = (columns as u32 - 1) * column.to_stride() + column.extent;
            (columns as u32 * column.to_stride(), extent)
        }
        Type::Array {
            ref base,
            size: Some(count),
        } => {
            let element = layout_of(base)?;
            let stride = element.to_stride();
            let natural = stride.checked_mul(count).ok_or_else(overflow)?;
            let extent = match count {
                0 => 0,
                _ => (count - 1) * stride + element.extent,
            };
            (natural, extent)
        }
        Type::Array { size: None, .. } => {
            return Err(LayoutError::RuntimeSizedArray(ty.clone()))
        }
        Type::Struct(ref st) => {
            let mut offset = 0;
            let mut extent = 0;
            for (member, placement) in st.members.iter().zip(struct_placements(st)?) {
                let member_layout = layout_of(&member.ty)?;
                offset = placement.end;
                extent = placement.start + member_layout.extent.min(placement.end - placement.start);
            }
            (offset, extent)
        }
        Type::Pointer { .. }
        | Type::Reference { .. }
        | Type::Texture(_)
        | Type::Sampler { .. } => return Err(LayoutError::NotHostShareable(ty.clone())),
    };

    Ok(TypeLayout {
        size: round_up(alignment, natural).ok_or_else(overflow)?,
        alignment,
        extent,
    })
}

/// Return the offset ranges of every member of `st`, in declaration order.
///
/// Each member starts at the first offset after the previous member that
/// satisfies its alignment, and spans its `@size` or its layout size.
pub fn struct_placements(st: &StructType) -> Result<Vec<ops::Range<u32>>, LayoutError> {
    let mut placements = Vec::with_capacity(st.members.len());
    let mut offset = 0;
    for member in st.members.iter() {
        let layout = layout_of(&member.ty)?;
        let alignment = member_alignment(st, member)?;
        let overflow = || LayoutError::MemberOverflow {
            ty: st.name.clone(),
            member: member.name.clone(),
        };
        let start = round_up(alignment, offset).ok_or_else(overflow)?;
        let span = match member.size {
            Some(size) if size >= layout.extent => size,
            Some(size) => {
                return Err(LayoutError::InvalidSize {
                    ty: st.name.clone(),
                    member: member.name.clone(),
                    size,
                })
            }
            None => layout.size,
        };
        let end = start.checked_add(span).ok_or_else(overflow)?;
        placements.push(start..end);
        offset = end;
    }
    Ok(placements)
}
