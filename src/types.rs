/*! The type algebra of the shading language.

[`Type`] covers every type an expression, assignable expression or
declaration can have, including WGSL's reference types, which never appear
in source but are how variables and their sub-locations are typed.

Abstract numeric types (`AbstractInt`, `AbstractFloat` and composites built
from them) only exist until a declaration fixes them: see
[`Type::is_abstraction_of`] and [`Type::concretize`].
*/

use std::sync::Arc;

#[cfg(feature = "deserialize")]
use serde::Deserialize;
#[cfg(feature = "serialize")]
use serde::Serialize;

/// A scalar type.
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum Scalar {
    Bool,
    /// The type of integer literals without a suffix.
    AbstractInt,
    I32,
    U32,
    /// The type of float literals without a suffix.
    AbstractFloat,
    F16,
    F32,
}

impl Scalar {
    pub const fn is_abstract(self) -> bool {
        matches!(self, Self::AbstractInt | Self::AbstractFloat)
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::AbstractFloat | Self::F16 | Self::F32)
    }

    pub const fn is_integer(self) -> bool {
        matches!(self, Self::AbstractInt | Self::I32 | Self::U32)
    }

    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Bool)
    }

    /// Whether the scalar can hold negative values.
    pub const fn is_signed(self) -> bool {
        !matches!(self, Self::Bool | Self::U32)
    }

    /// Width in bits of a concrete scalar; abstract scalars have no width.
    pub const fn bits(self) -> Option<u32> {
        match self {
            Self::I32 | Self::U32 | Self::F32 | Self::Bool => Some(32),
            Self::F16 => Some(16),
            Self::AbstractInt | Self::AbstractFloat => None,
        }
    }

    /// Whether values of `self` can be used where `other` is expected.
    ///
    /// Reflexive, and not symmetric: `AbstractInt` abstracts every numeric
    /// scalar, `AbstractFloat` abstracts the concrete float types.
    pub const fn is_abstraction_of(self, other: Self) -> bool {
        match (self, other) {
            (Self::AbstractInt, Self::AbstractInt)
            | (Self::AbstractInt, Self::I32)
            | (Self::AbstractInt, Self::U32)
            | (Self::AbstractInt, Self::AbstractFloat)
            | (Self::AbstractInt, Self::F32)
            | (Self::AbstractInt, Self::F16)
            | (Self::AbstractFloat, Self::AbstractFloat)
            | (Self::AbstractFloat, Self::F32)
            | (Self::AbstractFloat, Self::F16)
            | (Self::Bool, Self::Bool)
            | (Self::I32, Self::I32)
            | (Self::U32, Self::U32)
            | (Self::F16, Self::F16)
            | (Self::F32, Self::F32) => true,
            _ => false,
        }
    }

    pub const fn concretize(self) -> Self {
        match self {
            Self::AbstractInt => Self::I32,
            Self::AbstractFloat => Self::F32,
            Self::Bool | Self::I32 | Self::U32 | Self::F16 | Self::F32 => self,
        }
    }
}

/// Number of components in a vector, or of columns/rows in a matrix.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum VectorSize {
    /// 2D vector
    Bi = 2,
    /// 3D vector
    Tri = 3,
    /// 4D vector
    Quad = 4,
}

impl VectorSize {
    pub const fn from_u32(size: u32) -> Option<Self> {
        match size {
            2 => Some(Self::Bi),
            3 => Some(Self::Tri),
            4 => Some(Self::Quad),
            _ => None,
        }
    }
}

/// Memory region a variable lives in.
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum AddressSpace {
    /// Function locals.
    Function,
    /// Private data, per invocation, mutable.
    Private,
    /// Workgroup shared data, mutable.
    Workgroup,
    /// Uniform buffer data.
    Uniform,
    /// Storage buffer data, potentially mutable.
    Storage,
    /// Opaque handles, such as samplers and textures.
    ///
    /// Never written in source.
    Handle,
}

impl AddressSpace {
    /// Access mode of a reference into this space when none is written.
    pub const fn default_access(self) -> AccessMode {
        match self {
            Self::Function | Self::Private | Self::Workgroup => AccessMode::ReadWrite,
            Self::Uniform | Self::Storage | Self::Handle => AccessMode::Read,
        }
    }
}

/// Permission associated with a reference, pointer or storage texture.
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum AccessMode {
    Read,
    Write,
    ReadWrite,
}

impl AccessMode {
    pub const fn can_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    pub const fn can_write(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum TextureDimension {
    D1,
    D2,
    D3,
    Cube,
}

/// Texel format of a storage texture.
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum TexelFormat {
    Rgba8Unorm,
    Rgba8Snorm,
    Rgba8Uint,
    Rgba8Sint,
    Rgba16Uint,
    Rgba16Sint,
    Rgba16Float,
    R32Uint,
    R32Sint,
    R32Float,
    Rg32Uint,
    Rg32Sint,
    Rg32Float,
    Rgba32Uint,
    Rgba32Sint,
    Rgba32Float,
    Bgra8Unorm,
}

impl TexelFormat {
    /// The scalar type of each channel as seen by the shader.
    pub const fn channel_type(self) -> Scalar {
        match self {
            Self::Rgba8Uint
            | Self::Rgba16Uint
            | Self::R32Uint
            | Self::Rg32Uint
            | Self::Rgba32Uint => Scalar::U32,
            Self::Rgba8Sint
            | Self::Rgba16Sint
            | Self::R32Sint
            | Self::Rg32Sint
            | Self::Rgba32Sint => Scalar::I32,
            Self::Rgba8Unorm
            | Self::Rgba8Snorm
            | Self::Rgba16Float
            | Self::R32Float
            | Self::Rg32Float
            | Self::Rgba32Float
            | Self::Bgra8Unorm => Scalar::F32,
        }
    }
}

/// The texture type families.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum TextureKind {
    /// `texture_2d<f32>`, `texture_cube_array<i32>`, ...
    Sampled {
        dim: TextureDimension,
        arrayed: bool,
        sample_type: Scalar,
    },
    /// `texture_multisampled_2d<T>`
    Multisampled { sample_type: Scalar },
    /// `texture_external`
    External,
    /// `texture_storage_2d<rgba8unorm, write>`, ...
    Storage {
        dim: TextureDimension,
        arrayed: bool,
        format: TexelFormat,
        access: AccessMode,
    },
    /// `texture_depth_2d`, `texture_depth_cube_array`, ...
    Depth { dim: TextureDimension, arrayed: bool },
    /// `texture_depth_multisampled_2d`
    DepthMultisampled,
}

impl TextureKind {
    pub const fn dimension(self) -> TextureDimension {
        match self {
            Self::Sampled { dim, .. } | Self::Storage { dim, .. } | Self::Depth { dim, .. } => dim,
            Self::Multisampled { .. } | Self::External | Self::DepthMultisampled => {
                TextureDimension::D2
            }
        }
    }

    pub const fn is_arrayed(self) -> bool {
        match self {
            Self::Sampled { arrayed, .. }
            | Self::Storage { arrayed, .. }
            | Self::Depth { arrayed, .. } => arrayed,
            Self::Multisampled { .. } | Self::External | Self::DepthMultisampled => false,
        }
    }

    pub const fn is_multisampled(self) -> bool {
        matches!(self, Self::Multisampled { .. } | Self::DepthMultisampled)
    }

    pub const fn is_depth(self) -> bool {
        matches!(self, Self::Depth { .. } | Self::DepthMultisampled)
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub struct StructMember {
    pub name: String,
    pub ty: Type,
    /// Alignment requested with `@align`, in bytes.
    pub align: Option<u32>,
    /// Size requested with `@size`, in bytes.
    pub size: Option<u32>,
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub struct StructType {
    pub name: String,
    pub members: Vec<StructMember>,
}

impl StructType {
    pub fn member(&self, name: &str) -> Option<&StructMember> {
        self.members.iter().find(|member| member.name == name)
    }
}

/// A resolved type.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize))]
#[cfg_attr(feature = "deserialize", derive(Deserialize))]
pub enum Type {
    Scalar(Scalar),
    Vector {
        size: VectorSize,
        scalar: Scalar,
    },
    /// Always has a float element type.
    Matrix {
        columns: VectorSize,
        rows: VectorSize,
        scalar: Scalar,
    },
    /// `size` is `None` for runtime-sized arrays.
    Array {
        base: Box<Type>,
        size: Option<u32>,
    },
    Struct(Arc<StructType>),
    /// `scalar` is always `I32` or `U32`.
    Atomic(Scalar),
    Pointer {
        base: Box<Type>,
        space: AddressSpace,
        access: AccessMode,
    },
    /// The type of a memory location, such as a variable.
    Reference {
        base: Box<Type>,
        space: AddressSpace,
        access: AccessMode,
    },
    Texture(TextureKind),
    Sampler {
        comparison: bool,
    },
}

impl Type {
    pub const BOOL: Self = Self::Scalar(Scalar::Bool);
    pub const I32: Self = Self::Scalar(Scalar::I32);
    pub const U32: Self = Self::Scalar(Scalar::U32);
    pub const F32: Self = Self::Scalar(Scalar::F32);

    pub const fn vector(size: VectorSize, scalar: Scalar) -> Self {
        Self::Vector { size, scalar }
    }

    pub fn array(base: Type, size: Option<u32>) -> Self {
        Self::Array {
            base: Box::new(base),
            size,
        }
    }

    pub fn reference(base: Type, space: AddressSpace, access: AccessMode) -> Self {
        Self::Reference {
            base: Box::new(base),
            space,
            access,
        }
    }

    pub fn pointer(base: Type, space: AddressSpace, access: AccessMode) -> Self {
        Self::Pointer {
            base: Box::new(base),
            space,
            access,
        }
    }

    /// Apply the load rule: a reference yields the type it stores, anything
    /// else is already a value.
    pub fn store_type(&self) -> &Type {
        match *self {
            Self::Reference { ref base, .. } => base,
            _ => self,
        }
    }

    /// The scalar a scalar, vector or matrix is built from.
    pub const fn scalar(&self) -> Option<Scalar> {
        match *self {
            Self::Scalar(scalar) | Self::Vector { scalar, .. } | Self::Matrix { scalar, .. } => {
                Some(scalar)
            }
            _ => None,
        }
    }

    /// The leaf scalar of a scalar, vector, matrix or (nested) array.
    pub fn leaf_scalar(&self) -> Option<Scalar> {
        match *self {
            Self::Array { ref base, .. } => base.leaf_scalar(),
            _ => self.scalar(),
        }
    }

    /// Rebuild a scalar, vector or matrix around a different scalar.
    pub const fn with_scalar(&self, scalar: Scalar) -> Option<Type> {
        match *self {
            Self::Scalar(_) => Some(Self::Scalar(scalar)),
            Self::Vector { size, .. } => Some(Self::Vector { size, scalar }),
            Self::Matrix { columns, rows, .. } => Some(Self::Matrix {
                columns,
                rows,
                scalar,
            }),
            _ => None,
        }
    }

    pub const fn is_scalar_or_vector(&self) -> bool {
        matches!(*self, Self::Scalar(_) | Self::Vector { .. })
    }

    /// Whether this is a texture or sampler, which live in the handle space.
    pub const fn is_handle(&self) -> bool {
        matches!(*self, Self::Texture(_) | Self::Sampler { .. })
    }

    pub fn is_abstract(&self) -> bool {
        match *self {
            Self::Scalar(scalar) | Self::Vector { scalar, .. } | Self::Matrix { scalar, .. } => {
                scalar.is_abstract()
            }
            Self::Array { ref base, .. } => base.is_abstract(),
            Self::Struct(_)
            | Self::Atomic(_)
            | Self::Pointer { .. }
            | Self::Reference { .. }
            | Self::Texture(_)
            | Self::Sampler { .. } => false,
        }
    }

    /// Whether a value of type `self` may be used where `other` is expected.
    ///
    /// Composites relate when their shapes match exactly and their element
    /// types relate. A reference defers to the type it stores, on either side.
    pub fn is_abstraction_of(&self, other: &Type) -> bool {
        match (self, other) {
            (&Self::Reference { ref base, .. }, _) => base.is_abstraction_of(other),
            (_, &Self::Reference { ref base, .. }) => self.is_abstraction_of(base),
            (&Self::Scalar(a), &Self::Scalar(b)) => a.is_abstraction_of(b),
            (
                &Self::Vector { size, scalar: a },
                &Self::Vector {
                    size: other_size,
                    scalar: b,
                },
            ) => size == other_size && a.is_abstraction_of(b),
            (
                &Self::Matrix {
                    columns,
                    rows,
                    scalar: a,
                },
                &Self::Matrix {
                    columns: other_columns,
                    rows: other_rows,
                    scalar: b,
                },
            ) => columns == other_columns && rows == other_rows && a.is_abstraction_of(b),
            (
                &Self::Array { ref base, size },
                &Self::Array {
                    base: ref other_base,
                    size: other_size,
                },
            ) => size == other_size && base.is_abstraction_of(other_base),
            _ => self == other,
        }
    }

    /// Replace abstract scalars with their default concrete types,
    /// recursively through vectors, matrices and arrays.
    pub fn concretize(&self) -> Type {
        match *self {
            Self::Scalar(scalar) => Self::Scalar(scalar.concretize()),
            Self::Vector { size, scalar } => Self::Vector {
                size,
                scalar: scalar.concretize(),
            },
            Self::Matrix {
                columns,
                rows,
                scalar,
            } => Self::Matrix {
                columns,
                rows,
                scalar: scalar.concretize(),
            },
            Self::Array { ref base, size } => Self::Array {
                base: Box::new(base.concretize()),
                size,
            },
            Self::Struct(_)
            | Self::Atomic(_)
            | Self::Pointer { .. }
            | Self::Reference { .. }
            | Self::Texture(_)
            | Self::Sampler { .. } => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_abstraction_is_not_symmetric() {
        assert!(Scalar::AbstractInt.is_abstraction_of(Scalar::U32));
        assert!(Scalar::AbstractInt.is_abstraction_of(Scalar::AbstractFloat));
        assert!(!Scalar::AbstractFloat.is_abstraction_of(Scalar::AbstractInt));
        assert!(Scalar::AbstractFloat.is_abstraction_of(Scalar::F16));
        assert!(!Scalar::AbstractFloat.is_abstraction_of(Scalar::I32));
        assert!(!Scalar::I32.is_abstraction_of(Scalar::U32));
        assert!(Scalar::F32.is_abstraction_of(Scalar::F32));
    }

    #[test]
    fn composite_abstraction_needs_matching_shapes() {
        let abstract_vec = Type::vector(VectorSize::Tri, Scalar::AbstractInt);
        assert!(abstract_vec.is_abstraction_of(&Type::vector(VectorSize::Tri, Scalar::F32)));
        assert!(!abstract_vec.is_abstraction_of(&Type::vector(VectorSize::Quad, Scalar::F32)));

        let abstract_array = Type::array(Type::Scalar(Scalar::AbstractFloat), Some(4));
        assert!(abstract_array.is_abstraction_of(&Type::array(Type::F32, Some(4))));
        assert!(!abstract_array.is_abstraction_of(&Type::array(Type::F32, Some(5))));
        assert!(!abstract_array.is_abstraction_of(&Type::array(Type::I32, Some(4))));
    }

    #[test]
    fn reference_defers_to_store_type() {
        let reference = Type::reference(Type::I32, AddressSpace::Private, AccessMode::ReadWrite);
        assert!(reference.is_abstraction_of(&Type::I32));
        assert!(Type::Scalar(Scalar::AbstractInt).is_abstraction_of(&reference));
        assert_eq!(reference.store_type(), &Type::I32);
    }

    #[test]
    fn concretize_recurses_through_containers() {
        let ty = Type::array(
            Type::Matrix {
                columns: VectorSize::Bi,
                rows: VectorSize::Tri,
                scalar: Scalar::AbstractFloat,
            },
            Some(2),
        );
        assert!(ty.is_abstract());
        let concrete = ty.concretize();
        assert!(!concrete.is_abstract());
        assert_eq!(
            concrete,
            Type::array(
                Type::Matrix {
                    columns: VectorSize::Bi,
                    rows: VectorSize::Tri,
                    scalar: Scalar::F32,
                },
                Some(2),
            )
        );
        assert_eq!(
            Type::vector(VectorSize::Bi, Scalar::AbstractInt).concretize(),
            Type::vector(VectorSize::Bi, Scalar::I32)
        );
        let pointer = Type::pointer(Type::I32, AddressSpace::Function, AccessMode::ReadWrite);
        assert_eq!(pointer.concretize(), pointer);
    }
}
