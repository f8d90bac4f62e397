//! Producing the WGSL forms of types, for use in error messages.

use std::fmt;

use crate::types::{
    AccessMode, AddressSpace, Scalar, TexelFormat, TextureDimension, TextureKind, Type,
};

impl Type {
    /// Formats the type as it is written in wgsl.
    ///
    /// For example `vec3<f32>`. Reference types, which cannot be written,
    /// use the notation `ref<space, T, access>`.
    pub fn to_wgsl(&self) -> String {
        match *self {
            Type::Scalar(scalar) => scalar.to_wgsl().to_string(),
            Type::Vector { size, scalar } => {
                format!("vec{}<{}>", size as u32, scalar.to_wgsl())
            }
            Type::Matrix {
                columns,
                rows,
                scalar,
            } => format!(
                "mat{}x{}<{}>",
                columns as u32,
                rows as u32,
                scalar.to_wgsl()
            ),
            Type::Array { ref base, size } => match size {
                Some(size) => format!("array<{}, {}>", base.to_wgsl(), size),
                None => format!("array<{}>", base.to_wgsl()),
            },
            Type::Struct(ref ty) => ty.name.clone(),
            Type::Atomic(scalar) => format!("atomic<{}>", scalar.to_wgsl()),
            Type::Pointer {
                ref base,
                space,
                access,
            } => format!(
                "ptr<{}, {}, {}>",
                space.to_wgsl(),
                base.to_wgsl(),
                access.to_wgsl()
            ),
            Type::Reference {
                ref base,
                space,
                access,
            } => format!(
                "ref<{}, {}, {}>",
                space.to_wgsl(),
                base.to_wgsl(),
                access.to_wgsl()
            ),
            Type::Texture(kind) => kind.to_wgsl(),
            Type::Sampler { comparison: false } => "sampler".to_string(),
            Type::Sampler { comparison: true } => "sampler_comparison".to_string(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wgsl())
    }
}

impl Scalar {
    /// Format a scalar as a type is written in wgsl.
    ///
    /// Abstract scalars cannot be written; they are named the way the
    /// WGSL specification names them.
    pub const fn to_wgsl(self) -> &'static str {
        match self {
            Scalar::Bool => "bool",
            Scalar::AbstractInt => "AbstractInt",
            Scalar::I32 => "i32",
            Scalar::U32 => "u32",
            Scalar::AbstractFloat => "AbstractFloat",
            Scalar::F16 => "f16",
            Scalar::F32 => "f32",
        }
    }
}

impl AddressSpace {
    pub const fn to_wgsl(self) -> &'static str {
        match self {
            AddressSpace::Function => "function",
            AddressSpace::Private => "private",
            AddressSpace::Workgroup => "workgroup",
            AddressSpace::Uniform => "uniform",
            AddressSpace::Storage => "storage",
            AddressSpace::Handle => "handle",
        }
    }
}

impl AccessMode {
    pub const fn to_wgsl(self) -> &'static str {
        match self {
            AccessMode::Read => "read",
            AccessMode::Write => "write",
            AccessMode::ReadWrite => "read_write",
        }
    }
}

impl TexelFormat {
    pub const fn to_wgsl(self) -> &'static str {
        use TexelFormat as Tf;
        match self {
            Tf::Rgba8Unorm => "rgba8unorm",
            Tf::Rgba8Snorm => "rgba8snorm",
            Tf::Rgba8Uint => "rgba8uint",
            Tf::Rgba8Sint => "rgba8sint",
            Tf::Rgba16Uint => "rgba16uint",
            Tf::Rgba16Sint => "rgba16sint",
            Tf::Rgba16Float => "rgba16float",
            Tf::R32Uint => "r32uint",
            Tf::R32Sint => "r32sint",
            Tf::R32Float => "r32float",
            Tf::Rg32Uint => "rg32uint",
            Tf::Rg32Sint => "rg32sint",
            Tf::Rg32Float => "rg32float",
            Tf::Rgba32Uint => "rgba32uint",
            Tf::Rgba32Sint => "rgba32sint",
            Tf::Rgba32Float => "rgba32float",
            Tf::Bgra8Unorm => "bgra8unorm",
        }
    }
}

impl TextureKind {
    pub fn to_wgsl(self) -> String {
        let dim_suffix = |dim: TextureDimension| match dim {
            TextureDimension::D1 => "_1d",
            TextureDimension::D2 => "_2d",
            TextureDimension::D3 => "_3d",
            TextureDimension::Cube => "_cube",
        };
        let array_suffix = |arrayed: bool| if arrayed { "_array" } else { "" };

        match self {
            TextureKind::Sampled {
                dim,
                arrayed,
                sample_type,
            } => format!(
                "texture{}{}<{}>",
                dim_suffix(dim),
                array_suffix(arrayed),
                sample_type.to_wgsl()
            ),
            TextureKind::Multisampled { sample_type } => {
                format!("texture_multisampled_2d<{}>", sample_type.to_wgsl())
            }
            TextureKind::External => "texture_external".to_string(),
            TextureKind::Storage {
                dim,
                arrayed,
                format,
                access,
            } => format!(
                "texture_storage{}{}<{}, {}>",
                dim_suffix(dim),
                array_suffix(arrayed),
                format.to_wgsl(),
                access.to_wgsl()
            ),
            TextureKind::Depth { dim, arrayed } => {
                format!("texture_depth{}{}", dim_suffix(dim), array_suffix(arrayed))
            }
            TextureKind::DepthMultisampled => "texture_depth_multisampled_2d".to_string(),
        }
    }
}
