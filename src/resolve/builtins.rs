//! The builtin function table.
//!
//! Every builtin name maps to one [`Builtin`], which knows the arity and the
//! return type rule of the function. Arguments are passed in already loaded.

use std::ops::Range;
use std::sync::Arc;

use super::{Capabilities, Error};
use crate::types::{
    AccessMode, AddressSpace, Scalar, StructMember, StructType, TextureDimension, TextureKind,
    Type, VectorSize,
};

/// The scalar types an elementwise builtin accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Domain {
    Float,
    Numeric,
    /// Floats and signed integers.
    Signed,
    /// Concrete 32-bit integers only.
    ConcreteInteger,
}

impl Domain {
    const fn accepts(self, scalar: Scalar) -> bool {
        match self {
            Domain::Float => scalar.is_float(),
            Domain::Numeric => scalar.is_numeric(),
            Domain::Signed => scalar.is_numeric() && scalar.is_signed(),
            Domain::ConcreteInteger => matches!(scalar, Scalar::I32 | Scalar::U32),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AtomicFunction {
    Load,
    Store,
    /// `atomicAdd`, `atomicExchange` and the like.
    Modify,
    CompareExchangeWeak,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFunction {
    Dimensions,
    NumLayers,
    NumLevels,
    NumSamples,
    Sample,
    SampleBias,
    SampleLevel,
    SampleGrad,
    SampleCompare,
    SampleCompareLevel,
    SampleBaseClampToEdge,
    Gather,
    GatherCompare,
    Load,
    Store,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubgroupFunction {
    Elect,
    Ballot,
    /// `subgroupAll`, `subgroupAny`.
    Vote,
    /// Reductions and scans over `domain`.
    Collective(Domain),
    /// `subgroupBroadcast`, `subgroupShuffle*`, `quadBroadcast`.
    Exchange,
    /// `subgroupBroadcastFirst`, `quadSwap*`.
    Permute,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    /// All arguments share one scalar or vector type, which is the result.
    Elementwise { arity: usize, domain: Domain },
    Mix,
    ExtractBits,
    InsertBits,
    Dot,
    Cross,
    /// `length` and `distance`: vector to scalar.
    Norm { arity: usize },
    /// `normalize`, `reflect` and `faceForward`: float vectors only.
    VectorElementwise { arity: usize },
    Refract,
    Transpose,
    Determinant,
    Frexp,
    Modf,
    Ldexp,
    Derivative,
    /// `all` and `any`.
    Relational,
    Select,
    Pack { size: VectorSize, scalar: Scalar },
    Unpack { size: VectorSize, scalar: Scalar },
    /// `dot4I8Packed`, `dot4U8Packed`.
    DotPacked(Scalar),
    Bitcast,
    Atomic(AtomicFunction),
    Barrier,
    WorkgroupUniformLoad,
    ArrayLength,
    Texture(TextureFunction),
    Subgroup(SubgroupFunction),
}

impl Builtin {
    pub fn map(word: &str) -> Option<Self> {
        use Builtin as Bf;
        use Domain as D;

        let elementwise = |arity, domain| Bf::Elementwise { arity, domain };
        Some(match word {
            // comparison
            "abs" => elementwise(1, D::Numeric),
            "sign" => elementwise(1, D::Signed),
            "min" | "max" => elementwise(2, D::Numeric),
            "clamp" => elementwise(3, D::Numeric),
            "saturate" => elementwise(1, D::Float),
            // trigonometry
            "cos" | "cosh" | "sin" | "sinh" | "tan" | "tanh" | "acos" | "acosh" | "asin"
            | "asinh" | "atan" | "atanh" | "radians" | "degrees" => elementwise(1, D::Float),
            "atan2" => elementwise(2, D::Float),
            // decomposition
            "ceil" | "floor" | "round" | "fract" | "trunc" => elementwise(1, D::Float),
            "modf" => Bf::Modf,
            "frexp" => Bf::Frexp,
            "ldexp" => Bf::Ldexp,
            // exponent
            "exp" | "exp2" | "log" | "log2" | "sqrt" | "inverseSqrt" => elementwise(1, D::Float),
            "pow" | "step" => elementwise(2, D::Float),
            // geometry
            "dot" => Bf::Dot,
            "cross" => Bf::Cross,
            "length" => Bf::Norm { arity: 1 },
            "distance" => Bf::Norm { arity: 2 },
            "normalize" => Bf::VectorElementwise { arity: 1 },
            "reflect" => Bf::VectorElementwise { arity: 2 },
            "faceForward" => Bf::VectorElementwise { arity: 3 },
            "refract" => Bf::Refract,
            // computational
            "fma" | "smoothstep" => elementwise(3, D::Float),
            "mix" => Bf::Mix,
            "transpose" => Bf::Transpose,
            "determinant" => Bf::Determinant,
            // bits
            "countTrailingZeros" | "countLeadingZeros" | "countOneBits" | "reverseBits"
            | "firstTrailingBit" | "firstLeadingBit" => elementwise(1, D::ConcreteInteger),
            "extractBits" => Bf::ExtractBits,
            "insertBits" => Bf::InsertBits,
            // derivatives
            "dpdx" | "dpdxCoarse" | "dpdxFine" | "dpdy" | "dpdyCoarse" | "dpdyFine"
            | "fwidth" | "fwidthCoarse" | "fwidthFine" => Bf::Derivative,
            // relational
            "all" | "any" => Bf::Relational,
            "select" => Bf::Select,
            // data packing
            "pack4x8snorm" | "pack4x8unorm" => Bf::Pack {
                size: VectorSize::Quad,
                scalar: Scalar::F32,
            },
            "pack2x16snorm" | "pack2x16unorm" | "pack2x16float" => Bf::Pack {
                size: VectorSize::Bi,
                scalar: Scalar::F32,
            },
            "pack4xI8" | "pack4xI8Clamp" => Bf::Pack {
                size: VectorSize::Quad,
                scalar: Scalar::I32,
            },
            "pack4xU8" | "pack4xU8Clamp" => Bf::Pack {
                size: VectorSize::Quad,
                scalar: Scalar::U32,
            },
            // data unpacking
            "unpack4x8snorm" | "unpack4x8unorm" => Bf::Unpack {
                size: VectorSize::Quad,
                scalar: Scalar::F32,
            },
            "unpack2x16snorm" | "unpack2x16unorm" | "unpack2x16float" => Bf::Unpack {
                size: VectorSize::Bi,
                scalar: Scalar::F32,
            },
            "unpack4xI8" => Bf::Unpack {
                size: VectorSize::Quad,
                scalar: Scalar::I32,
            },
            "unpack4xU8" => Bf::Unpack {
                size: VectorSize::Quad,
                scalar: Scalar::U32,
            },
            "dot4I8Packed" => Bf::DotPacked(Scalar::I32),
            "dot4U8Packed" => Bf::DotPacked(Scalar::U32),
            "bitcast" => Bf::Bitcast,
            // atomics
            "atomicLoad" => Bf::Atomic(AtomicFunction::Load),
            "atomicStore" => Bf::Atomic(AtomicFunction::Store),
            "atomicAdd" | "atomicSub" | "atomicMax" | "atomicMin" | "atomicAnd" | "atomicOr"
            | "atomicXor" | "atomicExchange" => Bf::Atomic(AtomicFunction::Modify),
            "atomicCompareExchangeWeak" => Bf::Atomic(AtomicFunction::CompareExchangeWeak),
            // synchronization
            "storageBarrier" | "workgroupBarrier" | "textureBarrier" => Bf::Barrier,
            "workgroupUniformLoad" => Bf::WorkgroupUniformLoad,
            "arrayLength" => Bf::ArrayLength,
            // textures
            "textureDimensions" => Bf::Texture(TextureFunction::Dimensions),
            "textureNumLayers" => Bf::Texture(TextureFunction::NumLayers),
            "textureNumLevels" => Bf::Texture(TextureFunction::NumLevels),
            "textureNumSamples" => Bf::Texture(TextureFunction::NumSamples),
            "textureSample" => Bf::Texture(TextureFunction::Sample),
            "textureSampleBias" => Bf::Texture(TextureFunction::SampleBias),
            "textureSampleLevel" => Bf::Texture(TextureFunction::SampleLevel),
            "textureSampleGrad" => Bf::Texture(TextureFunction::SampleGrad),
            "textureSampleCompare" => Bf::Texture(TextureFunction::SampleCompare),
            "textureSampleCompareLevel" => Bf::Texture(TextureFunction::SampleCompareLevel),
            "textureSampleBaseClampToEdge" => Bf::Texture(TextureFunction::SampleBaseClampToEdge),
            "textureGather" => Bf::Texture(TextureFunction::Gather),
            "textureGatherCompare" => Bf::Texture(TextureFunction::GatherCompare),
            "textureLoad" => Bf::Texture(TextureFunction::Load),
            "textureStore" => Bf::Texture(TextureFunction::Store),
            // subgroups
            "subgroupElect" => Bf::Subgroup(SubgroupFunction::Elect),
            "subgroupBallot" => Bf::Subgroup(SubgroupFunction::Ballot),
            "subgroupAll" | "subgroupAny" => Bf::Subgroup(SubgroupFunction::Vote),
            "subgroupAdd" | "subgroupMul" | "subgroupMin" | "subgroupMax"
            | "subgroupExclusiveAdd" | "subgroupExclusiveMul" | "subgroupInclusiveAdd"
            | "subgroupInclusiveMul" => Bf::Subgroup(SubgroupFunction::Collective(D::Numeric)),
            "subgroupAnd" | "subgroupOr" | "subgroupXor" => {
                Bf::Subgroup(SubgroupFunction::Collective(D::ConcreteInteger))
            }
            "subgroupBroadcast" | "subgroupShuffle" | "subgroupShuffleXor"
            | "subgroupShuffleUp" | "subgroupShuffleDown" | "quadBroadcast" => {
                Bf::Subgroup(SubgroupFunction::Exchange)
            }
            "subgroupBroadcastFirst" | "quadSwapX" | "quadSwapY" | "quadSwapDiagonal" => {
                Bf::Subgroup(SubgroupFunction::Permute)
            }
            _ => return None,
        })
    }

    /// Capabilities a program needs to call this builtin at all.
    pub const fn required_capabilities(self) -> Capabilities {
        match self {
            Builtin::Subgroup(_) => Capabilities::SUBGROUPS,
            _ => Capabilities::empty(),
        }
    }

    /// The result type of calling this builtin as `name` on `args`, or `None`
    /// for builtins that return nothing.
    pub fn resolve(
        self,
        name: &str,
        template: Option<&Type>,
        args: &[Type],
    ) -> Result<Option<Type>, Error> {
        let call = Call { name, args };
        match (self, template) {
            (Builtin::Bitcast, None) => return Err(Error::MissingTemplateArgument(name.to_string())),
            (Builtin::Bitcast, Some(_)) | (_, None) => {}
            (_, Some(_)) => return Err(Error::UnexpectedTemplateArgument(name.to_string())),
        }

        let result = match self {
            Builtin::Elementwise { arity, domain } => {
                call.arity(arity..arity + 1)?;
                call.elementwise(domain)?
            }
            Builtin::Mix => {
                call.arity(3..4)?;
                let ty = call.elementwise_prefix(2, Domain::Float)?;
                // The blend factor may be a scalar even for vector operands.
                let factor = &args[2];
                let fits = factor.automatic_conversion_combine(&ty).is_some()
                    || ty
                        .scalar()
                        .map_or(false, |s| Type::Scalar(s).automatic_conversion_combine(factor).is_some());
                if !fits {
                    return Err(call.invalid(2));
                }
                ty
            }
            Builtin::ExtractBits => {
                call.arity(3..4)?;
                let ty = call.elementwise_prefix(1, Domain::ConcreteInteger)?;
                call.expect_u32(1)?;
                call.expect_u32(2)?;
                ty
            }
            Builtin::InsertBits => {
                call.arity(4..5)?;
                let ty = call.elementwise_prefix(2, Domain::ConcreteInteger)?;
                call.expect_u32(2)?;
                call.expect_u32(3)?;
                ty
            }
            Builtin::Dot => {
                call.arity(2..3)?;
                let ty = call.elementwise(Domain::Numeric)?;
                match ty {
                    Type::Vector { scalar, .. } => Type::Scalar(scalar),
                    _ => return Err(call.invalid(0)),
                }
            }
            Builtin::Cross => {
                call.arity(2..3)?;
                let ty = call.elementwise(Domain::Float)?;
                match ty {
                    Type::Vector {
                        size: VectorSize::Tri,
                        ..
                    } => ty,
                    _ => return Err(call.invalid(0)),
                }
            }
            Builtin::Norm { arity } => {
                call.arity(arity..arity + 1)?;
                let ty = call.elementwise(Domain::Float)?;
                match ty.scalar() {
                    Some(scalar) => Type::Scalar(scalar),
                    None => return Err(call.invalid(0)),
                }
            }
            Builtin::VectorElementwise { arity } => {
                call.arity(arity..arity + 1)?;
                let ty = call.elementwise(Domain::Float)?;
                match ty {
                    Type::Vector { .. } => ty,
                    _ => return Err(call.invalid(0)),
                }
            }
            Builtin::Refract => {
                call.arity(3..4)?;
                let ty = call.elementwise_prefix(2, Domain::Float)?;
                let scalar = match ty {
                    Type::Vector { scalar, .. } => scalar,
                    _ => return Err(call.invalid(0)),
                };
                let eta_fits = match args[2] {
                    Type::Scalar(eta) => scalar.automatic_conversion_combine(eta).is_some(),
                    _ => false,
                };
                if !eta_fits {
                    return Err(call.invalid(2));
                }
                ty
            }
            Builtin::Transpose => {
                call.arity(1..2)?;
                match args[0] {
                    Type::Matrix {
                        columns,
                        rows,
                        scalar,
                    } => Type::Matrix {
                        columns: rows,
                        rows: columns,
                        scalar,
                    },
                    _ => return Err(call.invalid(0)),
                }
            }
            Builtin::Determinant => {
                call.arity(1..2)?;
                match args[0] {
                    Type::Matrix {
                        columns,
                        rows,
                        scalar,
                    } if columns == rows => Type::Scalar(scalar),
                    _ => return Err(call.invalid(0)),
                }
            }
            Builtin::Frexp | Builtin::Modf => {
                call.arity(1..2)?;
                let ty = call.elementwise(Domain::Float)?.concretize();
                decomposition_result(self == Builtin::Frexp, &ty)
            }
            Builtin::Ldexp => {
                call.arity(2..3)?;
                let ty = call.elementwise_prefix(1, Domain::Float)?;
                let exponent = &args[1];
                let shapes_match = match (&ty, exponent) {
                    (&Type::Scalar(_), &Type::Scalar(_)) => true,
                    (&Type::Vector { size, .. }, &Type::Vector { size: other, .. }) => {
                        size == other
                    }
                    _ => false,
                };
                if !shapes_match
                    || !matches!(exponent.scalar(), Some(Scalar::I32) | Some(Scalar::AbstractInt))
                {
                    return Err(call.invalid(1));
                }
                ty
            }
            Builtin::Derivative => {
                call.arity(1..2)?;
                let ty = call.elementwise(Domain::Float)?.concretize();
                if ty.scalar() != Some(Scalar::F32) {
                    return Err(call.invalid(0));
                }
                ty
            }
            Builtin::Relational => {
                call.arity(1..2)?;
                if !args[0].is_scalar_or_vector() || args[0].scalar() != Some(Scalar::Bool) {
                    return Err(call.invalid(0));
                }
                Type::BOOL
            }
            Builtin::Select => {
                call.arity(3..4)?;
                let ty = args[0]
                    .automatic_conversion_combine(&args[1])
                    .filter(|ty| ty.is_scalar_or_vector())
                    .ok_or_else(|| call.invalid(1))?;
                let condition_fits = match (&ty, &args[2]) {
                    (_, &Type::Scalar(Scalar::Bool)) => true,
                    (
                        &Type::Vector { size, .. },
                        &Type::Vector {
                            size: other,
                            scalar: Scalar::Bool,
                        },
                    ) => size == other,
                    _ => false,
                };
                if !condition_fits {
                    return Err(call.invalid(2));
                }
                ty
            }
            Builtin::Pack { size, scalar } => {
                call.arity(1..2)?;
                call.expect(0, &Type::vector(size, scalar))?;
                Type::U32
            }
            Builtin::Unpack { size, scalar } => {
                call.arity(1..2)?;
                call.expect_u32(0)?;
                Type::vector(size, scalar)
            }
            Builtin::DotPacked(scalar) => {
                call.arity(2..3)?;
                call.expect_u32(0)?;
                call.expect_u32(1)?;
                Type::Scalar(scalar)
            }
            Builtin::Bitcast => {
                call.arity(1..2)?;
                let target = template.cloned().unwrap_or(Type::U32);
                bitcast(&call, &target)?;
                target
            }
            Builtin::Atomic(function) => return atomic(&call, function),
            Builtin::Barrier => {
                call.arity(0..1)?;
                return Ok(None);
            }
            Builtin::WorkgroupUniformLoad => {
                call.arity(1..2)?;
                match args[0] {
                    Type::Pointer {
                        ref base,
                        space: AddressSpace::Workgroup,
                        ..
                    } if !matches!(**base, Type::Atomic(_)) => (**base).clone(),
                    _ => return Err(call.invalid(0)),
                }
            }
            Builtin::ArrayLength => {
                call.arity(1..2)?;
                match args[0] {
                    Type::Pointer {
                        ref base,
                        space: AddressSpace::Storage,
                        ..
                    } if matches!(**base, Type::Array { size: None, .. }) => Type::U32,
                    _ => return Err(call.invalid(0)),
                }
            }
            Builtin::Texture(function) => return texture(&call, function),
            Builtin::Subgroup(function) => return subgroup(&call, function),
        };
        Ok(Some(result))
    }
}

struct Call<'a> {
    name: &'a str,
    args: &'a [Type],
}

impl Call<'_> {
    fn arity(&self, expected: Range<usize>) -> Result<(), Error> {
        if expected.contains(&self.args.len()) {
            Ok(())
        } else {
            Err(Error::WrongArgumentCount {
                function: self.name.to_string(),
                expected,
                found: self.args.len(),
            })
        }
    }

    fn invalid(&self, index: usize) -> Error {
        let ty = self.args.get(index).cloned().unwrap_or(Type::BOOL);
        log::error!("Builtin `{}` rejects argument {} of type `{}`", self.name, index, ty);
        Error::InvalidArgument {
            function: self.name.to_string(),
            index,
            ty,
        }
    }

    /// Unify the first `count` arguments into one scalar or vector type of
    /// `domain`.
    ///
    /// Abstract integers are taken as abstract floats where `domain` only
    /// holds floats.
    fn elementwise_prefix(&self, count: usize, domain: Domain) -> Result<Type, Error> {
        let mut consensus: Option<Type> = None;
        for (index, ty) in self.args[..count].iter().enumerate() {
            let ty = match ty.scalar() {
                Some(Scalar::AbstractInt) if domain == Domain::Float => {
                    ty.with_scalar(Scalar::AbstractFloat)
                }
                _ => None,
            }
            .unwrap_or_else(|| ty.clone());
            let fits = ty.is_scalar_or_vector() && ty.scalar().map_or(false, |s| domain.accepts(s));
            if !fits {
                return Err(self.invalid(index));
            }
            consensus = Some(match consensus {
                None => ty,
                Some(previous) => previous
                    .automatic_conversion_combine(&ty)
                    .ok_or_else(|| self.invalid(index))?,
            });
        }
        consensus.ok_or_else(|| self.invalid(0))
    }

    fn elementwise(&self, domain: Domain) -> Result<Type, Error> {
        self.elementwise_prefix(self.args.len(), domain)
    }

    fn expect(&self, index: usize, expected: &Type) -> Result<(), Error> {
        if self.args[index].is_abstraction_of(expected) {
            Ok(())
        } else {
            Err(self.invalid(index))
        }
    }

    fn expect_u32(&self, index: usize) -> Result<(), Error> {
        self.expect(index, &Type::U32)
    }

    /// Check an integer coordinate or index argument, if it was passed.
    fn expect_integer(&self, index: usize) -> Result<(), Error> {
        match self.args.get(index) {
            Some(ty) if ty.is_scalar_or_vector() && ty.scalar().map_or(false, Scalar::is_integer) => {
                Ok(())
            }
            Some(_) => Err(self.invalid(index)),
            None => Ok(()),
        }
    }

    fn texture(&self, index: usize) -> Result<TextureKind, Error> {
        match self.args.get(index) {
            Some(&Type::Texture(kind)) => Ok(kind),
            _ => Err(self.invalid(index)),
        }
    }

    fn sampler(&self, index: usize, comparison: bool) -> Result<(), Error> {
        match self.args[index] {
            Type::Sampler { comparison: c } if c == comparison => Ok(()),
            _ => Err(self.invalid(index)),
        }
    }
}

fn predeclared_struct(name: String, members: Vec<(&str, Type)>) -> Type {
    Type::Struct(Arc::new(StructType {
        name,
        members: members
            .into_iter()
            .map(|(name, ty)| StructMember {
                name: name.to_string(),
                ty,
                align: None,
                size: None,
            })
            .collect(),
    }))
}

/// The `__frexp_result_*` or `__modf_result_*` struct for a concrete float
/// scalar or vector.
fn decomposition_result(frexp: bool, ty: &Type) -> Type {
    let mut name = if frexp {
        "__frexp_result_".to_string()
    } else {
        "__modf_result_".to_string()
    };
    if let Type::Vector { size, .. } = *ty {
        name.push_str(&format!("vec{}_", size as u8));
    }
    name.push_str(ty.scalar().unwrap_or(Scalar::F32).to_wgsl());

    if frexp {
        let exp = ty.with_scalar(Scalar::I32).unwrap_or(Type::I32);
        predeclared_struct(name, vec![("fract", ty.clone()), ("exp", exp)])
    } else {
        predeclared_struct(name, vec![("fract", ty.clone()), ("whole", ty.clone())])
    }
}

fn bitcast(call: &Call, target: &Type) -> Result<(), Error> {
    // Abstract operands take their default concrete types first.
    let source = call.args[0].concretize();
    let shape = |ty: &Type| match *ty {
        Type::Scalar(scalar) => scalar.bits().map(|bits| (1, bits)),
        Type::Vector { size, scalar } => scalar.bits().map(|bits| (size as u32, bits)),
        _ => None,
    };
    let numeric = |ty: &Type| ty.scalar().map_or(false, Scalar::is_numeric);
    match (shape(&source), shape(target)) {
        (Some((count, bits)), Some((target_count, target_bits)))
            if numeric(&source) && numeric(target) && count * bits == target_count * target_bits =>
        {
            Ok(())
        }
        (_, None) => Err(Error::InvalidArgument {
            function: call.name.to_string(),
            index: 0,
            ty: target.clone(),
        }),
        _ => Err(call.invalid(0)),
    }
}

fn atomic(call: &Call, function: AtomicFunction) -> Result<Option<Type>, Error> {
    let arity = match function {
        AtomicFunction::Load => 1,
        AtomicFunction::Store | AtomicFunction::Modify => 2,
        AtomicFunction::CompareExchangeWeak => 3,
    };
    call.arity(arity..arity + 1)?;

    let scalar = match call.args[0] {
        Type::Pointer {
            ref base,
            space: AddressSpace::Storage,
            access,
        } if function == AtomicFunction::Load || access == AccessMode::ReadWrite => match **base {
            Type::Atomic(scalar) => scalar,
            _ => return Err(call.invalid(0)),
        },
        Type::Pointer {
            ref base,
            space: AddressSpace::Workgroup,
            ..
        } => match **base {
            Type::Atomic(scalar) => scalar,
            _ => return Err(call.invalid(0)),
        },
        _ => return Err(call.invalid(0)),
    };
    let value = Type::Scalar(scalar);
    for index in 1..arity {
        call.expect(index, &value)?;
    }

    Ok(match function {
        AtomicFunction::Load | AtomicFunction::Modify => Some(value),
        AtomicFunction::Store => None,
        AtomicFunction::CompareExchangeWeak => Some(predeclared_struct(
            format!("__atomic_compare_exchange_result_{}", scalar.to_wgsl()),
            vec![("old_value", value), ("exchanged", Type::BOOL)],
        )),
    })
}

const VEC4_F32: Type = Type::vector(VectorSize::Quad, Scalar::F32);

fn texture(call: &Call, function: TextureFunction) -> Result<Option<Type>, Error> {
    use TextureFunction as Tf;

    let sampled_vec4 = |kind: TextureKind, index: usize| match kind {
        TextureKind::Sampled { sample_type, .. } | TextureKind::Multisampled { sample_type } => {
            Ok(Type::vector(VectorSize::Quad, sample_type))
        }
        _ => Err(call.invalid(index)),
    };

    let result = match function {
        Tf::Dimensions => {
            call.arity(1..3)?;
            let kind = call.texture(0)?;
            call.expect_integer(1)?;
            match kind.dimension() {
                TextureDimension::D1 => Type::U32,
                TextureDimension::D2 | TextureDimension::Cube => {
                    Type::vector(VectorSize::Bi, Scalar::U32)
                }
                TextureDimension::D3 => Type::vector(VectorSize::Tri, Scalar::U32),
            }
        }
        Tf::NumLayers => {
            call.arity(1..2)?;
            if !call.texture(0)?.is_arrayed() {
                return Err(call.invalid(0));
            }
            Type::U32
        }
        Tf::NumLevels => {
            call.arity(1..2)?;
            match call.texture(0)? {
                TextureKind::Sampled { .. } | TextureKind::Depth { .. } => Type::U32,
                _ => return Err(call.invalid(0)),
            }
        }
        Tf::NumSamples => {
            call.arity(1..2)?;
            if !call.texture(0)?.is_multisampled() {
                return Err(call.invalid(0));
            }
            Type::U32
        }
        Tf::Sample | Tf::SampleBias | Tf::SampleGrad => {
            let extra = match function {
                Tf::Sample => 0,
                Tf::SampleBias => 1,
                _ => 2,
            };
            call.arity(3 + extra..6 + extra)?;
            let kind = call.texture(0)?;
            call.sampler(1, false)?;
            match kind {
                TextureKind::Sampled {
                    sample_type: Scalar::F32,
                    ..
                } => VEC4_F32,
                TextureKind::Depth { .. } if function == Tf::Sample => Type::F32,
                _ => return Err(call.invalid(0)),
            }
        }
        Tf::SampleLevel => {
            call.arity(4..7)?;
            let kind = call.texture(0)?;
            call.sampler(1, false)?;
            match kind {
                TextureKind::Sampled {
                    sample_type: Scalar::F32,
                    ..
                } => VEC4_F32,
                TextureKind::Depth { .. } => Type::F32,
                _ => return Err(call.invalid(0)),
            }
        }
        Tf::SampleCompare | Tf::SampleCompareLevel => {
            call.arity(4..7)?;
            match call.texture(0)? {
                TextureKind::Depth { .. } => {}
                _ => return Err(call.invalid(0)),
            }
            call.sampler(1, true)?;
            Type::F32
        }
        Tf::SampleBaseClampToEdge => {
            call.arity(3..4)?;
            match call.texture(0)? {
                TextureKind::Sampled {
                    dim: TextureDimension::D2,
                    arrayed: false,
                    sample_type: Scalar::F32,
                }
                | TextureKind::External => {}
                _ => return Err(call.invalid(0)),
            }
            call.sampler(1, false)?;
            VEC4_F32
        }
        Tf::Gather => {
            call.arity(3..7)?;
            // Color textures take the component to gather first.
            match call.args[0] {
                Type::Texture(TextureKind::Depth { .. }) => {
                    call.sampler(1, false)?;
                    VEC4_F32
                }
                _ => {
                    call.expect_integer(0)?;
                    let kind = call.texture(1)?;
                    call.sampler(2, false)?;
                    match kind {
                        TextureKind::Sampled { .. } => sampled_vec4(kind, 1)?,
                        _ => return Err(call.invalid(1)),
                    }
                }
            }
        }
        Tf::GatherCompare => {
            call.arity(4..7)?;
            match call.texture(0)? {
                TextureKind::Depth { .. } => {}
                _ => return Err(call.invalid(0)),
            }
            call.sampler(1, true)?;
            VEC4_F32
        }
        Tf::Load => {
            call.arity(2..5)?;
            let kind = call.texture(0)?;
            call.expect_integer(1)?;
            match kind {
                TextureKind::Sampled { .. } | TextureKind::Multisampled { .. } => {
                    sampled_vec4(kind, 0)?
                }
                TextureKind::Depth { .. } | TextureKind::DepthMultisampled => Type::F32,
                TextureKind::External => VEC4_F32,
                TextureKind::Storage { format, access, .. } if access.can_read() => {
                    Type::vector(VectorSize::Quad, format.channel_type())
                }
                TextureKind::Storage { .. } => return Err(call.invalid(0)),
            }
        }
        Tf::Store => {
            call.arity(3..5)?;
            match call.texture(0)? {
                TextureKind::Storage { format, access, .. } if access.can_write() => {
                    call.expect_integer(1)?;
                    let value = call.args.len() - 1;
                    call.expect(value, &Type::vector(VectorSize::Quad, format.channel_type()))?;
                }
                _ => return Err(call.invalid(0)),
            }
            return Ok(None);
        }
    };
    Ok(Some(result))
}

fn subgroup(call: &Call, function: SubgroupFunction) -> Result<Option<Type>, Error> {
    use SubgroupFunction as Sf;

    // Subgroup operations work on concrete values only.
    let concrete: Vec<Type> = call.args.iter().map(Type::concretize).collect();
    let call = Call {
        name: call.name,
        args: &concrete,
    };
    let result = match function {
        Sf::Elect => {
            call.arity(0..1)?;
            Type::BOOL
        }
        Sf::Ballot => {
            call.arity(0..2)?;
            if !call.args.is_empty() {
                call.expect(0, &Type::BOOL)?;
            }
            Type::vector(VectorSize::Quad, Scalar::U32)
        }
        Sf::Vote => {
            call.arity(1..2)?;
            call.expect(0, &Type::BOOL)?;
            Type::BOOL
        }
        Sf::Collective(domain) => {
            call.arity(1..2)?;
            call.elementwise(domain)?
        }
        Sf::Exchange | Sf::Permute => {
            let arity = if function == Sf::Exchange { 2 } else { 1 };
            call.arity(arity..arity + 1)?;
            let ty = &call.args[0];
            if !ty.is_scalar_or_vector() {
                return Err(call.invalid(0));
            }
            if arity == 2 {
                call.expect_integer(1)?;
            }
            ty.clone()
        }
    };
    Ok(Some(result))
}
