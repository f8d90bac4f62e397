//! Result types of operators and accesses.
//!
//! These functions only compute types: `None` means the operands do not fit
//! the operator, and the caller turns that into an error naming the node.

use arrayvec::ArrayVec;

use crate::ast::{BinaryOperator, UnaryOperator};
use crate::types::{Scalar, Type, VectorSize};

/// The result type of `left op right`. Both operands must already be loaded.
pub fn binary(op: BinaryOperator, left: &Type, right: &Type) -> Option<Type> {
    use BinaryOperator as Bo;

    match op {
        Bo::Add | Bo::Subtract | Bo::Multiply | Bo::Divide | Bo::Modulo => {
            arithmetic(op, left, right)
        }
        Bo::Equal | Bo::NotEqual => {
            let common = left.automatic_conversion_combine(right)?;
            comparison_result(&common)
        }
        Bo::Less | Bo::LessEqual | Bo::Greater | Bo::GreaterEqual => {
            let common = left.automatic_conversion_combine(right)?;
            match common.scalar() {
                Some(scalar) if scalar.is_numeric() => comparison_result(&common),
                _ => None,
            }
        }
        Bo::And | Bo::InclusiveOr | Bo::ExclusiveOr => {
            let common = left.automatic_conversion_combine(right)?;
            if !common.is_scalar_or_vector() {
                return None;
            }
            match common.scalar() {
                Some(scalar) if scalar.is_integer() => Some(common),
                Some(Scalar::Bool) if op != Bo::ExclusiveOr => Some(common),
                _ => None,
            }
        }
        Bo::LogicalAnd | Bo::LogicalOr => match (left, right) {
            (&Type::Scalar(Scalar::Bool), &Type::Scalar(Scalar::Bool)) => Some(Type::BOOL),
            _ => None,
        },
        Bo::ShiftLeft | Bo::ShiftRight => {
            let same_shape = match (left, right) {
                (&Type::Scalar(_), &Type::Scalar(_)) => true,
                (&Type::Vector { size, .. }, &Type::Vector { size: other, .. }) => size == other,
                _ => false,
            };
            let integers = matches!(
                (left.scalar(), right.scalar()),
                (Some(l), Some(r)) if l.is_integer() && r.is_integer() && r != Scalar::I32
            );
            if same_shape && integers {
                Some(left.clone())
            } else {
                None
            }
        }
    }
}

fn comparison_result(common: &Type) -> Option<Type> {
    match *common {
        Type::Scalar(_) => Some(Type::BOOL),
        Type::Vector { size, .. } => Some(Type::vector(size, Scalar::Bool)),
        _ => None,
    }
}

fn arithmetic(op: BinaryOperator, left: &Type, right: &Type) -> Option<Type> {
    let numeric = |scalar: Scalar| if scalar.is_numeric() { Some(scalar) } else { None };
    let float = |scalar: Scalar| if scalar.is_float() { Some(scalar) } else { None };
    let combine = Scalar::automatic_conversion_combine;

    match (left, right) {
        (&Type::Scalar(a), &Type::Scalar(b)) => numeric(combine(a, b)?).map(Type::Scalar),
        (&Type::Vector { size, scalar: a }, &Type::Vector { size: other, scalar: b })
            if size == other =>
        {
            numeric(combine(a, b)?).map(|scalar| Type::vector(size, scalar))
        }
        (&Type::Vector { size, scalar: a }, &Type::Scalar(b))
        | (&Type::Scalar(b), &Type::Vector { size, scalar: a }) => {
            numeric(combine(a, b)?).map(|scalar| Type::vector(size, scalar))
        }
        (
            &Type::Matrix {
                columns,
                rows,
                scalar: a,
            },
            &Type::Matrix {
                columns: other_columns,
                rows: other_rows,
                scalar: b,
            },
        ) => match op {
            BinaryOperator::Add | BinaryOperator::Subtract
                if columns == other_columns && rows == other_rows =>
            {
                float(combine(a, b)?).map(|scalar| Type::Matrix {
                    columns,
                    rows,
                    scalar,
                })
            }
            // The left matrix's columns meet the right matrix's rows.
            BinaryOperator::Multiply if columns == other_rows => {
                float(combine(a, b)?).map(|scalar| Type::Matrix {
                    columns: other_columns,
                    rows,
                    scalar,
                })
            }
            _ => None,
        },
        (
            &Type::Matrix {
                columns,
                rows,
                scalar: a,
            },
            &Type::Vector { size, scalar: b },
        ) if op == BinaryOperator::Multiply && size == columns => {
            float(combine(a, b)?).map(|scalar| Type::vector(rows, scalar))
        }
        (
            &Type::Vector { size, scalar: b },
            &Type::Matrix {
                columns,
                rows,
                scalar: a,
            },
        ) if op == BinaryOperator::Multiply && size == rows => {
            float(combine(a, b)?).map(|scalar| Type::vector(columns, scalar))
        }
        (
            &Type::Matrix {
                columns,
                rows,
                scalar: a,
            },
            &Type::Scalar(b),
        )
        | (
            &Type::Scalar(b),
            &Type::Matrix {
                columns,
                rows,
                scalar: a,
            },
        ) if op == BinaryOperator::Multiply => float(combine(a, b)?).map(|scalar| Type::Matrix {
            columns,
            rows,
            scalar,
        }),
        _ => None,
    }
}

/// The result type of `op operand`.
///
/// `operand` is the operand's unloaded type: dereferencing and taking the
/// address look at the pointer or reference itself.
pub fn unary(op: UnaryOperator, operand: &Type) -> Option<Type> {
    match op {
        UnaryOperator::Deref => match *operand {
            Type::Pointer {
                ref base,
                space,
                access,
            } => Some(Type::reference((**base).clone(), space, access)),
            _ => None,
        },
        UnaryOperator::AddressOf => match *operand {
            Type::Reference {
                ref base,
                space,
                access,
            } => Some(Type::pointer((**base).clone(), space, access)),
            _ => None,
        },
        UnaryOperator::Negate | UnaryOperator::BitwiseNot | UnaryOperator::LogicalNot => {
            let loaded = operand.store_type();
            let fits = match loaded.scalar() {
                Some(scalar) if loaded.is_scalar_or_vector() => match op {
                    UnaryOperator::Negate => scalar.is_signed(),
                    UnaryOperator::BitwiseNot => scalar.is_integer(),
                    _ => scalar == Scalar::Bool,
                },
                _ => false,
            };
            if fits {
                Some(loaded.clone())
            } else {
                None
            }
        }
    }
}

fn element(ty: &Type) -> Option<Type> {
    match *ty {
        Type::Vector { scalar, .. } => Some(Type::Scalar(scalar)),
        Type::Matrix { rows, scalar, .. } => Some(Type::vector(rows, scalar)),
        Type::Array { ref base, .. } => Some((**base).clone()),
        _ => None,
    }
}

/// The result type of `base[index]`, given `base`'s unloaded type.
///
/// Indexing through a reference or pointer yields a reference or pointer to
/// the element, in the same address space and with the same access mode.
pub fn index(base: &Type) -> Option<Type> {
    match *base {
        Type::Reference {
            ref base,
            space,
            access,
        } => element(base).map(|element| Type::reference(element, space, access)),
        Type::Pointer {
            ref base,
            space,
            access,
        } => element(base).map(|element| Type::pointer(element, space, access)),
        ref other => element(other),
    }
}

/// Parse a swizzle of a vector with `size` components.
///
/// Letters come from either `xyzw` or `rgba`, never both; there are one to
/// four of them, each naming an existing component.
pub fn swizzle(name: &str, size: VectorSize) -> Option<ArrayVec<u8, 4>> {
    const XYZW: &[u8] = b"xyzw";
    const RGBA: &[u8] = b"rgba";

    let bytes = name.as_bytes();
    let first = *bytes.first()?;
    let set = if XYZW.contains(&first) { XYZW } else { RGBA };
    let mut components = ArrayVec::new();
    for byte in bytes {
        let index = set.iter().position(|letter| letter == byte)? as u8;
        if u32::from(index) >= size as u32 {
            return None;
        }
        components.try_push(index).ok()?;
    }
    Some(components)
}

enum Member {
    /// A struct member or a single vector component: a location.
    Single(Type),
    /// A multi-component swizzle: always a fresh value.
    Swizzle(Type),
}

fn member_of(ty: &Type, name: &str) -> Option<Member> {
    match *ty {
        Type::Struct(ref st) => st.member(name).map(|member| Member::Single(member.ty.clone())),
        Type::Vector { size, scalar } => {
            let components = swizzle(name, size)?;
            match VectorSize::from_u32(components.len() as u32) {
                Some(size) => Some(Member::Swizzle(Type::vector(size, scalar))),
                None => Some(Member::Single(Type::Scalar(scalar))),
            }
        }
        _ => None,
    }
}

/// The result type of `base.name`, given `base`'s unloaded type.
///
/// Struct members and single vector components of a reference or pointer
/// stay references or pointers; a multi-component swizzle is a plain value.
pub fn member(base: &Type, name: &str) -> Option<Type> {
    match *base {
        Type::Reference {
            ref base,
            space,
            access,
        } => Some(match member_of(base, name)? {
            Member::Single(ty) => Type::reference(ty, space, access),
            Member::Swizzle(ty) => ty,
        }),
        Type::Pointer {
            ref base,
            space,
            access,
        } => Some(match member_of(base, name)? {
            Member::Single(ty) => Type::pointer(ty, space, access),
            Member::Swizzle(ty) => ty,
        }),
        ref other => Some(match member_of(other, name)? {
            Member::Single(ty) | Member::Swizzle(ty) => ty,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::{AccessMode, AddressSpace, StructMember, StructType};

    fn vec(size: VectorSize, scalar: Scalar) -> Type {
        Type::vector(size, scalar)
    }

    #[test]
    fn arithmetic_unifies_and_broadcasts() {
        let abstract_int = Type::Scalar(Scalar::AbstractInt);
        let abstract_float = Type::Scalar(Scalar::AbstractFloat);
        assert_eq!(
            binary(BinaryOperator::Add, &abstract_int, &abstract_float),
            Some(abstract_float.clone())
        );
        assert_eq!(
            binary(BinaryOperator::Multiply, &abstract_int, &Type::U32),
            Some(Type::U32)
        );
        assert_eq!(
            binary(
                BinaryOperator::Subtract,
                &vec(VectorSize::Tri, Scalar::F32),
                &abstract_int
            ),
            Some(vec(VectorSize::Tri, Scalar::F32))
        );
        assert_eq!(binary(BinaryOperator::Add, &Type::I32, &Type::U32), None);
        assert_eq!(binary(BinaryOperator::Add, &Type::BOOL, &Type::BOOL), None);
        assert_eq!(binary(BinaryOperator::Add, &abstract_float, &Type::I32), None);
    }

    #[test]
    fn comparisons_and_logic() {
        assert_eq!(
            binary(BinaryOperator::Less, &Type::F32, &Type::Scalar(Scalar::AbstractFloat)),
            Some(Type::BOOL)
        );
        assert_eq!(
            binary(
                BinaryOperator::Equal,
                &vec(VectorSize::Quad, Scalar::I32),
                &vec(VectorSize::Quad, Scalar::AbstractInt)
            ),
            Some(vec(VectorSize::Quad, Scalar::Bool))
        );
        assert_eq!(binary(BinaryOperator::Less, &Type::BOOL, &Type::BOOL), None);
        assert_eq!(
            binary(BinaryOperator::LogicalAnd, &Type::BOOL, &Type::BOOL),
            Some(Type::BOOL)
        );
        assert_eq!(binary(BinaryOperator::LogicalOr, &Type::BOOL, &Type::I32), None);
        assert_eq!(
            binary(BinaryOperator::And, &Type::BOOL, &Type::BOOL),
            Some(Type::BOOL)
        );
        assert_eq!(binary(BinaryOperator::ExclusiveOr, &Type::BOOL, &Type::BOOL), None);
    }

    #[test]
    fn shifts_keep_left_type() {
        assert_eq!(
            binary(BinaryOperator::ShiftLeft, &Type::I32, &Type::U32),
            Some(Type::I32)
        );
        assert_eq!(
            binary(
                BinaryOperator::ShiftRight,
                &Type::Scalar(Scalar::AbstractInt),
                &Type::Scalar(Scalar::AbstractInt)
            ),
            Some(Type::Scalar(Scalar::AbstractInt))
        );
        assert_eq!(binary(BinaryOperator::ShiftLeft, &Type::F32, &Type::U32), None);
        assert_eq!(
            binary(
                BinaryOperator::ShiftLeft,
                &vec(VectorSize::Bi, Scalar::U32),
                &Type::U32
            ),
            None
        );
    }

    #[test]
    fn matrix_products() {
        let m3x2 = Type::Matrix {
            columns: VectorSize::Tri,
            rows: VectorSize::Bi,
            scalar: Scalar::F32,
        };
        let m4x3 = Type::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Tri,
            scalar: Scalar::AbstractFloat,
        };
        assert_eq!(
            binary(BinaryOperator::Multiply, &m3x2, &m4x3),
            Some(Type::Matrix {
                columns: VectorSize::Quad,
                rows: VectorSize::Bi,
                scalar: Scalar::F32,
            })
        );
        assert_eq!(binary(BinaryOperator::Multiply, &m4x3, &m3x2), None);
        assert_eq!(
            binary(
                BinaryOperator::Multiply,
                &m3x2,
                &vec(VectorSize::Tri, Scalar::F32)
            ),
            Some(vec(VectorSize::Bi, Scalar::F32))
        );
        assert_eq!(
            binary(
                BinaryOperator::Multiply,
                &vec(VectorSize::Bi, Scalar::AbstractFloat),
                &m3x2
            ),
            Some(vec(VectorSize::Tri, Scalar::F32))
        );
        assert_eq!(
            binary(BinaryOperator::Multiply, &Type::Scalar(Scalar::AbstractInt), &m3x2),
            Some(m3x2.clone())
        );
        assert_eq!(binary(BinaryOperator::Divide, &m3x2, &m3x2), None);
    }

    #[test]
    fn pointers_and_references() {
        let reference = Type::reference(
            Type::vector(VectorSize::Quad, Scalar::F32),
            AddressSpace::Private,
            AccessMode::ReadWrite,
        );
        let pointer = unary(UnaryOperator::AddressOf, &reference).unwrap();
        assert_eq!(
            pointer,
            Type::pointer(
                Type::vector(VectorSize::Quad, Scalar::F32),
                AddressSpace::Private,
                AccessMode::ReadWrite
            )
        );
        assert_eq!(unary(UnaryOperator::Deref, &pointer), Some(reference.clone()));
        assert_eq!(unary(UnaryOperator::Deref, &reference), None);
        assert_eq!(
            unary(UnaryOperator::Negate, &reference),
            Some(Type::vector(VectorSize::Quad, Scalar::F32))
        );
        assert_eq!(unary(UnaryOperator::Negate, &Type::U32), None);
        assert_eq!(unary(UnaryOperator::LogicalNot, &Type::BOOL), Some(Type::BOOL));
        assert_eq!(unary(UnaryOperator::BitwiseNot, &Type::F32), None);
    }

    #[test]
    fn accesses_propagate_wrappers() {
        let array = Type::array(Type::vector(VectorSize::Tri, Scalar::U32), Some(4));
        let reference = Type::reference(array, AddressSpace::Storage, AccessMode::Read);
        let element = index(&reference).unwrap();
        assert_eq!(
            element,
            Type::reference(
                Type::vector(VectorSize::Tri, Scalar::U32),
                AddressSpace::Storage,
                AccessMode::Read
            )
        );
        assert_eq!(
            member(&element, "y"),
            Some(Type::reference(Type::U32, AddressSpace::Storage, AccessMode::Read))
        );
        assert_eq!(
            member(&element, "zyx"),
            Some(Type::vector(VectorSize::Tri, Scalar::U32))
        );
        assert_eq!(member(&element, "w"), None);
        assert_eq!(member(&element, "xg"), None);
        assert_eq!(index(&Type::F32), None);

        let st = Type::Struct(Arc::new(StructType {
            name: "Light".to_string(),
            members: vec![StructMember {
                name: "color".to_string(),
                ty: Type::vector(VectorSize::Tri, Scalar::F32),
                align: None,
                size: None,
            }],
        }));
        let pointer = Type::pointer(st.clone(), AddressSpace::Function, AccessMode::ReadWrite);
        assert_eq!(
            member(&pointer, "color"),
            Some(Type::pointer(
                Type::vector(VectorSize::Tri, Scalar::F32),
                AddressSpace::Function,
                AccessMode::ReadWrite
            ))
        );
        assert_eq!(
            member(&st, "color"),
            Some(Type::vector(VectorSize::Tri, Scalar::F32))
        );
        assert_eq!(member(&st, "intensity"), None);
    }

    #[test]
    fn swizzle_letters() {
        assert_eq!(swizzle("xy", VectorSize::Bi).unwrap().as_slice(), &[0, 1]);
        assert_eq!(swizzle("abgr", VectorSize::Quad).unwrap().as_slice(), &[3, 2, 1, 0]);
        assert!(swizzle("xyzwx", VectorSize::Quad).is_none());
        assert!(swizzle("z", VectorSize::Bi).is_none());
        assert!(swizzle("", VectorSize::Bi).is_none());
        assert!(swizzle("q", VectorSize::Quad).is_none());
    }
}
