//! WGSL's automatic conversions.

use crate::types::{Scalar, Type};

impl Scalar {
    /// Find the common type of `self` and `other` under WGSL's
    /// automatic conversions.
    ///
    /// If either scalar abstracts the other, the more concrete one wins.
    /// Otherwise there is no common type.
    pub const fn automatic_conversion_combine(self, other: Self) -> Option<Scalar> {
        if self.is_abstraction_of(other) {
            Some(other)
        } else if other.is_abstraction_of(self) {
            Some(self)
        } else {
            None
        }
    }

    /// Combine a list of scalars pairwise, left to right.
    pub fn automatic_conversion_consensus<I>(scalars: I) -> Option<Option<Scalar>>
    where
        I: IntoIterator<Item = Scalar>,
    {
        let mut consensus = None;
        for scalar in scalars {
            consensus = Some(match consensus {
                None => scalar,
                Some(previous) => Scalar::automatic_conversion_combine(previous, scalar)?,
            });
        }
        Some(consensus)
    }
}

impl Type {
    /// Find the type both `self` and `other` convert to, if any.
    ///
    /// This is the unification used for binary operands, inferred array
    /// elements and builtin arguments: whichever type abstracts the other
    /// gives way to it. References are compared by the type they store.
    pub fn automatic_conversion_combine(&self, other: &Type) -> Option<Type> {
        let (left, right) = (self.store_type(), other.store_type());
        if left.is_abstraction_of(right) {
            Some(right.clone())
        } else if right.is_abstraction_of(left) {
            Some(left.clone())
        } else {
            None
        }
    }

    /// Unify every type of a list. `None` if some pair has no common type or
    /// the list is empty.
    pub fn automatic_conversion_consensus<'a, I>(types: I) -> Option<Type>
    where
        I: IntoIterator<Item = &'a Type>,
    {
        let mut types = types.into_iter();
        let first = types.next()?.store_type().clone();
        types.try_fold(first, |consensus, ty| consensus.automatic_conversion_combine(ty))
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{AccessMode, AddressSpace, Scalar, Type, VectorSize};

    #[test]
    fn combine_scalars() {
        assert_eq!(
            Scalar::AbstractInt.automatic_conversion_combine(Scalar::AbstractFloat),
            Some(Scalar::AbstractFloat)
        );
        assert_eq!(
            Scalar::F32.automatic_conversion_combine(Scalar::AbstractInt),
            Some(Scalar::F32)
        );
        assert_eq!(Scalar::AbstractFloat.automatic_conversion_combine(Scalar::U32), None);
        assert_eq!(Scalar::I32.automatic_conversion_combine(Scalar::U32), None);
        assert_eq!(
            Scalar::automatic_conversion_consensus(vec![
                Scalar::AbstractInt,
                Scalar::AbstractFloat,
                Scalar::F16
            ]),
            Some(Some(Scalar::F16))
        );
        assert_eq!(Scalar::automatic_conversion_consensus(vec![]), Some(None));
        assert_eq!(
            Scalar::automatic_conversion_consensus(vec![Scalar::I32, Scalar::F32]),
            None
        );
    }

    #[test]
    fn combine_types() {
        let abstract_vec = Type::vector(VectorSize::Bi, Scalar::AbstractInt);
        let float_vec = Type::vector(VectorSize::Bi, Scalar::F32);
        assert_eq!(
            abstract_vec.automatic_conversion_combine(&float_vec),
            Some(float_vec.clone())
        );
        assert_eq!(
            float_vec.automatic_conversion_combine(&abstract_vec),
            Some(float_vec.clone())
        );
        let reference = Type::reference(Type::I32, AddressSpace::Function, AccessMode::ReadWrite);
        assert_eq!(
            Type::Scalar(Scalar::AbstractInt).automatic_conversion_combine(&reference),
            Some(Type::I32)
        );
        assert_eq!(Type::F32.automatic_conversion_combine(&Type::I32), None);
        assert_eq!(
            Type::automatic_conversion_consensus(&[
                Type::Scalar(Scalar::AbstractInt),
                Type::Scalar(Scalar::AbstractFloat),
            ]),
            Some(Type::Scalar(Scalar::AbstractFloat))
        );
    }
}
