/*!
Tests for decoding and encoding buffer contents.
*/

mod common;

use common::Builder;
use wgsl_resolve::{
    ast::{self, Expression, Literal},
    buffer::{self, CodecError, UniformBuffer},
    resolve,
    types::{AddressSpace, Scalar, Type, VectorSize},
    Handle, ResolvedEnvironment, ResourceBinding, ScopeEntry,
};

fn declared_type(env: &ResolvedEnvironment, name: &str) -> Type {
    env.lookup_global(name)
        .and_then(ScopeEntry::declared_type)
        .cloned()
        .expect("type declaration")
}

fn args(tu: &ast::TranslationUnit, expr: Handle<Expression>) -> Vec<Handle<Expression>> {
    match tu.expressions[expr] {
        Expression::Construct { ref args, .. } | Expression::Call { ref args, .. } => args.clone(),
        ref other => panic!("not a composite: {:?}", other),
    }
}

fn literal(tu: &ast::TranslationUnit, expr: Handle<Expression>) -> Literal {
    match tu.expressions[expr] {
        Expression::Literal(literal) => literal,
        ref other => panic!("not a literal: {:?}", other),
    }
}

/// `struct S { a: vec3<f32>, b: f32 }`
fn padded_struct(b: &mut Builder) {
    let vec3 = b.vec_ty(VectorSize::Tri, Scalar::F32);
    let f32_ty = b.scalar_ty(Scalar::F32);
    b.structure("S", vec![("a", Vec::new(), vec3), ("b", Vec::new(), f32_ty)]);
}

/// `struct S { x: i32, y: vec2<f32> }`
fn mixed_struct(b: &mut Builder) {
    let i32_ty = b.scalar_ty(Scalar::I32);
    let vec2 = b.vec_ty(VectorSize::Bi, Scalar::F32);
    b.structure("S", vec![("x", Vec::new(), i32_ty), ("y", Vec::new(), vec2)]);
}

#[test]
fn vec3_members_are_padded() {
    let mut b = Builder::new();
    padded_struct(&mut b);
    let env = resolve(&b.tu).unwrap();
    let ty = declared_type(&env, "S");

    let mut bytes = Vec::new();
    for value in &[1.0f32, 2.0, 3.0, -1.0, 4.5, -1.0, -1.0, -1.0] {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    assert_eq!(bytes.len(), 32);

    let mut tu = ast::TranslationUnit::new();
    let value = buffer::decode(&bytes, &ty, &mut tu).unwrap();
    let members = args(&tu, value);
    assert_eq!(members.len(), 2);
    let a = args(&tu, members[0]);
    assert_eq!(literal(&tu, a[2]), Literal::F32(3.0));
    // `b` starts at 16, not 12.
    assert_eq!(literal(&tu, members[1]), Literal::F32(4.5));

    let encoded = buffer::encode(&tu, value, &ty).unwrap();
    assert_eq!(encoded.len(), 20);
    assert_eq!(encoded[..12], bytes[..12]);
    assert_eq!(encoded[12..16], [0; 4]);
    assert_eq!(encoded[16..20], bytes[16..20]);
}

#[test]
fn struct_end_to_end() {
    let mut b = Builder::new();
    mixed_struct(&mut b);
    let env = resolve(&b.tu).unwrap();
    let ty = declared_type(&env, "S");

    let bytes = [5, 0, 0, 0, 0, 0, 0, 0, 0, 0, 128, 63, 0, 0, 0, 64];
    assert_eq!(buffer::byte_size(&ty).unwrap(), bytes.len());

    let mut tu = ast::TranslationUnit::new();
    let value = buffer::decode(&bytes, &ty, &mut tu).unwrap();
    match tu.expressions[value] {
        Expression::Call {
            ref callee,
            template: None,
            ref args,
        } => {
            assert_eq!(callee, "S");
            assert_eq!(args.len(), 2);
        }
        ref other => panic!("not a struct value: {:?}", other),
    }
    let members = args(&tu, value);
    assert_eq!(literal(&tu, members[0]), Literal::I32(5));
    match tu.expressions[members[1]] {
        Expression::Construct {
            ty:
                ast::ConstructorType::Vector {
                    size: VectorSize::Bi,
                    component: Some(component),
                },
            ref args,
        } => {
            assert!(matches!(
                tu.types[component],
                ast::TypeDecl::Scalar(Scalar::F32)
            ));
            assert_eq!(literal(&tu, args[0]), Literal::F32(1.0));
            assert_eq!(literal(&tu, args[1]), Literal::F32(2.0));
        }
        ref other => panic!("not a vector value: {:?}", other),
    }

    assert_eq!(buffer::encode(&tu, value, &ty).unwrap(), bytes.to_vec());
}

#[test]
fn member_layout_attributes() {
    // struct T { a: f32, @align(16) @size(8) b: u32, c: u32 }
    let mut b = Builder::new();
    let f32_ty = b.scalar_ty(Scalar::F32);
    let u32_ty = b.scalar_ty(Scalar::U32);
    let (sixteen, eight) = (b.int(16), b.int(8));
    let attributes = vec![ast::Attribute::Align(sixteen), ast::Attribute::Size(eight)];
    let other_u32 = b.scalar_ty(Scalar::U32);
    b.structure(
        "T",
        vec![
            ("a", Vec::new(), f32_ty),
            ("b", attributes, u32_ty),
            ("c", Vec::new(), other_u32),
        ],
    );
    let env = resolve(&b.tu).unwrap();
    let ty = declared_type(&env, "T");
    assert_eq!(buffer::byte_size(&ty).unwrap(), 28);

    let mut bytes = vec![0; 28];
    bytes[16..20].copy_from_slice(&7u32.to_le_bytes());
    bytes[24..28].copy_from_slice(&9u32.to_le_bytes());
    let mut tu = ast::TranslationUnit::new();
    let value = buffer::decode(&bytes, &ty, &mut tu).unwrap();
    let members = args(&tu, value);
    assert_eq!(literal(&tu, members[1]), Literal::U32(7));
    assert_eq!(literal(&tu, members[2]), Literal::U32(9));
}

#[test]
fn arrays_of_vectors() {
    let ty = Type::array(Type::vector(VectorSize::Bi, Scalar::I32), Some(3));
    let mut bytes = Vec::new();
    for value in 0i32..6 {
        bytes.extend_from_slice(&(-value).to_le_bytes());
    }

    let mut tu = ast::TranslationUnit::new();
    let value = buffer::decode(&bytes, &ty, &mut tu).unwrap();
    let elements = args(&tu, value);
    assert_eq!(elements.len(), 3);
    let last = args(&tu, elements[2]);
    assert_eq!(literal(&tu, last[1]), Literal::I32(-5));
    assert_eq!(buffer::encode(&tu, value, &ty).unwrap(), bytes);
}

#[test]
fn rejected_types() {
    let mut tu = ast::TranslationUnit::new();
    assert_eq!(
        buffer::decode(&[1, 0, 0, 0], &Type::BOOL, &mut tu),
        Err(CodecError::UnsupportedType(Type::BOOL))
    );
    let runtime_sized = Type::array(Type::F32, None);
    assert_eq!(
        buffer::decode(&[0; 16], &runtime_sized, &mut tu),
        Err(CodecError::UnsizedArray(runtime_sized))
    );
    assert_eq!(
        buffer::decode(&[0; 3], &Type::U32, &mut tu),
        Err(CodecError::BufferTooShort {
            needed: 4,
            found: 3
        })
    );

    let wrong = tu.append_expression(Expression::Literal(Literal::Bool(true)));
    assert!(matches!(
        buffer::encode(&tu, wrong, &Type::F32),
        Err(CodecError::UnexpectedExpression { .. })
    ));
}

#[test]
fn uniform_buffers() {
    let mut b = Builder::new();
    mixed_struct(&mut b);
    let s = b.named_ty("S");
    b.resource("u", 0, 1, Some(AddressSpace::Uniform), s);
    let env = resolve(&b.tu).unwrap();

    let buffers = vec![UniformBuffer {
        group: 0,
        binding: 1,
        data: vec![5, 0, 0, 0, 0, 0, 0, 0, 0, 0, 128, 63, 0, 0, 0, 64],
    }];
    let decoded = buffer::decode_uniform_buffers(&env, &mut b.tu, &buffers).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].name, "u");
    assert_eq!(
        decoded[0].binding,
        ResourceBinding {
            group: 0,
            binding: 1
        }
    );
    let members = args(&b.tu, decoded[0].value);
    assert_eq!(literal(&b.tu, members[0]), Literal::I32(5));

    let missing = vec![UniformBuffer {
        group: 3,
        binding: 0,
        data: Vec::new(),
    }];
    assert!(matches!(
        buffer::decode_uniform_buffers(&env, &mut b.tu, &missing),
        Err(CodecError::UnknownBinding(ResourceBinding {
            group: 3,
            binding: 0
        }))
    ));
}
