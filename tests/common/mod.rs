//! Building program trees by hand.
#![allow(dead_code)]

use wgsl_resolve::{
    ast::{self, Expression, Literal, Statement},
    types::{AccessMode, AddressSpace, Scalar, VectorSize},
    Handle,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
pub struct Builder {
    pub tu: ast::TranslationUnit,
}

impl Builder {
    pub fn new() -> Self {
        init_logger();
        Self::default()
    }

    pub fn enable(&mut self, extension: &str) {
        self.tu
            .directives
            .push(ast::Directive::Enable(vec![extension.to_string()]));
    }

    // Expressions

    pub fn lit(&mut self, literal: Literal) -> Handle<Expression> {
        self.tu.append_expression(Expression::Literal(literal))
    }

    pub fn int(&mut self, value: i64) -> Handle<Expression> {
        self.lit(Literal::AbstractInt(value))
    }

    pub fn float(&mut self, value: f64) -> Handle<Expression> {
        self.lit(Literal::AbstractFloat(value))
    }

    pub fn ident(&mut self, name: &str) -> Handle<Expression> {
        self.tu
            .append_expression(Expression::Identifier(name.to_string()))
    }

    pub fn binary(
        &mut self,
        op: ast::BinaryOperator,
        left: Handle<Expression>,
        right: Handle<Expression>,
    ) -> Handle<Expression> {
        self.tu
            .append_expression(Expression::Binary { op, left, right })
    }

    pub fn member(&mut self, base: Handle<Expression>, member: &str) -> Handle<Expression> {
        self.tu.append_expression(Expression::Member {
            base,
            member: member.to_string(),
        })
    }

    pub fn index(&mut self, base: Handle<Expression>, index: Handle<Expression>) -> Handle<Expression> {
        self.tu.append_expression(Expression::Index { base, index })
    }

    pub fn call(&mut self, callee: &str, args: Vec<Handle<Expression>>) -> Handle<Expression> {
        self.tu.append_expression(Expression::Call {
            callee: callee.to_string(),
            template: None,
            args,
        })
    }

    pub fn vec(
        &mut self,
        size: VectorSize,
        component: Option<Scalar>,
        args: Vec<Handle<Expression>>,
    ) -> Handle<Expression> {
        let component = component.map(|scalar| self.scalar_ty(scalar));
        self.tu.append_expression(Expression::Construct {
            ty: ast::ConstructorType::Vector { size, component },
            args,
        })
    }

    pub fn array(&mut self, args: Vec<Handle<Expression>>) -> Handle<Expression> {
        self.tu.append_expression(Expression::Construct {
            ty: ast::ConstructorType::Array {
                base: None,
                size: None,
            },
            args,
        })
    }

    // Types

    pub fn scalar_ty(&mut self, scalar: Scalar) -> Handle<ast::TypeDecl> {
        self.tu.append_type(ast::TypeDecl::Scalar(scalar))
    }

    pub fn vec_ty(&mut self, size: VectorSize, scalar: Scalar) -> Handle<ast::TypeDecl> {
        let component = self.scalar_ty(scalar);
        self.tu
            .append_type(ast::TypeDecl::Vector { size, component })
    }

    pub fn array_ty(
        &mut self,
        base: Handle<ast::TypeDecl>,
        size: Option<Handle<Expression>>,
    ) -> Handle<ast::TypeDecl> {
        self.tu.append_type(ast::TypeDecl::Array { base, size })
    }

    pub fn named_ty(&mut self, name: &str) -> Handle<ast::TypeDecl> {
        self.tu.append_type(ast::TypeDecl::Named(name.to_string()))
    }

    // Module-scope declarations

    pub fn constant(
        &mut self,
        name: &str,
        ty: Option<Handle<ast::TypeDecl>>,
        init: Handle<Expression>,
    ) -> Handle<ast::GlobalDecl> {
        self.tu.append_decl(ast::GlobalDecl::Constant(ast::Const {
            name: name.to_string(),
            ty,
            init,
        }))
    }

    pub fn global_var(
        &mut self,
        name: &str,
        space: Option<AddressSpace>,
        access: Option<AccessMode>,
        ty: Option<Handle<ast::TypeDecl>>,
        init: Option<Handle<Expression>>,
    ) -> Handle<ast::GlobalDecl> {
        self.tu.append_decl(ast::GlobalDecl::Variable(ast::GlobalVariable {
            attributes: Vec::new(),
            name: name.to_string(),
            space,
            access,
            ty,
            init,
        }))
    }

    /// `@group(group) @binding(binding) var<space> name: ty;`
    pub fn resource(
        &mut self,
        name: &str,
        group: i64,
        binding: i64,
        space: Option<AddressSpace>,
        ty: Handle<ast::TypeDecl>,
    ) -> Handle<ast::GlobalDecl> {
        let group = self.int(group);
        let binding = self.int(binding);
        self.tu.append_decl(ast::GlobalDecl::Variable(ast::GlobalVariable {
            attributes: vec![ast::Attribute::Group(group), ast::Attribute::Binding(binding)],
            name: name.to_string(),
            space,
            access: None,
            ty: Some(ty),
            init: None,
        }))
    }

    pub fn structure(
        &mut self,
        name: &str,
        members: Vec<(&str, Vec<ast::Attribute>, Handle<ast::TypeDecl>)>,
    ) -> Handle<ast::GlobalDecl> {
        let members = members
            .into_iter()
            .map(|(name, attributes, ty)| ast::StructMember {
                attributes,
                name: name.to_string(),
                ty,
            })
            .collect();
        self.tu.append_decl(ast::GlobalDecl::Struct(ast::Struct {
            name: name.to_string(),
            members,
        }))
    }

    pub fn function(
        &mut self,
        name: &str,
        parameters: Vec<(&str, Handle<ast::TypeDecl>)>,
        result: Option<Handle<ast::TypeDecl>>,
        body: Handle<ast::Block>,
    ) -> Handle<ast::GlobalDecl> {
        let parameters = parameters
            .into_iter()
            .map(|(name, ty)| ast::FunctionParameter {
                attributes: Vec::new(),
                name: name.to_string(),
                ty,
            })
            .collect();
        self.tu.append_decl(ast::GlobalDecl::Function(ast::Function {
            attributes: Vec::new(),
            name: name.to_string(),
            parameters,
            result: result.map(|ty| ast::FunctionResult {
                attributes: Vec::new(),
                ty,
            }),
            body,
        }))
    }

    // Statements

    pub fn stmt(&mut self, statement: Statement) -> Handle<Statement> {
        self.tu.append_statement(statement)
    }

    pub fn block(&mut self, stmts: Vec<Handle<Statement>>) -> Handle<ast::Block> {
        self.tu.append_block(stmts)
    }

    pub fn let_(&mut self, name: &str, init: Handle<Expression>) -> Handle<Statement> {
        self.stmt(Statement::Value(ast::LocalValue {
            name: name.to_string(),
            constant: false,
            ty: None,
            init,
        }))
    }

    pub fn const_(&mut self, name: &str, init: Handle<Expression>) -> Handle<Statement> {
        self.stmt(Statement::Value(ast::LocalValue {
            name: name.to_string(),
            constant: true,
            ty: None,
            init,
        }))
    }

    pub fn var(
        &mut self,
        name: &str,
        ty: Option<Handle<ast::TypeDecl>>,
        init: Option<Handle<Expression>>,
    ) -> Handle<Statement> {
        self.stmt(Statement::Variable(ast::LocalVariable {
            name: name.to_string(),
            space: None,
            access: None,
            ty,
            init,
        }))
    }

    pub fn lhs(&mut self, name: &str) -> Handle<ast::LhsExpression> {
        self.tu
            .append_lhs(ast::LhsExpression::Identifier(name.to_string()))
    }

    pub fn assign(&mut self, name: &str, rhs: Handle<Expression>) -> Handle<Statement> {
        let lhs = Some(self.lhs(name));
        self.stmt(Statement::Assignment { lhs, op: None, rhs })
    }

    pub fn ret(&mut self, value: Option<Handle<Expression>>) -> Handle<Statement> {
        self.stmt(Statement::Return(value))
    }
}
