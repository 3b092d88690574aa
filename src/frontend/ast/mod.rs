use strum::{Display, EnumString};

use crate::middle::primitive::PrimitiveKind;

pub mod pretty_print;

/// A whole translation unit after import inlining
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ast {
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Class(ClassDeclaration),
    Function(Box<FunctionDeclaration>),
    Variable(VariableDeclaration),
    Parameter(ParameterDeclaration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDeclaration {
    pub name: String,
    pub body: Statement,
}

/// func [@attrib(...)] name(params) : return_type body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub parameters: Vec<ParameterDeclaration>,
    pub return_type: TypeSpec,
    pub body: Statement,
}

/// var [@attrib(...)] name : ty [= value];
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclaration {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub ty: TypeSpec,
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDeclaration {
    pub name: String,
    pub ty: TypeSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    If {
        condition: Expression,
        positive: Box<Statement>,
        negative: Option<Box<Statement>>,
    },
    Compound(Vec<Statement>),
    Expression(Expression),
    Declaration(Box<Declaration>),
    Return(Expression),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCategory {
    Lvalue,
    Rvalue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// parent.property or parent::property
    MemberAccess {
        parent: Box<Expression>,
        property: Box<Expression>,
    },
    Assignment {
        assignee: Box<Expression>,
        value: Box<Expression>,
    },
    FunctionCall {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Binary {
        lhs: Box<Expression>,
        operator: BinaryOperator,
        rhs: Box<Expression>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Cast {
        expression: Box<Expression>,
        ty: TypeSpec,
    },
    /// Keeps the surrounding quotes
    StringLiteral(String),
    IdentifierLiteral(String),
    NumericLiteral(i128),
    /// Reads the value stored at an lvalue
    LvalueToRvalue(Box<Expression>),
}

impl Expression {
    pub fn value_category(&self) -> ValueCategory {
        match self {
            Expression::MemberAccess { .. }
            | Expression::StringLiteral(_)
            | Expression::IdentifierLiteral(_) => ValueCategory::Lvalue,
            Expression::Assignment { .. }
            | Expression::FunctionCall { .. }
            | Expression::Binary { .. }
            | Expression::Unary { .. }
            | Expression::Cast { .. }
            | Expression::NumericLiteral(_)
            | Expression::LvalueToRvalue(_) => ValueCategory::Rvalue,
        }
    }

    pub fn is_lvalue(&self) -> bool {
        self.value_category() == ValueCategory::Lvalue
    }

    /// Wraps lvalues in a read of their value, leaves rvalues untouched
    pub fn into_rvalue(self) -> Expression {
        match self.value_category() {
            ValueCategory::Lvalue => Expression::LvalueToRvalue(Box::new(self)),
            ValueCategory::Rvalue => self,
        }
    }

    pub fn cast(self, ty: TypeSpec) -> Expression {
        Expression::Cast {
            expression: Box::new(self),
            ty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BinaryOperator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "%")]
    Modulus,
    #[strum(serialize = "==")]
    Equals,
}

impl BinaryOperator {
    /// Binding strength used for precedence climbing, higher binds tighter
    pub fn precedence(self) -> usize {
        match self {
            BinaryOperator::Equals => 8,
            BinaryOperator::Add | BinaryOperator::Subtract => 11,
            BinaryOperator::Multiply | BinaryOperator::Modulus => 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum UnaryOperator {
    #[strum(serialize = "-")]
    Negate,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeSpec {
    pub pointer_depth: usize,
    pub name: String,
}

impl TypeSpec {
    pub fn new(pointer_depth: usize, name: impl Into<String>) -> Self {
        Self {
            pointer_depth,
            name: name.into(),
        }
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::new(0, kind.to_string())
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer_depth > 0
    }

    /// The primitive this type behaves as. Pointers act as `u64`.
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        if self.is_pointer() {
            return Some(PrimitiveKind::U64);
        }

        self.name.parse().ok()
    }

    pub fn is_integer(&self) -> bool {
        self.as_primitive().is_some_and(|p| p.is_integer())
    }
}

impl core::fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", "*".repeat(self.pointer_depth), self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Attribute {
    Public,
    Private,
    NoMangle,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn value_category_follows_variant() {
        let identifier = Expression::IdentifierLiteral("a".into());
        let string = Expression::StringLiteral("\"a\"".into());
        let number = Expression::NumericLiteral(1);

        assert_eq!(identifier.value_category(), ValueCategory::Lvalue);
        assert_eq!(string.value_category(), ValueCategory::Lvalue);
        assert_eq!(number.value_category(), ValueCategory::Rvalue);
        assert_eq!(
            identifier.clone().into_rvalue().value_category(),
            ValueCategory::Rvalue
        );
        assert_eq!(
            number.clone().cast(TypeSpec::primitive(PrimitiveKind::I64)).value_category(),
            ValueCategory::Rvalue
        );
    }

    #[test]
    fn into_rvalue_only_wraps_lvalues() {
        let number = Expression::NumericLiteral(3);
        assert_eq!(number.clone().into_rvalue(), number);

        let identifier = Expression::IdentifierLiteral("x".into());
        assert_eq!(
            identifier.clone().into_rvalue(),
            Expression::LvalueToRvalue(Box::new(identifier))
        );
    }

    #[test]
    fn pointers_behave_as_u64() {
        let pointer = TypeSpec::new(2, "i32");

        assert_eq!(pointer.as_primitive(), Some(PrimitiveKind::U64));
        assert!(pointer.is_integer());
        assert_eq!(pointer.to_string(), "**i32");
    }

    #[test]
    fn attribute_names() {
        assert_eq!("no_mangle".parse::<Attribute>(), Ok(Attribute::NoMangle));
        assert_eq!(Attribute::Public.to_string(), "public");
        assert!("section".parse::<Attribute>().is_err());
    }

    #[test]
    fn operator_precedence_ordering() {
        assert!(BinaryOperator::Multiply.precedence() > BinaryOperator::Add.precedence());
        assert!(BinaryOperator::Add.precedence() > BinaryOperator::Equals.precedence());
        assert_eq!(
            BinaryOperator::Subtract.precedence(),
            BinaryOperator::Add.precedence()
        );
    }
}
