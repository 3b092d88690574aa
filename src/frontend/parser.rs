use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, trace};

use crate::frontend::{
    SourceFile,
    ast::{
        Ast, Attribute, BinaryOperator, ClassDeclaration, Declaration, Expression,
        FunctionDeclaration, ParameterDeclaration, Statement, TypeSpec, UnaryOperator,
        VariableDeclaration,
    },
    import::ImportResolver,
    lexer::{Keyword, LexError, Lexer, Span, Token, TokenKind},
};

#[derive(Debug)]
pub struct Parser<'imports> {
    tokens: Vec<Token>,
    position: usize,
    imports: &'imports ImportResolver,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("Expected {expected} but found `{found}`")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Invalid primary expression `{found}`")]
    InvalidPrimaryExpression { found: String, span: Span },
    #[error("Invalid declaration token `{found}`")]
    InvalidDeclaration { found: String, span: Span },
    #[error("Invalid type name `{found}`")]
    InvalidTypeName { found: String, span: Span },
    #[error("Invalid attribute `{name}`")]
    UnknownAttribute { name: String, span: Span },
    #[error("Attribute `{name}` does not take arguments")]
    AttributeArguments { name: String, span: Span },
    #[error("Numeric literal `{text}` does not fit in 64 bits")]
    NumericLiteralOutOfRange { text: String, span: Span },
    #[error("Expected an identifier or member access (name::name) for import path")]
    InvalidImportPath { span: Span },
    #[error("No such file or directory to import `{path}`")]
    ImportNotFound { path: String, span: Span },
    #[error("Failed to read imported file `{}`: {source}", path.display())]
    ImportRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    InImport {
        path: PathBuf,
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Location of the error in the unit being parsed. Errors which happened
    /// while reading or parsing an imported unit have none.
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::Lex(error) => Some(error.span()),
            ParseError::UnexpectedToken { span, .. }
            | ParseError::InvalidPrimaryExpression { span, .. }
            | ParseError::InvalidDeclaration { span, .. }
            | ParseError::InvalidTypeName { span, .. }
            | ParseError::UnknownAttribute { span, .. }
            | ParseError::AttributeArguments { span, .. }
            | ParseError::NumericLiteralOutOfRange { span, .. }
            | ParseError::InvalidImportPath { span }
            | ParseError::ImportNotFound { span, .. } => Some(*span),
            ParseError::ImportRead { .. } | ParseError::InImport { .. } => None,
        }
    }
}

fn binary_operator(kind: TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::Plus => Some(BinaryOperator::Add),
        TokenKind::Minus => Some(BinaryOperator::Subtract),
        TokenKind::Asterisk => Some(BinaryOperator::Multiply),
        TokenKind::Percent => Some(BinaryOperator::Modulus),
        TokenKind::DoubleEquals => Some(BinaryOperator::Equals),
        _ => None,
    }
}

impl<'imports> Parser<'imports> {
    /// Lexes and parses a whole unit, inlining everything it imports.
    pub fn parse_ast(source: &SourceFile, imports: &'imports ImportResolver) -> Result<Ast, ParseError> {
        let tokens = Lexer::new(source).lex_all_tokens()?;

        let mut parser = Self {
            tokens,
            position: 0,
            imports,
        };

        let mut ast = Ast::default();

        while parser.peek().kind != TokenKind::Eof {
            ast.declarations.extend(parser.parse_declaration()?);
        }

        debug!(
            "parsed {} top level declarations from {}",
            ast.declarations.len(),
            source.origin
        );

        Ok(ast)
    }

    fn peek(&self) -> &Token {
        // The stream always ends with an EOF token which is never consumed
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();

        if token.kind != TokenKind::Eof {
            self.position += 1;
        }

        token
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let found = self.peek();

        ParseError::UnexpectedToken {
            expected: expected.to_owned(),
            found: found.text.clone(),
            span: found.span,
        }
    }

    fn expect_next_to_be(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        if !self.peek_is(kind) {
            return Err(self.unexpected(expected));
        }

        Ok(self.advance())
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token, ParseError> {
        self.expect_next_to_be(TokenKind::Keyword(keyword), &format!("`{keyword}`"))
    }

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        Ok(self
            .expect_next_to_be(TokenKind::Identifier, "identifier")?
            .text)
    }

    /// A single import may expand to any number of declarations
    fn parse_declaration(&mut self) -> Result<Vec<Declaration>, ParseError> {
        match self.peek().kind {
            TokenKind::Keyword(Keyword::Import) => self.parse_import_declaration(),
            TokenKind::Keyword(Keyword::Func) => Ok(vec![self.parse_function_declaration()?]),
            TokenKind::Keyword(Keyword::Class) => Ok(vec![self.parse_class_declaration()?]),
            TokenKind::Keyword(Keyword::Var) => Ok(vec![self.parse_variable_declaration()?]),
            _ => {
                let token = self.peek();

                Err(ParseError::InvalidDeclaration {
                    found: token.text.clone(),
                    span: token.span,
                })
            }
        }
    }

    // import std::io;
    fn parse_import_declaration(&mut self) -> Result<Vec<Declaration>, ParseError> {
        self.expect_keyword(Keyword::Import)?;

        let start = self.peek().span.start;
        let path_expression = self.parse_postfix_expression()?;
        let span = Span::new(start, self.peek().span.start);

        self.expect_next_to_be(TokenKind::Semicolon, "`;` after import")?;

        let mut segments = Vec::new();
        collect_import_segments(&path_expression, &mut segments, span)?;

        let Some(path) = self.imports.resolve(&segments) else {
            return Err(ParseError::ImportNotFound {
                path: segments.join("::"),
                span,
            });
        };

        trace!("importing {}", path.display());

        let source = SourceFile::read(&path).map_err(|source| ParseError::ImportRead {
            path: path.clone(),
            source,
        })?;

        let imported = Parser::parse_ast(&source, self.imports).map_err(|error| {
            ParseError::InImport {
                path,
                source: Box::new(error),
            }
        })?;

        Ok(imported.declarations)
    }

    // class Name { ... }
    fn parse_class_declaration(&mut self) -> Result<Declaration, ParseError> {
        self.expect_keyword(Keyword::Class)?;

        let name = self.parse_identifier()?;
        let body = self.parse_compound_statement()?;

        Ok(Declaration::Class(ClassDeclaration { name, body }))
    }

    // func @attrib(public) name(a: i32, b: *u64) : i32 statement
    fn parse_function_declaration(&mut self) -> Result<Declaration, ParseError> {
        self.expect_keyword(Keyword::Func)?;

        let attributes = self.parse_attributes()?;
        let name = self.parse_identifier()?;

        let mut parameters = Vec::new();

        self.expect_next_to_be(TokenKind::OpenParen, "`(` after function name")?;

        if !self.peek_is(TokenKind::CloseParen) {
            parameters.push(self.parse_parameter_declaration()?);

            while self.peek_is(TokenKind::Comma) {
                self.advance();
                parameters.push(self.parse_parameter_declaration()?);
            }
        }

        self.expect_next_to_be(TokenKind::CloseParen, "`)` after function parameters")?;

        // Constructors and destructors have no written return type
        let return_type = match name.as_str() {
            "new" => TypeSpec::new(0, "IMPLICIT THIS"),
            "delete" => TypeSpec::new(0, "IMPLICIT VOID"),
            _ => self.parse_type_spec_with_colon()?,
        };

        let body = self.parse_statement()?;

        Ok(Declaration::Function(Box::new(FunctionDeclaration {
            name,
            attributes,
            parameters,
            return_type,
            body,
        })))
    }

    // name: Type
    fn parse_parameter_declaration(&mut self) -> Result<ParameterDeclaration, ParseError> {
        let name = self.parse_identifier()?;
        let ty = self.parse_type_spec_with_colon()?;

        Ok(ParameterDeclaration { name, ty })
    }

    // var @attrib(private) name : Type = value;
    fn parse_variable_declaration(&mut self) -> Result<Declaration, ParseError> {
        self.expect_keyword(Keyword::Var)?;

        let attributes = self.parse_attributes()?;
        let name = self.parse_identifier()?;
        let ty = self.parse_type_spec_with_colon()?;

        let value = if self.peek_is(TokenKind::Equals) {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect_next_to_be(TokenKind::Semicolon, "`;` after variable declaration")?;

        Ok(Declaration::Variable(VariableDeclaration {
            name,
            attributes,
            ty,
            value,
        }))
    }

    // @attrib(public no_mangle)
    fn parse_attributes(&mut self) -> Result<Vec<Attribute>, ParseError> {
        if !self.peek_is(TokenKind::At) {
            return Ok(Vec::new());
        }

        self.advance();
        self.expect_keyword(Keyword::Attrib)?;
        self.expect_next_to_be(TokenKind::OpenParen, "`(` after `@attrib`")?;

        let mut attributes = Vec::new();

        while !self.peek_is(TokenKind::CloseParen) {
            let token = self.advance();

            let Ok(attribute) = token.text.parse::<Attribute>() else {
                return Err(ParseError::UnknownAttribute {
                    name: token.text,
                    span: token.span,
                });
            };

            if self.peek_is(TokenKind::OpenParen) {
                return Err(ParseError::AttributeArguments {
                    name: token.text,
                    span: self.peek().span,
                });
            }

            attributes.push(attribute);
        }

        self.expect_next_to_be(TokenKind::CloseParen, "`)` after attributes")?;

        Ok(attributes)
    }

    fn parse_type_spec_with_colon(&mut self) -> Result<TypeSpec, ParseError> {
        self.expect_next_to_be(TokenKind::Colon, "`:` before type")?;
        self.parse_type_spec()
    }

    // **name
    fn parse_type_spec(&mut self) -> Result<TypeSpec, ParseError> {
        let mut pointer_depth = 0;

        while self.peek_is(TokenKind::Asterisk) {
            self.advance();
            pointer_depth += 1;
        }

        let token = self.advance();

        let name = match token.kind {
            TokenKind::Identifier => token.text,
            TokenKind::Keyword(keyword) if keyword.is_type_name() => keyword.to_string(),
            _ => {
                return Err(ParseError::InvalidTypeName {
                    found: token.text,
                    span: token.span,
                });
            }
        };

        Ok(TypeSpec {
            pointer_depth,
            name,
        })
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek().kind {
            TokenKind::Keyword(Keyword::Var | Keyword::Class | Keyword::Func) => {
                let mut declarations = self.parse_declaration()?;

                // Only imports expand to more than one declaration
                match declarations.pop() {
                    Some(declaration) => Ok(Statement::Declaration(Box::new(declaration))),
                    None => Err(self.unexpected("declaration")),
                }
            }
            TokenKind::Keyword(Keyword::Return) => {
                self.advance();

                let expression = self.parse_expression()?;
                self.expect_next_to_be(TokenKind::Semicolon, "`;` after return value")?;

                Ok(Statement::Return(expression))
            }
            TokenKind::Keyword(Keyword::If) => self.parse_if_statement(),
            TokenKind::OpenBrace => self.parse_compound_statement(),
            _ => {
                let expression = self.parse_expression()?;
                self.expect_next_to_be(TokenKind::Semicolon, "`;` after expression")?;

                Ok(Statement::Expression(expression))
            }
        }
    }

    // if (condition) statement else statement
    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::If)?;
        self.expect_next_to_be(TokenKind::OpenParen, "`(` before condition")?;

        let condition = self.parse_expression()?;

        self.expect_next_to_be(TokenKind::CloseParen, "`)` after condition")?;

        let positive = Box::new(self.parse_statement()?);

        let negative = if self.peek_is(TokenKind::Keyword(Keyword::Else)) {
            self.advance();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            positive,
            negative,
        })
    }

    // { statement* }
    fn parse_compound_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_next_to_be(TokenKind::OpenBrace, "`{`")?;

        let mut statements = Vec::new();

        while !self.peek_is(TokenKind::CloseBrace) {
            if self.peek_is(TokenKind::Eof) {
                return Err(self.unexpected("`}`"));
            }

            statements.push(self.parse_statement()?);
        }

        self.expect_next_to_be(TokenKind::CloseBrace, "`}`")?;

        Ok(Statement::Compound(statements))
    }

    /// expression -> cast
    /// cast       -> assignment ( "as" type )*
    /// assignment -> infix ( "=" expression )*
    /// infix      -> unary ( OPERATOR infix )*   (precedence climbing)
    /// unary      -> "-" unary | postfix
    /// postfix    -> primary ( ( "." | "::" ) primary | "(" arguments ")" )*
    /// primary    -> IDENTIFIER | STRING | NUMBER | KEYWORD | "(" expression ")"
    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expression = self.parse_assignment_expression()?;

        while self.peek_is(TokenKind::Keyword(Keyword::As)) {
            self.advance();

            let ty = self.parse_type_spec()?;
            expression = expression.cast(ty);
        }

        Ok(expression)
    }

    fn parse_assignment_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expression = self.parse_infix_expression(0)?;

        while self.peek_is(TokenKind::Equals) {
            self.advance();

            let value = self.parse_expression()?;

            expression = Expression::Assignment {
                assignee: Box::new(expression),
                value: Box::new(value),
            };
        }

        Ok(expression)
    }

    fn parse_infix_expression(&mut self, min_precedence: usize) -> Result<Expression, ParseError> {
        let mut lhs = self.parse_unary_expression()?;

        while let Some(operator) = binary_operator(self.peek().kind) {
            if operator.precedence() < min_precedence {
                break;
            }

            self.advance();

            let rhs = self.parse_infix_expression(operator.precedence() + 1)?;

            lhs = Expression::Binary {
                lhs: Box::new(lhs),
                operator,
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, ParseError> {
        if self.peek_is(TokenKind::Minus) {
            self.advance();

            let operand = self.parse_unary_expression()?;

            return Ok(Expression::Unary {
                operator: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }

        self.parse_postfix_expression()
    }

    fn parse_postfix_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expression = self.parse_primary_expression()?;

        loop {
            match self.peek().kind {
                TokenKind::Dot | TokenKind::DoubleColon => {
                    self.advance();

                    let property = self.parse_primary_expression()?;

                    expression = Expression::MemberAccess {
                        parent: Box::new(expression),
                        property: Box::new(property),
                    };
                }
                TokenKind::OpenParen => {
                    self.advance();

                    let mut arguments = Vec::new();

                    if !self.peek_is(TokenKind::CloseParen) {
                        arguments.push(self.parse_expression()?);

                        while self.peek_is(TokenKind::Comma) {
                            self.advance();
                            arguments.push(self.parse_expression()?);
                        }
                    }

                    self.expect_next_to_be(TokenKind::CloseParen, "`)` after call arguments")?;

                    expression = Expression::FunctionCall {
                        callee: Box::new(expression),
                        arguments,
                    };
                }
                _ => return Ok(expression),
            }
        }
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, ParseError> {
        let token = self.advance();

        match token.kind {
            TokenKind::Identifier => Ok(Expression::IdentifierLiteral(token.text)),
            TokenKind::StringLiteral => Ok(Expression::StringLiteral(token.text)),
            TokenKind::NumberLiteral => parse_numeric_literal(&token).map(Expression::NumericLiteral),
            TokenKind::OpenParen => {
                let expression = self.parse_expression()?;
                self.expect_next_to_be(TokenKind::CloseParen, "`)`")?;
                Ok(expression)
            }
            // Keywords may be used as plain names in expression position
            TokenKind::Keyword(keyword) => Ok(Expression::IdentifierLiteral(keyword.to_string())),
            _ => Err(ParseError::InvalidPrimaryExpression {
                found: token.text,
                span: token.span,
            }),
        }
    }
}

fn parse_numeric_literal(token: &Token) -> Result<i128, ParseError> {
    let parsed = match token.text.strip_prefix("0x") {
        Some(digits) => u64::from_str_radix(digits, 16),
        None => token.text.parse::<u64>(),
    };

    parsed
        .map(i128::from)
        .map_err(|_| ParseError::NumericLiteralOutOfRange {
            text: token.text.clone(),
            span: token.span,
        })
}

fn collect_import_segments(
    expression: &Expression,
    segments: &mut Vec<String>,
    span: Span,
) -> Result<(), ParseError> {
    match expression {
        Expression::IdentifierLiteral(name) => {
            segments.push(name.clone());
            Ok(())
        }
        Expression::MemberAccess { parent, property } => {
            collect_import_segments(parent, segments, span)?;
            collect_import_segments(property, segments, span)
        }
        _ => Err(ParseError::InvalidImportPath { span }),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(source: &str) -> Result<Ast, ParseError> {
        let resolver = ImportResolver::new(Vec::new());
        Parser::parse_ast(&SourceFile::from_memory(source), &resolver)
    }

    fn parse_expression(source: &str) -> Expression {
        let ast = parse(&format!("var x : i32 = {source};")).expect("expression should parse");

        match ast.declarations.into_iter().next() {
            Some(Declaration::Variable(VariableDeclaration {
                value: Some(value), ..
            })) => value,
            other => panic!("expected a variable declaration, got {other:?}"),
        }
    }

    fn identifier(name: &str) -> Box<Expression> {
        Box::new(Expression::IdentifierLiteral(name.into()))
    }

    fn number(value: i128) -> Box<Expression> {
        Box::new(Expression::NumericLiteral(value))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse_expression("1 + 2 * 3"),
            Expression::Binary {
                lhs: number(1),
                operator: BinaryOperator::Add,
                rhs: Box::new(Expression::Binary {
                    lhs: number(2),
                    operator: BinaryOperator::Multiply,
                    rhs: number(3),
                }),
            }
        );
    }

    #[test]
    fn same_precedence_is_left_associative() {
        assert_eq!(
            parse_expression("a - b + c"),
            Expression::Binary {
                lhs: Box::new(Expression::Binary {
                    lhs: identifier("a"),
                    operator: BinaryOperator::Subtract,
                    rhs: identifier("b"),
                }),
                operator: BinaryOperator::Add,
                rhs: identifier("c"),
            }
        );
    }

    #[test]
    fn cast_binds_loosest() {
        assert_eq!(
            parse_expression("a + 1 as u64"),
            Expression::Binary {
                lhs: identifier("a"),
                operator: BinaryOperator::Add,
                rhs: number(1),
            }
            .cast(TypeSpec::new(0, "u64"))
        );
    }

    #[test]
    fn assignment_is_right_recursive() {
        assert_eq!(
            parse_expression("a = b = 0x10"),
            Expression::Assignment {
                assignee: identifier("a"),
                value: Box::new(Expression::Assignment {
                    assignee: identifier("b"),
                    value: number(16),
                }),
            }
        );
    }

    #[test]
    fn postfix_chains_left_to_right() {
        assert_eq!(
            parse_expression("-std::io.print(1, \"a\")"),
            Expression::Unary {
                operator: UnaryOperator::Negate,
                operand: Box::new(Expression::FunctionCall {
                    callee: Box::new(Expression::MemberAccess {
                        parent: Box::new(Expression::MemberAccess {
                            parent: identifier("std"),
                            property: identifier("io"),
                        }),
                        property: identifier("print"),
                    }),
                    arguments: vec![
                        Expression::NumericLiteral(1),
                        Expression::StringLiteral("\"a\"".into()),
                    ],
                }),
            }
        );
    }

    #[test]
    fn keywords_are_accepted_as_names() {
        assert_eq!(parse_expression("(return)"), *identifier("return"));
    }

    #[test]
    fn parses_function_with_attributes() {
        let ast = parse(indoc! {"
            func @attrib(public no_mangle) add(a: i32, b: *u64) : i32 {
                return a;
            }
        "})
        .unwrap();

        assert_eq!(
            ast.declarations,
            vec![Declaration::Function(Box::new(FunctionDeclaration {
                name: "add".into(),
                attributes: vec![Attribute::Public, Attribute::NoMangle],
                parameters: vec![
                    ParameterDeclaration {
                        name: "a".into(),
                        ty: TypeSpec::new(0, "i32"),
                    },
                    ParameterDeclaration {
                        name: "b".into(),
                        ty: TypeSpec::new(1, "u64"),
                    },
                ],
                return_type: TypeSpec::new(0, "i32"),
                body: Statement::Compound(vec![Statement::Return(*identifier("a"))]),
            }))]
        );
    }

    #[test]
    fn constructors_get_implicit_return_types() {
        let ast = parse("func new() {} func delete() {}").unwrap();

        let return_types: Vec<_> = ast
            .declarations
            .iter()
            .map(|declaration| match declaration {
                Declaration::Function(function) => function.return_type.name.as_str(),
                _ => unreachable!(),
            })
            .collect();

        assert_eq!(return_types, vec!["IMPLICIT THIS", "IMPLICIT VOID"]);
    }

    #[test]
    fn parses_statements() {
        let ast = parse(indoc! {"
            func f(a: i32) : i32 {
                var b : i32 = a;
                if (b) { b = 1; } else return 2;
                f(b);
                return b;
            }
        "})
        .unwrap();

        let Declaration::Function(function) = &ast.declarations[0] else {
            panic!("expected function");
        };

        let Statement::Compound(statements) = &function.body else {
            panic!("expected compound body");
        };

        assert_eq!(statements.len(), 4);
        assert!(matches!(statements[0], Statement::Declaration(_)));
        assert!(matches!(
            statements[1],
            Statement::If {
                negative: Some(_),
                ..
            }
        ));
        assert!(matches!(
            statements[2],
            Statement::Expression(Expression::FunctionCall { .. })
        ));
        assert!(matches!(statements[3], Statement::Return(_)));
    }

    #[test]
    fn unknown_attribute_is_an_error() {
        assert!(matches!(
            parse("var @attrib(inline) x : i32;"),
            Err(ParseError::UnknownAttribute { name, .. }) if name == "inline"
        ));
    }

    #[test]
    fn attribute_arguments_are_rejected() {
        assert!(matches!(
            parse("var @attrib(public(1)) x : i32;"),
            Err(ParseError::AttributeArguments { .. })
        ));
    }

    #[test]
    fn missing_semicolon_is_an_error() {
        assert!(matches!(
            parse("var x : i32 = 1"),
            Err(ParseError::UnexpectedToken { found, .. }) if found.is_empty()
        ));
    }

    #[test]
    fn invalid_declaration_is_an_error() {
        assert!(matches!(
            parse("return 1;"),
            Err(ParseError::InvalidDeclaration { found, .. }) if found == "return"
        ));
    }

    #[test]
    fn invalid_primary_expression_is_an_error() {
        assert!(matches!(
            parse("var x : i32 = ;"),
            Err(ParseError::InvalidPrimaryExpression { found, .. }) if found == ";"
        ));
    }

    #[test]
    fn invalid_type_name_is_an_error() {
        assert!(matches!(
            parse("var x : 5;"),
            Err(ParseError::InvalidTypeName { found, .. }) if found == "5"
        ));
    }

    #[test]
    fn oversized_literal_is_an_error() {
        assert!(matches!(
            parse("var x : u64 = 18446744073709551616;"),
            Err(ParseError::NumericLiteralOutOfRange { .. })
        ));
        assert_eq!(
            parse_expression("0xFFFFFFFFFFFFFFFF"),
            *number(u64::MAX as i128)
        );
    }

    #[test]
    fn unresolved_import_is_an_error() {
        assert!(matches!(
            parse("import foo::bar;"),
            Err(ParseError::ImportNotFound { path, .. }) if path == "foo::bar"
        ));
    }

    #[test]
    fn import_path_must_be_names() {
        assert!(matches!(
            parse("import foo(1);"),
            Err(ParseError::InvalidImportPath { .. })
        ));
    }

    #[test]
    fn imports_are_spliced_in_place() -> std::io::Result<()> {
        let root = mktemp::Temp::new_dir()?;
        fs::create_dir_all(root.as_path().join("std"))?;
        fs::write(
            root.as_path().join("std/math.lng"),
            "import base; var two : i32 = 2;",
        )?;
        fs::write(root.as_path().join("base.lng"), "var one : i32 = 1;")?;

        let resolver = ImportResolver::new(vec![root.as_path().to_path_buf()]);
        let source = SourceFile::from_memory("var zero : i32; import std::math; var three : i32;");
        let ast = Parser::parse_ast(&source, &resolver).unwrap();

        let names: Vec<_> = ast
            .declarations
            .iter()
            .map(|declaration| match declaration {
                Declaration::Variable(variable) => variable.name.as_str(),
                other => panic!("expected only variables, got {other:?}"),
            })
            .collect();
        assert_eq!(names, vec!["zero", "one", "two", "three"]);

        Ok(())
    }

    #[test]
    fn errors_in_imports_are_wrapped() -> std::io::Result<()> {
        let root = mktemp::Temp::new_dir()?;
        fs::write(root.as_path().join("broken.lng"), "var x : i32 = $;")?;

        let resolver = ImportResolver::new(vec![root.as_path().to_path_buf()]);
        let result = Parser::parse_ast(&SourceFile::from_memory("import broken;"), &resolver);

        let Err(error) = result else {
            panic!("import should fail");
        };

        assert!(error.span().is_none());
        assert!(matches!(
            error,
            ParseError::InImport { ref source, .. } if matches!(**source, ParseError::Lex(_))
        ));

        Ok(())
    }
}
