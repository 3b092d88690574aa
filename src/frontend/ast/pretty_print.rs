//! Tree dump of the AST, one node per line.

use core::fmt;

use colored::Colorize;
use itertools::Itertools;

use crate::frontend::ast::{Ast, Declaration, Expression, Statement, TypeSpec};

const INDENT_WIDTH: usize = 4;

struct TreePrinter<'f, 'a> {
    f: &'f mut fmt::Formatter<'a>,
    depth: usize,
}

impl TreePrinter<'_, '_> {
    fn line(&mut self, label: &str, detail: impl fmt::Display) -> fmt::Result {
        for _ in 0..self.depth {
            write!(self.f, "|{}", " ".repeat(INDENT_WIDTH - 1))?;
        }

        let detail = detail.to_string();

        if detail.is_empty() {
            writeln!(self.f, "|- {}", label.cyan())
        } else {
            writeln!(self.f, "|- {}: {detail}", label.cyan())
        }
    }

    fn nested(&mut self, body: impl FnOnce(&mut Self) -> fmt::Result) -> fmt::Result {
        self.depth += 1;
        let result = body(self);
        self.depth -= 1;
        result
    }

    fn declaration(&mut self, declaration: &Declaration) -> fmt::Result {
        match declaration {
            Declaration::Class(class) => {
                self.line("Class", class.name.blue())?;
                self.nested(|p| p.statement(&class.body))
            }
            Declaration::Function(function) => {
                self.line("Function", function.name.blue())?;
                self.nested(|p| {
                    if !function.attributes.is_empty() {
                        p.line("Attributes", function.attributes.iter().join(" "))?;
                    }

                    for parameter in &function.parameters {
                        p.line("Parameter", parameter.name.blue())?;
                        p.nested(|p| p.type_spec(&parameter.ty))?;
                    }

                    p.line("Return type", &function.return_type)?;
                    p.line("Body", "")?;
                    p.nested(|p| p.statement(&function.body))
                })
            }
            Declaration::Variable(variable) => {
                self.line("Variable", variable.name.blue())?;
                self.nested(|p| {
                    if !variable.attributes.is_empty() {
                        p.line("Attributes", variable.attributes.iter().join(" "))?;
                    }

                    p.type_spec(&variable.ty)?;

                    if let Some(value) = &variable.value {
                        p.line("Value", "")?;
                        p.nested(|p| p.expression(value))?;
                    }

                    Ok(())
                })
            }
            Declaration::Parameter(parameter) => {
                self.line("Parameter", parameter.name.blue())?;
                self.nested(|p| p.type_spec(&parameter.ty))
            }
        }
    }

    fn statement(&mut self, statement: &Statement) -> fmt::Result {
        match statement {
            Statement::If {
                condition,
                positive,
                negative,
            } => {
                self.line("If", "")?;
                self.nested(|p| {
                    p.line("Condition", "")?;
                    p.nested(|p| p.expression(condition))?;
                    p.line("True body", "")?;
                    p.nested(|p| p.statement(positive))?;

                    if let Some(negative) = negative {
                        p.line("False body", "")?;
                        p.nested(|p| p.statement(negative))?;
                    }

                    Ok(())
                })
            }
            Statement::Compound(statements) => {
                self.line("Compound", "")?;
                self.nested(|p| statements.iter().try_for_each(|s| p.statement(s)))
            }
            Statement::Expression(expression) => {
                self.line("Expression statement", "")?;
                self.nested(|p| p.expression(expression))
            }
            Statement::Declaration(declaration) => self.declaration(declaration),
            Statement::Return(expression) => {
                self.line("Return", "")?;
                self.nested(|p| p.expression(expression))
            }
        }
    }

    fn expression(&mut self, expression: &Expression) -> fmt::Result {
        match expression {
            Expression::MemberAccess { parent, property } => {
                self.line("Member access", "")?;
                self.nested(|p| {
                    p.expression(parent)?;
                    p.expression(property)
                })
            }
            Expression::Assignment { assignee, value } => {
                self.line("Assignment", "")?;
                self.nested(|p| {
                    p.expression(assignee)?;
                    p.expression(value)
                })
            }
            Expression::FunctionCall { callee, arguments } => {
                self.line("Call", "")?;
                self.nested(|p| {
                    p.expression(callee)?;
                    arguments.iter().try_for_each(|a| p.expression(a))
                })
            }
            Expression::Binary { lhs, operator, rhs } => {
                self.line("Binary", operator.to_string().yellow())?;
                self.nested(|p| {
                    p.expression(lhs)?;
                    p.expression(rhs)
                })
            }
            Expression::Unary { operator, operand } => {
                self.line("Unary", operator.to_string().yellow())?;
                self.nested(|p| p.expression(operand))
            }
            Expression::Cast { expression, ty } => {
                self.line("Cast", ty)?;
                self.nested(|p| p.expression(expression))
            }
            Expression::StringLiteral(value) => self.line("String", value.green()),
            Expression::IdentifierLiteral(name) => self.line("Identifier", name.blue()),
            Expression::NumericLiteral(value) => {
                self.line("Number", value.to_string().purple())
            }
            Expression::LvalueToRvalue(expression) => {
                self.line("Lvalue to rvalue", "")?;
                self.nested(|p| p.expression(expression))
            }
        }
    }

    fn type_spec(&mut self, ty: &TypeSpec) -> fmt::Result {
        self.line("Type", ty)
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AST:\n")?;

        let mut printer = TreePrinter { f, depth: 0 };

        self.declarations
            .iter()
            .try_for_each(|declaration| printer.declaration(declaration))
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use crate::frontend::ast::{
        Ast, BinaryOperator, Declaration, Expression, TypeSpec, VariableDeclaration,
    };

    #[test]
    fn dumps_nested_tree() {
        let ast = Ast {
            declarations: vec![Declaration::Variable(VariableDeclaration {
                name: "x".into(),
                attributes: Vec::new(),
                ty: TypeSpec::new(0, "i32"),
                value: Some(Expression::Binary {
                    lhs: Box::new(Expression::NumericLiteral(2)),
                    operator: BinaryOperator::Multiply,
                    rhs: Box::new(Expression::NumericLiteral(3)),
                }),
            })],
        };

        let dump = strip_ansi_escapes::strip_str(ast.to_string());

        assert_eq!(
            dump,
            indoc! {"
                AST:
                |- Variable: x
                |   |- Type: i32
                |   |- Value
                |   |   |- Binary: *
                |   |   |   |- Number: 2
                |   |   |   |- Number: 3
            "}
        );
    }
}
