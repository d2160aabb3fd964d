//! Verilog IR.

use std::fmt;

use itertools::Itertools;

use crate::utils::indent;

const INDENT: usize = 4;

/// Module.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Module {
    /// Module name.
    pub name: String,

    /// Port declarations.
    pub port_decls: Vec<PortDeclaration>,

    /// Module items.
    pub module_items: Vec<ModuleItem>,
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`timescale 1ns / 1ps\n\nmodule {}\n(\n{}\n);\n\n{}\n\nendmodule",
            self.name,
            indent(self.port_decls.iter().join(",\n"), INDENT),
            gen_verilog_module(&self.module_items)
        )
    }
}

/// Module item.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ModuleItem {
    /// Declarations.
    Declarations(Vec<Declaration>),

    /// Continuous assignments.
    ContinuousAssigns(Vec<ContinuousAssign>),

    /// Always construct with its event control, e.g. `always @(posedge clk)`.
    AlwaysConstruct(String, Vec<Statement>),

    /// Comment. (Comment before modules, comment after modules, modules)
    Commented(String, Option<String>, Vec<ModuleItem>),
}

impl fmt::Display for ModuleItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleItem::Declarations(decls) => write!(f, "{}", decls.iter().join("\n")),
            ModuleItem::ContinuousAssigns(conts) => write!(f, "{}", conts.iter().join("\n")),
            ModuleItem::AlwaysConstruct(event, stmts) => {
                write!(f, "{} begin\n{}\nend", event, indent(stmts.iter().join("\n"), INDENT))
            }
            ModuleItem::Commented(comment_before, comment_after, items) => {
                write!(
                    f,
                    "/*\n{}\n*/\n{}{}",
                    indent(comment_before.clone(), INDENT),
                    items.iter().join("\n\n"),
                    comment_after.as_ref().map_or("".to_string(), |c| format!("\n/* {} */", c))
                )
            }
        }
    }
}

/// Generates Verilog code for module items.
pub fn gen_verilog_module(module: &[ModuleItem]) -> String { module.iter().join("\n\n") }

/// Port declaration.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum PortDeclaration {
    /// Input declaration.
    Input(usize, String),

    /// Output declaration driven by continuous assignments.
    Output(usize, String),

    /// Output declaration driven by an always construct.
    OutputReg(usize, String),
}

impl PortDeclaration {
    /// Creates new input port declaration.
    pub fn input(width: usize, ident: String) -> Self { Self::Input(width, ident) }

    /// Creates new output port declaration.
    pub fn output(width: usize, ident: String) -> Self { Self::Output(width, ident) }

    /// Creates new registered output port declaration.
    pub fn output_reg(width: usize, ident: String) -> Self { Self::OutputReg(width, ident) }

    /// Returns the declared identifier.
    pub fn ident(&self) -> &str {
        match self {
            Self::Input(_, ident) | Self::Output(_, ident) | Self::OutputReg(_, ident) => ident,
        }
    }
}

impl fmt::Display for PortDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (keyword, width, ident) = match self {
            Self::Input(width, ident) => ("input wire", width, ident),
            Self::Output(width, ident) => ("output wire", width, ident),
            Self::OutputReg(width, ident) => ("output reg", width, ident),
        };
        if *width > 1 {
            write!(f, "{} [{}-1:0] {}", keyword, width, ident)
        } else {
            write!(f, "{} {}", keyword, ident)
        }
    }
}

/// Declaration.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Declaration {
    /// Net declaration.
    Net(usize, String),

    /// Reg declaration.
    Reg(usize, String),
}

impl Declaration {
    /// Net declaration.
    #[inline]
    pub fn net(width: usize, ident: String) -> Self { Declaration::Net(width, ident) }

    /// Reg declaration.
    #[inline]
    pub fn reg(width: usize, ident: String) -> Self { Declaration::Reg(width, ident) }

    /// Returns the declared identifier.
    pub fn ident(&self) -> &str {
        match self {
            Self::Net(_, ident) | Self::Reg(_, ident) => ident,
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (keyword, width, ident) = match self {
            Self::Net(width, ident) => ("wire", width, ident),
            Self::Reg(width, ident) => ("reg", width, ident),
        };
        if *width > 1 {
            write!(f, "{} [{}-1:0] {};", keyword, width, ident)
        } else {
            write!(f, "{} {};", keyword, ident)
        }
    }
}

/// Continuous assign.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ContinuousAssign(pub Expression, pub Expression);

impl ContinuousAssign {
    /// Creates new continuous assign.
    pub fn new(lvalue: Expression, expr: Expression) -> Self { Self(lvalue, expr) }
}

impl fmt::Display for ContinuousAssign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "assign {} = {};", self.0, self.1) }
}

/// Statement.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Statement {
    /// Conditional statement.
    Conditional(Expression, Vec<Statement>),

    /// Nonblocking assignment.
    NonblockingAssignment(Expression, Expression),
}

impl Statement {
    /// Nonblocking assignment.
    #[inline]
    pub fn nonblocking_assignment(lvalue: Expression, expr: Expression) -> Self {
        debug_assert!(lvalue.is_lvalue(), "lvalue should be hierarchical identifier");
        Statement::NonblockingAssignment(lvalue, expr)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conditional(cond, then_stmt) => {
                write!(f, "if ({}) begin\n{}\nend", cond, indent(then_stmt.iter().join("\n"), INDENT))
            }
            Self::NonblockingAssignment(lvalue, expr) => write!(f, "{} <= {};", lvalue, expr),
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Negation
    Negation,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Negation => write!(f, "~"),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Or (bitwise)
    Or,

    /// And (bitwise)
    And,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Or => write!(f, "|"),
            BinaryOp::And => write!(f, "&"),
        }
    }
}

/// Expression.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Expression {
    /// Primary.
    Primary(Primary),

    /// Unary expression.
    Unary(UnaryOp, Primary),

    /// Binary expression.
    Binary(Box<Expression>, BinaryOp, Box<Expression>),
}

/// Range.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Range {
    /// Index: `[index]`
    Index(usize),
}

/// Primary.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Primary {
    /// Number.
    Number(String),

    /// Hierarchical identifier.
    HierarchicalIdentifier(String, Option<Range>),

    /// Concatenation.
    Concatenation(Concatenation),

    /// Mintypmax expression.
    MintypmaxExpression(Box<Expression>),
}

/// Concatenation.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Concatenation {
    /// Expressions.
    pub exprs: Vec<Expression>,
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary(prim) => write!(f, "{}", prim),
            Self::Unary(op, prim) => write!(f, "{}{}", op, prim),
            Self::Binary(lhs, op, rhs) => write!(f, "{} {} {}", lhs, op, rhs),
        }
    }
}

impl Expression {
    /// Number.
    pub fn number(num: String) -> Self { Self::Primary(Primary::Number(num)) }

    /// One-bit constant.
    pub fn bit(value: bool) -> Self { Self::number(format!("1'b{}", u8::from(value))) }

    /// Identifier.
    pub fn ident(ident: String) -> Self { Self::Primary(Primary::HierarchicalIdentifier(ident, None)) }

    /// Indexed identifier.
    pub fn index(ident: String, index: usize) -> Self {
        Self::Primary(Primary::HierarchicalIdentifier(ident, Some(Range::Index(index))))
    }

    /// Concatenation.
    pub fn concat(exprs: Vec<Expression>) -> Self { Self::Primary(Primary::Concatenation(Concatenation { exprs })) }

    /// Mintypmax expression.
    pub fn mintypmax_expr(expr: Expression) -> Self { Self::Primary(Primary::MintypmaxExpression(Box::new(expr))) }

    /// Unary operation.
    pub fn unary(op: UnaryOp, expr: Self) -> Self {
        Self::Unary(op, if let Self::Primary(prim) = expr { prim } else { Primary::MintypmaxExpression(Box::new(expr)) })
    }

    /// Binary operation.
    pub fn binary(op: BinaryOp, mut lhs: Expression, mut rhs: Expression) -> Self {
        // Operands of binary operation should be primary or unary.
        if !lhs.is_operand() {
            lhs = Expression::mintypmax_expr(lhs);
        }

        if !rhs.is_operand() {
            rhs = Expression::mintypmax_expr(rhs);
        }

        Self::Binary(Box::new(lhs), op, Box::new(rhs))
    }

    /// Returns `true` if the expression is primary.
    pub fn is_primary(&self) -> bool { matches!(self, Self::Primary(_)) }

    /// Returns `true` if the expression binds tighter than any binary operator.
    pub fn is_operand(&self) -> bool { matches!(self, Self::Primary(_) | Self::Unary(..)) }

    /// Returns `true` if the expression can be assigned to.
    pub fn is_lvalue(&self) -> bool { matches!(self, Self::Primary(Primary::HierarchicalIdentifier(_, _))) }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{}", index),
        }
    }
}

impl fmt::Display for Primary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(num) => write!(f, "{}", num),
            Self::HierarchicalIdentifier(ident, Some(range)) => write!(f, "{}[{}]", ident, range),
            Self::HierarchicalIdentifier(ident, None) => write!(f, "{}", ident),
            Self::Concatenation(concat) => write!(f, "{}", concat),
            Self::MintypmaxExpression(expr) => write!(f, "({})", expr),
        }
    }
}

impl fmt::Display for Concatenation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{{{}}}", self.exprs.iter().join(", ")) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_expressions() {
        let a = Expression::index("val".to_string(), 7);
        let b = Expression::ident("sbit".to_string());
        let expr = Expression::binary(
            BinaryOp::Or,
            Expression::binary(BinaryOp::And, a, Expression::unary(UnaryOp::Negation, b.clone())),
            Expression::bit(false),
        );
        assert_eq!(expr.to_string(), "(val[7] & ~sbit) | 1'b0");
        assert_eq!(Expression::concat(vec![b, Expression::bit(true)]).to_string(), "{sbit, 1'b1}");
    }

    #[test]
    fn negated_operands_keep_their_grouping() {
        let a = Expression::ident("a".to_string());
        let b = Expression::ident("b".to_string());
        let c = Expression::ident("c".to_string());
        let inner = Expression::binary(BinaryOp::Or, b, c);
        let expr = Expression::binary(BinaryOp::And, a.clone(), Expression::unary(UnaryOp::Negation, inner));
        assert_eq!(expr.to_string(), "a & ~(b | c)");

        let expr = Expression::binary(BinaryOp::Or, Expression::unary(UnaryOp::Negation, a.clone()), a);
        assert_eq!(expr.to_string(), "~a | a");
    }

    #[test]
    fn renders_conditional() {
        let stmt = Statement::Conditional(Expression::ident("ce".to_string()), vec![
            Statement::nonblocking_assignment(Expression::ident("q".to_string()), Expression::ident("d".to_string())),
        ]);
        assert_eq!(stmt.to_string(), "if (ce) begin\n    q <= d;\nend");
    }

    #[test]
    fn renders_declarations() {
        assert_eq!(PortDeclaration::output_reg(8, "result".to_string()).to_string(), "output reg [8-1:0] result");
        assert_eq!(PortDeclaration::input(1, "clk".to_string()).to_string(), "input wire clk");
        assert_eq!(Declaration::net(1, "w_0".to_string()).to_string(), "wire w_0;");
        assert_eq!(Declaration::reg(4, "r".to_string()).to_string(), "reg [4-1:0] r;");
    }
}
