//! Syntax tree to bytecode compiler.
//!
//! Type checking and emission happen in the same depth-first walk: every
//! expression is emitted as soon as it is visited and reports its static type to
//! the parent, which decides whether an implicit int→float conversion is needed.
//!
//! A conversion of the right operand is emitted straight away since its value is
//! on top of the stack. The left operand was produced earlier and lies under the
//! right one, so its conversion is deferred to the builder's patch pass instead
//! (see [`CodeBuilder::build`]).

use std::fmt;

use indexmap::IndexMap;
use smallvec::smallvec;

use super::{
    builder::{CodeBuilder, PatchPoints},
    code::{Instruction, Program},
    op::Opcode,
};
use crate::{
    expressions::{Expr, ExprLoc, ForClauses, Identifier, Literal, Node, Operator, SyntaxTree, UnaryOperator},
    types::Type,
};

/// A semantic error found during compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: u32,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error at line {} {}", self.line, self.message)
    }
}

/// Compilation failed; holds every diagnostic in the order it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub diagnostics: Vec<Diagnostic>,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

/// Static type of a compiled expression plus where to convert it if it gets promoted.
#[derive(Debug, Clone)]
struct ExprType {
    /// `None` when the expression is ill-typed; a diagnostic has already been issued.
    ty: Option<Type>,
    conversions: PatchPoints,
}

impl ExprType {
    fn error() -> Self {
        Self {
            ty: None,
            conversions: PatchPoints::new(),
        }
    }

    /// Type of a value whose last instruction ends right before `position`.
    fn at(ty: Type, position: usize) -> Self {
        Self {
            ty: Some(ty),
            conversions: smallvec![position],
        }
    }
}

/// The three optional `for` header clauses once it is known which is which.
#[derive(Debug, Default)]
struct ForParts<'a> {
    init: Option<&'a ExprLoc>,
    cond: Option<&'a ExprLoc>,
    post: Option<&'a ExprLoc>,
}

impl<'a> ForParts<'a> {
    /// Assigns the expressions present in a `for` header to their clauses.
    ///
    /// One expression is always the condition. With two, the header position after
    /// `(` tells whether they are `init; cond;` or `; cond; post`.
    fn resolve(clauses: &'a ForClauses) -> Self {
        match clauses.exprs.as_slice() {
            [] => Self::default(),
            [cond] => Self {
                cond: Some(cond),
                ..Self::default()
            },
            [init, cond] if clauses.first_slot_is_expr => Self {
                init: Some(init),
                cond: Some(cond),
                post: None,
            },
            [cond, post] => Self {
                init: None,
                cond: Some(cond),
                post: Some(post),
            },
            [init, cond, post, ..] => Self {
                init: Some(init),
                cond: Some(cond),
                post: Some(post),
            },
        }
    }
}

/// Compiles a syntax tree into a bytecode [`Program`].
///
/// Owns the single flat symbol table. After the first semantic error no more code
/// is emitted, but the walk goes on so every independent error gets reported.
#[derive(Default)]
pub struct Compiler<'r> {
    code: CodeBuilder,
    /// Declared variables in declaration order.
    symbols: IndexMap<String, Type>,
    diagnostics: Vec<Diagnostic>,
    /// Called with each diagnostic as soon as it is found.
    on_error: Option<&'r mut dyn FnMut(&Diagnostic)>,
}

impl fmt::Debug for Compiler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("code", &self.code)
            .field("symbols", &self.symbols)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

impl<'r> Compiler<'r> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles a whole program.
    pub fn compile(tree: &SyntaxTree) -> Result<Program, CompileError> {
        Self::new().compile_tree(tree)
    }

    /// Compiles a whole program, handing every diagnostic to `on_error` the moment
    /// it is found. The returned [`CompileError`] still lists all of them.
    pub fn compile_reporting(
        tree: &SyntaxTree,
        on_error: &'r mut dyn FnMut(&Diagnostic),
    ) -> Result<Program, CompileError> {
        Self {
            on_error: Some(on_error),
            ..Self::default()
        }
        .compile_tree(tree)
    }

    fn compile_tree(mut self, tree: &SyntaxTree) -> Result<Program, CompileError> {
        for node in &tree.body {
            self.compile_node(node);
        }
        self.finish()
    }

    /// Variables declared so far with their types, in declaration order.
    #[must_use]
    pub fn symbols(&self) -> &IndexMap<String, Type> {
        &self.symbols
    }

    /// Runs the patch pass, or returns the diagnostics if anything failed.
    fn finish(self) -> Result<Program, CompileError> {
        if self.diagnostics.is_empty() {
            debug_assert!(!self.code.is_suppressed(), "emission suppressed without a diagnostic");
            Ok(self.code.build())
        } else {
            Err(CompileError {
                diagnostics: self.diagnostics,
            })
        }
    }

    fn error(&mut self, line: u32, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            line,
            message: message.into(),
        };
        if let Some(on_error) = self.on_error.as_mut() {
            on_error(&diagnostic);
        }
        self.diagnostics.push(diagnostic);
        self.code.suppress();
    }

    fn lookup(&mut self, id: &Identifier) -> Option<Type> {
        let ty = self.symbols.get(&id.name).copied();
        if ty.is_none() {
            self.error(id.position.start().line, format!("Variable {} was not declared", id.name));
        }
        ty
    }

    fn compile_node(&mut self, node: &Node) {
        match node {
            Node::Empty => {}
            Node::Declare { ty, names } => {
                for id in names {
                    if self.symbols.contains_key(&id.name) {
                        self.error(
                            id.position.start().line,
                            format!("Variable {} was already declared", id.name),
                        );
                        continue;
                    }
                    self.symbols.insert(id.name.clone(), *ty);
                    self.code.emit_push(ty.default_value());
                    self.code.emit(Instruction::Save(id.name.clone()));
                }
            }
            Node::Read { targets } => {
                for id in targets {
                    if let Some(ty) = self.lookup(id) {
                        self.code.emit(Instruction::Read(ty));
                        self.code.emit(Instruction::Save(id.name.clone()));
                    }
                }
            }
            Node::Write { values } => {
                // reversed so the first value ends up on top and is printed first
                for value in values.iter().rev() {
                    self.compile_expr(value);
                }
                self.code.emit(Instruction::Print(values.len()));
            }
            Node::Block(body) => {
                for node in body {
                    self.compile_node(node);
                }
            }
            Node::If { test, body, or_else } => {
                if let Some(or_else) = or_else {
                    let else_start = self.code.new_label();
                    let end = self.code.new_label();
                    self.compile_condition(test);
                    self.code.emit(Instruction::Fjmp(else_start));
                    self.compile_node(body);
                    self.code.emit(Instruction::Jmp(end));
                    self.code.emit_label(else_start);
                    self.compile_node(or_else);
                    self.code.emit_label(end);
                } else {
                    let end = self.code.new_label();
                    self.compile_condition(test);
                    self.code.emit(Instruction::Fjmp(end));
                    self.compile_node(body);
                    self.code.emit_label(end);
                }
            }
            Node::While { test, body } => {
                let top = self.code.new_label();
                let exit = self.code.new_label();
                self.code.emit_label(top);
                self.compile_condition(test);
                self.code.emit(Instruction::Fjmp(exit));
                self.compile_node(body);
                self.code.emit(Instruction::Jmp(top));
                self.code.emit_label(exit);
            }
            Node::For { clauses, body } => self.compile_for(clauses, body),
            Node::Expr(expr) => {
                self.compile_expr(expr);
                self.code.emit_op(Opcode::Pop);
            }
        }
    }

    fn compile_for(&mut self, clauses: &ForClauses, body: &Node) {
        let ForParts { init, cond, post } = ForParts::resolve(clauses);
        let top = self.code.new_label();
        let exit = self.code.new_label();
        if let Some(init) = init {
            self.compile_expr(init);
            self.code.emit_op(Opcode::Pop);
        }
        self.code.emit_label(top);
        if let Some(cond) = cond {
            self.compile_condition(cond);
            self.code.emit(Instruction::Fjmp(exit));
        }
        self.compile_node(body);
        if let Some(post) = post {
            self.compile_expr(post);
            self.code.emit_op(Opcode::Pop);
        }
        self.code.emit(Instruction::Jmp(top));
        self.code.emit_label(exit);
    }

    /// Compiles a branch or loop condition, which must be a `bool`.
    fn compile_condition(&mut self, test: &ExprLoc) {
        if let Some(ty) = self.compile_expr(test).ty
            && ty != Type::Bool
        {
            self.error(test.line(), format!("Condition must be bool, not {ty}"));
        }
    }

    fn compile_expr(&mut self, expr_loc: &ExprLoc) -> ExprType {
        match &expr_loc.expr {
            Expr::Literal(literal) => self.compile_literal(literal),
            Expr::Name(id) => match self.lookup(id) {
                Some(ty) => {
                    self.code.emit(Instruction::Load(id.name.clone()));
                    ExprType::at(ty, self.code.position())
                }
                None => ExprType::error(),
            },
            Expr::Paren(inner) => match self.compile_expr(inner).ty {
                Some(ty) => ExprType::at(ty, self.code.position()),
                None => ExprType::error(),
            },
            Expr::UnaryOp { op, operand } => self.compile_unary(expr_loc, *op, operand),
            Expr::Op { left, op, right } => self.compile_binary(expr_loc, left, *op, right),
            Expr::Assign { target, value } => self.compile_assign(target, value),
        }
    }

    fn compile_literal(&mut self, literal: &Literal) -> ExprType {
        self.code.emit_push(literal.to_value());
        ExprType::at(literal.ty(), self.code.position())
    }

    fn compile_unary(&mut self, expr_loc: &ExprLoc, op: UnaryOperator, operand: &ExprLoc) -> ExprType {
        let operand_type = self.compile_expr(operand);
        let Some(ty) = operand_type.ty else {
            return operand_type;
        };
        let opcode = match (op, ty) {
            (UnaryOperator::Neg, Type::Int | Type::Float) => Opcode::Uminus,
            (UnaryOperator::Not, Type::Bool) => Opcode::Not,
            _ => {
                self.error(expr_loc.line(), format!("{op} is not supported for {ty}"));
                return ExprType::error();
            }
        };
        self.code.emit_op(opcode);
        // negation commutes with int→float conversion, so the operand's points stay valid
        operand_type
    }

    fn compile_binary(&mut self, expr_loc: &ExprLoc, left: &ExprLoc, op: Operator, right: &ExprLoc) -> ExprType {
        let left_type = self.compile_expr(left);
        let right_type = self.compile_expr(right);
        let (Some(mut lhs), Some(mut rhs)) = (left_type.ty, right_type.ty) else {
            return ExprType::error();
        };

        let operands = accepted_operands(op);
        if lhs != rhs && operands.contains(&Type::Float) {
            match (lhs, rhs) {
                (Type::Int, Type::Float) => {
                    self.code.defer_itof(left_type.conversions);
                    lhs = Type::Float;
                }
                (Type::Float, Type::Int) => {
                    self.code.emit_op(Opcode::Itof);
                    rhs = Type::Float;
                }
                _ => {}
            }
        }

        if lhs != rhs || !operands.contains(&lhs) {
            self.error(
                expr_loc.line(),
                format!("{op} is not supported for {lhs} and {rhs}"),
            );
            return ExprType::error();
        }

        for opcode in binary_opcodes(op) {
            self.code.emit_op(*opcode);
        }
        ExprType::at(result_type(op, lhs), self.code.position())
    }

    fn compile_assign(&mut self, target: &ExprLoc, value: &ExprLoc) -> ExprType {
        let id = match &target.expr {
            Expr::Name(id) => Some(id),
            _ => {
                self.error(target.line(), "Left side of assignment must be a variable");
                None
            }
        };
        let var_type = id.and_then(|id| self.lookup(id));
        let value_type = self.compile_expr(value);
        let (Some(id), Some(var_type), Some(mut rhs)) = (id, var_type, value_type.ty) else {
            return ExprType::error();
        };

        if var_type == Type::Float && rhs == Type::Int {
            self.code.emit_op(Opcode::Itof);
            rhs = Type::Float;
        }
        if rhs != var_type {
            self.error(value.line(), format!("can't store {rhs} into {var_type} variable"));
            return ExprType::error();
        }

        // `save` consumes the value, `load` puts the stored value back as the result
        self.code.emit(Instruction::Save(id.name.clone()));
        self.code.emit(Instruction::Load(id.name.clone()));
        ExprType {
            ty: Some(var_type),
            conversions: PatchPoints::new(),
        }
    }
}

/// Operand types accepted by a binary operator; both operands must share one.
fn accepted_operands(op: Operator) -> &'static [Type] {
    match op {
        Operator::Add | Operator::Sub | Operator::Mul | Operator::Div | Operator::Lt | Operator::Gt => {
            &[Type::Int, Type::Float]
        }
        Operator::Mod => &[Type::Int],
        Operator::Concat => &[Type::Str],
        Operator::Eq | Operator::NotEq => &[Type::Int, Type::Float, Type::Str],
        Operator::And | Operator::Or => &[Type::Bool],
    }
}

fn result_type(op: Operator, operand: Type) -> Type {
    match op {
        Operator::Add | Operator::Sub | Operator::Mul | Operator::Div | Operator::Mod => operand,
        Operator::Concat => Type::Str,
        Operator::Lt | Operator::Gt | Operator::Eq | Operator::NotEq | Operator::And | Operator::Or => Type::Bool,
    }
}

fn binary_opcodes(op: Operator) -> &'static [Opcode] {
    match op {
        Operator::Add => &[Opcode::Add],
        Operator::Sub => &[Opcode::Sub],
        Operator::Mul => &[Opcode::Mul],
        Operator::Div => &[Opcode::Div],
        Operator::Mod => &[Opcode::Mod],
        Operator::Concat => &[Opcode::Concat],
        Operator::Lt => &[Opcode::Lt],
        Operator::Gt => &[Opcode::Gt],
        Operator::Eq => &[Opcode::Eq],
        Operator::NotEq => &[Opcode::Eq, Opcode::Not],
        Operator::And => &[Opcode::And],
        Operator::Or => &[Opcode::Or],
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parse::parse;

    fn compile(code: &str) -> Result<Program, CompileError> {
        let tree = parse(code).unwrap_or_else(|errors| panic!("syntax errors: {errors:?}"));
        Compiler::compile(&tree)
    }

    fn bytecode(code: &str) -> String {
        compile(code)
            .unwrap_or_else(|err| panic!("compile errors:\n{err}"))
            .to_string()
    }

    fn diagnostics(code: &str) -> Vec<String> {
        compile(code)
            .expect_err("expected compile errors")
            .diagnostics
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn declarations_initialize_defaults() {
        assert_eq!(
            bytecode("int i; float f; bool b; string s;"),
            "push int 0\nsave i\npush float 0.0\nsave f\npush bool false\nsave b\npush string \"\"\nsave s\n"
        );
    }

    #[test]
    fn no_mixing_means_no_conversions() {
        let program = compile("int a; a = 1 + 2 * 3; write a, \"x\" . \"y\", 1.5 * 2.0;").unwrap();
        assert_eq!(program.count(Opcode::Itof), 0);
    }

    #[test]
    fn int_on_the_right_is_converted_in_place() {
        assert_eq!(
            bytecode("write 2.5 + 1;"),
            "push float 2.5\npush int 1\nitof\nadd\nprint 1\n"
        );
    }

    #[test]
    fn int_on_the_left_is_patched_after_its_push() {
        assert_eq!(
            bytecode("write 1 + 2.5;"),
            "push int 1\nitof\npush float 2.5\nadd\nprint 1\n"
        );
    }

    #[test]
    fn nested_int_operand_is_converted_once_as_a_whole() {
        assert_eq!(
            bytecode("int a, b; write a / b + 1.5;"),
            "push int 0\nsave a\npush int 0\nsave b\nload a\nload b\ndiv\nitof\npush float 1.5\nadd\nprint 1\n"
        );
    }

    #[test]
    fn several_deferred_patches_keep_their_positions() {
        assert_eq!(
            bytecode("float f; f = 1 * 2.0 + 3 * 4.0;"),
            "push float 0.0\nsave f\npush int 1\nitof\npush float 2.0\nmul\npush int 3\nitof\npush float 4.0\nmul\nadd\nsave f\nload f\npop\n"
        );
    }

    #[test]
    fn mixed_comparison_converts_the_int() {
        assert_eq!(
            bytecode("write 1 < 1.5, 2.5 == 2;"),
            "push float 2.5\npush int 2\nitof\neq\npush int 1\nitof\npush float 1.5\nlt\nprint 2\n"
        );
    }

    #[test]
    fn assignment_promotes_into_float_variables() {
        assert_eq!(
            bytecode("float x; x = 3;"),
            "push float 0.0\nsave x\npush int 3\nitof\nsave x\nload x\npop\n"
        );
    }

    #[test]
    fn promoted_sum_stored_into_float() {
        let program = compile("float x; x = 3 + 2.0; write x;").unwrap();
        assert_eq!(program.count(Opcode::Itof), 1);
        assert_eq!(
            program.to_string(),
            "push float 0.0\nsave x\npush int 3\nitof\npush float 2.0\nadd\nsave x\nload x\npop\nload x\nprint 1\n"
        );
    }

    #[test]
    fn chained_assignment_yields_the_stored_value() {
        assert_eq!(
            bytecode("int a, b; a = b = 5;"),
            "push int 0\nsave a\npush int 0\nsave b\npush int 5\nsave b\nload b\nsave a\nload a\npop\n"
        );
    }

    #[test]
    fn write_evaluates_in_reverse() {
        assert_eq!(
            bytecode("write 1, \"two\", true;"),
            "push bool true\npush string \"two\"\npush int 1\nprint 3\n"
        );
    }

    #[test]
    fn read_saves_each_target() {
        assert_eq!(
            bytecode("int a; string s; read a, s;"),
            "push int 0\nsave a\npush string \"\"\nsave s\nread int\nsave a\nread string\nsave s\n"
        );
    }

    #[test]
    fn not_equal_is_eq_then_not() {
        assert_eq!(bytecode("write 1 != 2;"), "push int 1\npush int 2\neq\nnot\nprint 1\n");
    }

    #[test]
    fn if_else_lowering() {
        assert_eq!(
            bytecode("if (true) write 1; else write 2;"),
            "push bool true\nfjmp 0\npush int 1\nprint 1\njmp 1\nlabel 0\npush int 2\nprint 1\nlabel 1\n"
        );
    }

    #[test]
    fn if_without_else_lowering() {
        assert_eq!(
            bytecode("if (false) write 1;"),
            "push bool false\nfjmp 0\npush int 1\nprint 1\nlabel 0\n"
        );
    }

    #[test]
    fn while_lowering() {
        assert_eq!(
            bytecode("int i; while (i < 3) i = i + 1;"),
            "push int 0\nsave i\nlabel 0\nload i\npush int 3\nlt\nfjmp 1\nload i\npush int 1\nadd\nsave i\nload i\npop\njmp 0\nlabel 1\n"
        );
    }

    #[test]
    fn for_with_all_clauses() {
        assert_eq!(
            bytecode("int i; for (i = 0; i < 2; i = i + 1) write i;"),
            "push int 0\nsave i\npush int 0\nsave i\nload i\npop\nlabel 0\nload i\npush int 2\nlt\nfjmp 1\nload i\nprint 1\nload i\npush int 1\nadd\nsave i\nload i\npop\njmp 0\nlabel 1\n"
        );
    }

    #[test]
    fn for_with_two_clauses_uses_first_slot_to_disambiguate() {
        let init_cond = bytecode("int i; for (i = 5; i < 2;) ;");
        assert!(init_cond.contains("push int 5\nsave i\nload i\npop\nlabel 0\n"), "{init_cond}");

        let cond_post = bytecode("int i; for (; i < 2; i = i + 1) ;");
        assert!(
            cond_post.contains("label 0\nload i\npush int 2\nlt\nfjmp 1\nload i\npush int 1\nadd\n"),
            "{cond_post}"
        );
    }

    #[test]
    fn for_with_single_clause_treats_it_as_condition() {
        assert_eq!(
            bytecode("bool go; for (; go;) ;"),
            "push bool false\nsave go\nlabel 0\nload go\nfjmp 1\njmp 0\nlabel 1\n"
        );
    }

    #[test]
    fn redeclaration_is_an_error() {
        assert_eq!(
            diagnostics("int a;\nfloat a;"),
            vec!["Error at line 2 Variable a was already declared"]
        );
    }

    #[test]
    fn use_before_declaration_is_an_error() {
        assert_eq!(
            diagnostics("a = 1;\nint a;"),
            vec!["Error at line 1 Variable a was not declared"]
        );
    }

    #[test]
    fn binary_type_errors() {
        assert_eq!(
            diagnostics("write 1 . 2;\nwrite 1 % 2.0;\nwrite \"a\" == 1;\nwrite true && 1;"),
            vec![
                "Error at line 1 . is not supported for int and int",
                "Error at line 2 % is not supported for int and float",
                "Error at line 3 == is not supported for string and int",
                "Error at line 4 && is not supported for bool and int",
            ]
        );
    }

    #[test]
    fn unary_type_errors() {
        assert_eq!(
            diagnostics("write -true;\nwrite !1;"),
            vec![
                "Error at line 1 - is not supported for bool",
                "Error at line 2 ! is not supported for int",
            ]
        );
    }

    #[test]
    fn assignment_errors() {
        assert_eq!(
            diagnostics("int i;\ni = 2.5;\n1 = 2;"),
            vec![
                "Error at line 2 can't store float into int variable",
                "Error at line 3 Left side of assignment must be a variable",
            ]
        );
    }

    #[test]
    fn non_bool_conditions_are_errors() {
        assert_eq!(
            diagnostics("if (1) ;\nwhile (\"s\") ;\nfor (; 2.5;) ;"),
            vec![
                "Error at line 1 Condition must be bool, not int",
                "Error at line 2 Condition must be bool, not string",
                "Error at line 3 Condition must be bool, not float",
            ]
        );
    }

    #[test]
    fn errors_do_not_cascade_through_expressions() {
        assert_eq!(
            diagnostics("write (x + 1) * 2 . \"s\";\nint y;\ny = z;"),
            vec![
                "Error at line 1 Variable x was not declared",
                "Error at line 3 Variable z was not declared",
            ]
        );
    }

    #[test]
    fn symbols_are_kept_in_declaration_order() {
        let tree = parse("string s; int a, b;").unwrap();
        let mut compiler = Compiler::new();
        for node in &tree.body {
            compiler.compile_node(node);
        }
        let names: Vec<_> = compiler.symbols().keys().map(String::as_str).collect();
        assert_eq!(names, ["s", "a", "b"]);
    }

    #[test]
    fn diagnostics_are_reported_as_they_are_found() {
        let tree = parse("int a;\nwhile (a) {\n  b = 1;\n  a = \"s\";\n}\nwrite -true;").unwrap();
        let mut seen = Vec::new();
        let err = Compiler::compile_reporting(&tree, &mut |d: &Diagnostic| seen.push(d.to_string())).unwrap_err();
        assert_eq!(
            seen,
            [
                "Error at line 2 Condition must be bool, not int",
                "Error at line 3 Variable b was not declared",
                "Error at line 4 can't store string into int variable",
                "Error at line 6 - is not supported for bool",
            ]
        );
        let returned: Vec<_> = err.diagnostics.iter().map(ToString::to_string).collect();
        assert_eq!(returned, seen);
    }

    #[test]
    fn clean_programs_report_nothing() {
        let tree = parse("int a; a = 1;").unwrap();
        let mut calls = 0;
        assert!(Compiler::compile_reporting(&tree, &mut |_: &Diagnostic| calls += 1).is_ok());
        assert_eq!(calls, 0);
    }
}
