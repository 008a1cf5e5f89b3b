//! Hand-rolled recursive-descent tokenizer/parser for `.hal` source files.
//!
//! The lexer/parser pair is specified only as an external collaborator at
//! the interface level, but a working compiler needs one; this one is
//! written in the teacher's own style (`Token{text,line,column}`,
//! `tokenize` free function, a `Parser` with a `pos` cursor and
//! `check`/`consume`/`advance` helpers) rather than reaching for a
//! parser-generator crate, matching every example repo in the pack.

use crate::ast::{
    ConstDecl, EnumDecl, EnumValueDecl, FieldDecl, ImportDecl, InterfaceDecl, MethodDecl, StructDecl, TopLevelDecl,
    TypedefDecl, UnionDecl,
};
use crate::constant::{BinaryOp, ConstantExpression, UnaryOp};
use crate::error::{HidlError, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Token {
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl PartialEq<str> for Token {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut line = 0usize;
    let mut column = 0usize;
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        if c == '\n' {
            line += 1;
            column = 0;
            i += 1;
            continue;
        }
        if c.is_whitespace() {
            column += 1;
            i += 1;
            continue;
        }
        if c == '/' && i + 1 < chars.len() && chars[i + 1] == '/' {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        if c == '/' && i + 1 < chars.len() && chars[i + 1] == '*' {
            i += 2;
            column += 2;
            while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                if chars[i] == '\n' {
                    line += 1;
                    column = 0;
                } else {
                    column += 1;
                }
                i += 1;
            }
            i = (i + 2).min(chars.len());
            continue;
        }

        let start_line = line;
        let start_col = column;

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                i += 1;
                column += 1;
            }
            tokens.push(Token {
                text: chars[start..i].iter().collect(),
                line: start_line,
                column: start_col,
            });
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len()
                && (chars[i].is_alphanumeric() || chars[i] == 'x' || chars[i] == 'X')
            {
                i += 1;
                column += 1;
            }
            tokens.push(Token {
                text: chars[start..i].iter().collect(),
                line: start_line,
                column: start_col,
            });
            continue;
        }

        // multi-char operators
        let matched_op = ["::", "<=", ">=", "==", "!=", "&&", "||", "<<", ">>"]
            .iter()
            .find(|op| chars[i..].starts_with(&op.chars().collect::<Vec<_>>()[..]))
            .copied();
        if let Some(op) = matched_op {
            tokens.push(Token {
                text: op.to_string(),
                line: start_line,
                column: start_col,
            });
            i += op.len();
            column += op.len();
            continue;
        }

        tokens.push(Token {
            text: c.to_string(),
            line: start_line,
            column: start_col,
        });
        i += 1;
        column += 1;
    }

    tokens
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    file: PathBuf,
}

impl Parser {
    pub fn new(source: &str, file: impl Into<PathBuf>) -> Self {
        Parser {
            tokens: tokenize(source),
            pos: 0,
            file: file.into(),
        }
    }

    pub fn parse_file(&mut self) -> Result<Vec<TopLevelDecl>> {
        let mut decls = Vec::new();
        while !self.is_at_end() {
            if self.check("package") {
                decls.push(TopLevelDecl::Package(self.parse_package()?));
            } else if self.check("import") {
                decls.push(TopLevelDecl::Import(self.parse_import()?));
            } else if self.check("enum") {
                decls.push(TopLevelDecl::Enum(self.parse_enum()?));
            } else if self.check("struct") {
                decls.push(TopLevelDecl::Struct(self.parse_struct()?));
            } else if self.check("union") {
                decls.push(TopLevelDecl::Union(self.parse_union()?));
            } else if self.check("typedef") {
                decls.push(TopLevelDecl::Typedef(self.parse_typedef()?));
            } else if self.check("interface") {
                decls.push(TopLevelDecl::Interface(self.parse_interface()?));
            } else if self.check("const") {
                decls.push(TopLevelDecl::Const(self.parse_const()?));
            } else {
                let tok = self.peek().cloned();
                return Err(self.error_at(tok, "expected a top-level declaration"));
            }
        }
        Ok(decls)
    }

    fn parse_package(&mut self) -> Result<String> {
        self.expect("package")?;
        let name = self.parse_fqname_text()?;
        self.expect(";")?;
        Ok(name)
    }

    fn parse_import(&mut self) -> Result<ImportDecl> {
        self.expect("import")?;
        let name = self.parse_fqname_text()?;
        self.expect(";")?;
        Ok(ImportDecl { fqname: name })
    }

    /// Reassemble an FQN's tokens (identifiers, `@`, `.`-joined version
    /// numbers, `::`) into one string, since the tokenizer splits `@` and
    /// `::` out as their own tokens.
    fn parse_fqname_text(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            let text = self.peek_text().ok_or_else(|| self.error_at(None, "expected a name"))?;
            if text == ";" {
                break;
            }
            out.push_str(&text);
            self.pos += 1;
        }
        Ok(out)
    }

    fn parse_enum(&mut self) -> Result<EnumDecl> {
        self.expect("enum")?;
        let name = self.expect_identifier()?;
        self.expect(":")?;
        let storage = self.expect_identifier()?;
        self.expect("{")?;
        let mut values = Vec::new();
        while !self.check("}") {
            let value_name = self.expect_identifier()?;
            let explicit = if self.try_consume("=") {
                Some(self.parse_constant_expression()?)
            } else {
                None
            };
            values.push(EnumValueDecl {
                name: value_name,
                explicit,
            });
            if !self.try_consume(",") {
                break;
            }
        }
        self.expect("}")?;
        self.expect(";")?;
        Ok(EnumDecl { name, storage, values })
    }

    fn parse_struct(&mut self) -> Result<StructDecl> {
        self.expect("struct")?;
        let name = self.expect_identifier()?;
        let fields = self.parse_field_block()?;
        Ok(StructDecl { name, fields })
    }

    fn parse_union(&mut self) -> Result<UnionDecl> {
        self.expect("union")?;
        let name = self.expect_identifier()?;
        let fields = self.parse_field_block()?;
        Ok(UnionDecl { name, fields })
    }

    fn parse_field_block(&mut self) -> Result<Vec<FieldDecl>> {
        self.expect("{")?;
        let mut fields = Vec::new();
        while !self.check("}") {
            let type_name = self.parse_type_reference()?;
            let field_name = self.expect_identifier()?;
            let dims = self.parse_array_dims()?;
            self.expect(";")?;
            fields.push(FieldDecl {
                type_name,
                name: field_name,
                array_dims: dims,
            });
        }
        self.expect("}")?;
        self.expect(";")?;
        Ok(fields)
    }

    fn parse_typedef(&mut self) -> Result<TypedefDecl> {
        self.expect("typedef")?;
        let target = self.parse_type_reference()?;
        let name = self.expect_identifier()?;
        self.expect(";")?;
        Ok(TypedefDecl { name, target })
    }

    fn parse_interface(&mut self) -> Result<InterfaceDecl> {
        self.expect("interface")?;
        let name = self.expect_identifier()?;
        let extends = if self.try_consume("extends") {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        self.expect("{")?;
        let mut methods = Vec::new();
        while !self.check("}") {
            let one_way = self.try_consume("oneway");
            let method_name = self.expect_identifier()?;
            self.expect("(")?;
            let inputs = self.parse_param_list()?;
            self.expect(")")?;
            let outputs = if self.try_consume("generates") {
                self.expect("(")?;
                let outs = self.parse_param_list()?;
                self.expect(")")?;
                outs
            } else {
                Vec::new()
            };
            self.expect(";")?;
            methods.push(MethodDecl {
                name: method_name,
                inputs,
                outputs,
                one_way,
            });
        }
        self.expect("}")?;
        self.expect(";")?;
        Ok(InterfaceDecl {
            name,
            extends,
            methods,
        })
    }

    fn parse_param_list(&mut self) -> Result<Vec<(String, String)>> {
        let mut params = Vec::new();
        while !self.check(")") {
            let type_name = self.parse_type_reference()?;
            let param_name = self.expect_identifier()?;
            params.push((param_name, type_name));
            if !self.try_consume(",") {
                break;
            }
        }
        Ok(params)
    }

    fn parse_const(&mut self) -> Result<ConstDecl> {
        self.expect("const")?;
        let type_name = self.parse_type_reference()?;
        let name = self.expect_identifier()?;
        self.expect("=")?;
        let expr = self.parse_constant_expression()?;
        self.expect(";")?;
        Ok(ConstDecl {
            type_name,
            name,
            value: expr,
        })
    }

    /// `uint32_t`, `vec<uint8_t>`, or `SomeType[4]`-style element names
    /// (the `[4]` suffix is consumed separately by field/param parsing).
    fn parse_type_reference(&mut self) -> Result<String> {
        let base = self.expect_identifier()?;
        if self.try_consume("<") {
            let inner = self.parse_type_reference()?;
            self.expect(">")?;
            return Ok(format!("{base}<{inner}>"));
        }
        Ok(base)
    }

    fn parse_array_dims(&mut self) -> Result<Vec<u64>> {
        let mut dims = Vec::new();
        while self.try_consume("[") {
            let tok = self.advance_owned()?;
            let n: u64 = tok
                .text
                .parse()
                .map_err(|_| HidlError::Parse {
                    file: self.file.clone(),
                    line: tok.line,
                    column: tok.column,
                    message: "expected an array dimension".to_string(),
                })?;
            dims.push(n);
            self.expect("]")?;
        }
        Ok(dims)
    }

    /// Operator-precedence recursive descent over the constant-expression
    /// grammar: ternary above logical-or above logical-and above bitwise
    /// above equality above relational above shift above additive above
    /// multiplicative above unary above primary.
    pub fn parse_constant_expression(&mut self) -> Result<ConstantExpression> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Result<ConstantExpression> {
        let cond = self.parse_binary(0)?;
        if self.try_consume("?") {
            let then_branch = self.parse_ternary()?;
            self.expect(":")?;
            let else_branch = self.parse_ternary()?;
            return Ok(ConstantExpression::ternary(cond, then_branch, else_branch));
        }
        Ok(cond)
    }

    const PRECEDENCE: &'static [&'static [&'static str]] = &[
        &["||"],
        &["&&"],
        &["|"],
        &["^"],
        &["&"],
        &["==", "!="],
        &["<", "<=", ">", ">="],
        &["<<", ">>"],
        &["+", "-"],
        &["*", "/", "%"],
    ];

    fn parse_binary(&mut self, level: usize) -> Result<ConstantExpression> {
        if level >= Self::PRECEDENCE.len() {
            return self.parse_unary();
        }
        let mut lhs = self.parse_binary(level + 1)?;
        while let Some(op_text) = self.peek_text() {
            if !Self::PRECEDENCE[level].contains(&op_text.as_str()) {
                break;
            }
            let op = binary_op_for(&op_text);
            self.advance_owned()?;
            let rhs = self.parse_binary(level + 1)?;
            lhs = ConstantExpression::binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<ConstantExpression> {
        for (text, op) in [
            ("+", UnaryOp::Plus),
            ("-", UnaryOp::Minus),
            ("~", UnaryOp::BitNot),
            ("!", UnaryOp::LogicalNot),
        ] {
            if self.try_consume(text) {
                let operand = self.parse_unary()?;
                return Ok(ConstantExpression::unary(op, operand));
            }
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<ConstantExpression> {
        if self.try_consume("(") {
            let inner = self.parse_ternary()?;
            self.expect(")")?;
            return Ok(inner);
        }
        let tok = self.advance_owned()?;
        if tok.text.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            return ConstantExpression::literal(&tok.text);
        }
        // An identifier reference to a named enum value is resolved by the
        // caller (constant evaluation happens against a live scope, which
        // the bare tokenizer/parser pair doesn't have access to); surface
        // it as an unresolved reference for the scope-aware pass to patch.
        Err(HidlError::UnresolvedReference {
            name: tok.text,
            context: format!("constant expression in {}", self.file.display()),
        })
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_text(&self) -> Option<String> {
        self.peek().map(|t| t.text.clone())
    }

    fn check(&self, text: &str) -> bool {
        self.peek().map(|t| t.text == text).unwrap_or(false)
    }

    fn try_consume(&mut self, text: &str) -> bool {
        if self.check(text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn advance_owned(&mut self) -> Result<Token> {
        let tok = self
            .peek()
            .cloned()
            .ok_or_else(|| self.error_at(None, "unexpected end of file"))?;
        self.pos += 1;
        Ok(tok)
    }

    fn expect(&mut self, text: &str) -> Result<()> {
        if self.try_consume(text) {
            Ok(())
        } else {
            let tok = self.peek().cloned();
            Err(self.error_at(tok, &format!("expected '{text}'")))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        let tok = self.advance_owned()?;
        let is_ident = tok
            .text
            .chars()
            .next()
            .map(|c| c.is_alphabetic() || c == '_')
            .unwrap_or(false);
        if !is_ident {
            return Err(HidlError::Parse {
                file: self.file.clone(),
                line: tok.line,
                column: tok.column,
                message: format!("expected an identifier, found '{}'", tok.text),
            });
        }
        Ok(tok.text)
    }

    fn error_at(&self, tok: Option<Token>, message: &str) -> HidlError {
        match tok {
            Some(t) => HidlError::Parse {
                file: self.file.clone(),
                line: t.line,
                column: t.column,
                message: message.to_string(),
            },
            None => HidlError::Parse {
                file: self.file.clone(),
                line: 0,
                column: 0,
                message: message.to_string(),
            },
        }
    }
}

fn binary_op_for(text: &str) -> BinaryOp {
    match text {
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Mod,
        "&" => BinaryOp::BitAnd,
        "|" => BinaryOp::BitOr,
        "^" => BinaryOp::BitXor,
        "<<" => BinaryOp::Shl,
        ">>" => BinaryOp::Shr,
        "<" => BinaryOp::Lt,
        "<=" => BinaryOp::Le,
        ">" => BinaryOp::Gt,
        ">=" => BinaryOp::Ge,
        "==" => BinaryOp::Eq,
        "!=" => BinaryOp::Ne,
        "&&" => BinaryOp::LogicalAnd,
        "||" => BinaryOp::LogicalOr,
        _ => unreachable!("binary_op_for called with non-operator token"),
    }
}

pub fn parse_file(source: &str, path: impl AsRef<Path>) -> Result<Vec<TopLevelDecl>> {
    Parser::new(source, path.as_ref().to_path_buf()).parse_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_enum_with_explicit_and_autofill_values() {
        let src = "enum Color : uint8_t { RED, GREEN = 5, BLUE };";
        let decls = parse_file(src, "x.hal").unwrap();
        match &decls[0] {
            TopLevelDecl::Enum(e) => {
                assert_eq!(e.name, "Color");
                assert_eq!(e.storage, "uint8_t");
                assert_eq!(e.values.len(), 3);
                assert!(e.values[0].explicit.is_none());
                assert!(e.values[1].explicit.is_some());
            }
            _ => panic!("expected enum decl"),
        }
    }

    #[test]
    fn parses_struct_fields() {
        let src = "struct S { uint8_t a; uint32_t b; uint8_t c; };";
        let decls = parse_file(src, "x.hal").unwrap();
        match &decls[0] {
            TopLevelDecl::Struct(s) => {
                assert_eq!(s.name, "S");
                assert_eq!(s.fields.len(), 3);
                assert_eq!(s.fields[1].name, "b");
            }
            _ => panic!("expected struct decl"),
        }
    }

    #[test]
    fn parses_interface_with_extends_and_generates() {
        let src = "interface IFoo extends IBase { foo() generates (uint32_t x); oneway bar(uint32_t y); };";
        let decls = parse_file(src, "x.hal").unwrap();
        match &decls[0] {
            TopLevelDecl::Interface(i) => {
                assert_eq!(i.name, "IFoo");
                assert_eq!(i.extends.as_deref(), Some("IBase"));
                assert_eq!(i.methods.len(), 2);
                assert_eq!(i.methods[0].outputs.len(), 1);
                assert!(i.methods[1].one_way);
            }
            _ => panic!("expected interface decl"),
        }
    }

    #[test]
    fn parses_array_field_dimensions() {
        let src = "struct S { uint8_t a[4]; };";
        let decls = parse_file(src, "x.hal").unwrap();
        match &decls[0] {
            TopLevelDecl::Struct(s) => assert_eq!(s.fields[0].array_dims, vec![4]),
            _ => panic!("expected struct decl"),
        }
    }

    #[test]
    fn parses_vector_type_reference() {
        let src = "struct S { vec<uint8_t> data; };";
        let decls = parse_file(src, "x.hal").unwrap();
        match &decls[0] {
            TopLevelDecl::Struct(s) => assert_eq!(s.fields[0].type_name, "vec<uint8_t>"),
            _ => panic!("expected struct decl"),
        }
    }

    #[test]
    fn parses_const_arithmetic_expression() {
        let src = "const uint32_t FOO = 1 + 2 * 3;";
        let decls = parse_file(src, "x.hal").unwrap();
        match &decls[0] {
            TopLevelDecl::Const(c) => assert_eq!(c.value.value().unsigned, 7),
            _ => panic!("expected const decl"),
        }
    }

    #[test]
    fn reports_line_and_column_on_parse_error() {
        let src = "struct S { !!! }";
        let err = parse_file(src, "x.hal").unwrap_err();
        match err {
            HidlError::Parse { line, .. } => assert_eq!(line, 0),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }
}
