// ============================================================================
// 测试方法访问器 - 语法树遍历状态机
// ============================================================================
//
// Context is the qualified name of the enclosing type, or None when the
// current type does not qualify. Entering a type replaces it, leaving the
// type restores it. Anything nested inside a method, constructor or
// initializer body, or inside an anonymous class body, never qualifies.

use std::path::{Path, PathBuf};

use tree_sitter::{Node, Tree};

use super::TestRecord;

/// Test annotations of JUnit 4, JUnit 5 and TestNG, by simple and qualified name.
pub const TEST_ANNOTATIONS: &[&str] = &[
    "Test",
    "org.junit.Test",
    "org.junit.jupiter.api.Test",
    "ParameterizedTest",
    "org.junit.jupiter.params.ParameterizedTest",
    "RepeatedTest",
    "org.junit.jupiter.api.RepeatedTest",
    "org.testng.annotations.Test",
];

pub fn is_test_annotation(name: &str) -> bool {
    TEST_ANNOTATIONS.contains(&name)
}

/// Collect one record per public test method of every qualifying type.
pub fn collect_tests(tree: &Tree, source: &str, file_path: &Path) -> Vec<TestRecord> {
    let mut visitor = TestVisitor {
        source: source.as_bytes(),
        file_path,
        enclosing: None,
        records: Vec::new(),
    };
    visitor.visit(tree.root_node());
    visitor.records
}

struct TestVisitor<'a> {
    source: &'a [u8],
    file_path: &'a Path,
    enclosing: Option<String>,
    records: Vec<TestRecord>,
}

impl<'a> TestVisitor<'a> {
    fn visit(&mut self, node: Node<'_>) {
        match node.kind() {
            "class_declaration" | "interface_declaration" => {
                let context = self.qualify(node);
                self.visit_children_in(node, context);
            }
            "enum_declaration" | "record_declaration" | "annotation_type_declaration" => {
                self.visit_children_in(node, None);
            }
            "method_declaration" => {
                self.visit_method(node);
                self.visit_children_in(node, None);
            }
            "constructor_declaration"
            | "static_initializer"
            | "block"
            | "object_creation_expression" => {
                self.visit_children_in(node, None);
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child);
        }
    }

    fn visit_children_in(&mut self, node: Node<'_>, context: Option<String>) {
        let saved = std::mem::replace(&mut self.enclosing, context);
        self.visit_children(node);
        self.enclosing = saved;
    }

    /// Qualified name of a type declaration, if it qualifies.
    fn qualify(&self, node: Node<'_>) -> Option<String> {
        let name = self.text(node.child_by_field_name("name")?)?;
        let modifiers = Modifiers::of(node, self.source);
        if !modifiers.public {
            return None;
        }

        let top_level = node.parent().map_or(true, |p| p.kind() == "program");
        if top_level {
            return Some(name.to_string());
        }
        if !modifiers.is_static {
            return None;
        }
        self.enclosing
            .as_ref()
            .map(|outer| format!("{outer}.{name}"))
    }

    fn visit_method(&mut self, node: Node<'_>) {
        let Some(class_name) = self.enclosing.clone() else {
            return;
        };
        let modifiers = Modifiers::of(node, self.source);
        if !modifiers.public || !modifiers.annotations.iter().any(|a| is_test_annotation(a)) {
            return;
        }
        let Some(method_name) = node
            .child_by_field_name("name")
            .and_then(|n| self.text(n))
        else {
            return;
        };

        self.records.push(TestRecord {
            class_name,
            method_name: method_name.to_string(),
            file_path: PathBuf::from(self.file_path),
        });
    }

    fn text(&self, node: Node<'_>) -> Option<&'a str> {
        node.utf8_text(self.source).ok()
    }
}

#[derive(Debug, Default)]
struct Modifiers {
    public: bool,
    is_static: bool,
    annotations: Vec<String>,
}

impl Modifiers {
    fn of(declaration: Node<'_>, source: &[u8]) -> Self {
        let mut result = Modifiers::default();
        let mut cursor = declaration.walk();
        let Some(modifiers) = declaration
            .children(&mut cursor)
            .find(|c| c.kind() == "modifiers")
        else {
            return result;
        };

        let mut cursor = modifiers.walk();
        for child in modifiers.children(&mut cursor) {
            match child.kind() {
                "public" => result.public = true,
                "static" => result.is_static = true,
                "marker_annotation" | "annotation" => {
                    if let Some(name) = child
                        .child_by_field_name("name")
                        .and_then(|n| n.utf8_text(source).ok())
                    {
                        result.annotations.push(name.split_whitespace().collect());
                    }
                }
                _ => {}
            }
        }
        result
    }
}
