//! End-to-end scenarios from spec §8 "Testable Properties", exercised
//! through the public `compile` pipeline (scan -> parse -> check) rather
//! than against any single subsystem in isolation.

use tsrs::compile::{compute_line_map, type_check, DiagnosticCategory, Program, SourceFile};

fn check(src: &str) -> Program {
    let source_file = SourceFile {
        file_name: "scenario.ts".to_string(),
        text: src.to_string(),
        line_map: compute_line_map(src),
    };
    let mut program = Program {
        source_files: vec![source_file],
        diagnostics: Vec::new(),
    };
    type_check(&mut program);
    program
}

fn errors(program: &Program) -> Vec<&str> {
    program
        .diagnostics
        .iter()
        .filter(|d| matches!(d.category, DiagnosticCategory::Error))
        .map(|d| d.message.as_str())
        .collect()
}

#[test]
fn number_let_binding_type_checks() {
    let program = check("let x: number = 10;\nconsole.log(x);");
    assert!(errors(&program).is_empty(), "{:?}", errors(&program));
}

#[test]
fn generic_identity_infers_from_argument() {
    let program = check("function id<T>(v: T): T { return v; }\nid(42);");
    assert!(errors(&program).is_empty(), "{:?}", errors(&program));
}

#[test]
fn generic_identity_rejects_mismatched_explicit_type_argument() {
    let program = check("function id<T>(v: T): T { return v; }\nid<string>(42);");
    assert!(!errors(&program).is_empty(), "expected a type-mismatch diagnostic");
}

#[test]
fn discriminated_union_narrows_in_each_arm() {
    let src = r#"
        type Shape = {kind: "c"; r: number} | {kind: "s"; side: number};
        function area(s: Shape): number {
            if (s.kind === "c") {
                return s.r * s.r * 3.14;
            }
            return s.side * s.side;
        }
    "#;
    let program = check(src);
    assert!(errors(&program).is_empty(), "{:?}", errors(&program));
}

#[test]
fn discriminated_union_rejects_wrong_arm_member() {
    let src = r#"
        type Shape = {kind: "c"; r: number} | {kind: "s"; side: number};
        function area(s: Shape): number {
            if (s.kind === "c") {
                return s.side * s.side;
            }
            return s.side * s.side;
        }
    "#;
    let program = check(src);
    assert!(!errors(&program).is_empty(), "expected `s.side` rejected in the circle arm");
}

#[test]
fn array_destructuring_type_checks_without_annotation() {
    let program = check("const a = [1, 2, 3];\nconst [h, ...t] = a;\nconst n: number = h;");
    assert!(errors(&program).is_empty(), "{:?}", errors(&program));
}

#[test]
fn tuple_destructuring_accepts_matching_shape() {
    let program = check(r#"const [x, y]: [string, number] = ["a", 1];"#);
    assert!(errors(&program).is_empty(), "{:?}", errors(&program));
}

#[test]
fn tuple_destructuring_rejects_mismatched_element() {
    let program = check(r#"const [x, y]: [string, number] = ["a", "b"];"#);
    assert!(!errors(&program).is_empty(), "expected position-1 mismatch rejected");
}

#[test]
fn interface_declaration_merging_requires_both_members() {
    let src = r#"
        interface A { x: number }
        interface A { y: string }
        const v: A = {x: 1, y: "q"};
    "#;
    let program = check(src);
    assert!(errors(&program).is_empty(), "{:?}", errors(&program));
}

#[test]
fn interface_declaration_merging_rejects_missing_member() {
    let src = r#"
        interface A { x: number }
        interface A { y: string }
        const v: A = {x: 1};
    "#;
    let program = check(src);
    assert!(!errors(&program).is_empty(), "expected missing member `y` rejected");
}

#[test]
fn recursive_alias_accepts_matching_linked_list() {
    let src = r#"
        type List<T> = {head: T; tail: List<T> | null};
        const l: List<number> = {head: 1, tail: {head: 2, tail: null}};
    "#;
    let program = check(src);
    assert!(errors(&program).is_empty(), "{:?}", errors(&program));
}

#[test]
fn recursive_alias_rejects_mismatched_inner_head() {
    let src = r#"
        type List<T> = {head: T; tail: List<T> | null};
        const l: List<number> = {head: 1, tail: {head: "two", tail: null}};
    "#;
    let program = check(src);
    assert!(!errors(&program).is_empty(), "expected inner `head: \"two\"` rejected");
}

#[test]
fn let_widens_literal_const_preserves_it() {
    let src = r#"
        let a = "hi";
        a = "there";
        const b = "hi";
        function takesHi(x: "hi"): void {}
        takesHi(b);
    "#;
    let program = check(src);
    assert!(errors(&program).is_empty(), "{:?}", errors(&program));
}

#[test]
fn exhaustive_switch_default_narrows_to_never() {
    let src = r#"
        type Shape = {kind: "c"; r: number} | {kind: "s"; side: number};
        function area(s: Shape): number {
            switch (s.kind) {
                case "c":
                    return s.r * s.r;
                case "s":
                    return s.side * s.side;
                default:
                    const check: never = s;
                    return 0;
            }
        }
    "#;
    let program = check(src);
    assert!(errors(&program).is_empty(), "{:?}", errors(&program));
}

#[test]
fn excess_property_on_fresh_literal_is_rejected() {
    let src = r#"
        interface Point { x: number; y: number }
        const p: Point = {x: 1, y: 2, z: 3};
    "#;
    let program = check(src);
    assert!(!errors(&program).is_empty(), "expected excess property `z` rejected");
}

#[test]
fn excess_property_check_does_not_apply_through_a_variable() {
    let src = r#"
        interface Point { x: number; y: number }
        const raw = {x: 1, y: 2, z: 3};
        const p: Point = raw;
    "#;
    let program = check(src);
    assert!(errors(&program).is_empty(), "{:?}", errors(&program));
}

#[test]
fn user_defined_type_guard_narrows_then_branch() {
    let src = r#"
        function isString(v: unknown): v is string {
            return typeof v === "string";
        }
        function useIt(v: unknown): number {
            if (isString(v)) {
                return v.length;
            }
            return 0;
        }
    "#;
    let program = check(src);
    assert!(errors(&program).is_empty(), "{:?}", errors(&program));
}

#[test]
fn user_defined_type_guard_narrows_to_the_predicate_target_type() {
    let src = r#"
        function isNum(v: unknown): v is number {
            return typeof v === "number";
        }
        function useIt(v: unknown): void {
            if (isNum(v)) {
                const n: number = v;
            }
        }
    "#;
    let program = check(src);
    assert!(errors(&program).is_empty(), "{:?}", errors(&program));
}

#[test]
fn user_defined_type_guard_does_not_narrow_the_else_branch() {
    let src = r#"
        function isNum(v: unknown): v is number {
            return typeof v === "number";
        }
        function useIt(v: unknown): void {
            if (isNum(v)) {
            } else {
                const n: number = v;
            }
        }
    "#;
    let program = check(src);
    assert!(!errors(&program).is_empty(), "expected `v` to remain `unknown` in the else branch");
}

#[test]
fn assertion_function_narrows_following_statements() {
    let src = r#"
        function assertIsNum(v: unknown): asserts v is number {
            if (typeof v !== "number") {
                throw new Error("not a number");
            }
        }
        function useIt(v: unknown): void {
            assertIsNum(v);
            const n: number = v;
        }
    "#;
    let program = check(src);
    assert!(errors(&program).is_empty(), "{:?}", errors(&program));
}

#[test]
fn class_field_type_mismatch_is_an_error() {
    let src = r#"
        class Point {
            x: number;
            y: number;
            constructor(x: number, y: number) {
                this.x = x;
                this.y = y;
            }
        }
        const p: Point = new Point(1, 2);
        const bad: Point = {x: 1, y: 2};
    "#;
    let program = check(src);
    assert!(!errors(&program).is_empty(), "expected structural object literal rejected for a nominal class type");
}

#[test]
fn class_implementing_interface_satisfies_it_structurally() {
    let src = r#"
        interface Shape {
            area(): number;
        }
        class Circle implements Shape {
            radius: number;
            constructor(radius: number) {
                this.radius = radius;
            }
            area(): number {
                return this.radius * this.radius * 3.14;
            }
        }
        const s: Shape = new Circle(2);
    "#;
    let program = check(src);
    assert!(errors(&program).is_empty(), "{:?}", errors(&program));
}

#[test]
fn class_missing_interface_member_is_rejected() {
    let src = r#"
        interface Shape {
            area(): number;
            perimeter(): number;
        }
        class Circle {
            radius: number;
            constructor(radius: number) {
                this.radius = radius;
            }
            area(): number {
                return this.radius * this.radius * 3.14;
            }
        }
        const s: Shape = new Circle(2);
    "#;
    let program = check(src);
    assert!(!errors(&program).is_empty(), "expected missing `perimeter` member rejected");
}

#[test]
fn record_with_string_index_satisfies_named_field_requirement() {
    let src = r#"
        interface Named { total: number }
        function useIt(r: { [key: string]: number }): void {
            const d: Named = r;
        }
    "#;
    let program = check(src);
    assert!(errors(&program).is_empty(), "{:?}", errors(&program));
}

#[test]
fn record_without_matching_field_or_index_is_rejected() {
    let src = r#"
        interface Named { total: number }
        const d: Named = {};
    "#;
    let program = check(src);
    assert!(!errors(&program).is_empty(), "expected missing `total` member rejected");
}
