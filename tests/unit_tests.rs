//! Integration tests for Quill using Unit as the entry point.
//!
//! These tests run the full pipeline (parsing, analysis, code generation and
//! execution) on complete programs, inline or from `test_scripts/`.

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use quill::{BuildError, MemoryLoader, OptLevel, SemanticError, Unit, UnitConfig, Value};

fn scripts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_scripts")
}

/// Load a test script from the test_scripts directory.
fn load_script(filename: &str) -> String {
    let path = scripts_dir().join(filename);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

/// Build and run a single test script.
fn run_script(filename: &str) -> Value {
    let mut unit = Unit::with_config(UnitConfig::new().search_root(scripts_dir()));
    unit.add_source(filename, load_script(filename)).expect("Failed to add source");
    unit.build().unwrap_or_else(|e| panic!("Failed to build {filename}: {e}"));
    unit.run().expect("Failed to run")
}

/// Build and run inline source.
fn run(source: &str) -> Value {
    let mut unit = Unit::new();
    unit.add_source("main.ql", source).expect("Failed to add source");
    unit.build().unwrap_or_else(|e| panic!("Failed to build: {e}"));
    unit.run().expect("Failed to run")
}

fn build_error(source: &str) -> BuildError {
    let mut unit = Unit::new();
    unit.add_source("main.ql", source).expect("Failed to add source");
    unit.build().expect_err("build should fail")
}

// =============================================================================
// Expressions and variables
// =============================================================================

#[test]
fn test_mixed_arithmetic_widens_to_double() {
    assert_eq!(run("3 + 2.5"), Value::Double(5.5));
}

#[test]
fn test_variable_reassignment() {
    assert_eq!(run("var x = 10 x = x + 5 x"), Value::Int(15));
}

#[test]
fn test_field_assignment() {
    assert_eq!(run("class Foo { var v: Int } var f = new Foo f.v = 7 f.v"), Value::Int(7));
}

#[test]
fn test_integer_division_and_remainder() {
    assert_eq!(run("17 / 5 * 10 + 17 % 5"), Value::Int(32));
    assert_eq!(run("0 - 7 / 2"), Value::Int(-3));
}

#[test]
fn test_casts() {
    assert_eq!(run("7.9 as Int"), Value::Int(7));
    assert_eq!(run("300 as Char"), Value::Char(',')); // 300 mod 256 == 44
    assert_eq!(run("5 as Bool"), Value::Bool(true));
    assert_eq!(run("(1 as Long) + 2"), Value::Long(3));
}

#[test]
fn test_large_literals_are_long() {
    assert_eq!(run("3000000000 + 1"), Value::Long(3_000_000_001));
}

#[test]
fn test_sizeof() {
    assert_eq!(run("sizeof(Short) + sizeof(Double) + sizeof(String)"), Value::Int(18));
}

#[test]
fn test_no_result_is_void() {
    assert_eq!(run("var x = 1"), Value::Void);
}

// =============================================================================
// Control flow and functions
// =============================================================================

#[test]
fn test_loops() {
    assert_eq!(run_script("loops.ql"), Value::Int(180));
}

#[test]
fn test_if_elseif_else() {
    let source = r#"
        def grade(n: Int) -> Int {
            if (n > 90) return 1
            elseif (n > 50) return 2
            else return 3
        }
        grade(95) * 100 + grade(60) * 10 + grade(10)
    "#;
    assert_eq!(run(source), Value::Int(123));
}

#[test]
fn test_branch_falls_through_to_merge() {
    let source = r#"
        def f(n: Int) -> Int {
            if (n > 0) { return 1 } else { n = n + 1 }
            return n
        }
        f(5) * 10 + f(-3)
    "#;
    assert_eq!(run(source), Value::Int(8));
}

#[test]
fn test_nested_branches_that_all_return() {
    let source = r#"
        def sign(n: Int) -> Int {
            if (n < 0) {
                return 0 - 1
            } else {
                if (n == 0) { return 0 } else { return 1 }
            }
        }
        def first_over(limit: Int) -> Int {
            for (var i = 0; i < 100; i = i + 1) {
                if (i * i > limit) return i
            }
            return 0 - 1
        }
        sign(0 - 9) * 100 + sign(0) * 10 + sign(4) + first_over(50) * 1000
    "#;
    assert_eq!(run(source), Value::Int(8_000 - 100 + 1));
}

#[test]
fn test_return_at_top_level_is_rejected() {
    let err = build_error("var x = 1\nif (x > 0) { return } else { return }");
    assert!(matches!(err.as_semantic(), Some(SemanticError::TypeMismatch { .. })), "{err}");
}

#[test]
fn test_mutual_recursion() {
    assert_eq!(run_script("recursion.ql"), Value::Bool(true));
}

#[test]
fn test_overloads_pick_the_closest_match() {
    let source = r#"
        def describe(x: Int) -> Int { return 1 }
        def describe(x: Double) -> Int { return 2 }
        describe(1) * 10 + describe(1.5)
    "#;
    assert_eq!(run(source), Value::Int(12));
}

#[test]
fn test_static_functions() {
    let source = r#"
        class Math {
            static def twice(n: Int) -> Int { return n * 2 }
        }
        Math.twice(21)
    "#;
    assert_eq!(run(source), Value::Int(42));
}

// =============================================================================
// Object-Oriented Programming
// =============================================================================

#[test]
fn test_virtual_dispatch() {
    assert_eq!(run_script("dispatch.ql"), Value::Int(123));
}

#[test]
fn test_dispatch_through_base_reference() {
    let mut unit = Unit::new();
    unit.add_source(
        "main.ql",
        r#"
        class Animal { var legs: Int  def speak() -> Int { return 1 }  def count() -> Int { return @legs } }
        class Dog < Animal { def speak() -> Int { return 2 } }
        var a: Animal = new Dog
        a.legs = 4
        a.speak() * 10 + a.count()
        "#,
    )
    .unwrap();
    unit.build().unwrap();
    assert_eq!(unit.run().unwrap(), Value::Int(24));

    // Only Dog's vtable is built; the shadowed Animal.speak is unreachable.
    assert!(unit.is_emitted("Dog.speak()"));
    assert!(unit.is_emitted("Animal.count()"));
    assert!(!unit.is_emitted("Animal.speak()"));
}

#[test]
fn test_uncalled_methods_are_not_compiled() {
    let mut unit = Unit::new();
    unit.add_source(
        "main.ql",
        "class Counter { var n: Int  def bump() { @n = @n + 1 }  def reset() { @n = 0 } }\nvar c = new Counter\nc.bump()\nc.bump()\nc.n",
    )
    .unwrap();
    unit.build().unwrap();
    assert_eq!(unit.run().unwrap(), Value::Int(2));
    assert!(unit.is_emitted("Counter.bump()"));
    assert!(!unit.is_emitted("Counter.reset()"));
}

#[test]
fn test_constructors() {
    let source = r#"
        class Point {
            var x: Int
            var y: Int
            def init(x: Int, y: Int) { @x = x  @y = y }
            def init(both: Int) { @x = both  @y = both }
        }
        var p = new Point(3, 4)
        var q = new Point(5)
        p.x * 1000 + p.y * 100 + q.x * 10 + q.y
    "#;
    assert_eq!(run(source), Value::Int(3455));
}

#[test]
fn test_unmatched_constructor_zero_initializes() {
    let source = r#"
        class A { var x: Int  def init(x: Int) { @x = x } }
        class B < A {}
        var b = new B(3)
        var a = new A(4)
        var c = new A("four")
        b.x * 100 + a.x * 10 + c.x
    "#;
    assert_eq!(run(source), Value::Int(40));
}

#[test]
fn test_inherited_fields_and_methods() {
    let source = r#"
        class Shape { var sides: Int  def corners() -> Int { return @sides } }
        class Square < Shape { var side: Int  def area() -> Int { return @side * @side } }
        var s = new Square
        s.sides = 4
        s.side = 3
        s.corners() * 100 + s.area()
    "#;
    assert_eq!(run(source), Value::Int(409));
}

#[test]
fn test_reference_equality() {
    let source = r#"
        class Node { var next: Node }
        var a = new Node
        var b = new Node
        a.next = b
        a.next == b and a != b and b.next == null
    "#;
    assert_eq!(run(source), Value::Bool(true));
}

#[test]
fn test_generics() {
    assert_eq!(run_script("generics.ql"), Value::Double(41.5));
}

// =============================================================================
// Built-in types
// =============================================================================

#[test]
fn test_string_concatenation() {
    assert_eq!(
        run_script("strings.ql"),
        Value::String(Some("hello quill, 3 2.5 true".to_string()))
    );
}

#[test]
fn test_string_equality_and_length() {
    assert_eq!(run("var s = \"ab\" + \"cd\"\ns == \"abcd\" and s != \"ab\""), Value::Bool(true));
    assert_eq!(run("\"quill\".length()"), Value::Int(5));
}

#[test]
fn test_to_string() {
    assert_eq!(run("var n = 42\nn.to_string()"), Value::String(Some("42".to_string())));
    assert_eq!(run("var b = false\nb.to_string()"), Value::String(Some("false".to_string())));
}

#[test]
fn test_array_capacity_doubles() {
    assert_eq!(run_script("arrays.ql"), Value::Int(8169));
}

#[test]
fn test_array_elements() {
    let source = r#"
        var xs = [1, 2, 3]
        xs.add(4)
        xs[0] = 9
        xs.set(1, 20)
        xs[0] + xs.get(1) + xs[3] + xs.length()
    "#;
    assert_eq!(run(source), Value::Int(37));
}

#[test]
fn test_arrays_of_doubles() {
    assert_eq!(run("var ds = [1.5, 2.5]\nds.add(3)\nds[0] + ds[1] + ds[2]"), Value::Double(7.0));
}

#[test]
fn test_pointers() {
    assert_eq!(run_script("pointers.ql"), Value::Long(35));
}

// =============================================================================
// Host interaction
// =============================================================================

#[test]
fn test_libc_extern() {
    assert_eq!(run("extern def abs(x: Int) -> Int\nabs(0 - 42)"), Value::Int(42));
}

extern "C" fn triple(x: i64) -> i64 {
    x * 3
}

#[test]
fn test_registered_extern() {
    let mut unit = Unit::new();
    unit.register_symbol("triple", triple as *const u8).unwrap();
    unit.add_source("main.ql", "extern def triple(x: Long) -> Long\ntriple(14)").unwrap();
    unit.build().unwrap();
    assert_eq!(unit.run().unwrap(), Value::Long(42));
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_print_output() {
    let captured = Captured::default();
    quill::set_stdout_capture(Some(Box::new(captured.clone())));

    run(r#"
        print("hello")
        print(42)
        print(2.5)
        print(true)
        print(3000000000)
        print("n = " + 7)
    "#);
    quill::set_stdout_capture(None);

    let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    assert_eq!(output, "hello\n42\n2.5\ntrue\n3000000000\nn = 7\n");
}

// =============================================================================
// Imports
// =============================================================================

#[test]
fn test_imports_from_files() {
    let mut unit = Unit::with_config(UnitConfig::new().search_root(scripts_dir()));
    unit.add_source("imports.ql", load_script("imports.ql")).unwrap();
    unit.build().unwrap();
    // imports.ql, shapes.ql and geometry.ql, each read once.
    assert_eq!(unit.import_count(), 3);
    assert_eq!(unit.run().unwrap(), Value::Int(36));
}

#[test]
fn test_library_sources() {
    let mut unit = Unit::new();
    unit.add_source("lib.ql", "def inc(n: Int) -> Int { return n + 1 }").unwrap();
    unit.add_source("main.ql", "inc(inc(1))").unwrap();
    unit.build().unwrap();
    assert_eq!(unit.run().unwrap(), Value::Int(3));
}

#[test]
fn test_imported_files_only_hold_declarations() {
    let loader = MemoryLoader::new().with_file("side_effect.ql", "print(1)");
    let mut unit = Unit::new().with_loader(loader);
    unit.add_source("main.ql", "import \"side_effect\"\n1").unwrap();
    let err = unit.build().unwrap_err();
    assert!(matches!(err.as_semantic(), Some(SemanticError::ImportFailed { .. })));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_every_opt_level_agrees() {
    for opt_level in [OptLevel::None, OptLevel::Speed, OptLevel::SpeedAndSize] {
        let config = UnitConfig::new().search_root(scripts_dir()).opt_level(opt_level).verifier(true);
        let mut unit = Unit::with_config(config);
        unit.add_source("recursion.ql", load_script("recursion.ql")).unwrap();
        unit.build().unwrap();
        assert_eq!(unit.run().unwrap(), Value::Bool(true), "{opt_level:?}");
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

#[test]
fn test_missing_return() {
    let err = build_error("def f(x: Int) -> Int { if (x > 0) return 1 }\nf(1)");
    assert!(matches!(err.as_semantic(), Some(SemanticError::MissingReturn { .. })));
}

#[test]
fn test_ambiguous_overload() {
    let err = build_error("def f(a: Long, b: Int) -> Int { return 1 }\ndef f(a: Int, b: Long) -> Int { return 2 }\nf(1, 1)");
    assert!(matches!(err.as_semantic(), Some(SemanticError::AmbiguousOverload { .. })));
}

#[test]
fn test_undefined_symbol_reports_position() {
    let err = build_error("var a = 1\nvar b = a + missing");
    let semantic = err.as_semantic().expect("semantic error");
    assert!(matches!(semantic, SemanticError::UndefinedSymbol { .. }));
    assert_eq!(semantic.span().line, 2);
}

#[test]
fn test_type_mismatch() {
    let err = build_error("var s: String = 5");
    assert!(matches!(err.as_semantic(), Some(SemanticError::TypeMismatch { .. })));
}

#[test]
fn test_parse_errors_are_not_semantic() {
    let err = build_error("var = 3");
    assert!(matches!(err, BuildError::Parse { .. }));
    assert!(err.as_semantic().is_none());
}
