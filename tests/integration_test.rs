// Integration tests for the embedded Python executor

use chalkstep::executor::{CodeExecutor, PythonExecutor};
use chalkstep::lesson::{ExecutionPlan, LESSONS};

fn run(source: &str, inputs: &[&str]) -> String {
    let inputs: Vec<String> = inputs.iter().map(|s| s.to_string()).collect();
    PythonExecutor::new()
        .run_program(source, &inputs)
        .expect("Execution failed")
}

#[test]
fn test_every_lesson_template_runs() {
    for lesson in LESSONS {
        for template in lesson.templates {
            let inputs = vec!["4".to_string(), "5".to_string()];
            let result = PythonExecutor::new().run_program(template.source, &inputs);
            assert!(
                result.is_ok(),
                "lesson {} ({}) failed: {:?}",
                lesson.id,
                template.label,
                result
            );
        }
    }
}

#[test]
fn test_variables_lesson_output() {
    let source = "message = \"Keep Smiling\"\nprint(message)\nuserNo = 101\nprint(\"User Number is\", userNo)";
    assert_eq!(run(source, &[]), "Keep Smiling\nUser Number is 101\n");
}

#[test]
fn test_print_separator_and_end() {
    assert_eq!(run("print('a', 'b', sep='-', end='!\\n')", &[]), "a-b!\n");
}

#[test]
fn test_input_feeds_conversion() {
    let source = "age = int(input('Age: '))\nprint(age + 1)";
    assert_eq!(run(source, &["41"]), "42\n");
}

#[test]
fn test_fstring_and_string_methods() {
    let source = "name = 'ada'\nprint(f'Hello, {name.title()}!')\nprint(name.upper())";
    assert_eq!(run(source, &[]), "Hello, Ada!\nADA\n");
}

#[test]
fn test_comments_and_semicolons() {
    let source = "# setup\nx = 1; y = 2  # two statements\nprint(x + y)";
    assert_eq!(run(source, &[]), "3\n");
}

#[tokio::test]
async fn test_compound_statements_rejected() {
    let mut executor = PythonExecutor::new();
    let err = executor
        .validate("x = 1\nif x:\n    print(x)")
        .await
        .unwrap_err();
    assert!(err.is_syntax());
    assert!(err.message().contains("not supported in step-by-step lessons"));
}

#[tokio::test]
async fn test_step_by_step_matches_whole_program() {
    let source = "length = 10\nbreadth = 20\narea = length * breadth\nprint(area)";
    let plan = ExecutionPlan::build(source);

    let mut executor = PythonExecutor::new();
    for step in plan.iter() {
        executor.execute(&step.code).await.expect("step failed");
    }
    assert_eq!(executor.read_stdout(), run(source, &[]));
}

#[tokio::test]
async fn test_runtime_error_keeps_earlier_bindings() {
    let mut executor = PythonExecutor::new();
    executor.execute("total = 5").await.expect("exec");
    let err = executor.execute("avg = total / 0").await.unwrap_err();
    assert!(!err.is_syntax());
    assert!(err.message().starts_with("ZeroDivisionError"));
    assert_eq!(
        executor.snapshot(),
        vec![("total".to_string(), "5".to_string())]
    );
}

#[test]
fn test_missing_input_raises_eof() {
    let err = PythonExecutor::new()
        .run_program("name = input()", &[])
        .unwrap_err();
    assert!(err.message().starts_with("EOFError"));
}
