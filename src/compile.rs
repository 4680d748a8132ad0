//! The host-facing compilation pipeline: reads source files, drives the
//! scanner/parser/checker, and reports diagnostics (spec §6).
//!
//! The front end itself (`compiler::scanner`/`parser`/`checker`) never
//! touches a filesystem; only this module does, through [`CompilerHost`],
//! keeping the core pass-local per spec §5 (SPEC_FULL §4.10).

use crate::cli::*;
use crate::compiler::checker::{self, CheckerDiagnostic};
use crate::compiler::diagnostics::DiagnosticCategory as CheckerDiagnosticCategory;
use crate::compiler::parser;
use crate::compiler::scanner::Scanner;

#[derive(Clone)]
pub struct SourceFile {
    pub file_name: String,
    pub text: String,
    pub line_map: Vec<usize>, // Line start positions for error reporting
}

// Compilation result diagnostics
#[derive(Debug)]
pub struct Diagnostic {
    pub file_name: Option<String>,
    pub line: usize,
    pub character: usize,
    pub message: String,
    pub code: u32,
    pub category: DiagnosticCategory,
}

#[derive(Debug)]
pub enum DiagnosticCategory {
    Error,
    Warning,
    Suggestion,
    Message,
}

impl From<CheckerDiagnosticCategory> for DiagnosticCategory {
    fn from(category: CheckerDiagnosticCategory) -> Self {
        match category {
            CheckerDiagnosticCategory::Error => DiagnosticCategory::Error,
            CheckerDiagnosticCategory::Warning => DiagnosticCategory::Warning,
            CheckerDiagnosticCategory::Suggestion => DiagnosticCategory::Suggestion,
            CheckerDiagnosticCategory::Message => DiagnosticCategory::Message,
        }
    }
}

// Program represents the entire TypeScript program being compiled
pub struct Program {
    pub source_files: Vec<SourceFile>,
    pub diagnostics: Vec<Diagnostic>,
}

// Abstraction for file system operations
pub trait CompilerHost {
    fn read_file(&self, path: &str) -> Option<String>;
    fn write_file(&self, path: &str, data: &str) -> bool;
    fn file_exists(&self, path: &str) -> bool;
    fn get_current_directory(&self) -> String;
}

// Implement a basic filesystem-based compiler host
struct FileSystemCompilerHost;

impl CompilerHost for FileSystemCompilerHost {
    fn read_file(&self, path: &str) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }

    fn write_file(&self, path: &str, data: &str) -> bool {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return false;
            }
        }
        std::fs::write(path, data).is_ok()
    }

    fn file_exists(&self, path: &str) -> bool {
        std::path::Path::new(path).exists()
    }

    fn get_current_directory(&self) -> String {
        std::env::current_dir()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| ".".to_string())
    }
}

pub fn create_compiler_host() -> impl CompilerHost {
    FileSystemCompilerHost
}

pub fn read_source_files(file_paths: &[String], host: &impl CompilerHost) -> Vec<SourceFile> {
    file_paths
        .iter()
        .filter_map(|path| {
            let text = host.read_file(path);
            if text.is_none() {
                log::warn!("could not read source file '{path}'");
            }
            let text = text?;
            let line_map = compute_line_map(&text);

            Some(SourceFile {
                file_name: path.clone(),
                text,
                line_map,
            })
        })
        .collect()
}

// Compute line start positions for error reporting
pub fn compute_line_map(text: &str) -> Vec<usize> {
    let mut positions = vec![0];
    for (i, c) in text.char_indices() {
        if c == '\n' {
            positions.push(i + 1);
        }
    }
    positions
}

/// Byte offset of the start of a (1-based) line, used to turn a `Span` into
/// a 1-based column for diagnostic reporting.
fn line_start(line_map: &[usize], line: usize) -> usize {
    line_map.get(line.saturating_sub(1)).copied().unwrap_or(0)
}

pub fn create_program(
    source_files: &[SourceFile],
    _compiler_options: &CompilerOptions,
    _host: &impl CompilerHost,
) -> Program {
    Program {
        source_files: source_files.to_vec(),
        diagnostics: Vec::new(),
    }
}

/// Runs the scanner, parser and checker over every source file in the
/// program and populates `program.diagnostics`, in source-file order, with
/// the same numeric codes the checker exposes in [`CheckerDiagnostic`].
pub fn type_check(program: &mut Program) {
    for source_file in &program.source_files {
        log::trace!("scanning '{}'", source_file.file_name);
        let scanner = Scanner::new(&source_file.text);
        let (tokens, scan_errors) = scanner.scan_all();

        for err in &scan_errors {
            program.diagnostics.push(Diagnostic {
                file_name: Some(source_file.file_name.clone()),
                line: err.line,
                character: 1,
                message: err.message.clone(),
                code: err.code,
                category: err.category.into(),
            });
        }

        log::trace!("parsing '{}'", source_file.file_name);
        let (ast, parse_errors) = parser::parse_program(tokens);

        for err in &parse_errors {
            program.diagnostics.push(Diagnostic {
                file_name: Some(source_file.file_name.clone()),
                line: err.span.line,
                character: err.span.start - line_start(&source_file.line_map, err.span.line) + 1,
                message: err.message.clone(),
                code: err.code,
                category: err.category.into(),
            });
        }

        if !parse_errors.is_empty() {
            // Parse errors abort the containing declaration (spec §4.2); a
            // syntactically broken file is not worth checking further.
            continue;
        }

        log::debug!("type-checking '{}'", source_file.file_name);
        let checker_diagnostics: Vec<CheckerDiagnostic> = checker::check_program(&ast);
        for diag in checker_diagnostics {
            program.diagnostics.push(Diagnostic {
                file_name: Some(source_file.file_name.clone()),
                line: diag.span.line,
                character: diag.span.start - line_start(&source_file.line_map, diag.span.line) + 1,
                message: diag.message,
                code: diag.code,
                category: diag.category.into(),
            });
        }
    }
}

pub fn emit_files(program: &Program, options: &CompilerOptions, host: &impl CompilerHost) {
    // Emission targets a managed bytecode and is an external collaborator's
    // contract (spec §1, §6) — the core only ever hands the emitter a fully
    // typed AST. This stub exercises the `CompilerHost` write path so the
    // CLI's `--outDir`/`--noEmit` plumbing has somewhere real to land.
    if options.no_emit {
        return;
    }

    let Some(out_dir) = &options.out_dir else {
        return;
    };

    for source_file in &program.source_files {
        let base_name = std::path::Path::new(&source_file.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown");

        let js_path = format!("{out_dir}/{base_name}.js");
        log::debug!("emitting '{js_path}' (stub — emission is an external collaborator)");
        let placeholder = "// emission is performed by the bytecode emitter, not the core checker\n";
        host.write_file(&js_path, placeholder);

        if options.declaration {
            let dts_path = format!("{out_dir}/{base_name}.d.ts");
            host.write_file(&dts_path, "export {};\n");
        }
    }
}

pub fn report_diagnostics(diagnostics: &[Diagnostic], pretty: bool) {
    if diagnostics.is_empty() {
        println!("Compilation completed successfully.");
        return;
    }

    let mut error_count = 0;
    let mut warning_count = 0;

    for diagnostic in diagnostics {
        match diagnostic.category {
            DiagnosticCategory::Error => {
                error_count += 1;
                print_diagnostic(diagnostic, pretty);
            }
            DiagnosticCategory::Warning => {
                warning_count += 1;
                print_diagnostic(diagnostic, pretty);
            }
            _ => {}
        }
    }

    println!(
        "Found {} error(s), {} warning(s)",
        error_count, warning_count
    );
}

pub fn print_diagnostic(diagnostic: &Diagnostic, pretty: bool) {
    let color_start = if pretty { "\x1b[31m" } else { "" };
    let color_end = if pretty { "\x1b[0m" } else { "" };

    if let Some(file_name) = &diagnostic.file_name {
        println!(
            "{}{}({}:{}) - error TS{}: {}{}",
            color_start,
            file_name,
            diagnostic.line,
            diagnostic.character,
            diagnostic.code,
            diagnostic.message,
            color_end
        );
    } else {
        println!(
            "{}error TS{}: {}{}",
            color_start, diagnostic.code, diagnostic.message, color_end
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeHost;
    impl CompilerHost for FakeHost {
        fn read_file(&self, _path: &str) -> Option<String> {
            None
        }
        fn write_file(&self, _path: &str, _data: &str) -> bool {
            true
        }
        fn file_exists(&self, _path: &str) -> bool {
            false
        }
        fn get_current_directory(&self) -> String {
            ".".to_string()
        }
    }

    fn check_source(text: &str) -> Program {
        let source_files = vec![SourceFile {
            file_name: "test.ts".to_string(),
            line_map: compute_line_map(text),
            text: text.to_string(),
        }];
        let mut program = Program {
            source_files,
            diagnostics: Vec::new(),
        };
        type_check(&mut program);
        program
    }

    #[test]
    fn valid_program_has_no_diagnostics() {
        let program = check_source("let x: number = 10;\nconsole.log(x);");
        assert!(program.diagnostics.is_empty(), "{:?}", program.diagnostics);
    }

    #[test]
    fn type_mismatch_is_reported_with_source_position() {
        let program = check_source("let x: number = \"hi\";");
        assert_eq!(program.diagnostics.len(), 1);
        assert_eq!(program.diagnostics[0].code, 2322);
        assert_eq!(program.diagnostics[0].line, 1);
    }

    #[test]
    fn unterminated_string_is_reported() {
        let program = check_source("let x = \"unterminated;");
        assert!(program.diagnostics.iter().any(|d| d.code == 1002), "{:?}", program.diagnostics);
    }
}
