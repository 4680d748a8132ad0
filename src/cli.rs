use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// The TypeScript Compiler
#[derive(Parser)]
#[command(name = "tsrs")]
#[command(version = "Version 0.0.1")]
#[command(about = "The TypeScript Compiler...in Rust!", long_about = None)]
#[command(after_help = "You can learn about all of the compiler options at https://aka.ms/tsrs")]
#[command(disable_help_flag = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Print this message.
    #[arg(short = 'h', long = "help")]
    pub help: bool,

    /// Watch input files.
    #[arg(short = 'w', long = "watch")]
    pub watch: bool,

    /// Show all compiler options.
    #[arg(long = "all")]
    pub all: bool,

    /// Print the compiler's version.
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Initializes a TypeScript project and creates a tsrsonfig.json file.
    #[arg(long = "init")]
    pub init: bool,

    /// Compile the project given the path to its configuration file, or to a folder with a 'tsrsonfig.json'.
    #[arg(short = 'p', long = "project")]
    pub project: Option<PathBuf>,

    /// Print the final configuration instead of building.
    #[arg(long = "showConfig")]
    pub show_config: bool,

    /// Build one or more projects and their dependencies, if out of date
    #[arg(short = 'b', long = "build")]
    pub build: bool,

    // COMMON COMPILER OPTIONS
    /// Enable color and formatting in TypeScript's output to make compiler errors easier to read.
    #[arg(long = "pretty", default_value_t = true)]
    pub pretty: bool,

    /// Generate .d.ts files from TypeScript and JavaScript files in your project.
    #[arg(short = 'd', long = "declaration")]
    pub declaration: bool,

    /// Create sourcemaps for d.ts files.
    #[arg(long = "declarationMap")]
    pub declaration_map: bool,

    /// Only output d.ts files and not JavaScript files.
    #[arg(long = "emitDeclarationOnly")]
    pub emit_declaration_only: bool,

    /// Create source map files for emitted JavaScript files.
    #[arg(long = "sourceMap")]
    pub source_map: bool,

    /// Disable emitting files from a compilation.
    #[arg(long = "noEmit")]
    pub no_emit: bool,

    /// Set the JavaScript language version for emitted JavaScript and include compatible library declarations.
    #[arg(short = 't', long = "target", value_enum)]
    pub target: Option<Target>,

    /// Specify what module code is generated.
    #[arg(short = 'm', long = "module", value_enum)]
    pub module: Option<Module>,

    /// Specify a set of bundled library declaration files that describe the target runtime environment.
    #[arg(long = "lib")]
    pub lib: Vec<String>,

    /// Allow JavaScript files to be a part of your program. Use the 'checkJS' option to get errors from these files.
    #[arg(long = "allowJs")]
    pub allow_js: bool,

    /// Enable error reporting in type-checked JavaScript files.
    #[arg(long = "checkJs")]
    pub check_js: bool,

    /// Specify what JSX code is generated.
    #[arg(long = "jsx", value_enum)]
    pub jsx: Option<JsxMode>,

    /// Specify a file that bundles all outputs into one JavaScript file.
    /// If 'declaration' is true, also designates a file that bundles all .d.ts output.
    #[arg(long = "outFile")]
    pub out_file: Option<PathBuf>,

    /// Specify an output folder for all emitted files.
    #[arg(long = "outDir")]
    pub out_dir: Option<PathBuf>,

    /// Disable emitting comments.
    #[arg(long = "removeComments")]
    pub remove_comments: bool,

    /// Enable all strict type-checking options.
    #[arg(long = "strict")]
    pub strict: bool,

    /// Specify type package names to be included without being referenced in a source file.
    #[arg(long = "types")]
    pub types: Vec<String>,

    /// Emit additional JavaScript to ease support for importing CommonJS modules.
    /// This enables 'allowSyntheticDefaultImports' for type compatibility.
    #[arg(long = "esModuleInterop")]
    pub es_module_interop: bool,

    /// Input files to compile
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Target {
    #[value(name = "es5")]
    Es5,
    #[value(name = "es6")]
    Es2015,
    #[value(name = "es2016")]
    Es2016,
    #[value(name = "es2017")]
    Es2017,
    #[value(name = "es2018")]
    Es2018,
    #[value(name = "es2019")]
    Es2019,
    #[value(name = "es2020")]
    Es2020,
    #[value(name = "es2021")]
    Es2021,
    #[value(name = "es2022")]
    Es2022,
    #[value(name = "es2023")]
    Es2023,
    #[value(name = "es2024")]
    Es2024,
    #[value(name = "esnext")]
    EsNext,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Module {
    #[value(name = "none")]
    None,
    #[value(name = "commonjs")]
    CommonJs,
    #[value(name = "amd")]
    Amd,
    #[value(name = "umd")]
    Umd,
    #[value(name = "system")]
    System,
    #[value(name = "es6")]
    Es2015,
    #[value(name = "es2020")]
    Es2020,
    #[value(name = "es2022")]
    Es2022,
    #[value(name = "esnext")]
    EsNext,
    #[value(name = "node16")]
    Node16,
    #[value(name = "node18")]
    Node18,
    #[value(name = "nodenext")]
    NodeNext,
    #[value(name = "preserve")]
    Preserve,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum JsxMode {
    #[value(name = "preserve")]
    Preserve,
    #[value(name = "react")]
    React,
    #[value(name = "react-native")]
    ReactNative,
    #[value(name = "react-jsx")]
    ReactJsx,
    #[value(name = "react-jsxdev")]
    ReactJsxDev,
}

// Compiler options derived from CLI arguments, merged over a project config.
pub struct CompilerOptions {
    pub target: String, // ES5, ES2015, etc.
    pub module: String, // CommonJS, ESNext, etc.
    pub source_map: bool,
    pub declaration: bool,
    pub out_dir: Option<String>,
    pub no_emit: bool,
    pub strict: bool,
    pub skip_type_checking: bool,
    pub pretty: bool,
}

fn target_name(target: Target) -> &'static str {
    match target {
        Target::Es5 => "es5",
        Target::Es2015 => "es2015",
        Target::Es2016 => "es2016",
        Target::Es2017 => "es2017",
        Target::Es2018 => "es2018",
        Target::Es2019 => "es2019",
        Target::Es2020 => "es2020",
        Target::Es2021 => "es2021",
        Target::Es2022 => "es2022",
        Target::Es2023 => "es2023",
        Target::Es2024 => "es2024",
        Target::EsNext => "esnext",
    }
}

fn module_name(module: Module) -> &'static str {
    match module {
        Module::None => "none",
        Module::CommonJs => "commonjs",
        Module::Amd => "amd",
        Module::Umd => "umd",
        Module::System => "system",
        Module::Es2015 => "es2015",
        Module::Es2020 => "es2020",
        Module::Es2022 => "es2022",
        Module::EsNext => "esnext",
        Module::Node16 => "node16",
        Module::Node18 => "node18",
        Module::NodeNext => "nodenext",
        Module::Preserve => "preserve",
    }
}

/// CLI flags shadow config-file values, which shadow built-in defaults
/// (SPEC_FULL §2.3). `config` is `None` when no `tsrsconfig.json` was found.
pub fn create_compiler_options(
    cli: &Cli,
    config: Option<&crate::config::ProjectConfig>,
) -> CompilerOptions {
    let file_opts = config.map(|c| &c.compiler_options);

    let target = cli
        .target
        .map(target_name)
        .map(str::to_string)
        .or_else(|| file_opts.and_then(|o| o.target.clone()))
        .unwrap_or_else(|| "es2022".to_string());
    let module = cli
        .module
        .map(module_name)
        .map(str::to_string)
        .or_else(|| file_opts.and_then(|o| o.module.clone()))
        .unwrap_or_else(|| "esnext".to_string());
    let out_dir = cli
        .out_dir
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .or_else(|| file_opts.and_then(|o| o.out_dir.clone()));
    let declaration = cli.declaration || file_opts.and_then(|o| o.declaration).unwrap_or(false);
    let no_emit = cli.no_emit || file_opts.and_then(|o| o.no_emit).unwrap_or(false);
    let strict = cli.strict || file_opts.and_then(|o| o.strict).unwrap_or(false);

    CompilerOptions {
        target,
        module,
        source_map: cli.source_map,
        declaration,
        out_dir,
        no_emit,
        strict,
        skip_type_checking: false,
        pretty: cli.pretty,
    }
}

pub fn print_help(all: bool) {
    println!("tsrs: The TypeScript Compiler - Version 5.8.2");
    println!(
        "                                                                                                               TS "
    );
    println!("COMMON COMMANDS");
    println!();
    println!("  tsrs");
    println!("  Compiles the current project (tsrsonfig.json in the working directory.)");
    println!();
    println!("  tsrs app.ts util.ts");
    println!(
        "  Ignoring tsrsonfig.json, compiles the specified files with default compiler options."
    );
    println!();
    println!("  tsrs -b");
    println!("  Build a composite project in the working directory.");
    println!();
    println!("  tsrs --init");
    println!("  Creates a tsrsonfig.json with the recommended settings in the working directory.");
    println!();
    println!("  tsrs -p ./path/to/tsrsonfig.json");
    println!("  Compiles the TypeScript project located at the specified path.");
    println!();
    println!("  tsrs --help --all");
    println!("  An expanded version of this information, showing all possible compiler options");
    println!();
    println!("  tsrs --noEmit");
    println!("  tsrs --target esnext");
    println!("  Compiles the current project, with additional settings.");
    println!();

    println!("COMMAND LINE FLAGS");
    println!();
    println!("     --help, -h  Print this message.");
    println!();
    println!("    --watch, -w  Watch input files.");
    println!();
    println!("          --all  Show all compiler options.");
    println!();
    println!("  --version, -v  Print the compiler's version.");
    println!();
    println!(
        "         --init  Initializes a TypeScript project and creates a tsrsonfig.json file."
    );
    println!();
    println!(
        "  --project, -p  Compile the project given the path to its configuration file, or to a folder with a 'tsrsonfig.json'."
    );
    println!();
    println!("   --showConfig  Print the final configuration instead of building.");
    println!();
    println!("    --build, -b  Build one or more projects and their dependencies, if out of date");
    println!();

    println!("COMMON COMPILER OPTIONS");
    println!();
    println!(
        "               --pretty  Enable color and formatting in TypeScript's output to make compiler errors easier to read."
    );
    println!("                  type:  boolean");
    println!("               default:  true");
    println!();
    println!(
        "      --declaration, -d  Generate .d.ts files from TypeScript and JavaScript files in your project."
    );
    println!("                  type:  boolean");
    println!("               default:  `false`, unless `composite` is set");
    println!();

    if all {
        // Print all compiler options when --all is used
        println!("... [additional compiler options would be shown here] ...");
    } else {
        // Continue with standard options
        println!("       --declarationMap  Create sourcemaps for d.ts files.");
        println!("                  type:  boolean");
        println!("               default:  false");
        println!();
        // ... rest of the options
    }

    println!("You can learn about all of the compiler options at https://aka.ms/tsrs");
}
