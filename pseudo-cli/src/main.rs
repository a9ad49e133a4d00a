use anyhow::{Context, Result};
use clap::Parser;
use pseudo_compiler::{compile_program, parse, tokenize};
use std::fs;
use std::path::PathBuf;
use tracing::Level;

mod backend;

#[derive(Parser)]
#[command(name = "pseudo")]
#[command(about = "A compiler for the pseudocode teaching language, emitting LLVM IR")]
struct Args {
    /// Path to the source file to compile. Without one, a built-in sample is used.
    file: Option<PathBuf>,

    /// Write the IR to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the token stream and stop
    #[arg(long)]
    tokens: bool,

    /// Print the parsed syntax tree and stop
    #[arg(long)]
    ast: bool,

    /// Link the IR into a native executable at this path
    #[arg(long, value_name = "EXE")]
    build: Option<PathBuf>,

    /// Run the executable after building it (implies --build a.out if not given)
    #[arg(long)]
    run: bool,

    /// C compiler used to assemble and link the IR
    #[arg(long, default_value = "clang")]
    cc: String,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let src = match &args.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Error reading file '{}'", path.display()))?,
        None => DEFAULT_SAMPLE.trim().to_string(),
    };

    if args.tokens {
        for t in tokenize(&src)? {
            println!("{:>4}:{:<3} {}", t.pos.line, t.pos.column, t.token);
        }
        return Ok(());
    }

    let program = parse(&src)?;
    if args.ast {
        println!("{:#?}", program);
        return Ok(());
    }

    let module = compile_program(&program)?;
    let ir = module.to_string();

    match &args.output {
        Some(path) => fs::write(path, &ir)
            .with_context(|| format!("Error writing IR to '{}'", path.display()))?,
        None if args.build.is_none() && !args.run => print!("{ir}"),
        None => {}
    }

    let exe = match (&args.build, args.run) {
        (Some(exe), _) => Some(exe.clone()),
        (None, true) => Some(PathBuf::from("a.out")),
        (None, false) => None,
    };
    if let Some(exe) = exe {
        backend::build(&args.cc, &ir, &exe)?;
        if args.run {
            let code = backend::run(&exe)?;
            std::process::exit(code);
        }
    }
    Ok(())
}

const DEFAULT_SAMPLE: &str = r#"
DECLARE x : INT
DECLARE total : INT
x <- 1
total <- 0
WHILE x <= 10 DO
    total <- total + x
    x <- x + 1
ENDWHILE
IF total = 55 THEN
    OUTPUT "sum is 55"
ELSE
    OUTPUT "unexpected sum"
ENDIF
PrintfD total
"#;
