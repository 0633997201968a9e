use std::{
    io,
    path::PathBuf,
    process,
    thread,
};
use clap::Parser as ClapParser;
use rustyline::{error::ReadlineError, DefaultEditor};
use tracing_subscriber::EnvFilter;
use notion::{config::MAX_DEPTH, Config, Engine};

/// Evaluation recurses on the native stack, so give it plenty of room.
const STACK_SIZE: usize = 512 * 1024 * 1024;

const PROMPT: &str = "> ";
const CONTINUE: &str = "  ";

#[derive(ClapParser)]
#[command(name = "notion")]
#[command(version, about = "A small Scheme interpreter", long_about = None)]
struct Args {
    /// Source files to load, in order, before anything else
    files: Vec<PathBuf>,

    /// Start the REPL after loading files
    #[arg(short, long)]
    interactive: bool,

    /// Never collect garbage
    #[arg(long)]
    no_gc: bool,

    /// Seed for the names given to captured closure variables
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum nesting of evaluation before giving up
    #[arg(long, default_value_t = MAX_DEPTH)]
    max_depth: usize,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("NOTION_LOG")
            .unwrap_or_else(|_| EnvFilter::new("notion=warn")))
        .with_writer(io::stderr)
        .init();

    let interpreter = thread::Builder::new()
        .name("notion".to_string())
        .stack_size(STACK_SIZE)
        .spawn(move || run(args));

    let status = match interpreter {
        Ok(handle) => handle.join().unwrap_or_else(|_| {
            eprintln!("notion: the interpreter panicked");
            1
        }),
        Err(err) => {
            eprintln!("notion: could not start the interpreter: {}", err);
            1
        },
    };
    process::exit(status);
}

fn run(args: Args) -> i32 {
    let mut config = Config::default()
        .with_max_depth(args.max_depth)
        .with_collection(!args.no_gc);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    let mut engine = Engine::new(config);

    for path in &args.files {
        let result = engine.load(&path.to_string_lossy());
        if engine.is_quit(result) {
            return 0;
        }
        if !engine.is_unit(result) {
            eprintln!("{}: {}", path.display(), engine.display(result));
            return 1;
        }
        engine.maybe_collect();
    }

    if args.files.is_empty() || args.interactive {
        repl(&mut engine)
    } else {
        0
    }
}

fn repl(engine: &mut Engine) -> i32 {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("notion: could not start the line editor: {}", err);
            return 1;
        },
    };

    // Lines accumulate here until they form complete expressions.
    let mut pending = String::new();
    loop {
        let prompt = if pending.is_empty() { PROMPT } else { CONTINUE };
        match rl.readline(prompt) {
            Ok(line) => {
                pending.push_str(&line);
                pending.push('\n');
                if pending.trim().is_empty() {
                    pending.clear();
                    continue;
                }

                let forms = match engine.read(&pending) {
                    Ok(forms) => forms,
                    Err(err) if err.is_incomplete() => continue,
                    Err(err) => {
                        println!("Error: {}", err.describe(&pending));
                        pending.clear();
                        continue;
                    },
                };
                let _ = rl.add_history_entry(pending.trim_end());
                pending.clear();

                for form in forms {
                    let result = engine.eval(form);
                    if engine.is_quit(result) {
                        return 0;
                    }
                    if !engine.is_unit(result) {
                        println!("{}", engine.display(result));
                    }
                }
                engine.maybe_collect();
            },
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => return 0,
            Err(err) => {
                eprintln!("notion: {}", err);
                return 1;
            },
        }
    }
}
