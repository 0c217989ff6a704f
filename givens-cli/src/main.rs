//! Interactive REPL driving the engine over a loaded fixture program.
//!
//! Modernized from `chalk-repl`'s `docopt` + `failure` combination (both
//! effectively unmaintained) to `clap`'s derive API and this workspace's
//! own `thiserror`-based errors -- the corpus's actual standard for a CLI
//! is `clap`, not `docopt`. `rustyline` is kept; it's still the idiomatic
//! readline crate and the pack's own non-chalk examples depend on it too.

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use givens_ir::{Oracle, Prototype, SearchResult, Symbol};
use givens_integration::{init_tracing, lower, FixtureOracle, SearchError, SymbolKind};
use givens_recursive::SearchConfig;
use givens_solve::ContextualImplicits;

#[derive(Parser, Debug)]
#[command(name = "givens-repl", about = "Explore implicit search over a fixture program")]
struct Args {
    /// Path to a fixture program (see `givens_integration::lowering`).
    #[arg(long)]
    program: Option<String>,

    /// A query to run non-interactively (may be given more than once).
    #[arg(long = "goal")]
    goals: Vec<String>,
}

/// A loaded fixture program, plus the synthetic owner symbol queries are
/// issued on behalf of.
struct LoadedProgram {
    text: String,
    oracle: FixtureOracle,
    names: std::collections::HashMap<String, Symbol>,
    repl_owner: Symbol,
}

impl LoadedProgram {
    fn new(text: String) -> Result<Self, String> {
        let (mut oracle, names) = lower(&text).map_err(|e| e.to_string())?;
        let repl_owner = oracle.declare_symbol("$repl", None, SymbolKind::Witness);
        Ok(LoadedProgram {
            text,
            oracle,
            names,
            repl_owner,
        })
    }

    fn contextual_scope(&self) -> ContextualImplicits<givens_integration::Ty> {
        let mut refs = givens_ir::TermRefSet::new();
        for &sym in self.names.values() {
            refs.insert(givens_ir::TermRef::new(sym, self.oracle.class_type(sym)));
        }
        ContextualImplicits::root(refs)
    }

    /// Attempt to find an implicit of class `class_name`.
    fn goal(&mut self, class_name: &str) -> String {
        let Some(&class_sym) = self.names.get(class_name) else {
            return format!("unknown class `{class_name}`");
        };
        let target = self.oracle.class_type(class_sym);
        let contextual = self.contextual_scope();
        let result = givens_recursive::infer_implicit(
            &mut self.oracle,
            self.repl_owner,
            Some(&contextual),
            &Prototype::Value(target),
            SearchConfig::new(),
        );
        match result {
            SearchResult::Success(success) => format!("{:?}\n", success.tree),
            SearchResult::Failure(failure) => {
                format!("{}\n", SearchError::from_failure::<FixtureOracle>(&failure))
            }
        }
    }
}

fn load_program(filename: &str) -> Result<LoadedProgram, String> {
    let text = fs::read_to_string(filename).map_err(|e| format!("cannot read {filename}: {e}"))?;
    LoadedProgram::new(text)
}

/// Reads input lines from the user, handing each to `f`, until EOF.
fn readline_loop<F>(rl: &mut DefaultEditor, prompt: &str, mut f: F)
where
    F: FnMut(&mut DefaultEditor, &str),
{
    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                f(rl, &line);
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
            Err(e) => {
                eprintln!("error: {e}");
                break;
            }
        }
    }
}

fn process(command: &str, rl: &mut DefaultEditor, prog: &mut Option<LoadedProgram>) {
    let command = command.trim();
    if command == "help" || command == "h" {
        help();
    } else if command == "program" {
        println!("Enter a program; press Ctrl-D when finished");
        let mut text = String::new();
        readline_loop(rl, "| ", |_, line| {
            text += line;
            text += "\n";
        });
        match LoadedProgram::new(text) {
            Ok(p) => *prog = Some(p),
            Err(e) => eprintln!("error: {e}"),
        }
    } else if let Some(filename) = command.strip_prefix("load ") {
        match load_program(filename.trim()) {
            Ok(p) => *prog = Some(p),
            Err(e) => eprintln!("error: {e}"),
        }
    } else if command.is_empty() {
        // nothing to do
    } else {
        let Some(prog) = prog.as_mut() else {
            eprintln!("no program currently loaded; type 'help' to see available commands");
            return;
        };
        match command {
            "print" => println!("{}", prog.text),
            _ => print!("{}", prog.goal(command)),
        }
    }
}

fn help() {
    println!("Commands:");
    println!("  help          print this output");
    println!("  program       provide a program via stdin");
    println!("  load <file>   load program from <file>");
    println!("  print         print the current program");
    println!("  <ClassName>   attempt to resolve an implicit of <ClassName>");
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let mut prog = match &args.program {
        Some(path) => match load_program(path) {
            Ok(p) => Some(p),
            Err(e) => {
                eprintln!("error loading program: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    if !args.goals.is_empty() {
        let Some(prog) = prog.as_mut() else {
            eprintln!("error: cannot eval without a program; use `--program` to specify one.");
            return ExitCode::FAILURE;
        };
        for goal in &args.goals {
            print!("{}", prog.goal(goal));
        }
        return ExitCode::SUCCESS;
    }

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("error: cannot start readline: {e}");
            return ExitCode::FAILURE;
        }
    };
    readline_loop(&mut rl, "?- ", |rl, line| process(line, rl, &mut prog));
    ExitCode::SUCCESS
}
