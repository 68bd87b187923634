use std::io::{self, IsTerminal, Read};

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use slip::eval::Interp;
use slip::printer;
use slip::value::Value;

const HISTORY_FILE: &str = ".slip_history";

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let mut load_files: Vec<String> = Vec::new();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--load" => {
                if i + 1 < args.len() {
                    load_files.push(args[i + 1].clone());
                    i += 2;
                } else {
                    eprintln!("--load requires a file path");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                println!("Usage: slip [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --load <file>    Evaluate a source file before starting the REPL");
                println!("  --help, -h       Show this help message");
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("Try 'slip --help' for usage information.");
                std::process::exit(1);
            }
        }
    }

    let mut interp = Interp::new();

    for path in &load_files {
        load_file(&mut interp, path).with_context(|| format!("loading {}", path))?;
    }

    if io::stdin().is_terminal() {
        run_interactive(&mut interp)
    } else {
        run_piped(&mut interp)
    }
}

/// Evaluate a whole file, then collect the garbage it left behind.
fn load_file(interp: &mut Interp, path: &str) -> Result<()> {
    eprint!("Loading {}...", path);
    let parsed = interp.read_path(path)?;
    let expanded = interp.expand(parsed)?;
    interp.eval_global(expanded)?;
    interp.collect(Value::Null);
    eprintln!(" done");
    Ok(())
}

/// Interactive REPL with line editing and history.
fn run_interactive(interp: &mut Interp) -> Result<()> {
    println!("slip interpreter");
    println!("Type (exit) or Ctrl+D to quit.\n");

    let mut rl = DefaultEditor::new()?;
    let _ = rl.load_history(HISTORY_FILE);

    loop {
        match rl.readline("slip> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "(exit)" || line == "exit" {
                    break;
                }
                let _ = rl.add_history_entry(line);

                match interp.run(line) {
                    Ok(value) => {
                        println!("{}", printer::print_val(&interp.heap, value));
                        // between top-level expressions is the safe point
                        interp.collect(Value::Null);
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    Ok(())
}

/// Piped mode: read all input, evaluate it as one program, print the result.
fn run_piped(interp: &mut Interp) -> Result<()> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("reading stdin")?;

    let input = input.trim();
    if input.is_empty() {
        return Ok(());
    }

    match interp.run(input) {
        Ok(value) => println!("{}", printer::print_val(&interp.heap, value)),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}
