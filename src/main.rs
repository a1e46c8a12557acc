use std::env;
use std::io::{self, Write};
use std::process::exit;

use log::{error, info};

use kvtree::btree::{self, InsertOutcome};
use kvtree::error::{ExecuteError, PrepareError};
use kvtree::meta::{do_meta_command, MetaOutcome};
use kvtree::row::Row;
use kvtree::statement::{prepare_statement, Statement};
use kvtree::table::Table;

fn main() {
    env_logger::init();

    let filename = match env::args().nth(1) {
        Some(filename) => filename,
        None => {
            println!("Must supply a database filename.");
            exit(1);
        }
    };

    let mut table = match Table::open(&filename) {
        Ok(table) => table,
        Err(e) => {
            error!("{}", e);
            exit(1);
        }
    };

    let mut input = String::new();
    loop {
        print!("db > ");
        if io::stdout().flush().is_err() {
            error!("failed to flush stdout");
            exit(1);
        }

        input.clear();
        match io::stdin().read_line(&mut input) {
            Ok(0) => {
                // EOF on stdin is an error, not a clean shutdown: unlike
                // `.exit`, there was no chance to flush, and the spec
                // requires this path to fail rather than succeed.
                println!("Error reading input");
                exit(1);
            }
            Ok(_) => {
                if input.ends_with('\n') {
                    input.pop();
                    if input.ends_with('\r') {
                        input.pop();
                    }
                }
            }
            Err(e) => {
                error!("failed to read from stdin: {}", e);
                exit(1);
            }
        }

        if input.starts_with('.') {
            match do_meta_command(&input, &mut table) {
                MetaOutcome::Handled => continue,
                MetaOutcome::Exit => {
                    if let Err(e) = table.close() {
                        error!("{}", e);
                        exit(1);
                    }
                    info!("database closed cleanly");
                    exit(0);
                }
                MetaOutcome::Unrecognized => {
                    println!("Unrecognized command '{}'", input);
                    continue;
                }
            }
        }

        match prepare_statement(&input) {
            Ok(stmt) => match execute_statement(stmt, &mut table) {
                Ok(()) => println!("Executed."),
                Err(ExecuteError::DuplicateKey) => println!("Error: Duplicate key."),
                Err(ExecuteError::TableFull) => println!("Error: Table full."),
            },
            Err(PrepareError::SyntaxError) => {
                println!("Syntax error. Could not parse statement.")
            }
            Err(PrepareError::NegativeId) => println!("ID must be positive."),
            Err(PrepareError::StringTooLong) => println!("String is too long."),
            Err(PrepareError::UnrecognizedStatement(line)) => {
                println!("Unrecognized keyword at start of '{}'.", line)
            }
        }
    }
}

fn execute_statement(stmt: Statement, table: &mut Table) -> Result<(), ExecuteError> {
    match stmt {
        Statement::Insert(row) => execute_insert(table, row),
        Statement::Select => execute_select(table),
    }
}

fn execute_insert(table: &mut Table, row: Row) -> Result<(), ExecuteError> {
    let key = row.id;
    let cursor = btree::find(table, key).unwrap_or_else(|e| {
        error!("{}", e);
        exit(1);
    });
    match btree::insert(table, &cursor, key, &row).unwrap_or_else(|e| {
        error!("{}", e);
        exit(1);
    }) {
        InsertOutcome::Success => Ok(()),
        InsertOutcome::DuplicateKey => Err(ExecuteError::DuplicateKey),
        InsertOutcome::TableFull => Err(ExecuteError::TableFull),
    }
}

fn execute_select(table: &mut Table) -> Result<(), ExecuteError> {
    let mut cursor = btree::start(table).unwrap_or_else(|e| {
        error!("{}", e);
        exit(1);
    });
    while !cursor.end_of_table {
        let row = Row::deserialize(btree::value(table, &cursor).unwrap_or_else(|e| {
            error!("{}", e);
            exit(1);
        }));
        println!("({}, {}, {})", row.id, row.username, row.email);
        if let Err(e) = btree::advance(table, &mut cursor) {
            error!("{}", e);
            exit(1);
        }
    }
    Ok(())
}
